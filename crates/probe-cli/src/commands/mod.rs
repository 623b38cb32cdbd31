pub mod minio;
pub mod rancher;
pub mod traefiker;

use std::collections::BTreeMap;

use probe_core::{CheckOutcome, ReportLine};
use tracing::warn;

use crate::config::{select, Section};

/// Run every selected section of one probe kind and merge their lines.
///
/// `check` runs a configured section. A requested section missing from the
/// config, or one `check` rejects, yields an UNKNOWN line labelled
/// `<kind>_<name>` and the remaining sections still run.
pub(crate) async fn run_sections<T, F, Fut>(
    kind: &str,
    sections: &BTreeMap<String, Section<T>>,
    wanted: &[String],
    mut check: F,
) -> anyhow::Result<CheckOutcome>
where
    F: FnMut(String, &Section<T>) -> anyhow::Result<Fut>,
    Fut: Future<Output = CheckOutcome>,
{
    let selected = select(sections, wanted);
    if selected.is_empty() {
        anyhow::bail!("no [{kind}] sections configured");
    }

    let mut outcome = CheckOutcome::default();
    for (name, section) in selected {
        let next = match section {
            Some(section) => match check(name.clone(), section) {
                Ok(run) => run.await,
                Err(e) => {
                    warn!(kind, section = %name, error = %format!("{e:#}"), "section misconfigured");
                    CheckOutcome {
                        lines: vec![ReportLine::unknown(&format!("{kind}_{name}"), format!("{e:#}"))],
                    }
                }
            },
            None => {
                warn!(kind, section = %name, "section not configured");
                CheckOutcome {
                    lines: vec![ReportLine::unknown(
                        &format!("{kind}_{name}"),
                        format!("section [{kind}.{name}] not found in config"),
                    )],
                }
            }
        };
        outcome = outcome.merge(next);
    }
    Ok(outcome)
}
