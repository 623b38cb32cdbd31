use probe_core::{run_check, CheckOutcome, ReportLine};
use probe_traefiker::TraefikerFetcher;

use crate::config::ProbesConfig;

pub async fn check(config: &ProbesConfig, sections: &[String]) -> anyhow::Result<CheckOutcome> {
    super::run_sections("traefiker", &config.traefiker, sections, |name, section| {
        let timeout = section.timeout()?;
        let plan = probe_traefiker::plan(&name).with_timeout(timeout);
        let fetcher = TraefikerFetcher::new(&name, section.settings.clone(), timeout);
        Ok(async move {
            match fetcher {
                Ok(fetcher) => run_check(&fetcher, &plan).await,
                Err(e) => CheckOutcome {
                    lines: vec![ReportLine::unknown(&plan.summary_label, e)],
                },
            }
        })
    })
    .await
}
