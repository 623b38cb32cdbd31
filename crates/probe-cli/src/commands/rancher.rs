use probe_core::{run_check, CheckOutcome, ReportLine};
use probe_rancher::RancherFetcher;

use crate::config::ProbesConfig;

pub async fn check(config: &ProbesConfig, sections: &[String]) -> anyhow::Result<CheckOutcome> {
    super::run_sections("rancher", &config.rancher, sections, |_, section| {
        let timeout = section.timeout()?;
        let plan = probe_rancher::plan(&section.settings).with_timeout(timeout);
        let fetcher = RancherFetcher::new(section.settings.clone(), timeout);
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
