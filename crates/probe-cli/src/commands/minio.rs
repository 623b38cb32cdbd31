use probe_core::{run_check, CheckOutcome};
use probe_minio::MinioFetcher;

use crate::config::ProbesConfig;

pub async fn check(config: &ProbesConfig, sections: &[String]) -> anyhow::Result<CheckOutcome> {
    super::run_sections("minio", &config.minio, sections, |_, section| {
        let plan = probe_minio::plan().with_timeout(section.timeout()?);
        let fetcher = MinioFetcher::new(section.settings.clone());
        Ok(async move { run_check(&fetcher, &plan).await })
    })
    .await
}
