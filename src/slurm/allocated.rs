use super::SlurmProvider;
use super::descriptor::parse_allocated_gres;
use super::utils::records;
use std::io;
use tracing::debug;

/// Sum of GPUs allocated to currently running jobs.
pub async fn get_allocated_gpus<P: SlurmProvider + ?Sized>(provider: &P) -> io::Result<f64> {
    // Format: User|AllocGRES
    // e.g. "alice|gpu:2"
    let output = provider.get_running_job_allocations().await?;

    let mut num_gpus = 0.0;
    for line in records(&output) {
        let mut fields = line.split('|');
        let user = fields.next().unwrap_or_default();
        let Some(gres) = fields.next() else {
            debug!("Skipping allocation line without GRES: {}", line);
            continue;
        };

        let job_gpus = parse_allocated_gres(gres);
        debug!(user, job_gpus, "Running job allocation");
        num_gpus += job_gpus;
    }

    Ok(num_gpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slurm::MockSlurmProvider;

    fn provider_returning(output: &'static str) -> MockSlurmProvider {
        let mut mock_provider = MockSlurmProvider::new();
        mock_provider
            .expect_get_running_job_allocations()
            .returning(move || Ok(output.to_string()));
        mock_provider
    }

    #[tokio::test]
    async fn test_allocated_gpus_sums_jobs() -> io::Result<()> {
        let provider = provider_returning("alice|gpu:2\nbob|gpu:1\n");
        assert_eq!(get_allocated_gpus(&provider).await?, 3.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_allocated_gpus_trims_quotes() -> io::Result<()> {
        let provider = provider_returning("\"alice|gpu:4\"\n\"bob|2\"");
        assert_eq!(get_allocated_gpus(&provider).await?, 6.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_allocated_gpus_with_empty_output() -> io::Result<()> {
        let provider = provider_returning("");
        assert_eq!(get_allocated_gpus(&provider).await?, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_allocated_gpus_ignores_jobs_without_gpus() -> io::Result<()> {
        // CPU-only jobs have an empty AllocGRES, malformed lines have none at all
        let provider = provider_returning("alice|\nbob|gpu:2\ncarol\ndave|gpu:many\n");
        assert_eq!(get_allocated_gpus(&provider).await?, 2.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_allocated_gpus_when_sacct_fails() {
        let mut mock_provider = MockSlurmProvider::new();
        mock_provider
            .expect_get_running_job_allocations()
            .returning(|| Err(io::Error::new(io::ErrorKind::NotFound, "Failed to run sacct")));

        assert!(get_allocated_gpus(&mock_provider).await.is_err());
    }
}
