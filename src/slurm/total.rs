use super::SlurmProvider;
use super::descriptor::parse_gpu_descriptor;
use super::utils::records;
use std::io;
use tracing::debug;

/// Sum of GPUs across all nodes, whatever their state.
pub async fn get_total_gpus<P: SlurmProvider + ?Sized>(provider: &P) -> io::Result<f64> {
    // Format: node gres
    // e.g. "n2 gpu:tesla:8(IDX:0-7)"
    let output = provider.get_node_gres().await?;

    let mut num_gpus = 0.0;
    for line in records(&output) {
        let Some(gres) = line.split_whitespace().nth(1) else {
            debug!("Skipping malformed node GRES line: {}", line);
            continue;
        };
        num_gpus += parse_gpu_descriptor(gres);
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
            .expect_get_node_gres()
            .returning(move || Ok(output.to_string()));
        mock_provider
    }

    #[tokio::test]
    async fn test_total_gpus_mixed_descriptors() -> io::Result<()> {
        let provider = provider_returning("n1 gpu:4\nn2 gpu:tesla:8(IDX:0-7)\n");
        assert_eq!(get_total_gpus(&provider).await?, 12.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_total_gpus_counts_nodes_without_gpus_as_zero() -> io::Result<()> {
        let provider = provider_returning("\"n1 (null)\"\n\"n2 gpu:a100:4\"\n\"n3\"\n");
        assert_eq!(get_total_gpus(&provider).await?, 4.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_total_gpus_with_empty_output() -> io::Result<()> {
        let provider = provider_returning("");
        assert_eq!(get_total_gpus(&provider).await?, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_total_gpus_when_sinfo_times_out() {
        let mut mock_provider = MockSlurmProvider::new();
        mock_provider
            .expect_get_node_gres()
            .returning(|| Err(io::Error::new(io::ErrorKind::TimedOut, "sinfo timed out")));

        let err = get_total_gpus(&mock_provider).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }
}
