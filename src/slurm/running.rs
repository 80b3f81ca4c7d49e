use super::SlurmProvider;
use super::descriptor::parse_gpu_descriptor;
use super::utils::records;
use std::io;
use tracing::debug;

const IDLE_STATE: &str = "idle";

/// Sum of GPUs on nodes that aren't idle.
pub async fn get_running_gpus<P: SlurmProvider + ?Sized>(provider: &P) -> io::Result<f64> {
    // Format: node state gres
    // e.g. "n1 mixed gpu:tesla:4(IDX:0-3)"
    let output = provider.get_node_states().await?;

    let mut num_gpus = 0.0;
    for line in records(&output) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [_node, state, gres, ..] = fields.as_slice() else {
            debug!("Skipping malformed node state line: {}", line);
            continue;
        };

        // "idle*", "idle~" etc. are idle too, just unreachable or powered down
        if state.starts_with(IDLE_STATE) {
            continue;
        }
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
            .expect_get_node_states()
            .returning(move || Ok(output.to_string()));
        mock_provider
    }

    #[tokio::test]
    async fn test_running_gpus_excludes_idle_nodes() -> io::Result<()> {
        let provider = provider_returning("n1 idle gpu:tesla:4\nn2 mixed gpu:tesla:2\n");
        assert_eq!(get_running_gpus(&provider).await?, 2.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_running_gpus_idle_prefix_states() -> io::Result<()> {
        let provider = provider_returning(
            "\"n1 idle* gpu:4\"\n\"n2 idle~ gpu:4\"\n\"n3 allocated gpu:4(IDX:0-3)\"\n\"n4 drained gpu:1\"",
        );
        assert_eq!(get_running_gpus(&provider).await?, 5.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_running_gpus_state_match_is_case_sensitive() -> io::Result<()> {
        let provider = provider_returning("n1 IDLE gpu:4\nn2 idle gpu:4\n");
        assert_eq!(get_running_gpus(&provider).await?, 4.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_running_gpus_with_empty_output() -> io::Result<()> {
        let provider = provider_returning("");
        assert_eq!(get_running_gpus(&provider).await?, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_running_gpus_with_malformed_lines() -> io::Result<()> {
        let provider = provider_returning("n1 mixed\nn2 mixed (null)\nn3 mixed gpu:3\n");
        assert_eq!(get_running_gpus(&provider).await?, 3.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_running_gpus_when_sinfo_fails() {
        let mut mock_provider = MockSlurmProvider::new();
        mock_provider
            .expect_get_node_states()
            .returning(|| Err(io::Error::other("sinfo exited with non-zero status: 1")));

        assert!(get_running_gpus(&mock_provider).await.is_err());
    }
}
