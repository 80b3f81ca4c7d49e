pub mod config;
pub mod consts;
pub mod exporter;
pub mod metrics;
pub mod output;
pub mod slurm;

use crate::config::{Config, JsonlToStdoutConfig, OutputMode};
use crate::output::SnapshotEntry;
use crate::slurm::{SlurmExecutor, SlurmProvider};
use anyhow::Context;
use std::io;
use tracing::{error, info};

pub fn run_exporter(config: &Config) -> anyhow::Result<()> {
    let provider = SlurmExecutor::new(&config.commands);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    match &config.output_mode {
        OutputMode::Http(http) => runtime
            .block_on(exporter::serve(provider, http.listen_addr))
            .with_context(|| format!("Failed to serve metrics on {}", http.listen_addr)),
        OutputMode::JsonlToStdout(stdout) => {
            runtime.block_on(run_jsonl_loop(&provider, stdout, &config.cluster_name));
            Ok(())
        }
    }
}

async fn run_jsonl_loop<P: SlurmProvider>(provider: &P, config: &JsonlToStdoutConfig, cluster_name: &str) {
    info!("Writing GPU metrics to stdout every {:?}", config.interval);
    loop {
        let snapshot = metrics::collect_metrics(provider).await;
        let entry = SnapshotEntry::new(cluster_name, snapshot);
        if let Err(e) = output::write_jsonl_entry(&mut io::stdout().lock(), &config.prefix, &entry) {
            error!("Failed to write GPU metrics: {}", e);
        }

        tokio::time::sleep(config.interval).await;
    }
}
