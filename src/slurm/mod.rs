mod allocated;
mod command;
mod descriptor;
mod running;
mod total;
mod utils;

pub use allocated::get_allocated_gpus;
pub use command::run_command;
pub use descriptor::{GpuDescriptor, parse_gpu_descriptor};
pub use running::get_running_gpus;
pub use total::get_total_gpus;

use crate::config::SlurmCommandsConfig;
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;
use tracing::debug;

/// Every running job with its allocated GRES, e.g. `alice|gpu:2`
pub const SACCT_ALLOCATIONS_ARGS: &[&str] = &[
    "-a",
    "-X",
    "--format=User,AllocGRES",
    "--state=RUNNING",
    "--noheader",
    "--parsable2",
];
/// One line per node: name, state and GRES, e.g. `n1 mixed gpu:tesla:4(IDX:0-3)`
pub const SINFO_NODE_STATES_ARGS: &[&str] = &["-h", "--format=%n %T %G"];
/// One line per node: name and GRES, e.g. `n1 gpu:tesla:4`
pub const SINFO_NODE_GRES_ARGS: &[&str] = &["-h", "--format=%n %G"];

/// The implementer provides raw Slurm command output from somewhere, useful for mocking in tests
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SlurmProvider: Send + Sync {
    async fn get_running_job_allocations(&self) -> io::Result<String>;
    async fn get_node_states(&self) -> io::Result<String>;
    async fn get_node_gres(&self) -> io::Result<String>;
}

/// The default provider, runs `sacct` and `sinfo`.
pub struct SlurmExecutor {
    sacct_bin: PathBuf,
    sinfo_bin: PathBuf,
    timeout: Duration,
}

impl SlurmExecutor {
    pub fn new(config: &SlurmCommandsConfig) -> Self {
        Self {
            sacct_bin: config.sacct_bin.clone(),
            sinfo_bin: config.sinfo_bin.clone(),
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl SlurmProvider for SlurmExecutor {
    async fn get_running_job_allocations(&self) -> io::Result<String> {
        debug!("Querying running job allocations with {}", self.sacct_bin.display());
        run_command(&self.sacct_bin, SACCT_ALLOCATIONS_ARGS, self.timeout).await
    }

    async fn get_node_states(&self) -> io::Result<String> {
        debug!("Querying node states with {}", self.sinfo_bin.display());
        run_command(&self.sinfo_bin, SINFO_NODE_STATES_ARGS, self.timeout).await
    }

    async fn get_node_gres(&self) -> io::Result<String> {
        debug!("Querying node GRES with {}", self.sinfo_bin.display());
        run_command(&self.sinfo_bin, SINFO_NODE_GRES_ARGS, self.timeout).await
    }
}
