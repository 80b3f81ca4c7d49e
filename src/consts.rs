pub const MAX_RUN_ATTEMPTS: u8 = 5;
pub const RESTART_DELAY_SECS: u64 = 10;

pub const RESTART_ENV_VAR: &str = "SLURM_GPU_EXPORTER_RESTART";
pub const ID_ENV_VAR: &str = "SLURM_GPU_EXPORTER_ID";
