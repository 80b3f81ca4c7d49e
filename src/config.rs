use crate::consts::{ID_ENV_VAR, RESTART_ENV_VAR};
use anyhow::Context;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

pub struct HttpConfig {
    pub listen_addr: SocketAddr,
}

pub struct JsonlToStdoutConfig {
    pub prefix: String,
    pub interval: Duration,
}

pub enum OutputMode {
    Http(HttpConfig),
    JsonlToStdout(JsonlToStdoutConfig),
}

pub struct SlurmCommandsConfig {
    pub sacct_bin: PathBuf,
    pub sinfo_bin: PathBuf,
    pub timeout: Duration,
}

pub struct Config {
    pub sentry_dsn: Option<String>,
    pub instance_id: Uuid,
    pub restart_count: u8,
    pub cluster_name: String,
    pub commands: SlurmCommandsConfig,
    pub output_mode: OutputMode,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key-value source, `from_env` uses the process environment.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> anyhow::Result<Self> {
        Ok(Config {
            sentry_dsn: lookup("SENTRY_DSN"),
            instance_id: get_or_create_instance_id(&lookup),
            restart_count: get_restart_count(&lookup),
            cluster_name: lookup("CLUSTER_NAME").unwrap_or_else(|| "Unknown".to_string()),
            commands: get_commands_config(&lookup),
            output_mode: get_output_mode(&lookup)?,
        })
    }
}

fn get_output_mode<F: Fn(&str) -> Option<String>>(lookup: &F) -> anyhow::Result<OutputMode> {
    let output_mode = lookup("SLURM_GPU_EXPORTER_OUTPUT_MODE");
    match output_mode.as_deref() {
        Some("http") | None => {
            let listen_addr = lookup("SLURM_GPU_EXPORTER_LISTEN_ADDR")
                .unwrap_or_else(|| "0.0.0.0:8080".to_string());
            let listen_addr = listen_addr
                .parse::<SocketAddr>()
                .with_context(|| format!("Invalid SLURM_GPU_EXPORTER_LISTEN_ADDR: {listen_addr}"))?;
            Ok(OutputMode::Http(HttpConfig { listen_addr }))
        }
        Some("stdout") => {
            let prefix = lookup("SLURM_GPU_EXPORTER_OUTPUT_PREFIX").unwrap_or_default();
            let interval = get_millis(lookup, "SLURM_GPU_EXPORTER_INTERVAL_MS", 15_000);
            Ok(OutputMode::JsonlToStdout(JsonlToStdoutConfig { prefix, interval }))
        }
        Some(other) => Err(anyhow::anyhow!(
            "Invalid SLURM_GPU_EXPORTER_OUTPUT_MODE: {other}."
        )),
    }
}

fn get_commands_config<F: Fn(&str) -> Option<String>>(lookup: &F) -> SlurmCommandsConfig {
    SlurmCommandsConfig {
        sacct_bin: lookup("SLURM_GPU_EXPORTER_SACCT_BIN")
            .unwrap_or_else(|| "sacct".to_string())
            .into(),
        sinfo_bin: lookup("SLURM_GPU_EXPORTER_SINFO_BIN")
            .unwrap_or_else(|| "sinfo".to_string())
            .into(),
        timeout: get_millis(lookup, "SLURM_GPU_EXPORTER_COMMAND_TIMEOUT_MS", 10_000),
    }
}

fn get_millis<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, default: u64) -> Duration {
    let ms = lookup(key)
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(default);
    Duration::from_millis(ms)
}

fn get_or_create_instance_id<F: Fn(&str) -> Option<String>>(lookup: &F) -> Uuid {
    lookup(ID_ENV_VAR)
        .and_then(|id| Uuid::parse_str(&id).ok())
        .unwrap_or_else(Uuid::new_v4)
}

fn get_restart_count<F: Fn(&str) -> Option<String>>(lookup: &F) -> u8 {
    lookup(RESTART_ENV_VAR)
        .and_then(|count| count.parse::<u8>().ok())
        .unwrap_or(0)
}
