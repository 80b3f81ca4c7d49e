use slurm_gpu_exporter::config::Config;
use slurm_gpu_exporter::consts::{ID_ENV_VAR, MAX_RUN_ATTEMPTS, RESTART_DELAY_SECS, RESTART_ENV_VAR};
use std::time::Duration;
use std::{env, os::unix::process::CommandExt, panic, process, thread};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            process::exit(2);
        }
    };

    let sentry_guard = init_sentry(&config);
    if sentry_guard.is_some() {
        info!("Sentry initialized");
    } else {
        warn!("Sentry NOT initialized");
    }

    if config.restart_count > 0 {
        info!(
            "Restarting exporter - waiting {} seconds (attempt {}/{})",
            RESTART_DELAY_SECS,
            config.restart_count + 1,
            MAX_RUN_ATTEMPTS
        );
        thread::sleep(Duration::from_secs(RESTART_DELAY_SECS));
    }

    info!(
        "Starting Slurm GPU exporter {} (attempt {}/{})",
        config.instance_id,
        config.restart_count + 1,
        MAX_RUN_ATTEMPTS
    );

    match panic::catch_unwind(|| slurm_gpu_exporter::run_exporter(&config)) {
        Ok(Ok(())) => process::exit(0),
        Ok(Err(e)) => {
            error!("Exporter failed: {:#}", e);
            process::exit(1);
        }
        Err(_) => restart(&config),
    }
}

fn restart(config: &Config) -> ! {
    let next_count = config.restart_count + 1;
    if next_count >= MAX_RUN_ATTEMPTS {
        error!(
            "Maximum run attempts ({}) reached after crash. Exiting.",
            MAX_RUN_ATTEMPTS
        );
        process::exit(1);
    }

    warn!("Exporter crashed. Executing new process...");
    let current_exe = match env::current_exe() {
        Ok(path) => path,
        Err(e) => {
            error!("Failed to get current executable path: {}", e);
            process::exit(1);
        }
    };
    let err = process::Command::new(current_exe)
        .env(RESTART_ENV_VAR, next_count.to_string())
        .env(ID_ENV_VAR, config.instance_id.to_string())
        .args(env::args().skip(1))
        .exec();

    // exec failed, wouldn't reach here otherwise
    error!("Failed to restart exporter: {}", err);
    process::exit(1);
}

fn init_sentry(config: &Config) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.clone()?;
    let release = sentry::release_name!();
    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release,
            ..Default::default()
        },
    ));

    sentry::configure_scope(|scope| {
        scope.set_tag("exporter_id", config.instance_id);
        scope.set_tag("cluster.name", &config.cluster_name);
    });

    Some(guard)
}
