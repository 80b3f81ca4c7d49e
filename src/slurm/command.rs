use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Run a command to completion and return its standard output.
///
/// `timeout` bounds the whole call, including draining the output pipes. The
/// child is killed when the deadline passes.
pub async fn run_command(program: &Path, args: &[&str], timeout: Duration) -> io::Result<String> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(io::Error::new(
                e.kind(),
                format!("Failed to run {}: {e}", program.display()),
            ));
        }
        Err(_) => {
            warn!("{} timed out after {:?}", program.display(), timeout);
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("{} did not finish within {timeout:?}", program.display()),
            ));
        }
    };

    if !output.status.success() {
        return Err(io::Error::other(format!(
            "{} exited with non-zero status: {}. stderr: {}",
            program.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    debug!(
        "{} exited after producing {} bytes",
        program.display(),
        output.stdout.len()
    );
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
