//! Launch the engine binary and wait for it, honouring cancellation and timeout.

use crate::{config::DssatConfig, engine::CancelToken, error::EngineFailure};
use std::fs::File;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

pub const STDOUT_FILE: &str = "engine.stdout";
pub const STDERR_FILE: &str = "engine.stderr";

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Run `<binary> S <batch file>` inside `work_dir`.
///
/// The environment is cleared; the engine sees only `DSSAT_HOME` and the
/// binary alias. Output goes to files in the work area so a chatty engine
/// can never fill a pipe and stall.
pub fn run_engine(
    config: &DssatConfig,
    home: &Path,
    work_dir: &Path,
    cancel: &CancelToken,
    timeout: Option<Duration>,
) -> Result<ProcessOutput, EngineFailure> {
    let binary = config.binary_path();
    let stdout_path = work_dir.join(STDOUT_FILE);
    let stderr_path = work_dir.join(STDERR_FILE);

    let mut child = Command::new(&binary)
        .arg("S")
        .arg(config.batch_file_name())
        .current_dir(work_dir)
        .env_clear()
        .env("DSSAT_HOME", format!("{}/", home.display()))
        .env(config.binary_name(), &binary)
        .stdin(Stdio::null())
        .stdout(Stdio::from(File::create(&stdout_path)?))
        .stderr(Stdio::from(File::create(&stderr_path)?))
        .spawn()
        .map_err(|e| EngineFailure::system(format!("cannot launch {}: {e}", binary.display())))?;

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if cancel.is_cancelled() {
            kill(&mut child);
            return Err(EngineFailure::cancelled());
        }
        if let Some(limit) = timeout {
            if started.elapsed() >= limit {
                kill(&mut child);
                return Err(EngineFailure::timed_out(format!(
                    "engine still running after {limit:?}"
                )));
            }
        }
        thread::sleep(POLL_INTERVAL);
    };

    Ok(ProcessOutput {
        status,
        stdout: read_lossy(&stdout_path),
        stderr: read_lossy(&stderr_path),
    })
}

fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        log::warn!("failed to kill engine process {}: {e}", child.id());
    }
    // Reap so no zombie is left behind.
    let _ = child.wait();
}

fn read_lossy(path: &Path) -> String {
    std::fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
