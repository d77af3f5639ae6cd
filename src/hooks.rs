use std::io;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

/// Outcome of running a configured hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookRun {
    Spawned,
    NotConfigured,
    Skipped,
    Failed,
}

/// Spawn a shell hook without waiting for it. Empty and `#`-commented hooks are skipped.
pub fn execute_hook(name: &str, hook: Option<&str>) -> HookRun {
    let Some(command) = hook else {
        return HookRun::NotConfigured;
    };
    let command = command.trim();
    if command.is_empty() || command.starts_with('#') {
        debug!(hook = name, "hook is empty or commented out");
        return HookRun::Skipped;
    }

    match spawn_reaped(name, command) {
        Ok(_) => {
            debug!(hook = name, command, "hook spawned");
            HookRun::Spawned
        }
        Err(err) => {
            warn!(hook = name, "failed to run hook: {}", err);
            HookRun::Failed
        }
    }
}

/// Run `sh -c command` and wait for it on a detached thread so the child
/// never lingers as a zombie.
fn spawn_reaped(name: &str, command: &str) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .spawn()?;
    let name = name.to_string();
    Ok(thread::spawn(move || {
        let status = child.wait();
        match &status {
            Ok(status) if !status.success() => warn!(hook = %name, %status, "hook failed"),
            Ok(_) => debug!(hook = %name, "hook finished"),
            Err(err) => warn!(hook = %name, "failed to wait for hook: {}", err),
        }
        status
    }))
}
