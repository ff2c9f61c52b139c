// Single-core launcher module
//
// Re-spawns the server as a supervised child and pins it to one CPU core with
// the platform affinity tool. Pinning is fire-and-forget: a failure is logged
// and the child keeps serving unpinned.

use std::process::{Command, ExitStatus};
use std::time::Duration;

use crate::config::AffinityConfig;
use crate::logger;

/// Environment marker telling a spawned child to skip the launcher path
pub const CHILD_ENV: &str = "PRELOAD_WEBSERVER_CHILD";

/// Delay before applying affinity, giving the child time to boot
const PIN_DELAY: Duration = Duration::from_millis(500);

pub fn is_supervised_child() -> bool {
    std::env::var_os(CHILD_ENV).is_some()
}

/// Spawn the current executable as a child, pin it, and wait for it to exit.
pub fn run_single_core(affinity: &AffinityConfig, args: &[String]) -> std::io::Result<ExitStatus> {
    let exe = std::env::current_exe()?;
    let mut child = Command::new(exe).args(args).env(CHILD_ENV, "1").spawn()?;

    println!(
        "[AFFINITY] Spawned server child (pid {}), pinning to core {}",
        child.id(),
        affinity.cpu_core
    );

    // The child may already be serving requests when the pin lands; that
    // window is accepted.
    std::thread::sleep(PIN_DELAY);
    apply_affinity(child.id(), affinity.cpu_core);

    child.wait()
}

#[cfg(target_os = "linux")]
fn apply_affinity(pid: u32, core: usize) {
    let result = Command::new("taskset")
        .args(["-cp", &core.to_string(), &pid.to_string()])
        .output();

    match result {
        Ok(output) if output.status.success() => {
            println!("[AFFINITY] Pinned pid {pid} to core {core}");
        }
        Ok(output) => {
            logger::log_warning(&format!(
                "taskset exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to run taskset: {e}"));
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn apply_affinity(pid: u32, core: usize) {
    let _ = (pid, core);
    logger::log_warning("CPU affinity is only supported on Linux; continuing unpinned");
}
