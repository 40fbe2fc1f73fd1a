use std::time::Duration;

use crate::{CmdperfError, CmdperfResult, ProcessHandle, Termination};

pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// Waits up to `grace` for the process to finish, then kills it and waits
/// without bound. On `Ok` the process is fully collected; calling it again on
/// a reaped handle returns the same termination.
pub fn reap<H: ProcessHandle + ?Sized>(handle: &mut H, grace: Duration) -> CmdperfResult<Termination> {
    let pid = handle.pid();
    match handle.wait_timeout(grace) {
        Ok(Some(t)) => return Ok(t),
        Ok(None) => tracing::warn!(pid, "still running {grace:?} after monitoring ended; killing"),
        Err(err) => tracing::debug!(pid, "bounded wait failed, forcing kill: {err}"),
    }
    handle.kill(pid);
    handle
        .wait()
        .map_err(|source| CmdperfError::Reap { pid, source })
}
