use crate::ProcessHandle;

/// Kills every live descendant, then the target. Best effort: a process that
/// is already gone counts as killed. Returns how many descendants were signalled.
pub fn kill_tree<H: ProcessHandle + ?Sized>(handle: &mut H) -> usize {
    let descendants = handle.children();
    for pid in &descendants {
        handle.kill(*pid);
    }
    let pid = handle.pid();
    handle.kill(pid);
    tracing::debug!(pid, descendants = descendants.len(), "killed process tree");
    descendants.len()
}
