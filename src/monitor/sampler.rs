//! Point-in-time resource sample of a process (tree).

use crate::{CpuTimes, Probe, ProcessHandle};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleResult {
    pub memory_bytes: u64,
    pub cpu_times: CpuTimes,
    pub alive: bool,
}

/// Reads RSS of the target (plus every live descendant when
/// `include_children` is set) and the target's own CPU times.
///
/// Anything unreadable contributes zero. Descendant CPU time is not added: it
/// only becomes attributable once the descendant is waited on.
pub fn sample<H: ProcessHandle + ?Sized>(handle: &mut H, include_children: bool) -> SampleResult {
    let pid = handle.pid();
    let target = handle.memory_info(pid);
    let alive = target.is_available();
    let mut memory_bytes = or_zero(target, pid, "memory");

    if include_children {
        for child in handle.children() {
            let rss = or_zero(handle.memory_info(child), child, "memory");
            memory_bytes = memory_bytes.saturating_add(rss);
        }
    }

    let cpu_times = or_zero(handle.cpu_times(pid), pid, "cpu");
    SampleResult {
        memory_bytes,
        cpu_times,
        alive,
    }
}

fn or_zero<T: Default>(probe: Probe<T>, pid: u32, what: &str) -> T {
    match probe {
        Probe::Available(v) => v,
        Probe::Unavailable(reason) => {
            tracing::trace!(pid, ?reason, "{what} probe unavailable");
            T::default()
        }
    }
}
