//! Thread pinning and timing.

use std::time::{Duration, Instant};

use crate::error::Result;

/// Runs `f` and returns its result with the wall-clock time it took.
#[inline]
pub fn time<R>(f: impl FnOnce() -> R) -> (R, Duration) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed())
}

/// Number of CPUs this process may run on.
pub fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Pins the calling thread to `core`, counted among the CPUs this process
/// may run on and wrapped around their number.
#[cfg(target_os = "linux")]
pub fn pin_current_thread(core: u32) -> Result<()> {
    use crate::error::HarnessError;

    let affinity_err = |source| HarnessError::Affinity { core, source };

    // SAFETY: `cpu_set_t` is plain old data and all-zero is the empty set;
    // `set` outlives both calls and its size is passed alongside.
    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        if libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut set) != 0 {
            return Err(affinity_err(std::io::Error::last_os_error()));
        }
        let allowed: Vec<usize> = (0..libc::CPU_SETSIZE as usize)
            .filter(|&c| libc::CPU_ISSET(c, &set))
            .collect();
        let cpu = if allowed.is_empty() {
            core as usize % available_cores()
        } else {
            allowed[core as usize % allowed.len()]
        };

        libc::CPU_ZERO(&mut set);
        libc::CPU_SET(cpu, &mut set);
        if libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) != 0 {
            return Err(affinity_err(std::io::Error::last_os_error()));
        }
        tracing::debug!(target: "learned_search::harness", core, cpu, "pinned thread");
    }
    Ok(())
}

/// Thread pinning is only supported on Linux; elsewhere this logs and
/// carries on unpinned.
#[cfg(not(target_os = "linux"))]
pub fn pin_current_thread(core: u32) -> Result<()> {
    tracing::warn!(
        target: "learned_search::harness",
        core,
        "thread pinning is only supported on Linux"
    );
    Ok(())
}
