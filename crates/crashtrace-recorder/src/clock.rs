//! Wall-clock reads that are safe inside signal handlers.

#[cfg(unix)]
use std::mem::MaybeUninit;

/// Seconds and microseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WallTime {
    /// Whole seconds.
    pub secs: u64,
    /// Microseconds within the second.
    pub micros: u32,
}

/// Read the realtime clock.
///
/// Uses `clock_gettime(CLOCK_REALTIME)`, which POSIX lists as
/// async-signal-safe. A failing clock yields the zero time.
#[cfg(unix)]
#[allow(unsafe_code)]
pub fn now() -> WallTime {
    let mut ts = MaybeUninit::<libc::timespec>::zeroed();
    // SAFETY: `ts` points to writable storage for a timespec, including any
    // padding fields the target declares.
    let rc = unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, ts.as_mut_ptr()) };
    // SAFETY: timespec is plain integers, so the zeroed value is initialized
    // whether or not the call filled it.
    let ts = unsafe { ts.assume_init() };
    if rc != 0 || ts.tv_sec < 0 {
        return WallTime::default();
    }
    WallTime {
        secs: ts.tv_sec as u64,
        micros: (ts.tv_nsec / 1_000) as u32,
    }
}

/// Read the realtime clock.
#[cfg(not(unix))]
pub fn now() -> WallTime {
    use std::time::{SystemTime, UNIX_EPOCH};

    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => WallTime {
            secs: d.as_secs(),
            micros: d.subsec_micros(),
        },
        Err(_) => WallTime::default(),
    }
}
