//! Stack walking primitives used to fill a record's frames.
//!
//! A walker hands return addresses to a visitor, innermost frame first,
//! until the visitor returns `false` or the stack ends. Walkers run on the
//! recording path, so they must not allocate, lock, or panic on a damaged
//! stack; stopping early is always acceptable.

/// Source of return addresses for the current thread.
pub trait StackWalker {
    /// Visit return addresses from the innermost frame outward.
    ///
    /// `visit` returns `false` once it wants no more frames.
    fn walk(&self, visit: &mut dyn FnMut(usize) -> bool);
}

impl<W: StackWalker + ?Sized> StackWalker for &W {
    fn walk(&self, visit: &mut dyn FnMut(usize) -> bool) {
        (**self).walk(visit)
    }
}

/// Walks the real call stack with the platform unwinder.
///
/// Uses `backtrace::trace_unsynchronized`, which skips the global lock the
/// synchronized variant takes. Unwinding metadata is read in place; no
/// symbols are resolved.
#[derive(Clone, Copy, Debug, Default)]
pub struct BacktraceWalker;

impl StackWalker for BacktraceWalker {
    #[inline(never)]
    #[allow(unsafe_code)]
    fn walk(&self, visit: &mut dyn FnMut(usize) -> bool) {
        // SAFETY: the libunwind and frame-pointer backends used on unix
        // targets are reentrant. On Windows dbghelp is not; callers there
        // accept best-effort frames from concurrent walks.
        unsafe {
            backtrace::trace_unsynchronized(|frame| {
                let ip = frame.ip() as usize;
                // A zero ip marks the end of a broken chain.
                if ip == 0 {
                    return false;
                }
                visit(ip)
            });
        }
    }
}

/// Records no frames. For contexts where even unwinding is unsafe.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullWalker;

impl StackWalker for NullWalker {
    fn walk(&self, _visit: &mut dyn FnMut(usize) -> bool) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(walker: &impl StackWalker, limit: usize) -> Vec<usize> {
        let mut out = Vec::new();
        walker.walk(&mut |ip| {
            out.push(ip);
            out.len() < limit
        });
        out
    }

    #[test]
    fn backtrace_walker_sees_this_stack() {
        let frames = collect(&BacktraceWalker, 64);
        assert!(!frames.is_empty(), "expected at least one frame");
        assert!(frames.iter().all(|&ip| ip != 0));
    }

    #[test]
    fn backtrace_walker_honours_stop() {
        let frames = collect(&BacktraceWalker, 2);
        assert!(frames.len() <= 2);
    }

    #[test]
    fn null_walker_visits_nothing() {
        assert!(collect(&NullWalker, 64).is_empty());
    }

    #[test]
    fn reference_forwards_to_inner_walker() {
        let walker = NullWalker;
        let by_ref: &dyn StackWalker = &walker;
        assert!(collect(&by_ref, 8).is_empty());
    }
}
