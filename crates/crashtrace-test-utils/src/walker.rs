//! Deterministic stack walkers.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use crashtrace_recorder::StackWalker;

/// Yields a fixed list of return addresses.
///
/// With `interrupt_after: Some(n)` the walk panics after `n` frames have
/// been visited, standing in for a process killed mid-capture. Wrap the
/// recording call in [`interrupted`] to contain the panic.
#[derive(Clone, Debug, Default)]
pub struct ScriptedWalker {
    pub frames: Vec<usize>,
    pub interrupt_after: Option<usize>,
}

impl ScriptedWalker {
    pub fn new(frames: Vec<usize>) -> Self {
        Self {
            frames,
            interrupt_after: None,
        }
    }

    /// A walker that dies after visiting `after` frames.
    pub fn interrupted_after(frames: Vec<usize>, after: usize) -> Self {
        Self {
            frames,
            interrupt_after: Some(after),
        }
    }
}

impl StackWalker for ScriptedWalker {
    fn walk(&self, visit: &mut dyn FnMut(usize) -> bool) {
        for (visited, &ip) in self.frames.iter().enumerate() {
            if self.interrupt_after == Some(visited) {
                panic!("stack walk interrupted after {visited} frames");
            }
            if !visit(ip) {
                return;
            }
        }
    }
}

/// `n` distinct, non-zero, plausible-looking return addresses.
pub fn frame_addrs(n: usize) -> Vec<usize> {
    (1..=n).map(|i| 0x0040_1000 + i * 0x24).collect()
}

thread_local! {
    static QUIET: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Run `f`, which is expected to be cut short by an interrupted walker.
///
/// Returns true if it was. The panic message is suppressed for this thread
/// only; panics on other threads still reach the previously installed hook.
pub fn interrupted(f: impl FnOnce()) -> bool {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !QUIET.with(Cell::get) {
                previous(info);
            }
        }));
    });
    let was_quiet = QUIET.with(|q| q.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    QUIET.with(|q| q.set(was_quiet));
    result.is_err()
}
