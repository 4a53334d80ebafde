//! C-compatible status codes.

/// Status returned by the `int32_t` FFI functions.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrashtraceStatus {
    /// Success.
    Ok = 0,
    /// An argument is null or out of range. Nothing was recorded.
    InvalidArgument = -1,
    /// The handle was not produced by `crashtrace_begin*`.
    InvalidHandle = -2,
    /// The slot was already ended or has been taken over by a newer trace.
    SlotReclaimed = -3,
}

impl From<CrashtraceStatus> for i32 {
    fn from(status: CrashtraceStatus) -> Self {
        status as i32
    }
}
