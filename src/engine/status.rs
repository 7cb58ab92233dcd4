// ABOUTME: Per-handle result cell the send-completion callback writes and the poll loop reads
// ABOUTME: Shared with the engine through an opaque pointer instead of process-wide callback state

use crate::datatypes::ErrorCode;
use std::ffi::c_void;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Snapshot of the last send attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendStatus {
    /// `Timeout` while no confirmation has arrived
    pub code: ErrorCode,
    /// Message reference reported with the confirmation
    pub reference: Option<i32>,
}

impl SendStatus {
    const PENDING: SendStatus = SendStatus {
        code: ErrorCode::Timeout,
        reference: None,
    };

    /// Returns true while no confirmation has been recorded
    pub fn is_pending(&self) -> bool {
        self.code == ErrorCode::Timeout
    }
}

impl Default for SendStatus {
    fn default() -> Self {
        Self::PENDING
    }
}

/// Single-slot cell holding the outcome of the current send attempt.
///
/// Cloning shares the slot. The engine receives a clone when the completion
/// callback is registered and keeps it alive for as long as the callback can
/// fire.
#[derive(Debug, Clone, Default)]
pub struct StatusSlot {
    inner: Arc<Mutex<SendStatus>>,
}

impl StatusSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts the slot back into the pending (`Timeout`) state before a submission
    pub fn reset(&self) {
        *self.lock() = SendStatus::PENDING;
    }

    /// Records a confirmation as delivered by the native callback.
    ///
    /// Status `0` means the network accepted the message; anything else is
    /// reported as `ErrorCode::Unknown`. Only the first confirmation after a
    /// reset is kept.
    pub fn complete(&self, status: i32, reference: i32) {
        Self::write(&self.inner, status, reference);
    }

    /// Current status
    pub fn get(&self) -> SendStatus {
        *self.lock()
    }

    /// Current status code
    pub fn code(&self) -> ErrorCode {
        self.lock().code
    }

    /// Opaque pointer handed to C as callback user data.
    ///
    /// Valid for as long as a clone of this slot is alive.
    pub fn as_ptr(&self) -> *mut c_void {
        Arc::as_ptr(&self.inner).cast_mut().cast()
    }

    /// Records a confirmation through a pointer obtained from [`StatusSlot::as_ptr`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from `as_ptr` on a slot that is still alive.
    pub unsafe fn complete_raw(ptr: *mut c_void, status: i32, reference: i32) {
        // SAFETY: the caller guarantees ptr points at the live Mutex owned by the slot's Arc
        let cell = unsafe { &*ptr.cast_const().cast::<Mutex<SendStatus>>() };
        Self::write(cell, status, reference);
    }

    fn write(cell: &Mutex<SendStatus>, status: i32, reference: i32) {
        let mut current = cell.lock().unwrap_or_else(PoisonError::into_inner);
        if !current.is_pending() {
            return;
        }
        current.code = if status == 0 {
            ErrorCode::Ok
        } else {
            ErrorCode::Unknown
        };
        current.reference = Some(reference);
    }

    fn lock(&self) -> MutexGuard<'_, SendStatus> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
