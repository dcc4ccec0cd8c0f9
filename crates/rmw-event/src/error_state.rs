// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Native error side channel.
//!
//! The native layer reports failures as a bare [`ReturnCode`](crate::ReturnCode)
//! and leaves a human-readable message in a per-thread slot. Runtime
//! implementations fill the slot with [`set_error`] right before returning a
//! non-`Ok` code; the adapter reads it back exactly once through
//! [`take`], which snapshots and clears it in one step.

use std::cell::RefCell;

/// Message reported when a failure is captured without any error text set.
pub const ERROR_NOT_SET: &str = "error not set";

thread_local! {
    static ERROR_STATE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Record the message for the failure the caller is about to report.
///
/// Overwrites any message that was never consumed.
pub fn set_error(message: impl Into<String>) {
    let message = message.into();
    ERROR_STATE.with(|slot| {
        let mut slot = slot.borrow_mut();
        if let Some(previous) = slot.as_deref() {
            log::debug!("[event] overwriting unread error state: {}", previous);
        }
        *slot = Some(message);
    });
}

/// Drop any pending message without reading it.
pub fn reset() {
    ERROR_STATE.with(|slot| slot.borrow_mut().take());
}

/// Whether a message is currently pending on this thread.
#[must_use]
pub(crate) fn is_set() -> bool {
    ERROR_STATE.with(|slot| slot.borrow().is_some())
}

/// Snapshot the pending message and clear the slot.
pub(crate) fn take() -> Option<String> {
    ERROR_STATE.with(|slot| slot.borrow_mut().take())
}

/// Like [`take`], falling back to [`ERROR_NOT_SET`].
pub(crate) fn take_or_default() -> String {
    take().unwrap_or_else(|| ERROR_NOT_SET.to_string())
}
