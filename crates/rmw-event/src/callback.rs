// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scoped ownership of a callback installed on a native event.

use crate::error::{check, Error, Result};
use crate::error_state;
use crate::native::{EventCallback, NativeEvent};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static TEARDOWN_FAILURES: AtomicU64 = AtomicU64::new(0);

/// Number of teardown steps (callback clear or event finalize) that failed
/// in this process. Such failures are logged and never propagated.
#[must_use]
pub fn teardown_failures() -> u64 {
    TEARDOWN_FAILURES.load(Ordering::Relaxed)
}

pub(crate) fn record_teardown_failure() {
    TEARDOWN_FAILURES.fetch_add(1, Ordering::Relaxed);
}

/// Token for a callback currently installed on `event`.
///
/// Clears the native callback when dropped while armed.
pub(crate) struct CallbackRegistration<E: NativeEvent> {
    event: Arc<E>,
    active: bool,
}

impl<E: NativeEvent> CallbackRegistration<E> {
    /// Install `callback`, replacing whatever the event held before.
    ///
    /// On failure nothing is returned, so an existing registration stays
    /// armed and its callback stays installed.
    pub(crate) fn install(event: &Arc<E>, callback: EventCallback) -> Result<Self> {
        check(event.set_callback(Some(callback)), Error::CallbackInstall)?;
        Ok(Self {
            event: Arc::clone(event),
            active: true,
        })
    }

    /// Drop without clearing. Used when a newer registration already
    /// replaced this callback on the native side.
    pub(crate) fn disarm(mut self) {
        self.active = false;
    }

    pub(crate) fn clear(mut self) {
        self.clear_inner();
    }

    fn clear_inner(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        let ret = self.event.set_callback(None);
        if !ret.is_ok() {
            let message = error_state::take_or_default();
            record_teardown_failure();
            log::error!(
                "[event] failed to clear on-ready callback for {} event ({}): {}",
                self.event.kind(),
                ret,
                message
            );
        }
    }
}

impl<E: NativeEvent> Drop for CallbackRegistration<E> {
    fn drop(&mut self) {
        self.clear_inner();
    }
}
