// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::error::Result;
use crate::native::EventCallback;

/// Contract a reactor uses to multiplex a source through a wait-set `W`.
///
/// Per wait cycle the reactor calls [`add_to_wait_set`](Self::add_to_wait_set)
/// while building the wait-set, blocks on the wait-set, then asks
/// [`is_ready`](Self::is_ready) and, when ready, takes and executes the data.
/// Callbacks may be installed or cleared at any time outside a wait cycle.
pub trait Waitable<W: ?Sized> {
    /// Payload moved from [`take_data`](Self::take_data) to
    /// [`execute`](Self::execute).
    type Data;

    /// Number of wait-set slots this source occupies.
    ///
    /// Sources backed by several native conditions must override this and
    /// keep their slot bookkeeping consistent with it.
    fn number_of_ready_events(&self) -> usize {
        1
    }

    /// Register into `wait_set`, remembering the slot for [`is_ready`](Self::is_ready).
    fn add_to_wait_set(&mut self, wait_set: &mut W) -> Result<()>;

    /// Whether the last wait on `wait_set` selected this source.
    ///
    /// Only meaningful after a wait on the wait-set last passed to
    /// [`add_to_wait_set`](Self::add_to_wait_set).
    fn is_ready(&self, wait_set: &W) -> bool;

    fn take_data(&mut self) -> Option<Self::Data>;

    fn execute(&mut self, data: Self::Data);

    /// Have the runtime push readiness through `callback` instead of (or in
    /// addition to) wait-set polling. Replaces any callback set before.
    fn set_on_new_event_callback(&mut self, callback: EventCallback) -> Result<()>;

    /// Remove the callback, if any. Never fails.
    fn clear_on_ready_callback(&mut self);
}
