// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Event handler: one native event exposed as a [`Waitable`].

use crate::callback::{record_teardown_failure, CallbackRegistration};
use crate::error::{Error, RclError, Result, ReturnCode, UnsupportedEventType};
use crate::error_state;
use crate::native::{
    EventCallback, EventKey, EventKind, EventRuntime, EventStatus, EventWaitSet, NativeEvent,
};
use crate::waitable::Waitable;
use std::sync::Arc;

const INIT_ERROR_PREFIX: &str = "Failed to initialize event";

/// Owns one native event and multiplexes it through wait-sets or a pushed
/// callback.
///
/// On drop the installed callback is cleared before the event is
/// finalized. Failures on that path are logged, counted in
/// [`teardown_failures`](crate::teardown_failures) and swallowed.
pub struct EventHandler<E: NativeEvent, F = fn(EventStatus)> {
    event: Arc<E>,
    wait_set_event_index: usize,
    wait_set_id: Option<u64>,
    on_new_event: Option<CallbackRegistration<E>>,
    event_callback: F,
}

impl<E, F> EventHandler<E, F>
where
    E: NativeEvent,
    F: FnMut(EventStatus),
{
    /// Initialize a native event of `kind` through `runtime`.
    ///
    /// `callback` receives every status passed to [`Waitable::execute`].
    pub fn new<R>(runtime: &R, kind: EventKind, callback: F) -> Result<Self>
    where
        R: EventRuntime<Event = E>,
    {
        match runtime.event_init(kind) {
            Ok(event) => Ok(Self::from_event(event, callback)),
            Err(ReturnCode::Unsupported) => Err(UnsupportedEventType::capture(
                ReturnCode::Unsupported,
                INIT_ERROR_PREFIX,
            )
            .into()),
            Err(code) => Err(Error::Init(RclError::capture(code))),
        }
    }

    /// Wrap an already initialized native event.
    pub fn from_event(event: E, callback: F) -> Self {
        Self {
            event: Arc::new(event),
            wait_set_event_index: 0,
            wait_set_id: None,
            on_new_event: None,
            event_callback: callback,
        }
    }
}

impl<E: NativeEvent, F> EventHandler<E, F> {
    /// Key of the owned native event.
    #[must_use]
    pub fn key(&self) -> EventKey {
        self.event.key()
    }

    pub(crate) fn native(&self) -> &E {
        &self.event
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    /// Slot assigned by the last successful [`Waitable::add_to_wait_set`].
    #[must_use]
    pub fn wait_set_event_index(&self) -> usize {
        self.wait_set_event_index
    }

    #[must_use]
    pub fn has_on_ready_callback(&self) -> bool {
        self.on_new_event.is_some()
    }

    /// Install `callback` on the native event. See
    /// [`Waitable::set_on_new_event_callback`].
    ///
    /// If the native call fails, the previously installed callback stays in
    /// place and the error is returned.
    pub fn set_on_new_event_callback(&mut self, callback: EventCallback) -> Result<()> {
        let registration = CallbackRegistration::install(&self.event, callback)?;
        if let Some(previous) = self.on_new_event.replace(registration) {
            // Already replaced natively; clearing would remove the new one.
            previous.disarm();
        }
        Ok(())
    }

    /// Remove the installed callback, if any. Native failures are logged.
    pub fn clear_on_ready_callback(&mut self) {
        if let Some(registration) = self.on_new_event.take() {
            registration.clear();
        }
    }

    /// Take the pending status, logging and returning `None` on failure.
    pub fn take_data(&mut self) -> Option<EventStatus> {
        match self.event.take() {
            Ok(status) => Some(status),
            Err(code) => {
                let message = error_state::take_or_default();
                log::error!("[event] Couldn't take event info ({}): {}", code, message);
                None
            }
        }
    }
}

impl<E, F> EventHandler<E, F>
where
    E: NativeEvent,
    F: FnMut(EventStatus),
{
    /// Hand `data` to the callback given at construction.
    pub fn execute(&mut self, data: EventStatus) {
        (self.event_callback)(data);
    }
}

impl<E, F, W> Waitable<W> for EventHandler<E, F>
where
    E: NativeEvent,
    F: FnMut(EventStatus),
    W: EventWaitSet<E> + ?Sized,
{
    type Data = EventStatus;

    fn add_to_wait_set(&mut self, wait_set: &mut W) -> Result<()> {
        let index = wait_set
            .add_event(&self.event)
            .map_err(|code| Error::Registration(RclError::capture(code)))?;
        self.wait_set_event_index = index;
        self.wait_set_id = Some(wait_set.instance_id());
        Ok(())
    }

    fn is_ready(&self, wait_set: &W) -> bool {
        match self.wait_set_id {
            Some(id) if id == wait_set.instance_id() => {
                wait_set.ready_event(self.wait_set_event_index) == Some(self.event.key())
            }
            Some(id) => {
                log::error!(
                    "[event] is_ready queried on wait set {} but {} event was added to wait set {}",
                    wait_set.instance_id(),
                    self.event.kind(),
                    id
                );
                false
            }
            None => {
                log::error!(
                    "[event] is_ready queried before {} event was added to a wait set",
                    self.event.kind()
                );
                false
            }
        }
    }

    fn take_data(&mut self) -> Option<EventStatus> {
        EventHandler::take_data(self)
    }

    fn execute(&mut self, data: EventStatus) {
        EventHandler::execute(self, data);
    }

    fn set_on_new_event_callback(&mut self, callback: EventCallback) -> Result<()> {
        EventHandler::set_on_new_event_callback(self, callback)
    }

    fn clear_on_ready_callback(&mut self) {
        EventHandler::clear_on_ready_callback(self);
    }
}

impl<E: NativeEvent, F> Drop for EventHandler<E, F> {
    fn drop(&mut self) {
        // The runtime holds the callback until told otherwise; it has to be
        // gone before the event is finalized.
        self.clear_on_ready_callback();

        let ret = self.event.fini();
        if !ret.is_ok() {
            // Read before logging: the message must be consumed even when
            // error logging is disabled.
            let message = error_state::take_or_default();
            record_teardown_failure();
            log::error!(
                "[event] Error in destruction of {} event handle ({}): {}",
                self.event.kind(),
                ret,
                message
            );
        }
    }
}
