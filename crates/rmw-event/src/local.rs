// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process event runtime.
//!
//! Implements the native traits without a middleware behind them: events are
//! raised through an [`EventNotifier`], wait-sets block on a condition
//! variable shared by every object created from the same [`LocalContext`].
//! Useful for reactors that multiplex locally generated events and for
//! exercising handlers in tests.

use crate::env_config::EnvConfig;
use crate::error::ReturnCode;
use crate::error_state;
use crate::handler::EventHandler;
use crate::native::{
    EventCallback, EventKey, EventKind, EventRuntime, EventStatus, EventWaitSet, NativeEvent,
};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Slots per wait-set when no capacity is configured.
pub const DEFAULT_WAIT_SET_CAPACITY: usize = 64;

static NEXT_EVENT_KEY: AtomicU64 = AtomicU64::new(1);
static NEXT_WAIT_SET_ID: AtomicU64 = AtomicU64::new(1);

/// Factory for local events and wait-sets.
#[derive(Clone)]
pub struct LocalContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    generation: Mutex<u64>,
    wake: Condvar,
    unsupported: Mutex<Vec<EventKind>>,
    wait_set_capacity: usize,
}

impl ContextInner {
    fn notify(&self) {
        let mut generation = self.generation.lock();
        *generation = generation.wrapping_add(1);
        self.wake.notify_all();
    }
}

impl Default for LocalContext {
    fn default() -> Self {
        Self::with_wait_set_capacity(DEFAULT_WAIT_SET_CAPACITY)
    }
}

impl LocalContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Context whose default wait-sets hold `capacity` slots.
    #[must_use]
    pub fn with_wait_set_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                generation: Mutex::new(0),
                wake: Condvar::new(),
                unsupported: Mutex::new(Vec::new()),
                wait_set_capacity: capacity,
            }),
        }
    }

    #[must_use]
    pub fn from_config(config: &EnvConfig) -> Self {
        Self::with_wait_set_capacity(config.wait_set_capacity)
    }

    /// Make [`EventRuntime::event_init`] refuse `kind`.
    pub fn mark_unsupported(&self, kind: EventKind) {
        let mut unsupported = self.inner.unsupported.lock();
        if !unsupported.contains(&kind) {
            unsupported.push(kind);
        }
    }

    /// Create an event directly, bypassing the supported-kind check.
    #[must_use]
    pub fn create_event(&self, kind: EventKind) -> LocalEvent {
        LocalEvent {
            shared: Arc::new(EventShared {
                key: NEXT_EVENT_KEY.fetch_add(1, Ordering::Relaxed),
                kind,
                context: Arc::clone(&self.inner),
                state: Mutex::new(EventState::default()),
            }),
        }
    }

    #[must_use]
    pub fn create_wait_set(&self, capacity: usize) -> LocalWaitSet {
        LocalWaitSet {
            id: NEXT_WAIT_SET_ID.fetch_add(1, Ordering::Relaxed),
            context: Arc::clone(&self.inner),
            capacity,
            events: Vec::with_capacity(capacity),
            members: Vec::with_capacity(capacity),
        }
    }

    /// Wait-set sized by the context's configured capacity.
    #[must_use]
    pub fn create_default_wait_set(&self) -> LocalWaitSet {
        self.create_wait_set(self.inner.wait_set_capacity)
    }
}

impl EventRuntime for LocalContext {
    type Event = LocalEvent;

    fn event_init(&self, kind: EventKind) -> Result<LocalEvent, ReturnCode> {
        if self.inner.unsupported.lock().contains(&kind) {
            error_state::set_error(format!(
                "event type '{}' is not supported by the local runtime",
                kind
            ));
            return Err(ReturnCode::Unsupported);
        }
        Ok(self.create_event(kind))
    }
}

struct EventShared {
    key: EventKey,
    kind: EventKind,
    context: Arc<ContextInner>,
    state: Mutex<EventState>,
}

#[derive(Default)]
struct EventState {
    /// Events not yet taken; drives wait-set readiness.
    pending: usize,
    /// Events not yet reported to a callback.
    unread: usize,
    latest: Option<EventStatus>,
    callback: Option<EventCallback>,
    finalized: bool,
}

impl EventShared {
    fn is_ready(&self) -> bool {
        let state = self.state.lock();
        !state.finalized && state.pending > 0
    }
}

/// Native event backed by process memory.
pub struct LocalEvent {
    shared: Arc<EventShared>,
}

impl LocalEvent {
    /// Producer handle raising this event.
    #[must_use]
    pub fn notifier(&self) -> EventNotifier {
        EventNotifier {
            shared: Arc::clone(&self.shared),
        }
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.state.lock().pending
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.shared.state.lock().finalized
    }
}

impl NativeEvent for LocalEvent {
    fn key(&self) -> EventKey {
        self.shared.key
    }

    fn kind(&self) -> EventKind {
        self.shared.kind
    }

    fn set_callback(&self, callback: Option<EventCallback>) -> ReturnCode {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;
        if state.finalized {
            error_state::set_error("cannot set callback on a finalized event");
            return ReturnCode::EventInvalid;
        }

        if let Some(callback) = &callback {
            // Report what happened while nobody was listening.
            if state.unread > 0 {
                callback(state.unread);
                state.unread = 0;
            }
        }
        state.callback = callback;
        ReturnCode::Ok
    }

    fn take(&self) -> Result<EventStatus, ReturnCode> {
        let mut state = self.shared.state.lock();
        if state.finalized {
            error_state::set_error("cannot take from a finalized event");
            return Err(ReturnCode::EventInvalid);
        }
        match state.latest.take() {
            Some(status) => {
                state.pending = 0;
                Ok(status)
            }
            None => {
                error_state::set_error("no event status available");
                Err(ReturnCode::EventTakeFailed)
            }
        }
    }

    fn fini(&self) -> ReturnCode {
        let mut state = self.shared.state.lock();
        if state.finalized {
            error_state::set_error("event already finalized");
            return ReturnCode::EventInvalid;
        }
        *state = EventState {
            finalized: true,
            ..EventState::default()
        };
        ReturnCode::Ok
    }
}

impl<F> EventHandler<LocalEvent, F> {
    /// Producer handle for the owned event.
    #[must_use]
    pub fn notifier(&self) -> EventNotifier {
        self.native().notifier()
    }
}

/// Raises a [`LocalEvent`] from any thread.
#[derive(Clone)]
pub struct EventNotifier {
    shared: Arc<EventShared>,
}

impl EventNotifier {
    /// Record `status` as the latest event.
    ///
    /// The installed callback, if any, runs on the calling thread while the
    /// event lock is held, so it must not call back into the same event.
    /// Notifying other events from the callback is fine.
    /// Returns `false` once the event has been finalized.
    pub fn notify(&self, status: EventStatus) -> bool {
        {
            let mut guard = self.shared.state.lock();
            let state = &mut *guard;
            if state.finalized {
                log::trace!(
                    "[event] dropping {} notification for finalized event",
                    self.shared.kind
                );
                return false;
            }
            state.pending += 1;
            state.latest = Some(status);
            match &state.callback {
                Some(callback) => callback(1),
                None => state.unread += 1,
            }
        }
        self.shared.context.notify();
        true
    }
}

/// Fixed-capacity wait-set over [`LocalEvent`]s.
pub struct LocalWaitSet {
    id: u64,
    context: Arc<ContextInner>,
    capacity: usize,
    events: Vec<Option<EventKey>>,
    members: Vec<Arc<EventShared>>,
}

impl LocalWaitSet {
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Remove every registration, keeping the capacity.
    pub fn clear(&mut self) {
        self.events.clear();
        self.members.clear();
    }

    /// Change the capacity. Clears all registrations.
    pub fn resize(&mut self, capacity: usize) {
        self.clear();
        self.capacity = capacity;
    }

    /// Block until at least one member has pending events.
    ///
    /// Afterwards every slot whose event is not ready is nulled. Returns
    /// [`ReturnCode::Timeout`] (all slots nulled) when `timeout` elapses
    /// first, [`ReturnCode::WaitSetEmpty`] without members.
    pub fn wait(&mut self, timeout: Option<Duration>) -> Result<(), ReturnCode> {
        if self.members.is_empty() {
            error_state::set_error("wait set is empty");
            return Err(ReturnCode::WaitSetEmpty);
        }

        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let context = Arc::clone(&self.context);
        loop {
            // Member locks are never taken under the generation lock:
            // callbacks run under an event lock and may notify other events.
            let seen = *context.generation.lock();
            if self.collect_ready() {
                return Ok(());
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(ReturnCode::Timeout);
            }

            let mut generation = context.generation.lock();
            if *generation != seen {
                continue;
            }
            match deadline {
                None => context.wake.wait(&mut generation),
                Some(deadline) => {
                    // Timed out or woken, the next pass rescans.
                    let _ = context.wake.wait_until(&mut generation, deadline);
                }
            }
        }
    }

    fn collect_ready(&mut self) -> bool {
        let mut any_ready = false;
        for (slot, member) in self.events.iter_mut().zip(&self.members) {
            let ready = member.is_ready();
            *slot = ready.then_some(member.key);
            any_ready |= ready;
        }
        any_ready
    }
}

impl EventWaitSet<LocalEvent> for LocalWaitSet {
    fn add_event(&mut self, event: &LocalEvent) -> Result<usize, ReturnCode> {
        if !Arc::ptr_eq(&event.shared.context, &self.context) {
            error_state::set_error("event and wait set belong to different contexts");
            return Err(ReturnCode::InvalidArgument);
        }
        if event.is_finalized() {
            error_state::set_error("cannot add a finalized event to a wait set");
            return Err(ReturnCode::EventInvalid);
        }
        if self.members.len() >= self.capacity {
            error_state::set_error(format!(
                "wait set capacity exceeded (max {})",
                self.capacity
            ));
            return Err(ReturnCode::WaitSetFull);
        }

        let index = self.members.len();
        self.events.push(Some(event.shared.key));
        self.members.push(Arc::clone(&event.shared));
        Ok(index)
    }

    fn ready_event(&self, index: usize) -> Option<EventKey> {
        self.events.get(index).copied().flatten()
    }

    fn instance_id(&self) -> u64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::thread;

    fn deadline(count: u32) -> EventStatus {
        EventStatus::DeadlineMissed {
            total_count: count,
            total_count_change: 1,
        }
    }

    #[test]
    fn wait_selects_only_notified_events() {
        let ctx = LocalContext::new();
        let a = ctx.create_event(EventKind::RequestedDeadlineMissed);
        let b = ctx.create_event(EventKind::LivelinessChanged);
        let mut ws = ctx.create_wait_set(4);

        let slot_a = ws.add_event(&a).expect("add a");
        let slot_b = ws.add_event(&b).expect("add b");
        assert_eq!((slot_a, slot_b), (0, 1));

        a.notifier().notify(deadline(1));
        ws.wait(Some(Duration::from_millis(10))).expect("wait");

        assert_eq!(ws.ready_event(slot_a), Some(a.key()));
        assert_eq!(ws.ready_event(slot_b), None);
    }

    #[test]
    fn wait_times_out_and_nulls_slots() {
        let ctx = LocalContext::new();
        let a = ctx.create_event(EventKind::LivelinessLost);
        let mut ws = ctx.create_wait_set(1);
        let slot = ws.add_event(&a).expect("add");

        let result = ws.wait(Some(Duration::from_millis(5)));
        assert_eq!(result, Err(ReturnCode::Timeout));
        assert_eq!(ws.ready_event(slot), None);
    }

    #[test]
    fn wait_on_empty_set_fails() {
        let ctx = LocalContext::new();
        let mut ws = ctx.create_wait_set(1);
        assert_eq!(ws.wait(Some(Duration::ZERO)), Err(ReturnCode::WaitSetEmpty));
        assert_eq!(error_state::take().as_deref(), Some("wait set is empty"));
    }

    #[test]
    fn add_beyond_capacity_reports_full() {
        let ctx = LocalContext::new();
        let a = ctx.create_event(EventKind::MessageLost);
        let b = ctx.create_event(EventKind::MessageLost);
        let mut ws = ctx.create_wait_set(1);

        ws.add_event(&a).expect("first");
        assert_eq!(ws.add_event(&b), Err(ReturnCode::WaitSetFull));
        assert_eq!(
            error_state::take().as_deref(),
            Some("wait set capacity exceeded (max 1)")
        );
        assert_eq!(ws.len(), 1);
    }

    #[test]
    fn resize_clears_registrations() {
        let ctx = LocalContext::new();
        let a = ctx.create_event(EventKind::MessageLost);
        let mut ws = ctx.create_wait_set(1);
        ws.add_event(&a).expect("add");

        ws.resize(3);
        assert!(ws.is_empty());
        assert_eq!(ws.capacity(), 3);
    }

    #[test]
    fn events_from_other_context_are_rejected() {
        let ctx = LocalContext::new();
        let other = LocalContext::new();
        let foreign = other.create_event(EventKind::MessageLost);
        let mut ws = ctx.create_wait_set(2);
        assert_eq!(ws.add_event(&foreign), Err(ReturnCode::InvalidArgument));
        error_state::reset();
    }

    #[test]
    fn notify_from_other_thread_wakes_wait() {
        let ctx = LocalContext::new();
        let event = ctx.create_event(EventKind::SubscriptionMatched);
        let mut ws = ctx.create_wait_set(1);
        let slot = ws.add_event(&event).expect("add");

        let notifier = event.notifier();
        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            notifier.notify(EventStatus::Matched {
                total_count: 1,
                total_count_change: 1,
                current_count: 1,
                current_count_change: 1,
            })
        });

        ws.wait(Some(Duration::from_secs(5))).expect("woken");
        assert_eq!(ws.ready_event(slot), Some(event.key()));
        assert!(producer.join().expect("join"));
    }

    #[test]
    fn callback_may_notify_another_event_during_wait() {
        let ctx = LocalContext::new();
        let a = ctx.create_event(EventKind::LivelinessChanged);
        let b = ctx.create_event(EventKind::RequestedDeadlineMissed);
        let relay = b.notifier();
        let ret = a.set_callback(Some(Arc::new(move |_| {
            // Still inside the event lock when the waiter's timeout fires.
            thread::sleep(Duration::from_millis(100));
            relay.notify(deadline(1));
        })));
        assert_eq!(ret, ReturnCode::Ok);

        let mut ws = ctx.create_wait_set(1);
        ws.add_event(&a).expect("add");

        let (waited_tx, waited_rx) = mpsc::channel();
        let waiter = thread::spawn(move || {
            let _ = waited_tx.send(ws.wait(Some(Duration::from_millis(20))));
        });
        let (notified_tx, notified_rx) = mpsc::channel();
        let notifier = a.notifier();
        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            let _ = notified_tx.send(notifier.notify(deadline(1)));
        });

        let waited = waited_rx
            .recv_timeout(Duration::from_secs(3))
            .expect("wait returned");
        assert!(matches!(waited, Ok(()) | Err(ReturnCode::Timeout)));
        assert!(notified_rx
            .recv_timeout(Duration::from_secs(3))
            .expect("notify returned"));
        waiter.join().expect("join waiter");
        producer.join().expect("join producer");
        assert_eq!(b.pending(), 1);
    }

    #[test]
    fn callback_receives_unread_events_on_install() {
        let ctx = LocalContext::new();
        let event = ctx.create_event(EventKind::OfferedDeadlineMissed);
        let notifier = event.notifier();
        notifier.notify(deadline(1));
        notifier.notify(deadline(2));

        let seen = Arc::new(AtomicUsize::new(0));
        let seen_cb = Arc::clone(&seen);
        let ret = event.set_callback(Some(Arc::new(move |count| {
            seen_cb.fetch_add(count, Ordering::SeqCst);
        })));
        assert_eq!(ret, ReturnCode::Ok);
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        notifier.notify(deadline(3));
        assert_eq!(seen.load(Ordering::SeqCst), 3);
        // Callback delivery does not consume readiness.
        assert_eq!(event.pending(), 3);
    }

    #[test]
    fn take_returns_latest_and_resets_pending() {
        let ctx = LocalContext::new();
        let event = ctx.create_event(EventKind::OfferedDeadlineMissed);
        event.notifier().notify(deadline(1));
        event.notifier().notify(deadline(2));

        assert_eq!(event.take(), Ok(deadline(2)));
        assert_eq!(event.pending(), 0);
        assert_eq!(event.take(), Err(ReturnCode::EventTakeFailed));
        error_state::reset();
    }

    #[test]
    fn finalized_event_rejects_everything() {
        let ctx = LocalContext::new();
        let event = ctx.create_event(EventKind::LivelinessLost);
        let notifier = event.notifier();

        assert_eq!(event.fini(), ReturnCode::Ok);
        assert!(!notifier.notify(deadline(1)));
        assert_eq!(event.set_callback(None), ReturnCode::EventInvalid);
        assert_eq!(event.fini(), ReturnCode::EventInvalid);
        assert_eq!(error_state::take().as_deref(), Some("event already finalized"));

        let mut ws = ctx.create_wait_set(1);
        assert_eq!(ws.add_event(&event), Err(ReturnCode::EventInvalid));
        error_state::reset();
    }

    #[test]
    fn unsupported_kinds_are_refused() {
        let ctx = LocalContext::new();
        ctx.mark_unsupported(EventKind::PublisherIncompatibleType);

        assert!(ctx.event_init(EventKind::PublicationMatched).is_ok());
        assert_eq!(
            ctx.event_init(EventKind::PublisherIncompatibleType).err(),
            Some(ReturnCode::Unsupported)
        );
        assert_eq!(
            error_state::take().as_deref(),
            Some("event type 'publisher_incompatible_type' is not supported by the local runtime")
        );
    }

    #[test]
    fn default_wait_set_uses_configured_capacity() {
        let config = EnvConfig {
            wait_set_capacity: 3,
            ..EnvConfig::default()
        };
        let ctx = LocalContext::from_config(&config);
        assert_eq!(ctx.create_default_wait_set().capacity(), 3);
        assert_eq!(
            LocalContext::new().create_default_wait_set().capacity(),
            DEFAULT_WAIT_SET_CAPACITY
        );
    }
}
