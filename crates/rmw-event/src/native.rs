// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Boundary to the native event layer.
//!
//! These traits describe what the middleware must provide for an event to be
//! multiplexed by [`EventHandler`](crate::EventHandler): an event primitive
//! that can carry one callback, a runtime that creates such primitives per
//! [`EventKind`], and a wait-set that hands out slot indexes and reports
//! which slots are ready after a wait.
//!
//! Every fallible method returns a bare [`ReturnCode`]; on failure the
//! implementation stores its message with
//! [`error_state::set_error`](crate::error_state::set_error) first.

use crate::error::ReturnCode;
use std::fmt;
use std::sync::Arc;

/// Identifier of a native event primitive (stable for the event's lifetime).
pub type EventKey = u64;

/// Callback installed on a native event.
///
/// Invoked by the runtime, possibly from another thread, with the number of
/// events that occurred since the last invocation.
pub type EventCallback = Arc<dyn Fn(usize) + Send + Sync>;

/// QoS event kinds a runtime may be asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    RequestedDeadlineMissed,
    RequestedIncompatibleQos,
    LivelinessChanged,
    MessageLost,
    SubscriptionIncompatibleType,
    SubscriptionMatched,
    OfferedDeadlineMissed,
    OfferedIncompatibleQos,
    LivelinessLost,
    PublisherIncompatibleType,
    PublicationMatched,
}

impl EventKind {
    /// Whether the event is raised on the subscription (reader) side.
    #[must_use]
    pub const fn is_subscription_event(self) -> bool {
        matches!(
            self,
            Self::RequestedDeadlineMissed
                | Self::RequestedIncompatibleQos
                | Self::LivelinessChanged
                | Self::MessageLost
                | Self::SubscriptionIncompatibleType
                | Self::SubscriptionMatched
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RequestedDeadlineMissed => "requested_deadline_missed",
            Self::RequestedIncompatibleQos => "requested_incompatible_qos",
            Self::LivelinessChanged => "liveliness_changed",
            Self::MessageLost => "message_lost",
            Self::SubscriptionIncompatibleType => "subscription_incompatible_type",
            Self::SubscriptionMatched => "subscription_matched",
            Self::OfferedDeadlineMissed => "offered_deadline_missed",
            Self::OfferedIncompatibleQos => "offered_incompatible_qos",
            Self::LivelinessLost => "liveliness_lost",
            Self::PublisherIncompatibleType => "publisher_incompatible_type",
            Self::PublicationMatched => "publication_matched",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status payload taken from a ready event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    /// Requested or offered deadline missed.
    DeadlineMissed {
        total_count: u32,
        total_count_change: u32,
    },
    LivelinessChanged {
        alive_count: u32,
        not_alive_count: u32,
        alive_count_change: i32,
        not_alive_count_change: i32,
    },
    LivelinessLost {
        total_count: u32,
        total_count_change: u32,
    },
    /// Requested or offered QoS incompatible.
    IncompatibleQos {
        total_count: u32,
        total_count_change: u32,
        last_policy_id: u32,
    },
    MessageLost {
        total_count: u64,
        total_count_change: u64,
    },
    IncompatibleType {
        total_count: u32,
        total_count_change: u32,
    },
    /// Subscription or publication matched.
    Matched {
        total_count: u32,
        total_count_change: u32,
        current_count: u32,
        current_count_change: i32,
    },
}

/// One native event primitive.
///
/// Owned exclusively by a single [`EventHandler`](crate::EventHandler),
/// which finalizes it exactly once on drop.
pub trait NativeEvent: Send + Sync {
    /// Key the wait-set stores in the slot this event occupies.
    fn key(&self) -> EventKey;

    fn kind(&self) -> EventKind;

    /// Install (`Some`) or clear (`None`) the callback.
    ///
    /// Installing replaces the previous callback atomically. Once a clear
    /// returns `Ok`, the runtime must not start or still be running an
    /// invocation of the cleared callback.
    fn set_callback(&self, callback: Option<EventCallback>) -> ReturnCode;

    /// Take the pending status.
    fn take(&self) -> Result<EventStatus, ReturnCode>;

    /// Release the native resources. Called exactly once.
    fn fini(&self) -> ReturnCode;
}

/// Creates native events for a given kind.
pub trait EventRuntime {
    type Event: NativeEvent;

    /// Initialize a native event. Reports [`ReturnCode::Unsupported`] when
    /// the middleware cannot produce `kind`.
    fn event_init(&self, kind: EventKind) -> Result<Self::Event, ReturnCode>;
}

/// The wait-set surface an event registers into.
pub trait EventWaitSet<E: ?Sized> {
    /// Place `event` in the next free slot and return its index.
    fn add_event(&mut self, event: &E) -> Result<usize, ReturnCode>;

    /// Key held at `index` after the last wait, `None` if the slot was
    /// nulled (not ready) or is out of range.
    fn ready_event(&self, index: usize) -> Option<EventKey>;

    /// Identity of this wait-set instance.
    fn instance_id(&self) -> u64;
}
