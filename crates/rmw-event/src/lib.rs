// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wait-set readiness and callback adapter for ROS 2 middleware events.
//!
//! An [`EventHandler`] owns one native event (deadline missed, liveliness
//! lost, ...) and exposes it through the [`Waitable`] contract so a reactor
//! can multiplex it next to unrelated sources: register it into a wait-set,
//! wait, then ask whether it was selected. Instead of polling, a callback can
//! be pushed onto the native event; the handler tracks that registration and
//! clears it before finalizing the event, so the runtime never invokes a
//! callback that belongs to a dropped handler.
//!
//! The native layer is abstracted by [`NativeEvent`], [`EventRuntime`] and
//! [`EventWaitSet`]. The [`local`] module implements them in-process.

mod callback;
pub mod env_config;
pub mod error;
pub mod error_state;
mod handler;
pub mod local;
pub mod logging;
pub mod native;
mod waitable;

pub use callback::teardown_failures;
pub use env_config::EnvConfig;
pub use error::{Error, RclError, Result, ReturnCode, UnsupportedEventType};
pub use handler::EventHandler;
pub use native::{
    EventCallback, EventKey, EventKind, EventRuntime, EventStatus, EventWaitSet, NativeEvent,
};
pub use waitable::Waitable;
