// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Native status codes and the typed errors built from them.

use crate::error_state;
use std::fmt;
use thiserror::Error;

/// Status codes reported by the native event layer.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnCode {
    Ok = 0,
    Error = 1,
    Timeout = 2,
    Unsupported = 3,
    BadAlloc = 10,
    InvalidArgument = 11,
    WaitSetInvalid = 900,
    WaitSetEmpty = 901,
    WaitSetFull = 902,
    EventInvalid = 2000,
    EventTakeFailed = 2001,
}

impl ReturnCode {
    /// Raw integer value as seen across the native boundary.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.raw())
    }
}

/// A native failure: status code plus the error text captured with it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RclError {
    pub code: ReturnCode,
    pub message: String,
}

impl RclError {
    #[must_use]
    pub fn new(code: ReturnCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Build from `code` and the pending native error text.
    ///
    /// Snapshots and clears the native error state, so this must run before
    /// any other native call on the current thread.
    #[must_use]
    pub fn capture(code: ReturnCode) -> Self {
        Self::new(code, error_state::take_or_default())
    }

    #[must_use]
    pub fn is_bad_alloc(&self) -> bool {
        self.code == ReturnCode::BadAlloc
    }

    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        self.code == ReturnCode::InvalidArgument
    }
}

/// The requested event kind cannot be produced by this source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedEventType {
    base: RclError,
    prefix: String,
}

impl UnsupportedEventType {
    #[must_use]
    pub fn new(base: RclError, prefix: impl Into<String>) -> Self {
        Self {
            base,
            prefix: prefix.into(),
        }
    }

    /// Capture `code` and the pending native error text under `prefix`.
    #[must_use]
    pub fn capture(code: ReturnCode, prefix: impl Into<String>) -> Self {
        Self::new(RclError::capture(code), prefix)
    }

    #[must_use]
    pub fn code(&self) -> ReturnCode {
        self.base.code
    }

    /// Native message, without the prefix.
    #[must_use]
    pub fn native_message(&self) -> &str {
        &self.base.message
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn base(&self) -> &RclError {
        &self.base
    }
}

impl fmt::Display for UnsupportedEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            f.write_str(&self.base.message)
        } else {
            write!(f, "{}: {}", self.prefix, self.base.message)
        }
    }
}

impl std::error::Error for UnsupportedEventType {}

/// Errors surfaced by event handlers.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Couldn't add event to wait set: {0}")]
    Registration(RclError),
    #[error("failed to set the on new event callback for Event: {0}")]
    CallbackInstall(RclError),
    #[error(transparent)]
    UnsupportedEventType(#[from] UnsupportedEventType),
    #[error("Failed to initialize event: {0}")]
    Init(RclError),
}

impl Error {
    /// Native status carried by this error.
    #[must_use]
    pub fn code(&self) -> ReturnCode {
        match self {
            Self::Registration(err) | Self::CallbackInstall(err) | Self::Init(err) => err.code,
            Self::UnsupportedEventType(err) => err.code(),
        }
    }
}

/// Result alias for event handler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Turn a native status into `Ok(())` or the error produced by `wrap`.
pub(crate) fn check(code: ReturnCode, wrap: fn(RclError) -> Error) -> Result<()> {
    match code {
        ReturnCode::Ok => Ok(()),
        other => Err(wrap(RclError::capture(other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_with_prefix() {
        let err = UnsupportedEventType::new(
            RclError::new(ReturnCode::Unsupported, "bad handle"),
            "joiner",
        );
        assert_eq!(err.to_string(), "joiner: bad handle");
        assert_eq!(err.native_message(), "bad handle");
        assert_eq!(err.prefix(), "joiner");
        assert_eq!(err.code(), ReturnCode::Unsupported);
    }

    #[test]
    fn unsupported_without_prefix() {
        let err = UnsupportedEventType::new(
            RclError::new(ReturnCode::Unsupported, "bad handle"),
            "",
        );
        assert_eq!(err.to_string(), "bad handle");
    }

    #[test]
    fn capture_snapshots_and_clears_error_state() {
        error_state::set_error("event type not supported by middleware");
        let err = UnsupportedEventType::capture(ReturnCode::Unsupported, "Failed to initialize event");
        assert!(!error_state::is_set());
        assert_eq!(
            err.to_string(),
            "Failed to initialize event: event type not supported by middleware"
        );

        // A later capture must not see the consumed message.
        let later = RclError::capture(ReturnCode::Error);
        assert_eq!(later.message, error_state::ERROR_NOT_SET);
    }

    #[test]
    fn check_maps_non_ok_codes() {
        assert!(check(ReturnCode::Ok, Error::Registration).is_ok());

        error_state::set_error("wait set is full");
        let err = check(ReturnCode::WaitSetFull, Error::Registration).expect_err("full");
        assert!(matches!(&err, Error::Registration(e) if e.code == ReturnCode::WaitSetFull));
        assert_eq!(err.code(), ReturnCode::WaitSetFull);
        assert_eq!(
            err.to_string(),
            "Couldn't add event to wait set: wait set is full"
        );
    }

    #[test]
    fn unsupported_converts_into_error() {
        let err: Error =
            UnsupportedEventType::new(RclError::new(ReturnCode::Unsupported, "nope"), "x").into();
        assert_eq!(err.code(), ReturnCode::Unsupported);
        assert_eq!(err.to_string(), "x: nope");
    }

    #[test]
    fn classification_helpers() {
        assert!(RclError::new(ReturnCode::BadAlloc, "oom").is_bad_alloc());
        assert!(RclError::new(ReturnCode::InvalidArgument, "null").is_invalid_argument());
        assert!(!RclError::new(ReturnCode::Error, "x").is_bad_alloc());
    }
}
