// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Structured error types for the wavelink transport core.
//!
//! Errors are grouped by how the caller is expected to react, not by which
//! subsystem raised them: a malformed packet and an out-of-range ESI are
//! both [`WavelinkError::Malformed`] even though they originate in
//! different modules, because both mean "drop this one packet and keep
//! going".

use thiserror::Error;

/// Main error type for wavelink operations.
#[derive(Debug, Error)]
pub enum WavelinkError {
    /// A single packet is malformed or violates a block invariant.
    ///
    /// The caller drops the packet and keeps the component alive.
    #[error("malformed packet: {0}")]
    Malformed(String),

    /// No session or slot matches the requested key.
    #[error("no route for packet")]
    NoRoute,

    /// The owning session must be retired; the group/router keeps running.
    #[error("session fatal: {0}")]
    SessionFatal(String),

    /// The component has latched dead; all further operations are no-ops.
    #[error("component fatal: {0}")]
    ComponentFatal(String),

    /// Allocation failed.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// I/O error surfaced while resolving an endpoint or file URI.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for results using [`WavelinkError`].
pub type Result<T> = std::result::Result<T, WavelinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = WavelinkError::Malformed("bad esi".to_string());
        assert_eq!(err.to_string(), "malformed packet: bad esi");

        let err = WavelinkError::NoRoute;
        assert_eq!(err.to_string(), "no route for packet");
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: WavelinkError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }
}
