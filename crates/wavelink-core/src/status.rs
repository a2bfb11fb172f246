// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Hot-path return codes.
//!
//! A handful of operations (reading the next packet out of a FEC block,
//! refreshing a session) return a routine "nothing to do yet" or "please
//! retire me" outcome far more often than an actual error. Modeling those
//! with `Result`/`?` would make every caller pay `match` overhead for
//! control flow that isn't exceptional. `Status` carries that control flow;
//! genuine errors still go through [`crate::error::WavelinkError`].

/// Outcome of a hot-path operation that is not naturally `Result`-shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The operation completed normally.
    Ok,
    /// No packet is available right now; try again later.
    Drain,
    /// The component has latched dead. Every subsequent call returns this.
    Abort,
    /// The caller (session, slot) should be retired.
    Finish,
    /// No route matched; caller decides whether to auto-create.
    NoRoute,
}

impl Status {
    /// True for [`Status::Ok`].
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }
}
