// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The per-stream session abstraction a [`super::group::ReceiverSessionGroup`]
//! owns and drives.

use std::time::Instant;

use wavelink_core::error::Result;
use wavelink_core::packet::Packet;
use wavelink_core::status::Status;

/// A single sender's audio stream as seen by the receiver: FEC reader,
/// depacketizer, and jitter metrics wired together. The concrete wiring is
/// left to the pipeline layer; the session group only needs this boundary.
pub trait Session: Send {
    /// Routes one inbound transport packet to this session.
    ///
    /// # Errors
    /// A session-fatal error here removes the session from its group; it
    /// does not affect the group or any other session.
    fn handle_packet(&mut self, packet: &Packet) -> Result<()>;

    /// Periodic tick: timeouts, metrics rollover. `Finish`/`Abort` tells the
    /// owning group to remove this session; anything else means "still
    /// alive".
    fn refresh(&mut self, now: Instant) -> Status;

    /// The next time this session wants another `refresh` call, if any.
    fn next_deadline(&self) -> Option<Instant>;
}
