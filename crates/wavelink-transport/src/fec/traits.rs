// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Collaborator boundaries the FEC writer and reader delegate to.
//!
//! Byte-level RTP/FEC framing is out of scope here; these traits let the
//! writer/reader operate purely on [`wavelink_core::packet::Packet`]'s
//! structured views, while leaving the actual wire encoding (RFC 3550 /
//! RFC 6363 framing) to whatever composer/parser the surrounding pipeline
//! plugs in.

use wavelink_core::error::Result;
use wavelink_core::packet::Packet;

/// Forwards a fully composed packet downstream (to the per-interface
/// router on the sender, or to the next pipeline stage on the receiver).
pub trait PacketSink: Send {
    fn write(&mut self, packet: Packet) -> Result<()>;
}

/// Prepares and finalizes outgoing packets. `align`/`prepare` happen before
/// the FEC fields are known to be final; `compose` finalizes the packet
/// once its views are fully populated.
pub trait Composer: Send {
    /// Buffer size the composer needs reserved to hold `payload_size` bytes
    /// of payload at the given codec `alignment`.
    fn align(&self, payload_size: usize, alignment: usize) -> usize;
    /// Allocates/sets the packet's backing buffer to hold `payload_size`
    /// bytes of payload and marks it `Prepared`.
    fn prepare(&self, packet: &Packet, payload_size: usize) -> Result<()>;
    /// Finalizes the packet's wire representation and marks it `Composed`.
    fn compose(&self, packet: &Packet) -> Result<()>;
}

/// Re-parses a packet's buffer into its RTP view after FEC reconstruction
/// has filled in the payload.
pub trait Parser: Send {
    fn parse(&self, packet: &Packet) -> Result<()>;
}

/// A pull-based upstream of already-parsed, FEC-aware packets. Used by the
/// block reader for its `source_reader`/`repair_reader` inputs.
pub trait PacketSource: Send {
    /// Returns the next available packet, or `None` if the source is
    /// momentarily drained (not necessarily permanently).
    fn read(&mut self) -> Result<Option<Packet>>;
}

/// A [`Composer`]/[`Parser`] pair that trusts the packet's views are
/// already populated and simply flips the lifecycle flags. Useful in
/// tests and for pipelines that compose RTP/FEC headers upstream of this
/// crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughComposer;

impl Composer for PassthroughComposer {
    fn align(&self, payload_size: usize, alignment: usize) -> usize {
        if alignment == 0 {
            payload_size
        } else {
            payload_size.div_ceil(alignment) * alignment
        }
    }

    fn prepare(&self, packet: &Packet, payload_size: usize) -> Result<()> {
        packet.prepare(payload_size);
        Ok(())
    }

    fn compose(&self, packet: &Packet) -> Result<()> {
        packet.add_flags(wavelink_core::packet::PacketFlags::COMPOSED);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughParser;

impl Parser for PassthroughParser {
    fn parse(&self, _packet: &Packet) -> Result<()> {
        Ok(())
    }
}
