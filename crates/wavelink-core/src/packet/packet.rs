// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The shared packet object.
//!
//! A [`Packet`] is a cheap `Arc`-backed handle; cloning it shares the same
//! underlying buffer and views rather than copying them. Interior
//! mutability is a plain `std::sync::Mutex`, mirroring the teacher's
//! `FramePool` locking strategy — the pipeline and network loops are each
//! single-threaded cooperative, so there is never real contention, only the
//! need for a `Sync` handle that can cross a channel between them.

use std::sync::{Arc, Mutex};

use bytes::{Bytes, BytesMut};

use super::flags::PacketFlags;
use super::views::{FecView, RtpView, UdpView};

#[derive(Debug, Default)]
struct PacketInner {
    flags: PacketFlags,
    buffer: BytesMut,
    udp: Option<UdpView>,
    rtp: Option<RtpView>,
    fec: Option<FecView>,
}

/// A reference-counted packet: a byte buffer plus whichever of the UDP/RTP/
/// FEC views have been parsed or composed onto it.
#[derive(Debug, Clone)]
pub struct Packet {
    inner: Arc<Mutex<PacketInner>>,
}

impl Default for Packet {
    fn default() -> Self {
        Self::new()
    }
}

impl Packet {
    /// An empty, unprepared packet with no views and no flags set.
    #[must_use]
    pub fn new() -> Self {
        Packet {
            inner: Arc::new(Mutex::new(PacketInner::default())),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PacketInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Allocates `size` bytes of zeroed buffer and sets the `Prepared` flag.
    pub fn prepare(&self, size: usize) {
        let mut inner = self.lock();
        inner.buffer = BytesMut::zeroed(size);
        inner.flags.insert(PacketFlags::PREPARED);
    }

    /// Replaces the packet's buffer outright (used when re-parsing a
    /// restored payload from the FEC decoder).
    pub fn set_buffer(&self, buffer: Bytes) {
        let mut inner = self.lock();
        inner.buffer = BytesMut::from(&buffer[..]);
        inner.flags.insert(PacketFlags::PREPARED);
    }

    /// A read-only snapshot of the packet's raw buffer.
    #[must_use]
    pub fn buffer(&self) -> Bytes {
        self.lock().buffer.clone().freeze()
    }

    /// Current flag bitset.
    #[must_use]
    pub fn flags(&self) -> PacketFlags {
        self.lock().flags
    }

    pub fn add_flags(&self, flags: PacketFlags) {
        self.lock().flags.insert(flags);
    }

    #[must_use]
    pub fn has_flags(&self, flags: PacketFlags) -> bool {
        self.lock().flags.contains(flags)
    }

    #[must_use]
    pub fn udp(&self) -> Option<UdpView> {
        self.lock().udp.clone()
    }

    pub fn set_udp(&self, view: UdpView) {
        let mut inner = self.lock();
        inner.udp = Some(view);
        inner.flags.insert(PacketFlags::UDP);
    }

    #[must_use]
    pub fn rtp(&self) -> Option<RtpView> {
        self.lock().rtp.clone()
    }

    pub fn set_rtp(&self, view: RtpView) {
        let mut inner = self.lock();
        inner.rtp = Some(view);
        inner.flags.insert(PacketFlags::RTP);
    }

    #[must_use]
    pub fn fec(&self) -> Option<FecView> {
        self.lock().fec.clone()
    }

    pub fn set_fec(&self, view: FecView) {
        let mut inner = self.lock();
        inner.fec = Some(view);
        inner.flags.insert(PacketFlags::FEC);
    }

    /// SSRC carried by the packet's RTP view, if parsed.
    #[must_use]
    pub fn source_id(&self) -> Option<u32> {
        self.lock().rtp.as_ref().map(|r| r.source_id)
    }

    /// True if two handles point at the same underlying packet.
    #[must_use]
    pub fn is_same(&self, other: &Packet) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_sets_buffer_size_and_flag() {
        let packet = Packet::new();
        packet.prepare(128);
        assert_eq!(packet.buffer().len(), 128);
        assert!(packet.has_flags(PacketFlags::PREPARED));
    }

    #[test]
    fn clones_share_the_same_underlying_packet() {
        let packet = Packet::new();
        let clone = packet.clone();
        clone.add_flags(PacketFlags::AUDIO);
        assert!(packet.has_flags(PacketFlags::AUDIO));
        assert!(packet.is_same(&clone));
        assert!(!packet.is_same(&Packet::new()));
    }

    #[test]
    fn set_rtp_sets_flag_and_is_queryable() {
        let packet = Packet::new();
        packet.set_rtp(RtpView {
            source_id: 0x42,
            seqnum: 1,
            stream_timestamp: 0,
            payload_type: 97,
            marker: false,
            duration: 0,
            payload: Bytes::new(),
        });
        assert!(packet.has_flags(PacketFlags::RTP));
        assert_eq!(packet.source_id(), Some(0x42));
    }
}
