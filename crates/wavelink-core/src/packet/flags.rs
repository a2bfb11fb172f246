// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Packet flag bitset.

/// Flags describing which views are active on a packet and where it came
/// from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacketFlags(u16);

impl PacketFlags {
    pub const UDP: PacketFlags = PacketFlags(1 << 0);
    pub const RTP: PacketFlags = PacketFlags(1 << 1);
    pub const FEC: PacketFlags = PacketFlags(1 << 2);
    pub const AUDIO: PacketFlags = PacketFlags(1 << 3);
    pub const REPAIR: PacketFlags = PacketFlags(1 << 4);
    pub const CONTROL: PacketFlags = PacketFlags(1 << 5);
    /// Buffer allocated and sized.
    pub const PREPARED: PacketFlags = PacketFlags(1 << 6);
    /// Header written into the buffer.
    pub const COMPOSED: PacketFlags = PacketFlags(1 << 7);
    /// Synthesized by the FEC decoder, not received off the wire.
    pub const RESTORED: PacketFlags = PacketFlags(1 << 8);

    #[must_use]
    pub fn empty() -> Self {
        PacketFlags(0)
    }

    #[must_use]
    pub fn contains(self, other: PacketFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: PacketFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: PacketFlags) {
        self.0 &= !other.0;
    }
}

impl std::ops::BitOr for PacketFlags {
    type Output = PacketFlags;
    fn bitor(self, rhs: PacketFlags) -> PacketFlags {
        PacketFlags(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_contains() {
        let mut flags = PacketFlags::empty();
        assert!(!flags.contains(PacketFlags::AUDIO));
        flags.insert(PacketFlags::AUDIO | PacketFlags::RTP);
        assert!(flags.contains(PacketFlags::AUDIO));
        assert!(flags.contains(PacketFlags::RTP));
        assert!(!flags.contains(PacketFlags::FEC));
    }

    #[test]
    fn remove_clears_only_requested_bits() {
        let mut flags = PacketFlags::AUDIO | PacketFlags::RTP;
        flags.remove(PacketFlags::RTP);
        assert!(flags.contains(PacketFlags::AUDIO));
        assert!(!flags.contains(PacketFlags::RTP));
    }
}
