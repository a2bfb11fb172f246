// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Closed-set identifiers shared by the endpoint URI model and the FEC
//! codec layer.

use std::fmt;

/// Forward error correction scheme carried by a packet or a protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FecScheme {
    /// No FEC; the stream is not protected.
    None,
    /// Reed-Solomon over GF(2^8), fixed block scheme.
    ReedSolomonM8,
    /// LDPC-Staircase.
    LdpcStaircase,
}

/// Which logical interface a protocol serves on a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Interface {
    /// Carries everything over one connection (e.g. RTSP session setup).
    Aggregate,
    /// Carries source audio packets.
    AudioSource,
    /// Carries FEC repair packets for the audio source stream.
    AudioRepair,
    /// Carries control-plane (RTCP-shaped) packets.
    AudioControl,
}

/// One of the seven network protocols the core understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Protocol {
    Rtsp,
    Rtp,
    RtpRs8m,
    Rs8m,
    RtpLdpc,
    Ldpc,
    Rtcp,
}

impl Protocol {
    /// All protocols the registry recognizes, in external-interface-table order.
    pub const ALL: &'static [Protocol] = &[
        Protocol::Rtsp,
        Protocol::Rtp,
        Protocol::RtpRs8m,
        Protocol::Rs8m,
        Protocol::RtpLdpc,
        Protocol::Ldpc,
        Protocol::Rtcp,
    ];

    /// URI scheme name, e.g. `rtp+rs8m`.
    #[must_use]
    pub fn scheme_name(self) -> &'static str {
        match self {
            Protocol::Rtsp => "rtsp",
            Protocol::Rtp => "rtp",
            Protocol::RtpRs8m => "rtp+rs8m",
            Protocol::Rs8m => "rs8m",
            Protocol::RtpLdpc => "rtp+ldpc",
            Protocol::Ldpc => "ldpc",
            Protocol::Rtcp => "rtcp",
        }
    }

    /// Parses a scheme name back into a [`Protocol`].
    #[must_use]
    pub fn from_scheme_name(name: &str) -> Option<Protocol> {
        Protocol::ALL
            .iter()
            .copied()
            .find(|p| p.scheme_name() == name)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme_name())
    }
}
