// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The three layered views a packet can carry.

use std::net::SocketAddr;

use bytes::Bytes;

use crate::address::FecScheme;

/// UDP transport view: addressing plus an opaque send-request slot handle
/// owned by the (external) network loop.
#[derive(Debug, Clone)]
pub struct UdpView {
    pub src_addr: SocketAddr,
    pub dst_addr: SocketAddr,
}

/// RTP media view.
#[derive(Debug, Clone)]
pub struct RtpView {
    pub source_id: u32,
    pub seqnum: u16,
    pub stream_timestamp: u32,
    pub payload_type: u8,
    pub marker: bool,
    pub duration: u32,
    pub payload: Bytes,
}

/// FEC framing view.
#[derive(Debug, Clone)]
pub struct FecView {
    pub fec_scheme: FecScheme,
    pub encoding_symbol_id: u32,
    pub source_block_number: u32,
    pub source_block_length: u32,
    pub block_length: u32,
    pub payload: Bytes,
}

impl FecView {
    /// True if this ESI falls in the source range `[0, source_block_length)`.
    #[must_use]
    pub fn is_source_esi(&self) -> bool {
        self.encoding_symbol_id < self.source_block_length
    }

    /// True if this ESI falls in the repair range
    /// `[source_block_length, block_length)`.
    #[must_use]
    pub fn is_repair_esi(&self) -> bool {
        self.encoding_symbol_id >= self.source_block_length
            && self.encoding_symbol_id < self.block_length
    }
}
