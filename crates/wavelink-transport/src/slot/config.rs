// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Per-interface UDP configuration carried through `configure`/`bind`/
//! `connect`.

use wavelink_core::address::FecScheme;

/// Configuration shared by every interface on a slot that needs one. Two
/// configs are "compatible" for port-sharing purposes when they are equal.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UdpConfig {
    pub fec_scheme: FecScheme,
    /// Sender-side: number of source packets per FEC block.
    pub n_source_packets: usize,
    /// Sender-side: number of repair packets per FEC block.
    pub n_repair_packets: usize,
}

impl Default for UdpConfig {
    fn default() -> Self {
        UdpConfig {
            fec_scheme: FecScheme::None,
            n_source_packets: 0,
            n_repair_packets: 0,
        }
    }
}

/// Metrics surfaced by `get_metrics`, read-only and non-blocking on
/// network state.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct SlotMetrics {
    pub session_count: usize,
    pub broken: bool,
}
