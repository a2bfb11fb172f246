// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Collaborator boundaries between a [`super::slot::Slot`] and the network
//! loop / pipeline loop it orchestrates across.

use wavelink_core::address::{Interface, NetworkUri};
use wavelink_core::error::Result;

use super::config::{SlotMetrics, UdpConfig};

/// Opaque handle to a registered UDP port, owned by the network loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortHandle(pub u64);

/// Opaque handle to a pipeline-side endpoint for one interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointHandle(pub u64);

/// Network-loop collaborator: owns sockets, resolves URIs, opens ports.
pub trait NetworkLoop: Send {
    fn register_inbound_port(&mut self, uri: &NetworkUri) -> Result<PortHandle>;
    fn register_outbound_port(&mut self, uri: &NetworkUri) -> Result<PortHandle>;
    fn start_outbound(&mut self, port: PortHandle) -> Result<()>;
    fn close_port(&mut self, port: PortHandle) -> Result<()>;
}

/// Pipeline-loop collaborator: owns session groups, FEC readers/writers,
/// and the audio engine for one slot.
pub trait PipelineSlot: Send {
    fn create_endpoint(&mut self, iface: Interface, udp_config: UdpConfig) -> Result<EndpointHandle>;
    fn wire_inbound(&mut self, endpoint: EndpointHandle, port: PortHandle) -> Result<()>;
    fn metrics(&self) -> SlotMetrics;
    fn teardown(&mut self) -> Result<()>;
}
