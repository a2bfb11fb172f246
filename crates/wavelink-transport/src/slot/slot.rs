// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! One slot's lifecycle: `configure` → `bind`/`connect` → `unlink`.
//!
//! Teardown order is deliberately asymmetric: network ports close first on
//! a sender slot, the pipeline endpoint tears down first on a receiver
//! slot. Each side writes into the other's structures during teardown, so
//! the order that's safe on one side is unsafe on the other.

use std::collections::HashMap;

use tracing::{error, trace};

use wavelink_core::address::{Interface, NetworkUri};
use wavelink_core::error::{Result, WavelinkError};

use super::config::{SlotMetrics, UdpConfig};
use super::traits::{EndpointHandle, NetworkLoop, PipelineSlot, PortHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Sender,
    Receiver,
}

pub struct Slot {
    kind: SlotKind,
    network: Box<dyn NetworkLoop>,
    pipeline: Box<dyn PipelineSlot>,
    configured: HashMap<Interface, UdpConfig>,
    ports: HashMap<Interface, PortHandle>,
    endpoints: HashMap<Interface, EndpointHandle>,
    // Sender-side: interfaces sharing one outbound port, keyed by the
    // config they were opened with.
    shared_ports: Vec<(UdpConfig, PortHandle)>,
    broken: bool,
}

impl Slot {
    #[must_use]
    pub fn new(kind: SlotKind, network: Box<dyn NetworkLoop>, pipeline: Box<dyn PipelineSlot>) -> Self {
        Slot {
            kind,
            network,
            pipeline,
            configured: HashMap::new(),
            ports: HashMap::new(),
            endpoints: HashMap::new(),
            shared_ports: Vec::new(),
            broken: false,
        }
    }

    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    fn guard(&self) -> Result<()> {
        if self.broken {
            return Err(WavelinkError::ComponentFatal(
                "slot: operation on a broken slot".to_string(),
            ));
        }
        Ok(())
    }

    /// Records the UDP configuration for `iface`, before any bind/connect.
    ///
    /// # Errors
    /// Fails, and marks the slot broken, if `iface` already has a config.
    pub fn configure(&mut self, iface: Interface, udp_config: UdpConfig) -> Result<()> {
        self.guard()?;
        if self.configured.contains_key(&iface) {
            self.broken = true;
            return Err(WavelinkError::ComponentFatal(
                "slot: interface already configured".to_string(),
            ));
        }
        self.configured.insert(iface, udp_config);
        Ok(())
    }

    /// Receiver-side port setup: registers an inbound port, creates the
    /// pipeline endpoint, and wires the two together.
    ///
    /// # Errors
    /// Any failed step marks the slot broken and returns the underlying
    /// error.
    pub fn bind(&mut self, iface: Interface, uri: &NetworkUri) -> Result<()> {
        self.guard()?;
        debug_assert!(self.kind == SlotKind::Receiver, "bind is receiver-side");
        let result = self.bind_inner(iface, uri);
        if result.is_err() {
            self.broken = true;
        }
        result
    }

    fn bind_inner(&mut self, iface: Interface, uri: &NetworkUri) -> Result<()> {
        let port = self.network.register_inbound_port(uri)?;
        let udp_config = self.configured.get(&iface).copied().unwrap_or_default();
        let endpoint = self.pipeline.create_endpoint(iface, udp_config)?;
        self.pipeline.wire_inbound(endpoint, port)?;
        if iface == Interface::AudioControl {
            self.network.start_outbound(port)?;
        }
        self.ports.insert(iface, port);
        self.endpoints.insert(iface, endpoint);
        Ok(())
    }

    /// Sender-side port setup: shares one outbound port across interfaces
    /// whose configs are identical, so a receiver lacking a control
    /// protocol can still correlate streams by source address.
    ///
    /// # Errors
    /// Any failed step marks the slot broken and returns the underlying
    /// error.
    pub fn connect(&mut self, iface: Interface, uri: &NetworkUri) -> Result<()> {
        self.guard()?;
        debug_assert!(self.kind == SlotKind::Sender, "connect is sender-side");
        let result = self.connect_inner(iface, uri);
        if result.is_err() {
            self.broken = true;
        }
        result
    }

    fn connect_inner(&mut self, iface: Interface, uri: &NetworkUri) -> Result<()> {
        let udp_config = self.configured.get(&iface).copied().unwrap_or_default();
        let port = if let Some(&(_, existing)) = self
            .shared_ports
            .iter()
            .find(|(config, _)| *config == udp_config)
        {
            trace!(?iface, "slot: reusing shared outbound port");
            existing
        } else {
            let port = self.network.register_outbound_port(uri)?;
            self.shared_ports.push((udp_config, port));
            port
        };
        let endpoint = self.pipeline.create_endpoint(iface, udp_config)?;
        self.pipeline.wire_inbound(endpoint, port)?;
        self.ports.insert(iface, port);
        self.endpoints.insert(iface, endpoint);
        Ok(())
    }

    /// Tears the slot down. Order depends on `kind`: ports first on a
    /// sender, pipeline first on a receiver.
    ///
    /// # Errors
    /// Propagates the first teardown step that fails; the slot is left
    /// broken regardless so a retry is never attempted in place.
    pub fn unlink(&mut self) -> Result<()> {
        let result = match self.kind {
            SlotKind::Sender => self.close_ports().and_then(|()| self.pipeline.teardown()),
            SlotKind::Receiver => self.pipeline.teardown().and_then(|()| self.close_ports()),
        };
        if let Err(ref e) = result {
            error!(error = %e, "slot: unlink failed");
        }
        self.configured.clear();
        self.ports.clear();
        self.endpoints.clear();
        self.shared_ports.clear();
        self.broken = false;
        result
    }

    fn close_ports(&mut self) -> Result<()> {
        let mut closed = std::collections::HashSet::new();
        for &port in self.ports.values() {
            if closed.insert(port) {
                self.network.close_port(port)?;
            }
        }
        Ok(())
    }

    /// Queries pipeline-side metrics. Never touches the network.
    #[must_use]
    pub fn metrics(&self) -> SlotMetrics {
        let mut metrics = self.pipeline.metrics();
        metrics.broken = self.broken;
        metrics
    }
}
