// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Receiver session group: owns every session for one receiver slot and
//! dispatches inbound packets and ticks across them.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;

use tracing::{debug, trace};

use wavelink_core::error::{Result, WavelinkError};
use wavelink_core::packet::{Packet, PacketFlags};

use super::router::{SessionId, SessionRouter};
use super::session::Session;

/// Collaborator for the control plane (RTCP-shaped reports and
/// session-linking callbacks). Kept as a small boundary trait since the
/// actual control protocol is out of scope here.
pub trait RtcpCommunicator: Send {
    fn is_control_packet(&self, packet: &Packet) -> bool;

    /// Handles one control packet; drives `router` via `link_source` /
    /// `unlink_source` as streams are announced or retired.
    fn handle_control_packet(&mut self, packet: &Packet, router: &mut SessionRouter);

    /// Emits any due reports. Called before sessions are ticked, so report
    /// generation sees the current session set.
    fn generate_reports(&mut self, now: Instant, sessions: &HashMap<SessionId, Box<dyn Session>>);
}

pub struct ReceiverSessionGroup {
    router: SessionRouter,
    sessions: HashMap<SessionId, Box<dyn Session>>,
    rtcp: Box<dyn RtcpCommunicator>,
    session_factory: Box<dyn FnMut(u32, SocketAddr) -> Box<dyn Session> + Send>,
    next_id: SessionId,
}

impl ReceiverSessionGroup {
    pub fn new(
        rtcp: Box<dyn RtcpCommunicator>,
        session_factory: Box<dyn FnMut(u32, SocketAddr) -> Box<dyn Session> + Send>,
    ) -> Self {
        ReceiverSessionGroup {
            router: SessionRouter::new(),
            sessions: HashMap::new(),
            rtcp,
            session_factory,
            next_id: 0,
        }
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Routes one inbound transport packet. Never fails the group as a
    /// whole; a misbehaving session is removed instead.
    ///
    /// # Errors
    /// Only returned when auto-creating a session for an unrouted source
    /// packet fails (e.g. the packet carries no SSRC or source address).
    pub fn handle_packet(&mut self, packet: Packet) -> Result<()> {
        if self.rtcp.is_control_packet(&packet) {
            self.rtcp.handle_control_packet(&packet, &mut self.router);
            self.reap_unrouted_sessions();
            return Ok(());
        }

        let session_id = self.resolve(&packet);
        let session_id = match session_id {
            Some(id) => id,
            None => {
                if packet.has_flags(PacketFlags::REPAIR) || !packet.has_flags(PacketFlags::RTP) {
                    trace!("session group: dropping unrouted non-source packet");
                    return Ok(());
                }
                self.auto_create(&packet)?
            }
        };

        if let Some(session) = self.sessions.get_mut(&session_id) {
            if session.handle_packet(&packet).is_err() {
                debug!(session_id, "session group: session fatal, removing session");
                self.sessions.remove(&session_id);
                self.router.remove_session(session_id);
            }
        }
        Ok(())
    }

    fn resolve(&self, packet: &Packet) -> Option<SessionId> {
        if let Some(id) = packet.source_id().and_then(|ssrc| self.router.find_by_source(ssrc)) {
            return Some(id);
        }
        packet
            .udp()
            .and_then(|udp| self.router.find_by_address(udp.src_addr))
    }

    fn auto_create(&mut self, packet: &Packet) -> Result<SessionId> {
        let ssrc = packet.source_id().ok_or(WavelinkError::NoRoute)?;
        let addr = packet
            .udp()
            .map(|udp| udp.src_addr)
            .ok_or(WavelinkError::NoRoute)?;

        let id = self.next_id;
        // CNAME is not yet known for an auto-created session; it is linked
        // in once the control plane announces it via `link_source`. Routed
        // by SSRC/address only until then, so two CNAME-less sessions never
        // collide on a shared empty CNAME key.
        self.router.add_session(id, ssrc, None, addr)?;
        self.next_id += 1;
        let session = (self.session_factory)(ssrc, addr);
        self.sessions.insert(id, session);
        debug!(session_id = id, ssrc, %addr, "session group: auto-created session");
        Ok(id)
    }

    /// Drops any session the router no longer routes to by any of its
    /// three keys, e.g. after a control-plane `unlink_source` removed its
    /// last remaining route.
    fn reap_unrouted_sessions(&mut self) {
        let unrouted: Vec<SessionId> = self
            .sessions
            .keys()
            .copied()
            .filter(|&id| !self.router.has_session(id))
            .collect();
        for id in unrouted {
            debug!(session_id = id, "session group: session unrouted, removing");
            self.sessions.remove(&id);
        }
    }

    /// Ticks every session and reaps the ones that finished or aborted.
    /// Returns the earliest deadline any surviving session wants another
    /// tick by.
    pub fn refresh_sessions(&mut self, now: Instant) -> Option<Instant> {
        self.rtcp.generate_reports(now, &self.sessions);

        let mut dead = Vec::new();
        let mut next_deadline: Option<Instant> = None;

        for (&id, session) in &mut self.sessions {
            let status = session.refresh(now);
            if matches!(
                status,
                wavelink_core::status::Status::Finish | wavelink_core::status::Status::Abort
            ) {
                dead.push(id);
                continue;
            }
            if let Some(deadline) = session.next_deadline() {
                next_deadline = Some(next_deadline.map_or(deadline, |cur| cur.min(deadline)));
            }
        }

        for id in dead {
            self.sessions.remove(&id);
            self.router.remove_session(id);
        }

        next_deadline
    }
}
