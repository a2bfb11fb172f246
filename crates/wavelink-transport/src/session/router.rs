// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Three-map session router: SSRC, CNAME, and remote address all resolve
//! to the same session.

use std::collections::HashMap;
use std::net::SocketAddr;

use wavelink_core::error::{Result, WavelinkError};

/// Opaque handle a [`crate::session::group::ReceiverSessionGroup`] assigns
/// to each session it owns.
pub type SessionId = u64;

#[derive(Debug, Default)]
pub struct SessionRouter {
    by_ssrc: HashMap<u32, SessionId>,
    by_cname: HashMap<String, SessionId>,
    by_addr: HashMap<SocketAddr, SessionId>,
    // SSRC linked to a CNAME that has no session yet.
    pending_links: HashMap<u32, String>,
}

impl SessionRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `ssrc` to `cname`. If a session already owns `cname`, the SSRC
    /// routes to it immediately; otherwise the link is remembered until a
    /// session for that CNAME is added.
    pub fn link_source(&mut self, ssrc: u32, cname: &str) {
        if let Some(&session) = self.by_cname.get(cname) {
            self.by_ssrc.insert(ssrc, session);
        } else {
            self.pending_links.insert(ssrc, cname.to_string());
        }
    }

    pub fn unlink_source(&mut self, ssrc: u32) {
        self.by_ssrc.remove(&ssrc);
        self.pending_links.remove(&ssrc);
    }

    #[must_use]
    pub fn find_by_source(&self, ssrc: u32) -> Option<SessionId> {
        self.by_ssrc.get(&ssrc).copied()
    }

    #[must_use]
    pub fn find_by_address(&self, addr: SocketAddr) -> Option<SessionId> {
        self.by_addr.get(&addr).copied()
    }

    /// Installs all three mappings for a newly created session. `cname` is
    /// `None` when the session's CNAME isn't known yet (an auto-created
    /// session before the control plane has announced it); such a session
    /// is routed by SSRC/address only until [`SessionRouter::link_source`]
    /// or a later `add_session` call supplies its CNAME.
    ///
    /// # Errors
    /// Fails if any of `ssrc`, `cname`, `addr` already routes to a
    /// different session.
    pub fn add_session(
        &mut self,
        session: SessionId,
        ssrc: u32,
        cname: Option<&str>,
        addr: SocketAddr,
    ) -> Result<()> {
        let conflict = self.by_ssrc.get(&ssrc).is_some_and(|&s| s != session)
            || cname.is_some_and(|c| self.by_cname.get(c).is_some_and(|&s| s != session))
            || self.by_addr.get(&addr).is_some_and(|&s| s != session);
        if conflict {
            return Err(WavelinkError::SessionFatal(
                "session router: route conflict on add_session".to_string(),
            ));
        }
        self.by_ssrc.insert(ssrc, session);
        if let Some(cname) = cname {
            self.by_cname.insert(cname.to_string(), session);
        }
        self.by_addr.insert(addr, session);
        if let Some(pending_cname) = self.pending_links.get(&ssrc) {
            if Some(pending_cname.as_str()) == cname {
                self.pending_links.remove(&ssrc);
            }
        }
        Ok(())
    }

    /// Removes every mapping pointing at `session`.
    pub fn remove_session(&mut self, session: SessionId) {
        self.by_ssrc.retain(|_, &mut s| s != session);
        self.by_cname.retain(|_, &mut s| s != session);
        self.by_addr.retain(|_, &mut s| s != session);
    }

    /// True if any of the three maps still routes to `session`.
    #[must_use]
    pub fn has_session(&self, session: SessionId) -> bool {
        self.by_ssrc.values().any(|&s| s == session)
            || self.by_cname.values().any(|&s| s == session)
            || self.by_addr.values().any(|&s| s == session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_source_resolves_immediately_when_cname_already_has_a_session() {
        let mut router = SessionRouter::new();
        let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        router.add_session(1, 10, Some("alice"), addr).unwrap();
        router.link_source(20, "alice");
        assert_eq!(router.find_by_source(20), Some(1));
    }

    #[test]
    fn add_session_rejects_conflicting_ssrc() {
        let mut router = SessionRouter::new();
        let addr1: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let addr2: SocketAddr = "127.0.0.1:4001".parse().unwrap();
        router.add_session(1, 10, Some("alice"), addr1).unwrap();
        assert!(router.add_session(2, 10, Some("bob"), addr2).is_err());
    }

    #[test]
    fn remove_session_clears_every_mapping() {
        let mut router = SessionRouter::new();
        let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        router.add_session(1, 10, Some("alice"), addr).unwrap();
        router.remove_session(1);
        assert!(!router.has_session(1));
        assert_eq!(router.find_by_source(10), None);
        assert_eq!(router.find_by_address(addr), None);
    }

    #[test]
    fn two_cname_less_auto_created_sessions_do_not_collide() {
        let mut router = SessionRouter::new();
        let addr1: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        let addr2: SocketAddr = "127.0.0.1:5001".parse().unwrap();
        router.add_session(1, 10, None, addr1).unwrap();
        router.add_session(2, 20, None, addr2).unwrap();
        assert_eq!(router.find_by_source(10), Some(1));
        assert_eq!(router.find_by_source(20), Some(2));
    }
}
