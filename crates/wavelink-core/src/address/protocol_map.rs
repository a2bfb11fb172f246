// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Static, process-wide protocol registry.
//!
//! Populated once, read-only thereafter: the `OnceLock` is the idiomatic
//! replacement for the reference implementation's `Singleton` pattern.

use std::sync::OnceLock;

use super::protocol::{FecScheme, Interface, Protocol};

/// Attributes the registry tracks for one protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolAttrs {
    pub protocol: Protocol,
    pub interface: Interface,
    pub fec_scheme: FecScheme,
    /// `None` if the protocol has no registry default port.
    pub default_port: Option<u16>,
    pub path_supported: bool,
}

fn build_table() -> [ProtocolAttrs; 7] {
    [
        ProtocolAttrs {
            protocol: Protocol::Rtsp,
            interface: Interface::Aggregate,
            fec_scheme: FecScheme::None,
            default_port: Some(554),
            path_supported: true,
        },
        ProtocolAttrs {
            protocol: Protocol::Rtp,
            interface: Interface::AudioSource,
            fec_scheme: FecScheme::None,
            default_port: None,
            path_supported: false,
        },
        ProtocolAttrs {
            protocol: Protocol::RtpRs8m,
            interface: Interface::AudioSource,
            fec_scheme: FecScheme::ReedSolomonM8,
            default_port: None,
            path_supported: false,
        },
        ProtocolAttrs {
            protocol: Protocol::Rs8m,
            interface: Interface::AudioRepair,
            fec_scheme: FecScheme::ReedSolomonM8,
            default_port: None,
            path_supported: false,
        },
        ProtocolAttrs {
            protocol: Protocol::RtpLdpc,
            interface: Interface::AudioSource,
            fec_scheme: FecScheme::LdpcStaircase,
            default_port: None,
            path_supported: false,
        },
        ProtocolAttrs {
            protocol: Protocol::Ldpc,
            interface: Interface::AudioRepair,
            fec_scheme: FecScheme::LdpcStaircase,
            default_port: None,
            path_supported: false,
        },
        ProtocolAttrs {
            protocol: Protocol::Rtcp,
            interface: Interface::AudioControl,
            fec_scheme: FecScheme::None,
            default_port: None,
            path_supported: false,
        },
    ]
}

static TABLE: OnceLock<[ProtocolAttrs; 7]> = OnceLock::new();

/// Looks up a protocol's registry attributes.
#[must_use]
pub fn find(protocol: Protocol) -> ProtocolAttrs {
    let table = TABLE.get_or_init(build_table);
    // `ALL` and `build_table` are constructed in lockstep, so this is always found.
    table
        .iter()
        .copied()
        .find(|p| p.protocol == protocol)
        .unwrap_or_else(|| unreachable!("protocol registry is missing an entry for {protocol:?}"))
}

/// Looks up a protocol by its URI scheme name.
#[must_use]
pub fn find_by_scheme_name(name: &str) -> Option<ProtocolAttrs> {
    Protocol::from_scheme_name(name).map(find)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rtsp_has_default_port_and_path() {
        let attrs = find(Protocol::Rtsp);
        assert_eq!(attrs.default_port, Some(554));
        assert!(attrs.path_supported);
    }

    #[test]
    fn rtp_has_no_default_port() {
        let attrs = find(Protocol::Rtp);
        assert_eq!(attrs.default_port, None);
        assert!(!attrs.path_supported);
    }

    #[test]
    fn fec_schemes_match_scheme_name() {
        assert_eq!(find(Protocol::RtpRs8m).fec_scheme, FecScheme::ReedSolomonM8);
        assert_eq!(find(Protocol::Rs8m).fec_scheme, FecScheme::ReedSolomonM8);
        assert_eq!(find(Protocol::RtpLdpc).fec_scheme, FecScheme::LdpcStaircase);
        assert_eq!(find(Protocol::Ldpc).fec_scheme, FecScheme::LdpcStaircase);
    }

    #[test]
    fn lookup_by_scheme_name_round_trips() {
        for &protocol in Protocol::ALL {
            let attrs = find_by_scheme_name(protocol.scheme_name()).unwrap();
            assert_eq!(attrs.protocol, protocol);
        }
        assert!(find_by_scheme_name("nonsense").is_none());
    }
}
