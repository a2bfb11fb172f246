// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Network endpoint URI: `PROTOCOL://HOST[:PORT][/PATH][?QUERY]`.
//!
//! Each of the five semantic fields carries a ternary state —
//! `Empty`/`NotEmpty`/`Broken` — tracked in a pair of bitmasks rather than
//! five separate enums, so that `verify()` can check "is anything broken"
//! in one comparison instead of five.

use super::pct::{pct_decode, pct_encode, PctMode};
use super::protocol_map;
use crate::address::protocol::Protocol;

mod field {
    pub const PROTO: u8 = 1 << 0;
    pub const HOST: u8 = 1 << 1;
    pub const PORT: u8 = 1 << 2;
    pub const PATH: u8 = 1 << 3;
    pub const QUERY: u8 = 1 << 4;
    pub const ALL: u8 = PROTO | HOST | PORT | PATH | QUERY;
}

/// Ternary state of one URI field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    Empty,
    NotEmpty,
    Broken,
}

/// A parsed, possibly-partially-invalid network endpoint URI.
#[derive(Debug, Clone, Default)]
pub struct NetworkUri {
    non_empty_fields: u8,
    broken_fields: u8,
    proto: Option<Protocol>,
    host: String,
    port: Option<u16>,
    path: String,
    query: String,
}

impl NetworkUri {
    /// An empty URI with every field in the `Empty` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn field_state(&self, bit: u8) -> FieldState {
        if self.broken_fields & bit != 0 {
            FieldState::Broken
        } else if self.non_empty_fields & bit != 0 {
            FieldState::NotEmpty
        } else {
            FieldState::Empty
        }
    }

    fn set_field_state(&mut self, bit: u8, state: FieldState) {
        match state {
            FieldState::Broken => {
                self.broken_fields |= bit;
                self.non_empty_fields &= !bit;
            }
            FieldState::NotEmpty => {
                self.broken_fields &= !bit;
                self.non_empty_fields |= bit;
            }
            FieldState::Empty => {
                self.broken_fields &= !bit;
                self.non_empty_fields &= !bit;
            }
        }
    }

    /// State of the protocol field.
    #[must_use]
    pub fn proto_state(&self) -> FieldState {
        self.field_state(field::PROTO)
    }

    /// The parsed protocol, if the field is `NotEmpty`.
    #[must_use]
    pub fn proto(&self) -> Option<Protocol> {
        self.proto
    }

    /// Sets the protocol from a URI scheme name. Unknown schemes mark the
    /// field `Broken` rather than rejecting the whole URI outright.
    pub fn set_proto(&mut self, scheme_name: &str) {
        match Protocol::from_scheme_name(scheme_name) {
            Some(proto) => {
                self.proto = Some(proto);
                self.set_field_state(field::PROTO, FieldState::NotEmpty);
            }
            None => {
                self.proto = None;
                self.set_field_state(field::PROTO, FieldState::Broken);
            }
        }
    }

    /// State of the host field.
    #[must_use]
    pub fn host_state(&self) -> FieldState {
        self.field_state(field::HOST)
    }

    /// The decoded host, if the field is `NotEmpty`.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Sets the host from its percent-encoded wire form.
    pub fn set_encoded_host(&mut self, encoded: &str) {
        if encoded.is_empty() {
            self.host.clear();
            self.set_field_state(field::HOST, FieldState::Broken);
            return;
        }
        match pct_decode(encoded).and_then(|bytes| String::from_utf8(bytes).ok()) {
            Some(decoded) => {
                self.host = decoded;
                self.set_field_state(field::HOST, FieldState::NotEmpty);
            }
            None => {
                self.host.clear();
                self.set_field_state(field::HOST, FieldState::Broken);
            }
        }
    }

    /// Formats the host in its percent-encoded wire form.
    #[must_use]
    pub fn format_host(&self) -> Option<String> {
        if self.host_state() != FieldState::NotEmpty {
            return None;
        }
        pct_encode(self.host.as_bytes(), PctMode::NonHost)
    }

    /// State of the port field.
    #[must_use]
    pub fn port_state(&self) -> FieldState {
        self.field_state(field::PORT)
    }

    /// The explicit port, if the field is `NotEmpty`.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Sets the port from its decimal wire form. An empty string means "no
    /// explicit port" (`Empty`), not `Broken`.
    pub fn set_port_str(&mut self, s: &str) {
        if s.is_empty() {
            self.port = None;
            self.set_field_state(field::PORT, FieldState::Empty);
            return;
        }
        match s.parse::<u16>() {
            Ok(port) => {
                self.port = Some(port);
                self.set_field_state(field::PORT, FieldState::NotEmpty);
            }
            Err(_) => {
                self.port = None;
                self.set_field_state(field::PORT, FieldState::Broken);
            }
        }
    }

    /// Explicit port if present, else the protocol's registry default.
    #[must_use]
    pub fn port_or_default(&self) -> Option<u16> {
        if self.port_state() == FieldState::NotEmpty {
            return self.port;
        }
        self.proto.and_then(|p| protocol_map::find(p).default_port)
    }

    /// State of the path field.
    #[must_use]
    pub fn path_state(&self) -> FieldState {
        self.field_state(field::PATH)
    }

    /// The decoded path, if the field is `NotEmpty`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Sets the path from its percent-encoded wire form. An empty string
    /// transitions to `Empty`, never `Broken` — only a decode failure does.
    pub fn set_encoded_path(&mut self, encoded: &str) {
        if encoded.is_empty() {
            self.path.clear();
            self.set_field_state(field::PATH, FieldState::Empty);
            return;
        }
        match pct_decode(encoded).and_then(|bytes| String::from_utf8(bytes).ok()) {
            Some(decoded) => {
                self.path = decoded;
                self.set_field_state(field::PATH, FieldState::NotEmpty);
            }
            None => {
                self.path.clear();
                self.set_field_state(field::PATH, FieldState::Broken);
            }
        }
    }

    /// Formats the path in its percent-encoded wire form.
    #[must_use]
    pub fn format_encoded_path(&self) -> Option<String> {
        match self.path_state() {
            FieldState::NotEmpty => pct_encode(self.path.as_bytes(), PctMode::NonPath),
            FieldState::Empty => Some(String::new()),
            FieldState::Broken => None,
        }
    }

    /// State of the query field.
    #[must_use]
    pub fn query_state(&self) -> FieldState {
        self.field_state(field::QUERY)
    }

    /// The still-encoded query string, if the field is `NotEmpty`. The
    /// query is opaque to this core: it is validated but not decoded.
    #[must_use]
    pub fn encoded_query(&self) -> &str {
        &self.query
    }

    /// Sets the query from its wire form, validating percent-encoding
    /// without decoding it (the query's internal structure is a concern of
    /// the protocol layered on top, not this core).
    pub fn set_encoded_query(&mut self, encoded: &str) {
        if encoded.is_empty() {
            self.query.clear();
            self.set_field_state(field::QUERY, FieldState::Empty);
            return;
        }
        if pct_decode(encoded).is_none() {
            self.query.clear();
            self.set_field_state(field::QUERY, FieldState::Broken);
            return;
        }
        self.query = encoded.to_string();
        self.set_field_state(field::QUERY, FieldState::NotEmpty);
    }

    /// Checks that every parsed field is well-formed for the current
    /// protocol's registry rules.
    #[must_use]
    pub fn verify(&self) -> bool {
        if self.broken_fields & field::ALL != 0 {
            return false;
        }
        if self.proto_state() != FieldState::NotEmpty || self.host_state() != FieldState::NotEmpty
        {
            return false;
        }
        let Some(proto) = self.proto else {
            return false;
        };
        let attrs = protocol_map::find(proto);
        let port_ok = if attrs.default_port.is_some() {
            self.port_state() != FieldState::Broken
        } else {
            self.port_state() == FieldState::NotEmpty
        };
        if !port_ok {
            return false;
        }
        if !attrs.path_supported {
            if self.path_state() != FieldState::Empty || self.query_state() != FieldState::Empty {
                return false;
            }
        }
        true
    }

    /// Parses a network URI of the form `scheme://host[:port][/path][?query]`.
    /// Always returns a value — possibly with some fields `Broken` — rather
    /// than failing outright; call [`NetworkUri::verify`] to check validity.
    #[must_use]
    pub fn parse(input: &str) -> NetworkUri {
        let mut uri = NetworkUri::new();

        let Some(scheme_end) = input.find("://") else {
            uri.set_field_state(field::PROTO, FieldState::Broken);
            uri.set_field_state(field::HOST, FieldState::Broken);
            return uri;
        };
        uri.set_proto(&input[..scheme_end]);
        let rest = &input[scheme_end + 3..];

        if rest.contains('#') {
            uri.set_field_state(field::HOST, FieldState::Broken);
            return uri;
        }

        let (authority_and_path, query) = match rest.split_once('?') {
            Some((before, after)) => (before, Some(after)),
            None => (rest, None),
        };

        let (authority, path) = match authority_and_path.find('/') {
            Some(idx) => (
                &authority_and_path[..idx],
                Some(&authority_and_path[idx..]),
            ),
            None => (authority_and_path, None),
        };

        let (host, port) = split_authority(authority);
        uri.set_encoded_host(host);
        uri.set_port_str(port.unwrap_or(""));

        if let Some(path) = path {
            // The leading '/' is the authority/path separator, not part of
            // the path value itself; a bare "/" is an empty path.
            uri.set_encoded_path(path.strip_prefix('/').unwrap_or(path));
        }
        if let Some(query) = query {
            uri.set_encoded_query(query);
        }

        uri
    }

    /// Formats the URI in its normalized wire form. Returns `<bad>` if the
    /// URI does not [`verify`](NetworkUri::verify).
    #[must_use]
    pub fn format(&self) -> String {
        if !self.verify() {
            return "<bad>".to_string();
        }
        // verify() guarantees these are present and well-formed.
        let proto = self.proto.map(|p| p.scheme_name().to_string());
        let host = self.format_host();
        let (Some(proto), Some(host)) = (proto, host) else {
            return "<bad>".to_string();
        };

        let mut out = format!("{proto}://{host}");
        if self.port_state() == FieldState::NotEmpty {
            if let Some(port) = self.port {
                out.push(':');
                out.push_str(&port.to_string());
            }
        }
        if self.path_state() == FieldState::NotEmpty {
            if let Some(path) = self.format_encoded_path() {
                out.push('/');
                out.push_str(&path);
            }
        }
        if self.query_state() == FieldState::NotEmpty {
            out.push('?');
            out.push_str(&self.query);
        }
        out
    }
}

fn split_authority(authority: &str) -> (&str, Option<&str>) {
    if let Some(bracket_end) = authority.find(']') {
        if authority.starts_with('[') {
            let host = &authority[..=bracket_end];
            let rest = &authority[bracket_end + 1..];
            let port = rest.strip_prefix(':');
            return (host, port);
        }
    }
    match authority.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (authority, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_rtp_uri() {
        let uri = NetworkUri::parse("rtp://192.168.1.1:5000");
        assert!(uri.verify());
        assert_eq!(uri.host(), "192.168.1.1");
        assert_eq!(uri.port(), Some(5000));
    }

    #[test]
    fn rtp_without_port_is_invalid_because_no_default() {
        let uri = NetworkUri::parse("rtp://192.168.1.1");
        assert!(!uri.verify());
    }

    #[test]
    fn rtsp_without_port_uses_registry_default() {
        let uri = NetworkUri::parse("rtsp://host");
        assert!(uri.verify());
        assert_eq!(uri.port_or_default(), Some(554));
        assert_eq!(uri.port_or_default().unwrap().to_string(), "554");
    }

    #[test]
    fn bracketed_ipv6_host_round_trips() {
        let uri = NetworkUri::parse("rtp+rs8m://[2001:db8::1]:5000/");
        assert!(uri.verify());
        assert_eq!(uri.host(), "2001:db8::1");
        assert_eq!(uri.format(), "rtp+rs8m://[2001:db8::1]:5000");
    }

    #[test]
    fn unsupported_path_marks_uri_invalid() {
        let uri = NetworkUri::parse("rtp://host:5000/path");
        assert!(!uri.verify());
    }

    #[test]
    fn trailing_slash_root_path_is_empty() {
        // A bare "/" after the authority is an empty path, so this is valid
        // even though rtp+rs8m does not support a non-empty path.
        let uri = NetworkUri::parse("rtp+rs8m://[2001:db8::1]:5000/");
        assert_eq!(uri.path_state(), FieldState::Empty);
        assert!(uri.verify());
        assert_eq!(uri.format(), "rtp+rs8m://[2001:db8::1]:5000");
    }

    #[test]
    fn unknown_scheme_is_broken_not_panicking() {
        let uri = NetworkUri::parse("carrier-pigeon://host");
        assert_eq!(uri.proto_state(), FieldState::Broken);
        assert!(!uri.verify());
        assert_eq!(uri.format(), "<bad>");
    }

    #[test]
    fn fragment_is_rejected() {
        let uri = NetworkUri::parse("rtp://host:5000#frag");
        assert!(!uri.verify());
    }

    #[test]
    fn verified_uris_round_trip_through_format_and_parse() {
        let original = NetworkUri::parse("rtsp://example.com:8554/stream/one");
        assert!(original.verify());
        let formatted = original.format();
        let reparsed = NetworkUri::parse(&formatted);
        assert!(reparsed.verify());
        assert_eq!(reparsed.host(), original.host());
        assert_eq!(reparsed.port(), original.port());
        assert_eq!(reparsed.path(), original.path());
    }
}
