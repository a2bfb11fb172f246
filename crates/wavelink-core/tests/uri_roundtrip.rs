// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Endpoint URI round-trips through the public address API: a bracketed
//! IPv6 RTP+FEC endpoint, a protocol with a registry default port, and a
//! local file URI.

use wavelink_core::address::{IoUri, NetworkUri};

#[test]
fn bracketed_ipv6_rtp_rs8m_endpoint_round_trips() {
    let uri = NetworkUri::parse("rtp+rs8m://[2001:db8::1]:5000/");
    assert!(uri.verify());
    assert_eq!(uri.host(), "2001:db8::1");
    assert_eq!(uri.port(), Some(5000));

    let formatted = uri.format();
    assert_eq!(formatted, "rtp+rs8m://[2001:db8::1]:5000");

    let reparsed = NetworkUri::parse(&formatted);
    assert!(reparsed.verify());
    assert_eq!(reparsed.host(), uri.host());
    assert_eq!(reparsed.port(), uri.port());
}

#[test]
fn rtsp_endpoint_without_explicit_port_uses_the_registry_default() {
    let uri = NetworkUri::parse("rtsp://recorder.local");
    assert!(uri.verify());
    assert_eq!(uri.port(), None);
    assert_eq!(uri.port_or_default(), Some(554));
}

#[test]
fn local_file_uri_decodes_and_re_encodes_its_path() {
    let uri = IoUri::parse("file:///a%20b/c").unwrap();
    assert!(uri.is_file());
    assert_eq!(uri.path(), "/a b/c");
    assert_eq!(uri.format_encoded_path().as_deref(), Some("/a%20b/c"));
}
