// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Endpoint addressing: network URIs, I/O URIs, percent-encoding, and the
//! static protocol registry.

pub mod io_uri;
pub mod network_uri;
pub mod pct;
pub mod protocol;
pub mod protocol_map;

pub use io_uri::IoUri;
pub use network_uri::{FieldState, NetworkUri};
pub use pct::{pct_decode, pct_encode, PctMode};
pub use protocol::{FecScheme, Interface, Protocol};
pub use protocol_map::{find as find_protocol, find_by_scheme_name, ProtocolAttrs};
