// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Session routing and the receiver session group.

pub mod group;
pub mod router;
pub mod session;

pub use group::{ReceiverSessionGroup, RtcpCommunicator};
pub use router::{SessionId, SessionRouter};
pub use session::Session;
