// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The shared packet object: layered views over a pooled byte buffer.

#[allow(clippy::module_inception)]
mod packet;
pub mod flags;
pub mod pool;
pub mod views;

pub use flags::PacketFlags;
pub use packet::Packet;
pub use pool::{BufferPool, PacketFactory};
pub use views::{FecView, RtpView, UdpView};
