// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! FEC block codec, writer, and reader.

pub mod codec;
pub mod reader;
pub mod traits;
pub mod writer;

pub use codec::{BlockDecoder, BlockEncoder, ReedSolomonDecoder, ReedSolomonEncoder, MAX_BLOCK_LENGTH};
pub use reader::{FecReader, ReadMode, ReaderConfig};
pub use traits::{Composer, PacketSink, PacketSource, Parser, PassthroughComposer, PassthroughParser};
pub use writer::{FecWriter, WriterConfig};
