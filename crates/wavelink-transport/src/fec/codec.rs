// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Block encoder/decoder capability interfaces, and a Reed-Solomon-m8
//! implementation of both.
//!
//! The writer and reader only ever talk to these two small traits; which
//! scheme is behind them is a construction-time choice driven by the
//! session's [`wavelink_core::address::FecScheme`]. `LdpcStaircase` is
//! recognized by the protocol registry and carried end to end on packets,
//! but this core only ships a working codec for `ReedSolomonM8` — the
//! staircase construction is a distinct, much larger algorithm with no
//! off-the-shelf crate in this stack, so it is left as a construction-time
//! `ComponentFatal` rather than silently falling back to RS8M.

use bytes::Bytes;
use reed_solomon_erasure::galois_8::ReedSolomon;

use wavelink_core::error::{Result, WavelinkError};

/// Upper bound on `k + (n - k)` for the Reed-Solomon-m8 scheme: a single
/// GF(2^8) symbol per shard index tops out at 255 distinct shards.
pub const MAX_BLOCK_LENGTH: usize = 255;

/// Sender-side capability: given source payloads, produce repair payloads.
pub trait BlockEncoder: Send {
    /// Largest `source_len + repair_len` this encoder can service.
    fn max_block_length(&self) -> usize;
    /// Buffer alignment the composer should reserve for repair packets.
    fn alignment(&self) -> usize;
    /// Starts a new block. `index` arguments to [`BlockEncoder::set`] and
    /// [`BlockEncoder::get`] range over `0..source_len + repair_len`.
    fn begin(&mut self, source_len: usize, repair_len: usize, payload_size: usize) -> Result<()>;
    /// Stages a payload (source or repair slot) at `index`.
    fn set(&mut self, index: usize, payload: &[u8]);
    /// Computes repair payloads from the staged source payloads.
    fn fill(&mut self) -> Result<()>;
    /// Reads back a computed repair payload. Only valid for
    /// `index >= source_len` after [`BlockEncoder::fill`].
    fn get(&self, index: usize) -> Bytes;
    /// Ends the block, releasing any per-block scratch state.
    fn end(&mut self);
}

/// Receiver-side capability: given whichever payloads arrived, reconstruct
/// the missing source payloads.
pub trait BlockDecoder: Send {
    /// Largest `source_len + repair_len` this decoder can service.
    fn max_block_length(&self) -> usize;
    /// Starts a new block.
    fn begin_block(&mut self, source_len: usize, repair_len: usize, payload_size: usize)
        -> Result<()>;
    /// Records a payload that arrived for slot `index`.
    fn set_buffer(&mut self, index: usize, payload: &[u8]);
    /// Attempts to reconstruct the payload for an empty source slot
    /// `index`. Returns `None` if reconstruction is impossible (too many
    /// erasures) or has not enough data yet.
    fn repair_buffer(&mut self, index: usize) -> Option<Bytes>;
    /// Ends the block, releasing any per-block scratch state.
    fn end_block(&mut self);
}

#[derive(Debug, Default)]
pub struct ReedSolomonEncoder {
    codec: Option<ReedSolomon>,
    source_len: usize,
    repair_len: usize,
    shards: Vec<Vec<u8>>,
}

impl ReedSolomonEncoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockEncoder for ReedSolomonEncoder {
    fn max_block_length(&self) -> usize {
        MAX_BLOCK_LENGTH
    }

    fn alignment(&self) -> usize {
        8
    }

    fn begin(&mut self, source_len: usize, repair_len: usize, payload_size: usize) -> Result<()> {
        let codec = ReedSolomon::new(source_len, repair_len)
            .map_err(|e| WavelinkError::ComponentFatal(format!("reed-solomon init: {e}")))?;
        self.codec = Some(codec);
        self.source_len = source_len;
        self.repair_len = repair_len;
        self.shards = vec![vec![0u8; payload_size]; source_len + repair_len];
        Ok(())
    }

    fn set(&mut self, index: usize, payload: &[u8]) {
        if let Some(shard) = self.shards.get_mut(index) {
            shard.clear();
            shard.extend_from_slice(payload);
        }
    }

    fn fill(&mut self) -> Result<()> {
        let codec = self
            .codec
            .as_ref()
            .ok_or_else(|| WavelinkError::ComponentFatal("fill before begin".to_string()))?;
        codec
            .encode(&mut self.shards)
            .map_err(|e| WavelinkError::ComponentFatal(format!("reed-solomon encode: {e}")))
    }

    fn get(&self, index: usize) -> Bytes {
        self.shards
            .get(index)
            .map(|s| Bytes::copy_from_slice(s))
            .unwrap_or_default()
    }

    fn end(&mut self) {
        self.codec = None;
        self.shards.clear();
    }
}

#[derive(Debug, Default)]
pub struct ReedSolomonDecoder {
    codec: Option<ReedSolomon>,
    source_len: usize,
    shards: Vec<Option<Vec<u8>>>,
    reconstructed: bool,
    reconstruct_failed: bool,
}

impl ReedSolomonDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_reconstructed(&mut self) {
        if self.reconstructed || self.reconstruct_failed {
            return;
        }
        let Some(codec) = self.codec.as_ref() else {
            self.reconstruct_failed = true;
            return;
        };
        match codec.reconstruct(&mut self.shards) {
            Ok(()) => self.reconstructed = true,
            Err(_) => self.reconstruct_failed = true,
        }
    }
}

impl BlockDecoder for ReedSolomonDecoder {
    fn max_block_length(&self) -> usize {
        MAX_BLOCK_LENGTH
    }

    fn begin_block(
        &mut self,
        source_len: usize,
        repair_len: usize,
        _payload_size: usize,
    ) -> Result<()> {
        let codec = ReedSolomon::new(source_len, repair_len)
            .map_err(|e| WavelinkError::ComponentFatal(format!("reed-solomon init: {e}")))?;
        self.codec = Some(codec);
        self.source_len = source_len;
        self.shards = vec![None; source_len + repair_len];
        self.reconstructed = false;
        self.reconstruct_failed = false;
        Ok(())
    }

    fn set_buffer(&mut self, index: usize, payload: &[u8]) {
        if let Some(slot) = self.shards.get_mut(index) {
            *slot = Some(payload.to_vec());
        }
    }

    fn repair_buffer(&mut self, index: usize) -> Option<Bytes> {
        if index >= self.source_len {
            return None;
        }
        self.ensure_reconstructed();
        if self.reconstruct_failed {
            return None;
        }
        self.shards
            .get(index)
            .and_then(|s| s.as_ref())
            .map(|v| Bytes::copy_from_slice(v))
    }

    fn end_block(&mut self) {
        self.codec = None;
        self.shards.clear();
        self.reconstructed = false;
        self.reconstruct_failed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoder_produces_recoverable_repair_symbols() {
        let payload_size = 16;
        let k = 4;
        let m = 2;

        let mut encoder = ReedSolomonEncoder::new();
        encoder.begin(k, m, payload_size).unwrap();
        let sources: Vec<Vec<u8>> = (0..k).map(|i| vec![i as u8; payload_size]).collect();
        for (i, src) in sources.iter().enumerate() {
            encoder.set(i, src);
        }
        encoder.fill().unwrap();
        let repairs: Vec<Bytes> = (k..k + m).map(|i| encoder.get(i)).collect();
        encoder.end();

        let mut decoder = ReedSolomonDecoder::new();
        decoder.begin_block(k, m, payload_size).unwrap();
        // Drop source shard 1 and 2, keep the rest plus both repair shards.
        decoder.set_buffer(0, &sources[0]);
        decoder.set_buffer(3, &sources[3]);
        for (j, repair) in repairs.iter().enumerate() {
            decoder.set_buffer(k + j, repair);
        }

        assert_eq!(decoder.repair_buffer(1).unwrap(), Bytes::copy_from_slice(&sources[1]));
        assert_eq!(decoder.repair_buffer(2).unwrap(), Bytes::copy_from_slice(&sources[2]));
        decoder.end_block();
    }

    #[test]
    fn decoder_fails_gracefully_with_too_many_erasures() {
        let payload_size = 8;
        let k = 4;
        let m = 1;

        let mut decoder = ReedSolomonDecoder::new();
        decoder.begin_block(k, m, payload_size).unwrap();
        decoder.set_buffer(0, &[1u8; 8]);
        // Two source shards missing but only one repair shard: unrecoverable.
        assert!(decoder.repair_buffer(1).is_none());
    }
}
