// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! FEC block reader: the hardest subsystem in this crate.
//!
//! Assembles blocks from independent source/repair packet streams,
//! reconstructs missing source symbols when enough repair data has
//! arrived, and emits a strictly ESI-ordered, SBN-monotonic source
//! packet stream to the depacketizer.

use std::collections::VecDeque;

use tracing::{debug, error, trace};

use wavelink_core::address::FecScheme;
use wavelink_core::error::Result;
use wavelink_core::packet::{Packet, PacketFactory, PacketFlags};
use wavelink_core::status::Status;

use super::codec::BlockDecoder;
use super::traits::{PacketSource, Parser};

/// `Fetch` advances the reader; `Peek` reports what `Fetch` would return
/// without consuming it, used by duration estimation upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    Fetch,
    Peek,
}

#[derive(Debug, Clone, Copy)]
pub struct ReaderConfig {
    /// Maximum forward SBN delta tolerated before the reader gives up and
    /// declares the session dead.
    pub max_sbn_jump: u32,
}

pub struct FecReader {
    fec_scheme: FecScheme,
    decoder: Box<dyn BlockDecoder>,
    parser: Box<dyn Parser>,
    source_reader: Box<dyn PacketSource>,
    repair_reader: Box<dyn PacketSource>,
    factory: PacketFactory,

    source_queue: VecDeque<Packet>,
    repair_queue: VecDeque<Packet>,

    current_sbn: u32,
    head_index: usize,
    source_block: Vec<Option<Packet>>,
    repair_block: Vec<Option<Packet>>,
    // Repair packets that arrived before the source block length (k) of the
    // current block was known; flushed into `repair_block` once it is.
    pending_repair: Vec<(usize, Packet)>,

    started: bool,
    alive: bool,
    can_repair: bool,
    source_block_resized: bool,
    repair_block_resized: bool,
    payload_resized: bool,

    cur_sblen: usize,
    cur_blen: usize,
    payload_size: usize,

    prev_block_timestamp: Option<u32>,
    block_max_duration: u32,

    max_sbn_jump: u32,
}

impl FecReader {
    #[must_use]
    pub fn new(
        config: ReaderConfig,
        fec_scheme: FecScheme,
        decoder: Box<dyn BlockDecoder>,
        parser: Box<dyn Parser>,
        source_reader: Box<dyn PacketSource>,
        repair_reader: Box<dyn PacketSource>,
        factory: PacketFactory,
    ) -> Self {
        FecReader {
            fec_scheme,
            decoder,
            parser,
            source_reader,
            repair_reader,
            factory,
            source_queue: VecDeque::new(),
            repair_queue: VecDeque::new(),
            current_sbn: 0,
            head_index: 0,
            source_block: Vec::new(),
            repair_block: Vec::new(),
            pending_repair: Vec::new(),
            started: false,
            alive: true,
            can_repair: fec_scheme != FecScheme::None,
            source_block_resized: false,
            repair_block_resized: false,
            payload_resized: false,
            cur_sblen: 0,
            cur_blen: 0,
            payload_size: 0,
            prev_block_timestamp: None,
            block_max_duration: 0,
            max_sbn_jump: config.max_sbn_jump,
        }
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    #[must_use]
    pub fn block_max_duration(&self) -> u32 {
        self.block_max_duration
    }

    /// Reads the next packet. Returns `(Status::Ok, Some(packet))` on
    /// success, `(Status::Drain, None)` if nothing is available yet, and
    /// `(Status::Abort, None)` once the reader is permanently dead.
    pub fn read(&mut self, mode: ReadMode) -> (Status, Option<Packet>) {
        if !self.alive {
            return (Status::Abort, None);
        }
        if self.pull_upstream().is_err() {
            self.alive = false;
            error!("fec reader: fec scheme mismatch, reader is now dead");
            return (Status::Abort, None);
        }
        if !self.started && !self.try_start() {
            return (Status::Drain, None);
        }
        if self.drain_into_block().is_err() {
            return (Status::Abort, None);
        }
        if self.try_repair().is_err() {
            self.alive = false;
            return (Status::Abort, None);
        }
        self.emit(mode)
    }

    fn pull_upstream(&mut self) -> Result<()> {
        while let Some(packet) = self.source_reader.read()? {
            if !self.check_scheme(&packet) {
                return Err(scheme_mismatch());
            }
            self.source_queue.push_back(packet);
        }
        while let Some(packet) = self.repair_reader.read()? {
            if !self.check_scheme(&packet) {
                return Err(scheme_mismatch());
            }
            self.repair_queue.push_back(packet);
        }
        Ok(())
    }

    fn check_scheme(&self, packet: &Packet) -> bool {
        packet.fec().is_some_and(|f| f.fec_scheme == self.fec_scheme)
    }

    fn try_start(&mut self) -> bool {
        loop {
            let Some(front) = self.source_queue.front() else {
                return false;
            };
            let Some(fec) = front.fec() else {
                self.source_queue.pop_front();
                continue;
            };
            if fec.encoding_symbol_id != 0 {
                trace!(esi = fec.encoding_symbol_id, "fec reader: dropping pre-start source packet");
                self.source_queue.pop_front();
                continue;
            }
            self.current_sbn = fec.source_block_number;
            self.started = true;
            let sbn = self.current_sbn;
            self.repair_queue
                .retain(|p| p.fec().is_none_or(|f| sbn_delta(f.source_block_number, sbn) >= 0));
            debug!(sbn, "fec reader: started");
            return true;
        }
    }

    fn drain_into_block(&mut self) -> Result<()> {
        self.drain_one(true)?;
        self.drain_one(false)
    }

    fn drain_one(&mut self, is_source: bool) -> Result<()> {
        loop {
            let queue = if is_source { &mut self.source_queue } else { &mut self.repair_queue };
            let Some(front) = queue.front() else {
                return Ok(());
            };
            let Some(fec) = front.fec() else {
                queue.pop_front();
                continue;
            };
            let delta = sbn_delta(fec.source_block_number, self.current_sbn);
            if delta.unsigned_abs() > self.max_sbn_jump {
                error!(
                    sbn = fec.source_block_number,
                    current_sbn = self.current_sbn,
                    "fec reader: sbn jump exceeds max_sbn_jump, reader is now dead"
                );
                self.alive = false;
                return Err(sbn_jump_fatal());
            }
            if delta < 0 {
                queue.pop_front();
                continue;
            }
            if delta > 0 {
                return Ok(());
            }
            let packet = queue.pop_front().expect("front already peeked");
            if is_source {
                self.ingest_source(packet, &fec)?;
            } else {
                self.ingest_repair(packet, &fec)?;
            }
        }
    }

    fn ingest_source(
        &mut self,
        packet: Packet,
        fec: &wavelink_core::packet::views::FecView,
    ) -> Result<()> {
        if fec.source_block_length == 0 || fec.encoding_symbol_id >= fec.source_block_length {
            return Ok(());
        }
        if fec.payload.is_empty() {
            return Ok(());
        }
        if !self.source_block_resized {
            let k = fec.source_block_length as usize;
            if self.repair_block_resized && self.cur_blen < k {
                self.alive = false;
                return Err(sbn_jump_fatal());
            }
            if k + self.repair_block_len_hint() > self.decoder.max_block_length() {
                error!("fec reader: source block length exceeds decoder max, reader is now dead");
                self.alive = false;
                return Err(sbn_jump_fatal());
            }
            self.source_block = vec![None; k];
            self.cur_sblen = k;
            self.source_block_resized = true;
            if self.repair_block_resized {
                self.finalize_repair_block();
            }
        } else if fec.source_block_length as usize != self.cur_sblen {
            return Ok(());
        }
        if !self.payload_resized {
            self.payload_size = fec.payload.len();
            self.payload_resized = true;
        } else if fec.payload.len() != self.payload_size {
            return Ok(());
        }
        let idx = fec.encoding_symbol_id as usize;
        self.source_block[idx] = Some(packet);
        Ok(())
    }

    fn ingest_repair(
        &mut self,
        packet: Packet,
        fec: &wavelink_core::packet::views::FecView,
    ) -> Result<()> {
        if fec.source_block_length == 0
            || fec.encoding_symbol_id < fec.source_block_length
            || fec.encoding_symbol_id >= fec.block_length
        {
            return Ok(());
        }
        if fec.payload.is_empty() {
            return Ok(());
        }
        if !self.repair_block_resized {
            let n = fec.block_length as usize;
            if n > self.decoder.max_block_length() {
                error!("fec reader: block length exceeds decoder max, reader is now dead");
                self.alive = false;
                return Err(sbn_jump_fatal());
            }
            self.cur_blen = n;
            self.repair_block_resized = true;
            if self.source_block_resized {
                self.finalize_repair_block();
            }
        } else if fec.block_length as usize != self.cur_blen {
            return Ok(());
        }
        if !self.payload_resized {
            self.payload_size = fec.payload.len();
            self.payload_resized = true;
        } else if fec.payload.len() != self.payload_size {
            return Ok(());
        }
        let esi = fec.encoding_symbol_id as usize;
        if self.source_block_resized {
            let idx = esi - self.cur_sblen;
            if idx < self.repair_block.len() {
                self.repair_block[idx] = Some(packet);
            }
        } else {
            self.pending_repair.push((esi, packet));
        }
        Ok(())
    }

    fn repair_block_len_hint(&self) -> usize {
        if self.repair_block_resized {
            self.cur_blen.saturating_sub(self.cur_sblen)
        } else {
            0
        }
    }

    fn finalize_repair_block(&mut self) {
        let len = self.cur_blen.saturating_sub(self.cur_sblen);
        self.repair_block = vec![None; len];
        for (esi, packet) in std::mem::take(&mut self.pending_repair) {
            let idx = esi.saturating_sub(self.cur_sblen);
            if idx < self.repair_block.len() {
                self.repair_block[idx] = Some(packet);
            }
        }
    }

    fn try_repair(&mut self) -> Result<()> {
        if !self.can_repair
            || !(self.source_block_resized && self.repair_block_resized && self.payload_resized)
        {
            return Ok(());
        }
        if !self.source_block.iter().any(Option::is_none) {
            return Ok(());
        }
        let k = self.cur_sblen;
        let m = self.repair_block.len();
        self.decoder.begin_block(k, m, self.payload_size)?;
        for (i, slot) in self.source_block.iter().enumerate() {
            if let Some(f) = slot.as_ref().and_then(Packet::fec) {
                self.decoder.set_buffer(i, &f.payload);
            }
        }
        for (j, slot) in self.repair_block.iter().enumerate() {
            if let Some(f) = slot.as_ref().and_then(Packet::fec) {
                self.decoder.set_buffer(k + j, &f.payload);
            }
        }
        for i in 0..k {
            if self.source_block[i].is_some() {
                continue;
            }
            if let Some(payload) = self.decoder.repair_buffer(i) {
                let restored = self.factory.new_packet();
                restored.set_buffer(payload);
                restored.add_flags(PacketFlags::RESTORED);
                if self.parser.parse(&restored).is_ok() {
                    self.source_block[i] = Some(restored);
                }
            }
        }
        self.decoder.end_block();
        Ok(())
    }

    fn emit(&mut self, mode: ReadMode) -> (Status, Option<Packet>) {
        let k = self.cur_sblen;
        if k == 0 {
            return (Status::Drain, None);
        }
        let mut idx = self.head_index;
        while idx < k && self.source_block[idx].is_none() {
            idx += 1;
        }
        if idx >= k {
            return (Status::Drain, None);
        }
        let packet = self.source_block[idx].clone();
        if mode == ReadMode::Fetch {
            self.head_index = idx + 1;
            if self.head_index == k {
                self.finish_block();
            }
        }
        (Status::Ok, packet)
    }

    fn finish_block(&mut self) {
        let first_timestamp = self.source_block[0]
            .as_ref()
            .and_then(Packet::rtp)
            .map(|r| r.stream_timestamp);
        if let (Some(cur), Some(prev)) = (first_timestamp, self.prev_block_timestamp) {
            let duration = cur.wrapping_sub(prev) as i32;
            if duration >= 0 {
                self.block_max_duration = self.block_max_duration.max(duration as u32);
                self.prev_block_timestamp = first_timestamp;
            } else {
                self.prev_block_timestamp = None;
            }
        } else {
            self.prev_block_timestamp = first_timestamp;
        }

        self.source_block.clear();
        self.repair_block.clear();
        self.pending_repair.clear();
        self.source_block_resized = false;
        self.repair_block_resized = false;
        self.payload_resized = false;
        self.current_sbn = self.current_sbn.wrapping_add(1);
        self.head_index = 0;
    }
}

/// Forward distance from `base` to `target`, robust to `u32` wrap-around:
/// positive means `target` is ahead of `base`, negative means behind.
fn sbn_delta(target: u32, base: u32) -> i32 {
    target.wrapping_sub(base) as i32
}

fn scheme_mismatch() -> wavelink_core::error::WavelinkError {
    wavelink_core::error::WavelinkError::ComponentFatal(
        "fec reader: fec scheme mismatch".to_string(),
    )
}

fn sbn_jump_fatal() -> wavelink_core::error::WavelinkError {
    wavelink_core::error::WavelinkError::ComponentFatal(
        "fec reader: block size exceeds limits".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use bytes::Bytes;

    use super::*;
    use crate::fec::codec::ReedSolomonDecoder;
    use crate::fec::traits::PassthroughParser;

    #[derive(Default)]
    struct QueueSource {
        packets: VecDeque<Packet>,
    }

    impl PacketSource for QueueSource {
        fn read(&mut self) -> Result<Option<Packet>> {
            Ok(self.packets.pop_front())
        }
    }

    fn make_packet(sbn: u32, esi: u32, sblen: u32, blen: u32, payload: &[u8]) -> Packet {
        let packet = Packet::new();
        packet.set_fec(wavelink_core::packet::views::FecView {
            fec_scheme: FecScheme::ReedSolomonM8,
            encoding_symbol_id: esi,
            source_block_number: sbn,
            source_block_length: sblen,
            block_length: blen,
            payload: Bytes::copy_from_slice(payload),
        });
        packet
    }

    fn reader_with(source: VecDeque<Packet>, repair: VecDeque<Packet>) -> FecReader {
        FecReader::new(
            ReaderConfig { max_sbn_jump: 16 },
            FecScheme::ReedSolomonM8,
            Box::new(ReedSolomonDecoder::new()),
            Box::new(PassthroughParser),
            Box::new(QueueSource { packets: source }),
            Box::new(QueueSource { packets: repair }),
            PacketFactory::default(),
        )
    }

    #[test]
    fn refuses_to_start_until_esi_zero_arrives() {
        let mut source = VecDeque::new();
        source.push_back(make_packet(5, 1, 2, 3, &[1, 2]));
        let mut reader = reader_with(source, VecDeque::new());

        let (status, packet) = reader.read(ReadMode::Fetch);
        assert_eq!(status, Status::Drain);
        assert!(packet.is_none());
    }

    #[test]
    fn emits_clean_block_in_esi_order() {
        let mut source = VecDeque::new();
        source.push_back(make_packet(0, 0, 2, 2, &[1, 2]));
        source.push_back(make_packet(0, 1, 2, 2, &[3, 4]));
        let mut reader = reader_with(source, VecDeque::new());

        let (status, p0) = reader.read(ReadMode::Fetch);
        assert_eq!(status, Status::Ok);
        assert_eq!(p0.unwrap().fec().unwrap().encoding_symbol_id, 0);

        let (status, p1) = reader.read(ReadMode::Fetch);
        assert_eq!(status, Status::Ok);
        assert_eq!(p1.unwrap().fec().unwrap().encoding_symbol_id, 1);
    }

    #[test]
    fn sbn_jump_beyond_limit_kills_the_reader() {
        let mut source = VecDeque::new();
        source.push_back(make_packet(0, 0, 1, 1, &[1]));
        source.push_back(make_packet(100, 0, 1, 1, &[1]));
        let mut reader = reader_with(source, VecDeque::new());

        let (status, _) = reader.read(ReadMode::Fetch);
        assert_eq!(status, Status::Ok);
        let (status, _) = reader.read(ReadMode::Fetch);
        assert_eq!(status, Status::Abort);
        assert!(!reader.is_alive());
    }
}
