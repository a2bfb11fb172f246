// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! FEC block writer: groups an outgoing source stream into blocks and
//! emits repair packets alongside them.

use rand::Rng;
use tracing::{debug, error, trace};

use wavelink_core::address::FecScheme;
use wavelink_core::error::{Result, WavelinkError};
use wavelink_core::packet::views::FecView;
use wavelink_core::packet::{Packet, PacketFactory};
use wavelink_core::status::Status;

use super::codec::BlockEncoder;
use super::traits::{Composer, PacketSink};

/// Source/repair block sizes a writer is constructed or resized with.
#[derive(Debug, Clone, Copy)]
pub struct WriterConfig {
    pub n_source_packets: usize,
    pub n_repair_packets: usize,
}

pub struct FecWriter {
    cur_sblen: usize,
    next_sblen: usize,
    cur_rblen: usize,
    next_rblen: usize,
    cur_payload_size: usize,
    cur_sbn: u32,
    cur_block_repair_sn: u16,
    cur_packet: usize,

    encoder: Box<dyn BlockEncoder>,
    sink: Box<dyn PacketSink>,
    source_composer: Box<dyn Composer>,
    repair_composer: Box<dyn Composer>,
    factory: PacketFactory,

    fec_scheme: FecScheme,
    repair_block: Vec<Option<Packet>>,
    alive: bool,
}

impl FecWriter {
    /// # Errors
    /// Returns an error if `config` is rejected outright (`n_source_packets
    /// == 0`, or the combined block length exceeds the encoder's limit).
    pub fn new(
        config: WriterConfig,
        fec_scheme: FecScheme,
        encoder: Box<dyn BlockEncoder>,
        sink: Box<dyn PacketSink>,
        source_composer: Box<dyn Composer>,
        repair_composer: Box<dyn Composer>,
        factory: PacketFactory,
    ) -> Result<Self> {
        let mut writer = FecWriter {
            cur_sblen: 0,
            next_sblen: 0,
            cur_rblen: 0,
            next_rblen: 0,
            cur_payload_size: 0,
            cur_sbn: rand::thread_rng().gen(),
            cur_block_repair_sn: rand::thread_rng().gen(),
            cur_packet: 0,
            encoder,
            sink,
            source_composer,
            repair_composer,
            factory,
            fec_scheme,
            repair_block: Vec::new(),
            alive: true,
        };
        writer.resize(config.n_source_packets, config.n_repair_packets)?;
        Ok(writer)
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Schedules a block size change, effective at the start of the next
    /// block.
    ///
    /// # Errors
    /// Rejects `sblen == 0` and a combined block length above the
    /// encoder's `max_block_length`.
    pub fn resize(&mut self, sblen: usize, rblen: usize) -> Result<()> {
        if self.next_sblen == sblen && self.next_rblen == rblen {
            return Ok(());
        }
        if sblen == 0 {
            return Err(WavelinkError::ComponentFatal(
                "fec writer: resize: sblen can't be zero".to_string(),
            ));
        }
        let new_blen = sblen + rblen;
        if new_blen > self.encoder.max_block_length() {
            debug!(
                cur_sblen = self.cur_sblen,
                cur_rblen = self.cur_rblen,
                new_sblen = sblen,
                new_rblen = rblen,
                max_blen = self.encoder.max_block_length(),
                "fec writer: can't update block length, maximum value exceeded"
            );
            return Err(WavelinkError::ComponentFatal(
                "fec writer: resize exceeds max_block_length".to_string(),
            ));
        }
        trace!(
            cur_sblen = self.cur_sblen,
            cur_rblen = self.cur_rblen,
            new_sblen = sblen,
            new_rblen = rblen,
            "fec writer: update block size"
        );
        self.next_sblen = sblen;
        self.next_rblen = rblen;
        Ok(())
    }

    /// Writes one source packet, slotting it into the current block and
    /// emitting repair packets once the block fills.
    ///
    /// # Errors
    /// Never returns `Err`; block-level failures latch `alive` to `false`
    /// and surface through [`FecWriter::is_alive`], matching the writer's
    /// no-op-once-dead contract.
    pub fn write(&mut self, packet: Packet) -> Result<Status> {
        if !self.alive {
            return Ok(Status::Ok);
        }
        self.validate_fec_packet(&packet);

        if self.cur_packet == 0 && !self.begin_block(&packet) {
            return Ok(Status::Ok);
        }

        if !self.validate_source_packet(&packet) {
            return Ok(Status::Ok);
        }

        self.write_source_packet(&packet)?;
        self.cur_packet += 1;

        if self.cur_packet == self.cur_sblen {
            self.end_block()?;
            self.next_block();
        }

        Ok(Status::Ok)
    }

    fn begin_block(&mut self, packet: &Packet) -> bool {
        let payload_size = packet.fec().map_or(0, |f| f.payload.len());
        if !self.apply_sizes(self.next_sblen, self.next_rblen, payload_size) {
            return false;
        }
        trace!(
            sbn = self.cur_sbn,
            sblen = self.cur_sblen,
            rblen = self.cur_rblen,
            payload_size = self.cur_payload_size,
            "fec writer: begin block"
        );
        if self
            .encoder
            .begin(self.cur_sblen, self.cur_rblen, self.cur_payload_size)
            .is_err()
        {
            error!(
                sblen = self.cur_sblen,
                rblen = self.cur_rblen,
                "fec writer: can't begin encoder block, shutting down"
            );
            self.alive = false;
            return false;
        }
        true
    }

    fn apply_sizes(&mut self, sblen: usize, rblen: usize, payload_size: usize) -> bool {
        if payload_size == 0 {
            error!("fec writer: payload size can't be zero");
            self.alive = false;
            return false;
        }
        if self.repair_block.len() != rblen {
            self.repair_block.resize_with(rblen, || None);
        }
        self.cur_sblen = sblen;
        self.cur_rblen = rblen;
        self.cur_payload_size = payload_size;
        true
    }

    fn write_source_packet(&mut self, packet: &Packet) -> Result<()> {
        let payload = packet.fec().map(|f| f.payload).unwrap_or_default();
        self.encoder.set(self.cur_packet, &payload);

        self.fill_packet_fec_fields(packet, self.cur_packet as u32);
        self.source_composer.compose(packet)?;
        packet.add_flags(wavelink_core::packet::PacketFlags::COMPOSED);

        self.sink.write(packet.clone())
    }

    fn end_block(&mut self) -> Result<()> {
        self.make_repair_packets();
        self.encode_repair_packets()?;
        self.compose_repair_packets()?;
        self.write_repair_packets()?;
        self.encoder.end();
        Ok(())
    }

    fn next_block(&mut self) {
        self.cur_block_repair_sn = self
            .cur_block_repair_sn
            .wrapping_add(self.cur_rblen as u16);
        self.cur_sbn = self.cur_sbn.wrapping_add(1);
        self.cur_packet = 0;
    }

    fn make_repair_packets(&mut self) {
        for i in 0..self.cur_rblen {
            if let Some(packet) = self.make_repair_packet(i as u32) {
                self.repair_block[i] = Some(packet);
            }
        }
    }

    fn make_repair_packet(&mut self, pack_n: u32) -> Option<Packet> {
        let packet = self.factory.new_packet();
        let alignment = self.encoder.alignment();
        let aligned_size = self.repair_composer.align(self.cur_payload_size, alignment);
        if self.repair_composer.prepare(&packet, aligned_size).is_err() {
            error!("fec writer: can't prepare repair packet");
            return None;
        }
        packet.add_flags(wavelink_core::packet::PacketFlags::PREPARED);

        self.fill_packet_fec_fields(&packet, self.cur_sblen as u32 + pack_n);
        Some(packet)
    }

    fn encode_repair_packets(&mut self) -> Result<()> {
        // Repair slots need no staging: `fill()` derives their contents
        // purely from the source payloads already staged in `write_source_packet`.
        self.encoder.fill()
    }

    fn compose_repair_packets(&mut self) -> Result<()> {
        for i in 0..self.cur_rblen {
            let Some(rp) = self.repair_block[i].clone() else {
                continue;
            };
            let payload = self.encoder.get(self.cur_sblen + i);
            if let Some(mut fec) = rp.fec() {
                fec.payload = payload;
                rp.set_fec(fec);
            }
            self.repair_composer.compose(&rp)?;
            rp.add_flags(wavelink_core::packet::PacketFlags::COMPOSED);
        }
        Ok(())
    }

    fn write_repair_packets(&mut self) -> Result<()> {
        for i in 0..self.cur_rblen {
            if let Some(rp) = self.repair_block[i].take() {
                self.sink.write(rp)?;
            }
        }
        Ok(())
    }

    fn fill_packet_fec_fields(&self, packet: &Packet, pack_n: u32) {
        let payload = packet.fec().map(|f| f.payload).unwrap_or_default();
        packet.set_fec(FecView {
            fec_scheme: self.fec_scheme,
            encoding_symbol_id: pack_n,
            source_block_number: self.cur_sbn,
            source_block_length: self.cur_sblen as u32,
            block_length: (self.cur_sblen + self.cur_rblen) as u32,
            payload,
        });
    }

    fn validate_fec_packet(&self, packet: &Packet) {
        debug_assert!(
            packet.has_flags(wavelink_core::packet::PacketFlags::PREPARED),
            "fec writer: unexpected packet: should be prepared"
        );
        debug_assert!(
            !packet.has_flags(wavelink_core::packet::PacketFlags::COMPOSED),
            "fec writer: unexpected packet: should not be composed"
        );
        if let Some(fec) = packet.fec() {
            debug_assert!(
                fec.fec_scheme == self.fec_scheme,
                "fec writer: unexpected packet fec scheme"
            );
        }
    }

    fn validate_source_packet(&mut self, packet: &Packet) -> bool {
        let payload_size = packet.fec().map_or(0, |f| f.payload.len());
        if payload_size != self.cur_payload_size {
            error!(
                sbn = self.cur_sbn,
                esi = self.cur_packet,
                old_size = self.cur_payload_size,
                new_size = payload_size,
                "fec writer: can't change payload size in the middle of a block"
            );
            self.alive = false;
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::fec::codec::ReedSolomonEncoder;
    use crate::fec::traits::PassthroughComposer;

    #[derive(Default, Clone)]
    struct RecordingSink {
        packets: Arc<Mutex<Vec<Packet>>>,
    }

    impl PacketSink for RecordingSink {
        fn write(&mut self, packet: Packet) -> Result<()> {
            self.packets.lock().unwrap().push(packet);
            Ok(())
        }
    }

    fn make_source_packet(factory: &PacketFactory, payload: &[u8]) -> Packet {
        let packet = factory.new_packet();
        packet.add_flags(wavelink_core::packet::PacketFlags::PREPARED);
        packet.set_fec(FecView {
            fec_scheme: FecScheme::ReedSolomonM8,
            encoding_symbol_id: 0,
            source_block_number: 0,
            source_block_length: 0,
            block_length: 0,
            payload: Bytes::copy_from_slice(payload),
        });
        packet
    }

    #[test]
    fn emits_one_repair_batch_per_full_block() {
        let sink = RecordingSink::default();
        let factory = PacketFactory::default();
        let config = WriterConfig {
            n_source_packets: 2,
            n_repair_packets: 1,
        };
        let mut writer = FecWriter::new(
            config,
            FecScheme::ReedSolomonM8,
            Box::new(ReedSolomonEncoder::new()),
            Box::new(sink.clone()),
            Box::new(PassthroughComposer),
            Box::new(PassthroughComposer),
            factory.clone(),
        )
        .unwrap();

        for _ in 0..2 {
            let packet = make_source_packet(&factory, &[1, 2, 3, 4]);
            writer.write(packet).unwrap();
        }

        let packets = sink.packets.lock().unwrap();
        assert_eq!(packets.len(), 3);
        assert!(writer.is_alive());
    }

    #[test]
    fn mid_block_payload_size_change_kills_the_writer() {
        let sink = RecordingSink::default();
        let factory = PacketFactory::default();
        let config = WriterConfig {
            n_source_packets: 2,
            n_repair_packets: 1,
        };
        let mut writer = FecWriter::new(
            config,
            FecScheme::ReedSolomonM8,
            Box::new(ReedSolomonEncoder::new()),
            Box::new(sink),
            Box::new(PassthroughComposer),
            Box::new(PassthroughComposer),
            factory.clone(),
        )
        .unwrap();

        writer
            .write(make_source_packet(&factory, &[1, 2, 3, 4]))
            .unwrap();
        writer
            .write(make_source_packet(&factory, &[1, 2, 3]))
            .unwrap();
        assert!(!writer.is_alive());
    }

    #[test]
    fn resize_rejects_zero_source_length() {
        let sink = RecordingSink::default();
        let factory = PacketFactory::default();
        let mut writer = FecWriter::new(
            WriterConfig {
                n_source_packets: 4,
                n_repair_packets: 2,
            },
            FecScheme::ReedSolomonM8,
            Box::new(ReedSolomonEncoder::new()),
            Box::new(sink),
            Box::new(PassthroughComposer),
            Box::new(PassthroughComposer),
            factory,
        )
        .unwrap();

        assert!(writer.resize(0, 2).is_err());
    }
}
