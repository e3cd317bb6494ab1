//! Packet retention for loss recovery
//!
//! Downstream forwarders answer NACKs out of a [`RetentionBuffer`] rather than
//! going back to the live source. Sequence numbers and timestamps on the
//! subscriber side are shifted relative to the publisher, so lookups carry
//! the offsets and the buffer hands back packets already rewritten for the
//! subscriber.

use std::collections::HashMap;
use std::sync::Mutex;
use webrtc::rtcp;
use webrtc::rtp::packet::Packet;

/// Default number of packets retained per stream
pub const DEFAULT_MAX_PACKETS: usize = 1024;

pub trait RetentionBuffer: Send + Sync {
    /// Look up retained packets of `owner_ssrc`.
    ///
    /// `sequence_numbers` are in the subscriber's numbering; the publisher's
    /// packet for `n` is `n + sn_offset`. Returned packets carry `n`, the
    /// timestamp minus `ts_offset` and `media_ssrc`. Entries no longer
    /// retained are omitted.
    fn get_buffered_packets(
        &self,
        owner_ssrc: u32,
        media_ssrc: u32,
        sn_offset: u16,
        ts_offset: u32,
        sequence_numbers: &[u16],
    ) -> Vec<Packet>;

    /// Called for every packet read from the live source
    fn record_rtp(&self, _ssrc: u32, _packet: &Packet) {}

    /// Called for every feedback batch read from the source
    fn record_feedback(
        &self,
        _ssrc: u32,
        _packets: &[Box<dyn rtcp::packet::Packet + Send + Sync>],
    ) {
    }
}

/// Bounded in-memory history, one ring per SSRC
pub struct PacketHistory {
    capacity: usize,
    streams: Mutex<HashMap<u32, Ring>>,
}

struct Ring {
    slots: Vec<Option<Packet>>,
    highest: Option<u16>,
}

impl Ring {
    fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            highest: None,
        }
    }

    fn slot(&self, sequence_number: u16) -> usize {
        sequence_number as usize % self.slots.len()
    }

    fn push(&mut self, packet: &Packet) {
        let sn = packet.header.sequence_number;
        // Newer if ahead of the highest seen, modulo wraparound
        let newer = match self.highest {
            None => true,
            Some(highest) => sn.wrapping_sub(highest) < 0x8000 && sn != highest,
        };
        if newer {
            self.highest = Some(sn);
        }
        let idx = self.slot(sn);
        self.slots[idx] = Some(packet.clone());
    }

    fn get(&self, sequence_number: u16) -> Option<&Packet> {
        let highest = self.highest?;
        if highest.wrapping_sub(sequence_number) as usize >= self.slots.len() {
            return None;
        }
        self.slots[self.slot(sequence_number)]
            .as_ref()
            .filter(|p| p.header.sequence_number == sequence_number)
    }
}

impl PacketHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            streams: Mutex::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop everything retained for a stream
    pub fn forget(&self, ssrc: u32) {
        self.streams
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&ssrc);
    }
}

impl Default for PacketHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PACKETS)
    }
}

impl RetentionBuffer for PacketHistory {
    fn get_buffered_packets(
        &self,
        owner_ssrc: u32,
        media_ssrc: u32,
        sn_offset: u16,
        ts_offset: u32,
        sequence_numbers: &[u16],
    ) -> Vec<Packet> {
        let streams = self.streams.lock().unwrap_or_else(|e| e.into_inner());
        let Some(ring) = streams.get(&owner_ssrc) else {
            return Vec::new();
        };

        sequence_numbers
            .iter()
            .filter_map(|&sn| {
                let mut packet = ring.get(sn.wrapping_add(sn_offset))?.clone();
                packet.header.sequence_number = sn;
                packet.header.timestamp = packet.header.timestamp.wrapping_sub(ts_offset);
                packet.header.ssrc = media_ssrc;
                Some(packet)
            })
            .collect()
    }

    fn record_rtp(&self, ssrc: u32, packet: &Packet) {
        self.streams
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(ssrc)
            .or_insert_with(|| Ring::new(self.capacity))
            .push(packet);
    }
}
