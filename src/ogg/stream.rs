// Packet reassembly for one logical stream

use crate::ogg::page::Page;
use std::collections::VecDeque;

/// A packet rebuilt from one or more page segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub data: Vec<u8>,
    /// First packet of the logical stream
    pub bos: bool,
    /// Last packet completed on an end-of-stream page
    pub eos: bool,
    /// Granule position of the page this packet completed on, -1 unless it
    /// is the last packet completed there
    pub granule_position: i64,
}

/// Turns the pages of one serial number into packets.
#[derive(Debug)]
pub struct PacketAssembler {
    serial: u32,
    partial: Option<Vec<u8>>,
    ready: VecDeque<Packet>,
    expected_sequence: Option<u32>,
}

impl PacketAssembler {
    pub fn new(serial: u32) -> Self {
        PacketAssembler {
            serial,
            partial: None,
            ready: VecDeque::new(),
            expected_sequence: None,
        }
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Add a page. Returns false if the page belongs to another stream.
    pub fn page_in(&mut self, page: &Page) -> bool {
        if page.serial() != self.serial {
            return false;
        }

        let sequence = page.header.sequence;
        if let Some(expected) = self.expected_sequence {
            if sequence != expected && self.partial.take().is_some() {
                tracing::debug!(
                    serial = self.serial,
                    expected,
                    sequence,
                    "Page sequence gap, dropping partial packet"
                );
            }
        }
        self.expected_sequence = Some(sequence.wrapping_add(1));

        // A fresh packet start means any held fragment can never complete
        if !page.is_continuation() && self.partial.take().is_some() {
            tracing::debug!(serial = self.serial, "Unterminated packet dropped");
        }
        // Continued data without its beginning is useless
        let mut skipping = page.is_continuation() && self.partial.is_none();

        let first_new = self.ready.len();
        let mut offset = 0usize;
        let mut current = self.partial.take().unwrap_or_default();
        let mut first_packet_on_page = true;

        for &lacing in &page.header.segment_table {
            let end = (offset + lacing as usize).min(page.body.len());
            if !skipping {
                current.extend_from_slice(&page.body[offset..end]);
            }
            offset = end;

            if lacing < 255 {
                if skipping {
                    skipping = false;
                } else {
                    self.ready.push_back(Packet {
                        data: std::mem::take(&mut current),
                        bos: page.is_bos() && first_packet_on_page,
                        eos: false,
                        granule_position: -1,
                    });
                    first_packet_on_page = false;
                }
                current.clear();
            }
        }

        // The last segment was 255: the packet continues on the next page
        if page.header.segment_table.last() == Some(&255) && !skipping {
            self.partial = Some(current);
        }

        if self.ready.len() > first_new {
            if let Some(last) = self.ready.back_mut() {
                last.granule_position = page.granule_position();
                last.eos = page.is_eos();
            }
        }

        true
    }

    /// Take the next complete packet
    pub fn packet_out(&mut self) -> Option<Packet> {
        self.ready.pop_front()
    }

    /// Number of complete packets waiting
    pub fn pending(&self) -> usize {
        self.ready.len()
    }

    /// Forget all buffered data, e.g. before re-reading the file from the start
    pub fn reset(&mut self) {
        self.partial = None;
        self.ready.clear();
        self.expected_sequence = None;
    }
}
