// h.264 decoder configuration (avcC) from OggDS AVC streams
//
// OggDS AVC tracks carry Annex B data: parameter sets follow the stream
// header in the first packet and show up in the first data packets.

const NAL_TYPE_SPS: u8 = 7;
const NAL_TYPE_PPS: u8 = 8;

/// Collects SPS and PPS NAL units from Annex B byte streams.
#[derive(Debug, Default)]
pub struct ParameterSetCollector {
    sps: Vec<Vec<u8>>,
    pps: Vec<Vec<u8>>,
    nalu_size_length: Option<u8>,
}

impl ParameterSetCollector {
    pub fn new(nalu_size_length: Option<u8>) -> Self {
        ParameterSetCollector {
            nalu_size_length,
            ..Default::default()
        }
    }

    /// Scan `data` for parameter sets
    pub fn add_bytes(&mut self, data: &[u8]) {
        for (nal_type, nal) in extract_nal_units(data) {
            let list = match nal_type {
                NAL_TYPE_SPS => &mut self.sps,
                NAL_TYPE_PPS => &mut self.pps,
                _ => continue,
            };
            // avcC stores parameter set sizes in 16 bits
            if nal.len() > u16::MAX as usize {
                tracing::debug!(nal_type, size = nal.len(), "Parameter set too large, skipping it");
                continue;
            }
            if !list.contains(&nal) {
                list.push(nal);
            }
        }
    }

    /// At least one SPS and one PPS were found
    pub fn headers_parsed(&self) -> bool {
        !self.sps.is_empty() && !self.pps.is_empty()
    }

    /// Build the AVCDecoderConfigurationRecord
    pub fn avcc(&self) -> Option<Vec<u8>> {
        if !self.headers_parsed() {
            return None;
        }
        let first_sps = &self.sps[0];
        if first_sps.len() < 4 {
            return None;
        }

        let length_size = self.nalu_size_length.unwrap_or(4).clamp(1, 4);

        let mut out = vec![
            1,
            first_sps[1],
            first_sps[2],
            first_sps[3],
            0xFC | (length_size - 1),
            0xE0 | (self.sps.len().min(31) as u8),
        ];
        for sps in self.sps.iter().take(31) {
            out.extend_from_slice(&(sps.len() as u16).to_be_bytes());
            out.extend_from_slice(sps);
        }
        out.push(self.pps.len().min(255) as u8);
        for pps in self.pps.iter().take(255) {
            out.extend_from_slice(&(pps.len() as u16).to_be_bytes());
            out.extend_from_slice(pps);
        }
        Some(out)
    }
}

/// Split an Annex B byte stream into `(nal_type, nal)` pairs
fn extract_nal_units(data: &[u8]) -> Vec<(u8, Vec<u8>)> {
    let mut nal_units = Vec::new();
    let mut i = 0;
    let mut last_nal_start = None;

    let mut push = |nal_data: &[u8]| {
        // Trailing zero bytes belong to the next start code
        let end = nal_data.iter().rposition(|&b| b != 0).map(|p| p + 1).unwrap_or(0);
        let nal_data = &nal_data[..end];
        if !nal_data.is_empty() {
            nal_units.push((nal_data[0] & 0x1F, nal_data.to_vec()));
        }
    };

    while i + 2 < data.len() {
        let is_start_code = data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 1;
        if is_start_code {
            if let Some(start) = last_nal_start {
                push(&data[start..i]);
            }
            i += 3;
            last_nal_start = Some(i);
        } else {
            i += 1;
        }
    }

    if let Some(start) = last_nal_start {
        if start < data.len() {
            push(&data[start..]);
        }
    }

    nal_units
}

/// Offset of the first 00 00 00 01 start code within `data`
pub fn find_start_code(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == [0, 0, 0, 1])
}

/// Build the avcC record from the bytes following the OggDS stream header and
/// the buffered non-header packets.
pub fn extract_avcc(private_data: &[u8], packets: &[Vec<u8>], nalu_size_length: Option<u8>) -> Option<Vec<u8>> {
    let mut collector = ParameterSetCollector::new(nalu_size_length);

    if let Some(start) = find_start_code(private_data) {
        collector.add_bytes(&private_data[start..]);
    }

    for packet in packets.iter().filter(|p| !p.is_empty()) {
        collector.add_bytes(packet);
        if collector.headers_parsed() {
            return collector.avcc();
        }
    }

    if collector.headers_parsed() {
        return collector.avcc();
    }
    None
}

#[cfg(test)]
pub(crate) const TEST_SPS: [u8; 8] = [0x67, 0x64, 0x00, 0x1F, 0xAC, 0xD9, 0x40, 0x50];
#[cfg(test)]
pub(crate) const TEST_PPS: [u8; 4] = [0x68, 0xEB, 0xE3, 0xCB];
