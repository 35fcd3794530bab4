// Kate identification header (64 bytes)
//
//   0      packet type 0x80
//   1..8   "kate\0\0\0"
//   8      reserved
//   9      vmaj
//   10     vmin
//   11     number of header packets
//   12     text encoding
//   13     text directionality
//   14     reserved
//   15     granule shift
//   16..24 reserved
//   24..28 granule rate numerator (LE)
//   28..32 granule rate denominator (LE)
//   32..48 language, NUL terminated
//   48..64 category, NUL terminated

use crate::utils::io::le_u32_at;

pub const IDENTIFICATION_HEADER_SIZE: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KateIdentification {
    pub vmaj: u8,
    pub vmin: u8,
    pub nheaders: u8,
    pub tenc: u8,
    pub tdir: u8,
    pub kfgshift: u8,
    pub gnum: u32,
    pub gden: u32,
    pub language: String,
    pub category: String,
}

fn nul_terminated(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).to_string()
}

impl KateIdentification {
    pub fn parse(packet: &[u8]) -> Result<Self, String> {
        if packet.len() < IDENTIFICATION_HEADER_SIZE {
            return Err(format!("Size too small: {} bytes", packet.len()));
        }
        if packet[0] != 0x80 || &packet[1..8] != super::KATE_MAGIC {
            return Err("Not a Kate identification header".to_string());
        }

        let header = KateIdentification {
            vmaj: packet[9],
            vmin: packet[10],
            nheaders: packet[11],
            tenc: packet[12],
            tdir: packet[13],
            kfgshift: packet[15],
            gnum: le_u32_at(packet, 24).unwrap_or(0),
            gden: le_u32_at(packet, 28).unwrap_or(0),
            language: nul_terminated(&packet[32..48]),
            category: nul_terminated(&packet[48..64]),
        };

        if header.vmaj != 0 {
            return Err(format!("Wrong Kate version: {}.{}", header.vmaj, header.vmin));
        }
        if header.nheaders == 0 {
            return Err("No header packets declared".to_string());
        }
        Ok(header)
    }
}

/// Build an identification header, used by tests across the crate.
#[cfg(test)]
pub(crate) fn build_identification(nheaders: u8, language: &str) -> Vec<u8> {
    let mut packet = vec![0u8; IDENTIFICATION_HEADER_SIZE];
    packet[0] = 0x80;
    packet[1..8].copy_from_slice(super::KATE_MAGIC);
    packet[10] = 5;
    packet[11] = nheaders;
    packet[15] = 32;
    packet[24..28].copy_from_slice(&1000u32.to_le_bytes());
    packet[28..32].copy_from_slice(&1u32.to_le_bytes());
    packet[32..32 + language.len()].copy_from_slice(language.as_bytes());
    packet[48..51].copy_from_slice(b"SUB");
    packet
}
