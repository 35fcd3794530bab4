// Theora identification header
//
// Layout after the 0x80 "theora" magic, all fields big-endian bit packed:
//   VMAJ(8) VMIN(8) VREV(8) FMBW(16) FMBH(16) PICW(24) PICH(24) PICX(8) PICY(8)
//   FRN(32) FRD(32) PARN(24) PARD(24) CS(8) NOMBR(24) QUAL(6) KFGSHIFT(5) PF(2) Res(3)

use crate::utils::irnd;
use bitstream_io::{BigEndian, BitRead, BitReader};
use std::io::Cursor;

/// Minimum size of a complete identification header
pub const IDENTIFICATION_HEADER_SIZE: usize = 42;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TheoraIdentification {
    pub vmaj: u8,
    pub vmin: u8,
    pub vsub: u8,
    /// Frame width in pixels (macroblocks * 16)
    pub fmbw: u32,
    /// Frame height in pixels (macroblocks * 16)
    pub fmbh: u32,
    pub picw: u32,
    pub pich: u32,
    pub picx: u32,
    pub picy: u32,
    pub frn: u32,
    pub frd: u32,
    pub parn: u32,
    pub pard: u32,
    pub cs: u32,
    pub nombr: u32,
    pub qual: u32,
    pub kfgshift: u32,
    pub pf: u32,
    pub display_width: u32,
    pub display_height: u32,
}

impl TheoraIdentification {
    /// Parse the identification header packet.
    pub fn parse(packet: &[u8]) -> Result<Self, String> {
        if packet.len() < IDENTIFICATION_HEADER_SIZE {
            return Err(format!("Size too small: {} bytes", packet.len()));
        }
        if packet[0] != 0x80 || &packet[1..7] != super::THEORA_MAGIC {
            return Err("Not a Theora identification header".to_string());
        }

        let mut reader = BitReader::endian(Cursor::new(&packet[7..]), BigEndian);
        let mut header = Self::read_fields(&mut reader).map_err(|e| e.to_string())?;

        if header.vmaj != 3 || header.vmin < 2 {
            return Err(format!(
                "Wrong Theora version: {}.{}.{}",
                header.vmaj, header.vmin, header.vsub
            ));
        }
        if header.frn == 0 || header.frd == 0 {
            return Err(format!("Invalid frame rate {}/{}", header.frn, header.frd));
        }

        header.compute_display_size();
        Ok(header)
    }

    fn read_fields<R: BitRead>(reader: &mut R) -> std::io::Result<Self> {
        let vmaj = reader.read::<u8>(8)?;
        let vmin = reader.read::<u8>(8)?;
        let vsub = reader.read::<u8>(8)?;
        let fmbw = reader.read::<u32>(16)? * 16;
        let fmbh = reader.read::<u32>(16)? * 16;

        Ok(TheoraIdentification {
            vmaj,
            vmin,
            vsub,
            fmbw,
            fmbh,
            picw: reader.read::<u32>(24)?,
            pich: reader.read::<u32>(24)?,
            picx: reader.read::<u32>(8)?,
            picy: reader.read::<u32>(8)?,
            frn: reader.read::<u32>(32)?,
            frd: reader.read::<u32>(32)?,
            parn: reader.read::<u32>(24)?,
            pard: reader.read::<u32>(24)?,
            cs: reader.read::<u32>(8)?,
            nombr: reader.read::<u32>(24)?,
            qual: reader.read::<u32>(6)?,
            kfgshift: reader.read::<u32>(5)?,
            pf: reader.read::<u32>(2)?,
            display_width: 0,
            display_height: 0,
        })
    }

    // Stretch one dimension so the frame shows with the pixel aspect ratio
    fn compute_display_size(&mut self) {
        if self.parn != 0 && self.pard != 0 && self.fmbh != 0 {
            let frame_ratio = self.fmbw as f64 / self.fmbh as f64;
            let pixel_ratio = self.parn as f64 / self.pard as f64;
            if frame_ratio < pixel_ratio {
                self.display_width = irnd(self.fmbw as f64 * self.parn as f64 / self.pard as f64) as u32;
                self.display_height = self.fmbh;
            } else {
                self.display_width = self.fmbw;
                self.display_height = irnd(self.fmbh as f64 * self.pard as f64 / self.parn as f64) as u32;
            }
        } else {
            self.display_width = self.fmbw;
            self.display_height = self.fmbh;
        }
    }

    pub fn fps(&self) -> f64 {
        self.frn as f64 / self.frd as f64
    }

    /// Timecode in nanoseconds of frame number `frame`
    pub fn timecode(&self, frame: u64) -> i64 {
        (1_000_000_000.0 * frame as f64 * self.frd as f64 / self.frn as f64) as i64
    }

    /// Duration of one frame in nanoseconds
    pub fn frame_duration(&self) -> i64 {
        (1_000_000_000.0 * self.frd as f64 / self.frn as f64) as i64
    }
}

/// Build an identification header, used by tests across the crate.
#[cfg(test)]
pub(crate) fn build_identification(mbw: u16, mbh: u16, frn: u32, frd: u32, parn: u32, pard: u32) -> Vec<u8> {
    let mut packet = vec![0x80];
    packet.extend_from_slice(b"theora");
    packet.extend_from_slice(&[3, 2, 1]);
    packet.extend_from_slice(&mbw.to_be_bytes());
    packet.extend_from_slice(&mbh.to_be_bytes());
    let picw = mbw as u32 * 16;
    let pich = mbh as u32 * 16;
    packet.extend_from_slice(&picw.to_be_bytes()[1..]);
    packet.extend_from_slice(&pich.to_be_bytes()[1..]);
    packet.extend_from_slice(&[0, 0]);
    packet.extend_from_slice(&frn.to_be_bytes());
    packet.extend_from_slice(&frd.to_be_bytes());
    packet.extend_from_slice(&parn.to_be_bytes()[1..]);
    packet.extend_from_slice(&pard.to_be_bytes()[1..]);
    packet.push(0); // colour space
    packet.extend_from_slice(&[0, 0, 0]); // nominal bitrate
    // QUAL(6) KFGSHIFT(5) PF(2) Res(3): quality 32, kfgshift 6, pf 0
    let bits: u16 = (32 << 10) | (6 << 5);
    packet.extend_from_slice(&bits.to_be_bytes());
    packet
}
