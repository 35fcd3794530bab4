// AAC AudioSpecificConfig
//
// OggDS AAC streams may append a decoder config to their stream header. Only
// the fields needed to set up the output are decoded.

use bitstream_io::{BigEndian, BitRead, BitReader};
use std::io::{self, Cursor};

pub const SAMPLING_FREQUENCIES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

const AOT_SBR: u8 = 5;
const AOT_PS: u8 = 29;
const SYNC_EXTENSION_TYPE: u32 = 0x2b7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpecificConfig {
    pub object_type: u8,
    pub sample_rate: u32,
    pub channels: u8,
    pub sbr: bool,
    /// Sampling frequency after SBR upsampling
    pub output_sample_rate: u32,
}

fn read_object_type<R: BitRead>(reader: &mut R) -> io::Result<u8> {
    let object_type = reader.read::<u8>(5)?;
    if object_type == 31 {
        Ok(32 + reader.read::<u8>(6)?)
    } else {
        Ok(object_type)
    }
}

fn read_sample_rate<R: BitRead>(reader: &mut R) -> io::Result<u32> {
    let index = reader.read::<u8>(4)?;
    if index == 0x0f {
        return reader.read::<u32>(24);
    }
    SAMPLING_FREQUENCIES
        .get(index as usize)
        .copied()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, format!("reserved sampling index {}", index)))
}

impl AudioSpecificConfig {
    pub fn parse(data: &[u8]) -> io::Result<Self> {
        let mut reader = BitReader::endian(Cursor::new(data), BigEndian);

        let mut object_type = read_object_type(&mut reader)?;
        let sample_rate = read_sample_rate(&mut reader)?;
        let channels = reader.read::<u8>(4)?;
        let mut sbr = false;
        let mut output_sample_rate = 0;

        if object_type == AOT_SBR || object_type == AOT_PS {
            sbr = true;
            output_sample_rate = read_sample_rate(&mut reader)?;
            object_type = read_object_type(&mut reader)?;
        } else if data.len() >= 5 {
            // Backwards compatible SBR signalling after the GASpecificConfig
            let _ga_specific = reader.read::<u8>(3)?;
            if reader.read::<u32>(11)? == SYNC_EXTENSION_TYPE && read_object_type(&mut reader)? == AOT_SBR {
                sbr = reader.read_bit()?;
                if sbr {
                    output_sample_rate = read_sample_rate(&mut reader)?;
                }
            }
        }

        if sbr && output_sample_rate == 0 {
            output_sample_rate = sample_rate * 2;
        }
        if !sbr {
            output_sample_rate = sample_rate;
        }

        Ok(AudioSpecificConfig {
            object_type,
            sample_rate,
            channels,
            sbr,
            output_sample_rate,
        })
    }
}
