// Downstream packet interface
//
// Demuxers hand timed packets to packetizers. Packetizers live in a registry
// owned by the reader and are addressed by a small integer id.

use crate::codec::CodecKind;
use serde::Serialize;
use std::collections::VecDeque;

/// Frame type hint for video packets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameType {
    /// Independently decodable frame
    Key,
    /// Frame referencing earlier frames
    Delta,
}

/// A timed unit of media data. Times are in nanoseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPacket {
    pub data: Vec<u8>,
    pub timecode: Option<i64>,
    pub duration: Option<i64>,
    pub frame_type: Option<FrameType>,
}

impl MediaPacket {
    /// Packet without timing information
    pub fn untimed(data: Vec<u8>) -> Self {
        MediaPacket {
            data,
            timecode: None,
            duration: None,
            frame_type: None,
        }
    }

    pub fn timed(data: Vec<u8>, timecode: i64, duration: i64) -> Self {
        MediaPacket {
            data,
            timecode: Some(timecode),
            duration: Some(duration),
            frame_type: None,
        }
    }

    pub fn with_frame_type(mut self, frame_type: FrameType) -> Self {
        self.frame_type = Some(frame_type);
        self
    }
}

/// Receives timed packets for one track.
pub trait Packetizer {
    fn process(&mut self, packet: MediaPacket);

    /// A packet is ready for the consumer
    fn packet_available(&self) -> bool;

    /// Take the oldest ready packet
    fn get_packet(&mut self) -> Option<MediaPacket>;

    /// Bytes accepted but not yet taken by the consumer
    fn queued_bytes(&self) -> u64;

    /// No more packets will follow
    fn flush(&mut self);

    fn set_audio_output_sampling_freq(&mut self, _freq: u32) {}

    fn enable_timecode_generation(&mut self, _enable: bool) {}

    fn set_track_default_duration(&mut self, _duration: i64) {}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VideoParams {
    pub width: u32,
    pub height: u32,
    pub fps: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AudioParams {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

/// Everything a packetizer needs to know about its track
#[derive(Debug, Clone)]
pub struct PacketizerSetup {
    pub track_id: usize,
    pub codec: CodecKind,
    /// Name of the output module, as logged
    pub module: &'static str,
    pub language: Option<String>,
    pub track_name: Option<String>,
    pub codec_private: Option<Vec<u8>>,
    pub video: Option<VideoParams>,
    pub audio: Option<AudioParams>,
    pub timecode_generation: bool,
    pub default_duration: Option<i64>,
    pub output_sampling_freq: Option<u32>,
}

impl PacketizerSetup {
    pub fn new(track_id: usize, codec: CodecKind, module: &'static str) -> Self {
        PacketizerSetup {
            track_id,
            codec,
            module,
            language: None,
            track_name: None,
            codec_private: None,
            video: None,
            audio: None,
            timecode_generation: true,
            default_duration: None,
            output_sampling_freq: None,
        }
    }
}

/// Creates packetizers for the tracks being demuxed
pub trait PacketizerFactory {
    fn create(&mut self, setup: &PacketizerSetup) -> Box<dyn Packetizer>;
}

/// Index into a [`PacketizerRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PacketizerId(pub usize);

/// Owns all packetizers of a reader
#[derive(Default)]
pub struct PacketizerRegistry {
    packetizers: Vec<Box<dyn Packetizer>>,
}

impl PacketizerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, packetizer: Box<dyn Packetizer>) -> PacketizerId {
        self.packetizers.push(packetizer);
        PacketizerId(self.packetizers.len() - 1)
    }

    pub fn get(&self, id: PacketizerId) -> Option<&dyn Packetizer> {
        self.packetizers.get(id.0).map(|p| p.as_ref())
    }

    pub fn get_mut(&mut self, id: PacketizerId) -> Option<&mut (dyn Packetizer + 'static)> {
        self.packetizers.get_mut(id.0).map(|p| p.as_mut())
    }

    pub fn len(&self) -> usize {
        self.packetizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packetizers.is_empty()
    }

    /// Bytes queued over all packetizers
    pub fn queued_bytes(&self) -> u64 {
        self.packetizers.iter().map(|p| p.queued_bytes()).sum()
    }

    pub fn flush_all(&mut self) {
        for packetizer in &mut self.packetizers {
            packetizer.flush();
        }
    }
}

impl std::fmt::Debug for PacketizerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketizerRegistry")
            .field("packetizers", &self.packetizers.len())
            .finish()
    }
}

/// Keeps packets in memory until the consumer takes them.
#[derive(Debug, Default)]
pub struct QueuedPacketizer {
    queue: VecDeque<MediaPacket>,
    queued_bytes: u64,
    flushed: bool,
    timecode_generation: bool,
    default_duration: Option<i64>,
    output_sampling_freq: Option<u32>,
}

impl QueuedPacketizer {
    pub fn new() -> Self {
        QueuedPacketizer {
            timecode_generation: true,
            ..Default::default()
        }
    }

    pub fn is_flushed(&self) -> bool {
        self.flushed
    }

    pub fn timecode_generation(&self) -> bool {
        self.timecode_generation
    }

    pub fn default_duration(&self) -> Option<i64> {
        self.default_duration
    }

    pub fn output_sampling_freq(&self) -> Option<u32> {
        self.output_sampling_freq
    }
}

impl Packetizer for QueuedPacketizer {
    fn process(&mut self, packet: MediaPacket) {
        self.queued_bytes += packet.data.len() as u64;
        self.queue.push_back(packet);
    }

    fn packet_available(&self) -> bool {
        !self.queue.is_empty()
    }

    fn get_packet(&mut self) -> Option<MediaPacket> {
        let packet = self.queue.pop_front()?;
        self.queued_bytes -= packet.data.len() as u64;
        Some(packet)
    }

    fn queued_bytes(&self) -> u64 {
        self.queued_bytes
    }

    fn flush(&mut self) {
        self.flushed = true;
    }

    fn set_audio_output_sampling_freq(&mut self, freq: u32) {
        self.output_sampling_freq = Some(freq);
    }

    fn enable_timecode_generation(&mut self, enable: bool) {
        self.timecode_generation = enable;
    }

    fn set_track_default_duration(&mut self, duration: i64) {
        self.default_duration = Some(duration);
    }
}

/// Factory producing [`QueuedPacketizer`]s
#[derive(Debug, Default)]
pub struct QueuedPacketizerFactory {
    setups: Vec<PacketizerSetup>,
}

impl QueuedPacketizerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Setups seen so far, in creation order
    pub fn setups(&self) -> &[PacketizerSetup] {
        &self.setups
    }
}

impl PacketizerFactory for QueuedPacketizerFactory {
    fn create(&mut self, setup: &PacketizerSetup) -> Box<dyn Packetizer> {
        self.setups.push(setup.clone());
        Box::new(QueuedPacketizer::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queued_packetizer_accounting() {
        let mut packetizer = QueuedPacketizer::new();
        assert!(!packetizer.packet_available());

        packetizer.process(MediaPacket::untimed(vec![0; 10]));
        packetizer.process(MediaPacket::timed(vec![0; 5], 40, 40).with_frame_type(FrameType::Key));
        assert_eq!(packetizer.queued_bytes(), 15);

        let first = packetizer.get_packet().unwrap();
        assert_eq!(first.timecode, None);
        assert_eq!(packetizer.queued_bytes(), 5);

        let second = packetizer.get_packet().unwrap();
        assert_eq!(second.timecode, Some(40));
        assert_eq!(second.frame_type, Some(FrameType::Key));
        assert_eq!(packetizer.queued_bytes(), 0);
        assert!(packetizer.get_packet().is_none());
    }

    #[test]
    fn test_configuration_hooks() {
        let mut packetizer = QueuedPacketizer::new();
        assert!(packetizer.timecode_generation());
        packetizer.enable_timecode_generation(false);
        packetizer.set_track_default_duration(40_000_000);
        packetizer.set_audio_output_sampling_freq(44100);
        assert!(!packetizer.timecode_generation());
        assert_eq!(packetizer.default_duration(), Some(40_000_000));
        assert_eq!(packetizer.output_sampling_freq(), Some(44100));
    }

    #[test]
    fn test_registry() {
        let mut registry = PacketizerRegistry::new();
        let a = registry.add(Box::new(QueuedPacketizer::new()));
        let b = registry.add(Box::new(QueuedPacketizer::new()));
        assert_eq!((a, b), (PacketizerId(0), PacketizerId(1)));

        registry.get_mut(b).unwrap().process(MediaPacket::untimed(vec![1, 2, 3]));
        assert_eq!(registry.queued_bytes(), 3);
        assert!(registry.get(b).unwrap().packet_available());
        assert!(registry.get(PacketizerId(7)).is_none());
        registry.flush_all();
    }

    #[test]
    fn test_factory_records_setups() {
        let mut factory = QueuedPacketizerFactory::new();
        let setup = PacketizerSetup::new(2, CodecKind::Vorbis, "Vorbis");
        let _ = factory.create(&setup);
        assert_eq!(factory.setups().len(), 1);
        assert_eq!(factory.setups()[0].track_id, 2);
    }
}
