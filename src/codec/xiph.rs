// Xiph lacing of header packets into one codec private block
//
// Format: number of packets minus one, then the size of every packet but the
// last as a run of 255 bytes plus a remainder, then the packets themselves.

pub fn lace(packets: &[Vec<u8>]) -> Vec<u8> {
    if packets.is_empty() {
        return Vec::new();
    }

    let total: usize = packets.iter().map(|p| p.len()).sum();
    let mut out = Vec::with_capacity(1 + packets.len() * 2 + total);
    out.push((packets.len() - 1) as u8);

    for packet in &packets[..packets.len() - 1] {
        let mut size = packet.len();
        while size >= 255 {
            out.push(255);
            size -= 255;
        }
        out.push(size as u8);
    }
    for packet in packets {
        out.extend_from_slice(packet);
    }
    out
}
