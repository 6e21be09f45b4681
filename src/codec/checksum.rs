//! Internet checksum used by the ICMP echo body.

/// 16-bit ones' complement sum (RFC 1071)
pub fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(2);
    for c in &mut chunks {
        sum = sum.wrapping_add(u16::from_be_bytes([c[0], c[1]]) as u32);
    }
    if let Some(&rem) = chunks.remainder().first() {
        sum = sum.wrapping_add(u16::from_be_bytes([rem, 0]) as u32);
    }
    while (sum >> 16) != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}
