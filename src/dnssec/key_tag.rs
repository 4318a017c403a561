/// Key tag of a DNSKEY given its full rdata (RFC 4034 Appendix B)
pub fn key_tag(algorithm: u8, rdata: &[u8]) -> u16 {
    // RSAMD5 uses the low 16 bits of the modulus
    if algorithm == 1 {
        return match rdata.len() {
            n if n >= 4 + 3 => u16::from_be_bytes([rdata[n - 3], rdata[n - 2]]),
            _ => 0,
        };
    }

    let mut accumulator: u32 = rdata
        .iter()
        .enumerate()
        .map(|(i, &byte)| if i % 2 == 0 { u32::from(byte) << 8 } else { u32::from(byte) })
        .sum();

    accumulator += accumulator >> 16;
    (accumulator & 0xFFFF) as u16
}
