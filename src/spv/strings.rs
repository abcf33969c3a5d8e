// This module implements the string codec for the SPIR-V-style binary format.
// Textual literals are carried inside instructions as a run of 32-bit words,
// four bytes per word in little-endian byte order, padded with null bytes to a
// 32-bit boundary and always carrying at least one null terminator (a string
// whose length is an exact multiple of four gets a full trailing zero word).
// The encoder packs a &str into words when an instruction is built; the
// decoder reads words back out of an operand stream until it sees the
// terminator. Both directions agree on the padding rule, so the number of
// operands a string occupies can be computed on either side as
// byte_len / 4 + 1.

//! Packing and unpacking of embedded string literals.

/// Length of the string in bytes once the null terminator and padding to a
/// 4-byte boundary are accounted for.
pub fn padded_len(s: &str) -> usize {
    let len = s.len() + 1;
    if len % 4 == 0 {
        len
    } else {
        len + (4 - len % 4)
    }
}

/// Number of 32-bit operands the encoded form of `s` occupies.
pub fn word_count(s: &str) -> usize {
    padded_len(s) / 4
}

fn chars_to_word(bytes: &[u8], at: usize) -> u32 {
    let mut word = 0u32;
    for lane in 0..4 {
        let idx = at + lane;
        let ch = if idx < bytes.len() { bytes[idx] } else { 0 };
        word |= u32::from(ch) << (lane * 8);
    }
    word
}

/// Pack a string into its word representation, padding included.
pub fn encode_string(s: &str) -> Vec<u32> {
    let bytes = s.as_bytes();
    let mut words = Vec::with_capacity(word_count(s));
    let mut i = 0;
    while i < padded_len(s) {
        words.push(chars_to_word(bytes, i));
        i += 4;
    }
    words
}

/// Unpack a string from consecutive words, stopping at the first null byte.
///
/// Words past the terminator are not inspected; the caller advances its
/// operand cursor by `word_count` of the returned string.
pub fn decode_string(words: &[u32]) -> String {
    let mut out = String::new();
    for word in words {
        for lane in 0..4 {
            let ch = ((word >> (lane * 8)) & 0xff) as u8;
            if ch == 0 {
                return out;
            }
            out.push(ch as char);
        }
    }
    out
}
