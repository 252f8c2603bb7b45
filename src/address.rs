//! Destination address validation - strkey structural checks
//!
//! An ed25519 account id is 56 characters of RFC 4648 base32 encoding a
//! 35-byte payload: version byte 0x30 ('G'), 32 raw key bytes, and a
//! little-endian CRC16-XModem checksum over the first 33. Validation here is
//! purely structural; whether the account exists on the network is a separate
//! check layered on by the session.

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
const STRKEY_LEN: usize = 56;
const VERSION_ACCOUNT: u8 = 6 << 3; // 'G' prefix

/// Structural validity of a destination identifier. Never panics; malformed
/// input, including the empty string, returns false.
pub fn is_valid(candidate: &str) -> bool {
    decode_public_key(candidate).is_some()
}

/// Decode a strkey account id to its raw 32-byte ed25519 key. `None` on any
/// structural defect: wrong length, bad alphabet, wrong version byte, or
/// checksum mismatch.
pub(crate) fn decode_public_key(candidate: &str) -> Option<[u8; 32]> {
    if candidate.len() != STRKEY_LEN {
        return None;
    }
    let data = base32_decode(candidate.as_bytes())?;
    if data.len() != 35 || data[0] != VERSION_ACCOUNT {
        return None;
    }
    let expected = crc16_xmodem(&data[..33]);
    let stored = u16::from(data[33]) | (u16::from(data[34]) << 8);
    if stored != expected {
        return None;
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(&data[1..33]);
    Some(key)
}

fn base32_decode(input: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len() * 5 / 8);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    for &c in input {
        let value = BASE32_ALPHABET.iter().position(|&a| a == c)? as u32;
        acc = (acc << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
            acc &= (1 << bits) - 1;
        }
    }
    // 56 chars carry 280 bits, exactly 35 bytes with no remainder
    if bits > 0 && acc != 0 {
        return None;
    }
    Some(out)
}

fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}
