//! Minimal XDR writer for the transaction envelope
//!
//! XDR is big-endian with every field padded to a 4-byte boundary. Only the
//! primitives the payment envelope needs are implemented.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

#[derive(Debug, Default)]
pub(crate) struct XdrWriter {
    buf: Vec<u8>,
}

impl XdrWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Fixed-length opaque data, padded to a 4-byte boundary.
    pub fn put_opaque(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
        self.pad(data.len());
    }

    /// Variable-length string: u32 byte length, bytes, padding.
    pub fn put_string(&mut self, value: &str) {
        self.put_u32(value.len() as u32);
        self.put_opaque(value.as_bytes());
    }

    fn pad(&mut self, len: usize) {
        let rem = len % 4;
        if rem != 0 {
            self.buf.extend(std::iter::repeat(0u8).take(4 - rem));
        }
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.buf)
    }

    #[cfg(test)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_big_endian() {
        let mut w = XdrWriter::new();
        w.put_u32(1);
        w.put_i64(-1);
        assert_eq!(w.as_bytes()[..4], [0, 0, 0, 1]);
        assert_eq!(w.as_bytes()[4..], [0xFF; 8]);
    }

    #[test]
    fn strings_pad_to_four_bytes() {
        let mut w = XdrWriter::new();
        w.put_string("abcde");
        // length word + 5 bytes + 3 padding
        assert_eq!(w.as_bytes().len(), 12);
        assert_eq!(&w.as_bytes()[4..9], b"abcde");
        assert_eq!(&w.as_bytes()[9..], &[0, 0, 0]);
    }

    #[test]
    fn aligned_opaque_gets_no_padding() {
        let mut w = XdrWriter::new();
        w.put_opaque(&[1, 2, 3, 4]);
        assert_eq!(w.as_bytes().len(), 4);
    }
}
