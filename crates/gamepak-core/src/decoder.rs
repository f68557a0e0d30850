//! Stepwise XOR decoding for keyed directory tables.
//!
//! Some containers obfuscate their directory by XOR-ing each byte with a
//! repeating key. The key index advances with the byte cursor, so decoding a
//! table in one call or in many slices produces the same output as long as
//! the slices are fed in order.

/// Repeating-key XOR decoder with an explicit cursor.
///
/// # Examples
///
/// ```
/// use gamepak_core::decoder::XorDecoder;
///
/// let mut encoder = XorDecoder::new(b"key".to_vec());
/// let mut table = b"entries".to_vec();
/// encoder.decode_in_place(&mut table);
///
/// let mut decoder = XorDecoder::new(b"key".to_vec());
/// let (head, tail) = table.split_at_mut(3);
/// decoder.decode_in_place(head);
/// decoder.decode_in_place(tail);
/// assert_eq!(table, b"entries");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XorDecoder {
    key: Vec<u8>,
    key_index: usize,
    cursor: u64,
}

impl XorDecoder {
    /// Creates a decoder positioned at the start of the table.
    ///
    /// An empty key decodes every byte to itself.
    #[must_use]
    pub const fn new(key: Vec<u8>) -> Self {
        Self {
            key,
            key_index: 0,
            cursor: 0,
        }
    }

    /// Number of bytes decoded since the last reset or seek origin.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Decodes one byte and advances the cursor.
    pub fn next_byte(&mut self, byte: u8) -> u8 {
        let Some(&k) = self.key.get(self.key_index) else {
            self.cursor += 1;
            return byte;
        };
        self.key_index = (self.key_index + 1) % self.key.len();
        self.cursor += 1;
        byte ^ k
    }

    /// Decodes `buf` in place.
    pub fn decode_in_place(&mut self, buf: &mut [u8]) {
        for byte in buf {
            *byte = self.next_byte(*byte);
        }
    }

    /// Moves the cursor; the key index follows it modulo the key length.
    pub fn seek(&mut self, cursor: u64) {
        self.cursor = cursor;
        self.key_index = if self.key.is_empty() {
            0
        } else {
            // The remainder is below key.len(), so it fits in usize.
            usize::try_from(cursor % self.key.len() as u64).unwrap_or(0)
        };
    }

    /// Rewinds to the start of the table.
    pub fn reset(&mut self) {
        self.seek(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_byte_cycles_key() {
        let mut decoder = XorDecoder::new(vec![0x01, 0x02]);
        assert_eq!(decoder.next_byte(0x00), 0x01);
        assert_eq!(decoder.next_byte(0x00), 0x02);
        assert_eq!(decoder.next_byte(0x00), 0x01);
        assert_eq!(decoder.cursor(), 3);
    }

    #[test]
    fn test_decode_twice_is_identity() {
        let original = b"textures/wall01.dds".to_vec();
        let mut data = original.clone();
        XorDecoder::new(b"\x5a\xa5\x3c".to_vec()).decode_in_place(&mut data);
        assert_ne!(data, original);
        XorDecoder::new(b"\x5a\xa5\x3c".to_vec()).decode_in_place(&mut data);
        assert_eq!(data, original);
    }

    #[test]
    fn test_seek_matches_sequential() {
        let key = b"abcde".to_vec();
        let input: Vec<u8> = (0u8..32).collect();

        let mut sequential = input.clone();
        XorDecoder::new(key.clone()).decode_in_place(&mut sequential);

        let mut decoder = XorDecoder::new(key);
        decoder.seek(17);
        let mut tail = input[17..].to_vec();
        decoder.decode_in_place(&mut tail);
        assert_eq!(tail, sequential[17..]);

        decoder.reset();
        assert_eq!(decoder.cursor(), 0);
        assert_eq!(decoder.next_byte(input[0]), sequential[0]);
    }

    #[test]
    fn test_empty_key_is_passthrough() {
        let mut decoder = XorDecoder::new(Vec::new());
        let mut data = b"plain".to_vec();
        decoder.decode_in_place(&mut data);
        decoder.seek(3);
        assert_eq!(data, b"plain");
    }
}
