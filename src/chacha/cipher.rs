use super::{soft, State, BLOCK_LEN};

/// A keyed ChaCha instance with a fixed round count.
///
/// Every call builds a fresh [`State`] from the stored key, so one instance
/// can serve any number of nonces. Odd `ROUNDS` fail to compile.
#[derive(Clone)]
pub struct ChaCha<const ROUNDS: usize> {
    key: [u8; 32],
}

pub type ChaCha20 = ChaCha<20>;
pub type ChaCha12 = ChaCha<12>;
pub type ChaCha8 = ChaCha<8>;

impl<const ROUNDS: usize> ChaCha<ROUNDS> {
    pub const KEY_LEN: usize = 32;
    pub const NONCE_LEN: usize = 12;
    pub const BLOCK_LEN: usize = BLOCK_LEN;

    const EVEN_ROUNDS: () = assert!(ROUNDS % 2 == 0, "ChaCha round count must be even");

    #[inline]
    pub fn new(key: &[u8; 32]) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::EVEN_ROUNDS;
        Self { key: *key }
    }

    /// # Panics
    ///
    /// Panics if `key` is not 32 bytes long.
    pub fn from_slice(key: &[u8]) -> Self {
        assert_eq!(key.len(), Self::KEY_LEN, "ChaCha key must be {} bytes", Self::KEY_LEN);
        // SAFETY: length checked above
        Self::new(unsafe { crate::utils::slice_to_array(key) })
    }

    /// RFC 7539 encryption of `buf` in place, starting at block
    /// `init_block_counter`.
    #[inline]
    pub fn encrypt_slice(&self, init_block_counter: u32, nonce: &[u8; 12], buf: &mut [u8]) {
        let mut state = State::rfc7539(&self.key, nonce, init_block_counter);
        super::encrypt_in_place(&mut state, buf, ROUNDS);
    }

    #[inline]
    pub fn decrypt_slice(&self, init_block_counter: u32, nonce: &[u8; 12], buf: &mut [u8]) {
        self.encrypt_slice(init_block_counter, nonce, buf)
    }

    /// One block of raw keystream, e.g. to derive a Poly1305 key.
    #[inline]
    pub fn keystream_block(&self, counter: u32, nonce: &[u8; 12]) -> [u8; 64] {
        let state = State::rfc7539(&self.key, nonce, counter);
        soft::block(state.words(), ROUNDS)
    }

    /// XORs keystream into `buf` using the extended layout with a 64-bit
    /// nonce and a 64-bit starting block counter.
    #[inline]
    pub fn apply_keystream_extended(&self, nonce: u64, counter: u64, buf: &mut [u8]) {
        let mut state = State::extended_256(&self.key, nonce);
        state.set_counter(counter);
        super::encrypt_in_place(&mut state, buf, ROUNDS);
    }
}

impl<const ROUNDS: usize> core::fmt::Debug for ChaCha<ROUNDS> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ChaCha{ROUNDS}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chacha::soft::{unhex, RFC_VECTORS};

    #[test]
    fn test_rfc8439_encryption() {
        let vector = &RFC_VECTORS[7];
        let cipher = ChaCha20::from_slice(&unhex(vector.key));
        let nonce: [u8; 12] = unhex(vector.nonce).try_into().unwrap();
        let plaintext = unhex(vector.plaintext);

        let mut buf = plaintext.clone();
        cipher.encrypt_slice(vector.counter, &nonce, &mut buf);
        assert_eq!(buf, unhex(vector.expected));

        cipher.decrypt_slice(vector.counter, &nonce, &mut buf);
        assert_eq!(buf, plaintext);
    }

    #[test]
    fn test_keystream_block() {
        for vector in RFC_VECTORS.iter().filter(|v| v.plaintext.is_empty()) {
            let cipher = ChaCha20::from_slice(&unhex(vector.key));
            let nonce: [u8; 12] = unhex(vector.nonce).try_into().unwrap();
            let expected = unhex(vector.expected);
            let block = cipher.keystream_block(vector.counter, &nonce);
            assert_eq!(block[..expected.len()], expected[..], "{}", vector.name);
        }
    }

    #[test]
    fn test_chacha12_extended() {
        let key = [
            0x27, 0xfc, 0x12, 0x0b, 0x01, 0x3b, 0x82, 0x9f, 0x1f, 0xae, 0xef, 0xd1, 0xab, 0x41, 0x7e, 0x86,
            0x62, 0xf4, 0x3e, 0x0d, 0x73, 0xf9, 0x8d, 0xe8, 0x66, 0xe3, 0x46, 0x35, 0x31, 0x80, 0xfd, 0xb7,
        ];
        let nonce = u64::from_le_bytes([0xdb, 0x4b, 0x4a, 0x41, 0xd8, 0xdf, 0x18, 0xaa]);

        let mut buf = [0u8; 100];
        ChaCha12::new(&key).apply_keystream_extended(nonce, 0, &mut buf);
        assert_eq!(
            buf[..],
            [
                0x5f, 0x3c, 0x8c, 0x19, 0x0a, 0x78, 0xab, 0x7f, 0xe8, 0x08, 0xca, 0xe9, 0xcb, 0xcb, 0x0a, 0x98,
                0x37, 0xc8, 0x93, 0x49, 0x2d, 0x96, 0x3a, 0x1c, 0x2e, 0xda, 0x6c, 0x15, 0x58, 0xb0, 0x2c, 0x83,
                0xfc, 0x02, 0xa4, 0x4c, 0xbb, 0xb7, 0xe6, 0x20, 0x4d, 0x51, 0xd1, 0xc2, 0x43, 0x0e, 0x9c, 0x0b,
                0x58, 0xf2, 0x93, 0x7b, 0xf5, 0x93, 0x84, 0x0c, 0x85, 0x0b, 0xda, 0x90, 0x51, 0xa1, 0xf0, 0x51,
                0xdd, 0xf0, 0x9d, 0x2a, 0x03, 0xeb, 0xf0, 0x9f, 0x01, 0xbd, 0xba, 0x9d, 0xa0, 0xb6, 0xda, 0x79,
                0x1b, 0x2e, 0x64, 0x56, 0x41, 0x04, 0x7d, 0x11, 0xeb, 0xf8, 0x50, 0x87, 0xd4, 0xde, 0x5c, 0x01,
                0x5f, 0xdd, 0xd0, 0x44,
            ][..]
        );
    }

    #[test]
    fn test_chacha8_extended() {
        let key = [
            0x64, 0x1a, 0xea, 0xeb, 0x08, 0x03, 0x6b, 0x61, 0x7a, 0x42, 0xcf, 0x14, 0xe8, 0xc5, 0xd2, 0xd1,
            0x15, 0xf8, 0xd7, 0xcb, 0x6e, 0xa5, 0xe2, 0x8b, 0x9b, 0xfa, 0xf8, 0x3e, 0x03, 0x84, 0x26, 0xa7,
        ];
        let nonce = u64::from_le_bytes([0xa1, 0x4a, 0x11, 0x68, 0x27, 0x1d, 0x45, 0x9b]);

        let mut buf = [0u8; 100];
        ChaCha8::new(&key).apply_keystream_extended(nonce, 0, &mut buf);
        assert_eq!(
            buf[..],
            [
                0x17, 0x21, 0xc0, 0x44, 0xa8, 0xa6, 0x45, 0x35, 0x22, 0xdd, 0xdb, 0x31, 0x43, 0xd0, 0xbe, 0x35,
                0x12, 0x63, 0x3c, 0xa3, 0xc7, 0x9b, 0xf8, 0xcc, 0xc3, 0x59, 0x4c, 0xb2, 0xc2, 0xf3, 0x10, 0xf7,
                0xbd, 0x54, 0x4f, 0x55, 0xce, 0x0d, 0xb3, 0x81, 0x23, 0x41, 0x2d, 0x6c, 0x45, 0x20, 0x7d, 0x5c,
                0xf9, 0xaf, 0x0c, 0x6c, 0x68, 0x0c, 0xce, 0x1f, 0x7e, 0x43, 0x38, 0x8d, 0x1b, 0x03, 0x46, 0xb7,
                0x13, 0x3c, 0x59, 0xfd, 0x6a, 0xf4, 0xa5, 0xa5, 0x68, 0xaa, 0x33, 0x4c, 0xcd, 0xc3, 0x8a, 0xf5,
                0xac, 0xe2, 0x01, 0xdf, 0x84, 0xd0, 0xa3, 0xca, 0x22, 0x54, 0x94, 0xca, 0x62, 0x09, 0x34, 0x5f,
                0xcf, 0x30, 0x13, 0x2e,
            ][..]
        );
    }

    #[test]
    fn test_extended_seek() {
        let cipher = ChaCha20::new(&[0x42; 32]);
        let mut whole = [0u8; 320];
        cipher.apply_keystream_extended(9, 0, &mut whole);

        let mut tail = [0u8; 128];
        cipher.apply_keystream_extended(9, 3, &mut tail);
        assert_eq!(tail[..], whole[192..]);
    }

    #[test]
    #[should_panic]
    fn test_from_slice_rejects_short_key() {
        ChaCha20::from_slice(&[0u8; 16]);
    }
}
