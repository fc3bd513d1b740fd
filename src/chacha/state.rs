use core::fmt;

use super::STATE_WORDS;

// sigma constant b"expand 32-byte k" in little-endian encoding
const K32: [u32; 4] = [0x61707865, 0x3320646e, 0x79622d32, 0x6b206574];
// tau constant b"expand 16-byte k" in little-endian encoding
const K16: [u32; 4] = [0x61707865, 0x3120646e, 0x79622d36, 0x6b206574];

/// How row 3 of the state is split between block counter and nonce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Word 12 is a 32-bit block counter, words 13..16 a 96-bit nonce.
    Rfc7539,
    /// Words 12..14 are a 64-bit block counter (low, high), words 14..16 a
    /// 64-bit nonce.
    Extended,
}

/// The 4x4 ChaCha working register.
///
/// Row 0 holds the constants, rows 1 and 2 the key and row 3 the block
/// counter and nonce as described by [`Layout`]. Only the counter words
/// change after construction; they are advanced by every backend once per
/// 64-byte block produced.
///
/// A `State` is a plain value. To generate disjoint parts of one keystream
/// in parallel, copy it and [`seek`](State::set_counter) each copy to its own
/// starting block instead of sharing one state.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct State {
    words: [u32; STATE_WORDS],
    layout: Layout,
}

impl State {
    pub const KEY_LEN: usize = 32;
    pub const NONCE_LEN: usize = 12;

    /// RFC 7539 layout: 256-bit key, 96-bit nonce, 32-bit initial counter.
    #[inline]
    pub fn rfc7539(key: &[u8; 32], nonce: &[u8; 12], counter: u32) -> Self {
        let mut words = [0u32; STATE_WORDS];
        words[..4].copy_from_slice(&K32);
        load_le(&mut words[4..12], key);

        // Counter (32-bits, little-endian)
        words[12] = counter;
        // Nonce (96-bits, little-endian)
        load_le(&mut words[13..16], nonce);

        Self { words, layout: Layout::Rfc7539 }
    }

    /// Extended layout with a 256-bit key, counter starting at zero.
    #[inline]
    pub fn extended_256(key: &[u8; 32], nonce: u64) -> Self {
        let mut words = [0u32; STATE_WORDS];
        words[..4].copy_from_slice(&K32);
        load_le(&mut words[4..12], key);
        Self::with_nonce(words, nonce)
    }

    /// Extended layout with a 128-bit key. The key fills both key rows.
    #[inline]
    pub fn extended_128(key: &[u8; 16], nonce: u64) -> Self {
        let mut words = [0u32; STATE_WORDS];
        words[..4].copy_from_slice(&K16);
        load_le(&mut words[4..8], key);
        load_le(&mut words[8..12], key);
        Self::with_nonce(words, nonce)
    }

    /// Extended layout setup from a key size in bits.
    ///
    /// # Panics
    ///
    /// Panics if `key_bits` is neither 128 nor 256, or if `key` holds fewer
    /// than `key_bits / 8` bytes. Bytes past the key size are ignored.
    pub fn key_setup(key_bits: u32, key: &[u8], nonce: u64) -> Self {
        match key_bits {
            128 => {
                assert!(key.len() >= 16, "128-bit key needs 16 bytes, got {}", key.len());
                // SAFETY: length checked above
                Self::extended_128(unsafe { crate::utils::slice_to_array(key) }, nonce)
            }
            256 => {
                assert!(key.len() >= 32, "256-bit key needs 32 bytes, got {}", key.len());
                // SAFETY: length checked above
                Self::extended_256(unsafe { crate::utils::slice_to_array(key) }, nonce)
            }
            _ => panic!("unsupported ChaCha key size: {key_bits} bits"),
        }
    }

    #[inline(always)]
    fn with_nonce(mut words: [u32; STATE_WORDS], nonce: u64) -> Self {
        words[12] = 0;
        words[13] = 0;
        words[14] = nonce as u32;
        words[15] = (nonce >> 32) as u32;
        Self { words, layout: Layout::Extended }
    }

    #[inline(always)]
    pub fn words(&self) -> &[u32; STATE_WORDS] {
        &self.words
    }

    #[inline(always)]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    #[inline(always)]
    pub fn constants(&self) -> &[u32] {
        &self.words[..4]
    }

    #[inline(always)]
    pub fn key_words(&self) -> &[u32] {
        &self.words[4..12]
    }

    #[inline(always)]
    pub fn nonce_words(&self) -> &[u32] {
        match self.layout {
            Layout::Rfc7539 => &self.words[13..16],
            Layout::Extended => &self.words[14..16],
        }
    }

    /// Index of the next block this state will produce.
    #[inline]
    pub fn counter(&self) -> u64 {
        match self.layout {
            Layout::Rfc7539 => self.words[12] as u64,
            Layout::Extended => self.words[12] as u64 | (self.words[13] as u64) << 32,
        }
    }

    /// Seeks to block `counter`.
    ///
    /// # Panics
    ///
    /// Panics if the state uses the RFC 7539 layout and `counter` does not
    /// fit in 32 bits.
    #[inline]
    pub fn set_counter(&mut self, counter: u64) {
        match self.layout {
            Layout::Rfc7539 => {
                assert!(counter <= u32::MAX as u64, "RFC 7539 block counter is 32 bits, got {counter:#x}");
                self.words[12] = counter as u32;
            }
            Layout::Extended => {
                self.words[12] = counter as u32;
                self.words[13] = (counter >> 32) as u32;
            }
        }
    }

    /// Moves the counter forward by `blocks`, wrapping at the counter width.
    #[inline(always)]
    pub(crate) fn advance(&mut self, blocks: u64) {
        match self.layout {
            Layout::Rfc7539 => {
                self.words[12] = self.words[12].wrapping_add(blocks as u32);
            }
            Layout::Extended => {
                let counter = self.counter().wrapping_add(blocks);
                self.words[12] = counter as u32;
                self.words[13] = (counter >> 32) as u32;
            }
        }
    }

    /// Row 3 of the block `ahead` positions after the current one, without
    /// moving the counter.
    #[inline(always)]
    pub(crate) fn row3_at(&self, ahead: u32) -> [u32; 4] {
        let w = &self.words;
        match self.layout {
            Layout::Rfc7539 => [w[12].wrapping_add(ahead), w[13], w[14], w[15]],
            Layout::Extended => {
                let counter = self.counter().wrapping_add(ahead as u64);
                [counter as u32, (counter >> 32) as u32, w[14], w[15]]
            }
        }
    }
}

#[inline(always)]
fn load_le(dst: &mut [u32], src: &[u8]) {
    for (word, chunk) in dst.iter_mut().zip(src.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.words.chunks_exact(4).enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{:08x}  {:08x}  {:08x}  {:08x}", row[0], row[1], row[2], row[3])?;
        }
        Ok(())
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("layout", &self.layout)
            .field("counter", &self.counter())
            .finish_non_exhaustive()
    }
}
