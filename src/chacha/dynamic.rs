use core::fmt;
use std::sync::OnceLock;

use super::{soft, State, BLOCK_LEN};
#[cfg(x86_simd)]
use super::{Avx2, Ssse3};

/// A block-producing implementation of the ChaCha block function.
///
/// All backends produce the same keystream for the same state; they differ
/// only in how many blocks one call produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    Soft,
    Ssse3,
    Avx2,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Soft, Backend::Ssse3, Backend::Avx2];

    /// The preferred backend for this CPU. Probed on first use and cached
    /// for the life of the process.
    pub fn detect() -> Self {
        static BEST: OnceLock<Backend> = OnceLock::new();
        *BEST.get_or_init(|| {
            if cfg!(feature = "force_soft") {
                return Backend::Soft;
            }
            [Backend::Avx2, Backend::Ssse3]
                .into_iter()
                .find(|backend| backend.is_available())
                .unwrap_or(Backend::Soft)
        })
    }

    /// Block stride: 64-byte blocks produced per call, or 0 when this
    /// backend cannot run in this build or on this CPU.
    #[inline]
    pub fn blocks(self) -> usize {
        match self {
            Backend::Soft => soft::BLOCKS,
            #[cfg(x86_simd)]
            Backend::Ssse3 => Ssse3::detect().map_or(0, |_| Ssse3::BLOCKS),
            #[cfg(x86_simd)]
            Backend::Avx2 => Avx2::detect().map_or(0, |_| Avx2::BLOCKS),
            #[cfg(not(x86_simd))]
            Backend::Ssse3 | Backend::Avx2 => 0,
        }
    }

    #[inline]
    pub fn is_available(self) -> bool {
        self.blocks() != 0
    }

    pub fn name(self) -> &'static str {
        match self {
            Backend::Soft => "soft",
            Backend::Ssse3 => "ssse3",
            Backend::Avx2 => "avx2",
        }
    }

    /// Runs this backend alone over `buf` at its native stride, XORing the
    /// keystream in place.
    ///
    /// # Panics
    ///
    /// Panics if the backend is unavailable, if `rounds` is odd, or if
    /// `buf.len()` is not a multiple of `blocks() * 64`.
    pub fn xor_blocks(self, state: &mut State, buf: &mut [u8], rounds: usize) {
        super::assert_rounds(rounds);
        let stride = self.blocks();
        assert!(stride != 0, "{self} backend is not available on this CPU");
        assert_eq!(
            buf.len() % (stride * BLOCK_LEN),
            0,
            "{self} works on {} byte chunks",
            stride * BLOCK_LEN
        );

        let done = match self {
            Backend::Soft => xor_chunks::<BLOCK_LEN>(buf, |block| soft::xor_block(state, block, rounds)),
            #[cfg(x86_simd)]
            Backend::Ssse3 => match Ssse3::detect() {
                Some(simd) => xor_chunks::<{ Ssse3::BYTES }>(buf, |blocks| simd.xor_blocks(state, blocks, rounds)),
                None => 0,
            },
            #[cfg(x86_simd)]
            Backend::Avx2 => match Avx2::detect() {
                Some(simd) => xor_chunks::<{ Avx2::BYTES }>(buf, |blocks| simd.xor_blocks(state, blocks, rounds)),
                None => 0,
            },
            #[cfg(not(x86_simd))]
            Backend::Ssse3 | Backend::Avx2 => 0,
        };
        debug_assert_eq!(done, buf.len());
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Feeds every whole `N`-byte chunk of `buf` to `op`, returns the bytes
/// consumed.
#[inline(always)]
fn xor_chunks<const N: usize>(buf: &mut [u8], mut op: impl FnMut(&mut [u8; N])) -> usize {
    let len = buf.len() - buf.len() % N;
    let mut start = 0;
    while start < len {
        // SAFETY: start + N <= len <= buf.len()
        let chunk = unsafe { crate::utils::slice_to_array_at_mut::<u8, N>(buf, start) };
        op(chunk);
        start += N;
    }
    len
}

/// XORs `buf.len()` bytes of keystream into `buf`, advancing the counter by
/// one per block started. Full SIMD chunks go to `backend`, the rest to the
/// scalar block function.
fn drive(backend: Backend, state: &mut State, buf: &mut [u8], rounds: usize) {
    super::assert_rounds(rounds);

    let mut start = 0;
    let stride = backend.blocks();
    if backend != Backend::Soft && stride != 0 {
        let len = buf.len() - buf.len() % (stride * BLOCK_LEN);
        backend.xor_blocks(state, &mut buf[..len], rounds);
        start = len;
    }

    let rest = &mut buf[start..];
    let full = xor_chunks::<BLOCK_LEN>(rest, |block| soft::xor_block(state, block, rounds));

    let tail = &mut rest[full..];
    if !tail.is_empty() {
        // a partially used block still consumes its counter value
        let mut keystream = [0u8; BLOCK_LEN];
        soft::keystream_block(state, &mut keystream, rounds);
        for (byte, key) in tail.iter_mut().zip(keystream.iter()) {
            *byte ^= key;
        }
    }
}

/// Encrypts (or decrypts) `input` into `output` with the fastest available
/// backend.
///
/// # Panics
///
/// Panics if `input` and `output` differ in length or `rounds` is odd.
pub fn encrypt(state: &mut State, input: &[u8], output: &mut [u8], rounds: usize) {
    encrypt_with(Backend::detect(), state, input, output, rounds)
}

/// In-place variant of [`encrypt`].
///
/// # Panics
///
/// Panics if `rounds` is odd.
pub fn encrypt_in_place(state: &mut State, buf: &mut [u8], rounds: usize) {
    drive(Backend::detect(), state, buf, rounds)
}

/// [`encrypt`] with an explicitly chosen backend.
///
/// # Panics
///
/// Panics if `backend` is unavailable, the buffers differ in length or
/// `rounds` is odd.
pub fn encrypt_with(backend: Backend, state: &mut State, input: &[u8], output: &mut [u8], rounds: usize) {
    assert_eq!(input.len(), output.len(), "input and output must have the same length");
    output.copy_from_slice(input);
    apply_keystream_with(backend, state, output, rounds)
}

/// [`encrypt_in_place`] with an explicitly chosen backend.
///
/// # Panics
///
/// Panics if `backend` is unavailable or `rounds` is odd.
pub fn apply_keystream_with(backend: Backend, state: &mut State, buf: &mut [u8], rounds: usize) {
    assert!(backend.is_available(), "{backend} backend is not available on this CPU");
    drive(backend, state, buf, rounds)
}
