//! ChaCha stream cipher: state setup, a portable block function and SIMD
//! block functions, stitched together by a driver that picks the fastest
//! backend available at runtime.

#[macro_use]
pub mod soft;
mod state;
mod dynamic;
mod cipher;
#[cfg(x86_simd)]
pub mod x86_ssse3;
#[cfg(x86_simd)]
pub mod x86_avx2;

pub use state::{Layout, State};
pub use dynamic::{apply_keystream_with, encrypt, encrypt_in_place, encrypt_with, Backend};
pub use cipher::{ChaCha, ChaCha12, ChaCha20, ChaCha8};

#[cfg(x86_simd)]
pub use x86_ssse3::Ssse3;
#[cfg(x86_simd)]
pub use x86_avx2::Avx2;

/// Bytes of keystream produced from one counter value.
pub const BLOCK_LEN: usize = 64;
/// State length in 32-bit words.
pub const STATE_WORDS: usize = 16;
/// Round count of ChaCha20.
pub const ROUNDS: usize = 20;

/// # Panics
///
/// Panics if `rounds` is odd; the round function only exists as a sequence
/// of double rounds.
#[inline(always)]
#[track_caller]
pub(crate) fn assert_rounds(rounds: usize) {
    assert!(rounds % 2 == 0, "ChaCha round count must be even, got {rounds}");
}

/// Blocks produced per call by the SSSE3 backend, 0 if this build or CPU
/// cannot run it.
#[inline]
pub fn ssse3_blocks() -> usize {
    Backend::Ssse3.blocks()
}

/// Blocks produced per call by the AVX2 backend, 0 if this build or CPU
/// cannot run it.
#[inline]
pub fn avx2_blocks() -> usize {
    Backend::Avx2.blocks()
}
