#![allow(dead_code)]

pub mod chacha;
pub mod utils;

pub use chacha_stream_macros::*;

pub use chacha::{encrypt, encrypt_in_place, Backend, ChaCha, ChaCha12, ChaCha20, ChaCha8, Layout, State};

/// A utility function for creating masks to use with Intel shuffle and
/// permute intrinsics.
#[inline(always)]
#[allow(non_snake_case)]
#[cfg(x86_simd)]
pub const fn _MM_SHUFFLE(z: u32, y: u32, x: u32, w: u32) -> i32 {
    ((z << 6) | (y << 4) | (x << 2) | w) as i32
}
