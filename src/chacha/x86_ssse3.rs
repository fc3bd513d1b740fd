//! Four blocks per call in 128-bit registers. Register `v[i]` holds word `i`
//! of four consecutive blocks, one block per 32-bit lane, so every quarter
//! round is plain lane-wise arithmetic and the diagonal round needs no
//! shuffles. The lanes are transposed back into block order at the end.

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;
use unsafe_target_feature::unsafe_target_feature;

use super::{State, BLOCK_LEN, STATE_WORDS};

/// Capability token: exists only when the CPU supports SSSE3.
#[derive(Clone, Copy, Debug)]
pub struct Ssse3 {
    _private: (),
}

impl Ssse3 {
    pub const BLOCKS: usize = 4;
    pub const BYTES: usize = Self::BLOCKS * BLOCK_LEN;

    #[inline]
    pub fn detect() -> Option<Self> {
        if crate::is_hw_feature_available!(
            "x86" => ("ssse3"),
            "x86_64" => ("ssse3")
        ) {
            Some(Self { _private: () })
        } else {
            None
        }
    }
}

#[unsafe_target_feature("ssse3")]
impl Ssse3 {
    /// XORs four blocks of keystream into `blocks` and advances the counter
    /// by four.
    #[inline]
    pub fn xor_blocks(&self, state: &mut State, blocks: &mut [u8; 256], rounds: usize) {
        debug_assert_eq!(rounds % 2, 0);

        unsafe {
            let initial = load_vertical(state);
            let res = rounds_vertical(&initial, rounds);

            #[crate::loop_unroll(block, 0, 4)]
            fn loop_unroll() {
                let ptr = blocks.as_mut_ptr().add(block * BLOCK_LEN);
                #[crate::loop_unroll(row, 0, 4)]
                fn loop_unroll() {
                    let p = ptr.add(row * 16) as *mut __m128i;
                    let data = _mm_loadu_si128(p as *const __m128i);
                    _mm_storeu_si128(p, _mm_xor_si128(data, res[block][row]));
                }
            }
        }

        state.advance(Self::BLOCKS as u64);
    }
}

/// Broadcasts rows 0-2 and spreads the four upcoming row-3 values across
/// lanes.
#[inline(always)]
unsafe fn load_vertical(state: &State) -> [__m128i; STATE_WORDS] {
    let words = state.words();
    let mut v = [_mm_setzero_si128(); STATE_WORDS];
    for i in 0..12 {
        v[i] = _mm_set1_epi32(words[i] as i32);
    }

    let rows = [state.row3_at(0), state.row3_at(1), state.row3_at(2), state.row3_at(3)];
    for i in 0..4 {
        v[12 + i] = _mm_setr_epi32(rows[0][i] as i32, rows[1][i] as i32, rows[2][i] as i32, rows[3][i] as i32);
    }
    v
}

#[inline(always)]
unsafe fn rotl16(v: __m128i) -> __m128i {
    _mm_shuffle_epi8(v, _mm_set_epi8(13, 12, 15, 14, 9, 8, 11, 10, 5, 4, 7, 6, 1, 0, 3, 2))
}

#[inline(always)]
unsafe fn rotl8(v: __m128i) -> __m128i {
    _mm_shuffle_epi8(v, _mm_set_epi8(14, 13, 12, 15, 10, 9, 8, 11, 6, 5, 4, 7, 2, 1, 0, 3))
}

macro_rules! rotate_left {
    ($v:expr, $r:literal) => {
        $v = _mm_xor_si128(_mm_slli_epi32($v, $r), _mm_srli_epi32($v, 32 - $r));
    };
}

#[inline(always)]
unsafe fn quarter_round(v: &mut [__m128i; STATE_WORDS], a: usize, b: usize, c: usize, d: usize) {
    v[a] = _mm_add_epi32(v[a], v[b]);
    v[d] = rotl16(_mm_xor_si128(v[d], v[a]));

    v[c] = _mm_add_epi32(v[c], v[d]);
    v[b] = _mm_xor_si128(v[b], v[c]);
    rotate_left!(v[b], 12);

    v[a] = _mm_add_epi32(v[a], v[b]);
    v[d] = rotl8(_mm_xor_si128(v[d], v[a]));

    v[c] = _mm_add_epi32(v[c], v[d]);
    v[b] = _mm_xor_si128(v[b], v[c]);
    rotate_left!(v[b], 7);
}

#[inline(always)]
unsafe fn double_round(v: &mut [__m128i; STATE_WORDS]) {
    quarter_round(v, 0, 4, 8, 12);
    quarter_round(v, 1, 5, 9, 13);
    quarter_round(v, 2, 6, 10, 14);
    quarter_round(v, 3, 7, 11, 15);
    quarter_round(v, 0, 5, 10, 15);
    quarter_round(v, 1, 6, 11, 12);
    quarter_round(v, 2, 7, 8, 13);
    quarter_round(v, 3, 4, 9, 14);
}

#[inline(always)]
unsafe fn rounds_vertical(v: &[__m128i; STATE_WORDS], rounds: usize) -> [[__m128i; 4]; 4] {
    let mut res = *v;

    for _ in 0..rounds / 2 {
        double_round(&mut res);
    }

    #[crate::loop_unroll(i, 0, 16)]
    fn loop_unroll() {
        res[i] = _mm_add_epi32(res[i], v[i]);
    }
    interleave4x4(res)
}

/// Transposes word-major lanes into `[block][row]` order.
#[inline(always)]
unsafe fn interleave4x4(v: [__m128i; STATE_WORDS]) -> [[__m128i; 4]; 4] {
    let mut res = [[v[0]; 4]; 4];
    #[crate::loop_unroll(i, 0, 4)]
    fn loop_unroll() {
        let a = v[i * 4];
        let b = v[i * 4 + 1];
        let c = v[i * 4 + 2];
        let d = v[i * 4 + 3];
        let tmp0 = _mm_unpacklo_epi32(a, b);
        let tmp1 = _mm_unpackhi_epi32(a, b);
        let tmp2 = _mm_unpacklo_epi32(c, d);
        let tmp3 = _mm_unpackhi_epi32(c, d);

        res[0][i] = _mm_unpacklo_epi64(tmp0, tmp2);
        res[1][i] = _mm_unpackhi_epi64(tmp0, tmp2);
        res[2][i] = _mm_unpacklo_epi64(tmp1, tmp3);
        res[3][i] = _mm_unpackhi_epi64(tmp1, tmp3);
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chacha::{soft, Backend, Layout};

    #[test]
    fn test_chacha20() {
        if crate::is_hw_feature_detected!("ssse3") {
            chacha20_test_case!(Backend::Ssse3);
        }
    }

    #[test]
    fn test_matches_soft_across_counter_wrap() {
        let Some(simd) = Ssse3::detect() else { return };

        for layout in [Layout::Rfc7539, Layout::Extended] {
            let key = [0x3c; 32];
            let mut state = match layout {
                Layout::Rfc7539 => State::rfc7539(&key, &[7; 12], 0),
                Layout::Extended => State::extended_256(&key, 0x1122334455667788),
            };
            // the wrap lands between lanes 1 and 2
            state.set_counter(u32::MAX as u64 - 1);
            let mut expected_state = state;

            let mut data = [0u8; 256];
            simd.xor_blocks(&mut state, &mut data, 20);

            let mut expected = [0u8; 256];
            for chunk in expected.chunks_exact_mut(BLOCK_LEN) {
                soft::xor_block(&mut expected_state, chunk.try_into().unwrap(), 20);
            }
            assert_eq!(data, expected, "{layout:?}");
            assert_eq!(state, expected_state);
        }
    }
}
