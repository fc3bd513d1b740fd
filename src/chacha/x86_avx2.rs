//! Two blocks per call in 256-bit registers. Each of the four registers holds
//! one state row: the low 128 bits belong to the first block, the high 128
//! bits to the second. A double round is a column round, a per-lane dword
//! rotation of rows 1-3 that lines the diagonals up as columns, a second
//! column round, and the inverse rotation.

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;
use unsafe_target_feature::unsafe_target_feature;

use super::{State, BLOCK_LEN};
use crate::_MM_SHUFFLE;

/// Capability token: exists only when the CPU supports AVX2.
#[derive(Clone, Copy, Debug)]
pub struct Avx2 {
    _private: (),
}

impl Avx2 {
    pub const BLOCKS: usize = 2;
    pub const BYTES: usize = Self::BLOCKS * BLOCK_LEN;

    #[inline]
    pub fn detect() -> Option<Self> {
        if crate::is_hw_feature_available!(
            "x86" => ("avx2"),
            "x86_64" => ("avx2")
        ) {
            Some(Self { _private: () })
        } else {
            None
        }
    }
}

#[unsafe_target_feature("avx2")]
impl Avx2 {
    /// XORs two blocks of keystream into `blocks` and advances the counter
    /// by two.
    #[inline]
    pub fn xor_blocks(&self, state: &mut State, blocks: &mut [u8; 128], rounds: usize) {
        debug_assert_eq!(rounds % 2, 0);

        unsafe {
            let words = state.words();
            let initial = [
                broadcast_row(&words[0..4]),
                broadcast_row(&words[4..8]),
                broadcast_row(&words[8..12]),
                rows(&state.row3_at(0), &state.row3_at(1)),
            ];

            let [mut a, mut b, mut c, mut d] = initial;
            for _ in 0..rounds / 2 {
                double_round(&mut a, &mut b, &mut c, &mut d);
            }
            a = _mm256_add_epi32(a, initial[0]);
            b = _mm256_add_epi32(b, initial[1]);
            c = _mm256_add_epi32(c, initial[2]);
            d = _mm256_add_epi32(d, initial[3]);

            // [block 0 rows 0-1, block 0 rows 2-3, block 1 rows 0-1, block 1 rows 2-3]
            let keystream = [
                _mm256_permute2x128_si256(a, b, 0x20),
                _mm256_permute2x128_si256(c, d, 0x20),
                _mm256_permute2x128_si256(a, b, 0x31),
                _mm256_permute2x128_si256(c, d, 0x31),
            ];

            #[crate::loop_unroll(i, 0, 4)]
            fn loop_unroll() {
                let p = blocks.as_mut_ptr().add(i * 32) as *mut __m256i;
                let data = _mm256_loadu_si256(p as *const __m256i);
                _mm256_storeu_si256(p, _mm256_xor_si256(data, keystream[i]));
            }
        }

        state.advance(Self::BLOCKS as u64);
    }
}

#[inline(always)]
unsafe fn rows(lo: &[u32; 4], hi: &[u32; 4]) -> __m256i {
    _mm256_setr_epi32(
        lo[0] as i32, lo[1] as i32, lo[2] as i32, lo[3] as i32,
        hi[0] as i32, hi[1] as i32, hi[2] as i32, hi[3] as i32,
    )
}

#[inline(always)]
unsafe fn broadcast_row(row: &[u32]) -> __m256i {
    let row = [row[0], row[1], row[2], row[3]];
    rows(&row, &row)
}

#[inline(always)]
unsafe fn rotl16(v: __m256i) -> __m256i {
    _mm256_shuffle_epi8(
        v,
        _mm256_set_epi8(
            13, 12, 15, 14, 9, 8, 11, 10, 5, 4, 7, 6, 1, 0, 3, 2,
            13, 12, 15, 14, 9, 8, 11, 10, 5, 4, 7, 6, 1, 0, 3, 2,
        ),
    )
}

#[inline(always)]
unsafe fn rotl8(v: __m256i) -> __m256i {
    _mm256_shuffle_epi8(
        v,
        _mm256_set_epi8(
            14, 13, 12, 15, 10, 9, 8, 11, 6, 5, 4, 7, 2, 1, 0, 3,
            14, 13, 12, 15, 10, 9, 8, 11, 6, 5, 4, 7, 2, 1, 0, 3,
        ),
    )
}

macro_rules! rotate_left {
    ($v:expr, $r:literal) => {
        $v = _mm256_xor_si256(_mm256_slli_epi32($v, $r), _mm256_srli_epi32($v, 32 - $r));
    };
}

/// Four quarter rounds at once, one per 32-bit column of each block.
#[inline(always)]
unsafe fn add_xor_rot(a: &mut __m256i, b: &mut __m256i, c: &mut __m256i, d: &mut __m256i) {
    *a = _mm256_add_epi32(*a, *b);
    *d = rotl16(_mm256_xor_si256(*d, *a));

    *c = _mm256_add_epi32(*c, *d);
    *b = _mm256_xor_si256(*b, *c);
    rotate_left!(*b, 12);

    *a = _mm256_add_epi32(*a, *b);
    *d = rotl8(_mm256_xor_si256(*d, *a));

    *c = _mm256_add_epi32(*c, *d);
    *b = _mm256_xor_si256(*b, *c);
    rotate_left!(*b, 7);
}

#[inline(always)]
unsafe fn rows_to_cols(b: &mut __m256i, c: &mut __m256i, d: &mut __m256i) {
    *b = _mm256_shuffle_epi32(*b, _MM_SHUFFLE(0, 3, 2, 1));
    *c = _mm256_shuffle_epi32(*c, _MM_SHUFFLE(1, 0, 3, 2));
    *d = _mm256_shuffle_epi32(*d, _MM_SHUFFLE(2, 1, 0, 3));
}

#[inline(always)]
unsafe fn cols_to_rows(b: &mut __m256i, c: &mut __m256i, d: &mut __m256i) {
    *b = _mm256_shuffle_epi32(*b, _MM_SHUFFLE(2, 1, 0, 3));
    *c = _mm256_shuffle_epi32(*c, _MM_SHUFFLE(1, 0, 3, 2));
    *d = _mm256_shuffle_epi32(*d, _MM_SHUFFLE(0, 3, 2, 1));
}

#[inline(always)]
unsafe fn double_round(a: &mut __m256i, b: &mut __m256i, c: &mut __m256i, d: &mut __m256i) {
    add_xor_rot(a, b, c, d);
    rows_to_cols(b, c, d);
    add_xor_rot(a, b, c, d);
    cols_to_rows(b, c, d);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chacha::{soft, Backend};

    #[test]
    fn test_chacha20() {
        if crate::is_hw_feature_detected!("avx2") {
            chacha20_test_case!(Backend::Avx2);
        }
    }

    #[test]
    fn test_matches_soft_across_counter_wrap() {
        let Some(simd) = Avx2::detect() else { return };

        let key = [0xc3; 32];
        let states = [
            State::rfc7539(&key, &[9; 12], u32::MAX),
            {
                let mut state = State::extended_256(&key, 0xfeedfacecafebeef);
                state.set_counter(u32::MAX as u64);
                state
            },
        ];

        for mut state in states {
            let mut expected_state = state;

            let mut data: [u8; 128] = core::array::from_fn(|i| i as u8);
            let mut expected = data;
            simd.xor_blocks(&mut state, &mut data, 20);
            for chunk in expected.chunks_exact_mut(BLOCK_LEN) {
                soft::xor_block(&mut expected_state, chunk.try_into().unwrap(), 20);
            }

            assert_eq!(data, expected, "{:?}", state.layout());
            assert_eq!(state, expected_state);
        }
    }

    #[test]
    fn test_reduced_rounds() {
        let Some(simd) = Avx2::detect() else { return };

        for rounds in [0, 8, 12] {
            let mut state = State::rfc7539(&[1; 32], &[2; 12], 3);
            let mut expected_state = state;
            let mut data = [0u8; 128];
            simd.xor_blocks(&mut state, &mut data, rounds);

            let mut expected = [0u8; 128];
            for chunk in expected.chunks_exact_mut(BLOCK_LEN) {
                soft::xor_block(&mut expected_state, chunk.try_into().unwrap(), rounds);
            }
            assert_eq!(data, expected, "rounds = {rounds}");
        }
    }
}
