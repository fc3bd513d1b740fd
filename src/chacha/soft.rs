use super::{State, BLOCK_LEN, STATE_WORDS};

/// Blocks produced per call.
pub const BLOCKS: usize = 1;

#[inline(always)]
pub fn quarter_round(state: &mut [u32; STATE_WORDS], a: usize, b: usize, c: usize, d: usize) {
    state[a] = state[a].wrapping_add(state[b]);
    state[d] ^= state[a];
    state[d] = state[d].rotate_left(16);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] ^= state[c];
    state[b] = state[b].rotate_left(12);

    state[a] = state[a].wrapping_add(state[b]);
    state[d] ^= state[a];
    state[d] = state[d].rotate_left(8);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] ^= state[c];
    state[b] = state[b].rotate_left(7);
}

/// One column round followed by one diagonal round.
#[inline(always)]
pub fn double_round(state: &mut [u32; STATE_WORDS]) {
    quarter_round(state, 0, 4, 8, 12);
    quarter_round(state, 1, 5, 9, 13);
    quarter_round(state, 2, 6, 10, 14);
    quarter_round(state, 3, 7, 11, 15);

    quarter_round(state, 0, 5, 10, 15);
    quarter_round(state, 1, 6, 11, 12);
    quarter_round(state, 2, 7, 8, 13);
    quarter_round(state, 3, 4, 9, 14);
}

#[inline(always)]
pub(crate) fn diagonal_rounds(state: &mut [u32; STATE_WORDS], rounds: usize) {
    for _ in 0..rounds / 2 {
        double_round(state);
    }
}

#[inline(always)]
pub(crate) fn add_si512(state: &mut [u32; STATE_WORDS], initial_state: &[u32; STATE_WORDS]) {
    for (word, initial) in state.iter_mut().zip(initial_state) {
        *word = word.wrapping_add(*initial);
    }
}

#[inline(always)]
pub(crate) fn v512_i8_xor(data: &mut [u8; BLOCK_LEN], keystream: &[u8; BLOCK_LEN]) {
    for (byte, key) in data.iter_mut().zip(keystream) {
        *byte ^= key;
    }
}

/// The ChaCha block function: `rounds / 2` double rounds over a copy of
/// `input`, feed-forward addition of `input`, little-endian serialization.
/// Does not touch any counter.
#[inline]
pub fn block(input: &[u32; STATE_WORDS], rounds: usize) -> [u8; BLOCK_LEN] {
    debug_assert_eq!(rounds % 2, 0);

    let mut state = *input;
    diagonal_rounds(&mut state, rounds);
    add_si512(&mut state, input);

    let mut keystream = [0u8; BLOCK_LEN];
    for (chunk, word) in keystream.chunks_exact_mut(4).zip(state.iter()) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    keystream
}

/// Writes the keystream block for the current counter and advances it.
#[inline]
pub fn keystream_block(state: &mut State, keystream: &mut [u8; BLOCK_LEN], rounds: usize) {
    *keystream = block(state.words(), rounds);
    state.advance(1);
}

/// XORs one block of keystream into `data` in place and advances the counter.
#[inline]
pub fn xor_block(state: &mut State, data: &mut [u8; BLOCK_LEN], rounds: usize) {
    let keystream = block(state.words(), rounds);
    v512_i8_xor(data, &keystream);
    state.advance(1);
}

/// `output = input ^ keystream` for one block, then advances the counter.
///
/// # Panics
///
/// Panics if `rounds` is odd.
#[inline]
pub fn scalar_block(state: &mut State, input: &[u8; BLOCK_LEN], output: &mut [u8; BLOCK_LEN], rounds: usize) {
    super::assert_rounds(rounds);
    *output = *input;
    xor_block(state, output, rounds);
}

#[cfg(test)]
pub(crate) struct TestVector {
    pub name: &'static str,
    pub key: &'static str,
    pub nonce: &'static str,
    pub counter: u32,
    pub plaintext: &'static str,
    pub expected: &'static str,
}

// An empty plaintext means the expected bytes are raw keystream.
#[cfg(test)]
pub(crate) const RFC_VECTORS: [TestVector; 8] = [
    TestVector {
        name: "RFC7539 2.6.2",
        key: "808182838485868788898a8b8c8d8e8f909192939495969798999a9b9c9d9e9f",
        nonce: "000000000001020304050607",
        counter: 0,
        plaintext: "",
        expected: "8ad5a08b905f81cc815040274ab29471a833b637e3fd0da508dbb8e2fdd1a646",
    },
    TestVector {
        name: "RFC7539 A.1 #1",
        key: "0000000000000000000000000000000000000000000000000000000000000000",
        nonce: "000000000000000000000000",
        counter: 0,
        plaintext: "",
        expected: "76b8e0ada0f13d90405d6ae55386bd28bdd219b8a08ded1aa836efcc8b770dc7\
                   da41597c5157488d7724e03fb8d84a376a43b8f41518a11cc387b669b2ee6586",
    },
    TestVector {
        name: "RFC7539 A.1 #2",
        key: "0000000000000000000000000000000000000000000000000000000000000000",
        nonce: "000000000000000000000000",
        counter: 1,
        plaintext: "",
        expected: "9f07e7be5551387a98ba977c732d080dcb0f29a048e3656912c6533e32ee7aed\
                   29b721769ce64e43d57133b074d839d531ed1f28510afb45ace10a1f4b794d6f",
    },
    TestVector {
        name: "RFC7539 A.1 #3",
        key: "0000000000000000000000000000000000000000000000000000000000000001",
        nonce: "000000000000000000000000",
        counter: 1,
        plaintext: "",
        expected: "3aeb5224ecf849929b9d828db1ced4dd832025e8018b8160b82284f3c949aa5a\
                   8eca00bbb4a73bdad192b5c42f73f2fd4e273644c8b36125a64addeb006c13a0",
    },
    TestVector {
        name: "RFC7539 A.1 #4",
        key: "00ff000000000000000000000000000000000000000000000000000000000000",
        nonce: "000000000000000000000000",
        counter: 2,
        plaintext: "",
        expected: "72d54dfbf12ec44b362692df94137f328fea8da73990265ec1bbbea1ae9af0ca\
                   13b25aa26cb4a648cb9b9d1be65b2c0924a66c54d545ec1b7374f4872e99f096",
    },
    TestVector {
        name: "RFC7539 A.1 #5",
        key: "0000000000000000000000000000000000000000000000000000000000000000",
        nonce: "000000000000000000000002",
        counter: 0,
        plaintext: "",
        expected: "c2c64d378cd536374ae204b9ef933fcd1a8b2288b3dfa49672ab765b54ee27c7\
                   8a970e0e955c14f3a88e741b97c286f75f8fc299e8148362fa198a39531bed6d",
    },
    TestVector {
        name: "RFC8439 2.3.2",
        key: "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f",
        nonce: "000000090000004a00000000",
        counter: 1,
        plaintext: "",
        expected: "10f1e7e4d13b5915500fdd1fa32071c4c7d1f4c733c068030422aa9ac3d46c4e\
                   d2826446079faa0914c2d705d98b02a2b5129cd1de164eb9cbd083e8a2503c4e",
    },
    TestVector {
        name: "RFC8439 2.4.2",
        key: "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f",
        nonce: "000000000000004a00000000",
        counter: 1,
        plaintext: "4c616469657320616e642047656e746c656d656e206f662074686520636c6173\
                    73206f66202739393a204966204920636f756c64206f6666657220796f75206f\
                    6e6c79206f6e652074697020666f7220746865206675747572652c2073756e73\
                    637265656e20776f756c642062652069742e",
        expected: "6e2e359a2568f98041ba0728dd0d6981e97e7aec1d4360c20a27afccfd9fae0b\
                   f91b65c5524733ab8f593dabcd62b3571639d624e65152ab8f530c359f0861d8\
                   07ca0dbf500d6a6156a38e088a22b65e52bc514d16ccf806818ce91ab7793736\
                   5af90bbf74a35be6b40b8eedf2785e42874d",
    },
];

#[cfg(test)]
pub(crate) fn unhex(s: &str) -> Vec<u8> {
    let digits: Vec<u8> = s.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    digits
        .chunks_exact(2)
        .map(|pair| u8::from_str_radix(core::str::from_utf8(pair).unwrap(), 16).unwrap())
        .collect()
}

/// Runs the RFC 7539 / RFC 8439 vectors through a [`Backend`](super::Backend).
#[cfg(test)]
macro_rules! chacha20_test_case {
    ($backend:expr) => {{
        use $crate::chacha::soft::{unhex, RFC_VECTORS};
        use $crate::chacha::{Backend, State, BLOCK_LEN};
        use $crate::utils::hex_dump;

        let backend: Backend = $backend;
        for vector in RFC_VECTORS.iter() {
            let key: [u8; 32] = unhex(vector.key).try_into().unwrap();
            let nonce: [u8; 12] = unhex(vector.nonce).try_into().unwrap();
            let expected = unhex(vector.expected);
            let mut plaintext = unhex(vector.plaintext);
            plaintext.resize(expected.len(), 0);

            let mut state = State::rfc7539(&key, &nonce, vector.counter);
            let initial = state;
            let mut result = vec![0u8; expected.len()];
            $crate::chacha::encrypt_with(backend, &mut state, &plaintext, &mut result, 20);
            assert_eq!(
                result,
                expected,
                "{} failed on {}\ninit:\n{}\nresult:\n{}expected:\n{}",
                vector.name,
                backend,
                initial,
                hex_dump(&result),
                hex_dump(&expected),
            );
            let blocks = expected.len().div_ceil(BLOCK_LEN) as u64;
            assert_eq!(state.counter(), vector.counter as u64 + blocks, "{} counter", vector.name);

            // decrypting is the same operation
            let mut state = initial;
            $crate::chacha::apply_keystream_with(backend, &mut state, &mut result, 20);
            assert_eq!(result, plaintext, "{} round trip failed on {}", vector.name, backend);

            // keystream vectors again at the backend's native stride, so SIMD
            // lanes other than the scalar tail see known answers
            if vector.plaintext.is_empty() {
                let mut state = initial;
                let mut stream = vec![0u8; backend.blocks() * BLOCK_LEN];
                backend.xor_blocks(&mut state, &mut stream, 20);
                assert_eq!(
                    &stream[..expected.len()],
                    &expected[..],
                    "{} keystream failed on {}\nresult:\n{}",
                    vector.name,
                    backend,
                    hex_dump(&stream),
                );
            }
        }

        // A.1 #1 and #2 are consecutive blocks of the same stream
        if backend.blocks() >= 2 {
            let mut state = State::rfc7539(&[0; 32], &[0; 12], 0);
            let mut stream = vec![0u8; backend.blocks() * BLOCK_LEN];
            backend.xor_blocks(&mut state, &mut stream, 20);
            assert_eq!(&stream[..BLOCK_LEN], &unhex(RFC_VECTORS[1].expected)[..]);
            assert_eq!(&stream[BLOCK_LEN..2 * BLOCK_LEN], &unhex(RFC_VECTORS[2].expected)[..]);
        }
    }};
}
