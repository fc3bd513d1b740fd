use criterion::*;
use chacha_stream::utils::{cpu_name, human_readable_size};
use chacha_stream::{Backend, State};
use chacha_stream::{_impl_bench_trait_for_criterion, _bench_main};

_impl_bench_trait_for_criterion!(Criterion);

const SIZES: [usize; 5] = [64, 256, 1024, 8192, 65536];

#[inline(always)]
fn bench_chacha20_backend(c: &mut impl BenchTrait, backend: Backend, size: usize) {
    let mut state = State::rfc7539(&[0u8; 32], &[0u8; 12], 0);
    let mut buf = vec![0u8; size];

    let test_name = format!("{} chacha20({}) {}", cpu_name(), backend, human_readable_size(size));
    c.bench(&test_name, size, #[inline(always)] || {
        // keep the counter in range so every iteration does the same work
        state.set_counter(0);
        chacha_stream::chacha::apply_keystream_with(backend, &mut state, &mut buf, 20);
        let _ = std::hint::black_box(&buf);
    });
}

#[inline(always)]
fn bench_chacha20_encrypt(c: &mut impl BenchTrait, size: usize) {
    bench_chacha20_backend(c, Backend::detect(), size);
}

fn bench_chacha20_encrypt_ring(c: &mut impl BenchTrait, size: usize) {
    use ring::aead;
    use ring::aead::Aad;
    use ring::aead::LessSafeKey;
    use ring::aead::Nonce;

    let key = [0u8; 32];
    let nonce = [0u8; 12];
    let cipher = match aead::UnboundKey::new(&aead::CHACHA20_POLY1305, &key) {
        Ok(key) => LessSafeKey::new(key),
        Err(_) => return,
    };
    let mut buf = vec![0u8; size];

    // ring only exposes ChaCha20 behind Poly1305
    let test_name = format!("{} chacha20-poly1305(ring) {}", cpu_name(), human_readable_size(size));
    c.bench(&test_name, size, #[inline(always)] || {
        let nonce = Nonce::assume_unique_for_key(nonce);
        let tag = cipher.seal_in_place_separate_tag(nonce, Aad::empty(), &mut buf);
        let _ = std::hint::black_box(tag);
    });
}

fn bench_chacha20(c: &mut Criterion) {
    for size in SIZES {
        for backend in Backend::ALL.into_iter().filter(|b| b.is_available()) {
            bench_chacha20_backend(c, backend, size);
        }
        bench_chacha20_encrypt_ring(c, size);
    }
}

criterion_group!(benches, bench_chacha20);
_bench_main!(
    benches,
    bench_chacha20_encrypt,
    bench_chacha20_encrypt_ring,
);
