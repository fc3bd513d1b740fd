use cfg_aliases::cfg_aliases;

fn main() {
    cfg_aliases! {
        x86_simd: { any(target_arch = "x86", target_arch = "x86_64") },
    }
}
