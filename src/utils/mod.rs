mod cpu_name;
mod bench;

pub use cpu_name::cpu_name;

/// detect hardware features every time
#[macro_export]
macro_rules! is_hw_feature_detected {
    ($($feat:tt),+$(,)?) => {
        {
            if cfg!(all($(target_feature = $feat),+)) {
                true
            } else {
                #[allow(unused_mut)]
                let mut available = cfg!(any(target_arch = "x86", target_arch = "x86_64"));
                $(
                    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
                    if !is_x86_feature_detected!($feat) {
                        available = false;
                    }
                )+
                available
            }
        }
    };
}

/// detect hardware features once per call site and cache the result
#[macro_export]
macro_rules! is_hw_feature_available {
    ($($arch:tt => ($($arch_feat:tt),+)),+$(,)?) => {
        {
            let mut available = false;
            $(
                if cfg!(target_arch = $arch) && cfg!(all($(target_feature = $arch_feat),+)) {
                    available = true;
                }
            )+
            if available {
                true
            } else {
                use core::sync::atomic::{AtomicU8, Ordering};
                const UNKNOWN: u8 = 0;
                const ABSENT: u8 = 1;
                const PRESENT: u8 = 2;
                static FEATURE: AtomicU8 = AtomicU8::new(UNKNOWN);

                match FEATURE.load(Ordering::Relaxed) {
                    PRESENT => true,
                    ABSENT => false,
                    _ => {
                        #[allow(unused_mut)]
                        let mut available = false;
                        $(
                            #[cfg(target_arch = $arch)]
                            {
                                available = true;
                                $(
                                    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
                                    if !is_x86_feature_detected!($arch_feat) {
                                        available = false;
                                    }
                                )+
                            }
                        )+
                        FEATURE.store(if available { PRESENT } else { ABSENT }, Ordering::Relaxed);
                        available
                    }
                }
            }
        }
    };
}

/// # Safety
///
/// `slice` must hold at least `N` elements.
#[inline(always)]
pub(crate) const unsafe fn slice_to_array<T, const N: usize>(slice: &[T]) -> &[T; N] {
    &*(slice.as_ptr() as *const [T; N])
}

/// # Safety
///
/// `slice` must hold at least `index + N` elements.
#[inline(always)]
pub(crate) unsafe fn slice_to_array_at_mut<T, const N: usize>(slice: &mut [T], index: usize) -> &mut [T; N] {
    &mut *(slice.as_mut_ptr().add(index) as *mut [T; N])
}

/// Converts a size in bytes to a human-readable string. For benchmarking
pub fn human_readable_size(size: usize) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut cal_size = size;
    let mut unit = 0;
    while cal_size >= 1024 && cal_size % 1024 == 0 && unit + 1 < UNITS.len() {
        cal_size >>= 10;
        unit += 1;
    }
    format!("{} {}", cal_size, UNITS[unit])
}

/// Hex dump with a decimal offset column, 16 bytes per line. Every line,
/// including the last, ends with a newline.
pub fn hex_dump(data: &[u8]) -> String {
    use core::fmt::Write;

    let mut out = String::with_capacity(data.len() * 3 + data.len() / 16 * 5 + 5);
    for (line, chunk) in data.chunks(16).enumerate() {
        let _ = write!(out, "{:03} ", line * 16);
        for (i, byte) in chunk.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{byte:02x}");
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_readable_size() {
        assert_eq!(human_readable_size(64), "64 B");
        assert_eq!(human_readable_size(1024), "1 KiB");
        assert_eq!(human_readable_size(65536), "64 KiB");
        assert_eq!(human_readable_size(12 * 1024 * 1024), "12 MiB");
        assert_eq!(human_readable_size(1500), "1500 B");
    }

    #[test]
    fn test_hex_dump() {
        assert_eq!(hex_dump(&[]), "");
        let data: Vec<u8> = (0..20).collect();
        assert_eq!(
            hex_dump(&data),
            "000 00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f\n016 10 11 12 13\n"
        );
    }

    #[test]
    fn test_feature_detection_is_stable() {
        let first = crate::is_hw_feature_available!("x86" => ("ssse3"), "x86_64" => ("ssse3"));
        let second = crate::is_hw_feature_available!("x86" => ("ssse3"), "x86_64" => ("ssse3"));
        assert_eq!(first, second);
        assert_eq!(first, crate::is_hw_feature_detected!("ssse3"));
    }

    #[test]
    fn test_cpu_name() {
        assert!(!cpu_name().is_empty());
        assert_eq!(cpu_name().as_ptr(), cpu_name().as_ptr());
    }
}
