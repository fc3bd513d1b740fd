use std::sync::OnceLock;

const UNKNOWN: &str = "Unknown CPU";

cfg_if::cfg_if!{
    if #[cfg(target_os = "macos")] {
        /// CPU brand string from sysctlbyname("machdep.cpu.brand_string").
        pub fn cpu_name() -> &'static str {
            static NAME: OnceLock<String> = OnceLock::new();
            NAME.get_or_init(|| {
                let mut buffer = [0u8; 128];
                let mut buffer_len = buffer.len();
                let ret = unsafe {
                    libc::sysctlbyname(
                        b"machdep.cpu.brand_string\0".as_ptr() as *const _,
                        buffer.as_mut_ptr() as *mut _,
                        &mut buffer_len,
                        std::ptr::null_mut(),
                        0,
                    )
                };
                if ret != 0 || buffer_len == 0 {
                    return UNKNOWN.to_string();
                }
                let name = &buffer[..buffer_len.min(buffer.len())];
                String::from_utf8_lossy(name).trim_end_matches('\0').to_string()
            }).as_str()
        }
    } else if #[cfg(any(target_arch = "x86_64", target_arch = "x86"))] {
        /// CPU brand string from CPUID leaves 0x80000002..=0x80000004.
        pub fn cpu_name() -> &'static str {
            static NAME: OnceLock<String> = OnceLock::new();
            NAME.get_or_init(|| {
                #[cfg(target_arch = "x86_64")]
                use std::arch::x86_64::__cpuid;
                #[cfg(target_arch = "x86")]
                use std::arch::x86::__cpuid;

                let mut brand = [0u8; 48];
                for (leaf, chunk) in (0x80000002u32..).zip(brand.chunks_exact_mut(16)) {
                    let regs = unsafe { __cpuid(leaf) };
                    for (dst, reg) in chunk.chunks_exact_mut(4).zip([regs.eax, regs.ebx, regs.ecx, regs.edx]) {
                        dst.copy_from_slice(&reg.to_le_bytes());
                    }
                }
                let name = String::from_utf8_lossy(&brand)
                    .trim_matches(|c: char| c.is_whitespace() || c == '\0')
                    .to_string();
                if name.is_empty() { UNKNOWN.to_string() } else { name }
            }).as_str()
        }
    } else if #[cfg(target_os = "linux")] {
        /// CPU name from /proc/device-tree/model or /proc/cpuinfo.
        pub fn cpu_name() -> &'static str {
            static NAME: OnceLock<String> = OnceLock::new();
            NAME.get_or_init(|| {
                if let Ok(model) = std::fs::read_to_string("/proc/device-tree/model") {
                    return model.trim_end_matches('\0').to_string();
                }
                let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").unwrap_or_default();
                cpuinfo
                    .lines()
                    .filter(|line| line.starts_with("model name") || line.starts_with("Hardware"))
                    .find_map(|line| line.split_once(':'))
                    .map(|(_, name)| name.trim_matches(|c: char| c.is_whitespace() || c == '\0').to_string())
                    .unwrap_or_else(|| UNKNOWN.to_string())
            }).as_str()
        }
    } else {
        pub fn cpu_name() -> &'static str {
            UNKNOWN
        }
    }
}
