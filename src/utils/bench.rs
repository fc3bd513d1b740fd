/// Lets one bench body run under criterion or under a plain loop for
/// profiling.
#[macro_export]
macro_rules! _impl_bench_trait_for_criterion {
    ($name:ident) => {
        pub trait BenchTrait {
            fn bench<F>(&mut self, name: &str, throughput: usize, f: F) where F: FnMut();
        }

        impl BenchTrait for std::ops::Range<usize> {
            #[inline(always)]
            fn bench<F>(&mut self, _name: &str, _throughput: usize, mut f: F) where F: FnMut() {
                for _ in self {
                    f();
                }
            }
        }

        impl BenchTrait for $name {
            #[inline(always)]
            fn bench<F>(&mut self, name: &str, throughput: usize, mut f: F) where F: FnMut() {
                let mut group = self.benchmark_group("chacha");
                group.throughput(Throughput::Bytes(throughput as u64));
                group.bench_function(name, |b| b.iter(|| {
                    f();
                }));
                group.finish();
            }
        }
    };
}

/// `main` for a bench target. With `--bench` runs the criterion group,
/// otherwise spins `$fn` (or `$baseline` when the only argument is
/// `baseline`) over a 64 KiB buffer for a profiler to attach to.
#[macro_export]
macro_rules! _bench_main {
    ($name:ident, $fn:ident, $baseline:ident$(,)?) => {
        fn main() {
            if std::env::args().any(|arg| arg == "--bench") {
                $name();
                Criterion::default().configure_from_args().final_summary();
                return;
            }
            let mut range = 0..1000000;

            let args = std::env::args();
            if args.len() == 2 && args.last().as_deref() == Some("baseline") {
                $baseline(&mut range, 65536);
            } else {
                $fn(&mut range, 65536);
            }
        }
    };
}
