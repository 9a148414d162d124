//! Whole-engine benchmarks.

mod quad;

pub use quad::bench_quad;
