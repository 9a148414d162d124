//! Building block benchmarks.

mod envelope;
mod euclidean;
mod scheduler;

pub use envelope::bench_envelope;
pub use euclidean::bench_euclidean;
pub use scheduler::bench_scheduler;
