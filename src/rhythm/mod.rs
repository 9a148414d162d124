// Purpose - rhythmic trigger filtering

pub mod euclidean;

pub use euclidean::{euclidean_filter, euclidean_pattern, EuclideanState, MAX_EUCLIDEAN_LENGTH};
