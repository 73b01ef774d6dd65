//! Helpers shared by the filters: the sample ring buffer and the weight
//! math behind the smoothing filters.

/// Convergence weights, clamping and the prediction gain curve
pub mod math;
/// Fixed-capacity buffer of recent samples
pub mod ring_buffer;
