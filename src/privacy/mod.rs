pub mod suppression;

pub use suppression::{enforce_min_cell_count, SuppressionStats};
