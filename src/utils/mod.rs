// Shared helpers

pub mod encoding;
pub mod io;

/// Round to the nearest integer, halves away from zero for positive input
pub fn irnd(value: f64) -> i64 {
    (value + 0.5) as i64
}
