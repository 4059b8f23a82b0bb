//! Unit conversion utilities

use crate::device::common::constants::{FAHRENHEIT_OFFSET, FAHRENHEIT_SCALE};

/// Convert Celsius to Fahrenheit, rounded to the nearest degree.
///
/// One-way: applying it twice does not return to the input.
#[inline]
pub fn celsius_to_fahrenheit(celsius: i64) -> i64 {
    (celsius as f64 * FAHRENHEIT_SCALE + FAHRENHEIT_OFFSET).round() as i64
}
