pub mod units;

pub use units::celsius_to_fahrenheit;
