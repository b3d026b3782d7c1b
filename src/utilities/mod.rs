//!Core utilities

#[cfg(test)]
#[macro_use]
pub mod test_helpers;

pub mod math;
pub mod color;
pub mod codable;
