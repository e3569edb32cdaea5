pub mod enums;
pub mod dose_log;
pub mod treatment;

pub use enums::*;
pub use dose_log::*;
pub use treatment::*;

/// Storage format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
