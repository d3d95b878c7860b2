pub mod units;

pub use units::{bytes_to_gib, format_bytes};
