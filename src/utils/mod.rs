pub mod labels;
pub mod timestamps;

pub use timestamps::{parse_timestamp, parse_unix_seconds};
