//! Common structs for historical loan records shared across crates.

mod record;
mod status;
mod sub_grade;

pub use record::*;
pub use status::*;
pub use sub_grade::*;
