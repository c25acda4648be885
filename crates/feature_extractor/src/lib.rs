//! Feature extractor crate for the credit default model.
//!
//! This crate turns loan records (training) and application forms (serving)
//! into fixed-order numeric feature vectors. Both paths share one versioned
//! [`FeatureSchema`] and one [`CategoryUniverse`], so the column order the
//! scaler was fitted with is the order the assembler produces.

mod assembler;
mod deriver;
mod encoding;
mod error;
mod form;
mod schema;
mod universe;

pub use assembler::*;
pub use deriver::*;
pub use encoding::*;
pub use error::*;
pub use form::*;
pub use schema::*;
pub use universe::*;
