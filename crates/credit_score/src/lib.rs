//! Credit default scorecard
//!
//! Trains a feed-forward default classifier on historical loan records and
//! turns its probability for a new application into a decision, a 300–850
//! credit score and a risk category.

pub mod commands;
pub mod context;
pub mod form_input;
pub mod render;
pub mod risk;
