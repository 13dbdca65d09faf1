//! Rating trends, exam sessions and scoring for AVALIA+.
//!
//! This crate defines the data model of the AVALIA+ school dashboard, the
//! behavioural rating/trend model, the timed exam state machine and its
//! clock, plus the TOML data source and report types the front ends share.

pub mod bank;
pub mod clock;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod exam;
pub mod i18n;
pub mod identity;
pub mod model;
pub mod parser;
pub mod report;
pub mod statistics;

pub use error::{CoreError, CoreResult};
