//! Outlier removal for a single measurement series.
//!
//! A loaded [`data::Dataset`] is wrapped in a [`data::StagedSeries`]; filters
//! produce a pending result that can be reviewed, then committed or
//! discarded before the committed table is written back.

pub mod app;
pub mod color;
pub mod data;
pub mod plan;
pub mod present;
pub mod state;
pub mod ui;
