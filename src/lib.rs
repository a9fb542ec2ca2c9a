//! Habit goal evaluation and progress statistics.
//!
//! [`progress`] evaluates a single habit against its logged values,
//! [`aggregate`] and [`risk`] fold those evaluations into group and
//! portfolio statistics. [`db`] is the Postgres store the CLI reads from.

pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod db;
pub mod entry;
pub mod error;
pub mod models;
pub mod progress;
pub mod report;
pub mod risk;
