//! # Course Shifts
//!
//! Shift groups for courses: cohorts that follow the same course on offset
//! start dates.
//!
//! A course can hold several shift groups, each unique by start date. Every
//! user belongs to at most one shift group per course and moves between
//! them through atomic transfers. New shift groups are created either
//! periodically (autostart) or from planned runs scheduled by course staff.
//!
//! ## Architecture
//!
//! - [`models`]: Domain records, identifiers and the [`models::Clock`]
//! - [`db`]: Repository traits, in-memory and Postgres backends, factory and configuration
//! - [`services`]: Shift rules (creation, transfers, planning, autostart sweeps)
//! - [`http`]: Axum-based REST API (feature `http-server`)

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
