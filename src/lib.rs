//! Qualitative grading, date display and report-card downloads for the
//! school administration backend.

pub mod client;
pub mod config;
pub mod controller;
pub mod dates;
pub mod error;
pub mod grading;
pub mod models;
pub mod notify;
pub mod report;
pub mod roster;
pub mod sink;
