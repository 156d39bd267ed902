//! Render pipelines.

pub mod basic;
