//! adaptdx-core — Adaptive clinical-competence assessment engine.
//!
//! This crate defines the data model, differential scoring, IRT ability
//! estimation, adaptive case selection, and the per-examinee session state
//! machine that the rest of the adaptdx system builds on.

pub mod competence;
pub mod error;
pub mod irt;
pub mod model;
pub mod parser;
pub mod scoring;
pub mod session;
