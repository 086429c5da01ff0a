//! Shared test utilities for the auto-slicer workspace.
//!
//! This crate provides standardised fixtures so crate test suites do not
//! each hand-roll definition documents. It is a dev-dependency only, never
//! published.
//!
//! # Modules
//!
//! - [`definitions`] - [`DefinitionDir`] builder for layered definition documents
//! - [`workspace`] - [`TestWorkspace`] with definitions plus an operator config

pub mod definitions;
pub mod workspace;

pub use definitions::{DefinitionDir, FIXTURE_PRINTER, fixtures_dir};
pub use workspace::TestWorkspace;
