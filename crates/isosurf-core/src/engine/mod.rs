//! # Engine Module
//!
//! This module implements the surface extraction engine: the Marching Cubes algorithm
//! together with the configuration, progress reporting and error types shared by the
//! workflows built on top of it.
//!
//! ## Architecture
//!
//! - **Marching Cubes** ([`marching_cubes`]) - Cube classification, edge interpolation,
//!   gradient normals and triangle emission, driven by the static case tables
//! - **Configuration** ([`config`]) - Isovalue, phase selection and upsampling settings
//! - **Progress Monitoring** ([`progress`]) - Progress events and cooperative cancellation
//! - **Error Handling** ([`error`]) - Engine-specific error types and error propagation
//!
//! ## Key Capabilities
//!
//! - **Parallel slice processing** with a deterministic triangle order
//! - **Outward-facing normals** for both lobes of signed fields
//! - **Read-only grid access**, so several extractions may share one grid

pub mod config;
pub mod error;
pub mod marching_cubes;
pub mod progress;
