//! # lib-types
//!
//! Core type definitions for the Axion engine binding workspace.
//!
//! This crate provides the value types shared between the FFI crate and
//! host applications:
//! - Task status as reported by the engine scheduler
//! - Device descriptions produced by toolkit discovery
//! - Screen-space geometry exchanged with custom recognizers and actions

pub mod device;
pub mod geometry;
pub mod task;

pub use device::*;
pub use geometry::*;
pub use task::*;
