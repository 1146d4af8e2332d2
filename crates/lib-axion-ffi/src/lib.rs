//! # lib-axion-ffi
//!
//! Safe Rust bindings for the Axion device-automation engine.
//!
//! The engine is a vendor-shipped shared library reached through an
//! opaque-handle C ABI. This crate makes its objects safe to own, share,
//! and dispose from Rust:
//!
//! - Dynamic symbol resolution with `libloading`
//! - Owned handles with idempotent release and fail-fast staleness checks
//! - Host-implemented recognizers and actions installed into engine
//!   callback slots, with panic isolation at the ABI boundary
//! - Posted tasks tracked as pollable, awaitable jobs
//! - Lazy cursors over engine-owned index-addressed lists
//!
//! # Safety
//!
//! The engine binary is trusted to honor its documented contract, but it
//! is still foreign code. Every argument that crosses the boundary is
//! validated host-side first, engine strings are copied the moment they
//! are read, and nothing ever unwinds across the ABI.

pub mod controller;
pub mod error;
pub mod ffi;
pub mod instance;
pub mod job;
pub mod list;
pub mod loader;
pub mod registry;
pub mod resource;
pub mod toolkit;
pub mod utility;

mod handle;

#[cfg(test)]
pub(crate) mod testkit;

pub use controller::Controller;
pub use error::{AxError, AxResult};
pub use instance::{DisposeOptions, Instance, InstanceOptions};
pub use job::Job;
pub use list::ListView;
pub use loader::{EngineLibrary, LibraryFormat};
pub use registry::{Analysis, CustomAction, CustomRecognizer, CustomTask, TaskKind};
pub use resource::Resource;
pub use toolkit::Toolkit;
pub use utility::Utility;
