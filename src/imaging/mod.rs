//! Image processing, pure Rust and statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::into_dimensions` (bounds only) |
//! | **Scale** | subsample (`Nearest`) + exact resize (configurable filter) |
//! | **Encode** | JPEG at the requested quality, PNG for alpha sources |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{calculate_sample_size, calculate_target_size};
pub use params::{Filter, OutputFormat, Quality, ScaleParams};
pub use rust_backend::{RustBackend, is_supported_input, supported_input_extensions};
