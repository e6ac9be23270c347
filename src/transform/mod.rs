//! Transformation settings
//!
//! - [`TransformerLevel`]: optimization level a pass is registered at
//! - [`TransformStats`]: counters a pass accumulates while rewriting
//! - [`OptimizeOptions`]: session configuration for the pipeline driver
//!
//! # Example
//!
//! ```ignore
//! use peephole_fusion::transform::{OptimizeOptions, TransformerLevel};
//!
//! let options = OptimizeOptions::from_pairs(["level=extended", "backends=cpu"])?;
//! assert_eq!(options.level, TransformerLevel::Level2);
//! ```

pub mod config;
pub mod core;

pub use config::OptimizeOptions;
pub use core::{TransformStats, TransformerLevel};
