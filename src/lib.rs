//! Exact squared Euclidean distance transform (SEDT) for 1D/2D/3D
//! grids, following the separable O(n)-per-axis algorithm of
//! Felzenszwalb & Huttenlocher (2012).
//!
//! [`envelope`] is the 1D lower-envelope sweep every axis pass reduces
//! to. [`cpu`] composes it over rows/columns/planes, serially or with
//! `rayon`. [`gpu`] (behind the `gpu` feature, default-on) computes the
//! same result with data-parallel bounded search instead. [`api`] is
//! the allocating convenience layer most callers want.

pub mod api;
pub mod cpu;
pub mod envelope;
pub mod error;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod shape;

pub use api::sedt_1d;
pub use api::{sedt_2d, sedt_3d};
#[cfg(feature = "gpu")]
pub use api::{sedt_2d_gpu, sedt_3d_gpu};
pub use error::GpuError;
pub use shape::{Shape2, Shape3};
