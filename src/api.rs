//! Public entry points: allocating convenience wrappers over the
//! in-place CPU/GPU cores.
//!
//! Each allocating function owns scratch allocation so the delegated-to
//! module stays allocation-free on the hot path; in-place variants are
//! re-exported unchanged from [`crate::cpu`] and [`crate::gpu`] for
//! callers that want to reuse scratch across calls.

use crate::cpu::{
    transform_2d_into, transform_3d_into, v_scratch_len_2d, v_scratch_len_3d, z_scratch_len_2d,
    z_scratch_len_3d,
};
use crate::envelope::envelope1d;
#[cfg(feature = "gpu")]
use crate::error::GpuError;
#[cfg(feature = "gpu")]
use crate::gpu::GpuAccelerator;
use crate::shape::{Shape2, Shape3};

/// Allocating 1D SEDT: `output[q] = min_i (f[i] + (q - i)^2)`.
pub fn sedt_1d(f: &[f32]) -> Vec<f32> {
    let n = f.len();
    let mut output = vec![0.0f32; n];
    let mut v = vec![0i32; n];
    let mut z = vec![0.0f32; n + 1];
    envelope1d(f, &mut output, &mut v, &mut z);
    output
}

/// Allocating 2D SEDT over a row-major `rows x cols` grid.
///
/// `f` is consumed by value since the in-place core overwrites it
/// between axis passes.
pub fn sedt_2d(f: &[f32], rows: usize, cols: usize, threaded: bool) -> Vec<f32> {
    let shape = Shape2::new(rows, cols);
    let mut f = f.to_vec();
    let mut output = vec![0.0f32; shape.len()];
    let mut v = vec![0i32; v_scratch_len_2d(shape)];
    let mut z = vec![0.0f32; z_scratch_len_2d(shape)];
    transform_2d_into(&mut f, &mut output, &mut v, &mut z, shape, threaded);
    output
}

/// Allocating 3D SEDT over a row-major `d0 x d1 x d2` grid.
pub fn sedt_3d(f: &[f32], d0: usize, d1: usize, d2: usize, threaded: bool) -> Vec<f32> {
    let shape = Shape3::new(d0, d1, d2);
    let mut f = f.to_vec();
    let mut output = vec![0.0f32; shape.len()];
    let mut v = vec![0i32; v_scratch_len_3d(shape)];
    let mut z = vec![0.0f32; z_scratch_len_3d(shape)];
    transform_3d_into(&mut f, &mut output, &mut v, &mut z, shape, threaded);
    output
}

/// Allocating GPU 2D SEDT. `f` is a thresholded indicator (`>= 0.5` is
/// foreground), per the GPU path's input contract — see
/// [`crate::gpu`].
///
/// Creates a fresh [`GpuAccelerator`] per call; callers making many
/// calls of the same or smaller size should create one
/// `GpuAccelerator` and call [`GpuAccelerator::transform`] directly.
#[cfg(feature = "gpu")]
pub fn sedt_2d_gpu(f: &[f32], rows: usize, cols: usize) -> Result<Vec<f32>, GpuError> {
    let shape = Shape3::new(1, rows, cols);
    let accel = GpuAccelerator::try_create(shape.len())?;
    accel.transform(f, shape)
}

/// Allocating GPU 3D SEDT. Same input contract as [`sedt_2d_gpu`].
#[cfg(feature = "gpu")]
pub fn sedt_3d_gpu(f: &[f32], d0: usize, d1: usize, d2: usize) -> Result<Vec<f32>, GpuError> {
    let shape = Shape3::new(d0, d1, d2);
    let accel = GpuAccelerator::try_create(shape.len())?;
    accel.transform(f, shape)
}
