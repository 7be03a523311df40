//! CPU orchestration of the separable transform.
//!
//! Composes [`crate::envelope::envelope1d`] over independent rows,
//! columns, and (for 3D) planes and axis-0 fibers, with optional
//! `rayon` parallelism across fibers within a pass. Passes themselves
//! are always sequenced: axis 1 must finish (and copy back into the
//! input buffer) before axis 0 starts.

mod separable;

pub use separable::{
    transform_2d_into, transform_3d_into, v_scratch_len_2d, v_scratch_len_3d, z_scratch_len_2d,
    z_scratch_len_3d,
};
