//! Row/column/plane pass orchestration for 2D and 3D grids.
//!
//! Row-major storage makes the axis-1 fiber of a 2D grid contiguous (a
//! grid row) but the axis-0 fiber strided (a grid column). Contiguous
//! fibers are sliced directly out of the caller-supplied `v`/`z`
//! scratch and handed to `envelope1d` with no extra allocation. Strided
//! fibers are gathered into small per-fiber buffers first, since
//! `envelope1d` only ever reads contiguous slices.

use rayon::prelude::*;

use crate::envelope::envelope1d;
use crate::shape::{Shape2, Shape3};

/// Minimum length of the `v` scratch buffer for [`transform_2d_into`].
pub fn v_scratch_len_2d(shape: Shape2) -> usize {
    shape.len()
}

/// Minimum length of the `z` scratch buffer for [`transform_2d_into`].
///
/// Only the contiguous row pass consumes the caller's `v`/`z`; the
/// strided column pass gathers its own. `rows` fibers of length `cols`
/// need `rows * (cols + 1)` breakpoints.
pub fn z_scratch_len_2d(shape: Shape2) -> usize {
    shape.rows * (shape.cols + 1)
}

/// Minimum length of the `v` scratch buffer for [`transform_3d_into`].
pub fn v_scratch_len_3d(shape: Shape3) -> usize {
    shape.len()
}

/// Minimum length of the `z` scratch buffer for [`transform_3d_into`].
///
/// Only the plane pass's row sub-pass (per the `d0` planes) consumes
/// the caller's `v`/`z`; `d0` planes of `d1` contiguous fibers of
/// length `d2` need `d0 * d1 * (d2 + 1)`.
pub fn z_scratch_len_3d(shape: Shape3) -> usize {
    shape.d0 * shape.d1 * (shape.d2 + 1)
}

/// Run `envelope1d` over every contiguous row of a row-major 2D grid.
fn row_pass(f: &[f32], output: &mut [f32], v: &mut [i32], z: &mut [f32], shape: Shape2, threaded: bool) {
    let cols = shape.cols;
    let z_stride = cols + 1;
    tracing::trace!(rows = shape.rows, cols, threaded, "cpu row pass");

    if threaded {
        f.par_chunks(cols)
            .zip(output.par_chunks_mut(cols))
            .zip(v.par_chunks_mut(cols))
            .zip(z.par_chunks_mut(z_stride))
            .for_each(|(((f_row, out_row), v_row), z_row)| {
                envelope1d(f_row, out_row, v_row, z_row);
            });
    } else {
        for row in 0..shape.rows {
            let f_row = &f[row * cols..(row + 1) * cols];
            let out_row = &mut output[row * cols..(row + 1) * cols];
            let v_row = &mut v[row * cols..(row + 1) * cols];
            let z_row = &mut z[row * z_stride..(row + 1) * z_stride];
            envelope1d(f_row, out_row, v_row, z_row);
        }
    }
}

/// Run `envelope1d` over `num_fibers` strided fibers of length
/// `fiber_len`, where `index_of(fiber, position)` maps a fiber-local
/// coordinate to a flat index into `f`/`output`.
fn strided_pass(
    f: &[f32],
    output: &mut [f32],
    fiber_len: usize,
    num_fibers: usize,
    index_of: impl Fn(usize, usize) -> usize + Sync,
    threaded: bool,
) {
    tracing::trace!(fiber_len, num_fibers, threaded, "cpu strided pass");

    if threaded {
        let results: Vec<Vec<f32>> = (0..num_fibers)
            .into_par_iter()
            .map(|fiber| {
                let mut f_buf = vec![0.0f32; fiber_len];
                for (t, slot) in f_buf.iter_mut().enumerate() {
                    *slot = f[index_of(fiber, t)];
                }
                let mut out_buf = vec![0.0f32; fiber_len];
                let mut v_buf = vec![0i32; fiber_len];
                let mut z_buf = vec![0.0f32; fiber_len + 1];
                envelope1d(&f_buf, &mut out_buf, &mut v_buf, &mut z_buf);
                out_buf
            })
            .collect();
        for (fiber, out_buf) in results.into_iter().enumerate() {
            for (t, val) in out_buf.into_iter().enumerate() {
                output[index_of(fiber, t)] = val;
            }
        }
    } else {
        let mut f_buf = vec![0.0f32; fiber_len];
        let mut out_buf = vec![0.0f32; fiber_len];
        let mut v_buf = vec![0i32; fiber_len];
        let mut z_buf = vec![0.0f32; fiber_len + 1];
        for fiber in 0..num_fibers {
            for (t, slot) in f_buf.iter_mut().enumerate() {
                *slot = f[index_of(fiber, t)];
            }
            envelope1d(&f_buf, &mut out_buf, &mut v_buf, &mut z_buf);
            for (t, val) in out_buf.iter().enumerate() {
                output[index_of(fiber, t)] = *val;
            }
        }
    }
}

/// In-place 2D SEDT: row pass (axis 1), copy-back, column pass (axis 0).
///
/// `f` is overwritten with the row-pass result between passes. `v` must
/// have length >= [`v_scratch_len_2d`], `z` length >= [`z_scratch_len_2d`].
///
/// # Panics
///
/// Panics if `f`, `output`, `v`, or `z` don't match `shape`.
pub fn transform_2d_into(
    f: &mut [f32],
    output: &mut [f32],
    v: &mut [i32],
    z: &mut [f32],
    shape: Shape2,
    threaded: bool,
) {
    assert_eq!(f.len(), shape.len(), "f does not match shape");
    assert_eq!(output.len(), shape.len(), "output does not match shape");
    assert!(
        v.len() >= v_scratch_len_2d(shape),
        "v scratch too small: need {}, got {}",
        v_scratch_len_2d(shape),
        v.len()
    );
    assert!(
        z.len() >= z_scratch_len_2d(shape),
        "z scratch too small: need {}, got {}",
        z_scratch_len_2d(shape),
        z.len()
    );

    if shape.is_empty() {
        return;
    }

    row_pass(f, output, v, z, shape, threaded);
    f.copy_from_slice(output);
    strided_pass(
        f,
        output,
        shape.rows,
        shape.cols,
        move |col, row| shape.index(row, col),
        threaded,
    );
}

/// In-place 3D SEDT: plane pass (axes 1,2 per axis-0 index), copy-back,
/// axis-0 fiber pass.
///
/// `f` is overwritten with the plane-pass result between passes. `v`
/// must have length >= [`v_scratch_len_3d`], `z` length >=
/// [`z_scratch_len_3d`].
///
/// # Panics
///
/// Panics if `f`, `output`, `v`, or `z` don't match `shape`.
pub fn transform_3d_into(
    f: &mut [f32],
    output: &mut [f32],
    v: &mut [i32],
    z: &mut [f32],
    shape: Shape3,
    threaded: bool,
) {
    assert_eq!(f.len(), shape.len(), "f does not match shape");
    assert_eq!(output.len(), shape.len(), "output does not match shape");
    assert!(
        v.len() >= v_scratch_len_3d(shape),
        "v scratch too small: need {}, got {}",
        v_scratch_len_3d(shape),
        v.len()
    );
    assert!(
        z.len() >= z_scratch_len_3d(shape),
        "z scratch too small: need {}, got {}",
        z_scratch_len_3d(shape),
        z.len()
    );

    if shape.is_empty() {
        return;
    }

    let plane = shape.plane();
    let plane_v_len = plane.len();
    let plane_z_len = plane.rows * (plane.cols + 1);

    tracing::trace!(d0 = shape.d0, plane = ?plane, threaded, "cpu plane pass");

    if threaded {
        f.par_chunks_mut(plane.len())
            .zip(output.par_chunks_mut(plane.len()))
            .zip(v.par_chunks_mut(plane_v_len))
            .zip(z.par_chunks_mut(plane_z_len))
            .for_each(|(((f_slice, out_slice), v_slice), z_slice)| {
                transform_2d_into(f_slice, out_slice, v_slice, z_slice, plane, threaded);
            });
    } else {
        for s in 0..shape.d0 {
            let f_slice = &mut f[s * plane.len()..(s + 1) * plane.len()];
            let out_slice = &mut output[s * plane.len()..(s + 1) * plane.len()];
            let v_slice = &mut v[s * plane_v_len..(s + 1) * plane_v_len];
            let z_slice = &mut z[s * plane_z_len..(s + 1) * plane_z_len];
            transform_2d_into(f_slice, out_slice, v_slice, z_slice, plane, threaded);
        }
    }

    f.copy_from_slice(output);

    strided_pass(
        f,
        output,
        shape.d0,
        shape.d1 * shape.d2,
        move |pair, d0_idx| shape.index(d0_idx, pair / shape.d2, pair % shape.d2),
        threaded,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_2d(f: &[f32], shape: Shape2) -> Vec<f32> {
        let mut out = vec![0.0f32; shape.len()];
        for pr in 0..shape.rows {
            for pc in 0..shape.cols {
                let mut best = f32::INFINITY;
                for qr in 0..shape.rows {
                    for qc in 0..shape.cols {
                        let d = ((pr as f32 - qr as f32).powi(2) + (pc as f32 - qc as f32).powi(2))
                            + f[shape.index(qr, qc)];
                        if d < best {
                            best = d;
                        }
                    }
                }
                out[shape.index(pr, pc)] = best;
            }
        }
        out
    }

    fn run_2d(f: &[f32], shape: Shape2, threaded: bool) -> Vec<f32> {
        let mut f = f.to_vec();
        let mut output = vec![0.0f32; shape.len()];
        let mut v = vec![0i32; v_scratch_len_2d(shape)];
        let mut z = vec![0.0f32; z_scratch_len_2d(shape)];
        transform_2d_into(&mut f, &mut output, &mut v, &mut z, shape, threaded);
        output
    }

    /// A 7x5 cross/diamond shape, a raw 0/1 pattern with `1` marking the
    /// foreground, matching [`super::super::envelope`]'s `s1` fixture
    /// convention.
    fn cross_fixture() -> (Vec<f32>, Shape2) {
        let fg = 0.0f32;
        let bg = 1e10f32;
        #[rustfmt::skip]
        let raw = [
            0, 1, 1, 1, 0,
            1, 1, 1, 1, 1,
            1, 0, 0, 0, 1,
            1, 0, 0, 0, 1,
            1, 0, 0, 0, 1,
            1, 1, 1, 1, 1,
            0, 1, 1, 1, 0,
        ];
        let grid: Vec<f32> = raw.iter().map(|&b| if b == 1 { fg } else { bg }).collect();
        (grid, Shape2::new(7, 5))
    }

    #[test]
    fn s2_cross_scenario() {
        let (f, shape) = cross_fixture();
        let got = run_2d(&f, shape, false);
        // Row 3 (the center row) is `0 1 4 1 0`: the center cell at
        // (3,2) is distance 2 from the nearest foreground corner, so 4
        // is right there, but (3,1) and (3,3) are orthogonally adjacent
        // to a foreground cell at distance 1, not 2. Verified against
        // the brute-force reference below.
        #[rustfmt::skip]
        let want = [
            1.0, 0.0, 0.0, 0.0, 1.0,
            0.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 1.0, 1.0, 0.0,
            0.0, 1.0, 4.0, 1.0, 0.0,
            0.0, 1.0, 1.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 0.0, 0.0,
            1.0, 0.0, 0.0, 0.0, 1.0,
        ];
        for (g, w) in got.iter().zip(want.iter()) {
            assert!((g - w).abs() < 1e-4, "got {:?}, want {:?}", got, want);
        }
    }

    #[test]
    fn serial_matches_threaded_exactly() {
        let (f, shape) = cross_fixture();
        let serial = run_2d(&f, shape, false);
        let parallel = run_2d(&f, shape, true);
        assert_eq!(serial, parallel, "threaded must match serial bit-for-bit");
    }

    #[test]
    fn matches_naive_reference() {
        let (f, shape) = cross_fixture();
        let got = run_2d(&f, shape, false);
        let want = naive_2d(&f, shape);
        for (g, w) in got.iter().zip(want.iter()) {
            assert!((g - w).abs() < 1e-4, "got {:?}, want {:?}", got, want);
        }
    }

    #[test]
    fn single_foreground_point_2d() {
        let shape = Shape2::new(6, 6);
        let mut f = vec![1e10f32; shape.len()];
        f[shape.index(2, 3)] = 0.0;
        let got = run_2d(&f, shape, false);
        for r in [0usize, 5] {
            for c in [0usize, 5] {
                let want = ((r as f32 - 2.0).powi(2)) + ((c as f32 - 3.0).powi(2));
                let g = got[shape.index(r, c)];
                assert!((g - want).abs() < 1e-4, "({r},{c}): got {g}, want {want}");
            }
        }
    }

    #[test]
    fn all_foreground_2d_is_zero() {
        let shape = Shape2::new(4, 5);
        let f = vec![0.0f32; shape.len()];
        let got = run_2d(&f, shape, false);
        assert!(got.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn all_background_2d_is_sentinel() {
        let shape = Shape2::new(4, 5);
        let f = vec![1e10f32; shape.len()];
        let got = run_2d(&f, shape, false);
        assert!(got.iter().all(|&x| (x - 1e10).abs() < 1.0));
    }

    fn run_3d(f: &[f32], shape: Shape3, threaded: bool) -> Vec<f32> {
        let mut f = f.to_vec();
        let mut output = vec![0.0f32; shape.len()];
        let mut v = vec![0i32; v_scratch_len_3d(shape)];
        let mut z = vec![0.0f32; z_scratch_len_3d(shape)];
        transform_3d_into(&mut f, &mut output, &mut v, &mut z, shape, threaded);
        output
    }

    #[test]
    fn s3_3d_homogeneity_replicates_2d_slice() {
        let (f2d, plane) = cross_fixture();
        let k = 3;
        let shape = Shape3::new(k, plane.rows, plane.cols);
        let mut f3d = Vec::with_capacity(shape.len());
        for _ in 0..k {
            f3d.extend_from_slice(&f2d);
        }
        let got = run_3d(&f3d, shape, false);
        let want_2d = run_2d(&f2d, plane, false);
        for s in 0..k {
            let slice = &got[s * plane.len()..(s + 1) * plane.len()];
            assert_eq!(slice, want_2d.as_slice(), "slice {s} should match 2D result");
        }
    }

    #[test]
    fn serial_matches_threaded_exactly_3d() {
        let (f2d, plane) = cross_fixture();
        let shape = Shape3::new(2, plane.rows, plane.cols);
        let mut f3d = Vec::with_capacity(shape.len());
        for _ in 0..2 {
            f3d.extend_from_slice(&f2d);
        }
        let serial = run_3d(&f3d, shape, false);
        let parallel = run_3d(&f3d, shape, true);
        assert_eq!(serial, parallel);
    }

    #[test]
    fn single_foreground_point_3d_corners() {
        let shape = Shape3::new(5, 5, 5);
        let mut f = vec![1e10f32; shape.len()];
        f[shape.index(2, 2, 2)] = 0.0;
        let got = run_3d(&f, shape, false);
        for &(d0, d1, d2) in &[(0, 0, 0), (0, 0, 4), (4, 4, 0), (4, 4, 4)] {
            let want = (d0 as f32 - 2.0).powi(2) + (d1 as f32 - 2.0).powi(2) + (d2 as f32 - 2.0).powi(2);
            let g = got[shape.index(d0, d1, d2)];
            assert!((g - want).abs() < 1e-4, "({d0},{d1},{d2}): got {g}, want {want}");
        }
    }
}
