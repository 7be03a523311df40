//! The 1D lower-envelope sweep (Felzenszwalb & Huttenlocher 2012).
//!
//! Pure function over contiguous 1D slices plus two scratch buffers. This
//! is the O(n) kernel every higher-dimensional pass reduces to: the lower
//! envelope of the upward parabolas `f(i) + (q - i)^2`, viewed as
//! functions of `q`.

/// Compute `output[q] = min_i (f[i] + (q - i)^2)` for every `q` in `f`.
///
/// `v` holds the column indices of parabolas currently on the envelope;
/// `z` holds the breakpoints between them, bracketed by `-inf`/`+inf`
/// sentinels. Both are scratch: their contents on entry are irrelevant,
/// since phase 1 below re-initializes `k`, `v[0]`, `z[0]`, `z[1]` before
/// reading anything else out of them.
///
/// # Panics
///
/// Panics if `v.len() != f.len()`, `output.len() != f.len()`, or
/// `z.len() != f.len() + 1` — these are programming errors, not
/// recoverable conditions.
pub fn envelope1d(f: &[f32], output: &mut [f32], v: &mut [i32], z: &mut [f32]) {
    let n = f.len();
    assert_eq!(output.len(), n, "output length must match f length");
    assert_eq!(v.len(), n, "v length must match f length");
    assert_eq!(z.len(), n + 1, "z length must be f length + 1");

    if n == 0 {
        return;
    }
    if n == 1 {
        output[0] = f[0];
        return;
    }

    // Phase 1: build the envelope.
    let mut k: usize = 0;
    v[0] = 0;
    z[0] = f32::NEG_INFINITY;
    z[1] = f32::INFINITY;

    for q in 1..n {
        let fq = f[q] + (q * q) as f32;
        loop {
            let vk = v[k] as usize;
            let fvk = f[vk] + (vk * vk) as f32;
            let s = (fq - fvk) / (2.0 * q as f32 - 2.0 * vk as f32);
            if s <= z[k] && k > 0 {
                k -= 1;
                continue;
            }
            k += 1;
            v[k] = q as i32;
            z[k] = s;
            z[k + 1] = f32::INFINITY;
            break;
        }
    }

    // Phase 2: query the envelope.
    let mut k = 0usize;
    for q in 0..n {
        while z[k + 1] < q as f32 {
            k += 1;
        }
        let vk = v[k] as usize;
        let d = q as f32 - vk as f32;
        output[q] = d * d + f[vk];
    }
}
