/// Kernel 1: bounded brute-force nearest-foreground search (last axis).
pub const KERNEL1: &str = include_str!("shaders/sedt_kernel1.wgsl");

/// Kernels 2/3: radius-pruned refinement along a remaining axis.
pub const REFINE: &str = include_str!("shaders/sedt_refine.wgsl");
