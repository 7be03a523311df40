//! Error types for the crate's one fallible surface: GPU execution.

/// Failure modes for the GPU path.
///
/// CPU entry points never return a `Result` — shape and scratch-size
/// violations there are programming errors and panic at entry, per
/// the crate's error-handling policy. GPU backend failures are a
/// recoverable condition (no adapter, device lost, shader compile
/// rejected by the driver) and are surfaced instead.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("no compatible GPU adapter available")]
    NoAdapter,

    #[error("failed to acquire GPU device: {0}")]
    DeviceRequestFailed(String),

    #[error("GPU buffer readback failed: {0}")]
    ReadbackFailed(String),

    #[error("GPU readback channel closed before a result was sent")]
    ReadbackChannelClosed,
}
