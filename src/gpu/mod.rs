//! GPU compute infrastructure.
//!
//! Uses wgpu for cross-platform GPU acceleration (Metal, Vulkan, DX12).
//! Provides device initialization and the three SEDT compute kernels.

pub(crate) mod shaders;

mod accelerator;

pub use accelerator::GpuAccelerator;

use crate::error::GpuError;

/// Try to create a wgpu device and queue.
pub fn try_create_device() -> Result<(wgpu::Device, wgpu::Queue), GpuError> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }));
    let adapter = match adapter {
        Some(a) => a,
        None => {
            tracing::warn!("no compatible GPU adapter found");
            return Err(GpuError::NoAdapter);
        }
    };

    let device_queue = pollster::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: Some("sedt-gpu"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::Performance,
        },
        None,
    ));

    match device_queue {
        Ok((device, queue)) => {
            tracing::debug!("acquired GPU device");
            Ok((device, queue))
        }
        Err(e) => {
            tracing::warn!(error = %e, "GPU device request failed");
            Err(GpuError::DeviceRequestFailed(e.to_string()))
        }
    }
}
