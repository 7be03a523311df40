//! GPU-accelerated SEDT: kernel 1 (first-axis brute search) followed by
//! one radius-pruned refinement kernel per remaining axis.
//!
//! The accelerator is created once with `try_create(max_len)` and reused
//! across calls via `transform()`; buffers are sized for the largest
//! grid the caller expects and reused for smaller ones.

use wgpu::util::DeviceExt;

use super::shaders;
use crate::error::GpuError;
use crate::shape::Shape3;

const WORKGROUP_SIZE: u32 = 64;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Dims {
    d0: u32,
    d1: u32,
    d2: u32,
    axis: u32,
}

#[allow(dead_code)] // buffers held alive for the GPU bind groups
pub struct GpuAccelerator {
    device: wgpu::Device,
    queue: wgpu::Queue,
    kernel1_pipeline: wgpu::ComputePipeline,
    refine_pipeline: wgpu::ComputePipeline,
    f_buf: wgpu::Buffer,
    org_buf: wgpu::Buffer,
    out_buf: wgpu::Buffer,
    // One uniform buffer per pass so all three can be uploaded before a
    // single submit: reusing one buffer across passes would let later
    // `queue.write_buffer` calls race ahead of earlier passes, since
    // nothing here is actually dispatched to the GPU until `submit`.
    dims_bufs: [wgpu::Buffer; 3],
    staging_buf: wgpu::Buffer,
    kernel1_bind_group: wgpu::BindGroup,
    refine_bind_groups: [wgpu::BindGroup; 3],
    capacity: usize,
}

impl GpuAccelerator {
    /// Create an accelerator whose buffers can hold grids of up to
    /// `max_len` elements.
    pub fn try_create(max_len: usize) -> Result<Self, GpuError> {
        let max_len = max_len.max(1);
        let (device, queue) = super::try_create_device()?;

        let kernel1_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sedt_kernel1"),
            source: wgpu::ShaderSource::Wgsl(shaders::KERNEL1.into()),
        });
        let refine_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sedt_refine"),
            source: wgpu::ShaderSource::Wgsl(shaders::REFINE.into()),
        });

        let kernel1_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("kernel1_pipeline"),
            layout: None,
            module: &kernel1_module,
            entry_point: Some("kernel1_axis_search"),
            compilation_options: Default::default(),
            cache: None,
        });
        let refine_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("refine_pipeline"),
            layout: None,
            module: &refine_module,
            entry_point: Some("refine_axis"),
            compilation_options: Default::default(),
            cache: None,
        });

        let byte_len = (max_len * std::mem::size_of::<f32>()) as u64;
        let f_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sedt_f"),
            size: byte_len,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let org_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sedt_org"),
            size: byte_len,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let out_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sedt_out"),
            size: byte_len,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let staging_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sedt_staging"),
            size: byte_len,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let make_dims_buf = |axis: u32| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("sedt_dims"),
                contents: bytemuck::bytes_of(&Dims { d0: 1, d1: 1, d2: 1, axis }),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        };
        let dims_bufs = [make_dims_buf(0), make_dims_buf(1), make_dims_buf(2)];

        let kernel1_layout = kernel1_pipeline.get_bind_group_layout(0);
        let kernel1_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("kernel1_bind_group"),
            layout: &kernel1_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: f_buf.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: out_buf.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: dims_bufs[2].as_entire_binding() },
            ],
        });
        let refine_layout = refine_pipeline.get_bind_group_layout(0);
        let make_refine_bind_group = |dims_buf: &wgpu::Buffer, label: &str| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &refine_layout,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: org_buf.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 1, resource: out_buf.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 2, resource: dims_buf.as_entire_binding() },
                ],
            })
        };
        let refine_bind_groups = [
            make_refine_bind_group(&dims_bufs[0], "refine_bind_group_axis0"),
            make_refine_bind_group(&dims_bufs[1], "refine_bind_group_axis1"),
            make_refine_bind_group(&dims_bufs[2], "refine_bind_group_axis2"),
        ];

        Ok(Self {
            device,
            queue,
            kernel1_pipeline,
            refine_pipeline,
            f_buf,
            org_buf,
            out_buf,
            dims_bufs,
            staging_buf,
            kernel1_bind_group,
            refine_bind_groups,
            capacity: max_len,
        })
    }

    /// Run the SEDT over a thresholded indicator grid of the given
    /// shape. `f[p] >= 0.5` is foreground.
    ///
    /// `shape.d0 == 1` runs the 2D dispatch (kernel 1 + one refine
    /// pass); `shape.d0 > 1` adds the third refine pass over axis 0.
    pub fn transform(&self, f: &[f32], shape: Shape3) -> Result<Vec<f32>, GpuError> {
        let len = shape.len();
        assert!(len <= self.capacity, "grid of {len} elements exceeds accelerator capacity {}", self.capacity);
        assert_eq!(f.len(), len, "input does not match shape");

        tracing::trace!(d0 = shape.d0, d1 = shape.d1, d2 = shape.d2, "gpu sedt dispatch");

        let byte_len = (len * std::mem::size_of::<f32>()) as u64;
        self.queue.write_buffer(&self.f_buf, 0, bytemuck::cast_slice(f));

        let dims_of = |axis: u32| Dims { d0: shape.d0 as u32, d1: shape.d1 as u32, d2: shape.d2 as u32, axis };
        for axis in 0..3u32 {
            self.queue.write_buffer(&self.dims_bufs[axis as usize], 0, bytemuck::bytes_of(&dims_of(axis)));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("sedt_encoder") });

        self.dispatch(&mut encoder, &self.kernel1_pipeline, &self.kernel1_bind_group, len);

        encoder.copy_buffer_to_buffer(&self.out_buf, 0, &self.org_buf, 0, byte_len);
        self.dispatch(&mut encoder, &self.refine_pipeline, &self.refine_bind_groups[1], len);

        if shape.d0 > 1 {
            encoder.copy_buffer_to_buffer(&self.out_buf, 0, &self.org_buf, 0, byte_len);
            self.dispatch(&mut encoder, &self.refine_pipeline, &self.refine_bind_groups[0], len);
        }

        encoder.copy_buffer_to_buffer(&self.out_buf, 0, &self.staging_buf, 0, byte_len);
        self.queue.submit(std::iter::once(encoder.finish()));

        self.read_staging(len)
    }

    fn dispatch(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pipeline: &wgpu::ComputePipeline,
        bind_group: &wgpu::BindGroup,
        len: usize,
    ) {
        let workgroups = (len as u32 + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE;
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("sedt_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(workgroups, 1, 1);
    }

    fn read_staging(&self, len: usize) -> Result<Vec<f32>, GpuError> {
        let byte_len = (len * std::mem::size_of::<f32>()) as u64;
        let slice = self.staging_buf.slice(..byte_len);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        let map_result = rx.recv().map_err(|_| GpuError::ReadbackChannelClosed)?;
        map_result.map_err(|e| GpuError::ReadbackFailed(e.to_string()))?;

        let data = slice.get_mapped_range();
        let result: Vec<f32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        self.staging_buf.unmap();
        Ok(result)
    }
}
