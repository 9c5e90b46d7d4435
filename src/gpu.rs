//! Accelerated executor: both passes as `wgpu` compute shaders.
//!
//! WGSL has no portable double precision, so the accelerated kernel runs in
//! `f32`. Results match the fallback only away from the set's boundary.

use bytemuck::{Pod, Zeroable};
use log::{debug, trace};

use crate::{
    command_buffer,
    command_encoder::CommandEncoderExt,
    error::{Error, Result},
    executor::{ExecutionMode, Executor},
    kernel::KernelParams,
    typed_buffer::{self, Buffer},
    var::{self, Var},
};

/// Corresponds to `escape_time.wgsl#EscapeTimeParams`.
#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, Default)]
struct EscapeTimeParams {
    width: u32,
    height: u32,
    upscale_width: u32,
    upscale_height: u32,
    center_real: f32,
    center_imaginary: f32,
    magnification: f32,
    budget: f32,
    julia_real: f32,
    julia_imaginary: f32,
    julia_enabled: u32,
    total: u32,
    red: f32,
    green: f32,
    blue: f32,
    padding: u32,
}

impl From<&KernelParams> for EscapeTimeParams {
    fn from(params: &KernelParams) -> Self {
        Self {
            width: params.size.width,
            height: params.size.height,
            upscale_width: params.grid.upscale_width,
            upscale_height: params.grid.upscale_height,
            center_real: params.view.center.real as f32,
            center_imaginary: params.view.center.imaginary as f32,
            magnification: params.view.magnification as f32,
            budget: params.budget() as f32,
            julia_real: params.julia.real as f32,
            julia_imaginary: params.julia.imaginary as f32,
            julia_enabled: u32::from(params.julia.enabled),
            total: params.oversampled_pixels() as u32,
            red: f32::from(params.colours.red),
            green: f32::from(params.colours.green),
            blue: f32::from(params.colours.blue),
            padding: 0,
        }
    }
}

/// Corresponds to `antialias.wgsl#AntialiasParams`.
#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, Default)]
struct AntialiasParams {
    width: u32,
    height: u32,
    upscale_width: u32,
    upscale_height: u32,
    samples_per_pixel: u32,
    total: u32,
    padding: [u32; 2],
}

impl From<&KernelParams> for AntialiasParams {
    fn from(params: &KernelParams) -> Self {
        Self {
            width: params.size.width,
            height: params.size.height,
            upscale_width: params.grid.upscale_width,
            upscale_height: params.grid.upscale_height,
            samples_per_pixel: params.grid.samples_per_pixel,
            total: params.display_pixels() as u32,
            padding: [0; 2],
        }
    }
}

/// Device-side pixel buffers, recreated whenever the buffer lengths change.
struct Buffers {
    oversampled: Buffer<u32>,
    oversampled_readback: Buffer<u32>,
    display: Buffer<u32>,
    display_readback: Buffer<u32>,
    escape_time_bind_group: wgpu::BindGroup,
    antialias_bind_group: wgpu::BindGroup,
}

impl Buffers {
    fn matches(&self, oversampled_len: usize, display_len: usize) -> bool {
        self.oversampled.len() == oversampled_len as u64 && self.display.len() == display_len as u64
    }

    fn destroy(self) {
        self.oversampled.destroy();
        self.oversampled_readback.destroy();
        self.display.destroy();
        self.display_readback.destroy();
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub struct GpuExecutor {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,
    max_binding_size: u64,
    escape_time_pipeline: wgpu::ComputePipeline,
    escape_time_layout: wgpu::BindGroupLayout,
    escape_time_params: Var<EscapeTimeParams>,
    antialias_pipeline: wgpu::ComputePipeline,
    antialias_layout: wgpu::BindGroupLayout,
    antialias_params: Var<AntialiasParams>,
    buffers: Option<Buffers>,
}

impl GpuExecutor {
    /// Request an adapter and device and build both compute pipelines.
    pub fn new() -> Result<Self> {
        pollster::block_on(Self::request())
    }

    async fn request() -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::Backends::all());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .ok_or_else(|| Error::AcceleratorUnavailable("no compatible adapter".to_string()))?;
        let adapter_name = adapter.get_info().name;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("device"),
                    features: wgpu::Features::empty(),
                    limits: adapter.limits(),
                },
                None,
            )
            .await
            .map_err(|error| Error::AcceleratorUnavailable(error.to_string()))?;
        let max_binding_size = u64::from(device.limits().max_storage_buffer_binding_size);
        debug!(
            "using adapter {:?} (max storage binding {} bytes)",
            adapter_name, max_binding_size
        );

        let escape_time_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("escape-time-bind-group-layout"),
            entries: &[var::layout_entry(0), storage_entry(1, false)],
        });
        let escape_time_pipeline = Self::pipeline(
            &device,
            "escape-time",
            include_str!("escape_time.wgsl"),
            "escape_time",
            &escape_time_layout,
        );

        let antialias_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("antialias-bind-group-layout"),
            entries: &[
                var::layout_entry(0),
                storage_entry(1, true),
                storage_entry(2, false),
            ],
        });
        let antialias_pipeline = Self::pipeline(
            &device,
            "antialias",
            include_str!("antialias.wgsl"),
            "antialias",
            &antialias_layout,
        );

        let escape_time_params =
            Var::new(&device, "escape-time-params", EscapeTimeParams::default());
        let antialias_params = Var::new(&device, "antialias-params", AntialiasParams::default());

        Ok(Self {
            device,
            queue,
            adapter_name,
            max_binding_size,
            escape_time_pipeline,
            escape_time_layout,
            escape_time_params,
            antialias_pipeline,
            antialias_layout,
            antialias_params,
            buffers: None,
        })
    }

    fn pipeline(
        device: &wgpu::Device,
        label: &str,
        source: &str,
        entry_point: &str,
        bind_group_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::ComputePipeline {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });
        device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            module: &module,
            entry_point,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    fn ensure_buffers(&mut self, oversampled_len: usize, display_len: usize) {
        if let Some(buffers) = &self.buffers {
            if buffers.matches(oversampled_len, display_len) {
                return;
            }
        }
        if let Some(stale) = self.buffers.take() {
            stale.destroy();
        }
        debug!(
            "allocating device buffers: {} oversampled, {} display channels",
            oversampled_len, display_len
        );

        let storage = |label, len: usize| {
            typed_buffer::Builder::<u32>::new(len as u64)
                .with_label(label)
                .with_usage(wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC)
                .create(&self.device)
        };
        let readback = |label, len: usize| {
            typed_buffer::Builder::<u32>::new(len as u64)
                .with_label(label)
                .with_usage(wgpu::BufferUsages::MAP_READ)
                .create(&self.device)
        };
        let oversampled = storage("oversampled", oversampled_len);
        let oversampled_readback = readback("oversampled-readback", oversampled_len);
        let display = storage("display", display_len);
        let display_readback = readback("display-readback", display_len);

        let escape_time_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("escape-time-bind-group"),
            layout: &self.escape_time_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.escape_time_params.binding_resource(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: oversampled.binding_resource(),
                },
            ],
        });
        let antialias_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("antialias-bind-group"),
            layout: &self.antialias_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.antialias_params.binding_resource(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: oversampled.binding_resource(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: display.binding_resource(),
                },
            ],
        });

        self.buffers = Some(Buffers {
            oversampled,
            oversampled_readback,
            display,
            display_readback,
            escape_time_bind_group,
            antialias_bind_group,
        });
    }

    fn dispatch(
        &mut self,
        params: &KernelParams,
        oversampled: &mut [u32],
        display: &mut [u32],
    ) -> Result<()> {
        self.ensure_buffers(oversampled.len(), display.len());
        let buffers = self
            .buffers
            .as_ref()
            .ok_or_else(|| Error::AcceleratorUnavailable("device buffers missing".to_string()))?;

        self.escape_time_params
            .write(&self.queue, EscapeTimeParams::from(params));
        self.antialias_params
            .write(&self.queue, AntialiasParams::from(params));

        let command_buffer = command_buffer::record(&self.device, "render", |command_encoder| {
            command_encoder.dispatch_per_index(
                "escape-time-pass",
                &self.escape_time_pipeline,
                &buffers.escape_time_bind_group,
                params.oversampled_pixels(),
            );
            command_encoder.dispatch_per_index(
                "antialias-pass",
                &self.antialias_pipeline,
                &buffers.antialias_bind_group,
                params.display_pixels(),
            );
            typed_buffer::copy_buffer_to_buffer(
                command_encoder,
                &buffers.oversampled,
                &buffers.oversampled_readback,
            );
            typed_buffer::copy_buffer_to_buffer(
                command_encoder,
                &buffers.display,
                &buffers.display_readback,
            );
        });

        trace!("submitting render");
        self.queue.submit([command_buffer]);

        buffers
            .oversampled_readback
            .read_into(&self.device, oversampled)?;
        buffers.display_readback.read_into(&self.device, display)?;
        trace!("render read back");
        Ok(())
    }
}

impl Executor for GpuExecutor {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Accelerated
    }

    fn execute(
        &mut self,
        params: &KernelParams,
        oversampled: &mut [u32],
        display: &mut [u32],
    ) -> Result<()> {
        let bytes = (oversampled.len() * std::mem::size_of::<u32>()) as u64;
        if bytes > self.max_binding_size {
            return Err(Error::AcceleratorUnavailable(format!(
                "oversampled buffer of {} bytes exceeds the device limit of {} bytes",
                bytes, self.max_binding_size
            )));
        }

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let result = self.dispatch(params, oversampled, display);
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());

        if let Some(error) = validation.or(out_of_memory) {
            if let Some(stale) = self.buffers.take() {
                stale.destroy();
            }
            return Err(Error::AcceleratorUnavailable(error.to_string()));
        }
        result
    }
}
