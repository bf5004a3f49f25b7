//! wgpu device context and kernel dispatch
//!
//! [`GpuContext`] wraps the adapter, device and queue. The library only ever
//! receives one by injection; [`GpuContext::shared`] is the lazily created
//! process-wide instance for application entry points.
//!
//! [`WgpuBackend`] compiles both kernels once and runs each call as a single
//! submission followed by a blocking readback.

use std::num::NonZeroU64;
use std::sync::mpsc::{self, TryRecvError};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use crate::compute::ComputeBackend;
use crate::compute::arena::BufferArena;
use crate::compute::shaders::{BITONIC_SORT_SHADER, BORDER_BLEND_SHADER, KERNEL_ENTRY_POINT};
use crate::compute::sort::SortBatch;
use crate::io::configuration::{
    BORDER_WORKGROUP_SIZE, MAX_WORKGROUPS_PER_DIMENSION, READBACK_TIMEOUT_MS, SORT_PARAMS_SIZE,
    SORT_WORKGROUP_SIZE,
};
use crate::io::error::{Result, SynthesisError, device_error};
use crate::io::pixels::PixelBuffer;

static SHARED_CONTEXT: OnceLock<std::result::Result<Arc<GpuContext>, String>> = OnceLock::new();

/// Adapter, device and queue used for compute dispatches
pub struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("adapter_name", &self.adapter_name)
            .finish_non_exhaustive()
    }
}

impl GpuContext {
    /// Acquire a compute-capable adapter and device, blocking until ready
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::UnsupportedBackend`] if no adapter exists,
    /// the adapter lacks compute shaders, or the device request fails
    pub fn new() -> Result<Self> {
        pollster::block_on(Self::request())
    }

    /// Process-wide context, created on first use
    ///
    /// Intended for application entry points. Library code takes a context
    /// or backend as a parameter instead.
    ///
    /// # Errors
    ///
    /// Returns the (cached) acquisition failure if no device is available
    pub fn shared() -> Result<Arc<Self>> {
        SHARED_CONTEXT
            .get_or_init(|| Self::new().map(Arc::new).map_err(|e| e.to_string()))
            .clone()
            .map_err(|reason| SynthesisError::UnsupportedBackend { reason })
    }

    async fn request() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .map_err(|e| SynthesisError::UnsupportedBackend {
                reason: e.to_string(),
            })?;

        let info = adapter.get_info();
        let downlevel = adapter.get_downlevel_capabilities();
        if !downlevel
            .flags
            .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
        {
            return Err(SynthesisError::UnsupportedBackend {
                reason: format!("adapter '{}' has no compute shader support", info.name),
            });
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("tilesynth.device"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter.limits(),
                ..Default::default()
            })
            .await
            .map_err(|e| SynthesisError::UnsupportedBackend {
                reason: e.to_string(),
            })?;

        tracing::info!(adapter = %info.name, backend = ?info.backend, "acquired GPU device");
        Ok(Self {
            device,
            queue,
            adapter_name: info.name,
        })
    }

    /// The logical device
    pub const fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The submission queue
    pub const fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Human readable adapter name
    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    // Reject allocations the device cannot bind instead of letting wgpu panic
    fn check_binding_size(&self, operation: &'static str, bytes: u64) -> Result<()> {
        let limits = self.device.limits();
        let limit = u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size);
        if bytes > limit {
            return Err(device_error(
                operation,
                &format!("needs a {bytes} byte storage buffer, device limit is {limit}"),
            ));
        }
        Ok(())
    }
}

struct Kernel {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
}

/// Compute backend dispatching the WGSL kernels through wgpu
pub struct WgpuBackend {
    context: Arc<GpuContext>,
    sort: Kernel,
    border: Kernel,
    name: String,
}

impl WgpuBackend {
    /// Compile the kernels on an injected context
    ///
    /// # Errors
    ///
    /// Returns an error if shader compilation or pipeline creation fails
    pub fn new(context: Arc<GpuContext>) -> Result<Self> {
        let device = context.device();
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let sort = build_kernel(
            device,
            "tilesynth.bitonic_sort",
            BITONIC_SORT_SHADER,
            &[
                uniform_entry(0, true),
                storage_entry(1, false),
                storage_entry(2, false),
            ],
        );
        let border = build_kernel(
            device,
            "tilesynth.border_blend",
            BORDER_BLEND_SHADER,
            &[
                uniform_entry(0, false),
                storage_entry(1, true),
                storage_entry(2, false),
            ],
        );

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(device_error("kernel compilation", &error));
        }

        let name = format!("wgpu ({})", context.adapter_name());
        Ok(Self {
            context,
            sort,
            border,
            name,
        })
    }

    /// The context this backend dispatches on
    pub const fn context(&self) -> &Arc<GpuContext> {
        &self.context
    }

    fn sort_on_device(&self, batch: &SortBatch) -> Result<(Vec<f32>, Vec<u32>)> {
        let context = &self.context;
        let device = context.device();
        let schedule = batch.schedule();
        let channels = batch.channels() as u32;

        let key_bytes = (batch.keys().len() * size_of::<f32>()) as u64;
        let payload_bytes = (batch.payload().len() * size_of::<u32>()) as u64;
        context.check_binding_size("bitonic sort", key_bytes.max(payload_bytes))?;

        let invocations = (batch.padded_len() / 2) as u32 * channels;
        let (groups_x, groups_y) = dispatch_grid(invocations, SORT_WORKGROUP_SIZE)?;
        let row_stride = groups_x * SORT_WORKGROUP_SIZE;

        // One parameter block per pass, each at an offset the device accepts
        // as a dynamic uniform offset
        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment).max(1);
        let stride = SORT_PARAMS_SIZE.next_multiple_of(alignment);
        let words_per_pass = (stride / 4) as usize;
        let mut params = vec![0u32; words_per_pass * schedule.len()];
        for (block, pass) in params.chunks_exact_mut(words_per_pass).zip(&schedule) {
            for (dst, src) in block
                .iter_mut()
                .zip([pass.k, pass.j, invocations, channels, row_stride])
            {
                *dst = src;
            }
        }

        let _span = tracing::debug_span!(
            "gpu_bitonic_sort",
            passes = schedule.len(),
            groups_x,
            groups_y
        )
        .entered();

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let mut arena = BufferArena::new(device);
        let storage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC;
        let readback = wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST;
        let keys_id = arena.init(
            "tilesynth.sort.keys",
            bytemuck::cast_slice(batch.keys()),
            storage,
        );
        let payload_id = arena.init(
            "tilesynth.sort.payload",
            bytemuck::cast_slice(batch.payload()),
            storage,
        );
        let params_id = arena.init(
            "tilesynth.sort.params",
            bytemuck::cast_slice(&params),
            wgpu::BufferUsages::UNIFORM,
        );
        let keys_out_id = arena.empty("tilesynth.sort.keys.readback", key_bytes, readback);
        let payload_out_id =
            arena.empty("tilesynth.sort.payload.readback", payload_bytes, readback);

        let keys_buffer = arena.get(keys_id)?;
        let payload_buffer = arena.get(payload_id)?;
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tilesynth.sort.bind_group"),
            layout: &self.sort.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: arena.get(params_id)?,
                        offset: 0,
                        size: NonZeroU64::new(SORT_PARAMS_SIZE),
                    }),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: keys_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: payload_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tilesynth.sort.encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("tilesynth.sort.passes"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.sort.pipeline);
            // Each (k, j) pass reads what the previous one wrote
            for index in 0..schedule.len() as u64 {
                let offset = u32::try_from(index * stride)
                    .map_err(|e| device_error("bitonic sort", &e))?;
                pass.set_bind_group(0, &bind_group, &[offset]);
                pass.dispatch_workgroups(groups_x, groups_y, 1);
            }
        }
        encoder.copy_buffer_to_buffer(keys_buffer, 0, arena.get(keys_out_id)?, 0, key_bytes);
        encoder.copy_buffer_to_buffer(
            payload_buffer,
            0,
            arena.get(payload_out_id)?,
            0,
            payload_bytes,
        );
        context.queue().submit(std::iter::once(encoder.finish()));

        finish_error_scopes(device, "bitonic sort")?;

        let keys = decode_words(&read_buffer(device, arena.get(keys_out_id)?, key_bytes)?)
            .into_iter()
            .map(f32::from_bits)
            .collect();
        let payload = decode_words(&read_buffer(
            device,
            arena.get(payload_out_id)?,
            payload_bytes,
        )?);
        Ok((keys, payload))
    }
}

impl ComputeBackend for WgpuBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn bitonic_sort(&self, batch: &mut SortBatch) -> Result<()> {
        if batch.schedule().is_empty() {
            return Ok(());
        }
        let (keys, payload) = self.sort_on_device(batch)?;
        batch.replace(keys, payload)
    }

    fn blend_borders(&self, input: &PixelBuffer, border: u32) -> Result<PixelBuffer> {
        let context = &self.context;
        let device = context.device();
        let (width, height) = (input.width(), input.height());
        let bytes = (input.data().len() * size_of::<f32>()) as u64;
        context.check_binding_size("border blend", bytes)?;

        let groups_x = width.div_ceil(BORDER_WORKGROUP_SIZE);
        let groups_y = height.div_ceil(BORDER_WORKGROUP_SIZE);
        if groups_x > MAX_WORKGROUPS_PER_DIMENSION || groups_y > MAX_WORKGROUPS_PER_DIMENSION {
            return Err(device_error(
                "border blend",
                &format!("{width}x{height} exceeds the dispatch grid"),
            ));
        }

        let _span = tracing::debug_span!("gpu_border_blend", width, height, border).entered();

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let mut arena = BufferArena::new(device);
        let params: [u32; 4] = [width, height, border, 0];
        let params_id = arena.init(
            "tilesynth.border.params",
            bytemuck::cast_slice(&params),
            wgpu::BufferUsages::UNIFORM,
        );
        let input_id = arena.init(
            "tilesynth.border.input",
            bytemuck::cast_slice(input.data()),
            wgpu::BufferUsages::STORAGE,
        );
        let output_id = arena.empty(
            "tilesynth.border.output",
            bytes,
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        );
        let readback_id = arena.empty(
            "tilesynth.border.readback",
            bytes,
            wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        );

        let output_buffer = arena.get(output_id)?;
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tilesynth.border.bind_group"),
            layout: &self.border.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: arena.get(params_id)?.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: arena.get(input_id)?.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: output_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tilesynth.border.encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("tilesynth.border.pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.border.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(groups_x, groups_y, 1);
        }
        encoder.copy_buffer_to_buffer(output_buffer, 0, arena.get(readback_id)?, 0, bytes);
        context.queue().submit(std::iter::once(encoder.finish()));

        finish_error_scopes(device, "border blend")?;

        let samples = decode_words(&read_buffer(device, arena.get(readback_id)?, bytes)?)
            .into_iter()
            .map(f32::from_bits)
            .collect();
        PixelBuffer::new(samples, width, height)
    }
}

fn build_kernel(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    entries: &[wgpu::BindGroupLayoutEntry],
) -> Kernel {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries,
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[&layout],
        push_constant_ranges: &[],
    });
    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        module: &module,
        entry_point: Some(KERNEL_ENTRY_POINT),
        compilation_options: wgpu::PipelineCompilationOptions::default(),
        cache: None,
    });
    Kernel { pipeline, layout }
}

const fn uniform_entry(binding: u32, dynamic: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: None,
        },
        count: None,
    }
}

const fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
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

/// Workgroup grid covering `invocations`, folded into two dimensions
///
/// # Errors
///
/// Returns an error if even the folded grid exceeds the dispatch limits
pub fn dispatch_grid(invocations: u32, workgroup_size: u32) -> Result<(u32, u32)> {
    let groups = invocations.div_ceil(workgroup_size).max(1);
    let groups_x = groups.min(MAX_WORKGROUPS_PER_DIMENSION);
    let groups_y = groups.div_ceil(groups_x);
    if groups_y > MAX_WORKGROUPS_PER_DIMENSION {
        return Err(device_error(
            "dispatch",
            &format!("{invocations} invocations exceed the dispatch grid"),
        ));
    }
    Ok((groups_x, groups_y))
}

// Pop the validation scope, then the out-of-memory scope, pushed before encoding
fn finish_error_scopes(device: &wgpu::Device, operation: &'static str) -> Result<()> {
    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());
    if let Some(error) = out_of_memory {
        return Err(device_error(operation, &format!("out of memory: {error}")));
    }
    if let Some(error) = validation {
        return Err(device_error(operation, &error));
    }
    Ok(())
}

fn read_buffer(device: &wgpu::Device, buffer: &wgpu::Buffer, size: u64) -> Result<Vec<u8>> {
    let slice = buffer.slice(..size);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });

    let deadline = Instant::now() + Duration::from_millis(READBACK_TIMEOUT_MS);
    loop {
        check_poll(device.poll(wgpu::PollType::Poll))?;
        match rx.try_recv() {
            Ok(Ok(())) => break,
            Ok(Err(error)) => return Err(device_error("buffer readback", &error)),
            Err(TryRecvError::Disconnected) => {
                return Err(device_error("buffer readback", &"mapping callback dropped"));
            }
            Err(TryRecvError::Empty) => {}
        }
        if Instant::now() >= deadline {
            return Err(device_error(
                "buffer readback",
                &format!("timed out after {READBACK_TIMEOUT_MS} ms"),
            ));
        }
        std::thread::sleep(Duration::from_millis(1));
    }

    let bytes = {
        let view = slice.get_mapped_range();
        view.to_vec()
    };
    buffer.unmap();
    Ok(bytes)
}

/// Surface a failed device poll instead of waiting out the readback timeout
///
/// # Errors
///
/// Returns a [`SynthesisError::Device`] carrying the poll failure
pub fn check_poll(
    status: std::result::Result<wgpu::PollStatus, wgpu::PollError>,
) -> Result<()> {
    status
        .map(|_| ())
        .map_err(|e| device_error("buffer readback", &e))
}

// Mapped ranges carry no alignment guarantee for the host copy
fn decode_words(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| {
            let mut word = [0u8; 4];
            word.copy_from_slice(chunk);
            u32::from_ne_bytes(word)
        })
        .collect()
}
