//! Stage-local GPU buffers released exactly once
//!
//! Every buffer a kernel invocation needs is created through one arena. When
//! the arena goes out of scope, normally or through `?`, all of its buffers
//! are destroyed, so no device memory outlives the stage that allocated it.

use crate::io::error::{Result, device_error};
use wgpu::util::DeviceExt;

/// Handle to a buffer owned by a [`BufferArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferId(usize);

/// Owner of all buffers used by one stage
pub struct BufferArena<'d> {
    device: &'d wgpu::Device,
    buffers: Vec<wgpu::Buffer>,
}

impl<'d> BufferArena<'d> {
    /// Start an empty arena on `device`
    pub const fn new(device: &'d wgpu::Device) -> Self {
        Self {
            device,
            buffers: Vec::new(),
        }
    }

    /// Create a buffer holding `contents`
    pub fn init(&mut self, label: &str, contents: &[u8], usage: wgpu::BufferUsages) -> BufferId {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            });
        self.push(buffer)
    }

    /// Create an uninitialized buffer of `size` bytes
    pub fn empty(&mut self, label: &str, size: u64, usage: wgpu::BufferUsages) -> BufferId {
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        });
        self.push(buffer)
    }

    /// Borrow a buffer
    ///
    /// # Errors
    ///
    /// Returns an error if the id was issued by a different arena
    pub fn get(&self, id: BufferId) -> Result<&wgpu::Buffer> {
        self.buffers
            .get(id.0)
            .ok_or_else(|| device_error("buffer lookup", &format!("unknown buffer id {}", id.0)))
    }

    /// Number of live buffers
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Whether the arena owns no buffers
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    fn push(&mut self, buffer: wgpu::Buffer) -> BufferId {
        self.buffers.push(buffer);
        BufferId(self.buffers.len() - 1)
    }
}

impl Drop for BufferArena<'_> {
    fn drop(&mut self) {
        for buffer in &self.buffers {
            buffer.destroy();
        }
        if !self.buffers.is_empty() {
            tracing::trace!(count = self.buffers.len(), "released stage buffers");
        }
    }
}
