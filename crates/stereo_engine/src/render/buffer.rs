//! Buffer management for batched vertex data
//!
//! The mesh arena talks to GPU memory through the [`GpuBuffer`] and
//! [`BufferAllocator`] traits so that block bookkeeping does not depend on a
//! particular graphics API. [`HostBufferAllocator`] keeps everything in system
//! memory (headless hosts, tests); the Vulkan backend lives in
//! [`super::vulkan`].
//!
//! Every buffer follows the same disposal contract: `dispose()` releases the
//! underlying storage exactly once, guarded by a sentinel, and any later call
//! is a silent no-op.

use super::{RenderError, RenderResult};

/// Opaque handle identifying a buffer to an external renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// What a buffer will hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Per-vertex positions (`[f32; 3]`)
    Positions,
    /// Per-vertex colors (`[f32; 4]`)
    Colors,
}

/// A block of GPU-visible memory that can be written at byte offsets
pub trait GpuBuffer {
    /// Size in bytes
    fn size(&self) -> u64;

    /// Write `bytes` starting at byte `offset`
    fn write(&mut self, offset: u64, bytes: &[u8]) -> RenderResult<()>;

    /// Release the underlying storage; a no-op after the first call
    fn dispose(&mut self);

    /// Whether `dispose` has been called
    fn is_disposed(&self) -> bool;

    /// Handle for draw submission
    fn handle(&self) -> BufferHandle;

    /// Read back `len` bytes at `offset`, if the backend keeps a host copy
    fn read(&self, _offset: u64, _len: u64) -> Option<Vec<u8>> {
        None
    }
}

/// Creates buffers for the mesh arena
pub trait BufferAllocator {
    /// Allocate a buffer of `size` bytes
    fn allocate(&mut self, size: u64, usage: BufferUsage) -> RenderResult<Box<dyn GpuBuffer>>;
}

fn check_range(size: u64, offset: u64, len: usize) -> RenderResult<()> {
    let end = offset.checked_add(len as u64).ok_or(RenderError::OutOfBounds { offset, len, size })?;
    if end > size {
        return Err(RenderError::OutOfBounds { offset, len, size });
    }
    Ok(())
}

/// Buffer backed by system memory
#[derive(Debug)]
pub struct HostBuffer {
    data: Vec<u8>,
    handle: BufferHandle,
    disposed: bool,
}

impl HostBuffer {
    /// Create a zero-filled buffer
    pub fn new(size: u64, handle: BufferHandle) -> Self {
        Self {
            data: vec![0; size as usize],
            handle,
            disposed: false,
        }
    }
}

impl GpuBuffer for HostBuffer {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn write(&mut self, offset: u64, bytes: &[u8]) -> RenderResult<()> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        check_range(self.size(), offset, bytes.len())?;
        let start = offset as usize;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.data = Vec::new();
        log::trace!("Host buffer {:?} disposed", self.handle);
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn handle(&self) -> BufferHandle {
        self.handle
    }

    fn read(&self, offset: u64, len: u64) -> Option<Vec<u8>> {
        if self.disposed || check_range(self.size(), offset, len as usize).is_err() {
            return None;
        }
        let start = offset as usize;
        Some(self.data[start..start + len as usize].to_vec())
    }
}

/// Allocator handing out [`HostBuffer`]s
#[derive(Debug, Default)]
pub struct HostBufferAllocator {
    next_handle: u64,
    allocated_bytes: u64,
}

impl HostBufferAllocator {
    /// Create a new allocator
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes handed out so far
    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes
    }
}

impl BufferAllocator for HostBufferAllocator {
    fn allocate(&mut self, size: u64, usage: BufferUsage) -> RenderResult<Box<dyn GpuBuffer>> {
        self.next_handle += 1;
        self.allocated_bytes += size;
        log::trace!("Allocating {} byte host buffer for {:?}", size, usage);
        Ok(Box::new(HostBuffer::new(size, BufferHandle(self.next_handle))))
    }
}
