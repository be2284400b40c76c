//! # Rendering Support
//!
//! The editor core does not issue draw calls itself. This module owns what an
//! external renderer consumes:
//!
//! - **Buffer arena**: pooled vertex blocks leased out as [`VirtualMesh`]es so
//!   thousands of points, edges and faces draw with one call per block
//! - **Buffer backends**: a host-memory allocator (headless, tests) and a Vulkan
//!   allocator built on `ash`
//! - **Camera**: the [`ViewCamera`] collaborator used by picking and builders
//! - **Render queue**: per-frame draw list in the editor's depth order
//!
//! GPU resources follow a scoped-disposal contract: `dispose()` releases them
//! exactly once and later calls are no-ops.

pub mod arena;
pub mod buffer;
pub mod camera;
pub mod queue;
pub mod vulkan;

pub use arena::{ArenaStats, BlockKey, DrawBatch, MeshArena, SharedMeshBlock, VirtualMesh};
pub use buffer::{BufferAllocator, BufferHandle, BufferUsage, GpuBuffer, HostBufferAllocator};
pub use camera::{Camera, CameraSettings, CameraSettingsError, ViewCamera};
pub use queue::{DrawCommand, RenderQueue};
pub use vulkan::{VulkanBuffer, VulkanBufferAllocator};

/// Draw-primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderMode {
    /// One vertex per point
    Points,
    /// Two vertices per line
    Lines,
    /// Three vertices per triangle
    Triangles,
}

/// Rendering errors
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// More vertices written than the lease holds
    #[error("Lease overflow: {requested} vertices written into a lease of {capacity}")]
    LeaseOverflow {
        /// Vertices in the write
        requested: usize,
        /// Vertices in the lease
        capacity: u32,
    },

    /// A buffer write outside the buffer
    #[error("Write of {len} bytes at offset {offset} exceeds buffer of {size} bytes")]
    OutOfBounds {
        /// Byte offset of the write
        offset: u64,
        /// Length of the write
        len: usize,
        /// Buffer size
        size: u64,
    },

    /// The buffer or block has been disposed
    #[error("Buffer already disposed")]
    Disposed,

    /// The lease points to a block the arena no longer has
    #[error("Unknown mesh block")]
    UnknownBlock,

    /// Vulkan API failure
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] ash::vk::Result),

    /// No device memory type satisfies the buffer's requirements
    #[error("Failed to find suitable memory type")]
    NoSuitableMemoryType,
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
