//! Deterministic camera and allocators for tests
//!
//! The camera looks down -Z from `z = 10`. World `(x, y)` maps to pixel
//! `(100x, 100y)`, so a click at pixel `(100x, 100y)` rays straight down
//! through `(x, y, 0)`.

use crate::foundation::math::{Mat4, Vec2, Vec3};
use crate::geometry::Ray;
use crate::render::{BufferAllocator, BufferUsage, GpuBuffer, HostBufferAllocator, RenderError, RenderResult, ViewCamera};

/// Pixels per world unit
pub const SCALE: f64 = 100.0;

/// Height of the camera plane
pub const EYE_HEIGHT: f64 = 10.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct OrthoCamera;

impl OrthoCamera {
    pub fn new() -> Self {
        Self
    }

    /// Pixel position of a world point
    pub fn screen_of(x: f64, y: f64) -> Vec2 {
        Vec2::new(x * SCALE, y * SCALE)
    }
}

impl ViewCamera for OrthoCamera {
    fn screen_to_world(&self, _screen: Vec2) -> Vec3 {
        Vec3::new(0.0, 0.0, -1.0)
    }

    fn world_to_screen(&self, world: Vec3) -> Vec2 {
        Vec2::new(world.x * SCALE, world.y * SCALE)
    }

    fn proj_view_matrix(&self) -> Mat4 {
        Mat4::identity()
    }

    fn translation(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, EYE_HEIGHT)
    }

    fn width(&self) -> f64 {
        1000.0
    }

    fn height(&self) -> f64 {
        1000.0
    }

    fn ray_through(&self, screen: Vec2) -> Ray {
        Ray::new(Vec3::new(screen.x / SCALE, screen.y / SCALE, EYE_HEIGHT), self.screen_to_world(screen))
    }
}

/// Host allocator that runs out of memory after a fixed number of buffers
#[derive(Debug)]
pub struct LimitedAllocator {
    inner: HostBufferAllocator,
    remaining: usize,
}

impl LimitedAllocator {
    pub fn new(buffers: usize) -> Self {
        Self { inner: HostBufferAllocator::new(), remaining: buffers }
    }
}

impl BufferAllocator for LimitedAllocator {
    fn allocate(&mut self, size: u64, usage: BufferUsage) -> RenderResult<Box<dyn GpuBuffer>> {
        if self.remaining == 0 {
            return Err(RenderError::NoSuitableMemoryType);
        }
        self.remaining -= 1;
        self.inner.allocate(size, usage)
    }
}
