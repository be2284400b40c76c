//! GPU buffer arena
//!
//! Pools fixed-capacity vertex blocks per [`RenderMode`] and hands out
//! non-overlapping sub-ranges ([`VirtualMesh`] leases) so that thousands of
//! small point, edge and face meshes can be drawn with one call per block.
//!
//! Leasing is a bump allocation inside a block: a request scans the blocks of
//! the same mode, in allocation order, for one with `used + n <= capacity` and
//! otherwise allocates a fresh block. Released leases are zeroed (so they draw
//! nothing) but their address space is not reused; it only comes back when the
//! whole arena is disposed on scene teardown.

use bytemuck::{Pod, Zeroable};
use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::{Vec3, Vec4};

use super::buffer::{BufferAllocator, BufferHandle, BufferUsage, GpuBuffer, HostBufferAllocator};
use super::{RenderError, RenderMode, RenderResult};

new_key_type! {
    /// Key of a shared mesh block inside the arena
    pub struct BlockKey;
}

/// Vertex position as stored in the position buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PositionVertex {
    /// x, y, z
    pub position: [f32; 3],
}

/// Vertex color as stored in the color buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    /// r, g, b, a
    pub color: [f32; 4],
}

const POSITION_STRIDE: u64 = std::mem::size_of::<PositionVertex>() as u64;
const COLOR_STRIDE: u64 = std::mem::size_of::<ColorVertex>() as u64;

/// A pool of vertex storage for one render mode
pub struct SharedMeshBlock {
    mode: RenderMode,
    capacity: u32,
    used: u32,
    released: u32,
    positions: Box<dyn GpuBuffer>,
    colors: Box<dyn GpuBuffer>,
    disposed: bool,
}

impl SharedMeshBlock {
    fn new(allocator: &mut dyn BufferAllocator, mode: RenderMode, capacity: u32) -> RenderResult<Self> {
        let positions = allocator.allocate(u64::from(capacity) * POSITION_STRIDE, BufferUsage::Positions)?;
        let colors = allocator.allocate(u64::from(capacity) * COLOR_STRIDE, BufferUsage::Colors)?;
        Ok(Self {
            mode,
            capacity,
            used: 0,
            released: 0,
            positions,
            colors,
            disposed: false,
        })
    }

    /// Render mode of every lease in this block
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Total vertex capacity
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Vertices handed out so far (including released leases)
    pub fn used(&self) -> u32 {
        self.used
    }

    /// Vertices belonging to released leases
    pub fn released(&self) -> u32 {
        self.released
    }

    /// Vertices still available for new leases
    pub fn remaining(&self) -> u32 {
        self.capacity - self.used
    }

    /// Handle of the position buffer
    pub fn position_buffer(&self) -> BufferHandle {
        self.positions.handle()
    }

    /// Handle of the color buffer
    pub fn color_buffer(&self) -> BufferHandle {
        self.colors.handle()
    }

    /// Whether the block has been disposed
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn fits(&self, vertex_count: u32) -> bool {
        !self.disposed && self.used.checked_add(vertex_count).map_or(false, |end| end <= self.capacity)
    }

    fn lease(&mut self, vertex_count: u32) -> u32 {
        let offset = self.used;
        self.used += vertex_count;
        offset
    }

    /// Release both buffers; a no-op after the first call
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.positions.dispose();
        self.colors.dispose();
    }
}

impl Drop for SharedMeshBlock {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// A non-owning lease of `vertex_count` vertices at `offset` in a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualMesh {
    block: BlockKey,
    offset: u32,
    vertex_count: u32,
    mode: RenderMode,
}

impl VirtualMesh {
    /// Owning block
    pub fn block(&self) -> BlockKey {
        self.block
    }

    /// First vertex of the lease within the block
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Number of leased vertices
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Render mode of the owning block
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Vertex range `[offset, offset + vertex_count)`
    pub fn range(&self) -> std::ops::Range<u32> {
        self.offset..self.offset + self.vertex_count
    }

    /// Write positions at the lease's offset
    pub fn set_positions(&self, arena: &mut MeshArena, positions: &[Vec3]) -> RenderResult<()> {
        let data: Vec<PositionVertex> = positions
            .iter()
            .map(|p| PositionVertex { position: [p.x as f32, p.y as f32, p.z as f32] })
            .collect();
        arena.write(self, BufferUsage::Positions, bytemuck::cast_slice(&data), data.len())
    }

    /// Write colors at the lease's offset
    pub fn set_colors(&self, arena: &mut MeshArena, colors: &[Vec4]) -> RenderResult<()> {
        let data: Vec<ColorVertex> = colors
            .iter()
            .map(|c| ColorVertex { color: [c.x as f32, c.y as f32, c.z as f32, c.w as f32] })
            .collect();
        arena.write(self, BufferUsage::Colors, bytemuck::cast_slice(&data), data.len())
    }
}

/// One draw call covering every lease of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawBatch {
    /// Source block
    pub block: BlockKey,
    /// Primitive topology
    pub mode: RenderMode,
    /// Vertices to draw, starting at zero
    pub vertex_count: u32,
    /// Position buffer to bind
    pub positions: BufferHandle,
    /// Color buffer to bind
    pub colors: BufferHandle,
}

/// Arena usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Live blocks
    pub blocks: usize,
    /// Vertices handed out
    pub used_vertices: u64,
    /// Vertices of released leases still occupying space
    pub released_vertices: u64,
    /// Total capacity of all blocks
    pub capacity_vertices: u64,
}

/// Pool of shared mesh blocks
pub struct MeshArena {
    allocator: Box<dyn BufferAllocator>,
    blocks: SlotMap<BlockKey, SharedMeshBlock>,
    order: Vec<BlockKey>,
    block_capacity: u32,
}

impl MeshArena {
    /// Create an arena on top of a buffer allocator
    pub fn new(allocator: Box<dyn BufferAllocator>, block_capacity: u32) -> Self {
        Self {
            allocator,
            blocks: SlotMap::with_key(),
            order: Vec::new(),
            block_capacity: block_capacity.max(1),
        }
    }

    /// Create an arena backed by system memory
    pub fn host(block_capacity: u32) -> Self {
        Self::new(Box::new(HostBufferAllocator::new()), block_capacity)
    }

    /// Capacity of newly allocated blocks
    pub fn block_capacity(&self) -> u32 {
        self.block_capacity
    }

    /// Lease `vertex_count` vertices for `mode`, allocating a block if none fits.
    ///
    /// Requests larger than the block capacity get a dedicated block of exactly
    /// that size.
    pub fn request_mesh(&mut self, vertex_count: u32, mode: RenderMode) -> RenderResult<VirtualMesh> {
        let existing = self
            .order
            .iter()
            .copied()
            .find(|key| self.blocks.get(*key).map_or(false, |b| b.mode == mode && b.fits(vertex_count)));

        let key = match existing {
            Some(key) => key,
            None => {
                let capacity = self.block_capacity.max(vertex_count);
                let block = SharedMeshBlock::new(self.allocator.as_mut(), mode, capacity)?;
                let key = self.blocks.insert(block);
                self.order.push(key);
                log::info!(
                    "Mesh arena grew: new {:?} block of {} vertices ({} blocks total)",
                    mode, capacity, self.order.len()
                );
                key
            }
        };

        let block = self.blocks.get_mut(key).ok_or(RenderError::UnknownBlock)?;
        let offset = block.lease(vertex_count);
        log::trace!("Leased {} {:?} vertices at offset {}", vertex_count, mode, offset);
        Ok(VirtualMesh { block: key, offset, vertex_count, mode })
    }

    /// Release a lease: its vertices are zeroed, the space is not reused.
    ///
    /// Releasing into a disposed or unknown block is a no-op.
    pub fn release(&mut self, mesh: &VirtualMesh) -> RenderResult<()> {
        let Some(block) = self.blocks.get_mut(mesh.block) else {
            return Ok(());
        };
        if block.disposed {
            return Ok(());
        }
        let count = mesh.vertex_count as usize;
        block.positions.write(u64::from(mesh.offset) * POSITION_STRIDE, &vec![0; count * POSITION_STRIDE as usize])?;
        block.colors.write(u64::from(mesh.offset) * COLOR_STRIDE, &vec![0; count * COLOR_STRIDE as usize])?;
        block.released += mesh.vertex_count;
        Ok(())
    }

    fn write(&mut self, mesh: &VirtualMesh, usage: BufferUsage, bytes: &[u8], vertices: usize) -> RenderResult<()> {
        if vertices > mesh.vertex_count as usize {
            return Err(RenderError::LeaseOverflow { requested: vertices, capacity: mesh.vertex_count });
        }
        let block = self.blocks.get_mut(mesh.block).ok_or(RenderError::UnknownBlock)?;
        if block.disposed {
            return Err(RenderError::Disposed);
        }
        match usage {
            BufferUsage::Positions => block.positions.write(u64::from(mesh.offset) * POSITION_STRIDE, bytes),
            BufferUsage::Colors => block.colors.write(u64::from(mesh.offset) * COLOR_STRIDE, bytes),
        }
    }

    /// Read back a lease's positions, when the backend keeps a host copy
    pub fn read_positions(&self, mesh: &VirtualMesh) -> Option<Vec<[f32; 3]>> {
        let block = self.blocks.get(mesh.block)?;
        let bytes = block
            .positions
            .read(u64::from(mesh.offset) * POSITION_STRIDE, u64::from(mesh.vertex_count) * POSITION_STRIDE)?;
        Some(
            bytes
                .chunks_exact(POSITION_STRIDE as usize)
                .map(|chunk| bytemuck::pod_read_unaligned::<PositionVertex>(chunk).position)
                .collect(),
        )
    }

    /// Read back a lease's colors, when the backend keeps a host copy
    pub fn read_colors(&self, mesh: &VirtualMesh) -> Option<Vec<[f32; 4]>> {
        let block = self.blocks.get(mesh.block)?;
        let bytes = block
            .colors
            .read(u64::from(mesh.offset) * COLOR_STRIDE, u64::from(mesh.vertex_count) * COLOR_STRIDE)?;
        Some(
            bytes
                .chunks_exact(COLOR_STRIDE as usize)
                .map(|chunk| bytemuck::pod_read_unaligned::<ColorVertex>(chunk).color)
                .collect(),
        )
    }

    /// Block by key
    pub fn block(&self, key: BlockKey) -> Option<&SharedMeshBlock> {
        self.blocks.get(key)
    }

    /// Blocks in allocation order
    pub fn blocks(&self) -> impl Iterator<Item = (BlockKey, &SharedMeshBlock)> {
        self.order.iter().filter_map(move |key| self.blocks.get(*key).map(|b| (*key, b)))
    }

    /// One draw batch per non-empty block
    pub fn batches(&self) -> Vec<DrawBatch> {
        self.blocks()
            .filter(|(_, block)| !block.disposed && block.used > block.released)
            .map(|(key, block)| DrawBatch {
                block: key,
                mode: block.mode,
                vertex_count: block.used,
                positions: block.position_buffer(),
                colors: block.color_buffer(),
            })
            .collect()
    }

    /// Usage statistics
    pub fn stats(&self) -> ArenaStats {
        self.blocks().fold(ArenaStats::default(), |mut stats, (_, block)| {
            stats.blocks += 1;
            stats.used_vertices += u64::from(block.used);
            stats.released_vertices += u64::from(block.released);
            stats.capacity_vertices += u64::from(block.capacity);
            stats
        })
    }

    /// Dispose every block and forget them; the arena stays usable
    pub fn dispose(&mut self) {
        if self.order.is_empty() {
            return;
        }
        for (_, block) in self.blocks.iter_mut() {
            block.dispose();
        }
        log::info!("Mesh arena disposed {} blocks", self.order.len());
        self.blocks.clear();
        self.order.clear();
    }
}

impl Drop for MeshArena {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leases_in_a_block_do_not_overlap() {
        let mut arena = MeshArena::host(8);
        let a = arena.request_mesh(3, RenderMode::Lines).expect("lease");
        let b = arena.request_mesh(4, RenderMode::Lines).expect("lease");
        assert_eq!(a.block(), b.block());
        assert!(a.range().end <= b.range().start);
        assert_eq!(arena.stats().blocks, 1);
    }

    #[test]
    fn test_full_block_allocates_new_block() {
        let mut arena = MeshArena::host(4);
        let a = arena.request_mesh(3, RenderMode::Triangles).expect("lease");
        let b = arena.request_mesh(3, RenderMode::Triangles).expect("lease");
        assert_ne!(a.block(), b.block());
        assert_eq!(b.offset(), 0);
        // A later small request still fits the first block
        let c = arena.request_mesh(1, RenderMode::Triangles).expect("lease");
        assert_eq!(c.block(), a.block());
        assert_eq!(c.offset(), 3);
    }

    #[test]
    fn test_modes_never_share_blocks() {
        let mut arena = MeshArena::host(64);
        let points = arena.request_mesh(1, RenderMode::Points).expect("lease");
        let lines = arena.request_mesh(2, RenderMode::Lines).expect("lease");
        assert_ne!(points.block(), lines.block());
        assert_eq!(arena.batches().len(), 2);
    }

    #[test]
    fn test_oversized_request_gets_dedicated_block() {
        let mut arena = MeshArena::host(4);
        let big = arena.request_mesh(10, RenderMode::Points).expect("lease");
        assert_eq!(arena.block(big.block()).map(SharedMeshBlock::capacity), Some(10));
    }

    #[test]
    fn test_writes_land_at_lease_offset() {
        let mut arena = MeshArena::host(8);
        let first = arena.request_mesh(2, RenderMode::Lines).expect("lease");
        let second = arena.request_mesh(2, RenderMode::Lines).expect("lease");
        second
            .set_positions(&mut arena, &[Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0)])
            .expect("write");
        assert_eq!(arena.read_positions(&second), Some(vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]));
        assert_eq!(arena.read_positions(&first), Some(vec![[0.0; 3], [0.0; 3]]));
    }

    #[test]
    fn test_write_past_lease_is_rejected() {
        let mut arena = MeshArena::host(8);
        let lease = arena.request_mesh(1, RenderMode::Points).expect("lease");
        let err = lease.set_positions(&mut arena, &[Vec3::zeros(), Vec3::zeros()]).unwrap_err();
        assert!(matches!(err, RenderError::LeaseOverflow { requested: 2, capacity: 1 }));
    }

    #[test]
    fn test_release_zeroes_without_reclaiming() {
        let mut arena = MeshArena::host(4);
        let lease = arena.request_mesh(2, RenderMode::Lines).expect("lease");
        lease.set_colors(&mut arena, &[Vec4::new(1.0, 1.0, 1.0, 1.0); 2]).expect("write");
        arena.release(&lease).expect("release");
        assert_eq!(arena.read_colors(&lease), Some(vec![[0.0; 4]; 2]));

        let next = arena.request_mesh(2, RenderMode::Lines).expect("lease");
        assert_eq!(next.offset(), 2);
        let stats = arena.stats();
        assert_eq!((stats.used_vertices, stats.released_vertices), (4, 2));
    }

    #[test]
    fn test_dispose_twice_is_harmless() {
        let mut arena = MeshArena::host(4);
        let lease = arena.request_mesh(1, RenderMode::Points).expect("lease");
        arena.dispose();
        arena.dispose();
        assert_eq!(arena.stats(), ArenaStats::default());
        assert!(arena.release(&lease).is_ok());
        assert!(matches!(lease.set_positions(&mut arena, &[Vec3::zeros()]), Err(RenderError::UnknownBlock)));
    }
}
