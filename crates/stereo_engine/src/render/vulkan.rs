//! Vulkan backend for the mesh arena
//!
//! Each shared mesh block owns two host-visible, host-coherent vertex buffers
//! (positions and colors). Writes map only the touched range, so updating one
//! lease never disturbs its neighbours.
//!
//! Memory is allocated per buffer. Blocks are large (tens of thousands of
//! vertices) and few, so a sub-allocator is not needed here.

use ash::vk::Handle;
use ash::{vk, Device, Instance};

use super::buffer::{BufferAllocator, BufferHandle, BufferUsage, GpuBuffer};
use super::{RenderError, RenderResult};

/// GPU buffer wrapper with explicit disposal
///
/// Wraps `vk::Buffer` and `vk::DeviceMemory`. `dispose()` destroys both exactly
/// once; `Drop` calls it as a fallback.
pub struct VulkanBuffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
    disposed: bool,
}

impl VulkanBuffer {
    /// Create a new buffer with memory allocation
    pub fn new(
        device: Device,
        instance: &Instance,
        physical_device: vk::PhysicalDevice,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> RenderResult<Self> {
        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { device.create_buffer(&buffer_info, None)? };

        let mem_requirements = unsafe { device.get_buffer_memory_requirements(buffer) };

        let memory_type_index = match find_memory_type(
            instance,
            physical_device,
            mem_requirements.memory_type_bits,
            properties,
        ) {
            Ok(index) => index,
            Err(err) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(err);
            }
        };

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(mem_requirements.size)
            .memory_type_index(memory_type_index);

        let memory = match unsafe { device.allocate_memory(&alloc_info, None) } {
            Ok(memory) => memory,
            Err(err) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(err.into());
            }
        };

        if let Err(err) = unsafe { device.bind_buffer_memory(buffer, memory, 0) } {
            unsafe {
                device.destroy_buffer(buffer, None);
                device.free_memory(memory, None);
            }
            return Err(err.into());
        }

        Ok(Self {
            device,
            buffer,
            memory,
            size,
            disposed: false,
        })
    }

    /// Raw buffer handle
    pub fn raw(&self) -> vk::Buffer {
        self.buffer
    }
}

impl GpuBuffer for VulkanBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn write(&mut self, offset: u64, bytes: &[u8]) -> RenderResult<()> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        let len = bytes.len() as vk::DeviceSize;
        if offset.checked_add(len).map_or(true, |end| end > self.size) {
            return Err(RenderError::OutOfBounds { offset, len: bytes.len(), size: self.size });
        }
        if bytes.is_empty() {
            return Ok(());
        }

        unsafe {
            let dst = self.device.map_memory(self.memory, offset, len, vk::MemoryMapFlags::empty())?;
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst.cast::<u8>(), bytes.len());
            self.device.unmap_memory(self.memory);
        }
        Ok(())
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
        log::trace!("Vulkan buffer {:#x} disposed", self.buffer.as_raw());
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn handle(&self) -> BufferHandle {
        BufferHandle(self.buffer.as_raw())
    }
}

impl Drop for VulkanBuffer {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Allocates host-visible vertex buffers on a Vulkan device
pub struct VulkanBufferAllocator {
    device: Device,
    instance: Instance,
    physical_device: vk::PhysicalDevice,
}

impl VulkanBufferAllocator {
    /// Create an allocator for a logical device
    pub fn new(device: Device, instance: Instance, physical_device: vk::PhysicalDevice) -> Self {
        Self { device, instance, physical_device }
    }
}

impl BufferAllocator for VulkanBufferAllocator {
    fn allocate(&mut self, size: u64, usage: BufferUsage) -> RenderResult<Box<dyn GpuBuffer>> {
        log::debug!("Allocating {} byte Vulkan vertex buffer for {:?}", size, usage);
        let buffer = VulkanBuffer::new(
            self.device.clone(),
            &self.instance,
            self.physical_device,
            size,
            vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        Ok(Box::new(buffer))
    }
}

/// Find memory type with required properties
fn find_memory_type(
    instance: &Instance,
    physical_device: vk::PhysicalDevice,
    type_filter: u32,
    properties: vk::MemoryPropertyFlags,
) -> RenderResult<u32> {
    let mem_properties = unsafe { instance.get_physical_device_memory_properties(physical_device) };

    (0..mem_properties.memory_type_count)
        .find(|&i| {
            (type_filter & (1 << i)) != 0
                && mem_properties.memory_types[i as usize].property_flags.contains(properties)
        })
        .ok_or(RenderError::NoSuitableMemoryType)
}
