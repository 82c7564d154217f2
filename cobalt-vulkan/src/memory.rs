// Copyright (c) 2024 the Cobalt developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Device-memory heaps backing resource placement.
//!
//! A [`Heap`] is one `vkAllocateMemory` allocation, typed by where the memory
//! should live: on the device, host-visible for uploads, or host-visible and
//! cached for readback. The allocator does not pin a specific memory type;
//! any type whose property flags satisfy the heap type is acceptable. When
//! buffer-device-address is enabled on the device, every heap additionally
//! requests device-address capability, since heaps may back acceleration-
//! structure storage.
//!
//! A heap frees its memory when dropped only if it is *managed*, i.e. the
//! allocation was made here. Memory imported from outside is wrapped with the
//! managed flag unset and is never freed by this crate.

use crate::device::DeviceShared;
use crate::error::VulkanError;
use ash::vk;
use std::fmt;
use std::sync::Arc;

/// Selects the memory properties a heap is allocated with.
///
/// Represented as a raw value so that out-of-range inputs from foreign
/// interfaces stay representable; [`required_memory_flags`] rejects them.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapType(i32);

impl HeapType {
    /// Memory local to the device.
    pub const DEVICE_LOCAL: Self = Self(0);
    /// Host-visible memory for CPU-to-GPU transfers.
    pub const UPLOAD: Self = Self(1);
    /// Host-visible, host-cached memory for GPU-to-CPU transfers.
    pub const READBACK: Self = Self(2);

    #[inline]
    pub const fn from_raw(value: i32) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn as_raw(self) -> i32 {
        self.0
    }
}

impl fmt::Debug for HeapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::DEVICE_LOCAL => f.write_str("DEVICE_LOCAL"),
            Self::UPLOAD => f.write_str("UPLOAD"),
            Self::READBACK => f.write_str("READBACK"),
            Self(value) => write!(f, "HeapType({})", value),
        }
    }
}

/// Parameters of [`Device::create_heap`](crate::device::Device::create_heap).
#[derive(Clone, Debug)]
pub struct HeapDesc {
    pub capacity: vk::DeviceSize,
    pub heap_type: HeapType,
    /// Attached to the native allocation when the debug extensions are
    /// enabled; also carried in allocation-failure diagnostics.
    pub debug_name: String,
}

impl Default for HeapDesc {
    fn default() -> Self {
        HeapDesc {
            capacity: 0,
            heap_type: HeapType::DEVICE_LOCAL,
            debug_name: String::new(),
        }
    }
}

/// An allocation of device memory.
pub struct Heap {
    shared: Arc<DeviceShared>,
    desc: HeapDesc,
    memory: vk::DeviceMemory,
    memory_type_index: u32,
    managed: bool,
}

impl Heap {
    pub(crate) fn new(
        shared: Arc<DeviceShared>,
        desc: HeapDesc,
        memory: vk::DeviceMemory,
        memory_type_index: u32,
        managed: bool,
    ) -> Self {
        Heap {
            shared,
            desc,
            memory,
            memory_type_index,
            managed,
        }
    }

    /// Returns the parameters the heap was created with.
    #[inline]
    pub fn desc(&self) -> &HeapDesc {
        &self.desc
    }

    /// Returns the heap's capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> vk::DeviceSize {
        self.desc.capacity
    }

    /// Returns the native memory handle, or null after the heap has been
    /// freed.
    #[inline]
    pub fn memory(&self) -> vk::DeviceMemory {
        self.memory
    }

    /// Returns the index of the memory type the allocation was made from.
    #[inline]
    pub fn memory_type_index(&self) -> u32 {
        self.memory_type_index
    }

    /// Returns whether the allocation is owned (and will be freed) by this
    /// crate.
    #[inline]
    pub fn is_managed(&self) -> bool {
        self.managed
    }
}

impl Drop for Heap {
    fn drop(&mut self) {
        if self.managed && self.memory != vk::DeviceMemory::null() {
            unsafe {
                self.shared
                    .device()
                    .free_memory(self.memory, self.shared.allocation_callbacks());
            }
            self.memory = vk::DeviceMemory::null();
        }
    }
}

impl fmt::Debug for Heap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heap")
            .field("desc", &self.desc)
            .field("memory", &self.memory)
            .field("managed", &self.managed)
            .finish()
    }
}

/// Maps a heap type to the memory-property flags its allocation must satisfy.
///
/// Returns `None` for values outside the heap-type vocabulary.
pub(crate) fn required_memory_flags(heap_type: HeapType) -> Option<vk::MemoryPropertyFlags> {
    match heap_type {
        HeapType::DEVICE_LOCAL => Some(vk::MemoryPropertyFlags::DEVICE_LOCAL),
        HeapType::UPLOAD => Some(vk::MemoryPropertyFlags::HOST_VISIBLE),
        HeapType::READBACK => {
            Some(vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_CACHED)
        }
        _ => None,
    }
}

/// Picks the first memory type allowed by `type_bits` whose property flags
/// contain `required`.
pub(crate) fn find_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    required: vk::MemoryPropertyFlags,
) -> Option<u32> {
    (0..memory_properties.memory_type_count).find(|&index| {
        let supported = type_bits & (1u32 << index) != 0;
        supported
            && memory_properties.memory_types[index as usize]
                .property_flags
                .contains(required)
    })
}

/// Allocates heap memory of the given size from the chosen memory type,
/// requesting device-address capability when asked to.
pub(crate) fn allocate_heap_memory(
    shared: &DeviceShared,
    capacity: vk::DeviceSize,
    memory_type_index: u32,
    enable_device_address: bool,
) -> Result<vk::DeviceMemory, VulkanError> {
    let mut flags_info = vk::MemoryAllocateFlagsInfo {
        flags: vk::MemoryAllocateFlags::DEVICE_ADDRESS,
        ..Default::default()
    };
    let mut allocate_info = vk::MemoryAllocateInfo {
        allocation_size: capacity,
        memory_type_index,
        ..Default::default()
    };
    if enable_device_address {
        allocate_info.p_next = &mut flags_info as *mut _ as *const std::os::raw::c_void;
    }

    unsafe {
        shared
            .device()
            .allocate_memory(&allocate_info, shared.allocation_callbacks())
    }
    .map_err(VulkanError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_properties(flags: &[vk::MemoryPropertyFlags]) -> vk::PhysicalDeviceMemoryProperties {
        let mut properties = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: flags.len() as u32,
            ..Default::default()
        };
        for (index, &property_flags) in flags.iter().enumerate() {
            properties.memory_types[index] = vk::MemoryType {
                property_flags,
                heap_index: 0,
            };
        }
        properties
    }

    #[test]
    fn heap_types_map_to_their_property_flags() {
        assert_eq!(
            required_memory_flags(HeapType::DEVICE_LOCAL),
            Some(vk::MemoryPropertyFlags::DEVICE_LOCAL)
        );
        assert_eq!(
            required_memory_flags(HeapType::UPLOAD),
            Some(vk::MemoryPropertyFlags::HOST_VISIBLE)
        );
        assert_eq!(
            required_memory_flags(HeapType::READBACK),
            Some(vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_CACHED)
        );
    }

    #[test]
    fn unrecognized_heap_type_is_rejected() {
        assert_eq!(required_memory_flags(HeapType::from_raw(3)), None);
        assert_eq!(required_memory_flags(HeapType::from_raw(-1)), None);
    }

    #[test]
    fn any_memory_type_with_the_required_flags_is_accepted() {
        let properties = memory_properties(&[
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_CACHED,
        ]);

        assert_eq!(
            find_memory_type(&properties, !0, vk::MemoryPropertyFlags::DEVICE_LOCAL),
            Some(0)
        );
        assert_eq!(
            find_memory_type(&properties, !0, vk::MemoryPropertyFlags::HOST_VISIBLE),
            Some(1)
        );
        assert_eq!(
            find_memory_type(
                &properties,
                !0,
                vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_CACHED
            ),
            Some(2)
        );
    }

    #[test]
    fn type_bits_constrain_the_selection() {
        let properties = memory_properties(&[
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        ]);
        assert_eq!(
            find_memory_type(&properties, 0b10, vk::MemoryPropertyFlags::DEVICE_LOCAL),
            Some(1)
        );
        assert_eq!(
            find_memory_type(&properties, 0, vk::MemoryPropertyFlags::DEVICE_LOCAL),
            None
        );
    }

    #[test]
    fn no_matching_type_yields_none() {
        let properties = memory_properties(&[vk::MemoryPropertyFlags::DEVICE_LOCAL]);
        assert_eq!(
            find_memory_type(&properties, !0, vk::MemoryPropertyFlags::HOST_VISIBLE),
            None
        );
    }
}
