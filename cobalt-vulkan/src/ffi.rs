// Copyright (c) 2024 the Cobalt developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Hand-written bindings for extensions newer than ash's generated ones.
//!
//! `VK_NV_cooperative_vector` and `VK_NV_cluster_acceleration_structure`
//! postdate the vk.xml revision that the pinned ash release was generated
//! from. Only the physical-device property/feature blocks are declared here;
//! they participate in `pNext` chains by raw pointer, so no ash trait impls
//! are required. Remove each block once it appears in ash.

use ash::vk;
use std::os::raw::c_void;
use std::ptr;

pub const STRUCTURE_TYPE_PHYSICAL_DEVICE_COOPERATIVE_VECTOR_FEATURES_NV: vk::StructureType =
    vk::StructureType::from_raw(1_000_593_000);
pub const STRUCTURE_TYPE_PHYSICAL_DEVICE_COOPERATIVE_VECTOR_PROPERTIES_NV: vk::StructureType =
    vk::StructureType::from_raw(1_000_593_001);
pub const STRUCTURE_TYPE_PHYSICAL_DEVICE_CLUSTER_ACCELERATION_STRUCTURE_PROPERTIES_NV:
    vk::StructureType = vk::StructureType::from_raw(1_000_569_001);

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct PhysicalDeviceCooperativeVectorFeaturesNV {
    pub s_type: vk::StructureType,
    pub p_next: *mut c_void,
    pub cooperative_vector: vk::Bool32,
    pub cooperative_vector_training: vk::Bool32,
}

impl Default for PhysicalDeviceCooperativeVectorFeaturesNV {
    fn default() -> Self {
        PhysicalDeviceCooperativeVectorFeaturesNV {
            s_type: STRUCTURE_TYPE_PHYSICAL_DEVICE_COOPERATIVE_VECTOR_FEATURES_NV,
            p_next: ptr::null_mut(),
            cooperative_vector: vk::FALSE,
            cooperative_vector_training: vk::FALSE,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct PhysicalDeviceCooperativeVectorPropertiesNV {
    pub s_type: vk::StructureType,
    pub p_next: *mut c_void,
    pub cooperative_vector_supported_stages: vk::ShaderStageFlags,
    pub cooperative_vector_training_float16_accumulation: vk::Bool32,
    pub cooperative_vector_training_float32_accumulation: vk::Bool32,
    pub max_cooperative_vector_components: u32,
}

impl Default for PhysicalDeviceCooperativeVectorPropertiesNV {
    fn default() -> Self {
        PhysicalDeviceCooperativeVectorPropertiesNV {
            s_type: STRUCTURE_TYPE_PHYSICAL_DEVICE_COOPERATIVE_VECTOR_PROPERTIES_NV,
            p_next: ptr::null_mut(),
            cooperative_vector_supported_stages: vk::ShaderStageFlags::empty(),
            cooperative_vector_training_float16_accumulation: vk::FALSE,
            cooperative_vector_training_float32_accumulation: vk::FALSE,
            max_cooperative_vector_components: 0,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct PhysicalDeviceClusterAccelerationStructurePropertiesNV {
    pub s_type: vk::StructureType,
    pub p_next: *mut c_void,
    pub max_vertices_per_cluster: u32,
    pub max_triangles_per_cluster: u32,
    pub cluster_scratch_byte_alignment: u32,
    pub cluster_byte_alignment: u32,
    pub cluster_template_byte_alignment: u32,
    pub cluster_bottom_level_byte_alignment: u32,
    pub max_cluster_geometry_index: u32,
}

impl Default for PhysicalDeviceClusterAccelerationStructurePropertiesNV {
    fn default() -> Self {
        PhysicalDeviceClusterAccelerationStructurePropertiesNV {
            s_type: STRUCTURE_TYPE_PHYSICAL_DEVICE_CLUSTER_ACCELERATION_STRUCTURE_PROPERTIES_NV,
            p_next: ptr::null_mut(),
            max_vertices_per_cluster: 0,
            max_triangles_per_cluster: 0,
            cluster_scratch_byte_alignment: 0,
            cluster_byte_alignment: 0,
            cluster_template_byte_alignment: 0,
            cluster_bottom_level_byte_alignment: 0,
            max_cluster_geometry_index: 0,
        }
    }
}
