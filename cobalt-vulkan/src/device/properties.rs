// Copyright (c) 2024 the Cobalt developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Batched retrieval of extension-specific hardware properties.
//!
//! Querying the property block of a disabled extension is invalid, so the
//! blocks to fetch are decided at runtime from [`EnabledExtensions`]. The
//! device records the decision as an ordered list of [`PropertyKind`] tags,
//! chains exactly the tagged blocks into one `vkGetPhysicalDeviceProperties2`
//! call, and copies the results back out by tag into [`DeviceProperties`].
//! Blocks that were not requested keep their zeroed defaults, which every
//! consumer treats as "extension absent".
//!
//! Two extensions additionally report booleans through the *features* query
//! rather than the properties query; those are fetched separately, once each,
//! by [`query_shading_rate_features`] and [`query_cooperative_vector_features`].

use super::extensions::EnabledExtensions;
use crate::ffi;
use ash::vk;
use smallvec::SmallVec;
use std::marker::PhantomPinned;
use std::os::raw::c_void;
use std::ptr::addr_of_mut;

/// Tags the property blocks that can be part of the batched query.
///
/// [`PropertyKind::Subgroup`] is core Vulkan 1.1 and is always requested; the
/// others are requested only when their extension is enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyKind {
    Subgroup,
    AccelerationStructure,
    RayTracingPipeline,
    FragmentShadingRate,
    ConservativeRasterization,
    OpacityMicromap,
    InvocationReorder,
    ClusterAccelerationStructure,
    CooperativeVector,
}

pub(crate) fn requested_property_kinds(
    extensions: &EnabledExtensions,
) -> SmallVec<[PropertyKind; 9]> {
    let mut kinds = SmallVec::new();
    kinds.push(PropertyKind::Subgroup);

    if extensions.khr_acceleration_structure {
        kinds.push(PropertyKind::AccelerationStructure);
    }
    if extensions.khr_ray_tracing_pipeline {
        kinds.push(PropertyKind::RayTracingPipeline);
    }
    if extensions.khr_fragment_shading_rate {
        kinds.push(PropertyKind::FragmentShadingRate);
    }
    if extensions.ext_conservative_rasterization {
        kinds.push(PropertyKind::ConservativeRasterization);
    }
    if extensions.ext_opacity_micromap {
        kinds.push(PropertyKind::OpacityMicromap);
    }
    if extensions.nv_ray_tracing_invocation_reorder {
        kinds.push(PropertyKind::InvocationReorder);
    }
    if extensions.nv_cluster_acceleration_structure {
        kinds.push(PropertyKind::ClusterAccelerationStructure);
    }
    if extensions.nv_cooperative_vector {
        kinds.push(PropertyKind::CooperativeVector);
    }

    kinds
}

/// Subgroup (wave) execution properties, core Vulkan 1.1.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubgroupProperties {
    pub subgroup_size: u32,
    pub supported_stages: vk::ShaderStageFlags,
    pub supported_operations: vk::SubgroupFeatureFlags,
    pub quad_operations_in_all_stages: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AccelerationStructureProperties {
    pub max_geometry_count: u64,
    pub max_instance_count: u64,
    pub max_primitive_count: u64,
    pub max_per_stage_descriptor_acceleration_structures: u32,
    pub max_descriptor_set_acceleration_structures: u32,
    pub min_acceleration_structure_scratch_offset_alignment: u32,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RayTracingPipelineProperties {
    pub shader_group_handle_size: u32,
    pub max_ray_recursion_depth: u32,
    pub max_shader_group_stride: u32,
    pub shader_group_base_alignment: u32,
    pub max_ray_dispatch_invocation_count: u32,
    pub shader_group_handle_alignment: u32,
    pub max_ray_hit_attribute_size: u32,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FragmentShadingRateProperties {
    pub min_fragment_shading_rate_attachment_texel_size: [u32; 2],
    pub max_fragment_shading_rate_attachment_texel_size: [u32; 2],
    pub max_fragment_size: [u32; 2],
    pub max_fragment_shading_rate_coverage_samples: u32,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ConservativeRasterizationProperties {
    pub primitive_overestimation_size: f32,
    pub max_extra_primitive_overestimation_size: f32,
    pub extra_primitive_overestimation_size_granularity: f32,
    pub primitive_underestimation: bool,
    pub degenerate_triangles_rasterized: bool,
    pub fully_covered_fragment_shader_input_variable: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OpacityMicromapProperties {
    pub max_opacity2_state_subdivision_level: u32,
    pub max_opacity4_state_subdivision_level: u32,
}

/// Reordering behavior reported by `VK_NV_ray_tracing_invocation_reorder`.
#[derive(Clone, Copy, Debug)]
pub struct InvocationReorderProperties {
    pub reordering_hint: vk::RayTracingInvocationReorderModeNV,
}

impl Default for InvocationReorderProperties {
    fn default() -> Self {
        InvocationReorderProperties {
            reordering_hint: vk::RayTracingInvocationReorderModeNV::NONE,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ClusterAccelerationStructureProperties {
    pub max_vertices_per_cluster: u32,
    pub max_triangles_per_cluster: u32,
    pub cluster_scratch_byte_alignment: u32,
    pub cluster_byte_alignment: u32,
    pub cluster_template_byte_alignment: u32,
    pub cluster_bottom_level_byte_alignment: u32,
    pub max_cluster_geometry_index: u32,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CooperativeVectorProperties {
    pub supported_stages: vk::ShaderStageFlags,
    pub training_float16_accumulation: bool,
    pub training_float32_accumulation: bool,
    pub max_components: u32,
}

/// The results of the batched property query, cached for the lifetime of the
/// device. Blocks whose extension was disabled stay at their zeroed defaults.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeviceProperties {
    pub subgroup: SubgroupProperties,
    pub acceleration_structure: AccelerationStructureProperties,
    pub ray_tracing_pipeline: RayTracingPipelineProperties,
    pub fragment_shading_rate: FragmentShadingRateProperties,
    pub conservative_rasterization: ConservativeRasterizationProperties,
    pub opacity_micromap: OpacityMicromapProperties,
    pub invocation_reorder: InvocationReorderProperties,
    pub cluster_acceleration_structure: ClusterAccelerationStructureProperties,
    pub cooperative_vector: CooperativeVectorProperties,
}

/// Boolean feature bits of `VK_KHR_fragment_shading_rate`, fetched with their
/// own features query.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShadingRateFeatures {
    pub pipeline_fragment_shading_rate: bool,
    pub primitive_fragment_shading_rate: bool,
    pub attachment_fragment_shading_rate: bool,
}

/// Boolean feature bits of `VK_NV_cooperative_vector`, fetched with their own
/// features query.
#[derive(Clone, Copy, Debug, Default)]
pub struct CooperativeVectorFeatures {
    pub cooperative_vector: bool,
    pub cooperative_vector_training: bool,
}

/// Backing storage for the `pNext` chain of the batched query.
///
/// Every block lives here so that the chain pointers stay valid between
/// assembly and the query call; the struct must not move in between.
#[derive(Default)]
pub(crate) struct PropertiesFfi {
    _pinned: PhantomPinned,

    pub(crate) head: vk::PhysicalDeviceProperties2<'static>,
    subgroup: vk::PhysicalDeviceSubgroupProperties<'static>,
    acceleration_structure: vk::PhysicalDeviceAccelerationStructurePropertiesKHR<'static>,
    ray_tracing_pipeline: vk::PhysicalDeviceRayTracingPipelinePropertiesKHR<'static>,
    fragment_shading_rate: vk::PhysicalDeviceFragmentShadingRatePropertiesKHR<'static>,
    conservative_rasterization: vk::PhysicalDeviceConservativeRasterizationPropertiesEXT<'static>,
    opacity_micromap: vk::PhysicalDeviceOpacityMicromapPropertiesEXT<'static>,
    invocation_reorder: vk::PhysicalDeviceRayTracingInvocationReorderPropertiesNV<'static>,
    cluster_acceleration_structure: ffi::PhysicalDeviceClusterAccelerationStructurePropertiesNV,
    cooperative_vector: ffi::PhysicalDeviceCooperativeVectorPropertiesNV,
}

macro_rules! push_struct {
    ($self:ident, $struct:ident) => {
        $self.$struct.p_next = $self.head.p_next;
        $self.head.p_next = addr_of_mut!($self.$struct) as *mut c_void;
    };
}

impl PropertiesFfi {
    /// Links the tagged blocks into the head's `pNext` chain, in list order.
    pub(crate) fn make_chain(&mut self, kinds: &[PropertyKind]) {
        for kind in kinds {
            match kind {
                PropertyKind::Subgroup => {
                    push_struct!(self, subgroup);
                }
                PropertyKind::AccelerationStructure => {
                    push_struct!(self, acceleration_structure);
                }
                PropertyKind::RayTracingPipeline => {
                    push_struct!(self, ray_tracing_pipeline);
                }
                PropertyKind::FragmentShadingRate => {
                    push_struct!(self, fragment_shading_rate);
                }
                PropertyKind::ConservativeRasterization => {
                    push_struct!(self, conservative_rasterization);
                }
                PropertyKind::OpacityMicromap => {
                    push_struct!(self, opacity_micromap);
                }
                PropertyKind::InvocationReorder => {
                    push_struct!(self, invocation_reorder);
                }
                PropertyKind::ClusterAccelerationStructure => {
                    push_struct!(self, cluster_acceleration_structure);
                }
                PropertyKind::CooperativeVector => {
                    push_struct!(self, cooperative_vector);
                }
            }
        }
    }

    /// Copies the tagged blocks out of the FFI storage into the cache.
    ///
    /// Only the blocks named in `kinds` are written; the rest of `properties`
    /// is left untouched.
    pub(crate) fn write(&self, kinds: &[PropertyKind], properties: &mut DeviceProperties) {
        for kind in kinds {
            match kind {
                PropertyKind::Subgroup => {
                    let block = &self.subgroup;
                    properties.subgroup = SubgroupProperties {
                        subgroup_size: block.subgroup_size,
                        supported_stages: block.supported_stages,
                        supported_operations: block.supported_operations,
                        quad_operations_in_all_stages: block.quad_operations_in_all_stages
                            != vk::FALSE,
                    };
                }
                PropertyKind::AccelerationStructure => {
                    let block = &self.acceleration_structure;
                    properties.acceleration_structure = AccelerationStructureProperties {
                        max_geometry_count: block.max_geometry_count,
                        max_instance_count: block.max_instance_count,
                        max_primitive_count: block.max_primitive_count,
                        max_per_stage_descriptor_acceleration_structures: block
                            .max_per_stage_descriptor_acceleration_structures,
                        max_descriptor_set_acceleration_structures: block
                            .max_descriptor_set_acceleration_structures,
                        min_acceleration_structure_scratch_offset_alignment: block
                            .min_acceleration_structure_scratch_offset_alignment,
                    };
                }
                PropertyKind::RayTracingPipeline => {
                    let block = &self.ray_tracing_pipeline;
                    properties.ray_tracing_pipeline = RayTracingPipelineProperties {
                        shader_group_handle_size: block.shader_group_handle_size,
                        max_ray_recursion_depth: block.max_ray_recursion_depth,
                        max_shader_group_stride: block.max_shader_group_stride,
                        shader_group_base_alignment: block.shader_group_base_alignment,
                        max_ray_dispatch_invocation_count: block.max_ray_dispatch_invocation_count,
                        shader_group_handle_alignment: block.shader_group_handle_alignment,
                        max_ray_hit_attribute_size: block.max_ray_hit_attribute_size,
                    };
                }
                PropertyKind::FragmentShadingRate => {
                    let block = &self.fragment_shading_rate;
                    properties.fragment_shading_rate = FragmentShadingRateProperties {
                        min_fragment_shading_rate_attachment_texel_size: extent_to_array(
                            block.min_fragment_shading_rate_attachment_texel_size,
                        ),
                        max_fragment_shading_rate_attachment_texel_size: extent_to_array(
                            block.max_fragment_shading_rate_attachment_texel_size,
                        ),
                        max_fragment_size: extent_to_array(block.max_fragment_size),
                        max_fragment_shading_rate_coverage_samples: block
                            .max_fragment_shading_rate_coverage_samples,
                    };
                }
                PropertyKind::ConservativeRasterization => {
                    let block = &self.conservative_rasterization;
                    properties.conservative_rasterization = ConservativeRasterizationProperties {
                        primitive_overestimation_size: block.primitive_overestimation_size,
                        max_extra_primitive_overestimation_size: block
                            .max_extra_primitive_overestimation_size,
                        extra_primitive_overestimation_size_granularity: block
                            .extra_primitive_overestimation_size_granularity,
                        primitive_underestimation: block.primitive_underestimation != vk::FALSE,
                        degenerate_triangles_rasterized: block.degenerate_triangles_rasterized
                            != vk::FALSE,
                        fully_covered_fragment_shader_input_variable: block
                            .fully_covered_fragment_shader_input_variable
                            != vk::FALSE,
                    };
                }
                PropertyKind::OpacityMicromap => {
                    let block = &self.opacity_micromap;
                    properties.opacity_micromap = OpacityMicromapProperties {
                        max_opacity2_state_subdivision_level: block
                            .max_opacity2_state_subdivision_level,
                        max_opacity4_state_subdivision_level: block
                            .max_opacity4_state_subdivision_level,
                    };
                }
                PropertyKind::InvocationReorder => {
                    properties.invocation_reorder = InvocationReorderProperties {
                        reordering_hint: self
                            .invocation_reorder
                            .ray_tracing_invocation_reorder_reordering_hint,
                    };
                }
                PropertyKind::ClusterAccelerationStructure => {
                    let block = &self.cluster_acceleration_structure;
                    properties.cluster_acceleration_structure =
                        ClusterAccelerationStructureProperties {
                            max_vertices_per_cluster: block.max_vertices_per_cluster,
                            max_triangles_per_cluster: block.max_triangles_per_cluster,
                            cluster_scratch_byte_alignment: block.cluster_scratch_byte_alignment,
                            cluster_byte_alignment: block.cluster_byte_alignment,
                            cluster_template_byte_alignment: block.cluster_template_byte_alignment,
                            cluster_bottom_level_byte_alignment: block
                                .cluster_bottom_level_byte_alignment,
                            max_cluster_geometry_index: block.max_cluster_geometry_index,
                        };
                }
                PropertyKind::CooperativeVector => {
                    let block = &self.cooperative_vector;
                    properties.cooperative_vector = CooperativeVectorProperties {
                        supported_stages: block.cooperative_vector_supported_stages,
                        training_float16_accumulation: block
                            .cooperative_vector_training_float16_accumulation
                            != vk::FALSE,
                        training_float32_accumulation: block
                            .cooperative_vector_training_float32_accumulation
                            != vk::FALSE,
                        max_components: block.max_cooperative_vector_components,
                    };
                }
            }
        }
    }
}

fn extent_to_array(extent: vk::Extent2D) -> [u32; 2] {
    [extent.width, extent.height]
}

/// Issues the batched property query for the enabled extensions.
///
/// Returns the core device properties together with the per-extension cache.
///
/// # Safety
///
/// `physical_device` must be a valid handle belonging to `instance`, and the
/// instance must support Vulkan 1.1.
pub(crate) unsafe fn query_device_properties(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    extensions: &EnabledExtensions,
) -> (vk::PhysicalDeviceProperties, DeviceProperties) {
    let kinds = requested_property_kinds(extensions);

    let mut output = PropertiesFfi::default();
    output.make_chain(&kinds);
    instance.get_physical_device_properties2(physical_device, &mut output.head);

    let mut properties = DeviceProperties::default();
    output.write(&kinds, &mut properties);

    (output.head.properties, properties)
}

/// Fetches the fragment-shading-rate feature booleans.
///
/// # Safety
///
/// Must only be called when `VK_KHR_fragment_shading_rate` is enabled on the
/// device; `physical_device` must be a valid handle belonging to `instance`.
pub(crate) unsafe fn query_shading_rate_features(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
) -> ShadingRateFeatures {
    let mut shading_rate = vk::PhysicalDeviceFragmentShadingRateFeaturesKHR::default();
    let mut features2 = vk::PhysicalDeviceFeatures2 {
        p_next: addr_of_mut!(shading_rate) as *mut c_void,
        ..Default::default()
    };
    instance.get_physical_device_features2(physical_device, &mut features2);

    ShadingRateFeatures {
        pipeline_fragment_shading_rate: shading_rate.pipeline_fragment_shading_rate != vk::FALSE,
        primitive_fragment_shading_rate: shading_rate.primitive_fragment_shading_rate != vk::FALSE,
        attachment_fragment_shading_rate: shading_rate.attachment_fragment_shading_rate
            != vk::FALSE,
    }
}

/// Fetches the cooperative-vector feature booleans.
///
/// # Safety
///
/// Must only be called when `VK_NV_cooperative_vector` is enabled on the
/// device; `physical_device` must be a valid handle belonging to `instance`.
pub(crate) unsafe fn query_cooperative_vector_features(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
) -> CooperativeVectorFeatures {
    let mut cooperative_vector = ffi::PhysicalDeviceCooperativeVectorFeaturesNV::default();
    let mut features2 = vk::PhysicalDeviceFeatures2 {
        p_next: addr_of_mut!(cooperative_vector) as *mut c_void,
        ..Default::default()
    };
    instance.get_physical_device_features2(physical_device, &mut features2);

    CooperativeVectorFeatures {
        cooperative_vector: cooperative_vector.cooperative_vector != vk::FALSE,
        cooperative_vector_training: cooperative_vector.cooperative_vector_training != vk::FALSE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subgroup_is_always_requested_first() {
        let kinds = requested_property_kinds(&EnabledExtensions::none());
        assert_eq!(&kinds[..], &[PropertyKind::Subgroup]);
    }

    #[test]
    fn only_enabled_extensions_add_kinds() {
        let extensions = EnabledExtensions {
            khr_ray_tracing_pipeline: true,
            ext_opacity_micromap: true,
            ..EnabledExtensions::none()
        };
        let kinds = requested_property_kinds(&extensions);
        assert_eq!(
            &kinds[..],
            &[
                PropertyKind::Subgroup,
                PropertyKind::RayTracingPipeline,
                PropertyKind::OpacityMicromap,
            ]
        );
    }

    #[test]
    fn chain_links_exactly_the_requested_blocks() {
        let extensions = EnabledExtensions {
            khr_acceleration_structure: true,
            nv_cooperative_vector: true,
            ..EnabledExtensions::none()
        };
        let kinds = requested_property_kinds(&extensions);
        let mut output = PropertiesFfi::default();
        output.make_chain(&kinds);

        let mut seen = Vec::new();
        let mut next = output.head.p_next;
        while !next.is_null() {
            let base = unsafe { &*(next as *const vk::BaseOutStructure<'_>) };
            seen.push(base.s_type);
            next = base.p_next as *mut c_void;
        }

        assert_eq!(seen.len(), kinds.len());
        assert!(seen.contains(&vk::StructureType::PHYSICAL_DEVICE_SUBGROUP_PROPERTIES));
        assert!(seen
            .contains(&vk::StructureType::PHYSICAL_DEVICE_ACCELERATION_STRUCTURE_PROPERTIES_KHR));
        assert!(seen
            .contains(&ffi::STRUCTURE_TYPE_PHYSICAL_DEVICE_COOPERATIVE_VECTOR_PROPERTIES_NV));
    }

    #[test]
    fn write_copies_only_the_requested_kinds() {
        let mut output = PropertiesFfi::default();
        output.subgroup.subgroup_size = 32;
        output.ray_tracing_pipeline.shader_group_handle_size = 32;

        let mut properties = DeviceProperties::default();
        output.write(&[PropertyKind::Subgroup], &mut properties);

        assert_eq!(properties.subgroup.subgroup_size, 32);
        // Not requested, so it must keep the documented zero default.
        assert_eq!(properties.ray_tracing_pipeline.shader_group_handle_size, 0);
    }
}
