// Copyright (c) 2024 the Cobalt developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Capability answers derived from the negotiated device state.
//!
//! Every [`Feature`] resolves from data that is fixed at device construction:
//! the extension flags, the cached property blocks, the separately queried
//! feature booleans, and which queue slots were populated. Resolution is a
//! pure function of that snapshot; no native call happens per query.
//!
//! A few features carry a small payload ([`VariableRateShadingInfo`],
//! [`WaveLaneCountMinMaxInfo`]) that is written into a caller-provided byte
//! buffer. The buffer length must equal the payload size exactly; on a
//! mismatch the payload is not written and the caller gets a diagnostic, but
//! the returned boolean is unaffected.

use super::properties::{CooperativeVectorFeatures, DeviceProperties, ShadingRateFeatures};
use super::EnabledExtensions;
use ash::vk;
use bytemuck::{Pod, Zeroable};
use std::mem;

/// Capabilities that can be queried on a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Feature {
    DeferredCommandLists,
    RayTracingAccelStruct,
    RayTracingPipeline,
    RayTracingOpacityMicromap,
    RayTracingClusters,
    RayQuery,
    ShaderExecutionReordering,
    ShaderSpecializations,
    Meshlets,
    VariableRateShading,
    ConservativeRasterization,
    VirtualResources,
    ComputeQueue,
    CopyQueue,
    ConstantBufferRanges,
    WaveLaneCountMinMax,
    HeapDirectlyIndexed,
    CooperativeVectorInferencing,
    CooperativeVectorTraining,
    SamplerFeedback,
}

/// Payload of [`Feature::VariableRateShading`].
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct VariableRateShadingInfo {
    /// Tile size of the shading-rate image, in texels. The hardware reports a
    /// width and a height; the larger of the two is returned.
    pub shading_rate_image_tile_size: u32,
}

/// Payload of [`Feature::WaveLaneCountMinMax`].
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct WaveLaneCountMinMaxInfo {
    pub min_wave_lane_count: u32,
    pub max_wave_lane_count: u32,
}

/// The payload buffer did not match the feature's payload size.
#[derive(Clone, Copy, Debug)]
pub(crate) struct InfoSizeMismatch {
    pub expected: usize,
    pub provided: usize,
}

/// Immutable snapshot that feature queries resolve against.
#[derive(Clone, Copy)]
pub(crate) struct CapabilityView<'a> {
    pub extensions: &'a EnabledExtensions,
    pub properties: &'a DeviceProperties,
    pub shading_rate_features: &'a ShadingRateFeatures,
    pub cooperative_vector_features: &'a CooperativeVectorFeatures,
    pub compute_queue_present: bool,
    pub copy_queue_present: bool,
}

impl CapabilityView<'_> {
    pub(crate) fn supports(&self, feature: Feature) -> bool {
        match feature {
            Feature::DeferredCommandLists => true,
            Feature::RayTracingAccelStruct => self.extensions.khr_acceleration_structure,
            Feature::RayTracingPipeline => self.extensions.khr_ray_tracing_pipeline,
            // Micromap array state transitions need synchronization2; without
            // it the extension cannot be used and is reported unsupported.
            Feature::RayTracingOpacityMicromap => {
                self.extensions.ext_opacity_micromap && self.extensions.khr_synchronization2
            }
            Feature::RayTracingClusters => self.extensions.nv_cluster_acceleration_structure,
            Feature::RayQuery => self.extensions.khr_ray_query,
            Feature::ShaderExecutionReordering => {
                self.extensions.nv_ray_tracing_invocation_reorder
                    && self.properties.invocation_reorder.reordering_hint
                        == vk::RayTracingInvocationReorderModeNV::REORDER
            }
            Feature::ShaderSpecializations => true,
            Feature::Meshlets => self.extensions.nv_mesh_shader,
            Feature::VariableRateShading => {
                self.extensions.khr_fragment_shading_rate
                    && self.shading_rate_features.attachment_fragment_shading_rate
            }
            Feature::ConservativeRasterization => self.extensions.ext_conservative_rasterization,
            Feature::VirtualResources => true,
            Feature::ComputeQueue => self.compute_queue_present,
            Feature::CopyQueue => self.copy_queue_present,
            Feature::ConstantBufferRanges => true,
            Feature::WaveLaneCountMinMax => self.properties.subgroup.subgroup_size != 0,
            Feature::HeapDirectlyIndexed => self.extensions.ext_mutable_descriptor_type,
            Feature::CooperativeVectorInferencing => {
                self.extensions.nv_cooperative_vector
                    && self.cooperative_vector_features.cooperative_vector
            }
            Feature::CooperativeVectorTraining => {
                self.extensions.nv_cooperative_vector
                    && self.cooperative_vector_features.cooperative_vector_training
            }
            Feature::SamplerFeedback => false,
        }
    }

    /// Writes the feature's payload into `out`, if the feature has one.
    ///
    /// Features without a payload accept (and ignore) any buffer.
    pub(crate) fn write_info(
        &self,
        feature: Feature,
        out: &mut [u8],
    ) -> Result<(), InfoSizeMismatch> {
        match feature {
            Feature::VariableRateShading => {
                let tile_extent = self
                    .properties
                    .fragment_shading_rate
                    .min_fragment_shading_rate_attachment_texel_size;
                let info = VariableRateShadingInfo {
                    shading_rate_image_tile_size: tile_extent[0].max(tile_extent[1]),
                };
                write_payload(&info, out)
            }
            Feature::WaveLaneCountMinMax => {
                // The hardware reports exactly one fixed subgroup size, so it
                // serves as both bounds.
                let subgroup_size = self.properties.subgroup.subgroup_size;
                let info = WaveLaneCountMinMaxInfo {
                    min_wave_lane_count: subgroup_size,
                    max_wave_lane_count: subgroup_size,
                };
                write_payload(&info, out)
            }
            _ => Ok(()),
        }
    }
}

fn write_payload<T: Pod>(payload: &T, out: &mut [u8]) -> Result<(), InfoSizeMismatch> {
    if out.len() != mem::size_of::<T>() {
        return Err(InfoSizeMismatch {
            expected: mem::size_of::<T>(),
            provided: out.len(),
        });
    }
    out.copy_from_slice(bytemuck::bytes_of(payload));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::properties::{
        FragmentShadingRateProperties, InvocationReorderProperties, SubgroupProperties,
    };

    fn view<'a>(
        extensions: &'a EnabledExtensions,
        properties: &'a DeviceProperties,
        shading_rate_features: &'a ShadingRateFeatures,
        cooperative_vector_features: &'a CooperativeVectorFeatures,
    ) -> CapabilityView<'a> {
        CapabilityView {
            extensions,
            properties,
            shading_rate_features,
            cooperative_vector_features,
            compute_queue_present: false,
            copy_queue_present: false,
        }
    }

    #[test]
    fn opacity_micromap_needs_both_extensions() {
        let properties = DeviceProperties::default();
        let shading_rate = ShadingRateFeatures::default();
        let coop_vec = CooperativeVectorFeatures::default();

        let micromap_only = EnabledExtensions {
            ext_opacity_micromap: true,
            ..EnabledExtensions::none()
        };
        let sync2_only = EnabledExtensions {
            khr_synchronization2: true,
            ..EnabledExtensions::none()
        };
        let both = EnabledExtensions {
            ext_opacity_micromap: true,
            khr_synchronization2: true,
            ..EnabledExtensions::none()
        };

        for (extensions, expected) in [(micromap_only, false), (sync2_only, false), (both, true)] {
            let view = view(&extensions, &properties, &shading_rate, &coop_vec);
            assert_eq!(view.supports(Feature::RayTracingOpacityMicromap), expected);
        }
    }

    #[test]
    fn execution_reordering_needs_the_reorder_hint() {
        let extensions = EnabledExtensions {
            nv_ray_tracing_invocation_reorder: true,
            ..EnabledExtensions::none()
        };
        let shading_rate = ShadingRateFeatures::default();
        let coop_vec = CooperativeVectorFeatures::default();

        let mut properties = DeviceProperties::default();
        let view_none = view(&extensions, &properties, &shading_rate, &coop_vec);
        assert!(!view_none.supports(Feature::ShaderExecutionReordering));

        properties.invocation_reorder = InvocationReorderProperties {
            reordering_hint: vk::RayTracingInvocationReorderModeNV::REORDER,
        };
        let view_reorder = view(&extensions, &properties, &shading_rate, &coop_vec);
        assert!(view_reorder.supports(Feature::ShaderExecutionReordering));
    }

    #[test]
    fn queue_presence_reflects_the_populated_slots() {
        let extensions = EnabledExtensions::none();
        let properties = DeviceProperties::default();
        let shading_rate = ShadingRateFeatures::default();
        let coop_vec = CooperativeVectorFeatures::default();

        let view = CapabilityView {
            extensions: &extensions,
            properties: &properties,
            shading_rate_features: &shading_rate,
            cooperative_vector_features: &coop_vec,
            compute_queue_present: true,
            copy_queue_present: false,
        };
        assert!(view.supports(Feature::ComputeQueue));
        assert!(!view.supports(Feature::CopyQueue));
    }

    #[test]
    fn variable_rate_shading_payload_is_the_larger_axis() {
        let extensions = EnabledExtensions {
            khr_fragment_shading_rate: true,
            ..EnabledExtensions::none()
        };
        let mut properties = DeviceProperties::default();
        properties.fragment_shading_rate = FragmentShadingRateProperties {
            min_fragment_shading_rate_attachment_texel_size: [8, 16],
            ..Default::default()
        };
        let shading_rate = ShadingRateFeatures {
            attachment_fragment_shading_rate: true,
            ..Default::default()
        };
        let coop_vec = CooperativeVectorFeatures::default();
        let view = view(&extensions, &properties, &shading_rate, &coop_vec);

        let mut out = [0u8; mem::size_of::<VariableRateShadingInfo>()];
        view.write_info(Feature::VariableRateShading, &mut out)
            .unwrap();
        let info: VariableRateShadingInfo = bytemuck::pod_read_unaligned(&out);
        assert_eq!(info.shading_rate_image_tile_size, 16);
        assert!(view.supports(Feature::VariableRateShading));
    }

    #[test]
    fn wave_lane_bounds_are_both_the_subgroup_size() {
        let extensions = EnabledExtensions::none();
        let mut properties = DeviceProperties::default();
        properties.subgroup = SubgroupProperties {
            subgroup_size: 64,
            ..Default::default()
        };
        let shading_rate = ShadingRateFeatures::default();
        let coop_vec = CooperativeVectorFeatures::default();
        let view = view(&extensions, &properties, &shading_rate, &coop_vec);

        let mut out = [0u8; mem::size_of::<WaveLaneCountMinMaxInfo>()];
        view.write_info(Feature::WaveLaneCountMinMax, &mut out)
            .unwrap();
        let info: WaveLaneCountMinMaxInfo = bytemuck::pod_read_unaligned(&out);
        assert_eq!(info.min_wave_lane_count, 64);
        assert_eq!(info.max_wave_lane_count, 64);
        assert!(view.supports(Feature::WaveLaneCountMinMax));
    }

    #[test]
    fn payload_size_mismatch_is_rejected_without_changing_support() {
        let extensions = EnabledExtensions::none();
        let mut properties = DeviceProperties::default();
        properties.subgroup.subgroup_size = 32;
        let shading_rate = ShadingRateFeatures::default();
        let coop_vec = CooperativeVectorFeatures::default();
        let view = view(&extensions, &properties, &shading_rate, &coop_vec);

        let mut too_small = [0u8; 4];
        let err = view
            .write_info(Feature::WaveLaneCountMinMax, &mut too_small)
            .unwrap_err();
        assert_eq!(err.expected, 8);
        assert_eq!(err.provided, 4);
        assert!(view.supports(Feature::WaveLaneCountMinMax));
    }

    #[test]
    fn sampler_feedback_is_never_supported() {
        let extensions = EnabledExtensions::none();
        let properties = DeviceProperties::default();
        let shading_rate = ShadingRateFeatures::default();
        let coop_vec = CooperativeVectorFeatures::default();
        let view = view(&extensions, &properties, &shading_rate, &coop_vec);
        assert!(!view.supports(Feature::SamplerFeedback));
    }
}
