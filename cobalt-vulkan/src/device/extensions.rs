// Copyright (c) 2024 the Cobalt developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The vocabulary of optional extensions the backend reacts to.
//!
//! The device descriptor carries the extension-name lists that the caller
//! enabled on its instance and logical device. [`EnabledExtensions`] parses
//! both lists into one set of boolean flags covering the extensions this
//! backend changes its behavior for. Names outside the vocabulary are ignored
//! without error, so callers may enable whatever else they need. The set is
//! built once during device construction and never written afterwards.

macro_rules! device_extensions {
    (
        $($member:ident => $raw:literal,)*
    ) => {
        /// One flag per optional extension recognized by this backend.
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        #[allow(missing_docs)]
        pub struct EnabledExtensions {
            $(pub $member: bool,)*
        }

        impl EnabledExtensions {
            /// Returns an `EnabledExtensions` object with all flags unset.
            #[inline]
            pub const fn none() -> Self {
                EnabledExtensions {
                    $($member: false,)*
                }
            }

            /// Sets the flag of every vocabulary name present in `names`.
            ///
            /// Names that do not match any flag are skipped.
            pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
                let mut extensions = Self::none();
                for name in names {
                    $(
                        if name == $raw {
                            extensions.$member = true;
                        }
                    )*
                }
                extensions
            }
        }
    };
}

device_extensions! {
    ext_conservative_rasterization => "VK_EXT_conservative_rasterization",
    ext_debug_marker => "VK_EXT_debug_marker",
    ext_debug_report => "VK_EXT_debug_report",
    ext_debug_utils => "VK_EXT_debug_utils",
    ext_mutable_descriptor_type => "VK_EXT_mutable_descriptor_type",
    ext_opacity_micromap => "VK_EXT_opacity_micromap",
    khr_acceleration_structure => "VK_KHR_acceleration_structure",
    khr_buffer_device_address => "VK_KHR_buffer_device_address",
    khr_fragment_shading_rate => "VK_KHR_fragment_shading_rate",
    khr_maintenance1 => "VK_KHR_maintenance1",
    khr_ray_query => "VK_KHR_ray_query",
    khr_ray_tracing_pipeline => "VK_KHR_ray_tracing_pipeline",
    khr_synchronization2 => "VK_KHR_synchronization2",
    nv_cluster_acceleration_structure => "VK_NV_cluster_acceleration_structure",
    nv_cooperative_vector => "VK_NV_cooperative_vector",
    nv_mesh_shader => "VK_NV_mesh_shader",
    nv_ray_tracing_invocation_reorder => "VK_NV_ray_tracing_invocation_reorder",
}

#[cfg(test)]
mod tests {
    use super::EnabledExtensions;

    #[test]
    fn empty_lists_set_nothing() {
        assert_eq!(
            EnabledExtensions::from_names(std::iter::empty::<&str>()),
            EnabledExtensions::none()
        );
    }

    #[test]
    fn vocabulary_names_toggle_their_flag() {
        let extensions = EnabledExtensions::from_names([
            "VK_KHR_acceleration_structure",
            "VK_EXT_opacity_micromap",
            "VK_NV_mesh_shader",
        ]);
        assert_eq!(
            extensions,
            EnabledExtensions {
                khr_acceleration_structure: true,
                ext_opacity_micromap: true,
                nv_mesh_shader: true,
                ..EnabledExtensions::none()
            }
        );
    }

    #[test]
    fn unknown_names_are_ignored() {
        let extensions = EnabledExtensions::from_names([
            "VK_KHR_swapchain",
            "VK_EXT_memory_budget",
            "definitely_not_an_extension",
            "VK_KHR_ray_query",
        ]);
        assert_eq!(
            extensions,
            EnabledExtensions {
                khr_ray_query: true,
                ..EnabledExtensions::none()
            }
        );
    }

    #[test]
    fn both_input_lists_contribute() {
        let instance_names = ["VK_EXT_debug_utils"];
        let device_names = ["VK_KHR_synchronization2"];
        let extensions = EnabledExtensions::from_names(
            instance_names.into_iter().chain(device_names),
        );
        assert!(extensions.ext_debug_utils);
        assert!(extensions.khr_synchronization2);
    }
}
