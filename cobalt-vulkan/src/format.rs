// Copyright (c) 2024 the Cobalt developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Abstract pixel and vertex formats, and per-format usage classification.
//!
//! The interface speaks its own [`Format`] vocabulary; each entry maps to one
//! native `vk::Format`. [`Device::query_format_support`] fetches the native
//! per-format feature flags once and folds them into a [`FormatSupport`] mask
//! through a fixed table. Several categories combine two independent native
//! sources: a format is shader-loadable if it can back either a sampled image
//! or a uniform texel buffer, and read-write/atomic categories OR the storage
//! image and storage texel buffer bits the same way.
//!
//! Vulkan exposes no feature bit for index-buffer usability, so
//! [`FormatSupport::INDEX_BUFFER`] is reported for exactly the two formats an
//! index buffer can be made of, `R32Uint` and `R16Uint`, regardless of the
//! queried flags.
//!
//! [`Device::query_format_support`]: crate::device::Device::query_format_support

use ash::vk;
use bitflags::bitflags;

/// The formats usable through this interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Format {
    Unknown,

    R8Uint,
    R8Sint,
    R8Unorm,
    R8Snorm,
    Rg8Uint,
    Rg8Sint,
    Rg8Unorm,
    Rg8Snorm,
    R16Uint,
    R16Sint,
    R16Unorm,
    R16Snorm,
    R16Float,
    Bgra4Unorm,
    B5G6R5Unorm,
    B5G5R5A1Unorm,
    Rgba8Uint,
    Rgba8Sint,
    Rgba8Unorm,
    Rgba8Snorm,
    Bgra8Unorm,
    Srgba8Unorm,
    Sbgra8Unorm,
    R10G10B10A2Unorm,
    R11G11B10Float,
    Rg16Uint,
    Rg16Sint,
    Rg16Unorm,
    Rg16Snorm,
    Rg16Float,
    R32Uint,
    R32Sint,
    R32Float,
    Rgba16Uint,
    Rgba16Sint,
    Rgba16Float,
    Rgba16Unorm,
    Rgba16Snorm,
    Rg32Uint,
    Rg32Sint,
    Rg32Float,
    Rgb32Uint,
    Rgb32Sint,
    Rgb32Float,
    Rgba32Uint,
    Rgba32Sint,
    Rgba32Float,

    D16,
    D24S8,
    X24G8Uint,
    D32,
    D32S8,
    X32G8Uint,

    Bc1Unorm,
    Bc1UnormSrgb,
    Bc2Unorm,
    Bc2UnormSrgb,
    Bc3Unorm,
    Bc3UnormSrgb,
    Bc4Unorm,
    Bc4Snorm,
    Bc5Unorm,
    Bc5Snorm,
    Bc6HUfloat,
    Bc6HSfloat,
    Bc7Unorm,
    Bc7UnormSrgb,
}

impl Format {
    /// Returns the native format this entry maps to.
    pub fn vk_format(self) -> vk::Format {
        match self {
            Format::Unknown => vk::Format::UNDEFINED,

            Format::R8Uint => vk::Format::R8_UINT,
            Format::R8Sint => vk::Format::R8_SINT,
            Format::R8Unorm => vk::Format::R8_UNORM,
            Format::R8Snorm => vk::Format::R8_SNORM,
            Format::Rg8Uint => vk::Format::R8G8_UINT,
            Format::Rg8Sint => vk::Format::R8G8_SINT,
            Format::Rg8Unorm => vk::Format::R8G8_UNORM,
            Format::Rg8Snorm => vk::Format::R8G8_SNORM,
            Format::R16Uint => vk::Format::R16_UINT,
            Format::R16Sint => vk::Format::R16_SINT,
            Format::R16Unorm => vk::Format::R16_UNORM,
            Format::R16Snorm => vk::Format::R16_SNORM,
            Format::R16Float => vk::Format::R16_SFLOAT,
            Format::Bgra4Unorm => vk::Format::B4G4R4A4_UNORM_PACK16,
            Format::B5G6R5Unorm => vk::Format::B5G6R5_UNORM_PACK16,
            Format::B5G5R5A1Unorm => vk::Format::B5G5R5A1_UNORM_PACK16,
            Format::Rgba8Uint => vk::Format::R8G8B8A8_UINT,
            Format::Rgba8Sint => vk::Format::R8G8B8A8_SINT,
            Format::Rgba8Unorm => vk::Format::R8G8B8A8_UNORM,
            Format::Rgba8Snorm => vk::Format::R8G8B8A8_SNORM,
            Format::Bgra8Unorm => vk::Format::B8G8R8A8_UNORM,
            Format::Srgba8Unorm => vk::Format::R8G8B8A8_SRGB,
            Format::Sbgra8Unorm => vk::Format::B8G8R8A8_SRGB,
            Format::R10G10B10A2Unorm => vk::Format::A2B10G10R10_UNORM_PACK32,
            Format::R11G11B10Float => vk::Format::B10G11R11_UFLOAT_PACK32,
            Format::Rg16Uint => vk::Format::R16G16_UINT,
            Format::Rg16Sint => vk::Format::R16G16_SINT,
            Format::Rg16Unorm => vk::Format::R16G16_UNORM,
            Format::Rg16Snorm => vk::Format::R16G16_SNORM,
            Format::Rg16Float => vk::Format::R16G16_SFLOAT,
            Format::R32Uint => vk::Format::R32_UINT,
            Format::R32Sint => vk::Format::R32_SINT,
            Format::R32Float => vk::Format::R32_SFLOAT,
            Format::Rgba16Uint => vk::Format::R16G16B16A16_UINT,
            Format::Rgba16Sint => vk::Format::R16G16B16A16_SINT,
            Format::Rgba16Float => vk::Format::R16G16B16A16_SFLOAT,
            Format::Rgba16Unorm => vk::Format::R16G16B16A16_UNORM,
            Format::Rgba16Snorm => vk::Format::R16G16B16A16_SNORM,
            Format::Rg32Uint => vk::Format::R32G32_UINT,
            Format::Rg32Sint => vk::Format::R32G32_SINT,
            Format::Rg32Float => vk::Format::R32G32_SFLOAT,
            Format::Rgb32Uint => vk::Format::R32G32B32_UINT,
            Format::Rgb32Sint => vk::Format::R32G32B32_SINT,
            Format::Rgb32Float => vk::Format::R32G32B32_SFLOAT,
            Format::Rgba32Uint => vk::Format::R32G32B32A32_UINT,
            Format::Rgba32Sint => vk::Format::R32G32B32A32_SINT,
            Format::Rgba32Float => vk::Format::R32G32B32A32_SFLOAT,

            Format::D16 => vk::Format::D16_UNORM,
            Format::D24S8 => vk::Format::D24_UNORM_S8_UINT,
            Format::X24G8Uint => vk::Format::D24_UNORM_S8_UINT,
            Format::D32 => vk::Format::D32_SFLOAT,
            Format::D32S8 => vk::Format::D32_SFLOAT_S8_UINT,
            Format::X32G8Uint => vk::Format::D32_SFLOAT_S8_UINT,

            Format::Bc1Unorm => vk::Format::BC1_RGBA_UNORM_BLOCK,
            Format::Bc1UnormSrgb => vk::Format::BC1_RGBA_SRGB_BLOCK,
            Format::Bc2Unorm => vk::Format::BC2_UNORM_BLOCK,
            Format::Bc2UnormSrgb => vk::Format::BC2_SRGB_BLOCK,
            Format::Bc3Unorm => vk::Format::BC3_UNORM_BLOCK,
            Format::Bc3UnormSrgb => vk::Format::BC3_SRGB_BLOCK,
            Format::Bc4Unorm => vk::Format::BC4_UNORM_BLOCK,
            Format::Bc4Snorm => vk::Format::BC4_SNORM_BLOCK,
            Format::Bc5Unorm => vk::Format::BC5_UNORM_BLOCK,
            Format::Bc5Snorm => vk::Format::BC5_SNORM_BLOCK,
            Format::Bc6HUfloat => vk::Format::BC6H_UFLOAT_BLOCK,
            Format::Bc6HSfloat => vk::Format::BC6H_SFLOAT_BLOCK,
            Format::Bc7Unorm => vk::Format::BC7_UNORM_BLOCK,
            Format::Bc7UnormSrgb => vk::Format::BC7_SRGB_BLOCK,
        }
    }
}

bitflags! {
    /// The usages a format supports on the current device.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FormatSupport: u32 {
        const BUFFER = 1 << 0;
        const INDEX_BUFFER = 1 << 1;
        const VERTEX_BUFFER = 1 << 2;

        const TEXTURE = 1 << 3;
        const DEPTH_STENCIL = 1 << 4;
        const RENDER_TARGET = 1 << 5;
        const BLENDABLE = 1 << 6;

        const SHADER_LOAD = 1 << 7;
        const SHADER_SAMPLE = 1 << 8;
        const SHADER_READ_WRITE_LOAD = 1 << 9;
        const SHADER_READ_WRITE_STORE = 1 << 10;
        const SHADER_ATOMIC = 1 << 11;
    }
}

/// Folds the native per-format feature flags into the usage mask.
pub(crate) fn support_from_native(format: Format, props: &vk::FormatProperties) -> FormatSupport {
    let buffer = props.buffer_features;
    let optimal = props.optimal_tiling_features;

    let mut result = FormatSupport::empty();

    if !buffer.is_empty() {
        result |= FormatSupport::BUFFER;
    }

    // There is no feature bit for index buffers; these two formats are the
    // ones an index buffer can consist of.
    if matches!(format, Format::R32Uint | Format::R16Uint) {
        result |= FormatSupport::INDEX_BUFFER;
    }

    if buffer.contains(vk::FormatFeatureFlags::VERTEX_BUFFER) {
        result |= FormatSupport::VERTEX_BUFFER;
    }

    if !optimal.is_empty() {
        result |= FormatSupport::TEXTURE;
    }

    if optimal.contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT) {
        result |= FormatSupport::DEPTH_STENCIL;
    }

    if optimal.contains(vk::FormatFeatureFlags::COLOR_ATTACHMENT) {
        result |= FormatSupport::RENDER_TARGET;
    }

    if optimal.contains(vk::FormatFeatureFlags::COLOR_ATTACHMENT_BLEND) {
        result |= FormatSupport::BLENDABLE;
    }

    if optimal.contains(vk::FormatFeatureFlags::SAMPLED_IMAGE)
        || buffer.contains(vk::FormatFeatureFlags::UNIFORM_TEXEL_BUFFER)
    {
        result |= FormatSupport::SHADER_LOAD;
    }

    if optimal.contains(vk::FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR) {
        result |= FormatSupport::SHADER_SAMPLE;
    }

    if optimal.contains(vk::FormatFeatureFlags::STORAGE_IMAGE)
        || buffer.contains(vk::FormatFeatureFlags::STORAGE_TEXEL_BUFFER)
    {
        result |= FormatSupport::SHADER_READ_WRITE_LOAD | FormatSupport::SHADER_READ_WRITE_STORE;
    }

    if optimal.contains(vk::FormatFeatureFlags::STORAGE_IMAGE_ATOMIC)
        || buffer.contains(vk::FormatFeatureFlags::STORAGE_TEXEL_BUFFER_ATOMIC)
    {
        result |= FormatSupport::SHADER_ATOMIC;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_buffer_is_exactly_the_two_index_formats() {
        // Even with every native flag set, only R16Uint and R32Uint may
        // report index-buffer support.
        let all = vk::FormatProperties {
            linear_tiling_features: vk::FormatFeatureFlags::from_raw(!0),
            optimal_tiling_features: vk::FormatFeatureFlags::from_raw(!0),
            buffer_features: vk::FormatFeatureFlags::from_raw(!0),
        };
        for format in [Format::R16Uint, Format::R32Uint] {
            assert!(support_from_native(format, &all).contains(FormatSupport::INDEX_BUFFER));
        }
        for format in [Format::R32Sint, Format::Rgba8Unorm, Format::R16Sint] {
            assert!(!support_from_native(format, &all).contains(FormatSupport::INDEX_BUFFER));
        }

        // And they report it even when the driver exposes nothing at all.
        let none = vk::FormatProperties::default();
        assert!(support_from_native(Format::R32Uint, &none)
            .contains(FormatSupport::INDEX_BUFFER));
    }

    #[test]
    fn shader_load_combines_image_and_texel_buffer_sources() {
        let image_only = vk::FormatProperties {
            optimal_tiling_features: vk::FormatFeatureFlags::SAMPLED_IMAGE,
            ..Default::default()
        };
        let buffer_only = vk::FormatProperties {
            buffer_features: vk::FormatFeatureFlags::UNIFORM_TEXEL_BUFFER,
            ..Default::default()
        };
        for props in [image_only, buffer_only] {
            assert!(support_from_native(Format::Rgba8Unorm, &props)
                .contains(FormatSupport::SHADER_LOAD));
        }
    }

    #[test]
    fn storage_sources_grant_load_and_store_together() {
        let props = vk::FormatProperties {
            buffer_features: vk::FormatFeatureFlags::STORAGE_TEXEL_BUFFER,
            ..Default::default()
        };
        let support = support_from_native(Format::R32Float, &props);
        assert!(support.contains(FormatSupport::SHADER_READ_WRITE_LOAD));
        assert!(support.contains(FormatSupport::SHADER_READ_WRITE_STORE));
        assert!(!support.contains(FormatSupport::SHADER_ATOMIC));
    }

    #[test]
    fn attachment_flags_map_to_their_categories() {
        let props = vk::FormatProperties {
            optimal_tiling_features: vk::FormatFeatureFlags::COLOR_ATTACHMENT
                | vk::FormatFeatureFlags::COLOR_ATTACHMENT_BLEND,
            ..Default::default()
        };
        let support = support_from_native(Format::Rgba16Float, &props);
        assert!(support.contains(FormatSupport::TEXTURE));
        assert!(support.contains(FormatSupport::RENDER_TARGET));
        assert!(support.contains(FormatSupport::BLENDABLE));
        assert!(!support.contains(FormatSupport::DEPTH_STENCIL));

        let depth = vk::FormatProperties {
            optimal_tiling_features: vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
            ..Default::default()
        };
        assert!(support_from_native(Format::D32, &depth).contains(FormatSupport::DEPTH_STENCIL));
    }

    #[test]
    fn depth_aliases_share_a_native_format() {
        assert_eq!(Format::D24S8.vk_format(), Format::X24G8Uint.vk_format());
        assert_eq!(Format::D32S8.vk_format(), Format::X32G8Uint.vk_format());
    }
}
