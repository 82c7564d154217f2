// Copyright (c) 2024 the Cobalt developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Textures as seen by the tiling queries, and sparse-tiling arithmetic.
//!
//! Resource creation and command recording live outside this backend; what it
//! needs from a texture is the native image handle plus enough of the create
//! info to query sparse requirements. [`Texture::from_native`] captures that
//! from a caller-created image.
//!
//! For a partially resident texture, the device reports a *mip tail*: mips at
//! or above a threshold index are packed together and bound as one opaque
//! region. [`Device::get_texture_tiling`] exposes the tail placement in tile
//! units, the tile dimensions in texels, and per-mip tile counts. Mips inside
//! the tail report zero tiles and a sentinel start index of `u32::MAX`.
//!
//! [`Device::get_texture_tiling`]: crate::device::Device::get_texture_tiling

use crate::format::Format;
use ash::vk;

/// The subset of texture parameters the tiling queries work from.
#[derive(Clone, Debug)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub mip_levels: u32,
    pub format: Format,
    pub debug_name: String,
}

impl Default for TextureDesc {
    fn default() -> Self {
        TextureDesc {
            width: 1,
            height: 1,
            depth: 1,
            mip_levels: 1,
            format: Format::Unknown,
            debug_name: String::new(),
        }
    }
}

/// A caller-created native image registered with the backend.
#[derive(Clone, Debug)]
pub struct Texture {
    pub(crate) handle: vk::Image,
    pub(crate) desc: TextureDesc,
    pub(crate) image_type: vk::ImageType,
    pub(crate) samples: vk::SampleCountFlags,
    pub(crate) usage: vk::ImageUsageFlags,
    pub(crate) tiling: vk::ImageTiling,
    pub(crate) tile_byte_size: vk::DeviceSize,
}

impl Texture {
    pub(crate) fn new(
        handle: vk::Image,
        desc: TextureDesc,
        usage: vk::ImageUsageFlags,
        tile_byte_size: vk::DeviceSize,
    ) -> Self {
        let image_type = if desc.depth > 1 {
            vk::ImageType::TYPE_3D
        } else {
            vk::ImageType::TYPE_2D
        };
        Texture {
            handle,
            desc,
            image_type,
            samples: vk::SampleCountFlags::TYPE_1,
            usage,
            tiling: vk::ImageTiling::OPTIMAL,
            tile_byte_size,
        }
    }

    /// Returns the native image handle.
    #[inline]
    pub fn handle(&self) -> vk::Image {
        self.handle
    }

    /// Returns the parameters the texture was registered with.
    #[inline]
    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    /// Returns the size of one sparse tile in bytes.
    #[inline]
    pub fn tile_byte_size(&self) -> vk::DeviceSize {
        self.tile_byte_size
    }
}

/// Placement of the packed mip tail, in tile units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PackedMipInfo {
    /// Number of mips below the tail threshold, each tiled individually.
    pub num_standard_mips: u32,
    /// Number of mips packed together in the tail.
    pub num_packed_mips: u32,
    /// First tile of the tail within the overall resource.
    pub start_tile_index: u32,
    /// Number of tiles the tail occupies.
    pub num_tiles_for_packed_mips: u32,
}

/// Dimensions of one sparse tile, in texels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileShape {
    pub width_in_texels: u32,
    pub height_in_texels: u32,
    pub depth_in_texels: u32,
}

/// Tile layout of one mip level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubresourceTiling {
    pub width_in_tiles: u32,
    pub height_in_tiles: u32,
    pub depth_in_tiles: u32,
    /// First tile of this mip, or [`UNMAPPED_TILE_INDEX`] for tail mips.
    pub start_tile_index: u32,
}

/// Start index reported for mips that live in the packed tail.
pub const UNMAPPED_TILE_INDEX: u32 = u32::MAX;

/// Derives the packed-mip placement from the native sparse requirements.
pub(crate) fn packed_mip_info_from_requirements(
    requirements: &vk::SparseImageMemoryRequirements,
    mip_levels: u32,
    tile_byte_size: vk::DeviceSize,
) -> PackedMipInfo {
    let num_standard_mips = requirements.image_mip_tail_first_lod;
    PackedMipInfo {
        num_standard_mips,
        num_packed_mips: mip_levels.saturating_sub(num_standard_mips),
        start_tile_index: (requirements.image_mip_tail_offset / tile_byte_size) as u32,
        num_tiles_for_packed_mips: (requirements.image_mip_tail_size / tile_byte_size) as u32,
    }
}

/// Computes per-mip tile counts and start indices.
///
/// Mip 0 has the given extent; each further level halves every axis, clamped
/// to one tile. Levels below `num_standard_mips` get a ceiling-divided tile
/// count and a running start index; levels at or above it report zero tiles
/// and the sentinel start index.
pub(crate) fn compute_subresource_tilings(
    extent: [u32; 3],
    tile: [u32; 3],
    num_standard_mips: u32,
    tilings: &mut [SubresourceTiling],
) {
    let [tile_width, tile_height, tile_depth] = tile;
    let [mut width, mut height, mut depth] = extent;
    let mut start_tile_index = 0u32;

    for (level, tiling) in tilings.iter_mut().enumerate() {
        if (level as u32) < num_standard_mips {
            *tiling = SubresourceTiling {
                width_in_tiles: width.div_ceil(tile_width),
                height_in_tiles: height.div_ceil(tile_height),
                depth_in_tiles: depth.div_ceil(tile_depth),
                start_tile_index,
            };
        } else {
            *tiling = SubresourceTiling {
                width_in_tiles: 0,
                height_in_tiles: 0,
                depth_in_tiles: 0,
                start_tile_index: UNMAPPED_TILE_INDEX,
            };
        }

        width = (width / 2).max(tile_width);
        height = (height / 2).max(tile_height);
        depth = (depth / 2).max(tile_depth);

        start_tile_index +=
            tiling.width_in_tiles * tiling.height_in_tiles * tiling.depth_in_tiles;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_mips_have_strictly_increasing_start_indices() {
        let mut tilings = [SubresourceTiling::default(); 5];
        compute_subresource_tilings([512, 512, 1], [128, 128, 1], 3, &mut tilings);

        assert_eq!(tilings[0].width_in_tiles, 4);
        assert_eq!(tilings[0].height_in_tiles, 4);
        assert_eq!(tilings[1].width_in_tiles, 2);
        assert_eq!(tilings[2].width_in_tiles, 1);

        let starts: Vec<u32> = tilings[..3].iter().map(|t| t.start_tile_index).collect();
        assert_eq!(starts, vec![0, 16, 20]);
        assert!(starts.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn tail_mips_report_zero_tiles_and_the_sentinel() {
        let mut tilings = [SubresourceTiling::default(); 5];
        compute_subresource_tilings([512, 512, 1], [128, 128, 1], 3, &mut tilings);

        for tiling in &tilings[3..] {
            assert_eq!(tiling.width_in_tiles, 0);
            assert_eq!(tiling.height_in_tiles, 0);
            assert_eq!(tiling.depth_in_tiles, 0);
            assert_eq!(tiling.start_tile_index, UNMAPPED_TILE_INDEX);
        }
    }

    #[test]
    fn odd_extents_round_up() {
        let mut tilings = [SubresourceTiling::default(); 1];
        compute_subresource_tilings([300, 140, 1], [128, 64, 1], 1, &mut tilings);
        assert_eq!(tilings[0].width_in_tiles, 3);
        assert_eq!(tilings[0].height_in_tiles, 3);
        assert_eq!(tilings[0].depth_in_tiles, 1);
    }

    #[test]
    fn extents_clamp_at_one_tile() {
        // With a 256 texture and 128 tiles, level 2 onward stays at one tile
        // per axis rather than shrinking to zero.
        let mut tilings = [SubresourceTiling::default(); 4];
        compute_subresource_tilings([256, 256, 1], [128, 128, 1], 4, &mut tilings);
        assert_eq!(tilings[1].width_in_tiles, 1);
        assert_eq!(tilings[2].width_in_tiles, 1);
        assert_eq!(tilings[3].width_in_tiles, 1);
        assert_eq!(tilings[3].start_tile_index, 6);
    }

    #[test]
    fn packed_mip_info_divides_by_tile_size() {
        let requirements = vk::SparseImageMemoryRequirements {
            image_mip_tail_first_lod: 3,
            image_mip_tail_offset: 21 * 65536,
            image_mip_tail_size: 2 * 65536,
            ..Default::default()
        };
        let info = packed_mip_info_from_requirements(&requirements, 9, 65536);
        assert_eq!(
            info,
            PackedMipInfo {
                num_standard_mips: 3,
                num_packed_mips: 6,
                start_tile_index: 21,
                num_tiles_for_packed_mips: 2,
            }
        );
    }
}
