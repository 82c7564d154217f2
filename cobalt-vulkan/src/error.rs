// Copyright (c) 2024 the Cobalt developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use ash::vk;
use std::{error::Error, fmt};

/// Error reported by the Vulkan implementation.
///
/// Covers the result codes this backend can actually observe; anything else
/// is carried through verbatim in [`VulkanError::Unnamed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VulkanError {
    /// There is no memory available on the host.
    OutOfHostMemory,
    /// There is no memory available on the device.
    OutOfDeviceMemory,
    /// Initialization of an object could not be completed.
    InitializationFailed,
    /// The logical or physical device has been lost.
    DeviceLost,
    /// Too many objects of the type have already been created.
    TooManyObjects,
    /// A requested format is not supported on this device.
    FormatNotSupported,
    /// The requested address is not available.
    InvalidOpaqueCaptureAddress,
    /// Any other result code.
    Unnamed(vk::Result),
}

impl From<vk::Result> for VulkanError {
    fn from(result: vk::Result) -> Self {
        match result {
            vk::Result::ERROR_OUT_OF_HOST_MEMORY => VulkanError::OutOfHostMemory,
            vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => VulkanError::OutOfDeviceMemory,
            vk::Result::ERROR_INITIALIZATION_FAILED => VulkanError::InitializationFailed,
            vk::Result::ERROR_DEVICE_LOST => VulkanError::DeviceLost,
            vk::Result::ERROR_TOO_MANY_OBJECTS => VulkanError::TooManyObjects,
            vk::Result::ERROR_FORMAT_NOT_SUPPORTED => VulkanError::FormatNotSupported,
            vk::Result::ERROR_INVALID_OPAQUE_CAPTURE_ADDRESS => {
                VulkanError::InvalidOpaqueCaptureAddress
            }
            result => VulkanError::Unnamed(result),
        }
    }
}

impl Error for VulkanError {}

impl fmt::Display for VulkanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VulkanError::OutOfHostMemory => write!(f, "a host memory allocation has failed"),
            VulkanError::OutOfDeviceMemory => write!(f, "a device memory allocation has failed"),
            VulkanError::InitializationFailed => {
                write!(f, "initialization of an object could not be completed")
            }
            VulkanError::DeviceLost => write!(f, "the logical or physical device has been lost"),
            VulkanError::TooManyObjects => {
                write!(f, "too many objects of the type have already been created")
            }
            VulkanError::FormatNotSupported => {
                write!(f, "a requested format is not supported on this device")
            }
            VulkanError::InvalidOpaqueCaptureAddress => {
                write!(f, "the requested address is not available")
            }
            VulkanError::Unnamed(result) => {
                write!(f, "unnamed error, VkResult value {}", result.as_raw())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VulkanError;
    use ash::vk;

    #[test]
    fn known_results_map_to_named_variants() {
        assert_eq!(
            VulkanError::from(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY),
            VulkanError::OutOfDeviceMemory
        );
        assert_eq!(
            VulkanError::from(vk::Result::ERROR_DEVICE_LOST),
            VulkanError::DeviceLost
        );
    }

    #[test]
    fn unknown_results_are_carried_verbatim() {
        let err = VulkanError::from(vk::Result::ERROR_FRAGMENTED_POOL);
        assert_eq!(err, VulkanError::Unnamed(vk::Result::ERROR_FRAGMENTED_POOL));
        assert!(format!("{}", err).contains("VkResult"));
    }
}
