// Copyright (c) 2024 the Cobalt developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Vulkan backend for the Cobalt rendering hardware interface.
//!
//! This crate wraps a set of caller-supplied native Vulkan handles (instance,
//! physical device, logical device and up to three queues) and exposes the
//! device-level services that the rest of the interface is built on:
//!
//! - Extension negotiation: the instance- and device-extension name lists from
//!   the descriptor are parsed into a fixed vocabulary of boolean flags
//!   ([`EnabledExtensions`](device::EnabledExtensions)), and the hardware
//!   property/feature blocks belonging to the enabled extensions are fetched
//!   with a single batched query at construction. Everything queried is cached
//!   on the device and immutable afterwards.
//! - Derived capability answers: [`Device::query_feature_support`] resolves
//!   the [`Feature`](device::Feature) vocabulary from the cached data, and
//!   [`Device::query_format_support`] classifies the usages of an abstract
//!   [`Format`](format::Format).
//! - Device-memory heaps: [`Device::create_heap`] selects a memory type from
//!   the heap-type property requirements and returns an owning
//!   [`Heap`](memory::Heap).
//! - Sparse-texture tiling metadata: [`Device::get_texture_tiling`] computes
//!   per-mip tile counts and packed-mip placement for partially resident
//!   textures.
//! - Submission bookkeeping: [`Device::execute_command_lists`] hands command
//!   buffers to one of the owned queues and returns a per-queue, strictly
//!   increasing submission identifier; [`Device::run_garbage_collection`]
//!   retires the submissions that have completed.
//!
//! The backend never creates or destroys the native instance, device or
//! queues; those belong to the caller. It does own the administrative objects
//! it creates (pipeline cache, tracking semaphores, heap memory) and releases
//! them when the device is dropped.
//!
//! Non-fatal internal failures are reported through the diagnostic channel
//! ([`MessageCallback`](diagnostics::MessageCallback)); the authoritative
//! failure signal for callers is always the `None`/`false` return value.

pub use ash;

pub mod device;
pub mod diagnostics;
mod error;
pub(crate) mod ffi;
pub mod format;
pub mod image;
pub mod library;
pub mod memory;

pub use crate::{
    device::{Device, DeviceCreationError, DeviceDesc, Feature, QueueKind},
    error::VulkanError,
    format::{Format, FormatSupport},
};

/// Represents memory size and offset values on a Vulkan device.
pub use ash::vk::DeviceSize;

/// Identifies which native API a device is implemented on.
///
/// The Vulkan backend always reports [`GraphicsApi::Vulkan`]; the enum exists
/// so that code written against the interface can branch without downcasting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GraphicsApi {
    D3D11,
    D3D12,
    Vulkan,
}
