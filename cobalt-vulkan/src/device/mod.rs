// Copyright (c) 2024 the Cobalt developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The device: capability negotiation, resource heaps, queue bookkeeping.
//!
//! A [`Device`] is created from a [`DeviceDesc`] carrying native handles that
//! the caller created through its own instance/device setup. Construction
//! performs the negotiation work exactly once:
//!
//! 1. The Vulkan library is loaded (or the descriptor's override library) and
//!    all entry points are resolved dynamically.
//! 2. The extension-name lists are parsed into [`EnabledExtensions`].
//! 3. The property blocks of the enabled extensions are fetched with a single
//!    batched query and cached, together with the memory properties and the
//!    feature booleans that need their own query.
//! 4. The administrative pipeline cache and an empty descriptor-set layout
//!    are created. If the driver rejects either, an Error diagnostic is
//!    emitted and construction continues with a null handle; collaborators
//!    that consume these objects tolerate the null.
//! 5. A [`Queue`] wrapper is constructed for every queue handle present in
//!    the descriptor.
//!
//! Everything queried in steps 2 and 3 is immutable for the lifetime of the
//! device and is read without synchronization. The native instance, physical
//! device, logical device and queues are never destroyed by this crate; the
//! objects the device creates itself are released when it is dropped.

pub(crate) mod extensions;
pub(crate) mod features;
pub(crate) mod properties;
pub(crate) mod queue;

pub use self::extensions::EnabledExtensions;
pub use self::features::{Feature, VariableRateShadingInfo, WaveLaneCountMinMaxInfo};
pub use self::properties::{
    AccelerationStructureProperties, ClusterAccelerationStructureProperties,
    ConservativeRasterizationProperties, CooperativeVectorFeatures, CooperativeVectorProperties,
    DeviceProperties, FragmentShadingRateProperties, InvocationReorderProperties,
    OpacityMicromapProperties, PropertyKind, RayTracingPipelineProperties, ShadingRateFeatures,
    SubgroupProperties,
};
pub use self::queue::{Queue, QueueKind};

use self::features::CapabilityView;
use crate::diagnostics::{DiagnosticSink, MessageCallback};
use crate::error::VulkanError;
use crate::format::{self, Format, FormatSupport};
use crate::image::{
    self, PackedMipInfo, SubresourceTiling, Texture, TextureDesc, TileShape,
};
use crate::library::{LoadingError, RuntimeLibrary};
use crate::memory::{self, Heap, HeapDesc};
use crate::GraphicsApi;
use ash::vk::{self, Handle};
use std::error::Error;
use std::ffi::CString;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Parameters of [`Device::new`].
///
/// The three core handles are required; everything else is optional. Queue
/// slots without a handle stay empty, and the corresponding capability
/// queries report the queue as absent.
#[derive(Clone)]
pub struct DeviceDesc {
    pub instance: vk::Instance,
    pub physical_device: vk::PhysicalDevice,
    pub device: vk::Device,

    pub graphics_queue: Option<vk::Queue>,
    pub graphics_queue_family: u32,
    pub compute_queue: Option<vk::Queue>,
    pub compute_queue_family: u32,
    pub transfer_queue: Option<vk::Queue>,
    pub transfer_queue_family: u32,

    /// Names of the extensions enabled on the caller's instance.
    pub instance_extensions: Vec<String>,
    /// Names of the extensions enabled on the caller's logical device.
    pub device_extensions: Vec<String>,

    /// Capacity reserved for timer queries.
    pub max_timer_queries: u32,

    /// Forces the buffer-device-address flag on. This is how the Vulkan 1.2
    /// core feature is communicated, since it leaves no extension string.
    pub buffer_device_address_supported: bool,

    /// Receives every diagnostic message. Without one, messages go to the
    /// `log` crate.
    pub message_callback: Option<MessageCallback>,

    /// Emit Info diagnostics for resource lifetime events, such as heap
    /// creation.
    pub log_buffer_lifetime: bool,

    /// Host allocation callbacks, forwarded to every native object this
    /// device creates and destroys.
    pub allocation_callbacks: Option<vk::AllocationCallbacks<'static>>,

    /// Overrides the name of the Vulkan shared library to load entry points
    /// from.
    pub library_name: Option<PathBuf>,
}

impl Default for DeviceDesc {
    fn default() -> Self {
        DeviceDesc {
            instance: vk::Instance::null(),
            physical_device: vk::PhysicalDevice::null(),
            device: vk::Device::null(),
            graphics_queue: None,
            graphics_queue_family: 0,
            compute_queue: None,
            compute_queue_family: 0,
            transfer_queue: None,
            transfer_queue_family: 0,
            instance_extensions: Vec::new(),
            device_extensions: Vec::new(),
            max_timer_queries: 256,
            buffer_device_address_supported: false,
            message_callback: None,
            log_buffer_lifetime: false,
            allocation_callbacks: None,
            library_name: None,
        }
    }
}

/// Identifies a native object owned by or supplied to a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NativeObjectType {
    Instance,
    PhysicalDevice,
    Device,
}

/// State shared between the device and the objects it hands out.
///
/// Heaps and queues keep the shared state alive so their `Drop` impls can
/// release native objects after the `Device` itself is gone.
pub(crate) struct DeviceShared {
    instance: ash::Instance,
    device: ash::Device,
    instance_handle: vk::Instance,
    physical_device: vk::PhysicalDevice,

    debug_utils: Option<ash::ext::debug_utils::Device>,
    debug_marker: Option<ash::ext::debug_marker::Device>,

    enabled_extensions: EnabledExtensions,
    physical_device_properties: vk::PhysicalDeviceProperties,
    properties: DeviceProperties,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    shading_rate_features: ShadingRateFeatures,
    cooperative_vector_features: CooperativeVectorFeatures,

    diagnostics: DiagnosticSink,
    allocation_callbacks: Option<vk::AllocationCallbacks<'static>>,
    log_buffer_lifetime: bool,
    max_timer_queries: u32,

    pipeline_cache: vk::PipelineCache,
    empty_descriptor_set_layout: vk::DescriptorSetLayout,

    // Keeps the function pointers resolved through it valid.
    _library: RuntimeLibrary,
}

// The allocation callbacks hold raw pointers. The descriptor contract makes
// the caller responsible for keeping them valid and callable from any thread
// that uses the device, matching the native API's requirements.
unsafe impl Send for DeviceShared {}
unsafe impl Sync for DeviceShared {}

impl DeviceShared {
    #[inline]
    pub(crate) fn device(&self) -> &ash::Device {
        &self.device
    }

    #[inline]
    pub(crate) fn allocation_callbacks(&self) -> Option<&vk::AllocationCallbacks<'static>> {
        self.allocation_callbacks.as_ref()
    }

    /// Attaches a debug name to a native object, if a debug extension is
    /// enabled. Prefers debug-utils, falls back to debug-marker.
    pub(crate) fn set_object_name(
        &self,
        object_type: vk::ObjectType,
        marker_type: vk::DebugReportObjectTypeEXT,
        handle: u64,
        name: &str,
    ) {
        if name.is_empty() || handle == 0 {
            return;
        }
        let name = match CString::new(name) {
            Ok(name) => name,
            Err(_) => return,
        };

        if let Some(debug_utils) = &self.debug_utils {
            let info = vk::DebugUtilsObjectNameInfoEXT {
                object_type,
                object_handle: handle,
                p_object_name: name.as_ptr(),
                ..Default::default()
            };
            let _ = unsafe { debug_utils.set_debug_utils_object_name(&info) };
        } else if let Some(debug_marker) = &self.debug_marker {
            let info = vk::DebugMarkerObjectNameInfoEXT {
                object_type: marker_type,
                object: handle,
                p_object_name: name.as_ptr(),
                ..Default::default()
            };
            let _ = unsafe { debug_marker.debug_marker_set_object_name(&info) };
        }
    }
}

impl Drop for DeviceShared {
    fn drop(&mut self) {
        unsafe {
            if self.pipeline_cache != vk::PipelineCache::null() {
                self.device
                    .destroy_pipeline_cache(self.pipeline_cache, self.allocation_callbacks());
            }
            if self.empty_descriptor_set_layout != vk::DescriptorSetLayout::null() {
                self.device.destroy_descriptor_set_layout(
                    self.empty_descriptor_set_layout,
                    self.allocation_callbacks(),
                );
            }
        }
    }
}

/// A Cobalt device implemented on Vulkan.
pub struct Device {
    shared: Arc<DeviceShared>,
    queues: [Option<Arc<Queue>>; QueueKind::COUNT],
}

impl Device {
    /// Builds a device around the native handles in the descriptor.
    pub fn new(desc: DeviceDesc) -> Result<Arc<Device>, DeviceCreationError> {
        if desc.instance == vk::Instance::null() {
            return Err(DeviceCreationError::MissingHandle("instance"));
        }
        if desc.physical_device == vk::PhysicalDevice::null() {
            return Err(DeviceCreationError::MissingHandle("physical_device"));
        }
        if desc.device == vk::Device::null() {
            return Err(DeviceCreationError::MissingHandle("device"));
        }

        let library = match &desc.library_name {
            Some(path) => unsafe { RuntimeLibrary::with_path(path) }?,
            None => RuntimeLibrary::new()?,
        };
        let instance = unsafe { ash::Instance::load(library.fns(), desc.instance) };
        let device = unsafe { ash::Device::load(instance.fp_v1_0(), desc.device) };

        let mut enabled_extensions = EnabledExtensions::from_names(
            desc.instance_extensions
                .iter()
                .map(String::as_str)
                .chain(desc.device_extensions.iter().map(String::as_str)),
        );
        if desc.buffer_device_address_supported {
            enabled_extensions.khr_buffer_device_address = true;
        }

        let diagnostics = DiagnosticSink::new(desc.message_callback.clone());

        if enabled_extensions.ext_opacity_micromap && !enabled_extensions.khr_synchronization2 {
            diagnostics.warning(
                "VK_EXT_opacity_micromap is used without VK_KHR_synchronization2, which is \
                 necessary for micromap array state transitions. Opacity micromaps will be \
                 reported as unsupported.",
            );
        }

        let (physical_device_properties, properties) = unsafe {
            properties::query_device_properties(
                &instance,
                desc.physical_device,
                &enabled_extensions,
            )
        };
        let memory_properties =
            unsafe { instance.get_physical_device_memory_properties(desc.physical_device) };

        let shading_rate_features = if enabled_extensions.khr_fragment_shading_rate {
            unsafe { properties::query_shading_rate_features(&instance, desc.physical_device) }
        } else {
            ShadingRateFeatures::default()
        };
        let cooperative_vector_features = if enabled_extensions.nv_cooperative_vector {
            unsafe {
                properties::query_cooperative_vector_features(&instance, desc.physical_device)
            }
        } else {
            CooperativeVectorFeatures::default()
        };

        let debug_utils = enabled_extensions
            .ext_debug_utils
            .then(|| ash::ext::debug_utils::Device::new(&instance, &device));
        let debug_marker = enabled_extensions
            .ext_debug_marker
            .then(|| ash::ext::debug_marker::Device::new(&instance, &device));

        let allocation_callbacks = desc.allocation_callbacks;

        let pipeline_cache = match unsafe {
            device.create_pipeline_cache(
                &vk::PipelineCacheCreateInfo::default(),
                allocation_callbacks.as_ref(),
            )
        } {
            Ok(handle) => handle,
            Err(err) => {
                diagnostics.error(&format!(
                    "failed to create the pipeline cache: {}",
                    VulkanError::from(err)
                ));
                vk::PipelineCache::null()
            }
        };

        let empty_descriptor_set_layout = match unsafe {
            device.create_descriptor_set_layout(
                &vk::DescriptorSetLayoutCreateInfo::default(),
                allocation_callbacks.as_ref(),
            )
        } {
            Ok(handle) => handle,
            Err(err) => {
                diagnostics.error(&format!(
                    "failed to create an empty descriptor set layout: {}",
                    VulkanError::from(err)
                ));
                vk::DescriptorSetLayout::null()
            }
        };

        let shared = Arc::new(DeviceShared {
            instance,
            device,
            instance_handle: desc.instance,
            physical_device: desc.physical_device,
            debug_utils,
            debug_marker,
            enabled_extensions,
            physical_device_properties,
            properties,
            memory_properties,
            shading_rate_features,
            cooperative_vector_features,
            diagnostics,
            allocation_callbacks,
            log_buffer_lifetime: desc.log_buffer_lifetime,
            max_timer_queries: desc.max_timer_queries,
            pipeline_cache,
            empty_descriptor_set_layout,
            _library: library,
        });

        let mut queues: [Option<Arc<Queue>>; QueueKind::COUNT] = [None, None, None];
        let slots = [
            (QueueKind::Graphics, desc.graphics_queue, desc.graphics_queue_family),
            (QueueKind::Compute, desc.compute_queue, desc.compute_queue_family),
            (QueueKind::Copy, desc.transfer_queue, desc.transfer_queue_family),
        ];
        for (kind, handle, family_index) in slots {
            if let Some(handle) = handle {
                let queue = Queue::new(shared.clone(), kind, handle, family_index)
                    .map_err(DeviceCreationError::QueueSetup)?;
                queues[kind.index()] = Some(queue);
            }
        }

        Ok(Arc::new(Device { shared, queues }))
    }

    /// Returns which API this device runs on.
    #[inline]
    pub fn graphics_api(&self) -> GraphicsApi {
        GraphicsApi::Vulkan
    }

    /// Returns the extension flags negotiated at construction.
    #[inline]
    pub fn enabled_extensions(&self) -> &EnabledExtensions {
        &self.shared.enabled_extensions
    }

    /// Returns the cached per-extension property blocks.
    #[inline]
    pub fn properties(&self) -> &DeviceProperties {
        &self.shared.properties
    }

    /// Returns the core properties of the physical device.
    #[inline]
    pub fn physical_device_properties(&self) -> &vk::PhysicalDeviceProperties {
        &self.shared.physical_device_properties
    }

    /// Returns the capacity reserved for timer queries.
    #[inline]
    pub fn max_timer_queries(&self) -> u32 {
        self.shared.max_timer_queries
    }

    /// Returns whether buffer lifetime events should be reported.
    #[inline]
    pub fn log_buffer_lifetime(&self) -> bool {
        self.shared.log_buffer_lifetime
    }

    /// Returns the administrative pipeline cache, or null if its creation
    /// failed.
    #[inline]
    pub fn pipeline_cache(&self) -> vk::PipelineCache {
        self.shared.pipeline_cache
    }

    /// Returns the empty descriptor-set layout used to pad pipeline layouts,
    /// or null if its creation failed.
    #[inline]
    pub fn empty_descriptor_set_layout(&self) -> vk::DescriptorSetLayout {
        self.shared.empty_descriptor_set_layout
    }

    /// Returns the raw handle of one of the device's native objects.
    pub fn native_object(&self, object_type: NativeObjectType) -> u64 {
        match object_type {
            NativeObjectType::Instance => self.shared.instance_handle.as_raw(),
            NativeObjectType::PhysicalDevice => self.shared.physical_device.as_raw(),
            NativeObjectType::Device => self.shared.device.handle().as_raw(),
        }
    }

    /// Returns the queue of the given kind, if one was supplied.
    #[inline]
    pub fn queue(&self, kind: QueueKind) -> Option<&Arc<Queue>> {
        self.queues[kind.index()].as_ref()
    }

    /// Returns the native handle of the given queue, if one was supplied.
    #[inline]
    pub fn native_queue(&self, kind: QueueKind) -> Option<vk::Queue> {
        self.queue(kind).map(|queue| queue.handle())
    }

    /// Returns the family index the given queue was created from, if one was
    /// supplied.
    #[inline]
    pub fn queue_family_index(&self, kind: QueueKind) -> Option<u32> {
        self.queue(kind).map(|queue| queue.family_index())
    }

    /// Resolves a capability from the negotiated device state.
    ///
    /// If `info` is supplied for a feature that carries a payload, the buffer
    /// length must equal the payload size exactly; otherwise the payload is
    /// not written, a diagnostic is emitted, and the returned boolean is
    /// unchanged.
    pub fn query_feature_support(&self, feature: Feature, info: Option<&mut [u8]>) -> bool {
        let view = CapabilityView {
            extensions: &self.shared.enabled_extensions,
            properties: &self.shared.properties,
            shading_rate_features: &self.shared.shading_rate_features,
            cooperative_vector_features: &self.shared.cooperative_vector_features,
            compute_queue_present: self.queues[QueueKind::Compute.index()].is_some(),
            copy_queue_present: self.queues[QueueKind::Copy.index()].is_some(),
        };

        if let Some(out) = info {
            if let Err(mismatch) = view.write_info(feature, out) {
                self.shared.diagnostics.error(&format!(
                    "query_feature_support: output buffer for {:?} is {} bytes, expected {}",
                    feature, mismatch.provided, mismatch.expected
                ));
            }
        }

        view.supports(feature)
    }

    /// Classifies the usages the current device supports for a format.
    pub fn query_format_support(&self, format: Format) -> FormatSupport {
        let props = unsafe {
            self.shared.instance.get_physical_device_format_properties(
                self.shared.physical_device,
                format.vk_format(),
            )
        };
        format::support_from_native(format, &props)
    }

    /// Allocates a device-memory heap, or returns `None` with a diagnostic.
    pub fn create_heap(&self, desc: &HeapDesc) -> Option<Arc<Heap>> {
        let required = match memory::required_memory_flags(desc.heap_type) {
            Some(flags) => flags,
            None => {
                self.shared.diagnostics.error(&format!(
                    "create_heap: unrecognized heap type {:?}",
                    desc.heap_type
                ));
                return None;
            }
        };

        // The heap is not bound to a resource yet, so any memory type with
        // the required property flags is acceptable.
        let memory_type_index =
            match memory::find_memory_type(&self.shared.memory_properties, !0u32, required) {
                Some(index) => index,
                None => {
                    self.shared.diagnostics.error(&format!(
                        "failed to find a memory type for heap '{}' with properties {:?}",
                        display_name(&desc.debug_name),
                        required
                    ));
                    return None;
                }
            };

        // Heaps may back acceleration-structure storage, which requires the
        // memory to have a device address.
        let enable_device_address = self.shared.enabled_extensions.khr_buffer_device_address;

        let memory = match memory::allocate_heap_memory(
            &self.shared,
            desc.capacity,
            memory_type_index,
            enable_device_address,
        ) {
            Ok(memory) => memory,
            Err(err) => {
                self.shared.diagnostics.error(&format!(
                    "failed to allocate memory for heap '{}': {}",
                    display_name(&desc.debug_name),
                    err
                ));
                return None;
            }
        };

        self.shared.set_object_name(
            vk::ObjectType::DEVICE_MEMORY,
            vk::DebugReportObjectTypeEXT::DEVICE_MEMORY,
            memory.as_raw(),
            &desc.debug_name,
        );

        if self.shared.log_buffer_lifetime {
            self.shared.diagnostics.info(&format!(
                "created heap '{}': {} bytes, memory type {}",
                display_name(&desc.debug_name),
                desc.capacity,
                memory_type_index
            ));
        }

        Some(Arc::new(Heap::new(
            self.shared.clone(),
            desc.clone(),
            memory,
            memory_type_index,
            true,
        )))
    }

    /// Wraps device memory allocated elsewhere. The returned heap reports
    /// the given parameters but never frees the memory.
    pub fn import_heap(&self, memory: vk::DeviceMemory, desc: &HeapDesc) -> Arc<Heap> {
        Arc::new(Heap::new(self.shared.clone(), desc.clone(), memory, 0, false))
    }

    /// Registers a caller-created native image for use with the tiling
    /// queries. The per-tile byte size is the sparse block size the driver
    /// reports as the image's memory alignment.
    pub fn import_texture(
        &self,
        image: vk::Image,
        desc: TextureDesc,
        usage: vk::ImageUsageFlags,
    ) -> Texture {
        let requirements = unsafe { self.shared.device.get_image_memory_requirements(image) };
        Texture::new(image, desc, usage, requirements.alignment.max(1))
    }

    /// Computes the sparse-tiling metadata of a texture. Each output is
    /// filled only if supplied; `subresource_tilings` is filled up to the
    /// texture's mip count.
    pub fn get_texture_tiling(
        &self,
        texture: &Texture,
        num_tiles: Option<&mut u32>,
        packed_mip_info: Option<&mut PackedMipInfo>,
        tile_shape: Option<&mut TileShape>,
        subresource_tilings: Option<&mut [SubresourceTiling]>,
    ) {
        let mut num_standard_mips = 0u32;
        let mut tile = [1u32; 3];

        if packed_mip_info.is_some() || subresource_tilings.is_some() {
            let requirements = unsafe {
                self.shared
                    .device
                    .get_image_sparse_memory_requirements(texture.handle)
            };
            if let Some(first) = requirements.first() {
                num_standard_mips = first.image_mip_tail_first_lod;
                if let Some(info) = packed_mip_info {
                    *info = image::packed_mip_info_from_requirements(
                        first,
                        texture.desc.mip_levels,
                        texture.tile_byte_size,
                    );
                }
            } else if let Some(info) = packed_mip_info {
                *info = PackedMipInfo::default();
            }
        }

        if tile_shape.is_some() || subresource_tilings.is_some() {
            let format_properties = unsafe {
                self.shared
                    .instance
                    .get_physical_device_sparse_image_format_properties(
                        self.shared.physical_device,
                        texture.desc.format.vk_format(),
                        texture.image_type,
                        texture.samples,
                        texture.usage,
                        texture.tiling,
                    )
            };
            if let Some(first) = format_properties.first() {
                tile = [
                    first.image_granularity.width,
                    first.image_granularity.height,
                    first.image_granularity.depth,
                ];
            }
            if let Some(shape) = tile_shape {
                *shape = TileShape {
                    width_in_texels: tile[0],
                    height_in_texels: tile[1],
                    depth_in_texels: tile[2],
                };
            }
        }

        if let Some(tilings) = subresource_tilings {
            let count = tilings.len().min(texture.desc.mip_levels as usize);
            image::compute_subresource_tilings(
                [texture.desc.width, texture.desc.height, texture.desc.depth],
                tile,
                num_standard_mips,
                &mut tilings[..count],
            );
        }

        if let Some(total) = num_tiles {
            let requirements = unsafe {
                self.shared
                    .device
                    .get_image_memory_requirements(texture.handle)
            };
            *total = (requirements.size / texture.tile_byte_size) as u32;
        }
    }

    /// Submits command buffers to the given queue and returns the batch's
    /// submission identifier, or `None` with a diagnostic if the queue is
    /// absent or the submission failed.
    pub fn execute_command_lists(
        &self,
        command_buffers: &[vk::CommandBuffer],
        queue_kind: QueueKind,
    ) -> Option<u64> {
        let queue = match &self.queues[queue_kind.index()] {
            Some(queue) => queue,
            None => {
                self.shared.diagnostics.error(&format!(
                    "execute_command_lists: no {:?} queue was supplied at device creation",
                    queue_kind
                ));
                return None;
            }
        };

        match queue.submit(command_buffers) {
            Ok(submission_id) => Some(submission_id),
            Err(err) => {
                self.shared.diagnostics.error(&format!(
                    "submission to the {:?} queue failed: {}",
                    queue_kind, err
                ));
                None
            }
        }
    }

    /// Retires completed submissions on every populated queue, making their
    /// command buffers reclaimable through
    /// [`Queue::take_retired_command_buffers`].
    pub fn run_garbage_collection(&self) {
        for queue in self.queues.iter().flatten() {
            if let Err(err) = queue.retire_completed() {
                self.shared.diagnostics.error(&format!(
                    "failed to poll the {:?} queue for completed submissions: {}",
                    queue.kind(),
                    err
                ));
            }
        }
    }

    /// Blocks until all queued work on the device has completed.
    ///
    /// Returns `false` if the device was lost (or the wait failed otherwise);
    /// the condition is reported through the diagnostic channel.
    pub fn wait_for_idle(&self) -> bool {
        match unsafe { self.shared.device.device_wait_idle() } {
            Ok(()) => true,
            Err(vk::Result::ERROR_DEVICE_LOST) => {
                self.shared
                    .diagnostics
                    .error("device loss detected while waiting for idle");
                false
            }
            Err(err) => {
                self.shared.diagnostics.error(&format!(
                    "vkDeviceWaitIdle failed: {}",
                    VulkanError::from(err)
                ));
                false
            }
        }
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Vulkan device {:?}>", self.shared.device.handle())
    }
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "<unnamed>"
    } else {
        name
    }
}

/// Error that can be returned when creating a device.
#[derive(Debug)]
pub enum DeviceCreationError {
    /// The Vulkan shared library could not be loaded.
    LibraryLoad(LoadingError),
    /// A required native handle in the descriptor was null.
    MissingHandle(&'static str),
    /// A queue's tracking semaphore could not be created.
    QueueSetup(VulkanError),
}

impl Error for DeviceCreationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DeviceCreationError::LibraryLoad(err) => Some(err),
            DeviceCreationError::QueueSetup(err) => Some(err),
            DeviceCreationError::MissingHandle(_) => None,
        }
    }
}

impl fmt::Display for DeviceCreationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceCreationError::LibraryLoad(_) => {
                write!(f, "the Vulkan shared library could not be loaded")
            }
            DeviceCreationError::MissingHandle(handle) => {
                write!(f, "the descriptor is missing the required {} handle", handle)
            }
            DeviceCreationError::QueueSetup(err) => {
                write!(f, "a queue tracking semaphore could not be created: {}", err)
            }
        }
    }
}

impl From<LoadingError> for DeviceCreationError {
    fn from(err: LoadingError) -> Self {
        DeviceCreationError::LibraryLoad(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_descriptor_has_empty_queue_slots() {
        let desc = DeviceDesc::default();
        assert!(desc.graphics_queue.is_none());
        assert!(desc.compute_queue.is_none());
        assert!(desc.transfer_queue.is_none());
        assert_eq!(desc.max_timer_queries, 256);
    }

    #[test]
    fn null_handles_are_rejected_by_name() {
        match Device::new(DeviceDesc::default()) {
            Err(DeviceCreationError::MissingHandle("instance")) => (),
            _ => panic!(),
        }
    }

    #[test]
    fn creation_error_display_names_the_handle() {
        let err = DeviceCreationError::MissingHandle("physical_device");
        assert!(format!("{}", err).contains("physical_device"));
    }
}
