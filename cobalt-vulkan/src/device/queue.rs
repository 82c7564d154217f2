// Copyright (c) 2024 the Cobalt developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Command queues and submission tracking.
//!
//! Each populated queue slot wraps a caller-supplied `vk::Queue` together with
//! a timeline semaphore that the queue signals with the submission identifier
//! of every batch. Submission identifiers are strictly increasing per queue,
//! never reused, and independent between queue kinds. Comparing the
//! semaphore's counter value against the recorded identifiers tells which
//! submissions have completed, which drives command-buffer retirement.
//!
//! Callers must externally serialize submission and retirement per device; the
//! per-queue mutex only provides the interior mutability that a `&self` API
//! requires, it is not a concurrency contract.

use super::DeviceShared;
use crate::error::VulkanError;
use ash::vk;
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::os::raw::c_void;
use std::sync::Arc;

/// The three kinds of command queue a device can expose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueKind {
    Graphics,
    Compute,
    Copy,
}

impl QueueKind {
    pub(crate) const COUNT: usize = 3;

    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            QueueKind::Graphics => 0,
            QueueKind::Compute => 1,
            QueueKind::Copy => 2,
        }
    }
}

struct SubmittedBatch {
    submission_id: u64,
    command_buffers: SmallVec<[vk::CommandBuffer; 4]>,
}

#[derive(Default)]
struct QueueState {
    last_submitted_id: u64,
    last_finished_id: u64,
    in_flight: VecDeque<SubmittedBatch>,
    retired: Vec<vk::CommandBuffer>,
}

impl QueueState {
    fn next_submission_id(&self) -> u64 {
        self.last_submitted_id + 1
    }

    /// Records the semaphore counter value and retires every batch whose
    /// identifier it covers. The finished mark never moves backwards.
    fn retire_up_to(&mut self, finished: u64) {
        if finished > self.last_finished_id {
            self.last_finished_id = finished;
        }
        while let Some(batch) = self.in_flight.front() {
            if batch.submission_id > self.last_finished_id {
                break;
            }
            let batch = self.in_flight.pop_front().unwrap();
            self.retired.extend(batch.command_buffers);
        }
    }
}

/// A command queue owned by the device, wrapping a caller-supplied handle.
pub struct Queue {
    shared: Arc<DeviceShared>,
    kind: QueueKind,
    handle: vk::Queue,
    family_index: u32,
    tracking_semaphore: vk::Semaphore,
    state: Mutex<QueueState>,
}

impl Queue {
    pub(crate) fn new(
        shared: Arc<DeviceShared>,
        kind: QueueKind,
        handle: vk::Queue,
        family_index: u32,
    ) -> Result<Arc<Queue>, VulkanError> {
        let mut type_info = vk::SemaphoreTypeCreateInfo {
            semaphore_type: vk::SemaphoreType::TIMELINE,
            initial_value: 0,
            ..Default::default()
        };
        let create_info = vk::SemaphoreCreateInfo {
            p_next: &mut type_info as *mut _ as *const c_void,
            ..Default::default()
        };

        let tracking_semaphore = unsafe {
            shared
                .device()
                .create_semaphore(&create_info, shared.allocation_callbacks())
        }
        .map_err(VulkanError::from)?;

        Ok(Arc::new(Queue {
            shared,
            kind,
            handle,
            family_index,
            tracking_semaphore,
            state: Mutex::new(QueueState::default()),
        }))
    }

    /// Returns the kind of this queue.
    #[inline]
    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    /// Returns the native queue handle.
    #[inline]
    pub fn handle(&self) -> vk::Queue {
        self.handle
    }

    /// Returns the queue family index the handle was created from.
    #[inline]
    pub fn family_index(&self) -> u32 {
        self.family_index
    }

    /// Returns the identifier of the most recent submission, or 0 if nothing
    /// has been submitted yet.
    #[inline]
    pub fn last_submitted_id(&self) -> u64 {
        self.state.lock().last_submitted_id
    }

    /// Returns the identifier of the most recent submission known to have
    /// completed on the device.
    #[inline]
    pub fn last_finished_id(&self) -> u64 {
        self.state.lock().last_finished_id
    }

    /// Submits a batch of command buffers and returns its submission
    /// identifier.
    ///
    /// The identifier is signaled on the queue's timeline semaphore when the
    /// batch finishes executing.
    pub fn submit(&self, command_buffers: &[vk::CommandBuffer]) -> Result<u64, VulkanError> {
        let mut state = self.state.lock();
        let submission_id = state.next_submission_id();

        let timeline_info = vk::TimelineSemaphoreSubmitInfo {
            signal_semaphore_value_count: 1,
            p_signal_semaphore_values: &submission_id,
            ..Default::default()
        };
        let submit_info = vk::SubmitInfo {
            p_next: &timeline_info as *const _ as *const c_void,
            command_buffer_count: command_buffers.len() as u32,
            p_command_buffers: command_buffers.as_ptr(),
            signal_semaphore_count: 1,
            p_signal_semaphores: &self.tracking_semaphore,
            ..Default::default()
        };

        unsafe {
            self.shared
                .device()
                .queue_submit(self.handle, &[submit_info], vk::Fence::null())
        }
        .map_err(VulkanError::from)?;

        state.last_submitted_id = submission_id;
        state.in_flight.push_back(SubmittedBatch {
            submission_id,
            command_buffers: SmallVec::from_slice(command_buffers),
        });

        Ok(submission_id)
    }

    /// Queries the tracking semaphore and retires every submission that has
    /// completed, moving its command buffers to the retired list.
    pub fn retire_completed(&self) -> Result<(), VulkanError> {
        let finished = unsafe {
            self.shared
                .device()
                .get_semaphore_counter_value(self.tracking_semaphore)
        }
        .map_err(VulkanError::from)?;

        self.state.lock().retire_up_to(finished);
        Ok(())
    }

    /// Drains the command buffers of retired submissions, so the external
    /// recorder can return them to its pools.
    pub fn take_retired_command_buffers(&self) -> Vec<vk::CommandBuffer> {
        std::mem::take(&mut self.state.lock().retired)
    }
}

impl Drop for Queue {
    fn drop(&mut self) {
        unsafe {
            self.shared
                .device()
                .destroy_semaphore(self.tracking_semaphore, self.shared.allocation_callbacks());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(submission_id: u64, count: usize) -> SubmittedBatch {
        SubmittedBatch {
            submission_id,
            command_buffers: (0..count).map(|_| vk::CommandBuffer::null()).collect(),
        }
    }

    #[test]
    fn submission_ids_are_strictly_increasing_from_one() {
        let mut state = QueueState::default();
        assert_eq!(state.next_submission_id(), 1);
        state.last_submitted_id = state.next_submission_id();
        assert_eq!(state.next_submission_id(), 2);
        state.last_submitted_id = state.next_submission_id();
        assert_eq!(state.next_submission_id(), 3);
    }

    #[test]
    fn retirement_moves_completed_batches_in_order() {
        let mut state = QueueState::default();
        state.in_flight.push_back(batch(1, 2));
        state.in_flight.push_back(batch(2, 1));
        state.in_flight.push_back(batch(3, 1));
        state.last_submitted_id = 3;

        state.retire_up_to(2);
        assert_eq!(state.last_finished_id, 2);
        assert_eq!(state.retired.len(), 3);
        assert_eq!(state.in_flight.len(), 1);
        assert_eq!(state.in_flight.front().unwrap().submission_id, 3);
    }

    #[test]
    fn finished_mark_never_regresses() {
        let mut state = QueueState::default();
        state.retire_up_to(5);
        state.retire_up_to(3);
        assert_eq!(state.last_finished_id, 5);
    }

    #[test]
    fn queue_kinds_have_distinct_slots() {
        let mut seen = [false; QueueKind::COUNT];
        for kind in [QueueKind::Graphics, QueueKind::Compute, QueueKind::Copy] {
            assert!(!seen[kind.index()]);
            seen[kind.index()] = true;
        }
        assert!(seen.iter().all(|&present| present));
    }
}
