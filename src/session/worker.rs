// SPDX-License-Identifier: GPL-3.0-only

//! Camera worker thread
//!
//! Every hardware callback, UI intent and still-save job runs on one named
//! background thread, one at a time, in arrival order. The thread owns the
//! controller and through it the camera device and its session.

use super::controller::{CaptureSessionController, Intent};
use crate::backends::camera::{HardwareEvent, StillImage};
use crate::constants::WORKER_THREAD_NAME;
use crate::errors::{CaptureStage, CoreError, CoreResult};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Unit of work for the camera worker
#[derive(Debug)]
pub enum Job {
    /// Open the planned camera device
    Open,
    /// Callback from the hardware
    Hardware(HardwareEvent),
    /// Request from the UI
    Intent(Intent),
    /// Write a still image and release its buffer
    SaveStill(StillImage),
    /// Tear everything down and exit the thread
    Shutdown,
}

/// Handle to the running worker thread
pub struct CameraWorker {
    jobs: mpsc::Sender<Job>,
    thread_handle: Option<JoinHandle<()>>,
    name: String,
}

impl CameraWorker {
    /// Start the worker thread
    ///
    /// # Arguments
    /// * `controller` - Moved onto the thread; tears down when the thread exits
    /// * `receiver` - Job queue the thread drains
    /// * `sender` - Sending side of the same queue, kept for [`CameraWorker::submit`]
    pub fn spawn(
        mut controller: CaptureSessionController,
        receiver: mpsc::Receiver<Job>,
        sender: mpsc::Sender<Job>,
    ) -> CoreResult<Self> {
        let name = WORKER_THREAD_NAME.to_string();
        info!(name = %name, "Starting camera worker");

        let thread_name = name.clone();
        let thread_handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                debug!(name = %thread_name, "Camera worker started");
                for job in receiver.iter() {
                    if matches!(job, Job::Shutdown) {
                        debug!(name = %thread_name, "Shutdown requested");
                        break;
                    }
                    controller.handle(job);
                }
                for job in receiver.try_iter() {
                    controller.finish_pending(job);
                }
                controller.teardown();
                info!(name = %thread_name, "Camera worker exiting");
            })
            .map_err(|e| CoreError::capture(CaptureStage::Worker, e.to_string()))?;

        Ok(Self {
            jobs: sender,
            thread_handle: Some(thread_handle),
            name,
        })
    }

    /// Queue a job behind everything already submitted
    pub fn submit(&self, job: Job) -> CoreResult<()> {
        if self.thread_handle.is_none() {
            return Err(CoreError::capture(
                CaptureStage::Worker,
                "camera worker was shut down",
            ));
        }
        self.jobs
            .send(job)
            .map_err(|_| CoreError::capture(CaptureStage::Worker, "camera worker is not running"))
    }

    /// Check if the worker thread is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Tear down the camera and wait for the thread to finish
    ///
    /// Calling this more than once is a no-op.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.thread_handle.take() else {
            return;
        };
        debug!(name = %self.name, "Stopping camera worker");
        if self.jobs.send(Job::Shutdown).is_err() {
            debug!(name = %self.name, "Camera worker already gone");
        }
        if let Err(e) = handle.join() {
            warn!(name = %self.name, "Camera worker panicked: {:?}", e);
        } else {
            debug!(name = %self.name, "Camera worker finished");
        }
    }
}

impl Drop for CameraWorker {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "CameraWorker dropped, shutting down");
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for CameraWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraWorker")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::DisplayRotation;
    use crate::backends::virtual_camera::{VirtualProfile, virtual_parts};
    use crate::config::RecorderSettings;
    use crate::session::notify::{Notification, Notifier};
    use crate::storage::MediaStorage;
    use crate::stream::StreamPlan;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn controller(
        storage: &MediaStorage,
        jobs: mpsc::Sender<Job>,
    ) -> (
        CaptureSessionController,
        tokio::sync::mpsc::UnboundedReceiver<Notification>,
    ) {
        let (parts, _control) = virtual_parts(VirtualProfile::default(), Box::new(storage.clone()));
        let cameras = parts.hardware.cameras().unwrap();
        let surface = crate::backends::camera::Resolution::new(1080, 1920).unwrap();
        let plan = StreamPlan::build(&cameras, surface, &DisplayRotation::Rot0).unwrap();
        let (notifier, _state, events) = Notifier::channel();
        let controller = CaptureSessionController::new(
            plan,
            parts,
            RecorderSettings::default(),
            None,
            notifier,
            jobs,
        );
        (controller, events)
    }

    #[test]
    fn test_still_queued_before_shutdown_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path().join("pictures"), dir.path().join("videos"));
        let (tx, rx) = mpsc::channel();
        let (controller, mut events) = controller(&storage, tx.clone());

        let released = Arc::new(AtomicBool::new(false));
        let flag = released.clone();
        let image = StillImage::new(2, 2, vec![0xff, 0xd8, 0xff, 0xd9])
            .with_release(move || flag.store(true, Ordering::SeqCst));
        tx.send(Job::Hardware(HardwareEvent::StillImageAvailable(image)))
            .unwrap();
        tx.send(Job::Shutdown).unwrap();

        let mut worker = CameraWorker::spawn(controller, rx, tx).unwrap();
        worker.shutdown();

        assert!(released.load(Ordering::SeqCst));
        let saved: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
            .filter_map(|n| match n {
                Notification::StillSaved(path) => Some(path),
                _ => None,
            })
            .collect();
        assert_eq!(saved.len(), 1);
        assert_eq!(std::fs::read(&saved[0]).unwrap(), vec![0xff, 0xd8, 0xff, 0xd9]);
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path(), dir.path());
        let (tx, rx) = mpsc::channel();
        let (controller, _events) = controller(&storage, tx.clone());

        let mut worker = CameraWorker::spawn(controller, rx, tx).unwrap();
        assert!(worker.is_running());
        worker.shutdown();
        worker.shutdown();

        assert!(!worker.is_running());
        assert_eq!(
            worker.submit(Job::Open).unwrap_err().stage(),
            Some(CaptureStage::Worker)
        );
    }
}
