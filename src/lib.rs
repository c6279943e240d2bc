// SPDX-License-Identifier: MPL-2.0

//! Camera session core
//!
//! The reusable core of a phone camera application: it negotiates stream
//! sizes and rotation against the sensor, and runs the capture state machine
//! that serializes preview, focus-lock-then-capture and video recording on a
//! single camera device.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`stream`]: Size negotiation, rotation and the per-open stream plan
//! - [`session`]: Capture state machine, controller, worker thread and the
//!   [`CameraSession`](session::CameraSession) facade
//! - [`backends`]: Collaborator traits and the virtual camera backend
//! - [`storage`]: Where stills and recordings are written
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```ignore
//! let (parts, _control) = virtual_parts(VirtualProfile::default(), Box::new(storage));
//! let mut session = CameraSession::open(
//!     parts,
//!     &DisplayRotation::Rot0,
//!     SessionOptions::new(Resolution::new(1080, 1920)?),
//! )?;
//! session.lock_focus()?;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod session;
pub mod storage;
pub mod stream;

// Re-export commonly used types
pub use config::Config;
pub use errors::{CaptureStage, CoreError, CoreResult};
pub use session::{CameraSession, CaptureState, Notification, SessionOptions};
pub use stream::StreamPlan;
