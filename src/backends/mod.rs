// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera hardware
//!
//! The session core only sees the traits in [`camera`]. Platform camera
//! stacks implement them; [`virtual_camera`] implements them in-process for
//! the CLI and tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               Session Layer                 │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                  │
//! │  ┌──────────────────────────────────────┐   │
//! │  │ camera: CameraHardware, RecorderSink │   │
//! │  │         FileSink, DisplayRotation    │   │
//! │  └──────────────────────────────────────┘   │
//! │  ┌──────────────────────────────────────┐   │
//! │  │ virtual_camera: simulated device     │   │
//! │  └──────────────────────────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```

pub mod camera;
pub mod virtual_camera;
