// SPDX-License-Identifier: GPL-3.0-only

//! Stream negotiation
//!
//! Pure functions deciding how a camera's outputs are sized and rotated:
//!
//! - [`size`]: pick an output resolution for a target surface
//! - [`rotation`]: combine sensor mounting and display rotation
//! - [`plan`]: the immutable [`StreamPlan`] built from both per camera open

pub mod plan;
pub mod rotation;
pub mod size;

pub use plan::StreamPlan;
