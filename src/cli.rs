// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands driving the virtual camera
//!
//! This module provides command-line functionality for:
//! - Listing the cameras of a device profile
//! - Showing the negotiated stream plan
//! - Taking photos
//! - Recording videos

use camera_session::backends::camera::{DisplayRotation, RecordingRequest, Resolution};
use camera_session::backends::virtual_camera::{VirtualProfile, virtual_parts};
use camera_session::config::Config;
use camera_session::constants::CLI_NOTIFICATION_TIMEOUT;
use camera_session::session::{CameraSession, CaptureState, Notification, SessionOptions};
use camera_session::storage::MediaStorage;
use camera_session::stream::StreamPlan;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;

/// Simulated device the commands run against
pub struct DeviceArgs {
    /// JSON device profile; the built-in phone profile when absent
    pub profile: Option<PathBuf>,
    pub rotation: DisplayRotation,
    /// Preview surface size in display orientation
    pub surface: Resolution,
}

impl DeviceArgs {
    fn load_profile(&self) -> Result<VirtualProfile, Box<dyn std::error::Error>> {
        match &self.profile {
            Some(path) => Ok(VirtualProfile::load(path)?),
            None => Ok(VirtualProfile::default()),
        }
    }
}

/// List all cameras of the profile
pub fn list_cameras(device: &DeviceArgs) -> Result<(), Box<dyn std::error::Error>> {
    let profile = device.load_profile()?;

    if profile.cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in profile.cameras.iter().enumerate() {
        println!(
            "  [{}] camera {} ({}, sensor {}°)",
            index, camera.id, camera.facing, camera.sensor_orientation
        );
        print_sizes("Preview", &camera.preview_sizes);
        print_sizes("Video", &camera.video_sizes);
        print_sizes("Still", &camera.still_sizes);
        println!();
    }

    Ok(())
}

fn print_sizes(label: &str, sizes: &[Resolution]) {
    if sizes.is_empty() {
        return;
    }
    let sizes: Vec<String> = sizes.iter().map(|s| s.to_string()).collect();
    println!("      {}: {}", label, sizes.join(", "));
}

/// Negotiate and print the stream plan
pub fn show_plan(device: &DeviceArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let profile = device.load_profile()?;
    let plan = StreamPlan::build(&profile.cameras, device.surface, &device.rotation)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("Camera:   {}", plan.camera_id);
    println!("Rotation: {}", plan.rotation);
    println!(
        "Preview:  {} (displayed as {})",
        plan.preview_size,
        plan.display_preview_size()
    );
    println!("Video:    {}", describe(plan.video_size));
    println!("Still:    {}", describe(plan.still_size));
    Ok(())
}

fn describe(size: Option<Resolution>) -> String {
    size.map(|s| s.to_string())
        .unwrap_or_else(|| "not supported".to_string())
}

/// Lock focus and take one photo
pub fn take_photo(
    device: &DeviceArgs,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let storage = match output {
        Some(dir) => MediaStorage::new(dir, config.video_dir()),
        None => MediaStorage::from_config(&config),
    };

    let (mut session, mut notifications) = open_session(device, &config, storage)?;
    let rt = runtime()?;

    rt.block_on(wait_for_preview(&mut notifications))?;
    println!("Capturing...");
    session.lock_focus()?;

    let path = rt.block_on(wait_for(&mut notifications, |n| match n {
        Notification::StillSaved(path) => Some(path.clone()),
        _ => None,
    }))?;
    session.close();

    println!("Photo saved: {}", path.display());
    Ok(())
}

/// Record a video for `duration` seconds or until Ctrl+C
pub fn record_video(
    device: &DeviceArgs,
    duration: u64,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let storage = MediaStorage::from_config(&config);

    let output_path = match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            path
        }
        None => storage.next_video_path()?,
    };

    let (mut session, mut notifications) = open_session(device, &config, storage)?;
    let rt = runtime()?;

    rt.block_on(wait_for_preview(&mut notifications))?;

    println!("Output: {}", output_path.display());
    println!("Duration: {} seconds", duration);
    session.start_recording(RecordingRequest::new(output_path))?;
    rt.block_on(wait_for(&mut notifications, |n| match n {
        Notification::RecordingStarted(path) => Some(path.clone()),
        _ => None,
    }))?;

    println!();
    println!("Recording... (press Ctrl+C to stop early)");

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    let start = Instant::now();
    let target_duration = Duration::from_secs(duration);

    while start.elapsed() < target_duration {
        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }
        if session.state() != CaptureState::Recording {
            break;
        }

        let elapsed = start.elapsed().as_secs();
        print!("\rRecording: {:02}:{:02}", elapsed / 60, elapsed % 60);
        std::io::Write::flush(&mut std::io::stdout())?;

        std::thread::sleep(Duration::from_millis(100));
    }
    println!();

    session.stop_recording()?;
    let final_path = rt.block_on(wait_for(&mut notifications, |n| match n {
        Notification::RecordingSaved(path) => Some(path.clone()),
        _ => None,
    }))?;
    session.close();

    println!("Video saved: {}", final_path.display());
    Ok(())
}

fn open_session(
    device: &DeviceArgs,
    config: &Config,
    storage: MediaStorage,
) -> Result<(CameraSession, UnboundedReceiver<Notification>), Box<dyn std::error::Error>> {
    let profile = device.load_profile()?;
    let (parts, _control) = virtual_parts(profile, Box::new(storage));
    let options = SessionOptions {
        recorder: config.recorder,
        ..SessionOptions::new(device.surface)
    };
    let mut session = CameraSession::open(parts, &device.rotation, options)?;
    let notifications = session
        .take_notifications()
        .ok_or("Notifications already taken")?;

    let plan = session.plan();
    println!("Using camera: {}", plan.camera_id);
    println!(
        "Preview: {}  Rotation: {}",
        plan.preview_size, plan.rotation
    );
    Ok((session, notifications))
}

fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
}

async fn wait_for_preview(
    notifications: &mut UnboundedReceiver<Notification>,
) -> Result<(), Box<dyn std::error::Error>> {
    wait_for(notifications, |n| {
        matches!(n, Notification::PreviewStarted).then_some(())
    })
    .await
}

/// Wait until `pick` accepts a notification
///
/// Fails on the first `Failed` notification or after
/// [`CLI_NOTIFICATION_TIMEOUT`] without a match.
async fn wait_for<T>(
    notifications: &mut UnboundedReceiver<Notification>,
    mut pick: impl FnMut(&Notification) -> Option<T>,
) -> Result<T, Box<dyn std::error::Error>> {
    let deadline = tokio::time::Instant::now() + CLI_NOTIFICATION_TIMEOUT;
    loop {
        let notification = tokio::time::timeout_at(deadline, notifications.recv())
            .await
            .map_err(|_| "Timed out waiting for the camera")?
            .ok_or("Camera worker stopped")?;

        if let Notification::Failed(err) = &notification {
            return Err(err.clone().into());
        }
        if let Some(value) = pick(&notification) {
            return Ok(value);
        }
    }
}
