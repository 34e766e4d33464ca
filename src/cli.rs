// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands that run without the terminal preview
//!
//! - Headless scanning, printing each reported code
//! - Decoding a still image

use qr_scanner::app::frame_processor::tasks::enhancer::enhance_image;
use qr_scanner::app::{
    QrDetector, ScanEvent, ScanReceivers, ScanSession, SessionOutputs, SessionState,
    SymbolDecoder, scan_channels,
};
use qr_scanner::backends::camera::V4l2Backend;
use qr_scanner::backends::camera::types::CameraFrame;
use qr_scanner::config::Config;
use qr_scanner::errors::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Scan from the configured camera until Ctrl+C (or the first code with `once`)
///
/// Payloads are printed to stdout, one per line; status goes to stderr.
pub fn scan(config: &Config, once: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (channels, receivers) = scan_channels(config.viewport_width, config.viewport_height);
    let ScanReceivers { mut events, frames } = receivers;
    // No preview in headless mode; a closed frame channel skips the resize
    drop(frames);

    let session = Arc::new(ScanSession::new(
        config.session_config(),
        Arc::new(V4l2Backend::default()),
        Arc::new(QrDetector::new()),
        SessionOutputs::shared(Arc::new(channels)),
    ));

    let handler_session = Arc::clone(&session);
    ctrlc::set_handler(move || {
        info!("Interrupted, stopping scan");
        handler_session.stop();
    })?;

    if !session.start() {
        return Err(format!("session could not start (state: {})", session.state()).into());
    }

    let mut failure: Option<String> = None;
    let mut reported = 0usize;

    while let Some(event) = events.blocking_recv() {
        match event {
            ScanEvent::Result(result) => {
                reported += 1;
                println!("{}", result.text());
                if once {
                    session.stop();
                }
            }
            ScanEvent::Status(message) => eprintln!("{}", message),
            ScanEvent::State(SessionState::Failed(reason)) => failure = Some(reason),
            ScanEvent::State(SessionState::Idle) => break,
            ScanEvent::State(state) => debug!(%state, "Session state"),
        }
    }

    session.stop();
    info!(reported, "Scan finished");

    match failure {
        Some(reason) => Err(reason.into()),
        None => Ok(()),
    }
}

/// Decode every QR code in an image file and print the payloads
///
/// The image goes through the same enhancement and decoder as live frames.
pub fn decode_image(path: &Path, config: &Config) -> AppResult<usize> {
    let mut image = image::open(path)?.to_rgb8();
    info!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "Loaded image"
    );

    enhance_image(&mut image, config.enhancement());
    let frame = CameraFrame::from_rgb_image(image, Instant::now());

    let symbols = QrDetector::new().decode(&frame);
    if symbols.is_empty() {
        return Err(AppError::Other(format!(
            "no QR code found in {}",
            path.display()
        )));
    }

    for symbol in &symbols {
        println!(
            "{}: {}",
            symbol.symbology,
            String::from_utf8_lossy(&symbol.payload)
        );
    }

    Ok(symbols.len())
}
