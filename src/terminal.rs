// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based scanner preview
//!
//! Renders the annotated camera feed to the terminal using Unicode
//! half-block characters for improved vertical resolution, with the last
//! scan result, the enhancement settings and a status bar underneath.

use crate::app::events::{ScanEvent, ScanReceivers, SessionOutputs, StatusLevel, StatusMessage};
use crate::app::frame_processor::settings::EnhancementSettings;
use crate::app::frame_processor::tasks::qr_detector::QrDetector;
use crate::app::frame_processor::types::ScanResult;
use crate::app::session::{ScanSession, SessionState};
use crate::app::scan_channels;
use crate::backends::camera::V4l2Backend;
use crate::config::Config;
use crate::constants::enhancement;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::RgbImage;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Run the terminal scanner
///
/// Settings changed with the keyboard are written back to the config file
/// on exit (to `config_path` when given, else the default location).
pub fn run(config: Config, config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let settings = result?;
    let updated = Config {
        brightness: settings.brightness,
        contrast: settings.contrast,
        ..config
    };
    let saved = match &config_path {
        Some(path) => updated.save_to(path),
        None => updated.save(),
    };
    if let Err(e) = saved {
        warn!(error = %e, "Failed to save settings");
    }

    Ok(())
}

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq)]
enum KeyAction {
    ToggleScan,
    Brightness(f32),
    Contrast(f32),
    Quit,
}

fn key_action(code: KeyCode, modifiers: KeyModifiers) -> Option<KeyAction> {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(KeyAction::Quit),
        KeyCode::Char('q') | KeyCode::Esc => Some(KeyAction::Quit),
        KeyCode::Char('s') | KeyCode::Char(' ') => Some(KeyAction::ToggleScan),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(KeyAction::Brightness(enhancement::STEP)),
        KeyCode::Char('-') => Some(KeyAction::Brightness(-enhancement::STEP)),
        KeyCode::Char(']') => Some(KeyAction::Contrast(enhancement::STEP)),
        KeyCode::Char('[') => Some(KeyAction::Contrast(-enhancement::STEP)),
        _ => None,
    }
}

/// Presenter state, updated only from [`ScanEvent`]s and key presses
struct TerminalApp {
    session: ScanSession,
    receivers: ScanReceivers,
    frame_widget: FrameWidget,
    status: StatusMessage,
    state: SessionState,
    last_result: Option<ScanResult>,
    settings: EnhancementSettings,
}

impl TerminalApp {
    fn new(config: &Config) -> Self {
        let (channels, receivers) = scan_channels(config.viewport_width, config.viewport_height);
        let session = ScanSession::new(
            config.session_config(),
            Arc::new(V4l2Backend::default()),
            Arc::new(QrDetector::new()),
            SessionOutputs::shared(Arc::new(channels)),
        );
        let settings = session.settings();
        Self {
            session,
            receivers,
            frame_widget: FrameWidget::new(),
            status: StatusMessage::ready(),
            state: SessionState::Idle,
            last_result: None,
            settings,
        }
    }

    /// Drain everything the capture thread has sent since the last draw
    fn poll_events(&mut self) {
        while let Ok(event) = self.receivers.events.try_recv() {
            match event {
                ScanEvent::State(state) => self.state = state,
                ScanEvent::Status(message) => self.status = message,
                ScanEvent::Result(result) => {
                    info!(symbol_type = %result.symbol_type, "Result received");
                    self.last_result = Some(result);
                }
            }
        }
        // Only the newest preview frame matters
        while let Ok(image) = self.receivers.frames.try_recv() {
            self.frame_widget.update_frame(image);
        }
    }

    /// Returns false when the app should exit
    fn handle(&mut self, action: KeyAction) -> bool {
        match action {
            KeyAction::Quit => return false,
            KeyAction::ToggleScan => {
                if self.session.state().is_active() {
                    self.session.stop();
                } else {
                    self.frame_widget = FrameWidget::new();
                    self.session.start();
                }
            }
            KeyAction::Brightness(delta) => {
                self.settings = self.settings.adjust_brightness(delta);
                self.session.update_settings(self.settings);
            }
            KeyAction::Contrast(delta) => {
                self.settings = self.settings.adjust_contrast(delta);
                self.session.update_settings(self.settings);
            }
        }
        true
    }

    fn settings_line(&self) -> String {
        format!(
            "Brightness {:.1} ('+'/'-') | Contrast {:.1} (']'/'[') | 's' start/stop | 'q' quit | {}",
            self.settings.brightness, self.settings.contrast, self.state
        )
    }

    fn result_line(&self) -> String {
        match &self.last_result {
            Some(result) => format!(
                "[{} {}] {}",
                result.symbol_type,
                result.detected_at.format("%H:%M:%S"),
                result.text().replace(['\n', '\r'], " ")
            ),
            None => "No QR code scanned yet".to_string(),
        }
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &Config,
) -> Result<EnhancementSettings, Box<dyn std::error::Error>> {
    let mut app = TerminalApp::new(config);
    app.session.start();

    loop {
        app.poll_events();

        // Draw
        terminal.draw(|f| {
            let area = f.area();

            // Reserve the bottom three lines for result, settings and status
            let reserved = area.height.min(3);
            let camera_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height - reserved,
            };
            f.render_widget(&app.frame_widget, camera_area);

            let line = |offset: u16| Rect {
                x: area.x,
                y: area.y + area.height.saturating_sub(offset),
                width: area.width,
                height: area.height.min(1),
            };

            f.render_widget(
                TextLine {
                    text: &app.result_line(),
                    style: Style::default().fg(Color::White),
                },
                line(3),
            );
            f.render_widget(
                TextLine {
                    text: &app.settings_line(),
                    style: Style::default().fg(Color::Gray),
                },
                line(2),
            );
            f.render_widget(StatusBar { message: &app.status }, line(1));
        })?;

        // Handle input with timeout for frame updates
        if event::poll(Duration::from_millis(16))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && let Some(action) = key_action(key.code, key.modifiers)
            && !app.handle(action)
        {
            break;
        }
    }

    app.session.stop();
    Ok(app.settings)
}

/// Widget that renders an RGB frame using half-block characters
struct FrameWidget {
    frame: Option<RgbImage>,
}

impl FrameWidget {
    fn new() -> Self {
        Self { frame: None }
    }

    fn update_frame(&mut self, frame: RgbImage) {
        self.frame = Some(frame);
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame.as_ref().filter(|f| f.width() > 0 && f.height() > 0) else {
            // No frame yet - show placeholder
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        let (display_width, display_height) =
            display_size(frame.width(), frame.height(), area.width, area.height);
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        // Scale factors
        let x_scale = frame.width() as f64 / display_width as f64;
        let y_scale = frame.height() as f64 / (display_height as f64 * 2.0);

        // Each terminal cell shows two vertical pixels: upper half (▀) in fg,
        // lower half in bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(sample_pixel(frame, src_x, src_y_top));
                    cell.set_bg(sample_pixel(frame, src_x, src_y_bottom));
                }
            }
        }
    }
}

/// Cells needed to show a `width` x `height` frame inside `cols` x `rows`
/// cells, keeping aspect ratio (each cell is two pixels tall)
fn display_size(width: u32, height: u32, cols: u16, rows: u16) -> (u16, u16) {
    let term_width = cols as f64;
    let term_height = rows as f64 * 2.0;

    if term_width * height as f64 > term_height * width as f64 {
        // Terminal is wider - fit to height
        let w = term_height * width as f64 / height as f64;
        (w as u16, rows)
    } else {
        // Terminal is taller - fit to width
        let h = term_width * height as f64 / width as f64;
        (cols, (h / 2.0) as u16)
    }
}

fn sample_pixel(frame: &RgbImage, x: u32, y: u32) -> Color {
    let x = x.min(frame.width() - 1);
    let y = y.min(frame.height() - 1);
    let [r, g, b] = frame.get_pixel(x, y).0;
    Color::Rgb(r, g, b)
}

/// Truncate to at most `max` characters
fn fit_text(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Single line of plain text
struct TextLine<'a> {
    text: &'a str,
    style: Style,
}

impl Widget for TextLine<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        let text = fit_text(self.text, area.width as usize);
        buf.set_string(area.x, area.y, text, self.style);
    }
}

/// Status bar widget, coloured by status level
struct StatusBar<'a> {
    message: &'a StatusMessage,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        let bg = match self.message.level {
            StatusLevel::Pending => Color::Yellow,
            StatusLevel::Active => Color::Green,
            StatusLevel::Inactive => Color::Red,
        };

        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(bg);
            }
        }

        let text = fit_text(&self.message.text, area.width as usize);
        buf.set_string(area.x, area.y, text, Style::default().fg(Color::Black).bg(bg));
    }
}
