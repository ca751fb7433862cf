//! Screen layouts for the 128x64 OLED
//!
//! Every screen is drawn from scratch into the backend frame buffer and
//! then flushed, so no content survives from one screen to the next.

use core::fmt::Write;

use embedded_hal_async::delay::DelayNs;
use heapless::String;

use super::blink::BlinkState;
use crate::log::Log;
use crate::messages;
use crate::sensors::Reading;
use crate::traits::{Clock, DisplayBackend, DisplayError, FontSize};
use crate::{log_error, log_info};

/// Vertical distance between small-font text rows
pub const LINE_HEIGHT: i32 = 10;

/// Top of the first reading row, below the headline
pub const READINGS_TOP: i32 = 16;

/// Top of the first message line under the large warning headline
pub const WARNING_LINES_TOP: i32 = 22;

/// How long the display self-test stays on screen
pub const DISPLAY_CHECK_HOLD_MS: u32 = 5000;

/// Which screen a blinking-warning call put on the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Frame {
    Normal,
    Warning,
}

/// Owns the display backend and the warning blink state
pub struct DisplayManager<D, K> {
    backend: D,
    clock: K,
    blink: BlinkState,
    blink_interval_ms: u32,
}

impl<D: DisplayBackend, K: Clock> DisplayManager<D, K> {
    pub fn new(backend: D, clock: K, blink_interval_ms: u32) -> Self {
        Self {
            backend,
            clock,
            blink: BlinkState::new(),
            blink_interval_ms,
        }
    }

    /// Bring up the panel and blank it
    pub fn initialize<L: Log>(&mut self, log: &mut L) -> Result<(), DisplayError> {
        if let Err(e) = self.backend.init() {
            log_error!(log, "Display initialization failed: {:?}", e);
            return Err(e);
        }
        self.backend.clear();
        self.backend.flush()?;
        log_info!(log, "Display initialized successfully");
        Ok(())
    }

    /// Blank screen with `text` centred on the top row
    pub fn show_headline(&mut self, text: &str) -> Result<(), DisplayError> {
        self.backend.clear();
        self.draw_centered(0, text, FontSize::Small);
        self.backend.flush()
    }

    /// Two plain lines at the top of an otherwise blank screen
    pub fn show_calibration_message(&mut self, line1: &str, line2: &str) -> Result<(), DisplayError> {
        self.backend.clear();
        self.backend.draw_text(0, 0, line1, FontSize::Small);
        self.backend.draw_text(0, LINE_HEIGHT, line2, FontSize::Small);
        self.backend.flush()
    }

    /// Headline plus the five reading rows
    pub fn show_normal_screen(&mut self, reading: &Reading) -> Result<(), DisplayError> {
        self.backend.clear();
        self.draw_centered(0, messages::NORMAL_HEADLINE, FontSize::Small);

        let rows: [(&str, f32, &str); 5] = [
            ("CO2:", reading.co2_ppm, "ppm"),
            ("T (SCD30):", reading.temperature_scd_c, "C"),
            ("T (BMP280):", reading.temperature_bmp_c, "C"),
            ("Humidity:", reading.humidity_percent, "%"),
            ("Pressure:", reading.pressure_hpa, "hPa"),
        ];
        for (i, (label, value, unit)) in rows.iter().enumerate() {
            self.draw_reading_row(READINGS_TOP + LINE_HEIGHT * i as i32, label, *value, unit);
        }

        self.backend.flush()
    }

    /// Alternate between the warning screen and the normal screen
    ///
    /// Must be called every tick for the blinking to progress.
    pub fn show_blinking_warning(
        &mut self,
        lines: &[&str; 4],
        reading: &Reading,
    ) -> Result<Frame, DisplayError> {
        self.blink
            .update(self.clock.now_ms(), self.blink_interval_ms);

        if !self.blink.is_active() {
            self.show_normal_screen(reading)?;
            return Ok(Frame::Normal);
        }

        self.backend.clear();
        self.draw_centered(0, messages::WARNING_HEADLINE, FontSize::Large);
        for (i, line) in lines.iter().enumerate() {
            self.backend
                .draw_text(0, WARNING_LINES_TOP + LINE_HEIGHT * i as i32, line, FontSize::Small);
        }
        self.backend.flush()?;
        Ok(Frame::Warning)
    }

    /// Leave the warning path; the next warning starts on the warning screen
    pub fn reset_blink(&mut self) {
        self.blink.reset();
    }

    /// Self-test: fixed text for a few seconds, optionally cleared afterwards
    pub async fn run_display_check<Dl: DelayNs>(
        &mut self,
        delay: &mut Dl,
        clear_after: bool,
    ) -> Result<(), DisplayError> {
        self.backend.clear();
        for (i, line) in messages::DISPLAY_CHECK_LINES.iter().enumerate() {
            self.backend
                .draw_text(0, LINE_HEIGHT * i as i32, line, FontSize::Small);
        }
        self.backend.flush()?;

        delay.delay_ms(DISPLAY_CHECK_HOLD_MS).await;

        if clear_after {
            self.backend.clear();
            self.backend.flush()?;
        }
        Ok(())
    }

    pub fn blink_state(&self) -> BlinkState {
        self.blink
    }

    pub fn backend(&self) -> &D {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut D {
        &mut self.backend
    }

    fn draw_centered(&mut self, y: i32, text: &str, font: FontSize) {
        let (width, _) = self.backend.dimensions();
        let text_width = self.backend.text_width(text, font);
        let x = width.saturating_sub(text_width) / 2;
        self.backend.draw_text(x as i32, y, text, font);
    }

    fn draw_reading_row(&mut self, y: i32, label: &str, value: f32, unit: &str) {
        let value_text = format_value(value, unit);
        let (width, _) = self.backend.dimensions();
        let value_width = self.backend.text_width(&value_text, FontSize::Small);

        self.backend.draw_text(0, y, label, FontSize::Small);
        self.backend.draw_text(
            width.saturating_sub(value_width) as i32,
            y,
            &value_text,
            FontSize::Small,
        );
    }
}

/// `"412.00 ppm"`, or `"--- ppm"` for a failed read
pub fn format_value(value: f32, unit: &str) -> String<16> {
    let mut text = String::new();
    // Longest plausible value ("-99999.00 hPa") fits; overflow only truncates
    let _ = if value.is_finite() {
        write!(text, "{:.2} {}", value, unit)
    } else {
        write!(text, "--- {}", unit)
    };
    text
}
