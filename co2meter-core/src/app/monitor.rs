//! Monitor orchestrator
//!
//! Startup brings up the display, then both sensors, then runs the one-time
//! calibration check. Afterwards every tick polls the CO2 sensor and draws
//! either the normal screen or the blinking warning. Any startup failure
//! halts the monitor for good.

use core::fmt::Write;

use co2meter_hal::{FlashError, FlashStorage};
use embedded_hal_async::delay::DelayNs;
use heapless::String;

use super::InitError;
use crate::alert::Co2Level;
use crate::config::{IdlePolicy, MonitorConfig};
use crate::display::{report, DisplayManager, Frame};
use crate::log::Log;
use crate::messages;
use crate::sensors::{CalibrationCheck, Reading, SensorManager};
use crate::state::{Event, State};
use crate::traits::{Clock, Co2Sensor, DisplayBackend, PressureSensor};
use crate::{log_debug, log_error, log_info, log_warn};

/// What a single loop iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// A screen was drawn; `fresh` is false when the last reading was reused
    Rendered { frame: Frame, fresh: bool },
    /// A reading was available but the screen update failed
    DisplayFailed,
    /// Nothing to draw this tick
    Idle,
    /// Startup has not completed, or the monitor halted
    Stopped,
}

pub struct Monitor<C, P, F, D, K, L> {
    sensors: SensorManager<C, P, F>,
    display: DisplayManager<D, K>,
    log: L,
    config: MonitorConfig,
    state: State,
    level: Co2Level,
    last_reading: Option<Reading>,
}

impl<C, P, F, D, K, L> Monitor<C, P, F, D, K, L>
where
    C: Co2Sensor,
    P: PressureSensor,
    F: FlashStorage,
    D: DisplayBackend,
    K: Clock,
    L: Log,
{
    pub fn new(
        co2: C,
        pressure: P,
        storage: F,
        backend: D,
        clock: K,
        log: L,
        config: MonitorConfig,
    ) -> Self {
        Self {
            sensors: SensorManager::new(
                co2,
                pressure,
                storage,
                config.pressure_sensor_address,
                config.calibration,
            ),
            display: DisplayManager::new(backend, clock, config.blink_interval_ms),
            log,
            config,
            state: State::Init,
            level: Co2Level::Normal,
            last_reading: None,
        }
    }

    /// Bring up the hardware and run the calibration check
    ///
    /// On error the monitor is halted and [`tick`](Self::tick) does nothing.
    pub async fn start<Dl: DelayNs>(&mut self, delay: &mut Dl) -> Result<CalibrationCheck, InitError> {
        log_info!(&mut self.log, "Starting CO2 monitor");

        if let Err(e) = self.display.initialize(&mut self.log) {
            return Err(self.halt(InitError::Display(e)));
        }
        report(&mut self.log, self.display.show_headline(messages::CO2_MONITOR));

        if let Err(e) = self.sensors.initialize(&mut self.log) {
            report(
                &mut self.log,
                self.display
                    .show_calibration_message(messages::SENSOR_FAILURE, messages::HALTED),
            );
            return Err(self.halt(e));
        }
        self.apply(Event::InitComplete);

        let check = self
            .sensors
            .check_and_calibrate(&mut self.display, &mut self.log, delay)
            .await;
        self.apply(Event::CalibrationChecked);

        log_info!(&mut self.log, "Initialization complete");
        Ok(check)
    }

    /// One loop iteration: poll, then render
    pub fn tick(&mut self) -> TickOutcome {
        if !self.state.is_running() {
            return TickOutcome::Stopped;
        }

        let (event, reading) = if self.sensors.is_data_available(&mut self.log) {
            let reading = self.sensors.read_all(&mut self.log);
            self.log_reading(&reading);
            self.last_reading = Some(reading);
            (Event::NewReading, reading)
        } else {
            match (self.config.idle_policy, self.last_reading) {
                (IdlePolicy::RenderCached, Some(reading)) => (Event::CachedReading, reading),
                _ => {
                    log_debug!(&mut self.log, "No new data");
                    self.apply(Event::NoReading);
                    return TickOutcome::Idle;
                }
            }
        };
        self.apply(event);

        let outcome = match self.render(&reading) {
            Some(frame) => TickOutcome::Rendered {
                frame,
                fresh: event == Event::NewReading,
            },
            None => TickOutcome::DisplayFailed,
        };
        self.apply(Event::Rendered);
        outcome
    }

    /// Clear the persisted calibration flag so the next check recalibrates
    pub async fn reset_calibration(&mut self) -> Result<(), FlashError> {
        self.sensors.reset_calibration_flag(&mut self.log).await
    }

    /// Show the display self-test; only meaningful after a successful start
    pub async fn run_display_check<Dl: DelayNs>(&mut self, delay: &mut Dl) {
        log_info!(&mut self.log, "Running display check");
        let result = self.display.run_display_check(delay, false).await;
        report(&mut self.log, result);
    }

    /// Poll forever at the configured interval
    pub async fn run<Dl: DelayNs>(&mut self, delay: &mut Dl) -> ! {
        loop {
            self.tick();
            delay.delay_ms(self.config.poll_interval_ms).await;
        }
    }

    fn render(&mut self, reading: &Reading) -> Option<Frame> {
        let thresholds = self.config.thresholds;
        let level = Co2Level::classify(reading.co2_ppm, &thresholds);
        if level != self.level {
            if level.is_warning() {
                log_warn!(&mut self.log, "CO2 level {:?} at {:.0} ppm", level, reading.co2_ppm);
            } else {
                log_info!(&mut self.log, "CO2 level back to normal");
            }
            self.level = level;
        }

        match (level.warning_text(), level.threshold(&thresholds)) {
            (Some((headline, advice)), Some(limit)) => {
                let mut co2_line: String<24> = String::new();
                let mut limit_line: String<24> = String::new();
                let _ = write!(co2_line, "CO2: {:.0} ppm", reading.co2_ppm);
                let _ = write!(limit_line, "Limit: {:.0} ppm", limit);
                let lines = [headline, advice, co2_line.as_str(), limit_line.as_str()];
                report(&mut self.log, self.display.show_blinking_warning(&lines, reading))
            }
            _ => {
                self.display.reset_blink();
                report(&mut self.log, self.display.show_normal_screen(reading)).map(|()| Frame::Normal)
            }
        }
    }

    fn log_reading(&mut self, r: &Reading) {
        log_info!(
            &mut self.log,
            "CO2 {:.2} ppm, T {:.2}/{:.2} C, RH {:.2} %, P {:.2} hPa",
            r.co2_ppm,
            r.temperature_scd_c,
            r.temperature_bmp_c,
            r.humidity_percent,
            r.pressure_hpa
        );
    }

    fn halt(&mut self, error: InitError) -> InitError {
        self.apply(Event::InitFailed(error.halt_reason()));
        log_error!(&mut self.log, "Initialization failed, halting: {:?}", error);
        error
    }

    fn apply(&mut self, event: Event) {
        let next = self.state.transition(event);
        if next != self.state {
            log_debug!(&mut self.log, "State {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn last_reading(&self) -> Option<Reading> {
        self.last_reading
    }

    pub fn sensors(&self) -> &SensorManager<C, P, F> {
        &self.sensors
    }

    pub fn sensors_mut(&mut self) -> &mut SensorManager<C, P, F> {
        &mut self.sensors
    }

    pub fn display(&self) -> &DisplayManager<D, K> {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut DisplayManager<D, K> {
        &mut self.display
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut L {
        &mut self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CALIBRATION_DONE;
    use crate::log::{LogLevel, Logger};
    use crate::state::HaltReason;
    use crate::testing::*;
    use crate::traits::{DisplayError, SensorError};
    use embassy_futures::block_on;

    type TestMonitor<'a> =
        Monitor<MockCo2, MockPressure, MockStorage, MockDisplay, &'a MockClock, Logger<RecordingSink>>;

    fn monitor_with(clock: &MockClock, storage: MockStorage, config: MonitorConfig) -> TestMonitor<'_> {
        Monitor::new(
            MockCo2::default(),
            MockPressure::default(),
            storage,
            MockDisplay::default(),
            clock,
            Logger::new(RecordingSink::default(), LogLevel::Debug),
            config,
        )
    }

    fn started(clock: &MockClock) -> TestMonitor<'_> {
        let mut monitor = monitor_with(
            clock,
            MockStorage::with_flag(CALIBRATION_DONE),
            MonitorConfig::DEFAULT,
        );
        let mut delay = MockDelay::default();
        assert_eq!(
            block_on(monitor.start(&mut delay)),
            Ok(CalibrationCheck::AlreadyCalibrated)
        );
        monitor
    }

    #[test]
    fn test_start_reaches_poll() {
        let clock = MockClock::default();
        let monitor = started(&clock);
        assert_eq!(monitor.state(), State::Poll);
        assert!(monitor.log().sink().contains("[INFO] Initialization complete"));
        assert!(monitor.display().backend().shows("CO2 Monitor"));
    }

    #[test]
    fn test_first_boot_calibrates_during_start() {
        let clock = MockClock::default();
        let mut monitor = monitor_with(&clock, MockStorage::default(), MonitorConfig::DEFAULT);
        let mut delay = MockDelay::default();

        let check = block_on(monitor.start(&mut delay));
        assert_eq!(check, Ok(CalibrationCheck::Calibrated { persisted: true }));
        assert_eq!(monitor.sensors().storage().persisted_flag(), Some(CALIBRATION_DONE));
        assert_eq!(monitor.state(), State::Poll);
    }

    #[test]
    fn test_display_failure_halts_before_sensors() {
        let clock = MockClock::default();
        let mut monitor = monitor_with(&clock, MockStorage::default(), MonitorConfig::DEFAULT);
        monitor.display_mut().backend_mut().init_result = Err(DisplayError::Bus);
        let mut delay = MockDelay::default();

        let result = block_on(monitor.start(&mut delay));
        assert_eq!(result, Err(InitError::Display(DisplayError::Bus)));
        assert_eq!(monitor.state(), State::Halted(HaltReason::DisplayInit));
        assert_eq!(monitor.sensors().pressure_sensor().begun_at, None);
        assert_eq!(monitor.tick(), TickOutcome::Stopped);
    }

    #[test]
    fn test_sensor_failure_halts_with_message() {
        let clock = MockClock::default();
        let mut monitor = monitor_with(&clock, MockStorage::default(), MonitorConfig::DEFAULT);
        monitor.sensors_mut().pressure_sensor_mut().begin_result = Err(SensorError::NotDetected);
        let mut delay = MockDelay::default();

        let result = block_on(monitor.start(&mut delay));
        assert_eq!(result, Err(InitError::PressureSensor(SensorError::NotDetected)));
        assert_eq!(monitor.state(), State::Halted(HaltReason::PressureSensorInit));
        assert!(monitor.display().backend().shows("Sensor failure"));

        let sink = monitor.log().sink();
        assert!(sink.position("BMP280 initialization failed") < sink.position("halting"));
        assert!(!sink.contains("Initialization complete"));

        // Never polls once halted
        monitor.sensors_mut().co2_sensor_mut().co2 = Ok(2500.0);
        assert_eq!(monitor.tick(), TickOutcome::Stopped);
        assert_eq!(monitor.last_reading(), None);
    }

    #[test]
    fn test_tick_before_start_is_stopped() {
        let clock = MockClock::default();
        let mut monitor = monitor_with(&clock, MockStorage::default(), MonitorConfig::DEFAULT);
        assert_eq!(monitor.tick(), TickOutcome::Stopped);
    }

    #[test]
    fn test_normal_reading_renders_normal_screen() {
        let clock = MockClock::at(1_000);
        let mut monitor = started(&clock);

        assert_eq!(
            monitor.tick(),
            TickOutcome::Rendered {
                frame: Frame::Normal,
                fresh: true
            }
        );
        assert!(monitor.display().backend().shows("800.00 ppm"));
        assert!(monitor.log().sink().contains("[INFO] CO2 800.00 ppm"));
        assert_eq!(monitor.state(), State::Poll);
    }

    #[test]
    fn test_moderate_reading_shows_warning() {
        let clock = MockClock::at(1_000);
        let mut monitor = started(&clock);
        monitor.sensors_mut().co2_sensor_mut().co2 = Ok(1500.0);

        assert_eq!(
            monitor.tick(),
            TickOutcome::Rendered {
                frame: Frame::Warning,
                fresh: true
            }
        );
        let backend = monitor.display().backend();
        assert!(backend.shows("WARNING!"));
        assert!(backend.shows("CO2 level moderate"));
        assert!(backend.shows("CO2: 1500 ppm"));
        assert!(backend.shows("Limit: 1000 ppm"));
        assert!(monitor.log().sink().contains("[WARNING] CO2 level Moderate"));
    }

    #[test]
    fn test_critical_reading_shows_critical_text() {
        let clock = MockClock::at(1_000);
        let mut monitor = started(&clock);
        monitor.sensors_mut().co2_sensor_mut().co2 = Ok(2500.0);

        monitor.tick();
        let backend = monitor.display().backend();
        assert!(backend.shows("CO2 level critical!"));
        assert!(backend.shows("Ventilate now"));
        assert!(backend.shows("Limit: 2000 ppm"));
    }

    #[test]
    fn test_warning_keeps_blinking_on_cached_reading() {
        let clock = MockClock::at(1_000);
        let mut monitor = started(&clock);
        monitor.sensors_mut().co2_sensor_mut().co2 = Ok(1500.0);
        monitor.tick();

        monitor.sensors_mut().co2_sensor_mut().ready = Ok(false);
        clock.advance(500);
        assert_eq!(
            monitor.tick(),
            TickOutcome::Rendered {
                frame: Frame::Normal,
                fresh: false
            }
        );
        clock.advance(500);
        assert_eq!(
            monitor.tick(),
            TickOutcome::Rendered {
                frame: Frame::Warning,
                fresh: false
            }
        );
    }

    #[test]
    fn test_skip_policy_leaves_screen_alone() {
        let clock = MockClock::at(1_000);
        let config = MonitorConfig {
            idle_policy: IdlePolicy::Skip,
            ..MonitorConfig::DEFAULT
        };
        let mut monitor = monitor_with(&clock, MockStorage::with_flag(CALIBRATION_DONE), config);
        block_on(monitor.start(&mut MockDelay::default())).unwrap();
        monitor.tick();

        let flushes = monitor.display().backend().flushes;
        monitor.sensors_mut().co2_sensor_mut().ready = Ok(false);
        assert_eq!(monitor.tick(), TickOutcome::Idle);
        assert_eq!(monitor.display().backend().flushes, flushes);
    }

    #[test]
    fn test_nothing_rendered_before_first_reading() {
        let clock = MockClock::at(1_000);
        let mut monitor = started(&clock);
        monitor.sensors_mut().co2_sensor_mut().ready = Ok(false);

        assert_eq!(monitor.tick(), TickOutcome::Idle);
        assert!(monitor.display().backend().shows("CO2 Monitor"));
    }

    #[test]
    fn test_return_to_normal_resets_blink() {
        let clock = MockClock::at(1_000);
        let mut monitor = started(&clock);
        monitor.sensors_mut().co2_sensor_mut().co2 = Ok(1500.0);
        monitor.tick();
        clock.advance(500);
        monitor.tick();
        assert!(!monitor.display().blink_state().is_active());

        monitor.sensors_mut().co2_sensor_mut().co2 = Ok(600.0);
        monitor.tick();
        assert!(monitor.log().sink().contains("CO2 level back to normal"));

        // Next warning starts on the warning screen again
        monitor.sensors_mut().co2_sensor_mut().co2 = Ok(1500.0);
        clock.advance(10);
        assert_eq!(
            monitor.tick(),
            TickOutcome::Rendered {
                frame: Frame::Warning,
                fresh: true
            }
        );
    }

    #[test]
    fn test_reset_calibration_forces_recalibration() {
        let clock = MockClock::default();
        let mut monitor = monitor_with(
            &clock,
            MockStorage::with_flag(CALIBRATION_DONE),
            MonitorConfig::DEFAULT,
        );
        let mut delay = MockDelay::default();

        assert_eq!(block_on(monitor.reset_calibration()), Ok(()));
        let check = block_on(monitor.start(&mut delay));
        assert_eq!(check, Ok(CalibrationCheck::Calibrated { persisted: true }));
        assert_eq!(monitor.sensors().co2_sensor().frc_requests.as_slice(), &[400]);
    }

    #[test]
    fn test_failed_calibration_reset_is_reported() {
        let clock = MockClock::default();
        let mut storage = MockStorage::with_flag(CALIBRATION_DONE);
        storage.fail_commit = true;
        let mut monitor = monitor_with(&clock, storage, MonitorConfig::DEFAULT);

        assert_eq!(block_on(monitor.reset_calibration()), Err(FlashError::Storage));
        assert!(monitor.log().sink().contains("[ERROR] Calibration flag reset failed"));
        assert!(!monitor.log().sink().contains("Calibration flag reset successful"));
        assert_eq!(
            monitor.sensors().storage().persisted_flag(),
            Some(CALIBRATION_DONE)
        );
    }

    #[test]
    fn test_display_check_after_start() {
        let clock = MockClock::default();
        let mut monitor = started(&clock);
        let mut delay = MockDelay::default();

        block_on(monitor.run_display_check(&mut delay));
        assert!(monitor.display().backend().shows("Display check"));
        assert_eq!(delay.total_ms(), 5000);
    }

    #[test]
    fn test_display_flush_failure_is_not_fatal() {
        let clock = MockClock::at(1_000);
        let mut monitor = started(&clock);
        monitor.display_mut().backend_mut().flush_result = Err(DisplayError::Bus);

        assert_eq!(monitor.tick(), TickOutcome::DisplayFailed);
        assert_eq!(monitor.state(), State::Poll);
        assert!(monitor.log().sink().contains("[WARNING] Display update failed"));
    }
}
