//! Sensor manager
//!
//! Owns both sensors and the persistent storage holding the calibration
//! flag. Readings from the CO2 sensor pass through the plausibility
//! filter; the pressure sensor is passed through unfiltered.

use co2meter_hal::{FlashError, FlashStorage, StorageKey};
use embedded_hal_async::delay::DelayNs;

use super::reading::Reading;
use super::validation::{FallbackCache, Filtered, Quantity};
use crate::app::InitError;
use crate::config::{CalibrationConfig, CalibrationStatus, CALIBRATION_CLEARED, CALIBRATION_DONE};
use crate::display::{report as report_display, DisplayManager};
use crate::log::Log;
use crate::messages;
use crate::traits::{Clock, Co2Sensor, DisplayBackend, PressureSensor, SensorError};
use crate::{log_debug, log_error, log_info, log_warn};

/// Outcome of the startup calibration check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationCheck {
    /// Flag was already set; nothing was done
    AlreadyCalibrated,
    /// Recalibrated now. `persisted` is false if the flag commit failed.
    Calibrated { persisted: bool },
    /// Sensor rejected the recalibration; flag left unset
    Failed,
}

pub struct SensorManager<C, P, F> {
    co2: C,
    pressure: P,
    storage: F,
    cache: FallbackCache,
    pressure_address: u8,
    calibration: CalibrationConfig,
}

impl<C, P, F> SensorManager<C, P, F>
where
    C: Co2Sensor,
    P: PressureSensor,
    F: FlashStorage,
{
    pub fn new(
        co2: C,
        pressure: P,
        storage: F,
        pressure_address: u8,
        calibration: CalibrationConfig,
    ) -> Self {
        Self {
            co2,
            pressure,
            storage,
            cache: FallbackCache::new(),
            pressure_address,
            calibration,
        }
    }

    /// Start both sensors, pressure sensor first
    pub fn initialize<L: Log>(&mut self, log: &mut L) -> Result<(), InitError> {
        if let Err(e) = self.pressure.begin(self.pressure_address) {
            log_error!(
                log,
                "BMP280 initialization failed at 0x{:02X}: {:?}",
                self.pressure_address,
                e
            );
            return Err(InitError::PressureSensor(e));
        }
        log_info!(log, "BMP280 initialized");

        if let Err(e) = self.co2.begin() {
            log_error!(log, "SCD30 initialization failed: {:?}", e);
            return Err(InitError::Co2Sensor(e));
        }
        log_info!(log, "SCD30 initialized");

        Ok(())
    }

    /// Whether the CO2 sensor has a new measurement. Bus errors count as "no".
    pub fn is_data_available<L: Log>(&mut self, log: &mut L) -> bool {
        match self.co2.data_available() {
            Ok(ready) => ready,
            Err(e) => {
                log_warn!(log, "SCD30 data-ready check failed: {:?}", e);
                false
            }
        }
    }

    /// Filtered CO2 concentration (ppm)
    pub fn co2<L: Log>(&mut self, log: &mut L) -> f32 {
        let raw = self.co2.co2_ppm();
        self.filtered(Quantity::Co2, raw, log)
    }

    /// Filtered SCD30 temperature (°C)
    pub fn temperature_scd<L: Log>(&mut self, log: &mut L) -> f32 {
        let raw = self.co2.temperature_c();
        self.filtered(Quantity::Temperature, raw, log)
    }

    /// Filtered relative humidity (%)
    pub fn humidity<L: Log>(&mut self, log: &mut L) -> f32 {
        let raw = self.co2.humidity_percent();
        self.filtered(Quantity::Humidity, raw, log)
    }

    /// BMP280 temperature (°C), NaN if the read failed
    pub fn temperature_bmp<L: Log>(&mut self, log: &mut L) -> f32 {
        match self.pressure.temperature_c() {
            Ok(t) => t,
            Err(e) => {
                log_error!(log, "BMP280 temperature read failed: {:?}", e);
                f32::NAN
            }
        }
    }

    /// BMP280 pressure (hPa), NaN if the read failed
    pub fn pressure<L: Log>(&mut self, log: &mut L) -> f32 {
        match self.pressure.pressure_pa() {
            Ok(pa) => pa / 100.0,
            Err(e) => {
                log_error!(log, "BMP280 pressure read failed: {:?}", e);
                f32::NAN
            }
        }
    }

    /// Fetch a complete set of values
    pub fn read_all<L: Log>(&mut self, log: &mut L) -> Reading {
        Reading {
            co2_ppm: self.co2(log),
            temperature_scd_c: self.temperature_scd(log),
            temperature_bmp_c: self.temperature_bmp(log),
            humidity_percent: self.humidity(log),
            pressure_hpa: self.pressure(log),
        }
    }

    fn filtered<L: Log>(
        &mut self,
        quantity: Quantity,
        raw: Result<f32, SensorError>,
        log: &mut L,
    ) -> f32 {
        let outcome = match raw {
            Ok(value) => self.cache.filter(quantity, value),
            Err(e) => {
                log_warn!(log, "{} read failed: {:?}", quantity.name(), e);
                self.cache.fallback(quantity)
            }
        };

        match (raw, outcome) {
            (_, Filtered::Accepted(v)) => {
                log_debug!(log, "{}: {:.2} {}", quantity.name(), v, quantity.unit());
            }
            (Ok(rejected), Filtered::Substituted(v)) => {
                log_debug!(
                    log,
                    "{} out of range ({:.2}), using last valid {:.2} {}",
                    quantity.name(),
                    rejected,
                    v,
                    quantity.unit()
                );
            }
            (Err(_), Filtered::Substituted(v)) => {
                log_debug!(log, "{}: using last valid {:.2} {}", quantity.name(), v, quantity.unit());
            }
        }

        outcome.value()
    }

    /// Current fallback values
    pub fn cache(&self) -> &FallbackCache {
        &self.cache
    }

    /// Read the persisted flag; `None` when nothing is stored
    pub async fn read_calibration_flag(&mut self) -> Result<Option<u8>, FlashError> {
        let mut buf = [0u8; 1];
        match self.storage.read(StorageKey::CalibrationFlag, &mut buf).await {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(FlashError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Interpret the persisted flag. Storage errors mean "needs calibration".
    pub async fn calibration_status<L: Log>(&mut self, log: &mut L) -> CalibrationStatus {
        match self.read_calibration_flag().await {
            Ok(flag) => {
                log_debug!(log, "Calibration flag read: {:?}", flag);
                CalibrationStatus::from_flag(flag)
            }
            Err(e) => {
                log_warn!(log, "Calibration flag unreadable: {:?}", e);
                CalibrationStatus::Needed
            }
        }
    }

    /// Run the forced recalibration once per device
    ///
    /// The flag is only written when the sensor accepted the recalibration,
    /// so a failed attempt is retried on the next boot.
    pub async fn check_and_calibrate<D, K, L, Dl>(
        &mut self,
        display: &mut DisplayManager<D, K>,
        log: &mut L,
        delay: &mut Dl,
    ) -> CalibrationCheck
    where
        D: DisplayBackend,
        K: Clock,
        L: Log,
        Dl: DelayNs,
    {
        if self.calibration_status(log).await.is_done() {
            log_info!(log, "Sensor already calibrated");
            report_display(log, display.show_headline(messages::CO2_MONITOR));
            return CalibrationCheck::AlreadyCalibrated;
        }

        log_info!(log, "Calibration needed");
        report_display(
            log,
            display.show_calibration_message(messages::CALIBRATION_CHECK, messages::CALIBRATION_NEEDED),
        );

        if !self.calibrate(display, log, delay).await {
            log_warn!(log, "Calibration flag left unset, retrying on next boot");
            return CalibrationCheck::Failed;
        }

        let persisted = self.mark_calibrated(log).await;
        CalibrationCheck::Calibrated { persisted }
    }

    /// Forced recalibration against the fresh-air reference
    ///
    /// Shows progress and the result, holds the result on screen, then
    /// restores the headline. Returns whether the sensor accepted it.
    pub async fn calibrate<D, K, L, Dl>(
        &mut self,
        display: &mut DisplayManager<D, K>,
        log: &mut L,
        delay: &mut Dl,
    ) -> bool
    where
        D: DisplayBackend,
        K: Clock,
        L: Log,
        Dl: DelayNs,
    {
        report_display(
            log,
            display.show_calibration_message(messages::CALIBRATING, messages::PLACE_SENSOR),
        );
        log_info!(
            log,
            "Forced recalibration at {} ppm",
            self.calibration.reference_ppm
        );

        let success = match self.co2.set_forced_recalibration(self.calibration.reference_ppm) {
            Ok(()) => {
                log_info!(log, "Calibration successful");
                report_display(
                    log,
                    display.show_calibration_message(
                        messages::CALIBRATION_SUCCESS,
                        messages::CALIBRATION_READY,
                    ),
                );
                true
            }
            Err(e) => {
                log_error!(log, "Calibration failed: {:?}", e);
                report_display(
                    log,
                    display.show_calibration_message(messages::CALIBRATION_FAILED, messages::TRY_AGAIN),
                );
                false
            }
        };

        delay.delay_ms(self.calibration.message_hold_ms).await;
        report_display(log, display.show_headline(messages::CO2_MONITOR));

        success
    }

    /// Write and commit the done flag, then read it back for the log
    async fn mark_calibrated<L: Log>(&mut self, log: &mut L) -> bool {
        let persisted = match self.store_flag(CALIBRATION_DONE).await {
            Ok(()) => {
                log_info!(log, "Calibration flag committed");
                true
            }
            Err(e) => {
                log_error!(log, "Failed to commit calibration flag: {:?}", e);
                false
            }
        };

        match self.read_calibration_flag().await {
            Ok(flag) => log_debug!(log, "Calibration flag verify: {:?}", flag),
            Err(e) => log_debug!(log, "Calibration flag verify failed: {:?}", e),
        }

        persisted
    }

    /// Clear the flag so the next boot recalibrates
    pub async fn reset_calibration_flag<L: Log>(&mut self, log: &mut L) -> Result<(), FlashError> {
        match self.store_flag(CALIBRATION_CLEARED).await {
            Ok(()) => {
                log_info!(log, "Calibration flag reset successful");
                Ok(())
            }
            Err(e) => {
                log_error!(log, "Calibration flag reset failed: {:?}", e);
                Err(e)
            }
        }
    }

    async fn store_flag(&mut self, value: u8) -> Result<(), FlashError> {
        self.storage
            .write(StorageKey::CalibrationFlag, &[value])
            .await?;
        self.storage.commit().await
    }

    pub fn co2_sensor(&self) -> &C {
        &self.co2
    }

    pub fn co2_sensor_mut(&mut self) -> &mut C {
        &mut self.co2
    }

    pub fn pressure_sensor(&self) -> &P {
        &self.pressure
    }

    pub fn pressure_sensor_mut(&mut self) -> &mut P {
        &mut self.pressure
    }

    pub fn storage(&self) -> &F {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut F {
        &mut self.storage
    }
}
