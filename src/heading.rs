//! Predict/correct heading estimator for compass + rotation-rate fusion.
//!
//! Fuses an absolute heading source (magnetometer-derived compass, noisy
//! but drift-free) with a relative angular-rate source (gyroscope, smooth
//! but drifting) into one stable heading with a confidence score.
//!
//! # Why predict/correct?
//!
//! | Source   | Strength                     | Weakness                  |
//! |----------|------------------------------|---------------------------|
//! | Compass  | Absolute reference, no drift | Jittery, magnetic noise   |
//! | Gyro     | Smooth short-term rotation   | Integrates bias → drift   |
//!
//! The filter integrates the rate between compass fixes (predict) and pulls
//! the estimate back toward each compass fix weighted by the current
//! uncertainty (correct). State is `[heading, angular_velocity]` with a
//! decoupled scalar uncertainty per component.

use crate::geo::{wrap_180, wrap_360};

/// Heading uncertainty (deg²) at which confidence reaches zero.
const CONFIDENCE_UNCERTAINTY_SCALE: f64 = 10.0;

/// One fused sensor sample.
///
/// Either field may be absent when the corresponding sensor is not
/// currently reporting; a sample with both absent is ignored.
#[derive(Clone, Copy, Debug)]
pub struct HeadingSample {
    /// Absolute compass heading in degrees, 0 = north, clockwise.
    pub absolute_heading_deg: Option<f64>,
    /// Rotation rate around the vertical axis in rad/s.
    pub angular_rate_rad_s: Option<f64>,
    pub timestamp_secs: f64,
}

/// Noise and initialization parameters for [`KalmanHeadingFilter`].
#[derive(Debug, Clone, Copy)]
pub struct HeadingFilterConfig {
    /// Process noise added to the heading uncertainty per predict step (deg²).
    pub process_noise_heading: f64,
    /// Process noise added to the velocity uncertainty per predict step ((deg/s)²).
    pub process_noise_velocity: f64,
    /// Compass measurement noise, used as the variance term of the gain.
    pub compass_noise: f64,
    /// Time step assumed for the first update, before any timestamp history.
    pub default_dt: f64,
    /// Heading uncertainty at creation/reset (deg²).
    pub initial_heading_uncertainty: f64,
    /// Velocity uncertainty at creation/reset ((deg/s)²).
    pub initial_velocity_uncertainty: f64,
}

impl Default for HeadingFilterConfig {
    fn default() -> Self {
        Self {
            process_noise_heading: 0.01,
            process_noise_velocity: 0.1,
            compass_noise: 5.0,
            default_dt: 1.0 / 60.0,
            initial_heading_uncertainty: 10.0,
            initial_velocity_uncertainty: 1.0,
        }
    }
}

/// Predict/correct heading filter.
///
/// # Usage
///
/// ```
/// use marga_nav::heading::KalmanHeadingFilter;
///
/// let mut filter = KalmanHeadingFilter::default();
///
/// // Gyro-only sample: integrates the rate.
/// filter.update(None, Some(0.1), 0.0);
/// // Compass fix: pulls the estimate toward 90°.
/// let heading = filter.update(Some(90.0), None, 0.1);
/// assert!((0.0..360.0).contains(&heading));
/// ```
#[derive(Debug)]
pub struct KalmanHeadingFilter {
    config: HeadingFilterConfig,
    heading_deg: f64,
    angular_velocity_deg_s: f64,
    heading_uncertainty: f64,
    velocity_uncertainty: f64,
    last_timestamp: Option<f64>,
}

impl Default for KalmanHeadingFilter {
    fn default() -> Self {
        Self::new(HeadingFilterConfig::default())
    }
}

impl KalmanHeadingFilter {
    pub fn new(config: HeadingFilterConfig) -> Self {
        Self {
            heading_deg: 0.0,
            angular_velocity_deg_s: 0.0,
            heading_uncertainty: config.initial_heading_uncertainty,
            velocity_uncertainty: config.initial_velocity_uncertainty,
            last_timestamp: None,
            config,
        }
    }

    /// Feed one sensor sample and return the new heading estimate in degrees.
    ///
    /// Runs the predict step when an angular rate is present and time has
    /// advanced, then the correct step when a compass heading is present.
    /// A sample with neither field is a no-op and returns the last heading
    /// unchanged.
    pub fn update(
        &mut self,
        compass_heading_deg: Option<f64>,
        angular_rate_rad_s: Option<f64>,
        timestamp_secs: f64,
    ) -> f64 {
        if compass_heading_deg.is_none() && angular_rate_rad_s.is_none() {
            return self.heading_deg;
        }

        let dt = match self.last_timestamp {
            Some(last) => timestamp_secs - last,
            None => self.config.default_dt,
        };

        // Predict: advance the heading with the previous rate estimate,
        // then take the fresh rate sample as the new velocity.
        if let Some(rate) = angular_rate_rad_s {
            if dt > 0.0 {
                let rate_deg_s = rate.to_degrees();
                self.heading_deg += self.angular_velocity_deg_s * dt;
                self.angular_velocity_deg_s = rate_deg_s;
                self.heading_uncertainty +=
                    dt * dt * self.velocity_uncertainty + self.config.process_noise_heading;
                self.velocity_uncertainty += self.config.process_noise_velocity;
            }
        }

        // Correct: innovation takes the short way around the circle.
        if let Some(compass) = compass_heading_deg {
            let innovation = wrap_180(compass - self.heading_deg);
            let gain =
                self.heading_uncertainty / (self.heading_uncertainty + self.config.compass_noise);
            self.heading_deg += gain * innovation;
            self.heading_uncertainty *= 1.0 - gain;
        }

        self.heading_deg = wrap_360(self.heading_deg);
        self.last_timestamp = Some(timestamp_secs);
        self.heading_deg
    }

    /// Feed one [`HeadingSample`].
    pub fn update_sample(&mut self, sample: &HeadingSample) -> f64 {
        self.update(
            sample.absolute_heading_deg,
            sample.angular_rate_rad_s,
            sample.timestamp_secs,
        )
    }

    /// Reset to a north heading, clearing velocity and timestamp history.
    pub fn reset(&mut self) {
        self.reset_to(0.0);
    }

    /// Reset to a known heading, clearing velocity and timestamp history.
    pub fn reset_to(&mut self, heading_deg: f64) {
        self.heading_deg = wrap_360(heading_deg);
        self.angular_velocity_deg_s = 0.0;
        self.heading_uncertainty = self.config.initial_heading_uncertainty;
        self.velocity_uncertainty = self.config.initial_velocity_uncertainty;
        self.last_timestamp = None;
    }

    /// Current heading estimate in degrees, always in [0, 360).
    pub fn heading(&self) -> f64 {
        self.heading_deg
    }

    /// Current angular velocity estimate in deg/s.
    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity_deg_s
    }

    /// Estimate confidence in [0, 1].
    ///
    /// Decays while only predictions run and snaps upward on each compass
    /// correction.
    pub fn confidence(&self) -> f64 {
        (1.0 - self.heading_uncertainty / CONFIDENCE_UNCERTAINTY_SCALE).clamp(0.0, 1.0)
    }

    pub fn config(&self) -> &HeadingFilterConfig {
        &self.config
    }
}
