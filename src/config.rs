//! Configuration loading for MargaNav

use crate::error::Result;
use serde::Deserialize;
use std::path::Path;

/// Navigation thresholds and intervals.
///
/// All distance thresholds are in meters, all intervals in seconds.
#[derive(Clone, Debug, Deserialize)]
pub struct NavConfig {
    /// Distance to the route's final point that counts as arrival (default: 30.0)
    #[serde(default = "default_arrival_radius")]
    pub arrival_radius_m: f64,

    /// Lateral distance from the route polyline that triggers a reroute (default: 20.0)
    #[serde(default = "default_reroute_threshold")]
    pub reroute_threshold_m: f64,

    /// Distance to a step's anchor that advances to the next step (default: 20.0)
    #[serde(default = "default_step_advance_radius")]
    pub step_advance_radius_m: f64,

    /// Minimum time between consecutive reroute requests (default: 2.0)
    #[serde(default = "default_min_reroute_interval")]
    pub min_reroute_interval_secs: f64,

    /// Interval of the background progress/arrival tick (default: 1.0)
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: f64,
}

// Default value functions
fn default_arrival_radius() -> f64 {
    30.0
}
fn default_reroute_threshold() -> f64 {
    20.0
}
fn default_step_advance_radius() -> f64 {
    20.0
}
fn default_min_reroute_interval() -> f64 {
    2.0
}
fn default_tick_interval() -> f64 {
    1.0
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            arrival_radius_m: default_arrival_radius(),
            reroute_threshold_m: default_reroute_threshold(),
            step_advance_radius_m: default_step_advance_radius(),
            min_reroute_interval_secs: default_min_reroute_interval(),
            tick_interval_secs: default_tick_interval(),
        }
    }
}

impl NavConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::NavError::Config(format!("Failed to read config file: {}", e))
        })?;
        let config: NavConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_navigation_thresholds() {
        let config = NavConfig::default();
        assert_eq!(config.arrival_radius_m, 30.0);
        assert_eq!(config.reroute_threshold_m, 20.0);
        assert_eq!(config.step_advance_radius_m, 20.0);
        assert_eq!(config.min_reroute_interval_secs, 2.0);
        assert_eq!(config.tick_interval_secs, 1.0);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: NavConfig = toml::from_str("arrival_radius_m = 45.0").unwrap();
        assert_eq!(config.arrival_radius_m, 45.0);
        assert_eq!(config.reroute_threshold_m, 20.0);
        assert_eq!(config.min_reroute_interval_secs, 2.0);
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config: NavConfig = toml::from_str("").unwrap();
        assert_eq!(config.arrival_radius_m, 30.0);
        assert_eq!(config.tick_interval_secs, 1.0);
    }
}
