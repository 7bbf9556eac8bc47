//! Navigation session state types.

use std::sync::Arc;
use std::time::Instant;

use crate::geo::GeoCoordinate;
use crate::route::Route;

/// Lifecycle state of a navigation session.
///
/// Exactly one value is current at any time; only the engine mutates it.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum NavigationState {
    /// No navigation in progress. A route may be stored, awaiting start.
    #[default]
    Idle,
    /// A routing request is in flight.
    Calculating,
    /// Actively following the stored route.
    Navigating,
    /// A deviation-triggered reroute is in flight; still following the old route.
    Rerouting,
    /// The destination was reached. Transient: the session auto-stops.
    Arrived,
    /// The last routing request failed. Cleared by the next explicit action.
    Failed(String),
}

impl NavigationState {
    /// Whether location updates and ticks should run their checks.
    pub fn is_active(&self) -> bool {
        matches!(self, NavigationState::Navigating | NavigationState::Rerouting)
    }
}

/// The session aggregate. Single-writer: only the engine, under its lock.
#[derive(Debug)]
pub(crate) struct NavigationSession {
    pub state: NavigationState,
    /// Active route; replaced wholesale on reroute, never mutated in place.
    pub route: Option<Arc<Route>>,
    /// All routes from the last successful request, primary first.
    pub alternatives: Vec<Arc<Route>>,
    pub current_step_index: usize,
    pub last_known_location: Option<GeoCoordinate>,
    /// Stamp of the last reroute request, for throttling.
    pub last_reroute: Option<Instant>,
    pub expected_arrival: Option<Instant>,
    pub distance_remaining_m: Option<f64>,
    pub seconds_remaining: Option<f64>,
    /// Bumped on every routing request and on stop; an in-flight response
    /// is applied only if its captured generation still matches.
    pub generation: u64,
}

impl NavigationSession {
    pub fn new() -> Self {
        Self {
            state: NavigationState::Idle,
            route: None,
            alternatives: Vec::new(),
            current_step_index: 0,
            last_known_location: None,
            last_reroute: None,
            expected_arrival: None,
            distance_remaining_m: None,
            seconds_remaining: None,
            generation: 0,
        }
    }
}

/// Point-in-time snapshot for pollers.
#[derive(Clone, Debug)]
pub struct NavigationStatus {
    pub state: NavigationState,
    pub route: Option<Arc<Route>>,
    pub alternatives: usize,
    pub current_step_index: usize,
    pub last_known_location: Option<GeoCoordinate>,
    pub distance_remaining_m: Option<f64>,
    pub seconds_remaining: Option<f64>,
}
