//! Navigation state machine.
//!
//! [`Navigator`] owns the active navigation session and makes the
//! liveness decisions: when a location fix means the user has arrived, when
//! it means they have left the planned route and a new one should be
//! requested, and when the next instruction step becomes current.
//!
//! # Concurrency
//!
//! The session is a single-writer aggregate behind one mutex. The routing
//! collaborator is the only blocking call and is always invoked with the
//! lock released; its response is applied only if the session's request
//! generation still matches the one captured when the request was issued,
//! so a `stop_navigation` (or a newer request) that raced an in-flight
//! response simply wins and the stale response is discarded.
//!
//! Deviation-triggered reroutes are fire-and-forget: they run on a
//! short-lived named thread holding only a `Weak` handle, and their
//! failures are logged and swallowed so a flaky backend never interrupts
//! an active trip.

mod state;
mod tick;

pub use state::{NavigationState, NavigationStatus};
pub(crate) use state::NavigationSession;

use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::NavConfig;
use crate::error::{NavError, Result};
use crate::events::{EventBus, NavEvent};
use crate::geo::GeoCoordinate;
use crate::route::Route;
use crate::routing::RoutingService;
use tick::TickTask;

pub(crate) struct Inner {
    session: Mutex<NavigationSession>,
    router: Arc<dyn RoutingService>,
    events: EventBus,
    config: NavConfig,
    tick: Mutex<Option<TickTask>>,
}

/// Handle to a navigation session. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Navigator {
    inner: Arc<Inner>,
}

impl Navigator {
    pub fn new(router: Arc<dyn RoutingService>, config: NavConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                session: Mutex::new(NavigationSession::new()),
                router,
                events: EventBus::new(),
                config,
                tick: Mutex::new(None),
            }),
        }
    }

    /// Subscribe to the outbound event stream.
    pub fn subscribe(&self) -> Receiver<NavEvent> {
        self.inner.events.subscribe()
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> NavigationState {
        self.inner.session.lock().state.clone()
    }

    pub fn current_route(&self) -> Option<Arc<Route>> {
        self.inner.session.lock().route.clone()
    }

    pub fn current_step_index(&self) -> usize {
        self.inner.session.lock().current_step_index
    }

    /// The instruction step the user is currently on, if navigating a route.
    pub fn current_step(&self) -> Option<crate::route::RouteStep> {
        let session = self.inner.session.lock();
        let route = session.route.as_ref()?;
        route.steps.get(session.current_step_index).cloned()
    }

    /// Expected arrival time, while a route is being navigated.
    pub fn expected_arrival(&self) -> Option<Instant> {
        self.inner.session.lock().expected_arrival
    }

    /// Point-in-time snapshot of the whole session.
    pub fn status(&self) -> NavigationStatus {
        let session = self.inner.session.lock();
        NavigationStatus {
            state: session.state.clone(),
            route: session.route.clone(),
            alternatives: session.alternatives.len(),
            current_step_index: session.current_step_index,
            last_known_location: session.last_known_location,
            distance_remaining_m: session.distance_remaining_m,
            seconds_remaining: session.seconds_remaining,
        }
    }

    // ------------------------------------------------------------------
    // Route calculation
    // ------------------------------------------------------------------

    /// Request a route and store it as the active one.
    ///
    /// Validates both endpoints up front. On success the primary result
    /// becomes the active route and the full result list the selectable
    /// alternatives; the session returns to `Idle` (a computed route must
    /// be explicitly started) unless this request was issued while
    /// `Rerouting`, in which case it re-enters `Navigating` directly.
    ///
    /// Failures park the session in `Failed` and are returned to the
    /// caller. If the session moved on while the request was in flight
    /// (stopped, or superseded by a newer request), the response is not
    /// applied; the computed route is still returned.
    pub fn calculate_route(
        &self,
        origin: GeoCoordinate,
        destination: GeoCoordinate,
    ) -> Result<Arc<Route>> {
        validate_coordinate("origin", &origin)?;
        validate_coordinate("destination", &destination)?;

        let (generation, was_rerouting) = {
            let mut session = self.inner.session.lock();
            let was_rerouting = session.state == NavigationState::Rerouting;
            session.generation += 1;
            self.set_state(&mut session, NavigationState::Calculating);
            (session.generation, was_rerouting)
        };

        let result = self.inner.router.route(origin, destination, true);

        let mut session = self.inner.session.lock();
        if session.generation != generation {
            debug!("discarding stale routing response (session moved on)");
            return match result {
                Ok(routes) if routes.is_empty() => Err(NavError::NoRouteFound),
                Ok(mut routes) => Ok(Arc::new(routes.remove(0))),
                Err(e) => Err(e),
            };
        }

        match result {
            Ok(routes) if routes.is_empty() => {
                self.set_state(&mut session, NavigationState::Failed("no route found".into()));
                Err(NavError::NoRouteFound)
            }
            Ok(routes) => {
                let routes: Vec<Arc<Route>> = routes.into_iter().map(Arc::new).collect();
                let primary = Arc::clone(&routes[0]);
                info!(
                    "route computed: {:.0}m, {:.0}s, {} alternative(s)",
                    primary.total_distance_m,
                    primary.expected_duration_secs,
                    routes.len()
                );
                session.route = Some(Arc::clone(&primary));
                session.alternatives = routes;
                session.current_step_index = 0;
                if was_rerouting {
                    session.expected_arrival = Some(
                        Instant::now()
                            + Duration::from_secs_f64(primary.expected_duration_secs.max(0.0)),
                    );
                    session.distance_remaining_m = Some(primary.total_distance_m);
                    session.seconds_remaining = Some(primary.expected_duration_secs);
                    self.set_state(&mut session, NavigationState::Navigating);
                } else {
                    session.expected_arrival = None;
                    session.distance_remaining_m = None;
                    session.seconds_remaining = None;
                    self.set_state(&mut session, NavigationState::Idle);
                }
                self.inner
                    .events
                    .emit(NavEvent::RouteUpdated(Some(Arc::clone(&primary))));
                Ok(primary)
            }
            Err(e) => {
                self.set_state(&mut session, NavigationState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Throttled reroute.
    ///
    /// A call inside the throttle window is a silent no-op, not an error:
    /// however many deviation events fire in that window, at most one
    /// routing request goes out. The throttle stamp is taken before the
    /// routing call so that concurrent deviation events observe it
    /// immediately.
    pub fn recalculate_route(
        &self,
        origin: GeoCoordinate,
        destination: GeoCoordinate,
    ) -> Result<()> {
        {
            let mut session = self.inner.session.lock();
            if !self.throttle_elapsed(&session) {
                debug!("reroute request throttled");
                return Ok(());
            }
            session.last_reroute = Some(Instant::now());
            self.set_state(&mut session, NavigationState::Rerouting);
        }

        self.calculate_route(origin, destination).map(|_| ())
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    /// Begin navigating the stored route.
    pub fn start_navigation(&self) -> Result<()> {
        {
            let mut session = self.inner.session.lock();
            let Some(route) = session.route.clone() else {
                return Err(NavError::NoActiveRoute);
            };
            session.current_step_index = 0;
            session.expected_arrival = Some(
                Instant::now() + Duration::from_secs_f64(route.expected_duration_secs.max(0.0)),
            );
            session.distance_remaining_m = Some(route.total_distance_m);
            session.seconds_remaining = Some(route.expected_duration_secs);
            info!(
                "navigation started: {:.0}m, {} step(s)",
                route.total_distance_m,
                route.steps.len()
            );
            self.set_state(&mut session, NavigationState::Navigating);
        }
        self.start_tick();
        Ok(())
    }

    /// Re-enter navigation with a previously computed route.
    ///
    /// Used when a persisted session is resumed; the expected arrival time
    /// is recomputed from the route's expected duration.
    pub fn restore_route(&self, route: Route) {
        {
            let mut session = self.inner.session.lock();
            let route = Arc::new(route);
            session.route = Some(Arc::clone(&route));
            session.alternatives = vec![Arc::clone(&route)];
            session.current_step_index = 0;
            session.expected_arrival = Some(
                Instant::now() + Duration::from_secs_f64(route.expected_duration_secs.max(0.0)),
            );
            session.distance_remaining_m = Some(route.total_distance_m);
            session.seconds_remaining = Some(route.expected_duration_secs);
            info!("navigation restored: {:.0}m", route.total_distance_m);
            self.inner
                .events
                .emit(NavEvent::RouteUpdated(Some(Arc::clone(&route))));
            self.set_state(&mut session, NavigationState::Navigating);
        }
        self.start_tick();
    }

    /// Stop navigating and clear the session.
    ///
    /// Safe from any state; an in-flight routing response arriving after
    /// this call is discarded, and the background tick is cancelled.
    pub fn stop_navigation(&self) {
        {
            let mut session = self.inner.session.lock();
            self.stop_locked(&mut session);
        }
        self.cancel_tick();
    }

    /// Swap the active route for one of the stored alternatives.
    ///
    /// Resets the step index and re-advances step progress against the
    /// last known location.
    pub fn select_alternative_route(&self, index: usize) -> Result<()> {
        let mut session = self.inner.session.lock();
        let Some(route) = session.alternatives.get(index).cloned() else {
            return Err(NavError::AlternativeOutOfRange(index));
        };
        info!("switching to alternative route {index}");
        session.route = Some(Arc::clone(&route));
        session.current_step_index = 0;
        self.inner
            .events
            .emit(NavEvent::RouteUpdated(Some(Arc::clone(&route))));
        if let Some(location) = session.last_known_location {
            self.advance_steps(&mut session, &route, &location, true);
            self.update_progress(&mut session, &route, &location);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Per-fix processing
    // ------------------------------------------------------------------

    /// Process one location fix. The central per-tick entry point.
    ///
    /// Checks run in priority order: arrival first (and wins outright —
    /// a fix that is both near the destination and off the polyline
    /// arrives, it does not reroute), then deviation, then step
    /// progression.
    pub fn update_location(&self, location: GeoCoordinate) {
        let mut session = self.inner.session.lock();
        session.last_known_location = Some(location);

        if !session.state.is_active() {
            return;
        }
        let Some(route) = session.route.clone() else {
            return;
        };
        let Some(destination) = route.destination() else {
            return;
        };

        // 1. Arrival.
        if location.distance_m(&destination) < self.inner.config.arrival_radius_m {
            self.arrive(&mut session);
            return;
        }

        // 2. Deviation. Skipped while a reroute is already in flight.
        if session.state == NavigationState::Navigating {
            let deviation = route.deviation_from(&location);
            if deviation > self.inner.config.reroute_threshold_m && self.throttle_elapsed(&session)
            {
                debug!("off route by {:.1}m, requesting reroute", deviation);
                self.spawn_reroute(location, destination);
            }
        }

        // 3. Step progression.
        self.advance_steps(&mut session, &route, &location, false);
        self.update_progress(&mut session, &route, &location);
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn set_state(&self, session: &mut NavigationSession, state: NavigationState) {
        if session.state != state {
            session.state = state.clone();
            self.inner.events.emit(NavEvent::StateChanged(state));
        }
    }

    fn throttle_elapsed(&self, session: &NavigationSession) -> bool {
        let min_interval = Duration::from_secs_f64(self.inner.config.min_reroute_interval_secs);
        session
            .last_reroute
            .is_none_or(|last| last.elapsed() >= min_interval)
    }

    /// Fire-and-forget reroute on a named thread.
    ///
    /// Best-effort by design: a failure is logged and the session put back
    /// to `Navigating` on the old route, to retry on the next qualifying
    /// deviation after the throttle window.
    fn spawn_reroute(&self, origin: GeoCoordinate, destination: GeoCoordinate) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let spawned = thread::Builder::new()
            .name("nav-reroute".into())
            .spawn(move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let nav = Navigator { inner };
                if let Err(e) = nav.recalculate_route(origin, destination) {
                    warn!("deviation reroute failed, keeping current route: {e}");
                    let mut session = nav.inner.session.lock();
                    let recoverable = matches!(
                        session.state,
                        NavigationState::Failed(_)
                            | NavigationState::Rerouting
                            | NavigationState::Calculating
                    );
                    if recoverable && session.route.is_some() {
                        nav.set_state(&mut session, NavigationState::Navigating);
                    }
                }
            });
        if let Err(e) = spawned {
            warn!("failed to spawn reroute thread: {e}");
        }
    }

    /// Anchor-proximity step advance.
    ///
    /// The current step advances when the fix comes within the advance
    /// radius of its anchor point; this is deliberately nearness to the
    /// anchor, not projection onto the step's sub-path. Live fixes advance
    /// at most one step per call; a route swap (`recompute`) re-advances
    /// as far as the last known location justifies.
    fn advance_steps(
        &self,
        session: &mut NavigationSession,
        route: &Route,
        location: &GeoCoordinate,
        recompute: bool,
    ) {
        loop {
            let index = session.current_step_index;
            let Some(step) = route.steps.get(index) else {
                return;
            };
            let is_last = index + 1 >= route.steps.len();
            if is_last
                || location.distance_m(&step.anchor) >= self.inner.config.step_advance_radius_m
            {
                return;
            }
            session.current_step_index = index + 1;
            self.inner.events.emit(NavEvent::StepChanged(index + 1));
            if !recompute {
                return;
            }
        }
    }

    fn update_progress(
        &self,
        session: &mut NavigationSession,
        route: &Route,
        location: &GeoCoordinate,
    ) {
        let remaining = route.distance_remaining_from(location);
        session.distance_remaining_m = Some(remaining);
        session.seconds_remaining = if route.total_distance_m > 0.0 {
            Some(route.expected_duration_secs * remaining / route.total_distance_m)
        } else {
            None
        };
    }

    fn arrive(&self, session: &mut NavigationSession) {
        info!("arrived at destination");
        self.set_state(session, NavigationState::Arrived);
        self.inner.events.emit(NavEvent::Arrived);
        self.stop_locked(session);
    }

    fn stop_locked(&self, session: &mut NavigationSession) {
        if session.route.take().is_some() {
            self.inner.events.emit(NavEvent::RouteUpdated(None));
        }
        session.alternatives.clear();
        session.current_step_index = 0;
        session.last_known_location = None;
        session.last_reroute = None;
        session.expected_arrival = None;
        session.distance_remaining_m = None;
        session.seconds_remaining = None;
        session.generation += 1;
        self.set_state(session, NavigationState::Idle);
    }

    fn start_tick(&self) {
        let mut guard = self.inner.tick.lock();
        if let Some(mut old) = guard.take() {
            old.cancel();
        }
        *guard = Some(TickTask::spawn(
            Arc::downgrade(&self.inner),
            Duration::from_secs_f64(self.inner.config.tick_interval_secs),
        ));
    }

    fn cancel_tick(&self) {
        if let Some(mut task) = self.inner.tick.lock().take() {
            task.cancel();
        }
    }
}

/// One background tick: refresh progress estimates and re-run the arrival
/// check from the last known location. Returns `false` when the session has
/// left the navigating states and the tick loop should end.
pub(crate) fn tick_once(inner: &Arc<Inner>) -> bool {
    let nav = Navigator {
        inner: Arc::clone(inner),
    };
    let mut session = nav.inner.session.lock();
    if !session.state.is_active() {
        return false;
    }
    let Some(route) = session.route.clone() else {
        return false;
    };
    let Some(location) = session.last_known_location else {
        return true;
    };
    let Some(destination) = route.destination() else {
        return true;
    };

    if location.distance_m(&destination) < nav.inner.config.arrival_radius_m {
        nav.arrive(&mut session);
        return false;
    }
    nav.update_progress(&mut session, &route, &location);
    true
}

fn validate_coordinate(which: &str, coordinate: &GeoCoordinate) -> Result<()> {
    if coordinate.is_valid() {
        Ok(())
    } else {
        Err(NavError::InvalidLocation(format!(
            "{which} ({}, {}) is not a valid coordinate",
            coordinate.latitude, coordinate.longitude
        )))
    }
}
