//! MargaNav - Real-time navigation core for the Marga field-operations app
//!
//! An in-process library that turns noisy, asynchronously-arriving sensor
//! data into stable navigation decisions: a fused heading estimate for the
//! map camera, and the route-tracking calls the session layer reacts to —
//! reroute, step advance, arrival.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    engine/                          │  ← Orchestration
//! │     (Navigator state machine, background tick)      │
//! └─────────────────────────────────────────────────────┘
//!            │                 │                │
//! ┌──────────────────┐ ┌──────────────┐ ┌───────────────┐
//! │     routing      │ │    events    │ │    config     │
//! │ (directions API) │ │ (subscribers)│ │  (thresholds) │
//! └──────────────────┘ └──────────────┘ └───────────────┘
//!            │
//! ┌─────────────────────────────────────────────────────┐
//! │              geo / route / heading                  │  ← Pure computation
//! │   (angular math, polyline geometry, sensor fusion)  │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Data flow
//!
//! Sensor provider → [`KalmanHeadingFilter`] → smoothed heading (consumed by
//! the host's camera/UI). Location provider → [`Navigator`] → deviation /
//! arrival / step checks → [`RoutingService`] on deviation → new [`Route`]
//! back into the session, with every decision published as a [`NavEvent`].
//!
//! The heading and location paths are independent streams: the filter is
//! pure synchronous computation, while the [`Navigator`] serializes all
//! session mutation behind one lock and calls the routing backend with
//! that lock released.

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod geo;
pub mod heading;
pub mod route;
pub mod routing;

pub use config::NavConfig;
pub use engine::{NavigationState, NavigationStatus, Navigator};
pub use error::{NavError, Result};
pub use events::NavEvent;
pub use geo::GeoCoordinate;
pub use heading::{HeadingFilterConfig, HeadingSample, KalmanHeadingFilter};
pub use route::{Route, RouteStep};
pub use routing::RoutingService;
