//! Routing collaborator contract.

use crate::error::Result;
use crate::geo::GeoCoordinate;
use crate::route::Route;

/// External path-finding service.
///
/// Implementations wrap whatever directions backend the host app talks to.
/// The call blocks until the backend answers; the navigation engine always
/// invokes it with the session lock released, so a slow backend never
/// stalls status reads or location updates.
///
/// The returned list is ordered best-first; the engine stores the first
/// route as the active one and the full list as selectable alternatives.
/// Returning an empty list is valid and maps to
/// [`NavError::NoRouteFound`](crate::error::NavError::NoRouteFound);
/// transport-level failures are reported as
/// [`NavError::Transport`](crate::error::NavError::Transport).
pub trait RoutingService: Send + Sync {
    fn route(
        &self,
        origin: GeoCoordinate,
        destination: GeoCoordinate,
        want_alternatives: bool,
    ) -> Result<Vec<Route>>;
}
