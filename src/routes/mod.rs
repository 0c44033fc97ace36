/// Router Module Index
///
/// Splits routing into the static classification tables the access gate
/// consults and the small set of endpoints the gateway serves itself.
/// Everything else falls through to the upstream UI renderer.

/// Public / privileged / general route tables and the gate matcher.
pub mod table;

/// Locally served `/api` endpoints.
pub mod api;
