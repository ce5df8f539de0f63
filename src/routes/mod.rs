/// Router Module Index
///
/// Splits the routes by how the Access Gate treats them.

/// API routes open to everyone (health, session lookup, gate check).
pub mod public;

/// API routes that require a resolved session (`AuthUser` extractor).
pub mod protected;

/// Page routes, served from the static web build behind the web proxy gate.
pub mod pages;
