/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated
/// modules so access control is applied explicitly at the module level (via
/// Axum layers) instead of per handler.

/// Routes accessible to anonymous clients: registration, login, health.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a valid bearer token resolving to an existing user.
pub mod authenticated;
