use crate::error::ApiError;

/// Ownership Policy
///
/// A pure decision function: an identity may mutate a resource iff it created
/// it. Applied by the route handlers before calling Repository update/delete
/// operations — the Repository itself does not enforce ownership, so it stays
/// reusable for administrative or background contexts that carry no
/// per-request identity.
pub fn may_mutate(actor_id: i64, resource_owner_id: i64) -> bool {
    actor_id == resource_owner_id
}

/// ensure_owner
///
/// Convenience wrapper surfacing a negative policy decision as `Forbidden`,
/// for use with `?` in handlers.
pub fn ensure_owner(actor_id: i64, resource_owner_id: i64) -> Result<(), ApiError> {
    if may_mutate(actor_id, resource_owner_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}
