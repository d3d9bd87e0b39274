// Persistence collaborator consumed by the recognizer
use super::error::StoreResult;

/// Records which blueprints a user has found.
///
/// Each call is independent: the recognizer issues one call per accepted slot
/// and keeps going when one of them fails.
#[allow(async_fn_in_trait)]
pub trait BlueprintStore: Send + Sync {
    async fn mark_found(&self, user_id: &str, blueprint: &str, found: bool) -> StoreResult<()>;
}

pub(crate) fn validate_keys(user_id: &str, blueprint: &str) -> StoreResult<()> {
    if user_id.trim().is_empty() {
        return Err(super::StoreError::EmptyUserId);
    }
    if blueprint.trim().is_empty() {
        return Err(super::StoreError::EmptyBlueprint);
    }
    Ok(())
}
