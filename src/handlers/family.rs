// GET /api/family - the family in scope for the current caller

use axum::{extract::State, response::Json, Extension};
use serde_json::{json, Value};

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::state::AppState;

/// Return the family the caller is scoped to. Family administrators see
/// their own family; a global administrator sees whichever family the
/// request's hints resolved, if any.
pub async fn family_get(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
) -> Result<Json<Value>, ApiError> {
    let Some(family_id) = context.tenant_id else {
        return Err(ApiError::not_found("No family in scope for this request"));
    };

    let family = state
        .store
        .find_family_by_id(family_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Family not found"))?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "id": family.id,
            "slug": family.slug,
            "name": family.name,
            "is_active": family.is_active
        }
    })))
}
