//! Tenant-scoped staff listing. Reachable only through the eatery
//! guard, so the path id is already known to match the token scope.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::dtos::auth::StaffMemberResponse;
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::AppState;

pub async fn list_staff(
    State(state): State<AppState>,
    CurrentUser(_claims): CurrentUser,
    Path(eatery_id): Path<i64>,
) -> Result<Json<Vec<StaffMemberResponse>>, AppError> {
    let staff = state.auth.staff_listing(eatery_id).await?;
    Ok(Json(staff))
}
