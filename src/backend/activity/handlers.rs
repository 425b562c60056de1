//! Activity log handlers
//!
//! - `GET /api/admin/activity?admin_name=&action=&date=` - admin only

use axum::{
    extract::{Query, State},
    response::Json,
};
use sqlx::PgPool;

use crate::backend::activity::db;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::require_pool;
use crate::shared::{ActivityEntry, ActivityFilters, Role};

pub async fn list_activity(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Query(filters): Query<ActivityFilters>,
) -> Result<Json<Vec<ActivityEntry>>, BackendError> {
    user.require_role(&[Role::Admin])?;
    let pool = require_pool(pool)?;

    Ok(Json(db::list_activity(&pool, &filters).await?))
}
