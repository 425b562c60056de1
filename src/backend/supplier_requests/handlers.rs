/**
 * Supplier Request Handlers
 *
 * # Endpoints
 *
 * Public:
 * - `POST /api/supplier-requests` - Submit a request (201)
 * - `POST /api/supplier-requests/validate` - Is an email, phone or NIT taken?
 *
 * Admin:
 * - `GET /api/admin/supplier-requests?status=`
 * - `PUT /api/admin/supplier-requests/{id}/status` - Approve or reject
 *
 * # Approval
 *
 * The new supplier's one-time password is returned to the admin only, in
 * the decision response. It is never stored in clear.
 */

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use bcrypt::{hash, DEFAULT_COST};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::activity::log_admin_activity;
use crate::backend::auth::handlers::types::normalize_email;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::notifications::notify_admins;
use crate::backend::server::state::require_pool;
use crate::backend::supplier_requests::db::{self, DecisionOutcome};
use crate::shared::supplier_request::{Availability, AvailabilityCheck, AvailabilityField};
use crate::shared::{
    AdminAction, Role, SupplierDecision, SupplierDecisionRequest, SupplierDecisionResponse,
    SupplierRequest, SupplierRequestFilters, SupplierRequestInput,
};

/// Length of the one-time password given to an approved supplier
pub const TEMPORARY_PASSWORD_LEN: usize = 16;

pub fn temporary_password() -> String {
    Uuid::new_v4().simple().to_string()[..TEMPORARY_PASSWORD_LEN].to_string()
}

pub async fn submit_request(
    State(pool): State<Option<PgPool>>,
    Json(input): Json<SupplierRequestInput>,
) -> Result<(StatusCode, Json<SupplierRequest>), BackendError> {
    input.validate()?;
    let pool = require_pool(pool)?;

    let email = normalize_email(&input.email);
    for (field, value, message) in [
        (AvailabilityField::Email, email.as_str(), "Email already registered"),
        (AvailabilityField::Phone, input.phone.as_str(), "Phone already registered"),
        (AvailabilityField::Nit, input.nit.trim(), "A request for this NIT already exists"),
    ] {
        if db::is_taken(&pool, field, value).await? {
            tracing::warn!("Supplier request with taken {:?}: {}", field, value);
            return Err(BackendError::conflict(message));
        }
    }

    let request = db::create_request(&pool, &input, &email).await.map_err(|e| {
        let duplicate = matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
        if duplicate {
            BackendError::conflict("Email, phone or NIT already registered")
        } else {
            BackendError::from(e)
        }
    })?;

    tracing::info!("Supplier request {} submitted by {}", request.id, request.company_name);

    let message = format!("New supplier request from {}.", request.company_name);
    if let Err(e) = notify_admins(&pool, &message, Some("/admin/supplier-requests")).await {
        tracing::warn!("Failed to notify admins about supplier request {}: {:?}", request.id, e);
    }

    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn check_availability(
    State(pool): State<Option<PgPool>>,
    Json(check): Json<AvailabilityCheck>,
) -> Result<Json<Availability>, BackendError> {
    let pool = require_pool(pool)?;

    let value = match check.field {
        AvailabilityField::Email => normalize_email(&check.value),
        AvailabilityField::Phone | AvailabilityField::Nit => check.value.trim().to_string(),
    };
    let is_taken = db::is_taken(&pool, check.field, &value).await?;

    Ok(Json(Availability { is_taken }))
}

pub async fn list_requests(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Query(filters): Query<SupplierRequestFilters>,
) -> Result<Json<Vec<SupplierRequest>>, BackendError> {
    user.require_role(&[Role::Admin])?;
    let pool = require_pool(pool)?;

    Ok(Json(db::list_requests(&pool, &filters).await?))
}

pub async fn decide_request(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Path(request_id): Path<i64>,
    Json(decision): Json<SupplierDecisionRequest>,
) -> Result<Json<SupplierDecisionResponse>, BackendError> {
    user.require_role(&[Role::Admin])?;
    let pool = require_pool(pool)?;

    let (outcome, password) = match decision.status {
        SupplierDecision::Approved => {
            let password = temporary_password();
            let password_hash = hash(&password, DEFAULT_COST).map_err(|e| {
                tracing::error!("Failed to hash password: {:?}", e);
                BackendError::internal("Server error")
            })?;
            (db::approve_request(&pool, request_id, password_hash).await?, Some(password))
        }
        SupplierDecision::Rejected => (db::reject_request(&pool, request_id).await?, None),
    };

    let (request, supplier) = match outcome {
        DecisionOutcome::NotFound => return Err(BackendError::not_found("Supplier request not found")),
        DecisionOutcome::AlreadyDecided(status) => {
            return Err(BackendError::conflict(format!("Request was already {}", status)))
        }
        DecisionOutcome::AccountExists(request) => {
            log_decision(&pool, user.user_id, &request, Some("contact already has an account")).await;
            return Err(BackendError::conflict(
                "The contact's email or phone already has an account; the request was rejected",
            ));
        }
        DecisionOutcome::Rejected(request) => (request, None),
        DecisionOutcome::Approved { request, supplier } => (request, Some(supplier.profile())),
    };

    log_decision(&pool, user.user_id, &request, None).await;

    Ok(Json(SupplierDecisionResponse {
        request_id: request.id,
        status: request.status,
        temporary_password: supplier.as_ref().and(password),
        supplier,
    }))
}

async fn log_decision(pool: &PgPool, admin_id: Uuid, request: &SupplierRequest, reason: Option<&str>) {
    log_admin_activity(
        pool,
        admin_id,
        AdminAction::SupplierRequestUpdated,
        "supplier_request",
        &request.id.to_string(),
        json!({
            "request_id": request.id,
            "company_name": request.company_name,
            "status": request.status,
            "reason": reason,
        }),
    )
    .await;
}
