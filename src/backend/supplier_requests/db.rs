/**
 * Supplier Request Queries
 *
 * Decisions run in a transaction holding the request row lock, so two admins
 * deciding the same request cannot both create an account.
 */

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::backend::auth::users::{create_user, NewUser, User};
use crate::backend::orders::placement::PgTransaction;
use crate::shared::supplier_request::{split_contact_name, AvailabilityField};
use crate::shared::{
    Role, SupplierRequest, SupplierRequestFilters, SupplierRequestInput, SupplierRequestStatus,
};

#[derive(Debug, sqlx::FromRow)]
struct RequestRow {
    id: i64,
    company_name: String,
    nit: String,
    contact_person: String,
    email: String,
    phone: String,
    address: Option<String>,
    city: Option<String>,
    product_types: String,
    message: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

const REQUEST_COLUMNS: &str = "id, company_name, nit, contact_person, email, phone, address, city, \
                               product_types, message, status, created_at";

impl RequestRow {
    fn into_request(self) -> Result<SupplierRequest, sqlx::Error> {
        let status = SupplierRequestStatus::from_str(&self.status).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown request status '{}'", self.status).into())
        })?;

        Ok(SupplierRequest {
            id: self.id,
            company_name: self.company_name,
            nit: self.nit,
            contact_person: self.contact_person,
            email: self.email,
            phone: self.phone,
            address: self.address,
            city: self.city,
            product_types: self.product_types,
            message: self.message,
            status,
            created_at: self.created_at,
        })
    }
}

/// Result of an admin decision
#[derive(Debug)]
pub enum DecisionOutcome {
    NotFound,
    /// The request was decided before
    AlreadyDecided(SupplierRequestStatus),
    /// The contact's email or phone belongs to an account; the request was
    /// rejected instead
    AccountExists(SupplierRequest),
    Rejected(SupplierRequest),
    Approved { request: SupplierRequest, supplier: User },
}

/// Whether `value` is already used by an account or another request
///
/// Emails are compared normalized. A NIT is only checked against requests.
pub async fn is_taken(pool: &PgPool, field: AvailabilityField, value: &str) -> Result<bool, sqlx::Error> {
    let sql = match field {
        AvailabilityField::Email => {
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1) \
             OR EXISTS (SELECT 1 FROM supplier_requests WHERE email = $1)"
        }
        AvailabilityField::Phone => {
            "SELECT EXISTS (SELECT 1 FROM users WHERE phone = $1) \
             OR EXISTS (SELECT 1 FROM supplier_requests WHERE phone = $1)"
        }
        AvailabilityField::Nit => "SELECT EXISTS (SELECT 1 FROM supplier_requests WHERE nit = $1)",
    };

    sqlx::query_scalar(sql).bind(value).fetch_one(pool).await
}

/// Store a new pending request; `email` must already be normalized
pub async fn create_request(
    pool: &PgPool,
    input: &SupplierRequestInput,
    email: &str,
) -> Result<SupplierRequest, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO supplier_requests
            (company_name, nit, contact_person, email, phone, address, city, product_types, message)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {}
        "#,
        REQUEST_COLUMNS
    );

    let row: RequestRow = sqlx::query_as(&sql)
        .bind(input.company_name.trim())
        .bind(input.nit.trim())
        .bind(input.contact_person.trim())
        .bind(email)
        .bind(&input.phone)
        .bind(input.address.as_deref().map(str::trim))
        .bind(input.city.as_deref().map(str::trim))
        .bind(input.product_types.trim())
        .bind(input.message.as_deref().map(str::trim))
        .fetch_one(pool)
        .await?;

    row.into_request()
}

/// Requests newest first, optionally of one status
pub async fn list_requests(
    pool: &PgPool,
    filters: &SupplierRequestFilters,
) -> Result<Vec<SupplierRequest>, sqlx::Error> {
    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM supplier_requests WHERE TRUE", REQUEST_COLUMNS));
    if let Some(status) = filters.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    query.push(" ORDER BY created_at DESC, id DESC");

    let rows: Vec<RequestRow> = query.build_query_as().fetch_all(pool).await?;
    rows.into_iter().map(RequestRow::into_request).collect()
}

async fn lock_request(tx: &mut PgTransaction<'_>, id: i64) -> Result<Option<SupplierRequest>, sqlx::Error> {
    let sql = format!("SELECT {} FROM supplier_requests WHERE id = $1 FOR UPDATE", REQUEST_COLUMNS);
    let row: Option<RequestRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&mut **tx).await?;
    row.map(RequestRow::into_request).transpose()
}

async fn set_request_status(
    tx: &mut PgTransaction<'_>,
    mut request: SupplierRequest,
    status: SupplierRequestStatus,
) -> Result<SupplierRequest, sqlx::Error> {
    sqlx::query("UPDATE supplier_requests SET status = $1, updated_at = NOW() WHERE id = $2")
        .bind(status.as_str())
        .bind(request.id)
        .execute(&mut **tx)
        .await?;
    request.status = status;
    Ok(request)
}

/// Approve a pending request and create the supplier account
///
/// `password_hash` is the hash of the one-time password handed to the
/// supplier.
pub async fn approve_request(pool: &PgPool, id: i64, password_hash: String) -> Result<DecisionOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(request) = lock_request(&mut tx, id).await? else {
        return Ok(DecisionOutcome::NotFound);
    };
    if request.status != SupplierRequestStatus::Pending {
        return Ok(DecisionOutcome::AlreadyDecided(request.status));
    }

    let account_exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 OR phone = $2)")
            .bind(&request.email)
            .bind(&request.phone)
            .fetch_one(&mut *tx)
            .await?;
    if account_exists {
        let request = set_request_status(&mut tx, request, SupplierRequestStatus::Rejected).await?;
        tx.commit().await?;
        tracing::warn!("Supplier request {} rejected: contact already has an account", id);
        return Ok(DecisionOutcome::AccountExists(request));
    }

    let (first_name, last_name) = split_contact_name(&request.contact_person);
    let supplier = create_user(
        &mut *tx,
        NewUser {
            first_name,
            last_name,
            phone: request.phone.clone(),
            email: request.email.clone(),
            password_hash,
            role: Role::Supplier,
        },
    )
    .await?;

    let request = set_request_status(&mut tx, request, SupplierRequestStatus::Approved).await?;
    tx.commit().await?;

    tracing::info!("Supplier request {} approved; supplier {} created", id, supplier.id);
    Ok(DecisionOutcome::Approved { request, supplier })
}

pub async fn reject_request(pool: &PgPool, id: i64) -> Result<DecisionOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(request) = lock_request(&mut tx, id).await? else {
        return Ok(DecisionOutcome::NotFound);
    };
    if request.status != SupplierRequestStatus::Pending {
        return Ok(DecisionOutcome::AlreadyDecided(request.status));
    }

    let request = set_request_status(&mut tx, request, SupplierRequestStatus::Rejected).await?;
    tx.commit().await?;

    tracing::info!("Supplier request {} rejected", id);
    Ok(DecisionOutcome::Rejected(request))
}
