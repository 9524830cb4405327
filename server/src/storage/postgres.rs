// server/src/storage/postgres.rs

//! Postgres-backed `StateStore`. Optimistic concurrency is a plain
//! `... WHERE id = $1 AND version = $2` update; the single-open-case
//! invariant is a partial unique index (see `schema.sql`), so the check and
//! the insert are one atomic statement. Queries are bound at runtime rather
//! than compile-checked so the crate builds without a live database.

use async_trait::async_trait;
use leash::{
  AdoptionCase, CaseStatus, DeadLetter, EntityKind, FulfillmentStatus, LeashResult, Listing,
  ListingStatus, Order, PaymentOutcome, PaymentStatus, StateStore, TransitionError,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub struct PgStateStore {
  pool: PgPool,
}

impl PgStateStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
    Ok(Self::new(PgPool::connect(database_url).await?))
  }
}

// Infrastructure failures are retryable for the reconciliation worker.
fn transient(err: sqlx::Error) -> TransitionError {
  TransitionError::Transient {
    source: anyhow::Error::new(err).context("postgres operation failed"),
  }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
  matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

// --- status <-> text mappings (TEXT columns, lowercase) ---

fn listing_status_str(s: ListingStatus) -> &'static str {
  match s {
    ListingStatus::Pending => "pending",
    ListingStatus::Available => "available",
    ListingStatus::Rescued => "rescued",
    ListingStatus::Adopted => "adopted",
    ListingStatus::Rejected => "rejected",
  }
}

fn listing_status_parse(raw: &str) -> LeashResult<ListingStatus> {
  match raw {
    "pending" => Ok(ListingStatus::Pending),
    "available" => Ok(ListingStatus::Available),
    "rescued" => Ok(ListingStatus::Rescued),
    "adopted" => Ok(ListingStatus::Adopted),
    "rejected" => Ok(ListingStatus::Rejected),
    other => Err(TransitionError::Transient {
      source: anyhow::anyhow!("unknown listing status in store: {other}"),
    }),
  }
}

fn case_status_str(s: CaseStatus) -> &'static str {
  match s {
    CaseStatus::Pending => "pending",
    CaseStatus::Approved => "approved",
    CaseStatus::Rejected => "rejected",
    CaseStatus::Cancelled => "cancelled",
  }
}

fn case_status_parse(raw: &str) -> LeashResult<CaseStatus> {
  match raw {
    "pending" => Ok(CaseStatus::Pending),
    "approved" => Ok(CaseStatus::Approved),
    "rejected" => Ok(CaseStatus::Rejected),
    "cancelled" => Ok(CaseStatus::Cancelled),
    other => Err(TransitionError::Transient {
      source: anyhow::anyhow!("unknown case status in store: {other}"),
    }),
  }
}

fn fulfillment_status_str(s: FulfillmentStatus) -> &'static str {
  match s {
    FulfillmentStatus::Pending => "pending",
    FulfillmentStatus::Confirmed => "confirmed",
    FulfillmentStatus::Shipping => "shipping",
    FulfillmentStatus::Completed => "completed",
    FulfillmentStatus::Cancelled => "cancelled",
  }
}

fn fulfillment_status_parse(raw: &str) -> LeashResult<FulfillmentStatus> {
  match raw {
    "pending" => Ok(FulfillmentStatus::Pending),
    "confirmed" => Ok(FulfillmentStatus::Confirmed),
    "shipping" => Ok(FulfillmentStatus::Shipping),
    "completed" => Ok(FulfillmentStatus::Completed),
    "cancelled" => Ok(FulfillmentStatus::Cancelled),
    other => Err(TransitionError::Transient {
      source: anyhow::anyhow!("unknown fulfillment status in store: {other}"),
    }),
  }
}

fn payment_status_str(s: PaymentStatus) -> &'static str {
  match s {
    PaymentStatus::Pending => "pending",
    PaymentStatus::Paid => "paid",
    PaymentStatus::Failed => "failed",
    PaymentStatus::Cancelled => "cancelled",
  }
}

fn payment_status_parse(raw: &str) -> LeashResult<PaymentStatus> {
  match raw {
    "pending" => Ok(PaymentStatus::Pending),
    "paid" => Ok(PaymentStatus::Paid),
    "failed" => Ok(PaymentStatus::Failed),
    "cancelled" => Ok(PaymentStatus::Cancelled),
    other => Err(TransitionError::Transient {
      source: anyhow::anyhow!("unknown payment status in store: {other}"),
    }),
  }
}

// --- row mappings ---

fn listing_from_row(row: &PgRow) -> LeashResult<Listing> {
  Ok(Listing {
    id: row.try_get("id").map_err(transient)?,
    shelter_id: row.try_get("shelter_id").map_err(transient)?,
    name: row.try_get("name").map_err(transient)?,
    species: row.try_get("species").map_err(transient)?,
    status: listing_status_parse(row.try_get::<String, _>("status").map_err(transient)?.as_str())?,
    version: row.try_get::<i64, _>("version").map_err(transient)? as u64,
    created_at: row.try_get("created_at").map_err(transient)?,
    updated_at: row.try_get("updated_at").map_err(transient)?,
  })
}

fn case_from_row(row: &PgRow) -> LeashResult<AdoptionCase> {
  Ok(AdoptionCase {
    id: row.try_get("id").map_err(transient)?,
    listing_id: row.try_get("listing_id").map_err(transient)?,
    requester_id: row.try_get("requester_id").map_err(transient)?,
    shelter_id: row.try_get("shelter_id").map_err(transient)?,
    status: case_status_parse(row.try_get::<String, _>("status").map_err(transient)?.as_str())?,
    version: row.try_get::<i64, _>("version").map_err(transient)? as u64,
    submitted_at: row.try_get("submitted_at").map_err(transient)?,
    decided_at: row.try_get("decided_at").map_err(transient)?,
  })
}

fn order_from_row(row: &PgRow) -> LeashResult<Order> {
  Ok(Order {
    id: row.try_get("id").map_err(transient)?,
    user_id: row.try_get("user_id").map_err(transient)?,
    total_amount_cents: row.try_get("total_amount_cents").map_err(transient)?,
    currency: row.try_get("currency").map_err(transient)?,
    order_status: fulfillment_status_parse(
      row.try_get::<String, _>("order_status").map_err(transient)?.as_str(),
    )?,
    payment_status: payment_status_parse(
      row.try_get::<String, _>("payment_status").map_err(transient)?.as_str(),
    )?,
    version: row.try_get::<i64, _>("version").map_err(transient)? as u64,
    created_at: row.try_get("created_at").map_err(transient)?,
    updated_at: row.try_get("updated_at").map_err(transient)?,
  })
}

/// Resolves a zero-row CAS update into the precise failure: the record is
/// either gone or at a different version.
async fn explain_cas_miss(
  pool: &PgPool,
  table: &str,
  kind: EntityKind,
  id: Uuid,
  expected_version: u64,
) -> TransitionError {
  let query = format!("SELECT version FROM {table} WHERE id = $1");
  match sqlx::query(&query).bind(id).fetch_optional(pool).await {
    Ok(Some(row)) => match row.try_get::<i64, _>("version") {
      Ok(found) => TransitionError::StaleState {
        kind,
        id,
        expected_version,
        found_version: found as u64,
      },
      Err(e) => transient(e),
    },
    Ok(None) => TransitionError::NotFound { kind, id },
    Err(e) => transient(e),
  }
}

#[async_trait]
impl StateStore for PgStateStore {
  async fn insert_listing(&self, listing: Listing) -> LeashResult<()> {
    sqlx::query(
      "INSERT INTO listings (id, shelter_id, name, species, status, version, created_at, updated_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(listing.id)
    .bind(listing.shelter_id)
    .bind(&listing.name)
    .bind(&listing.species)
    .bind(listing_status_str(listing.status))
    .bind(listing.version as i64)
    .bind(listing.created_at)
    .bind(listing.updated_at)
    .execute(&self.pool)
    .await
    .map_err(transient)?;
    Ok(())
  }

  async fn load_listing(&self, id: Uuid) -> LeashResult<Option<Listing>> {
    let row = sqlx::query("SELECT * FROM listings WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(transient)?;
    row.as_ref().map(listing_from_row).transpose()
  }

  async fn store_listing(&self, listing: &Listing, expected_version: u64) -> LeashResult<()> {
    let result = sqlx::query(
      "UPDATE listings SET status = $1, version = $2, updated_at = $3
       WHERE id = $4 AND version = $5",
    )
    .bind(listing_status_str(listing.status))
    .bind(listing.version as i64)
    .bind(listing.updated_at)
    .bind(listing.id)
    .bind(expected_version as i64)
    .execute(&self.pool)
    .await
    .map_err(transient)?;

    if result.rows_affected() == 0 {
      return Err(
        explain_cas_miss(
          &self.pool,
          "listings",
          EntityKind::Listing,
          listing.id,
          expected_version,
        )
        .await,
      );
    }
    Ok(())
  }

  async fn insert_case(&self, case: AdoptionCase) -> LeashResult<()> {
    // The partial unique index on (listing_id) WHERE status = 'pending'
    // makes the single-open-case check atomic with the insert.
    let result = sqlx::query(
      "INSERT INTO adoption_cases
         (id, listing_id, requester_id, shelter_id, status, version, submitted_at, decided_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(case.id)
    .bind(case.listing_id)
    .bind(case.requester_id)
    .bind(case.shelter_id)
    .bind(case_status_str(case.status))
    .bind(case.version as i64)
    .bind(case.submitted_at)
    .bind(case.decided_at)
    .execute(&self.pool)
    .await;

    match result {
      Ok(_) => Ok(()),
      Err(e) if is_unique_violation(&e) => Err(TransitionError::PreconditionFailed {
        kind: EntityKind::AdoptionCase,
        id: case.id,
        reason: format!("listing {} already has an open adoption case", case.listing_id),
      }),
      Err(e) => Err(transient(e)),
    }
  }

  async fn load_case(&self, id: Uuid) -> LeashResult<Option<AdoptionCase>> {
    let row = sqlx::query("SELECT * FROM adoption_cases WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(transient)?;
    row.as_ref().map(case_from_row).transpose()
  }

  async fn store_case(&self, case: &AdoptionCase, expected_version: u64) -> LeashResult<()> {
    let result = sqlx::query(
      "UPDATE adoption_cases SET status = $1, version = $2, decided_at = $3
       WHERE id = $4 AND version = $5",
    )
    .bind(case_status_str(case.status))
    .bind(case.version as i64)
    .bind(case.decided_at)
    .bind(case.id)
    .bind(expected_version as i64)
    .execute(&self.pool)
    .await
    .map_err(transient)?;

    if result.rows_affected() == 0 {
      return Err(
        explain_cas_miss(
          &self.pool,
          "adoption_cases",
          EntityKind::AdoptionCase,
          case.id,
          expected_version,
        )
        .await,
      );
    }
    Ok(())
  }

  async fn find_open_case(&self, listing_id: Uuid) -> LeashResult<Option<AdoptionCase>> {
    let row = sqlx::query(
      "SELECT * FROM adoption_cases WHERE listing_id = $1 AND status = 'pending'",
    )
    .bind(listing_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(transient)?;
    row.as_ref().map(case_from_row).transpose()
  }

  async fn store_case_and_listing(
    &self,
    case: &AdoptionCase,
    case_expected_version: u64,
    listing: &Listing,
    listing_expected_version: u64,
  ) -> LeashResult<()> {
    let mut tx = self.pool.begin().await.map_err(transient)?;

    let case_updated = sqlx::query(
      "UPDATE adoption_cases SET status = $1, version = $2, decided_at = $3
       WHERE id = $4 AND version = $5",
    )
    .bind(case_status_str(case.status))
    .bind(case.version as i64)
    .bind(case.decided_at)
    .bind(case.id)
    .bind(case_expected_version as i64)
    .execute(&mut *tx)
    .await
    .map_err(transient)?;
    if case_updated.rows_affected() == 0 {
      tx.rollback().await.map_err(transient)?;
      return Err(
        explain_cas_miss(
          &self.pool,
          "adoption_cases",
          EntityKind::AdoptionCase,
          case.id,
          case_expected_version,
        )
        .await,
      );
    }

    let listing_updated = sqlx::query(
      "UPDATE listings SET status = $1, version = $2, updated_at = $3
       WHERE id = $4 AND version = $5",
    )
    .bind(listing_status_str(listing.status))
    .bind(listing.version as i64)
    .bind(listing.updated_at)
    .bind(listing.id)
    .bind(listing_expected_version as i64)
    .execute(&mut *tx)
    .await
    .map_err(transient)?;
    if listing_updated.rows_affected() == 0 {
      // Roll the case move back too; the unit applies whole or not at all.
      tx.rollback().await.map_err(transient)?;
      return Err(
        explain_cas_miss(
          &self.pool,
          "listings",
          EntityKind::Listing,
          listing.id,
          listing_expected_version,
        )
        .await,
      );
    }

    tx.commit().await.map_err(transient)?;
    Ok(())
  }

  async fn insert_order(&self, order: Order) -> LeashResult<()> {
    sqlx::query(
      "INSERT INTO orders
         (id, user_id, total_amount_cents, currency, order_status, payment_status, version, created_at, updated_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(order.id)
    .bind(order.user_id)
    .bind(order.total_amount_cents)
    .bind(&order.currency)
    .bind(fulfillment_status_str(order.order_status))
    .bind(payment_status_str(order.payment_status))
    .bind(order.version as i64)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&self.pool)
    .await
    .map_err(transient)?;
    Ok(())
  }

  async fn load_order(&self, id: Uuid) -> LeashResult<Option<Order>> {
    let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(transient)?;
    row.as_ref().map(order_from_row).transpose()
  }

  async fn store_order(&self, order: &Order, expected_version: u64) -> LeashResult<()> {
    let result = sqlx::query(
      "UPDATE orders SET order_status = $1, payment_status = $2, version = $3, updated_at = $4
       WHERE id = $5 AND version = $6",
    )
    .bind(fulfillment_status_str(order.order_status))
    .bind(payment_status_str(order.payment_status))
    .bind(order.version as i64)
    .bind(order.updated_at)
    .bind(order.id)
    .bind(expected_version as i64)
    .execute(&self.pool)
    .await
    .map_err(transient)?;

    if result.rows_affected() == 0 {
      return Err(
        explain_cas_miss(
          &self.pool,
          "orders",
          EntityKind::OrderPayment,
          order.id,
          expected_version,
        )
        .await,
      );
    }
    Ok(())
  }

  async fn append_dead_letter(&self, entry: DeadLetter) -> LeashResult<()> {
    let attempted = match entry.attempted {
      PaymentOutcome::Paid => "paid",
      PaymentOutcome::Failed => "failed",
    };
    sqlx::query(
      "INSERT INTO reconciliation_dead_letters
         (order_id, attempted, attempts, last_error, recorded_at)
       VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(entry.order_id)
    .bind(attempted)
    .bind(entry.attempts as i32)
    .bind(&entry.last_error)
    .bind(entry.recorded_at)
    .execute(&self.pool)
    .await
    .map_err(transient)?;
    Ok(())
  }

  async fn dead_letters_for(&self, order_id: Uuid) -> LeashResult<Vec<DeadLetter>> {
    let rows = sqlx::query(
      "SELECT order_id, attempted, attempts, last_error, recorded_at
       FROM reconciliation_dead_letters WHERE order_id = $1 ORDER BY recorded_at",
    )
    .bind(order_id)
    .fetch_all(&self.pool)
    .await
    .map_err(transient)?;

    rows
      .iter()
      .map(|row| {
        let attempted = match row.try_get::<String, _>("attempted").map_err(transient)?.as_str() {
          "paid" => PaymentOutcome::Paid,
          _ => PaymentOutcome::Failed,
        };
        Ok(DeadLetter {
          order_id: row.try_get("order_id").map_err(transient)?,
          attempted,
          attempts: row.try_get::<i32, _>("attempts").map_err(transient)? as u32,
          last_error: row.try_get("last_error").map_err(transient)?,
          recorded_at: row.try_get("recorded_at").map_err(transient)?,
        })
      })
      .collect()
  }
}
