// leash/src/model/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fulfillment axis of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentStatus {
  Pending,
  Confirmed,
  Shipping,
  Completed,
  Cancelled,
}

impl std::fmt::Display for FulfillmentStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      FulfillmentStatus::Pending => "pending",
      FulfillmentStatus::Confirmed => "confirmed",
      FulfillmentStatus::Shipping => "shipping",
      FulfillmentStatus::Completed => "completed",
      FulfillmentStatus::Cancelled => "cancelled",
    };
    f.write_str(name)
  }
}

/// Money axis of an order. Leaves `Pending` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Pending,
  Paid,
  Failed,
  Cancelled,
}

impl std::fmt::Display for PaymentStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      PaymentStatus::Pending => "pending",
      PaymentStatus::Paid => "paid",
      PaymentStatus::Failed => "failed",
      PaymentStatus::Cancelled => "cancelled",
    };
    f.write_str(name)
  }
}

/// A product purchase, independent of adoption. Fulfillment and payment are
/// tracked on separate axes (an order can be fulfillment-pending while
/// already paid); a single `version` counter orders all writes to the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub total_amount_cents: i64,
  pub currency: String,
  pub order_status: FulfillmentStatus,
  pub payment_status: PaymentStatus,
  pub version: u64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  pub fn new(user_id: Uuid, total_amount_cents: i64, currency: impl Into<String>) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      user_id,
      total_amount_cents,
      currency: currency.into(),
      order_status: FulfillmentStatus::Pending,
      payment_status: PaymentStatus::Pending,
      version: 0,
      created_at: now,
      updated_at: now,
    }
  }
}
