// leash/src/model/case.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
  Pending,
  Approved,
  Rejected,
  Cancelled,
}

impl std::fmt::Display for CaseStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      CaseStatus::Pending => "pending",
      CaseStatus::Approved => "approved",
      CaseStatus::Rejected => "rejected",
      CaseStatus::Cancelled => "cancelled",
    };
    f.write_str(name)
  }
}

/// One user's request to adopt one listing.
///
/// Opening a case is itself an engine-validated operation (the listing must be
/// available, and only one pending case may exist per listing), so a freshly
/// opened case already sits at version 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdoptionCase {
  pub id: Uuid,
  pub listing_id: Uuid,
  pub requester_id: Uuid,
  /// Owner of the referenced listing, denormalized so the decision gate can
  /// bind ownership without a second lookup.
  pub shelter_id: Uuid,
  pub status: CaseStatus,
  pub version: u64,
  pub submitted_at: DateTime<Utc>,
  /// Set exactly when a terminal status is reached.
  pub decided_at: Option<DateTime<Utc>>,
}

impl AdoptionCase {
  pub fn open(listing_id: Uuid, requester_id: Uuid, shelter_id: Uuid) -> Self {
    Self {
      id: Uuid::new_v4(),
      listing_id,
      requester_id,
      shelter_id,
      status: CaseStatus::Pending,
      version: 1,
      submitted_at: Utc::now(),
      decided_at: None,
    }
  }
}
