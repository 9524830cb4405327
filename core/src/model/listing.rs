// leash/src/model/listing.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
  Pending,
  Available,
  Rescued,
  Adopted,
  Rejected,
}

impl std::fmt::Display for ListingStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      ListingStatus::Pending => "pending",
      ListingStatus::Available => "available",
      ListingStatus::Rescued => "rescued",
      ListingStatus::Adopted => "adopted",
      ListingStatus::Rejected => "rejected",
    };
    f.write_str(name)
  }
}

/// An animal record open for adoption. Created `Pending` by its shelter and
/// never deleted, only terminal-stated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
  pub id: Uuid,
  pub shelter_id: Uuid,
  pub name: String,
  pub species: String,
  pub status: ListingStatus,
  pub version: u64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Listing {
  pub fn new(shelter_id: Uuid, name: impl Into<String>, species: impl Into<String>) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      shelter_id,
      name: name.into(),
      species: species.into(),
      status: ListingStatus::Pending,
      version: 0,
      created_at: now,
      updated_at: now,
    }
  }
}
