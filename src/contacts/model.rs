//! Trusted contact data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ContactError;

/// How a trusted contact is related to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    Spouse,
    Parent,
    Child,
    Sibling,
    Friend,
    Other,
}

impl Relationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Spouse => "spouse",
            Relationship::Parent => "parent",
            Relationship::Child => "child",
            Relationship::Sibling => "sibling",
            Relationship::Friend => "friend",
            Relationship::Other => "other",
        }
    }
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Relationship {
    type Err = ContactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spouse" => Ok(Relationship::Spouse),
            "parent" => Ok(Relationship::Parent),
            "child" => Ok(Relationship::Child),
            "sibling" => Ok(Relationship::Sibling),
            "friend" => Ok(Relationship::Friend),
            "other" => Ok(Relationship::Other),
            _ => Err(ContactError::InvalidRelationship(s.to_string())),
        }
    }
}

/// A person the user trusts; mentioned to the model so it can spot
/// impersonation of family and friends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustedContact {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub relationship: Relationship,
    pub created_at: DateTime<Utc>,
}

impl TrustedContact {
    /// Prompt description, e.g. `Mary (child)`.
    pub fn description(&self) -> String {
        format!("{} ({})", self.name, self.relationship)
    }
}

/// Fields for a new contact, as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewContact {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub relationship: String,
}

/// Partial edit; `None` leaves the field unchanged. An empty string clears
/// `phone` or `email`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
}
