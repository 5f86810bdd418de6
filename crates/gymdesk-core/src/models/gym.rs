use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::Resource;
use crate::forms::{FieldKind, FormSpec};

use super::Id;

/// A tenant. Every other resource belongs to exactly one gym.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gym {
    pub id: Id,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GymDraft {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[validate(email(message = "Enter a valid e-mail address"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Resource for Gym {
    const PATH: &'static str = "gyms";
    const NAME: &'static str = "Gym";
    type Draft = GymDraft;

    fn id(&self) -> Id {
        self.id
    }

    fn form() -> FormSpec {
        FormSpec::new("Gym")
            .field("name", "Name", FieldKind::Text)
            .optional("address", "Address", FieldKind::Text)
            .optional("phone", "Phone", FieldKind::Phone)
            .optional("email", "Email", FieldKind::Email)
    }
}

/// The logged-in user as reported by `GET /auth/profile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Id,
    pub email: String,
    #[serde(default, alias = "fullName")]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub gym_id: Option<Id>,
    #[serde(default)]
    pub gym: Option<Gym>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&self.email)
    }
}
