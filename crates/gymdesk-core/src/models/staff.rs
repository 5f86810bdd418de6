use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::Resource;
use crate::forms::{non_negative_amount, FieldKind, FormSpec};

use super::{join_name, money, Id, MemberStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: Id,
    pub gym_id: Id,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub salary: Option<Decimal>,
    pub hire_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: MemberStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Staff {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StaffDraft {
    pub gym_id: Id,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Enter a valid e-mail address"))]
    pub email: String,
    #[validate(length(min = 7, max = 20, message = "Enter a valid phone number"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Position is required"))]
    pub position: String,
    #[validate(custom(function = "non_negative_amount"))]
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "money::option")]
    pub salary: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<NaiveDate>,
    pub status: MemberStatus,
}

impl Resource for Staff {
    const PATH: &'static str = "staff";
    const NAME: &'static str = "Staff member";
    type Draft = StaffDraft;

    fn id(&self) -> Id {
        self.id
    }

    fn form() -> FormSpec {
        FormSpec::new("Staff member")
            .field("firstName", "First name", FieldKind::Text)
            .field("lastName", "Last name", FieldKind::Text)
            .field("email", "Email", FieldKind::Email)
            .field("phone", "Phone", FieldKind::Phone)
            .field("position", "Position", FieldKind::Text)
            .optional("salary", "Monthly salary", FieldKind::Money)
            .optional("hireDate", "Hire date", FieldKind::Date)
            .field("status", "Status", FieldKind::Choice(MemberStatus::CHOICES))
    }
}
