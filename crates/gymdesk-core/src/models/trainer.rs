use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::Resource;
use crate::forms::{non_negative_amount, FieldKind, FormSpec};

use super::{join_name, money, Id, MemberStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trainer {
    pub id: Id,
    pub gym_id: Id,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub experience_years: Option<i32>,
    pub salary: Option<Decimal>,
    #[serde(default)]
    pub status: MemberStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Trainer {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrainerDraft {
    pub gym_id: Id,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Enter a valid e-mail address"))]
    pub email: String,
    #[validate(length(min = 7, max = 20, message = "Enter a valid phone number"))]
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[validate(range(min = 0, max = 80, message = "Experience must be between 0 and 80 years"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<i32>,
    #[validate(custom(function = "non_negative_amount"))]
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "money::option")]
    pub salary: Option<Decimal>,
    pub status: MemberStatus,
}

impl Resource for Trainer {
    const PATH: &'static str = "trainers";
    const NAME: &'static str = "Trainer";
    type Draft = TrainerDraft;

    fn id(&self) -> Id {
        self.id
    }

    fn form() -> FormSpec {
        FormSpec::new("Trainer")
            .field("firstName", "First name", FieldKind::Text)
            .field("lastName", "Last name", FieldKind::Text)
            .field("email", "Email", FieldKind::Email)
            .field("phone", "Phone", FieldKind::Phone)
            .optional("specialization", "Specialization", FieldKind::Text)
            .optional("experienceYears", "Experience (years)", FieldKind::Integer)
            .optional("salary", "Monthly salary", FieldKind::Money)
            .field("status", "Status", FieldKind::Choice(MemberStatus::CHOICES))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::parse_draft;
    use serde_json::json;

    #[test]
    fn test_experience_range() {
        let built = json!({
            "gymId": 1, "firstName": "Sam", "lastName": "Lee", "email": "sam@example.com",
            "phone": "0700000000", "experienceYears": 95, "status": "ACTIVE"
        });
        let err = parse_draft::<TrainerDraft>(built).unwrap_err();
        assert_eq!(
            err.field_errors().unwrap()["experienceYears"],
            "Experience must be between 0 and 80 years"
        );
    }

    #[test]
    fn test_salary_serialized_as_number() {
        let built = json!({
            "gymId": 1, "firstName": "Sam", "lastName": "Lee", "email": "sam@example.com",
            "phone": "0700000000", "salary": "2500.5", "status": "ACTIVE"
        });
        let draft: TrainerDraft = parse_draft(built).unwrap();
        let wire = serde_json::to_value(&draft).unwrap();
        assert_eq!(wire["salary"], json!(2500.5));
        assert!(wire.get("experienceYears").is_none());
    }
}
