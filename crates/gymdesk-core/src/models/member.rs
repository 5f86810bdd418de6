use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::Resource;
use crate::forms::{FieldKind, FormSpec};

use super::{join_name, Id};

wire_enum! {
    MemberStatus {
        Active => "ACTIVE",
        Inactive => "INACTIVE",
        Suspended => "SUSPENDED",
    }
}

const GENDERS: &[&str] = &["MALE", "FEMALE", "OTHER"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: Id,
    pub gym_id: Id,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub join_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: MemberStatus,
    pub trainer_id: Option<Id>,
    pub emergency_contact: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Member {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }

    /// Age in whole years on `today`
    pub fn age(&self, today: NaiveDate) -> Option<u32> {
        let dob = self.date_of_birth?;
        let mut years = today.year() - dob.year();
        if (today.month(), today.day()) < (dob.month(), dob.day()) {
            years -= 1;
        }
        u32::try_from(years).ok()
    }

    /// When the member joined, falling back to the record creation time
    pub fn joined_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.or_else(|| {
            self.join_date
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MemberDraft {
    pub gym_id: Id,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Enter a valid e-mail address"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[validate(length(min = 7, max = 20, message = "Enter a valid phone number"))]
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_date: Option<NaiveDate>,
    pub status: MemberStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trainer_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
}

impl Resource for Member {
    const PATH: &'static str = "members";
    const NAME: &'static str = "Member";
    type Draft = MemberDraft;

    fn id(&self) -> Id {
        self.id
    }

    fn form() -> FormSpec {
        FormSpec::new("Member")
            .field("firstName", "First name", FieldKind::Text)
            .field("lastName", "Last name", FieldKind::Text)
            .optional("email", "Email", FieldKind::Email)
            .field("phone", "Phone", FieldKind::Phone)
            .optional("dateOfBirth", "Date of birth", FieldKind::Date)
            .optional("gender", "Gender", FieldKind::Choice(GENDERS))
            .optional("address", "Address", FieldKind::Text)
            .optional("joinDate", "Join date", FieldKind::Date)
            .field("status", "Status", FieldKind::Choice(MemberStatus::CHOICES))
            .optional("trainerId", "Trainer id", FieldKind::Reference)
            .optional("emergencyContact", "Emergency contact", FieldKind::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::parse_draft;

    fn member_json() -> &'static str {
        r#"{
            "id": 12, "gymId": 3, "firstName": "Ada", "lastName": "Lovelace",
            "email": "ada@example.com", "phone": "0712345678",
            "dateOfBirth": "1990-06-15", "status": "ACTIVE", "trainerId": null,
            "createdAt": "2025-01-02T08:00:00Z"
        }"#
    }

    #[test]
    fn test_parse_member() {
        let m: Member = serde_json::from_str(member_json()).unwrap();
        assert_eq!(m.full_name(), "Ada Lovelace");
        assert!(m.is_active());
        assert_eq!(m.gym_id, 3);
        assert!(m.join_date.is_none());
    }

    #[test]
    fn test_unknown_status_tolerated() {
        let json = r#"{"id": 1, "gymId": 1, "firstName": "A", "lastName": "B", "status": "FROZEN"}"#;
        let m: Member = serde_json::from_str(json).unwrap();
        assert_eq!(m.status, MemberStatus::Unknown);
        assert_eq!(m.status.to_string(), "Unknown");
    }

    #[test]
    fn test_age() {
        let m: Member = serde_json::from_str(member_json()).unwrap();
        let before_birthday = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        let on_birthday = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(m.age(before_birthday), Some(34));
        assert_eq!(m.age(on_birthday), Some(35));
    }

    #[test]
    fn test_member_form_to_draft() {
        let values: Vec<String> = [
            "Ada", "Lovelace", "ada@example.com", "0712345678", "1990-06-15", "female", "", "",
            "ACTIVE", "4", "",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let built = Member::form().build(&values, Some(3)).unwrap();
        let draft: MemberDraft = parse_draft(built).unwrap();
        assert_eq!(draft.gym_id, 3);
        assert_eq!(draft.gender.as_deref(), Some("FEMALE"));
        assert_eq!(draft.trainer_id, Some(4));
        assert_eq!(draft.status, MemberStatus::Active);
    }

    #[test]
    fn test_member_draft_rejects_short_phone() {
        let values: Vec<String> = ["Ada", "Lovelace", "", "123", "", "", "", "", "ACTIVE", "", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let built = Member::form().build(&values, Some(3)).unwrap();
        let err = parse_draft::<MemberDraft>(built).unwrap_err();
        assert_eq!(err.field_errors().unwrap()["phone"], "Enter a valid phone number");
    }
}
