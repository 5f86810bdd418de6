use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::Resource;
use crate::forms::{positive_amount, FieldKind, FormSpec};

use super::{money, Id};

/// A membership plan members subscribe to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: Id,
    pub gym_id: Id,
    pub name: String,
    pub description: Option<String>,
    pub duration_days: i32,
    pub price: Decimal,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Package {
    /// "30 days", "1 year"
    pub fn duration_label(&self) -> String {
        match self.duration_days {
            1 => "1 day".to_string(),
            365 => "1 year".to_string(),
            d if d % 30 == 0 && d < 365 => match d / 30 {
                1 => "1 month".to_string(),
                n => format!("{} months", n),
            },
            d => format!("{} days", d),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PackageDraft {
    pub gym_id: Id,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 3650, message = "Duration must be between 1 and 3650 days"))]
    pub duration_days: i32,
    #[validate(custom(function = "positive_amount"))]
    #[serde(serialize_with = "money::amount")]
    pub price: Decimal,
    pub is_active: bool,
}

impl Resource for Package {
    const PATH: &'static str = "packages";
    const NAME: &'static str = "Package";
    type Draft = PackageDraft;

    fn id(&self) -> Id {
        self.id
    }

    fn form() -> FormSpec {
        FormSpec::new("Package")
            .field("name", "Name", FieldKind::Text)
            .optional("description", "Description", FieldKind::Text)
            .field("durationDays", "Duration (days)", FieldKind::Integer)
            .field("price", "Price", FieldKind::Money)
            .field("isActive", "Active", FieldKind::Bool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::parse_draft;
    use serde_json::json;

    fn package(days: i32) -> Package {
        Package {
            id: 1,
            gym_id: 1,
            name: "Gold".to_string(),
            description: None,
            duration_days: days,
            price: Decimal::new(4999, 2),
            is_active: true,
        }
    }

    #[test]
    fn test_duration_label() {
        assert_eq!(package(1).duration_label(), "1 day");
        assert_eq!(package(30).duration_label(), "1 month");
        assert_eq!(package(90).duration_label(), "3 months");
        assert_eq!(package(365).duration_label(), "1 year");
        assert_eq!(package(45).duration_label(), "45 days");
    }

    #[test]
    fn test_price_from_number_or_string() {
        let a: Package = serde_json::from_value(json!({
            "id": 1, "gymId": 1, "name": "A", "durationDays": 30, "price": 49.99
        }))
        .unwrap();
        let b: Package = serde_json::from_value(json!({
            "id": 2, "gymId": 1, "name": "B", "durationDays": 30, "price": "49.99"
        }))
        .unwrap();
        assert_eq!(a.price, b.price);
        assert!(a.is_active);
    }

    #[test]
    fn test_draft_rules() {
        let err = parse_draft::<PackageDraft>(json!({
            "gymId": 1, "name": "Zero", "durationDays": 0, "price": "0", "isActive": true
        }))
        .unwrap_err();
        let errors = err.field_errors().unwrap();
        assert_eq!(errors["durationDays"], "Duration must be between 1 and 3650 days");
        assert_eq!(errors["price"], "Amount must be greater than zero");
    }
}
