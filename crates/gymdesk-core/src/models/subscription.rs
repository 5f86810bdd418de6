use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::api::Resource;
use crate::forms::{non_negative_amount, FieldKind, FormSpec};

use super::{money, Id};

wire_enum! {
    SubscriptionStatus {
        Active => "ACTIVE",
        Pending => "PENDING",
        Expired => "EXPIRED",
        Cancelled => "CANCELLED",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Id,
    pub gym_id: Id,
    pub member_id: Id,
    pub package_id: Id,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub auto_renew: bool,
    /// Denormalized names some endpoints include
    pub member_name: Option<String>,
    pub package_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Subscription {
    /// Whole days until the end date: 0 on the last day, negative once past it
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.end_date - today).num_days()
    }

    /// Active and ending within `within_days`
    pub fn is_expiring(&self, today: NaiveDate, within_days: i64) -> bool {
        self.effective_status(today) == SubscriptionStatus::Active
            && (0..=within_days).contains(&self.days_remaining(today))
    }

    /// Active subscriptions past their end date read as expired
    pub fn effective_status(&self, today: NaiveDate) -> SubscriptionStatus {
        match self.status {
            SubscriptionStatus::Active if self.end_date < today => SubscriptionStatus::Expired,
            status => status,
        }
    }

    pub fn can_cancel(&self) -> bool {
        matches!(self.status, SubscriptionStatus::Active | SubscriptionStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_period"))]
pub struct SubscriptionDraft {
    pub gym_id: Id,
    pub member_id: Id,
    pub package_id: Id,
    pub start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[validate(custom(function = "non_negative_amount"))]
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "money::option")]
    pub amount: Option<Decimal>,
    pub auto_renew: bool,
}

fn validate_period(draft: &SubscriptionDraft) -> Result<(), ValidationError> {
    match draft.end_date {
        Some(end) if end <= draft.start_date => Err(ValidationError::new("period")
            .with_message("End date must be after the start date".into())),
        _ => Ok(()),
    }
}

impl Resource for Subscription {
    const PATH: &'static str = "subscriptions";
    const NAME: &'static str = "Subscription";
    type Draft = SubscriptionDraft;

    fn id(&self) -> Id {
        self.id
    }

    fn form() -> FormSpec {
        FormSpec::new("Subscription")
            .field("memberId", "Member id", FieldKind::Reference)
            .field("packageId", "Package id", FieldKind::Reference)
            .field("startDate", "Start date", FieldKind::Date)
            .optional("endDate", "End date", FieldKind::Date)
            .optional("amount", "Amount", FieldKind::Money)
            .field("autoRenew", "Auto renew", FieldKind::Bool)
    }
}
