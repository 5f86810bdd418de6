use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::Resource;
use crate::forms::{positive_amount, FieldKind, FormSpec};

use super::transaction::PaymentMethod;
use super::{money, Id};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseCategory {
    pub id: Id,
    pub gym_id: Id,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseCategoryDraft {
    pub gym_id: Id,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Resource for ExpenseCategory {
    const PATH: &'static str = "expense-categories";
    const NAME: &'static str = "Expense category";
    type Draft = ExpenseCategoryDraft;

    fn id(&self) -> Id {
        self.id
    }

    fn form() -> FormSpec {
        FormSpec::new("Expense category")
            .field("name", "Name", FieldKind::Text)
            .optional("description", "Description", FieldKind::Text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Id,
    pub gym_id: Id,
    pub category_id: Option<Id>,
    pub account_id: Option<Id>,
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Present when the backend embeds the category
    pub category: Option<ExpenseCategory>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Expense {
    pub fn category_name(&self) -> &str {
        self.category.as_ref().map(|c| c.name.as_str()).unwrap_or("Uncategorized")
    }

    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .or(self.created_at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDraft {
    pub gym_id: Id,
    pub category_id: Id,
    pub account_id: Id,
    #[validate(custom(function = "positive_amount"))]
    #[serde(serialize_with = "money::amount")]
    pub amount: Decimal,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    pub date: NaiveDate,
    pub payment_method: PaymentMethod,
}

impl Resource for Expense {
    const PATH: &'static str = "expenses";
    const NAME: &'static str = "Expense";
    type Draft = ExpenseDraft;

    fn id(&self) -> Id {
        self.id
    }

    fn form() -> FormSpec {
        FormSpec::new("Expense")
            .field("categoryId", "Category id", FieldKind::Reference)
            .field("accountId", "Account id", FieldKind::Reference)
            .field("amount", "Amount", FieldKind::Money)
            .field("description", "Description", FieldKind::Text)
            .field("date", "Date", FieldKind::Date)
            .field("paymentMethod", "Payment method", FieldKind::Choice(PaymentMethod::CHOICES))
    }
}
