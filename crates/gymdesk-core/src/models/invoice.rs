use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::api::Resource;
use crate::billing::Totals;
use crate::forms::{non_negative_amount, percentage, positive_amount, FieldKind, FormSpec};

use super::transaction::PaymentMethod;
use super::{money, Id};

wire_enum! {
    InvoiceStatus {
        Draft => "DRAFT",
        Pending => "PENDING",
        Paid => "PAID",
        Overdue => "OVERDUE",
        Cancelled => "CANCELLED",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(custom(function = "non_negative_amount"))]
    #[serde(serialize_with = "money::amount")]
    pub unit_price: Decimal,
}

impl InvoiceItem {
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Id,
    pub gym_id: Id,
    pub invoice_number: String,
    pub member_id: Option<Id>,
    pub subscription_id: Option<Id>,
    #[serde(default)]
    pub items: Vec<InvoiceItem>,
    pub subtotal: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub total: Decimal,
    #[serde(default)]
    pub status: InvoiceStatus,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<NaiveDate>,
    pub member_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Invoice {
    /// Pending invoices whose due date has passed are reported as overdue
    pub fn effective_status(&self, today: NaiveDate) -> InvoiceStatus {
        match (self.status, self.due_date) {
            (InvoiceStatus::Pending, Some(due)) if due < today => InvoiceStatus::Overdue,
            (status, _) => status,
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.effective_status(today) == InvoiceStatus::Overdue
    }

    /// Whether a payment can still be recorded against this invoice
    pub fn is_payable(&self) -> bool {
        matches!(
            self.status,
            InvoiceStatus::Pending | InvoiceStatus::Overdue | InvoiceStatus::Draft
        )
    }

    /// Totals recomputed from the line items
    pub fn computed_totals(&self) -> Totals {
        Totals::compute(&self.items, self.tax_rate.unwrap_or_default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_dates"))]
pub struct InvoiceDraft {
    pub gym_id: Id,
    #[validate(length(min = 1, message = "Invoice number is required"))]
    pub invoice_number: String,
    pub member_id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<Id>,
    #[validate(length(min = 1, message = "Add at least one item"), nested)]
    pub items: Vec<InvoiceItem>,
    #[validate(custom(function = "percentage"))]
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "money::option")]
    pub tax_rate: Option<Decimal>,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl InvoiceDraft {
    pub fn totals(&self) -> Totals {
        Totals::compute(&self.items, self.tax_rate.unwrap_or_default())
    }
}

fn validate_dates(draft: &InvoiceDraft) -> Result<(), ValidationError> {
    if draft.due_date < draft.issue_date {
        return Err(ValidationError::new("dates")
            .with_message("Due date cannot be before the issue date".into()));
    }
    Ok(())
}

impl Resource for Invoice {
    const PATH: &'static str = "invoices";
    const NAME: &'static str = "Invoice";
    type Draft = InvoiceDraft;

    fn id(&self) -> Id {
        self.id
    }

    fn form() -> FormSpec {
        FormSpec::new("Invoice")
            .field("invoiceNumber", "Invoice number", FieldKind::Text)
            .field("memberId", "Member id", FieldKind::Reference)
            .optional("subscriptionId", "Subscription id", FieldKind::Reference)
            .field("issueDate", "Issue date", FieldKind::Date)
            .field("dueDate", "Due date", FieldKind::Date)
            .field("status", "Status", FieldKind::Choice(InvoiceStatus::CHOICES))
            .field("items.0.description", "Item", FieldKind::Text)
            .field("items.0.quantity", "Quantity", FieldKind::Integer)
            .field("items.0.unitPrice", "Unit price", FieldKind::Money)
            .optional("taxRate", "Tax rate (%)", FieldKind::Money)
    }
}

/// Body of `POST /invoices/{id}/payments`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDraft {
    pub account_id: Id,
    pub method: PaymentMethod,
    #[validate(custom(function = "positive_amount"))]
    #[serde(serialize_with = "money::amount")]
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl PaymentDraft {
    pub fn form() -> FormSpec {
        FormSpec::new("Record payment")
            .field("accountId", "Account id", FieldKind::Reference)
            .field("method", "Method", FieldKind::Choice(PaymentMethod::CHOICES))
            .field("amount", "Amount", FieldKind::Money)
            .optional("reference", "Reference", FieldKind::Text)
            .optional("date", "Date", FieldKind::Date)
    }
}
