use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::Resource;
use crate::forms::{positive_amount, FieldKind, FormSpec};

use super::{money, Id};

wire_enum! {
    TransactionType {
        Income => "INCOME",
        Expense => "EXPENSE",
    }
}

wire_enum! {
    PaymentMethod {
        Cash => "CASH",
        Card => "CARD",
        BankTransfer => "BANK_TRANSFER",
        Online => "ONLINE",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Id,
    pub gym_id: Id,
    pub invoice_id: Option<Id>,
    pub member_id: Option<Id>,
    pub account_id: Option<Id>,
    pub amount: Decimal,
    #[serde(rename = "type", default)]
    pub kind: TransactionType,
    #[serde(default)]
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    /// Amount with its sign: income positive, expense negative
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionType::Expense => -self.amount,
            _ => self.amount,
        }
    }

    /// Booking date, falling back to the creation time
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .or(self.created_at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    pub gym_id: Id,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[validate(custom(function = "positive_amount"))]
    #[serde(serialize_with = "money::amount")]
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub account_id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: NaiveDate,
}

impl Resource for Transaction {
    const PATH: &'static str = "transactions";
    const NAME: &'static str = "Transaction";
    type Draft = TransactionDraft;

    fn id(&self) -> Id {
        self.id
    }

    fn form() -> FormSpec {
        FormSpec::new("Transaction")
            .field("type", "Type", FieldKind::Choice(TransactionType::CHOICES))
            .field("amount", "Amount", FieldKind::Money)
            .field("method", "Method", FieldKind::Choice(PaymentMethod::CHOICES))
            .field("accountId", "Account id", FieldKind::Reference)
            .optional("invoiceId", "Invoice id", FieldKind::Reference)
            .optional("memberId", "Member id", FieldKind::Reference)
            .optional("reference", "Reference", FieldKind::Text)
            .optional("description", "Description", FieldKind::Text)
            .field("date", "Date", FieldKind::Date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_field_renamed() {
        let tx: Transaction = serde_json::from_value(json!({
            "id": 1, "gymId": 1, "amount": "20.00", "type": "EXPENSE",
            "method": "BANK_TRANSFER", "date": "2025-02-10"
        }))
        .unwrap();
        assert_eq!(tx.kind, TransactionType::Expense);
        assert_eq!(tx.method.to_string(), "Bank Transfer");
        assert_eq!(tx.signed_amount(), Decimal::new(-2000, 2));
        assert!(!tx.is_income());
    }

    #[test]
    fn test_unknown_method_tolerated() {
        let tx: Transaction = serde_json::from_value(json!({
            "id": 1, "gymId": 1, "amount": 5, "type": "INCOME", "method": "CRYPTO"
        }))
        .unwrap();
        assert_eq!(tx.method, PaymentMethod::Unknown);
        assert!(tx.occurred_at().is_none());
    }
}
