use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::Resource;
use crate::forms::{non_negative_amount, FieldKind, FormSpec};

use super::{money, Id};

wire_enum! {
    AccountType {
        Cash => "CASH",
        Bank => "BANK",
        MobileMoney => "MOBILE_MONEY",
        Other => "OTHER",
    }
}

/// A place money is kept: a till, a bank account, a mobile wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Id,
    pub gym_id: Id,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: AccountType,
    pub account_number: Option<String>,
    #[serde(default)]
    pub balance: Decimal,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AccountDraft {
    pub gym_id: Id,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AccountType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[validate(custom(function = "non_negative_amount"))]
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "money::option")]
    pub balance: Option<Decimal>,
    pub is_active: bool,
}

impl Resource for Account {
    const PATH: &'static str = "accounts";
    const NAME: &'static str = "Account";
    type Draft = AccountDraft;

    fn id(&self) -> Id {
        self.id
    }

    fn form() -> FormSpec {
        FormSpec::new("Account")
            .field("name", "Name", FieldKind::Text)
            .field("type", "Type", FieldKind::Choice(AccountType::CHOICES))
            .optional("accountNumber", "Account number", FieldKind::Text)
            .optional("balance", "Opening balance", FieldKind::Money)
            .field("isActive", "Active", FieldKind::Bool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::parse_draft;
    use serde_json::json;

    #[test]
    fn test_parse_account() {
        let acct: Account = serde_json::from_value(json!({
            "id": 3, "gymId": 1, "name": "Front desk", "type": "MOBILE_MONEY",
            "balance": 1520.75, "isActive": true
        }))
        .unwrap();
        assert_eq!(acct.kind, AccountType::MobileMoney);
        assert_eq!(acct.balance, Decimal::new(152075, 2));
    }

    #[test]
    fn test_negative_opening_balance_rejected() {
        let err = parse_draft::<AccountDraft>(json!({
            "gymId": 1, "name": "Till", "type": "CASH", "balance": "-1", "isActive": true
        }))
        .unwrap_err();
        assert_eq!(err.field_errors().unwrap()["balance"], "Amount cannot be negative");
    }
}
