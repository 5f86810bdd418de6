use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::api::Resource;
use crate::forms::{positive_amount, FieldKind, FormSpec};

use super::{money, Id};

wire_enum! {
    EmployeeType {
        Trainer => "TRAINER",
        Staff => "STAFF",
    }
}

wire_enum! {
    SalaryStatus {
        Pending => "PENDING",
        Paid => "PAID",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Salary {
    pub id: Id,
    pub gym_id: Id,
    pub employee_id: Id,
    #[serde(default)]
    pub employee_type: EmployeeType,
    pub employee_name: Option<String>,
    pub amount: Decimal,
    /// `YYYY-MM`
    pub month: String,
    #[serde(default)]
    pub status: SalaryStatus,
    pub paid_date: Option<NaiveDate>,
    pub account_id: Option<Id>,
}

impl Salary {
    pub fn is_paid(&self) -> bool {
        self.status == SalaryStatus::Paid
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SalaryDraft {
    pub gym_id: Id,
    pub employee_id: Id,
    pub employee_type: EmployeeType,
    #[validate(custom(function = "positive_amount"))]
    #[serde(serialize_with = "money::amount")]
    pub amount: Decimal,
    #[validate(custom(function = "valid_month"))]
    pub month: String,
    pub status: SalaryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Id>,
}

fn valid_month(month: &str) -> Result<(), ValidationError> {
    NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ValidationError::new("month").with_message("Month must be YYYY-MM".into()))
}

/// Body of `POST /salaries/{id}/pay`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryPayment {
    pub account_id: Id,
    pub paid_date: NaiveDate,
}

impl SalaryPayment {
    pub fn today(account_id: Id) -> Self {
        Self {
            account_id,
            paid_date: Utc::now().date_naive(),
        }
    }

    pub fn form() -> FormSpec {
        FormSpec::new("Pay salary").field("accountId", "Paid from account id", FieldKind::Reference)
    }
}

impl Resource for Salary {
    const PATH: &'static str = "salaries";
    const NAME: &'static str = "Salary";
    type Draft = SalaryDraft;

    fn id(&self) -> Id {
        self.id
    }

    fn form() -> FormSpec {
        FormSpec::new("Salary")
            .field("employeeId", "Employee id", FieldKind::Reference)
            .field("employeeType", "Employee type", FieldKind::Choice(EmployeeType::CHOICES))
            .field("amount", "Amount", FieldKind::Money)
            .field("month", "Month", FieldKind::Month)
            .field("status", "Status", FieldKind::Choice(SalaryStatus::CHOICES))
            .optional("accountId", "Account id", FieldKind::Reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::parse_draft;
    use serde_json::json;

    #[test]
    fn test_month_validated() {
        let err = parse_draft::<SalaryDraft>(json!({
            "gymId": 1, "employeeId": 5, "employeeType": "STAFF", "amount": "900",
            "month": "2025-13", "status": "PENDING"
        }))
        .unwrap_err();
        assert_eq!(err.field_errors().unwrap()["month"], "Month must be YYYY-MM");
    }

    #[test]
    fn test_form_month_field() {
        let values: Vec<String> = ["5", "trainer", "1200", "2025-02", "PENDING", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let built = Salary::form().build(&values, Some(1)).unwrap();
        let draft: SalaryDraft = parse_draft(built).unwrap();
        assert_eq!(draft.month, "2025-02");
        assert_eq!(draft.employee_type, EmployeeType::Trainer);
        assert!(draft.account_id.is_none());
    }
}
