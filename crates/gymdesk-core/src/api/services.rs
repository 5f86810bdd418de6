//! Resource-specific endpoints layered on the generic CRUD services.

use anyhow::Result;
use serde::Deserialize;
use tracing::info;

use crate::dashboard::DashboardStats;
use crate::models::{
    Id, Invoice, Member, PaymentDraft, Salary, SalaryPayment, Subscription, Transaction,
};

use super::{ApiClient, ResourceApi};

// ============================================================================
// Members
// ============================================================================

impl ResourceApi<'_, Member> {
    /// Members assigned to a trainer
    pub async fn by_trainer(&self, trainer_id: Id) -> Result<Vec<Member>> {
        self.client()
            .get(&format!("members/trainer/{}", trainer_id))
            .await
    }
}

// ============================================================================
// Subscriptions
// ============================================================================

impl ResourceApi<'_, Subscription> {
    pub async fn for_member(&self, member_id: Id) -> Result<Vec<Subscription>> {
        self.client()
            .get(&format!("subscriptions/member/{}", member_id))
            .await
    }

    pub async fn cancel(&self, id: Id) -> Result<Subscription> {
        let cancelled = self
            .client()
            .patch_empty(&format!("subscriptions/{}/cancel", id))
            .await?;
        info!(id = id, "Subscription cancelled");
        Ok(cancelled)
    }

    /// Start a new period on the same package; returns the new subscription
    pub async fn renew(&self, id: Id) -> Result<Subscription> {
        let renewed: Subscription = self
            .client()
            .post_empty(&format!("subscriptions/{}/renew", id))
            .await?;
        info!(id = id, new_id = renewed.id, "Subscription renewed");
        Ok(renewed)
    }
}

// ============================================================================
// Invoices
// ============================================================================

/// The backend answers the next-number call with either a bare string or an
/// object carrying the number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NextNumber {
    Bare(String),
    Wrapped {
        #[serde(alias = "invoiceNumber", alias = "nextNumber", alias = "number")]
        value: String,
    },
}

impl ResourceApi<'_, Invoice> {
    pub async fn for_member(&self, member_id: Id) -> Result<Vec<Invoice>> {
        self.client()
            .get(&format!("invoices/member/{}", member_id))
            .await
    }

    /// Number the backend will assign to the next invoice of a gym
    pub async fn next_number(&self, gym_id: Id) -> Result<String> {
        let next: NextNumber = self
            .client()
            .get(&format!("invoices/gym/{}/next-number", gym_id))
            .await?;
        Ok(match next {
            NextNumber::Bare(value) | NextNumber::Wrapped { value } => value,
        })
    }

    pub async fn record_payment(&self, id: Id, payment: &PaymentDraft) -> Result<Invoice> {
        let invoice: Invoice = self
            .client()
            .post(&format!("invoices/{}/payments", id), payment)
            .await?;
        info!(id = id, amount = %payment.amount, "Payment recorded");
        Ok(invoice)
    }
}

// ============================================================================
// Transactions
// ============================================================================

impl ResourceApi<'_, Transaction> {
    pub async fn for_invoice(&self, invoice_id: Id) -> Result<Vec<Transaction>> {
        self.client()
            .get(&format!("transactions/invoice/{}", invoice_id))
            .await
    }
}

// ============================================================================
// Salaries
// ============================================================================

impl ResourceApi<'_, Salary> {
    /// Mark a salary paid out of `account_id`
    pub async fn pay(&self, id: Id, account_id: Id) -> Result<Salary> {
        let body = SalaryPayment::today(account_id);
        let paid = self
            .client()
            .post(&format!("salaries/{}/pay", id), &body)
            .await?;
        info!(id = id, account_id = account_id, "Salary paid");
        Ok(paid)
    }
}

// ============================================================================
// Dashboard
// ============================================================================

impl ApiClient {
    /// Aggregated figures for a gym's dashboard
    pub async fn dashboard_stats(&self, gym_id: Id) -> Result<DashboardStats> {
        self.get(&format!("dashboard/gym/{}", gym_id)).await
    }
}
