//! Dashboard figures and the recent-activity feed.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Expense, Invoice, Member, Transaction, TransactionType};

/// Aggregates returned by `GET /dashboard/gym/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_members: u64,
    pub active_members: u64,
    pub total_trainers: u64,
    pub active_subscriptions: u64,
    pub expiring_subscriptions: u64,
    pub monthly_revenue: Decimal,
    pub monthly_expenses: Decimal,
    pub pending_invoices: u64,
    pub overdue_invoices: u64,
}

impl DashboardStats {
    pub fn monthly_net(&self) -> Decimal {
        self.monthly_revenue - self.monthly_expenses
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    NewMember,
    Payment,
    Expense,
}

impl ActivityKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::NewMember => "New member",
            ActivityKind::Payment => "Payment",
            ActivityKind::Expense => "Expense",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub at: DateTime<Utc>,
    pub kind: ActivityKind,
    pub summary: String,
    pub amount: Option<Decimal>,
}

/// Merge new members, incoming payments and expenses into one feed, newest
/// first. Entries without a timestamp are left out.
pub fn recent_activity(
    members: &[Member],
    transactions: &[Transaction],
    expenses: &[Expense],
    limit: usize,
) -> Vec<Activity> {
    let joined = members.iter().filter_map(|m| {
        Some(Activity {
            at: m.joined_at()?,
            kind: ActivityKind::NewMember,
            summary: m.full_name(),
            amount: None,
        })
    });

    let payments = transactions.iter().filter(|t| t.is_income()).filter_map(|t| {
        Some(Activity {
            at: t.occurred_at()?,
            kind: ActivityKind::Payment,
            summary: t
                .description
                .clone()
                .unwrap_or_else(|| format!("{} payment", t.method)),
            amount: Some(t.amount),
        })
    });

    let spent = expenses.iter().filter_map(|e| {
        Some(Activity {
            at: e.occurred_at()?,
            kind: ActivityKind::Expense,
            summary: e
                .description
                .clone()
                .unwrap_or_else(|| e.category_name().to_string()),
            amount: Some(e.amount),
        })
    });

    let mut feed: Vec<Activity> = joined.chain(payments).chain(spent).collect();
    feed.sort_by(|a, b| b.at.cmp(&a.at));
    feed.truncate(limit);
    feed
}

/// Totals computed locally from fetched lists, shown when the stats
/// endpoint is unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
    pub overdue_invoices: usize,
}

impl Summary {
    /// Income from income transactions, expense from the expense records
    pub fn from_lists(
        transactions: &[Transaction],
        expenses: &[Expense],
        invoices: &[Invoice],
        today: NaiveDate,
    ) -> Self {
        let income: Decimal = transactions
            .iter()
            .filter(|t| t.kind == TransactionType::Income)
            .map(|t| t.amount)
            .sum();
        let expense: Decimal = expenses.iter().map(|e| e.amount).sum();
        Self {
            income,
            expense,
            net: income - expense,
            overdue_invoices: invoices.iter().filter(|i| i.is_overdue(today)).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn member(id: i64, created: &str) -> Member {
        serde_json::from_value(json!({
            "id": id, "gymId": 1, "firstName": "M", "lastName": id.to_string(),
            "createdAt": created
        }))
        .unwrap()
    }

    fn tx(id: i64, kind: &str, amount: i64, date: &str) -> Transaction {
        serde_json::from_value(json!({
            "id": id, "gymId": 1, "amount": amount, "type": kind,
            "method": "CASH", "date": date
        }))
        .unwrap()
    }

    fn expense(id: i64, amount: i64, date: &str) -> Expense {
        serde_json::from_value(json!({
            "id": id, "gymId": 1, "amount": amount, "description": "Rent", "date": date
        }))
        .unwrap()
    }

    #[test]
    fn test_activity_newest_first() {
        let members = [member(1, "2025-03-01T10:00:00Z"), member(2, "2025-03-05T09:00:00Z")];
        let txs = [tx(1, "INCOME", 50, "2025-03-03"), tx(2, "EXPENSE", 20, "2025-03-06")];
        let exps = [expense(1, 300, "2025-03-04")];

        let feed = recent_activity(&members, &txs, &exps, 10);
        let kinds: Vec<ActivityKind> = feed.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ActivityKind::NewMember,
                ActivityKind::Expense,
                ActivityKind::Payment,
                ActivityKind::NewMember,
            ]
        );
        assert_eq!(feed[0].summary, "M 2");
        assert_eq!(feed[2].summary, "Cash payment");
        assert!(feed.windows(2).all(|w| w[0].at >= w[1].at));
    }

    #[test]
    fn test_activity_limit() {
        let members: Vec<Member> = (1..=8)
            .map(|i| member(i, &format!("2025-03-0{}T00:00:00Z", i)))
            .collect();
        let feed = recent_activity(&members, &[], &[], 3);
        assert_eq!(feed.len(), 3);
        assert_eq!(feed[0].summary, "M 8");
    }

    #[test]
    fn test_summary_from_lists() {
        let txs = [tx(1, "INCOME", 100, "2025-03-01"), tx(2, "INCOME", 50, "2025-03-02")];
        let exps = [expense(1, 30, "2025-03-01")];
        let invoices: Vec<Invoice> = vec![serde_json::from_value(json!({
            "id": 1, "gymId": 1, "invoiceNumber": "INV-000001", "total": 10,
            "status": "PENDING", "dueDate": "2025-02-01"
        }))
        .unwrap()];
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        let summary = Summary::from_lists(&txs, &exps, &invoices, today);
        assert_eq!(summary.income, Decimal::from(150));
        assert_eq!(summary.expense, Decimal::from(30));
        assert_eq!(summary.net, Decimal::from(120));
        assert_eq!(summary.overdue_invoices, 1);
    }

    #[test]
    fn test_stats_tolerate_missing_fields() {
        let stats: DashboardStats =
            serde_json::from_value(json!({"totalMembers": 12, "monthlyRevenue": "1500.50"})).unwrap();
        assert_eq!(stats.total_members, 12);
        assert_eq!(stats.monthly_net(), Decimal::new(150050, 2));
    }
}
