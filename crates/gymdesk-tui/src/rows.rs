//! Table presentation of each resource.
//!
//! `TableRow` turns a typed resource into table cells and detail lines;
//! `Listing` is the type-erased page the app holds for whichever screen is
//! open.

use chrono::NaiveDate;
use ratatui::layout::Constraint;
use serde_json::Value;

use gymdesk_core::api::Resource;
use gymdesk_core::cache::CachedData;
use gymdesk_core::guard::Route;
use gymdesk_core::models::{
    humanize, Account, Expense, ExpenseCategory, Gym, Id, Invoice, InvoiceStatus, Member, Package, Salary,
    Staff, Subscription, Trainer, Transaction,
};
use gymdesk_core::utils::{
    format_date, format_money, format_optional, format_optional_money, format_phone, EMPTY,
};
use gymdesk_core::Page;

/// Days ahead that count as "expiring soon"
const EXPIRING_WITHIN_DAYS: i64 = 7;

pub type Column = (&'static str, Constraint);

/// Row-level actions that depend on the record's state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowFlags {
    pub payable: bool,
    pub cancellable: bool,
}

pub trait TableRow: Resource {
    const COLUMNS: &'static [Column];

    fn cells(&self, today: NaiveDate) -> Vec<String>;

    fn detail(&self, today: NaiveDate) -> Vec<(&'static str, String)>;

    /// Text matched by the local filter on cached rows
    fn label(&self) -> String;

    fn flags(&self, _today: NaiveDate) -> RowFlags {
        RowFlags::default()
    }
}

#[derive(Debug, Clone)]
pub struct ListRow {
    pub id: Id,
    pub label: String,
    pub cells: Vec<String>,
    pub detail: Vec<(&'static str, String)>,
    pub flags: RowFlags,
    /// JSON form of the record, used to prefill the edit form
    pub raw: Value,
}

#[derive(Debug, Clone)]
pub struct Listing {
    pub route: Route,
    pub columns: &'static [Column],
    pub rows: Vec<ListRow>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub range_label: String,
    /// Set when the rows come from a local snapshot
    pub cached_age: Option<String>,
}

impl Listing {
    pub fn from_page<R: TableRow>(route: Route, page: Page<R>, today: NaiveDate) -> Self {
        let rows = page
            .items
            .iter()
            .map(|item| ListRow {
                id: item.id(),
                label: item.label(),
                cells: item.cells(today),
                detail: item.detail(today),
                flags: item.flags(today),
                raw: serde_json::to_value(item).unwrap_or(Value::Null),
            })
            .collect();
        Self {
            route,
            columns: R::COLUMNS,
            rows,
            total: page.total,
            page: page.page,
            total_pages: page.total_pages(),
            range_label: page.range_label(),
            cached_age: None,
        }
    }

    pub fn from_cache<R: TableRow>(
        route: Route,
        cached: CachedData<Vec<R>>,
        limit: u32,
        today: NaiveDate,
    ) -> Self {
        let age = cached.freshness();
        let page = Page {
            total: cached.data.len() as u64,
            items: cached.data,
            page: 1,
            limit,
        };
        let mut listing = Self::from_page(route, page, today);
        listing.cached_age = Some(age);
        listing
    }

    pub fn row(&self, index: usize) -> Option<&ListRow> {
        self.rows.get(index)
    }
}

fn opt(value: &Option<String>) -> String {
    format_optional(value.as_deref(), EMPTY)
}

fn phone(value: &Option<String>) -> String {
    value.as_deref().map(format_phone).unwrap_or_else(|| EMPTY.to_string())
}

fn id_ref(value: Option<Id>) -> String {
    value.map(|id| format!("#{}", id)).unwrap_or_else(|| EMPTY.to_string())
}

fn yes_no(value: bool) -> String {
    if value { "Yes" } else { "No" }.to_string()
}

// ===== People =====

impl TableRow for Gym {
    const COLUMNS: &'static [Column] = &[
        ("Name", Constraint::Percentage(35)),
        ("Email", Constraint::Fill(2)),
        ("Phone", Constraint::Fill(1)),
    ];

    fn cells(&self, _today: NaiveDate) -> Vec<String> {
        vec![self.name.clone(), opt(&self.email), phone(&self.phone)]
    }

    fn detail(&self, _today: NaiveDate) -> Vec<(&'static str, String)> {
        vec![
            ("Name", self.name.clone()),
            ("Address", opt(&self.address)),
            ("Phone", phone(&self.phone)),
            ("Email", opt(&self.email)),
        ]
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

impl TableRow for Member {
    const COLUMNS: &'static [Column] = &[
        ("Name", Constraint::Percentage(35)),
        ("Phone", Constraint::Fill(2)),
        ("Status", Constraint::Length(10)),
        ("Joined", Constraint::Length(13)),
    ];

    fn cells(&self, _today: NaiveDate) -> Vec<String> {
        vec![
            self.full_name(),
            phone(&self.phone),
            self.status.to_string(),
            format_date(self.join_date.or(self.created_at.map(|t| t.date_naive()))),
        ]
    }

    fn detail(&self, today: NaiveDate) -> Vec<(&'static str, String)> {
        vec![
            ("Name", self.full_name()),
            ("Email", opt(&self.email)),
            ("Phone", phone(&self.phone)),
            ("Gender", self.gender.as_deref().map(humanize).unwrap_or_else(|| EMPTY.to_string())),
            ("Age", self.age(today).map(|a| a.to_string()).unwrap_or_else(|| EMPTY.to_string())),
            ("Address", opt(&self.address)),
            ("Status", self.status.to_string()),
            ("Trainer", id_ref(self.trainer_id)),
            ("Emergency", opt(&self.emergency_contact)),
        ]
    }

    fn label(&self) -> String {
        self.full_name()
    }
}

impl TableRow for Trainer {
    const COLUMNS: &'static [Column] = &[
        ("Name", Constraint::Percentage(30)),
        ("Specialization", Constraint::Fill(2)),
        ("Years", Constraint::Length(6)),
        ("Status", Constraint::Length(10)),
    ];

    fn cells(&self, _today: NaiveDate) -> Vec<String> {
        vec![
            self.full_name(),
            opt(&self.specialization),
            self.experience_years.map(|y| y.to_string()).unwrap_or_default(),
            self.status.to_string(),
        ]
    }

    fn detail(&self, _today: NaiveDate) -> Vec<(&'static str, String)> {
        vec![
            ("Name", self.full_name()),
            ("Email", opt(&self.email)),
            ("Phone", phone(&self.phone)),
            ("Specialization", opt(&self.specialization)),
            ("Experience", self.experience_years.map(|y| format!("{} years", y)).unwrap_or_else(|| EMPTY.to_string())),
            ("Salary", format_optional_money(self.salary)),
            ("Status", self.status.to_string()),
        ]
    }

    fn label(&self) -> String {
        self.full_name()
    }
}

impl TableRow for Staff {
    const COLUMNS: &'static [Column] = &[
        ("Name", Constraint::Percentage(30)),
        ("Position", Constraint::Fill(2)),
        ("Hired", Constraint::Length(13)),
        ("Status", Constraint::Length(10)),
    ];

    fn cells(&self, _today: NaiveDate) -> Vec<String> {
        vec![
            self.full_name(),
            opt(&self.position),
            format_date(self.hire_date),
            self.status.to_string(),
        ]
    }

    fn detail(&self, _today: NaiveDate) -> Vec<(&'static str, String)> {
        vec![
            ("Name", self.full_name()),
            ("Email", opt(&self.email)),
            ("Phone", phone(&self.phone)),
            ("Position", opt(&self.position)),
            ("Salary", format_optional_money(self.salary)),
            ("Hired", format_date(self.hire_date)),
            ("Status", self.status.to_string()),
        ]
    }

    fn label(&self) -> String {
        self.full_name()
    }
}

// ===== Memberships =====

impl TableRow for Package {
    const COLUMNS: &'static [Column] = &[
        ("Name", Constraint::Percentage(35)),
        ("Duration", Constraint::Fill(1)),
        ("Price", Constraint::Length(12)),
        ("Active", Constraint::Length(7)),
    ];

    fn cells(&self, _today: NaiveDate) -> Vec<String> {
        vec![
            self.name.clone(),
            self.duration_label(),
            format_money(self.price),
            yes_no(self.is_active),
        ]
    }

    fn detail(&self, _today: NaiveDate) -> Vec<(&'static str, String)> {
        vec![
            ("Name", self.name.clone()),
            ("Description", opt(&self.description)),
            ("Duration", self.duration_label()),
            ("Price", format_money(self.price)),
            ("Active", yes_no(self.is_active)),
        ]
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

impl TableRow for Subscription {
    const COLUMNS: &'static [Column] = &[
        ("Member", Constraint::Percentage(30)),
        ("Package", Constraint::Fill(1)),
        ("Ends", Constraint::Length(13)),
        ("Status", Constraint::Length(10)),
    ];

    fn cells(&self, today: NaiveDate) -> Vec<String> {
        let mut status = self.effective_status(today).to_string();
        if self.is_expiring(today, EXPIRING_WITHIN_DAYS) {
            status.push('!');
        }
        vec![
            self.member_name.clone().unwrap_or_else(|| format!("#{}", self.member_id)),
            self.package_name.clone().unwrap_or_else(|| format!("#{}", self.package_id)),
            format_date(Some(self.end_date)),
            status,
        ]
    }

    fn detail(&self, today: NaiveDate) -> Vec<(&'static str, String)> {
        let remaining = self.days_remaining(today);
        vec![
            ("Member", self.member_name.clone().unwrap_or_else(|| format!("#{}", self.member_id))),
            ("Package", self.package_name.clone().unwrap_or_else(|| format!("#{}", self.package_id))),
            ("Starts", format_date(Some(self.start_date))),
            ("Ends", format_date(Some(self.end_date))),
            ("Remaining", if remaining >= 0 { format!("{} days", remaining) } else { "Ended".to_string() }),
            ("Amount", format_optional_money(self.amount)),
            ("Status", self.effective_status(today).to_string()),
            ("Auto renew", yes_no(self.auto_renew)),
        ]
    }

    fn label(&self) -> String {
        self.member_name.clone().unwrap_or_default()
    }

    fn flags(&self, _today: NaiveDate) -> RowFlags {
        RowFlags {
            payable: false,
            cancellable: self.can_cancel(),
        }
    }
}

// ===== Billing =====

impl TableRow for Invoice {
    const COLUMNS: &'static [Column] = &[
        ("Number", Constraint::Length(12)),
        ("Member", Constraint::Fill(2)),
        ("Due", Constraint::Length(13)),
        ("Total", Constraint::Length(12)),
        ("Status", Constraint::Length(10)),
    ];

    fn cells(&self, today: NaiveDate) -> Vec<String> {
        vec![
            self.invoice_number.clone(),
            self.member_name.clone().unwrap_or_else(|| id_ref(self.member_id)),
            format_date(self.due_date),
            format_money(self.total),
            self.effective_status(today).to_string(),
        ]
    }

    fn detail(&self, today: NaiveDate) -> Vec<(&'static str, String)> {
        let totals = self.computed_totals();
        let mut lines = vec![
            ("Number", self.invoice_number.clone()),
            ("Member", self.member_name.clone().unwrap_or_else(|| id_ref(self.member_id))),
            ("Issued", format_date(self.issue_date)),
            ("Due", format_date(self.due_date)),
            ("Paid", format_date(self.paid_date)),
            ("Status", self.effective_status(today).to_string()),
        ];
        for item in &self.items {
            lines.push((
                "Item",
                format!("{} x{} @ {}", item.description, item.quantity, format_money(item.unit_price)),
            ));
        }
        lines.push(("Subtotal", format_money(self.subtotal.unwrap_or(totals.subtotal))));
        lines.push(("Tax", format_money(self.tax.unwrap_or(totals.tax))));
        lines.push(("Total", format_money(self.total)));
        lines
    }

    fn label(&self) -> String {
        format!("{} {}", self.invoice_number, self.member_name.as_deref().unwrap_or(""))
    }

    fn flags(&self, today: NaiveDate) -> RowFlags {
        RowFlags {
            payable: self.is_payable() && self.effective_status(today) != InvoiceStatus::Cancelled,
            cancellable: false,
        }
    }
}

impl TableRow for Transaction {
    const COLUMNS: &'static [Column] = &[
        ("Date", Constraint::Length(13)),
        ("Type", Constraint::Length(8)),
        ("Method", Constraint::Length(14)),
        ("Amount", Constraint::Length(12)),
        ("Description", Constraint::Fill(1)),
    ];

    fn cells(&self, _today: NaiveDate) -> Vec<String> {
        vec![
            format_date(self.date),
            self.kind.to_string(),
            self.method.to_string(),
            format_money(self.signed_amount()),
            opt(&self.description),
        ]
    }

    fn detail(&self, _today: NaiveDate) -> Vec<(&'static str, String)> {
        vec![
            ("Date", format_date(self.date)),
            ("Type", self.kind.to_string()),
            ("Method", self.method.to_string()),
            ("Amount", format_money(self.amount)),
            ("Account", id_ref(self.account_id)),
            ("Invoice", id_ref(self.invoice_id)),
            ("Member", id_ref(self.member_id)),
            ("Reference", opt(&self.reference)),
            ("Description", opt(&self.description)),
        ]
    }

    fn label(&self) -> String {
        format!("{} {}", self.description.as_deref().unwrap_or(""), self.reference.as_deref().unwrap_or(""))
    }
}

impl TableRow for Account {
    const COLUMNS: &'static [Column] = &[
        ("Name", Constraint::Percentage(35)),
        ("Type", Constraint::Length(14)),
        ("Balance", Constraint::Length(14)),
        ("Active", Constraint::Length(7)),
    ];

    fn cells(&self, _today: NaiveDate) -> Vec<String> {
        vec![
            self.name.clone(),
            self.kind.to_string(),
            format_money(self.balance),
            yes_no(self.is_active),
        ]
    }

    fn detail(&self, _today: NaiveDate) -> Vec<(&'static str, String)> {
        vec![
            ("Name", self.name.clone()),
            ("Type", self.kind.to_string()),
            ("Number", opt(&self.account_number)),
            ("Balance", format_money(self.balance)),
            ("Active", yes_no(self.is_active)),
        ]
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

// ===== Outgoings =====

impl TableRow for Expense {
    const COLUMNS: &'static [Column] = &[
        ("Date", Constraint::Length(13)),
        ("Category", Constraint::Fill(1)),
        ("Description", Constraint::Fill(2)),
        ("Amount", Constraint::Length(12)),
    ];

    fn cells(&self, _today: NaiveDate) -> Vec<String> {
        vec![
            format_date(self.date),
            self.category_name().to_string(),
            opt(&self.description),
            format_money(self.amount),
        ]
    }

    fn detail(&self, _today: NaiveDate) -> Vec<(&'static str, String)> {
        vec![
            ("Date", format_date(self.date)),
            ("Category", self.category_name().to_string()),
            ("Description", opt(&self.description)),
            ("Amount", format_money(self.amount)),
            ("Method", self.payment_method.to_string()),
            ("Account", id_ref(self.account_id)),
        ]
    }

    fn label(&self) -> String {
        self.description.clone().unwrap_or_default()
    }
}

impl TableRow for ExpenseCategory {
    const COLUMNS: &'static [Column] = &[
        ("Name", Constraint::Percentage(35)),
        ("Description", Constraint::Fill(1)),
    ];

    fn cells(&self, _today: NaiveDate) -> Vec<String> {
        vec![self.name.clone(), opt(&self.description)]
    }

    fn detail(&self, _today: NaiveDate) -> Vec<(&'static str, String)> {
        vec![("Name", self.name.clone()), ("Description", opt(&self.description))]
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

impl TableRow for Salary {
    const COLUMNS: &'static [Column] = &[
        ("Employee", Constraint::Percentage(35)),
        ("Month", Constraint::Length(8)),
        ("Amount", Constraint::Length(12)),
        ("Status", Constraint::Length(9)),
    ];

    fn cells(&self, _today: NaiveDate) -> Vec<String> {
        vec![
            self.employee_name
                .clone()
                .unwrap_or_else(|| format!("{} #{}", self.employee_type, self.employee_id)),
            self.month.clone(),
            format_money(self.amount),
            self.status.to_string(),
        ]
    }

    fn detail(&self, _today: NaiveDate) -> Vec<(&'static str, String)> {
        vec![
            ("Employee", self.employee_name.clone().unwrap_or_else(|| format!("#{}", self.employee_id))),
            ("Type", self.employee_type.to_string()),
            ("Month", self.month.clone()),
            ("Amount", format_money(self.amount)),
            ("Status", self.status.to_string()),
            ("Paid", format_date(self.paid_date)),
            ("Account", id_ref(self.account_id)),
        ]
    }

    fn label(&self) -> String {
        self.employee_name.clone().unwrap_or_default()
    }

    fn flags(&self, _today: NaiveDate) -> RowFlags {
        RowFlags {
            payable: !self.is_paid(),
            cancellable: false,
        }
    }
}
