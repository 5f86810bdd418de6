//! Data models for gym-management entities.
//!
//! Each backend resource has a domain struct (what the server returns), a
//! `*Draft` payload used for both create and update, and a `Resource`
//! implementation tying the two to their REST path and form layout.
//!
//! - `Gym`, `UserProfile`: tenant and login identity
//! - `Member`, `Trainer`, `Staff`: people
//! - `Package`, `Subscription`: memberships
//! - `Invoice`, `Transaction`, `Account`: billing and payments
//! - `Expense`, `ExpenseCategory`, `Salary`: outgoings

/// Declare an upper-snake wire enum with an `Unknown` catch-all, the list of
/// wire values for form choices, and a humanized `Display`.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant,)+
            #[serde(other)]
            Unknown,
        }

        impl $name {
            /// Wire values accepted by the backend
            pub const CHOICES: &'static [&'static str] = &[$($wire),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                    $name::Unknown => "UNKNOWN",
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::Unknown
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&crate::models::humanize(self.as_str()))
            }
        }
    };
}

pub mod account;
pub mod expense;
pub mod gym;
pub mod invoice;
pub mod member;
pub mod package;
pub mod salary;
pub mod staff;
pub mod subscription;
pub mod trainer;
pub mod transaction;

/// Backend identifier type
pub type Id = i64;

pub use account::{Account, AccountDraft, AccountType};
pub use expense::{Expense, ExpenseCategory, ExpenseCategoryDraft, ExpenseDraft};
pub use gym::{Gym, GymDraft, UserProfile};
pub use invoice::{Invoice, InvoiceDraft, InvoiceItem, InvoiceStatus, PaymentDraft};
pub use member::{Member, MemberDraft, MemberStatus};
pub use package::{Package, PackageDraft};
pub use salary::{EmployeeType, Salary, SalaryDraft, SalaryPayment, SalaryStatus};
pub use staff::{Staff, StaffDraft};
pub use subscription::{Subscription, SubscriptionDraft, SubscriptionStatus};
pub use trainer::{Trainer, TrainerDraft};
pub use transaction::{PaymentMethod, Transaction, TransactionDraft, TransactionType};

/// Money goes over the wire as a JSON number. Reading accepts numbers or
/// strings through `Decimal`'s own `Deserialize`.
pub(crate) mod money {
    use rust_decimal::Decimal;
    use serde::Serializer;

    pub fn amount<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(value, serializer)
    }

    pub fn option<S: Serializer>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(amount) => rust_decimal::serde::float::serialize(amount, serializer),
            None => serializer.serialize_none(),
        }
    }
}

/// Join optional first/last names for display.
pub(crate) fn join_name(first: &str, last: &str) -> String {
    format!("{} {}", first.trim(), last.trim()).trim().to_string()
}

/// Title-case an upper-snake wire value: `BANK_TRANSFER` -> `Bank Transfer`
pub fn humanize(value: &str) -> String {
    value
        .split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let lower = w.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("BANK_TRANSFER"), "Bank Transfer");
        assert_eq!(humanize("ACTIVE"), "Active");
        assert_eq!(humanize(""), "");
    }

    #[test]
    fn test_join_name() {
        assert_eq!(join_name("Ada", "Lovelace"), "Ada Lovelace");
        assert_eq!(join_name("Ada", ""), "Ada");
        assert_eq!(join_name(" ", "Lovelace"), "Lovelace");
    }
}
