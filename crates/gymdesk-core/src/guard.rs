//! Role-based route guard and navigation.
//!
//! Every screen is a `Route`. A route lists the roles allowed to open it;
//! `check` decides between showing it, sending the user to log in, or
//! bouncing them to their role's landing route.

use std::fmt;

use crate::auth::{Role, Session};
use crate::models::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Gyms,
    Dashboard,
    Members,
    Trainers,
    Staff,
    Packages,
    Subscriptions,
    Invoices,
    Transactions,
    Accounts,
    Expenses,
    ExpenseCategories,
    Salaries,
    Profile,
}

const ADMINS: &[Role] = &[Role::SystemAdmin, Role::Admin];
const OFFICE: &[Role] = &[Role::SystemAdmin, Role::Admin, Role::Staff];
const COACHING: &[Role] = &[Role::SystemAdmin, Role::Admin, Role::Staff, Role::Trainer];
const EVERYONE: &[Role] = &Role::ALL;

impl Route {
    /// Menu order
    pub const ALL: [Route; 14] = [
        Route::Gyms,
        Route::Dashboard,
        Route::Members,
        Route::Trainers,
        Route::Staff,
        Route::Packages,
        Route::Subscriptions,
        Route::Invoices,
        Route::Transactions,
        Route::Accounts,
        Route::Expenses,
        Route::ExpenseCategories,
        Route::Salaries,
        Route::Profile,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Route::Gyms => "Gyms",
            Route::Dashboard => "Dashboard",
            Route::Members => "Members",
            Route::Trainers => "Trainers",
            Route::Staff => "Staff",
            Route::Packages => "Packages",
            Route::Subscriptions => "Subscriptions",
            Route::Invoices => "Invoices",
            Route::Transactions => "Transactions",
            Route::Accounts => "Accounts",
            Route::Expenses => "Expenses",
            Route::ExpenseCategories => "Expense Categories",
            Route::Salaries => "Salaries",
            Route::Profile => "Profile",
        }
    }

    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Route::Gyms => &[Role::SystemAdmin],
            Route::Dashboard => OFFICE,
            Route::Members | Route::Subscriptions => COACHING,
            Route::Trainers | Route::Packages | Route::Invoices | Route::Transactions => OFFICE,
            Route::Staff
            | Route::Accounts
            | Route::Expenses
            | Route::ExpenseCategories
            | Route::Salaries => ADMINS,
            Route::Profile => EVERYONE,
        }
    }

    pub fn allows(&self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }

    /// Whether the screen shows data of a single gym
    pub fn is_gym_scoped(&self) -> bool {
        !matches!(self, Route::Gyms | Route::Profile)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    RedirectToLogin,
    Denied { fallback: Route },
}

/// Where a role lands after login or after being denied
pub fn landing(role: Role) -> Route {
    match role {
        Role::SystemAdmin => Route::Gyms,
        Role::Admin | Role::Staff => Route::Dashboard,
        Role::Trainer => Route::Members,
        Role::Member => Route::Profile,
    }
}

/// Routes visible to `role`, in menu order
pub fn sidebar(role: Role) -> Vec<Route> {
    Route::ALL.iter().copied().filter(|r| r.allows(role)).collect()
}

pub fn check(route: Route, session: &Session) -> Access {
    if !session.is_valid() {
        return Access::RedirectToLogin;
    }
    // A token without a recognizable role gets the least privileged view
    let role = session.role().unwrap_or(Role::Member);
    if route.allows(role) {
        Access::Allowed
    } else {
        Access::Denied {
            fallback: landing(role),
        }
    }
}

/// The gym whose data a gym-scoped screen shows: the token's own gym, or
/// the one a System Admin picked.
pub fn gym_scope(session: &Session, selected: Option<Id>) -> Option<Id> {
    if session.is_system_admin() {
        selected.or_else(|| session.gym_id())
    } else {
        session.gym_id()
    }
}

// ===== Action permissions =====

/// Routes Staff may add to and edit
const STAFF_WRITABLE: &[Route] = &[
    Route::Members,
    Route::Subscriptions,
    Route::Invoices,
    Route::Transactions,
];

fn can_write(role: Role, route: Route) -> bool {
    if route == Route::Profile || !route.allows(role) {
        return false;
    }
    match role {
        Role::SystemAdmin => true,
        Role::Admin => route != Route::Gyms,
        Role::Staff => STAFF_WRITABLE.contains(&route),
        Role::Trainer | Role::Member => false,
    }
}

pub fn can_create(role: Role, route: Route) -> bool {
    can_write(role, route)
}

pub fn can_edit(role: Role, route: Route) -> bool {
    can_write(role, route)
}

pub fn can_delete(role: Role, route: Route) -> bool {
    can_write(role, route) && role >= Role::Admin
}
