//! Application state for the gymdesk terminal client.
//!
//! `App` owns the session, the API client and the snapshot cache, plus all UI
//! state: the current route, the paginated listing, the open form and the
//! toast. Every network call runs in its own tokio task and reports back
//! through an mpsc channel drained once per tick.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use gymdesk_core::api::{api_error, ApiError, Resource};
use gymdesk_core::auth::{CredentialStore, Role, Session, SessionData};
use gymdesk_core::billing::{next_invoice_number, INVOICE_PREFIX};
use gymdesk_core::cache::CacheManager;
use gymdesk_core::config::{Config, ENV_PASSWORD};
use gymdesk_core::dashboard::{recent_activity, Activity, DashboardStats, Summary};
use gymdesk_core::forms::{self, FieldErrors, FieldKind, FormError, FormSpec, Original, FORM_LEVEL};
use gymdesk_core::guard::{self, Access, Route};
use gymdesk_core::models::{
    Account, Expense, ExpenseCategory, Gym, Id, Invoice, Member, Package, PaymentDraft, Salary,
    SalaryPayment, Staff, Subscription, Trainer, Transaction, UserProfile,
};
use gymdesk_core::pagination::MAX_PAGE_SIZE;
use gymdesk_core::utils::contains_ignore_case;
use gymdesk_core::{ApiClient, Page, PageQuery};

use crate::rows::{ListRow, Listing, TableRow};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// How long a toast stays on screen
const TOAST_TTL: Duration = Duration::from_secs(4);

/// Maximum length for e-mail input.
const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for password input.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length of a single form value.
const MAX_FIELD_LENGTH: usize = 200;

/// Rows fetched per list when building the dashboard locally
const DASHBOARD_SAMPLE_SIZE: u32 = 50;

/// Entries shown in the recent-activity feed
const ACTIVITY_LIMIT: usize = 10;

/// Step used by the page-size keys
const PAGE_SIZE_STEP: u32 = 5;

/// Date fields that default to today on a new form
const TODAY_FIELDS: &[&str] = &["startDate", "issueDate", "date", "joinDate", "hireDate"];

/// Run `$body` with `$r` bound to the resource type behind a table route.
/// Evaluates to `None` for routes that are not tables.
macro_rules! with_resource {
    ($route:expr, |$r:ident| $body:expr) => {
        match $route {
            Route::Gyms => {
                type $r = Gym;
                Some($body)
            }
            Route::Members => {
                type $r = Member;
                Some($body)
            }
            Route::Trainers => {
                type $r = Trainer;
                Some($body)
            }
            Route::Staff => {
                type $r = Staff;
                Some($body)
            }
            Route::Packages => {
                type $r = Package;
                Some($body)
            }
            Route::Subscriptions => {
                type $r = Subscription;
                Some($body)
            }
            Route::Invoices => {
                type $r = Invoice;
                Some($body)
            }
            Route::Transactions => {
                type $r = Transaction;
                Some($body)
            }
            Route::Accounts => {
                type $r = Account;
                Some($body)
            }
            Route::Expenses => {
                type $r = Expense;
                Some($body)
            }
            Route::ExpenseCategories => {
                type $r = ExpenseCategory;
                Some($body)
            }
            Route::Salaries => {
                type $r = Salary;
                Some($body)
            }
            Route::Dashboard | Route::Profile => None,
        }
    };
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ============================================================================
// UI State Types
// ============================================================================

/// Which panel receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    List,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    LoggingIn,
    EditingForm,
    ConfirmingDelete,
    ConfirmingCancel,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    created: Instant,
}

impl Toast {
    pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            created: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created.elapsed() >= TOAST_TTL
    }
}

/// What submitting the open form does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPurpose {
    /// Create (`None`) or update a record of the current route
    Save { target: Option<Id> },
    RecordPayment { invoice_id: Id },
    PaySalary { salary_id: Id },
}

/// A modal form: one raw string per field of `spec`.
#[derive(Debug, Clone)]
pub struct FormState {
    pub route: Route,
    pub purpose: FormPurpose,
    pub spec: FormSpec,
    pub values: Vec<String>,
    pub focus: usize,
    pub errors: FieldErrors,
    pub submitting: bool,
    /// Stored JSON of the record being edited
    pub original: Option<Value>,
}

impl FormState {
    pub fn new(route: Route, purpose: FormPurpose, spec: FormSpec, values: Vec<String>) -> Self {
        Self {
            route,
            purpose,
            spec,
            values,
            focus: 0,
            errors: FieldErrors::new(),
            submitting: false,
            original: None,
        }
    }

    /// Edit form for a stored record, prefilled from its JSON
    pub fn edit(route: Route, id: Id, spec: FormSpec, raw: Value) -> Self {
        let values = spec.prefill(&raw);
        Self {
            original: Some(raw),
            ..Self::new(route, FormPurpose::Save { target: Some(id) }, spec, values)
        }
    }

    pub fn title(&self) -> String {
        match self.purpose {
            FormPurpose::Save { target: None } => format!("New {}", self.spec.title),
            FormPurpose::Save { target: Some(_) } => format!("Edit {}", self.spec.title),
            FormPurpose::RecordPayment { .. } | FormPurpose::PaySalary { .. } => {
                self.spec.title.to_string()
            }
        }
    }

    pub fn next_field(&mut self) {
        if !self.spec.fields.is_empty() {
            self.focus = (self.focus + 1) % self.spec.fields.len();
        }
    }

    pub fn prev_field(&mut self) {
        if !self.spec.fields.is_empty() {
            self.focus = (self.focus + self.spec.fields.len() - 1) % self.spec.fields.len();
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(value) = self.values.get_mut(self.focus) {
            if can_add_input_char(value.chars().count(), MAX_FIELD_LENGTH, c) {
                value.push(c);
            }
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(value) = self.values.get_mut(self.focus) {
            value.pop();
        }
    }

    /// Step through the options of a choice or yes/no field
    pub fn cycle(&mut self, forward: bool) {
        let Some(field) = self.spec.fields.get(self.focus) else {
            return;
        };
        let mut options: Vec<&str> = match field.kind {
            FieldKind::Choice(options) => options.to_vec(),
            FieldKind::Bool => vec!["no", "yes"],
            _ => return,
        };
        if !field.required && field.kind != FieldKind::Bool {
            options.insert(0, "");
        }
        let Some(value) = self.values.get_mut(self.focus) else {
            return;
        };
        let current = options.iter().position(|o| o.eq_ignore_ascii_case(value));
        let next = match (current, forward) {
            (Some(i), true) => (i + 1) % options.len(),
            (Some(i), false) => (i + options.len() - 1) % options.len(),
            (None, _) => 0,
        };
        *value = options[next].to_string();
    }

    pub fn set_value(&mut self, key: &str, value: impl Into<String>) {
        if let Some(i) = self.spec.fields.iter().position(|f| f.key == key) {
            self.values[i] = value.into();
        }
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        let i = self.spec.fields.iter().position(|f| f.key == key)?;
        self.values.get(i).map(String::as_str)
    }

    pub fn error_for(&self, key: &str) -> Option<&str> {
        self.errors.get(key).map(String::as_str)
    }

    /// Errors that belong to no single field (form-level and nested lists)
    pub fn general_errors(&self) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|(key, _)| {
                key.as_str() == FORM_LEVEL || !self.spec.fields.iter().any(|f| f.key == key.as_str())
            })
            .map(|(_, message)| message.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    /// Backend aggregates; `None` when the stats endpoint failed
    pub stats: Option<DashboardStats>,
    /// Totals computed from the sampled lists
    pub summary: Summary,
    pub activity: Vec<Activity>,
    pub cached_age: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileData {
    pub profile: Option<UserProfile>,
    pub subscriptions: Vec<Subscription>,
    pub invoices: Vec<Invoice>,
}

/// Payments recorded against the selected invoice
#[derive(Debug, Clone)]
pub struct InvoicePayments {
    pub invoice_id: Id,
    pub transactions: Vec<Transaction>,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Numbers screen loads so a slow response for a screen the user already
/// left cannot overwrite the current one.
#[derive(Debug, Default)]
struct RequestSeq(u64);

impl RequestSeq {
    fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    fn is_current(&self, seq: u64) -> bool {
        seq == self.0
    }
}

enum BgResult {
    /// A page for `route`; `seq` identifies the request
    Listing {
        seq: u64,
        result: Result<Listing>,
    },
    Dashboard { seq: u64, data: DashboardData },
    Profile(ProfileData),
    InvoicePayments(InvoicePayments),
    /// Suggested invoice number; `None` when the server could not provide one
    NextInvoiceNumber(Option<String>),
    /// A mutation succeeded
    Saved { route: Route, message: String },
    /// A form submission failed validation or the request failed
    FormFailed(FormError),
    /// Any other request failed
    ActionFailed(anyhow::Error),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub session: Session,
    pub api: ApiClient,
    pub cache: Arc<CacheManager>,

    // UI state
    pub state: AppState,
    pub focus: Focus,
    pub route: Route,
    pub sidebar: Vec<Route>,
    pub sidebar_selection: usize,
    pub selection: usize,
    pub query: PageQuery,
    pub search_input: String,
    pub loading: bool,
    pub toast: Option<Toast>,
    /// Name of the gym being managed, when known
    pub gym_name: Option<String>,

    // Screen data
    pub listing: Option<Listing>,
    pub dashboard: DashboardData,
    pub profile: ProfileData,
    pub payments: Option<InvoicePayments>,

    // Dialogs
    pub form: Option<FormState>,
    /// Record awaiting delete/cancel confirmation
    pub pending: Option<(Id, String)>,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,
    /// Password came from the environment; login without prompting
    pub auto_login: bool,

    request_seq: RequestSeq,
    /// The near-expiry notice was shown for this session
    expiry_warned: bool,
    bg_rx: mpsc::Receiver<BgResult>,
    bg_tx: mpsc::Sender<BgResult>,
}

impl App {
    pub fn new() -> Result<Self> {
        debug!("App::new() starting");
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        debug!(api = %config.api_base_url, "Config loaded");

        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, "Cache directory configured");

        let mut session = Session::new(cache_dir.clone());
        if let Err(e) = session.load() {
            warn!(error = %e, "Failed to load session");
        }

        let mut api = ApiClient::new(&config.api_base_url)?;
        if let Some(token) = session.token().filter(|_| session.is_valid()) {
            api.set_token(token);
            debug!("Token set on API client");
        }

        let cache = Arc::new(CacheManager::new(cache_dir)?);
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let login_email = config.last_email.clone().unwrap_or_default();
        let env_password = std::env::var(ENV_PASSWORD).ok().filter(|p| !p.is_empty());
        let auto_login = env_password.is_some() && !login_email.is_empty();
        let login_password = env_password
            .or_else(|| {
                if login_email.is_empty() {
                    return None;
                }
                CredentialStore::recall(&login_email)
                    .map_err(|e| debug!(error = %e, "Keychain lookup failed"))
                    .ok()
                    .flatten()
            })
            .unwrap_or_default();

        let query = PageQuery::with_limit(config.page_size);

        Ok(Self {
            config,
            session,
            api,
            cache,

            state: AppState::Normal,
            focus: Focus::List,
            route: Route::Dashboard,
            sidebar: Vec::new(),
            sidebar_selection: 0,
            selection: 0,
            query,
            search_input: String::new(),
            loading: false,
            toast: None,
            gym_name: None,

            listing: None,
            dashboard: DashboardData::default(),
            profile: ProfileData::default(),
            payments: None,

            form: None,
            pending: None,

            login_email,
            login_password,
            login_focus: LoginFocus::Email,
            login_error: None,
            auto_login,

            request_seq: RequestSeq::default(),
            expiry_warned: false,
            bg_rx: rx,
            bg_tx: tx,
        })
    }

    // =========================================================================
    // Session and role
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.session.is_valid()
    }

    /// Role from the token; tokens without one get the least privileged view
    pub fn role(&self) -> Role {
        self.session.role().unwrap_or(Role::Member)
    }

    /// Gym whose data gym-scoped screens show
    pub fn gym_id(&self) -> Option<Id> {
        guard::gym_scope(&self.session, self.config.selected_gym_id)
    }

    pub fn user_label(&self) -> String {
        self.session
            .data
            .as_ref()
            .map(|d| d.display_name().to_string())
            .unwrap_or_default()
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) -> Result<()> {
        let email = self.login_email.trim().to_string();
        let password = self.login_password.clone();

        if email.is_empty() || password.is_empty() {
            self.login_error = Some("E-mail and password required".to_string());
            return Err(anyhow::anyhow!("E-mail and password required"));
        }

        self.login_error = None;

        match self.api.login(&email, &password).await {
            Ok(session_data) => {
                if session_data.role().is_none() {
                    warn!("Token carries no recognizable role");
                }
                if let Err(e) = CredentialStore::remember(&email, &password) {
                    warn!(error = %e, "Failed to store credentials");
                }

                self.config.last_email = Some(email);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }

                self.api.set_token(session_data.token.clone());
                self.session.update(session_data);
                self.expiry_warned = false;
                if let Err(e) = self.session.save() {
                    warn!(error = %e, "Failed to save session");
                }

                self.login_password.clear();
                self.state = AppState::Normal;
                info!(role = %self.role(), "Login successful");
                self.enter_app();
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                if matches!(api_error(&e), Some(ApiError::Unauthorized)) {
                    // A rejected password must not be offered again
                    if let Err(forget_err) = CredentialStore::forget(&email) {
                        warn!(error = %forget_err, "Failed to forget password");
                    }
                }
                self.login_error = Some(login_failure_message(&e));
                Err(e)
            }
        }
    }

    /// Show the login overlay
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// Forget the session and return to the login overlay
    pub fn logout(&mut self) {
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear session");
        }
        self.api.clear_token();
        self.listing = None;
        self.dashboard = DashboardData::default();
        self.profile = ProfileData::default();
        self.form = None;
        self.sidebar.clear();
        self.loading = false;
        info!("Logged out");
        self.start_login();
    }

    fn expire_session(&mut self) {
        warn!("Session rejected by server");
        self.logout();
        self.login_error = Some(ApiError::Unauthorized.user_message());
    }

    /// Build the menu for the user's role and go to their landing screen
    pub fn enter_app(&mut self) {
        let role = self.role();
        self.sidebar = guard::sidebar(role);
        self.navigate(guard::landing(role));
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn navigate(&mut self, route: Route) {
        match guard::check(route, &self.session) {
            Access::Allowed => {}
            Access::RedirectToLogin => {
                self.start_login();
                return;
            }
            Access::Denied { fallback } => {
                warn!(route = %route, "Route denied");
                self.toast_error(format!("{} is not available for your role", route));
                if fallback != route {
                    self.navigate(fallback);
                }
                return;
            }
        }

        if route.is_gym_scoped() && self.gym_id().is_none() {
            if self.session.is_system_admin() {
                self.toast_info("Select a gym first");
                if route != Route::Gyms {
                    self.open(Route::Gyms);
                }
            } else {
                self.toast_error("Your account is not linked to a gym");
            }
            return;
        }

        self.open(route);
    }

    fn open(&mut self, route: Route) {
        debug!(route = %route, "Opening route");
        self.route = route;
        self.selection = 0;
        self.listing = None;
        self.payments = None;
        self.focus = Focus::List;
        self.query = PageQuery::with_limit(self.config.page_size);
        if let Some(i) = self.sidebar.iter().position(|r| *r == route) {
            self.sidebar_selection = i;
        }
        self.load_current();
    }

    /// (Re)load whatever the current route shows
    pub fn load_current(&mut self) {
        match self.route {
            Route::Dashboard => self.load_dashboard(),
            Route::Profile => self.spawn_profile(),
            route => {
                let gym_id = self.gym_id();
                with_resource!(route, |R| self.show_listing::<R>(route, gym_id));
            }
        }
    }

    pub fn select_sidebar(&mut self) {
        if let Some(route) = self.sidebar.get(self.sidebar_selection).copied() {
            self.navigate(route);
        }
    }

    /// System Admin picks the gym to manage
    pub fn select_gym(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        let (id, name) = (row.id, row.label.clone());
        self.config.selected_gym_id = Some(id);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
        info!(gym_id = id, "Gym selected");
        self.gym_name = Some(name.clone());
        self.dashboard = DashboardData::default();
        self.toast_success(format!("Managing {}", name));
        self.navigate(Route::Dashboard);
    }

    // =========================================================================
    // Selection and paging
    // =========================================================================

    pub fn row_count(&self) -> usize {
        self.listing.as_ref().map(|l| l.rows.len()).unwrap_or(0)
    }

    pub fn selected_row(&self) -> Option<&ListRow> {
        self.listing.as_ref().and_then(|l| l.row(self.selection))
    }

    pub fn move_selection(&mut self, delta: isize) {
        let count = self.row_count();
        if count == 0 {
            self.selection = 0;
            return;
        }
        let next = (self.selection as isize + delta).clamp(0, count as isize - 1);
        if next as usize != self.selection {
            self.selection = next as usize;
            self.payments = None;
        }
    }

    pub fn next_page(&mut self) {
        let total_pages = self.listing.as_ref().map(|l| l.total_pages).unwrap_or(1);
        if self.query.next(total_pages) {
            self.selection = 0;
            self.load_current();
        }
    }

    pub fn prev_page(&mut self) {
        if self.query.prev() {
            self.selection = 0;
            self.load_current();
        }
    }

    pub fn change_page_size(&mut self, grow: bool) {
        let limit = if grow {
            (self.query.limit + PAGE_SIZE_STEP).min(MAX_PAGE_SIZE)
        } else {
            self.query.limit.saturating_sub(PAGE_SIZE_STEP).max(PAGE_SIZE_STEP)
        };
        if limit == self.query.limit {
            return;
        }
        self.query.set_limit(limit);
        self.config.page_size = limit;
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
        self.selection = 0;
        self.load_current();
    }

    pub fn start_search(&mut self) {
        if self.listing.is_some() {
            self.search_input = self.query.search.clone();
            self.state = AppState::Searching;
        }
    }

    pub fn apply_search(&mut self) {
        let before = self.query.search.clone();
        self.query.set_search(&self.search_input);
        self.state = AppState::Normal;
        if self.query.search != before {
            self.selection = 0;
            self.load_current();
        }
    }

    pub fn clear_search(&mut self) {
        self.search_input.clear();
        self.apply_search();
    }

    // =========================================================================
    // Loading
    // =========================================================================

    fn next_seq(&mut self) -> u64 {
        self.request_seq.next()
    }

    fn show_listing<R: TableRow>(&mut self, route: Route, gym_id: Option<Id>) {
        let trainer_id = self.trainer_filter(route);
        let scoped_gym = gym_id.filter(|_| route.is_gym_scoped());

        // Show the last snapshot while the first page loads
        if self.listing.is_none()
            && trainer_id.is_none()
            && self.query.page == 1
            && self.query.search.is_empty()
        {
            if let Some(cached) = scoped_gym.and_then(|gym| self.cache.load_list::<R>(gym)) {
                self.listing = Some(Listing::from_cache(route, cached, self.query.limit, today()));
            }
        }

        match trainer_id {
            Some(trainer_id) => self.spawn_trainer_members(trainer_id),
            None => self.spawn_listing::<R>(route, scoped_gym),
        }
    }

    /// Trainers only see the members assigned to them
    fn trainer_filter(&self, route: Route) -> Option<Id> {
        if route == Route::Members && self.session.is_trainer() {
            self.session.data.as_ref().and_then(|d| d.claims.trainer_id)
        } else {
            None
        }
    }

    fn spawn_listing<R: TableRow>(&mut self, route: Route, gym_id: Option<Id>) {
        let seq = self.next_seq();
        let query = self.query.clone();
        let api = self.api.clone();
        let cache = Arc::clone(&self.cache);
        let tx = self.bg_tx.clone();
        self.loading = true;

        tokio::spawn(async move {
            let service = api.resource::<R>();
            let fetched = match gym_id {
                Some(gym_id) => service.list(gym_id, &query).await,
                None => service.list_all(&query).await,
            };
            let result = fetched.map(|page| {
                if let (Some(gym_id), 1, true) = (gym_id, query.page, query.search.is_empty()) {
                    if let Err(e) = cache.save_list::<R>(gym_id, &page.items) {
                        warn!(error = %e, resource = R::PATH, "Failed to cache list");
                    }
                }
                Listing::from_page(route, page, today())
            });
            send(&tx, BgResult::Listing { seq, result }).await;
        });
    }

    fn spawn_trainer_members(&mut self, trainer_id: Id) {
        let seq = self.next_seq();
        let query = self.query.clone();
        let api = self.api.clone();
        let tx = self.bg_tx.clone();
        self.loading = true;

        tokio::spawn(async move {
            let result = api
                .resource::<Member>()
                .by_trainer(trainer_id)
                .await
                .map(|mut members| {
                    if !query.search.is_empty() {
                        members.retain(|m| contains_ignore_case(&m.full_name(), &query.search));
                    }
                    Listing::from_page(Route::Members, Page::from_all(members, &query), today())
                });
            send(&tx, BgResult::Listing { seq, result }).await;
        });
    }

    fn load_dashboard(&mut self) {
        let Some(gym_id) = self.gym_id() else {
            return;
        };
        if self.dashboard.stats.is_none() {
            if let Some(cached) = self.cache.load_stats(gym_id) {
                self.dashboard.cached_age = Some(cached.freshness());
                self.dashboard.stats = Some(cached.data);
            }
        }

        let api = self.api.clone();
        let cache = Arc::clone(&self.cache);
        let tx = self.bg_tx.clone();
        let seq = self.next_seq();
        self.loading = true;

        tokio::spawn(async move {
            let sample = PageQuery::with_limit(DASHBOARD_SAMPLE_SIZE);
            let members = api.resource::<Member>();
            let transactions = api.resource::<Transaction>();
            let expenses = api.resource::<Expense>();
            let invoices = api.resource::<Invoice>();

            let (stats, members, transactions, expenses, invoices) = futures::join!(
                api.dashboard_stats(gym_id),
                members.list(gym_id, &sample),
                transactions.list(gym_id, &sample),
                expenses.list(gym_id, &sample),
                invoices.list(gym_id, &sample)
            );

            let stats = match stats {
                Ok(stats) => {
                    if let Err(e) = cache.save_stats(gym_id, &stats) {
                        warn!(error = %e, "Failed to cache dashboard stats");
                    }
                    Some(stats)
                }
                Err(e) if is_unauthorized(&e) => {
                    send(&tx, BgResult::ActionFailed(e)).await;
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "Dashboard stats unavailable, using local totals");
                    None
                }
            };

            let members = items_or_empty(members, "members");
            let transactions = items_or_empty(transactions, "transactions");
            let expenses = items_or_empty(expenses, "expenses");
            let invoices = items_or_empty(invoices, "invoices");

            let data = DashboardData {
                stats,
                summary: Summary::from_lists(&transactions, &expenses, &invoices, today()),
                activity: recent_activity(&members, &transactions, &expenses, ACTIVITY_LIMIT),
                cached_age: None,
            };
            send(&tx, BgResult::Dashboard { seq, data }).await;
        });
    }

    fn spawn_profile(&mut self) {
        let member_id = self.session.data.as_ref().and_then(|d| d.claims.member_id);
        let api = self.api.clone();
        let tx = self.bg_tx.clone();
        self.loading = true;

        tokio::spawn(async move {
            let profile = match api.profile().await {
                Ok(profile) => profile,
                Err(e) => {
                    send(&tx, BgResult::ActionFailed(e)).await;
                    return;
                }
            };

            let mut data = ProfileData {
                profile: Some(profile),
                ..Default::default()
            };
            if let Some(member_id) = member_id {
                let subscriptions = api.resource::<Subscription>();
                let invoices = api.resource::<Invoice>();
                let (subs, invs) = futures::join!(
                    subscriptions.for_member(member_id),
                    invoices.for_member(member_id)
                );
                data.subscriptions = subs.unwrap_or_else(|e| {
                    warn!(error = %e, "Failed to load member subscriptions");
                    Vec::new()
                });
                data.invoices = invs.unwrap_or_else(|e| {
                    warn!(error = %e, "Failed to load member invoices");
                    Vec::new()
                });
            }
            send(&tx, BgResult::Profile(data)).await;
        });
    }

    /// Fetch payments for the selected invoice into the detail panel
    pub fn load_invoice_payments(&mut self) {
        if self.route != Route::Invoices {
            return;
        }
        let Some(invoice_id) = self.selected_row().map(|r| r.id) else {
            return;
        };
        let api = self.api.clone();
        let tx = self.bg_tx.clone();
        self.loading = true;

        tokio::spawn(async move {
            let result = match api.resource::<Transaction>().for_invoice(invoice_id).await {
                Ok(transactions) => BgResult::InvoicePayments(InvoicePayments {
                    invoice_id,
                    transactions,
                }),
                Err(e) => BgResult::ActionFailed(e),
            };
            send(&tx, result).await;
        });
    }

    fn spawn_next_invoice_number(&mut self, gym_id: Id) {
        let api = self.api.clone();
        let tx = self.bg_tx.clone();

        tokio::spawn(async move {
            let number = match api.resource::<Invoice>().next_number(gym_id).await {
                Ok(number) => Some(number),
                Err(e) => {
                    debug!(error = %e, "Next invoice number unavailable");
                    None
                }
            };
            send(&tx, BgResult::NextInvoiceNumber(number)).await;
        });
    }

    // =========================================================================
    // Forms
    // =========================================================================

    pub fn open_new_form(&mut self) {
        if !guard::can_create(self.role(), self.route) {
            self.toast_error(format!("You cannot add to {}", self.route));
            return;
        }
        let Some(spec) = with_resource!(self.route, |R| R::form()) else {
            return;
        };
        let mut form = FormState::new(
            self.route,
            FormPurpose::Save { target: None },
            spec.clone(),
            spec.blank_values(),
        );
        apply_defaults(&mut form, today());
        self.form = Some(form);
        self.state = AppState::EditingForm;

        if self.route == Route::Invoices {
            if let Some(gym_id) = self.gym_id() {
                self.spawn_next_invoice_number(gym_id);
            }
        }
    }

    pub fn open_edit_form(&mut self) {
        if !guard::can_edit(self.role(), self.route) {
            self.toast_error(format!("You cannot edit {}", self.route));
            return;
        }
        let Some(row) = self.selected_row() else {
            return;
        };
        let (id, raw) = (row.id, row.raw.clone());
        let Some(spec) = with_resource!(self.route, |R| R::form()) else {
            return;
        };
        self.form = Some(FormState::edit(self.route, id, spec, raw));
        self.state = AppState::EditingForm;
    }

    /// Record a payment (invoices) or pay out (salaries) for the selected row
    pub fn open_pay_form(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        if !row.flags.payable || !guard::can_edit(self.role(), self.route) {
            self.toast_info("Nothing to pay for this record");
            return;
        }
        let (id, raw) = (row.id, row.raw.clone());
        let form = match self.route {
            Route::Invoices => {
                let spec = PaymentDraft::form();
                let mut form = FormState::new(
                    self.route,
                    FormPurpose::RecordPayment { invoice_id: id },
                    spec.clone(),
                    spec.blank_values(),
                );
                form.set_value("amount", raw_text(&raw, "total"));
                form.set_value("date", today().format("%Y-%m-%d").to_string());
                form
            }
            Route::Salaries => {
                let spec = SalaryPayment::form();
                let values = spec.prefill(&raw);
                FormState::new(self.route, FormPurpose::PaySalary { salary_id: id }, spec, values)
            }
            _ => return,
        };
        self.form = Some(form);
        self.state = AppState::EditingForm;
    }

    pub fn close_form(&mut self) {
        self.form = None;
        self.state = AppState::Normal;
    }

    pub fn submit_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        if form.submitting {
            return;
        }
        form.submitting = true;
        form.errors.clear();

        let route = form.route;
        let purpose = form.purpose;
        let spec = form.spec.clone();
        let values = form.values.clone();
        let original = form.original.clone();
        let gym_id = self.gym_id();

        match purpose {
            FormPurpose::Save { target } => {
                with_resource!(route, |R| {
                    self.spawn_save::<R>(route, target, original, values, gym_id)
                });
            }
            FormPurpose::RecordPayment { invoice_id } => {
                let api = self.api.clone();
                let cache = Arc::clone(&self.cache);
                let task = async move {
                    let draft: PaymentDraft = forms::parse_draft(spec.build(&values, None)?)?;
                    api.resource::<Invoice>().record_payment(invoice_id, &draft).await?;
                    invalidate::<Invoice>(&cache, gym_id);
                    invalidate::<Transaction>(&cache, gym_id);
                    invalidate::<Account>(&cache, gym_id);
                    Ok::<(), FormError>(())
                };
                self.spawn_form_task(route, "Payment recorded".to_string(), task);
            }
            FormPurpose::PaySalary { salary_id } => {
                let api = self.api.clone();
                let cache = Arc::clone(&self.cache);
                let task = async move {
                    let built = spec.build(&values, None)?;
                    let account_id = built
                        .get("accountId")
                        .and_then(Value::as_i64)
                        .ok_or_else(|| FormError::Malformed("Account id is required".to_string()))?;
                    api.resource::<Salary>().pay(salary_id, account_id).await?;
                    invalidate::<Salary>(&cache, gym_id);
                    invalidate::<Account>(&cache, gym_id);
                    Ok::<(), FormError>(())
                };
                self.spawn_form_task(route, "Salary paid".to_string(), task);
            }
        }
    }

    fn spawn_save<R: TableRow>(
        &mut self,
        route: Route,
        target: Option<Id>,
        original: Option<Value>,
        values: Vec<String>,
        gym_id: Option<Id>,
    ) {
        let api = self.api.clone();
        let cache = Arc::clone(&self.cache);
        let form_gym = gym_id.filter(|_| route.is_gym_scoped());
        let verb = if target.is_some() { "updated" } else { "created" };

        let task = async move {
            let stored = original.unwrap_or(Value::Null);
            let original = target.map(|id| Original { id, json: &stored });
            forms::submit::<R>(&api, original, &values, form_gym).await?;
            invalidate::<R>(&cache, gym_id);
            Ok::<(), FormError>(())
        };
        self.spawn_form_task(route, format!("{} {}", R::NAME, verb), task);
    }

    fn spawn_form_task<F>(&mut self, route: Route, message: String, task: F)
    where
        F: Future<Output = Result<(), FormError>> + Send + 'static,
    {
        let tx = self.bg_tx.clone();
        self.loading = true;
        tokio::spawn(async move {
            let result = match task.await {
                Ok(()) => BgResult::Saved { route, message },
                Err(e) => BgResult::FormFailed(e),
            };
            send(&tx, result).await;
        });
    }

    // =========================================================================
    // Row actions
    // =========================================================================

    pub fn confirm_delete(&mut self) {
        if !guard::can_delete(self.role(), self.route) {
            self.toast_error(format!("You cannot delete from {}", self.route));
            return;
        }
        if let Some(row) = self.selected_row() {
            self.pending = Some((row.id, row.label.clone()));
            self.state = AppState::ConfirmingDelete;
        }
    }

    pub fn confirm_cancel(&mut self) {
        if self.route != Route::Subscriptions || !guard::can_edit(self.role(), self.route) {
            return;
        }
        match self.selected_row() {
            Some(row) if row.flags.cancellable => {
                self.pending = Some((row.id, row.label.clone()));
                self.state = AppState::ConfirmingCancel;
            }
            Some(_) => self.toast_info("This subscription cannot be cancelled"),
            None => {}
        }
    }

    pub fn delete_pending(&mut self) {
        self.state = AppState::Normal;
        let Some((id, _)) = self.pending.take() else {
            return;
        };
        let route = self.route;
        with_resource!(route, |R| self.spawn_delete::<R>(route, id));
    }

    fn spawn_delete<R: TableRow>(&mut self, route: Route, id: Id) {
        let api = self.api.clone();
        let cache = Arc::clone(&self.cache);
        let gym_id = self.gym_id();
        let task = async move {
            api.resource::<R>().delete(id).await?;
            invalidate::<R>(&cache, gym_id);
            if route == Route::Gyms {
                forget_gym(&cache, id);
            }
            Ok::<(), anyhow::Error>(())
        };
        self.spawn_action(route, format!("{} deleted", R::NAME), task);
    }

    pub fn cancel_pending(&mut self) {
        self.state = AppState::Normal;
        let Some((id, _)) = self.pending.take() else {
            return;
        };
        let api = self.api.clone();
        let cache = Arc::clone(&self.cache);
        let gym_id = self.gym_id();
        let task = async move {
            api.resource::<Subscription>().cancel(id).await?;
            invalidate::<Subscription>(&cache, gym_id);
            Ok::<(), anyhow::Error>(())
        };
        self.spawn_action(Route::Subscriptions, "Subscription cancelled".to_string(), task);
    }

    pub fn renew_selected(&mut self) {
        if self.route != Route::Subscriptions || !guard::can_edit(self.role(), self.route) {
            return;
        }
        let Some(id) = self.selected_row().map(|r| r.id) else {
            return;
        };
        let api = self.api.clone();
        let cache = Arc::clone(&self.cache);
        let gym_id = self.gym_id();
        let task = async move {
            api.resource::<Subscription>().renew(id).await?;
            invalidate::<Subscription>(&cache, gym_id);
            Ok::<(), anyhow::Error>(())
        };
        self.spawn_action(Route::Subscriptions, "Subscription renewed".to_string(), task);
    }

    fn spawn_action<F>(&mut self, route: Route, message: String, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let tx = self.bg_tx.clone();
        self.loading = true;
        tokio::spawn(async move {
            let result = match task.await {
                Ok(()) => BgResult::Saved { route, message },
                Err(e) => BgResult::ActionFailed(e),
            };
            send(&tx, result).await;
        });
    }

    // =========================================================================
    // Toasts
    // =========================================================================

    pub fn toast_success(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::new(ToastKind::Success, message));
    }

    pub fn toast_info(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::new(ToastKind::Info, message));
    }

    pub fn toast_error(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::new(ToastKind::Error, message));
    }

    fn report_error(&mut self, err: &anyhow::Error) {
        if is_unauthorized(err) {
            self.expire_session();
            return;
        }
        error!(error = %err, "Request failed");
        let message = api_error(err)
            .map(ApiError::user_message)
            .unwrap_or_else(|| err.to_string());
        self.toast_error(message);
    }

    // =========================================================================
    // Background results
    // =========================================================================

    /// Apply finished background work and expire the toast
    pub fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.bg_rx.try_recv() {
            results.push(result);
        }
        for result in results {
            self.process_result(result);
        }

        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }

        if !self.expiry_warned {
            if let Some(notice) = self.session.data.as_ref().and_then(expiry_notice) {
                self.expiry_warned = true;
                self.toast_info(notice);
            }
        }
    }

    fn process_result(&mut self, result: BgResult) {
        match result {
            BgResult::Listing { seq, result } => {
                if !self.request_seq.is_current(seq) {
                    debug!(seq, "Dropping stale listing");
                    return;
                }
                self.loading = false;
                match result {
                    Ok(listing) if listing.route == self.route => {
                        self.listing = Some(listing);
                        self.selection = self.selection.min(self.row_count().saturating_sub(1));
                    }
                    Ok(_) => {}
                    Err(e) => self.report_error(&e),
                }
            }
            BgResult::Dashboard { seq, data } => {
                if !self.request_seq.is_current(seq) {
                    debug!(seq, "Dropping stale dashboard");
                    return;
                }
                self.loading = false;
                self.dashboard = data;
            }
            BgResult::Profile(data) => {
                self.loading = false;
                if let Some(gym) = data.profile.as_ref().and_then(|p| p.gym.as_ref()) {
                    self.gym_name = Some(gym.name.clone());
                }
                self.profile = data;
            }
            BgResult::InvoicePayments(payments) => {
                self.loading = false;
                if self.selected_row().map(|r| r.id) == Some(payments.invoice_id) {
                    self.payments = Some(payments);
                }
            }
            BgResult::NextInvoiceNumber(number) => {
                let fallback = || {
                    let existing: Vec<String> = self
                        .listing
                        .iter()
                        .flat_map(|l| l.rows.iter())
                        .filter_map(|r| r.raw.get("invoiceNumber").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect();
                    next_invoice_number(INVOICE_PREFIX, existing.iter().map(String::as_str))
                };
                let number = number.unwrap_or_else(fallback);
                if let Some(form) = self.form.as_mut() {
                    let is_new_invoice = form.route == Route::Invoices
                        && form.purpose == FormPurpose::Save { target: None };
                    if is_new_invoice && form.value("invoiceNumber") == Some("") {
                        form.set_value("invoiceNumber", number);
                    }
                }
            }
            BgResult::Saved { route, message } => {
                self.loading = false;
                info!(route = %route, "{}", message);
                if self.state == AppState::EditingForm {
                    self.close_form();
                }
                self.toast_success(message);
                if route == self.route {
                    self.payments = None;
                    self.load_current();
                }
            }
            BgResult::FormFailed(err) => {
                self.loading = false;
                if let FormError::Request(ref e) = err {
                    if is_unauthorized(e) {
                        self.expire_session();
                        return;
                    }
                }
                let message = err.user_message();
                let Some(form) = self.form.as_mut() else {
                    self.toast_error(message);
                    return;
                };
                form.submitting = false;
                match err {
                    FormError::Invalid(errors) => {
                        debug!(count = errors.len(), "Form has errors");
                        form.errors = errors;
                    }
                    _ => self.toast_error(message),
                }
            }
            BgResult::ActionFailed(e) => {
                self.loading = false;
                self.report_error(&e);
            }
        }
    }
}

async fn send(tx: &mpsc::Sender<BgResult>, result: BgResult) {
    if tx.send(result).await.is_err() {
        debug!("Receiver dropped, discarding background result");
    }
}

fn is_unauthorized(err: &anyhow::Error) -> bool {
    api_error(err).is_some_and(ApiError::is_unauthorized)
}

fn items_or_empty<T>(result: Result<Page<T>>, what: &str) -> Vec<T> {
    match result {
        Ok(page) => page.items,
        Err(e) => {
            warn!(error = %e, list = what, "Dashboard list unavailable");
            Vec::new()
        }
    }
}

fn invalidate<R: Resource>(cache: &CacheManager, gym_id: Option<Id>) {
    if let Some(gym_id) = gym_id {
        if let Err(e) = cache.invalidate::<R>(gym_id) {
            warn!(error = %e, resource = R::PATH, "Failed to invalidate cache");
        }
    }
}

/// Notice for a session in its last minutes
fn expiry_notice(data: &SessionData) -> Option<String> {
    if !data.needs_refresh() || data.is_expired() {
        return None;
    }
    Some(format!(
        "Session ends in {} min, sign in again to keep working",
        data.minutes_until_expiry()
    ))
}

/// Drop every snapshot of a deleted gym
fn forget_gym(cache: &CacheManager, gym_id: Id) {
    match cache.clear_gym(gym_id) {
        Ok(()) => debug!(gym_id, "Cleared gym snapshots"),
        Err(e) => warn!(error = %e, gym_id, "Failed to clear gym snapshots"),
    }
}

/// A JSON scalar as raw form text
fn raw_text(raw: &Value, key: &str) -> String {
    match raw.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Dates default to today, months to the current month
fn apply_defaults(form: &mut FormState, today: NaiveDate) {
    for (i, field) in form.spec.fields.iter().enumerate() {
        if !form.values[i].is_empty() {
            continue;
        }
        match field.kind {
            FieldKind::Date if TODAY_FIELDS.contains(&field.key) => {
                form.values[i] = today.format("%Y-%m-%d").to_string();
            }
            FieldKind::Month => {
                form.values[i] = today.format("%Y-%m").to_string();
            }
            _ => {}
        }
    }
}

fn login_failure_message(err: &anyhow::Error) -> String {
    match api_error(err) {
        Some(ApiError::Unauthorized) => "Invalid email or password".to_string(),
        Some(api) => api.user_message(),
        None => format!("Login failed: {}", err),
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Control characters never enter a text field
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

fn can_add_input_char(current_len: usize, max_len: usize, c: char) -> bool {
    current_len < max_len && is_valid_input_char(c)
}

pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    can_add_input_char(current_len, MAX_EMAIL_LENGTH, c) && !c.is_whitespace()
}

pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    can_add_input_char(current_len, MAX_PASSWORD_LENGTH, c)
}

// ============================================================================
// Tests
// ============================================================================
