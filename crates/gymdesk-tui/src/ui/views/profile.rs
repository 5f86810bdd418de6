use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use gymdesk_core::utils::{format_date, format_money, format_optional, EMPTY};

use crate::app::App;
use crate::ui::styles;

/// The logged-in user, plus their memberships and bills when they are a member
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(4), Constraint::Min(4)])
        .split(area);

    render_identity(frame, app, chunks[0]);
    render_subscriptions(frame, app, chunks[1]);
    render_invoices(frame, app, chunks[2]);
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {:<10}", label), styles::muted_style()),
        Span::styled(value, styles::list_item_style()),
    ])
}

fn render_identity(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match app.profile.profile {
        Some(ref p) => vec![
            field("Name", p.display_name().to_string()),
            field("E-mail", p.email.clone()),
            field("Role", format_optional(p.role.as_deref(), &app.role().to_string())),
            field(
                "Gym",
                p.gym.as_ref().map(|g| g.name.clone()).unwrap_or_else(|| EMPTY.to_string()),
            ),
            field(
                "Session",
                app.session
                    .data
                    .as_ref()
                    .map(|d| format!("expires in {} min", d.minutes_until_expiry()))
                    .unwrap_or_default(),
            ),
        ],
        None => vec![Line::from(Span::styled(
            if app.loading { " Loading..." } else { " Profile unavailable" },
            styles::muted_style(),
        ))],
    };

    let block = Block::default()
        .title(" Profile ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_subscriptions(frame: &mut Frame, app: &App, area: Rect) {
    let today = Local::now().date_naive();
    let mut lines = Vec::new();
    for sub in &app.profile.subscriptions {
        let status = sub.effective_status(today);
        lines.push(Line::from(vec![
            Span::styled(
                format!(" {:<24}", sub.package_name.as_deref().unwrap_or("Package")),
                styles::list_item_style(),
            ),
            Span::styled(
                format!("{} - {}  ", format_date(Some(sub.start_date)), format_date(Some(sub.end_date))),
                styles::muted_style(),
            ),
            Span::styled(status.to_string(), styles::status_style(&status.to_string())),
        ]));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(" No subscriptions", styles::muted_style())));
    }

    let block = Block::default()
        .title(" My subscriptions ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_invoices(frame: &mut Frame, app: &App, area: Rect) {
    let today = Local::now().date_naive();
    let mut lines = Vec::new();
    for invoice in &app.profile.invoices {
        let status = invoice.effective_status(today).to_string();
        lines.push(Line::from(vec![
            Span::styled(format!(" {:<14}", invoice.invoice_number), styles::list_item_style()),
            Span::styled(format!("due {:<14}", format_date(invoice.due_date)), styles::muted_style()),
            Span::styled(format!("{:>12}  ", format_money(invoice.total)), styles::list_item_style()),
            Span::styled(status.clone(), styles::status_style(&status)),
        ]));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(" No invoices", styles::muted_style())));
    }

    let block = Block::default()
        .title(" My invoices ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
