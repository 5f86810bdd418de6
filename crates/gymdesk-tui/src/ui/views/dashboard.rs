use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use rust_decimal::Decimal;

use gymdesk_core::dashboard::ActivityKind;
use gymdesk_core::utils::{format_money, format_timestamp, truncate};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Length(5), Constraint::Min(5)])
        .split(area);

    let cards = cards(app);
    let (top, bottom) = cards.split_at(cards.len().min(4));
    render_card_row(frame, top, chunks[0]);
    render_card_row(frame, bottom, chunks[1]);
    render_activity(frame, app, chunks[2]);
}

struct Card {
    title: &'static str,
    value: String,
    note: Option<String>,
    negative: bool,
}

fn count(title: &'static str, value: u64, note: Option<String>) -> Card {
    Card {
        title,
        value: value.to_string(),
        note,
        negative: false,
    }
}

fn money(title: &'static str, value: Decimal) -> Card {
    Card {
        title,
        value: format_money(value),
        note: None,
        negative: value.is_sign_negative() && !value.is_zero(),
    }
}

/// Backend figures when available, otherwise totals from the sampled lists
fn cards(app: &App) -> Vec<Card> {
    let data = &app.dashboard;
    match data.stats {
        Some(ref stats) => vec![
            count(
                "Members",
                stats.total_members,
                Some(format!("{} active", stats.active_members)),
            ),
            count("Trainers", stats.total_trainers, None),
            count(
                "Subscriptions",
                stats.active_subscriptions,
                Some(format!("{} expiring", stats.expiring_subscriptions)),
            ),
            count(
                "Invoices due",
                stats.pending_invoices,
                Some(format!("{} overdue", stats.overdue_invoices)),
            ),
            money("Revenue (month)", stats.monthly_revenue),
            money("Expenses (month)", stats.monthly_expenses),
            money("Net (month)", stats.monthly_net()),
        ],
        None => vec![
            money("Income", data.summary.income),
            money("Expenses", data.summary.expense),
            money("Net", data.summary.net),
            count("Overdue invoices", data.summary.overdue_invoices as u64, None),
        ],
    }
}

fn render_card_row(frame: &mut Frame, cards: &[Card], area: Rect) {
    if cards.is_empty() {
        return;
    }
    let constraints: Vec<Constraint> = cards
        .iter()
        .map(|_| Constraint::Ratio(1, cards.len() as u32))
        .collect();
    let slots = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (card, slot) in cards.iter().zip(slots.iter()) {
        let value_style = if card.negative {
            styles::amount_style(true)
        } else {
            styles::title_style()
        };
        let mut lines = vec![Line::from(Span::styled(format!(" {}", card.value), value_style))];
        if let Some(ref note) = card.note {
            lines.push(Line::from(Span::styled(format!(" {}", note), styles::muted_style())));
        }
        let block = Block::default()
            .title(format!(" {} ", card.title))
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(false));
        frame.render_widget(Paragraph::new(lines).block(block), *slot);
    }
}

fn render_activity(frame: &mut Frame, app: &App, area: Rect) {
    let data = &app.dashboard;
    let width = area.width.saturating_sub(48) as usize;

    let mut lines = Vec::new();
    if data.activity.is_empty() {
        let text = if app.loading { " Loading..." } else { " No recent activity" };
        lines.push(Line::from(Span::styled(text, styles::muted_style())));
    }
    for entry in &data.activity {
        let kind_style = match entry.kind {
            ActivityKind::NewMember => styles::highlight_style(),
            ActivityKind::Payment => styles::success_style(),
            ActivityKind::Expense => styles::error_style(),
        };
        let amount = entry.amount.map(format_money).unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled(format!(" {:<19}", format_timestamp(entry.at)), styles::muted_style()),
            Span::styled(format!("{:<12}", entry.kind.label()), kind_style),
            Span::styled(format!("{:>12}  ", amount), styles::list_item_style()),
            Span::styled(truncate(&entry.summary, width.max(10)), styles::list_item_style()),
        ]));
    }

    let mut title = " Recent activity ".to_string();
    if let Some(ref age) = data.cached_age {
        title = format!(" Recent activity - figures saved {} ", age);
    }
    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
