use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use gymdesk_core::guard::Route;
use gymdesk_core::utils::{format_date, format_money, truncate};

use crate::app::{App, Focus};
use crate::rows::Listing;
use crate::ui::styles;

/// Column holding the status, if the listing has one
fn status_column(listing: &Listing) -> Option<usize> {
    listing.columns.iter().position(|(name, _)| *name == "Status")
}

/// Render a resource screen: paginated table beside a detail panel
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(area);

    render_table(frame, app, chunks[0]);
    render_detail(frame, app, chunks[1]);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::List;

    let Some(listing) = app.listing.as_ref() else {
        let text = if app.loading { " Loading..." } else { " Nothing to show" };
        let block = Block::default()
            .title(format!(" {} ", app.route))
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(focused));
        frame.render_widget(
            Paragraph::new(Span::styled(text, styles::muted_style())).block(block),
            area,
        );
        return;
    };

    let header = Row::new(listing.columns.iter().map(|(name, _)| Cell::from(*name)))
        .style(styles::title_style())
        .height(1);

    let status_col = status_column(listing);
    let rows: Vec<Row> = listing
        .rows
        .iter()
        .map(|row| {
            let cells = row.cells.iter().enumerate().map(|(i, text)| {
                if Some(i) == status_col {
                    Cell::from(text.as_str()).style(styles::status_style(text))
                } else {
                    Cell::from(text.as_str())
                }
            });
            Row::new(cells).style(styles::list_item_style())
        })
        .collect();

    let widths: Vec<Constraint> = listing.columns.iter().map(|(_, width)| *width).collect();

    let search = if app.query.search.is_empty() {
        String::new()
    } else {
        format!(" - \"{}\"", app.query.search)
    };
    let title = format!(
        " {} ({}){} - page {}/{} ",
        app.route, listing.range_label, search, listing.page, listing.total_pages
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !listing.rows.is_empty() {
        state.select(Some(app.selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let placeholder = "-";
    let width = area.width.saturating_sub(16) as usize;

    let mut lines = Vec::new();
    match app.selected_row() {
        Some(row) => {
            for (label, value) in &row.detail {
                lines.push(Line::from(vec![
                    Span::styled(format!(" {:<12}", label), styles::muted_style()),
                    Span::styled(truncate(value, width.max(8)), styles::list_item_style()),
                ]));
            }
            if app.route == Route::Invoices {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(" Payments", styles::highlight_style())));
                match app.payments.as_ref().filter(|p| p.invoice_id == row.id) {
                    Some(p) if p.transactions.is_empty() => {
                        lines.push(Line::from(Span::styled("  None recorded", styles::muted_style())));
                    }
                    Some(p) => {
                        for t in &p.transactions {
                            lines.push(Line::from(vec![
                                Span::styled(format!("  {:<13}", format_date(t.date)), styles::muted_style()),
                                Span::styled(format!("{:>12} ", format_money(t.amount)), styles::success_style()),
                                Span::styled(t.method.to_string(), styles::list_item_style()),
                            ]));
                        }
                    }
                    None => {
                        lines.push(Line::from(Span::styled(
                            "  [Enter] to load",
                            styles::muted_style(),
                        )));
                    }
                }
            }
        }
        None => {
            lines.push(Line::from(Span::styled(
                format!(" {}", placeholder),
                styles::muted_style(),
            )));
        }
    }

    let block = Block::default()
        .title(" Details ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}
