use ratatui::{
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use gymdesk_core::forms::{FieldKind, FieldSpec};

use crate::app::{App, FormState};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

const FORM_WIDTH: u16 = 64;
const LABEL_WIDTH: usize = 22;

pub fn render(frame: &mut Frame, app: &App) {
    let Some(ref form) = app.form else {
        return;
    };

    let mut lines = vec![Line::from("")];
    let mut focus_line = 0;
    for (i, field) in form.spec.fields.iter().enumerate() {
        if i == form.focus {
            focus_line = lines.len();
        }
        lines.push(field_line(form, i, field));
        if let Some(message) = form.error_for(field.key) {
            lines.push(Line::from(Span::styled(
                format!("   {:width$}{}", "", message, width = LABEL_WIDTH),
                styles::error_style(),
            )));
        }
    }

    let general = form.general_errors();
    if !general.is_empty() {
        lines.push(Line::from(""));
        for message in general {
            lines.push(Line::from(Span::styled(format!("  {}", message), styles::error_style())));
        }
    }

    lines.push(Line::from(""));
    if form.submitting {
        lines.push(Line::from(Span::styled("  Saving...", styles::highlight_style())));
    } else {
        lines.push(Line::from(vec![
            Span::styled("  [Enter]", styles::help_key_style()),
            Span::styled(" save  ", styles::help_desc_style()),
            Span::styled("[Tab]", styles::help_key_style()),
            Span::styled(" next  ", styles::help_desc_style()),
            Span::styled("[←/→]", styles::help_key_style()),
            Span::styled(" choose  ", styles::help_desc_style()),
            Span::styled("[Esc]", styles::help_key_style()),
            Span::styled(" cancel", styles::help_desc_style()),
        ]));
    }

    let height = (lines.len() as u16 + 2).min(frame.area().height);
    let area = centered_rect_fixed(FORM_WIDTH, height, frame.area());
    frame.render_widget(Clear, area);

    // Keep the focused field on screen when the form is taller than the terminal
    let inner_height = area.height.saturating_sub(2) as usize;
    let scroll = (focus_line + 2).saturating_sub(inner_height) as u16;

    let block = Block::default()
        .title(format!(" {} ", form.title()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn field_line(form: &FormState, index: usize, field: &FieldSpec) -> Line<'static> {
    let focused = index == form.focus;
    let raw = form.values.get(index).map(String::as_str).unwrap_or("");
    let shown = if field.is_secret() {
        "*".repeat(raw.chars().count())
    } else {
        raw.to_string()
    };
    let marker = if field.required { "*" } else { "" };
    let label = format!("  {}{}:", field.label, marker);

    let mut value = if focused && !form.submitting {
        format!("[{}▌]", shown)
    } else {
        format!("[{}]", shown)
    };
    if matches!(field.kind, FieldKind::Choice(_) | FieldKind::Bool) && focused {
        value.push_str(" ◂▸");
    }

    let label_style = if form.error_for(field.key).is_some() {
        styles::error_style()
    } else if focused {
        styles::highlight_style()
    } else {
        styles::muted_style()
    };
    let value_style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };

    Line::from(vec![
        Span::styled(format!("{:<width$} ", label, width = LABEL_WIDTH + 2), label_style),
        Span::styled(value, value_style),
    ])
}
