use ratatui::style::{Color, Modifier, Style};

use crate::app::ToastKind;

// Color palette
const TEAL: Color = Color::Rgb(56, 150, 150);
const GREEN: Color = Color::Rgb(104, 172, 92);
const AMBER: Color = Color::Rgb(214, 150, 60);
const RED: Color = Color::Rgb(200, 72, 72);
const GREY: Color = Color::Rgb(130, 130, 138);
const SELECTION_BG: Color = Color::Rgb(40, 52, 58);
const STATUS_BAR_BG: Color = Color::Rgb(28, 34, 38);

// Styles
pub fn title_style() -> Style {
    Style::default().fg(TEAL).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default().bg(SELECTION_BG).add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(GREY)
}

pub fn highlight_style() -> Style {
    Style::default().fg(AMBER)
}

pub fn success_style() -> Style {
    Style::default().fg(GREEN)
}

pub fn error_style() -> Style {
    Style::default().fg(RED)
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(TEAL)
    } else {
        Style::default().fg(GREY)
    }
}

pub fn search_style() -> Style {
    Style::default().fg(AMBER).add_modifier(Modifier::ITALIC)
}

pub fn status_bar_style() -> Style {
    Style::default().bg(STATUS_BAR_BG).fg(Color::White)
}

pub fn help_key_style() -> Style {
    highlight_style().add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    list_item_style()
}

pub fn toast_style(kind: ToastKind) -> Style {
    match kind {
        ToastKind::Success => success_style().add_modifier(Modifier::BOLD),
        ToastKind::Info => highlight_style(),
        ToastKind::Error => error_style().add_modifier(Modifier::BOLD),
    }
}

/// Money coloured by sign
pub fn amount_style(negative: bool) -> Style {
    if negative {
        error_style()
    } else {
        success_style()
    }
}

/// Status cells: problems in red, settled states in green
pub fn status_style(status: &str) -> Style {
    match status.trim_end_matches('!') {
        "Overdue" | "Expired" | "Cancelled" | "Suspended" => error_style(),
        "Paid" | "Active" => success_style(),
        "Pending" | "Draft" => highlight_style(),
        _ => list_item_style(),
    }
}
