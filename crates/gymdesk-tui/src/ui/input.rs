//! Keyboard input handling for the TUI.
//!
//! Keys are dispatched by the current overlay state first; only the
//! normal state sees the navigation and record shortcuts.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use gymdesk_core::guard::Route;

use crate::app::{can_add_email_char, can_add_password_char, App, AppState, Focus, LoginFocus};

/// Rows skipped by PageUp/PageDown within the visible list
const SCROLL_STEP: isize = 10;

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::LoggingIn => handle_login_input(app, key).await,
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            Ok(false)
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            Ok(false)
        }
        AppState::ConfirmingDelete | AppState::ConfirmingCancel => {
            handle_confirm_input(app, key);
            Ok(false)
        }
        AppState::Searching => {
            handle_search_input(app, key);
            Ok(false)
        }
        AppState::EditingForm => {
            handle_form_input(app, key);
            Ok(false)
        }
        AppState::Normal => handle_normal_input(app, key),
        AppState::Quitting => Ok(true),
    }
}

fn handle_confirm_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            if app.state == AppState::ConfirmingDelete {
                app.delete_pending();
            } else {
                app.cancel_pending();
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.pending = None;
            app.state = AppState::Normal;
        }
        _ => {}
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.clear_search(),
        KeyCode::Enter => app.apply_search(),
        KeyCode::Backspace => {
            app.search_input.pop();
        }
        KeyCode::Char(c) => app.search_input.push(c),
        _ => {}
    }
}

fn handle_form_input(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.close_form();
        return;
    }
    if key.code == KeyCode::Enter {
        app.submit_form();
        return;
    }
    let Some(form) = app.form.as_mut() else {
        app.state = AppState::Normal;
        return;
    };
    if form.submitting {
        return;
    }
    match key.code {
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.prev_field(),
        KeyCode::Left => form.cycle(false),
        KeyCode::Right => form.cycle(true),
        KeyCode::Backspace => form.pop_char(),
        KeyCode::Char(c) => form.push_char(c),
        _ => {}
    }
}

fn handle_normal_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('L') => app.logout(),
        KeyCode::Tab | KeyCode::BackTab => {
            app.focus = match app.focus {
                Focus::Sidebar => Focus::List,
                Focus::List => Focus::Sidebar,
            };
        }
        KeyCode::Up | KeyCode::Char('k') => move_cursor(app, -1),
        KeyCode::Down | KeyCode::Char('j') => move_cursor(app, 1),
        KeyCode::PageUp => move_cursor(app, -SCROLL_STEP),
        KeyCode::PageDown => move_cursor(app, SCROLL_STEP),
        KeyCode::Home => app.move_selection(isize::MIN / 2),
        KeyCode::End => app.move_selection(isize::MAX / 2),
        KeyCode::Enter => match app.focus {
            Focus::Sidebar => app.select_sidebar(),
            Focus::List => match app.route {
                Route::Gyms => app.select_gym(),
                Route::Invoices => app.load_invoice_payments(),
                _ => {}
            },
        },
        KeyCode::Char('[') | KeyCode::Left => app.prev_page(),
        KeyCode::Char(']') | KeyCode::Right => app.next_page(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.change_page_size(true),
        KeyCode::Char('-') => app.change_page_size(false),
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Esc => {
            if !app.query.search.is_empty() {
                app.clear_search();
            }
        }
        KeyCode::Char('n') => app.open_new_form(),
        KeyCode::Char('e') => app.open_edit_form(),
        KeyCode::Char('d') => app.confirm_delete(),
        KeyCode::Char('p') => app.open_pay_form(),
        KeyCode::Char('c') => app.confirm_cancel(),
        KeyCode::Char('r') => app.renew_selected(),
        KeyCode::Char('u') => app.load_current(),
        _ => {}
    }
    Ok(false)
}

fn move_cursor(app: &mut App, delta: isize) {
    match app.focus {
        Focus::Sidebar => {
            let count = app.sidebar.len();
            if count == 0 {
                return;
            }
            let next = (app.sidebar_selection as isize + delta).clamp(0, count as isize - 1);
            app.sidebar_selection = next as usize;
        }
        Focus::List => app.move_selection(delta),
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Email,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Email,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => {
                // Failures land in login_error and keep the overlay open
                let _ = app.attempt_login().await;
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Email => {
                app.login_email.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if can_add_email_char(app.login_email.chars().count(), c) {
                    app.login_email.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}
