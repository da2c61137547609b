use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::db::{Database, Session};
use crate::ui::app::{App, InputMode, PendingAction, Screen};
use crate::ui::commands;
use crate::ui::util::{scroll_down, scroll_to_bottom, scroll_to_top, scroll_up};

/// How long to wait for a key before checking the change log.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub(crate) fn as_tui(db: &mut Database, session: Session, config: &Config) -> Result<()> {
    let mut app = App::new(session, config.default_plan);
    app.refresh_all(db)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, db);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        eprintln!("Error: {e:?}");
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    db: &mut Database,
) -> Result<()> {
    while app.running {
        terminal.draw(|f| {
            // tab bar, status bar, command bar, block borders, table header
            let content_height = f.area().height.saturating_sub(6) as usize;
            app.visible_rows = content_height.max(1);
            crate::ui::render::render(f, app);
        })?;

        if !event::poll(POLL_INTERVAL)? {
            poll_changes(app, db);
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.show_help {
                app.show_help = false;
                continue;
            }
            let outcome = match app.input_mode {
                InputMode::Normal => handle_normal_input(key, app, db),
                InputMode::Command => handle_command_input(key, app, db),
                InputMode::Editing => handle_editing_input(key, app, db),
                InputMode::Confirm => handle_confirm_input(key, app, db),
            };
            // A failed command must not take the whole UI down.
            if let Err(e) = outcome {
                warn!(error = %e, "command failed");
                app.input_mode = InputMode::Normal;
                app.set_status(format!("Error: {e}"));
            }
            poll_changes(app, db);
        }
    }
    Ok(())
}

fn poll_changes(app: &mut App, db: &Database) {
    match app.poll_changes(db) {
        Ok(true) => debug!("expense list updated from change log"),
        Ok(false) => {}
        Err(e) => warn!(error = %e, "change poll failed"),
    }
}

// ── Input handlers ───────────────────────────────────────────

fn handle_normal_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Char(':') => {
            app.input_mode = InputMode::Command;
            app.command_input.clear();
        }
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Char('q') | KeyCode::Char('c')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            app.running = false;
        }
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char('j') | KeyCode::Down => handle_move_down(app),
        KeyCode::Char('k') | KeyCode::Up => handle_move_up(app),
        KeyCode::Char('g') => handle_goto_top(app),
        KeyCode::Char('G') => handle_goto_bottom(app),
        KeyCode::Char('1') => switch_screen(app, db, Screen::Dashboard)?,
        KeyCode::Char('2') => switch_screen(app, db, Screen::Expenses)?,
        KeyCode::Char('3') => switch_screen(app, db, Screen::Household)?,
        KeyCode::Tab => {
            let screens = Screen::all();
            let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
            let next = (idx + 1) % screens.len();
            switch_screen(app, db, screens[next])?;
        }
        KeyCode::BackTab => {
            let screens = Screen::all();
            let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
            let prev = if idx == 0 { screens.len() - 1 } else { idx - 1 };
            switch_screen(app, db, screens[prev])?;
        }
        KeyCode::Char('H') => app.shift_month(db, -1)?,
        KeyCode::Char('L') => app.shift_month(db, 1)?,
        KeyCode::Char('e') | KeyCode::Enter if app.screen == Screen::Dashboard => {
            if app.household_id().is_none() {
                app.set_status("No household. Use :create <name> or :join <code>");
            } else {
                app.income_editor.begin(app.income);
                app.input_mode = InputMode::Editing;
            }
        }
        KeyCode::Char('a') => {
            app.input_mode = InputMode::Command;
            app.command_input = "add ".into();
        }
        KeyCode::Char('D') if app.screen == Screen::Expenses => {
            commands::handle_command("delete", app, db)?;
        }
        KeyCode::Char('D') if app.screen == Screen::Household => {
            commands::handle_command("remove", app, db)?;
        }
        KeyCode::Char('r') => {
            app.refresh_all(db)?;
            app.set_status("Reloaded");
        }
        KeyCode::Esc => app.status_message.clear(),
        _ => {}
    }
    Ok(())
}

fn handle_command_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let input = app.command_input.clone();
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
            commands::handle_command(&input, app, db)?;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
        }
        KeyCode::Backspace => {
            app.command_input.pop();
            if app.command_input.is_empty() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let trimmed = app.command_input.trim_end();
            if let Some(pos) = trimmed.rfind(' ') {
                app.command_input.truncate(pos + 1);
            } else {
                app.command_input.clear();
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char(c) => {
            app.command_input.push(c);
        }
        _ => {}
    }
    Ok(())
}

/// Keys while the income field has focus.
fn handle_editing_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let Some(household_id) = app.household_id() else {
                app.input_mode = InputMode::Normal;
                return Ok(());
            };
            match app.income_editor.submit() {
                Ok(income) => {
                    db.set_income(household_id, &app.current_month, income)?;
                    app.input_mode = InputMode::Normal;
                    app.refresh_budget(db)?;
                    app.set_status(format!(
                        "Income for {} set to {}",
                        app.current_month,
                        crate::budget::format_currency(income)
                    ));
                }
                Err(e) => app.set_status(e.to_string()),
            }
        }
        KeyCode::Esc => {
            app.income_editor.cancel(app.income);
            app.input_mode = InputMode::Normal;
            app.set_status("Edit cancelled");
        }
        KeyCode::Backspace => {
            app.income_editor.input.pop();
        }
        KeyCode::Char(c) if c.is_ascii_digit() || matches!(c, '.' | ',' | '$') => {
            app.income_editor.input.push(c);
        }
        _ => {}
    }
    Ok(())
}

fn handle_confirm_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            if let Some(action) = app.pending_action.take() {
                app.input_mode = InputMode::Normal;
                app.confirm_message.clear();
                match action {
                    PendingAction::DeleteExpense { id, description } => {
                        let household_id = app.household_id().unwrap_or_default();
                        db.delete_expense(household_id, id)?;
                        app.poll_changes(db)?;
                        app.set_status(format!("Deleted: {description}"));
                    }
                    PendingAction::RemoveMember { id, name } => {
                        let user_id = app.session.user_id()?;
                        db.remove_member(user_id, id)?;
                        app.refresh_household(db)?;
                        app.set_status(format!("Removed {name}"));
                    }
                }
            }
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.pending_action = None;
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
            app.set_status("Cancelled");
        }
        _ => {}
    }
    Ok(())
}

fn switch_screen(app: &mut App, db: &mut Database, screen: Screen) -> Result<()> {
    app.screen = screen;
    match screen {
        Screen::Dashboard => app.refresh_budget(db)?,
        Screen::Expenses => {}
        Screen::Household => app.refresh_household(db)?,
    }
    Ok(())
}

fn handle_move_down(app: &mut App) {
    let page = app.visible_rows;
    match app.screen {
        Screen::Expenses => {
            let len = app.feed.expenses.len();
            scroll_down(&mut app.expense_index, &mut app.expense_scroll, len, page);
        }
        Screen::Household => {
            let mut scroll = 0;
            scroll_down(&mut app.member_index, &mut scroll, app.members.len(), page);
        }
        Screen::Dashboard => {}
    }
}

fn handle_move_up(app: &mut App) {
    match app.screen {
        Screen::Expenses => scroll_up(&mut app.expense_index, &mut app.expense_scroll),
        Screen::Household => {
            let mut scroll = 0;
            scroll_up(&mut app.member_index, &mut scroll);
        }
        Screen::Dashboard => {}
    }
}

fn handle_goto_top(app: &mut App) {
    match app.screen {
        Screen::Expenses => scroll_to_top(&mut app.expense_index, &mut app.expense_scroll),
        Screen::Household => app.member_index = 0,
        Screen::Dashboard => {}
    }
}

fn handle_goto_bottom(app: &mut App) {
    let page = app.visible_rows;
    match app.screen {
        Screen::Expenses => {
            let len = app.feed.expenses.len();
            scroll_to_bottom(&mut app.expense_index, &mut app.expense_scroll, len, page);
        }
        Screen::Household => app.member_index = app.members.len().saturating_sub(1),
        Screen::Dashboard => {}
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::models::PlanPreset;
    use crossterm::event::KeyEvent;
    use rust_decimal_macros::dec;

    fn press(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn setup() -> (Database, App) {
        let mut db = Database::open_in_memory().unwrap();
        let session = db.ensure_default_session(PlanPreset::Classic).unwrap().unwrap();
        let mut app = App::new(session, PlanPreset::Classic);
        app.refresh_all(&db).unwrap();
        (db, app)
    }

    #[test]
    fn test_digits_switch_tabs_while_income_missing() {
        let (mut db, mut app) = setup();
        assert!(app.income.is_zero());
        assert!(app.income_editor.is_editing());

        handle_normal_input(press('2'), &mut app, &mut db).unwrap();
        assert_eq!(app.screen, Screen::Expenses);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.income_editor.input.is_empty());

        handle_normal_input(press('1'), &mut app, &mut db).unwrap();
        assert_eq!(app.screen, Screen::Dashboard);
    }

    #[test]
    fn test_income_typed_after_e() {
        let (mut db, mut app) = setup();
        handle_normal_input(press('e'), &mut app, &mut db).unwrap();
        assert_eq!(app.input_mode, InputMode::Editing);

        for c in "4200".chars() {
            handle_editing_input(press(c), &mut app, &mut db).unwrap();
        }
        handle_editing_input(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), &mut app, &mut db)
            .unwrap();

        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.income, dec!(4200));
        assert_eq!(app.summary.allocated, dec!(4200));
    }
}
