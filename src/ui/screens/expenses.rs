use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::budget::{format_currency, ExpenseGroup};
use crate::feed::FeedView;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::truncate;

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    match app.feed.view(&app.plan) {
        FeedView::Loading => render_message(f, area, app, &["Loading expenses…"]),
        FeedView::Empty if app.household_id().is_none() => render_message(
            f,
            area,
            app,
            &["You are not in a household yet", "Use :create <name> or :join <code>"],
        ),
        FeedView::Empty => render_message(
            f,
            area,
            app,
            &[
                "No expenses for this month",
                "Press a or use :add <category> <amount> <description>",
            ],
        ),
        FeedView::Grouped(groups) => render_groups(f, area, app, &groups),
    }
}

fn block_for(app: &App) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(
            format!(
                " Expenses {} ({}) ",
                app.current_month,
                app.feed.expenses.len()
            ),
            theme::title_style(),
        ))
}

fn render_message(f: &mut Frame, area: Rect, app: &App, lines: &[&str]) {
    let mut text = vec![Line::from("")];
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            text.push(Line::from(""));
        }
        text.push(Line::from(Span::styled(line.to_string(), theme::dim_style())));
    }
    f.render_widget(Paragraph::new(text).centered().block(block_for(app)), area);
}

fn render_groups(f: &mut Frame, area: Rect, app: &App, groups: &[ExpenseGroup]) {
    let header_cells = ["Date", "Description", "Added by", "Amount"]
        .iter()
        .map(|h| Cell::from(*h).style(theme::header_style()));
    let header = Row::new(header_cells).height(1);

    // Group headings are rows too; track which row the cursor lands on.
    let mut rows: Vec<Row> = Vec::new();
    let mut cursor_row = 0;
    let mut position = 0;
    for group in groups {
        rows.push(
            Row::new(vec![
                Cell::from(Span::styled(
                    format!("▸ {}", group.label),
                    theme::section_style(),
                )),
                Cell::from(Span::styled(
                    format!("{} items", group.expenses.len()),
                    theme::dim_style(),
                )),
                Cell::from(""),
                Cell::from(Span::styled(
                    format_currency(group.total),
                    Style::default()
                        .fg(theme::YELLOW)
                        .add_modifier(Modifier::BOLD),
                )),
            ])
            .style(theme::normal_style()),
        );

        for expense in &group.expenses {
            let is_cursor = position == app.expense_index;
            if is_cursor {
                cursor_row = rows.len();
            }
            let style = if is_cursor {
                theme::selected_style()
            } else if position % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };
            let added_by = expense
                .created_by
                .and_then(|id| app.members.iter().find(|m| m.user_id == id))
                .map_or("", |m| m.display_name());

            rows.push(
                Row::new(vec![
                    Cell::from(format!("  {}", expense.date)),
                    Cell::from(truncate(&expense.description, 40)),
                    Cell::from(truncate(added_by, 16)),
                    Cell::from(Span::styled(
                        format_currency(expense.amount),
                        theme::expense_style(),
                    )),
                ])
                .style(style),
            );
            position += 1;
        }
    }

    // borders + header
    let height = area.height.saturating_sub(3) as usize;
    let mut start = 0;
    if height > 0 && cursor_row >= height {
        start = cursor_row + 1 - height;
    }
    let rows: Vec<Row> = rows.into_iter().skip(start).take(height).collect();

    let widths = [
        Constraint::Length(14),
        Constraint::Min(20),
        Constraint::Length(18),
        Constraint::Length(14),
    ];

    let table = Table::new(rows, widths).header(header).block(block_for(app));
    f.render_widget(table, area);
}
