use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table},
    Frame,
};

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::truncate;

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(8)])
        .split(columns[0]);

    render_info(f, left[0], app);
    render_households(f, left[1], app);
    render_members(f, columns[1], app);
}

fn titled(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(title, theme::title_style()))
}

fn render_info(f: &mut Frame, area: Rect, app: &App) {
    let Some(household) = app.session.household.as_ref() else {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No household selected", theme::dim_style())),
            Line::from(""),
            Line::from(Span::styled(":create <name>", theme::normal_style())),
            Line::from(Span::styled(":join <code>", theme::normal_style())),
        ])
        .centered()
        .block(titled(" Household ".into()));
        f.render_widget(msg, area);
        return;
    };

    let role = app
        .my_membership()
        .map_or_else(|| "-".to_string(), |m| m.role.to_string());

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Name         ", theme::dim_style()),
            Span::styled(
                household.name.clone(),
                Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Invite code  ", theme::dim_style()),
            Span::styled(
                household.invite_code.clone(),
                Style::default()
                    .fg(theme::YELLOW)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Your role    ", theme::dim_style()),
            Span::styled(role, theme::normal_style()),
        ]),
        Line::from(""),
        Line::from(Span::styled("Plan", theme::section_style())),
    ];
    for (i, cat) in app.plan.categories.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:>3}%  ", cat.percentage),
                Style::default().fg(theme::category_color(i)),
            ),
            Span::styled(truncate(&cat.label, 18), theme::normal_style()),
            Span::styled(format!("  ({})", cat.key), theme::dim_style()),
        ]));
    }

    f.render_widget(Paragraph::new(lines).block(titled(" Household ".into())), area);
}

fn render_households(f: &mut Frame, area: Rect, app: &App) {
    let current = app.household_id();
    let items: Vec<ListItem> = app
        .households
        .iter()
        .map(|h| {
            let style = if h.id == current {
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD)
            } else {
                theme::normal_style()
            };
            let marker = if h.id == current { "● " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::styled(marker, style),
                Span::styled(truncate(&h.name, 24), style),
                Span::styled(format!("  {}", h.invite_code), theme::dim_style()),
            ]))
        })
        .collect();

    let list = List::new(items).block(titled(format!(
        " Your households ({}) ",
        app.households.len()
    )));
    f.render_widget(list, area);
}

fn render_members(f: &mut Frame, area: Rect, app: &App) {
    let block = titled(format!(" Members ({}) ", app.members.len()));
    if app.members.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "No members to show",
            theme::dim_style(),
        )))
        .centered()
        .block(block);
        f.render_widget(msg, area);
        return;
    }

    let header_cells = ["Name", "Email", "Role", "Joined"]
        .iter()
        .map(|h| Cell::from(*h).style(theme::header_style()));
    let header = Row::new(header_cells).height(1);

    let me = app.session.user.id;
    let height = area.height.saturating_sub(3) as usize;
    let start = (app.member_index + 1).saturating_sub(height);

    let rows: Vec<Row> = app
        .members
        .iter()
        .enumerate()
        .skip(start)
        .take(height)
        .map(|(i, m)| {
            let style = if i == app.member_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };
            let name = if Some(m.user_id) == me {
                format!("{} (you)", m.display_name())
            } else {
                m.display_name().to_string()
            };
            Row::new(vec![
                Cell::from(truncate(&name, 24)),
                Cell::from(truncate(&m.email, 28)),
                Cell::from(m.role.to_string()),
                Cell::from(m.joined_at.get(..10).unwrap_or(m.joined_at.as_str()).to_string()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Min(16),
        Constraint::Min(20),
        Constraint::Length(8),
        Constraint::Length(11),
    ];

    let table = Table::new(rows, widths).header(header).block(block);
    f.render_widget(table, area);
}
