use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, Paragraph},
    Frame,
};
use rust_decimal::Decimal;

use crate::budget::{format_currency, CategoryBudget, ProgressTier};
use crate::ui::app::{App, InputMode};
use crate::ui::theme;
use crate::ui::util::{bar_value, gauge_ratio, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    if app.household_id().is_none() {
        render_no_household(f, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Income + summary cards
            Constraint::Min(6),    // Category progress
        ])
        .split(area);

    render_cards(f, chunks[0], app);

    if app.income.is_zero() {
        render_categories(f, chunks[1], app);
        return;
    }
    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);
    render_categories(f, panels[0], app);
    render_budget_chart(f, panels[1], app);
}

fn render_cards(f: &mut Frame, area: Rect, app: &App) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(31),
            Constraint::Percentage(23),
            Constraint::Percentage(23),
            Constraint::Percentage(23),
        ])
        .split(area);

    render_income_card(f, cards[0], app);

    let summary = &app.summary;
    render_card(
        f,
        cards[1],
        "Allocated",
        summary.allocated,
        theme::ACCENT,
        None,
    );
    render_card(
        f,
        cards[2],
        "Spent",
        summary.spent,
        theme::tier_color(ProgressTier::from_percentage(summary.spending_percentage())),
        Some(format!("{:.0}% of budget", summary.spending_percentage())),
    );
    render_card(
        f,
        cards[3],
        "Remaining",
        summary.remaining,
        if summary.remaining >= Decimal::ZERO {
            theme::GREEN
        } else {
            theme::RED
        },
        None,
    );
}

fn render_income_card(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.input_mode == InputMode::Editing;
    let border = if focused { theme::GREEN } else { theme::OVERLAY };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            format!(" Income {} ", app.current_month),
            theme::title_style(),
        ));

    let lines = if app.income_editor.is_editing() {
        let shown = if app.income_editor.input.is_empty() && !focused {
            Span::styled("$ 0.00", theme::dim_style())
        } else {
            Span::styled(
                format!("$ {}", app.income_editor.input),
                Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD),
            )
        };
        let hint = if focused {
            "Enter to save, Esc to cancel"
        } else {
            "Press e to enter your income"
        };
        vec![shown.into(), Line::from(Span::styled(hint, theme::dim_style()))]
    } else {
        vec![
            Line::from(Span::styled(
                format_currency(app.income),
                theme::income_style().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled("e to edit", theme::dim_style())),
        ]
    };

    f.render_widget(Paragraph::new(lines).centered().block(block), area);
}

fn render_card(
    f: &mut Frame,
    area: Rect,
    title: &str,
    amount: Decimal,
    color: Color,
    subtitle: Option<String>,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(format!(" {title} "), theme::title_style()));

    let text = Paragraph::new(vec![
        Line::from(Span::styled(
            format_currency(amount),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(subtitle.unwrap_or_default(), theme::dim_style())),
    ])
    .centered()
    .block(block);

    f.render_widget(text, area);
}

fn render_categories(f: &mut Frame, area: Rect, app: &App) {
    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(
            format!(" Budget for {} ", app.current_month),
            theme::title_style(),
        ));
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    if app.income.is_zero() {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Set this month's income to see your budget",
                theme::dim_style(),
            )),
            Line::from(Span::styled(
                "Press e or use :income <amount>",
                theme::dim_style(),
            )),
        ])
        .centered();
        f.render_widget(msg, inner);
        return;
    }

    let mut constraints: Vec<Constraint> = app.budgets.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Min(0));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (i, budget) in app.budgets.iter().enumerate() {
        render_category(f, rows[i], budget, i);
    }
}

fn render_category(f: &mut Frame, area: Rect, budget: &CategoryBudget, index: usize) {
    let pct = budget.spending_percentage();
    let color = theme::tier_color(budget.tier());

    let status = if budget.is_over_budget() {
        Span::styled(
            format!(" over by {} ", format_currency(budget.over_by())),
            Style::default().fg(theme::RED).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(
            format!(" {} left ", format_currency(budget.remaining)),
            theme::dim_style(),
        )
    };

    let block = Block::default()
        .borders(Borders::LEFT)
        .border_style(Style::default().fg(theme::category_color(index)))
        .title(Line::from(vec![
            Span::styled(
                format!(" {} ", truncate(&budget.label, 20)),
                Style::default()
                    .fg(theme::category_color(index))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("{}% ", budget.percentage), theme::dim_style()),
            status,
        ]));

    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(color).bg(theme::SURFACE))
        .ratio(gauge_ratio(pct))
        .label(Span::styled(
            format!(
                "{} of {} ({pct:.0}%, {})",
                format_currency(budget.spent),
                format_currency(budget.allocated),
                budget.tier()
            ),
            Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD),
        ));

    f.render_widget(gauge, area);
}

/// Allocated vs spent per category, one bar pair each.
fn render_budget_chart(f: &mut Frame, area: Rect, app: &App) {
    let mut chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme::OVERLAY))
                .title(Line::from(vec![
                    Span::styled(" Budget ", Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD)),
                    Span::styled("vs ", theme::title_style()),
                    Span::styled("Spent ", Style::default().fg(theme::MAUVE).add_modifier(Modifier::BOLD)),
                ])),
        )
        .bar_width(5)
        .bar_gap(0)
        .group_gap(2)
        .value_style(Style::default().fg(theme::HEADER_BG).add_modifier(Modifier::BOLD));

    for (i, budget) in app.budgets.iter().enumerate() {
        let spent_color = if budget.is_over_budget() {
            theme::RED
        } else {
            theme::MAUVE
        };
        let bars = [
            Bar::default()
                .value(bar_value(budget.allocated))
                .style(Style::default().fg(theme::ACCENT)),
            Bar::default()
                .value(bar_value(budget.spent))
                .style(Style::default().fg(spent_color)),
        ];
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(Span::styled(
                    truncate(&budget.label, 10),
                    Style::default().fg(theme::category_color(i)),
                )))
                .bars(&bars),
        );
    }

    f.render_widget(chart, area);
}

fn render_no_household(f: &mut Frame, area: Rect) {
    let msg = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("You are not in a household yet", theme::dim_style())),
        Line::from(""),
        Line::from(Span::styled(
            "Use :create <name> to start one or :join <code> to join one",
            theme::dim_style(),
        )),
    ])
    .centered()
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(" Dashboard ", theme::title_style())),
    );
    f.render_widget(msg, area);
}
