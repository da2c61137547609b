#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::util::*;

// ── truncate ──────────────────────────────────────────────────

#[test]
fn test_truncate_short_string() {
    assert_eq!(truncate("Groceries", 20), "Groceries");
}

#[test]
fn test_truncate_exact_length() {
    assert_eq!(truncate("Rent", 4), "Rent");
}

#[test]
fn test_truncate_long_description() {
    assert_eq!(truncate("Weekly farmers market", 8), "Weekly …");
}

#[test]
fn test_truncate_zero_max() {
    assert_eq!(truncate("Coffee", 0), "");
}

#[test]
fn test_truncate_one_char() {
    assert_eq!(truncate("Coffee", 1), "…");
}

#[test]
fn test_truncate_multibyte() {
    assert_eq!(truncate("café crème", 5), "café…");
}

// ── scrolling ─────────────────────────────────────────────────

#[test]
fn test_scroll_down_moves_cursor() {
    let (mut index, mut scroll) = (0, 0);
    scroll_down(&mut index, &mut scroll, 5, 3);
    assert_eq!((index, scroll), (1, 0));
}

#[test]
fn test_scroll_down_scrolls_past_page() {
    let (mut index, mut scroll) = (2, 0);
    scroll_down(&mut index, &mut scroll, 10, 3);
    assert_eq!((index, scroll), (3, 1));
}

#[test]
fn test_scroll_down_stops_at_end() {
    let (mut index, mut scroll) = (4, 2);
    scroll_down(&mut index, &mut scroll, 5, 3);
    assert_eq!((index, scroll), (4, 2));
}

#[test]
fn test_scroll_down_empty_list() {
    let (mut index, mut scroll) = (0, 0);
    scroll_down(&mut index, &mut scroll, 0, 3);
    assert_eq!((index, scroll), (0, 0));
}

#[test]
fn test_scroll_up_pulls_scroll_along() {
    let (mut index, mut scroll) = (3, 3);
    scroll_up(&mut index, &mut scroll);
    assert_eq!((index, scroll), (2, 2));
}

#[test]
fn test_scroll_up_at_top() {
    let (mut index, mut scroll) = (0, 0);
    scroll_up(&mut index, &mut scroll);
    assert_eq!((index, scroll), (0, 0));
}

#[test]
fn test_scroll_to_bottom_and_top() {
    let (mut index, mut scroll) = (0, 0);
    scroll_to_bottom(&mut index, &mut scroll, 12, 5);
    assert_eq!((index, scroll), (11, 7));
    scroll_to_top(&mut index, &mut scroll);
    assert_eq!((index, scroll), (0, 0));
}

#[test]
fn test_scroll_to_bottom_empty_list_is_noop() {
    let (mut index, mut scroll) = (0, 0);
    scroll_to_bottom(&mut index, &mut scroll, 0, 5);
    assert_eq!((index, scroll), (0, 0));
}

// ── gauge_ratio ───────────────────────────────────────────────

#[test]
fn test_gauge_ratio_scales_percentage() {
    assert!((gauge_ratio(dec!(75)) - 0.75).abs() < f64::EPSILON);
}

#[test]
fn test_gauge_ratio_clamps() {
    assert!((gauge_ratio(dec!(140)) - 1.0).abs() < f64::EPSILON);
    assert!(gauge_ratio(dec!(-5)).abs() < f64::EPSILON);
}

// ── bar_value ─────────────────────────────────────────────────

#[test]
fn test_bar_value_rounds_to_dollars() {
    assert_eq!(bar_value(dec!(1499.50)), 1500);
    assert_eq!(bar_value(dec!(0.49)), 0);
}

#[test]
fn test_bar_value_negative_is_zero() {
    assert_eq!(bar_value(dec!(-120)), 0);
}

#[test]
fn test_bar_value_huge_amount_fits() {
    assert_eq!(bar_value(rust_decimal::Decimal::from(1_000_000_000_000i64)), 1_000_000_000_000);
    assert_eq!(bar_value(rust_decimal::Decimal::MAX), u64::MAX);
}
