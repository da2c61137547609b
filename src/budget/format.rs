use rust_decimal::Decimal;

/// Format an amount as US dollars with thousand separators and 2 decimal places.
/// e.g. `1234567.89` → `"$1,234,567.89"`, `-100` → `"-$100.00"`
pub(crate) fn format_currency(val: Decimal) -> String {
    let abs = val.abs().round_dp(2);
    let formatted = format!("{abs:.2}");
    let mut parts = formatted.split('.');
    let int_part = parts.next().unwrap_or("0");
    let dec_part = parts.next().unwrap_or("00");

    let with_commas: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");

    if val.round_dp(2) < Decimal::ZERO {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}
