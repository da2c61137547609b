use rust_decimal::Decimal;

/// Share of the allocation already spent, as a percentage clamped to 0..=100.
///
/// Returns zero when nothing is allocated, whatever was spent.
pub(crate) fn spending_percentage(spent: Decimal, allocated: Decimal) -> Decimal {
    if allocated <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    spent
        .checked_div(allocated)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ONE_HUNDRED)
        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}

/// Severity bands for a category's progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum ProgressTier {
    OnTrack,
    Warning,
    Critical,
}

impl ProgressTier {
    const WARNING_AT: u32 = 75;
    const CRITICAL_AT: u32 = 90;

    pub(crate) fn from_percentage(percentage: Decimal) -> Self {
        if percentage < Decimal::from(Self::WARNING_AT) {
            Self::OnTrack
        } else if percentage < Decimal::from(Self::CRITICAL_AT) {
            Self::Warning
        } else {
            Self::Critical
        }
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::OnTrack => "on track",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for ProgressTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
