/// Loan statuses that count as a default.
///
/// Matching is exact, including case and inner spacing, the way the
/// lender's export spells them.
pub const DEFAULT_STATUSES: [&str; 4] = [
    "Default",
    "Charged Off",
    "Late (31-120 days)",
    "Does not meet the credit policy. Status:Charged Off",
];

/// Returns true if the loan status marks the borrower as defaulted.
#[must_use]
pub fn is_default_status(status: &str) -> bool {
    DEFAULT_STATUSES.contains(&status)
}

/// Derives the binary training label from a loan status.
///
/// Missing statuses are treated as non-default.
#[must_use]
pub fn default_label(status: Option<&str>) -> u8 {
    u8::from(status.is_some_and(is_default_status))
}
