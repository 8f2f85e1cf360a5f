use cloudbeat_core::constants::DEFAULT_DURATION;

/// Render seconds as `M:SS`, truncating fractional seconds.
///
/// Minutes are not wrapped into hours. Negative or non-finite input yields `0:00`.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return DEFAULT_DURATION.to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
