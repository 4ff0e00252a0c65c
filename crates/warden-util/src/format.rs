//! Display formatting helpers

/// Format signed remaining seconds as `MM:SS`, prefixed with `-` while
/// in overtime. Minutes are not capped at 59 so long countdowns render
/// as e.g. `135:00`.
pub fn format_signed_clock(seconds: i64) -> String {
    let abs = seconds.abs();
    let sign = if seconds < 0 { "-" } else { "" };
    format!("{}{:02}:{:02}", sign, abs / 60, abs % 60)
}
