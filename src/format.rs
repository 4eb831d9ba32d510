//! Display formatting for money, percentages and ratios.

/// Formats `value` as dollars with two decimals and thousands separators,
/// e.g. `$12,345.60` or `-$3.10`.
pub fn currency(value: f64) -> String {
    let rounded = format!("{:.2}", value.abs());
    let (whole, fraction) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let sign = if value < 0.0 && rounded != "0.00" { "-" } else { "" };
    format!("{sign}${}.{fraction}", group_thousands(whole))
}

pub fn percent(value: f64) -> String {
    format!("{value:.1}%")
}

pub fn ratio(value: f64) -> String {
    format!("{value:.1}x")
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands_with_two_decimals() {
        assert_eq!(currency(0.0), "$0.00");
        assert_eq!(currency(999.999), "$1,000.00");
        assert_eq!(currency(1234567.8), "$1,234,567.80");
        assert_eq!(currency(-3.1), "-$3.10");
        assert_eq!(currency(-0.001), "$0.00");
        assert_eq!(currency(10000.0), "$10,000.00");
    }

    #[test]
    fn percent_and_ratio_use_one_decimal() {
        assert_eq!(percent(5.0), "5.0%");
        assert_eq!(percent(33.333), "33.3%");
        assert_eq!(ratio(2.5), "2.5x");
        assert_eq!(ratio(3.04), "3.0x");
    }
}
