//! Brazilian-style number rendering: `1.234.567,89`, `R$ 1,23 M`, `+4,20%`.
//!
//! Every function here is pure; the output depends only on the arguments.

const CURRENCY: &str = "R$";

/// Format with a decimal comma and period thousands separators.
///
/// ```
/// use portfolio_panel::format::format_number;
/// assert_eq!(format_number(1234567.89, 2), "1.234.567,89");
/// ```
pub fn format_number(value: f64, decimals: usize) -> String {
    let raw = format!("{value:.decimals$}");
    if !value.is_finite() {
        return raw;
    }

    let (sign, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut out = String::with_capacity(raw.len() + int_part.len() / 3);
    out.push_str(sign);
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Currency with magnitude abbreviation: millions (`M`, 2 decimals),
/// thousands (`K`, 1 decimal), otherwise the full value with 2 decimals.
pub fn format_currency(value: f64) -> String {
    if value.abs() >= 1_000_000.0 {
        format!("{CURRENCY} {} M", format_number(value / 1_000_000.0, 2))
    } else if value.abs() >= 1_000.0 {
        format!("{CURRENCY} {} K", format_number(value / 1_000.0, 1))
    } else {
        format!("{CURRENCY} {}", format_number(value, 2))
    }
}

/// Currency without abbreviation, as shown in the raw data table.
pub fn format_plain_currency(value: f64) -> String {
    format!("{CURRENCY} {}", format_number(value, 2))
}

/// Percentage with an explicit sign: `+4,20%`, `-1,05%`.
pub fn format_signed_percent(value: f64, decimals: usize) -> String {
    let body = format_number(value, decimals);
    if body.starts_with('-') || !value.is_finite() {
        format!("{body}%")
    } else {
        format!("+{body}%")
    }
}

/// Percentage without forced sign: `4,20%`.
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{}%", format_number(value, decimals))
}

/// Integer count with thousands separators: `12.345`.
pub fn format_count(n: usize) -> String {
    group_thousands(&n.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1234567.89, 2), "1.234.567,89");
        assert_eq!(format_number(0.5, 2), "0,50");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(1000.0, 1), "1.000,0");
        assert_eq!(format_number(-1234.5, 2), "-1.234,50");
        assert_eq!(format_number(123456.0, 0), "123.456");
    }

    #[test]
    fn test_format_currency_paths() {
        assert_eq!(format_currency(1234567.89), "R$ 1,23 M");
        assert_eq!(format_currency(12345.6), "R$ 12,3 K");
        assert_eq!(format_currency(123.45), "R$ 123,45");
        assert_eq!(format_currency(0.0), "R$ 0,00");
    }

    #[test]
    fn test_format_currency_boundaries_and_sign() {
        assert_eq!(format_currency(1_000.0), "R$ 1,0 K");
        assert_eq!(format_currency(1_000_000.0), "R$ 1,00 M");
        assert_eq!(format_currency(-2_500.0), "R$ -2,5 K");
        assert_eq!(format_currency(-3_250_000.0), "R$ -3,25 M");
        assert_eq!(format_currency(999.99), "R$ 999,99");
    }

    #[test]
    fn test_format_currency_is_deterministic() {
        assert_eq!(format_currency(98765.4321), format_currency(98765.4321));
    }

    #[test]
    fn test_percent_and_count() {
        assert_eq!(format_signed_percent(4.2, 2), "+4,20%");
        assert_eq!(format_signed_percent(-1.05, 2), "-1,05%");
        assert_eq!(format_signed_percent(0.0, 1), "+0,0%");
        assert_eq!(format_percent(12.5, 2), "12,50%");
        assert_eq!(format_count(12345), "12.345");
        assert_eq!(format_count(7), "7");
        assert_eq!(format_plain_currency(1234.5), "R$ 1.234,50");
    }
}
