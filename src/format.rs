//! Human-readable amounts without scientific notation.

pub fn format_currency(value: f64, decimals: usize) -> String {
    if value == 0.0 || value.is_nan() {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if magnitude < 0.001 {
        format!("{value:.decimals$}")
    } else if magnitude < 1.0 {
        format!("{value:.4}")
    } else {
        format!("{value:.2}")
    }
}

/// Picks Wei, Gwei or ETH depending on size.
pub fn format_eth(value: f64) -> String {
    if value == 0.0 || value.is_nan() {
        return "0 ETH".to_string();
    }
    let magnitude = value.abs();
    if magnitude < 0.000_001 {
        format!("{:.0} Wei", value * 1e18)
    } else if magnitude < 0.001 {
        format!("{:.2} Gwei", value * 1e9)
    } else {
        format!("{} ETH", format_currency(value, 6))
    }
}

pub fn format_dollar(value: f64) -> String {
    format!("${}", format_currency(value, 6))
}

/// `0x1234...abcd` style shortening used in notifications.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_precision_depends_on_magnitude() {
        assert_eq!(format_currency(0.0, 6), "0");
        assert_eq!(format_currency(f64::NAN, 6), "0");
        assert_eq!(format_currency(0.0005, 6), "0.000500");
        assert_eq!(format_currency(0.25, 6), "0.2500");
        assert_eq!(format_currency(12.346, 6), "12.35");
        assert_eq!(format_currency(-3.5, 6), "-3.50");
    }

    #[test]
    fn eth_switches_units() {
        assert_eq!(format_eth(0.0), "0 ETH");
        assert_eq!(format_eth(0.000_000_5), "500000000000 Wei");
        assert_eq!(format_eth(0.0005), "500000.00 Gwei");
        assert_eq!(format_eth(0.1), "0.1000 ETH");
        assert_eq!(format_eth(2.0), "2.00 ETH");
        assert_eq!(format_dollar(2.0), "$2.00");
    }

    #[test]
    fn addresses_are_shortened() {
        assert_eq!(
            short_address("0x1234567890abcdef1234567890abcdef12345678"),
            "0x1234...5678"
        );
        assert_eq!(short_address("0xAAA"), "0xAAA");
    }
}
