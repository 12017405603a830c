//! Small display helpers for monetary values. Single fixed currency (USD),
//! no conversion.

/// Sum of a list of contribution amounts.
pub fn calculate_total(amounts: &[f64]) -> f64 {
    amounts.iter().sum()
}

/// Formats an amount as USD with two decimals and thousands separators,
/// e.g. `1250.5` becomes `"$1,250.50"`.
pub fn format_currency(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}${grouped}.{fraction:02}")
}
