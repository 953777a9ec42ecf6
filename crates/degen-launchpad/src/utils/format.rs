//! Display formatting for USD and quote-asset amounts.

/// Format a USD amount: two decimals normally, eight for sub-cent values so
/// micro-cap token prices stay readable.
pub fn format_usd(amount: f64) -> String {
    let decimals = if amount < 0.01 { 8 } else { 2 };
    format!("${}", with_separators(amount, decimals))
}

/// Format a quote-asset amount with two to six decimals.
pub fn format_quote(amount: f64) -> String {
    let full = format!("{amount:.6}");
    let (int_part, frac_part) = match full.split_once('.') {
        Some(parts) => parts,
        None => (full.as_str(), ""),
    };

    let mut frac = frac_part.trim_end_matches('0').to_owned();
    while frac.len() < 2 {
        frac.push('0');
    }

    format!("{}.{frac}", group_digits(int_part))
}

fn with_separators(amount: f64, decimals: usize) -> String {
    let full = format!("{amount:.decimals$}");
    match full.split_once('.') {
        Some((int_part, frac_part)) => format!("{}.{frac_part}", group_digits(int_part)),
        None => group_digits(&full),
    }
}

fn group_digits(int_part: &str) -> String {
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}")
}
