use rust_decimal::{Decimal, RoundingStrategy};

/// Format a decimal with thousands separators and `dp` decimal places:
/// 1234.5 -> 1,234.50
pub fn number(val: Decimal, dp: u32) -> String {
    let rounded = val.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.*}", dp as usize, rounded.abs());
    let (int_part, dec_part) = match text.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (text.as_str(), None),
    };

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let mut out: String = with_commas.chars().rev().collect();
    if let Some(d) = dec_part {
        out.push('.');
        out.push_str(d);
    }
    if negative {
        out.insert(0, '-');
    }
    out
}

/// Whole currency units: 1234567.8 -> 1,234,568
pub fn amount(val: Decimal) -> String {
    number(val, 0)
}

pub fn hours(val: Decimal) -> String {
    number(val, 2)
}
