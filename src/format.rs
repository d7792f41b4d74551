/// Formats a number with apostrophes as thousands separators.
///
/// NaN prints as `"0"`, whole numbers print without a decimal part and other
/// values are rounded to `decimals` places with trailing zeros dropped.
///
/// ```
/// use oak_trade::split_thousands;
/// assert_eq!(split_thousands(1000012.0, 2), "1'000'012");
/// assert_eq!(split_thousands(1234.5, 2), "1'234.5");
/// ```
pub fn split_thousands(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        return "0".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let text = if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        let fixed = format!("{:.*}", decimals, value);
        if decimals > 0 {
            fixed.trim_end_matches('0').trim_end_matches('.').to_string()
        } else {
            fixed
        }
    };
    group_digits(&text)
}

fn group_digits(text: &str) -> String {
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };

    let mut out = String::with_capacity(text.len() + whole.len() / 3);
    out.push_str(sign);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push('\'');
        }
        out.push(digit);
    }
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}
