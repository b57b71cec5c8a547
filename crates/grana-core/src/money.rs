// Amount coercion and Brazilian Real formatting.
//
// Amounts arrive from the model as JSON numbers or as loosely formatted
// strings ("R$ 1.234,56", "25 reais", "12.5"). Everything shown back to the
// user is rendered in pt-BR currency format.

use serde_json::Value;

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Permissively parse a money string.
///
/// Every character that is not a digit, comma, dot or minus sign is dropped.
/// When a comma is present it is the decimal mark and dots are thousands
/// separators (`"1.234,56"` -> 1234.56). Without a comma, more than one dot
/// means the dots are thousands separators (`"1.234.567"` -> 1234567).
///
/// Strings that mention several numbers are concatenated digit-wise
/// (`"12 e 34"` -> 1234); callers that care must validate upstream.
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else if cleaned.matches('.').count() > 1 {
        cleaned.replace('.', "")
    } else {
        cleaned
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coerce a JSON argument (number or string) into a finite amount.
pub fn coerce_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

/// Round to whole cents, half away from zero.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Format a value as Brazilian Real: `R$ 1.234,56`.
pub fn format_brl(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{sign}R$ {},{:02}",
        group_thousands(cents / 100),
        cents % 100
    )
}

/// Format a fraction as a whole percentage: 1.0 -> `100%`, 0.5 -> `50%`.
pub fn format_percentage(fraction: f64) -> String {
    format!("{}%", (fraction * 100.0).round() as i64)
}

fn group_thousands(units: u64) -> String {
    let digits = units.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
