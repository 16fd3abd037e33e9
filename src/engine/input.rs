//! Boundary between display-field text and engine amounts.

use log::debug;

/// Upper bound accepted by the amount fields.
pub const MAX_AMOUNT: f64 = 1_000_000_000.0;

/// Number of decimals written back to display fields.
pub const DISPLAY_DECIMALS: usize = 4;

/// Parse the text of an amount field.
///
/// Returns `None` for text that must not start a propagation pass: empty
/// input, any spelling of zero (`"0"`, `"0.0"`, `"0.00"`, ...), malformed
/// numbers, and values outside `0..=MAX_AMOUNT`. A comma is accepted as
/// the decimal separator.
///
/// # Examples
///
/// ```
/// use fx_propagation::engine::input::parse_amount;
///
/// assert_eq!(parse_amount("100"), Some(100.0));
/// assert_eq!(parse_amount("12,5"), Some(12.5));
/// assert_eq!(parse_amount("0.00"), None);
/// assert_eq!(parse_amount("abc"), None);
/// ```
pub fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let value = match trimmed.replace(',', ".").parse::<f64>() {
        Ok(v) => v,
        Err(e) => {
            debug!("ignoring malformed amount {:?}: {}", text, e);
            return None;
        }
    };

    if !value.is_finite() || !(0.0..=MAX_AMOUNT).contains(&value) {
        debug!("ignoring out-of-range amount {:?}", text);
        return None;
    }
    if value == 0.0 {
        return None;
    }
    Some(value)
}

/// Format an amount for a display field, or `None` when it is zero.
///
/// Zero results leave the field as it is.
pub fn format_amount(value: f64) -> Option<String> {
    if value == 0.0 {
        return None;
    }
    Some(format!("{:.*}", DISPLAY_DECIMALS, value))
}
