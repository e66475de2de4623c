//! HTML rendering helpers
//!
//! Outbound messages use Telegram's HTML parse mode, so every interpolated
//! user- or merchant-supplied field must be entity-escaped before inclusion.

/// Escape HTML special characters for Telegram's HTML parse mode
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#039;"),
            _ => result.push(c),
        }
    }
    result
}

/// Render a price without a dangling `.00` on whole amounts
pub fn format_price(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        format!("{:.2}", value)
    }
}
