use chrono::{DateTime, Utc};

/// Helper function to format a purchase timestamp
///
/// Formats as "16 Oct 2026 08:30" in UTC.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%d %b %Y %H:%M").to_string()
}

/// Helper function to escape special characters for Telegram MarkdownV2
///
/// Every character with a special meaning in MarkdownV2 (and the backslash
/// itself) is prefixed with a backslash so it is rendered literally.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if "\\_*[]()~`>#+-=|{}.!".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
