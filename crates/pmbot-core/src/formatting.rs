//! Outbound text formatting.

/// Escape user-controlled text for inclusion in an HTML-mode message.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
