/// Sanitization of page metadata before it reaches the clipboard
use url::Url;

/// Longest title, in characters, that is ever rendered
pub const MAX_TITLE_LEN: usize = 1000;

const ALLOWED_SCHEMES: [&str; 3] = ["http", "https", "file"];

/// Strip C0/C1 control characters, trim, and cap the length
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title.chars().filter(|c| !c.is_control()).collect();
    cleaned.trim().chars().take(MAX_TITLE_LEN).collect()
}

/// Normalize an absolute http(s)/file URL.
///
/// Anything else, including `javascript:` and `data:` URLs or strings that do
/// not parse, becomes the empty string.
pub fn sanitize_url(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(url) if ALLOWED_SCHEMES.contains(&url.scheme()) => url.to_string(),
        _ => String::new(),
    }
}

/// Escape text for use inside HTML element content or a quoted attribute
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
