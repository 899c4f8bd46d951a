/// Rendering of page metadata into clipboard payloads
use crate::formats::Format;
use crate::sanitize::{escape_html, sanitize_title, sanitize_url};

/// Sanitized metadata of the page being copied
#[derive(Debug, Clone, PartialEq)]
pub struct PageMeta {
    pub title: String,
    pub url: String,
}

impl PageMeta {
    /// Build from untrusted values read off the page
    pub fn new(title: &str, url: &str) -> PageMeta {
        PageMeta {
            title: sanitize_title(title),
            url: sanitize_url(url),
        }
    }
}

/// What ends up on the clipboard
#[derive(Debug, Clone, PartialEq)]
pub enum ClipboardPayload {
    /// A single `text/plain` representation
    Text(String),
    /// `text/html` and `text/plain` written together as one item
    Rich { html: String, text: String },
}

impl ClipboardPayload {
    /// The plain-text representation
    pub fn text(&self) -> &str {
        match self {
            ClipboardPayload::Text(text) => text,
            ClipboardPayload::Rich { text, .. } => text,
        }
    }
}

type Renderer = fn(&PageMeta) -> ClipboardPayload;

/// Renderer for each format
pub fn renderer(format: Format) -> Renderer {
    match format {
        Format::RichLink => rich_link,
        Format::Url => url_only,
        Format::UrlWithTitleAsText => url_with_title_as_text,
        Format::UrlWithTitleAsMarkdown => url_with_title_as_markdown,
        Format::UrlAsHtml => url_as_html,
        Format::UrlWithTitleAsHtml => url_with_title_as_html,
        Format::Title => title_only,
    }
}

pub fn render(format: Format, page: &PageMeta) -> ClipboardPayload {
    renderer(format)(page)
}

/// `<a href="{url}">{body}</a>` with both parts escaped
pub fn anchor(url: &str, body: &str) -> String {
    format!(r#"<a href="{}">{}</a>"#, escape_html(url), escape_html(body))
}

fn title_pipe_url(page: &PageMeta) -> String {
    format!("{} | {}", page.title, page.url)
}

fn rich_link(page: &PageMeta) -> ClipboardPayload {
    ClipboardPayload::Rich {
        html: anchor(&page.url, &page.title),
        text: title_pipe_url(page),
    }
}

fn url_only(page: &PageMeta) -> ClipboardPayload {
    ClipboardPayload::Text(page.url.clone())
}

fn url_with_title_as_text(page: &PageMeta) -> ClipboardPayload {
    ClipboardPayload::Text(title_pipe_url(page))
}

fn url_with_title_as_markdown(page: &PageMeta) -> ClipboardPayload {
    ClipboardPayload::Text(format!("[{}]({})", page.title, page.url))
}

fn url_as_html(page: &PageMeta) -> ClipboardPayload {
    ClipboardPayload::Text(anchor(&page.url, ""))
}

fn url_with_title_as_html(page: &PageMeta) -> ClipboardPayload {
    ClipboardPayload::Text(anchor(&page.url, &page.title))
}

fn title_only(page: &PageMeta) -> ClipboardPayload {
    ClipboardPayload::Text(page.title.clone())
}
