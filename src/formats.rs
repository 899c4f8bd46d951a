/// Copy formats supported by the extension
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Format used when a requested or stored id is unknown
pub const SAFE_FALLBACK_ID: &str = "copyRichLink";

/// Every format the extension knows how to render.
///
/// Variant order is the canonical menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    RichLink,
    Url,
    UrlWithTitleAsText,
    UrlWithTitleAsMarkdown,
    UrlAsHtml,
    UrlWithTitleAsHtml,
    Title,
}

impl Format {
    pub const ALL: [Format; 7] = [
        Format::RichLink,
        Format::Url,
        Format::UrlWithTitleAsText,
        Format::UrlWithTitleAsMarkdown,
        Format::UrlAsHtml,
        Format::UrlWithTitleAsHtml,
        Format::Title,
    ];

    /// Stable id, used as storage key and context-menu item id
    pub fn id(self) -> &'static str {
        match self {
            Format::RichLink => "copyRichLink",
            Format::Url => "copyUrl",
            Format::UrlWithTitleAsText => "copyUrlWithTitleAsText",
            Format::UrlWithTitleAsMarkdown => "copyUrlWithTitleAsMarkdown",
            Format::UrlAsHtml => "copyUrlAsHtml",
            Format::UrlWithTitleAsHtml => "copyUrlWithTitleAsHtml",
            Format::Title => "copyTitle",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Format::RichLink => "Rich Link",
            Format::Url => "URL",
            Format::UrlWithTitleAsText => "URL && Title",
            Format::UrlWithTitleAsMarkdown => "Markdown",
            Format::UrlAsHtml => "HTML",
            Format::UrlWithTitleAsHtml => "HTML && Title",
            Format::Title => "Title",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Format::RichLink => {
                "Copies the URL of a tab as a rich text link, so that you can paste the link with the title into your document without any editing."
            }
            Format::Url => "Copies only the URL of the page to the clipboard.",
            Format::UrlWithTitleAsText => {
                "Copies the URL and TITLE of the page, separated with `|`."
            }
            Format::UrlWithTitleAsMarkdown => "Copies the URL and TITLE as a markdown-style link.",
            Format::UrlAsHtml => "Copies the URL as an HTML anchor (a tag).",
            Format::UrlWithTitleAsHtml => "Copies the URL and TITLE as an HTML anchor (a tag).",
            Format::Title => "Copies the TITLE of the page.",
        }
    }

    /// Whether the format shows in the context menu on a fresh install
    pub fn active_by_default(self) -> bool {
        matches!(
            self,
            Format::RichLink | Format::UrlWithTitleAsText | Format::UrlWithTitleAsMarkdown
        )
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormat(pub String);

impl fmt::Display for UnknownFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown format id: {}", self.0)
    }
}

impl std::error::Error for UnknownFormat {}

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::ALL
            .into_iter()
            .find(|format| format.id() == s)
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

/// One entry of the context-menu configuration, as persisted under `contextMenus`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormatDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub active: bool,
}

impl From<Format> for FormatDefinition {
    fn from(format: Format) -> Self {
        FormatDefinition {
            id: format.id().to_string(),
            title: format.title().to_string(),
            description: format.description().to_string(),
            active: format.active_by_default(),
        }
    }
}

/// The build-time canonical list, in menu order
pub fn canonical_formats() -> Vec<FormatDefinition> {
    Format::ALL.into_iter().map(FormatDefinition::from).collect()
}
