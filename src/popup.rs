/// Popup trigger source: hover previews and recently used formats
use crate::background::{copy_to_page, BrowserHost, TargetPage};
use crate::error::InjectionError;
use crate::formats::{Format, FormatDefinition};
use crate::render::{render, PageMeta};
use crate::storage::RecentFormats;
use log::warn;

/// Text shown when hovering a format button
pub fn preview(format: Format, title: &str, url: &str) -> String {
    let title = if title.trim().is_empty() { "Untitled" } else { title };
    let page = PageMeta::new(title, url);

    match format {
        Format::RichLink => format!("Rich text link: \"{}\" → {}", page.title, page.url),
        _ => render(format, &page).text().to_string(),
    }
}

/// Preview for a raw id, or a placeholder for unknown ids
pub fn preview_for_id(format_id: &str, title: &str, url: &str) -> String {
    match format_id.parse::<Format>() {
        Ok(format) => preview(format, title, url),
        Err(_) => "Preview not available".to_string(),
    }
}

/// Recent ids that still name a canonical format, in recency order
pub fn recent_definitions<'a>(
    recent: &RecentFormats,
    canonical: &'a [FormatDefinition],
) -> Vec<&'a FormatDefinition> {
    recent
        .ids
        .iter()
        .filter_map(|id| canonical.iter().find(|def| &def.id == id))
        .collect()
}

/// Copy from a popup button.
///
/// Popup copies always show the indicator. A successful copy moves the
/// format to the front of the recent list.
pub async fn copy_from_popup<H: BrowserHost>(
    host: &H,
    canonical: &[FormatDefinition],
    format_id: &str,
    tab: &TargetPage,
) -> Result<String, InjectionError> {
    let used = copy_to_page(host, canonical, format_id, tab, true).await?;

    let recorded = async {
        let mut recent = RecentFormats::load(host).await?;
        recent.push(&used);
        recent.save(host).await
    };
    if let Err(e) = recorded.await {
        warn!("Error saving recent formats: {}", e);
    }

    Ok(used)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::canonical_formats;
    use crate::storage::{StorageArea, RECENT_FORMATS_KEY};
    use crate::testing::FakeHost;
    use futures::executor::block_on;
    use serde_json::json;

    fn tab() -> TargetPage {
        TargetPage::new(5, "https://example.com/", "Example")
    }

    #[test]
    fn test_preview() {
        assert_eq!(
            preview(Format::RichLink, "T", "https://example.com/"),
            "Rich text link: \"T\" → https://example.com/"
        );
        assert_eq!(
            preview(Format::UrlWithTitleAsMarkdown, "T", "https://example.com/"),
            "[T](https://example.com/)"
        );
        assert_eq!(preview(Format::Title, "  ", "https://example.com/"), "Untitled");
    }

    #[test]
    fn test_preview_for_unknown_id() {
        assert_eq!(
            preview_for_id("copyBogus", "T", "https://example.com/"),
            "Preview not available"
        );
        assert_eq!(preview_for_id("copyTitle", "T", "https://example.com/"), "T");
    }

    #[test]
    fn test_recent_definitions_skip_unknown_ids() {
        let canonical = canonical_formats();
        let recent = RecentFormats {
            ids: vec!["copyTitle".to_string(), "gone".to_string(), "copyUrl".to_string()],
        };

        let defs = recent_definitions(&recent, &canonical);

        let ids: Vec<&str> = defs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["copyTitle", "copyUrl"]);
    }

    #[test]
    fn test_copy_from_popup_always_notifies_and_records_recent() {
        let host = FakeHost::new();
        host.store.put(StorageArea::Sync, RECENT_FORMATS_KEY, json!(["copyUrl"]));

        let used = block_on(copy_from_popup(&host, &canonical_formats(), "copyTitle", &tab()));

        assert_eq!(used, Ok("copyTitle".to_string()));
        assert!(host.injections.borrow()[0].notify);
        assert_eq!(
            host.store.value(StorageArea::Sync, RECENT_FORMATS_KEY),
            Some(json!(["copyTitle", "copyUrl"]))
        );
    }

    #[test]
    fn test_failed_popup_copy_is_not_recent() {
        let host = FakeHost::new();
        let settings = TargetPage::new(1, "chrome://settings/", "Settings");

        let result = block_on(copy_from_popup(&host, &canonical_formats(), "copyUrl", &settings));

        assert!(result.unwrap_err().is_restricted());
        assert_eq!(host.store.value(StorageArea::Sync, RECENT_FORMATS_KEY), None);
    }

    #[test]
    fn test_popup_copy_that_copied_nothing_is_not_recent() {
        let host = FakeHost::new();
        host.page_fails.set(true);

        let result = block_on(copy_from_popup(&host, &canonical_formats(), "copyUrl", &tab()));

        assert_eq!(result, Err(InjectionError::NotCopied(5)));
        assert_eq!(host.store.value(StorageArea::Sync, RECENT_FORMATS_KEY), None);
    }
}
