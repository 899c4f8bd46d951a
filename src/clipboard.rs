/// Clipboard write protocol: modern API first, legacy copy command as fallback
use crate::error::ClipboardError;
use crate::formats::Format;
use crate::render::{render, ClipboardPayload, PageMeta};
use log::{debug, error, warn};

/// Something that can put a payload on the clipboard
#[allow(async_fn_in_trait)]
pub trait ClipboardTarget {
    /// Asynchronous clipboard API write
    async fn write(&self, payload: &ClipboardPayload) -> Result<(), ClipboardError>;

    /// Selection-based copy command; `Ok(false)` when the command reports failure
    fn legacy_copy(&self, payload: &ClipboardPayload) -> Result<bool, ClipboardError>;
}

/// Transient indicator shown in the page after a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Copied,
    PermissionDenied,
}

impl Indicator {
    pub fn message(self) -> &'static str {
        match self {
            Indicator::Copied => "Copied!",
            Indicator::PermissionDenied => "Copy blocked: clipboard permission denied",
        }
    }
}

pub trait FeedbackSink {
    fn show(&self, indicator: Indicator);
}

/// How a write ended
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Written,
    WrittenByFallback,
    Failed(ClipboardError),
}

impl WriteOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, WriteOutcome::Failed(_))
    }
}

/// Write `payload`, falling back to the legacy copy command exactly once
pub async fn write_with_fallback<T: ClipboardTarget>(
    target: &T,
    payload: &ClipboardPayload,
) -> WriteOutcome {
    let primary = match target.write(payload).await {
        Ok(()) => return WriteOutcome::Written,
        Err(e) => e,
    };
    debug!(
        "Copying failed ({}). Trying to fall back to execCommand('copy')",
        primary
    );

    match target.legacy_copy(payload) {
        Ok(true) => WriteOutcome::WrittenByFallback,
        Ok(false) => {
            error!("Legacy copy command reported failure");
            WriteOutcome::Failed(primary)
        }
        Err(e) => {
            error!("Legacy copy failed: {}", e);
            WriteOutcome::Failed(primary)
        }
    }
}

/// The indicator to request for an outcome, if any
pub fn indicator_for(outcome: &WriteOutcome, notify: bool) -> Option<Indicator> {
    if !notify {
        return None;
    }
    match outcome {
        WriteOutcome::Written | WriteOutcome::WrittenByFallback => Some(Indicator::Copied),
        WriteOutcome::Failed(e) if e.is_permission() => Some(Indicator::PermissionDenied),
        WriteOutcome::Failed(_) => None,
    }
}

/// Render `format_id` for `page` and commit it to the clipboard.
///
/// Unknown ids are logged and skipped, returning `None`.
pub async fn copy<T, F>(
    format_id: &str,
    page: &PageMeta,
    notify: bool,
    target: &T,
    feedback: &F,
) -> Option<WriteOutcome>
where
    T: ClipboardTarget,
    F: FeedbackSink,
{
    let format: Format = match format_id.parse() {
        Ok(format) => format,
        Err(e) => {
            warn!("Not implemented: {}", e);
            return None;
        }
    };

    let payload = render(format, page);
    let outcome = write_with_fallback(target, &payload).await;

    if let Some(indicator) = indicator_for(&outcome, notify) {
        feedback.show(indicator);
    }

    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct FakeClipboard {
        primary_error: Option<ClipboardError>,
        legacy_result: Option<Result<bool, ClipboardError>>,
        primary_writes: RefCell<Vec<ClipboardPayload>>,
        legacy_calls: Cell<usize>,
    }

    impl FakeClipboard {
        fn working() -> Self {
            Self::default()
        }

        fn denied(legacy_result: Result<bool, ClipboardError>) -> Self {
            FakeClipboard {
                primary_error: Some(ClipboardError::PermissionDenied("denied".to_string())),
                legacy_result: Some(legacy_result),
                ..Self::default()
            }
        }
    }

    impl ClipboardTarget for FakeClipboard {
        async fn write(&self, payload: &ClipboardPayload) -> Result<(), ClipboardError> {
            match &self.primary_error {
                Some(e) => Err(e.clone()),
                None => {
                    self.primary_writes.borrow_mut().push(payload.clone());
                    Ok(())
                }
            }
        }

        fn legacy_copy(&self, _payload: &ClipboardPayload) -> Result<bool, ClipboardError> {
            self.legacy_calls.set(self.legacy_calls.get() + 1);
            self.legacy_result.clone().unwrap_or(Ok(true))
        }
    }

    #[derive(Default)]
    struct RecordingFeedback {
        shown: RefCell<Vec<Indicator>>,
    }

    impl FeedbackSink for RecordingFeedback {
        fn show(&self, indicator: Indicator) {
            self.shown.borrow_mut().push(indicator);
        }
    }

    fn page() -> PageMeta {
        PageMeta::new("T", "https://example.com/")
    }

    #[test]
    fn test_primary_write_success() {
        let clipboard = FakeClipboard::working();
        let feedback = RecordingFeedback::default();

        let outcome = block_on(copy("copyUrl", &page(), true, &clipboard, &feedback));

        assert_eq!(outcome, Some(WriteOutcome::Written));
        assert_eq!(
            *clipboard.primary_writes.borrow(),
            vec![ClipboardPayload::Text("https://example.com/".to_string())]
        );
        assert_eq!(clipboard.legacy_calls.get(), 0);
        assert_eq!(*feedback.shown.borrow(), vec![Indicator::Copied]);
    }

    #[test]
    fn test_rich_link_written_as_one_payload() {
        let clipboard = FakeClipboard::working();
        let feedback = RecordingFeedback::default();

        block_on(copy("copyRichLink", &page(), false, &clipboard, &feedback));

        let writes = clipboard.primary_writes.borrow();
        assert_eq!(writes.len(), 1);
        assert!(matches!(
            &writes[0],
            ClipboardPayload::Rich { html, text }
                if html == r#"<a href="https://example.com/">T</a>"# && text == "T | https://example.com/"
        ));
    }

    #[test]
    fn test_fallback_attempted_once_and_notifies_on_success() {
        let clipboard = FakeClipboard::denied(Ok(true));
        let feedback = RecordingFeedback::default();

        let outcome = block_on(copy("copyTitle", &page(), true, &clipboard, &feedback));

        assert_eq!(outcome, Some(WriteOutcome::WrittenByFallback));
        assert_eq!(clipboard.legacy_calls.get(), 1);
        assert_eq!(*feedback.shown.borrow(), vec![Indicator::Copied]);
    }

    #[test]
    fn test_fallback_failure_shows_no_success() {
        let clipboard = FakeClipboard::denied(Ok(false));
        let feedback = RecordingFeedback::default();

        let outcome = block_on(copy("copyTitle", &page(), true, &clipboard, &feedback));

        assert_eq!(
            outcome,
            Some(WriteOutcome::Failed(ClipboardError::PermissionDenied(
                "denied".to_string()
            )))
        );
        assert_eq!(clipboard.legacy_calls.get(), 1);
        assert_eq!(*feedback.shown.borrow(), vec![Indicator::PermissionDenied]);
    }

    #[test]
    fn test_fallback_error_is_contained() {
        let clipboard = FakeClipboard {
            primary_error: Some(ClipboardError::Unavailable),
            legacy_result: Some(Err(ClipboardError::CommandFailed("no body".to_string()))),
            ..FakeClipboard::default()
        };
        let feedback = RecordingFeedback::default();

        let outcome = block_on(copy("copyUrl", &page(), true, &clipboard, &feedback));

        assert_eq!(outcome, Some(WriteOutcome::Failed(ClipboardError::Unavailable)));
        assert!(feedback.shown.borrow().is_empty());
    }

    #[test]
    fn test_notify_disabled_shows_nothing() {
        let clipboard = FakeClipboard::working();
        let feedback = RecordingFeedback::default();

        block_on(copy("copyUrl", &page(), false, &clipboard, &feedback));

        assert!(feedback.shown.borrow().is_empty());
    }

    #[test]
    fn test_unknown_format_is_noop() {
        let clipboard = FakeClipboard::working();
        let feedback = RecordingFeedback::default();

        let outcome = block_on(copy("copySomething", &page(), true, &clipboard, &feedback));

        assert_eq!(outcome, None);
        assert!(clipboard.primary_writes.borrow().is_empty());
        assert_eq!(clipboard.legacy_calls.get(), 0);
        assert!(feedback.shown.borrow().is_empty());
    }

    #[test]
    fn test_indicator_for() {
        assert_eq!(indicator_for(&WriteOutcome::Written, true), Some(Indicator::Copied));
        assert_eq!(indicator_for(&WriteOutcome::Written, false), None);
        assert_eq!(
            indicator_for(&WriteOutcome::Failed(ClipboardError::Unavailable), true),
            None
        );
    }
}
