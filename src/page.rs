/// Page-context side of the copy: runs inside the target tab
use crate::clipboard::{self, ClipboardTarget, FeedbackSink, Indicator, WriteOutcome};
use crate::error::ClipboardError;
use crate::render::{ClipboardPayload, PageMeta};
use log::{debug, error};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::{ClipboardEvent, Document, DomException, HtmlDocument, HtmlTextAreaElement};

// The async clipboard API is reached through the JS bridge
#[wasm_bindgen(module = "/js/page.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn writeClipboardText(text: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn writeClipboardItem(html: &str, text: &str) -> Result<(), JsValue>;
}

const TOAST_DURATION_MS: i32 = 2000;

/// Best-effort message out of a thrown JS value
pub fn js_message(err: &JsValue) -> String {
    if let Some(e) = err.dyn_ref::<js_sys::Error>() {
        return String::from(e.message());
    }
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

fn clipboard_error(err: JsValue) -> ClipboardError {
    match err.dyn_ref::<DomException>() {
        Some(dom) => ClipboardError::from_dom(&dom.name(), &dom.message()),
        None => ClipboardError::Rejected(js_message(&err)),
    }
}

fn command_error(err: JsValue) -> ClipboardError {
    ClipboardError::CommandFailed(js_message(&err))
}

/// Clipboard of the current document
pub struct DomClipboard {
    document: Document,
}

impl DomClipboard {
    pub fn new(document: Document) -> DomClipboard {
        DomClipboard { document }
    }

    fn exec_copy(&self) -> Result<bool, ClipboardError> {
        let html_document = self
            .document
            .dyn_ref::<HtmlDocument>()
            .ok_or_else(|| ClipboardError::CommandFailed("not an HTML document".to_string()))?;
        html_document.exec_command("copy").map_err(command_error)
    }
}

impl ClipboardTarget for DomClipboard {
    async fn write(&self, payload: &ClipboardPayload) -> Result<(), ClipboardError> {
        let written = match payload {
            ClipboardPayload::Text(text) => writeClipboardText(text).await,
            ClipboardPayload::Rich { html, text } => writeClipboardItem(html, text).await,
        };
        written.map_err(clipboard_error)
    }

    fn legacy_copy(&self, payload: &ClipboardPayload) -> Result<bool, ClipboardError> {
        let body = self
            .document
            .body()
            .ok_or_else(|| ClipboardError::CommandFailed("document has no body".to_string()))?;

        let selected = match payload {
            ClipboardPayload::Text(text) => text,
            ClipboardPayload::Rich { html, .. } => html,
        };

        let textarea: HtmlTextAreaElement = self
            .document
            .create_element("textarea")
            .map_err(command_error)?
            .dyn_into()
            .map_err(|element| command_error(element.into()))?;
        textarea.set_value(selected);
        textarea
            .set_attribute(
                "style",
                "position: fixed; top: 0; left: 0; width: 1px; height: 1px; opacity: 0; pointer-events: none;",
            )
            .map_err(command_error)?;
        body.append_child(&textarea).map_err(command_error)?;
        textarea.select();

        let copied = match payload {
            ClipboardPayload::Text(_) => self.exec_copy(),
            ClipboardPayload::Rich { html, text } => {
                CopyInterceptor::register(&self.document, html, text)
                    .and_then(|_interceptor| self.exec_copy())
            }
        };

        textarea.remove();
        copied
    }
}

/// One-shot `copy` listener that supplies both representations.
///
/// The listener is removed when the guard drops, whatever the copy did.
pub struct CopyInterceptor {
    document: Document,
    listener: Closure<dyn FnMut(ClipboardEvent)>,
    calls: Rc<Cell<usize>>,
}

impl CopyInterceptor {
    pub fn register(document: &Document, html: &str, text: &str) -> Result<CopyInterceptor, ClipboardError> {
        let html = html.to_string();
        let text = text.to_string();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();

        let listener = Closure::<dyn FnMut(ClipboardEvent)>::new(move |event: ClipboardEvent| {
            event.prevent_default();
            if let Some(data) = event.clipboard_data() {
                if data.set_data("text/html", &html).is_err()
                    || data.set_data("text/plain", &text).is_err()
                {
                    error!("Failed to set clipboard data on copy event");
                }
            }
            counter.set(counter.get() + 1);
        });

        document
            .add_event_listener_with_callback("copy", listener.as_ref().unchecked_ref())
            .map_err(command_error)?;

        Ok(CopyInterceptor {
            document: document.clone(),
            listener,
            calls,
        })
    }

    /// Shared count of copy events the listener handled
    pub fn calls(&self) -> Rc<Cell<usize>> {
        self.calls.clone()
    }
}

impl Drop for CopyInterceptor {
    fn drop(&mut self) {
        if self
            .document
            .remove_event_listener_with_callback("copy", self.listener.as_ref().unchecked_ref())
            .is_err()
        {
            error!("Failed to remove copy interceptor");
        }
    }
}

/// Small fixed-position toast in the page corner
pub struct ToastFeedback {
    document: Document,
}

impl ToastFeedback {
    pub fn new(document: Document) -> ToastFeedback {
        ToastFeedback { document }
    }

    fn try_show(&self, indicator: Indicator) -> Result<(), JsValue> {
        let Some(body) = self.document.body() else {
            return Ok(());
        };

        let background = match indicator {
            Indicator::Copied => "rgba(0, 0, 0, 0.75)",
            Indicator::PermissionDenied => "#f44336",
        };

        let toast = self.document.create_element("div")?;
        toast.set_text_content(Some(indicator.message()));
        toast.set_attribute(
            "style",
            &format!(
                "position: fixed; bottom: 30px; right: 20px; padding: 10px 20px; background-color: {}; color: white; border-radius: 5px; z-index: 2147483647; font-size: 14px;",
                background
            ),
        )?;
        body.append_child(&toast)?;

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let dismiss = Closure::once_into_js(move || toast.remove());
        window.set_timeout_with_callback_and_timeout_and_arguments_0(
            dismiss.unchecked_ref(),
            TOAST_DURATION_MS,
        )?;
        Ok(())
    }
}

impl FeedbackSink for ToastFeedback {
    fn show(&self, indicator: Indicator) {
        if let Err(e) = self.try_show(indicator) {
            debug!("Could not show indicator: {}", js_message(&e));
        }
    }
}

/// Copy the live page metadata in `format_id`.
///
/// Returns whether something reached the clipboard.
pub async fn copy_current_page(format_id: &str, notify: bool) -> Result<bool, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let page = PageMeta::new(&document.title(), &window.location().href()?);
    let target = DomClipboard::new(document.clone());
    let feedback = ToastFeedback::new(document);

    let outcome = clipboard::copy(format_id, &page, notify, &target, &feedback).await;
    Ok(succeeded(&outcome))
}

/// Did the outcome put anything on the clipboard
pub fn succeeded(outcome: &Option<WriteOutcome>) -> bool {
    outcome.as_ref().is_some_and(WriteOutcome::is_success)
}
