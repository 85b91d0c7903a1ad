use crate::ax::ax_model::AxSnapshot;
use crate::ax::normalize::norm_text;
use crate::ax::tree::find_focused;
use crate::error::FillError;

/// Keyboard chords the engine sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Tab,
    ShiftTab,
    Enter,
    Space,
    ArrowDown,
    Delete,
    SelectAll,
}

impl Key {
    /// Playwright key name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Key::Tab => "Tab",
            Key::ShiftTab => "Shift+Tab",
            Key::Enter => "Enter",
            Key::Space => "Space",
            Key::ArrowDown => "ArrowDown",
            Key::Delete => "Delete",
            Key::SelectAll => "Control+A",
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the engine needs from a live page.
///
/// `BrowserSession` drives a real browser; tests drive an in-memory page.
/// Every operation is blocking and may fail; callers decide whether a failure
/// is fatal or degrades to a fallback.
pub trait BrowserSurface {
    /// Fresh accessibility snapshot of the whole page.
    fn snapshot(&mut self) -> Result<AxSnapshot, FillError>;

    fn press_key(&mut self, key: Key) -> Result<(), FillError>;

    /// Type text into the focused control, `delay_ms` between keystrokes.
    fn type_text(&mut self, text: &str, delay_ms: u64) -> Result<(), FillError>;

    /// Click the visible `option` whose accessible name equals `name`.
    fn click_option(&mut self, name: &str) -> Result<(), FillError>;

    /// `innerText` of the body.
    fn read_page_text(&mut self) -> Result<String, FillError>;

    /// PNG bytes of the page (full scroll height when `full_page`).
    fn screenshot(&mut self, full_page: bool) -> Result<Vec<u8>, FillError>;

    fn advance_focus(&mut self) -> Result<(), FillError> {
        self.press_key(Key::Tab)
    }

    fn reverse_focus(&mut self) -> Result<(), FillError> {
        self.press_key(Key::ShiftTab)
    }

    /// Normalized value of the focused node, `None` when nothing is focused
    /// or the node exposes no value.
    fn read_focused_value(&mut self) -> Result<Option<String>, FillError> {
        let snapshot = self.snapshot()?;
        Ok(find_focused(&snapshot)
            .and_then(|(id, _)| snapshot.get(id).value.clone())
            .map(|v| norm_text(&v)))
    }

    /// Normalized name of the focused node.
    fn read_focused_name(&mut self) -> Result<Option<String>, FillError> {
        let snapshot = self.snapshot()?;
        Ok(find_focused(&snapshot).map(|(id, _)| norm_text(&snapshot.get(id).name)))
    }
}
