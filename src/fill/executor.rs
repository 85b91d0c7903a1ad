use tracing::{debug, warn};

use crate::ax::ax_model::AxRole;
use crate::ax::normalize::norm_text;
use crate::browser::surface::{BrowserSurface, Key};
use crate::error::FillError;
use crate::fill::pacing::{Pacer, Pause};
use crate::resolve::matcher::{MatchFallback, best_option};
use crate::resolve::source::ResolvedValue;
use crate::trace::event::EventRecord;

/// Label words that suggest a text input takes several values.
const MULTI_HINTS: [&str; 7] = [
    "cities",
    "skills",
    "technolog",
    "languages",
    "keywords",
    "locations",
    "select one or more",
];

const TRUTHY: [&str; 3] = ["yes", "true", "checked"];

/// Delay for the type-then-Enter fallback of selectors.
const FALLBACK_TYPE_DELAY_MS: u64 = 10;

#[derive(Debug, Clone)]
pub struct FillSettings {
    /// ArrowDown presses allowed while hunting for a radio.
    pub radio_max_tries: usize,
    /// Slow retypes after a text mismatch.
    pub verify_retries: usize,
}

impl Default for FillSettings {
    fn default() -> Self {
        Self {
            radio_max_tries: 6,
            verify_retries: 1,
        }
    }
}

/// The focused control being filled.
#[derive(Debug, Clone)]
pub struct FillTarget<'a> {
    pub role: AxRole,
    /// Stable label written into every event.
    pub label: &'a str,
    /// Accessible name of the focused node itself.
    pub node_name: &'a str,
    /// Options chip tokens are mapped onto.
    pub chip_options: &'a [String],
}

/// Commit `value` into the focused control. Never fails: every problem ends
/// up as `confirmed: false` or `null` on the returned records.
pub fn fill_field<S: BrowserSurface + ?Sized>(
    surface: &mut S,
    pacer: &mut dyn Pacer,
    settings: &FillSettings,
    target: &FillTarget<'_>,
    value: &ResolvedValue,
) -> Vec<EventRecord> {
    match target.role {
        r if r.is_text_like() => fill_text(surface, pacer, settings, target, value),
        AxRole::Combobox | AxRole::Listbox => fill_selector(surface, pacer, target, value),
        AxRole::Radio => fill_radio(surface, pacer, settings, target, value),
        AxRole::Checkbox | AxRole::Switch | AxRole::Menuitemcheckbox => {
            fill_checkbox(surface, target, value)
        }
        other => {
            debug!(role = %other, field = target.label, "no fill strategy");
            vec![]
        }
    }
}

/// Log and swallow a failed interaction.
fn attempt(result: Result<(), FillError>, what: &str) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(operation = what, error = %e, "browser operation failed");
            false
        }
    }
}

fn clear_focused<S: BrowserSurface + ?Sized>(surface: &mut S) {
    attempt(surface.press_key(Key::SelectAll), "select-all");
    attempt(surface.press_key(Key::Delete), "delete");
}

// ============================================================================
// Text
// ============================================================================

fn has_and_word(s: &str) -> bool {
    s.split_whitespace().any(|w| w.eq_ignore_ascii_case("and"))
}

/// Chip input: a list value, or a multi-value label with a delimited value.
pub fn is_chip_input(label: &str, value: &ResolvedValue) -> bool {
    if value.is_list() {
        return true;
    }
    let l = label.to_lowercase();
    let text = value.as_text();
    MULTI_HINTS.iter().any(|h| l.contains(h))
        && (text.contains(',') || text.contains(';') || has_and_word(&text))
}

/// Split chip text on `,`, `;` and the word "and".
pub fn split_chip_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for piece in text.split([',', ';']) {
        let mut current: Vec<&str> = Vec::new();
        for word in piece.split_whitespace() {
            if word.eq_ignore_ascii_case("and") {
                if !current.is_empty() {
                    tokens.push(current.join(" "));
                }
                current.clear();
            } else {
                current.push(word);
            }
        }
        if !current.is_empty() {
            tokens.push(current.join(" "));
        }
    }
    tokens
}

fn fill_text<S: BrowserSurface + ?Sized>(
    surface: &mut S,
    pacer: &mut dyn Pacer,
    settings: &FillSettings,
    target: &FillTarget<'_>,
    value: &ResolvedValue,
) -> Vec<EventRecord> {
    clear_focused(surface);

    if value.is_empty() {
        return vec![EventRecord::typed(target.label, "", Some(false))];
    }

    if is_chip_input(target.label, value) {
        return vec![fill_chips(surface, pacer, target, value)];
    }

    let text = value.as_text();
    attempt(surface.type_text(&text, pacer.keystroke_ms()), "type");
    let mut confirmed = verify_text(surface, &text);

    let mut retries = 0;
    while confirmed == Some(false) && retries < settings.verify_retries {
        retries += 1;
        debug!(field = target.label, retry = retries, "retyping mismatched value");
        clear_focused(surface);
        attempt(surface.type_text(&text, pacer.slow_keystroke_ms()), "type");
        pacer.pause(Pause::Commit);
        confirmed = verify_text(surface, &text);
    }

    vec![EventRecord::typed(target.label, &text, confirmed)]
}

fn verify_text<S: BrowserSurface + ?Sized>(surface: &mut S, expected: &str) -> Option<bool> {
    match surface.read_focused_value() {
        Ok(current) => Some(current.unwrap_or_default() == norm_text(expected)),
        Err(e) => {
            warn!(error = %e, "could not read focused value");
            None
        }
    }
}

fn fill_chips<S: BrowserSurface + ?Sized>(
    surface: &mut S,
    pacer: &mut dyn Pacer,
    target: &FillTarget<'_>,
    value: &ResolvedValue,
) -> EventRecord {
    let pieces = match value {
        ResolvedValue::Many(items) => items.iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect(),
        other => split_chip_tokens(&other.as_text()),
    };

    let mut committed: Vec<String> = Vec::new();
    for piece in &pieces {
        let token = if target.chip_options.is_empty() {
            piece.clone()
        } else {
            best_option(piece, target.chip_options, MatchFallback::KeepAnswer)
        };

        if !attempt(surface.type_text(&token, pacer.keystroke_ms()), "type chip") {
            continue;
        }
        pacer.pause(Pause::Suggestions);

        if let Err(e) = surface.click_option(&token) {
            debug!(token = %token, error = %e, "no suggestion to click, using keyboard");
            attempt(surface.press_key(Key::ArrowDown), "arrow-down");
            pacer.pause(Pause::Key);
            attempt(surface.press_key(Key::Enter), "enter");
        }
        pacer.pause(Pause::Commit);
        committed.push(token);
    }

    let confirmed = if committed.is_empty() {
        None
    } else {
        match surface.read_page_text() {
            Ok(text) => {
                let text = norm_text(&text);
                Some(committed.iter().all(|t| text.contains(t.as_str())))
            }
            Err(e) => {
                warn!(error = %e, "could not read page text");
                None
            }
        }
    };

    EventRecord::chips(target.label, &value.as_text(), committed, confirmed)
}

// ============================================================================
// Combobox / listbox
// ============================================================================

fn fill_selector<S: BrowserSurface + ?Sized>(
    surface: &mut S,
    pacer: &mut dyn Pacer,
    target: &FillTarget<'_>,
    value: &ResolvedValue,
) -> Vec<EventRecord> {
    let is_combo = target.role == AxRole::Combobox;
    let mut events = Vec::new();

    for desired in value.items() {
        if is_combo {
            attempt(surface.press_key(Key::Enter), "open combobox");
            pacer.pause(Pause::Popup);
        }

        let committed = match surface.click_option(&desired) {
            Ok(()) => true,
            Err(e) => {
                debug!(option = %desired, error = %e, "option click failed, typing instead");
                let reopened = !is_combo || attempt(surface.press_key(Key::Enter), "reopen combobox");
                reopened
                    && attempt(surface.type_text(&desired, FALLBACK_TYPE_DELAY_MS), "type option")
                    && attempt(surface.press_key(Key::Enter), "confirm option")
            }
        };
        pacer.pause(Pause::Commit);

        let confirmed = if !committed {
            None
        } else if is_combo {
            Some(verify_selection(surface, &desired))
        } else {
            Some(true)
        };
        events.push(EventRecord::selected(target.label, &desired, confirmed));
    }

    events
}

/// A combobox that exposes a value must show the chosen option; one that
/// exposes nothing is taken at its word.
fn verify_selection<S: BrowserSurface + ?Sized>(surface: &mut S, desired: &str) -> bool {
    match surface.read_focused_value() {
        Ok(Some(current)) if !current.is_empty() => current == norm_text(desired),
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "could not read combobox value");
            true
        }
    }
}

// ============================================================================
// Radio / checkbox
// ============================================================================

fn fill_radio<S: BrowserSurface + ?Sized>(
    surface: &mut S,
    pacer: &mut dyn Pacer,
    settings: &FillSettings,
    target: &FillTarget<'_>,
    value: &ResolvedValue,
) -> Vec<EventRecord> {
    let Some(wanted) = value.items().into_iter().next() else {
        return vec![];
    };
    let wanted = norm_text(&wanted);

    let mut current = String::new();
    let mut tries = 0;
    while tries < settings.radio_max_tries {
        current = match surface.read_focused_name() {
            Ok(name) => name.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "could not read focused radio");
                break;
            }
        };
        if current == wanted {
            break;
        }
        if !attempt(surface.press_key(Key::ArrowDown), "arrow-down") {
            break;
        }
        pacer.pause(Pause::Key);
        tries += 1;
    }

    vec![EventRecord::selected(target.label, &wanted, Some(current == wanted))]
}

fn fill_checkbox<S: BrowserSurface + ?Sized>(
    surface: &mut S,
    target: &FillTarget<'_>,
    value: &ResolvedValue,
) -> Vec<EventRecord> {
    let items = value.items();
    let on = items.iter().any(|v| {
        let v = v.trim().to_lowercase();
        TRUTHY.contains(&v.as_str())
            || (!target.node_name.is_empty() && v == target.node_name.to_lowercase())
    });

    if on {
        attempt(surface.press_key(Key::Space), "toggle");
    }
    vec![EventRecord::toggled(target.label, on)]
}
