/// Collapse every whitespace run (including NBSP, narrow NBSP, figure space
/// and newlines) to a single space and trim.
pub fn norm_text(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '\u{00A0}' | '\u{202F}' | '\u{2007}' => ' ',
            other => other,
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip a trailing echo of the live value from a label, together with the
/// separators in front of it: "City: San Jose" + "San Jose" -> "City".
pub fn stable_label(label: &str, value: Option<&str>) -> String {
    let label = norm_text(label);
    let value = match value.map(norm_text) {
        Some(v) if !v.is_empty() => v,
        _ => return label,
    };

    match label.strip_suffix(value.as_str()) {
        Some(head) => head
            .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '-' | '\u{2013}' | '\u{2014}'))
            .to_string(),
        None => label,
    }
}

/// Lowercased, whitespace-normalized label for keyword checks.
pub fn label_key(label: &str) -> String {
    norm_text(label).to_lowercase()
}

pub fn text_fingerprint(text: &str) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
