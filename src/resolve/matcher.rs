use crate::ax::normalize::norm_text;

/// What to return when nothing in the option set resembles the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchFallback {
    /// Fall back to the first option (closed selectors must pick something).
    FirstOption,
    /// Keep the answer as typed (chip inputs accept free tokens).
    KeepAnswer,
}

/// Known aliases: (alias, target). Only applied when the target is offered.
const SYNONYMS: [(&str, &str); 5] = [
    ("new york city", "New York"),
    ("nyc", "New York"),
    ("sf", "San Francisco"),
    ("sfo", "San Francisco"),
    ("mountain view", "San Jose (Campbell)"),
];

/// Comparison form: lowercase, parentheticals dropped, the word "city" dropped,
/// non-alphanumerics turned into spaces, whitespace collapsed.
pub fn canonical(s: &str) -> String {
    let lower = s.to_lowercase();

    let mut bare = String::with_capacity(lower.len());
    let mut depth = 0usize;
    for c in lower.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            c if c.is_alphanumeric() => bare.push(c),
            _ => bare.push(' '),
        }
    }

    bare.split_whitespace()
        .filter(|w| *w != "city")
        .collect::<Vec<_>>()
        .join(" ")
}

fn tokens(s: &str) -> Vec<&str> {
    s.split_whitespace().collect()
}

/// Map a free-form answer onto one of `options`.
///
/// Tries, in order: exact (case-insensitive), synonym, canonical equality,
/// canonical containment either way, best token overlap. Returns `None` only
/// when nothing resembles the answer.
pub fn match_option(answer: &str, options: &[String]) -> Option<String> {
    let answer = norm_text(answer);
    if answer.is_empty() || options.is_empty() {
        return None;
    }

    if let Some(hit) = options.iter().find(|o| o.eq_ignore_ascii_case(&answer)) {
        return Some(hit.clone());
    }

    let lower = answer.to_lowercase();
    for (alias, target) in SYNONYMS {
        if lower == alias {
            if let Some(hit) = options.iter().find(|o| o.as_str() == target) {
                return Some(hit.clone());
            }
        }
    }

    let a = canonical(&answer);
    let canon: Vec<String> = options.iter().map(|o| canonical(o)).collect();

    if !a.is_empty() {
        if let Some(i) = canon.iter().position(|c| *c == a) {
            return Some(options[i].clone());
        }
        if let Some(i) = canon
            .iter()
            .position(|c| !c.is_empty() && (c.contains(a.as_str()) || a.contains(c.as_str())))
        {
            return Some(options[i].clone());
        }
    }

    let answer_tokens = tokens(&a);
    let mut best: Option<(usize, usize)> = None;
    for (i, c) in canon.iter().enumerate() {
        let overlap = tokens(c).iter().filter(|t| answer_tokens.contains(t)).count();
        if overlap > 0 && best.is_none_or(|(_, score)| overlap > score) {
            best = Some((i, overlap));
        }
    }
    best.map(|(i, _)| options[i].clone())
}

/// [`match_option`] with an explicit fallback when nothing matches.
pub fn best_option(answer: &str, options: &[String], fallback: MatchFallback) -> String {
    if let Some(hit) = match_option(answer, options) {
        return hit;
    }
    match fallback {
        MatchFallback::FirstOption => options.first().cloned().unwrap_or_else(|| answer.to_string()),
        MatchFallback::KeepAnswer => answer.to_string(),
    }
}
