use crate::ax::ax_model::AxRole;
use crate::ax::normalize::label_key;

const PLACEHOLDERS: [&str; 5] = ["please select", "--", "select", "select one", "choose"];

pub const AUTHORIZATION_TOKENS: [&str; 8] = [
    "authoris",
    "authoriz",
    "work authorization",
    "work authorisation",
    "visa",
    "sponsor",
    "work permit",
    "eligib",
];

/// Pick the first `preferred` option present (case-insensitive), else the first
/// non-placeholder option, else the first option.
pub fn choose_option(options: &[String], preferred: &[&str]) -> Option<String> {
    let first = options.first()?;

    for p in preferred {
        if let Some(hit) = options.iter().find(|o| o.trim().eq_ignore_ascii_case(p)) {
            return Some(hit.trim().to_string());
        }
    }

    options
        .iter()
        .map(|o| o.trim())
        .find(|o| !o.is_empty() && !PLACEHOLDERS.contains(&o.to_lowercase().as_str()))
        .map(str::to_string)
        .or_else(|| Some(first.trim().to_string()))
}

fn looks_like_email_label(l: &str) -> bool {
    let bare = l.trim_end_matches(['*', ' ']);
    bare == "email"
        || bare == "email address"
        || bare.starts_with("email")
        || bare.starts_with("work email")
}

fn has_word(l: &str, words: &[&str]) -> bool {
    l.split(|c: char| !c.is_alphanumeric())
        .any(|w| words.contains(&w))
}

/// Derive a placeholder example for a freshly scanned field from its label,
/// role and options. Used as the last resort before leaving a field empty.
pub fn guess_example(name: &str, role: AxRole, options: &[String]) -> String {
    let l = label_key(name);

    // Text-like heuristics (checked in order)
    if role.is_text_like() {
        if l.contains("first name") {
            return "Jane".into();
        }
        if l.contains("last name") {
            return "Doe".into();
        }
        if l == "name" || l.contains("full name") {
            return "Jane Doe".into();
        }
        if l.contains("city") || l.contains("cities") || l.contains("location") {
            return "San Francisco".into();
        }
        if l.contains("linkedin") {
            return "https://www.linkedin.com/in/jane-doe".into();
        }
        if l.contains("github") {
            return "https://github.com/janedoe".into();
        }
        if l.contains("website") || l.contains("portfolio") {
            return "https://janedoe.dev".into();
        }
        if has_word(&l, &["phone", "mobile", "cell"]) {
            return "555-555-1234".into();
        }
        if looks_like_email_label(&l) {
            return "jane.doe@example.com".into();
        }
        return "Example text".into();
    }

    // Option-based heuristics
    if !options.is_empty() {
        let pick = |preferred: &[&str]| choose_option(options, preferred).unwrap_or_default();

        if l.contains("how did you hear") {
            return pick(&["Hacker News", "LinkedIn (Job Posting)"]);
        }
        if l.contains("gender") {
            return pick(&["Decline To Self Identify"]);
        }
        if l.contains("disability") {
            return pick(&["I do not want to answer"]);
        }
        if l.contains("veteran") {
            return pick(&["I am not a protected veteran", "I don't wish to answer"]);
        }
        if l.contains("hispanic") {
            return pick(&["No"]);
        }
        if l.contains("race") {
            return pick(&["Asian", "Two or More Races", "White"]);
        }
        // Work authorization is left to the profile or prior answers
        if AUTHORIZATION_TOKENS.iter().any(|t| l.contains(t)) {
            return String::new();
        }
        if l.contains("certify") || l.contains("privacy") || l.contains("policy") {
            return pick(&["Yes"]);
        }
        return pick(&[]);
    }

    // Closed combobox without visible options
    if role == AxRole::Combobox && (l.contains("city") || l.contains("location")) {
        return "San Francisco".into();
    }

    String::new()
}
