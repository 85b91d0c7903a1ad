use crate::ax::ax_model::AxRole;
use crate::ax::normalize::label_key;
use crate::classify::field_model::FieldDescriptor;
use crate::resolve::examples::AUTHORIZATION_TOKENS;
use crate::resolve::matcher::match_option;
use crate::resolve::source::{ResolvedValue, SourceProfile};

/// Profile keys holding the candidate's work authorization status.
pub const STATUS_KEYS: [&str; 3] = ["work_status", "work_visa_status", "work_authorization"];

const AFFIRMATIVE: [&str; 4] = ["citizen", "permanent", "no sponsorship", "authorized"];
const FUTURE: [&str; 5] = ["future", "will need", "student", "opt", "stem"];

const CITY_KEYS: [&str; 5] = [
    "location_preference_city_ordered",
    "city_preference",
    "cities",
    "location",
    "city",
];

/// What a rule sees: the field, its lowercased label and the profile.
pub struct RuleInput<'a> {
    pub field: &'a FieldDescriptor,
    pub label: String,
    pub profile: &'a SourceProfile,
    pub top_n: usize,
}

impl<'a> RuleInput<'a> {
    pub fn new(field: &'a FieldDescriptor, profile: &'a SourceProfile, top_n: usize) -> Self {
        Self {
            label: label_key(&field.name),
            field,
            profile,
            top_n,
        }
    }

    fn status(&self) -> String {
        self.profile.text(&STATUS_KEYS).unwrap_or_default().to_lowercase()
    }

    /// First candidate offered verbatim by the field.
    fn offered(&self, candidates: &[&str]) -> Option<ResolvedValue> {
        candidates
            .iter()
            .find(|c| self.field.options.iter().any(|o| o == *c))
            .map(|c| ResolvedValue::single(*c))
    }
}

/// One entry of the heuristic table. `None` means no opinion.
pub trait ValueRule {
    fn name(&self) -> &str;
    fn answer(&self, input: &RuleInput<'_>) -> Option<ResolvedValue>;
}

/// Rule keyed on label substrings.
pub struct LabelRule {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub text_only: bool,
    pub derive: fn(&RuleInput<'_>) -> Option<ResolvedValue>,
}

impl ValueRule for LabelRule {
    fn name(&self) -> &str {
        self.name
    }

    fn answer(&self, input: &RuleInput<'_>) -> Option<ResolvedValue> {
        if self.text_only && !input.field.role.is_text_like() {
            return None;
        }
        if !self.keywords.iter().any(|k| input.label.contains(k)) {
            return None;
        }
        (self.derive)(input).filter(|v| !v.is_empty())
    }
}

/// Looks the snake_cased label up as a profile key: "Years of experience"
/// reads `years_of_experience`.
pub struct ProfileKeyRule;

impl ValueRule for ProfileKeyRule {
    fn name(&self) -> &str {
        "profile_key"
    }

    fn answer(&self, input: &RuleInput<'_>) -> Option<ResolvedValue> {
        let key = profile_key(&input.label);
        if key.is_empty() {
            return None;
        }
        let value = ResolvedValue::from_yaml(input.profile.get(&key)?);
        if value.is_empty() { None } else { Some(value) }
    }
}

/// `snake_case` form of a label: alphanumeric runs joined by `_`.
pub fn profile_key(label: &str) -> String {
    label
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

// ============================================================================
// Rule bodies
// ============================================================================

fn authorization(input: &RuleInput<'_>) -> Option<ResolvedValue> {
    let status = input.status();
    if status.is_empty() {
        return None;
    }

    if !input.field.has_options() {
        return match input.field.role {
            AxRole::Combobox | AxRole::Listbox => Some(ResolvedValue::single("Yes, no restriction.")),
            AxRole::Radiogroup | AxRole::Group => Some(ResolvedValue::single("Yes")),
            _ => None,
        };
    }

    if AFFIRMATIVE.iter().any(|k| status.contains(k)) {
        if let Some(v) = input.offered(&["Yes, no restriction.", "Yes, no restriction", "Yes"]) {
            return Some(v);
        }
    }
    if FUTURE.iter().any(|k| status.contains(k)) {
        if let Some(v) = input.offered(&[
            "Yes, but I will need sponsorship in the future.",
            "Yes, but I will need sponsorship in the future",
        ]) {
            return Some(v);
        }
    }
    input.offered(&["No, I need sponsorship now.", "No"])
}

fn cities(input: &RuleInput<'_>) -> Option<ResolvedValue> {
    let cities = input.profile.list(&CITY_KEYS);
    if cities.is_empty() {
        return None;
    }
    let top_n = input
        .profile
        .number("location_preference_top_selections")
        .unwrap_or(input.top_n)
        .max(1);
    let top: Vec<String> = cities.into_iter().take(top_n).collect();

    if input.field.multi {
        return Some(ResolvedValue::many(top));
    }
    if input.field.has_options() {
        return top
            .iter()
            .find_map(|c| match_option(c, &input.field.options))
            .map(ResolvedValue::single);
    }
    Some(ResolvedValue::single(top.join(", ")))
}

fn heard_about(input: &RuleInput<'_>) -> Option<ResolvedValue> {
    let heard = input.profile.text(&["heard_about_us", "referral_source"])?;
    let phrase = match heard.to_lowercase().as_str() {
        "company_website" => "Careers Page".to_string(),
        "hacker_news" => "Hacker News".to_string(),
        "linkedin" => "LinkedIn".to_string(),
        "github" => "Github".to_string(),
        other => other.replace('_', " "),
    };
    if input.field.has_options() {
        match_option(&phrase, &input.field.options).map(ResolvedValue::single)
    } else {
        Some(ResolvedValue::single(phrase))
    }
}

fn full_name_parts(profile: &SourceProfile) -> Vec<String> {
    profile
        .text(&["full_name", "name"])
        .map(|n| n.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

fn first_name(input: &RuleInput<'_>) -> Option<ResolvedValue> {
    input
        .profile
        .text(&["first_name", "given_name"])
        .or_else(|| full_name_parts(input.profile).first().cloned())
        .map(ResolvedValue::single)
}

fn last_name(input: &RuleInput<'_>) -> Option<ResolvedValue> {
    input
        .profile
        .text(&["last_name", "family_name", "surname"])
        .or_else(|| {
            let parts = full_name_parts(input.profile);
            if parts.len() > 1 { parts.last().cloned() } else { None }
        })
        .map(ResolvedValue::single)
}

fn full_name(input: &RuleInput<'_>) -> Option<ResolvedValue> {
    let bare = input.label.trim_end_matches(['*', ' ', ':']);
    let is_full = bare == "name"
        || ["full name", "legal name", "your name"].iter().any(|k| bare.contains(k));
    if !is_full {
        return None;
    }
    if let Some(full) = input.profile.text(&["full_name", "name"]) {
        return Some(ResolvedValue::single(full));
    }
    let first = input.profile.text(&["first_name"])?;
    match input.profile.text(&["last_name"]) {
        Some(last) => Some(ResolvedValue::single(format!("{} {}", first, last))),
        None => Some(ResolvedValue::single(first)),
    }
}

fn email(input: &RuleInput<'_>) -> Option<ResolvedValue> {
    input.profile.text(&["email", "email_address"]).map(ResolvedValue::single)
}

fn phone(input: &RuleInput<'_>) -> Option<ResolvedValue> {
    let words: Vec<&str> = input.label.split(|c: char| !c.is_alphanumeric()).collect();
    if !["phone", "mobile", "cell"].iter().any(|w| words.contains(w)) {
        return None;
    }
    input
        .profile
        .text(&["phone", "phone_number", "mobile"])
        .map(ResolvedValue::single)
}

fn linkedin(input: &RuleInput<'_>) -> Option<ResolvedValue> {
    input
        .profile
        .text(&["linkedin", "linkedin_url"])
        .map(ResolvedValue::single)
}

fn github(input: &RuleInput<'_>) -> Option<ResolvedValue> {
    input.profile.text(&["github", "github_url"]).map(ResolvedValue::single)
}

fn website(input: &RuleInput<'_>) -> Option<ResolvedValue> {
    input
        .profile
        .text(&["portfolio", "website", "portfolio_url", "website_url"])
        .map(ResolvedValue::single)
}

/// The ordered heuristic table. First rule with an opinion wins.
pub fn default_rules() -> Vec<Box<dyn ValueRule>> {
    vec![
        Box::new(LabelRule {
            name: "work_authorization",
            keywords: &AUTHORIZATION_TOKENS,
            text_only: false,
            derive: authorization,
        }),
        Box::new(LabelRule {
            name: "heard_about_us",
            keywords: &["how did you hear"],
            text_only: false,
            derive: heard_about,
        }),
        Box::new(LabelRule {
            name: "cities",
            keywords: &["what cities", "available to work", "city", "cities", "location"],
            text_only: false,
            derive: cities,
        }),
        Box::new(LabelRule {
            name: "first_name",
            keywords: &["first name", "given name"],
            text_only: true,
            derive: first_name,
        }),
        Box::new(LabelRule {
            name: "last_name",
            keywords: &["last name", "family name", "surname"],
            text_only: true,
            derive: last_name,
        }),
        Box::new(LabelRule {
            name: "full_name",
            keywords: &["name"],
            text_only: true,
            derive: full_name,
        }),
        Box::new(LabelRule {
            name: "email",
            keywords: &["email", "e-mail"],
            text_only: true,
            derive: email,
        }),
        Box::new(LabelRule {
            name: "phone",
            keywords: &["phone", "mobile", "cell"],
            text_only: true,
            derive: phone,
        }),
        Box::new(LabelRule {
            name: "linkedin",
            keywords: &["linkedin"],
            text_only: true,
            derive: linkedin,
        }),
        Box::new(LabelRule {
            name: "github",
            keywords: &["github"],
            text_only: true,
            derive: github,
        }),
        Box::new(LabelRule {
            name: "website",
            keywords: &["website", "portfolio"],
            text_only: true,
            derive: website,
        }),
        Box::new(ProfileKeyRule),
    ]
}

/// Yes/No fallback for a bare {Yes, No} choice, read from the status alone.
pub fn yes_no_from_status(profile: &SourceProfile) -> Option<ResolvedValue> {
    let status = profile.text(&STATUS_KEYS)?.to_lowercase();
    if ["citizen", "permanent", "authorized"].iter().any(|k| status.contains(k)) {
        return Some(ResolvedValue::single("Yes"));
    }
    if FUTURE.iter().any(|k| status.contains(k)) {
        return Some(ResolvedValue::single("No"));
    }
    None
}
