use focus_fill::ax::ax_model::AxRole;
use focus_fill::classify::field_model::{FieldDescriptor, FieldKey};
use focus_fill::resolve::resolver::{FieldPlan, ValueResolver};
use focus_fill::resolve::rules::{RuleInput, ValueRule};
use focus_fill::resolve::source::{
    AnswerEntry, AnswersDocument, ResolvedValue, SourceProfile, ValueSource,
};

mod common;
use common::strings;

fn text_field(name: &str) -> FieldDescriptor {
    FieldDescriptor {
        name: name.into(),
        role: AxRole::Textbox,
        options: vec![],
        example: String::new(),
        multi: false,
    }
}

fn choice(name: &str, role: AxRole, options: &[&str]) -> FieldDescriptor {
    FieldDescriptor {
        name: name.into(),
        role,
        options: strings(options),
        example: options.first().map(|s| s.to_string()).unwrap_or_default(),
        multi: role == AxRole::Listbox,
    }
}

fn profile(yaml: &str) -> ValueSource {
    ValueSource::with_profile(SourceProfile::from_yaml_str(yaml).unwrap())
}

fn resolve(field: &FieldDescriptor, source: &ValueSource) -> ResolvedValue {
    ValueResolver::new(3).resolve(field, source)
}

// ============================================================================
// Priority
// ============================================================================

#[test]
fn prior_answer_beats_profile_and_example() {
    let field = text_field("First Name");
    let mut source = profile("first_name: Jane");
    source.answers = Some(AnswersDocument {
        model: None,
        fields: vec![AnswerEntry {
            name: "First Name".into(),
            role: AxRole::Textbox,
            value: ResolvedValue::single("Janet"),
        }],
    });
    assert_eq!(resolve(&field, &source), ResolvedValue::single("Janet"));
}

#[test]
fn prior_answer_must_match_role_and_name() {
    let field = text_field("First Name");
    let mut source = profile("first_name: Jane");
    source.answers = Some(AnswersDocument {
        model: None,
        fields: vec![AnswerEntry {
            name: "First Name".into(),
            role: AxRole::Combobox,
            value: ResolvedValue::single("Janet"),
        }],
    });
    assert_eq!(resolve(&field, &source), ResolvedValue::single("Jane"));
}

#[test]
fn empty_prior_answer_falls_through() {
    let field = text_field("Email");
    let mut source = profile("email: jane@example.com");
    source.answers = Some(AnswersDocument {
        model: None,
        fields: vec![AnswerEntry {
            name: "Email".into(),
            role: AxRole::Textbox,
            value: ResolvedValue::Empty,
        }],
    });
    assert_eq!(resolve(&field, &source), ResolvedValue::single("jane@example.com"));
}

#[test]
fn example_is_used_without_a_profile() {
    let mut field = text_field("Favourite colour");
    field.example = "Example text".into();
    assert_eq!(
        resolve(&field, &ValueSource::default()),
        ResolvedValue::single("Example text")
    );
    assert!(resolve(&text_field("Blank"), &ValueSource::default()).is_empty());
}

#[test]
fn prior_answer_is_mapped_onto_options() {
    let field = choice("Preferred office", AxRole::Combobox, &["New York", "Austin"]);
    let mut source = ValueSource::default();
    source.answers = Some(AnswersDocument {
        model: None,
        fields: vec![AnswerEntry {
            name: "Preferred office".into(),
            role: AxRole::Combobox,
            value: ResolvedValue::single("NYC"),
        }],
    });
    assert_eq!(resolve(&field, &source), ResolvedValue::single("New York"));
}

// ============================================================================
// Rules
// ============================================================================

#[test]
fn names_are_derived_from_a_full_name() {
    let source = profile("full_name: Jane Q Doe");
    assert_eq!(resolve(&text_field("First Name *"), &source), ResolvedValue::single("Jane"));
    assert_eq!(resolve(&text_field("Last Name *"), &source), ResolvedValue::single("Doe"));
    assert_eq!(resolve(&text_field("Full name"), &source), ResolvedValue::single("Jane Q Doe"));
    // Not a person's name
    assert!(resolve(&text_field("Company name"), &source).is_empty());
}

#[test]
fn full_name_is_assembled_from_parts() {
    let source = profile("first_name: Jane\nlast_name: Doe");
    assert_eq!(resolve(&text_field("Name"), &source), ResolvedValue::single("Jane Doe"));
}

#[test]
fn contact_rules_read_their_keys() {
    let source = profile(
        "email: jane@example.com\nphone: 555-0100\nlinkedin: https://linkedin.com/in/jane\n\
         github: https://github.com/jane\nportfolio: https://jane.dev",
    );
    assert_eq!(resolve(&text_field("Email address"), &source), ResolvedValue::single("jane@example.com"));
    assert_eq!(resolve(&text_field("Mobile phone"), &source), ResolvedValue::single("555-0100"));
    assert_eq!(
        resolve(&text_field("LinkedIn Profile"), &source),
        ResolvedValue::single("https://linkedin.com/in/jane")
    );
    assert_eq!(resolve(&text_field("GitHub URL"), &source), ResolvedValue::single("https://github.com/jane"));
    assert_eq!(resolve(&text_field("Website"), &source), ResolvedValue::single("https://jane.dev"));
    // "Cellar" is not a phone
    assert!(resolve(&text_field("Cellar door"), &source).is_empty());
}

#[test]
fn authorization_follows_the_work_status() {
    let options = [
        "Yes, no restriction.",
        "Yes, but I will need sponsorship in the future.",
        "No, I need sponsorship now.",
    ];
    let field = choice("Are you authorized to work in the US?", AxRole::Combobox, &options);

    let citizen = profile("work_status: US Citizen");
    assert_eq!(resolve(&field, &citizen), ResolvedValue::single("Yes, no restriction."));

    let student = profile("work_visa_status: F-1 student on OPT");
    assert_eq!(
        resolve(&field, &student),
        ResolvedValue::single("Yes, but I will need sponsorship in the future.")
    );

    let other = profile("work_authorization: H-1B transfer");
    assert_eq!(resolve(&field, &other), ResolvedValue::single("No, I need sponsorship now."));
}

#[test]
fn authorization_without_status_has_no_opinion() {
    let field = choice("Visa sponsorship required?", AxRole::Radiogroup, &["Yes", "No"]);
    let source = profile("first_name: Jane");
    // Falls back to the scanned example
    assert_eq!(resolve(&field, &source), ResolvedValue::single("Yes"));
}

#[test]
fn yes_no_question_reads_the_status() {
    let field = choice("Do you live in the area?", AxRole::Radiogroup, &["No", "Yes"]);
    assert_eq!(
        resolve(&field, &profile("work_status: permanent resident")),
        ResolvedValue::single("Yes")
    );
    assert_eq!(
        resolve(&field, &profile("work_status: student visa")),
        ResolvedValue::single("No")
    );
}

#[test]
fn rule_answer_outside_the_options_gives_way_to_the_status() {
    // "Work status" reads the `work_status` key verbatim, which is no option
    let field = choice("Work status", AxRole::Radiogroup, &["No", "Yes"]);
    assert_eq!(
        resolve(&field, &profile("work_status: permanent resident")),
        ResolvedValue::single("Yes")
    );
}

#[test]
fn rule_answer_outside_the_options_falls_back_to_the_example() {
    let mut field = choice("Shirt size", AxRole::Combobox, &["Large", "Medium", "Small"]);
    field.example = "Medium".into();
    assert_eq!(resolve(&field, &profile("shirt_size: XXL")), ResolvedValue::single("Medium"));
}

#[test]
fn cities_fill_multi_select_up_to_top_n() {
    let field = choice(
        "What cities are you available to work in?",
        AxRole::Listbox,
        &["Austin", "New York", "San Francisco", "San Jose (Campbell)", "Seattle"],
    );
    let source = profile(
        "answers:\n  - location_preference_city_ordered: [NYC, Mountain View, SF, Seattle]\n",
    );
    assert_eq!(
        resolve(&field, &source),
        ResolvedValue::Many(strings(&["New York", "San Jose (Campbell)", "San Francisco"]))
    );

    let two = profile(
        "location_preference_city_ordered: [NYC, Mountain View, SF]\nlocation_preference_top_selections: 2\n",
    );
    assert_eq!(
        resolve(&field, &two),
        ResolvedValue::Many(strings(&["New York", "San Jose (Campbell)"]))
    );
}

#[test]
fn cities_in_a_text_field_are_comma_joined() {
    let source = profile("cities: Austin, Denver");
    assert_eq!(
        resolve(&text_field("Preferred location"), &source),
        ResolvedValue::single("Austin, Denver")
    );
}

#[test]
fn heard_about_maps_profile_codes_to_options() {
    let field = choice(
        "How did you hear about us?",
        AxRole::Combobox,
        &["Careers Page", "Hacker News", "LinkedIn (Job Posting)"],
    );
    assert_eq!(
        resolve(&field, &profile("heard_about_us: company_website")),
        ResolvedValue::single("Careers Page")
    );
    assert_eq!(
        resolve(&field, &profile("heard_about_us: linkedin")),
        ResolvedValue::single("LinkedIn (Job Posting)")
    );
}

#[test]
fn label_can_name_a_profile_key_directly() {
    let source = profile("years_of_experience: 7\npronouns: they/them");
    assert_eq!(resolve(&text_field("Years of experience"), &source), ResolvedValue::single("7"));
    assert_eq!(resolve(&text_field("Pronouns"), &source), ResolvedValue::single("they/them"));
}

#[test]
fn custom_rules_replace_the_table() {
    struct Always;
    impl ValueRule for Always {
        fn name(&self) -> &str {
            "always"
        }
        fn answer(&self, _input: &RuleInput<'_>) -> Option<ResolvedValue> {
            Some(ResolvedValue::single("fixed"))
        }
    }

    let resolver = ValueResolver::with_rules(vec![Box::new(Always)], 3);
    let source = profile("email: jane@example.com");
    assert_eq!(resolver.resolve(&text_field("Email"), &source), ResolvedValue::single("fixed"));
}

// ============================================================================
// Reconciliation and plan lookup
// ============================================================================

#[test]
fn multi_select_text_answer_is_split_and_deduplicated() {
    let field = choice("Languages", AxRole::Listbox, &["Go", "Python", "Rust"]);
    let resolver = ValueResolver::new(5);
    assert_eq!(
        resolver.reconcile(&field, ResolvedValue::single("rust; Go, RUST")),
        ResolvedValue::Many(strings(&["Rust", "Go"]))
    );
}

#[test]
fn single_selector_keeps_one_option() {
    let field = choice("Office", AxRole::Combobox, &["Austin", "Boston"]);
    let resolver = ValueResolver::new(3);
    assert_eq!(
        resolver.reconcile(&field, ResolvedValue::Many(strings(&["Boston", "Austin"]))),
        ResolvedValue::single("Boston")
    );
    // Unknown answers fall back to the first option
    assert_eq!(
        resolver.reconcile(&field, ResolvedValue::single("Tokyo")),
        ResolvedValue::single("Austin")
    );
}

#[test]
fn plan_looks_up_grouped_controls_by_container_label() {
    let fields = vec![
        text_field("Email"),
        choice("Relocate?", AxRole::Radiogroup, &["No", "Yes"]),
    ];
    let source = profile("email: jane@example.com\nrelocate: Yes");
    let plan = FieldPlan::build(&fields, &source, &ValueResolver::new(3));

    assert_eq!(plan.len(), 2);
    assert_eq!(
        plan.value_for(&FieldKey::new(AxRole::Textbox, "Email"), None),
        ResolvedValue::single("jane@example.com")
    );
    let radio = FieldKey::new(AxRole::Radio, "Yes");
    assert_eq!(plan.value_for(&radio, Some("Relocate?")), ResolvedValue::single("Yes"));
    assert!(plan.value_for(&radio, None).is_empty());
    assert!(plan.value_for(&radio, Some("Unknown")).is_empty());
}

#[test]
fn chip_options_fall_back_to_multi_select_options() {
    let fields = vec![
        choice("Office", AxRole::Combobox, &["Austin", "Boston"]),
        choice("Cities", AxRole::Listbox, &["Denver", "Seattle"]),
    ];
    let plan = FieldPlan::build(&fields, &ValueSource::default(), &ValueResolver::new(3));
    assert_eq!(plan.chip_options("Office"), strings(&["Austin", "Boston"]).as_slice());
    assert_eq!(plan.chip_options("Skills"), strings(&["Denver", "Seattle"]).as_slice());
}
