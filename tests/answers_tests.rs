use focus_fill::answers::llm::{
    AnswerBackend, MockAnswerBackend, build_user_prompt, generate_answers, normalize_answers, parse_reply,
};
use focus_fill::ax::ax_model::AxRole;
use focus_fill::classify::field_model::{FieldDescriptor, FieldKey, FieldsDocument};
use focus_fill::resolve::source::{AnswersDocument, ResolvedValue, SourceProfile, ValueSource};

mod common;
use common::strings;

fn schema() -> FieldsDocument {
    FieldsDocument::new(vec![
        FieldDescriptor {
            name: "First Name".into(),
            role: AxRole::Textbox,
            options: vec![],
            example: "Jane".into(),
            multi: false,
        },
        FieldDescriptor {
            name: "Gender".into(),
            role: AxRole::Combobox,
            options: strings(&["Decline To Self Identify", "Female", "Male"]),
            example: "Decline To Self Identify".into(),
            multi: false,
        },
        FieldDescriptor {
            name: "Cities".into(),
            role: AxRole::Listbox,
            options: strings(&["Austin", "New York", "Seattle"]),
            example: "Austin".into(),
            multi: true,
        },
    ])
}

fn profile() -> SourceProfile {
    SourceProfile::from_yaml_str("first_name: Ada\ncities: [NYC, Seattle]\n").unwrap()
}

#[test]
fn prompt_embeds_all_three_documents() {
    let prior = AnswersDocument::default();
    let prompt = build_user_prompt(&schema(), &profile(), Some(&prior)).unwrap();
    assert!(prompt.contains("fields_schema"));
    assert!(prompt.contains("name: Gender"));
    assert!(prompt.contains("first_name: Ada"));
    assert!(prompt.contains("prior_answers"));
}

#[test]
fn reply_is_normalized_against_the_schema() {
    let reply = parse_reply(
        r#"```yaml
fields:
  - name: First Name
    role: combobox
    value: "  Ada  "
  - name: Gender
    role: combobox
    value: female
  - name: Cities
    role: listbox
    value: [nyc, Seattle, New York City]
  - name: Favourite colour
    role: textbox
    value: blue
```"#,
    )
    .unwrap();
    let answers = normalize_answers(&schema().fields, &reply);

    assert_eq!(answers.len(), 3);
    assert_eq!(answers[0].role, AxRole::Textbox);
    assert_eq!(answers[0].value, ResolvedValue::single("Ada"));
    assert_eq!(answers[1].value, ResolvedValue::single("Female"));
    assert_eq!(answers[2].value, ResolvedValue::Many(strings(&["New York", "Seattle"])));
}

#[test]
fn reply_without_fields_yields_nothing() {
    let reply = parse_reply("answers: []").unwrap();
    assert!(normalize_answers(&schema().fields, &reply).is_empty());
}

#[test]
fn unparseable_reply_is_an_error() {
    let backend = MockAnswerBackend::canned("fields: [unclosed");
    assert!(generate_answers(&backend, &schema(), &profile(), None).is_err());
}

#[test]
fn mock_backend_answers_like_the_resolver() {
    let source = ValueSource::with_profile(profile());
    let backend = MockAnswerBackend::deterministic(&schema().fields, &source, 3).unwrap();
    assert_eq!(backend.model_name(), "mock");

    let doc = generate_answers(&backend, &schema(), &profile(), None).unwrap();
    assert_eq!(doc.model.as_deref(), Some("mock"));
    assert_eq!(
        doc.lookup(&FieldKey::new(AxRole::Textbox, "First Name")),
        Some(&ResolvedValue::single("Ada"))
    );
    assert_eq!(
        doc.lookup(&FieldKey::new(AxRole::Listbox, "Cities")),
        Some(&ResolvedValue::Many(strings(&["New York", "Seattle"])))
    );
}

#[test]
fn answers_document_round_trips_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("llm-answers-1.yaml");
    let backend = MockAnswerBackend::canned(
        "fields:\n  - name: Gender\n    role: combobox\n    value: Male\n",
    );
    let doc = generate_answers(&backend, &schema(), &profile(), None).unwrap();
    doc.save(&path).unwrap();

    let loaded = AnswersDocument::load(&path).unwrap();
    assert_eq!(loaded, doc);
    assert_eq!(
        loaded.lookup(&FieldKey::new(AxRole::Combobox, "Gender")),
        Some(&ResolvedValue::single("Male"))
    );
}
