use fieldcheck::prelude::*;
use fieldcheck::FieldEvent;
use std::sync::Mutex;

fn form() -> (Arc<MemoryScope>, Arc<MemoryField>) {
    let scope = MemoryScope::new("fieldset");
    let field = Arc::new(MemoryField::new("").within(scope.clone()));
    (scope, field)
}

#[test]
fn nothing_is_evaluated_before_the_first_event() {
    let (scope, field) = form();
    Selection::of(field.clone())
        .validates_presence(RuleOptions::new())
        .validates_format(formats::email())
        .validates_length(RuleOptions::new().minimum(3))
        .validates_numericality(RuleOptions::new())
        .validates_uniqueness(RuleOptions::new().source(Source::fixed(["x"])))
        .validates(RuleOptions::new().validates_with(|_| false));

    assert!(field.triggered().is_empty());
    assert!(scope.markers().is_empty());
}

#[test]
fn presence() {
    let (scope, field) = form();
    Selection::of(field.clone()).validates_presence(RuleOptions::new());

    field.change("");
    assert_eq!(field.signals(), vec!["invalid", "invalid-presence"]);
    assert!(scope.has_marker("invalid-presence"));

    field.clear_triggered();
    field.change("x");
    assert_eq!(field.signals(), vec!["valid", "valid-presence"]);
    assert!(!scope.has_marker("invalid-presence"));
}

#[test]
fn presence_of_unchecked_checkbox() {
    let scope = MemoryScope::new("fieldset");
    let terms = Arc::new(MemoryField::checkbox(false).within(scope.clone()));
    Selection::of(terms.clone()).validates_presence(RuleOptions::new());

    terms.trigger("change");
    assert_eq!(terms.signals(), vec!["invalid", "invalid-presence"]);

    terms.set_checked(true);
    terms.trigger("change");
    assert!(!scope.has_marker("invalid-presence"));
}

#[test]
fn format() {
    let (scope, field) = form();
    scope.add_marker("invalid-format");
    Selection::of(field.clone()).validates_format(RuleOptions::new().validation_regex("foo"));

    field.change("");
    assert!(field.signals().is_empty());
    assert!(!scope.has_marker("invalid-format"));

    field.change("foobar");
    assert_eq!(field.signals(), vec!["valid", "valid-format"]);

    field.clear_triggered();
    field.change("bar");
    assert_eq!(field.signals(), vec!["invalid", "invalid-format"]);
    assert!(scope.has_marker("invalid-format"));
}

#[test]
fn sub_domain_format_is_inverted() {
    let (scope, field) = form();
    Selection::of(field.clone()).validates_format(formats::sub_domain());

    field.change("my-sub");
    assert_eq!(field.signals(), vec!["valid", "valid-format"]);

    field.clear_triggered();
    field.change("bad sub!");
    assert_eq!(field.signals(), vec!["invalid", "invalid-format"]);
    assert!(scope.has_marker("invalid-format"));
}

#[test]
fn email_format() {
    let (scope, field) = form();
    Selection::of(field.clone()).validates_format(formats::email());

    field.change("someone@example.com");
    assert!(!scope.has_marker("invalid-format"));

    field.change("someone at example");
    assert!(scope.has_marker("invalid-format"));
}

#[test]
fn length_bounds_are_inclusive() {
    let (scope, field) = form();
    Selection::of(field.clone())
        .validates_length(RuleOptions::new().minimum(3).maximum(5));

    for (value, valid) in [("abc", true), ("ab", false), ("abcde", true), ("abcdef", false)] {
        field.change(value);
        assert_eq!(scope.has_marker("invalid-length"), !valid, "value {value:?}");
    }
}

#[test]
fn numericality() {
    let (scope, field) = form();
    Selection::of(field.clone()).validates_numericality(RuleOptions::new());

    field.change("1,234");
    assert_eq!(field.signals(), vec!["valid", "valid-numericality"]);

    field.clear_triggered();
    field.change("12a");
    assert_eq!(field.signals(), vec!["invalid", "invalid-numericality"]);
    assert!(scope.has_marker("invalid-numericality"));
}

#[test]
fn numericality_only_integer() {
    let (scope, field) = form();
    Selection::of(field.clone())
        .validates_numericality(RuleOptions::new().only_integer(true));

    field.change("1.5");
    assert!(scope.has_marker("invalid-numericality"));

    field.change("-42");
    assert!(!scope.has_marker("invalid-numericality"));
}

#[test]
fn fixed_set_uniqueness() {
    let (scope, field) = form();
    Selection::of(field.clone()).validates_uniqueness(
        RuleOptions::new().source(Source::fixed(["taken1", "taken2"])),
    );

    field.change("taken1");
    assert!(field.signals().contains(&"invalid-uniqueness".to_string()));
    assert!(scope.has_marker("invalid-uniqueness"));

    field.clear_triggered();
    field.change("free");
    assert_eq!(
        field.signals(),
        vec!["valid", "valid-uniqueness", "valid", "valid-uniqueness"]
    );
    assert!(!scope.has_marker("invalid-uniqueness"));
}

#[test]
fn custom_rule() {
    let (scope, field) = form();
    Selection::of(field.clone()).validates(
        RuleOptions::new()
            .invalid_class("bad-colour")
            .validates_with(|f| f.value().starts_with('#')),
    );

    field.change("red");
    assert_eq!(field.signals(), vec!["invalid"]);
    assert!(scope.has_marker("bad-colour"));

    field.trigger("blur");
    field.clear_triggered();
    field.change("#f00");
    assert_eq!(field.signals(), vec!["valid"]);
    assert!(!scope.has_marker("bad-colour"));
}

#[test]
fn custom_events_and_class() {
    let (scope, field) = form();
    Selection::of(field.clone()).validates_length(
        RuleOptions::new()
            .minimum(2)
            .validates_on(["keyup"])
            .invalid_class("too-short"),
    );

    field.change("a");
    assert!(field.signals().is_empty());

    field.trigger("keyup");
    assert_eq!(field.signals(), vec!["invalid", "invalid-length"]);
    assert_eq!(scope.markers(), vec!["too-short"]);
}

#[test]
fn when_gate_suppresses_evaluation() {
    let (scope, field) = form();
    let optin = Arc::new(MemoryField::checkbox(false));
    let gate = optin.clone();
    Selection::of(field.clone()).validates_presence(
        RuleOptions::new().when(move |_| gate.is_checked()),
    );

    field.change("");
    assert!(field.signals().is_empty());
    assert!(scope.markers().is_empty());

    optin.set_checked(true);
    field.change("");
    assert_eq!(field.signals(), vec!["invalid", "invalid-presence"]);
}

#[test]
fn rules_sharing_a_scope_last_write_wins() {
    let scope = MemoryScope::new("fieldset");
    let first = Arc::new(MemoryField::new("").within(scope.clone()));
    let second = Arc::new(MemoryField::new("").within(scope.clone()));

    let fields: Vec<Arc<dyn Field>> = vec![first.clone(), second.clone()];
    Selection::new(fields).validates_presence(RuleOptions::new());

    first.change("");
    assert!(scope.has_marker("invalid-presence"));

    // No counting: the second field clears what the first one set.
    second.change("filled");
    assert!(!scope.has_marker("invalid-presence"));
}

#[test]
fn nearest_matching_scope_is_marked() {
    let section = MemoryScope::new("section");
    let fieldset = MemoryScope::new("fieldset");
    let field = Arc::new(
        MemoryField::new("")
            .within(fieldset.clone())
            .within(section.clone()),
    );

    Selection::of(field.clone())
        .validates_presence(RuleOptions::new())
        .validates_length(RuleOptions::new().minimum(1).scope("section"));

    field.change("");
    assert_eq!(fieldset.markers(), vec!["invalid-presence"]);
    assert_eq!(section.markers(), vec!["invalid-length"]);
}

#[test]
fn signals_reach_listeners() {
    let (_scope, field) = form();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    field.on(
        &["invalid-presence".to_string(), "valid-presence".to_string()],
        Arc::new(move |event: &FieldEvent| sink.lock().unwrap().push(event.name.clone())),
    );

    Selection::of(field.clone()).validates_presence(RuleOptions::new());
    field.change("");
    field.change("x");

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["invalid-presence", "valid-presence"]
    );
}

#[test]
fn reevaluation_does_not_toggle_marker() {
    let (scope, field) = form();
    Selection::of(field.clone()).validates_presence(RuleOptions::new());

    field.change("");
    field.change("");
    assert_eq!(scope.markers(), vec!["invalid-presence"]);
    assert_eq!(
        field.signals(),
        vec![
            "invalid",
            "invalid-presence",
            "invalid",
            "invalid-presence"
        ]
    );
}
