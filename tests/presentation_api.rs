// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use present::{
    Error, FieldKind, Present, PresenterType, Record, Registry, Rule, Value, fields,
};
use std::{cell::Cell, rc::Rc};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A registry with a `Counted` data type whose `total` field counts its evaluations.
fn counted(calls: &Rc<Cell<usize>>) -> Present {
    let counter = Rc::clone(calls);
    let mut registry = Registry::new();
    registry.register(
        PresenterType::data("Counted")
            .field("total", move |this| {
                counter.set(counter.get() + 1);
                let a = this.get("a")?.as_int().unwrap_or(0);
                let b = this.get("b")?.as_int().unwrap_or(0);
                Ok(Value::from(a + b))
            })
            .rule("label", Rule::map(|v| Ok(Value::from(format!("#{v}"))))),
    );
    Present::new(registry)
}

#[test]
fn computed_fields_are_evaluated_once() {
    init_tracing();
    let calls = Rc::new(Cell::new(0));
    let present = counted(&calls);
    let data = present.from_data("Counted", fields! { "a" => 1, "b" => 2 });

    assert_eq!(data.get("total").unwrap(), Value::from(3));
    assert_eq!(data.get("total").unwrap(), Value::from(3));
    assert_eq!(data.raw("total").unwrap(), Value::from(3));
    assert_eq!(calls.get(), 1);

    data.clear_cache();
    assert_eq!(data.get("total").unwrap(), Value::from(3));
    assert_eq!(calls.get(), 2);
}

#[test]
fn rebinding_invalidates_cached_fields() {
    let calls = Rc::new(Cell::new(0));
    let present = counted(&calls);
    let mut data = present.from_data("Counted", fields! { "a" => 1, "b" => 2, "label" => "x" });
    assert_eq!(data.get("total").unwrap(), Value::from(3));
    assert_eq!(data.get("label").unwrap(), Value::from("#x"));

    data.set_source(fields! { "a" => 10, "b" => 20, "label" => "y" });
    assert_eq!(data.get("total").unwrap(), Value::from(30));
    assert_eq!(data.get("label").unwrap(), Value::from("#y"));
    assert_eq!(calls.get(), 2);
}

#[test]
fn rules_run_left_to_right() {
    let seen = Rc::new(Cell::new(0));
    let second_saw = Rc::clone(&seen);
    let mut registry = Registry::new();
    registry.register(
        PresenterType::data("Chain")
            .rule("n", Rule::map(|v| Ok(Value::from(v.as_int().unwrap_or(0) * 10))))
            .rule(
                "n",
                Rule::map(move |v| {
                    second_saw.set(v.as_int().unwrap_or(-1));
                    Ok(Value::from(v.as_int().unwrap_or(0) + 1))
                }),
            )
            .rule("code", Rule::new("replace").arg(fields! { "x" => "y" })),
    );
    let present = Present::new(registry);
    let data = present.from_data(
        "Chain",
        fields! { "n" => 4, "code" => "x", "other" => "x" },
    );

    assert_eq!(data.get("n").unwrap(), Value::from(41));
    assert_eq!(seen.get(), 40);
    assert_eq!(data.get("code").unwrap(), Value::from("y"));
    assert_eq!(data.get("other").unwrap(), Value::from("x"));

    let unchanged = present.from_data("Chain", fields! { "code" => "z" });
    assert_eq!(unchanged.get("code").unwrap(), Value::from("z"));

    let presenter = data.presenter_type();
    assert_eq!(presenter.describe("n"), FieldKind::RuleChain { steps: 2 });
    assert_eq!(presenter.describe("other"), FieldKind::Direct);
}

#[test]
fn failing_callbacks_abort_the_structure() {
    let mut registry = Registry::new();
    registry.register(
        PresenterType::data("Broken")
            .field_callback("label", "this::missing", [])
            .rule("name", Rule::new("no_such_function")),
    );
    let present = Present::new(registry);
    let data = present.from_data("Broken", fields! { "name" => "n" });

    assert!(matches!(data.get("label"), Err(Error::Invocation { .. })));
    assert!(matches!(data.get("name"), Err(Error::Invocation { .. })));
    assert!(data.as_structure().is_err());
    assert!(serde_json::to_value(&data).is_err());
}

#[test]
fn nested_mappings_flatten_recursively() {
    let present = Present::default();
    let data = present.from_data("Anything", fields! { "a" => 1, "b" => fields! { "c" => 2 } });

    let b = data.get("b").unwrap();
    assert!(b.as_presentation().is_some());
    assert_eq!(
        serde_json::Value::Object(data.as_structure().unwrap()),
        serde_json::json!({ "a": 1, "b": { "c": 2 } })
    );
}

#[test]
fn names_resolve_with_fallback() {
    let mut registry = Registry::new();
    let foo = registry.register(PresenterType::data("Namespace\\Foo"));
    assert_eq!(foo.name(), "Namespace\\Presentation_Data_Foo");
    assert!(Rc::ptr_eq(
        &registry.resolve("Namespace\\Foo", "Presentation_Data_").unwrap(),
        &foo
    ));

    let present = Present::new(registry);
    let found = present.from_data("Namespace\\Foo", fields! {});
    assert!(Rc::ptr_eq(found.presenter_type(), &foo));
    let fallback = present.from_data("Namespace\\Bar", fields! {});
    assert_eq!(fallback.presenter_type().name(), "Presentation_Data");
}

#[test]
fn tagged_mappings_build_models() {
    init_tracing();
    let mut registry = Registry::new();
    registry.register(
        PresenterType::model("Comment")
            .rule("body", Rule::map(|v| Ok(Value::from(v.to_key().trim().to_owned())))),
    );
    registry.register_model("Comment", || Box::new(Record::new("Model_Comment")));
    let present = Present::new(registry);

    let data = present.from_data(
        "Thread",
        fields! {
            "first" => fields! { "_model" => "Comment", "body" => "  hi  " },
        },
    );
    let first = data.get("first").unwrap();
    let comment = first.as_presentation().unwrap();
    assert_eq!(comment.presenter_type().name(), "Presentation_Model_Comment");
    assert_eq!(comment.get("body").unwrap(), Value::from("hi"));
    assert_eq!(
        serde_json::Value::Object(data.as_structure().unwrap()),
        serde_json::json!({ "first": { "body": "hi" } })
    );
}
