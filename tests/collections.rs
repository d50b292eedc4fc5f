// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use insta::assert_snapshot;
use present::{
    Error, Model, Present, PresenterType, Projection, Record, Registry, ResultSet, Rule, Value,
    fields,
};

fn present() -> Present {
    let mut registry = Registry::new();
    registry.register(
        PresenterType::model("Article")
            .rule("state", Rule::replace([("d", "draft"), ("p", "published")]))
            .field("headline", |this| {
                let title = this.get("title")?;
                Ok(Value::from(title.to_key().to_uppercase()))
            }),
    );
    Present::new(registry)
}

fn article(id: i64, title: &str, state: &str) -> Record {
    Record::new("Model_Article")
        .with("id", id)
        .with("title", title)
        .with("state", state)
        .with_enum("state", ["d", "p"])
}

#[test]
fn list_flattens_three_rows_in_order() {
    let list = present().from_list(vec![
        article(1, "one", "d").into_ref().into(),
        fields! { "id" => 2, "title" => "two" }.into(),
        article(3, "three", "p").into_ref().into(),
    ]);

    let json = serde_json::to_string_pretty(&list.as_array(None).unwrap()).unwrap();
    assert_snapshot!(json, @r#"
    [
      {
        "id": 1,
        "title": "one",
        "state": "draft",
        "headline": "ONE"
      },
      {
        "id": 2,
        "title": "two"
      },
      {
        "id": 3,
        "title": "three",
        "state": "published",
        "headline": "THREE"
      }
    ]
    "#);
}

#[test]
fn list_rejects_writes() {
    let mut list = present().from_list(vec![Value::from(1), Value::from(2), Value::from(3)]);
    for position in 0..4 {
        assert_eq!(list.offset_set(position, Value::Null), Err(Error::ReadOnly));
        assert_eq!(list.offset_unset(position), Err(Error::ReadOnly));
    }
    assert_eq!(
        list.iter().collect::<Vec<_>>(),
        [Value::from(1), Value::from(2), Value::from(3)]
    );
}

#[test]
fn list_keys_by_field() {
    let list = present().from_list(vec![
        article(1, "one", "d").into_ref().into(),
        article(2, "two", "p").into_ref().into(),
    ]);
    let indexed = list.as_indexed_array("title").unwrap();
    assert_eq!(indexed.keys().collect::<Vec<_>>(), ["one", "two"]);
    assert_eq!(
        indexed["two"].as_presentation().unwrap().get("state").unwrap(),
        Value::from("published")
    );

    let keyed = list.as_array(Some("id")).unwrap();
    assert_eq!(keyed["1"]["headline"], "ONE");
}

#[test]
fn enum_values_are_translated_as_a_set() {
    let model = present().from_model(article(1, "one", "d"));
    assert_eq!(
        model.get("states").unwrap(),
        Value::Map(fields! { "d" => "draft", "p" => "published" })
    );
    assert_eq!(model.get("state").unwrap(), Value::from("draft"));
}

#[test]
fn cursor_presents_models_per_position() {
    let present = present();
    let rows: ResultSet = [article(1, "one", "d"), article(2, "two", "p")]
        .into_iter()
        .map(|record| Value::from(record.into_ref()))
        .collect();
    let mut cursor = present.from_cursor(rows);

    let mut headlines = Vec::new();
    while cursor.valid().unwrap() {
        let row = cursor.current().unwrap().unwrap();
        headlines.push(row.as_presentation().unwrap().get("headline").unwrap());
        cursor.next().unwrap();
    }
    assert_eq!(headlines, [Value::from("ONE"), Value::from("TWO")]);

    cursor.rewind().unwrap();
    let first = cursor.current().unwrap().unwrap();
    assert_eq!(cursor.offset_get(0).unwrap().unwrap(), first);
    assert_eq!(cursor.get("state", Value::Null).unwrap(), Value::from("draft"));

    let Projection::Keyed(titles) = cursor.as_array(Some("id"), Some("title")).unwrap() else {
        panic!("expected a keyed projection");
    };
    assert_eq!(titles["2"], Value::from("two"));
}

#[test]
fn model_presentation_serializes_related_models() {
    let author = Record::new("Model_User").with("name", "Ann");
    let post = article(7, "seven", "p").with_related("author", author);
    let presentation = present().from_model(post);

    assert!(presentation.model().unwrap().has("author"));
    assert_eq!(
        serde_json::to_value(&presentation).unwrap(),
        serde_json::json!({
            "id": 7,
            "title": "seven",
            "state": "published",
            "author": { "name": "Ann" },
            "headline": "SEVEN",
        })
    );
}
