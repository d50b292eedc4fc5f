// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! This example presents the front page of a small blog.
//! Posts come from a result set of models, authors are related models, and the sidebar is a
//! plain mapping that carries a tagged entry which is turned into a model on access.
use present::{
    Present, PresenterType, Record, Registry, ResultSet, Rule, Value, fields,
};
use std::error::Error;

fn registry() -> Registry {
    let mut registry = Registry::new();

    // Posts store their state as a single letter; the presenter spells it out and adds a
    // computed teaser built from the already presented title.
    registry.register(
        PresenterType::model("Post")
            .rule("state", Rule::replace([("d", "draft"), ("p", "published")]))
            .rule("title", Rule::map(|v| Ok(Value::from(v.to_key().trim().to_owned()))))
            .field("teaser", |this| {
                let title = this.get("title")?;
                let author = this.get("author")?;
                let name = match author.as_presentation() {
                    Some(author) => author.get("name")?.to_key(),
                    None => "anonymous".to_owned(),
                };
                Ok(Value::from(format!("{title}, by {name}")))
            }),
    );
    registry.register(
        PresenterType::model("User").rule("name", Rule::map(|v| Ok(v.to_key().to_uppercase().into()))),
    );
    registry.register(
        PresenterType::data("Sidebar").field_callback("motto", "self::motto", []).static_fn(
            "motto",
            |_| Ok(Value::from("write less, ship more")),
        ),
    );
    registry.register_model("Post", || Box::new(Record::new("Model_Post")));
    registry
}

fn post(id: i64, title: &str, state: &str, author: &str) -> Value {
    Record::new("Model_Post")
        .with("id", id)
        .with("title", title)
        .with("state", state)
        .with_enum("state", ["d", "p"])
        .with_related("author", Record::new("Model_User").with("name", author))
        .into_ref()
        .into()
}

fn main() -> Result<(), Box<dyn Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let present = Present::new(registry());

    // FRONT PAGE: a cursor over the posts of the current query.
    println!("1. Walking the result set.");
    let rows: ResultSet = [
        post(1, "  Hello  ", "p", "ann"),
        post(2, "Drafting", "d", "bob"),
    ]
    .into_iter()
    .collect();
    let mut posts = present.from_cursor(rows);
    while posts.valid()? {
        println!(
            "   #{} {} ({})",
            posts.get("id", Value::Null)?,
            posts.get("teaser", Value::Null)?,
            posts.get("state", Value::Null)?,
        );
        posts.next()?;
    }

    println!("2. Projecting titles by id.");
    println!("   {:?}", posts.as_array(Some("id"), Some("title"))?);

    // SIDEBAR: a mapping whose `featured` entry names a model to build.
    println!("3. Presenting the sidebar.");
    let sidebar = present.from_data(
        "Sidebar",
        fields! {
            "links" => vec!["/about", "/feed"],
            "featured" => fields! { "_model" => "Post", "id" => 3, "title" => " Pinned ", "state" => "p" },
        },
    );
    println!("{}", serde_json::to_string_pretty(&sidebar)?);

    // ARCHIVE: an in-memory list keyed by title.
    println!("4. Flattening the archive.");
    let archive = present.from_list(vec![
        post(10, "Old news", "p", "ann"),
        fields! { "id" => 11, "title" => "Imported" }.into(),
    ]);
    println!("{}", serde_json::to_string_pretty(&archive.as_array(Some("title"))?)?);

    Ok(())
}
