// (c) Copyright 2025 Helsing GmbH. All rights reserved.
/// Convenience macro for creating [`Fields`](crate::Fields).
///
/// Values go through `Value::from`, so nested `fields!` and `vec!` literals work as
/// expected. Keys keep their written order.
///
/// ```rust
/// # use present::{fields, Value};
/// let post = fields! {
///     "title" => "Hello",
///     "tags" => vec!["rust", "news"],
///     "author" => fields! { "name" => "Alice" },
/// };
/// assert_eq!(post.path("author.name"), Some(&Value::from("Alice")));
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::default()
    };
    ($($k:expr => $v:expr),+ $(,)?) => {{
        let mut fields = $crate::Fields::default();
        $( fields.insert($k, $crate::Value::from($v)); )+
        fields
    }};
}
