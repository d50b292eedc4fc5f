// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Helpers for namespaced type names.
//!
//! Presenter types and models are named like `Blog\Admin\Post`: an optional namespace made of
//! `\`-separated segments followed by the class-local part. Prefixes such as
//! `Presentation_Model_` are always applied to the class-local part, leaving the namespace
//! untouched, so that `Blog\Post` and `Blog\Presentation_Model_Post` live side by side.

/// Separator between namespace segments and the class-local part.
pub const DELIMITER: char = '\\';

/// Returns the namespace of a name, or `None` for a global name.
///
/// ```rust
/// # use present::names::extract_namespace;
/// assert_eq!(extract_namespace("Root\\Test\\Foo"), Some("Root\\Test"));
/// assert_eq!(extract_namespace("Foo"), None);
/// ```
pub fn extract_namespace(name: &str) -> Option<&str> {
    name.rsplit_once(DELIMITER).map(|(namespace, _)| namespace)
}

/// Returns the class-local part of a name.
///
/// ```rust
/// # use present::names::extract_class_name;
/// assert_eq!(extract_class_name("Root\\Test\\Foo"), "Foo");
/// ```
pub fn extract_class_name(name: &str) -> &str {
    name.rsplit_once(DELIMITER).map_or(name, |(_, class)| class)
}

/// Returns the module of a name, that is, its second segment.
///
/// ```rust
/// # use present::names::extract_module_name;
/// assert_eq!(extract_module_name("Root\\Test\\Foo"), Some("Test"));
/// assert_eq!(extract_module_name("Foo"), None);
/// ```
pub fn extract_module_name(name: &str) -> Option<&str> {
    name.split(DELIMITER).nth(1)
}

/// Qualifies a name with a namespace.
pub fn add_namespace(name: &str, namespace: &str) -> String {
    format!("{namespace}{DELIMITER}{name}")
}

/// Returns true if the name carries a namespace.
///
/// This is also true for names explicitly placed in the global namespace, like `\Foo`.
pub fn has_namespace(name: &str) -> bool {
    extract_namespace(name).is_some()
}

/// Prepends `prefix` to the class-local part of `name`.
///
/// ```rust
/// # use present::names::add_class_prefix;
/// assert_eq!(add_class_prefix("Namespace\\Foo", "Data_"), "Namespace\\Data_Foo");
/// assert_eq!(add_class_prefix("Foo", "Data_"), "Data_Foo");
/// ```
pub fn add_class_prefix(name: &str, prefix: &str) -> String {
    let class = format!("{prefix}{}", extract_class_name(name));
    match extract_namespace(name) {
        Some(namespace) if !namespace.is_empty() => add_namespace(&class, namespace),
        _ => class,
    }
}

/// Removes `prefix` from the class-local part of `name`, ignoring case.
///
/// Names that do not carry the prefix are returned unchanged.
///
/// ```rust
/// # use present::names::remove_class_prefix;
/// assert_eq!(remove_class_prefix("Root\\Test\\class_Foo", "Class_"), "Root\\Test\\Foo");
/// assert_eq!(remove_class_prefix("Foo", "Class_"), "Foo");
/// ```
pub fn remove_class_prefix(name: &str, prefix: &str) -> String {
    let class = extract_class_name(name);
    let class = match class.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => &class[prefix.len()..],
        _ => class,
    };
    match extract_namespace(name) {
        Some(namespace) if !namespace.is_empty() => add_namespace(class, namespace),
        _ => class.to_owned(),
    }
}
