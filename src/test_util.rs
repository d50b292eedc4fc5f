// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Property-based testing support.
use crate::{Fields, Value};
use quickcheck::{Arbitrary, Gen};

// Depth of generated nested lists and mappings.
const MAX_DEPTH: usize = 2;

impl Arbitrary for Value {
    /// Generates plain data: scalars, lists and mappings. Never generates models,
    /// presentations or the missing-key sentinel, and floats are always finite.
    fn arbitrary(g: &mut Gen) -> Self {
        arbitrary_value(g, MAX_DEPTH)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        match self {
            Value::Bool(b) => Box::new(b.shrink().map(Value::Bool)),
            Value::Int(i) => Box::new(i.shrink().map(Value::Int)),
            Value::Float(f) => Box::new(f.shrink().filter(|f| f.is_finite()).map(Value::Float)),
            Value::String(s) => Box::new(s.shrink().map(Value::String)),
            Value::List(items) => Box::new(items.shrink().map(Value::List)),
            Value::Map(fields) => {
                let entries = fields
                    .iter()
                    .map(|(k, v)| (k.to_owned(), v.clone()))
                    .collect::<Vec<_>>();
                Box::new(
                    entries
                        .shrink()
                        .map(|entries| Value::Map(entries.into_iter().collect())),
                )
            }
            _ => quickcheck::empty_shrinker(),
        }
    }
}

fn arbitrary_value(g: &mut Gen, depth: usize) -> Value {
    let choices: &[u8] = if depth == 0 {
        &[0, 1, 2, 3, 4]
    } else {
        &[0, 1, 2, 3, 4, 5, 6]
    };
    match g.choose(choices).copied().unwrap_or(0) {
        0 => Value::Null,
        1 => Value::Bool(bool::arbitrary(g)),
        2 => Value::Int(i64::arbitrary(g)),
        3 => {
            let f = f64::arbitrary(g);
            Value::Float(if f.is_finite() { f } else { 0.0 })
        }
        4 => Value::String(String::arbitrary(g)),
        5 => {
            let len = usize::arbitrary(g) % 4;
            Value::List((0..len).map(|_| arbitrary_value(g, depth - 1)).collect())
        }
        _ => Value::Map(arbitrary_fields(g, depth - 1)),
    }
}

/// Generates an associative mapping: keys are never purely numeric.
fn arbitrary_fields(g: &mut Gen, depth: usize) -> Fields {
    let len = usize::arbitrary(g) % 4;
    (0..len)
        .map(|_| {
            let key = format!("k{}", u8::arbitrary(g));
            (key, arbitrary_value(g, depth))
        })
        .collect()
}
