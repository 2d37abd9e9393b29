//! Property-based tests for the substitution parser

use pbxlint::ast::SourceLocation;
use pbxlint::variable::{VarParser, VariableUsage};
use pbxlint::Diagnostics;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Ref(String),
    Slice(String, i64, Option<u64>),
    /// Slice whose start, and optionally length, are themselves variables.
    DynSlice(String, String, Option<String>),
    Func(String, String),
}

impl Segment {
    fn render(&self) -> String {
        match self {
            Segment::Literal(text) => text.clone(),
            Segment::Ref(name) => format!("${{{}}}", name),
            Segment::Slice(name, start, None) => format!("${{{}:{}}}", name, start),
            Segment::Slice(name, start, Some(length)) => {
                format!("${{{}:{}:{}}}", name, start, length)
            }
            Segment::DynSlice(name, start, None) => format!("${{{}:${{{}}}}}", name, start),
            Segment::DynSlice(name, start, Some(length)) => {
                format!("${{{}:${{{}}}:${{{}}}}}", name, start, length)
            }
            Segment::Func(name, arg) => format!("${{{}(${{{}}})}}", name, arg),
        }
    }
}

fn name() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9_]{0,6}"
}

fn segment() -> impl Strategy<Value = Segment> {
    prop_oneof![
        "[a-z0-9+ ,]{1,4}".prop_map(Segment::Literal),
        name().prop_map(Segment::Ref),
        (name(), 1i64..9, prop::option::of(1u64..9))
            .prop_map(|(name, start, length)| Segment::Slice(name, start, length)),
        (name(), name(), prop::option::of(name()))
            .prop_map(|(name, start, length)| Segment::DynSlice(name, start, length)),
        (name(), name()).prop_map(|(func, arg)| Segment::Func(func, arg)),
    ]
}

proptest! {
    #[test]
    fn display_reproduces_well_formed_input(segments in prop::collection::vec(segment(), 0..6)) {
        let text: String = segments.iter().map(Segment::render).collect();
        let sink = Diagnostics::new();
        let mut usage = VariableUsage::new();
        let location = SourceLocation::synthetic("prop");

        let var = VarParser::new(&sink, &mut usage, location).parse(&text).unwrap();

        prop_assert_eq!(var.to_string(), text);
        prop_assert!(sink.is_empty());
    }

    #[test]
    fn every_referenced_name_is_recorded(segments in prop::collection::vec(segment(), 1..6)) {
        let text: String = segments.iter().map(Segment::render).collect();
        let sink = Diagnostics::new();
        let mut usage = VariableUsage::new();
        VarParser::new(&sink, &mut usage, SourceLocation::synthetic("prop"))
            .parse(&text)
            .unwrap();

        for segment in &segments {
            match segment {
                Segment::Ref(name) | Segment::Slice(name, _, _) => {
                    prop_assert!(!usage.variable_locations(name).is_empty());
                }
                Segment::DynSlice(name, start, length) => {
                    prop_assert!(!usage.variable_locations(name).is_empty());
                    prop_assert!(!usage.variable_locations(start).is_empty());
                    if let Some(length) = length {
                        prop_assert!(!usage.variable_locations(length).is_empty());
                    }
                }
                Segment::Func(func, arg) => {
                    prop_assert!(!usage.function_locations(func).is_empty());
                    prop_assert!(!usage.variable_locations(arg).is_empty());
                }
                Segment::Literal(_) => {}
            }
        }
    }
}
