//! Property-based tests for the translator
//!
//! Plain prose must come through untouched, native environments must wrap
//! exactly what they were given, and no input (well-formed or not) may make the
//! translator panic or report an error outside the source.

use hltex::{translate, translate_fragment};
use proptest::prelude::*;

const BUILTIN_NAMES: &[&str] = &["colon", "docclass", "pysplice", "verb", "verbatim"];

/// A line of prose without any of the dialect's special characters
fn plain_line_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9 ,.!?]{0,30}"
}

fn plain_text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(plain_line_strategy(), 1..10).prop_map(|lines| lines.join("\n"))
}

/// Names that are not registered, so they pass through as native syntax
fn native_name_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}".prop_filter("built-in name", |name| {
        !BUILTIN_NAMES.contains(&name.as_str())
    })
}

fn indent_unit_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(" ".to_string()),
        Just("  ".to_string()),
        Just("    ".to_string()),
        Just("\t".to_string()),
    ]
}

/// Lines a document body is typically made of, all at the root level
fn body_line_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        plain_line_strategy(),
        (native_name_strategy(), plain_line_strategy())
            .prop_map(|(name, body)| format!("\\{}: {}", name, body)),
        (native_name_strategy(), plain_line_strategy())
            .prop_map(|(name, arg)| format!("\\{}{{{}}} and more", name, arg)),
        plain_line_strategy().prop_map(|comment| format!("% {}", comment)),
        Just(String::new()),
    ]
}

proptest! {
    #[test]
    fn test_plain_text_is_unchanged(text in plain_text_strategy()) {
        prop_assert_eq!(translate_fragment(&text).unwrap(), text);
    }

    #[test]
    fn test_plain_document_is_wrapped(text in plain_text_strategy()) {
        let source = format!("===\n{}", text);
        prop_assert_eq!(
            translate(&source).unwrap(),
            format!("\\begin{{document}}\n{}\n\\end{{document}}", text)
        );
    }

    #[test]
    fn test_native_oneliner(name in native_name_strategy(), body in plain_line_strategy()) {
        let source = format!("\\{}: {}", name, body);
        prop_assert_eq!(
            translate_fragment(&source).unwrap(),
            format!("\\begin{{{0}}}{1}\\end{{{0}}}", name, body)
        );
    }

    #[test]
    fn test_native_block(
        name in native_name_strategy(),
        unit in indent_unit_strategy(),
        lines in prop::collection::vec(plain_line_strategy(), 1..6),
    ) {
        let body = lines
            .iter()
            .map(|line| format!("{}{}", unit, line))
            .collect::<Vec<_>>()
            .join("\n");
        let source = format!("\\{}:\n{}", name, body);
        prop_assert_eq!(
            translate_fragment(&source).unwrap(),
            format!("\\begin{{{0}}}\n{1}\n\\end{{{0}}}", name, body)
        );
    }

    #[test]
    fn test_root_level_documents_translate(
        lines in prop::collection::vec(body_line_strategy(), 1..12),
    ) {
        let source = format!("\\docclass{{article}}\n===\n{}", lines.join("\n"));
        prop_assert!(translate(&source).is_ok(), "failed on {:?}", source);
    }

    #[test]
    fn test_never_panics_on_dialect_characters(input in "[\\\\{}\\[\\]%: \n\t=ab]{0,40}") {
        if let Err(err) = translate(&input) {
            let location = err.location.expect("errors are located");
            prop_assert!(location.offset <= input.len());
        }
        let _ = translate_fragment(&input);
    }

    #[test]
    fn test_never_panics_on_arbitrary_text(input in "\\PC{0,80}") {
        if let Err(err) = translate_fragment(&input) {
            if let Some(location) = err.location {
                prop_assert!(location.offset <= input.len());
            }
        }
    }
}
