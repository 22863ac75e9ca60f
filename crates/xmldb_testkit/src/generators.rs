//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use proptest::prelude::*;
use std::collections::BTreeMap;

/// Strategy for generating valid document names.
pub fn document_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_.-]{0,23}").expect("Invalid regex")
}

/// Strategy for generating XML element names.
pub fn element_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9]{0,7}")
        .expect("Invalid regex")
        .prop_filter("Names starting with xml are reserved", |s| !s.starts_with("xml"))
}

/// Strategy for generating text content, including characters that need
/// escaping.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 <>&'\"]{0,32}").expect("Invalid regex")
}

/// Escapes text for use in element content or attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Strategy for generating well-formed XML documents: a root element with
/// up to eight text-bearing children.
pub fn xml_document_strategy() -> impl Strategy<Value = String> {
    (
        element_name_strategy(),
        prop::collection::vec((element_name_strategy(), text_strategy()), 0..8),
    )
        .prop_map(|(root, children)| {
            let mut xml = format!("<{root}>");
            for (name, text) in children {
                xml.push_str(&format!("<{name}>{}</{name}>", escape_xml(&text)));
            }
            xml.push_str(&format!("</{root}>"));
            xml
        })
}

/// Strategy for generating a set of uniquely named documents.
pub fn document_set_strategy(max: usize) -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(document_name_strategy(), xml_document_strategy(), 0..max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaping() {
        assert_eq!(escape_xml("a<b & 'c'"), "a&lt;b &amp; &apos;c&apos;");
    }

    proptest! {
        #[test]
        fn document_names_are_valid(name in document_name_strategy()) {
            prop_assert!(!name.is_empty());
            prop_assert!(!name.contains('\0'));
        }

        #[test]
        fn documents_have_matching_root(xml in xml_document_strategy()) {
            prop_assert!(xml.starts_with('<'));
            prop_assert!(xml.ends_with('>'));
            prop_assert!(!xml.contains('\0'));
        }
    }
}
