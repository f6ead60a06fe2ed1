//! Round-trip validation for XML
//!
//! Whatever the input, the leaves of the tree must tile the parsed range so
//! that their text reproduces it byte for byte.

use proptest::prelude::*;
use xmlcst_core::cst::round_trip::{DifferenceKind, RoundTripValidator};
use xmlcst_core::cst::{IncrementalUpdater, TextEdit};
use xmlcst_core::{parse_document, parse_dtd_fragment, parse_tag_fragment};

const SAMPLES: &[&str] = &[
    "",
    "   ",
    "\n\t\r\n",
    "<a><b/></a>",
    "<a><b></a>",
    "<a><!-- x --></a>",
    "<!DOCTYPE foo SYSTEM \"bar\"",
    "<?xml version=\"1.0\"?>\n<!-- head -->\n<r a='1' b=\"&amp;\">t &#65; <![CDATA[x]]><?pi d?></r>\n",
    "<!DOCTYPE r [\n  <!ELEMENT r (a|b)*>\n  <!ATTLIST r x CDATA #IMPLIED>\n  %ext;\n]><r/>",
    "<r><a>one</b><c>two</r>",
    "<<>>&;]]><!--<!---->",
];

#[test]
fn test_samples_round_trip() {
    let validator = RoundTripValidator::new();
    for source in SAMPLES {
        let result = validator.validate_source(source).unwrap();
        assert!(result.is_valid(), "{source:?}: {:?}", result.issues());
        assert_eq!(result.reconstructed, *source);
        assert!(result.differences.is_empty());
        assert_eq!(result.first_difference, None);
    }
}

#[test]
fn test_validator_on_sub_range() {
    let source = "junk<a>x</a>junk";
    let tree = parse_document(source, 4..12).unwrap();
    let result = RoundTripValidator::new().validate(&tree);
    assert!(result.is_valid());
    assert_eq!(result.original, "<a>x</a>");
}

#[test]
fn test_difference_kinds_are_distinct() {
    assert_ne!(DifferenceKind::Gap, DifferenceKind::Overlap);
    assert_ne!(DifferenceKind::Gap, DifferenceKind::OutOfRange);
}

#[test]
fn test_incremental_edits_keep_trees_lossless() {
    let source = "<doc>\n  <item id='1'>first</item>\n  <item id='2'>second</item>\n</doc>\n";
    let tree = parse_document(source, 0..source.len()).unwrap();
    let updater = IncrementalUpdater::new();

    let start = source.find("first").unwrap();
    let edit = TextEdit::replace_range(start..start + 5, "1st");
    let result = updater.apply_edit(&tree, &edit).unwrap();
    assert!(!result.full_reparse);

    let span = usize::from(result.range.start())..usize::from(result.range.end());
    assert_eq!(result.tree.text(), &result.source[span]);
    assert!(RoundTripValidator::new().validate(&result.tree).is_valid());
}

/// Snap `index` down to the nearest char boundary of `source`
fn floor_boundary(source: &str, index: usize) -> usize {
    let mut index = index.min(source.len());
    while !source.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Strings rich in markup delimiters, so the parser sees more than text
fn markup_soup() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            Just("<".to_string()),
            Just(">".to_string()),
            Just("</".to_string()),
            Just("/>".to_string()),
            Just("<!--".to_string()),
            Just("-->".to_string()),
            Just("<![CDATA[".to_string()),
            Just("]]>".to_string()),
            Just("<?".to_string()),
            Just("?>".to_string()),
            Just("<!DOCTYPE".to_string()),
            Just("<!ELEMENT".to_string()),
            Just("<!ATTLIST".to_string()),
            Just("<!ENTITY".to_string()),
            Just("<![".to_string()),
            Just("[".to_string()),
            Just("]".to_string()),
            Just("(".to_string()),
            Just(")".to_string()),
            Just("|".to_string()),
            Just("%p;".to_string()),
            Just("&e;".to_string()),
            Just("&#1;".to_string()),
            Just("=".to_string()),
            Just("\"".to_string()),
            Just("'".to_string()),
            Just(" ".to_string()),
            Just("\n".to_string()),
            "[a-z]{1,3}",
            "\\PC{1,2}",
        ],
        0..40,
    )
    .prop_map(|pieces| pieces.concat())
}

proptest! {
    #[test]
    fn prop_document_round_trip(source in any::<String>()) {
        let tree = parse_document(&source, 0..source.len()).unwrap();
        prop_assert_eq!(tree.text(), source);
    }

    #[test]
    fn prop_markup_document_round_trip(source in markup_soup()) {
        let tree = parse_document(&source, 0..source.len()).unwrap();
        prop_assert_eq!(tree.text(), source.as_str());
        prop_assert!(RoundTripValidator::new().validate(&tree).is_valid());
    }

    #[test]
    fn prop_dtd_fragment_round_trip(source in markup_soup()) {
        let tree = parse_dtd_fragment(&source, 0..source.len()).unwrap();
        prop_assert_eq!(tree.text(), source);
    }

    #[test]
    fn prop_tag_fragment_round_trip(
        source in markup_soup(),
        ancestors in proptest::collection::vec("[a-z]{1,3}", 0..3),
    ) {
        let tree = parse_tag_fragment(&source, 0..source.len(), &ancestors).unwrap();
        prop_assert_eq!(tree.text(), source);
    }

    #[test]
    fn prop_sub_range_round_trip(source in markup_soup(), a in 0usize..200, b in 0usize..200) {
        let start = floor_boundary(&source, a.min(b));
        let end = floor_boundary(&source, a.max(b));
        let document = parse_document(&source, start..end).unwrap();
        prop_assert_eq!(document.text(), &source[start..end]);
        let dtd = parse_dtd_fragment(&source, start..end).unwrap();
        prop_assert_eq!(dtd.text(), &source[start..end]);
    }
}
