use pretty_assertions::assert_eq;

use super::*;

#[test]
fn codepoint_set_merges_ranges() {
    let set = CodepointSet::from_ranges([(10, 20), (0, 5), (6, 8), (15, 30)]);
    assert_eq!(set.ranges(), &[(0, 8), (10, 30)]);

    assert!(set.contains('\u{0}'));
    assert!(set.contains('\u{8}'));
    assert!(!set.contains('\u{9}'));
    assert!(set.contains('\u{1E}'));
    assert!(!set.contains('\u{1F}'));

    let other = CodepointSet::from_ranges([(9, 9)]);
    assert_eq!(set.union(&other).ranges(), &[(0, 30)]);
}

#[test]
fn properties() {
    let greek = script("Greek").unwrap();
    assert!(greek.contains('α'));
    assert!(!greek.contains('a'));
    assert_eq!(script("Grek"), Some(greek));

    let lu = general_category("Lu").unwrap();
    assert!(lu.contains('Ä'));
    assert!(!lu.contains('ä'));

    assert!(general_category("LD").unwrap().contains('٣'));
    assert!(general_category("L1").unwrap().contains('\u{FF}'));
    assert!(!general_category("L1").unwrap().contains('\u{100}'));

    assert!(property("Alphabetic").unwrap().contains('ß'));
    assert!(property("White_Space").unwrap().contains('\u{3000}'));

    assert!(property("NoSuchProperty").is_none());
    assert!(property("L}|\\p{N").is_none());
    assert!(general_category("Latin").is_none());
}

#[test]
fn blocks() {
    let latin = block("BasicLatin").unwrap();
    assert_eq!(latin.ranges(), &[(0, 0x7F)]);
    assert_eq!(block("Basic Latin"), Some(latin.clone()));
    assert_eq!(block("basic_latin"), Some(latin));

    assert!(block("Greek").unwrap().contains('λ'));
    assert!(block("NoSuchBlock").is_none());
}

#[test]
fn posix_and_java_names() {
    assert!(unicode_posix("Alpha", false).unwrap().contains('é'));
    assert!(unicode_posix("Lower", true).unwrap().contains('É'));
    assert!(!unicode_posix("Lower", false).unwrap().contains('É'));
    assert!(unicode_posix("Unknown", false).is_none());

    assert!(java_property("javaLowerCase", false).unwrap().contains('é'));
    assert!(java_property("javaWhitespace", false).unwrap().contains('\t'));
    assert!(!java_property("javaWhitespace", false)
        .unwrap()
        .contains('\u{A0}'));
    assert!(java_property("javaFoo", false).is_none());

    assert_eq!(
        AsciiClass::from_posix_name("XDigit"),
        Some(AsciiClass::XDigit)
    );
    assert!(AsciiClass::XDigit.matches('f'));
    assert!(!AsciiClass::XDigit.matches('g'));
    assert!(!AsciiClass::Alpha.matches('é'));
    assert!(AsciiClass::Print.matches(' '));
    assert!(!AsciiClass::Graph.matches(' '));
}

#[test]
fn case_mappings() {
    assert_eq!(to_upper('a'), 'A');
    assert_eq!(to_upper('ß'), 'ß');
    assert_eq!(to_lower('Σ'), 'σ');
    assert_eq!(fold('ς'), 'σ');
    assert_eq!(fold('K'), 'k');
    assert_eq!(fold('\u{212A}'), 'k');
}

#[test]
fn character_kinds() {
    assert!(is_letter_or_digit('٣'));
    assert!(!is_letter_or_digit('_'));
    assert!(is_unicode_word('_'));
    assert!(is_unicode_word('\u{301}'));
    assert!(is_non_spacing_mark('\u{301}'));
    assert!(!is_non_spacing_mark('a'));
    assert!(is_horizontal_space('\u{2003}'));
    assert!(!is_horizontal_space('\n'));
    assert!(is_vertical_space('\u{2028}'));
    assert!(is_line_terminator('\u{85}'));
    assert!(!is_line_terminator('\x0B'));
}

#[test]
fn composition() {
    assert!(is_combining_mark('\u{301}'));
    assert!(!is_combining_mark('e'));
    assert_eq!(compose_cluster(&['e', '\u{301}']), Some('é'));
    assert_eq!(compose_cluster(&['x', '\u{301}']), None);
    assert_eq!(compose_cluster(&['a']), Some('a'));
}

#[test]
fn hangul_jamo() {
    assert!(is_leading_jamo('\u{1112}'));
    assert!(is_vowel_jamo('\u{1161}'));
    assert!(is_trailing_jamo('\u{11AB}'));
    assert!(!is_leading_jamo('\u{D55C}'));

    assert!(extends_cluster('\u{1161}'));
    assert!(extends_cluster('\u{11AB}'));
    assert!(extends_cluster('\u{301}'));
    assert!(!extends_cluster('\u{1112}'));

    assert_eq!(
        compose_cluster(&['\u{1112}', '\u{1161}', '\u{11AB}']),
        Some('\u{D55C}')
    );
    assert_eq!(compose_cluster(&['\u{D558}', '\u{11AB}']), Some('\u{D55C}'));
}
