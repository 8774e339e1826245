/*! Character property tables.

This module answers questions like "is this character a letter?" or "which
characters belong to the Greek script?". General categories, scripts and
binary properties come from the tables shipped with [`regex-syntax`][1];
Unicode blocks come from a table of our own (see [`blocks`]), as
`regex-syntax` doesn't expose them.

Everything here is independent of the pattern compiler, which combines these
sets into character class predicates.

[1]: https://docs.rs/regex-syntax
*/

use std::sync::Arc;

use lazy_static::lazy_static;
use regex_syntax::hir::{Class, HirKind};
use regex_syntax::ParserBuilder;
use unicode_normalization::char::canonical_combining_class;
use unicode_normalization::UnicodeNormalization;

mod blocks;

#[cfg(test)]
mod tests;

/// A set of code points represented as sorted, non-overlapping, inclusive
/// ranges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CodepointSet {
    ranges: Arc<[(u32, u32)]>,
}

impl CodepointSet {
    /// Creates a set from arbitrary ranges, which are sorted and merged.
    pub fn from_ranges<I: IntoIterator<Item = (u32, u32)>>(
        ranges: I,
    ) -> Self {
        let mut ranges: Vec<(u32, u32)> = ranges.into_iter().collect();
        ranges.sort_unstable();

        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
        for (start, end) in ranges {
            match merged.last_mut() {
                Some(last) if start <= last.1.saturating_add(1) => {
                    last.1 = last.1.max(end);
                }
                _ => merged.push((start, end)),
            }
        }

        Self { ranges: merged.into() }
    }

    #[inline]
    pub fn contains(&self, c: char) -> bool {
        let c = c as u32;
        self.ranges
            .binary_search_by(|&(start, end)| {
                if end < c {
                    std::cmp::Ordering::Less
                } else if start > c {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    pub fn union(&self, other: &CodepointSet) -> CodepointSet {
        CodepointSet::from_ranges(
            self.ranges.iter().chain(other.ranges.iter()).copied(),
        )
    }

    pub fn ranges(&self) -> &[(u32, u32)] {
        &self.ranges
    }
}

/// Compiles a single `regex-syntax` class expression like `\p{Greek}` or
/// `[\p{L}\p{Nd}]` into a [`CodepointSet`].
fn class_from_syntax(expr: &str) -> Option<CodepointSet> {
    let hir = ParserBuilder::new().build().parse(expr).ok()?;
    match hir.kind() {
        HirKind::Class(Class::Unicode(class)) => {
            Some(CodepointSet::from_ranges(
                class
                    .ranges()
                    .iter()
                    .map(|r| (r.start() as u32, r.end() as u32)),
            ))
        }
        HirKind::Literal(literal) => {
            let s = std::str::from_utf8(&literal.0).ok()?;
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => {
                    Some(CodepointSet::from_ranges([(c as u32, c as u32)]))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

fn builtin(expr: &str) -> CodepointSet {
    class_from_syntax(expr)
        .unwrap_or_else(|| panic!("invalid built-in class `{}`", expr))
}

/// Property names reach `regex-syntax` embedded in a `\p{...}` expression,
/// so only characters that can appear in a property name are accepted.
fn is_property_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '-'))
}

/// Looks up a general category, script or binary property by name, using
/// loose matching (case, spaces, hyphens and underscores are ignored).
pub(crate) fn property(name: &str) -> Option<CodepointSet> {
    if !is_property_name(name) {
        return None;
    }
    class_from_syntax(&format!(r"\p{{{}}}", name))
}

/// Looks up a general category by name or alias (`Lu`, `Letter`, `LC`, ...).
pub(crate) fn general_category(name: &str) -> Option<CodepointSet> {
    if !is_property_name(name) {
        return None;
    }
    match name {
        "LD" => Some(LETTER_OR_DIGIT.clone()),
        "L1" => Some(CodepointSet::from_ranges([(0, 0xFF)])),
        "all" => Some(CodepointSet::from_ranges([(0, 0x10FFFF)])),
        _ => class_from_syntax(&format!(r"\p{{gc={}}}", name)),
    }
}

/// Looks up a script by name or alias (`Greek`, `Grek`, ...).
pub(crate) fn script(name: &str) -> Option<CodepointSet> {
    if !is_property_name(name) {
        return None;
    }
    class_from_syntax(&format!(r"\p{{sc={}}}", name))
}

/// Looks up a Unicode block by name (`BasicLatin`, `Basic Latin`,
/// `basic_latin`, ...).
pub(crate) fn block(name: &str) -> Option<CodepointSet> {
    blocks::lookup(name).map(|(start, end)| {
        CodepointSet::from_ranges([(start, end)])
    })
}

lazy_static! {
    pub(crate) static ref LETTER_OR_DIGIT: CodepointSet =
        builtin(r"[\p{L}\p{Nd}]");
    pub(crate) static ref NON_SPACING_MARK: CodepointSet = builtin(r"\p{Mn}");
    pub(crate) static ref UNICODE_WORD: CodepointSet = builtin(
        r"[\p{Alphabetic}\p{Mn}\p{Me}\p{Mc}\p{Nd}\p{Pc}\p{Join_Control}]"
    );
    pub(crate) static ref UNICODE_DIGIT: CodepointSet = builtin(r"\p{Nd}");
    pub(crate) static ref WHITE_SPACE: CodepointSet =
        builtin(r"\p{White_Space}");
    pub(crate) static ref CASED: CodepointSet =
        builtin(r"[\p{Lowercase}\p{Uppercase}\p{Lt}]");
    static ref LOWERCASE: CodepointSet = builtin(r"\p{Lowercase}");
    static ref UPPERCASE: CodepointSet = builtin(r"\p{Uppercase}");
    static ref ALPHABETIC: CodepointSet = builtin(r"\p{Alphabetic}");
    static ref PUNCTUATION: CodepointSet = builtin(r"\p{P}");
    static ref CONTROL: CodepointSet = builtin(r"\p{Cc}");
    static ref HEX_DIGIT: CodepointSet = builtin(r"[\p{Nd}\p{Hex_Digit}]");
    static ref BLANK: CodepointSet = builtin(r"[\p{Zs}\t]");
    static ref GRAPH: CodepointSet =
        builtin(r"[^\p{White_Space}\p{Cc}\p{Cn}]");
    static ref PRINT: CodepointSet =
        builtin(r"[[^\p{White_Space}\p{Cc}\p{Cn}]\p{Zs}]");
    static ref ALNUM: CodepointSet = builtin(r"[\p{Alphabetic}\p{Nd}]");
    static ref LETTER: CodepointSet = builtin(r"\p{L}");
    static ref TITLECASE: CodepointSet = builtin(r"\p{Lt}");
    static ref IDEOGRAPHIC: CodepointSet = builtin(r"\p{Ideographic}");
    static ref SPACE_SEPARATOR: CodepointSet = builtin(r"\p{Z}");
    static ref JAVA_WHITESPACE: CodepointSet = builtin(
        r"[\p{Z}\t\n\x0B\f\r\x1C-\x1F--[\xA0\x{2007}\x{202F}]]"
    );
}

/// Unicode versions of the POSIX classes, used when the pattern is compiled
/// with `UnicodeCharacterClass`.
pub(crate) fn unicode_posix(
    name: &str,
    case_insensitive: bool,
) -> Option<CodepointSet> {
    let set = match name.to_ascii_uppercase().as_str() {
        "ALPHA" => ALPHABETIC.clone(),
        "LOWER" | "UPPER" if case_insensitive => CASED.clone(),
        "LOWER" => LOWERCASE.clone(),
        "UPPER" => UPPERCASE.clone(),
        "PUNCT" => PUNCTUATION.clone(),
        "SPACE" => WHITE_SPACE.clone(),
        "DIGIT" => UNICODE_DIGIT.clone(),
        "CNTRL" => CONTROL.clone(),
        "XDIGIT" => HEX_DIGIT.clone(),
        "BLANK" => BLANK.clone(),
        "GRAPH" => GRAPH.clone(),
        "PRINT" => PRINT.clone(),
        "ALNUM" => ALNUM.clone(),
        "WORD" => UNICODE_WORD.clone(),
        _ => return None,
    };
    Some(set)
}

/// The `java*` family of properties, named after the character
/// classification methods they mirror.
pub(crate) fn java_property(
    name: &str,
    case_insensitive: bool,
) -> Option<CodepointSet> {
    let set = match name {
        "javaLowerCase" | "javaUpperCase" | "javaTitleCase"
            if case_insensitive =>
        {
            CASED.clone()
        }
        "javaLowerCase" => LOWERCASE.clone(),
        "javaUpperCase" => UPPERCASE.clone(),
        "javaTitleCase" => TITLECASE.clone(),
        "javaAlphabetic" => ALPHABETIC.clone(),
        "javaDigit" => UNICODE_DIGIT.clone(),
        "javaLetter" => LETTER.clone(),
        "javaLetterOrDigit" => LETTER_OR_DIGIT.clone(),
        "javaIdeographic" => IDEOGRAPHIC.clone(),
        "javaSpaceChar" => SPACE_SEPARATOR.clone(),
        "javaWhitespace" => JAVA_WHITESPACE.clone(),
        _ => return None,
    };
    Some(set)
}

/// ASCII character classes, used for POSIX names and the predefined
/// `\d`, `\s` and `\w` classes when Unicode classes are not requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AsciiClass {
    Lower,
    Upper,
    Ascii,
    Alpha,
    Digit,
    Alnum,
    Punct,
    Graph,
    Print,
    Blank,
    Cntrl,
    XDigit,
    Space,
    Word,
}

impl AsciiClass {
    pub fn from_posix_name(name: &str) -> Option<Self> {
        let class = match name {
            "Lower" => Self::Lower,
            "Upper" => Self::Upper,
            "ASCII" => Self::Ascii,
            "Alpha" => Self::Alpha,
            "Digit" => Self::Digit,
            "Alnum" => Self::Alnum,
            "Punct" => Self::Punct,
            "Graph" => Self::Graph,
            "Print" => Self::Print,
            "Blank" => Self::Blank,
            "Cntrl" => Self::Cntrl,
            "XDigit" => Self::XDigit,
            "Space" => Self::Space,
            _ => return None,
        };
        Some(class)
    }

    pub fn matches(self, c: char) -> bool {
        if !c.is_ascii() {
            return false;
        }
        match self {
            Self::Lower => c.is_ascii_lowercase(),
            Self::Upper => c.is_ascii_uppercase(),
            Self::Ascii => true,
            Self::Alpha => c.is_ascii_alphabetic(),
            Self::Digit => c.is_ascii_digit(),
            Self::Alnum => c.is_ascii_alphanumeric(),
            Self::Punct => c.is_ascii_punctuation(),
            Self::Graph => c.is_ascii_graphic(),
            Self::Print => c.is_ascii_graphic() || c == ' ',
            Self::Blank => c == ' ' || c == '\t',
            Self::Cntrl => c.is_ascii_control(),
            Self::XDigit => c.is_ascii_hexdigit(),
            Self::Space => is_ascii_space(c),
            Self::Word => c.is_ascii_alphanumeric() || c == '_',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Lower => "Lower",
            Self::Upper => "Upper",
            Self::Ascii => "ASCII",
            Self::Alpha => "Alpha",
            Self::Digit => "Digit",
            Self::Alnum => "Alnum",
            Self::Punct => "Punct",
            Self::Graph => "Graph",
            Self::Print => "Print",
            Self::Blank => "Blank",
            Self::Cntrl => "Cntrl",
            Self::XDigit => "XDigit",
            Self::Space => "Space",
            Self::Word => "Word",
        }
    }
}

/// `[ \t\n\x0B\f\r]`
#[inline]
pub(crate) fn is_ascii_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

#[inline]
pub(crate) fn is_letter_or_digit(c: char) -> bool {
    if c.is_ascii() {
        c.is_ascii_alphanumeric()
    } else {
        LETTER_OR_DIGIT.contains(c)
    }
}

#[inline]
pub(crate) fn is_non_spacing_mark(c: char) -> bool {
    !c.is_ascii() && NON_SPACING_MARK.contains(c)
}

#[inline]
pub(crate) fn is_unicode_word(c: char) -> bool {
    if c.is_ascii() {
        c.is_ascii_alphanumeric() || c == '_'
    } else {
        UNICODE_WORD.contains(c)
    }
}

/// Horizontal whitespace, as matched by `\h`.
pub(crate) fn is_horizontal_space(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t'
            | '\u{A0}'
            | '\u{1680}'
            | '\u{180E}'
            | '\u{2000}'..='\u{200A}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
    )
}

/// Vertical whitespace, as matched by `\v`.
pub(crate) fn is_vertical_space(c: char) -> bool {
    matches!(
        c,
        '\n' | '\x0B' | '\x0C' | '\r' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Characters that terminate a line when `UnixLines` is not set.
#[inline]
pub(crate) fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

/// Upper case mapping, restricted to mappings that produce a single
/// character. Characters that expand (like `ß` into `SS`) map to
/// themselves.
pub(crate) fn to_upper(c: char) -> char {
    if c.is_ascii() {
        return c.to_ascii_uppercase();
    }
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

/// Lower case counterpart of [`to_upper`].
pub(crate) fn to_lower(c: char) -> char {
    if c.is_ascii() {
        return c.to_ascii_lowercase();
    }
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// Folds a character for Unicode case-insensitive comparisons. Two
/// characters are equal ignoring case when their folded forms are equal.
#[inline]
pub(crate) fn fold(c: char) -> char {
    to_lower(to_upper(c))
}

/// True for characters with a non-zero canonical combining class, which
/// attach to the preceding base character.
#[inline]
pub(crate) fn is_combining_mark(c: char) -> bool {
    !c.is_ascii() && canonical_combining_class(c) != 0
}

/// Conjoining jamo that start a Hangul syllable.
#[inline]
pub(crate) fn is_leading_jamo(c: char) -> bool {
    ('\u{1100}'..='\u{1112}').contains(&c)
}

/// Conjoining jamo that follow a leading one in a Hangul syllable.
#[inline]
pub(crate) fn is_vowel_jamo(c: char) -> bool {
    ('\u{1161}'..='\u{1175}').contains(&c)
}

/// Conjoining jamo that close a Hangul syllable.
#[inline]
pub(crate) fn is_trailing_jamo(c: char) -> bool {
    ('\u{11A8}'..='\u{11C2}').contains(&c)
}

/// True for characters that compose with the characters before them:
/// combining marks, and the vowel and trailing jamo of Hangul syllables.
#[inline]
pub(crate) fn extends_cluster(c: char) -> bool {
    is_combining_mark(c) || is_vowel_jamo(c) || is_trailing_jamo(c)
}

/// Composes a base character and the characters that extend it (see
/// [`extends_cluster`]).
/// Returns `None` unless the composition is a single character.
pub(crate) fn compose_cluster(chars: &[char]) -> Option<char> {
    let mut composed = chars.iter().copied().nfc();
    match (composed.next(), composed.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
