use pretty_assertions::assert_eq;

use crate::errors::MatchError;
use crate::Pattern;

fn pattern(re: &str) -> Pattern {
    Pattern::new(re).unwrap()
}

#[test]
fn no_match_before_first_operation() {
    let p = pattern("a(b)");
    let mut m = p.matcher("xab");

    assert_eq!(m.start(), Err(MatchError::NoMatch));
    assert_eq!(m.group(0), Err(MatchError::NoMatch));
    assert_eq!(m.to_match_result(), Err(MatchError::NoMatch));

    assert!(m.find());
    assert_eq!(m.start(), Ok(1));
    assert_eq!(m.end(), Ok(3));
    assert_eq!(m.group(1), Ok(Some("b")));
    assert_eq!(m.group(2), Err(MatchError::NoGroup(2)));
    assert_eq!(m.group_named("x"), Err(MatchError::NoGroupNamed("x".into())));

    // A failed operation discards the previous match.
    assert!(!m.find());
    assert_eq!(m.start(), Err(MatchError::NoMatch));
}

#[test]
fn groups_that_did_not_participate() {
    let p = pattern("(a)|(b)");
    let mut m = p.matcher("b");

    assert!(m.matches());
    assert_eq!(m.group(1), Ok(None));
    assert_eq!(m.start_group(1), Ok(None));
    assert_eq!(m.group(2), Ok(Some("b")));
    assert_eq!(m.end_group(2), Ok(Some(1)));
}

#[test]
fn byte_offsets() {
    let p = pattern("é+");
    let mut m = p.matcher("aééb");

    assert!(m.find());
    assert_eq!(m.start(), Ok(1));
    assert_eq!(m.end(), Ok(5));
    assert_eq!(m.group(0), Ok(Some("éé")));

    assert_eq!(m.find_from(2), Err(MatchError::InvalidIndex(2)));
    assert_eq!(m.find_from(3), Ok(true));
    assert_eq!(m.start(), Ok(3));
    assert_eq!(m.find_from(6), Ok(false));
    assert_eq!(m.find_from(7), Err(MatchError::InvalidIndex(7)));
}

#[test]
fn matches_and_looking_at() {
    let p = pattern(r"\d+");

    assert!(p.matcher("123").matches());
    assert!(!p.matcher("123x").matches());
    assert!(p.matcher("123x").looking_at());
    assert!(!p.matcher("x123").looking_at());

    let mut m = p.matcher("123x");
    assert!(m.looking_at());
    assert_eq!(m.group(0), Ok(Some("123")));
}

#[test]
fn find_after_empty_match() {
    let p = pattern("a*");
    let mut m = p.matcher("baa");
    let mut spans = Vec::new();

    while m.find() {
        spans.push((m.start().unwrap(), m.end().unwrap()));
    }

    assert_eq!(spans, vec![(0, 0), (1, 3), (3, 3)]);
}

#[test]
fn reset() {
    let p = pattern(r"\w+");
    let mut m = p.matcher("one two");

    assert!(m.find());
    assert!(m.find());
    assert_eq!(m.group(0), Ok(Some("two")));

    m.reset();
    assert_eq!(m.start(), Err(MatchError::NoMatch));
    assert!(m.find());
    assert_eq!(m.group(0), Ok(Some("one")));

    // Resetting twice is the same as resetting once.
    m.reset().reset();
    assert!(m.find());
    assert_eq!(m.group(0), Ok(Some("one")));

    m.reset_input("three");
    assert!(m.find());
    assert_eq!(m.group(0), Ok(Some("three")));
    assert_eq!(m.input(), "three");
}

#[test]
fn results() {
    let p = pattern(r"(\w)(\d)");
    let mut m = p.matcher("a1 b2 c3");

    let results: Vec<_> = m.results().collect();
    assert_eq!(results.len(), 3);
    assert_eq!(results[1].as_str(), "b2");
    assert_eq!(results[1].start(), 3);
    assert_eq!(results[2].group(1), Ok(Some("c")));
    assert_eq!(results[2].group(3), Err(MatchError::NoGroup(3)));

    // The iterator consumed every match.
    assert!(!m.find());
}

#[test]
fn results_with_optional_groups() {
    let p = pattern("(é)?(x)");
    let mut m = p.matcher("éx x");

    let results: Vec<_> = m.results().collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].start_group(1), Ok(Some(0)));
    assert_eq!(results[0].end(), 3);
    assert_eq!(results[1].group(1), Ok(None));
    assert_eq!(results[1].start(), 4);

    m.reset();
    assert!(m.find());
    assert_eq!(m.to_match_result().as_ref(), Ok(&results[0]));
}

#[test]
fn region() {
    let p = pattern(r"\d+");
    let mut m = p.matcher("ab12cd34");

    m.region(2, 6).unwrap();
    assert_eq!(m.region_start(), 2);
    assert_eq!(m.region_end(), 6);
    assert!(m.find());
    assert_eq!(m.group(0), Ok(Some("12")));
    assert!(!m.find());

    // Matches are confined to the region.
    m.region(0, 3).unwrap();
    assert!(m.find());
    assert_eq!(m.group(0), Ok(Some("1")));

    assert!(matches!(
        m.region(4, 2),
        Err(MatchError::InvalidRegion { start: 4, end: 2 })
    ));
    assert!(matches!(
        m.region(0, 9),
        Err(MatchError::InvalidRegion { start: 0, end: 9 })
    ));

    // Resetting restores the whole input as region.
    m.reset();
    assert_eq!(m.region_end(), 8);
}

#[test]
fn region_not_at_char_boundary() {
    let p = pattern("x");
    let mut m = p.matcher("ñx");
    assert_eq!(m.region(1, 3).map(|_| ()), Err(MatchError::InvalidIndex(1)));
}

#[test]
fn anchoring_bounds() {
    let p = pattern(r"^\d+$");

    let mut m = p.matcher("ab12cd");
    m.region(2, 4).unwrap();
    assert!(m.has_anchoring_bounds());
    assert!(m.find());
    assert_eq!(m.group(0), Ok(Some("12")));

    let mut m = p.matcher("ab12cd");
    m.region(2, 4).unwrap();
    m.use_anchoring_bounds(false);
    assert!(!m.has_anchoring_bounds());
    assert!(!m.find());
}

#[test]
fn transparent_bounds() {
    let p = pattern(r"\bfoo");

    let mut m = p.matcher("xfoo");
    m.region(1, 4).unwrap();
    assert!(!m.has_transparent_bounds());
    assert!(m.find());

    let mut m = p.matcher("xfoo");
    m.region(1, 4).unwrap();
    m.use_transparent_bounds(true);
    assert!(!m.find());

    let p = pattern("(?<=x)foo");

    let mut m = p.matcher("xfoo");
    m.region(1, 4).unwrap();
    assert!(!m.find());

    let mut m = p.matcher("xfoo");
    m.region(1, 4).unwrap();
    m.use_transparent_bounds(true);
    assert!(m.find());
}

#[test]
fn hit_end_and_require_end() {
    let mut m = pattern("foo").matcher("xfo");
    assert!(!m.find());
    assert!(m.hit_end());

    let mut m = pattern("foo").matcher("foo bar");
    assert!(m.find());
    assert!(!m.hit_end());
    assert!(!m.require_end());

    let mut m = pattern("foo$").matcher("foo");
    assert!(m.find());
    assert!(m.hit_end());
    assert!(m.require_end());
}

#[test]
fn append_replacement() {
    let p = pattern(r"(\w+)@(?<host>\w+)");
    let mut m = p.matcher("mail alice@home or bob@work now");
    let mut buf = String::new();

    while m.find() {
        m.append_replacement(&mut buf, "${host}:$1").unwrap();
    }
    m.append_tail(&mut buf);

    assert_eq!(buf, "mail home:alice or work:bob now");
}

#[test]
fn append_replacement_without_match() {
    let mut m = pattern("a").matcher("b");
    let mut buf = String::new();
    assert_eq!(
        m.append_replacement(&mut buf, "x").map(|_| ()),
        Err(MatchError::NoMatch)
    );
}

#[test]
fn append_replacement_behind_append_position() {
    let mut m = pattern("cat").matcher("cat and cat");
    let mut buf = String::new();

    assert!(m.find());
    assert!(m.find());
    m.append_replacement(&mut buf, "dog").unwrap();
    assert_eq!(buf, "cat and dog");

    // `looking_at` goes back to the start of the region without resetting.
    assert!(m.looking_at());
    assert_eq!(
        m.append_replacement(&mut buf, "x").map(|_| ()),
        Err(MatchError::AppendPosition { start: 0, append_position: 11 })
    );
    assert_eq!(buf, "cat and dog");

    // After a reset appending starts over.
    m.reset();
    assert!(m.looking_at());
    m.append_replacement(&mut buf, "x").unwrap();
    m.append_tail(&mut buf);
    assert_eq!(buf, "cat and dogx and cat");
}

#[test]
fn replacement_templates() {
    let p = pattern("(a)(b)?");

    let replace = |template: &str| p.matcher("xab ya").replace_all(template);

    assert_eq!(replace("[$0]"), Ok("x[ab] y[a]".to_string()));
    assert_eq!(replace("$2$1"), Ok("xba ya".to_string()));
    assert_eq!(replace(r"\$1"), Ok("x$1 y$1".to_string()));
    // `$10` is group 1 followed by `0`, since there is no group 10.
    assert_eq!(replace("$10"), Ok("xa0 ya0".to_string()));
    assert_eq!(replace("$3"), Err(MatchError::NoGroup(3)));
    assert_eq!(
        replace("${nope}"),
        Err(MatchError::NoGroupNamed("nope".to_string()))
    );

    let invalid = |template: &str| match replace(template) {
        Err(MatchError::InvalidReplacement(description)) => description,
        other => panic!("unexpected result {:?}", other),
    };

    assert_eq!(invalid("x\\"), "character to be escaped is missing");
    assert_eq!(invalid("x$"), "group index is missing");
    assert_eq!(invalid("$x"), "Illegal group reference");
    assert_eq!(invalid("${}"), "named capturing group has 0 length name");
    assert_eq!(
        invalid("${a"),
        "named capturing group is missing trailing '}'"
    );
    assert_eq!(
        invalid("${1a}"),
        "capturing group name {1a} starts with digit character"
    );
}

#[test]
fn replace_first_and_functions() {
    let p = pattern(r"\d+");

    assert_eq!(p.matcher("a1b22").replace_first("#"), Ok("a#b22".to_string()));
    assert_eq!(p.matcher("abc").replace_all("#"), Ok("abc".to_string()));

    let doubled = p
        .matcher("a1b22")
        .replace_all_with(|m| {
            let n: u32 = m.as_str().parse().unwrap();
            (n * 2).to_string()
        })
        .unwrap();
    assert_eq!(doubled, "a2b44");

    let first = p
        .matcher("a1b22")
        .replace_first_with(|m| format!("<{}>", m.as_str()))
        .unwrap();
    assert_eq!(first, "a<1>b22");

    // Replacers can return literal text with `quote_replacement`.
    let quoted = p
        .matcher("a1")
        .replace_all_with(|_| super::Matcher::quote_replacement("$1\\"))
        .unwrap();
    assert_eq!(quoted, "a$1\\");
}

#[test]
fn debug() {
    let p = pattern("b");
    let mut m = p.matcher("abc");
    assert!(m.find());
    assert_eq!(
        format!("{:?}", m),
        r#"Matcher { pattern: "b", region: 0..3, last_match: 1..2 }"#
    );
}
