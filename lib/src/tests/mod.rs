/*! End-to-end tests. */
use pretty_assertions::assert_eq;

use crate::{Compiler, Flag, Flags, MatchError, Pattern};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

macro_rules! pattern_match {
    ($pattern:expr, $data:expr, $expected_result:expr) => {{
        let pattern = crate::Pattern::new($pattern).unwrap();
        let mut matcher = pattern.matcher($data);

        assert!(
            matcher.find(),
            "\n\n`{}` should match `{:?}`",
            $pattern,
            $data
        );

        let matching_data = matcher.group(0).unwrap().unwrap();

        assert_eq!(
            matching_data, $expected_result,
            "\n\n`{}` applied to data `{:?}` should match `{:?}`, but it is matching `{:?}`",
            $pattern, $data, $expected_result, matching_data
        );
    }};
}

macro_rules! pattern_false {
    ($pattern:expr, $data:expr) => {{
        let pattern = crate::Pattern::new($pattern).unwrap();
        assert!(
            !pattern.matcher($data).find(),
            "\n\n`{}` should not match `{:?}`",
            $pattern,
            $data
        );
    }};
}

macro_rules! find_all {
    ($pattern:expr, $data:expr) => {{
        let pattern = crate::Pattern::new($pattern).unwrap();
        let mut matcher = pattern.matcher($data);
        let mut found = Vec::new();
        while matcher.find() {
            found.push(matcher.group(0).unwrap().unwrap());
        }
        found
    }};
}

macro_rules! groups {
    ($pattern:expr, $data:expr) => {{
        let pattern = crate::Pattern::new($pattern).unwrap();
        let mut matcher = pattern.matcher($data);
        assert!(matcher.find(), "\n\n`{}` should match `{:?}`", $pattern, $data);
        (1..=matcher.group_count())
            .map(|group| matcher.group(group).unwrap())
            .collect::<Vec<_>>()
    }};
}

#[test]
fn literals_and_dot() {
    pattern_match!("abc", "abc", "abc");
    pattern_false!("abc", "xbc");
    pattern_match!("abc", "xabcx", "abc");
    pattern_match!("abc", "ababc", "abc");
    pattern_match!("abcd", "abcabcabcd", "abcd");
    pattern_match!("a.c", "abc", "abc");
    pattern_false!("a.c", "a\nc");
    pattern_false!("a.c", "a\rc");
    pattern_false!("a.c", "a\u{2028}c");
    pattern_match!("(?s)a.c", "a\nc", "a\nc");
    pattern_match!("(?d)a.c", "a\rc", "a\rc");
    pattern_false!("(?d)a.c", "a\nc");
    pattern_match!("ñ.", "añob", "ño");
}

#[test]
fn greedy_and_lazy() {
    pattern_match!("ab*c", "abc", "abc");
    pattern_match!("ab*c", "ac", "ac");
    pattern_match!("ab*bc", "abbc", "abbc");
    pattern_match!("a.*bb", "abbbb", "abbbb");
    pattern_match!("a.*?bbb", "abbbbbb", "abbb");
    pattern_match!("ab+", "abbbb", "abbbb");
    pattern_match!("ab+?", "abbbb", "ab");
    pattern_false!("ab+bc", "abc");
    pattern_match!("a+b+c", "aabbabc", "abc");
    pattern_false!("ab?bc", "abbbbc");
    pattern_match!("ab?c", "ac", "ac");
    pattern_match!("ab*?", "abbb", "a");
    pattern_match!("ab??", "ab", "a");
    pattern_match!("<.+?>", "<a><b>", "<a>");
    pattern_match!("<.+>", "<a><b>", "<a><b>");
}

#[test]
fn counted_repetitions() {
    pattern_match!("a{2,3}", "aaaa", "aaa");
    pattern_match!("a{2,3}?", "aaaa", "aa");
    pattern_match!("a{2,}", "aaaaa", "aaaaa");
    pattern_false!("a{3}", "aa");
    pattern_match!("x{0}y", "xy", "y");
    pattern_match!("(ab){2}", "ababab", "abab");
    pattern_match!("(?:ab){2,}?", "ababab", "abab");
    pattern_match!("[ab]{3}", "xbaab", "baa");
    pattern_match!("(a|bc){2}", "xbca", "bca");
    pattern_match!("(a|bc){1,2}?d", "abcd", "bcd");
}

#[test]
fn possessive_and_atomic() {
    pattern_false!("a*+a", "aaa");
    pattern_match!("a++b", "aab", "aab");
    pattern_false!("(?>a+)a", "aaa");
    pattern_match!("(?>a+)b", "aab", "aab");
    pattern_false!("(?:ab)*+ab", "ababab");
    pattern_match!("a?+a", "aa", "aa");
    pattern_false!("a?+a", "a");
    pattern_false!("\"[^\"]*+\"", "\"abc");
}

#[test]
fn alternation() {
    pattern_match!("a|ab", "ab", "a");
    pattern_match!("ab|a", "ab", "ab");
    pattern_match!("(a|ab)(c|bcd)", "abcd", "abc");
    pattern_match!("a(b|x)c", "axc", "axc");
    pattern_match!("(a+|b)+", "aab", "aab");
    pattern_match!("a|b|c|d|e", "e", "e");
    pattern_match!("(F?FF?|f?ff?)abcd", "ffabcd", "ffabcd");
    pattern_match!("x(|a)y", "xy", "xy");
    pattern_match!("cat|dog", "hotdog", "dog");
}

#[test]
fn capturing_groups() {
    assert_eq!(groups!("(a)?b", "b"), vec![None]);
    assert_eq!(groups!("(a|b)*", "ab"), vec![Some("b")]);
    assert_eq!(groups!("(a|bc)*", "abc"), vec![Some("bc")]);
    assert_eq!(groups!("(?:(a)|b)*", "ab"), vec![Some("a")]);
    assert_eq!(groups!("((a)b)+", "abab"), vec![Some("ab"), Some("a")]);
    assert_eq!(
        groups!(r"(\d+)-(\d+)?-(\d+)", "12--34"),
        vec![Some("12"), None, Some("34")]
    );
    assert_eq!(
        groups!(r"(?<key>\w+)=(?<value>\w*)", "a=1"),
        vec![Some("a"), Some("1")]
    );
}

#[test]
fn back_references() {
    pattern_match!(r"(a+)b\1", "aabaa", "aabaa");
    pattern_match!(r"(a+)b\1", "aaba", "aba");
    pattern_match!(r"(\w)\1", "abccd", "cc");
    pattern_false!(r"(\w)\1", "abcd");
    pattern_match!(r"(?<x>\w)\k<x>", "abccd", "cc");
    pattern_match!(r"(?i)(a)\1", "aA", "aA");
    pattern_false!(r"(a)\1", "aA");
    pattern_match!(r"(?iu)(é)\1", "éÉ", "éÉ");
    // A group that didn't participate makes the reference fail.
    pattern_false!(r"(a)?\1b", "b");
    // Digits are taken while the number is a group that exists.
    pattern_match!(r"(a)\10", "aa0", "aa0");
    pattern_match!(
        r"(a)(b)(c)(d)(e)(f)(g)(h)(i)(j)\10",
        "abcdefghijj",
        "abcdefghijj"
    );
}

#[test]
fn lookarounds() {
    let pattern = Pattern::new("foo(?=bar)").unwrap();
    let mut m = pattern.matcher("foobaz foobar");
    assert!(m.find());
    assert_eq!(m.start(), Ok(7));
    assert_eq!(m.end(), Ok(10));

    let pattern = Pattern::new("foo(?!bar)").unwrap();
    let mut m = pattern.matcher("foobar foobaz");
    assert!(m.find());
    assert_eq!(m.start(), Ok(7));

    pattern_match!(r"(?<=\$)\d+", "cost $42", "42");
    pattern_match!(r"(?<!\$)\b\d+", "$42 17", "17");
    pattern_match!("(?<=ab|c)d", "abd", "d");
    pattern_match!("(?<=a{1,3})b", "aab", "b");
    pattern_false!("(?<=x)y", "y");
    pattern_match!(r"(?<=(\w))x", "ax", "x");
    pattern_match!("(?=(a+))a*b", "aaab", "aaab");
    pattern_match!(r"\w+(?<!ing)\b", "singing sang", "sang");
}

#[test]
fn anchors() {
    pattern_match!("^abc", "abc", "abc");
    pattern_false!("^abc", "xabc");
    pattern_match!("abc$", "xabc", "abc");
    pattern_match!("a$", "a\n", "a");
    pattern_match!("a$", "a\r\n", "a");
    pattern_false!("a$", "a\nb");
    pattern_match!("a$", "a\r", "a");
    pattern_false!("(?d)a$", "a\r");
    pattern_false!(r"a\z", "a\n");
    pattern_match!(r"a\Z", "a\n", "a");
    pattern_match!(r"\Aabc", "abc", "abc");

    assert_eq!(
        find_all!(r"(?m)^\w+$", "one\ntwo\r\nthree"),
        vec!["one", "two", "three"]
    );
    assert_eq!(find_all!(r"(?m)^", "a\nb\n"), vec!["", ""]);
    assert_eq!(find_all!(r"(?m)$", "a\nb"), vec!["", ""]);
}

#[test]
fn last_match_anchor() {
    assert_eq!(find_all!(r"\Ga", "aab"), vec!["a", "a"]);
    assert_eq!(find_all!(r"\G\d", "12a3"), vec!["1", "2"]);
}

#[test]
fn word_boundaries() {
    let pattern = Pattern::new(r"\bcat\b").unwrap();
    let mut m = pattern.matcher("concat cat");
    assert!(m.find());
    assert_eq!(m.start(), Ok(7));

    let pattern = Pattern::new(r"\Bcat").unwrap();
    let mut m = pattern.matcher("cat concat");
    assert!(m.find());
    assert_eq!(m.start(), Ok(7));

    assert_eq!(find_all!(r"\b\w+\b", "hi, you"), vec!["hi", "you"]);
    // Letters outside ASCII are part of words for `\b`.
    pattern_false!(r"\bé", "aé");
}

#[test]
fn line_endings() {
    pattern_match!(r"a\Rb", "a\r\nb", "a\r\nb");
    pattern_match!(r"a\Rb", "a\nb", "a\nb");
    pattern_match!(r"a\Rb", "a\u{2028}b", "a\u{2028}b");
    pattern_false!(r"a\Rb", "a\n\nb");
    pattern_match!(r"\h+", "a \t\u{3000}b", " \t\u{3000}");
    pattern_match!(r"\v+", "a\n\x0Bb", "\n\x0B");
    pattern_match!(r"\H+", "  ab ", "ab");
}

#[test]
fn case_insensitive() {
    pattern_match!("(?i)hello", "HeLLo", "HeLLo");
    pattern_match!("(?i)h", "H", "H");
    pattern_false!("(?i)é", "É");
    pattern_match!("(?iu)é", "É", "É");
    pattern_match!("(?iu)σ", "Σ", "Σ");
    pattern_match!("(?iu)ς", "Σ", "Σ");
    pattern_match!("(?iu)straße", "STRAßE", "STRAßE");
    pattern_match!("(?i)[a-c]+", "xABC", "ABC");
    pattern_match!("(?iu)[à-ç]+", "ÀÇ", "ÀÇ");
    pattern_match!("a(?i)b", "aB", "aB");
    pattern_false!("a(?i)b", "AB");
    pattern_match!("a(?i:b)c", "aBc", "aBc");
    pattern_false!("a(?i:b)c", "aBC");
    pattern_match!("(?i)a(?-i)b", "Ab", "Ab");
    pattern_false!("(?i)a(?-i)b", "AB");

    let pattern =
        crate::compile("k", Flags::from(Flag::CaseInsensitive)).unwrap();
    assert!(pattern.matcher("K").matches());
    assert!(!pattern.matcher("\u{212A}").matches());

    let pattern = Compiler::new()
        .case_insensitive(true)
        .unicode_case(true)
        .compile("k")
        .unwrap();
    assert!(pattern.matcher("\u{212A}").matches());
}

#[test]
fn character_classes() {
    pattern_match!("[abc]+", "xxbcay", "bca");
    pattern_match!("[^abc]+", "abcxyz", "xyz");
    pattern_match!("[a-z&&[def]]+", "abcdef", "def");
    pattern_match!("[a-z&&[^aeiou]]+", "ease", "s");
    pattern_match!(r"[\p{L}&&[^a-z]]+", "abcDEF", "DEF");
    pattern_match!("[a-c[x-z]]+", "mmaxbzm", "axbz");
    pattern_match!(r"[\d-]+", "tel: 555-1234", "555-1234");
    pattern_match!("[]a]+", "x]a]", "]a]");
    pattern_match!(r"[\Q]\E-]+", "x]-]", "]-]");
    pattern_match!(r"\d+", "abc123", "123");
    pattern_match!(r"\D+", "123abc", "abc");
    pattern_match!(r"\s+", "a \t\nb", " \t\n");
    pattern_match!(r"\S+", "  ab ", "ab");
    pattern_match!(r"\w+", "héllo", "h");
    pattern_match!(r"(?U)\w+", "héllo", "héllo");
    pattern_match!(r"(?U)\d+", "x٣٤", "٣٤");
    pattern_false!(r"\d", "٣");
}

#[test]
fn properties() {
    pattern_match!(r"\p{L}+", "123héllo", "héllo");
    pattern_match!(r"\pL+", "123héllo", "héllo");
    pattern_match!(r"\P{L}+", "héllo123", "123");
    pattern_match!(r"\p{Lu}", "abC", "C");
    pattern_match!(r"\p{IsGreek}+", "abc αβγ", "αβγ");
    pattern_match!(r"\p{script=Greek}+", "abc αβγ", "αβγ");
    pattern_match!(r"\p{InGreek}+", "abc αβγ", "αβγ");
    pattern_match!(r"\p{block=Basic Latin}+", "αβγabc", "abc");
    pattern_match!(r"\p{IsAlphabetic}+", "12ab", "ab");
    pattern_match!(r"\p{Alpha}+", "12ab", "ab");
    pattern_false!(r"\p{Alpha}", "é");
    pattern_match!(r"(?U)\p{Alpha}", "é", "é");
    pattern_match!(r"\p{javaLowerCase}+", "ABcdE", "cd");
    pattern_match!(r"\p{XDigit}+", "xyzBEEF", "BEEF");
    pattern_match!(r"\p{Punct}", "a,b", ",");
    pattern_match!(r"(?i)\p{Lu}+", "abc", "abc");
}

#[test]
fn escapes() {
    pattern_match!(r"\x41B\x{43}\0104", "ABCD", "ABCD");
    pattern_match!(r"\t\n", "a\t\nb", "\t\n");
    pattern_match!(r"\e", "a\x1Bb", "\x1B");
    pattern_match!(r"\cA", "a\x01b", "\x01");
    pattern_match!(r"\.\*", "a.*b", ".*");
    pattern_match!(r"\Q.*\E", "a.*b", ".*");
    pattern_match!(r"\Q.*", "a.*b", ".*");
    pattern_match!(r"x\Q(\E+", "x((", "x((");
    pattern_match!(r"\x{1F600}", "a😀b", "😀");
    pattern_match!(r"😀", "a😀b", "😀");
}

#[test]
fn comments() {
    pattern_match!("(?x) a b # comment\n c", "abc", "abc");
    pattern_match!(r"(?x) a\ b", "a b", "a b");
    pattern_match!("(?x)[a b]+", "x a b", "a");
    pattern_match!("a(?#comment)b", "ab", "ab");

    let pattern = Compiler::new()
        .comments(true)
        .compile("  \\d+  # digits")
        .unwrap();
    assert!(pattern.matcher("42").matches());
}

#[test]
fn literal() {
    let pattern = Compiler::new().literal(true).compile("(a|b)*").unwrap();
    assert!(pattern.matcher("(a|b)*").matches());
    assert!(!pattern.matcher("ab").find());
    assert_eq!(pattern.group_count(), 0);

    let quoted = Pattern::quote(r"a\Eb.*");
    let pattern = Pattern::new(&quoted).unwrap();
    assert!(pattern.matcher(r"a\Eb.*").matches());
    assert!(!pattern.matcher("a\\Ebxx").matches());
}

#[test]
fn canonical_equivalence() {
    let pattern = Compiler::new().canon_eq(true).compile("é").unwrap();
    assert!(pattern.matcher("é").matches());
    assert!(pattern.matcher("e\u{301}").matches());

    let pattern = Compiler::new().canon_eq(true).compile("e\u{301}").unwrap();
    assert!(pattern.matcher("é").matches());
    assert!(pattern.matcher("e\u{301}").matches());

    let pattern = Pattern::new("é").unwrap();
    assert!(!pattern.matcher("e\u{301}").matches());

    let pattern = Compiler::new().canon_eq(true).compile("[é]").unwrap();
    assert!(pattern.matcher("e\u{301}").matches());
    assert!(pattern.matcher("é").matches());

    // Marks with different combining classes can come in any order.
    let pattern =
        Compiler::new().canon_eq(true).compile("e\u{301}\u{323}").unwrap();
    assert!(pattern.matcher("e\u{323}\u{301}").matches());
    assert!(pattern.matcher("\u{1EB9}\u{301}").matches());

    // Hangul syllables match their conjoining jamo, whichever way the
    // pattern is written.
    for syllable in ["\u{D55C}", "\u{1112}\u{1161}\u{11AB}"] {
        let pattern =
            Compiler::new().canon_eq(true).compile(syllable).unwrap();
        assert!(pattern.matcher("\u{D55C}").matches());
        assert!(pattern.matcher("\u{1112}\u{1161}\u{11AB}").matches());
        assert!(pattern.matcher("\u{D558}\u{11AB}").matches());
        assert!(!pattern.matcher("\u{D558}").matches());
    }

    let pattern = Compiler::new().canon_eq(true).compile("\u{D558}").unwrap();
    assert!(pattern.matcher("\u{1112}\u{1161}").matches());
    assert!(!pattern.matcher("\u{D55C}").matches());

    let pattern =
        Compiler::new().canon_eq(true).compile("[\u{D55C}]+").unwrap();
    assert!(pattern
        .matcher("\u{1112}\u{1161}\u{11AB}\u{D55C}")
        .matches());
}

#[test]
fn pathological_patterns() {
    init_logger();

    let input = format!("{}b", "a".repeat(25));
    pattern_false!("(a|aa)+$", input.as_str());
    pattern_false!("(a|aa)+c", input.as_str());
    pattern_match!("(a|aa)+b", input.as_str(), input.as_str());

    // Fixed-length bodies are repeated iteratively.
    let input = "a".repeat(10_000);
    pattern_match!("(?:a|b)*", input.as_str(), input.as_str());

    let input = "a".repeat(200);
    pattern_match!("(ab|a)*", input.as_str(), input.as_str());
}

#[test]
fn deterministic_loops() {
    init_logger();

    let patterns = [
        "(ab)*c",
        "(a|b)+?b",
        "(?:ab){2,3}",
        "(a)(?:b|c){1,2}d",
        "((a)b)*",
        "(a|b){2}+b",
        "(?:x|y)*?z",
        "(?<p>[ab]){1,3}",
    ];

    let inputs = ["ababc", "aabbb", "abababab", "abcd acbd", "xyxz", "bbbb"];

    for re in patterns {
        let fast = Compiler::new().compile(re).unwrap();
        let slow =
            Compiler::new().deterministic_loops(false).compile(re).unwrap();

        for input in inputs {
            let spans = |pattern: &Pattern| {
                let mut matcher = pattern.matcher(input);
                let mut spans = Vec::new();
                while matcher.find() {
                    spans.push(
                        (0..=matcher.group_count())
                            .map(|g| {
                                (
                                    matcher.start_group(g).unwrap(),
                                    matcher.end_group(g).unwrap(),
                                )
                            })
                            .collect::<Vec<_>>(),
                    );
                }
                spans
            };

            assert_eq!(
                spans(&fast),
                spans(&slow),
                "\n\n`{}` applied to `{}`",
                re,
                input
            );
        }
    }
}

#[test]
fn split() {
    let pattern = Pattern::new(r"\s*,\s*").unwrap();
    assert_eq!(pattern.split("a , b,c", 0), vec!["a", "b", "c"]);
    assert_eq!(pattern.split("a,b,,", 0), vec!["a", "b"]);
    assert_eq!(pattern.split("a,b,,", -1), vec!["a", "b", "", ""]);
    assert_eq!(pattern.split("a,b,c", 2), vec!["a", "b,c"]);
    assert_eq!(pattern.split("abc", 0), vec!["abc"]);
    assert_eq!(pattern.split("", 0), vec![""]);
    assert_eq!(pattern.split(",a", 0), vec!["", "a"]);

    // Zero-width matches at the beginning don't produce a leading empty
    // string.
    let pattern = Pattern::new("").unwrap();
    assert_eq!(pattern.split("abc", 0), vec!["a", "b", "c"]);

    assert_eq!(
        crate::split("o", "boo:and:foo", 0).unwrap(),
        vec!["b", "", ":and:f"]
    );
}

#[test]
fn split_iter() {
    let pattern = Pattern::new("o").unwrap();
    let pieces: Vec<_> = pattern.split_iter("boo:and:foo").collect();
    assert_eq!(pieces, vec!["b", "", ":and:f"]);

    for input in ["a , b,c", "a,b,,", ",a", "abc", ""] {
        let pattern = Pattern::new(r"\s*,\s*").unwrap();
        assert_eq!(
            pattern.split_iter(input).collect::<Vec<_>>(),
            pattern.split(input, 0),
            "\n\nsplitting `{}`",
            input
        );
    }

    let pattern = Pattern::new("").unwrap();
    assert_eq!(
        pattern.split_iter("abc").collect::<Vec<_>>(),
        vec!["a", "b", "c"]
    );
}

#[test]
fn replace() {
    assert_eq!(
        crate::replace_all(r"(\w+) (\w+)", "hello world", "$2 $1").unwrap(),
        "world hello"
    );
    assert_eq!(crate::replace_first("a", "banana", "o").unwrap(), "bonana");
    assert_eq!(crate::replace_all("x*", "abc", "-").unwrap(), "-a-b-c-");
    assert!(matches!(
        crate::replace_all("(", "abc", "-"),
        Err(crate::Error::SyntaxError(_))
    ));
    assert!(matches!(
        crate::replace_all("a", "abc", "$2"),
        Err(crate::Error::MatchError(MatchError::NoGroup(2)))
    ));
}

#[test]
fn predicates() {
    let pattern = Pattern::new(r"\d+").unwrap();

    let contains_digits = pattern.as_predicate();
    assert!(contains_digits("abc123"));
    assert!(!contains_digits("abc"));

    let only_digits = pattern.as_match_predicate();
    assert!(only_digits("123"));
    assert!(!only_digits("abc123"));

    assert_eq!(Pattern::matches(r"\d+", "123"), Ok(true));
    assert_eq!(Pattern::matches(r"\d+", "12a"), Ok(false));
    assert!(Pattern::matches("(", "").is_err());
}

#[test]
fn match_results_outlive_matcher() {
    let pattern = Pattern::new(r"(?<word>\w+)").unwrap();
    let input = String::from("alpha beta");

    let results: Vec<_> = pattern.matcher(&input).results().collect();

    assert_eq!(results.len(), 2);
    assert_eq!(results[1].group_named("word"), Ok(Some("beta")));
    assert_eq!(results[1].start_group(1), Ok(Some(6)));
    assert_eq!(results[1].end(), 10);
    assert_eq!(results[0].group_count(), 1);
}

#[test]
fn send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Pattern>();
    assert_send_sync::<crate::Matcher<'static>>();

    let pattern = Pattern::new(r"\d").unwrap();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let pattern = pattern.clone();
            std::thread::spawn(move || {
                pattern.matcher(&i.to_string()).matches()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

#[test]
fn serialization() {
    let pattern = Compiler::new()
        .case_insensitive(true)
        .compile(r"(?<x>ab)+")
        .unwrap();

    let serialized = bincode::serialize(&pattern).unwrap();
    let deserialized: Pattern = bincode::deserialize(&serialized).unwrap();

    assert_eq!(deserialized.as_str(), pattern.as_str());
    assert_eq!(deserialized.flags().to_raw(), pattern.flags().to_raw());
    assert!(deserialized.matcher("ABab").matches());
    assert_eq!(format!("{:?}", deserialized), format!("{:?}", pattern));
    assert_eq!(deserialized.to_string(), "(?<x>ab)+");
}
