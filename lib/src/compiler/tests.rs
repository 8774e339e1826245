use pretty_assertions::assert_eq;

use crate::flags::{Flag, Flags};
use crate::Pattern;

use super::Compiler;

macro_rules! assert_program {
    ($re:expr, $code:expr) => {{
        let pattern = Compiler::new().compile($re).unwrap();
        assert_eq!($code, format!("\n{}", pattern.program));
    }};
}

macro_rules! assert_syntax_error {
    ($re:expr, $description:expr) => {{
        let err = Compiler::new().compile($re).unwrap_err();
        assert_eq!($description, err.description());
    }};
    ($re:expr, $description:expr, $index:expr) => {{
        let err = Compiler::new().compile($re).unwrap_err();
        assert_eq!($description, err.description());
        assert_eq!(Some($index), err.index());
    }};
}

#[test]
fn literal_programs() {
    assert_program!(
        "abcd",
        r#"
00000: ACCEPT
00001: LAST
00002: SLICE "abcd" -> 00001
00003: BNM "abcd" -> 00001
"#
    );

    // Literals too short for Boyer-Moore are searched position by position.
    assert_program!(
        "ab",
        r#"
00000: ACCEPT
00001: LAST
00002: SLICE "ab" -> 00001
00003: START min=2 -> 00002
"#
    );

    // Anchored programs don't need a search node.
    assert_program!(
        "^abc",
        r#"
00000: ACCEPT
00001: LAST
00002: BEGIN -> 00003
00003: SLICE "abc" -> 00001
"#
    );
}

#[test]
fn repetition_programs() {
    assert_program!(
        "a*b",
        r#"
00000: ACCEPT
00001: LAST
00002: CHAR_GREEDY 'a' min=0 -> 00003
00003: CHAR 'b' -> 00001
00004: START min=1 -> 00002
"#
    );

    assert_program!(
        "(a)*",
        r#"
00000: ACCEPT
00001: LAST
00002: GROUP_HEAD local=0 -> 00004
00003: GROUP_TAIL local=0 group=1 -> 00000
00004: CHAR 'a' -> 00003
00005: GROUP_CURLY {0,MAX} greedy atom=00004 local=0 group=1 -> 00001
00006: START min=0 -> 00005
"#
    );

    // The alternatives have different lengths, so the group needs a loop.
    assert_program!(
        "(a|bc)+",
        r#"
00000: ACCEPT
00001: LAST
00002: GROUP_HEAD local=0 -> 00007
00003: GROUP_TAIL local=0 group=1 -> 00008
00004: CHAR 'a' -> 00006
00005: SLICE "bc" -> 00006
00006: BRANCH_CONN -> 00003
00007: BRANCH [00004, 00005] conn=00006
00008: LOOP {1,MAX} body=00002 count=1 begin=0 memo=0 -> 00001
00009: PROLOG loop=00008
00010: START min=0 -> 00009
"#
    );
}

#[test]
fn deterministic_loops_can_be_disabled() {
    let pattern =
        Compiler::new().deterministic_loops(false).compile("(a)*").unwrap();
    let dump = pattern.program.to_string();
    assert!(dump.contains("LOOP {0,MAX}"));
    assert!(!dump.contains("GROUP_CURLY"));
}

#[test]
fn syntax_errors() {
    assert_syntax_error!("(abc", "Unclosed group", 4);
    assert_syntax_error!("abc)", "Unmatched closing ')'", 2);
    assert_syntax_error!("[abc", "Unclosed character class", 3);
    assert_syntax_error!("a{2,1}", "Illegal repetition range", 5);
    assert_syntax_error!("*a", "Dangling meta character '*'", 0);
    assert_syntax_error!(
        "(?<=a+)b",
        "Look-behind group does not have an obvious maximum length"
    );
    assert_syntax_error!(
        "(?<a>x)(?<a>y)",
        "Named capturing group <a> is already defined"
    );
    assert_syntax_error!(
        r"\k<nope>",
        "named capturing group <nope> does not exist"
    );
    assert_syntax_error!(r"(a)\2", "Illegal back reference to group 2");
    assert_syntax_error!("(?<1a>x)", "Unknown look-behind group");
    assert_syntax_error!(
        r"(a)\k<1>",
        "capturing group name does not start with a Latin letter"
    );
    assert_syntax_error!("(?$x)", "Unknown group type");
    assert_syntax_error!("(?q)", "Unknown inline modifier");
    assert_syntax_error!("a**", "Dangling meta character '*'");
    assert_syntax_error!("a{1", "Unclosed counted closure");
    assert_syntax_error!("[b-a]", "Illegal character range");
    assert_syntax_error!(r"\p{", "Unclosed character family");
    assert_syntax_error!(r"\p{}", "Empty character family");
    assert_syntax_error!(r"\q", "Illegal/unsupported escape sequence");
    assert_syntax_error!(r"\x{110000}", "Hexadecimal codepoint is too big");
    assert_syntax_error!(
        r"\p{NoSuchThing}",
        "Unknown character property name {NoSuchThing}"
    );
    assert_syntax_error!(
        r"\p{sc=Klingon}",
        "Unknown Unicode property {name=<sc>, value=<Klingon>}"
    );
}

#[test]
fn syntax_error_display() {
    let err = Pattern::new("(abc").unwrap_err();
    assert_eq!(err.pattern(), "(abc");
    assert_eq!(err.to_string(), "Unclosed group near index 4\n(abc");

    let err = Pattern::new("*a").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Dangling meta character '*' near index 0\n*a\n^"
    );

    let report = err.detailed_report();
    assert!(report.contains("Dangling meta character '*'"));
    assert!(report.contains("here"));
}

#[test]
fn flags() {
    let compiler = Compiler::new()
        .case_insensitive(true)
        .multiline(true)
        .multiline(false)
        .clone();
    let pattern = compiler.compile("x").unwrap();

    assert!(pattern.flags().contains(Flag::CaseInsensitive));
    assert!(!pattern.flags().contains(Flag::Multiline));

    // Unicode character classes imply Unicode case folding.
    let pattern =
        Compiler::new().unicode_character_class(true).compile("x").unwrap();
    assert!(pattern.flags().contains(Flag::UnicodeCase));

    let flags = Flags::from_raw(0x02 | 0x20 | 0x1000);
    assert!(flags.contains(Flag::CaseInsensitive));
    assert!(flags.contains(Flag::DotAll));
    assert_eq!(flags.to_raw(), 0x22);
}

#[test]
fn literal_flag() {
    let pattern = Compiler::new().literal(true).compile("a.b(").unwrap();
    assert!(pattern.matcher("xa.b(x").find());
    assert!(!pattern.matcher("axb(").find());
}

#[test]
fn group_names() {
    let pattern = Pattern::new(r"(?<first>\w)(\w)(?<third>\w)").unwrap();
    let mut names: Vec<_> = pattern.group_names().collect();
    names.sort();
    assert_eq!(names, vec![("first", 1), ("third", 3)]);
    assert_eq!(pattern.group_count(), 3);
}
