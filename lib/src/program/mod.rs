/*! The matching program.

A compiled pattern is a graph of small matching primitives ([`Node`]s).
Each node tests something at the current position and, if the test
succeeds, hands over to its continuation, the node pointed to by
[`Node::next`]. Quantifiers and groups add more edges (the repeated atom,
the alternatives of a branch, the body of a loop), and loops point back to
themselves, so the graph can have cycles.

Nodes live in an arena ([`Program::nodes`]) and refer to each other by
[`NodeId`]. The node at index 0 is always [`NodeKind::Accept`], the default
continuation of every node, and the one that terminates sub-programs like
the atom of a quantifier or the condition of a lookahead.
*/

use std::fmt::{Display, Formatter};

pub(crate) use predicate::{BitClass, CharPredicate};

mod predicate;

/// Identifies a node within a [`Program`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    /// The [`NodeKind::Accept`] node that every program starts with.
    pub const ACCEPT: NodeId = NodeId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:05}", self.0)
    }
}

/// Backtracking policy of a quantifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Greed {
    /// Repeat as much as possible, give back on failure.
    Greedy,
    /// Repeat as little as possible, take more on failure.
    Lazy,
    /// Repeat as much as possible and never give back.
    Possessive,
    /// Atomic group `(?>...)`: match the body once, never backtrack into
    /// it.
    Independent,
}

impl Display for Greed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Greed::Greedy => "greedy",
            Greed::Lazy => "lazy",
            Greed::Possessive => "possessive",
            Greed::Independent => "independent",
        })
    }
}

/// How literal text is compared against the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CaseFold {
    None,
    /// Characters are compared after ASCII lowercasing.
    Ascii,
    /// Characters are compared after Unicode folding.
    Unicode,
}

/// Whether a word boundary assertion is `\b` or `\B`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Boundary {
    Word,
    NotWord,
}

/// Precomputed tables for the Boyer-Moore literal search.
#[derive(Clone, Debug)]
pub(crate) struct BoyerMoore {
    pub chars: Box<[char]>,
    /// For each value of the 7 least significant bits of a character, one
    /// past the last position in `chars` where a character with those bits
    /// appears, or 0.
    pub last_occurrence: Box<[usize; 128]>,
    /// Good suffix shift for a mismatch at each position.
    pub good_suffix: Box<[usize]>,
}

/// The different kinds of nodes.
#[derive(Clone, Debug)]
pub(crate) enum NodeKind {
    /// Records the end of a match and succeeds. Terminates sub-programs.
    Accept,
    /// Terminates the main program. When the whole region must be matched
    /// it fails unless the region end was reached.
    LastAccept,
    /// Terminates the condition of a lookbehind, which must end exactly at
    /// the position where the lookbehind was evaluated.
    LookBehindEnd,
    /// Tries the rest of the program at every position, from left to right.
    Start { min_length: usize },
    /// Searches for a literal with Boyer-Moore, then tries the rest of the
    /// program after every occurrence.
    BoyerMoore(BoyerMoore),
    /// `\A`, or `^` without `Multiline`.
    Begin,
    /// `\z`
    End,
    /// `^` with `Multiline`.
    Caret { unix: bool },
    /// `$` and `\Z`.
    Dollar { multiline: bool, unix: bool },
    /// `\G`
    LastMatch,
    /// `\b` and `\B`.
    WordBoundary { kind: Boundary, unicode: bool },
    /// `\R`
    LineEnding,
    /// Consumes one character satisfying the predicate.
    Char(CharPredicate),
    /// Like [`NodeKind::Char`], but the input character together with any
    /// combining marks following it is composed before the predicate is
    /// tested.
    CanonChar(CharPredicate),
    /// Consumes a run of literal characters.
    Slice { chars: Box<[char]>, fold: CaseFold },
    /// `*` or `+` applied to a single character predicate.
    CharGreedy { predicate: CharPredicate, min: usize },
    /// `?` applied to `atom`, also used for atomic groups.
    Ques { atom: NodeId, greed: Greed },
    /// Counted repetition of an atom that is not a group.
    Curly { atom: NodeId, min: usize, max: usize, greed: Greed },
    /// Counted repetition of a group whose body always matches the same
    /// number of characters.
    GroupCurly {
        atom: NodeId,
        min: usize,
        max: usize,
        greed: Greed,
        local: usize,
        group: Option<usize>,
    },
    /// Start of a group. Records the position in a local slot.
    GroupHead { local: usize },
    /// End of a group. Records the capture when `group` is not `None`.
    GroupTail { local: usize, group: Option<usize> },
    /// Entry point to a [`NodeKind::Loop`].
    Prolog { lp: NodeId },
    /// Counted repetition of a group with a variable-length body. The body
    /// ends with a group tail that jumps back here.
    Loop {
        body: NodeId,
        count_local: usize,
        begin_local: usize,
        min: usize,
        max: usize,
        lazy: bool,
        /// Index of the set of positions where the body is known to fail,
        /// for loops that can use it.
        memo: Option<usize>,
    },
    /// Alternation. `None` alternatives match the empty string.
    Branch { alternatives: Vec<Option<NodeId>>, conn: NodeId },
    /// Joins the alternatives of a branch.
    BranchConn,
    /// `\1`, `\k<name>`.
    BackRef { group: usize, fold: CaseFold },
    /// `(?=...)` and `(?!...)`.
    LookAhead { cond: NodeId, negated: bool },
    /// `(?<=...)` and `(?<!...)`.
    LookBehind { cond: NodeId, min: usize, max: usize, negated: bool },
}

/// A node in the program.
#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub kind: NodeKind,
    pub next: NodeId,
}

/// Maximum number of repetitions allowed in a quantifier.
pub(crate) const MAX_REPS: usize = 0x7FFF_FFFF;

/// A compiled program.
#[derive(Clone, Debug)]
pub(crate) struct Program {
    pub nodes: Vec<Node>,
    /// Entry point for searches (`find`).
    pub root: NodeId,
    /// Entry point for anchored matches (`matches` and `looking_at`).
    pub match_root: NodeId,
}

impl Program {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node { kind: NodeKind::Accept, next: NodeId::ACCEPT }],
            root: NodeId::ACCEPT,
            match_root: NodeId::ACCEPT,
        }
    }

    /// Adds a node whose continuation is [`NodeId::ACCEPT`].
    pub fn push(&mut self, kind: NodeKind) -> NodeId {
        self.push_with_next(kind, NodeId::ACCEPT)
    }

    pub fn push_with_next(&mut self, kind: NodeKind, next: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, next });
        id
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub fn set_next(&mut self, id: NodeId, next: NodeId) {
        self.nodes[id.index()].next = next;
    }
}

fn fmt_max(max: usize) -> String {
    if max == MAX_REPS {
        "MAX".to_string()
    } else {
        max.to_string()
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Accept => write!(f, "ACCEPT"),
            NodeKind::LastAccept => write!(f, "LAST"),
            NodeKind::LookBehindEnd => write!(f, "LOOKBEHIND_END"),
            NodeKind::Start { min_length } => {
                write!(f, "START min={}", min_length)
            }
            NodeKind::BoyerMoore(bm) => {
                write!(f, "BNM {:?}", bm.chars.iter().collect::<String>())
            }
            NodeKind::Begin => write!(f, "BEGIN"),
            NodeKind::End => write!(f, "END"),
            NodeKind::Caret { unix: false } => write!(f, "CARET"),
            NodeKind::Caret { unix: true } => write!(f, "UNIX_CARET"),
            NodeKind::Dollar { multiline, unix } => write!(
                f,
                "{}DOLLAR{}",
                if *unix { "UNIX_" } else { "" },
                if *multiline { " multiline" } else { "" }
            ),
            NodeKind::LastMatch => write!(f, "LAST_MATCH"),
            NodeKind::WordBoundary { kind, unicode } => write!(
                f,
                "{}{}",
                match kind {
                    Boundary::Word => "BOUND",
                    Boundary::NotWord => "NOT_BOUND",
                },
                if *unicode { " unicode" } else { "" }
            ),
            NodeKind::LineEnding => write!(f, "LINE_ENDING"),
            NodeKind::Char(p) => write!(f, "CHAR {}", p),
            NodeKind::CanonChar(p) => write!(f, "CANON_CHAR {}", p),
            NodeKind::Slice { chars, fold } => write!(
                f,
                "SLICE{} {:?}",
                match fold {
                    CaseFold::None => "",
                    CaseFold::Ascii => "_I",
                    CaseFold::Unicode => "_U",
                },
                chars.iter().collect::<String>()
            ),
            NodeKind::CharGreedy { predicate, min } => {
                write!(f, "CHAR_GREEDY {} min={}", predicate, min)
            }
            NodeKind::Ques { atom, greed } => {
                write!(f, "QUES {} atom={}", greed, atom)
            }
            NodeKind::Curly { atom, min, max, greed } => write!(
                f,
                "CURLY {{{},{}}} {} atom={}",
                min,
                fmt_max(*max),
                greed,
                atom
            ),
            NodeKind::GroupCurly { atom, min, max, greed, local, group } => {
                write!(
                    f,
                    "GROUP_CURLY {{{},{}}} {} atom={} local={}",
                    min,
                    fmt_max(*max),
                    greed,
                    atom,
                    local
                )?;
                if let Some(group) = group {
                    write!(f, " group={}", group)?;
                }
                Ok(())
            }
            NodeKind::GroupHead { local } => {
                write!(f, "GROUP_HEAD local={}", local)
            }
            NodeKind::GroupTail { local, group } => {
                write!(f, "GROUP_TAIL local={}", local)?;
                if let Some(group) = group {
                    write!(f, " group={}", group)?;
                }
                Ok(())
            }
            NodeKind::Prolog { lp } => write!(f, "PROLOG loop={}", lp),
            NodeKind::Loop {
                body,
                count_local,
                begin_local,
                min,
                max,
                lazy,
                memo,
            } => {
                write!(
                    f,
                    "{} {{{},{}}} body={} count={} begin={}",
                    if *lazy { "LAZY_LOOP" } else { "LOOP" },
                    min,
                    fmt_max(*max),
                    body,
                    count_local,
                    begin_local
                )?;
                if let Some(memo) = memo {
                    write!(f, " memo={}", memo)?;
                }
                Ok(())
            }
            NodeKind::Branch { alternatives, conn } => {
                write!(f, "BRANCH [")?;
                for (i, alt) in alternatives.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match alt {
                        Some(alt) => write!(f, "{}", alt)?,
                        None => write!(f, "-")?,
                    }
                }
                write!(f, "] conn={}", conn)
            }
            NodeKind::BranchConn => write!(f, "BRANCH_CONN"),
            NodeKind::BackRef { group, fold } => write!(
                f,
                "BACKREF{} {}",
                match fold {
                    CaseFold::None => "",
                    CaseFold::Ascii => "_I",
                    CaseFold::Unicode => "_U",
                },
                group
            ),
            NodeKind::LookAhead { cond, negated } => write!(
                f,
                "{} cond={}",
                if *negated { "NEG" } else { "POS" },
                cond
            ),
            NodeKind::LookBehind { cond, min, max, negated } => write!(
                f,
                "{} {{{},{}}} cond={}",
                if *negated { "NOT_BEHIND" } else { "BEHIND" },
                min,
                max,
                cond
            ),
        }
    }
}

/// Dumps the program, one node per line. Nodes that end a sub-program
/// don't show their continuation.
impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            write!(f, "{:05}: {}", i, node.kind)?;
            match node.kind {
                NodeKind::Accept
                | NodeKind::LastAccept
                | NodeKind::LookBehindEnd
                | NodeKind::Prolog { .. }
                | NodeKind::Branch { .. } => {}
                _ => write!(f, " -> {}", node.next)?,
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
