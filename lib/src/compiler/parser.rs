use rustc_hash::FxHashMap;

use crate::errors::SyntaxError;
use crate::flags::{Flag, Flags};
use crate::program::{
    Boundary, CaseFold, CharPredicate, Greed, NodeId, NodeKind, Program,
    MAX_REPS,
};
use crate::unicode::{self, AsciiClass};

use super::canon;
use super::study::{study, TreeInfo};

/// Result of parsing a pattern.
pub(super) struct ParseOutput {
    pub program: Program,
    /// Number of capturing groups, not counting group 0.
    pub group_count: usize,
    pub named_groups: FxHashMap<String, usize>,
    pub local_count: usize,
    pub memo_count: usize,
}

/// What an escape sequence stands for.
pub(super) enum Escaped {
    /// A single literal character, like `\t` or `\x41`.
    Char(char),
    /// A predefined class, like `\d` or `\H`.
    Class(CharPredicate),
    /// A zero-width assertion or a back reference.
    Node(NodeKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QuantifierKind {
    /// `?`
    Optional,
    /// `*` or `+`
    Unbounded,
    /// `{n}`, `{n,}` or `{n,m}`
    Counted,
}

#[derive(Clone, Copy, Debug)]
struct Quantifier {
    min: usize,
    max: usize,
    greed: Greed,
    kind: QuantifierKind,
}

/// Recursive descent parser that builds the program while reading the
/// pattern.
///
/// The cursor always points to the next character to be read. Functions
/// with a `raw` suffix ignore [`Flag::Comments`], the rest skip whitespace
/// and comments before looking at the next character.
pub(super) struct Parser<'a> {
    source: &'a str,
    pub(super) pattern: Vec<char>,
    pub(super) cursor: usize,
    pub(super) flags: Flags,
    pub(super) program: Program,
    /// Number of capturing groups seen so far, including group 0.
    capturing_group_count: usize,
    local_count: usize,
    named_groups: FxHashMap<String, usize>,
    /// Back references found so far, with the index where they appear.
    group_refs: Vec<(usize, usize)>,
    /// Greedy unbounded loops that are not nested inside other repeated
    /// groups or lookbehinds.
    top_closure_nodes: Vec<NodeId>,
    deterministic_loops: bool,
}

impl<'a> Parser<'a> {
    pub fn new(
        source: &'a str,
        flags: Flags,
        deterministic_loops: bool,
    ) -> Self {
        Self {
            source,
            pattern: source.chars().collect(),
            cursor: 0,
            flags,
            program: Program::new(),
            capturing_group_count: 1,
            local_count: 0,
            named_groups: FxHashMap::default(),
            group_refs: Vec::new(),
            top_closure_nodes: Vec::new(),
            deterministic_loops,
        }
    }

    pub fn parse(mut self) -> Result<ParseOutput, SyntaxError> {
        let last_accept = self.program.push(NodeKind::LastAccept);

        let match_root = if self.has(Flag::Literal) {
            let slice = self.new_slice(self.pattern.clone());
            self.program.set_next(slice, last_accept);
            slice
        } else {
            self.pattern = remove_qe_quoting(&self.pattern);

            if self.has(Flag::CanonEq) {
                self.pattern = canon::normalize(&self.pattern);
            }

            let root = self.expr(last_accept)?;

            if self.cursor < self.pattern.len() {
                return Err(if self.peek_raw() == Some(')') {
                    self.error("Unmatched closing ')'")
                } else {
                    self.error("Unexpected internal error")
                });
            }

            root
        };

        for (group, index) in self.group_refs.iter() {
            if *group >= self.capturing_group_count {
                return Err(SyntaxError::new(
                    format!("Illegal back reference to group {}", group),
                    self.source,
                    Some(*index),
                ));
            }
        }

        // Loops remember the positions where they failed only when there
        // are no back references, as those make the outcome depend on the
        // captures and not only on the position.
        let mut memo_count = 0;

        if self.group_refs.is_empty() {
            for id in self.top_closure_nodes.iter() {
                if let NodeKind::Loop { memo, .. } =
                    &mut self.program.node_mut(*id).kind
                {
                    *memo = Some(memo_count);
                    memo_count += 1;
                }
            }
        }

        self.program.match_root = match_root;
        self.program.root = match_root;

        Ok(ParseOutput {
            program: self.program,
            group_count: self.capturing_group_count - 1,
            named_groups: self.named_groups,
            local_count: self.local_count,
            memo_count,
        })
    }

    /// Creates an error located at the last character read.
    pub(super) fn error<D: Into<String>>(
        &self,
        description: D,
    ) -> SyntaxError {
        SyntaxError::new(
            description,
            self.source,
            Some(self.cursor.saturating_sub(1)),
        )
    }

    #[inline]
    pub(super) fn has(&self, flag: Flag) -> bool {
        self.flags.contains(flag)
    }

    fn skip_comments(&mut self) {
        if !self.has(Flag::Comments) {
            return;
        }
        while let Some(c) = self.peek_raw() {
            if unicode::is_ascii_space(c) {
                self.cursor += 1;
            } else if c == '#' {
                while let Some(c) = self.read_raw() {
                    if unicode::is_line_terminator(c) {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    pub(super) fn peek(&mut self) -> Option<char> {
        self.skip_comments();
        self.peek_raw()
    }

    pub(super) fn read(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += 1;
        Some(c)
    }

    #[inline]
    pub(super) fn peek_raw(&self) -> Option<char> {
        self.peek_raw_at(0)
    }

    #[inline]
    pub(super) fn peek_raw_at(&self, offset: usize) -> Option<char> {
        self.pattern.get(self.cursor + offset).copied()
    }

    pub(super) fn read_raw(&mut self) -> Option<char> {
        let c = self.peek_raw()?;
        self.cursor += 1;
        Some(c)
    }

    fn accept(
        &mut self,
        c: char,
        description: &str,
    ) -> Result<(), SyntaxError> {
        match self.peek() {
            Some(next) => {
                self.cursor += 1;
                if next == c {
                    return Ok(());
                }
            }
            None => self.cursor += 1,
        }
        Err(self.error(description))
    }

    /// Parses alternatives separated by `|`. Each alternative continues at
    /// `end` when it matches.
    fn expr(&mut self, end: NodeId) -> Result<NodeId, SyntaxError> {
        let mut prev: Option<NodeId> = None;
        let mut first_tail = end;
        let mut branch: Option<NodeId> = None;
        let mut conn: Option<NodeId> = None;

        loop {
            let (node, node_tail) = self.sequence(end)?;

            match prev {
                None => {
                    prev = Some(node);
                    first_tail = node_tail;
                }
                Some(p) => {
                    let conn = match conn {
                        Some(conn) => conn,
                        None => {
                            let c = self
                                .program
                                .push_with_next(NodeKind::BranchConn, end);
                            conn = Some(c);
                            c
                        }
                    };

                    let alternative = if node == end {
                        None
                    } else {
                        self.program.set_next(node_tail, conn);
                        Some(node)
                    };

                    if Some(p) == branch {
                        if let NodeKind::Branch { alternatives, .. } =
                            &mut self.program.node_mut(p).kind
                        {
                            alternatives.push(alternative);
                        }
                    } else {
                        let first = if p == end {
                            None
                        } else {
                            self.program.set_next(first_tail, conn);
                            Some(p)
                        };
                        let b = self.program.push(NodeKind::Branch {
                            alternatives: vec![first, alternative],
                            conn,
                        });
                        branch = Some(b);
                        prev = Some(b);
                    }
                }
            }

            if self.peek() != Some('|') {
                break;
            }
            self.cursor += 1;
        }

        Ok(prev.unwrap_or(end))
    }

    /// Parses a concatenation. Returns its first and last nodes, which are
    /// both `end` if the sequence is empty.
    fn sequence(
        &mut self,
        end: NodeId,
    ) -> Result<(NodeId, NodeId), SyntaxError> {
        let mut head: Option<NodeId> = None;
        let mut tail = end;

        while let Some(ch) = self.peek() {
            let (node, node_tail) = match ch {
                '(' => match self.group0()? {
                    Some(pair) => pair,
                    None => continue,
                },
                '[' => {
                    self.cursor += 1;
                    let predicate = self.class(true)?;
                    let node = if self.has(Flag::CanonEq) {
                        self.program.push(NodeKind::CanonChar(predicate))
                    } else {
                        self.program.push(NodeKind::Char(predicate))
                    };
                    let node = self.closure(node)?;
                    (node, node)
                }
                '\\' => {
                    let is_property =
                        matches!(self.peek_raw_at(1), Some('p' | 'P'));
                    let node = if is_property {
                        let predicate = self.property_escape()?;
                        self.program.push(NodeKind::Char(predicate))
                    } else {
                        let start = self.cursor;
                        match self.escape(false, false)? {
                            Escaped::Char(_) => {
                                self.cursor = start;
                                self.atom()?
                            }
                            Escaped::Class(predicate) => {
                                self.program.push(NodeKind::Char(predicate))
                            }
                            Escaped::Node(kind) => self.program.push(kind),
                        }
                    };
                    let node = self.closure(node)?;
                    (node, node)
                }
                '^' => {
                    self.cursor += 1;
                    let kind = if self.has(Flag::Multiline) {
                        NodeKind::Caret { unix: self.has(Flag::UnixLines) }
                    } else {
                        NodeKind::Begin
                    };
                    let node = self.program.push(kind);
                    let node = self.closure(node)?;
                    (node, node)
                }
                '$' => {
                    self.cursor += 1;
                    let node = self.program.push(NodeKind::Dollar {
                        multiline: self.has(Flag::Multiline),
                        unix: self.has(Flag::UnixLines),
                    });
                    let node = self.closure(node)?;
                    (node, node)
                }
                '.' => {
                    self.cursor += 1;
                    let predicate = if self.has(Flag::DotAll) {
                        CharPredicate::All
                    } else if self.has(Flag::UnixLines) {
                        CharPredicate::UnixDot
                    } else {
                        CharPredicate::Dot
                    };
                    let node = self.program.push(NodeKind::Char(predicate));
                    let node = self.closure(node)?;
                    (node, node)
                }
                '|' | ')' => break,
                '?' | '*' | '+' => {
                    self.cursor += 1;
                    return Err(self
                        .error(format!("Dangling meta character '{}'", ch)));
                }
                _ => {
                    let node = self.atom()?;
                    let node = self.closure(node)?;
                    (node, node)
                }
            };

            match head {
                None => head = Some(node),
                Some(_) => self.program.set_next(tail, node),
            }
            tail = node_tail;
        }

        match head {
            None => Ok((end, end)),
            Some(head) => {
                self.program.set_next(tail, end);
                Ok((head, tail))
            }
        }
    }

    /// Parses a run of literal characters. The last character is left out
    /// when it is followed by a quantifier, so that the quantifier applies
    /// to that character alone.
    fn atom(&mut self) -> Result<NodeId, SyntaxError> {
        let mut buffer: Vec<char> = Vec::new();
        let mut prev = self.cursor;

        while let Some(ch) = self.peek() {
            match ch {
                '*' | '+' | '?' | '{' => {
                    if buffer.len() > 1 {
                        self.cursor = prev;
                        buffer.pop();
                    }
                    break;
                }
                '$' | '.' | '^' | '(' | '[' | '|' | ')' => break,
                '\\' => {
                    if matches!(self.peek_raw_at(1), Some('p' | 'P')) {
                        if !buffer.is_empty() {
                            break;
                        }
                        let predicate = self.property_escape()?;
                        return Ok(self
                            .program
                            .push(NodeKind::Char(predicate)));
                    }
                    let start = self.cursor;
                    match self.escape(false, false)? {
                        Escaped::Char(c) => {
                            prev = start;
                            buffer.push(c);
                        }
                        Escaped::Class(predicate) if buffer.is_empty() => {
                            return Ok(self
                                .program
                                .push(NodeKind::Char(predicate)))
                        }
                        Escaped::Node(kind) if buffer.is_empty() => {
                            return Ok(self.program.push(kind))
                        }
                        _ => {
                            self.cursor = start;
                            break;
                        }
                    }
                }
                _ => {
                    prev = self.cursor;
                    buffer.push(ch);
                    self.cursor += 1;
                }
            }
        }

        if buffer.len() == 1 {
            let predicate = self.single(buffer[0]);
            Ok(self.program.push(NodeKind::Char(predicate)))
        } else {
            Ok(self.new_slice(buffer))
        }
    }

    fn new_slice(&mut self, mut chars: Vec<char>) -> NodeId {
        let fold = if self.has(Flag::CaseInsensitive) {
            if self.has(Flag::UnicodeCase) {
                chars.iter_mut().for_each(|c| *c = unicode::fold(*c));
                CaseFold::Unicode
            } else {
                chars.iter_mut().for_each(|c| *c = c.to_ascii_lowercase());
                CaseFold::Ascii
            }
        } else {
            CaseFold::None
        };
        self.program
            .push(NodeKind::Slice { chars: chars.into_boxed_slice(), fold })
    }

    /// Predicate for a single literal character, honoring case
    /// insensitivity.
    pub(super) fn single(&self, c: char) -> CharPredicate {
        if self.has(Flag::CaseInsensitive) {
            if self.has(Flag::UnicodeCase) {
                let upper = unicode::to_upper(c);
                let lower = unicode::to_lower(upper);
                if upper != lower {
                    return CharPredicate::SingleU(lower);
                }
            } else if c.is_ascii_alphabetic() {
                return CharPredicate::SingleI {
                    lower: c.to_ascii_lowercase(),
                    upper: c.to_ascii_uppercase(),
                };
            }
        }
        CharPredicate::Single(c)
    }

    fn case_fold(&self) -> CaseFold {
        if !self.has(Flag::CaseInsensitive) {
            CaseFold::None
        } else if self.has(Flag::UnicodeCase) {
            CaseFold::Unicode
        } else {
            CaseFold::Ascii
        }
    }

    /// Parses the quantifier following an atom, if any, and wraps the atom
    /// accordingly.
    fn closure(&mut self, atom: NodeId) -> Result<NodeId, SyntaxError> {
        match self.quantifier()? {
            Some(q) => Ok(self.repeat(atom, q)),
            None => Ok(atom),
        }
    }

    fn repeat(&mut self, atom: NodeId, q: Quantifier) -> NodeId {
        match q.kind {
            QuantifierKind::Optional => {
                self.program.push(NodeKind::Ques { atom, greed: q.greed })
            }
            QuantifierKind::Unbounded if q.greed == Greed::Greedy => {
                let node = self.program.node_mut(atom);
                match std::mem::replace(&mut node.kind, NodeKind::Accept) {
                    NodeKind::Char(predicate) => {
                        node.kind =
                            NodeKind::CharGreedy { predicate, min: q.min };
                        atom
                    }
                    kind => {
                        node.kind = kind;
                        self.program.push(NodeKind::Curly {
                            atom,
                            min: q.min,
                            max: q.max,
                            greed: q.greed,
                        })
                    }
                }
            }
            _ => self.program.push(NodeKind::Curly {
                atom,
                min: q.min,
                max: q.max,
                greed: q.greed,
            }),
        }
    }

    fn quantifier(&mut self) -> Result<Option<Quantifier>, SyntaxError> {
        let (min, max, kind) = match self.peek() {
            Some('?') => {
                self.cursor += 1;
                (0, 1, QuantifierKind::Optional)
            }
            Some('*') => {
                self.cursor += 1;
                (0, MAX_REPS, QuantifierKind::Unbounded)
            }
            Some('+') => {
                self.cursor += 1;
                (1, MAX_REPS, QuantifierKind::Unbounded)
            }
            Some('{') => {
                let digit_follows = self
                    .peek_raw_at(1)
                    .is_some_and(|c| c.is_ascii_digit());
                if !digit_follows {
                    return Err(self.error("Illegal repetition"));
                }
                self.cursor += 1;
                let (min, max) = self.counted()?;
                (min, max, QuantifierKind::Counted)
            }
            _ => return Ok(None),
        };

        let greed = match self.peek() {
            Some('?') => {
                self.cursor += 1;
                Greed::Lazy
            }
            Some('+') => {
                self.cursor += 1;
                Greed::Possessive
            }
            _ => Greed::Greedy,
        };

        Ok(Some(Quantifier { min, max, greed, kind }))
    }

    /// Parses the inside of `{n}`, `{n,}` and `{n,m}`, the opening brace
    /// already consumed.
    fn counted(&mut self) -> Result<(usize, usize), SyntaxError> {
        let mut overflow = false;
        let min = self.number(&mut overflow);
        let mut max = min;

        if self.peek() == Some(',') {
            self.cursor += 1;
            max = if self.peek() == Some('}') {
                MAX_REPS
            } else {
                self.number(&mut overflow)
            };
        }

        if self.read() != Some('}') {
            return Err(self.error("Unclosed counted closure"));
        }

        if overflow || max < min {
            return Err(self.error("Illegal repetition range"));
        }

        Ok((min, max))
    }

    fn number(&mut self, overflow: &mut bool) -> usize {
        let mut n: usize = 0;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
            match n.checked_mul(10).and_then(|n| n.checked_add(d as usize)) {
                Some(v) if v <= MAX_REPS => n = v,
                _ => *overflow = true,
            }
            self.cursor += 1;
        }
        n
    }

    fn create_group(&mut self, anonymous: bool) -> (NodeId, NodeId) {
        let local = self.local_count;
        self.local_count += 1;

        let group = if anonymous {
            None
        } else {
            self.capturing_group_count += 1;
            Some(self.capturing_group_count - 1)
        };

        let head = self.program.push(NodeKind::GroupHead { local });
        let tail = self.program.push(NodeKind::GroupTail { local, group });

        (head, tail)
    }

    fn group_body(
        &mut self,
        anonymous: bool,
    ) -> Result<(NodeId, NodeId), SyntaxError> {
        let (head, tail) = self.create_group(anonymous);
        let body = self.expr(tail)?;
        self.program.set_next(head, body);
        Ok((head, tail))
    }

    /// Parses a parenthesized construct, including the quantifier that
    /// follows it. Returns `None` for inline modifiers like `(?i)`, which
    /// don't produce nodes.
    fn group0(&mut self) -> Result<Option<(NodeId, NodeId)>, SyntaxError> {
        let saved_flags = self.flags;
        let saved_closures = self.top_closure_nodes.len();
        let saved_groups = self.capturing_group_count;
        let saved_refs = self.group_refs.len();
        let mut capturing = false;

        self.cursor += 1;

        let (head, tail) = if self.peek() == Some('?') {
            self.cursor += 1;
            match self.read_raw() {
                Some(':') => self.group_body(true)?,
                Some(c @ ('=' | '!')) => {
                    let (cond, _) = self.group_body(true)?;
                    let node = self.program.push(NodeKind::LookAhead {
                        cond,
                        negated: c == '!',
                    });
                    (node, node)
                }
                Some('>') => {
                    let (atom, _) = self.group_body(true)?;
                    let node = self.program.push(NodeKind::Ques {
                        atom,
                        greed: Greed::Independent,
                    });
                    (node, node)
                }
                Some('<') => match self.peek_raw() {
                    Some(c @ ('=' | '!')) => {
                        self.cursor += 1;
                        self.lookbehind(c == '!', saved_closures)?
                    }
                    Some(c) if !c.is_ascii_alphabetic() => {
                        return Err(self.error("Unknown look-behind group"));
                    }
                    _ => {
                        let name = self.group_name()?;
                        if self.named_groups.contains_key(&name) {
                            return Err(self.error(format!(
                                "Named capturing group <{}> is already defined",
                                name
                            )));
                        }
                        capturing = true;
                        let (head, tail) = self.create_group(false);
                        self.named_groups
                            .insert(name, self.capturing_group_count - 1);
                        let body = self.expr(tail)?;
                        self.program.set_next(head, body);
                        (head, tail)
                    }
                },
                Some('$' | '@') => {
                    return Err(self.error("Unknown group type"));
                }
                other => {
                    if other.is_some() {
                        self.cursor -= 1;
                    }
                    self.inline_flags();
                    match self.read() {
                        Some(')') => return Ok(None),
                        Some(':') => self.group_body(true)?,
                        _ => return Err(self.error("Unknown inline modifier")),
                    }
                }
            }
        } else {
            capturing = true;
            self.group_body(false)?
        };

        self.accept(')', "Unclosed group")?;
        self.flags = saved_flags;

        let Some(q) = self.quantifier()? else {
            return Ok(Some((head, tail)));
        };

        // Lookarounds and atomic groups are a single node.
        if head == tail {
            let node = self.repeat(head, q);
            return Ok(Some((node, node)));
        }

        self.top_closure_nodes.truncate(saved_closures);

        if q.greed == Greed::Possessive {
            let node = self.repeat(head, q);
            return Ok(Some((node, node)));
        }

        if q.kind == QuantifierKind::Optional {
            let conn = self.program.push(NodeKind::BranchConn);
            self.program.set_next(tail, conn);
            let alternatives = if q.greed == Greed::Greedy {
                vec![Some(head), None]
            } else {
                vec![None, Some(head)]
            };
            let branch =
                self.program.push(NodeKind::Branch { alternatives, conn });
            return Ok(Some((branch, conn)));
        }

        let inner_groups =
            self.capturing_group_count - saved_groups - capturing as usize;
        let inner_refs = self.group_refs.len() - saved_refs;

        let mut info = TreeInfo::new();
        let deterministic = study(&self.program, head, &mut info);

        let NodeKind::GroupTail { local, group } = self.program.node(tail).kind
        else {
            unreachable!("group doesn't end with a group tail")
        };

        if deterministic
            && self.deterministic_loops
            && inner_groups == 0
            && inner_refs == 0
        {
            let atom = self.program.node(head).next;
            let node = self.program.push(NodeKind::GroupCurly {
                atom,
                min: q.min,
                max: q.max,
                greed: q.greed,
                local,
                group,
            });
            return Ok(Some((node, node)));
        }

        let count_local = self.local_count;
        self.local_count += 1;

        let lp = self.program.push(NodeKind::Loop {
            body: head,
            count_local,
            begin_local: local,
            min: q.min,
            max: q.max,
            lazy: q.greed == Greed::Lazy,
            memo: None,
        });

        if q.greed == Greed::Greedy && q.max == MAX_REPS {
            self.top_closure_nodes.push(lp);
        }

        self.program.set_next(tail, lp);

        let prolog = self.program.push(NodeKind::Prolog { lp });

        Ok(Some((prolog, lp)))
    }

    fn lookbehind(
        &mut self,
        negated: bool,
        saved_closures: usize,
    ) -> Result<(NodeId, NodeId), SyntaxError> {
        let (cond, tail) = self.group_body(true)?;
        let end = self.program.push(NodeKind::LookBehindEnd);
        self.program.set_next(tail, end);

        let mut info = TreeInfo::new();
        study(&self.program, cond, &mut info);

        if !info.max_valid {
            return Err(self.error(
                "Look-behind group does not have an obvious maximum length",
            ));
        }

        let node = self.program.push(NodeKind::LookBehind {
            cond,
            min: info.min_length,
            max: info.max_length,
            negated,
        });

        self.top_closure_nodes.truncate(saved_closures);

        Ok((node, node))
    }

    /// Parses modifier letters like `i`, `-s` or `x-m` following `(?`.
    fn inline_flags(&mut self) {
        let mut negated = false;
        while let Some(c) = self.peek() {
            if c == '-' && !negated {
                negated = true;
                self.cursor += 1;
                continue;
            }
            let Some(flag) = Flag::from_inline(c) else {
                break;
            };
            let unicode_classes = matches!(flag, Flag::UnicodeCharacterClass);
            self.flags = if negated {
                self.flags.without(flag)
            } else {
                self.flags.with(flag)
            };
            if unicode_classes {
                self.flags = if negated {
                    self.flags.without(Flag::UnicodeCase)
                } else {
                    self.flags.with(Flag::UnicodeCase)
                };
            }
            self.cursor += 1;
        }
    }

    /// Reads a group name and the `>` that follows it.
    fn group_name(&mut self) -> Result<String, SyntaxError> {
        let mut name = String::new();

        match self.read_raw() {
            Some(c) if c.is_ascii_alphabetic() => name.push(c),
            _ => {
                return Err(self.error(
                    "capturing group name does not start with a Latin letter",
                ))
            }
        }

        loop {
            match self.read_raw() {
                Some('>') => break,
                Some(c) if c.is_ascii_alphanumeric() => name.push(c),
                _ => {
                    return Err(self.error(
                        "named capturing group is missing trailing '>'",
                    ))
                }
            }
        }

        Ok(name)
    }

    /// Parses an escape sequence. The cursor must be at the backslash.
    ///
    /// `in_class` is true inside brackets, where assertions and back
    /// references are not allowed. `is_range` is true when the escape is
    /// one end of a range, where `\v` means the vertical tab character.
    pub(super) fn escape(
        &mut self,
        in_class: bool,
        is_range: bool,
    ) -> Result<Escaped, SyntaxError> {
        self.cursor += 1;

        let Some(ch) = self.read_raw() else {
            return Err(self.error("Unexpected internal error"));
        };

        let unicode_classes = self.has(Flag::UnicodeCharacterClass);

        let digit = || {
            if unicode_classes {
                CharPredicate::Set(unicode::UNICODE_DIGIT.clone())
            } else {
                CharPredicate::Ascii(AsciiClass::Digit)
            }
        };

        let space = || {
            if unicode_classes {
                CharPredicate::Set(unicode::WHITE_SPACE.clone())
            } else {
                CharPredicate::Ascii(AsciiClass::Space)
            }
        };

        let word = || {
            if unicode_classes {
                CharPredicate::Set(unicode::UNICODE_WORD.clone())
            } else {
                CharPredicate::Ascii(AsciiClass::Word)
            }
        };

        let boundary = |kind| NodeKind::WordBoundary {
            kind,
            unicode: unicode_classes,
        };

        let escaped = match ch {
            '0' => Escaped::Char(self.octal()?),
            '1'..='9' if !in_class => {
                Escaped::Node(self.back_reference(ch as usize - '0' as usize))
            }
            'A' if !in_class => Escaped::Node(NodeKind::Begin),
            'B' if !in_class => Escaped::Node(boundary(Boundary::NotWord)),
            'D' => Escaped::Class(digit().negate()),
            'G' if !in_class => Escaped::Node(NodeKind::LastMatch),
            'H' => Escaped::Class(CharPredicate::HorizontalSpace.negate()),
            'R' if !in_class => Escaped::Node(NodeKind::LineEnding),
            'S' => Escaped::Class(space().negate()),
            'V' => Escaped::Class(CharPredicate::VerticalSpace.negate()),
            'W' => Escaped::Class(word().negate()),
            'Z' if !in_class => Escaped::Node(NodeKind::Dollar {
                multiline: false,
                unix: self.has(Flag::UnixLines),
            }),
            'a' => Escaped::Char('\x07'),
            'b' if !in_class => Escaped::Node(boundary(Boundary::Word)),
            'c' => Escaped::Char(self.control()?),
            'd' => Escaped::Class(digit()),
            'e' => Escaped::Char('\x1B'),
            'f' => Escaped::Char('\x0C'),
            'h' => Escaped::Class(CharPredicate::HorizontalSpace),
            'k' if !in_class => Escaped::Node(self.named_back_reference()?),
            'n' => Escaped::Char('\n'),
            'r' => Escaped::Char('\r'),
            's' => Escaped::Class(space()),
            't' => Escaped::Char('\t'),
            'u' => Escaped::Char(self.unicode_escape()?),
            'v' if is_range => Escaped::Char('\x0B'),
            'v' => Escaped::Class(CharPredicate::VerticalSpace),
            'w' => Escaped::Class(word()),
            'x' => Escaped::Char(self.hex()?),
            'z' if !in_class => Escaped::Node(NodeKind::End),
            c if c.is_ascii_alphanumeric() => {
                return Err(self.error("Illegal/unsupported escape sequence"))
            }
            c => Escaped::Char(c),
        };

        Ok(escaped)
    }

    /// Parses the digits of a numbered back reference. Digits after the
    /// first one are taken only while they form the number of an existing
    /// group.
    fn back_reference(&mut self, mut group: usize) -> NodeKind {
        let index = self.cursor - 1;

        while let Some(d) = self.peek_raw().and_then(|c| c.to_digit(10)) {
            let candidate = group * 10 + d as usize;
            if candidate >= self.capturing_group_count {
                break;
            }
            group = candidate;
            self.cursor += 1;
        }

        self.group_refs.push((group, index));

        NodeKind::BackRef { group, fold: self.case_fold() }
    }

    fn named_back_reference(&mut self) -> Result<NodeKind, SyntaxError> {
        if self.read_raw() != Some('<') {
            return Err(self.error(
                "\\k is not followed by '<' for named capturing group",
            ));
        }

        let index = self.cursor - 1;
        let name = self.group_name()?;

        let Some(group) = self.named_groups.get(&name).copied() else {
            return Err(self.error(format!(
                "named capturing group <{}> does not exist",
                name
            )));
        };

        self.group_refs.push((group, index));

        Ok(NodeKind::BackRef { group, fold: self.case_fold() })
    }

    /// `\0n`, `\0nn` or `\0mnn` with `m` up to 3.
    fn octal(&mut self) -> Result<char, SyntaxError> {
        let octal_digit = |c: Option<char>| c.and_then(|c| c.to_digit(8));

        let Some(n) = octal_digit(self.peek_raw()) else {
            self.cursor += 1;
            return Err(self.error("Illegal octal escape sequence"));
        };
        self.cursor += 1;

        let Some(m) = octal_digit(self.peek_raw()) else {
            return Ok(char_from(n));
        };
        self.cursor += 1;

        match octal_digit(self.peek_raw()) {
            Some(o) if n <= 3 => {
                self.cursor += 1;
                Ok(char_from(n * 64 + m * 8 + o))
            }
            _ => Ok(char_from(n * 8 + m)),
        }
    }

    /// `\xhh` or `\x{h...h}`.
    fn hex(&mut self) -> Result<char, SyntaxError> {
        let hex_digit = |c: Option<char>| c.and_then(|c| c.to_digit(16));

        match self.read_raw() {
            Some('{') if hex_digit(self.peek_raw()).is_some() => {
                let mut value: u32 = 0;
                loop {
                    match self.read_raw() {
                        Some('}') => break,
                        c => match hex_digit(c) {
                            Some(d) => {
                                value = value * 16 + d;
                                if value > 0x10FFFF {
                                    return Err(self.error(
                                        "Hexadecimal codepoint is too big",
                                    ));
                                }
                            }
                            None => {
                                return Err(self.error(
                                    "Unclosed hexadecimal escape sequence",
                                ))
                            }
                        },
                    }
                }
                char::from_u32(value).ok_or_else(|| {
                    self.error("Illegal hexadecimal escape sequence")
                })
            }
            c => match (hex_digit(c), hex_digit(self.read_raw())) {
                (Some(n), Some(m)) => Ok(char_from(n * 16 + m)),
                _ => Err(self.error("Illegal hexadecimal escape sequence")),
            },
        }
    }

    /// `\uhhhh`. A high surrogate must be followed by an escaped low
    /// surrogate, and both are combined into a single character.
    fn unicode_escape(&mut self) -> Result<char, SyntaxError> {
        let high = self.hex4()?;

        if (0xD800..0xDC00).contains(&high) {
            if self.peek_raw() == Some('\\')
                && self.peek_raw_at(1) == Some('u')
            {
                self.cursor += 2;
                let low = self.hex4()?;
                if (0xDC00..0xE000).contains(&low) {
                    return Ok(char_from(
                        0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00),
                    ));
                }
            }
            return Err(self.error("Illegal Unicode escape sequence"));
        }

        char::from_u32(high)
            .ok_or_else(|| self.error("Illegal Unicode escape sequence"))
    }

    fn hex4(&mut self) -> Result<u32, SyntaxError> {
        let mut value = 0;
        for _ in 0..4 {
            match self.read_raw().and_then(|c| c.to_digit(16)) {
                Some(d) => value = value * 16 + d,
                None => {
                    return Err(self.error("Illegal Unicode escape sequence"))
                }
            }
        }
        Ok(value)
    }

    /// `\cX`, the control character corresponding to `X`.
    fn control(&mut self) -> Result<char, SyntaxError> {
        self.read_raw()
            .and_then(|c| char::from_u32(c as u32 ^ 64))
            .ok_or_else(|| self.error("Illegal control escape sequence"))
    }
}

/// Converts a value known to be a valid scalar value into a char.
fn char_from(value: u32) -> char {
    char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Rewrites `\Q...\E` quoted sections so that every character in them is
/// read literally by the parser. An unterminated `\Q` quotes the rest of the
/// pattern.
pub(super) fn remove_qe_quoting(pattern: &[char]) -> Vec<char> {
    let mut i = 0;

    while i + 1 < pattern.len() {
        if pattern[i] != '\\' {
            i += 1;
        } else if pattern[i + 1] != 'Q' {
            i += 2;
        } else {
            break;
        }
    }

    if i + 1 >= pattern.len() {
        return pattern.to_vec();
    }

    let mut result = Vec::with_capacity(pattern.len() * 2);
    result.extend_from_slice(&pattern[..i]);
    i += 2;

    let mut in_quote = true;
    let mut begin_quote = true;

    while i < pattern.len() {
        let c = pattern[i];
        i += 1;

        if !c.is_ascii() || c.is_ascii_alphabetic() {
            result.push(c);
        } else if c.is_ascii_digit() {
            // A digit right after `\Q` could be read as part of an escape
            // that precedes the quote, like `\0\Q1\E`.
            if begin_quote {
                result.extend(['\\', 'x', '3']);
            }
            result.push(c);
        } else if c != '\\' {
            if in_quote {
                result.push('\\');
            }
            result.push(c);
        } else if in_quote {
            if pattern.get(i) == Some(&'E') {
                i += 1;
                in_quote = false;
            } else {
                result.extend(['\\', '\\']);
            }
        } else if pattern.get(i) == Some(&'Q') {
            i += 1;
            in_quote = true;
            begin_quote = true;
            continue;
        } else {
            result.push(c);
            if let Some(next) = pattern.get(i) {
                result.push(*next);
                i += 1;
            }
        }

        begin_quote = false;
    }

    result
}
