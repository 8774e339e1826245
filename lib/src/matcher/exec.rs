/*! Executes a compiled program.

Every node is matched by [`State::match_at`], which tests the node at a
given position and, when the test succeeds, calls itself with the node's
continuation. The call returns true only if the whole rest of the program
matched, so a node that has several ways of matching (a quantifier, a
branch) tries the next one when the continuation fails. Nodes that modify
the state before calling the continuation undo the change when it fails.

Positions are indexes into the input's characters.
*/

use rustc_hash::FxHashSet;

use crate::program::{
    Boundary, BoyerMoore, CaseFold, CharPredicate, Greed, NodeId, NodeKind,
    Program,
};
use crate::unicode;

/// What the terminal node of the main program requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum AcceptMode {
    /// Any position is fine.
    Any,
    /// The match must extend to the end of the region.
    End,
}

/// The program and the input, which don't change during a match attempt.
pub(super) struct Context<'a> {
    pub program: &'a Program,
    pub chars: &'a [char],
}

impl Context<'_> {
    #[inline]
    fn len(&self) -> usize {
        self.chars.len()
    }
}

/// Mutable state of a match attempt.
#[derive(Clone, Debug)]
pub(super) struct State {
    /// Start of the current match, if any.
    pub first: Option<usize>,
    /// End of the last sub-program that matched. At the end of a
    /// successful attempt, the end of the match.
    pub last: usize,
    /// End of the previous match, used by `\G`.
    pub old_last: Option<usize>,
    /// Span of every group, group 0 being the whole match.
    pub captures: Vec<Option<(usize, usize)>>,
    /// Scratch slots used by groups and loops.
    pub locals: Vec<Option<usize>>,
    /// Positions where the body of a loop is known to fail.
    pub memos: Vec<FxHashSet<usize>>,
    /// Region start.
    pub from: usize,
    /// Region end.
    pub to: usize,
    /// Position where the condition of the innermost lookbehind must end.
    pub lookbehind_to: usize,
    pub hit_end: bool,
    pub require_end: bool,
    pub accept_mode: AcceptMode,
    pub anchoring_bounds: bool,
    pub transparent_bounds: bool,
}

/// Parameters of a repetition, bundled to keep signatures short.
#[derive(Clone, Copy)]
struct Repetition {
    atom: NodeId,
    next: NodeId,
    max: usize,
    group: Option<usize>,
}

fn is_word(c: char, unicode: bool) -> bool {
    if unicode {
        unicode::is_unicode_word(c)
    } else {
        c == '_' || unicode::is_letter_or_digit(c)
    }
}

impl State {
    pub fn new(
        group_count: usize,
        local_count: usize,
        memo_count: usize,
        len: usize,
    ) -> Self {
        Self {
            first: None,
            last: 0,
            old_last: None,
            captures: vec![None; group_count + 1],
            locals: vec![None; local_count],
            memos: vec![FxHashSet::default(); memo_count],
            from: 0,
            to: len,
            lookbehind_to: 0,
            hit_end: false,
            require_end: false,
            accept_mode: AcceptMode::Any,
            anchoring_bounds: true,
            transparent_bounds: false,
        }
    }

    /// Runs the program from `root` at position `from`.
    pub fn run(
        &mut self,
        ctx: &Context<'_>,
        root: NodeId,
        from: usize,
        accept_mode: AcceptMode,
    ) -> bool {
        self.hit_end = false;
        self.require_end = false;
        self.first = Some(from);
        self.old_last = self.old_last.or(Some(from));
        self.captures.iter_mut().for_each(|c| *c = None);
        self.memos.iter_mut().for_each(|m| m.clear());
        self.accept_mode = accept_mode;

        let matched = self.match_at(ctx, root, from);

        if !matched {
            self.first = None;
        }

        self.old_last = Some(self.last);
        matched
    }

    pub fn match_at(
        &mut self,
        ctx: &Context<'_>,
        id: NodeId,
        i: usize,
    ) -> bool {
        let node = ctx.program.node(id);
        let next = node.next;

        match &node.kind {
            NodeKind::Accept => {
                self.last = i;
                true
            }
            NodeKind::LastAccept => {
                if self.accept_mode == AcceptMode::End && i != self.to {
                    return false;
                }
                self.last = i;
                self.captures[0] = Some((self.first.unwrap_or(i), i));
                true
            }
            NodeKind::LookBehindEnd => i == self.lookbehind_to,
            NodeKind::Start { min_length } => {
                self.start(ctx, next, i, *min_length)
            }
            NodeKind::BoyerMoore(bm) => self.boyer_moore(ctx, next, i, bm),
            NodeKind::Begin => {
                let from = if self.anchoring_bounds { self.from } else { 0 };
                if i == from && self.match_at(ctx, next, i) {
                    self.first = Some(i);
                    self.captures[0] = Some((i, self.last));
                    true
                } else {
                    false
                }
            }
            NodeKind::End => {
                let end =
                    if self.anchoring_bounds { self.to } else { ctx.len() };
                if i == end {
                    self.hit_end = true;
                    self.match_at(ctx, next, i)
                } else {
                    false
                }
            }
            NodeKind::Caret { unix } => self.caret(ctx, next, i, *unix),
            NodeKind::Dollar { multiline, unix } => {
                self.dollar(ctx, next, i, *multiline, *unix)
            }
            NodeKind::LastMatch => {
                self.old_last == Some(i) && self.match_at(ctx, next, i)
            }
            NodeKind::WordBoundary { kind, unicode } => {
                let (left, right) = self.word_sides(ctx, i, *unicode);
                let matched = match kind {
                    Boundary::Word => left != right,
                    Boundary::NotWord => left == right,
                };
                matched && self.match_at(ctx, next, i)
            }
            NodeKind::LineEnding => self.line_ending(ctx, next, i),
            NodeKind::Char(predicate) => {
                if i < self.to {
                    predicate.is(ctx.chars[i])
                        && self.match_at(ctx, next, i + 1)
                } else {
                    self.hit_end = true;
                    false
                }
            }
            NodeKind::CanonChar(predicate) => {
                self.canon_char(ctx, next, i, predicate)
            }
            NodeKind::Slice { chars, fold } => {
                self.slice(ctx, next, i, chars, *fold)
            }
            NodeKind::CharGreedy { predicate, min } => {
                self.char_greedy(ctx, next, i, predicate, *min)
            }
            NodeKind::Ques { atom, greed } => match greed {
                Greed::Greedy => {
                    (self.match_at(ctx, *atom, i) && {
                        let last = self.last;
                        self.match_at(ctx, next, last)
                    }) || self.match_at(ctx, next, i)
                }
                Greed::Lazy => {
                    self.match_at(ctx, next, i)
                        || (self.match_at(ctx, *atom, i) && {
                            let last = self.last;
                            self.match_at(ctx, next, last)
                        })
                }
                Greed::Possessive => {
                    let i = if self.match_at(ctx, *atom, i) {
                        self.last
                    } else {
                        i
                    };
                    self.match_at(ctx, next, i)
                }
                Greed::Independent => {
                    self.match_at(ctx, *atom, i) && {
                        let last = self.last;
                        self.match_at(ctx, next, last)
                    }
                }
            },
            NodeKind::Curly { atom, min, max, greed } => {
                let rep =
                    Repetition { atom: *atom, next, max: *max, group: None };
                self.curly(ctx, &rep, i, *min, *greed)
            }
            NodeKind::GroupCurly { atom, min, max, greed, local, group } => {
                let rep =
                    Repetition { atom: *atom, next, max: *max, group: *group };
                self.group_curly(ctx, &rep, i, *min, *greed, *local)
            }
            NodeKind::GroupHead { local } => {
                let saved = self.locals[*local];
                self.locals[*local] = Some(i);
                let matched = self.match_at(ctx, next, i);
                self.locals[*local] = saved;
                matched
            }
            NodeKind::GroupTail { local, group } => {
                let Some(start) = self.locals[*local] else {
                    // Inside a GroupCurly, which records the capture itself.
                    self.last = i;
                    return true;
                };
                match group {
                    Some(group) => {
                        let saved = self.captures[*group];
                        self.captures[*group] = Some((start, i));
                        if self.match_at(ctx, next, i) {
                            true
                        } else {
                            self.captures[*group] = saved;
                            false
                        }
                    }
                    None => self.match_at(ctx, next, i),
                }
            }
            NodeKind::Prolog { lp } => self.loop_init(ctx, *lp, i),
            NodeKind::Loop {
                body,
                count_local,
                begin_local,
                min,
                max,
                lazy,
                memo,
            } => {
                let iteration_advanced =
                    self.locals[*begin_local].map_or(true, |begin| i > begin);

                if !iteration_advanced {
                    return self.match_at(ctx, next, i);
                }

                let count = self.locals[*count_local].unwrap_or(0);

                if count < *min {
                    return self.loop_body(ctx, *body, *count_local, count, i);
                }

                if *lazy {
                    if self.match_at(ctx, next, i) {
                        return true;
                    }
                    return count < *max
                        && self.loop_body(ctx, *body, *count_local, count, i);
                }

                if count < *max {
                    if let Some(memo) = memo {
                        if self.memos[*memo].contains(&i) {
                            return self.match_at(ctx, next, i);
                        }
                    }
                    if self.loop_body(ctx, *body, *count_local, count, i) {
                        return true;
                    }
                    if let Some(memo) = memo {
                        self.memos[*memo].insert(i);
                    }
                }

                self.match_at(ctx, next, i)
            }
            NodeKind::Branch { alternatives, conn } => {
                alternatives.iter().any(|alternative| match alternative {
                    Some(alternative) => self.match_at(ctx, *alternative, i),
                    None => {
                        self.match_at(ctx, ctx.program.node(*conn).next, i)
                    }
                })
            }
            NodeKind::BranchConn => self.match_at(ctx, next, i),
            NodeKind::BackRef { group, fold } => {
                self.back_reference(ctx, next, i, *group, *fold)
            }
            NodeKind::LookAhead { cond, negated } => {
                let saved_to = self.to;

                if self.transparent_bounds {
                    self.to = ctx.len();
                }

                // More input could make a negative lookahead fail.
                if *negated && i >= self.to {
                    self.require_end = true;
                }

                let matched = self.match_at(ctx, *cond, i);
                self.to = saved_to;

                matched != *negated && self.match_at(ctx, next, i)
            }
            NodeKind::LookBehind { cond, min, max, negated } => {
                let matched = self.look_behind(ctx, *cond, i, *min, *max);
                matched != *negated && self.match_at(ctx, next, i)
            }
        }
    }

    fn start(
        &mut self,
        ctx: &Context<'_>,
        next: NodeId,
        i: usize,
        min_length: usize,
    ) -> bool {
        if i.saturating_add(min_length) > self.to {
            self.hit_end = true;
            return false;
        }

        for start in i..=self.to - min_length {
            if self.match_at(ctx, next, start) {
                self.first = Some(start);
                self.captures[0] = Some((start, self.last));
                return true;
            }
        }

        self.hit_end = true;
        false
    }

    fn boyer_moore(
        &mut self,
        ctx: &Context<'_>,
        next: NodeId,
        mut i: usize,
        bm: &BoyerMoore,
    ) -> bool {
        let len = bm.chars.len();

        if self.to < len {
            self.hit_end = true;
            return false;
        }

        let last = self.to - len;

        'next: while i <= last {
            for j in (0..len).rev() {
                let c = ctx.chars[i + j];
                if c != bm.chars[j] {
                    let bad_char = (j + 1) as isize
                        - bm.last_occurrence[(c as usize) & 0x7F] as isize;
                    i += bad_char.max(bm.good_suffix[j] as isize) as usize;
                    continue 'next;
                }
            }

            self.first = Some(i);

            if self.match_at(ctx, next, i + len) {
                self.first = Some(i);
                self.captures[0] = Some((i, self.last));
                return true;
            }

            i += 1;
        }

        // The whole input was searched.
        self.hit_end = true;
        false
    }

    fn caret(
        &mut self,
        ctx: &Context<'_>,
        next: NodeId,
        i: usize,
        unix: bool,
    ) -> bool {
        let (start, end) = if self.anchoring_bounds {
            (self.from, self.to)
        } else {
            (0, ctx.len())
        };

        // No match at the end of the input, even after a line terminator.
        if i == end {
            self.hit_end = true;
            return false;
        }

        if i > start {
            let prev = ctx.chars[i - 1];
            if unix {
                if prev != '\n' {
                    return false;
                }
            } else {
                if !unicode::is_line_terminator(prev) {
                    return false;
                }
                // `\r\n` is a single line terminator.
                if prev == '\r' && ctx.chars[i] == '\n' {
                    return false;
                }
            }
        }

        self.match_at(ctx, next, i)
    }

    fn dollar(
        &mut self,
        ctx: &Context<'_>,
        next: NodeId,
        i: usize,
        multiline: bool,
        unix: bool,
    ) -> bool {
        let end = if self.anchoring_bounds { self.to } else { ctx.len() };

        if unix {
            if i < end {
                if ctx.chars[i] != '\n' {
                    return false;
                }
                if multiline {
                    return self.match_at(ctx, next, i);
                }
                if i != end - 1 {
                    return false;
                }
            }
        } else {
            if !multiline {
                if i + 2 < end {
                    return false;
                }
                if i + 2 == end
                    && (ctx.chars[i] != '\r' || ctx.chars[i + 1] != '\n')
                {
                    return false;
                }
            }

            if i < end {
                match ctx.chars[i] {
                    '\n' => {
                        if i > 0 && ctx.chars[i - 1] == '\r' {
                            return false;
                        }
                        if multiline {
                            return self.match_at(ctx, next, i);
                        }
                    }
                    '\r' | '\u{85}' | '\u{2028}' | '\u{2029}' => {
                        if multiline {
                            return self.match_at(ctx, next, i);
                        }
                    }
                    _ => return false,
                }
            }
        }

        // Matching before a final line terminator, or at the end, depends
        // on there being no more input.
        self.hit_end = true;
        self.require_end = true;
        self.match_at(ctx, next, i)
    }

    /// Tells whether the characters at each side of `i` are part of a word.
    fn word_sides(
        &mut self,
        ctx: &Context<'_>,
        i: usize,
        unicode: bool,
    ) -> (bool, bool) {
        let (start, end) = if self.transparent_bounds {
            (0, ctx.len())
        } else {
            (self.from, self.to)
        };

        let in_word = |c: char, at: usize| {
            is_word(c, unicode)
                || (unicode::is_non_spacing_mark(c) && self.has_base(ctx, at))
        };

        let left = i > start && in_word(ctx.chars[i - 1], i - 1);
        let right = i < end && in_word(ctx.chars[i], i);

        if i >= end {
            self.hit_end = true;
            self.require_end = true;
        }

        (left, right)
    }

    /// True if the non-spacing marks ending at `i` follow a letter or
    /// digit.
    fn has_base(&self, ctx: &Context<'_>, i: usize) -> bool {
        let start = if self.transparent_bounds { 0 } else { self.from };

        for j in (start..=i).rev() {
            let c = ctx.chars[j];
            if unicode::is_letter_or_digit(c) {
                return true;
            }
            if !unicode::is_non_spacing_mark(c) {
                return false;
            }
        }

        false
    }

    fn line_ending(
        &mut self,
        ctx: &Context<'_>,
        next: NodeId,
        i: usize,
    ) -> bool {
        if i >= self.to {
            self.hit_end = true;
            return false;
        }

        match ctx.chars[i] {
            '\n' | '\x0B' | '\x0C' | '\u{85}' | '\u{2028}' | '\u{2029}' => {
                self.match_at(ctx, next, i + 1)
            }
            '\r' => {
                let j = i + 1;
                if j < self.to {
                    if ctx.chars[j] == '\n'
                        && self.match_at(ctx, next, j + 1)
                    {
                        return true;
                    }
                } else {
                    self.hit_end = true;
                }
                self.match_at(ctx, next, j)
            }
            _ => false,
        }
    }

    fn canon_char(
        &mut self,
        ctx: &Context<'_>,
        next: NodeId,
        i: usize,
        predicate: &CharPredicate,
    ) -> bool {
        if i >= self.to {
            self.hit_end = true;
            return false;
        }

        let mut cluster_end = i + 1;
        while cluster_end < self.to
            && unicode::extends_cluster(ctx.chars[cluster_end])
        {
            cluster_end += 1;
        }

        for end in (i + 1..=cluster_end).rev() {
            let candidate = if end == i + 1 {
                Some(ctx.chars[i])
            } else {
                unicode::compose_cluster(&ctx.chars[i..end])
            };
            if let Some(c) = candidate {
                if predicate.is(c) && self.match_at(ctx, next, end) {
                    return true;
                }
            }
        }

        if cluster_end >= self.to {
            self.hit_end = true;
        }

        false
    }

    fn slice(
        &mut self,
        ctx: &Context<'_>,
        next: NodeId,
        i: usize,
        chars: &[char],
        fold: CaseFold,
    ) -> bool {
        for (j, expected) in chars.iter().enumerate() {
            if i + j >= self.to {
                self.hit_end = true;
                return false;
            }
            let c = ctx.chars[i + j];
            let equal = match fold {
                CaseFold::None => *expected == c,
                CaseFold::Ascii => {
                    *expected == c || *expected == c.to_ascii_lowercase()
                }
                CaseFold::Unicode => *expected == unicode::fold(c),
            };
            if !equal {
                return false;
            }
        }

        self.match_at(ctx, next, i + chars.len())
    }

    fn char_greedy(
        &mut self,
        ctx: &Context<'_>,
        next: NodeId,
        mut i: usize,
        predicate: &CharPredicate,
        min: usize,
    ) -> bool {
        let mut n = 0;

        while i < self.to && predicate.is(ctx.chars[i]) {
            i += 1;
            n += 1;
        }

        if i >= self.to {
            self.hit_end = true;
        }

        while n >= min {
            if self.match_at(ctx, next, i) {
                return true;
            }
            if n == min {
                return false;
            }
            i -= 1;
            n -= 1;
        }

        false
    }

    fn curly(
        &mut self,
        ctx: &Context<'_>,
        rep: &Repetition,
        mut i: usize,
        min: usize,
        greed: Greed,
    ) -> bool {
        for _ in 0..min {
            if !self.match_at(ctx, rep.atom, i) {
                return false;
            }
            i = self.last;
        }

        match greed {
            Greed::Greedy => self.curly_greedy(ctx, rep, i, min),
            Greed::Lazy => self.curly_lazy(ctx, rep, i, min),
            Greed::Possessive | Greed::Independent => {
                self.curly_possessive(ctx, rep, i, min)
            }
        }
    }

    /// `j` is the number of times the atom has matched so far.
    fn curly_greedy(
        &mut self,
        ctx: &Context<'_>,
        rep: &Repetition,
        mut i: usize,
        mut j: usize,
    ) -> bool {
        if j >= rep.max {
            return self.match_at(ctx, rep.next, i);
        }

        let back_limit = j;

        if !self.match_at(ctx, rep.atom, i) {
            return self.match_at(ctx, rep.next, i);
        }

        let k = self.last.saturating_sub(i);

        if k == 0 {
            return self.match_at(ctx, rep.next, i);
        }

        i = self.last;
        j += 1;

        // While every repetition has the same length the positions to back
        // off to are known, past that point recursion takes over.
        while j < rep.max {
            if !self.match_at(ctx, rep.atom, i) {
                break;
            }
            if i + k != self.last {
                let last = self.last;
                if self.curly_greedy(ctx, rep, last, j + 1) {
                    return true;
                }
                break;
            }
            i += k;
            j += 1;
        }

        loop {
            if self.match_at(ctx, rep.next, i) {
                return true;
            }
            if j == back_limit {
                return false;
            }
            i -= k;
            j -= 1;
        }
    }

    fn curly_lazy(
        &mut self,
        ctx: &Context<'_>,
        rep: &Repetition,
        mut i: usize,
        mut j: usize,
    ) -> bool {
        loop {
            if self.match_at(ctx, rep.next, i) {
                return true;
            }
            if j >= rep.max {
                return false;
            }
            if !self.match_at(ctx, rep.atom, i) {
                return false;
            }
            if i == self.last {
                return false;
            }
            i = self.last;
            j += 1;
        }
    }

    fn curly_possessive(
        &mut self,
        ctx: &Context<'_>,
        rep: &Repetition,
        mut i: usize,
        mut j: usize,
    ) -> bool {
        while j < rep.max {
            if !self.match_at(ctx, rep.atom, i) || i == self.last {
                break;
            }
            i = self.last;
            j += 1;
        }
        self.match_at(ctx, rep.next, i)
    }

    #[inline]
    fn set_capture(&mut self, group: Option<usize>, start: usize, end: usize) {
        if let Some(group) = group {
            self.captures[group] = Some((start, end));
        }
    }

    fn group_curly(
        &mut self,
        ctx: &Context<'_>,
        rep: &Repetition,
        mut i: usize,
        min: usize,
        greed: Greed,
        local: usize,
    ) -> bool {
        let saved_local = self.locals[local];
        let saved_capture = rep.group.map(|group| self.captures[group]);

        // Tells the group tail that the capture is recorded here.
        self.locals[local] = None;

        let mut matched = true;

        for _ in 0..min {
            if !self.match_at(ctx, rep.atom, i) {
                matched = false;
                break;
            }
            self.set_capture(rep.group, i, self.last);
            i = self.last;
        }

        if matched {
            matched = match greed {
                Greed::Greedy => self.group_curly_greedy(ctx, rep, i, min),
                Greed::Lazy => self.group_curly_lazy(ctx, rep, i, min),
                Greed::Possessive | Greed::Independent => {
                    self.group_curly_possessive(ctx, rep, i, min)
                }
            };
        }

        if !matched {
            self.locals[local] = saved_local;
            if let (Some(group), Some(saved)) = (rep.group, saved_capture) {
                self.captures[group] = saved;
            }
        }

        matched
    }

    fn group_curly_greedy(
        &mut self,
        ctx: &Context<'_>,
        rep: &Repetition,
        mut i: usize,
        mut j: usize,
    ) -> bool {
        let min = j;
        let saved = rep.group.map(|group| self.captures[group]);

        if j < rep.max && self.match_at(ctx, rep.atom, i) {
            let k = self.last.saturating_sub(i);

            if k > 0 {
                loop {
                    self.set_capture(rep.group, i, i + k);
                    i += k;
                    j += 1;
                    if j >= rep.max || !self.match_at(ctx, rep.atom, i) {
                        break;
                    }
                    if i + k != self.last {
                        if self.group_curly_greedy(ctx, rep, i, j) {
                            return true;
                        }
                        break;
                    }
                }

                while j > min {
                    if self.match_at(ctx, rep.next, i) {
                        return true;
                    }
                    i -= k;
                    j -= 1;
                    if j > min {
                        self.set_capture(rep.group, i - k, i);
                    }
                }
            }
        }

        if let (Some(group), Some(saved)) = (rep.group, saved) {
            self.captures[group] = saved;
        }

        self.match_at(ctx, rep.next, i)
    }

    fn group_curly_lazy(
        &mut self,
        ctx: &Context<'_>,
        rep: &Repetition,
        mut i: usize,
        mut j: usize,
    ) -> bool {
        loop {
            if self.match_at(ctx, rep.next, i) {
                return true;
            }
            if j >= rep.max || !self.match_at(ctx, rep.atom, i) {
                return false;
            }
            if i == self.last {
                return false;
            }
            self.set_capture(rep.group, i, self.last);
            i = self.last;
            j += 1;
        }
    }

    fn group_curly_possessive(
        &mut self,
        ctx: &Context<'_>,
        rep: &Repetition,
        mut i: usize,
        mut j: usize,
    ) -> bool {
        while j < rep.max {
            if !self.match_at(ctx, rep.atom, i) {
                break;
            }
            self.set_capture(rep.group, i, self.last);
            if i == self.last {
                break;
            }
            i = self.last;
            j += 1;
        }
        self.match_at(ctx, rep.next, i)
    }

    /// Runs one more iteration of a loop body, undoing the count increment
    /// if it fails.
    fn loop_body(
        &mut self,
        ctx: &Context<'_>,
        body: NodeId,
        count_local: usize,
        count: usize,
        i: usize,
    ) -> bool {
        self.locals[count_local] = Some(count + 1);
        let matched = self.match_at(ctx, body, i);
        if !matched {
            self.locals[count_local] = Some(count);
        }
        matched
    }

    /// Enters a loop. The loop node itself is only reached at the end of
    /// each iteration.
    fn loop_init(&mut self, ctx: &Context<'_>, lp: NodeId, i: usize) -> bool {
        let node = ctx.program.node(lp);

        let NodeKind::Loop { body, count_local, min, max, lazy, .. } =
            node.kind
        else {
            unreachable!("prolog doesn't point to a loop")
        };

        let saved = self.locals[count_local];

        let matched = if min > 0 {
            self.locals[count_local] = Some(1);
            self.match_at(ctx, body, i)
        } else if lazy {
            self.match_at(ctx, node.next, i)
                || (max > 0 && {
                    self.locals[count_local] = Some(1);
                    self.match_at(ctx, body, i)
                })
        } else if max > 0 {
            self.locals[count_local] = Some(1);
            self.match_at(ctx, body, i) || self.match_at(ctx, node.next, i)
        } else {
            self.match_at(ctx, node.next, i)
        };

        self.locals[count_local] = saved;
        matched
    }

    fn back_reference(
        &mut self,
        ctx: &Context<'_>,
        next: NodeId,
        i: usize,
        group: usize,
        fold: CaseFold,
    ) -> bool {
        let Some((start, end)) = self.captures[group] else {
            return false;
        };

        let len = end - start;

        if i + len > self.to {
            self.hit_end = true;
            return false;
        }

        let same = |a: char, b: char| match fold {
            _ if a == b => true,
            CaseFold::None => false,
            CaseFold::Ascii => {
                a.to_ascii_lowercase() == b.to_ascii_lowercase()
            }
            CaseFold::Unicode => {
                let (a, b) = (unicode::to_upper(a), unicode::to_upper(b));
                a == b || unicode::to_lower(a) == unicode::to_lower(b)
            }
        };

        let equal = ctx.chars[i..i + len]
            .iter()
            .zip(&ctx.chars[start..end])
            .all(|(a, b)| same(*a, *b));

        equal && self.match_at(ctx, next, i + len)
    }

    /// Tells whether the condition of a lookbehind matches some text that
    /// ends at `i`.
    fn look_behind(
        &mut self,
        ctx: &Context<'_>,
        cond: NodeId,
        i: usize,
        min: usize,
        max: usize,
    ) -> bool {
        let saved_from = self.from;
        let saved_lookbehind_to = self.lookbehind_to;

        let start_index = if self.transparent_bounds { 0 } else { self.from };
        let lower = i.saturating_sub(max).max(start_index);

        self.lookbehind_to = i;

        if self.transparent_bounds {
            self.from = 0;
        }

        let mut matched = false;

        if let Some(mut j) = i.checked_sub(min) {
            while j >= lower {
                if self.match_at(ctx, cond, j) {
                    matched = true;
                    break;
                }
                if j == 0 {
                    break;
                }
                j -= 1;
            }
        }

        self.from = saved_from;
        self.lookbehind_to = saved_lookbehind_to;

        matched
    }
}
