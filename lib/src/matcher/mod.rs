/*! Matching compiled patterns against text.

A [`Matcher`] binds a [`Pattern`] to an input string and keeps the state of
the search: the last match, the region being searched, and the bounds
options. The engine works with character indexes internally, while every
offset accepted or returned by the public API is a byte offset into the
input, always at a character boundary.
*/

use std::fmt::{Debug, Formatter};

use crate::errors::MatchError;
use crate::pattern::Pattern;
use crate::result::MatchResult;

use exec::{AcceptMode, Context, State};

mod exec;
mod replace;

#[cfg(test)]
mod tests;

/// Searches for matches of a [`Pattern`] in a string.
///
/// A matcher is created with [`Pattern::matcher`] and can perform three
/// kinds of operations:
///
/// * [`Matcher::matches`] matches the pattern against the whole region.
/// * [`Matcher::looking_at`] matches the pattern against a prefix of the
///   region.
/// * [`Matcher::find`] looks for the next substring of the region that
///   matches the pattern.
///
/// After a successful operation the match is available through
/// [`Matcher::start`], [`Matcher::end`], [`Matcher::group`] and the other
/// accessors, until the next operation or [`Matcher::reset`].
///
/// ```
/// # use regulus::Pattern;
/// let pattern = Pattern::new(r"(\w+)@(\w+)\.com").unwrap();
/// let mut matcher = pattern.matcher("alice@example.com, bob@example.com");
///
/// let mut users = Vec::new();
/// while matcher.find() {
///     users.push(matcher.group(1).unwrap().unwrap());
/// }
///
/// assert_eq!(users, vec!["alice", "bob"]);
/// ```
pub struct Matcher<'h> {
    pattern: Pattern,
    input: &'h str,
    chars: Vec<char>,
    /// Byte offset of every character in `chars`, followed by the length
    /// of the input.
    offsets: Vec<usize>,
    state: State,
    /// Byte offset where the text not yet copied by
    /// [`Matcher::append_replacement`] starts.
    last_append: usize,
}

fn decode(input: &str) -> (Vec<char>, Vec<usize>) {
    let mut chars = Vec::with_capacity(input.len());
    let mut offsets = Vec::with_capacity(input.len() + 1);
    for (offset, c) in input.char_indices() {
        chars.push(c);
        offsets.push(offset);
    }
    offsets.push(input.len());
    (chars, offsets)
}

impl<'h> Matcher<'h> {
    pub(crate) fn new(pattern: Pattern, input: &'h str) -> Self {
        let (chars, offsets) = decode(input);
        let state = State::new(
            pattern.group_count,
            pattern.local_count,
            pattern.memo_count,
            chars.len(),
        );
        Self { pattern, input, chars, offsets, state, last_append: 0 }
    }

    /// The pattern this matcher matches.
    #[inline]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// The input being searched.
    #[inline]
    pub fn input(&self) -> &'h str {
        self.input
    }

    /// Translates a byte offset into a character index.
    fn char_index(&self, offset: usize) -> Result<usize, MatchError> {
        self.offsets
            .binary_search(&offset)
            .map_err(|_| MatchError::InvalidIndex(offset))
    }

    #[inline]
    fn byte_offset(&self, index: usize) -> usize {
        self.offsets[index]
    }

    fn search(&mut self, from: usize) -> bool {
        let ctx =
            Context { program: &self.pattern.program, chars: &self.chars };
        self.state.run(&ctx, ctx.program.root, from, AcceptMode::Any)
    }

    fn anchored(&mut self, mode: AcceptMode) -> bool {
        let ctx =
            Context { program: &self.pattern.program, chars: &self.chars };
        let from = self.state.from;
        self.state.run(&ctx, ctx.program.match_root, from, mode)
    }

    /// Looks for the next match.
    ///
    /// The search starts at the beginning of the region, or right after
    /// the previous match if there was one. After an empty match, the
    /// search starts one character further so that it doesn't find the
    /// same empty match again.
    pub fn find(&mut self) -> bool {
        let mut next = self.state.last;

        if self.state.first == Some(next) {
            next += 1;
        }

        next = next.max(self.state.from);

        if next > self.state.to {
            self.state.first = None;
            self.state.captures.iter_mut().for_each(|c| *c = None);
            return false;
        }

        self.search(next)
    }

    /// Resets the matcher and looks for a match starting at byte offset
    /// `start`, ignoring the region.
    pub fn find_from(&mut self, start: usize) -> Result<bool, MatchError> {
        let start = self.char_index(start)?;
        self.reset();
        Ok(self.search(start))
    }

    /// Like [`Matcher::find`], but returns the byte range of the match.
    pub(crate) fn find_span(&mut self) -> Option<(usize, usize)> {
        if !self.find() {
            return None;
        }
        self.state.captures[0].map(|(start, end)| {
            (self.byte_offset(start), self.byte_offset(end))
        })
    }

    /// Matches the whole region against the pattern.
    pub fn matches(&mut self) -> bool {
        self.anchored(AcceptMode::End)
    }

    /// Matches a prefix of the region against the pattern.
    pub fn looking_at(&mut self) -> bool {
        self.anchored(AcceptMode::Any)
    }

    /// Byte range of a group in the current match.
    fn span(
        &self,
        group: usize,
    ) -> Result<Option<(usize, usize)>, MatchError> {
        if self.state.first.is_none() {
            return Err(MatchError::NoMatch);
        }
        let capture =
            self.state.captures.get(group).ok_or(MatchError::NoGroup(group))?;
        Ok(capture.map(|(start, end)| {
            (self.byte_offset(start), self.byte_offset(end))
        }))
    }

    fn named_group(&self, name: &str) -> Result<usize, MatchError> {
        self.pattern
            .named_groups
            .get(name)
            .copied()
            .ok_or_else(|| MatchError::NoGroupNamed(name.to_string()))
    }

    /// Offset where the current match starts.
    pub fn start(&self) -> Result<usize, MatchError> {
        Ok(self.span(0)?.map_or(0, |(start, _)| start))
    }

    /// Offset where the current match ends.
    pub fn end(&self) -> Result<usize, MatchError> {
        Ok(self.span(0)?.map_or(0, |(_, end)| end))
    }

    /// Offset where a group starts in the current match, or `None` if the
    /// group didn't participate in it.
    pub fn start_group(
        &self,
        group: usize,
    ) -> Result<Option<usize>, MatchError> {
        Ok(self.span(group)?.map(|(start, _)| start))
    }

    /// Offset where a group ends in the current match, or `None` if the
    /// group didn't participate in it.
    pub fn end_group(
        &self,
        group: usize,
    ) -> Result<Option<usize>, MatchError> {
        Ok(self.span(group)?.map(|(_, end)| end))
    }

    /// Like [`Matcher::start_group`] for a named group.
    pub fn start_named(
        &self,
        name: &str,
    ) -> Result<Option<usize>, MatchError> {
        self.start_group(self.named_group(name)?)
    }

    /// Like [`Matcher::end_group`] for a named group.
    pub fn end_named(
        &self,
        name: &str,
    ) -> Result<Option<usize>, MatchError> {
        self.end_group(self.named_group(name)?)
    }

    /// Text captured by a group in the current match, or `None` if the
    /// group didn't participate in it. Group 0 is the whole match.
    pub fn group(
        &self,
        group: usize,
    ) -> Result<Option<&'h str>, MatchError> {
        Ok(self.span(group)?.map(|(start, end)| &self.input[start..end]))
    }

    /// Text captured by a named group in the current match.
    pub fn group_named(
        &self,
        name: &str,
    ) -> Result<Option<&'h str>, MatchError> {
        self.group(self.named_group(name)?)
    }

    /// Number of capturing groups in the pattern, not counting group 0.
    #[inline]
    pub fn group_count(&self) -> usize {
        self.pattern.group_count
    }

    /// Returns a snapshot of the current match.
    pub fn to_match_result(&self) -> Result<MatchResult<'h>, MatchError> {
        if self.state.first.is_none() {
            return Err(MatchError::NoMatch);
        }
        Ok(self.snapshot())
    }

    /// Copies the capture table into a [`MatchResult`]. Must be called
    /// right after a successful match operation.
    fn snapshot(&self) -> MatchResult<'h> {
        let captures = self
            .state
            .captures
            .iter()
            .map(|capture| {
                capture.map(|(start, end)| {
                    (self.byte_offset(start), self.byte_offset(end))
                })
            })
            .collect();

        MatchResult::new(
            self.input,
            captures,
            self.pattern.named_groups.clone(),
        )
    }

    /// Returns an iterator over the matches that follow, as found by
    /// repeated calls to [`Matcher::find`].
    pub fn results<'m>(&'m mut self) -> Results<'m, 'h> {
        Results { matcher: self }
    }

    /// Discards the current match and the region, and restarts appending
    /// from the beginning of the input. Bounds options are kept.
    pub fn reset(&mut self) -> &mut Self {
        let state = &mut self.state;
        state.first = None;
        state.last = 0;
        state.old_last = None;
        state.captures.iter_mut().for_each(|c| *c = None);
        state.locals.iter_mut().for_each(|l| *l = None);
        state.memos.iter_mut().for_each(|m| m.clear());
        state.from = 0;
        state.to = self.chars.len();
        self.last_append = 0;
        self
    }

    /// Resets the matcher and makes it search `input` from now on.
    pub fn reset_input(&mut self, input: &'h str) -> &mut Self {
        let (chars, offsets) = decode(input);
        self.input = input;
        self.chars = chars;
        self.offsets = offsets;
        self.reset()
    }

    /// Resets the matcher and restricts searches to the byte range
    /// `start..end` of the input.
    pub fn region(
        &mut self,
        start: usize,
        end: usize,
    ) -> Result<&mut Self, MatchError> {
        if start > end || end > self.input.len() {
            return Err(MatchError::InvalidRegion { start, end });
        }

        let from = self.char_index(start)?;
        let to = self.char_index(end)?;

        self.reset();
        self.state.from = from;
        self.state.to = to;

        Ok(self)
    }

    /// Byte offset where the region starts.
    pub fn region_start(&self) -> usize {
        self.byte_offset(self.state.from)
    }

    /// Byte offset where the region ends.
    pub fn region_end(&self) -> usize {
        self.byte_offset(self.state.to)
    }

    /// With anchoring bounds, `^` and `$` match at the boundaries of the
    /// region. Without them, only at the boundaries of the input. Anchoring
    /// bounds are used by default.
    pub fn use_anchoring_bounds(&mut self, yes: bool) -> &mut Self {
        self.state.anchoring_bounds = yes;
        self
    }

    /// Tells whether anchoring bounds are in use.
    pub fn has_anchoring_bounds(&self) -> bool {
        self.state.anchoring_bounds
    }

    /// With transparent bounds, lookarounds and word boundaries can see
    /// the text outside the region. Bounds are opaque by default.
    pub fn use_transparent_bounds(&mut self, yes: bool) -> &mut Self {
        self.state.transparent_bounds = yes;
        self
    }

    /// Tells whether transparent bounds are in use.
    pub fn has_transparent_bounds(&self) -> bool {
        self.state.transparent_bounds
    }

    /// True if the end of the input was reached during the last match
    /// operation, which means that more input could have changed its
    /// outcome.
    pub fn hit_end(&self) -> bool {
        self.state.hit_end
    }

    /// True if the last match operation succeeded but more input could
    /// turn it into a failure.
    pub fn require_end(&self) -> bool {
        self.state.require_end
    }
}

impl Debug for Matcher<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Matcher");
        debug
            .field("pattern", &self.pattern.as_str())
            .field("region", &(self.region_start()..self.region_end()));
        match self.span(0) {
            Ok(Some((start, end))) => debug.field("last_match", &(start..end)),
            _ => debug.field("last_match", &None::<()>),
        };
        debug.finish()
    }
}

/// Iterator returned by [`Matcher::results`].
pub struct Results<'m, 'h> {
    matcher: &'m mut Matcher<'h>,
}

impl<'h> Iterator for Results<'_, 'h> {
    type Item = MatchResult<'h>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.matcher.find() {
            return None;
        }
        Some(self.matcher.snapshot())
    }
}
