use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::errors::MatchError;

/// Snapshot of a successful match.
///
/// Unlike [`crate::Matcher`], a `MatchResult` is not affected by further
/// searches. Offsets are byte offsets into the input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchResult<'h> {
    input: &'h str,
    /// Byte range of each group, group 0 being the whole match.
    captures: Vec<Option<(usize, usize)>>,
    named_groups: Arc<FxHashMap<String, usize>>,
}

impl<'h> MatchResult<'h> {
    pub(crate) fn new(
        input: &'h str,
        captures: Vec<Option<(usize, usize)>>,
        named_groups: Arc<FxHashMap<String, usize>>,
    ) -> Self {
        debug_assert!(captures.first().is_some_and(|c| c.is_some()));
        Self { input, captures, named_groups }
    }

    fn span(
        &self,
        group: usize,
    ) -> Result<Option<(usize, usize)>, MatchError> {
        self.captures.get(group).copied().ok_or(MatchError::NoGroup(group))
    }

    fn whole(&self) -> (usize, usize) {
        self.captures[0].unwrap_or_default()
    }

    /// Offset where the match starts.
    pub fn start(&self) -> usize {
        self.whole().0
    }

    /// Offset where the match ends.
    pub fn end(&self) -> usize {
        self.whole().1
    }

    /// The matched text.
    pub fn as_str(&self) -> &'h str {
        let (start, end) = self.whole();
        &self.input[start..end]
    }

    /// Number of capturing groups, not counting group 0.
    pub fn group_count(&self) -> usize {
        self.captures.len() - 1
    }

    /// Text captured by a group, or `None` if the group didn't participate
    /// in the match.
    pub fn group(&self, group: usize) -> Result<Option<&'h str>, MatchError> {
        Ok(self.span(group)?.map(|(start, end)| &self.input[start..end]))
    }

    /// Text captured by a named group.
    pub fn group_named(
        &self,
        name: &str,
    ) -> Result<Option<&'h str>, MatchError> {
        self.group(self.named_index(name)?)
    }

    /// Offset where a group starts, or `None` if it didn't participate.
    pub fn start_group(
        &self,
        group: usize,
    ) -> Result<Option<usize>, MatchError> {
        Ok(self.span(group)?.map(|(start, _)| start))
    }

    /// Offset where a group ends, or `None` if it didn't participate.
    pub fn end_group(
        &self,
        group: usize,
    ) -> Result<Option<usize>, MatchError> {
        Ok(self.span(group)?.map(|(_, end)| end))
    }

    fn named_index(&self, name: &str) -> Result<usize, MatchError> {
        self.named_groups
            .get(name)
            .copied()
            .ok_or_else(|| MatchError::NoGroupNamed(name.to_string()))
    }
}
