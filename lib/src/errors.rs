use std::fmt::{Display, Formatter};

use annotate_snippets::{Level, Renderer, Snippet};
use thiserror::Error;

/// Error returned when a pattern can't be compiled.
///
/// Besides the description of the problem it carries the text that was
/// being compiled and, when known, the index of the character where the
/// problem was detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    description: String,
    pattern: String,
    index: Option<usize>,
}

impl SyntaxError {
    pub(crate) fn new<D: Into<String>, P: Into<String>>(
        description: D,
        pattern: P,
        index: Option<usize>,
    ) -> Self {
        Self {
            description: description.into(),
            pattern: pattern.into(),
            index,
        }
    }

    /// Description of the problem, without positional information.
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// The pattern that failed to compile.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Character index within [`SyntaxError::pattern`] where the problem
    /// was detected, if known.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Returns a multi-line report pointing at the offending character,
    /// suitable for showing to humans.
    pub fn detailed_report(&self) -> String {
        let src = self.pattern.as_str();
        let message = Level::Error.title(self.description.as_str());

        let message = match self.index.and_then(|i| self.byte_span(i)) {
            Some(span) => message.snippet(
                Snippet::source(src)
                    .origin("pattern")
                    .annotation(Level::Error.span(span).label("here")),
            ),
            None => message.snippet(Snippet::source(src).origin("pattern")),
        };

        Renderer::plain().render(message).to_string()
    }

    /// Translates a character index into the byte range of that character.
    /// Indexes past the end point to the last character.
    fn byte_span(&self, index: usize) -> Option<std::ops::Range<usize>> {
        let (start, c) = self
            .pattern
            .char_indices()
            .nth(index)
            .or_else(|| self.pattern.char_indices().last())?;
        Some(start..start + c.len_utf8())
    }
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description)?;
        if let Some(index) = self.index {
            write!(f, " near index {}", index)?;
        }
        write!(f, "\n{}", self.pattern)?;
        if let Some(index) = self.index {
            if index < self.pattern.chars().count() {
                write!(f, "\n{:>width$}", "^", width = index + 1)?;
            }
        }
        Ok(())
    }
}

/// Errors caused by using a [`crate::Matcher`] or [`crate::MatchResult`] in
/// a way that its current state doesn't allow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// Match offsets were requested but the last attempt didn't match, or
    /// there was no attempt at all.
    #[error("no match available")]
    NoMatch,

    /// The pattern doesn't have a group with the given index.
    #[error("no group {0}")]
    NoGroup(usize),

    /// The pattern doesn't have a group with the given name.
    #[error("no group with name <{0}>")]
    NoGroupNamed(String),

    /// An offset is past the end of the input or doesn't fall on a char
    /// boundary.
    #[error("illegal index {0}")]
    InvalidIndex(usize),

    /// The region bounds are out of range or reversed.
    #[error("illegal region [{start}, {end})")]
    InvalidRegion {
        /// Start of the requested region.
        start: usize,
        /// End of the requested region.
        end: usize,
    },

    /// The current match starts before the end of the last match appended
    /// with [`crate::Matcher::append_replacement`], which happens when the
    /// matcher goes back to an earlier position without being reset.
    #[error("match at {start} starts before the append position {append_position}")]
    AppendPosition {
        /// Start of the current match.
        start: usize,
        /// End of the last appended match.
        append_position: usize,
    },

    /// A replacement template is malformed.
    #[error("illegal replacement: {0}")]
    InvalidReplacement(String),
}

/// Errors returned by the convenience functions that compile and run a
/// pattern in one step.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    /// The pattern failed to compile.
    SyntaxError(#[from] SyntaxError),

    #[error(transparent)]
    /// The pattern compiled, but matching or replacing failed.
    MatchError(#[from] MatchError),
}
