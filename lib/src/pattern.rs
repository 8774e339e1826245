use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::compiler::Compiler;
use crate::errors::SyntaxError;
use crate::flags::Flags;
use crate::matcher::Matcher;
use crate::program::Program;

/// A compiled regular expression.
///
/// A pattern is immutable and can be shared between threads. Matching is
/// done by a [`Matcher`], which holds the state of a search over a given
/// input and is created with [`Pattern::matcher`].
///
/// ```
/// # use regulus::Pattern;
/// let pattern = Pattern::new(r"(?<year>\d{4})-(?<month>\d{2})").unwrap();
/// let mut matcher = pattern.matcher("released on 2024-03");
///
/// assert!(matcher.find());
/// assert_eq!(matcher.group_named("year"), Ok(Some("2024")));
/// ```
#[derive(Clone)]
pub struct Pattern {
    pub(crate) source: String,
    pub(crate) flags: Flags,
    pub(crate) program: Arc<Program>,
    /// Number of capturing groups, not counting group 0.
    pub(crate) group_count: usize,
    pub(crate) named_groups: Arc<FxHashMap<String, usize>>,
    pub(crate) local_count: usize,
    pub(crate) memo_count: usize,
}

impl Pattern {
    /// Compiles `pattern` without flags.
    pub fn new(pattern: &str) -> Result<Pattern, SyntaxError> {
        Compiler::new().compile(pattern)
    }

    /// Returns the source text this pattern was compiled from.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.source.as_str()
    }

    /// Returns the flags this pattern was compiled with.
    ///
    /// Flags toggled inline within the pattern are not included.
    #[inline]
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Number of capturing groups in the pattern, not counting the implicit
    /// group 0.
    #[inline]
    pub fn group_count(&self) -> usize {
        self.group_count
    }

    /// Returns the named groups together with their indexes, in no
    /// particular order.
    pub fn group_names(&self) -> impl Iterator<Item = (&str, usize)> {
        self.named_groups.iter().map(|(name, index)| (name.as_str(), *index))
    }

    /// Creates a matcher that matches `input` against this pattern.
    pub fn matcher<'h>(&self, input: &'h str) -> Matcher<'h> {
        Matcher::new(self.clone(), input)
    }

    /// Splits `input` around the matches of this pattern.
    ///
    /// A zero-width match at the beginning of the input never produces a
    /// leading empty string. `limit` controls how many times the pattern is
    /// applied:
    ///
    /// * If `limit` is positive the result has at most `limit` elements, the
    ///   last one containing everything after the last applied match.
    /// * If `limit` is zero the pattern is applied as many times as
    ///   possible, and trailing empty strings are discarded.
    /// * If `limit` is negative the pattern is applied as many times as
    ///   possible, and trailing empty strings are kept.
    ///
    /// ```
    /// # use regulus::Pattern;
    /// let pattern = Pattern::new("o").unwrap();
    /// assert_eq!(pattern.split("boo:and:foo", 0), vec!["b", "", ":and:f"]);
    /// assert_eq!(pattern.split("boo:and:foo", -1), vec!["b", "", ":and:f", "", ""]);
    /// assert_eq!(pattern.split("boo:and:foo", 2), vec!["b", "o:and:foo"]);
    /// ```
    pub fn split<'h>(&self, input: &'h str, limit: i32) -> Vec<&'h str> {
        let limited = limit > 0;
        let mut index = 0;
        let mut result = Vec::new();
        let mut matcher = self.matcher(input);

        while let Some((start, end)) = matcher.find_span() {
            if !limited || result.len() < (limit - 1) as usize {
                if index == 0 && start == 0 && start == end {
                    continue;
                }
                result.push(&input[index..start]);
                index = end;
            } else {
                result.push(&input[index..]);
                index = end;
                break;
            }
        }

        if index == 0 {
            return vec![input];
        }

        if !limited || result.len() < limit as usize {
            result.push(&input[index..]);
        }

        if limit == 0 {
            while result.last().is_some_and(|s| s.is_empty()) {
                result.pop();
            }
        }

        result
    }

    /// Like [`Pattern::split`] with a limit of zero, but the pieces are
    /// produced lazily.
    pub fn split_iter<'h>(&self, input: &'h str) -> SplitIter<'h> {
        SplitIter {
            matcher: self.matcher(input),
            input,
            current: 0,
            next_element: None,
            empty_count: input.is_empty() as usize,
        }
    }

    /// Returns a closure that tells whether the pattern is found somewhere
    /// in a string.
    pub fn as_predicate(&self) -> impl Fn(&str) -> bool + Send + Sync {
        let pattern = self.clone();
        move |s| pattern.matcher(s).find()
    }

    /// Returns a closure that tells whether the pattern matches a whole
    /// string.
    pub fn as_match_predicate(&self) -> impl Fn(&str) -> bool + Send + Sync {
        let pattern = self.clone();
        move |s| pattern.matcher(s).matches()
    }

    /// Compiles `regex` and tells whether it matches the whole `input`.
    pub fn matches(regex: &str, input: &str) -> Result<bool, SyntaxError> {
        Ok(Pattern::new(regex)?.matcher(input).matches())
    }

    /// Returns a pattern that matches `s` literally.
    ///
    /// ```
    /// # use regulus::Pattern;
    /// assert_eq!(Pattern::quote("1+1"), r"\Q1+1\E");
    /// assert_eq!(Pattern::quote(r"a\Eb"), r"\Qa\E\\E\Qb\E");
    /// ```
    pub fn quote(s: &str) -> String {
        let mut result = String::with_capacity(s.len() + 4);
        result.push_str(r"\Q");
        result.push_str(s.replace(r"\E", r"\E\\E\Q").as_str());
        result.push_str(r"\E");
        result
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.source.as_str())
    }
}

impl Debug for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pattern")
            .field("source", &self.source)
            .field("flags", &format_args!("{:#x}", self.flags.to_raw()))
            .field("group_count", &self.group_count)
            .finish()
    }
}

/// Patterns are serialized as their source text plus their flags, and
/// compiled again when deserialized.
#[derive(Serialize, Deserialize)]
struct SerializedPattern {
    source: String,
    flags: u32,
}

impl Serialize for Pattern {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        SerializedPattern {
            source: self.source.clone(),
            flags: self.flags.to_raw(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let serialized = SerializedPattern::deserialize(deserializer)?;

        Compiler::new()
            .flags(Flags::from_raw(serialized.flags))
            .compile(serialized.source.as_str())
            .map_err(|err| serde::de::Error::custom(err.to_string()))
    }
}

/// Iterator returned by [`Pattern::split_iter`].
pub struct SplitIter<'h> {
    matcher: Matcher<'h>,
    input: &'h str,
    /// Byte offset where the next piece starts. Reaches the input length
    /// once the last piece has been produced.
    current: usize,
    next_element: Option<&'h str>,
    /// Number of empty pieces that go before `next_element`.
    empty_count: usize,
}

impl<'h> SplitIter<'h> {
    fn has_next(&mut self) -> bool {
        if self.next_element.is_some() || self.empty_count > 0 {
            return true;
        }

        if self.current == self.input.len() {
            return false;
        }

        while let Some((start, end)) = self.matcher.find_span() {
            let element = &self.input[self.current..start];
            self.current = end;
            if !element.is_empty() {
                self.next_element = Some(element);
                return true;
            }
            // No leading empty piece for a zero-width match at the start.
            if self.current > 0 {
                self.empty_count += 1;
            }
        }

        let element = &self.input[self.current..];
        self.current = self.input.len();

        if element.is_empty() {
            // Trailing empty pieces are dropped.
            self.empty_count = 0;
            false
        } else {
            self.next_element = Some(element);
            true
        }
    }
}

impl<'h> Iterator for SplitIter<'h> {
    type Item = &'h str;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }
        if self.empty_count == 0 {
            self.next_element.take()
        } else {
            self.empty_count -= 1;
            Some("")
        }
    }
}
