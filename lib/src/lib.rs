/*! A backtracking regular expression engine.

Patterns are compiled into a graph of small matching nodes that is executed
by a backtracking matcher, which makes it possible to support features that
automata-based engines can't offer, like back references, lookbehinds,
possessive quantifiers and atomic groups. The syntax is the one used by
`java.util.regex`, including its flags and inline modifiers, Unicode
properties, and canonical equivalence.

There are two main types in this crate: [`Pattern`] and [`Matcher`]. A
pattern is the compiled form of a regular expression, it is immutable and
can be shared between threads. A matcher binds a pattern to an input string
and holds the state of the search, so it can be used from a single thread
at a time.

# Example

```rust
# use regulus;
// Compile a pattern.
let pattern = regulus::Pattern::new(r"(\w+)=(\d+)").unwrap();

// Create a matcher for some input.
let mut matcher = pattern.matcher("width=80 height=24");

// Find all the matches.
let mut pairs = Vec::new();
while matcher.find() {
    pairs.push((
        matcher.group(1).unwrap().unwrap(),
        matcher.group(2).unwrap().unwrap(),
    ));
}

assert_eq!(pairs, vec![("width", "80"), ("height", "24")]);

// Replace using the captured groups.
assert_eq!(matcher.replace_all("$2 ${1}").unwrap(), "80 width 24 height");
```

Offsets accepted and returned by the API are byte offsets into the input.
*/

#![deny(missing_docs)]

pub use compiler::compile;
pub use compiler::Compiler;

pub use errors::Error;
pub use errors::MatchError;
pub use errors::SyntaxError;

pub use flags::Flag;
pub use flags::Flags;

pub use matcher::Matcher;
pub use matcher::Results;

pub use pattern::Pattern;
pub use pattern::SplitIter;

pub use result::MatchResult;

mod compiler;
mod errors;
// The methods generated by `bitmask!` have no documentation.
#[allow(missing_docs)]
mod flags;
mod matcher;
mod pattern;
mod program;
mod result;
mod unicode;

#[cfg(test)]
mod tests;

/// Replaces every match of `regex` in `input` with the expansion of
/// `template`.
///
/// ```rust
/// assert_eq!(regulus::replace_all(r"\s+", "a  b \t c", " ").unwrap(), "a b c");
/// ```
pub fn replace_all(
    regex: &str,
    input: &str,
    template: &str,
) -> Result<String, Error> {
    Ok(Pattern::new(regex)?.matcher(input).replace_all(template)?)
}

/// Replaces the first match of `regex` in `input` with the expansion of
/// `template`.
pub fn replace_first(
    regex: &str,
    input: &str,
    template: &str,
) -> Result<String, Error> {
    Ok(Pattern::new(regex)?.matcher(input).replace_first(template)?)
}

/// Splits `input` around the matches of `regex`. See [`Pattern::split`]
/// for the meaning of `limit`.
pub fn split<'h>(
    regex: &str,
    input: &'h str,
    limit: i32,
) -> Result<Vec<&'h str>, Error> {
    Ok(Pattern::new(regex)?.split(input, limit))
}
