/*! Compiles patterns into matching programs.

Compilation happens in three steps. The pattern text is first preprocessed
(`\Q...\E` quoting is turned into escapes, and with [`Flag::CanonEq`] the
text is decomposed and every base character with combining marks is
expanded into the alternatives that are canonically equivalent to it).
Then a recursive descent parser builds the node graph described in
[`crate::program`]. Finally the optimizer picks the node where unanchored
searches start, which is either a Boyer-Moore search for a leading literal,
a node that tries every position, or the program itself when it starts with
`\A`.
*/

#[cfg(feature = "logging")]
use log::*;

use crate::errors::SyntaxError;
use crate::flags::{Flag, Flags};
use crate::pattern::Pattern;

mod canon;
mod class;
mod optimizer;
mod parser;
mod study;

#[cfg(test)]
mod tests;

/// Compiles a pattern with the given flags.
///
/// # Example
///
/// ```rust
/// # use regulus::{Flag, Flags};
/// let pattern = regulus::compile("colou?r", Flags::from(Flag::CaseInsensitive)).unwrap();
/// assert!(pattern.matcher("COLOR").matches());
/// ```
pub fn compile(pattern: &str, flags: Flags) -> Result<Pattern, SyntaxError> {
    Compiler::new().flags(flags).compile(pattern)
}

/// Compiles patterns with a given set of options.
///
/// ```
/// # use regulus::Compiler;
/// let pattern = Compiler::new()
///     .case_insensitive(true)
///     .multiline(true)
///     .compile("^hello$")
///     .unwrap();
///
/// assert!(pattern.matcher("Foo\nHELLO\n").find());
/// ```
#[derive(Clone, Debug)]
pub struct Compiler {
    flags: Flags,
    deterministic_loops: bool,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! flag_option {
    ($(#[$doc:meta])* $name:ident, $flag:ident) => {
        $(#[$doc])*
        pub fn $name(&mut self, yes: bool) -> &mut Self {
            self.flags = if yes {
                self.flags.with(Flag::$flag)
            } else {
                self.flags.without(Flag::$flag)
            };
            self
        }
    };
}

impl Compiler {
    /// Creates a compiler with no flags set.
    pub fn new() -> Self {
        Self { flags: Flags::none(), deterministic_loops: true }
    }

    /// Replaces all the flags at once.
    pub fn flags(&mut self, flags: Flags) -> &mut Self {
        self.flags = flags;
        self
    }

    flag_option!(
        /// Enables or disables [`Flag::CaseInsensitive`].
        case_insensitive,
        CaseInsensitive
    );

    flag_option!(
        /// Enables or disables [`Flag::Multiline`].
        multiline,
        Multiline
    );

    flag_option!(
        /// Enables or disables [`Flag::DotAll`].
        dot_all,
        DotAll
    );

    flag_option!(
        /// Enables or disables [`Flag::UnicodeCase`].
        unicode_case,
        UnicodeCase
    );

    flag_option!(
        /// Enables or disables [`Flag::CanonEq`].
        canon_eq,
        CanonEq
    );

    flag_option!(
        /// Enables or disables [`Flag::UnixLines`].
        unix_lines,
        UnixLines
    );

    flag_option!(
        /// Enables or disables [`Flag::Literal`].
        literal,
        Literal
    );

    flag_option!(
        /// Enables or disables [`Flag::Comments`].
        comments,
        Comments
    );

    flag_option!(
        /// Enables or disables [`Flag::UnicodeCharacterClass`].
        unicode_character_class,
        UnicodeCharacterClass
    );

    /// Controls whether repeated groups whose body always matches the same
    /// number of characters are compiled into a single iterative node.
    ///
    /// When disabled every repeated group goes through the generic loop,
    /// which recurses once per repetition. Matching results are the same
    /// either way. Enabled by default.
    #[doc(hidden)]
    pub fn deterministic_loops(&mut self, yes: bool) -> &mut Self {
        self.deterministic_loops = yes;
        self
    }

    /// Compiles `pattern` with the current options.
    pub fn compile(&self, pattern: &str) -> Result<Pattern, SyntaxError> {
        let mut flags = self.flags;

        if flags.contains(Flag::UnicodeCharacterClass) {
            flags = flags.with(Flag::UnicodeCase);
        }

        let output =
            parser::Parser::new(pattern, flags, self.deterministic_loops)
                .parse()?;

        let mut program = output.program;

        optimizer::optimize(&mut program);

        #[cfg(feature = "logging")]
        {
            debug!(
                "compiled {:?} (flags: {:#x}): {} nodes, {} groups, \
                 {} locals, start: {}",
                pattern,
                flags.to_raw(),
                program.nodes.len(),
                output.group_count,
                output.local_count,
                program.node(program.root).kind,
            );
            trace!("program for {:?}:\n{}", pattern, program);
        }

        Ok(Pattern {
            source: pattern.to_string(),
            flags,
            program: std::sync::Arc::new(program),
            group_count: output.group_count,
            named_groups: std::sync::Arc::new(output.named_groups),
            local_count: output.local_count,
            memo_count: output.memo_count,
        })
    }
}
