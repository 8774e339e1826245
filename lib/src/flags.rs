/*! Compilation flags.

Flags are passed to [`crate::compile`] as a [`Flags`] mask, and most of them
can also be toggled from within the pattern itself with inline modifier
groups like `(?i)` or `(?s-m:...)`.
*/

use bitmask::bitmask;

bitmask! {
    /// Set of compilation flags.
    ///
    /// A single [`Flag`] converts into a [`Flags`] mask with `Flags::from`,
    /// and more flags can be added with `set`.
    #[derive(Debug)]
    pub mask Flags: u32 where

    /// Individual compilation flags.
    flags Flag {
        /// Only `\n` is recognized as a line terminator by `.`, `^` and `$`.
        /// Inline letter: `d`.
        UnixLines = 0x01,
        /// Case-insensitive matching. Only ASCII characters are folded unless
        /// [`Flag::UnicodeCase`] is also set. Inline letter: `i`.
        CaseInsensitive = 0x02,
        /// Whitespace and `#` comments are ignored in the pattern.
        /// Inline letter: `x`.
        Comments = 0x04,
        /// `^` and `$` match at line terminators, not only at the input
        /// boundaries. Inline letter: `m`.
        Multiline = 0x08,
        /// The whole pattern is a literal string.
        Literal = 0x10,
        /// `.` matches any character, line terminators included.
        /// Inline letter: `s`.
        DotAll = 0x20,
        /// Case-insensitive matching follows Unicode simple case mappings.
        /// Inline letter: `u`.
        UnicodeCase = 0x40,
        /// Canonically equivalent character sequences match each other.
        CanonEq = 0x80,
        /// Predefined and POSIX character classes follow Unicode instead of
        /// ASCII. Implies [`Flag::UnicodeCase`]. Inline letter: `U`.
        UnicodeCharacterClass = 0x100,
    }
}

const ALL_FLAGS: [Flag; 9] = [
    Flag::UnixLines,
    Flag::CaseInsensitive,
    Flag::Comments,
    Flag::Multiline,
    Flag::Literal,
    Flag::DotAll,
    Flag::UnicodeCase,
    Flag::CanonEq,
    Flag::UnicodeCharacterClass,
];

impl Flags {
    /// Returns the numeric representation of the mask.
    pub fn to_raw(&self) -> u32 {
        ALL_FLAGS
            .iter()
            .filter(|flag| self.contains(**flag))
            .fold(0, |bits, flag| bits | *flag as u32)
    }

    /// Builds a mask from its numeric representation. Unknown bits are
    /// ignored.
    pub fn from_raw(bits: u32) -> Flags {
        let mut flags = Flags::none();
        for flag in ALL_FLAGS {
            if bits & flag as u32 != 0 {
                flags.set(flag);
            }
        }
        flags
    }

    pub(crate) fn with(self, flag: Flag) -> Flags {
        Flags::from_raw(self.to_raw() | flag as u32)
    }

    pub(crate) fn without(self, flag: Flag) -> Flags {
        Flags::from_raw(self.to_raw() & !(flag as u32))
    }
}

impl Flag {
    /// Returns the flag corresponding to an inline modifier letter.
    pub(crate) fn from_inline(c: char) -> Option<Flag> {
        match c {
            'i' => Some(Flag::CaseInsensitive),
            'm' => Some(Flag::Multiline),
            's' => Some(Flag::DotAll),
            'd' => Some(Flag::UnixLines),
            'u' => Some(Flag::UnicodeCase),
            'c' => Some(Flag::CanonEq),
            'x' => Some(Flag::Comments),
            'U' => Some(Flag::UnicodeCharacterClass),
            _ => None,
        }
    }
}
