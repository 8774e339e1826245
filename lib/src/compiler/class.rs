//! Character classes and property escapes.

use crate::errors::SyntaxError;
use crate::flags::Flag;
use crate::program::{BitClass, CharPredicate};
use crate::unicode::{self, AsciiClass};

use super::parser::{Escaped, Parser};

fn union(prev: Option<CharPredicate>, curr: CharPredicate) -> CharPredicate {
    match prev {
        Some(prev) => prev.union(curr),
        None => curr,
    }
}

impl Parser<'_> {
    /// Parses the body of a class. The cursor must be right after the
    /// opening bracket.
    ///
    /// With `consume` the closing bracket is consumed, otherwise the cursor
    /// is left on it, which is the case for the operands of `&&` that are
    /// not enclosed in brackets.
    pub(super) fn class(
        &mut self,
        consume: bool,
    ) -> Result<CharPredicate, SyntaxError> {
        let mut prev: Option<CharPredicate> = None;
        let mut curr: Option<CharPredicate> = None;
        let mut bits = BitClass::new();
        let mut has_bits = false;
        let mut negated = false;

        let open = self.cursor;

        if consume && self.peek() == Some('^') && self.cursor == open {
            self.cursor += 1;
            negated = true;
        }

        loop {
            match self.peek() {
                Some('[') => {
                    self.cursor += 1;
                    let nested = self.class(true)?;
                    curr = Some(nested.clone());
                    prev = Some(union(prev, nested));
                    continue;
                }
                Some('&') => {
                    let amp = self.cursor;
                    self.cursor += 1;

                    if self.peek() == Some('&') {
                        self.cursor += 1;
                        let mut right: Option<CharPredicate> = None;

                        loop {
                            match self.peek() {
                                Some(']' | '&') => break,
                                Some('[') => {
                                    self.cursor += 1;
                                    let nested = self.class(true)?;
                                    right = Some(union(right, nested));
                                }
                                Some(_) => {
                                    let operand = self.class(false)?;
                                    right = Some(union(right, operand));
                                }
                                None => {
                                    return Err(
                                        self.error("Unclosed character class")
                                    )
                                }
                            }
                        }

                        // Characters listed before `&&` are an operand of
                        // the intersection.
                        if has_bits {
                            let listed = CharPredicate::Bits(Box::new(
                                std::mem::take(&mut bits),
                            ));
                            prev = Some(match prev {
                                None => {
                                    curr = Some(listed.clone());
                                    listed
                                }
                                Some(prev) => prev.union(listed),
                            });
                            has_bits = false;
                        }

                        if right.is_some() {
                            curr = right.clone();
                        }

                        prev = Some(match prev {
                            None => right.ok_or_else(|| {
                                self.error("Bad class syntax")
                            })?,
                            Some(prev) => {
                                let operand = curr
                                    .clone()
                                    .unwrap_or_else(|| prev.clone());
                                prev.and(operand)
                            }
                        });

                        continue;
                    }

                    // A single `&` is a literal.
                    self.cursor = amp;
                }
                Some(']') if prev.is_some() || has_bits => {
                    if consume {
                        self.cursor += 1;
                    }
                    let bits = CharPredicate::Bits(Box::new(bits));
                    let class = match prev {
                        None => bits,
                        Some(prev) if has_bits => prev.union(bits),
                        Some(prev) => prev,
                    };
                    return Ok(if negated { class.negate() } else { class });
                }
                None => return Err(self.error("Unclosed character class")),
                _ => {}
            }

            match self.range(&mut bits)? {
                Some(predicate) => {
                    curr = Some(predicate.clone());
                    prev = Some(union(prev, predicate));
                }
                None => has_bits = true,
            }
        }
    }

    /// Parses a single character, a range or an escape inside a class.
    /// Characters below `\u{100}` are added to `bits` and `None` is
    /// returned.
    fn range(
        &mut self,
        bits: &mut BitClass,
    ) -> Result<Option<CharPredicate>, SyntaxError> {
        let ch = match self.peek() {
            Some('\\') => {
                if matches!(self.peek_raw_at(1), Some('p' | 'P')) {
                    return self.property_escape().map(Some);
                }
                let is_range = self.peek_raw_at(2) == Some('-');
                match self.escape(true, is_range)? {
                    Escaped::Char(c) => c,
                    Escaped::Class(predicate) => return Ok(Some(predicate)),
                    Escaped::Node(_) => {
                        return Err(
                            self.error("Illegal/unsupported escape sequence")
                        )
                    }
                }
            }
            Some(c) => {
                self.cursor += 1;
                c
            }
            None => return Err(self.error("Unclosed character class")),
        };

        if self.peek() == Some('-') {
            let end_range = self.peek_raw_at(1);

            if end_range == Some('[') {
                return Ok(self.bits_or_single(bits, ch));
            }

            if end_range != Some(']') {
                self.cursor += 1;

                let end = match self.peek() {
                    Some('\\') => match self.escape(true, true)? {
                        Escaped::Char(c) => c,
                        _ => return Err(self.error("Illegal character range")),
                    },
                    Some(c) => {
                        self.cursor += 1;
                        c
                    }
                    None => return Err(self.error("Unclosed character class")),
                };

                if end < ch {
                    return Err(self.error("Illegal character range"));
                }

                return Ok(Some(if !self.has(Flag::CaseInsensitive) {
                    CharPredicate::Range(ch, end)
                } else if self.has(Flag::UnicodeCase) {
                    CharPredicate::RangeU(ch, end)
                } else {
                    CharPredicate::RangeI(ch, end)
                }));
            }
        }

        Ok(self.bits_or_single(bits, ch))
    }

    fn bits_or_single(
        &self,
        bits: &mut BitClass,
        c: char,
    ) -> Option<CharPredicate> {
        let case_insensitive = self.has(Flag::CaseInsensitive);
        let unicode_case = self.has(Flag::UnicodeCase);

        // These characters have case variants outside the bit set.
        let folds_out = case_insensitive
            && unicode_case
            && matches!(
                c,
                '\u{FF}'
                    | '\u{B5}'
                    | 'I'
                    | 'i'
                    | 'S'
                    | 's'
                    | 'K'
                    | 'k'
                    | '\u{C5}'
                    | '\u{E5}'
            );

        if (c as u32) < 256 && !folds_out {
            bits.add(c, case_insensitive, unicode_case);
            None
        } else {
            Some(self.single(c))
        }
    }

    /// Parses `\p{name}`, `\pL`, `\P{name}` or `\PL`. The cursor must be at
    /// the backslash.
    pub(super) fn property_escape(
        &mut self,
    ) -> Result<CharPredicate, SyntaxError> {
        self.cursor += 1;
        let complement = self.read_raw() == Some('P');

        let name: String = if self.peek_raw() == Some('{') {
            self.cursor += 1;
            let start = self.cursor;
            loop {
                match self.read_raw() {
                    Some('}') => break,
                    Some(_) => {}
                    None => {
                        return Err(self.error("Unclosed character family"))
                    }
                }
            }
            let name: String =
                self.pattern[start..self.cursor - 1].iter().collect();
            if name.is_empty() {
                return Err(self.error("Empty character family"));
            }
            name
        } else {
            match self.read_raw() {
                Some(c) => c.to_string(),
                None => {
                    return Err(
                        self.error("Illegal/unsupported escape sequence")
                    )
                }
            }
        };

        let predicate = self.lookup_property(&name)?;

        Ok(if complement { predicate.negate() } else { predicate })
    }

    fn lookup_property(
        &self,
        name: &str,
    ) -> Result<CharPredicate, SyntaxError> {
        let case_insensitive = self.has(Flag::CaseInsensitive);

        if let Some((key, value)) = name.split_once('=') {
            let predicate = match key.to_ascii_lowercase().as_str() {
                "sc" | "script" => {
                    unicode::script(value).map(CharPredicate::Set)
                }
                "blk" | "block" => {
                    unicode::block(value).map(CharPredicate::Set)
                }
                "gc" | "general_category" => {
                    self.named_property(value, case_insensitive)
                }
                _ => None,
            };
            return predicate.ok_or_else(|| {
                self.error(format!(
                    "Unknown Unicode property {{name=<{}>, value=<{}>}}",
                    key, value
                ))
            });
        }

        let predicate = if let Some(block) = name.strip_prefix("In") {
            unicode::block(block).map(CharPredicate::Set)
        } else if let Some(property) = name.strip_prefix("Is") {
            self.is_property(property, case_insensitive)
        } else {
            let posix = if self.has(Flag::UnicodeCharacterClass) {
                unicode::unicode_posix(name, case_insensitive)
                    .map(CharPredicate::Set)
            } else {
                None
            };
            posix.or_else(|| self.named_property(name, case_insensitive))
        };

        predicate.ok_or_else(|| {
            self.error(format!("Unknown character property name {{{}}}", name))
        })
    }

    /// Names that can be used without prefix: POSIX classes, `java*`
    /// properties and general categories.
    fn named_property(
        &self,
        name: &str,
        case_insensitive: bool,
    ) -> Option<CharPredicate> {
        if let Some(class) = AsciiClass::from_posix_name(name) {
            return Some(CharPredicate::Ascii(match class {
                AsciiClass::Lower | AsciiClass::Upper if case_insensitive => {
                    AsciiClass::Alpha
                }
                class => class,
            }));
        }

        if let Some(set) = unicode::java_property(name, case_insensitive) {
            return Some(CharPredicate::Set(set));
        }

        if case_insensitive && matches!(name, "Lu" | "Ll" | "Lt") {
            return Some(CharPredicate::Set(unicode::CASED.clone()));
        }

        unicode::general_category(name).map(CharPredicate::Set)
    }

    /// Names following `Is`: binary properties, general categories and
    /// scripts.
    fn is_property(
        &self,
        name: &str,
        case_insensitive: bool,
    ) -> Option<CharPredicate> {
        if let Some(set) = unicode::unicode_posix(name, case_insensitive) {
            return Some(CharPredicate::Set(set));
        }

        if case_insensitive
            && matches!(
                name.to_ascii_uppercase().as_str(),
                "LOWERCASE" | "UPPERCASE" | "TITLECASE"
            )
        {
            return Some(CharPredicate::Set(unicode::CASED.clone()));
        }

        self.named_property(name, case_insensitive)
            .or_else(|| unicode::property(name).map(CharPredicate::Set))
    }
}
