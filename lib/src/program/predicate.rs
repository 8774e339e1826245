use std::fmt::{Display, Formatter};

use bitvec::array::BitArray;

use crate::unicode::{self, AsciiClass, CodepointSet};

/// A test on a single character.
///
/// Character classes are compiled into a tree of these, where leaves test
/// for a character, a range or a property, and inner nodes combine their
/// children.
#[derive(Clone, Debug)]
pub(crate) enum CharPredicate {
    Single(char),
    /// ASCII case-insensitive character.
    SingleI { lower: char, upper: char },
    /// Unicode case-insensitive character, stored in folded form.
    SingleU(char),
    Range(char, char),
    /// ASCII case-insensitive range.
    RangeI(char, char),
    /// Unicode case-insensitive range.
    RangeU(char, char),
    /// Characters in the range `[\x00-\xFF]`, one bit per character.
    Bits(Box<BitClass>),
    Set(CodepointSet),
    Ascii(AsciiClass),
    HorizontalSpace,
    VerticalSpace,
    /// `.` without `DotAll`.
    Dot,
    /// `.` with `UnixLines` and without `DotAll`.
    UnixDot,
    All,
    Union(Box<CharPredicate>, Box<CharPredicate>),
    Intersection(Box<CharPredicate>, Box<CharPredicate>),
    Negate(Box<CharPredicate>),
}

impl CharPredicate {
    pub fn is(&self, c: char) -> bool {
        match self {
            Self::Single(s) => c == *s,
            Self::SingleI { lower, upper } => c == *lower || c == *upper,
            Self::SingleU(folded) => {
                c == *folded || unicode::fold(c) == *folded
            }
            Self::Range(lo, hi) => *lo <= c && c <= *hi,
            Self::RangeI(lo, hi) => {
                (*lo <= c && c <= *hi)
                    || (c.is_ascii() && {
                        let upper = c.to_ascii_uppercase();
                        let lower = c.to_ascii_lowercase();
                        (*lo <= upper && upper <= *hi)
                            || (*lo <= lower && lower <= *hi)
                    })
            }
            Self::RangeU(lo, hi) => {
                if *lo <= c && c <= *hi {
                    return true;
                }
                let upper = unicode::to_upper(c);
                let lower = unicode::to_lower(upper);
                (*lo <= upper && upper <= *hi)
                    || (*lo <= lower && lower <= *hi)
            }
            Self::Bits(bits) => bits.contains(c),
            Self::Set(set) => set.contains(c),
            Self::Ascii(class) => class.matches(c),
            Self::HorizontalSpace => unicode::is_horizontal_space(c),
            Self::VerticalSpace => unicode::is_vertical_space(c),
            Self::Dot => !unicode::is_line_terminator(c),
            Self::UnixDot => c != '\n',
            Self::All => true,
            Self::Union(a, b) => a.is(c) || b.is(c),
            Self::Intersection(a, b) => a.is(c) && b.is(c),
            Self::Negate(p) => !p.is(c),
        }
    }

    pub fn union(self, other: CharPredicate) -> CharPredicate {
        Self::Union(Box::new(self), Box::new(other))
    }

    pub fn and(self, other: CharPredicate) -> CharPredicate {
        Self::Intersection(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> CharPredicate {
        match self {
            Self::Negate(p) => *p,
            p => Self::Negate(Box::new(p)),
        }
    }
}

impl Display for CharPredicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(c) => write!(f, "{:?}", c),
            Self::SingleI { lower, .. } => write!(f, "(?i){:?}", lower),
            Self::SingleU(c) => write!(f, "(?iu){:?}", c),
            Self::Range(lo, hi) => write!(f, "[{:?}-{:?}]", lo, hi),
            Self::RangeI(lo, hi) => write!(f, "(?i)[{:?}-{:?}]", lo, hi),
            Self::RangeU(lo, hi) => write!(f, "(?iu)[{:?}-{:?}]", lo, hi),
            Self::Bits(bits) => write!(f, "{}", bits),
            Self::Set(set) => write!(f, "SET({} ranges)", set.ranges().len()),
            Self::Ascii(class) => write!(f, "{}", class.name()),
            Self::HorizontalSpace => write!(f, "HSPACE"),
            Self::VerticalSpace => write!(f, "VSPACE"),
            Self::Dot => write!(f, "DOT"),
            Self::UnixDot => write!(f, "UNIX_DOT"),
            Self::All => write!(f, "ALL"),
            Self::Union(a, b) => write!(f, "({} || {})", a, b),
            Self::Intersection(a, b) => write!(f, "({} && {})", a, b),
            Self::Negate(p) => write!(f, "!{}", p),
        }
    }
}

/// Set of characters in the range `[\x00-\xFF]`.
#[derive(Clone, Debug, Default)]
pub(crate) struct BitClass {
    bits: BitArray<[u64; 4]>,
}

impl BitClass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a character to the set, together with its case variants when
    /// the class is case-insensitive. `c` must be lower than `\u{100}`.
    pub fn add(
        &mut self,
        c: char,
        case_insensitive: bool,
        unicode_case: bool,
    ) {
        if case_insensitive {
            if c.is_ascii() {
                self.insert(c.to_ascii_uppercase());
                self.insert(c.to_ascii_lowercase());
            } else if unicode_case {
                self.insert(unicode::to_lower(c));
                self.insert(unicode::to_upper(c));
            }
        }
        self.insert(c);
    }

    fn insert(&mut self, c: char) {
        if (c as u32) < 256 {
            self.bits.set(c as usize, true);
        }
    }

    #[inline]
    pub fn contains(&self, c: char) -> bool {
        (c as u32) < 256 && self.bits[c as usize]
    }
}

impl Display for BitClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for i in self.bits.iter_ones() {
            // Every index is below 256, so it is always a valid char.
            if let Some(c) = char::from_u32(i as u32) {
                write!(f, "{}", c.escape_debug())?;
            }
        }
        write!(f, "]")
    }
}
