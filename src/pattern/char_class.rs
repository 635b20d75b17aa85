//! Character predicates and class lookup tables
//!
//! Single-character tests used by [`Pattern`](super::Pattern) primitives and
//! by the character scanners. ASCII membership for the named classes is a
//! single table lookup; characters outside ASCII fall back to the Unicode
//! queries on `char`.
//!
//! # Example
//!
//! ```rust
//! use knotwork::pattern::{CharClass, CharPredicate};
//!
//! let ident_start = CharPredicate::class(CharClass::WordStart);
//! assert!(ident_start.test('_'));
//! assert!(!ident_start.test('7'));
//!
//! let not_quote = CharPredicate::is('"').not();
//! assert!(not_quote.test('x'));
//! ```

use std::fmt;

// ============================================================================
// ASCII lookup table
// ============================================================================

const DIGIT: u8 = 1 << 0;
const HEX: u8 = 1 << 1;
const LOWER: u8 = 1 << 2;
const UPPER: u8 = 1 << 3;
const UNDERSCORE: u8 = 1 << 4;
const SPACE: u8 = 1 << 5;

const fn build_ascii_table() -> [u8; 128] {
    let mut table = [0u8; 128];
    let mut i = 0;
    while i < 128 {
        let b = i as u8;
        let mut bits = 0;
        if b.is_ascii_digit() {
            bits |= DIGIT | HEX;
        }
        if matches!(b, b'a'..=b'f' | b'A'..=b'F') {
            bits |= HEX;
        }
        if b.is_ascii_lowercase() {
            bits |= LOWER;
        }
        if b.is_ascii_uppercase() {
            bits |= UPPER;
        }
        if b == b'_' {
            bits |= UNDERSCORE;
        }
        if matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c) {
            bits |= SPACE;
        }
        table[i] = bits;
        i += 1;
    }
    table
}

static ASCII_TABLE: [u8; 128] = build_ascii_table();

#[inline]
fn ascii_bits(c: char) -> Option<u8> {
    let code = c as u32;
    if code < 128 {
        Some(ASCII_TABLE[code as usize])
    } else {
        None
    }
}

// ============================================================================
// CharClass
// ============================================================================

/// Named character classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    /// `[0-9]`
    Digit,
    /// `[0-9a-fA-F]`
    HexDigit,
    /// Lowercase letter (Unicode aware)
    Lower,
    /// Uppercase letter (Unicode aware)
    Upper,
    /// Any alphabetic character (Unicode aware)
    Letter,
    /// `[a-zA-Z]`
    Alpha,
    /// `[a-zA-Z_]`, the first character of a word
    WordStart,
    /// `[a-zA-Z0-9_]`
    Word,
    /// `[a-zA-Z0-9]`
    Alnum,
    /// Whitespace (Unicode aware)
    Whitespace,
    /// Any character
    Any,
}

impl CharClass {
    /// Map a regex-style shorthand to a class
    ///
    /// | Shorthand | Class |
    /// |-----------|-------|
    /// | `.` | Any |
    /// | `\d`, `[0-9]` | Digit |
    /// | `[0-9a-fA-F]` | HexDigit |
    /// | `[a-z]` | Lower |
    /// | `[A-Z]` | Upper |
    /// | `[a-zA-Z]` | Alpha |
    /// | `[a-zA-Z_]` | WordStart |
    /// | `\w`, `[a-zA-Z0-9_]` | Word |
    /// | `[a-zA-Z0-9]` | Alnum |
    /// | `\s` | Whitespace |
    pub fn from_shorthand(shorthand: &str) -> Option<Self> {
        let class = match shorthand {
            "." => Self::Any,
            "\\d" | "[0-9]" => Self::Digit,
            "[0-9a-fA-F]" | "[a-fA-F0-9]" => Self::HexDigit,
            "[a-z]" => Self::Lower,
            "[A-Z]" => Self::Upper,
            "[a-zA-Z]" | "[A-Za-z]" => Self::Alpha,
            "[a-zA-Z_]" | "[A-Za-z_]" => Self::WordStart,
            "\\w" | "[a-zA-Z0-9_]" | "[A-Za-z0-9_]" => Self::Word,
            "[a-zA-Z0-9]" | "[A-Za-z0-9]" => Self::Alnum,
            "\\s" => Self::Whitespace,
            _ => return None,
        };
        Some(class)
    }

    /// Test whether `c` belongs to this class
    #[inline]
    pub fn contains(self, c: char) -> bool {
        match (self, ascii_bits(c)) {
            (Self::Any, _) => true,
            (Self::Digit, Some(bits)) => bits & DIGIT != 0,
            (Self::HexDigit, Some(bits)) => bits & HEX != 0,
            (Self::Lower, Some(bits)) => bits & LOWER != 0,
            (Self::Upper, Some(bits)) => bits & UPPER != 0,
            (Self::Letter | Self::Alpha, Some(bits)) => bits & (LOWER | UPPER) != 0,
            (Self::WordStart, Some(bits)) => bits & (LOWER | UPPER | UNDERSCORE) != 0,
            (Self::Word, Some(bits)) => bits & (LOWER | UPPER | UNDERSCORE | DIGIT) != 0,
            (Self::Alnum, Some(bits)) => bits & (LOWER | UPPER | DIGIT) != 0,
            (Self::Whitespace, Some(bits)) => bits & SPACE != 0,
            (Self::Lower, None) => c.is_lowercase(),
            (Self::Upper, None) => c.is_uppercase(),
            (Self::Letter, None) => c.is_alphabetic(),
            (Self::Whitespace, None) => c.is_whitespace(),
            (
                Self::Digit
                | Self::HexDigit
                | Self::Alpha
                | Self::WordStart
                | Self::Word
                | Self::Alnum,
                None,
            ) => false,
        }
    }

    /// Human readable name used in expectation messages
    pub fn name(self) -> &'static str {
        match self {
            Self::Digit => "digit",
            Self::HexDigit => "hex digit",
            Self::Lower => "lowercase letter",
            Self::Upper => "uppercase letter",
            Self::Letter => "letter",
            Self::Alpha => "alphabetic character",
            Self::WordStart => "word start",
            Self::Word => "word character",
            Self::Alnum => "alphanumeric character",
            Self::Whitespace => "whitespace",
            Self::Any => "any character",
        }
    }
}

impl fmt::Display for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// CharPredicate
// ============================================================================

/// A composable test on a single character
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharPredicate {
    /// Exactly this character
    Is(char),
    /// Inclusive range
    Range(char, char),
    /// Any of the listed characters
    Among(String),
    /// A named class
    Class(CharClass),
    /// Complement
    Not(Box<CharPredicate>),
    /// All must hold
    And(Vec<CharPredicate>),
    /// At least one must hold
    Or(Vec<CharPredicate>),
}

impl CharPredicate {
    /// Exactly `c`
    pub fn is(c: char) -> Self {
        Self::Is(c)
    }

    /// Any character in `low..=high`
    pub fn range(low: char, high: char) -> Self {
        Self::Range(low, high)
    }

    /// Any character of `chars`
    pub fn among(chars: impl Into<String>) -> Self {
        Self::Among(chars.into())
    }

    /// Members of a named class
    pub fn class(class: CharClass) -> Self {
        Self::Class(class)
    }

    /// Any character
    pub fn any() -> Self {
        Self::Class(CharClass::Any)
    }

    /// Complement of this predicate
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }

    /// Conjunction with another predicate
    pub fn and(self, other: CharPredicate) -> Self {
        match self {
            Self::And(mut all) => {
                all.push(other);
                Self::And(all)
            }
            first => Self::And(vec![first, other]),
        }
    }

    /// Disjunction with another predicate
    pub fn or(self, other: CharPredicate) -> Self {
        match self {
            Self::Or(mut any) => {
                any.push(other);
                Self::Or(any)
            }
            first => Self::Or(vec![first, other]),
        }
    }

    /// Evaluate the predicate
    pub fn test(&self, c: char) -> bool {
        match self {
            Self::Is(expected) => c == *expected,
            Self::Range(low, high) => (*low..=*high).contains(&c),
            Self::Among(chars) => chars.contains(c),
            Self::Class(class) => class.contains(c),
            Self::Not(inner) => !inner.test(c),
            Self::And(all) => all.iter().all(|p| p.test(c)),
            Self::Or(any) => any.iter().any(|p| p.test(c)),
        }
    }
}

impl From<char> for CharPredicate {
    fn from(c: char) -> Self {
        Self::Is(c)
    }
}

impl From<CharClass> for CharPredicate {
    fn from(class: CharClass) -> Self {
        Self::Class(class)
    }
}

impl fmt::Display for CharPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Is(c) => write!(f, "{}", c),
            Self::Range(low, high) => write!(f, "[{}-{}]", low, high),
            Self::Among(chars) => write!(f, "[{}]", chars),
            Self::Class(class) => write!(f, "{}", class),
            Self::Not(inner) => write!(f, "^{}", inner),
            Self::And(all) => join(f, all, " and "),
            Self::Or(any) => join(f, any, " or "),
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, items: &[CharPredicate], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_class() {
        assert!(CharClass::Digit.contains('0'));
        assert!(CharClass::Digit.contains('9'));
        assert!(!CharClass::Digit.contains('a'));
        assert!(!CharClass::Digit.contains('٣'));
    }

    #[test]
    fn test_hex_digit_class() {
        for c in "0123456789abcdefABCDEF".chars() {
            assert!(CharClass::HexDigit.contains(c), "{}", c);
        }
        assert!(!CharClass::HexDigit.contains('g'));
    }

    #[test]
    fn test_word_classes() {
        assert!(CharClass::WordStart.contains('_'));
        assert!(!CharClass::WordStart.contains('1'));
        assert!(CharClass::Word.contains('1'));
        assert!(!CharClass::Alnum.contains('_'));
    }

    #[test]
    fn test_unicode_fallback() {
        assert!(CharClass::Letter.contains('é'));
        assert!(!CharClass::Alpha.contains('é'));
        assert!(CharClass::Upper.contains('Ä'));
        assert!(CharClass::Whitespace.contains('\u{2003}'));
    }

    #[test]
    fn test_from_shorthand() {
        assert_eq!(CharClass::from_shorthand("\\d"), Some(CharClass::Digit));
        assert_eq!(CharClass::from_shorthand("\\w"), Some(CharClass::Word));
        assert_eq!(CharClass::from_shorthand("[a-z]"), Some(CharClass::Lower));
        assert_eq!(CharClass::from_shorthand("[xyz]"), None);
    }

    #[test]
    fn test_predicate_combinators() {
        let p = CharPredicate::range('a', 'f').or(CharPredicate::is('z'));
        assert!(p.test('c'));
        assert!(p.test('z'));
        assert!(!p.test('g'));

        let q = CharPredicate::any().and(CharPredicate::among("\"\\").not());
        assert!(q.test('a'));
        assert!(!q.test('"'));
        assert!(!q.test('\\'));
    }

    #[test]
    fn test_double_negation_collapses() {
        let p = CharPredicate::is('x').not().not();
        assert_eq!(p, CharPredicate::is('x'));
    }

    #[test]
    fn test_predicate_display() {
        assert_eq!(CharPredicate::is('c').to_string(), "c");
        assert_eq!(CharPredicate::range('0', '9').to_string(), "[0-9]");
        assert_eq!(CharPredicate::class(CharClass::Digit).to_string(), "digit");
        assert_eq!(CharPredicate::is('"').not().to_string(), "^\"");
    }
}
