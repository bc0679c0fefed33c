//! Character classes for single-character matchers
//!
//! [`CharacterPattern`] names the common ASCII classes so grammars can say
//! `char_class("\\d")` without paying for a regex. Classes other than
//! [`CharacterPattern::Any`] and the negated ones only match ASCII.
//!
//! ```rust
//! use retrace::engine::char_class::CharacterPattern;
//!
//! let pattern = CharacterPattern::from_pattern("\\d").unwrap();
//! assert!(pattern.matches('5'));
//! assert!(!pattern.matches('a'));
//! ```

/// Character pattern with unified matching logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterPattern {
    /// Digit: [0-9] or \\d
    Digit,
    /// Non-digit: \\D
    NonDigit,
    /// Lowercase: [a-z]
    Lower,
    /// Uppercase: [A-Z]
    Upper,
    /// Alphabetic: [a-zA-Z]
    Alpha,
    /// Alphanumeric: [a-zA-Z0-9]
    Alnum,
    /// Word character: [a-zA-Z0-9_] or \\w
    Word,
    /// Non-word character: \\W
    NonWord,
    /// Hex digit: [0-9a-fA-F]
    HexDigit,
    /// Whitespace: [ \\t\\n\\r\\f\\v] or \\s
    Space,
    /// Non-whitespace: \\S
    NonSpace,
    /// Blank: [ \\t]
    Blank,
    /// Punctuation
    Punct,
    /// Any character: .
    Any,
}

impl CharacterPattern {
    /// Try to read a regex-style class spelling as a `CharacterPattern`
    ///
    /// Returns `None` for anything that is not one of the known spellings.
    ///
    /// | Pattern | CharacterPattern |
    /// |---------|-----------------|
    /// | `.` | Any |
    /// | `[0-9]`, `\\d` | Digit |
    /// | `\\D` | NonDigit |
    /// | `[a-z]` | Lower |
    /// | `[A-Z]` | Upper |
    /// | `[a-zA-Z]`, `[A-Za-z]` | Alpha |
    /// | `[a-zA-Z0-9]`, `[0-9a-zA-Z]` | Alnum |
    /// | `\\w`, `[a-zA-Z0-9_]` | Word |
    /// | `\\W` | NonWord |
    /// | `[0-9a-fA-F]` | HexDigit |
    /// | `\\s` | Space |
    /// | `\\S` | NonSpace |
    /// | `[ \\t]`, `\\h` | Blank |
    pub fn from_pattern(pattern: &str) -> Option<Self> {
        let class = match pattern {
            "." => Self::Any,
            "[0-9]" | "\\d" => Self::Digit,
            "\\D" => Self::NonDigit,
            "[a-z]" => Self::Lower,
            "[A-Z]" => Self::Upper,
            "[a-zA-Z]" | "[A-Za-z]" => Self::Alpha,
            "[a-zA-Z0-9]" | "[0-9a-zA-Z]" => Self::Alnum,
            "\\w" | "[a-zA-Z0-9_]" | "[0-9a-zA-Z_]" => Self::Word,
            "\\W" => Self::NonWord,
            "[0-9a-fA-F]" | "[0-9A-Fa-f]" => Self::HexDigit,
            "\\s" => Self::Space,
            "\\S" => Self::NonSpace,
            "[ \t]" | "\\h" => Self::Blank,
            "[[:punct:]]" => Self::Punct,
            _ => return None,
        };
        Some(class)
    }

    /// Check if a character belongs to this class
    #[inline]
    pub fn matches(&self, c: char) -> bool {
        match self {
            Self::Digit => c.is_ascii_digit(),
            Self::NonDigit => !c.is_ascii_digit(),
            Self::Lower => c.is_ascii_lowercase(),
            Self::Upper => c.is_ascii_uppercase(),
            Self::Alpha => c.is_ascii_alphabetic(),
            Self::Alnum => c.is_ascii_alphanumeric(),
            Self::Word => is_word(c),
            Self::NonWord => !is_word(c),
            Self::HexDigit => c.is_ascii_hexdigit(),
            Self::Space => is_space(c),
            Self::NonSpace => !is_space(c),
            Self::Blank => c == ' ' || c == '\t',
            Self::Punct => c.is_ascii_punctuation(),
            Self::Any => true,
        }
    }

    /// Human-readable name used as the default diagnostic label
    pub fn name(&self) -> &'static str {
        match self {
            Self::Digit => "digit",
            Self::NonDigit => "non-digit",
            Self::Lower => "lowercase letter",
            Self::Upper => "uppercase letter",
            Self::Alpha => "letter",
            Self::Alnum => "letter or digit",
            Self::Word => "word character",
            Self::NonWord => "non-word character",
            Self::HexDigit => "hex digit",
            Self::Space => "whitespace",
            Self::NonSpace => "non-whitespace",
            Self::Blank => "blank",
            Self::Punct => "punctuation",
            Self::Any => "any char",
        }
    }
}

#[inline]
fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[inline]
fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C')
}

/// Length in bytes of the UTF-8 sequence introduced by `first_byte`
#[inline(always)]
pub fn utf8_char_len(first_byte: u8) -> usize {
    if first_byte & 0x80 == 0 {
        1 // ASCII: 0xxxxxxx
    } else if first_byte & 0xE0 == 0xC0 {
        2 // 2-byte: 110xxxxx
    } else if first_byte & 0xF0 == 0xE0 {
        3 // 3-byte: 1110xxxx
    } else if first_byte & 0xF8 == 0xF0 {
        4 // 4-byte: 11110xxx
    } else {
        1 // Invalid lead byte; the decoder rejects it
    }
}

/// Check if a byte continues a multi-byte UTF-8 sequence
#[inline(always)]
pub fn is_utf8_continuation(byte: u8) -> bool {
    (byte & 0xC0) == 0x80
}
