use crate::{Error, Result};

/// An ordered set of unique symbols defining the radix and digit set for
/// string encoding of an integer value.
///
/// The radix is the symbol count; position in the sequence is the digit
/// value. Construction validates the sequence once so every encode/decode
/// afterwards operates on a known-good symbol set.
///
/// # Example
///
/// ```
/// use turnstile::Alphabet;
///
/// let hex = Alphabet::hex();
/// assert_eq!(hex.encode(255), "ff");
/// assert_eq!(hex.decode("ff").unwrap(), 255);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<char>,
}

impl Alphabet {
    /// Hexadecimal digits, radix 16.
    pub const HEX_DIGITS: &'static str = "0123456789abcdef";
    /// Digits plus both latin cases, radix 62. The default for
    /// [`crate::UniqueGenerator::as_string`].
    pub const DIGITS_LATIN_ALL: &'static str =
        "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
    /// Digits plus lowercase latin, radix 36.
    pub const DIGITS_LATIN_LOWER: &'static str = "0123456789abcdefghijklmnopqrstuvwxyz";
    /// Digits plus uppercase latin, radix 36.
    pub const DIGITS_LATIN_UPPER: &'static str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    /// Both latin cases, radix 52.
    pub const LATIN_ALL: &'static str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
    /// Lowercase latin, radix 26.
    pub const LATIN_LOWER: &'static str = "abcdefghijklmnopqrstuvwxyz";
    /// Uppercase latin, radix 26.
    pub const LATIN_UPPER: &'static str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    /// Builds an alphabet from an ordered symbol sequence.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when the sequence repeats a symbol (the
    /// radix conversion would not be well-defined) or holds fewer than two
    /// symbols (positional notation needs a radix of at least 2).
    pub fn new(symbols: &str) -> Result<Self> {
        let symbols: Vec<char> = symbols.chars().collect();
        if symbols.len() < 2 {
            return Err(Error::InvalidArgument {
                reason: "alphabet needs at least two symbols".into(),
            });
        }
        for (i, sym) in symbols.iter().enumerate() {
            if symbols[..i].contains(sym) {
                return Err(Error::InvalidArgument {
                    reason: format!("duplicate symbol {sym:?} in alphabet"),
                });
            }
        }
        Ok(Self { symbols })
    }

    /// The fixed hexadecimal alphabet ([`Self::HEX_DIGITS`]).
    pub fn hex() -> Self {
        Self {
            symbols: Self::HEX_DIGITS.chars().collect(),
        }
    }

    /// Number of symbols, i.e. the radix.
    pub fn radix(&self) -> usize {
        self.symbols.len()
    }

    /// Encodes `value` in positional notation over this alphabet.
    ///
    /// Zero encodes to the alphabet's first symbol; there is no fixed width
    /// and no padding.
    pub fn encode(&self, mut value: u128) -> String {
        let radix = self.symbols.len() as u128;
        if value == 0 {
            return self.symbols[0].to_string();
        }
        let mut digits = Vec::new();
        while value > 0 {
            digits.push(self.symbols[(value % radix) as usize]);
            value /= radix;
        }
        digits.iter().rev().collect()
    }

    /// Decodes a string previously produced by [`Self::encode`].
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an empty string, a symbol outside
    /// this alphabet, or a value exceeding `u128`.
    pub fn decode(&self, encoded: &str) -> Result<u128> {
        if encoded.is_empty() {
            return Err(Error::InvalidArgument {
                reason: "cannot decode an empty string".into(),
            });
        }
        let radix = self.symbols.len() as u128;
        let mut value: u128 = 0;
        for sym in encoded.chars() {
            let digit = self.symbols.iter().position(|&s| s == sym).ok_or_else(|| {
                Error::InvalidArgument {
                    reason: format!("symbol {sym:?} not in alphabet"),
                }
            })?;
            value = value
                .checked_mul(radix)
                .and_then(|v| v.checked_add(digit as u128))
                .ok_or_else(|| Error::InvalidArgument {
                    reason: format!("{encoded:?} overflows u128"),
                })?;
        }
        Ok(value)
    }
}

impl Default for Alphabet {
    /// Digits plus both latin cases ([`Self::DIGITS_LATIN_ALL`]), radix 62.
    fn default() -> Self {
        Self {
            symbols: Self::DIGITS_LATIN_ALL.chars().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_encoding_matches_lowercase_hex() {
        let hex = Alphabet::hex();
        assert_eq!(hex.encode(255), "ff");
        assert_eq!(hex.encode(0xdead_beef), "deadbeef");
        assert_eq!(hex.encode(16), "10");
    }

    #[test]
    fn zero_encodes_to_first_symbol() {
        assert_eq!(Alphabet::hex().encode(0), "0");
        assert_eq!(Alphabet::new("xyz").unwrap().encode(0), "x");
    }

    #[test]
    fn base62_round_trip() {
        let alpha = Alphabet::default();
        assert_eq!(alpha.radix(), 62);
        let encoded = alpha.encode(61);
        assert_eq!(encoded, "Z");
        assert_eq!(alpha.decode(&encoded).unwrap(), 61);
        assert_eq!(alpha.decode(&alpha.encode(62)).unwrap(), 62);
        assert_eq!(alpha.encode(62), "10");
    }

    #[test]
    fn custom_alphabet_positional_order() {
        // radix 3 over "abc": 5 = 1*3 + 2 -> "bc"
        let alpha = Alphabet::new("abc").unwrap();
        assert_eq!(alpha.encode(5), "bc");
        assert_eq!(alpha.decode("bc").unwrap(), 5);
    }

    #[test]
    fn duplicate_symbols_rejected() {
        assert!(matches!(
            Alphabet::new("abca"),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn degenerate_radix_rejected() {
        assert!(matches!(
            Alphabet::new(""),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            Alphabet::new("a"),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn decode_rejects_foreign_symbols() {
        let hex = Alphabet::hex();
        assert!(matches!(
            hex.decode("12g4"),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(hex.decode(""), Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn decode_rejects_overflow() {
        let hex = Alphabet::hex();
        // 33 hex digits > u128::MAX
        let too_big = "f".repeat(33);
        assert!(matches!(
            hex.decode(&too_big),
            Err(Error::InvalidArgument { .. })
        ));
        // exactly u128::MAX still fits
        assert_eq!(hex.decode(&"f".repeat(32)).unwrap(), u128::MAX);
    }

    #[test]
    fn presets_are_valid_alphabets() {
        for preset in [
            Alphabet::HEX_DIGITS,
            Alphabet::DIGITS_LATIN_ALL,
            Alphabet::DIGITS_LATIN_LOWER,
            Alphabet::DIGITS_LATIN_UPPER,
            Alphabet::LATIN_ALL,
            Alphabet::LATIN_LOWER,
            Alphabet::LATIN_UPPER,
        ] {
            Alphabet::new(preset).unwrap();
        }
    }
}
