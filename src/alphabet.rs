//! 32-symbol alphabets for text geohashes.
//!
//! Index `i` of an alphabet encodes the 5-bit group `i`. Besides the usual
//! geohash alphabet, an alphabet can be derived from a secret: codes written
//! with it only decode correctly with the same secret.

use crate::error::{GeohError, Result};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// The standard geohash alphabet.
pub const DEFAULT_ALPHABET: &str = "0123456789bcdefghjkmnpqrstuvwxyz";

/// Number of symbols in every alphabet (one per 5-bit group).
pub const ALPHABET_SIZE: usize = 32;

/// An ordered set of exactly 32 distinct symbols.
///
/// # Examples
///
/// ```
/// use geoh::Alphabet;
///
/// let standard = Alphabet::default();
/// assert_eq!(standard.symbol(10), 'b');
/// assert_eq!(standard.index_of('z'), Some(31));
///
/// // Too short
/// assert!(Alphabet::new("0123").is_err());
///
/// // Secret-derived alphabets are stable for a given secret
/// assert_eq!(Alphabet::from_secret("s3cr3t"), Alphabet::from_secret("s3cr3t"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Alphabet {
    symbols: [char; ALPHABET_SIZE],
}

impl Alphabet {
    /// Parse an alphabet, requiring exactly 32 distinct symbols.
    pub fn new(symbols: &str) -> Result<Self> {
        let chars: Vec<char> = symbols.chars().collect();
        if chars.len() != ALPHABET_SIZE {
            return Err(GeohError::Decode(format!(
                "alphabet must contain exactly {} symbols, got {}",
                ALPHABET_SIZE,
                chars.len()
            )));
        }

        let mut seen = FxHashSet::default();
        for c in &chars {
            if !seen.insert(*c) {
                return Err(GeohError::Decode(format!(
                    "alphabet symbol '{}' appears more than once",
                    c
                )));
            }
        }

        let mut table = ['0'; ALPHABET_SIZE];
        table.copy_from_slice(&chars);
        Ok(Self { symbols: table })
    }

    /// Derive an alphabet from a secret.
    ///
    /// The SHA-256 digest of the secret is mapped byte by byte onto the
    /// default symbols. Symbols hit exactly once lead the new alphabet in
    /// digest order; the remaining default symbols follow in their usual
    /// order.
    pub fn from_secret(secret: impl AsRef<[u8]>) -> Self {
        let default: Vec<char> = DEFAULT_ALPHABET.chars().collect();
        let digest = Sha256::digest(secret.as_ref());

        let mut hits = [0u8; ALPHABET_SIZE];
        let mapped: Vec<usize> = digest
            .iter()
            .map(|b| *b as usize % ALPHABET_SIZE)
            .collect();
        for index in &mapped {
            hits[*index] = hits[*index].saturating_add(1);
        }

        let mut ordered: Vec<char> = mapped
            .iter()
            .filter(|index| hits[**index] == 1)
            .map(|index| default[*index])
            .collect();
        for c in &default {
            if !ordered.contains(c) {
                ordered.push(*c);
            }
        }
        ordered.truncate(ALPHABET_SIZE);

        let mut table = ['0'; ALPHABET_SIZE];
        table.copy_from_slice(&ordered);
        Self { symbols: table }
    }

    /// Symbol for a 5-bit group. Only the low five bits of `index` are used.
    pub fn symbol(&self, index: u8) -> char {
        self.symbols[(index & 0b1_1111) as usize]
    }

    /// 5-bit group for a symbol, or `None` if the symbol is not in the alphabet.
    pub fn index_of(&self, symbol: char) -> Option<u8> {
        self.symbols
            .iter()
            .position(|c| *c == symbol)
            .map(|i| i as u8)
    }

    pub fn symbols(&self) -> &[char; ALPHABET_SIZE] {
        &self.symbols
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        let mut table = ['0'; ALPHABET_SIZE];
        for (slot, c) in table.iter_mut().zip(DEFAULT_ALPHABET.chars()) {
            *slot = c;
        }
        Self { symbols: table }
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.symbols {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Alphabet {
    type Error = GeohError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<Alphabet> for String {
    fn from(alphabet: Alphabet) -> Self {
        alphabet.to_string()
    }
}
