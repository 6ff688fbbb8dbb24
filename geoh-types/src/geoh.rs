use serde::{Deserialize, Serialize};
use std::fmt;

/// An interleaved longitude/latitude bit code with an explicit bit length.
///
/// Leading zero bits are significant: `<0011>` and `<11>` share the numeric
/// value 3 but denote cells of very different sizes. The bit length is
/// therefore carried alongside the value and never recovered from it.
///
/// Invariant: `value < 2^bit_length` and `bit_length <= GeoH::MAX_BITS`.
///
/// # Examples
///
/// ```
/// use geoh_types::geoh::GeoH;
///
/// let code = GeoH::new(3, 4).unwrap();
/// assert_eq!(code.bit_length(), 4);
/// assert_eq!(code.to_string(), "<0011>");
///
/// // Value does not fit in the declared bit length
/// assert!(GeoH::new(0b100, 2).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GeoH {
    value: u128,
    bit_length: u32,
}

impl GeoH {
    /// Widest code that fits the backing integer.
    pub const MAX_BITS: u32 = u128::BITS;

    /// Create a code, returning `None` when `value` does not fit in `bit_length` bits
    /// or `bit_length` exceeds [`GeoH::MAX_BITS`].
    pub fn new(value: u128, bit_length: u32) -> Option<Self> {
        if bit_length > Self::MAX_BITS || value & !Self::mask_for(bit_length) != 0 {
            return None;
        }
        Some(Self { value, bit_length })
    }

    /// Create a code keeping only the low `bit_length` bits of `value`.
    ///
    /// `bit_length` is clamped to [`GeoH::MAX_BITS`].
    pub fn wrapping(value: u128, bit_length: u32) -> Self {
        let bit_length = bit_length.min(Self::MAX_BITS);
        Self {
            value: value & Self::mask_for(bit_length),
            bit_length,
        }
    }

    /// The zero-length code (the whole world).
    pub const fn empty() -> Self {
        Self {
            value: 0,
            bit_length: 0,
        }
    }

    pub const fn value(&self) -> u128 {
        self.value
    }

    pub const fn bit_length(&self) -> u32 {
        self.bit_length
    }

    pub const fn is_empty(&self) -> bool {
        self.bit_length == 0
    }

    /// All-ones mask covering the code's bit length.
    pub const fn mask(&self) -> u128 {
        Self::mask_for(self.bit_length)
    }

    const fn mask_for(bits: u32) -> u128 {
        if bits >= u128::BITS {
            u128::MAX
        } else {
            (1u128 << bits) - 1
        }
    }

    /// Bit at `index`, counted from the most significant end (index 0 is the
    /// first longitude bit). Returns `None` past the end of the code.
    pub fn bit(&self, index: u32) -> Option<bool> {
        if index >= self.bit_length {
            return None;
        }
        let shift = self.bit_length - 1 - index;
        Some((self.value >> shift) & 1 == 1)
    }

    /// Iterate bits from most to least significant.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.bit_length).map(move |i| (self.value >> (self.bit_length - 1 - i)) & 1 == 1)
    }

    /// Keep the leading `bits` bits. Longer requests return the code unchanged.
    pub fn truncate(&self, bits: u32) -> Self {
        if bits >= self.bit_length {
            return *self;
        }
        Self {
            value: self.value >> (self.bit_length - bits),
            bit_length: bits,
        }
    }

    /// Whether `self` is a leading part of `other` (same bits, shorter or equal length).
    pub fn is_prefix_of(&self, other: &GeoH) -> bool {
        self.bit_length <= other.bit_length && other.truncate(self.bit_length) == *self
    }
}

impl fmt::Display for GeoH {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<")?;
        for bit in self.bits() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        f.write_str(">")
    }
}
