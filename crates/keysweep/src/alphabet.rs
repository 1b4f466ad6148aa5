use crate::{Error, Result};
use core::{fmt, str::FromStr};

const NO_SYMBOL: u16 = u16::MAX;

/// Symbols used when no alphabet is configured.
pub const DEFAULT_ALPHABET: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";

/// A canonical, ordered set of byte symbols.
///
/// Canonical means sorted ascending and free of duplicates, so the index of a
/// symbol is also its rank: comparing two keys symbol-by-symbol gives the same
/// answer as comparing their index sequences. An [`Alphabet`] is never empty
/// and holds at most 256 symbols.
///
/// # Example
/// ```
/// use keysweep::Alphabet;
///
/// let alphabet = Alphabet::new("cabbage").unwrap();
/// assert_eq!(alphabet.as_bytes(), b"abceg");
/// assert_eq!(alphabet.index_of(b'e'), Some(3));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Alphabet {
    symbols: Vec<u8>,
    lookup: [u16; 256],
}

impl Alphabet {
    /// Canonicalizes `symbols` into an [`Alphabet`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if no symbols remain after
    /// deduplication.
    pub fn new(symbols: impl AsRef<[u8]>) -> Result<Self> {
        let mut symbols = symbols.as_ref().to_vec();
        symbols.sort_unstable();
        symbols.dedup();
        if symbols.is_empty() {
            return Err(Error::invalid(
                "alphabet must contain at least one symbol",
            ));
        }
        Ok(Self::from_canonical(symbols))
    }

    /// Builds the rank table for symbols that are already sorted and unique.
    fn from_canonical(symbols: Vec<u8>) -> Self {
        let mut lookup = [NO_SYMBOL; 256];
        for (index, &symbol) in symbols.iter().enumerate() {
            // At most 256 distinct bytes, so every index fits.
            lookup[symbol as usize] = index as u16;
        }
        Self { symbols, lookup }
    }

    /// Number of symbols, which is the base of every key position.
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> usize {
        self.symbols.len()
    }

    /// The smallest symbol.
    pub fn first(&self) -> u8 {
        self.symbols[0]
    }

    /// The largest symbol.
    pub fn last(&self) -> u8 {
        self.symbols[self.symbols.len() - 1]
    }

    /// Rank of `symbol` within the alphabet, if present.
    #[inline]
    pub fn index_of(&self, symbol: u8) -> Option<usize> {
        match self.lookup[symbol as usize] {
            NO_SYMBOL => None,
            index => Some(index as usize),
        }
    }

    /// Symbol at `index`. Panics if `index >= self.len()`.
    #[inline]
    pub fn symbol(&self, index: usize) -> u8 {
        self.symbols[index]
    }

    pub fn contains(&self, symbol: u8) -> bool {
        self.lookup[symbol as usize] != NO_SYMBOL
    }

    /// The canonical symbols in ascending order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.symbols
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::from_canonical(DEFAULT_ALPHABET.to_vec())
    }
}

impl FromStr for Alphabet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Debug for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Alphabet")
            .field(&String::from_utf8_lossy(&self.symbols))
            .finish()
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.symbols))
    }
}
