use crate::{Alphabet, Error, Result};

/// Zero-based position of a key within the lexicographic order of a
/// [`Keyspace`].
pub type Ordinal = u64;

/// Computes `alphabet.len()^length` without wrapping.
///
/// # Errors
///
/// - [`Error::InvalidArgument`] if `length` is zero.
/// - [`Error::Overflow`] if the product does not fit in an [`Ordinal`].
///
/// # Example
/// ```
/// use keysweep::{Alphabet, total};
///
/// let alphabet = Alphabet::default();
/// assert_eq!(total(3, &alphabet).unwrap(), 17_576);
/// assert!(total(14, &alphabet).is_err());
/// ```
pub fn total(length: usize, alphabet: &Alphabet) -> Result<Ordinal> {
    if length == 0 {
        return Err(Error::invalid("key length must be at least 1"));
    }
    let base = alphabet.len() as Ordinal;
    // 1^length is 1; skip the O(length) loop.
    if base == 1 {
        return Ok(1);
    }
    let mut total: Ordinal = 1;
    for _ in 0..length {
        total = total.checked_mul(base).ok_or(Error::Overflow {
            length,
            base: alphabet.len(),
        })?;
    }
    Ok(total)
}

/// Every fixed-length key over an [`Alphabet`].
///
/// A key is treated as a base-`|alphabet|` number whose most significant digit
/// is the leftmost symbol. Decoding and encoding are exact inverses over
/// `[0, total)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Keyspace {
    length: usize,
    alphabet: Alphabet,
    total: Ordinal,
}

impl Keyspace {
    /// Creates a keyspace of `length`-symbol keys.
    ///
    /// # Errors
    ///
    /// Fails like [`total`].
    pub fn new(length: usize, alphabet: Alphabet) -> Result<Self> {
        let total = total(length, &alphabet)?;
        Ok(Self {
            length,
            alphabet,
            total,
        })
    }

    pub const fn length(&self) -> usize {
        self.length
    }

    pub const fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Number of keys in the keyspace.
    pub const fn total(&self) -> Ordinal {
        self.total
    }

    /// The key at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `position >= self.total()`.
    ///
    /// # Example
    /// ```
    /// use keysweep::{Alphabet, Keyspace};
    ///
    /// let keyspace = Keyspace::new(3, Alphabet::default()).unwrap();
    /// assert_eq!(keyspace.decode(0).unwrap(), b"aaa");
    /// assert_eq!(keyspace.decode(27).unwrap(), b"abb");
    /// ```
    pub fn decode(&self, position: Ordinal) -> Result<Vec<u8>> {
        let mut buf = vec![self.alphabet.first(); self.length];
        self.decode_to_buf(position, &mut buf)?;
        Ok(buf)
    }

    /// Writes the key at `position` into `buf` without allocating.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `buf.len() != self.length()`.
    /// - [`Error::OutOfRange`] if `position >= self.total()`.
    pub fn decode_to_buf(&self, position: Ordinal, buf: &mut [u8]) -> Result<()> {
        if buf.len() != self.length {
            return Err(Error::invalid(format!(
                "buffer holds {} symbols, keys have {}",
                buf.len(),
                self.length
            )));
        }
        if position >= self.total {
            return Err(Error::out_of_range(format!(
                "position {position} is outside a keyspace of {}",
                self.total
            )));
        }

        let base = self.alphabet.len() as Ordinal;
        let mut rest = position;
        for slot in buf.iter_mut().rev() {
            *slot = self.alphabet.symbol((rest % base) as usize);
            rest /= base;
        }
        Ok(())
    }

    /// The ordinal of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `key` has the wrong length or
    /// contains a symbol outside the alphabet.
    pub fn encode(&self, key: &[u8]) -> Result<Ordinal> {
        self.validate(key)?;
        let base = self.alphabet.len() as Ordinal;
        Ok(key.iter().fold(0, |acc, &symbol| {
            // Validated above, and `acc * base + index < total` fits.
            let index = self.alphabet.index_of(symbol).unwrap_or_default();
            acc * base + index as Ordinal
        }))
    }

    /// Checks that `key` belongs to this keyspace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] describing the first violation.
    pub fn validate(&self, key: &[u8]) -> Result<()> {
        if key.len() != self.length {
            return Err(Error::invalid(format!(
                "key has {} symbols, expected {}",
                key.len(),
                self.length
            )));
        }
        if let Some((index, &byte)) = key
            .iter()
            .enumerate()
            .find(|&(_, &symbol)| !self.alphabet.contains(symbol))
        {
            return Err(Error::invalid(format!(
                "symbol {byte:#04x} at index {index} is not in the alphabet"
            )));
        }
        Ok(())
    }

    /// The smallest key: every position holds the first symbol.
    pub fn first_key(&self) -> Vec<u8> {
        vec![self.alphabet.first(); self.length]
    }

    /// The largest key: every position holds the last symbol.
    pub fn last_key(&self) -> Vec<u8> {
        vec![self.alphabet.last(); self.length]
    }
}
