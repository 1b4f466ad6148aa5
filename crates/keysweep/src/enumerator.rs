use crate::{Error, Keyspace, Ordinal, Partition, Result};
use core::iter::FusedIterator;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Mode {
    Full,
    Bounded { start: Vec<u8> },
}

/// Produces every key of an inclusive lexicographic range, in order.
///
/// The enumerator is either **active** (another key is available) or
/// **exhausted**. Once exhausted it stays that way until [`Enumerator::reset`].
/// [`Enumerator::try_next`] fails on an exhausted enumerator instead of
/// returning a sentinel; the [`Iterator`] implementation maps that to `None`.
///
/// Internally the current key is kept as symbol ranks rather than symbols.
/// Since a canonical [`Alphabet`] is sorted, rank order and symbol order agree,
/// so advancing and bound checks never consult the lookup table.
///
/// # Example
/// ```
/// use keysweep::{Alphabet, Enumerator, Keyspace};
///
/// let keyspace = Keyspace::new(2, Alphabet::new("ab").unwrap()).unwrap();
/// let keys: Vec<_> = Enumerator::full(&keyspace).collect();
/// assert_eq!(keys, [b"aa", b"ab", b"ba", b"bb"]);
/// ```
///
/// [`Alphabet`]: crate::Alphabet
#[derive(Clone, Debug)]
pub struct Enumerator {
    keyspace: Keyspace,
    current: Vec<u8>,
    end: Vec<u8>,
    exhausted: bool,
    mode: Mode,
}

impl Enumerator {
    /// Enumerates the whole keyspace, from the all-first to the all-last key.
    pub fn full(keyspace: &Keyspace) -> Self {
        Self {
            keyspace: keyspace.clone(),
            current: vec![0; keyspace.length()],
            end: last_ranks(keyspace),
            exhausted: false,
            mode: Mode::Full,
        }
    }

    /// Enumerates `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if either bound has the wrong length,
    /// contains a symbol outside the alphabet, or if `start > end`.
    pub fn bounded(keyspace: &Keyspace, start: &[u8], end: &[u8]) -> Result<Self> {
        keyspace
            .validate(start)
            .map_err(|e| Error::invalid(format!("start bound: {e}")))?;
        keyspace
            .validate(end)
            .map_err(|e| Error::invalid(format!("end bound: {e}")))?;
        if start > end {
            return Err(Error::invalid(format!(
                "start bound {} is after end bound {}",
                String::from_utf8_lossy(start),
                String::from_utf8_lossy(end)
            )));
        }

        let start = to_ranks(keyspace, start);
        Ok(Self {
            keyspace: keyspace.clone(),
            current: start.clone(),
            end: to_ranks(keyspace, end),
            exhausted: false,
            mode: Mode::Bounded { start },
        })
    }

    /// Enumerates the keys at ordinals `start..=end`.
    ///
    /// # Errors
    ///
    /// - [`Error::OutOfRange`] if either ordinal is outside the keyspace.
    /// - [`Error::InvalidArgument`] if `start > end`.
    pub fn from_ordinals(keyspace: &Keyspace, start: Ordinal, end: Ordinal) -> Result<Self> {
        let first = keyspace.decode(start)?;
        let last = keyspace.decode(end)?;
        Self::bounded(keyspace, &first, &last)
    }

    /// Enumerates the keys of `partition`, or returns `None` when the
    /// partition is empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if the partition reaches past the
    /// keyspace.
    pub fn for_partition(keyspace: &Keyspace, partition: &Partition) -> Result<Option<Self>> {
        match partition.end() {
            Some(end) => Self::from_ordinals(keyspace, partition.start(), end).map(Some),
            None => Ok(None),
        }
    }

    pub const fn has_next(&self) -> bool {
        !self.exhausted
    }

    /// Returns the current key and advances.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if the enumerator is exhausted.
    pub fn try_next(&mut self) -> Result<Vec<u8>> {
        let mut key = vec![0; self.current.len()];
        self.try_next_to_buf(&mut key)?;
        Ok(key)
    }

    /// Writes the current key into `buf` and advances, without allocating.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `buf` is not exactly one key long.
    /// - [`Error::OutOfRange`] if the enumerator is exhausted.
    pub fn try_next_to_buf(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.exhausted {
            return Err(Error::out_of_range("enumerator is exhausted"));
        }
        if buf.len() != self.current.len() {
            return Err(Error::invalid(format!(
                "buffer holds {} symbols, keys have {}",
                buf.len(),
                self.current.len()
            )));
        }

        let alphabet = self.keyspace.alphabet();
        for (slot, &rank) in buf.iter_mut().zip(&self.current) {
            *slot = alphabet.symbol(rank as usize);
        }
        self.advance();
        Ok(())
    }

    /// Restores the enumerator to its initial range and makes it active again.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn reset(&mut self) {
        match &self.mode {
            Mode::Bounded { start } => self.current.clone_from(start),
            Mode::Full => {
                self.current.fill(0);
                self.end = last_ranks(&self.keyspace);
            }
        }
        self.exhausted = false;
    }

    /// Number of keys still to be produced.
    pub fn remaining(&self) -> Ordinal {
        if self.exhausted {
            return 0;
        }
        // Both rank vectors describe keys inside the keyspace, so neither
        // ordinal can overflow and `end >= current` while active.
        ordinal_of(&self.keyspace, &self.end) - ordinal_of(&self.keyspace, &self.current) + 1
    }

    pub const fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    /// Moves to the lexicographic successor of the current key.
    ///
    /// Scans from the rightmost position for the first rank that can be
    /// incremented, resetting everything to its right. If none can, the whole
    /// keyspace has been produced. A bounded enumerator also stops once the
    /// successor passes `end`; that successor is never returned.
    fn advance(&mut self) {
        let top = (self.keyspace.alphabet().len() - 1) as u8;
        for i in (0..self.current.len()).rev() {
            if self.current[i] < top {
                self.current[i] += 1;
                self.current[i + 1..].fill(0);
                if matches!(self.mode, Mode::Bounded { .. }) && self.current > self.end {
                    self.exhausted = true;
                }
                return;
            }
        }
        self.exhausted = true;
    }
}

impl Iterator for Enumerator {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        self.try_next().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining()) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl FusedIterator for Enumerator {}

fn to_ranks(keyspace: &Keyspace, key: &[u8]) -> Vec<u8> {
    let alphabet = keyspace.alphabet();
    key.iter()
        .map(|&symbol| alphabet.index_of(symbol).unwrap_or_default() as u8)
        .collect()
}

fn last_ranks(keyspace: &Keyspace) -> Vec<u8> {
    vec![(keyspace.alphabet().len() - 1) as u8; keyspace.length()]
}

fn ordinal_of(keyspace: &Keyspace, ranks: &[u8]) -> Ordinal {
    let base = keyspace.alphabet().len() as Ordinal;
    ranks
        .iter()
        .fold(0, |acc, &rank| acc * base + Ordinal::from(rank))
}
