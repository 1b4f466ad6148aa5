use crate::{Error, Ordinal, Result};
use core::ops::Range;

/// A contiguous run of ordinals assigned to one worker.
///
/// Partitions are half-open internally so that a worker left with nothing to
/// do (more workers than ordinals) is still representable. [`Partition::end`]
/// exposes the inclusive last ordinal, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Partition {
    index: usize,
    start: Ordinal,
    end_exclusive: Ordinal,
}

impl Partition {
    /// Zero-based worker index this partition belongs to.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// First ordinal of the partition.
    pub const fn start(&self) -> Ordinal {
        self.start
    }

    /// Last ordinal of the partition (inclusive), or `None` when empty.
    pub const fn end(&self) -> Option<Ordinal> {
        if self.is_empty() {
            None
        } else {
            Some(self.end_exclusive - 1)
        }
    }

    pub const fn len(&self) -> Ordinal {
        self.end_exclusive - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.end_exclusive == self.start
    }

    /// The ordinals covered by this partition.
    pub const fn ordinals(&self) -> Range<Ordinal> {
        self.start..self.end_exclusive
    }
}

/// Splits `[0, total)` into `workers` contiguous partitions.
///
/// Every worker receives `floor(total / workers)` ordinals; the last one also
/// absorbs the remainder. When `workers > total` all but the last partition are
/// empty. The returned partitions are ordered by index, never overlap, and
/// their union is exactly `[0, total)`.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `workers` is zero.
///
/// # Example
/// ```
/// use keysweep::partition;
///
/// let parts = partition(100, 3).unwrap();
/// let bounds: Vec<_> = parts.iter().map(|p| (p.start(), p.end())).collect();
/// assert_eq!(bounds, [(0, Some(32)), (33, Some(65)), (66, Some(99))]);
/// ```
pub fn partition(total: Ordinal, workers: usize) -> Result<Vec<Partition>> {
    if workers == 0 {
        return Err(Error::invalid("worker count must be at least 1"));
    }
    let count = Ordinal::try_from(workers)
        .map_err(|_| Error::invalid(format!("worker count {workers} exceeds ordinal range")))?;
    let chunk = total / count;

    Ok((0..workers)
        .zip(0..count)
        .map(|(index, i)| {
            let start = i * chunk;
            let end_exclusive = if i + 1 == count {
                total
            } else {
                (i + 1) * chunk
            };
            Partition {
                index,
                start,
                end_exclusive,
            }
        })
        .collect())
}
