use crate::{Enumerator, Keyspace, Partition, Result, Transform};
#[cfg(unix)]
use crate::{Error, Supervisor, WorkerResult};
use core::hint::black_box;

/// Applies `transform` to every key left in `enumerator` and returns how many
/// keys were processed.
///
/// Digests are discarded through [`black_box`] so the work cannot be optimized
/// away when measuring throughput.
pub fn drain<T, const N: usize>(enumerator: &mut Enumerator, transform: &T) -> u64
where
    T: Transform<N> + ?Sized,
{
    let mut key = vec![0; enumerator.keyspace().length()];
    let mut count = 0;
    while enumerator.try_next_to_buf(&mut key).is_ok() {
        black_box(transform.digest(&key));
        count += 1;
    }
    count
}

/// Runs one worker's share of a sweep inside the worker process.
///
/// # Errors
///
/// Propagates failures building the enumerator for `partition`.
pub fn run_partition<T, const N: usize>(
    keyspace: &Keyspace,
    partition: &Partition,
    transform: &T,
) -> Result<u64>
where
    T: Transform<N> + ?Sized,
{
    let Some(mut enumerator) = Enumerator::for_partition(keyspace, partition)? else {
        #[cfg(feature = "tracing")]
        tracing::debug!(worker = partition.index(), "empty partition, nothing to do");
        return Ok(0);
    };

    #[cfg(feature = "tracing")]
    tracing::info!(
        worker = partition.index(),
        pid = std::process::id(),
        "started working at index {}",
        partition.start()
    );

    let count = drain(&mut enumerator, transform);

    #[cfg(feature = "tracing")]
    tracing::info!(
        worker = partition.index(),
        pid = std::process::id(),
        keys = count,
        "finished work at index {}",
        partition.end().unwrap_or(partition.start())
    );

    Ok(count)
}

/// Enumerates the whole `keyspace` across `workers` processes, applying
/// `transform` to every key, and returns one [`WorkerResult`] per worker in
/// spawn order.
///
/// # Errors
///
/// - [`Error::InvalidArgument`] if `workers` is zero.
/// - [`Error::RuntimeFailure`] if a worker cannot be spawned.
///
/// # Safety
///
/// Same contract as [`Supervisor::spawn`]: the calling process must be
/// single-threaded for the duration of the call.
///
/// # Example
/// ```no_run
/// use keysweep::{Alphabet, Keyspace, sweep};
///
/// let keyspace = Keyspace::new(4, Alphabet::default()).unwrap();
/// let checksum = |key: &[u8]| [key.iter().fold(0u8, |a, b| a.wrapping_add(*b))];
/// // SAFETY: this process has not started any other thread.
/// let results = unsafe { sweep(&keyspace, 8, &checksum) }.unwrap();
/// assert!(results.iter().all(|r| r.is_success()));
/// ```
#[cfg_attr(docsrs, doc(cfg(unix)))]
#[cfg(unix)]
pub unsafe fn sweep<T, const N: usize>(
    keyspace: &Keyspace,
    workers: usize,
    transform: &T,
) -> Result<Vec<WorkerResult>>
where
    T: Transform<N> + ?Sized,
{
    let partitions = crate::partition(keyspace.total(), workers)?;

    #[cfg(feature = "tracing")]
    tracing::debug!(
        workers,
        total = keyspace.total(),
        length = keyspace.length(),
        "starting sweep"
    );

    // SAFETY: forwarded from this function's contract.
    let mut supervisor = unsafe {
        Supervisor::spawn(workers, |index| -> Result<()> {
            let partition = partitions
                .get(index)
                .ok_or_else(|| Error::out_of_range(format!("no partition for worker {index}")))?;
            run_partition(keyspace, partition, transform).map(|_| ())
        })
    }?;

    Ok(supervisor.join_all())
}
