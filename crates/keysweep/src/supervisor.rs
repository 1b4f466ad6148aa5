//! Process-based fan-out and fan-in of worker tasks.
//!
//! A [`Supervisor`] forks one child process per worker index. Children share no
//! memory with the parent or with each other after the fork: each runs the task
//! on its own copy of the captured state and leaves with `_exit`, so nothing a
//! task does can unwind into the parent's control flow.
//!
//! Forking is only sound from a single-threaded process: a child inherits every
//! lock held at the instant of the fork, but not the threads that would release
//! it. A task that then takes such a lock (stdio, a `Mutex` in captured state)
//! blocks forever. [`Supervisor::spawn`] is therefore `unsafe` and leaves that
//! guarantee to the caller.
//!
//! The parent is strictly single-threaded orchestration. All workers are
//! spawned before any is awaited, then [`Supervisor::join_all`] waits for each
//! pid in spawn order. The kernel keeps an early finisher's status until its
//! turn comes, so join order never depends on completion order.
//!
//! There is no timeout. A worker that never terminates blocks `join_all`
//! forever.

use crate::{Error, Result};
use core::fmt;
use nix::{
    errno::Errno,
    sys::wait::{WaitStatus, waitpid},
    unistd::{ForkResult, Pid, fork},
};
use std::{
    io::Write,
    panic::{self, AssertUnwindSafe},
};

/// Exit code of a worker whose task returned, successfully or not.
pub const TASK_EXIT_CODE: i32 = 0;

/// Exit code of a worker whose task panicked.
///
/// A panic is contained in the worker like a returned `Err`, but unlike an
/// `Err` it does not count as a clean exit: the worker reports this code so
/// [`WorkerResult::is_success`] is false for it.
pub const PANIC_EXIT_CODE: i32 = 101;

/// How a worker process terminated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Termination {
    /// The process exited with this status code.
    Exited(i32),
    /// The process was killed by this signal number.
    Signaled(i32),
    /// The process reported any other state.
    Abnormal,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exited with status {code}"),
            Self::Signaled(signal) => write!(f, "terminated by signal {signal}"),
            Self::Abnormal => f.write_str("terminated abnormally"),
        }
    }
}

/// The observed fate of one worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerResult {
    /// Index the worker was spawned with.
    pub index: usize,
    /// OS process id of the worker.
    pub pid: i32,
    /// How it terminated, or why that could not be observed.
    pub outcome: Result<Termination>,
}

impl WorkerResult {
    /// True when the worker exited with status `0`.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Ok(Termination::Exited(0)))
    }
}

#[derive(Debug)]
struct Worker {
    index: usize,
    pid: Pid,
}

/// Owns a set of forked worker processes until they are joined.
///
/// Dropping a [`Supervisor`] that still has unjoined workers joins them first,
/// so no terminated child is left unreaped.
///
/// # Example
/// ```no_run
/// use keysweep::Supervisor;
///
/// // SAFETY: this process has not started any other thread.
/// let mut supervisor = unsafe {
///     Supervisor::spawn(4, |index| {
///         println!("hello from worker {index}");
///         Ok::<_, std::io::Error>(())
///     })
/// }
/// .unwrap();
///
/// for result in supervisor.join_all() {
///     assert!(result.is_success());
/// }
/// ```
#[derive(Debug)]
pub struct Supervisor {
    workers: Vec<Worker>,
}

impl Supervisor {
    /// Forks `count` workers, each running `task(index)` for its index.
    ///
    /// Pids are recorded in index order, each before the next fork. An `Err`
    /// returned by the task is reported inside the worker and the worker still
    /// exits with [`TASK_EXIT_CODE`], so it joins as a clean exit.
    ///
    /// Panics are the one exception to that rule. A panicking task is caught
    /// in the worker and never reaches the parent or its siblings, but the
    /// worker exits with [`PANIC_EXIT_CODE`] and joins as
    /// `Exited(PANIC_EXIT_CODE)`, not as a clean exit.
    ///
    /// # Safety
    ///
    /// The calling process must be single-threaded for the duration of the
    /// call. Each worker is a `fork` of the caller and runs `task`, which may
    /// allocate, print or lock. If another thread holds one of those locks when
    /// a worker is forked, the worker inherits the lock with no thread left to
    /// release it and deadlocks the first time it takes it. The resulting hang
    /// also blocks [`Supervisor::join_all`].
    ///
    /// ```compile_fail
    /// use keysweep::Supervisor;
    ///
    /// // Spawning requires an `unsafe` block.
    /// let _ = Supervisor::spawn(1, |_| Ok::<_, std::io::Error>(()));
    /// ```
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `count` is zero.
    /// - [`Error::RuntimeFailure`] if a fork fails. No further workers are
    ///   spawned, and those already running are joined before returning.
    pub unsafe fn spawn<F, E>(count: usize, task: F) -> Result<Self>
    where
        F: Fn(usize) -> core::result::Result<(), E>,
        E: fmt::Display,
    {
        if count == 0 {
            return Err(Error::invalid("worker count must be at least 1"));
        }

        let mut supervisor = Self {
            workers: Vec::with_capacity(count),
        };

        for index in 0..count {
            // SAFETY: the caller guarantees no other thread exists, so the
            // child starts with no lock held. It only runs `task` and leaves
            // through `_exit`, never returning into the caller.
            match unsafe { fork() } {
                Ok(ForkResult::Parent { child }) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(worker = index, pid = child.as_raw(), "spawned worker");
                    supervisor.workers.push(Worker { index, pid: child });
                }
                Ok(ForkResult::Child) => run_worker(index, &task),
                Err(errno) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!(worker = index, %errno, "fork failed, joining spawned workers");
                    // Dropping `supervisor` joins the workers already spawned.
                    drop(supervisor);
                    return Err(Error::runtime(format!(
                        "failed to spawn worker {index}: {errno}"
                    )));
                }
            }
        }

        Ok(supervisor)
    }

    /// Number of workers not yet joined.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Process ids of the unjoined workers, in spawn order.
    pub fn pids(&self) -> impl Iterator<Item = i32> + '_ {
        self.workers.iter().map(|w| w.pid.as_raw())
    }

    /// Waits for every unjoined worker, in spawn order.
    ///
    /// A worker whose termination cannot be observed is reported through its
    /// [`WorkerResult::outcome`]; the remaining workers are still awaited.
    /// Calling this again returns an empty list.
    pub fn join_all(&mut self) -> Vec<WorkerResult> {
        core::mem::take(&mut self.workers)
            .into_iter()
            .map(|worker| {
                let outcome = wait_for(worker.pid);
                #[cfg(feature = "tracing")]
                match &outcome {
                    Ok(termination) => tracing::info!(
                        worker = worker.index,
                        pid = worker.pid.as_raw(),
                        "worker {termination}"
                    ),
                    Err(e) => tracing::error!(
                        worker = worker.index,
                        pid = worker.pid.as_raw(),
                        "failed to observe worker: {e}"
                    ),
                }
                WorkerResult {
                    index: worker.index,
                    pid: worker.pid.as_raw(),
                    outcome,
                }
            })
            .collect()
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                workers = self.workers.len(),
                "joining workers on supervisor drop"
            );
            self.join_all();
        }
    }
}

fn run_worker<F, E>(index: usize, task: &F) -> !
where
    F: Fn(usize) -> core::result::Result<(), E>,
    E: fmt::Display,
{
    let code = match panic::catch_unwind(AssertUnwindSafe(|| task(index))) {
        Ok(Ok(())) => TASK_EXIT_CODE,
        Ok(Err(e)) => {
            report_task_error(index, &e);
            TASK_EXIT_CODE
        }
        Err(_) => PANIC_EXIT_CODE,
    };

    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
    // SAFETY: `_exit` terminates the child immediately without running the
    // parent's atexit handlers or destructors of state it inherited.
    unsafe { nix::libc::_exit(code) }
}

fn report_task_error(index: usize, err: &dyn fmt::Display) {
    #[cfg(feature = "tracing")]
    tracing::error!(worker = index, "task failed: {err}");
    #[cfg(not(feature = "tracing"))]
    eprintln!("worker {index}: task failed: {err}");
}

fn wait_for(pid: Pid) -> Result<Termination> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(Termination::Exited(code)),
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                return Ok(Termination::Signaled(signal as i32));
            }
            Ok(_) => return Ok(Termination::Abnormal),
            Err(Errno::EINTR) => continue,
            Err(errno) => {
                return Err(Error::runtime(format!(
                    "failed to wait for pid {pid}: {errno}"
                )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_workers_is_rejected() {
        // SAFETY: a zero count is rejected before any fork.
        let result = unsafe { Supervisor::spawn(0, |_| Ok::<_, String>(())) };
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn termination_display() {
        assert_eq!(Termination::Exited(0).to_string(), "exited with status 0");
        assert_eq!(Termination::Signaled(9).to_string(), "terminated by signal 9");
        assert_eq!(Termination::Abnormal.to_string(), "terminated abnormally");
    }

    #[test]
    fn success_requires_clean_exit() {
        let result = |outcome| WorkerResult {
            index: 0,
            pid: 1,
            outcome,
        };
        assert!(result(Ok(Termination::Exited(0))).is_success());
        assert!(!result(Ok(Termination::Exited(PANIC_EXIT_CODE))).is_success());
        assert!(!result(Ok(Termination::Signaled(9))).is_success());
        assert!(!result(Err(Error::runtime("gone"))).is_success());
    }

    #[test]
    fn waiting_for_a_foreign_pid_is_reported() {
        // pid 1 is never our child.
        assert!(matches!(
            wait_for(Pid::from_raw(1)),
            Err(Error::RuntimeFailure { .. })
        ));
    }
}
