use keysweep::{
    Alphabet, Error, Keyspace, PANIC_EXIT_CODE, Supervisor, Termination, Transform, WorkerResult,
    partition, run_partition, sweep,
};
use nix::{
    errno::Errno,
    sys::{
        signal::{Signal, raise},
        wait::{WaitPidFlag, WaitStatus, waitpid},
    },
    unistd::Pid,
};
use std::{
    fmt, fs,
    path::Path,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

// Forking while another test thread holds a lock can wedge the child, so the
// tests in this binary take turns.
static FORK_LOCK: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    FORK_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

fn spawn<F, E>(count: usize, task: F) -> keysweep::Result<Supervisor>
where
    F: Fn(usize) -> Result<(), E>,
    E: fmt::Display,
{
    // SAFETY: tests fork only through these helpers while holding
    // `FORK_LOCK` and start no threads of their own, so every other thread
    // is parked on the lock or idle in the harness.
    unsafe { Supervisor::spawn(count, task) }
}

fn sweep_keys<T, const N: usize>(
    keyspace: &Keyspace,
    workers: usize,
    transform: &T,
) -> keysweep::Result<Vec<WorkerResult>>
where
    T: Transform<N>,
{
    // SAFETY: as for `spawn`.
    unsafe { sweep(keyspace, workers, transform) }
}

fn record(dir: &Path, index: usize, contents: &str) -> std::io::Result<()> {
    fs::write(dir.join(format!("worker-{index}")), contents)
}

#[test]
fn spawn_three_join_three_in_order() {
    let _guard = serial();
    let mut supervisor = spawn(3, |_| Ok::<_, Error>(())).unwrap();
    assert_eq!(supervisor.len(), 3);
    let pids: Vec<_> = supervisor.pids().collect();

    let results = supervisor.join_all();
    assert_eq!(results.len(), 3);
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.index, i);
        assert_eq!(result.pid, pids[i]);
        assert_eq!(result.outcome, Ok(Termination::Exited(0)));
        assert!(result.is_success());
    }
    assert!(supervisor.is_empty());
}

#[test]
fn task_errors_are_contained_in_the_worker() {
    let _guard = serial();
    let dir = tempfile::tempdir().unwrap();
    let mut supervisor = spawn(4, |index| {
        if index == 1 {
            return Err(format!("worker {index} gave up"));
        }
        record(dir.path(), index, "done").map_err(|e| e.to_string())
    })
    .unwrap();

    let results = supervisor.join_all();
    assert!(results.iter().all(|r| r.outcome == Ok(Termination::Exited(0))));
    for index in [0, 2, 3] {
        assert!(dir.path().join(format!("worker-{index}")).exists());
    }
    assert!(!dir.path().join("worker-1").exists());
}

#[test]
fn panicking_task_exits_with_panic_code_and_spares_siblings() {
    let _guard = serial();
    let dir = tempfile::tempdir().unwrap();
    let mut supervisor = spawn(3, |index| {
        if index == 0 {
            panic!("boom");
        }
        record(dir.path(), index, "done")
    })
    .unwrap();

    let outcomes: Vec<_> = supervisor.join_all().into_iter().map(|r| r.outcome).collect();
    assert_eq!(
        outcomes,
        [
            Ok(Termination::Exited(PANIC_EXIT_CODE)),
            Ok(Termination::Exited(0)),
            Ok(Termination::Exited(0)),
        ]
    );
    assert!(dir.path().join("worker-1").exists());
    assert!(dir.path().join("worker-2").exists());
}

#[test]
fn exit_codes_and_signals_are_classified() {
    let _guard = serial();
    let mut supervisor = spawn(3, |index| -> Result<(), Errno> {
        match index {
            1 => std::process::exit(7),
            2 => raise(Signal::SIGKILL),
            _ => Ok(()),
        }
    })
    .unwrap();

    let outcomes: Vec<_> = supervisor.join_all().into_iter().map(|r| r.outcome).collect();
    assert_eq!(
        outcomes,
        [
            Ok(Termination::Exited(0)),
            Ok(Termination::Exited(7)),
            Ok(Termination::Signaled(Signal::SIGKILL as i32)),
        ]
    );
}

#[test]
fn join_order_follows_spawn_order_not_completion_order() {
    let _guard = serial();
    let mut supervisor = spawn(4, |index| {
        if index == 0 {
            std::thread::sleep(Duration::from_millis(200));
        }
        Ok::<_, Error>(())
    })
    .unwrap();

    let indices: Vec<_> = supervisor.join_all().iter().map(|r| r.index).collect();
    assert_eq!(indices, [0, 1, 2, 3]);
}

#[test]
fn unobservable_worker_does_not_stop_the_join() {
    let _guard = serial();
    let mut supervisor = spawn(3, |_| Ok::<_, Error>(())).unwrap();
    let pids: Vec<_> = supervisor.pids().collect();

    // Reap the middle worker behind the supervisor's back.
    assert_eq!(
        waitpid(Pid::from_raw(pids[1]), None),
        Ok(WaitStatus::Exited(Pid::from_raw(pids[1]), 0))
    );

    let results = supervisor.join_all();
    assert_eq!(
        results.iter().map(|r| r.pid).collect::<Vec<_>>(),
        pids,
        "every worker is reported"
    );
    assert_eq!(results[0].outcome, Ok(Termination::Exited(0)));
    assert!(matches!(results[1].outcome, Err(Error::RuntimeFailure { .. })));
    assert_eq!(results[2].outcome, Ok(Termination::Exited(0)));
    assert!(!results[1].is_success());
}

#[test]
fn join_all_is_idempotent() {
    let _guard = serial();
    let mut supervisor = spawn(2, |_| Ok::<_, Error>(())).unwrap();
    assert_eq!(supervisor.join_all().len(), 2);
    assert!(supervisor.join_all().is_empty());
}

#[test]
fn drop_reaps_unjoined_workers() {
    let _guard = serial();
    let supervisor = spawn(3, |_| Ok::<_, Error>(())).unwrap();
    let pids: Vec<_> = supervisor.pids().collect();
    drop(supervisor);

    for pid in pids {
        assert_eq!(
            waitpid(Pid::from_raw(pid), Some(WaitPidFlag::WNOHANG)),
            Err(Errno::ECHILD),
            "pid {pid} was left unreaped"
        );
    }
}

#[test]
fn workers_aggregate_out_of_band() {
    let _guard = serial();
    let keyspace = Keyspace::new(3, Alphabet::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let noop = |_: &[u8]| [0u8; 0];

    for workers in [1, 3, 7] {
        let parts = partition(keyspace.total(), workers).unwrap();
        let mut supervisor = spawn(workers, |index| -> Result<(), String> {
            let count = run_partition(&keyspace, &parts[index], &noop).map_err(|e| e.to_string())?;
            record(dir.path(), index, &count.to_string()).map_err(|e| e.to_string())
        })
        .unwrap();
        assert!(supervisor.join_all().iter().all(|r| r.is_success()));

        let sum: u64 = (0..workers)
            .map(|index| {
                fs::read_to_string(dir.path().join(format!("worker-{index}")))
                    .unwrap()
                    .parse::<u64>()
                    .unwrap()
            })
            .sum();
        assert_eq!(sum, keyspace.total(), "workers {workers}");
    }
}

#[test]
fn sweep_with_more_workers_than_keys_succeeds() {
    let _guard = serial();
    let keyspace = Keyspace::new(1, Alphabet::new("abcde").unwrap()).unwrap();
    let results = sweep_keys(&keyspace, 10, &|key: &[u8]| [key[0]]).unwrap();
    assert_eq!(results.len(), 10);
    assert!(results.iter().all(|r| r.is_success()));
}

#[test]
fn sweep_rejects_zero_workers() {
    let _guard = serial();
    let keyspace = Keyspace::new(2, Alphabet::default()).unwrap();
    let results = sweep_keys(&keyspace, 0, &|_: &[u8]| [0u8; 0]);
    assert!(matches!(results, Err(Error::InvalidArgument { .. })));
}
