//! # Concurrency Utilities
//!
//! Worker-pool sizing for the parallel pre-tokenization phase.

use core::{num::NonZeroUsize, str::FromStr};
use std::{env, thread};

use crate::errors::{BFResult, BpeForgeError};

/// Get the max parallelism available.
///
/// Honors ``RAYON_NUM_THREADS`` (and the deprecated ``RAYON_RS_NUM_CPUS``).
pub fn est_max_parallelism() -> usize {
    let default = || {
        thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    };

    match env::var("RAYON_NUM_THREADS")
        .ok()
        .and_then(|s| usize::from_str(&s).ok())
    {
        Some(x @ 1..) => return x,
        Some(0) => return default(),
        _ => {}
    }

    // Support for deprecated `RAYON_RS_NUM_CPUS`.
    match env::var("RAYON_RS_NUM_CPUS")
        .ok()
        .and_then(|s| usize::from_str(&s).ok())
    {
        Some(x @ 1..) => x,
        _ => default(),
    }
}

/// Resolve the max pool size.
///
/// ``min(max_pool, est_max_parallelism())``
pub fn resolve_max_pool(max_pool: Option<NonZeroUsize>) -> usize {
    let sys_max = est_max_parallelism();

    let max_pool = max_pool.map(|x| x.get()).unwrap_or(sys_max);

    core::cmp::min(max_pool, sys_max)
}

/// Run `op` inside a worker pool.
///
/// With `max_threads`, a dedicated ``rayon`` pool of ``resolve_max_pool(max_threads)``
/// workers is built for the call; otherwise the global ``rayon`` pool is used.
pub fn run_in_pool<R, OP>(
    max_threads: Option<NonZeroUsize>,
    op: OP,
) -> BFResult<R>
where
    OP: FnOnce() -> R + Send,
    R: Send,
{
    match max_threads {
        None => Ok(op()),
        Some(_) => {
            let num_threads = resolve_max_pool(max_threads);
            log::debug!("building worker pool: {num_threads} threads");
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .thread_name(|idx| format!("bpeforge-worker-{idx}"))
                .build()
                .map_err(|e| BpeForgeError::ThreadPool(e.to_string()))?;
            Ok(pool.install(op))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_max_pool() {
        let sys_max = est_max_parallelism();
        assert!(sys_max >= 1);

        assert_eq!(resolve_max_pool(None), sys_max);
        assert_eq!(resolve_max_pool(NonZeroUsize::new(1)), 1);
        assert_eq!(
            resolve_max_pool(NonZeroUsize::new(sys_max + 10)),
            sys_max
        );
    }

    #[test]
    fn test_run_in_pool() {
        use rayon::prelude::*;

        let total: u64 = run_in_pool(NonZeroUsize::new(2), || {
            (1..=100u64).into_par_iter().sum()
        })
        .unwrap();
        assert_eq!(total, 5050);

        let total: u64 = run_in_pool(None, || (1..=10u64).into_par_iter().sum()).unwrap();
        assert_eq!(total, 55);
    }
}
