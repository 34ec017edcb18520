// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A global worker pool and scoped task-group helper used by the frame and audio buffer
//! conversion routines.
//!
//! The original library dispatched one task per scanline onto a shared `IlmThread::ThreadPool`
//! and waited on a `TaskGroup` before returning. `mox-core` keeps that shape but builds it on
//! [`rayon`]: a process-wide [`rayon::ThreadPool`] stands in for the global pool, and
//! [`rayon::Scope`] stands in for the task group — every row spawned into a scope is guaranteed
//! to finish before the scope itself returns.

use once_cell::sync::OnceCell;

use crate::errors::{logic_error, Result};

static GLOBAL_POOL: OnceCell<rayon::ThreadPool> = OnceCell::new();

/// Installs the global worker pool with the given thread count. Must be called at most once,
/// and before the pool is first used by [`task_group`]; later calls fail with
/// [`crate::errors::Error::Logic`].
///
/// `num_threads == 0` lets rayon choose a thread count from the environment, matching
/// `setGlobalThreadCount`'s "0 means default" convention.
pub fn init_thread_pool(num_threads: usize) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("mox-worker-{i}"))
        .build()
        .map_err(|e| crate::errors::Error::Logic(e.to_string()))?;

    match GLOBAL_POOL.set(pool) {
        Ok(()) => Ok(()),
        Err(_) => logic_error("mox thread pool already initialized"),
    }
}

fn pool() -> &'static rayon::ThreadPool {
    GLOBAL_POOL.get_or_init(|| {
        rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("mox-worker-{i}"))
            .build()
            .expect("failed to build default mox thread pool")
    })
}

/// Runs `body` inside a scope on the global pool, synchronously from the caller's point of view:
/// `task_group` does not return until every task spawned via the scope has completed.
///
/// `body` receives a `&rayon::Scope` to spawn row- or channel-level closures onto with
/// `scope.spawn(...)`.
pub fn task_group<'scope, F>(body: F)
where
    F: FnOnce(&rayon::Scope<'scope>) + Send,
{
    pool().scope(body);
}
