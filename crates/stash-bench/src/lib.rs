//! Benchmark workloads for the Stash instance pool.
//!
//! Provides pre-built pool shapes for benchmarks and examples:
//!
//! - [`dense_pool`]: `n` consecutive occupied slots
//! - [`churned_pool`]: `n` slots with a deterministic fraction freed
//! - [`churn_indices`]: deterministic removal order from a seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use stash_pool::{Handle, InstancePool};

/// A pool of `n` values `0..n` with no free slots.
pub fn dense_pool(n: usize) -> (InstancePool<u64>, Vec<Handle>) {
    let mut pool = InstancePool::with_capacity(n);
    let handles = (0..n as u64).map(|v| pool.insert(v)).collect();
    (pool, handles)
}

/// A pool of `n` slots with roughly `free_per_mille / 1000` of them freed.
///
/// Returns the pool and the handles that are still live.
pub fn churned_pool(n: usize, free_per_mille: u32, seed: u64) -> (InstancePool<u64>, Vec<Handle>) {
    let (mut pool, handles) = dense_pool(n);
    let remove = n * free_per_mille.min(1000) as usize / 1000;
    let order = churn_indices(n, remove, seed);

    let mut live = vec![true; n];
    for &i in &order {
        // Indices are unique, so every removal succeeds.
        if pool.remove(handles[i]).is_ok() {
            live[i] = false;
        }
    }
    let survivors = handles
        .into_iter()
        .zip(live)
        .filter_map(|(h, alive)| alive.then_some(h))
        .collect();
    (pool, survivors)
}

/// `count` distinct indices in `0..n`, in a seed-dependent order.
///
/// Uses an LCG hash with linear probing, so the result is stable across
/// platforms and runs.
pub fn churn_indices(n: usize, count: usize, seed: u64) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let count = count.min(n);
    let mut taken = vec![false; n];
    let mut out = Vec::with_capacity(count);

    for i in 0..count as u64 {
        let mut idx = (seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(i.wrapping_mul(1442695040888963407))
            >> 17) as usize
            % n;
        while taken[idx] {
            idx = (idx + 1) % n;
        }
        taken[idx] = true;
        out.push(idx);
    }
    out
}
