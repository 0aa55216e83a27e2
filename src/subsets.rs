//! Lexicographic k-subset enumeration and the first-match search used by
//! the brute-force recovery loops

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::config::RecoveryMode;
use crate::error::{Result, ShareError};

/// Iterator over all `k`-element subsets of `0..n`, in lexicographic order
pub(crate) struct Combinations {
    indices: Vec<usize>,
    n: usize,
    done: bool,
}

impl Combinations {
    pub(crate) fn new(n: usize, k: usize) -> Self {
        Self {
            indices: (0..k).collect(),
            n,
            done: k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        let current = self.indices.clone();

        let k = self.indices.len();
        // Rightmost position that can still move up
        match (0..k).rev().find(|&i| self.indices[i] < self.n - k + i) {
            Some(i) => {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
            }
            None => self.done = true,
        }
        Some(current)
    }
}

/// All `k`-subsets of `0..n` whose largest element is at least `first_new`
///
/// Positions `first_new..n` hold newly arrived items; every subset returned
/// contains at least one of them and none is returned twice. Ordered by
/// largest element, then lexicographically.
pub(crate) fn subsets_touching_tail(n: usize, k: usize, first_new: usize) -> Vec<Vec<usize>> {
    if k == 0 || k > n {
        return Vec::new();
    }
    let mut subsets = Vec::new();
    for last in first_new.max(k - 1)..n {
        for mut head in Combinations::new(last, k - 1) {
            head.push(last);
            subsets.push(head);
        }
    }
    subsets
}

/// Returns the first `f(item)` that is `Some`, in slice order
///
/// The parallel search may evaluate later items speculatively but always
/// reports the earliest match, so both modes agree.
pub(crate) fn find_first<T, R, G>(parallel: bool, items: &[T], f: G) -> Option<R>
where
    T: Sync,
    R: Send,
    G: Fn(&T) -> Option<R> + Sync + Send,
{
    if parallel {
        items.par_iter().find_map_first(f)
    } else {
        items.iter().find_map(f)
    }
}

/// Runs `job` directly or on a dedicated pool, telling it whether to search in parallel
pub(crate) fn run_with_mode<T, J>(mode: RecoveryMode, job: J) -> Result<T>
where
    T: Send,
    J: FnOnce(bool) -> T + Send,
{
    mode.validate()?;
    match mode {
        RecoveryMode::Sequential => Ok(job(false)),
        RecoveryMode::Parallel { workers } => {
            let pool = ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| ShareError::WorkerPoolError(e.to_string()))?;
            Ok(pool.install(|| job(true)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinations() {
        let all: Vec<_> = Combinations::new(4, 2).collect();
        assert_eq!(
            all,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
        assert_eq!(Combinations::new(5, 0).count(), 1);
        assert_eq!(Combinations::new(2, 3).count(), 0);
        assert_eq!(Combinations::new(10, 3).count(), 120);
    }

    #[test]
    fn test_subsets_touching_tail() {
        // 5 items, the last 2 are new: C(5,3) - C(3,3) = 9 subsets
        let subsets = subsets_touching_tail(5, 3, 3);
        assert_eq!(subsets.len(), 9);
        assert!(subsets.iter().all(|s| s.iter().any(|&i| i >= 3)));
        assert_eq!(subsets[0], vec![0, 1, 3]);

        assert_eq!(subsets_touching_tail(5, 3, 5).len(), 0);
        assert_eq!(subsets_touching_tail(5, 3, 0).len(), 10);
        assert_eq!(subsets_touching_tail(2, 3, 0).len(), 0);
        assert_eq!(subsets_touching_tail(3, 1, 1), vec![vec![1], vec![2]]);
    }

    #[test]
    fn test_find_first_agrees_across_modes() {
        let items: Vec<u32> = (0..10_000).collect();
        let pick = |v: &u32| (v % 997 == 996).then_some(*v);
        assert_eq!(find_first(false, &items, pick), Some(996));
        assert_eq!(find_first(true, &items, pick), Some(996));
        assert_eq!(find_first(true, &items, |_| None::<u32>), None);
    }

    #[test]
    fn test_run_with_mode() {
        assert!(!run_with_mode(RecoveryMode::Sequential, |parallel| parallel).unwrap());
        let threads = run_with_mode(RecoveryMode::Parallel { workers: 3 }, |parallel| {
            assert!(parallel);
            rayon::current_num_threads()
        })
        .unwrap();
        assert_eq!(threads, 3);
        assert!(run_with_mode(RecoveryMode::Parallel { workers: 0 }, |_| ()).is_err());
    }
}
