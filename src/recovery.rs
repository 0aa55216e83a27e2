//! Incremental recovery from an anonymity set
//!
//! The recovering user queries entries in a given order. After each query the
//! new shares are first tested against subsecrets already rebuilt; the rest
//! join a pool, and every `t`-subset of the pool that includes at least one new
//! share is interpolated and checked against the subsecret markers of the
//! packet that owns the subset's first share. Each newly rebuilt subsecret
//! triggers an attempt to combine all subsecrets found so far, verified by the
//! secret marker. Recovery stops at the first verified secret.
//!
//! With [`RecoveryMode::Parallel`] the subset checks of each step run on a
//! dedicated rayon pool. The search returns the first match in enumeration
//! order, so both modes follow the same path and report the same result.

use tracing::{debug, trace};

use crate::anonymity::AnonymitySet;
use crate::config::RecoveryParams;
use crate::error::{Result, ShareError};
use crate::field::Field;
use crate::hint;
use crate::marker::{MarkerKind, MarkerProbe};
use crate::shamir::{self, Share};
use crate::subsecret::{Subsecret, combine_subsecrets};
use crate::subsets::{find_first, run_with_mode, subsets_touching_tail};

/// Progress of a recovery run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    /// Nothing rebuilt yet
    Collecting,
    /// At least one subsecret rebuilt
    PartiallyReconstructing,
    /// Shares are masked and the hint key is still missing
    Stalled,
    /// Secret rebuilt and verified
    Combined,
    /// Access order exhausted without a verified secret
    Failed,
}

/// Outcome of [`recover`]
#[derive(Debug, Clone)]
pub struct RecoveryReport<F: Field> {
    pub state: RecoveryState,
    pub secret: Option<Vec<F>>,
    /// Entries of the access order consumed before stopping
    pub packets_queried: usize,
    pub subsecrets_recovered: usize,
    pub hint_key_recovered: bool,
    limbs: usize,
}

impl<F: Field> RecoveryReport<F> {
    pub fn is_success(&self) -> bool {
        self.state == RecoveryState::Combined
    }

    /// The secret, or all-zero limbs when recovery failed
    pub fn secret_or_zero(&self) -> Vec<F> {
        self.secret
            .clone()
            .unwrap_or_else(|| vec![F::zero(); self.limbs])
    }
}

/// Recovers the secret by querying `set` in `order`
///
/// Running out of entries is not an error: the report then has state
/// [`RecoveryState::Failed`] and no secret.
///
/// # Errors
/// - [`ShareError::InvalidAccessOrder`] if `order` names a missing entry
/// - [`ShareError::InvalidThreshold`] for a zero leaf or hint threshold
/// - [`ShareError::InvalidConfig`] if the set is hinted but no hint threshold is given
/// - [`ShareError::WorkerPoolError`] if the parallel pool cannot start
///
/// # Example
/// ```
/// use anonymity_share::prelude::*;
///
/// let config = SchemeConfig::new(4, 2)
///     .with_subsecrets(2)
///     .unwrap()
///     .with_anonymity_set_size(8);
/// let mut session = Session::<Gf65536>::from_seed(7);
/// let secret = key_bytes_to_limbs(b"sixteen byte key");
///
/// let packing = session.share(&secret, &config).unwrap();
/// let order = session.random_access_order(packing.set.len());
/// let report = recover(&packing.set, &order, &config.recovery_params()).unwrap();
///
/// assert_eq!(report.secret, Some(secret));
/// ```
pub fn recover<F: Field>(
    set: &AnonymitySet<F>,
    order: &[usize],
    params: &RecoveryParams,
) -> Result<RecoveryReport<F>> {
    set.check_access_order(order)?;
    if params.absolute_threshold == 0 {
        return Err(ShareError::InvalidThreshold(params.absolute_threshold));
    }
    let hint_threshold = match (set.layout.hint_limbs, params.hint_threshold) {
        (Some(_), None) => {
            return Err(ShareError::InvalidConfig(
                "Hinted anonymity set needs a hint threshold".into(),
            ));
        }
        (Some(_), Some(0)) => return Err(ShareError::InvalidThreshold(0)),
        (Some(_), Some(threshold)) => Some(threshold),
        (None, _) => None,
    };
    let limit = params
        .max_queries
        .map_or(order.len(), |max| max.min(order.len()));
    let order = &order[..limit];

    run_with_mode(params.mode, |parallel| {
        Reconstructor::new(set, params.absolute_threshold, hint_threshold, parallel).run(order)
    })
}

/// A collected share not yet attributed to any subsecret
struct Pooled<F: Field> {
    share: Share<F>,
    /// Position of the owning entry in the set
    packet: usize,
    /// Ingest round in which the share arrived
    round: usize,
}

/// A rebuilt subsecret and the shares known to lie on its polynomial
struct Recovered<F: Field> {
    subsecret: Subsecret<F>,
    members: Vec<Share<F>>,
    packet: usize,
}

/// Rebuilds the hint key from fragments as entries arrive
struct HintCollector<F: Field> {
    threshold: usize,
    fragments: Vec<Share<F>>,
    key: Option<Vec<F>>,
}

impl<F: Field> HintCollector<F> {
    fn new(threshold: usize) -> Self {
        Self {
            threshold,
            fragments: Vec::new(),
            key: None,
        }
    }

    /// Adds the fragment of entry `position`; returns the key once it verifies
    fn absorb(&mut self, set: &AnonymitySet<F>, position: usize, parallel: bool) -> Option<Vec<F>> {
        let packet = set.get(position)?;
        let hint = packet.hint.as_ref()?;
        self.fragments.push(hint.share.clone());

        let newest = self.fragments.len() - 1;
        let subsets = subsets_touching_tail(self.fragments.len(), self.threshold, newest);
        let fragments = &self.fragments;
        let marker = std::slice::from_ref(&hint.marker);
        let key = find_first(parallel, &subsets, |subset| {
            let points: Vec<&Share<F>> = subset.iter().map(|&i| &fragments[i]).collect();
            let candidate = shamir::interpolate(&points).ok()?;
            MarkerProbe::new(MarkerKind::HintKey, &packet.salt, &candidate)
                .matches::<F>(marker)
                .then_some(candidate)
        })?;

        self.key = Some(key.clone());
        Some(key)
    }
}

struct Reconstructor<'a, F: Field> {
    set: &'a AnonymitySet<F>,
    threshold: usize,
    parallel: bool,
    state: RecoveryState,
    pool: Vec<Pooled<F>>,
    recovered: Vec<Recovered<F>>,
    hint: Option<HintCollector<F>>,
    /// Entries queried while the hint key was missing
    masked: Vec<usize>,
    round: usize,
    secret: Option<Vec<F>>,
}

impl<'a, F: Field> Reconstructor<'a, F> {
    fn new(
        set: &'a AnonymitySet<F>,
        threshold: usize,
        hint_threshold: Option<usize>,
        parallel: bool,
    ) -> Self {
        Self {
            set,
            threshold,
            parallel,
            state: RecoveryState::Collecting,
            pool: Vec::new(),
            recovered: Vec::new(),
            hint: hint_threshold.map(HintCollector::new),
            masked: Vec::new(),
            round: 0,
            secret: None,
        }
    }

    fn run(mut self, order: &[usize]) -> RecoveryReport<F> {
        let mut queried = 0;
        for &position in order {
            queried += 1;
            trace!(step = queried, position, "querying entry");
            self.query(position);
            if self.secret.is_some() {
                break;
            }
        }
        if self.secret.is_none() {
            self.transition(RecoveryState::Failed);
        }

        RecoveryReport {
            state: self.state,
            packets_queried: queried,
            subsecrets_recovered: self.recovered.len(),
            hint_key_recovered: self.hint.as_ref().is_some_and(|h| h.key.is_some()),
            limbs: self.set.layout.limbs,
            secret: self.secret,
        }
    }

    fn transition(&mut self, next: RecoveryState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "recovery state changed");
            self.state = next;
        }
    }

    fn query(&mut self, position: usize) {
        let Some(collector) = self.hint.as_mut() else {
            self.ingest(position, None);
            return;
        };
        if let Some(key) = collector.key.clone() {
            self.ingest(position, Some(&key));
            return;
        }

        self.masked.push(position);
        match collector.absorb(self.set, position, self.parallel) {
            Some(key) => {
                debug!(fragments = collector.fragments.len(), "hint key recovered");
                self.transition(RecoveryState::Collecting);
                for masked in std::mem::take(&mut self.masked) {
                    self.ingest(masked, Some(&key));
                    if self.secret.is_some() {
                        break;
                    }
                }
            }
            None => self.transition(RecoveryState::Stalled),
        }
    }

    /// Adds the shares of entry `position`, unmasking them with `key` if given
    fn ingest(&mut self, position: usize, key: Option<&[F]>) {
        let Some(packet) = self.set.get(position) else {
            return;
        };
        self.round += 1;

        for mut share in packet.shares.iter().cloned() {
            if let Some(key) = key {
                hint::unmask(key, &mut share);
            }
            match self.owner_of(&share) {
                Some(index) => self.recovered[index].members.push(share),
                None => self.pool.push(Pooled {
                    share,
                    packet: position,
                    round: self.round,
                }),
            }
        }

        self.search_pool();
    }

    /// Index of the rebuilt subsecret whose polynomial passes through `share`
    fn owner_of(&self, share: &Share<F>) -> Option<usize> {
        let known = self.threshold - 1;
        self.recovered.iter().position(|recovered| {
            if recovered.members.len() < known {
                return false;
            }
            let mut points: Vec<&Share<F>> = recovered.members[..known].iter().collect();
            points.push(share);
            shamir::interpolate(&points).is_ok_and(|value| value == recovered.subsecret.value)
        })
    }

    /// Searches subsets that include shares from the current round until none verifies
    fn search_pool(&mut self) {
        while self.secret.is_none() {
            let first_new = self
                .pool
                .iter()
                .position(|p| p.round == self.round)
                .unwrap_or(self.pool.len());
            let subsets = subsets_touching_tail(self.pool.len(), self.threshold, first_new);
            if subsets.is_empty() {
                return;
            }

            let pool = &self.pool;
            let set = self.set;
            let found = find_first(self.parallel, &subsets, |subset| {
                let points: Vec<&Share<F>> = subset.iter().map(|&i| &pool[i].share).collect();
                let candidate = shamir::interpolate(&points).ok()?;
                let owner = set.get(pool[subset[0]].packet)?;
                let tag = MarkerProbe::new(MarkerKind::Subsecret, &owner.salt, &candidate)
                    .open::<F>(&owner.markers)?;
                Some((
                    subset.clone(),
                    Subsecret {
                        x: tag,
                        value: candidate,
                    },
                ))
            });

            match found {
                Some((subset, subsecret)) => self.record(&subset, subsecret),
                None => return,
            }
        }
    }

    fn record(&mut self, subset: &[usize], subsecret: Subsecret<F>) {
        let packet = self.pool[subset[0]].packet;
        let mut members = Vec::with_capacity(subset.len());
        for &index in subset.iter().rev() {
            members.push(self.pool.remove(index).share);
        }

        if let Some(existing) = self
            .recovered
            .iter_mut()
            .find(|r| r.subsecret.value == subsecret.value)
        {
            existing.members.extend(members);
            return;
        }

        self.recovered.push(Recovered {
            subsecret,
            members,
            packet,
        });
        debug!(
            recovered = self.recovered.len(),
            pooled = self.pool.len(),
            "subsecret recovered"
        );
        self.transition(RecoveryState::PartiallyReconstructing);

        // Pull earlier arrivals of the same subsecret out of the pool
        let newest = self.recovered.len() - 1;
        let mut i = 0;
        while i < self.pool.len() {
            if self.owner_of(&self.pool[i].share) == Some(newest) {
                let pooled = self.pool.remove(i);
                self.recovered[newest].members.push(pooled.share);
            } else {
                i += 1;
            }
        }

        self.try_combine();
    }

    /// Combines every rebuilt subsecret and keeps the result if the secret marker accepts it
    fn try_combine(&mut self) {
        let Some(newest) = self.recovered.last() else {
            return;
        };
        let Some(owner) = self.set.get(newest.packet) else {
            return;
        };
        let subsecrets: Vec<Subsecret<F>> =
            self.recovered.iter().map(|r| r.subsecret.clone()).collect();
        let Ok(candidate) = combine_subsecrets(&subsecrets) else {
            return;
        };

        if MarkerProbe::new(MarkerKind::Secret, &owner.salt, &candidate).matches::<F>(&owner.markers) {
            debug!(subsecrets = subsecrets.len(), "secret combined");
            self.secret = Some(candidate);
            self.transition(RecoveryState::Combined);
        }
    }
}
