//! Fixed-size per-trustee packets
//!
//! Every trustee receives exactly `max_shares_per_person` shares and
//! `max_shares_per_person + 1` markers. Trustees holding fewer real leaves
//! are topped up with filler shares (fresh coordinate, random y) and random
//! markers, so all packets, real or decoy, encode to the same length.

use bytes::{BufMut, Bytes, BytesMut};
use rand::seq::{SliceRandom, index};
use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SchemeConfig;
use crate::error::{Result, ShareError};
use crate::field::Field;
use crate::marker::{self, MarkerKind, SALT_LEN, Salt};
use crate::registry::XCoordinateRegistry;
use crate::shamir::Share;
use crate::subsecret::SplitOutput;

/// Width of every length prefix in [`SharePacket::to_bytes`]
const COUNT_LEN: usize = 8;

/// A hint-key fragment together with the marker that verifies the key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintFragment<F: Field> {
    pub share: Share<F>,
    pub marker: Vec<u8>,
}

/// What one trustee (or one decoy) holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePacket<F: Field> {
    /// Salt binding this packet's markers
    pub salt: Salt,
    /// Secret marker, one marker per share slot, in shuffled order
    pub markers: Vec<Vec<u8>>,
    /// Real and filler shares in shuffled order
    pub shares: Vec<Share<F>>,
    /// Present iff the set carries a hint layer
    pub hint: Option<HintFragment<F>>,
}

/// Dimensions shared by every packet of a set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketLayout {
    pub max_shares_per_person: usize,
    pub marker_len: usize,
    /// Limbs per share
    pub limbs: usize,
    /// Limbs per hint fragment, when hinted
    pub hint_limbs: Option<usize>,
}

impl PacketLayout {
    pub fn markers_per_packet(&self) -> usize {
        self.max_shares_per_person + 1
    }

    /// Length of [`SharePacket::to_bytes`] for any packet with this layout
    pub fn encoded_len<F: Field>(&self) -> usize {
        let share_len = |limbs: usize| F::BYTES * (1 + limbs);
        let mut len = SALT_LEN
            + COUNT_LEN
            + self.markers_per_packet() * self.marker_len
            + 2 * COUNT_LEN
            + self.max_shares_per_person * share_len(self.limbs)
            + 1;
        if let Some(hint_limbs) = self.hint_limbs {
            len += COUNT_LEN + share_len(hint_limbs) + self.marker_len;
        }
        len
    }
}

/// Packets for all trustees, indexed by trustee
#[derive(Debug, Clone)]
pub struct SharePackets<F: Field> {
    pub packets: Vec<SharePacket<F>>,
    pub layout: PacketLayout,
}

impl<F: Field> SharePacket<F> {
    /// A packet indistinguishable in shape from a real one, holding only random material
    pub fn decoy<R: RngCore + ?Sized>(
        layout: &PacketLayout,
        registry: &mut XCoordinateRegistry<F>,
        rng: &mut R,
    ) -> Result<Self> {
        let salt = marker::random_salt(rng);
        let markers = (0..layout.markers_per_packet())
            .map(|_| marker::random_marker::<F, _>(rng))
            .collect();
        let shares = (0..layout.max_shares_per_person)
            .map(|_| Share::random(layout.limbs, registry, rng))
            .collect::<Result<Vec<_>>>()?;
        let hint = match layout.hint_limbs {
            Some(limbs) => Some(HintFragment {
                share: Share::random(limbs, registry, rng)?,
                marker: marker::random_marker::<F, _>(rng),
            }),
            None => None,
        };
        Ok(Self {
            salt,
            markers,
            shares,
            hint,
        })
    }

    /// Flat encoding: salt, markers, shares, then the optional hint fragment
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_slice(&self.salt);
        put_count(&mut buf, self.markers.len());
        for marker in &self.markers {
            buf.put_slice(marker);
        }
        put_count(&mut buf, self.shares.len());
        put_count(&mut buf, self.shares.first().map_or(0, |s| s.limbs()));
        for share in &self.shares {
            put_share(&mut buf, share);
        }
        match &self.hint {
            Some(hint) => {
                buf.put_u8(1);
                put_count(&mut buf, hint.share.limbs());
                put_share(&mut buf, &hint.share);
                buf.put_slice(&hint.marker);
            }
            None => buf.put_u8(0),
        }
        buf.freeze()
    }

    pub fn encoded_len(&self) -> usize {
        let share_len = |share: &Share<F>| F::BYTES * (1 + share.limbs());
        let mut len = SALT_LEN
            + COUNT_LEN
            + self.markers.iter().map(Vec::len).sum::<usize>()
            + 2 * COUNT_LEN
            + self.shares.iter().map(share_len).sum::<usize>()
            + 1;
        if let Some(hint) = &self.hint {
            len += COUNT_LEN + share_len(&hint.share) + hint.marker.len();
        }
        len
    }
}

/// Counts are written as big-endian u64, wide enough for any `usize`
fn put_count(buf: &mut BytesMut, count: usize) {
    buf.put_u64(count as u64);
}

fn put_share<F: Field>(buf: &mut BytesMut, share: &Share<F>) {
    buf.put_slice(&share.x.to_bytes());
    for y in &share.y {
        buf.put_slice(&y.to_bytes());
    }
}

/// Number of leaves each trustee receives, plus the maximum
///
/// Every trustee gets `total / trustees`; the remainder goes one each to
/// distinct, randomly chosen trustees.
pub fn person_wise_share_counts<R: RngCore + ?Sized>(
    total: usize,
    trustees: usize,
    rng: &mut R,
) -> (Vec<usize>, usize) {
    if trustees == 0 {
        return (Vec::new(), 0);
    }
    let base = total / trustees;
    let extras = total % trustees;
    let mut counts = vec![base; trustees];
    for trustee in index::sample(rng, trustees, extras) {
        counts[trustee] += 1;
    }
    let max = (base + usize::from(extras > 0)).max(1);
    (counts, max)
}

/// Distributes the leaves of `split` over `config.trustees` fixed-size packets
///
/// # Errors
/// - [`ShareError::InvalidTrustees`] if there are no trustees
/// - [`ShareError::ThresholdExceedsTrustees`] if the absolute threshold
///   exceeds the trustee count
/// - [`ShareError::CoordinatesExhausted`] if filler shares cannot get coordinates
pub fn build_share_packets<F, R>(
    secret: &[F],
    split: &SplitOutput<F>,
    config: &SchemeConfig,
    registry: &mut XCoordinateRegistry<F>,
    rng: &mut R,
) -> Result<SharePackets<F>>
where
    F: Field,
    R: RngCore + ?Sized,
{
    let trustees = config.trustees;
    if trustees == 0 {
        return Err(ShareError::InvalidTrustees(trustees));
    }
    if split.absolute_threshold > trustees {
        return Err(ShareError::ThresholdExceedsTrustees {
            threshold: split.absolute_threshold,
            trustees,
        });
    }

    let (counts, max_shares_per_person) = person_wise_share_counts(split.leaves.len(), trustees, rng);
    let layout = PacketLayout {
        max_shares_per_person,
        marker_len: marker::marker_len::<F>(),
        limbs: secret.len(),
        hint_limbs: None,
    };

    let mut leaves = split.leaves.clone();
    leaves.shuffle(rng);
    let mut leaves = leaves.into_iter();

    let mut packets = Vec::with_capacity(trustees);
    for &count in &counts {
        let salt = marker::random_salt(rng);
        let mut markers = Vec::with_capacity(layout.markers_per_packet());
        markers.push(marker::seal(MarkerKind::Secret, &salt, secret, None));

        let mut shares = Vec::with_capacity(max_shares_per_person);
        let mut marked = Vec::with_capacity(count);
        for leaf in leaves.by_ref().take(count) {
            let parent = split.parent_subsecrets.get(&leaf.x).copied();
            let marker = match parent.and_then(|p| split.subsecrets.get(p).map(|s| (p, s))) {
                // A second leaf of the same subsecret would repeat the marker verbatim
                Some((p, subsecret)) if !marked.contains(&p) => {
                    marked.push(p);
                    marker::seal(MarkerKind::Subsecret, &salt, &subsecret.value, subsecret.x)
                }
                _ => marker::random_marker::<F, _>(rng),
            };
            markers.push(marker);
            shares.push(leaf);
        }
        while shares.len() < max_shares_per_person {
            shares.push(Share::random(layout.limbs, registry, rng)?);
            markers.push(marker::random_marker::<F, _>(rng));
        }

        shares.shuffle(rng);
        markers.shuffle(rng);
        packets.push(SharePacket {
            salt,
            markers,
            shares,
            hint: None,
        });
    }

    debug!(
        trustees,
        max_shares_per_person,
        leaves = split.leaves.len(),
        "share packets built"
    );
    Ok(SharePackets { packets, layout })
}
