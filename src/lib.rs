//! Secret sharing with anonymous trustees
//!
//! A secret is split into subsecrets, every subsecret is Shamir-shared among
//! the trustees, and each trustee's shares travel in a fixed-size packet
//! together with salted markers. The packets are then hidden among decoy
//! packets of identical shape. A recovering user who does not know which
//! entries are real queries the set one entry at a time and rebuilds
//! subsecrets as soon as enough real shares have been seen; the markers tell
//! real candidates apart from noise.
//!
//! Arithmetic runs over any [`Field`]: the table-driven [`Gf65536`] with
//! 16-bit limbs, or [`Ed25519Scalar`] for single-limb secrets.
//!
//! # Quick Start
//!
//! ```
//! use anonymity_share::prelude::*;
//!
//! // 6 trustees, any 3 of them can recover; 4 subsecrets, 30 entries in total
//! let config = SchemeConfig::new(6, 3)
//!     .with_subsecrets(4)
//!     .unwrap()
//!     .with_anonymity_set_size(30);
//!
//! let mut session = Session::<Gf65536>::new().unwrap();
//! let secret = key_bytes_to_limbs(b"a sixteen byte k");
//! let packing = session.share(&secret, &config).unwrap();
//!
//! // The recovering user only sees the set and knows the threshold
//! let order = session.random_access_order(packing.set.len());
//! let report = recover(&packing.set, &order, &config.recovery_params()).unwrap();
//! assert!(report.is_success());
//! assert_eq!(limbs_to_key_bytes(&report.secret_or_zero()), b"a sixteen byte k");
//! ```

mod anonymity;
pub mod baseline;
mod config;
mod error;
mod field;
mod finite_field;
pub mod hint;
pub mod limbs;
pub mod marker;
mod packet;
mod recovery;
mod registry;
mod scalar_field;
mod session;
pub mod shamir;
pub mod subsecret;
mod subsets;

pub use anonymity::{
    AnonymityPacking, AnonymitySet, build_anonymity_set, random_access_order,
    sequential_access_order,
};
pub use baseline::{BaselineRecovery, BaselineStrategy};
pub use config::{HintConfig, Placement, RecoveryMode, RecoveryParams, SchemeConfig, SubsecretPolicy};
pub use error::{ErrorKind, Result, ShareError};
pub use field::{Field, batch_invert, limbs_to_field_bytes};
pub use finite_field::{DEFAULT_GENERATOR, DEFAULT_MODULUS, FieldTables, Gf65536};
pub use limbs::{key_bytes_to_limbs, limbs_to_key_bytes};
pub use packet::{
    HintFragment, PacketLayout, SharePacket, SharePackets, build_share_packets,
    person_wise_share_counts,
};
pub use recovery::{RecoveryReport, RecoveryState, recover};
pub use registry::XCoordinateRegistry;
pub use scalar_field::Ed25519Scalar;
pub use session::Session;
pub use shamir::Share;
pub use subsecret::{
    SplitOutput, Subsecret, all_possible_subsecrets, ideal_no_of_subsecrets,
    least_no_of_subsecrets,
};

// Re-export common types for convenience
pub mod prelude {
    pub use super::{
        AnonymityPacking, AnonymitySet, Ed25519Scalar, Field, Gf65536, HintConfig, Placement,
        RecoveryMode, RecoveryParams, RecoveryReport, RecoveryState, Result, SchemeConfig,
        Session, Share, ShareError, SubsecretPolicy, key_bytes_to_limbs, limbs_to_key_bytes,
        recover,
    };
}
