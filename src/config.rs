use crate::error::{Result, ShareError};
use serde::{Deserialize, Serialize};

/// How subsecrets relate to the secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubsecretPolicy {
    /// Every subsecret is needed; the secret is their sum
    Additive,
    /// Subsecrets are Shamir shares of the secret; `percentage` of them suffice
    Thresholded { percentage: u32 },
}

impl Default for SubsecretPolicy {
    fn default() -> Self {
        Self::Additive
    }
}

/// Where real packets land inside an anonymity set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// Uniformly random positions
    Random,
    /// All real packets at the tail of the set
    WorstCase,
}

impl Default for Placement {
    fn default() -> Self {
        Self::Random
    }
}

/// Processing mode for candidate evaluation during recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryMode {
    /// Evaluate candidates one after another
    Sequential,
    /// Evaluate candidates on a dedicated pool of `workers` threads
    Parallel { workers: usize },
}

impl Default for RecoveryMode {
    fn default() -> Self {
        Self::Sequential
    }
}

/// Parameters of the hint layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintConfig {
    /// Number of trustees that receive a real hint fragment
    pub hints: usize,
    /// Fragments needed to rebuild the hint key
    pub threshold: usize,
}

/// Dealer-side parameters of a sharing session
///
/// # Example
/// ```
/// use anonymity_share::{SchemeConfig, SubsecretPolicy};
///
/// let config = SchemeConfig::new(25, 3)
///     .with_subsecrets(8)
///     .unwrap()
///     .with_percentage_leaves_threshold(80)
///     .unwrap()
///     .with_anonymity_set_size(100);
///
/// assert_eq!(config.shares_per_subsecret(), 3);
/// assert_eq!(config.total_shares(), 24);
/// assert_eq!(config.policy, SubsecretPolicy::Additive);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeConfig {
    /// Number of trustees (n)
    pub trustees: usize,
    /// Leaf shares needed to rebuild one subsecret (t)
    pub absolute_threshold: usize,
    /// Number of subsecrets the secret is divided into
    pub subsecrets: usize,
    /// Sets the leaf fan-out: `floor(100 * t / percentage)` leaves per subsecret
    pub percentage_leaves_threshold: u32,
    /// Combination rule for subsecrets
    pub policy: SubsecretPolicy,
    /// Optional hint layer
    pub hints: Option<HintConfig>,
    /// Total entries in the anonymity set (a)
    pub anonymity_set_size: usize,
    /// Placement of real packets inside the anonymity set
    pub placement: Placement,
    /// Recovery processing mode
    pub mode: RecoveryMode,
}

impl SchemeConfig {
    /// Creates a configuration for `trustees` trustees and leaf threshold `absolute_threshold`
    ///
    /// Defaults to two additive subsecrets, 100% leaf threshold and an anonymity
    /// set with no decoys.
    pub fn new(trustees: usize, absolute_threshold: usize) -> Self {
        Self {
            trustees,
            absolute_threshold,
            subsecrets: 2,
            percentage_leaves_threshold: 100,
            policy: SubsecretPolicy::default(),
            hints: None,
            anonymity_set_size: trustees,
            placement: Placement::default(),
            mode: RecoveryMode::default(),
        }
    }

    /// Sets the number of subsecrets
    pub fn with_subsecrets(mut self, subsecrets: usize) -> Result<Self> {
        if subsecrets == 0 {
            return Err(ShareError::InvalidConfig(
                "At least one subsecret is required".into(),
            ));
        }
        self.subsecrets = subsecrets;
        Ok(self)
    }

    /// Sets the leaf threshold percentage
    pub fn with_percentage_leaves_threshold(mut self, percentage: u32) -> Result<Self> {
        check_percentage("leaves threshold", percentage)?;
        self.percentage_leaves_threshold = percentage;
        Ok(self)
    }

    /// Sets the subsecret policy
    pub fn with_policy(mut self, policy: SubsecretPolicy) -> Result<Self> {
        if let SubsecretPolicy::Thresholded { percentage } = policy {
            check_percentage("subsecrets threshold", percentage)?;
        }
        self.policy = policy;
        Ok(self)
    }

    /// Enables the hint layer
    pub fn with_hints(mut self, hints: usize, threshold: usize) -> Result<Self> {
        let hint = HintConfig { hints, threshold };
        check_hints(&hint, self.trustees)?;
        self.hints = Some(hint);
        Ok(self)
    }

    /// Sets the anonymity set size
    pub fn with_anonymity_set_size(mut self, size: usize) -> Self {
        self.anonymity_set_size = size;
        self
    }

    /// Sets the placement of real packets
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Sets the recovery mode
    pub fn with_mode(mut self, mode: RecoveryMode) -> Self {
        self.mode = mode;
        self
    }

    /// Leaf shares generated per subsecret
    pub fn shares_per_subsecret(&self) -> usize {
        shares_per_subsecret(self.absolute_threshold, self.percentage_leaves_threshold)
    }

    /// Total number of leaf shares handed out
    pub fn total_shares(&self) -> usize {
        self.shares_per_subsecret() * self.subsecrets
    }

    /// Upper-layer threshold for the thresholded policy
    pub fn subsecret_threshold(&self) -> Option<usize> {
        match self.policy {
            SubsecretPolicy::Additive => None,
            SubsecretPolicy::Thresholded { percentage } => {
                Some(subsecret_threshold(self.subsecrets, percentage))
            }
        }
    }

    /// Largest number of leaf shares any trustee receives
    pub fn max_shares_per_person(&self) -> usize {
        if self.trustees == 0 {
            return 0;
        }
        self.total_shares().div_ceil(self.trustees).max(1)
    }

    /// Checks the parameters that splitting depends on
    pub fn validate_split(&self) -> Result<()> {
        if self.trustees == 0 {
            return Err(ShareError::InvalidTrustees(self.trustees));
        }
        if self.absolute_threshold == 0 {
            return Err(ShareError::InvalidThreshold(self.absolute_threshold));
        }
        if self.subsecrets == 0 {
            return Err(ShareError::InvalidConfig(
                "At least one subsecret is required".into(),
            ));
        }
        check_percentage("leaves threshold", self.percentage_leaves_threshold)?;
        if let SubsecretPolicy::Thresholded { percentage } = self.policy {
            check_percentage("subsecrets threshold", percentage)?;
        }
        Ok(())
    }

    /// Validates the full configuration, including packaging and recovery parameters
    pub fn validate(&self) -> Result<()> {
        self.validate_split()?;
        if self.absolute_threshold > self.trustees {
            return Err(ShareError::ThresholdExceedsTrustees {
                threshold: self.absolute_threshold,
                trustees: self.trustees,
            });
        }
        if let Some(hint) = &self.hints {
            check_hints(hint, self.trustees)?;
        }
        if self.anonymity_set_size < self.trustees {
            return Err(ShareError::AnonymitySetTooSmall {
                size: self.anonymity_set_size,
                trustees: self.trustees,
            });
        }
        self.mode.validate()
    }

    /// What a recovering user needs to know about this configuration
    pub fn recovery_params(&self) -> RecoveryParams {
        RecoveryParams {
            absolute_threshold: self.absolute_threshold,
            hint_threshold: self.hints.map(|hint| hint.threshold),
            max_queries: None,
            mode: self.mode,
        }
    }
}

impl RecoveryMode {
    pub fn validate(&self) -> Result<()> {
        if let Self::Parallel { workers: 0 } = self {
            return Err(ShareError::InvalidConfig(
                "Parallel recovery needs at least one worker".into(),
            ));
        }
        Ok(())
    }
}

/// Knowledge available to the party performing recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryParams {
    /// Leaf threshold t
    pub absolute_threshold: usize,
    /// Hint threshold, when the set carries a hint layer
    pub hint_threshold: Option<usize>,
    /// Stop after this many entries even if the secret is not found
    pub max_queries: Option<usize>,
    /// Candidate evaluation mode
    pub mode: RecoveryMode,
}

impl RecoveryParams {
    pub fn new(absolute_threshold: usize) -> Self {
        Self {
            absolute_threshold,
            hint_threshold: None,
            max_queries: None,
            mode: RecoveryMode::default(),
        }
    }

    pub fn with_hint_threshold(mut self, threshold: usize) -> Self {
        self.hint_threshold = Some(threshold);
        self
    }

    pub fn with_max_queries(mut self, max_queries: usize) -> Self {
        self.max_queries = Some(max_queries);
        self
    }

    pub fn with_mode(mut self, mode: RecoveryMode) -> Self {
        self.mode = mode;
        self
    }
}

/// `floor(100 * threshold / percentage)`
pub(crate) fn shares_per_subsecret(threshold: usize, percentage: u32) -> usize {
    if percentage == 0 {
        return 0;
    }
    (100 * threshold) / percentage as usize
}

/// `ceil(percentage * subsecrets / 100)`
pub(crate) fn subsecret_threshold(subsecrets: usize, percentage: u32) -> usize {
    (percentage as usize * subsecrets).div_ceil(100)
}

fn check_percentage(name: &'static str, value: u32) -> Result<()> {
    if value == 0 || value > 100 {
        return Err(ShareError::InvalidPercentage { name, value });
    }
    Ok(())
}

fn check_hints(hint: &HintConfig, trustees: usize) -> Result<()> {
    if hint.threshold == 0 || hint.threshold > hint.hints || hint.hints > trustees {
        return Err(ShareError::InvalidHints {
            hints: hint.hints,
            threshold: hint.threshold,
            trustees,
        });
    }
    Ok(())
}
