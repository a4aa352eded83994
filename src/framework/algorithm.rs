//! Named collaborator presets.

use core::fmt;
use core::str::FromStr;

use crate::error::Error;

/// A preset choosing the acquisition and selection of a run.
///
/// Every preset uses the GP surrogate and the NSGA-II solver.
///
/// | Preset | Acquisition | Selection |
/// |--------|-------------|-----------|
/// | `hv-lcb` | [`LcbAcquisition`](crate::acquisition::LcbAcquisition) | [`HypervolumeImprovementSelection`](crate::selection::HypervolumeImprovementSelection) |
/// | `hv-mean` | [`IdentityAcquisition`](crate::acquisition::IdentityAcquisition) | [`HypervolumeImprovementSelection`](crate::selection::HypervolumeImprovementSelection) |
/// | `random-mean` | [`IdentityAcquisition`](crate::acquisition::IdentityAcquisition) | [`RandomSelection`](crate::selection::RandomSelection) |
///
/// ```
/// use mobo::framework::Algorithm;
///
/// let algo: Algorithm = "hv-lcb".parse().unwrap();
/// assert_eq!(algo, Algorithm::HvLcb);
/// assert!("qnehvi".parse::<Algorithm>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Algorithm {
    /// Lower confidence bound with greedy hypervolume selection.
    HvLcb,
    /// Predicted mean with greedy hypervolume selection.
    #[default]
    HvMean,
    /// Predicted mean with random selection from the candidate set.
    RandomMean,
}

impl Algorithm {
    /// All presets.
    pub const ALL: [Self; 3] = [Self::HvLcb, Self::HvMean, Self::RandomMean];

    /// The preset's name as accepted by [`FromStr`].
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::HvLcb => "hv-lcb",
            Self::HvMean => "hv-mean",
            Self::RandomMean => "random-mean",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|a| a.name() == wanted)
            .ok_or_else(|| Error::UnknownAlgorithm(s.to_string()))
    }
}
