//! Moderation scale and threshold types.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Ordered likelihood scale returned by image-safety classifiers.
///
/// Ordering follows [`Likelihood::rank`], not declaration order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Likelihood {
    VeryUnlikely,
    Unlikely,
    Possible,
    Likely,
    VeryLikely,
    /// Classifier could not decide, or sent a level we do not know.
    #[default]
    #[serde(other)]
    Unknown,
}

impl Likelihood {
    /// Position on the scale; `Unknown` ranks below everything else.
    pub fn rank(&self) -> u8 {
        match self {
            Likelihood::Unknown => 0,
            Likelihood::VeryUnlikely => 1,
            Likelihood::Unlikely => 2,
            Likelihood::Possible => 3,
            Likelihood::Likely => 4,
            Likelihood::VeryLikely => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Likelihood::Unknown => "UNKNOWN",
            Likelihood::VeryUnlikely => "VERY_UNLIKELY",
            Likelihood::Unlikely => "UNLIKELY",
            Likelihood::Possible => "POSSIBLE",
            Likelihood::Likely => "LIKELY",
            Likelihood::VeryLikely => "VERY_LIKELY",
        }
    }
}

impl Ord for Likelihood {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Likelihood {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Likelihood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier verdict for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SafetyAnnotation {
    #[serde(default)]
    pub adult: Likelihood,
    #[serde(default)]
    pub violence: Likelihood,
    #[serde(default)]
    pub racy: Likelihood,
}

/// Levels at or above which a category blocks publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockThresholds {
    #[serde(default = "default_adult")]
    pub adult: Likelihood,
    #[serde(default = "default_violence")]
    pub violence: Likelihood,
    #[serde(default = "default_racy")]
    pub racy: Likelihood,
}

fn default_adult() -> Likelihood {
    Likelihood::Likely
}

fn default_violence() -> Likelihood {
    Likelihood::Likely
}

fn default_racy() -> Likelihood {
    Likelihood::VeryLikely
}

impl Default for BlockThresholds {
    fn default() -> Self {
        Self {
            adult: default_adult(),
            violence: default_violence(),
            racy: default_racy(),
        }
    }
}

impl BlockThresholds {
    /// First category whose likelihood meets its threshold, as
    /// `(category, likelihood)`.
    pub fn first_violation(
        &self,
        annotation: &SafetyAnnotation,
    ) -> Option<(&'static str, Likelihood)> {
        [
            ("adult", annotation.adult, self.adult),
            ("violence", annotation.violence, self.violence),
            ("racy", annotation.racy, self.racy),
        ]
        .into_iter()
        .find(|(_, level, threshold)| level >= threshold)
        .map(|(category, level, _)| (category, level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_likelihood_ordering() {
        assert!(Likelihood::Unknown < Likelihood::VeryUnlikely);
        assert!(Likelihood::VeryUnlikely < Likelihood::Unlikely);
        assert!(Likelihood::Unlikely < Likelihood::Possible);
        assert!(Likelihood::Possible < Likelihood::Likely);
        assert!(Likelihood::Likely < Likelihood::VeryLikely);
    }

    #[test]
    fn test_likelihood_deserialize_unknown_values() {
        let l: Likelihood = serde_json::from_str("\"VERY_LIKELY\"").unwrap();
        assert_eq!(l, Likelihood::VeryLikely);
        let l: Likelihood = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(l, Likelihood::Unknown);
        let l: Likelihood = serde_json::from_str("\"UNKNOWN\"").unwrap();
        assert_eq!(l, Likelihood::Unknown);
        assert_eq!(Likelihood::default(), Likelihood::Unknown);
    }

    #[test]
    fn test_unknown_never_meets_a_threshold() {
        let unknown = SafetyAnnotation {
            adult: Likelihood::Unknown,
            violence: Likelihood::Unknown,
            racy: Likelihood::Unknown,
        };
        let strict = BlockThresholds {
            adult: Likelihood::VeryUnlikely,
            violence: Likelihood::VeryUnlikely,
            racy: Likelihood::VeryUnlikely,
        };
        assert!(strict.first_violation(&unknown).is_none());
        assert_eq!(Likelihood::Unknown.max(Likelihood::VeryUnlikely), Likelihood::VeryUnlikely);
    }

    #[test]
    fn test_threshold_meets_or_exceeds() {
        let thresholds = BlockThresholds::default();
        let at_threshold = SafetyAnnotation {
            adult: Likelihood::Likely,
            ..Default::default()
        };
        assert_eq!(
            thresholds.first_violation(&at_threshold),
            Some(("adult", Likelihood::Likely))
        );

        let racy_likely = SafetyAnnotation {
            racy: Likelihood::Likely,
            ..Default::default()
        };
        assert_eq!(thresholds.first_violation(&racy_likely), None);

        let racy_very = SafetyAnnotation {
            racy: Likelihood::VeryLikely,
            ..Default::default()
        };
        assert_eq!(
            thresholds.first_violation(&racy_very),
            Some(("racy", Likelihood::VeryLikely))
        );
    }

    #[test]
    fn test_clean_annotation_passes() {
        let clean = SafetyAnnotation {
            adult: Likelihood::VeryUnlikely,
            violence: Likelihood::Unlikely,
            racy: Likelihood::Possible,
        };
        assert!(BlockThresholds::default().first_violation(&clean).is_none());
    }
}
