//! Feature groups and combinations.
//!
//! A feature group is a named bundle of dataset columns, optionally paired with
//! an extraction stage. The set of groups is closed: an unknown name is a
//! [`ConfigError`] at parse time, never a silent no-op during assembly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Source text column for topic extraction.
pub const THEME_SOURCE_COLUMN: &str = "theme_sub";
/// Categorical column produced by topic extraction.
pub const THEME_COLUMN: &str = "theme";
/// Source text column for sentiment extraction.
pub const HEADLINE_COLUMN: &str = "headline";
/// Categorical column produced by sentiment extraction.
pub const SENTIMENT_COLUMN: &str = "sentiment";
/// Lagged index t-score columns consumed as-is.
pub const AUTOCORR_COLUMNS: [&str; 3] = [
    "spy_tscore_c2c_lag_1",
    "spy_tscore_c2c_lag_2",
    "spy_tscore_c2c_lag_3",
];

/// One predefined feature group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FeatureGroup {
    /// News theme, via topic extraction on `theme_sub`.
    NewsTheme,
    /// Headline sentiment, via sentiment classification on `headline`.
    Sentiment,
    /// Autocorrelation features: three lagged t-scores.
    Autocorrs,
}

impl FeatureGroup {
    pub const ALL: [FeatureGroup; 3] = [Self::NewsTheme, Self::Sentiment, Self::Autocorrs];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewsTheme => "newstheme",
            Self::Sentiment => "sentiment",
            Self::Autocorrs => "autocorrs",
        }
    }

    /// Raw dataset columns this group consumes.
    pub fn source_columns(&self) -> Vec<&'static str> {
        match self {
            Self::NewsTheme => vec![THEME_SOURCE_COLUMN],
            Self::Sentiment => vec![HEADLINE_COLUMN],
            Self::Autocorrs => AUTOCORR_COLUMNS.to_vec(),
        }
    }

    /// Categorical column this group emits for one-hot encoding, if any.
    pub fn encoded_column(&self) -> Option<&'static str> {
        match self {
            Self::NewsTheme => Some(THEME_COLUMN),
            Self::Sentiment => Some(SENTIMENT_COLUMN),
            Self::Autocorrs => None,
        }
    }
}

impl fmt::Display for FeatureGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureGroup {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newstheme" => Ok(Self::NewsTheme),
            "sentiment" => Ok(Self::Sentiment),
            "autocorrs" => Ok(Self::Autocorrs),
            other => Err(ConfigError::UnknownFeatureGroup(other.to_string())),
        }
    }
}

impl TryFrom<String> for FeatureGroup {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FeatureGroup> for String {
    fn from(group: FeatureGroup) -> Self {
        group.as_str().to_string()
    }
}

/// Ordered, non-empty set of distinct feature groups tested together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<FeatureGroup>", into = "Vec<FeatureGroup>")]
pub struct Combination {
    groups: Vec<FeatureGroup>,
}

impl Combination {
    pub fn new(groups: Vec<FeatureGroup>) -> Result<Self, ConfigError> {
        if groups.is_empty() {
            return Err(ConfigError::EmptyCombination);
        }
        for (i, group) in groups.iter().enumerate() {
            if groups[..i].contains(group) {
                return Err(ConfigError::DuplicateGroup(group.to_string()));
            }
        }
        Ok(Self { groups })
    }

    /// Parse group names in order. Any unknown name fails the whole combination.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, ConfigError> {
        let groups = names
            .iter()
            .map(|n| n.as_ref().parse())
            .collect::<Result<Vec<FeatureGroup>, _>>()?;
        Self::new(groups)
    }

    pub fn groups(&self) -> &[FeatureGroup] {
        &self.groups
    }

    pub fn contains(&self, group: FeatureGroup) -> bool {
        self.groups.contains(&group)
    }

    /// Label used in result records, e.g. `[newstheme, sentiment]`.
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Every non-empty subset of the three groups, smallest first.
    pub fn all_non_empty() -> Vec<Combination> {
        let mut combos = Vec::new();
        for size in 1..=FeatureGroup::ALL.len() {
            for mask in 1u8..(1 << FeatureGroup::ALL.len()) {
                if mask.count_ones() as usize != size {
                    continue;
                }
                let groups: Vec<FeatureGroup> = FeatureGroup::ALL
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, g)| *g)
                    .collect();
                combos.push(Self { groups });
            }
        }
        combos
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.groups.iter().map(|g| g.as_str()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

impl TryFrom<Vec<FeatureGroup>> for Combination {
    type Error = ConfigError;

    fn try_from(groups: Vec<FeatureGroup>) -> Result<Self, Self::Error> {
        Self::new(groups)
    }
}

impl From<Combination> for Vec<FeatureGroup> {
    fn from(c: Combination) -> Self {
        c.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_groups_in_order() {
        let c = Combination::parse(&["sentiment", "autocorrs"]).unwrap();
        assert_eq!(c.groups(), &[FeatureGroup::Sentiment, FeatureGroup::Autocorrs]);
        assert_eq!(c.label(), "[sentiment, autocorrs]");
    }

    #[test]
    fn unknown_group_is_config_error() {
        assert_eq!(
            Combination::parse(&["autocorrs", "bogus"]),
            Err(ConfigError::UnknownFeatureGroup("bogus".into()))
        );
    }

    #[test]
    fn empty_and_duplicate_combinations_rejected() {
        let empty: [&str; 0] = [];
        assert_eq!(Combination::parse(&empty), Err(ConfigError::EmptyCombination));
        assert_eq!(
            Combination::parse(&["sentiment", "sentiment"]),
            Err(ConfigError::DuplicateGroup("sentiment".into()))
        );
    }

    #[test]
    fn all_non_empty_has_seven_combinations() {
        let all = Combination::all_non_empty();
        assert_eq!(all.len(), 7);
        assert_eq!(all[0].groups().len(), 1);
        assert_eq!(all[6].groups().len(), 3);
    }

    #[test]
    fn serde_uses_group_names() {
        let c = Combination::parse(&["newstheme", "autocorrs"]).unwrap();
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"["newstheme","autocorrs"]"#);
        let back: Combination = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
        assert!(serde_json::from_str::<Combination>(r#"["bogus"]"#).is_err());
    }
}
