//! Model specs: one per model choice in a multiverse run.

use crate::error::ConfigError;
use crate::estimator::Regressor;
use crate::params::SearchSpace;

/// Identifier, base estimator, search space and search mode for one model
/// choice. Immutable once built.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    name: String,
    estimator: Box<dyn Regressor>,
    space: SearchSpace,
    bayes_opt: bool,
}

impl ModelSpec {
    /// Fails if the space is malformed, or if grid search is requested over a
    /// space with continuous ranges.
    pub fn new(
        name: impl Into<String>,
        estimator: Box<dyn Regressor>,
        space: SearchSpace,
        bayes_opt: bool,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigError::InvalidSetting("model name is empty".into()));
        }
        space.validate()?;
        if !bayes_opt && space.grid_size().is_none() {
            return Err(ConfigError::MalformedSearchSpace(format!(
                "{name}: grid search needs discrete candidate sets"
            )));
        }
        Ok(Self {
            name,
            estimator,
            space,
            bayes_opt,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn estimator(&self) -> &dyn Regressor {
        self.estimator.as_ref()
    }

    pub fn space(&self) -> &SearchSpace {
        &self.space
    }

    pub fn bayes_opt(&self) -> bool {
        self.bayes_opt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::ElasticNet;

    #[test]
    fn grid_spec_needs_discrete_space() {
        let space = SearchSpace::new().float("alpha", 0.0, 1.0);
        assert!(ModelSpec::new("en", Box::new(ElasticNet::default()), space.clone(), false).is_err());
        assert!(ModelSpec::new("en", Box::new(ElasticNet::default()), space, true).is_ok());
    }

    #[test]
    fn blank_name_rejected() {
        let spec = ModelSpec::new(" ", Box::new(ElasticNet::default()), SearchSpace::new(), false);
        assert!(matches!(spec, Err(ConfigError::InvalidSetting(_))));
    }
}
