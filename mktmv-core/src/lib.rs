//! mktmv core: the building blocks of a multiverse analysis.
//!
//! - Feature groups and their combinations
//! - Feature transform stages (column selection, sentiment/topic extraction,
//!   one-hot encoding, sparse conversion) and the pipeline assembler
//! - Capability traits for the external sentiment and topic models
//! - Regressors behind a common fit/predict contract
//! - Hyperparameter search (grid and sequential Bayesian) with k-fold CV

pub mod assembler;
pub mod capability;
pub mod error;
pub mod estimator;
pub mod feature_group;
pub mod frame;
pub mod model_spec;
pub mod params;
pub mod search;
pub mod transform;

pub use assembler::{assemble, assemble_named, AssembledPipeline, ExtractorHandles};
pub use error::{
    CapabilityError, ConfigError, ModelError, MultiverseError, SchemaError, SearchFailure,
    TransformError,
};
pub use feature_group::{Combination, FeatureGroup};
pub use model_spec::ModelSpec;
pub use params::{Distribution, ParamSet, ParamValue, SearchSpace};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types shared across worker threads are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<FeatureGroup>();
        require_sync::<FeatureGroup>();
        require_send::<Combination>();
        require_sync::<Combination>();
        require_send::<SearchSpace>();
        require_sync::<SearchSpace>();
        require_send::<ModelSpec>();
        require_sync::<ModelSpec>();
        require_send::<ExtractorHandles>();
        require_sync::<ExtractorHandles>();
        require_send::<AssembledPipeline>();
        require_sync::<AssembledPipeline>();
        require_send::<search::SearchResult>();
        require_sync::<search::SearchResult>();
        require_send::<search::SearchSettings>();
        require_sync::<search::SearchSettings>();
        require_send::<transform::CsrMatrix>();
        require_sync::<transform::CsrMatrix>();
        require_send::<MultiverseError>();
        require_sync::<MultiverseError>();
    }

    /// The extractor stages only see text columns through the capability
    /// traits, so any `Send + Sync` model can be injected.
    #[test]
    fn capability_traits_are_object_safe() {
        fn _sentiment(_: &dyn capability::SentimentModel) {}
        fn _topic(_: &dyn capability::TopicModel) {}
        fn _regressor(_: &dyn estimator::Regressor) {}
        fn _stage(_: &dyn transform::FeatureTransform) {}
    }
}
