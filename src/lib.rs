pub mod classifier;
pub mod config;
pub mod error;
pub mod features;
pub mod service;
pub mod store;

pub use classifier::{Classifier, ForestModel, Label};
pub use config::Config;
pub use error::{ClassifyError, Result};
pub use features::UrlFeatures;
pub use service::ClassificationService;
pub use store::{DecisionRecord, DecisionStore};
