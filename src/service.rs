//! Classification service: extract, predict, persist.

use crate::classifier::{Classifier, Label};
use crate::error::{ClassifyError, Result};
use crate::features::UrlFeatures;
use crate::store::{DecisionRecord, DecisionStore};
use chrono::{Local, NaiveDateTime};
use std::sync::Arc;

pub struct ClassificationService {
    classifier: Arc<dyn Classifier>,
    store: DecisionStore,
}

impl ClassificationService {
    pub fn new(classifier: Arc<dyn Classifier>, store: DecisionStore) -> Self {
        Self { classifier, store }
    }

    /// Classify a URL and record the decision with the current local time.
    pub fn classify(&self, raw_url: &str) -> Result<Label> {
        self.classify_at(raw_url, Local::now().naive_local())
    }

    /// Same as [`classify`](Self::classify) with an explicit timestamp.
    ///
    /// A label is only returned once its record is stored. The stored
    /// timestamp keeps whole seconds only.
    pub fn classify_at(&self, raw_url: &str, timestamp: NaiveDateTime) -> Result<Label> {
        let url = raw_url.trim();
        if url.is_empty() {
            log::debug!("Rejected empty URL submission");
            return Err(ClassifyError::EmptyInput);
        }

        let features = UrlFeatures::extract(url);
        let raw = self.classifier.predict(&features.to_vector());
        let label = Label::from_prediction(raw).map_err(|e| {
            log::error!("Classifier {} produced {raw} for {url}", self.classifier.name());
            e
        })?;

        let id = self.store.append(url, label, timestamp)?;
        log::info!("Decision #{id}: {label} for {url}");
        log::debug!("Features for decision #{id}: {features:?}");

        Ok(label)
    }

    pub fn list_all(&self) -> Result<Vec<DecisionRecord>> {
        self.store.list_all()
    }

    pub fn record_count(&self) -> Result<u64> {
        self.store.count()
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }
}
