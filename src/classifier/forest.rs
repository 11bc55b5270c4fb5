//! Decision tree ensemble loaded from a JSON artifact.
//!
//! Artifact layout:
//!
//! ```json
//! {
//!   "n_features": 5,
//!   "feature_names": ["url_length", "has_at_symbol", "is_https", "has_ip_literal", "dot_count"],
//!   "trees": [
//!     { "nodes": [
//!         { "split": { "feature": 3, "threshold": 0.5, "left": 1, "right": 2 } },
//!         { "leaf": { "class": 0 } },
//!         { "leaf": { "class": 1 } }
//!     ] }
//!   ]
//! }
//! ```
//!
//! Node 0 is the root. Samples go left when `value <= threshold`.

use super::Classifier;
use crate::error::{ClassifyError, Result};
use crate::features::{FeatureVector, FEATURE_COUNT, FEATURE_LAYOUT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: i64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk from the root to a leaf. Assumes the tree passed [`DecisionTree::validate`].
    fn predict(&self, features: &FeatureVector) -> i64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { class } => return *class,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Children must point forward so every walk terminates.
    fn validate(&self) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } = node
            {
                if *feature >= FEATURE_COUNT {
                    return Err(format!("node {index} splits on unknown feature {feature}"));
                }
                if threshold.is_nan() {
                    return Err(format!("node {index} has a NaN threshold"));
                }
                for child in [*left, *right] {
                    if child <= index || child >= self.nodes.len() {
                        return Err(format!("node {index} has invalid child {child}"));
                    }
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub n_features: usize,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub trees: Vec<DecisionTree>,
}

/// Majority-vote ensemble of decision trees.
#[derive(Debug, Clone)]
pub struct ForestModel {
    name: String,
    trees: Vec<DecisionTree>,
}

impl ForestModel {
    /// Load and validate an artifact. Any problem is reported as `ModelUnavailable`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        log::info!("Loading classifier model from: {display}");

        if !path.exists() {
            return Err(ClassifyError::model_unavailable(&display, "file not found"));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ClassifyError::model_unavailable(&display, e))?;
        let artifact: ModelArtifact = serde_json::from_str(&content)
            .map_err(|e| ClassifyError::model_unavailable(&display, e))?;

        let model = Self::from_artifact(display.clone(), artifact)
            .map_err(|reason| ClassifyError::model_unavailable(&display, reason))?;

        log::info!(
            "Classifier model loaded: {} trees over {} features",
            model.tree_count(),
            FEATURE_COUNT
        );
        Ok(model)
    }

    pub fn from_artifact(
        name: String,
        artifact: ModelArtifact,
    ) -> std::result::Result<Self, String> {
        if artifact.n_features != FEATURE_COUNT {
            return Err(format!(
                "model expects {} features, pipeline produces {}",
                artifact.n_features, FEATURE_COUNT
            ));
        }

        if let Some(names) = &artifact.feature_names {
            if names.iter().map(String::as_str).ne(FEATURE_LAYOUT.iter().copied()) {
                return Err(format!(
                    "feature layout mismatch: model has {:?}, pipeline has {:?}",
                    names, FEATURE_LAYOUT
                ));
            }
        }

        if artifact.trees.is_empty() {
            return Err("model contains no trees".to_string());
        }

        for (index, tree) in artifact.trees.iter().enumerate() {
            tree.validate().map_err(|e| format!("tree {index}: {e}"))?;
        }

        Ok(Self {
            name,
            trees: artifact.trees,
        })
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for ForestModel {
    fn predict(&self, features: &FeatureVector) -> i64 {
        let mut votes: BTreeMap<i64, usize> = BTreeMap::new();
        for tree in &self.trees {
            *votes.entry(tree.predict(features)).or_insert(0) += 1;
        }

        // Ascending iteration plus strict comparison keeps the smallest class on ties.
        let mut best = (0, 0);
        for (class, count) in votes {
            if count > best.1 {
                best = (class, count);
            }
        }
        best.0
    }

    fn name(&self) -> &str {
        &self.name
    }
}
