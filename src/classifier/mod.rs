//! Classifier adapter.
//!
//! The pipeline only depends on [`Classifier`]; any offline-trained model that
//! maps a five-feature vector to a raw 0/1 prediction can sit behind it.

pub mod forest;

use crate::error::{ClassifyError, Result};
use crate::features::FeatureVector;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use forest::ForestModel;

/// Binary classifier over the URL feature layout.
///
/// Implementations hold read-only state after loading and are shared across
/// concurrent callers without locking.
pub trait Classifier: Send + Sync {
    /// Raw prediction. Well-behaved models only return 0 or 1.
    fn predict(&self, features: &FeatureVector) -> i64;
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Legitimate,
    Phishing,
}

impl Label {
    /// Map a raw classifier output: `1` is phishing, `0` is legitimate.
    pub fn from_prediction(raw: i64) -> Result<Self> {
        match raw {
            0 => Ok(Label::Legitimate),
            1 => Ok(Label::Phishing),
            other => Err(ClassifyError::InvalidPrediction(other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Legitimate => "Legitimate",
            Label::Phishing => "Phishing",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Legitimate" => Some(Label::Legitimate),
            "Phishing" => Some(Label::Phishing),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for Label {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Label {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Label::parse(text).ok_or_else(|| {
            FromSqlError::Other(format!("unknown prediction label: {text}").into())
        })
    }
}
