//! Biased matrix-factorisation model loaded from a JSON artifact.
//!
//! ## Prediction rule
//! `est = mu + b_u + b_i + q_i . p_u`
//!
//! - an unknown user contributes neither `b_u` nor `p_u`
//! - an unknown movie contributes neither `b_i` nor `q_i`
//! - the dot product only applies when both are known
//! - the result is clipped to the artifact's rating scale
//!
//! A `baseline` artifact is the same rule with zero latent factors.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use data_loader::{MovieId, UserId};

use crate::{ModelError, Prediction, Recommender};

/// Which family of model the artifact holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Biases plus latent factors
    Svd,
    /// Biases only
    Baseline,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Svd => "svd",
            Algorithm::Baseline => "baseline",
        }
    }
}

/// Learned parameters for one user or one movie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatentEntry {
    pub id: u32,
    pub bias: f32,
    #[serde(default)]
    pub factors: Vec<f32>,
}

/// On-disk layout of a trained model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub algorithm: Algorithm,
    pub global_mean: f32,
    /// (lowest, highest) rating the estimate is clipped to
    pub rating_scale: (f32, f32),
    #[serde(default)]
    pub n_factors: usize,
    #[serde(default)]
    pub users: Vec<LatentEntry>,
    #[serde(default)]
    pub items: Vec<LatentEntry>,
}

#[derive(Debug, Clone)]
struct Latent {
    bias: f32,
    factors: Vec<f32>,
}

/// A loaded, validated model. Read-only after construction.
#[derive(Debug, Clone)]
pub struct FactorModel {
    algorithm: Algorithm,
    global_mean: f32,
    rating_scale: (f32, f32),
    n_factors: usize,
    users: HashMap<UserId, Latent>,
    items: HashMap<MovieId, Latent>,
}

impl FactorModel {
    /// Read and validate a model artifact from disk.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ModelError::ArtifactNotFound {
                path: path.display().to_string(),
            },
            _ => ModelError::Io(e),
        })?;
        let artifact: ModelArtifact = serde_json::from_reader(BufReader::new(file))?;
        let model = Self::from_artifact(artifact)?;

        info!(
            path = %path.display(),
            algorithm = model.algorithm.as_str(),
            users = model.users.len(),
            items = model.items.len(),
            n_factors = model.n_factors,
            "Loaded recommendation model"
        );
        Ok(model)
    }

    /// Validate an in-memory artifact and index it by id.
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        let (low, high) = artifact.rating_scale;
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(ModelError::InvalidArtifact(format!(
                "rating_scale must be two finite values with low < high, got [{low}, {high}]"
            )));
        }
        if !artifact.global_mean.is_finite() {
            return Err(ModelError::InvalidArtifact(
                "global_mean is not finite".to_string(),
            ));
        }
        if artifact.algorithm == Algorithm::Baseline && artifact.n_factors != 0 {
            return Err(ModelError::InvalidArtifact(format!(
                "baseline model must have n_factors = 0, got {}",
                artifact.n_factors
            )));
        }

        let users = index_entries("user", artifact.users, artifact.n_factors)?;
        let items = index_entries("item", artifact.items, artifact.n_factors)?;

        Ok(Self {
            algorithm: artifact.algorithm,
            global_mean: artifact.global_mean,
            rating_scale: artifact.rating_scale,
            n_factors: artifact.n_factors,
            users,
            items,
        })
    }

    /// Apply the prediction rule from the module docs
    pub fn estimate(&self, user_id: UserId, movie_id: MovieId) -> f32 {
        let user = self.users.get(&user_id);
        let item = self.items.get(&movie_id);

        let mut est = self.global_mean;
        if let Some(user) = user {
            est += user.bias;
        }
        if let Some(item) = item {
            est += item.bias;
        }
        if let (Some(user), Some(item)) = (user, item) {
            est += dot(&user.factors, &item.factors);
        }

        let (low, high) = self.rating_scale;
        est.clamp(low, high)
    }
}

impl Recommender for FactorModel {
    fn name(&self) -> &str {
        self.algorithm.as_str()
    }

    fn predict(&self, user_id: UserId, movie_id: MovieId) -> Result<Prediction, ModelError> {
        Ok(Prediction {
            user_id,
            movie_id,
            estimate: self.estimate(user_id, movie_id),
        })
    }
}

fn index_entries(
    kind: &str,
    entries: Vec<LatentEntry>,
    n_factors: usize,
) -> Result<HashMap<u32, Latent>, ModelError> {
    let mut indexed = HashMap::with_capacity(entries.len());
    for entry in entries {
        if !entry.bias.is_finite() || entry.factors.iter().any(|f| !f.is_finite()) {
            return Err(ModelError::InvalidArtifact(format!(
                "{kind} {} has non-finite parameters",
                entry.id
            )));
        }
        if entry.factors.len() != n_factors {
            return Err(ModelError::InvalidArtifact(format!(
                "{kind} {} has {} factors, expected {}",
                entry.id,
                entry.factors.len(),
                n_factors
            )));
        }
        let id = entry.id;
        let latent = Latent {
            bias: entry.bias,
            factors: entry.factors,
        };
        if indexed.insert(id, latent).is_some() {
            return Err(ModelError::InvalidArtifact(format!("duplicate {kind} id {id}")));
        }
    }
    Ok(indexed)
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
