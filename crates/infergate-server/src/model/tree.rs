//! Tree-ensemble adapter.
//!
//! Artifact layout (JSON):
//!
//! ```json
//! {"format": "tree-ensemble/v1", "n_features": 4, "trees": [<node>, ...]}
//! ```
//!
//! A node is either `{"kind": "split", "feature": i, "threshold": t,
//! "left": <node>, "right": <node>}` or `{"kind": "leaf", "value": v}`.
//! Samples with `x[feature] <= threshold` descend left. Each tree votes with
//! its leaf value cast to a class id; the majority wins, ties go to the
//! smallest id.

use std::collections::BTreeMap;
use std::fs;

use serde::Deserialize;
use infergate_core::error::{InferError, Result};
use infergate_core::{FeatureVector, Prediction};

use super::{Model, ModelInfo};

pub const FORMAT_TAG: &str = "tree-ensemble/v1";

/// Deeper trees are rejected at load so traversal cost stays bounded.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    /// Walk to the leaf for `x`.
    fn leaf_value(&self, x: &[f64; FeatureVector::ARITY]) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split { feature, threshold, left, right } => {
                    // Feature indices are range-checked at load.
                    node = if x[*feature] <= *threshold { &**left } else { &**right };
                }
            }
        }
    }

    fn check(&self, n_features: usize) -> std::result::Result<(), String> {
        let mut stack: Vec<(&TreeNode, usize)> = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            if depth > MAX_DEPTH {
                return Err(format!("tree deeper than {MAX_DEPTH}"));
            }
            match node {
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err("leaf value must be finite".into());
                    }
                }
                TreeNode::Split { feature, threshold, left, right } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "split feature {feature} out of range (n_features={n_features})"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err("split threshold must be finite".into());
                    }
                    stack.push((&**left, depth + 1));
                    stack.push((&**right, depth + 1));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Artifact {
    format: String,
    n_features: usize,
    trees: Vec<TreeNode>,
}

/// Majority-vote ensemble of decision trees. Immutable after load.
#[derive(Debug)]
pub struct TreeEnsemble {
    trees: Vec<TreeNode>,
}

impl TreeEnsemble {
    pub fn load(path: &str) -> Result<Self> {
        let s = fs::read_to_string(path)
            .map_err(|e| InferError::Startup(format!("read model artifact failed ({path}): {e}")))?;
        Self::from_json(&s)
            .map_err(|e| InferError::Startup(format!("model artifact {path}: {e}")))
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let art: Artifact = serde_json::from_str(s)
            .map_err(|e| InferError::Startup(format!("invalid artifact json: {e}")))?;

        if art.format != FORMAT_TAG {
            return Err(InferError::Startup(format!(
                "unsupported artifact format {:?} (expected {FORMAT_TAG:?})",
                art.format
            )));
        }
        if art.n_features != FeatureVector::ARITY {
            return Err(InferError::Startup(format!(
                "artifact expects {} features, server provides {}",
                art.n_features,
                FeatureVector::ARITY
            )));
        }
        if art.trees.is_empty() {
            return Err(InferError::Startup("artifact has no trees".into()));
        }
        for (i, t) in art.trees.iter().enumerate() {
            t.check(art.n_features)
                .map_err(|e| InferError::Startup(format!("tree {i}: {e}")))?;
        }

        Ok(Self { trees: art.trees })
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }
}

impl Model for TreeEnsemble {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        let x = features.as_array();
        let mut votes: BTreeMap<i64, usize> = BTreeMap::new();
        for t in &self.trees {
            let class = Prediction::from_output(t.leaf_value(&x))?.class();
            *votes.entry(class).or_default() += 1;
        }

        // BTreeMap iterates ascending, so keeping the first max breaks ties low.
        let mut best: Option<(i64, usize)> = None;
        for (class, n) in votes {
            if best.map_or(true, |(_, b)| n > b) {
                best = Some((class, n));
            }
        }
        best.map(|(class, _)| Prediction::new(class))
            .ok_or_else(|| InferError::ModelInvocation("ensemble produced no votes".into()))
    }

    fn describe(&self) -> ModelInfo {
        ModelInfo {
            kind: "tree_ensemble",
            n_features: FeatureVector::ARITY,
            n_estimators: self.trees.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;

    const IRIS: &str = r#"{
        "format": "tree-ensemble/v1",
        "n_features": 4,
        "trees": [{
            "kind": "split", "feature": 2, "threshold": 2.45,
            "left": {"kind": "leaf", "value": 0},
            "right": {
                "kind": "split", "feature": 3, "threshold": 1.75,
                "left": {"kind": "leaf", "value": 1},
                "right": {"kind": "leaf", "value": 2}
            }
        }]
    }"#;

    fn fv(a: f64, b: f64, c: f64, d: f64) -> FeatureVector {
        FeatureVector { sepal_length: a, sepal_width: b, petal_length: c, petal_width: d }
    }

    #[test]
    fn iris_tree_classes() {
        let m = TreeEnsemble::from_json(IRIS).unwrap();
        assert_eq!(m.predict(&fv(5.1, 3.5, 1.4, 0.2)).unwrap().class(), 0);
        assert_eq!(m.predict(&fv(6.4, 3.2, 4.5, 1.5)).unwrap().class(), 1);
        assert_eq!(m.predict(&fv(6.3, 3.3, 6.0, 2.5)).unwrap().class(), 2);
    }

    #[test]
    fn majority_vote_breaks_ties_low() {
        let art = r#"{"format":"tree-ensemble/v1","n_features":4,"trees":[
            {"kind":"leaf","value":2},
            {"kind":"leaf","value":1},
            {"kind":"leaf","value":2.9},
            {"kind":"leaf","value":1}
        ]}"#;
        let m = TreeEnsemble::from_json(art).unwrap();
        assert_eq!(m.predict(&fv(0.0, 0.0, 0.0, 0.0)).unwrap().class(), 1);
        assert_eq!(m.describe().n_estimators, 4);
    }

    #[test]
    fn rejects_bad_artifacts() {
        let cases = [
            r#"{"format":"pickle","n_features":4,"trees":[{"kind":"leaf","value":0}]}"#,
            r#"{"format":"tree-ensemble/v1","n_features":3,"trees":[{"kind":"leaf","value":0}]}"#,
            r#"{"format":"tree-ensemble/v1","n_features":4,"trees":[]}"#,
            r#"{"format":"tree-ensemble/v1","n_features":4,"trees":[{"kind":"split","feature":7,"threshold":1.0,
                "left":{"kind":"leaf","value":0},"right":{"kind":"leaf","value":1}}]}"#,
            r#"{"format":"tree-ensemble/v1","n_features":4,"trees":[{"kind":"leaf"}]}"#,
            "not json",
        ];
        for c in cases {
            let err = TreeEnsemble::from_json(c).expect_err(c);
            assert_eq!(err.client_code().as_str(), "STARTUP");
        }
    }

    #[test]
    fn rejects_too_deep_tree() {
        let mut node = r#"{"kind":"leaf","value":0}"#.to_string();
        for _ in 0..MAX_DEPTH {
            node = format!(
                r#"{{"kind":"split","feature":0,"threshold":1.0,"left":{node},"right":{{"kind":"leaf","value":1}}}}"#
            );
        }
        let art = format!(r#"{{"format":"tree-ensemble/v1","n_features":4,"trees":[{node}]}}"#);
        let err = TreeEnsemble::from_json(&art).unwrap_err();
        assert!(err.to_string().contains("deeper"));
    }

    #[test]
    fn missing_file_is_startup_error() {
        let err = TreeEnsemble::load("/nonexistent/model.json").unwrap_err();
        assert_eq!(err.client_code().as_str(), "STARTUP");
    }
}
