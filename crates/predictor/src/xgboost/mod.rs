//! Inference over gradient-boosted tree ensembles saved with XGBoost's `save_model("*.json")`.

use std::{fs, path::Path};

use tracing::info;

use crate::{Predictor, PredictorError};

mod format;

use format::{GradientBooster, ModelFile, TreeJson};

/// How the summed margin is turned into the model's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputLink {
    Identity,
    Sigmoid,
    Exp,
}

impl OutputLink {
    fn from_objective(name: &str) -> Result<Self, PredictorError> {
        match name {
            "reg:squarederror" | "reg:linear" | "reg:absoluteerror" | "reg:pseudohubererror"
            | "reg:squaredlogerror" | "reg:quantileerror" | "binary:logitraw" => {
                Ok(Self::Identity)
            }
            "reg:logistic" | "binary:logistic" => Ok(Self::Sigmoid),
            "count:poisson" | "reg:gamma" | "reg:tweedie" => Ok(Self::Exp),
            other => Err(PredictorError::UnsupportedObjective(other.to_string())),
        }
    }

    /// base_score is stored in output space; trees add to it in margin space.
    fn to_margin(self, base_score: f32) -> f32 {
        match self {
            Self::Identity => base_score,
            Self::Sigmoid => {
                let p = base_score.clamp(1e-7, 1.0 - 1e-7);
                (p / (1.0 - p)).ln()
            }
            Self::Exp => base_score.max(1e-7).ln(),
        }
    }

    fn apply(self, margin: f32) -> f32 {
        match self {
            Self::Identity => margin,
            Self::Sigmoid => 1.0 / (1.0 + (-margin).exp()),
            Self::Exp => margin.exp(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Split {
        feature: usize,
        threshold: f32,
        default_left: bool,
        left: usize,
        right: usize,
    },
    Leaf(f32),
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn leaf_value(&self, row: &[f32]) -> f32 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    default_left,
                    left,
                    right,
                } => {
                    let value = row[feature];
                    idx = if value.is_nan() {
                        if default_left {
                            left
                        } else {
                            right
                        }
                    } else if value < threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// A validated single-output tree ensemble. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct XgboostModel {
    trees: Vec<Tree>,
    tree_weights: Vec<f32>,
    base_margin: f32,
    link: OutputLink,
    num_features: usize,
    feature_names: Vec<String>,
}

impl XgboostModel {
    pub fn from_path(path: &Path) -> Result<Self, PredictorError> {
        let raw = fs::read_to_string(path).map_err(|source| PredictorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_json_str(&raw)?;
        info!(
            path = %path.display(),
            trees = model.num_trees(),
            features = model.num_features(),
            feature_names = ?model.feature_names,
            "loaded xgboost model"
        );
        Ok(model)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, PredictorError> {
        let file: ModelFile = serde_json::from_str(raw)?;
        Self::from_model_file(file)
    }

    fn from_model_file(file: ModelFile) -> Result<Self, PredictorError> {
        let learner = file.learner;
        let params = learner.learner_model_param;

        let link = OutputLink::from_objective(&learner.objective.name)?;
        if params.num_class > 1 {
            return Err(PredictorError::UnsupportedObjective(format!(
                "{} with {} classes",
                learner.objective.name, params.num_class
            )));
        }

        let (raw_trees, weight_drop) = match learner.gradient_booster {
            GradientBooster::Gbtree { model } => (model.trees, Vec::new()),
            GradientBooster::Dart {
                gbtree,
                weight_drop,
            } => (gbtree.model.trees, weight_drop),
            GradientBooster::Gblinear {} => {
                return Err(PredictorError::UnsupportedBooster("gblinear".to_string()))
            }
        };

        let trees = raw_trees
            .iter()
            .enumerate()
            .map(|(idx, tree)| convert_tree(tree, idx, params.num_feature))
            .collect::<Result<Vec<_>, _>>()?;
        let tree_weights = (0..trees.len())
            .map(|idx| weight_drop.get(idx).copied().unwrap_or(1.0))
            .collect();

        Ok(Self {
            trees,
            tree_weights,
            base_margin: link.to_margin(params.base_score),
            link,
            num_features: params.num_feature,
            feature_names: learner.feature_names,
        })
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    fn predict_row(&self, row: &[f32]) -> Result<f32, PredictorError> {
        if row.len() != self.num_features {
            return Err(PredictorError::FeatureCount {
                expected: self.num_features,
                actual: row.len(),
            });
        }
        let margin = self
            .trees
            .iter()
            .zip(&self.tree_weights)
            .fold(self.base_margin, |acc, (tree, weight)| {
                acc + weight * tree.leaf_value(row)
            });
        Ok(self.link.apply(margin))
    }
}

impl Predictor for XgboostModel {
    fn predict(&self, rows: &[Vec<f32>]) -> Result<Vec<f32>, PredictorError> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }
}

fn convert_tree(raw: &TreeJson, tree: usize, num_features: usize) -> Result<Tree, PredictorError> {
    let invalid = |reason: String| PredictorError::InvalidTree { tree, reason };

    let num_nodes = raw.tree_param.num_nodes;
    if num_nodes == 0 {
        return Err(invalid("tree has no nodes".to_string()));
    }
    let lengths = [
        raw.left_children.len(),
        raw.right_children.len(),
        raw.split_indices.len(),
        raw.split_conditions.len(),
        raw.default_left.len(),
    ];
    if lengths.iter().any(|len| *len != num_nodes) {
        return Err(invalid(format!(
            "node arrays have lengths {lengths:?} but num_nodes is {num_nodes}"
        )));
    }

    let child_index = |node: usize, child: i32| -> Result<usize, PredictorError> {
        usize::try_from(child)
            .ok()
            .filter(|c| *c != node && *c < num_nodes)
            .ok_or_else(|| {
                invalid(format!(
                    "node {node} references child {child} but the tree has {num_nodes} nodes"
                ))
            })
    };

    let mut nodes = Vec::with_capacity(num_nodes);
    for node in 0..num_nodes {
        if raw.left_children[node] == -1 {
            nodes.push(Node::Leaf(raw.split_conditions[node]));
            continue;
        }
        if raw.split_type.get(node).copied().unwrap_or(0) != 0 {
            return Err(invalid(format!(
                "node {node} uses a categorical split, which is not supported"
            )));
        }
        let feature = usize::try_from(raw.split_indices[node])
            .ok()
            .filter(|f| *f < num_features)
            .ok_or_else(|| {
                invalid(format!(
                    "node {node} splits on feature {} but the model has {num_features}",
                    raw.split_indices[node]
                ))
            })?;
        nodes.push(Node::Split {
            feature,
            threshold: raw.split_conditions[node],
            default_left: raw.default_left[node],
            left: child_index(node, raw.left_children[node])?,
            right: child_index(node, raw.right_children[node])?,
        });
    }

    ensure_acyclic(&nodes).map_err(|reason| invalid(reason))?;
    Ok(Tree { nodes })
}

/// Walks every path from the root; each node may be reached at most once.
/// Unreachable slots (deleted nodes) are left alone.
fn ensure_acyclic(nodes: &[Node]) -> Result<(), String> {
    let mut seen = vec![false; nodes.len()];
    let mut stack = vec![0usize];
    while let Some(idx) = stack.pop() {
        if seen[idx] {
            return Err(format!("node {idx} is reached more than once from the root"));
        }
        seen[idx] = true;
        if let Node::Split { left, right, .. } = nodes[idx] {
            stack.push(left);
            stack.push(right);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/model_tests.rs"]
mod tests;
