//! CRF model for entity tagging.
//!
//! A structured perceptron over sparse lexical features with a BIO label
//! space and a learned transition matrix, decoded with constrained Viterbi.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use oorandom::Rand32;
use serde::{Deserialize, Serialize};
use tagga_core::{Annotation, TrainingExample};

use crate::bio::BioScheme;
use crate::error::{Result, TrainerError};
use crate::tokenizer::{Token, Tokenizer};
use crate::viterbi::ViterbiDecoder;

/// File holding the model inside a model directory.
pub const MODEL_FILE: &str = "model.json";

/// The narrow contract the trainer needs from a recognizer.
pub trait NerModel {
    /// Registers an entity label. Known labels are ignored.
    fn add_label(&mut self, label: &str);

    fn labels(&self) -> Vec<String>;

    /// Performs one update on `batch`, skipping each input feature with
    /// probability `drop`. Returns the batch loss.
    fn update(&mut self, batch: &[TrainingExample], drop: f32, rng: &mut Rand32) -> f32;

    /// Entities recognized in `text`.
    fn predict(&self, text: &str) -> Vec<Annotation>;

    /// Writes the model into the directory `dir`, which already exists.
    fn save(&self, dir: &Path) -> Result<()>;

    /// Reads a model written by [`NerModel::save`].
    fn load(dir: &Path) -> Result<Self>
    where
        Self: Sized;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrfModel {
    scheme: BioScheme,
    /// Per-feature weight for every tag.
    weights: HashMap<String, Vec<f32>>,
    /// `[from][to]` tag transition scores.
    transitions: Vec<Vec<f32>>,
    #[serde(skip)]
    tokenizer: Tokenizer,
}

impl Default for CrfModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CrfModel {
    /// A model that only knows the `O` tag.
    pub fn new() -> Self {
        Self {
            scheme: BioScheme::new(),
            weights: HashMap::new(),
            transitions: vec![vec![0.0]],
            tokenizer: Tokenizer::new(),
        }
    }

    pub fn num_features(&self) -> usize {
        self.weights.len()
    }

    fn extract_features(tokens: &[Token], i: usize) -> Vec<String> {
        let token = &tokens[i].text;
        let lower = token.to_lowercase();
        let chars: Vec<char> = lower.chars().collect();

        let mut features = vec![
            "bias".to_string(),
            format!("w={lower}"),
            format!("pre3={}", chars.iter().take(3).collect::<String>()),
            format!(
                "suf3={}",
                chars[chars.len().saturating_sub(3)..].iter().collect::<String>()
            ),
            format!("shape={}", shape(token)),
        ];

        if token.chars().next().is_some_and(char::is_uppercase) {
            features.push("is_title".to_string());
        }
        if token.chars().all(|c| !c.is_alphabetic() || c.is_uppercase()) {
            features.push("is_all_caps".to_string());
        }
        if token.chars().any(|c| c.is_ascii_digit()) {
            features.push("has_digit".to_string());
        }

        // Context features
        match i.checked_sub(1).map(|p| &tokens[p]) {
            Some(prev) => features.push(format!("w-1={}", prev.text.to_lowercase())),
            None => features.push("w-1=<s>".to_string()),
        }
        match tokens.get(i + 1) {
            Some(next) => features.push(format!("w+1={}", next.text.to_lowercase())),
            None => features.push("w+1=</s>".to_string()),
        }

        features
    }

    fn emissions(&self, features: &[Vec<String>]) -> Vec<Vec<f32>> {
        let num_tags = self.scheme.num_tags();
        features
            .iter()
            .map(|token_features| {
                let mut scores = vec![0.0f32; num_tags];
                for feature in token_features {
                    if let Some(w) = self.weights.get(feature) {
                        for (score, weight) in scores.iter_mut().zip(w) {
                            *score += weight;
                        }
                    }
                }
                scores
            })
            .collect()
    }

    fn decode(&self, features: &[Vec<String>]) -> Vec<usize> {
        let decoder = ViterbiDecoder::new(self.scheme.transition_mask());
        decoder.decode(&self.emissions(features), &self.transitions)
    }

    /// Tag indices predicted for `tokens`.
    pub fn predict_tags(&self, tokens: &[Token]) -> Vec<usize> {
        let features: Vec<Vec<String>> = (0..tokens.len())
            .map(|i| Self::extract_features(tokens, i))
            .collect();
        self.decode(&features)
    }

    fn validate(&self) -> Result<()> {
        let n = self.scheme.num_tags();
        if self.transitions.len() != n || self.transitions.iter().any(|row| row.len() != n) {
            return Err(TrainerError::ModelLoad(format!(
                "transition matrix does not match {n} tags"
            )));
        }
        if let Some((feature, _)) = self.weights.iter().find(|(_, w)| w.len() != n) {
            return Err(TrainerError::ModelLoad(format!(
                "feature {feature:?} does not have {n} weights"
            )));
        }
        Ok(())
    }
}

impl NerModel for CrfModel {
    fn add_label(&mut self, label: &str) {
        if !self.scheme.add_label(label) {
            return;
        }
        let n = self.scheme.num_tags();
        for w in self.weights.values_mut() {
            w.resize(n, 0.0);
        }
        for row in &mut self.transitions {
            row.resize(n, 0.0);
        }
        self.transitions.resize(n, vec![0.0; n]);
    }

    fn labels(&self) -> Vec<String> {
        self.scheme.labels().to_vec()
    }

    fn update(&mut self, batch: &[TrainingExample], drop: f32, rng: &mut Rand32) -> f32 {
        let num_tags = self.scheme.num_tags();
        let mut weight_delta: HashMap<String, Vec<f32>> = HashMap::new();
        let mut transition_delta = vec![vec![0.0f32; num_tags]; num_tags];
        let mut loss = 0.0f32;

        for example in batch {
            let tokens = self.tokenizer.tokenize(&example.text);
            if tokens.is_empty() {
                continue;
            }
            let gold = self.scheme.encode(&tokens, &example.entities);

            let features: Vec<Vec<String>> = (0..tokens.len())
                .map(|i| {
                    let mut f = Self::extract_features(&tokens, i);
                    if drop > 0.0 {
                        f.retain(|_| rng.rand_float() >= drop);
                    }
                    f
                })
                .collect();
            let pred = self.decode(&features);

            // Perceptron update on mis-tagged tokens
            for (i, (&p, &g)) in pred.iter().zip(&gold).enumerate() {
                if p == g {
                    continue;
                }
                loss += 1.0;
                for feature in &features[i] {
                    let delta = weight_delta
                        .entry(feature.clone())
                        .or_insert_with(|| vec![0.0; num_tags]);
                    delta[g] += 1.0;
                    delta[p] -= 1.0;
                }
            }

            for i in 1..gold.len().min(pred.len()) {
                if (pred[i - 1], pred[i]) != (gold[i - 1], gold[i]) {
                    transition_delta[gold[i - 1]][gold[i]] += 1.0;
                    transition_delta[pred[i - 1]][pred[i]] -= 1.0;
                }
            }
        }

        for (feature, delta) in weight_delta {
            let w = self
                .weights
                .entry(feature)
                .or_insert_with(|| vec![0.0; num_tags]);
            for (weight, d) in w.iter_mut().zip(delta) {
                *weight += d;
            }
        }
        for (row, delta_row) in self.transitions.iter_mut().zip(transition_delta) {
            for (t, d) in row.iter_mut().zip(delta_row) {
                *t += d;
            }
        }

        loss
    }

    fn predict(&self, text: &str) -> Vec<Annotation> {
        let tokens = self.tokenizer.tokenize(text);
        if tokens.is_empty() {
            return Vec::new();
        }
        let tags = self.predict_tags(&tokens);
        let chars: Vec<char> = text.chars().collect();

        self.scheme
            .decode(&tokens, &tags)
            .into_iter()
            .map(|span| Annotation {
                text: chars[span.start..span.end].iter().collect(),
                start: span.start,
                end: span.end,
                label: span.label,
            })
            .collect()
    }

    fn save(&self, dir: &Path) -> Result<()> {
        let json = serde_json::to_string(self)?;
        fs::write(dir.join(MODEL_FILE), json)?;
        Ok(())
    }

    fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(MODEL_FILE);
        let content = fs::read_to_string(&path)
            .map_err(|e| TrainerError::ModelLoad(format!("{}: {e}", path.display())))?;
        let model: CrfModel = serde_json::from_str(&content)
            .map_err(|e| TrainerError::ModelLoad(format!("{}: {e}", path.display())))?;
        model.validate()?;
        Ok(model)
    }
}

/// Collapsed character shape, e.g. `Xxxx` for `Python`, `dd` for `2024`.
fn shape(token: &str) -> String {
    let mut out = String::new();
    let mut last = None;
    let mut run = 0;
    for c in token.chars() {
        let class = if c.is_uppercase() {
            'X'
        } else if c.is_lowercase() {
            'x'
        } else if c.is_ascii_digit() {
            'd'
        } else {
            c
        };
        if Some(class) == last {
            run += 1;
        } else {
            run = 1;
            last = Some(class);
        }
        if run <= 2 {
            out.push(class);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use tagga_core::EntitySpan;

    use super::*;

    fn corpus() -> Vec<TrainingExample> {
        vec![
            TrainingExample::new("Expert in Rust", vec![EntitySpan::new(10, 14, "SKILL")]),
            TrainingExample::new("Knows Python well", vec![EntitySpan::new(6, 12, "SKILL")]),
            TrainingExample::new("Works at Acme", vec![EntitySpan::new(9, 13, "ORG")]),
            TrainingExample::new("Rust and Python", vec![
                EntitySpan::new(0, 4, "SKILL"),
                EntitySpan::new(9, 15, "SKILL"),
            ]),
        ]
    }

    fn trained() -> CrfModel {
        let mut model = CrfModel::new();
        model.add_label("SKILL");
        model.add_label("ORG");
        let mut rng = Rand32::new(7);
        let data = corpus();
        for _ in 0..20 {
            model.update(&data, 0.0, &mut rng);
        }
        model
    }

    #[test]
    fn test_shape() {
        assert_eq!(shape("Python"), "Xxx");
        assert_eq!(shape("2024"), "dd");
        assert_eq!(shape("C++"), "X++");
    }

    #[test]
    fn test_blank_model_predicts_nothing() {
        let mut model = CrfModel::new();
        model.add_label("SKILL");
        assert!(model.predict("Rust and Python").is_empty());
        assert!(model.predict("").is_empty());
    }

    #[test]
    fn test_add_label_resizes_parameters() {
        let mut model = trained();
        let before = model.num_features();
        model.add_label("TOOL");
        model.add_label("TOOL");
        assert_eq!(model.labels(), vec!["SKILL", "ORG", "TOOL"]);
        assert_eq!(model.num_features(), before);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_training_reduces_loss() {
        let mut model = CrfModel::new();
        model.add_label("SKILL");
        model.add_label("ORG");
        let mut rng = Rand32::new(7);
        let data = corpus();

        let first = model.update(&data, 0.0, &mut rng);
        for _ in 0..20 {
            model.update(&data, 0.0, &mut rng);
        }
        let last = model.update(&data, 0.0, &mut rng);
        assert!(first > 0.0);
        assert!(last < first);
    }

    #[test]
    fn test_trained_model_recovers_training_entities() {
        let model = trained();
        let found = model.predict("Rust and Python");
        let pairs: Vec<_> = found.iter().map(|a| (a.text.as_str(), a.label.as_str())).collect();
        assert_eq!(pairs, vec![("Rust", "SKILL"), ("Python", "SKILL")]);
        assert_eq!((found[1].start, found[1].end), (9, 15));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let model = trained();
        model.save(dir.path()).unwrap();

        let loaded = CrfModel::load(dir.path()).unwrap();
        assert_eq!(loaded.labels(), model.labels());
        assert_eq!(loaded.predict("Works at Acme"), model.predict("Works at Acme"));
    }

    #[test]
    fn test_load_rejects_mismatched_model() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(MODEL_FILE),
            r#"{"scheme": ["SKILL"], "weights": {}, "transitions": [[0.0]]}"#,
        )
        .unwrap();
        assert!(matches!(
            CrfModel::load(dir.path()),
            Err(TrainerError::ModelLoad(_))
        ));
    }

    #[test]
    fn test_load_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            CrfModel::load(dir.path()),
            Err(TrainerError::ModelLoad(_))
        ));
    }
}
