use super::initializer::{seeded_rng, xavier_uniform, zeros};
use super::optimizer::Optimizer;
use super::ScoringModel;
use crate::config::ModelConfig;
use crate::error::{RecommendationError, Result};
use crate::models::TrainingExample;
use crate::services::embedding_store::EmbeddingStore;
use crate::utils::{concat, cosine_similarity, relu, sigmoid};
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const SNAPSHOT_VERSION: &str = "crmrec-ffn-v1";
const LOSS_EPSILON: f32 = 1e-7;

/// Pairs a user embedding with a product embedding and asks the injected
/// model for a relevance score in `[0, 1]`.
#[derive(Clone)]
pub struct Scorer {
    model: Arc<dyn ScoringModel>,
    dimension: usize,
}

impl Scorer {
    pub fn new(model: Arc<dyn ScoringModel>, dimension: usize) -> Self {
        Self { model, dimension }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn user_embedding(&self, store: &EmbeddingStore, user_id: &str) -> Result<Vec<f32>> {
        store
            .user(user_id)
            .ok_or_else(|| RecommendationError::insufficient_data(user_id))
    }

    pub fn score(&self, user_embedding: &[f32], product_embedding: &[f32]) -> Result<f64> {
        for embedding in [user_embedding, product_embedding] {
            if embedding.len() != self.dimension {
                return Err(RecommendationError::DimensionMismatch {
                    expected: self.dimension,
                    actual: embedding.len(),
                });
            }
        }

        let input = concat(user_embedding, product_embedding);
        let raw = self.model.score(&input)?;
        if !raw.is_finite() {
            return Err(RecommendationError::Scoring(format!(
                "{} produced a non-finite score",
                self.model.name()
            )));
        }

        Ok(raw.clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CosineScorer;

impl ScoringModel for CosineScorer {
    fn score(&self, input: &[f32]) -> Result<f64> {
        if input.len() % 2 != 0 {
            return Err(RecommendationError::Scoring(format!(
                "expected an even-length input, got {}",
                input.len()
            )));
        }

        let (user, product) = input.split_at(input.len() / 2);
        Ok((cosine_similarity(user, product) as f64 + 1.0) / 2.0)
    }

    fn name(&self) -> &str {
        "cosine"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
enum Activation {
    Relu,
    Sigmoid,
}

impl Activation {
    fn apply(&self, z: &DVector<f32>) -> DVector<f32> {
        match self {
            Activation::Relu => z.map(relu),
            Activation::Sigmoid => z.map(sigmoid),
        }
    }
}

#[derive(Debug, Clone)]
struct DenseLayer {
    weights: DMatrix<f32>,
    bias: DVector<f32>,
    activation: Activation,
}

impl DenseLayer {
    fn new(inputs: usize, outputs: usize, activation: Activation, rng: &mut StdRng) -> Self {
        Self {
            weights: xavier_uniform(outputs, inputs, rng),
            bias: zeros(outputs),
            activation,
        }
    }

    fn pre_activation(&self, input: &DVector<f32>) -> DVector<f32> {
        &self.weights * input + &self.bias
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LayerSnapshot {
    rows: usize,
    cols: usize,
    // column-major
    weights: Vec<f32>,
    bias: Vec<f32>,
    activation: Activation,
}

#[derive(Debug, Serialize, Deserialize)]
struct ModelSnapshot {
    version: String,
    input_dim: usize,
    dropout_rate: f32,
    layers: Vec<LayerSnapshot>,
}

struct Gradients {
    weights: Vec<DMatrix<f32>>,
    bias: Vec<DVector<f32>>,
}

#[derive(Debug, Clone)]
pub struct FeedForwardScorer {
    input_dim: usize,
    dropout_rate: f32,
    layers: Vec<DenseLayer>,
    rng: StdRng,
}

impl FeedForwardScorer {
    pub fn new(input_dim: usize, hidden_units: [usize; 2], dropout_rate: f32, seed: u64) -> Self {
        let mut rng = seeded_rng(seed);
        let layers = vec![
            DenseLayer::new(input_dim, hidden_units[0], Activation::Relu, &mut rng),
            DenseLayer::new(hidden_units[0], hidden_units[1], Activation::Relu, &mut rng),
            DenseLayer::new(hidden_units[1], 1, Activation::Sigmoid, &mut rng),
        ];

        Self {
            input_dim,
            dropout_rate,
            layers,
            rng,
        }
    }

    pub fn from_config(embedding_dim: usize, config: &ModelConfig) -> Self {
        Self::new(
            embedding_dim * 2,
            config.hidden_units,
            config.dropout_rate,
            config.seed,
        )
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn check_input(&self, input: &[f32]) -> Result<()> {
        if input.len() != self.input_dim {
            return Err(RecommendationError::DimensionMismatch {
                expected: self.input_dim,
                actual: input.len(),
            });
        }
        Ok(())
    }

    fn predict(&self, input: &[f32]) -> f32 {
        self.layers
            .iter()
            .fold(DVector::from_column_slice(input), |activation, layer| {
                layer.activation.apply(&layer.pre_activation(&activation))
            })[0]
    }

    pub fn loss(&self, examples: &[TrainingExample]) -> Result<f64> {
        if examples.is_empty() {
            return Ok(0.0);
        }

        let mut total = 0.0f64;
        for example in examples {
            self.check_input(&example.input)?;
            total += binary_cross_entropy(self.predict(&example.input), example.label) as f64;
        }
        Ok(total / examples.len() as f64)
    }

    fn dropout_mask(&mut self, size: usize) -> DVector<f32> {
        if self.dropout_rate <= 0.0 {
            return DVector::from_element(size, 1.0);
        }

        let keep = 1.0 - self.dropout_rate;
        let rng = &mut self.rng;
        DVector::from_fn(size, |_, _| if rng.gen::<f32>() < keep { 1.0 / keep } else { 0.0 })
    }

    fn accumulate(&mut self, example: &TrainingExample, grads: &mut Gradients) -> f32 {
        let x = DVector::from_column_slice(&example.input);

        let z1 = self.layers[0].pre_activation(&x);
        let mask = self.dropout_mask(z1.len());
        let h1 = self.layers[0].activation.apply(&z1).component_mul(&mask);

        let z2 = self.layers[1].pre_activation(&h1);
        let h2 = self.layers[1].activation.apply(&z2);

        let z3 = self.layers[2].pre_activation(&h2);
        let output = sigmoid(z3[0]);

        // sigmoid + cross-entropy collapses to (p - y)
        let d3 = DVector::from_element(1, output - example.label);
        grads.weights[2] += &d3 * h2.transpose();
        grads.bias[2] += &d3;

        let relu_grad = |z: &DVector<f32>| z.map(|v| if v > 0.0 { 1.0 } else { 0.0 });

        let d2 = (self.layers[2].weights.transpose() * &d3).component_mul(&relu_grad(&z2));
        grads.weights[1] += &d2 * h1.transpose();
        grads.bias[1] += &d2;

        let d1 = (self.layers[1].weights.transpose() * &d2)
            .component_mul(&mask)
            .component_mul(&relu_grad(&z1));
        grads.weights[0] += &d1 * x.transpose();
        grads.bias[0] += &d1;

        binary_cross_entropy(output, example.label)
    }

    pub fn train_batch(&mut self, batch: &[TrainingExample], optimizer: &mut dyn Optimizer) -> Result<f64> {
        if batch.is_empty() {
            return Ok(0.0);
        }
        for example in batch {
            self.check_input(&example.input)?;
        }

        let mut grads = Gradients {
            weights: self
                .layers
                .iter()
                .map(|l| DMatrix::zeros(l.weights.nrows(), l.weights.ncols()))
                .collect(),
            bias: self.layers.iter().map(|l| zeros(l.bias.len())).collect(),
        };

        let mut total_loss = 0.0f64;
        for example in batch {
            total_loss += self.accumulate(example, &mut grads) as f64;
        }

        let scale = 1.0 / batch.len() as f32;
        for (i, layer) in self.layers.iter_mut().enumerate() {
            let (rows, cols) = layer.weights.shape();
            let mut weights = DVector::from_column_slice(layer.weights.as_slice());
            let weight_grads = DVector::from_column_slice(grads.weights[i].as_slice()).scale(scale);
            optimizer.update(&format!("layer{}.weights", i), &mut weights, &weight_grads);
            layer.weights = DMatrix::from_column_slice(rows, cols, weights.as_slice());

            let bias_grads = grads.bias[i].scale(scale);
            optimizer.update(&format!("layer{}.bias", i), &mut layer.bias, &bias_grads);
        }
        optimizer.step();

        let mean_loss = total_loss / batch.len() as f64;
        if !mean_loss.is_finite() {
            return Err(RecommendationError::Model("training diverged".to_string()));
        }
        Ok(mean_loss)
    }

    pub fn train(
        &mut self,
        examples: &[TrainingExample],
        epochs: usize,
        batch_size: usize,
        optimizer: &mut dyn Optimizer,
    ) -> Result<f64> {
        for _ in 0..epochs {
            for batch in examples.chunks(batch_size.max(1)) {
                self.train_batch(batch, optimizer)?;
            }
        }
        self.loss(examples)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let snapshot = ModelSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            input_dim: self.input_dim,
            dropout_rate: self.dropout_rate,
            layers: self
                .layers
                .iter()
                .map(|layer| LayerSnapshot {
                    rows: layer.weights.nrows(),
                    cols: layer.weights.ncols(),
                    weights: layer.weights.as_slice().to_vec(),
                    bias: layer.bias.as_slice().to_vec(),
                    activation: layer.activation,
                })
                .collect(),
        };

        let writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(writer, &snapshot)?;
        info!("Saved scoring model to {}", path.as_ref().display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>, seed: u64) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let snapshot: ModelSnapshot = serde_json::from_reader(reader)?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(RecommendationError::Model(format!(
                "unsupported model version {}",
                snapshot.version
            )));
        }
        if snapshot.layers.len() != 3 {
            return Err(RecommendationError::Model(format!(
                "expected 3 layers, found {}",
                snapshot.layers.len()
            )));
        }

        let mut expected_inputs = snapshot.input_dim;
        let mut layers = Vec::with_capacity(snapshot.layers.len());
        for layer in snapshot.layers {
            if layer.cols != expected_inputs
                || layer.weights.len() != layer.rows * layer.cols
                || layer.bias.len() != layer.rows
            {
                return Err(RecommendationError::Model("inconsistent layer shapes".to_string()));
            }
            expected_inputs = layer.rows;
            layers.push(DenseLayer {
                weights: DMatrix::from_column_slice(layer.rows, layer.cols, &layer.weights),
                bias: DVector::from_vec(layer.bias),
                activation: layer.activation,
            });
        }
        if expected_inputs != 1 {
            return Err(RecommendationError::Model("output layer must have one unit".to_string()));
        }

        info!("Loaded scoring model from {}", path.as_ref().display());
        Ok(Self {
            input_dim: snapshot.input_dim,
            dropout_rate: snapshot.dropout_rate,
            layers,
            rng: seeded_rng(seed),
        })
    }
}

impl ScoringModel for FeedForwardScorer {
    fn score(&self, input: &[f32]) -> Result<f64> {
        self.check_input(input)?;
        Ok(self.predict(input) as f64)
    }

    fn name(&self) -> &str {
        "feed-forward"
    }
}

fn binary_cross_entropy(prediction: f32, label: f32) -> f32 {
    let p = prediction.clamp(LOSS_EPSILON, 1.0 - LOSS_EPSILON);
    -(label * p.ln() + (1.0 - label) * (1.0 - p).ln())
}
