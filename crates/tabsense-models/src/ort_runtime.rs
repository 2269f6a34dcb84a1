//! ONNX Runtime inference (feature-gated behind `ort`).
//!
//! Resolves model artifacts from a local-only root — a missing file is a
//! terminal [`ModelError::ArtifactMissing`], never a download. Zero-shot
//! classification runs NLI entailment per candidate label; tagger and
//! embedder pipelines score labels by embedding similarity.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use tabsense_core::TaxonomyResult;

use crate::descriptor::{PipelineTask, ProgressEvent};
use crate::errors::{ModelError, Result};
use crate::runtime::{InferenceRuntime, ProgressCallback, TextPipeline};

/// Typed paths for the two required artifact files of one model.
pub struct ArtifactPaths {
    /// ONNX graph (`model.onnx`).
    pub model: PathBuf,
    /// Tokenizer definition (`tokenizer.json`).
    pub tokenizer: PathBuf,
}

impl ArtifactPaths {
    /// Required artifact filenames under each model directory.
    pub const NAMES: &[&str] = &["model.onnx", "tokenizer.json"];

    /// Construct paths for a model directory.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            model: dir.join("model.onnx"),
            tokenizer: dir.join("tokenizer.json"),
        }
    }

    /// Whether both required files exist locally.
    pub fn all_exist(&self) -> bool {
        self.model.exists() && self.tokenizer.exists()
    }
}

/// Combined session + tokenizer state behind a single mutex.
struct InferenceState {
    session: ort::session::Session,
    tokenizer: tokenizers::Tokenizer,
}

/// How a pipeline turns raw model output into label scores.
#[derive(Clone, Copy)]
enum ScoringMode {
    /// NLI entailment per `(text, "This example is {label}.")` pair.
    Entailment,
    /// Cosine similarity between mean-pooled text and label embeddings.
    Similarity,
}

/// Local-artifact-only ONNX runtime.
pub struct OrtRuntime {
    artifact_root: PathBuf,
}

impl OrtRuntime {
    /// Create a runtime resolving models under `artifact_root/<model>/`.
    pub fn new(artifact_root: impl Into<PathBuf>) -> Self {
        Self {
            artifact_root: artifact_root.into(),
        }
    }
}

#[async_trait]
impl InferenceRuntime for OrtRuntime {
    async fn load_pipeline(
        &self,
        task: PipelineTask,
        model: &str,
        on_progress: ProgressCallback,
    ) -> Result<Arc<dyn TextPipeline>> {
        let dir = self.artifact_root.join(model);
        let paths = ArtifactPaths::from_dir(&dir);
        if !paths.all_exist() {
            // Offline correctness: no fetch fallback, period.
            return Err(ModelError::ArtifactMissing(format!(
                "expected {:?} under {}",
                ArtifactPaths::NAMES,
                dir.display()
            )));
        }

        for name in ArtifactPaths::NAMES {
            on_progress(ProgressEvent::Initiate {
                file: (*name).to_string(),
            });
        }

        debug!(model, dir = %dir.display(), "building ONNX session from local artifacts");
        let state = tokio::task::spawn_blocking(move || build_state(&paths))
            .await
            .map_err(|e| ModelError::Internal(format!("join: {e}")))??;

        for name in ArtifactPaths::NAMES {
            on_progress(ProgressEvent::Done {
                file: (*name).to_string(),
            });
        }

        info!(model, "ONNX pipeline ready");
        let mode = match task {
            PipelineTask::ZeroShotClassification => ScoringMode::Entailment,
            PipelineTask::TokenTagging | PipelineTask::Embedding => ScoringMode::Similarity,
        };
        Ok(Arc::new(OrtPipeline {
            task,
            mode,
            state: Arc::new(tokio::sync::Mutex::new(state)),
        }))
    }
}

fn build_state(paths: &ArtifactPaths) -> Result<InferenceState> {
    build_state_inner(paths).map_err(|e| ModelError::Runtime(e.to_string()))
}

/// Uses `Box<dyn Error>` internally so all calls can use `?` directly; the
/// caller maps the error to [`ModelError::Runtime`] at the boundary.
fn build_state_inner(
    paths: &ArtifactPaths,
) -> std::result::Result<InferenceState, Box<dyn std::error::Error + Send + Sync>> {
    let tokenizer = tokenizers::Tokenizer::from_file(&paths.tokenizer)
        .map_err(|e| format!("tokenizer load: {e}"))?;

    let session = ort::session::Session::builder()?
        .with_intra_threads(2)?
        .with_log_level(ort::logging::LogLevel::Warning)?
        .commit_from_file(&paths.model)?;

    Ok(InferenceState { session, tokenizer })
}

/// ONNX-backed label-scoring pipeline.
///
/// The session and tokenizer live behind an async mutex: concurrent
/// `classify` calls against one pipeline queue instead of failing, so a
/// caller may fan out several scorings over the same handle.
pub struct OrtPipeline {
    task: PipelineTask,
    mode: ScoringMode,
    state: Arc<tokio::sync::Mutex<InferenceState>>,
}

#[async_trait]
impl TextPipeline for OrtPipeline {
    fn task(&self) -> PipelineTask {
        self.task
    }

    async fn classify(&self, text: &str, labels: &[&str]) -> Result<TaxonomyResult> {
        // The owned guard travels into the blocking task and is released
        // when inference finishes; waiting callers then acquire in turn.
        let mut state = Arc::clone(&self.state).lock_owned().await;
        let mode = self.mode;
        let text = text.to_string();
        let labels: Vec<String> = labels.iter().map(|l| (*l).to_string()).collect();

        tokio::task::spawn_blocking(move || score_labels(&mut state, mode, &text, &labels))
            .await
            .map_err(|e| ModelError::Internal(format!("join: {e}")))?
    }
}

fn score_labels(
    state: &mut InferenceState,
    mode: ScoringMode,
    text: &str,
    labels: &[String],
) -> Result<TaxonomyResult> {
    score_labels_inner(state, mode, text, labels).map_err(|e| ModelError::Runtime(e.to_string()))
}

fn score_labels_inner(
    state: &mut InferenceState,
    mode: ScoringMode,
    text: &str,
    labels: &[String],
) -> std::result::Result<TaxonomyResult, Box<dyn std::error::Error + Send + Sync>> {
    let pairs = match mode {
        ScoringMode::Entailment => {
            let mut pairs = Vec::with_capacity(labels.len());
            for label in labels {
                let hypothesis = format!("This example is {label}.");
                let score = entailment_score(state, text, &hypothesis)?;
                pairs.push((label.clone(), score));
            }
            pairs
        }
        ScoringMode::Similarity => {
            let text_vec = embed(state, text)?;
            let mut pairs = Vec::with_capacity(labels.len());
            for label in labels {
                let label_vec = embed(state, label)?;
                // map cosine [-1, 1] into a [0, 1] score
                let score = (1.0 + cosine(&text_vec, &label_vec)) / 2.0;
                pairs.push((label.clone(), score));
            }
            pairs
        }
    };
    Ok(TaxonomyResult::from_pairs(pairs))
}

/// Entailment probability for one premise/hypothesis pair.
///
/// NLI heads emit `[contradiction, neutral, entailment]` logits; multi-label
/// zero-shot softmaxes entailment against contradiction only, so each label
/// is scored independently.
fn entailment_score(
    state: &mut InferenceState,
    premise: &str,
    hypothesis: &str,
) -> std::result::Result<f32, Box<dyn std::error::Error + Send + Sync>> {
    let encoding = state
        .tokenizer
        .encode((premise, hypothesis), true)
        .map_err(|e| format!("encode: {e}"))?;

    let logits = run_encoder(&mut state.session, &encoding)?;
    if logits.len() < 3 {
        return Err(format!("unexpected NLI logit count: {}", logits.len()).into());
    }
    let contradiction = logits[0];
    let entailment = logits[2];
    let max = contradiction.max(entailment);
    let e = (entailment - max).exp();
    let c = (contradiction - max).exp();
    Ok(e / (e + c))
}

/// Mean-pooled sentence embedding from the encoder's last hidden state.
fn embed(
    state: &mut InferenceState,
    text: &str,
) -> std::result::Result<Vec<f32>, Box<dyn std::error::Error + Send + Sync>> {
    let encoding = state
        .tokenizer
        .encode(text, true)
        .map_err(|e| format!("encode: {e}"))?;

    let (dims, data) = run_encoder_raw(&mut state.session, &encoding)?;
    if dims.len() != 3 {
        return Err(format!("unexpected output shape: {dims:?}").into());
    }
    let (seq_len, hidden) = (dims[1], dims[2]);
    let mask = encoding.get_attention_mask();

    let mut pooled = vec![0.0f32; hidden];
    let mut count = 0.0f32;
    for (j, &m) in mask.iter().enumerate().take(seq_len) {
        if m == 0 {
            continue;
        }
        count += 1.0;
        let base = j * hidden;
        for (k, p) in pooled.iter_mut().enumerate() {
            *p += data[base + k];
        }
    }
    if count > 0.0 {
        for p in &mut pooled {
            *p /= count;
        }
    }
    Ok(pooled)
}

/// Run the session and return the first row of a `[1, classes]` output.
fn run_encoder(
    session: &mut ort::session::Session,
    encoding: &tokenizers::Encoding,
) -> std::result::Result<Vec<f32>, Box<dyn std::error::Error + Send + Sync>> {
    let (dims, data) = run_encoder_raw(session, encoding)?;
    if dims.is_empty() {
        return Err("empty output shape".into());
    }
    Ok(data)
}

fn run_encoder_raw(
    session: &mut ort::session::Session,
    encoding: &tokenizers::Encoding,
) -> std::result::Result<(Vec<usize>, Vec<f32>), Box<dyn std::error::Error + Send + Sync>> {
    let ids: Vec<i64> = encoding.get_ids().iter().map(|&v| i64::from(v)).collect();
    let mask: Vec<i64> = encoding
        .get_attention_mask()
        .iter()
        .map(|&v| i64::from(v))
        .collect();
    let seq_len = ids.len();
    if seq_len == 0 {
        return Err("empty tokenization".into());
    }

    #[allow(clippy::cast_possible_wrap)]
    let shape = vec![1i64, seq_len as i64];
    let input_ids = ort::value::Tensor::from_array((shape.clone(), ids))?;
    let attention_mask = ort::value::Tensor::from_array((shape, mask))?;

    let outputs = session.run(ort::inputs![input_ids, attention_mask])?;
    let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    let dims: Vec<usize> = output_shape.iter().map(|&d| d as usize).collect();
    Ok((dims, output_data.to_vec()))
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}
