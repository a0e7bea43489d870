//! Builds the input pipeline for a feature configuration and runs one random
//! batch through it.
//!
//! ```bash
//! cargo run -p deepctr-examples --bin demo_inputs -- \
//!     --config crates/deepctr-examples/configs/features.json --batch-size 8
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use deepctr_core::{
    Combiner, DenseFeat, EmbeddingMatrixConfig, FeatureColumn, FeatureConfig, SparseFeat,
    VarLenSparseFeat,
};
use deepctr_inputs::InputEmbedder;
use deepctr_layers::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Parser, Debug)]
struct Args {
    /// JSON feature configuration. A built-in one is used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rows in the generated batch.
    #[arg(long, default_value_t = 4)]
    batch_size: usize,

    /// Seed for table initialization and batch generation.
    #[arg(long, default_value_t = 1024)]
    seed: u64,
}

fn builtin_config() -> anyhow::Result<FeatureConfig> {
    let features: Vec<FeatureColumn> = vec![
        SparseFeat::new("user_id", 1000, 8)?.into(),
        SparseFeat::builder("gender", 2).embedding_dim(8).build()?.into(),
        SparseFeat::builder("item_id", 5000)
            .embedding_dim(8)
            .group_name("item")
            .build()?
            .into(),
        DenseFeat::new("age", 1)?.into(),
        DenseFeat::new("price", 1)?.into(),
        VarLenSparseFeat::new(
            SparseFeat::builder("hist_item_id", 5000)
                .embedding_dim(8)
                .embedding_name("item_id")
                .build()?,
            10,
            Combiner::Mean,
            Some("seq_length".to_string()),
        )?
        .into(),
    ];
    Ok(FeatureConfig {
        features,
        embedding: EmbeddingMatrixConfig::default(),
    })
}

/// Fills a `[batch_size, total_width]` batch with values valid for every feature.
fn random_batch(embedder: &InputEmbedder, batch_size: usize, rng: &mut StdRng) -> Tensor {
    let index = embedder.feature_index();
    let width = index.total_width();
    let mut data = vec![0.0f32; batch_size * width];

    for row in data.chunks_exact_mut(width.max(1)).take(batch_size) {
        for column in embedder.columns() {
            let Some(range) = index.get(column.name()) else {
                continue;
            };
            match column {
                FeatureColumn::Sparse(feat) => {
                    row[range.start] = rng.gen_range(0..feat.vocabulary_size()) as f32;
                }
                FeatureColumn::Dense(_) => {
                    for value in &mut row[range.as_range()] {
                        *value = rng.gen::<f32>();
                    }
                }
                FeatureColumn::VarLenSparse(feat) => {
                    let len = rng.gen_range(0..=feat.maxlen());
                    for value in &mut row[range.start..range.start + len] {
                        *value = rng.gen_range(1..feat.vocabulary_size().max(2)) as f32;
                    }
                    if let Some(length) = feat.length_name().and_then(|name| index.get(name)) {
                        row[length.start] = len as f32;
                    }
                }
            }
        }
    }

    Tensor::from_data(&[batch_size, width], data)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => FeatureConfig::from_json_file(path)
            .with_context(|| format!("loading feature config {}", path.display()))?,
        None => builtin_config()?,
    };
    config.embedding.seed = Some(args.seed);

    let embedder = InputEmbedder::from_config(&config)?;
    tracing::info!(
        features = embedder.columns().len(),
        tables = embedder.embedding_dict().len(),
        parameters = embedder.embedding_dict().num_parameters(),
        input_width = embedder.feature_index().total_width(),
        "Built input pipeline"
    );

    let mut rng = StdRng::seed_from_u64(args.seed);
    let x = random_batch(&embedder, args.batch_size, &mut rng);
    let out = embedder.dnn_input(&x)?;

    anyhow::ensure!(
        out.shape() == [args.batch_size, embedder.compute_input_dim(true, true, false)],
        "unexpected DNN input shape {:?}",
        out.shape()
    );
    tracing::info!(shape = ?out.shape(), "demo_inputs finished");
    Ok(())
}
