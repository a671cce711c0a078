use face_index::{
    calibration::{collect_scores, sweep_thresholds, DEFAULT_CANDIDATES},
    config::IndexConfig,
    recognizer::{EmbeddingSource, Recognition, Recognizer},
    store::FaceIndex,
    utils::{generate_unit_vectors, vector_with_similarity},
    IdentityId, DEFAULT_DIMENSION,
};
use ndarray::Array1;
use std::collections::HashMap;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Stands in for a face model: "photos" are looked up by file name.
struct PhotoAlbum {
    photos: HashMap<String, Array1<f32>>,
}

impl EmbeddingSource for PhotoAlbum {
    type Input = str;

    fn embed(&self, input: &str) -> face_index::Result<Option<Vec<f32>>> {
        Ok(self.photos.get(input).map(|v| v.to_vec()))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("🚀 Face Index Demo");
    println!("==================\n");

    let temp_dir = std::env::temp_dir().join("face_index_demo");
    let config = IndexConfig::default().with_snapshot_path(temp_dir.join("faces.fidx"));
    let index = Arc::new(FaceIndex::open(&config)?);
    index.clear()?;

    let people = generate_unit_vectors(DEFAULT_DIMENSION, 3);
    let names = ["alice", "bob", "carol"];
    let mut photos = HashMap::new();
    for (name, v) in names.iter().zip(&people) {
        photos.insert(format!("{}_enroll.jpg", name), v.clone());
        photos.insert(format!("{}_today.jpg", name), vector_with_similarity(v, 0.8));
    }
    photos.insert(
        "stranger.jpg".to_string(),
        generate_unit_vectors(DEFAULT_DIMENSION, 1).remove(0),
    );

    let recognizer = Recognizer::new(PhotoAlbum { photos }, Arc::clone(&index), config.policy()?);

    println!("📸 Enrolling {} people...", names.len());
    for name in names {
        recognizer.enroll(&format!("{}_enroll.jpg", name), name)?;
    }

    println!("\n🔎 Recognizing...");
    for photo in ["alice_today.jpg", "carol_today.jpg", "stranger.jpg", "nobody.jpg"] {
        match recognizer.recognize(photo)? {
            Recognition::Decided(outcome) if outcome.is_recognized() => println!(
                "  {} -> {} ({:.2})",
                photo,
                outcome.id().map(IdentityId::to_string).unwrap_or_default(),
                outcome.score().unwrap_or_default()
            ),
            Recognition::Decided(outcome) => println!("  {} -> unknown {:?}", photo, outcome),
            Recognition::NoEmbedding => println!("  {} -> no face found", photo),
        }
    }

    println!("\n🗑️  Forgetting bob...");
    recognizer.forget("bob")?;

    println!("\n🎯 Threshold sweep over enrolled samples:");
    let samples: Vec<(IdentityId, Array1<f32>)> = names
        .iter()
        .zip(&people)
        .flat_map(|(name, v)| {
            [
                (IdentityId::from(*name), v.clone()),
                (IdentityId::from(*name), vector_with_similarity(v, 0.7)),
            ]
        })
        .collect();
    let scores = collect_scores(&samples);
    if let (Some(genuine), Some(impostor)) = (scores.genuine_summary(), scores.impostor_summary()) {
        println!(
            "  genuine mean {:.2} over {}, impostor mean {:.2} over {}",
            genuine.mean, genuine.count, impostor.mean, impostor.count
        );
    }
    for report in sweep_thresholds(&scores, &DEFAULT_CANDIDATES) {
        println!(
            "  {:.2}: accuracy {:.1}%, FP {} ({:.1}%), FN {} ({:.1}%)",
            report.threshold,
            report.accuracy * 100.0,
            report.false_positives,
            report.false_positive_rate() * 100.0,
            report.false_negatives,
            report.false_negative_rate() * 100.0
        );
    }

    println!("\n📈 Stats: {}", serde_json::to_string_pretty(&recognizer.stats())?);

    std::fs::remove_dir_all(&temp_dir)?;
    println!("\n✅ Demo completed successfully!");
    Ok(())
}
