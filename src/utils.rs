use ndarray::{Array1, ArrayView1};
use rand::Rng;

pub fn dot_product(v1: &[f32], v2: &[f32]) -> f32 {
    ArrayView1::from(v1).dot(&ArrayView1::from(v2))
}

pub fn l2_norm(vector: &[f32]) -> f32 {
    dot_product(vector, vector).sqrt()
}

/// Scale `vector` to unit length. Zero vectors are returned unchanged.
pub fn normalize_vector(vector: &Array1<f32>) -> Array1<f32> {
    let magnitude = vector.dot(vector).sqrt();
    if magnitude > 0.0 {
        vector / magnitude
    } else {
        vector.clone()
    }
}

pub fn is_normalized(vector: &[f32], tolerance: f32) -> bool {
    (l2_norm(vector) - 1.0).abs() <= tolerance
}

/// Random unit vectors, for tests and benchmarks.
pub fn generate_unit_vectors(dim: usize, num: usize) -> Vec<Array1<f32>> {
    let mut rng = rand::thread_rng();

    (0..num)
        .map(|_| {
            let raw: Array1<f32> =
                Array1::from_vec((0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect());
            normalize_vector(&raw)
        })
        .collect()
}

/// A unit vector whose dot product with the unit vector `base` is exactly `similarity`
/// (up to rounding). Requires `dim >= 2`.
pub fn vector_with_similarity(base: &Array1<f32>, similarity: f32) -> Array1<f32> {
    // Gram-Schmidt a helper axis against `base` to get an orthogonal unit direction.
    let dim = base.len();
    let mut orthogonal = None;
    for axis in 0..dim {
        let mut helper = Array1::<f32>::zeros(dim);
        helper[axis] = 1.0;
        let projection = helper.dot(base);
        let candidate = &helper - &(base * projection);
        let norm = candidate.dot(&candidate).sqrt();
        if norm > 1e-3 {
            orthogonal = Some(candidate / norm);
            break;
        }
    }
    let orthogonal = orthogonal.unwrap_or_else(|| Array1::zeros(dim));
    let sine = (1.0 - similarity * similarity).max(0.0).sqrt();
    normalize_vector(&(base * similarity + &orthogonal * sine))
}
