use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn xavier_uniform(rows: usize, cols: usize, rng: &mut StdRng) -> DMatrix<f32> {
    let limit = (6.0 / (rows + cols).max(1) as f32).sqrt();
    DMatrix::from_fn(rows, cols, |_, _| rng.gen_range(-limit..limit))
}

pub fn zeros(size: usize) -> DVector<f32> {
    DVector::zeros(size)
}

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
