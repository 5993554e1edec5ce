use rand::distributions::{Distribution, Uniform};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

/// Fills a vector of `len` samples drawn uniformly from [0, 1).
pub fn generate_random_vector(len: usize) -> Vec<f64> {
    sample_uniform(rand::thread_rng(), len)
}

/// Same as `generate_random_vector` but reproducible for a given seed.
pub fn generate_seeded_vector(len: usize, seed: u64) -> Vec<f64> {
    sample_uniform(Pcg64::seed_from_u64(seed), len)
}

fn sample_uniform<R: Rng>(mut rng: R, len: usize) -> Vec<f64> {
    let uniform = Uniform::new(0.0, 1.0);
    (0..len)
        .map(|_| uniform.sample(&mut rng))
        .collect::<Vec<f64>>()
}
