use rand::Rng;

/// values are drawn from `0..VALUE_RANGE`
pub const VALUE_RANGE: i32 = 100;

/// Generates `len` random values in `0..VALUE_RANGE`
pub fn random_vector<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<i32> {
    (0..len).map(|_| rng.gen_range(0..VALUE_RANGE)).collect()
}
