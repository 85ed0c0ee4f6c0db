//! The per-party source of cryptographically secure randomness.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// A ChaCha20-based PRG, owned by exactly one [`crate::context::Context`].
#[derive(Debug, Clone)]
pub struct Prg(ChaCha20Rng);

impl Prg {
    /// Seeds a new PRG from OS entropy.
    pub fn new() -> Self {
        Self(ChaCha20Rng::from_os_rng())
    }

    /// Creates a deterministic PRG, only useful for reproducible tests.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self(ChaCha20Rng::from_seed(seed))
    }

    /// Returns `n` random bytes.
    pub fn rand_bytes(&mut self, n: usize) -> Vec<u8> {
        let mut buf = vec![0; n];
        self.0.fill_bytes(&mut buf);
        buf
    }

    /// Returns a uniformly random bit.
    pub fn rand_bool(&mut self) -> bool {
        self.0.random()
    }

    /// Returns a fresh 256-bit seed, e.g. for setting up correlated randomness.
    pub fn rand_seed(&mut self) -> [u8; 32] {
        self.0.random()
    }
}

impl Default for Prg {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Prg;

    #[test]
    fn seeded_prgs_agree() {
        let mut a = Prg::from_seed([7; 32]);
        let mut b = Prg::from_seed([7; 32]);
        assert_eq!(a.rand_bytes(33), b.rand_bytes(33));
        assert_eq!(a.rand_seed(), b.rand_seed());
    }

    #[test]
    fn rand_bytes_has_requested_length() {
        let mut prg = Prg::new();
        assert!(prg.rand_bytes(0).is_empty());
        assert_eq!(prg.rand_bytes(1000).len(), 1000);
    }

    #[test]
    fn rand_bool_is_not_constant() {
        let mut prg = Prg::from_seed([1; 32]);
        let bits: Vec<bool> = (0..256).map(|_| prg.rand_bool()).collect();
        assert!(bits.iter().any(|b| *b));
        assert!(bits.iter().any(|b| !*b));
    }
}
