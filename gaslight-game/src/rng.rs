//! Deterministic randomness, segregated by decision domain.
//!
//! One user-visible seed fans out into independent streams via
//! HMAC-SHA256 domain separation, so drawing targets never perturbs path
//! tie-breaking and replays stay stable when one domain's draw count
//! changes.

use std::cell::{RefCell, RefMut};

use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

/// Deterministic bundle of RNG streams segregated by decision domain.
#[derive(Debug, Clone)]
pub struct RngBundle {
    targets: RefCell<CountingRng<ChaCha20Rng>>,
    route: RefCell<CountingRng<ChaCha20Rng>>,
    tactic: RefCell<CountingRng<ChaCha20Rng>>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        let targets = CountingRng::new(derive_stream_seed(seed, b"targets"));
        let route = CountingRng::new(derive_stream_seed(seed, b"route"));
        let tactic = CountingRng::new(derive_stream_seed(seed, b"tactic"));
        Self {
            targets: RefCell::new(targets),
            route: RefCell::new(route),
            tactic: RefCell::new(tactic),
        }
    }

    /// Stream for drawing the round's destinations.
    #[must_use]
    pub fn targets(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.targets.borrow_mut()
    }

    /// Stream for breaking ties among equal shortest paths.
    #[must_use]
    pub fn route(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.route.borrow_mut()
    }

    /// Stream for tactic whims and escape-hop picks.
    #[must_use]
    pub fn tactic(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.tactic.borrow_mut()
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<ChaCha20Rng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes())
        .expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn streams_are_independent_and_counted() {
        let bundle = RngBundle::from_user_seed(42);
        let twin = RngBundle::from_user_seed(42);

        // Burn draws on one stream; the others must not shift.
        let _: u32 = bundle.targets().r#gen();
        let _: u32 = bundle.targets().r#gen();
        let from_bundle: u64 = bundle.route().r#gen();
        let from_twin: u64 = twin.route().r#gen();
        assert_eq!(from_bundle, from_twin);
        assert_eq!(bundle.targets().draws(), 2);
        assert_eq!(bundle.route().draws(), 1);
        assert_eq!(bundle.tactic().draws(), 0);
    }

    #[test]
    fn different_seeds_diverge() {
        let a = RngBundle::from_user_seed(1);
        let b = RngBundle::from_user_seed(2);
        let va: u64 = a.route().r#gen();
        let vb: u64 = b.route().r#gen();
        assert_ne!(va, vb);
    }
}
