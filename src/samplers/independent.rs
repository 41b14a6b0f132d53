use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::vec::Vec2;

use super::{Sampler, hash2};

pub struct Independent {
    rnd: ChaCha8Rng,
    nspp: usize,
}

impl Sampler for Independent {
    fn next(&mut self) -> f64 {
        self.rnd.random()
    }

    fn next2d(&mut self) -> Vec2 {
        Vec2::new(self.rnd.random(), self.rnd.random())
    }

    fn seed_for_tile(&self, tile_x: u32, tile_y: u32) -> Box<dyn Sampler> {
        let h = hash2(Vec2::new(f64::from(tile_x), f64::from(tile_y)));
        Box::new(Self {
            rnd: ChaCha8Rng::seed_from_u64(h.to_bits()),
            nspp: self.nspp,
        })
    }

    fn nb_samples(&self) -> usize {
        self.nspp
    }

    fn set_nb_samples(&mut self, nspp: usize) {
        self.nspp = nspp;
    }
}

impl Independent {
    #[must_use]
    pub fn new(nspp: usize) -> Self {
        Self {
            rnd: ChaCha8Rng::seed_from_u64(0),
            nspp,
        }
    }
}
