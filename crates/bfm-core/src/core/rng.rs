use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

const R250_LEN: usize = 250;
const R250_TAP: usize = R250_LEN - 103;
const R521_LEN: usize = 521;
const R521_TAP: usize = R521_LEN - 168;

/// R250/521 shift-register generator.
///
/// Two XOR lagged-Fibonacci registers (`x[n] = x[n-250] ^ x[n-103]` and
/// `x[n] = x[n-521] ^ x[n-168]`) whose outputs are XOR-combined. The registers
/// are filled from a ChaCha stream keyed by the 64-bit seed, so equal seeds give
/// identical streams on every platform.
///
/// The engine is an explicit handle: every consumer that draws proposals takes
/// `&mut RandomNumberEngine`, and tests build isolated instances with
/// [`SeedableRng::seed_from_u64`].
#[derive(Clone)]
pub struct RandomNumberEngine {
    r250: [u32; R250_LEN],
    r521: [u32; R521_LEN],
    i250: usize,
    i521: usize,
    seed: u64,
}

impl std::fmt::Debug for RandomNumberEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomNumberEngine")
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

impl RandomNumberEngine {
    pub fn new(seed: u64) -> Self {
        let mut source = ChaCha20Rng::seed_from_u64(seed);
        let mut r250 = [0u32; R250_LEN];
        let mut r521 = [0u32; R521_LEN];
        r250.iter_mut().for_each(|w| *w = source.next_u32());
        r521.iter_mut().for_each(|w| *w = source.next_u32());

        // Force a triangular bit pattern so the register words span all 32 bits.
        let mut msb = 0x8000_0000u32;
        let mut mask = u32::MAX;
        for k in 0..32 {
            let a = 7 * k + 3;
            r250[a] = (r250[a] & mask) | msb;
            let b = 16 * k + 8;
            r521[b] = (r521[b] & mask) | msb;
            msb >>= 1;
            mask >>= 1;
        }

        Self {
            r250,
            r521,
            i250: 0,
            i521: 0,
            seed,
        }
    }

    /// Seeds from the operating system and remembers the drawn seed so the run
    /// can be reproduced.
    pub fn from_entropy_seed() -> Self {
        Self::new(rand::random::<u64>())
    }

    /// The seed this engine was constructed from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform double in `[0, 1)` with 53 random bits.
    #[inline]
    pub fn uniform_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform index in `[0, n)`.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero.
    #[inline]
    pub fn uniform_index(&mut self, n: usize) -> usize {
        self.gen_range(0..n)
    }

    #[inline]
    fn step(&mut self) -> u32 {
        let j250 = (self.i250 + R250_TAP) % R250_LEN;
        let r = self.r250[self.i250] ^ self.r250[j250];
        self.r250[self.i250] = r;
        self.i250 = (self.i250 + 1) % R250_LEN;

        let j521 = (self.i521 + R521_TAP) % R521_LEN;
        let s = self.r521[self.i521] ^ self.r521[j521];
        self.r521[self.i521] = s;
        self.i521 = (self.i521 + 1) % R521_LEN;

        r ^ s
    }
}

impl RngCore for RandomNumberEngine {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.step()
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(self.step());
        let lo = u64::from(self.step());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for RandomNumberEngine {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}
