//! Seeded samplers for trace generation
//!
//! Provides the numeric building blocks used by the workload engine:
//! - Key selection (uniform, Zipfian, scrambled Zipfian, skewed-latest)
//! - Scan length and value length selection (uniform, Zipfian)
//! - Operation mix draws (uniform reals in `[0, 1)`)
//!
//! Every sampler owns its RNG and is deterministic for a given seed. None of
//! them are meant to be shared between threads.

use crate::counter::AcknowledgedCounter;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Binomial, Distribution as RandDistribution, Uniform};

/// Default skew constant (YCSB's `zipfian_constant`).
pub const ZIPFIAN_CONSTANT: f64 = 0.99;

/// Domain used by the scrambled Zipfian sampler before hashing.
pub const SCRAMBLED_ITEM_COUNT: u64 = 10_000_000_000;

/// `zeta(SCRAMBLED_ITEM_COUNT + 1, 0.99)`, precomputed.
pub const SCRAMBLED_ZETAN: f64 = 26.46902820178302;

const FNV_OFFSET_BASIS_64: u64 = 0xCBF2_9CE4_8422_2325;
const FNV_PRIME_64: u64 = 1_099_511_628_211;

/// Trait for real-valued distributions
pub trait Distribution: Send {
    /// Sample a value from this distribution
    fn sample(&mut self) -> f64;

    /// Get distribution name
    fn name(&self) -> &'static str;
}

/// Uniform real distribution over `[min, max)`
///
/// Drives the operation selector with draws in `[0, 1)`.
#[derive(Debug, Clone)]
pub struct UniformDistribution {
    rng: SmallRng,
    dist: Uniform<f64>,
}

impl UniformDistribution {
    pub fn with_seed(min: f64, max: f64, seed: u64) -> anyhow::Result<Self> {
        if min >= max {
            anyhow::bail!("Uniform min must be < max");
        }

        let rng = SmallRng::seed_from_u64(seed);
        let dist = Uniform::new(min, max)?;

        Ok(Self { rng, dist })
    }

    /// Unit interval `[0, 1)`
    pub fn unit(seed: u64) -> anyhow::Result<Self> {
        Self::with_seed(0.0, 1.0, seed)
    }
}

impl Distribution for UniformDistribution {
    fn sample(&mut self) -> f64 {
        self.dist.sample(&mut self.rng)
    }

    fn name(&self) -> &'static str {
        "Uniform"
    }
}

/// Number of integers in `[min, max]`; fails when the range holds all of `u64`.
fn range_len(min: u64, max: u64) -> anyhow::Result<u64> {
    if min > max {
        anyhow::bail!("range min ({}) must be <= max ({})", min, max);
    }
    match (max - min).checked_add(1) {
        Some(len) => Ok(len),
        None => anyhow::bail!("range [{}, {}] is too large", min, max),
    }
}

/// `zeta(n, theta) = sum_{i=0}^{n-1} 1 / (i + 1)^theta`
pub fn zeta(n: u64, theta: f64) -> f64 {
    zeta_from(0, n, theta, 0.0)
}

/// Continue a zeta sum from `start` up to `n`, adding onto `initial_sum`.
fn zeta_from(start: u64, n: u64, theta: f64, initial_sum: f64) -> f64 {
    let mut sum = initial_sum;
    for i in start..n {
        sum += 1.0 / ((i + 1) as f64).powf(theta);
    }
    sum
}

/// Numeric core of the Zipfian sampler (Gray et al., "Quickly generating
/// billion-record synthetic databases").
///
/// Holds no RNG: callers feed it a uniform draw `u` in `[0, 1)` together with
/// the effective item count for that draw. The normalisation constant `zetan`
/// is cached and extended incrementally when the item count grows. A shrinking
/// item count keeps the stale constant unless decreases are explicitly allowed.
#[derive(Debug, Clone)]
pub struct ZipfianGenerator {
    items: u64,
    base: u64,
    theta: f64,
    alpha: f64,
    zeta2theta: f64,
    zetan: f64,
    eta: f64,
    count_for_zeta: u64,
    allow_item_count_decrease: bool,
}

impl ZipfianGenerator {
    /// Zipfian over `[min, max]` with the default skew.
    pub fn new(min: u64, max: u64) -> anyhow::Result<Self> {
        Self::with_theta(min, max, ZIPFIAN_CONSTANT)
    }

    /// Zipfian over `[min, max]`, summing zeta over the whole range.
    pub fn with_theta(min: u64, max: u64, theta: f64) -> anyhow::Result<Self> {
        let items = range_len(min, max)?;
        Self::with_zetan(min, max, theta, zeta(items, theta))
    }

    /// Zipfian over `[min, max]` using a caller-supplied `zetan`.
    pub fn with_zetan(min: u64, max: u64, theta: f64, zetan: f64) -> anyhow::Result<Self> {
        let items = range_len(min, max)?;
        if !(0.0..1.0).contains(&theta) {
            anyhow::bail!("Zipfian theta must be in [0.0, 1.0), got {}", theta);
        }
        if !zetan.is_finite() || zetan <= 0.0 {
            anyhow::bail!("Zipfian zetan must be finite and > 0");
        }

        let zeta2theta = zeta(2, theta);
        let mut generator = Self {
            items,
            base: min,
            theta,
            alpha: 1.0 / (1.0 - theta),
            zeta2theta,
            zetan,
            eta: 0.0,
            count_for_zeta: items,
            allow_item_count_decrease: false,
        };
        generator.eta = generator.compute_eta();
        Ok(generator)
    }

    /// Recompute zeta when the item count shrinks (off by default).
    pub fn allow_item_count_decrease(mut self, allow: bool) -> Self {
        self.allow_item_count_decrease = allow;
        self
    }

    // `items` is the construction-time count, even after the cache has moved.
    fn compute_eta(&self) -> f64 {
        (1.0 - (2.0 / self.items as f64).powf(1.0 - self.theta))
            / (1.0 - self.zeta2theta / self.zetan)
    }

    /// Draw with the construction-time item count.
    pub fn sample_with(&mut self, u: f64) -> u64 {
        self.sample_with_count(u, self.items)
    }

    /// Draw against `item_count` items, refreshing the cached zeta if needed.
    pub fn sample_with_count(&mut self, u: f64, item_count: u64) -> u64 {
        if item_count > self.count_for_zeta {
            self.zetan = zeta_from(self.count_for_zeta, item_count, self.theta, self.zetan);
            self.count_for_zeta = item_count;
            self.eta = self.compute_eta();
        } else if item_count < self.count_for_zeta && self.allow_item_count_decrease {
            self.zetan = zeta(item_count, self.theta);
            self.count_for_zeta = item_count;
            self.eta = self.compute_eta();
        }

        let uz = u * self.zetan;
        if uz < 1.0 {
            return self.base;
        }
        if uz < 1.0 + 0.5f64.powf(self.theta) {
            return self.base + 1;
        }

        let offset = item_count as f64 * (self.eta * u - self.eta + 1.0).powf(self.alpha);
        self.base + offset as u64
    }

    pub fn items(&self) -> u64 {
        self.items
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn zetan(&self) -> f64 {
        self.zetan
    }

    pub fn count_for_zeta(&self) -> u64 {
        self.count_for_zeta
    }
}

/// 64-bit FNV-1a over the eight little-endian bytes of `value`, read back as
/// a signed integer and made non-negative.
pub fn fnv_hash64(value: u64) -> u64 {
    let mut hash = FNV_OFFSET_BASIS_64;
    let mut rest = value;
    for _ in 0..8 {
        let octet = rest & 0xff;
        rest >>= 8;
        hash ^= octet;
        hash = hash.wrapping_mul(FNV_PRIME_64);
    }
    (hash as i64).unsigned_abs()
}

/// Zipfian sampler with its own RNG
#[derive(Debug, Clone)]
pub struct ZipfianVariate {
    inner: ZipfianGenerator,
    rng: SmallRng,
}

impl ZipfianVariate {
    pub fn with_seed(min: u64, max: u64, theta: f64, seed: u64) -> anyhow::Result<Self> {
        let inner = ZipfianGenerator::with_theta(min, max, theta)?;
        Ok(Self { inner, rng: SmallRng::seed_from_u64(seed) })
    }

    pub fn sample_key(&mut self) -> u64 {
        let u: f64 = self.rng.random();
        self.inner.sample_with(u)
    }
}

/// Zipfian popularity with hashed key identity
///
/// Draws a rank from a Zipfian over a fixed ten-billion item domain, then
/// hashes the rank into `[min, max]`. The frequency skew survives while the
/// hot keys are spread across the range instead of clustering at `min`.
#[derive(Debug, Clone)]
pub struct ScrambledZipfianVariate {
    inner: ZipfianGenerator,
    min: u64,
    item_count: u64,
    rng: SmallRng,
}

impl ScrambledZipfianVariate {
    pub fn with_seed(min: u64, max: u64, theta: f64, seed: u64) -> anyhow::Result<Self> {
        let item_count = range_len(min, max)?;
        let zetan = if theta == ZIPFIAN_CONSTANT {
            SCRAMBLED_ZETAN
        } else {
            zeta(item_count, theta)
        };
        let inner = ZipfianGenerator::with_zetan(0, SCRAMBLED_ITEM_COUNT, theta, zetan)?;

        Ok(Self { inner, min, item_count, rng: SmallRng::seed_from_u64(seed) })
    }

    pub fn sample_key(&mut self) -> u64 {
        let u: f64 = self.rng.random();
        let rank = self.inner.sample_with(u);
        self.min + fnv_hash64(rank) % self.item_count
    }
}

/// Recency-biased sampler anchored on the acknowledged write frontier
///
/// Each draw re-reads the frontier, samples an offset `z` from its own
/// Zipfian over `[0, frontier]` and returns `frontier - z`. The frontier is
/// borrowed per draw; the variate never stores it.
#[derive(Debug, Clone)]
pub struct SkewedLatestVariate {
    inner: ZipfianGenerator,
    rng: SmallRng,
}

impl SkewedLatestVariate {
    /// `initial_bound` sizes the internal Zipfian (`[0, initial_bound]`).
    pub fn with_seed(initial_bound: u64, theta: f64, seed: u64) -> anyhow::Result<Self> {
        let inner = ZipfianGenerator::with_theta(0, initial_bound, theta)?;
        Ok(Self { inner, rng: SmallRng::seed_from_u64(seed) })
    }

    pub fn sample_key(&mut self, frontier: &AcknowledgedCounter) -> u64 {
        let bound = frontier.last_visible();
        let u: f64 = self.rng.random();
        bound.saturating_sub(self.inner.sample_with_count(u, bound))
    }
}

/// Inclusive uniform integer sampler
#[derive(Debug, Clone)]
pub struct UniformIntVariate {
    rng: SmallRng,
    dist: Uniform<u64>,
}

impl UniformIntVariate {
    pub fn with_seed(min: u64, max: u64, seed: u64) -> anyhow::Result<Self> {
        if min > max {
            anyhow::bail!("Uniform min ({}) must be <= max ({})", min, max);
        }
        let dist = Uniform::new_inclusive(min, max)?;
        Ok(Self { rng: SmallRng::seed_from_u64(seed), dist })
    }

    pub fn sample_key(&mut self) -> u64 {
        self.dist.sample(&mut self.rng)
    }
}

/// Binomial shifted to start at `min`: `min + Binomial(n - min, p)`
#[derive(Debug, Clone)]
pub struct BinomialVariate {
    min: u64,
    rng: SmallRng,
    dist: Binomial,
}

impl BinomialVariate {
    pub fn with_seed(min: u64, n: u64, p: f64, seed: u64) -> anyhow::Result<Self> {
        if min > n {
            anyhow::bail!("Binomial min ({}) must be <= n ({})", min, n);
        }
        if !(0.0..=1.0).contains(&p) {
            anyhow::bail!("Binomial p must be in [0.0, 1.0]");
        }
        let dist = Binomial::new(n - min, p)?;
        Ok(Self { min, rng: SmallRng::seed_from_u64(seed), dist })
    }

    pub fn sample_key(&mut self) -> u64 {
        self.min + self.dist.sample(&mut self.rng)
    }
}

/// Integer-valued sampler used for keys and lengths.
#[derive(Debug, Clone)]
pub enum Variate {
    /// Always the same value
    Fixed(u64),
    /// Uniform over an inclusive range
    Uniform(UniformIntVariate),
    /// Shifted binomial
    Binomial(BinomialVariate),
    /// Zipfian, hot end at the range minimum
    Zipfian(ZipfianVariate),
    /// Zipfian frequencies, hashed key identity
    ScrambledZipfian(ScrambledZipfianVariate),
    /// Zipfian offset back from the acknowledged frontier
    SkewedLatest(SkewedLatestVariate),
}

impl Variate {
    pub fn fixed(value: u64) -> Self {
        Self::Fixed(value)
    }

    pub fn uniform(min: u64, max: u64, seed: u64) -> anyhow::Result<Self> {
        Ok(Self::Uniform(UniformIntVariate::with_seed(min, max, seed)?))
    }

    pub fn binomial(min: u64, n: u64, p: f64, seed: u64) -> anyhow::Result<Self> {
        Ok(Self::Binomial(BinomialVariate::with_seed(min, n, p, seed)?))
    }

    pub fn zipfian(min: u64, max: u64, theta: f64, seed: u64) -> anyhow::Result<Self> {
        Ok(Self::Zipfian(ZipfianVariate::with_seed(min, max, theta, seed)?))
    }

    pub fn scrambled_zipfian(min: u64, max: u64, theta: f64, seed: u64) -> anyhow::Result<Self> {
        Ok(Self::ScrambledZipfian(ScrambledZipfianVariate::with_seed(min, max, theta, seed)?))
    }

    pub fn skewed_latest(
        frontier: &AcknowledgedCounter,
        theta: f64,
        seed: u64,
    ) -> anyhow::Result<Self> {
        Ok(Self::SkewedLatest(SkewedLatestVariate::with_seed(
            frontier.last_visible(),
            theta,
            seed,
        )?))
    }

    /// Produce the next value. Only `SkewedLatest` reads `frontier`.
    pub fn next_value(&mut self, frontier: &AcknowledgedCounter) -> u64 {
        match self {
            Self::Fixed(value) => *value,
            Self::Uniform(v) => v.sample_key(),
            Self::Binomial(v) => v.sample_key(),
            Self::Zipfian(v) => v.sample_key(),
            Self::ScrambledZipfian(v) => v.sample_key(),
            Self::SkewedLatest(v) => v.sample_key(frontier),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Fixed(_) => "Fixed",
            Self::Uniform(_) => "Uniform",
            Self::Binomial(_) => "Binomial",
            Self::Zipfian(_) => "Zipfian",
            Self::ScrambledZipfian(_) => "ScrambledZipfian",
            Self::SkewedLatest(_) => "SkewedLatest",
        }
    }
}
