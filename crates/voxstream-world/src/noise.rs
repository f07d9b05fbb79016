use fastnoise_lite::{FastNoiseLite, NoiseType};

use crate::worldgen::NoiseSettings;

/// Seeded 2D gradient noise plus the fractal/redistribution pipeline that
/// turns it into terrain heights. Immutable after construction and shared
/// across workers.
pub struct NoiseField {
    seed: i32,
    perlin: FastNoiseLite,
}

impl NoiseField {
    pub fn new(seed: i32) -> Self {
        let mut perlin = FastNoiseLite::with_seed(seed);
        perlin.set_noise_type(Some(NoiseType::Perlin));
        perlin.set_frequency(Some(1.0));
        Self { seed, perlin }
    }

    /// Single noise sample remapped to [0, 1].
    #[inline]
    pub fn sample(&self, x: f32, z: f32) -> f32 {
        ((self.perlin.get_noise_2d(x, z) + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// Octave sum normalized by the total amplitude, so the result stays in
    /// [0, 1]. Zero octaves give 0.
    pub fn fractal(&self, x: f32, z: f32, s: &NoiseSettings) -> f32 {
        let x = x * s.zoom + s.zoom_offset;
        let z = z * s.zoom + s.zoom_offset;
        let mut total = 0.0f32;
        let mut frequency = 1.0f32;
        let mut amplitude = 1.0f32;
        let mut amplitude_sum = 0.0f32;
        for _ in 0..s.octaves {
            total += self.sample((s.noise_offset + x) * frequency, (s.noise_offset + z) * frequency)
                * amplitude;
            amplitude_sum += amplitude;
            frequency *= 2.0;
            amplitude *= s.amplitude_multiplier;
        }
        if amplitude_sum <= 0.0 {
            return 0.0;
        }
        total / amplitude_sum
    }

    #[inline]
    pub fn redistribute(n: f32, s: &NoiseSettings) -> f32 {
        (n * s.redistribution_multiplier).max(0.0).powf(s.exponent)
    }

    #[inline]
    pub fn to_chunk_height(n: f32, height: i32) -> i32 {
        (n * height as f32) as i32
    }

    /// `fractal` followed by `redistribute`.
    #[inline]
    pub fn shaped(&self, x: f32, z: f32, s: &NoiseSettings) -> f32 {
        Self::redistribute(self.fractal(x, z, s), s)
    }

    /// Full height pipeline: fractal, redistribute, scale to `height`.
    #[inline]
    pub fn column_height(&self, x: f32, z: f32, s: &NoiseSettings, height: i32) -> i32 {
        Self::to_chunk_height(self.shaped(x, z, s), height)
    }
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField").field("seed", &self.seed).finish()
    }
}
