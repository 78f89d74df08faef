//! Hole scoring model.
//!
//! A player's five skill ratings are blended into one weighted rating `W`. Higher `W`
//! pulls the expected score under par and narrows the spread of the random draw; the
//! hole's difficulty modifier shifts the result either way. Raw scores are rounded
//! half away from zero and clamped to `par - 2 ..= par + 3`.

use crate::model::{Hole, SkillVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Weights for overall, driving, approach, short game and putting. They sum to 1.0.
pub const SKILL_WEIGHTS: [f64; 5] = [0.30, 0.25, 0.25, 0.15, 0.05];

/// Half-width of the random draw before it is scaled by consistency.
pub const DRAW_RANGE: f64 = 3.0;

pub const BEST_RELATIVE_SCORE: i32 = -2;
pub const WORST_RELATIVE_SCORE: i32 = 3;

/// Source of uniform reals. Production wraps an RNG; tests pin the draw.
pub trait UniformSource: Send {
    /// A value in `[low, high)`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

pub struct RngUniform<R> {
    rng: R,
}

impl<R: Rng + Send> RngUniform<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngUniform<StdRng> {
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng + Send> UniformSource for RngUniform<R> {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.rng.gen_range(low..high)
    }
}

/// Always returns the same draw, clamped into the requested range.
#[derive(Debug, Clone, Copy)]
pub struct FixedUniform(pub f64);

impl UniformSource for FixedUniform {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.0.clamp(low, high)
    }
}

impl SkillVector {
    /// The blended rating `W`.
    #[must_use]
    pub fn weighted(&self) -> f64 {
        let ratings = [
            self.overall,
            self.driving,
            self.approach,
            self.short_game,
            self.putting,
        ];
        ratings
            .iter()
            .zip(SKILL_WEIGHTS)
            .map(|(rating, weight)| rating * weight)
            .sum()
    }
}

/// Score for one hole given a weighted rating and an already drawn value in `[-3, 3)`.
#[must_use]
pub fn hole_score_from_draw(weighted: f64, par: u8, difficulty: f64, draw: f64) -> i32 {
    let par_f = f64::from(par);
    let skill_bonus = (weighted - 75.0) / 100.0;
    let base_tendency = par_f - skill_bonus;
    let consistency_factor = (100.0 - weighted) / 100.0;
    let random_factor = draw * consistency_factor;
    let difficulty_factor = (difficulty - 1.0) * 2.0;

    let raw = base_tendency + random_factor + difficulty_factor;
    #[allow(clippy::cast_possible_truncation)]
    let rounded = raw.round() as i32;

    let par_i = i32::from(par);
    rounded.clamp(par_i + BEST_RELATIVE_SCORE, par_i + WORST_RELATIVE_SCORE)
}

/// Draws once from `source` and scores the hole.
pub fn hole_score(skills: &SkillVector, hole: &Hole, source: &mut dyn UniformSource) -> i32 {
    let draw = source.uniform(-DRAW_RANGE, DRAW_RANGE);
    hole_score_from_draw(skills.weighted(), hole.par, hole.difficulty, draw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        let total: f64 = SKILL_WEIGHTS.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn weighted_rating_blends_attributes() {
        let skills = SkillVector {
            overall: 90.0,
            driving: 80.0,
            approach: 80.0,
            short_game: 70.0,
            putting: 100.0,
        };
        // 27 + 20 + 20 + 10.5 + 5
        assert!((skills.weighted() - 82.5).abs() < 1e-9);
    }

    #[test]
    fn fixed_uniform_respects_range() {
        let mut source = FixedUniform(10.0);
        assert!((source.uniform(-3.0, 3.0) - 3.0).abs() < f64::EPSILON);
    }
}
