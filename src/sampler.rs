//! Note sampler: draws one glyph per beat, uniformly and independently,
//! from a tier's repertoire.

use rand::Rng;
use tracing::warn;

use crate::error::{Result, RhythmError};
use crate::model::{DifficultyTier, Measure, Score, BEATS_PER_MEASURE};
use crate::settings::BelowMinimumPolicy;

/// Resolve a requested measure count against the tier's allowed range.
///
/// Counts above the maximum are lowered to it. Counts below the minimum
/// follow `policy`. Non-positive counts are always rejected.
pub fn resolve_measure_count(
    tier: &DifficultyTier,
    requested: i64,
    policy: BelowMinimumPolicy,
) -> Result<u32> {
    if requested <= 0 {
        return Err(RhythmError::InvalidMeasureCount(requested));
    }
    let max = tier.max_measures as i64;
    if requested > max {
        warn!(tier = %tier.id, requested, max, "measure count lowered to tier maximum");
        return Ok(tier.max_measures);
    }
    let count = requested as u32;
    if count >= tier.min_measures {
        return Ok(count);
    }
    match policy {
        BelowMinimumPolicy::Raise => {
            warn!(tier = %tier.id, requested, min = tier.min_measures, "measure count raised to tier minimum");
            Ok(tier.min_measures)
        }
        BelowMinimumPolicy::Reject => Err(RhythmError::MeasureCountBelowMinimum {
            tier: tier.id.clone(),
            requested: count,
            min: tier.min_measures,
        }),
        BelowMinimumPolicy::Permit => Ok(count),
    }
}

/// Sample a score for `tier`, resolving `requested` first.
pub fn sample<R: Rng + ?Sized>(
    tier: &DifficultyTier,
    requested: i64,
    policy: BelowMinimumPolicy,
    rng: &mut R,
) -> Result<Score> {
    let count = resolve_measure_count(tier, requested, policy)?;
    sample_measures(tier, count, rng)
}

/// Draw exactly `count` measures. Sampling is with replacement and carries
/// no state from one beat to the next.
pub fn sample_measures<R: Rng + ?Sized>(
    tier: &DifficultyTier,
    count: u32,
    rng: &mut R,
) -> Result<Score> {
    if tier.glyphs.is_empty() {
        return Err(RhythmError::EmptyRepertoire(tier.id.clone()));
    }
    let pool = &tier.glyphs;
    let measures = (0..count)
        .map(|_| {
            let mut beats = [0; BEATS_PER_MEASURE];
            for beat in beats.iter_mut() {
                *beat = pool[rng.gen_range(0..pool.len())];
            }
            Measure { beats }
        })
        .collect();

    Ok(Score {
        difficulty: tier.id.clone(),
        measures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repertoire::RepertoireTable;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn beginner() -> DifficultyTier {
        RepertoireTable::default().get("beginner").unwrap().clone()
    }

    #[test]
    fn every_beat_comes_from_the_repertoire() {
        let table = RepertoireTable::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for tier in table.tiers() {
            let score = sample(tier, 12, BelowMinimumPolicy::Raise, &mut rng).unwrap();
            let expected = 12.min(tier.max_measures) as usize;
            assert_eq!(score.measure_count(), expected);
            assert_eq!(score.beat_count(), expected * 4);
            assert!(score.beats().all(|g| tier.glyphs.contains(&g)));
            assert_eq!(score.difficulty, tier.id);
        }
    }

    #[test]
    fn same_seed_same_glyphs() {
        let tier = beginner();
        let a = sample(&tier, 8, BelowMinimumPolicy::Raise, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        let b = sample(&tier, 8, BelowMinimumPolicy::Raise, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);

        let c = sample(&tier, 8, BelowMinimumPolicy::Raise, &mut ChaCha8Rng::seed_from_u64(43)).unwrap();
        assert_ne!(a, c, "different seeds should give different worksheets");
    }

    #[test]
    fn seeded_draws_are_pinned() {
        let score = sample_measures(&beginner(), 2, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        assert_eq!(
            score.measures,
            vec![Measure { beats: [2, 1, 0, 2] }, Measure { beats: [2, 0, 1, 2] }]
        );

        let pro = RepertoireTable::default().get("professional").unwrap().clone();
        let score = sample_measures(&pro, 2, &mut ChaCha8Rng::seed_from_u64(7)).unwrap();
        assert_eq!(
            score.measures,
            vec![Measure { beats: [11, 1, 3, 6] }, Measure { beats: [8, 4, 8, 1] }]
        );
    }

    #[test]
    fn all_repertoire_glyphs_eventually_appear() {
        let tier = RepertoireTable::default().get("professional").unwrap().clone();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut seen = [false; 16];
        for _ in 0..20 {
            let score = sample_measures(&tier, 18, &mut rng).unwrap();
            for g in score.beats() {
                seen[g as usize] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn counts_are_clamped_or_rejected() {
        let tier = DifficultyTier::new("range", vec![0], 2, 4, 10);

        assert_eq!(resolve_measure_count(&tier, 25, BelowMinimumPolicy::Raise).unwrap(), 10);
        assert_eq!(resolve_measure_count(&tier, 6, BelowMinimumPolicy::Reject).unwrap(), 6);
        assert_eq!(resolve_measure_count(&tier, 2, BelowMinimumPolicy::Raise).unwrap(), 4);
        assert_eq!(resolve_measure_count(&tier, 2, BelowMinimumPolicy::Permit).unwrap(), 2);
        assert!(matches!(
            resolve_measure_count(&tier, 2, BelowMinimumPolicy::Reject),
            Err(RhythmError::MeasureCountBelowMinimum { requested: 2, min: 4, .. })
        ));

        for bad in [0, -3] {
            for policy in [BelowMinimumPolicy::Raise, BelowMinimumPolicy::Reject, BelowMinimumPolicy::Permit] {
                assert!(matches!(
                    resolve_measure_count(&tier, bad, policy),
                    Err(RhythmError::InvalidMeasureCount(n)) if n == bad
                ));
            }
        }
    }

    #[test]
    fn empty_repertoire_is_fatal() {
        let tier = DifficultyTier::new("hollow", vec![], 2, 1, 4);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(
            sample(&tier, 3, BelowMinimumPolicy::Raise, &mut rng),
            Err(RhythmError::EmptyRepertoire(_))
        ));
    }
}
