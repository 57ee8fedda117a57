//! Rounding reconciler: forces whole-unit amounts to hit an exact total.
//!
//! Rounding each amount independently can leave the total a few units off
//! (and the upstream scaling step is not guaranteed to preserve the total
//! either). The reconciler distributes the difference as ±1 unit
//! corrections, favouring the amounts that rounding moved the furthest in
//! the opposite direction:
//!
//! ```text
//! diff > 0 → rank by (raw − rounded) desc, +1 each, cycling
//! diff < 0 → rank by (rounded − raw) desc, −1 each, cycling, never below 0
//! ```
//!
//! Ties keep input order, so identical inputs always produce identical
//! outputs.

use pharmsettle_types::round_unit;
use rust_decimal::Decimal;

/// Round `raw_amounts` and correct them so they sum to `target`.
///
/// `target` must be a whole number ≥ 0. Returns an empty vector for empty
/// input; the caller reports the whole target as unallocated in that case.
#[must_use]
pub fn reconcile(target: Decimal, raw_amounts: &[Decimal]) -> Vec<Decimal> {
    let mut rounded: Vec<Decimal> = raw_amounts.iter().copied().map(round_unit).collect();
    if rounded.is_empty() {
        return rounded;
    }

    let diff = target - rounded.iter().copied().sum::<Decimal>();
    if diff.is_zero() {
        return rounded;
    }

    let adding = diff > Decimal::ZERO;
    let ranking = rank_for_correction(raw_amounts, &rounded, adding);
    let step = if adding {
        Decimal::ONE
    } else {
        Decimal::NEGATIVE_ONE
    };

    tracing::debug!(
        %target,
        %diff,
        partners = rounded.len(),
        "Reconciling rounded allocations"
    );

    // Each pass over the ranking moves every eligible amount by one unit,
    // so whole passes are applied in bulk. Only the final partial pass goes
    // unit by unit. A deficit pass skips amounts already at zero.
    let mut gap = diff.abs();
    while !gap.is_zero() {
        let eligible: Vec<usize> = ranking
            .iter()
            .copied()
            .filter(|&idx| adding || rounded[idx] >= Decimal::ONE)
            .collect();
        // Only reachable when every amount is already zero and diff < 0,
        // which would require a negative target.
        if eligible.is_empty() {
            tracing::warn!(%target, remaining = %gap, "Reconciliation could not close the gap");
            break;
        }

        let width = Decimal::from(eligible.len());
        if gap >= width {
            let mut passes = (gap / width).trunc();
            if !adding {
                passes = eligible.iter().map(|&idx| rounded[idx]).fold(passes, Decimal::min);
            }
            for &idx in &eligible {
                rounded[idx] += step * passes;
            }
            gap -= passes * width;
        } else {
            for &idx in &eligible {
                if gap.is_zero() {
                    break;
                }
                rounded[idx] += step;
                gap -= Decimal::ONE;
            }
        }
    }

    rounded
}

/// Indices ordered by how far rounding moved each amount away from the
/// direction of the correction.
fn rank_for_correction(raw: &[Decimal], rounded: &[Decimal], adding: bool) -> Vec<usize> {
    let mut ranking: Vec<usize> = (0..rounded.len()).collect();
    let remainder = |idx: usize| {
        if adding {
            raw[idx] - rounded[idx]
        } else {
            rounded[idx] - raw[idx]
        }
    };
    // Stable sort: equal remainders keep input order.
    ranking.sort_by(|&a, &b| remainder(b).cmp(&remainder(a)));
    ranking
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use rust_decimal::prelude::Signed;

    use super::*;

    fn d(v: i64) -> Decimal {
        Decimal::new(v, 0)
    }

    #[test]
    fn already_balanced_is_untouched() {
        let out = reconcile(d(999), &[d(333), d(333), d(333)]);
        assert_eq!(out, vec![d(333), d(333), d(333)]);
    }

    #[test]
    fn single_unit_goes_to_first_on_tie() {
        let third = Decimal::new(33_333, 2);
        let out = reconcile(d(1000), &[third, third, third]);
        assert_eq!(out, vec![d(334), d(333), d(333)]);
    }

    #[test]
    fn unit_goes_to_largest_remainder() {
        // 100.2 → 100 (rem .2), 200.45 → 200 (rem .45), 299.35 → 299 (rem .35)
        let raw = [Decimal::new(1002, 1), Decimal::new(20045, 2), Decimal::new(29935, 2)];
        let out = reconcile(d(600), &raw);
        assert_eq!(out, vec![d(100), d(201), d(299)]);
    }

    #[test]
    fn surplus_taken_from_largest_round_up() {
        // 499.5005 → 500 (up .4995), 299.7003 → 300 (up .2997), 200.7992 → 201 (up .2008)
        let raw = [
            Decimal::new(4_995_005, 4),
            Decimal::new(2_997_003, 4),
            Decimal::new(2_007_992, 4),
        ];
        let out = reconcile(d(1000), &raw);
        assert_eq!(out, vec![d(499), d(300), d(201)]);
    }

    #[test]
    fn large_gap_cycles_through_partners() {
        // Over-allocated by 200: must cycle many times.
        let out = reconcile(d(1000), &[d(600), d(600)]);
        assert_eq!(out.iter().copied().sum::<Decimal>(), d(1000));
        assert_eq!(out, vec![d(500), d(500)]);
    }

    #[test]
    fn never_takes_below_zero() {
        let out = reconcile(d(3), &[d(0), d(5), d(0)]);
        assert_eq!(out, vec![d(0), d(3), d(0)]);
    }

    #[test]
    fn zero_target_zeroes_everything() {
        let out = reconcile(Decimal::ZERO, &[Decimal::new(4, 1), Decimal::new(6, 1)]);
        assert_eq!(out, vec![d(0), d(0)]);
    }

    #[test]
    fn empty_input() {
        assert!(reconcile(d(500), &[]).is_empty());
    }

    #[test]
    fn huge_surplus_is_spread_in_bulk() {
        let target = d(1_000_000_000_000);
        let out = reconcile(target, &[d(100), d(100)]);
        assert_eq!(out, vec![d(500_000_000_000), d(500_000_000_000)]);

        let out = reconcile(target + Decimal::ONE, &[d(100), Decimal::new(1006, 1), d(7)]);
        assert_eq!(out.iter().copied().sum::<Decimal>(), target + Decimal::ONE);
        // Ranking [0, 2, 1]: the single leftover unit lands on index 0.
        assert_eq!(out[0], out[2] + d(94));
    }

    #[test]
    fn huge_deficit_respects_zero_floor() {
        let out = reconcile(d(10), &[d(1_000_000_000_000), d(0), d(5)]);
        assert_eq!(out, vec![d(10), d(0), d(0)]);
    }

    /// One unit per step; the bulk version must agree with it exactly.
    fn reconcile_unit_by_unit(target: Decimal, raw: &[Decimal]) -> Vec<Decimal> {
        let mut rounded: Vec<Decimal> = raw.iter().copied().map(round_unit).collect();
        let mut diff = target - rounded.iter().copied().sum::<Decimal>();
        if rounded.is_empty() || diff.is_zero() {
            return rounded;
        }
        let ranking = rank_for_correction(raw, &rounded, diff > Decimal::ZERO);
        let step = diff.signum();
        while !diff.is_zero() {
            let mut applied = false;
            for &idx in &ranking {
                if diff.is_zero() {
                    break;
                }
                if step.is_sign_negative() && rounded[idx] < Decimal::ONE {
                    continue;
                }
                rounded[idx] += step;
                diff -= step;
                applied = true;
            }
            if !applied {
                break;
            }
        }
        rounded
    }

    #[test]
    fn bulk_passes_match_unit_steps() {
        let mut rng = StdRng::seed_from_u64(0xb01c);
        for _ in 0..500 {
            let n = rng.gen_range(1..6);
            let raw: Vec<Decimal> = (0..n)
                .map(|_| Decimal::new(rng.gen_range(0..300_000), 2))
                .collect();
            let target = d(rng.gen_range(0..6_000));
            assert_eq!(
                reconcile(target, &raw),
                reconcile_unit_by_unit(target, &raw),
                "target {target}, raw {raw:?}"
            );
        }
    }

    #[test]
    fn randomized_sum_and_non_negativity() {
        let mut rng = StdRng::seed_from_u64(0x5e77);
        for _ in 0..500 {
            let n = rng.gen_range(1..8);
            let raw: Vec<Decimal> = (0..n)
                .map(|_| Decimal::new(rng.gen_range(0..500_000), 2))
                .collect();
            let target = d(rng.gen_range(0..10_000));
            let out = reconcile(target, &raw);
            assert_eq!(out.len(), raw.len());
            assert_eq!(out.iter().copied().sum::<Decimal>(), target);
            assert!(out.iter().all(|a| *a >= Decimal::ZERO));
            assert!(out.iter().all(|a| a.fract().is_zero()));
        }
    }
}
