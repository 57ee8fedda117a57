//! Allocation recommender. Turns cash, payables, and equity into a proposal.
//!
//! ## Pipeline
//!
//! ```text
//! net_payable ──tolerance/clamp/round──▶ calculated_share
//!      │
//!      ▼ equity correction (boost ≤ 30% share, capped at 60% cash;
//!      │                    reduction ≤ 30% share, floored at 70% share)
//! raw amount
//!      │
//!      ▼ if Σ share > cash: × cash / Σ share
//! scaled amount
//!      │
//!      ▼ round + reconcile to round(cash)
//! adjusted_amount
//! ```
//!
//! Scaling divides by the **unadjusted** share total, so scaled amounts are
//! not guaranteed to sum to the cash; reconciliation is what closes the gap.
//!
//! When every share is zero but there is cash, the cash is split in
//! proportion to ownership instead.

use std::collections::HashMap;

use pharmsettle_types::{
    AllocationPlan, AllocationPolicy, Partner, PartnerId, PartnerPayable, PreSettlementAllocation,
    Result, SettleError, round_unit,
};
use rust_decimal::Decimal;

use crate::reconciler::reconcile;

/// Everything the recommender reads. Borrowed; the recommender never mutates.
#[derive(Debug, Clone, Copy)]
pub struct AllocationInputs<'a> {
    pub available_cash: Decimal,
    pub partners: &'a [Partner],
    pub payables: &'a [PartnerPayable],
    /// `current_equity` per partner; missing partners count as zero.
    pub equity: &'a HashMap<PartnerId, Decimal>,
}

/// Pure, deterministic allocation engine.
#[derive(Debug, Clone, Default)]
pub struct AllocationRecommender {
    policy: AllocationPolicy,
}

impl AllocationRecommender {
    /// # Errors
    /// Returns `Configuration` if the policy is invalid.
    pub fn new(policy: AllocationPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self { policy })
    }

    #[must_use]
    pub fn policy(&self) -> &AllocationPolicy {
        &self.policy
    }

    /// Entitlement for one cycle: clamped at zero, sub-tolerance amounts
    /// dropped, rounded to whole units.
    #[must_use]
    pub fn calculated_share(&self, net_payable: Decimal) -> Decimal {
        let owed = net_payable.max(Decimal::ZERO);
        if owed < self.policy.entitlement_tolerance {
            Decimal::ZERO
        } else {
            round_unit(owed)
        }
    }

    /// Apply the historical equity correction to one entitlement.
    #[must_use]
    pub fn equity_adjusted(
        &self,
        share: Decimal,
        current_equity: Decimal,
        available_cash: Decimal,
    ) -> Decimal {
        if share <= Decimal::ZERO {
            return share;
        }
        if current_equity > Decimal::ZERO {
            let boost = current_equity.min(share * self.policy.boost_ratio);
            (share + boost).min(available_cash * self.policy.boost_cap_ratio)
        } else if current_equity < Decimal::ZERO {
            let reduction = current_equity.abs().min(share * self.policy.reduction_ratio);
            (share - reduction).max(share * self.policy.reduction_floor_ratio)
        } else {
            share
        }
    }

    /// Build a reconciled proposal.
    ///
    /// # Errors
    /// Returns `InvalidCash` if `available_cash` is negative.
    pub fn recommend(&self, inputs: &AllocationInputs<'_>) -> Result<AllocationPlan> {
        let cash = inputs.available_cash;
        if cash < Decimal::ZERO {
            return Err(SettleError::InvalidCash(cash));
        }
        let target_total = round_unit(cash);

        let mut eligible: Vec<&Partner> = inputs.partners.iter().filter(|p| p.is_eligible()).collect();
        eligible.sort_by(|a, b| a.id.cmp(&b.id));
        eligible.dedup_by(|a, b| a.id == b.id);

        if eligible.is_empty() {
            tracing::info!(%cash, "No eligible partners; nothing to allocate");
            return Ok(AllocationPlan {
                available_cash: cash,
                target_total,
                allocations: Vec::new(),
                unallocated: target_total,
            });
        }

        let net_payables = index_payables(inputs.payables, &eligible);

        let shares: Vec<Decimal> = eligible
            .iter()
            .map(|p| {
                let net = net_payables.get(&p.id).copied().unwrap_or(Decimal::ZERO);
                self.calculated_share(net)
            })
            .collect();
        let equities: Vec<Decimal> = eligible
            .iter()
            .map(|p| inputs.equity.get(&p.id).copied().unwrap_or(Decimal::ZERO))
            .collect();
        let share_total: Decimal = shares.iter().copied().sum();

        let raw: Vec<Decimal> = if share_total.is_zero() && cash > Decimal::ZERO {
            ownership_split(&eligible, cash)
        } else {
            let adjusted: Vec<Decimal> = shares
                .iter()
                .zip(&equities)
                .map(|(&share, &equity)| self.equity_adjusted(share, equity, cash))
                .collect();
            if share_total > cash {
                let factor = cash / share_total;
                tracing::debug!(%cash, %share_total, %factor, "Scaling allocations down to available cash");
                adjusted.into_iter().map(|a| a * factor).collect()
            } else {
                adjusted
            }
        };

        let amounts = reconcile(target_total, &raw);

        let allocations: Vec<PreSettlementAllocation> = eligible
            .iter()
            .zip(shares.iter().zip(&equities))
            .zip(amounts)
            .map(|((partner, (&share, &equity)), amount)| {
                PreSettlementAllocation::new(partner, share, amount, equity)
            })
            .collect();

        let allocated: Decimal = allocations.iter().map(|a| a.adjusted_amount).sum();

        tracing::info!(
            %cash,
            partners = allocations.len(),
            %share_total,
            %allocated,
            "Allocation recommended"
        );

        Ok(AllocationPlan {
            available_cash: cash,
            target_total,
            allocations,
            unallocated: target_total - allocated,
        })
    }
}

/// Net payable per eligible partner. Payables for partners outside the
/// eligible set are ignored.
fn index_payables(
    payables: &[PartnerPayable],
    eligible: &[&Partner],
) -> HashMap<PartnerId, Decimal> {
    let mut index = HashMap::with_capacity(eligible.len());
    for payable in payables {
        if eligible.iter().any(|p| p.id == payable.stakeholder_id) {
            *index
                .entry(payable.stakeholder_id.clone())
                .or_insert(Decimal::ZERO) += payable.net_payable;
        } else {
            tracing::warn!(
                stakeholder = %payable.stakeholder_id,
                name = %payable.stakeholder_name,
                "Payable for partner without ownership ignored"
            );
        }
    }
    index
}

/// Split `cash` by ownership percentage. Used only when nobody is owed
/// anything but cash is still on the table.
fn ownership_split(eligible: &[&Partner], cash: Decimal) -> Vec<Decimal> {
    let total_ownership: Decimal = eligible.iter().map(|p| p.ownership_percentage).sum();
    tracing::warn!(
        %cash,
        %total_ownership,
        "All entitlements are zero; splitting cash by ownership"
    );
    eligible
        .iter()
        .map(|p| cash * p.ownership_percentage / total_ownership)
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::*;

    fn d(v: i64) -> Decimal {
        Decimal::new(v, 0)
    }

    fn partner(id: &str, ownership: i64) -> Partner {
        Partner::new(id, id.to_uppercase(), d(ownership))
    }

    fn payable(id: &str, net: Decimal) -> PartnerPayable {
        PartnerPayable::from_totals(PartnerId::new(id), id.to_uppercase(), net, Decimal::ZERO)
    }

    fn recommend(
        cash: Decimal,
        partners: &[Partner],
        payables: &[PartnerPayable],
        equity: &[(&str, i64)],
    ) -> AllocationPlan {
        let equity: HashMap<PartnerId, Decimal> =
            equity.iter().map(|(id, e)| (PartnerId::new(*id), d(*e))).collect();
        AllocationRecommender::default()
            .recommend(&AllocationInputs {
                available_cash: cash,
                partners,
                payables,
                equity: &equity,
            })
            .unwrap()
    }

    fn amounts(plan: &AllocationPlan) -> Vec<Decimal> {
        plan.allocations.iter().map(|a| a.adjusted_amount).collect()
    }

    #[test]
    fn even_split_without_equity() {
        let partners = [partner("a", 50), partner("b", 50)];
        let payables = [payable("a", d(500)), payable("b", d(500))];
        let plan = recommend(d(1000), &partners, &payables, &[]);
        assert_eq!(amounts(&plan), vec![d(500), d(500)]);
        assert!(plan.allocations.iter().all(|a| a.equity_adjustment.is_zero()));
        assert_eq!(plan.unallocated, Decimal::ZERO);
    }

    #[test]
    fn exact_thirds_need_no_reconciliation() {
        let partners = [partner("a", 33), partner("b", 33), partner("c", 33)];
        let payables = [payable("a", d(333)), payable("b", d(333)), payable("c", d(333))];
        let plan = recommend(d(999), &partners, &payables, &[]);
        assert_eq!(amounts(&plan), vec![d(333), d(333), d(333)]);
    }

    #[test]
    fn cash_far_above_entitlements_is_fully_allocated() {
        let partners = [partner("a", 50), partner("b", 50)];
        let payables = [payable("a", d(100)), payable("b", d(100))];
        let cash = d(1_000_000_000_000);
        let plan = recommend(cash, &partners, &payables, &[]);
        assert_eq!(plan.allocated_total(), cash);
        assert_eq!(amounts(&plan), vec![d(500_000_000_000), d(500_000_000_000)]);
        assert_eq!(plan.allocations[0].calculated_share, d(100));
    }

    #[test]
    fn scaled_thirds_reconcile_to_cash() {
        // Σ share = 1200 > 1000 → each scaled to 333.33…
        let partners = [partner("a", 33), partner("b", 33), partner("c", 33)];
        let payables = [payable("a", d(400)), payable("b", d(400)), payable("c", d(400))];
        let plan = recommend(d(1000), &partners, &payables, &[]);
        assert_eq!(plan.allocated_total(), d(1000));
        let mut sorted = amounts(&plan);
        sorted.sort();
        assert_eq!(sorted, vec![d(333), d(333), d(334)]);
        assert_eq!(amounts(&plan)[0], d(334), "tie goes to first partner id");
    }

    #[test]
    fn positive_equity_boosts_within_cash_cap() {
        let partners = [partner("a", 50), partner("b", 50)];
        let payables = [payable("a", d(100)), payable("b", d(100))];
        let recommender = AllocationRecommender::default();

        // Uncapped: 100 + min(200, 30) = 130.
        assert_eq!(recommender.equity_adjusted(d(100), d(200), d(1000)), d(130));
        // Capped at 0.6 * 150 = 90.
        assert_eq!(recommender.equity_adjusted(d(100), d(200), d(150)), d(90));

        let plan = recommend(d(1000), &partners, &payables, &[("a", 200)]);
        let a = &plan.allocations[0];
        assert!(a.adjusted_amount > d(100));
        assert!(a.adjusted_amount <= d(600));
        assert_eq!(plan.allocated_total(), d(1000));
    }

    #[test]
    fn negative_equity_reduces_to_floor() {
        let recommender = AllocationRecommender::default();
        // reduction = min(20, 30) = 20 → 80
        assert_eq!(recommender.equity_adjusted(d(100), d(-20), d(1000)), d(80));
        // reduction capped at 30 → 70 = floor
        assert_eq!(recommender.equity_adjusted(d(100), d(-500), d(1000)), d(70));
        // zero share is never adjusted
        assert_eq!(recommender.equity_adjusted(Decimal::ZERO, d(500), d(1000)), Decimal::ZERO);
    }

    #[test]
    fn sub_unit_payable_is_not_an_entitlement() {
        let recommender = AllocationRecommender::default();
        assert_eq!(recommender.calculated_share(Decimal::new(6, 1)), Decimal::ZERO);
        assert_eq!(recommender.calculated_share(Decimal::new(-40, 0)), Decimal::ZERO);
        assert_eq!(recommender.calculated_share(Decimal::ONE), Decimal::ONE);
        assert_eq!(recommender.calculated_share(Decimal::new(15, 1)), d(2));
    }

    #[test]
    fn zero_cash_rounds_every_amount_to_zero() {
        let partners = [partner("a", 100)];
        let payables = [payable("a", Decimal::ONE)];
        let plan = recommend(Decimal::ZERO, &partners, &payables, &[]);
        let a = &plan.allocations[0];
        assert_eq!(a.calculated_share, Decimal::ONE);
        assert_eq!(a.adjusted_amount, Decimal::ZERO);
        assert_eq!(a.equity_adjustment, Decimal::NEGATIVE_ONE);
    }

    #[test]
    fn no_eligible_partners_leaves_cash_unallocated() {
        let partners = [partner("a", 0)];
        let payables = [payable("a", d(100))];
        let plan = recommend(Decimal::new(5004, 1), &partners, &payables, &[]);
        assert!(plan.is_empty());
        assert_eq!(plan.unallocated, d(500));
    }

    #[test]
    fn zero_entitlements_fall_back_to_ownership() {
        let partners = [partner("a", 60), partner("b", 20), partner("c", 20)];
        let plan = recommend(d(1001), &partners, &[], &[]);
        assert_eq!(amounts(&plan), vec![Decimal::new(601, 0), d(200), d(200)]);
        assert!(plan.allocations.iter().all(|a| a.calculated_share.is_zero()));
    }

    #[test]
    fn unknown_payables_ignored() {
        let partners = [partner("a", 100)];
        let payables = [payable("a", d(300)), payable("ghost", d(900))];
        let plan = recommend(d(300), &partners, &payables, &[]);
        assert_eq!(plan.allocations.len(), 1);
        assert_eq!(amounts(&plan), vec![d(300)]);
    }

    #[test]
    fn negative_cash_rejected() {
        let equity = HashMap::new();
        let err = AllocationRecommender::default()
            .recommend(&AllocationInputs {
                available_cash: Decimal::NEGATIVE_ONE,
                partners: &[],
                payables: &[],
                equity: &equity,
            })
            .unwrap_err();
        assert!(matches!(err, SettleError::InvalidCash(_)));
    }

    #[test]
    fn invalid_policy_rejected() {
        let policy = AllocationPolicy {
            boost_ratio: d(2),
            ..AllocationPolicy::default()
        };
        assert!(AllocationRecommender::new(policy).is_err());
    }

    #[test]
    fn partner_order_does_not_change_outcome() {
        let forward = [partner("a", 40), partner("b", 35), partner("c", 25)];
        let reverse = [partner("c", 25), partner("b", 35), partner("a", 40)];
        let payables = [payable("a", d(410)), payable("b", d(377)), payable("c", d(251))];
        let equity = [("a", -40), ("b", 90)];
        let p1 = recommend(d(997), &forward, &payables, &equity);
        let p2 = recommend(d(997), &reverse, &payables, &equity);
        assert_eq!(p1, p2);
    }

    #[test]
    fn randomized_invariants() {
        let mut rng = StdRng::seed_from_u64(0xa110c);
        let recommender = AllocationRecommender::default();
        for _ in 0..300 {
            let n = rng.gen_range(1..6);
            let partners: Vec<Partner> = (0..n)
                .map(|i| partner(&format!("p{i}"), rng.gen_range(1..100)))
                .collect();
            let payables: Vec<PartnerPayable> = partners
                .iter()
                .map(|p| payable(p.id.as_str(), Decimal::new(rng.gen_range(-10_000..200_000), 2)))
                .collect();
            let equity: HashMap<PartnerId, Decimal> = partners
                .iter()
                .map(|p| (p.id.clone(), d(rng.gen_range(-500..500))))
                .collect();
            let cash = Decimal::new(rng.gen_range(0..500_000), 2);

            let plan = recommender
                .recommend(&AllocationInputs {
                    available_cash: cash,
                    partners: &partners,
                    payables: &payables,
                    equity: &equity,
                })
                .unwrap();

            assert_eq!(plan.allocated_total(), round_unit(cash), "sum invariant");
            assert!(plan.unallocated.is_zero());
            for a in &plan.allocations {
                assert!(a.adjusted_amount >= Decimal::ZERO, "non-negative");
                assert_eq!(a.equity_adjustment, a.adjusted_amount - a.calculated_share);
                assert_eq!(a.projected_equity, a.current_equity + a.equity_adjustment);
                let cap = recommender.equity_adjusted(a.calculated_share, a.current_equity, cash);
                if a.current_equity > Decimal::ZERO && a.calculated_share > Decimal::ZERO {
                    assert!(cap <= cash * Decimal::new(6, 1), "boost cap");
                }
                if a.current_equity < Decimal::ZERO && a.calculated_share > Decimal::ZERO {
                    assert!(cap >= a.calculated_share * Decimal::new(7, 1), "reduction floor");
                }
            }
        }
    }
}
