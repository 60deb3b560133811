use std::cmp::Ordering;

use super::rates::percent_of;
use super::types::{
    CarriedLoss, HarvestCandidate, HarvestInputs, HarvestReport, LossLedgerEntry, LossStatus,
    Position,
};

/// Losses may offset gains realized in the four tax years starting with the origin year.
pub const COMPENSATION_WINDOW_YEARS: i32 = 4;

pub fn classify_loss(loss: &CarriedLoss, current_year: i32) -> LossStatus {
    let age = current_year - loss.origin_year;
    if age < 0 {
        LossStatus::Future
    } else if age < COMPENSATION_WINDOW_YEARS - 1 {
        LossStatus::Available
    } else if age == COMPENSATION_WINDOW_YEARS - 1 {
        LossStatus::Expiring
    } else {
        LossStatus::Expired
    }
}

/// Consumes usable losses oldest-first against `realized_gains`.
///
/// Whatever an expiring loss cannot absorb this year is lost for good and is
/// reported as `wasted`.
pub fn build_loss_ledger(
    losses: &[CarriedLoss],
    current_year: i32,
    realized_gains: f64,
) -> Vec<LossLedgerEntry> {
    let mut sorted: Vec<CarriedLoss> = losses.to_vec();
    sorted.sort_by_key(|loss| loss.origin_year);

    let mut gains_left = realized_gains.max(0.0);
    sorted
        .into_iter()
        .map(|loss| {
            let amount = loss.amount.max(0.0);
            let status = classify_loss(&loss, current_year);
            let used = if status.is_usable() {
                amount.min(gains_left)
            } else {
                0.0
            };
            gains_left -= used;
            let remaining = if status.is_usable() {
                amount - used
            } else {
                0.0
            };
            let wasted = if status == LossStatus::Expiring {
                remaining
            } else {
                0.0
            };
            LossLedgerEntry {
                origin_year: loss.origin_year,
                amount,
                status,
                used,
                remaining,
                wasted,
            }
        })
        .collect()
}

pub fn compute_harvest(inputs: &HarvestInputs) -> HarvestReport {
    let rate = inputs.capital_gains_rate;
    let realized_gains = inputs.realized_gains.max(0.0);

    let ledger = build_loss_ledger(&inputs.carried_losses, inputs.current_year, realized_gains);
    let mut usable_carried_losses = 0.0;
    let mut expiring_loss_amount = 0.0;
    let mut expired_loss_amount = 0.0;
    let mut wasted_loss_amount = 0.0;
    for entry in &ledger {
        match entry.status {
            LossStatus::Available => usable_carried_losses += entry.amount,
            LossStatus::Expiring => {
                usable_carried_losses += entry.amount;
                expiring_loss_amount += entry.amount;
            }
            LossStatus::Expired => expired_loss_amount += entry.amount,
            LossStatus::Future => {}
        }
        wasted_loss_amount += entry.wasted;
    }

    let mut unrealized_losses = 0.0;
    let mut unrealized_gains = 0.0;
    for position in &inputs.positions {
        let pnl = position.unrealized_pnl();
        if pnl < 0.0 {
            unrealized_losses += -pnl;
        } else {
            unrealized_gains += pnl;
        }
    }

    let taxable_without_harvesting = taxable_gain(realized_gains, usable_carried_losses);
    let taxable_with_harvesting =
        taxable_gain(realized_gains, usable_carried_losses + unrealized_losses);
    let tax_without_harvesting = percent_of(taxable_without_harvesting, rate);
    let tax_with_harvesting = percent_of(taxable_with_harvesting, rate);

    tracing::debug!(
        current_year = inputs.current_year,
        taxable_without_harvesting,
        taxable_with_harvesting,
        wasted_loss_amount,
        "computed loss compensation"
    );

    HarvestReport {
        current_year: inputs.current_year,
        realized_gains,
        usable_carried_losses,
        unrealized_losses,
        unrealized_gains,
        taxable_without_harvesting,
        taxable_with_harvesting,
        tax_without_harvesting,
        tax_with_harvesting,
        savings: tax_without_harvesting - tax_with_harvesting,
        maximum_theoretical_savings: percent_of(unrealized_losses, rate),
        expiring_loss_amount,
        wasted_loss_amount,
        expired_loss_amount,
        ledger,
        ranked_candidates: rank_candidates(
            &inputs.positions,
            rate,
            inputs.transaction_cost_rate,
        ),
    }
}

fn taxable_gain(realized_gains: f64, compensable_losses: f64) -> f64 {
    (realized_gains - compensable_losses).max(0.0)
}

/// Loss-making positions ordered by net benefit, best first.
///
/// Transaction cost is charged twice: once to sell, once to buy back.
pub fn rank_candidates(
    positions: &[Position],
    capital_gains_rate: f64,
    transaction_cost_rate: f64,
) -> Vec<HarvestCandidate> {
    let mut candidates: Vec<HarvestCandidate> = positions
        .iter()
        .filter(|position| position.unrealized_pnl() < 0.0)
        .map(|position| {
            let unrealized_loss = -position.unrealized_pnl();
            let current_value = position.current_value().max(0.0);
            let tax_benefit = percent_of(unrealized_loss, capital_gains_rate);
            let transaction_cost = percent_of(current_value, transaction_cost_rate) * 2.0;
            let net_benefit = tax_benefit - transaction_cost;
            HarvestCandidate {
                identifier: position.identifier.clone(),
                unrealized_loss,
                current_value,
                tax_benefit,
                transaction_cost,
                net_benefit,
                recommended: net_benefit > 0.0,
            }
        })
        .collect();

    candidates.sort_by(|a, b| match b.net_benefit.total_cmp(&a.net_benefit) {
        Ordering::Equal => a.identifier.cmp(&b.identifier),
        other => other,
    });
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn loss(origin_year: i32, amount: f64) -> CarriedLoss {
        CarriedLoss {
            origin_year,
            amount,
        }
    }

    fn position(identifier: &str, purchase: f64, current: f64, quantity: f64) -> Position {
        Position {
            identifier: identifier.to_string(),
            purchase_price: purchase,
            current_price: current,
            quantity,
        }
    }

    fn sample_inputs() -> HarvestInputs {
        HarvestInputs {
            current_year: 2025,
            realized_gains: 10_000.0,
            carried_losses: Vec::new(),
            positions: Vec::new(),
            capital_gains_rate: 26.0,
            transaction_cost_rate: 0.1,
        }
    }

    #[test]
    fn classification_follows_four_year_window() {
        assert_eq!(classify_loss(&loss(2025, 1.0), 2025), LossStatus::Available);
        assert_eq!(classify_loss(&loss(2023, 1.0), 2025), LossStatus::Available);
        assert_eq!(classify_loss(&loss(2022, 1.0), 2025), LossStatus::Expiring);
        assert_eq!(classify_loss(&loss(2021, 1.0), 2025), LossStatus::Expired);
        assert_eq!(classify_loss(&loss(2026, 1.0), 2025), LossStatus::Future);
    }

    #[test]
    fn carried_losses_reduce_taxable_gain() {
        let mut inputs = sample_inputs();
        inputs.carried_losses = vec![loss(2024, 2_000.0), loss(2022, 1_500.0)];

        let report = compute_harvest(&inputs);
        assert_approx(report.taxable_without_harvesting, 6_500.0);
        assert_approx(report.tax_without_harvesting, 1_690.0);
        assert_approx(report.tax_with_harvesting, 1_690.0);
        assert_approx(report.savings, 0.0);
        assert_approx(report.expiring_loss_amount, 1_500.0);
        assert_approx(report.wasted_loss_amount, 0.0);
        assert!(report.ranked_candidates.is_empty());
    }

    #[test]
    fn oldest_loss_is_consumed_first_and_expiring_remainder_is_wasted() {
        let ledger = build_loss_ledger(
            &[loss(2024, 3_000.0), loss(2022, 1_000.0), loss(2023, 2_000.0)],
            2025,
            600.0,
        );

        let years: Vec<i32> = ledger.iter().map(|entry| entry.origin_year).collect();
        assert_eq!(years, vec![2022, 2023, 2024]);

        assert_eq!(ledger[0].status, LossStatus::Expiring);
        assert_approx(ledger[0].used, 600.0);
        assert_approx(ledger[0].remaining, 400.0);
        assert_approx(ledger[0].wasted, 400.0);

        assert_approx(ledger[1].used, 0.0);
        assert_approx(ledger[1].remaining, 2_000.0);
        assert_approx(ledger[1].wasted, 0.0);
        assert_approx(ledger[2].remaining, 3_000.0);
    }

    #[test]
    fn expiring_loss_fully_absorbed_wastes_nothing() {
        let mut inputs = sample_inputs();
        inputs.realized_gains = 5_000.0;
        inputs.carried_losses = vec![loss(2022, 4_000.0), loss(2024, 3_000.0)];

        let report = compute_harvest(&inputs);
        assert_approx(report.wasted_loss_amount, 0.0);
        assert_approx(report.ledger[0].used, 4_000.0);
        assert_approx(report.ledger[1].used, 1_000.0);
        assert_approx(report.ledger[1].remaining, 2_000.0);
    }

    #[test]
    fn expired_and_future_losses_never_compensate() {
        let mut inputs = sample_inputs();
        inputs.carried_losses = vec![loss(2019, 5_000.0), loss(2021, 5_000.0), loss(2027, 5_000.0)];

        let report = compute_harvest(&inputs);
        assert_approx(report.usable_carried_losses, 0.0);
        assert_approx(report.expired_loss_amount, 10_000.0);
        assert_approx(report.taxable_without_harvesting, 10_000.0);
        assert!(report.ledger.iter().all(|entry| entry.used == 0.0));
    }

    #[test]
    fn harvesting_unrealized_losses_produces_savings() {
        let mut inputs = sample_inputs();
        inputs.positions = vec![
            position("ENEL", 8.0, 6.0, 1_000.0),
            position("ISP", 2.0, 3.0, 1_000.0),
            position("STLA", 20.0, 15.0, 400.0),
        ];

        let report = compute_harvest(&inputs);
        assert_approx(report.unrealized_losses, 4_000.0);
        assert_approx(report.unrealized_gains, 1_000.0);
        assert_approx(report.tax_without_harvesting, 2_600.0);
        assert_approx(report.tax_with_harvesting, 1_560.0);
        assert_approx(report.savings, 1_040.0);
        assert_approx(report.maximum_theoretical_savings, 1_040.0);
    }

    #[test]
    fn compensation_never_goes_below_zero() {
        let mut inputs = sample_inputs();
        inputs.realized_gains = 1_000.0;
        inputs.carried_losses = vec![loss(2024, 50_000.0)];
        inputs.positions = vec![position("TIT", 1.0, 0.2, 100_000.0)];

        let report = compute_harvest(&inputs);
        assert_eq!(report.taxable_without_harvesting, 0.0);
        assert_eq!(report.taxable_with_harvesting, 0.0);
        assert_eq!(report.tax_with_harvesting, 0.0);
        assert_approx(report.savings, 0.0);
        assert_approx(report.maximum_theoretical_savings, 80_000.0 * 0.26);
    }

    #[test]
    fn candidates_ranked_by_net_benefit_and_cost_can_block_recommendation() {
        // Tiny loss on a large position: tax benefit 1.30, round-trip cost 20.
        let candidates = rank_candidates(
            &[
                position("BIG", 100.05, 100.0, 100.0),
                position("MID", 12.0, 10.0, 500.0),
                position("GAIN", 1.0, 2.0, 10.0),
            ],
            26.0,
            0.1,
        );

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].identifier, "MID");
        assert_approx(candidates[0].tax_benefit, 260.0);
        assert_approx(candidates[0].transaction_cost, 10.0);
        assert_approx(candidates[0].net_benefit, 250.0);
        assert!(candidates[0].recommended);

        assert_eq!(candidates[1].identifier, "BIG");
        assert!(candidates[1].net_benefit < 0.0);
        assert!(!candidates[1].recommended);
    }

    #[test]
    fn equal_net_benefit_ties_break_by_identifier() {
        let candidates = rank_candidates(
            &[position("B", 2.0, 1.0, 10.0), position("A", 2.0, 1.0, 10.0)],
            26.0,
            0.0,
        );
        assert_eq!(candidates[0].identifier, "A");
        assert_eq!(candidates[1].identifier, "B");
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_taxable_gain_is_never_negative_and_harvesting_never_costs_tax(
            gains in 0u32..500_000,
            carried in proptest::collection::vec((2018i32..2027, 0u32..200_000), 0..6),
            position_moves in proptest::collection::vec((1u32..1_000, 1u32..1_000, 1u32..500), 0..6)
        ) {
            let mut inputs = sample_inputs();
            inputs.realized_gains = gains as f64;
            inputs.carried_losses = carried
                .iter()
                .map(|(year, amount)| loss(*year, *amount as f64))
                .collect();
            inputs.positions = position_moves
                .iter()
                .enumerate()
                .map(|(idx, (buy, now, qty))| {
                    position(&format!("P{idx}"), *buy as f64, *now as f64, *qty as f64)
                })
                .collect();

            let report = compute_harvest(&inputs);
            prop_assert!(report.taxable_without_harvesting >= 0.0);
            prop_assert!(report.taxable_with_harvesting >= 0.0);
            prop_assert!(report.taxable_with_harvesting <= report.taxable_without_harvesting + EPS);
            prop_assert!(report.savings >= -EPS);
            prop_assert!(report.savings <= report.maximum_theoretical_savings + EPS);
            prop_assert!(report.wasted_loss_amount <= report.expiring_loss_amount + EPS);

            let used: f64 = report.ledger.iter().map(|entry| entry.used).sum();
            prop_assert!(used <= report.realized_gains + EPS);
        }
    }
}
