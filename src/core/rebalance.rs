use super::rates::percent_of;
use super::types::{
    AllocationSlice, CategoryDelta, NotComputableReason, RebalanceInputs, RebalanceOutcome,
    RebalancePlan, TradeAction,
};

pub const DEFAULT_DRIFT_THRESHOLD: f64 = 10.0;
/// Slack for float representation when checking that an allocation sums to 100.
pub const ALLOCATION_SUM_TOLERANCE: f64 = 1e-6;

pub fn allocation_sum(slices: &[AllocationSlice]) -> f64 {
    slices.iter().map(|slice| slice.percent).sum()
}

fn sums_to_hundred(sum: f64) -> bool {
    sum.is_finite() && (sum - 100.0).abs() <= ALLOCATION_SUM_TOLERANCE
}

/// Refuses to compute unless both allocations sum to exactly 100; never normalizes.
pub fn compute_rebalance(inputs: &RebalanceInputs) -> RebalanceOutcome {
    let current_sum = allocation_sum(&inputs.current);
    if !sums_to_hundred(current_sum) {
        tracing::debug!(sum = current_sum, "current allocation does not sum to 100");
        return RebalanceOutcome::NotComputable {
            reason: NotComputableReason::CurrentAllocation { sum: current_sum },
        };
    }
    let target_sum = allocation_sum(&inputs.target);
    if !sums_to_hundred(target_sum) {
        tracing::debug!(sum = target_sum, "target allocation does not sum to 100");
        return RebalanceOutcome::NotComputable {
            reason: NotComputableReason::TargetAllocation { sum: target_sum },
        };
    }

    let total = inputs.total_value.max(0.0);
    let mut per_category_delta = Vec::new();
    let mut gross_traded = 0.0;
    let mut max_drift: f64 = 0.0;
    for category in category_union(&inputs.current, &inputs.target) {
        let current_percent = percent_for(&inputs.current, &category);
        let target_percent = percent_for(&inputs.target, &category);
        let current_value = percent_of(total, current_percent);
        let target_value = percent_of(total, target_percent);
        let delta = target_value - current_value;
        let drift = target_percent - current_percent;
        let relative_drift = if target_percent.abs() <= f64::EPSILON {
            0.0
        } else {
            drift / target_percent * 100.0
        };

        gross_traded += delta.abs();
        max_drift = max_drift.max(drift.abs());
        per_category_delta.push(CategoryDelta {
            category,
            current_percent,
            target_percent,
            current_value,
            target_value,
            delta,
            drift,
            relative_drift,
            action: action_for(delta),
        });
    }

    // Every euro sold is a euro bought, so only one side counts as turnover.
    let total_turnover = gross_traded / 2.0;

    RebalanceOutcome::Computed(RebalancePlan {
        total_value: total,
        per_category_delta,
        total_turnover,
        commission_cost: percent_of(total_turnover, inputs.commission_rate),
        max_drift,
        drift_threshold: inputs.drift_threshold,
        is_out_of_balance: max_drift > inputs.drift_threshold,
    })
}

fn action_for(delta: f64) -> TradeAction {
    if delta > 0.0 {
        TradeAction::Buy
    } else if delta < 0.0 {
        TradeAction::Sell
    } else {
        TradeAction::Hold
    }
}

/// Categories in first-appearance order: current first, then target-only ones.
fn category_union(current: &[AllocationSlice], target: &[AllocationSlice]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::with_capacity(current.len() + target.len());
    for slice in current.iter().chain(target) {
        if !categories.iter().any(|known| known == &slice.category) {
            categories.push(slice.category.clone());
        }
    }
    categories
}

fn percent_for(slices: &[AllocationSlice], category: &str) -> f64 {
    slices
        .iter()
        .filter(|slice| slice.category == category)
        .map(|slice| slice.percent)
        .sum()
}
