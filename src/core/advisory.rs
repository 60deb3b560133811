//! Heuristic recommendation scoring for advisory-structure comparators.
//!
//! Every option starts from a baseline, collects fixed points from a hard-coded
//! need/option affinity table, then gets cost-ratio and wealth-tier nudges. Scores
//! are normalized to 100 and the leader is recommended only when it clears the
//! policy threshold. The weights are policy constants, not a fitted model.

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use super::rates::percent_of;

pub trait AdvisoryOption: Copy + Ord + Debug + Serialize + 'static {
    /// All options in declaration order, which is also the tie-break order.
    const ALL: &'static [Self];

    fn label(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPolicy {
    pub baseline: f64,
    pub recommendation_threshold: f64,
    /// `(ratio, points)` pairs checked from the first entry down; the first ratio
    /// exceeded awards its points to the cheaper of the two leading options.
    pub cost_ratio_steps: [(f64, f64); 3],
}

const COST_RATIO_STEPS: [(f64, f64); 3] = [(3.0, 25.0), (2.0, 15.0), (1.5, 5.0)];

impl ScoringPolicy {
    pub fn family_office() -> Self {
        Self {
            baseline: 20.0,
            recommendation_threshold: 50.0,
            cost_ratio_steps: COST_RATIO_STEPS,
        }
    }

    pub fn transfer() -> Self {
        Self {
            baseline: 50.0,
            recommendation_threshold: 65.0,
            cost_ratio_steps: COST_RATIO_STEPS,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreAdjustment<O> {
    pub option: O,
    pub points: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Verdict<O> {
    Recommended { option: O },
    Hybrid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment<O: Ord> {
    pub per_option_score: BTreeMap<O, f64>,
    pub per_option_cost: BTreeMap<O, f64>,
    pub verdict: Verdict<O>,
    pub rationale: Vec<ScoreAdjustment<O>>,
    pub summary: String,
}

struct Scorecard<O: AdvisoryOption> {
    policy: ScoringPolicy,
    scores: BTreeMap<O, f64>,
    rationale: Vec<ScoreAdjustment<O>>,
}

impl<O: AdvisoryOption> Scorecard<O> {
    fn new(policy: ScoringPolicy) -> Self {
        Self {
            policy,
            scores: O::ALL.iter().map(|&option| (option, policy.baseline)).collect(),
            rationale: Vec::new(),
        }
    }

    fn add(&mut self, option: O, points: f64, reason: String) {
        *self.scores.entry(option).or_insert(self.policy.baseline) += points;
        self.rationale.push(ScoreAdjustment {
            option,
            points,
            reason,
        });
    }

    /// Options sorted by score, highest first; equal scores keep declaration order.
    fn ranking(&self) -> Vec<(O, f64)> {
        let mut ranked: Vec<(O, f64)> = self
            .scores
            .iter()
            .map(|(&option, &score)| (option, score))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }

    fn apply_cost_ratio(&mut self, costs: &BTreeMap<O, f64>) {
        let ranking = self.ranking();
        let [(first, _), (second, _), ..] = ranking.as_slice() else {
            return;
        };
        let first_cost = costs.get(first).copied().unwrap_or(0.0);
        let second_cost = costs.get(second).copied().unwrap_or(0.0);
        let (cheaper, cheap_cost, expensive_cost) = if first_cost <= second_cost {
            (*first, first_cost, second_cost)
        } else {
            (*second, second_cost, first_cost)
        };
        if cheap_cost <= 0.0 || !expensive_cost.is_finite() {
            return;
        }

        let ratio = expensive_cost / cheap_cost;
        let award = self
            .policy
            .cost_ratio_steps
            .iter()
            .find(|(threshold, _)| ratio > *threshold)
            .map(|&(_, points)| points);
        if let Some(points) = award {
            self.add(
                cheaper,
                points,
                format!("cost ratio {ratio:.2}x favors the cheaper option"),
            );
        }
    }

    fn finish(self, per_option_cost: BTreeMap<O, f64>) -> Assessment<O> {
        let clamped: BTreeMap<O, f64> = self
            .scores
            .iter()
            .map(|(&option, &score)| (option, score.max(0.0)))
            .collect();
        let total: f64 = clamped.values().sum();
        let per_option_score: BTreeMap<O, f64> = if total > 0.0 {
            clamped
                .into_iter()
                .map(|(option, score)| (option, score / total * 100.0))
                .collect()
        } else {
            let even = 100.0 / O::ALL.len().max(1) as f64;
            O::ALL.iter().map(|&option| (option, even)).collect()
        };

        let mut ranked: Vec<(O, f64)> = per_option_score
            .iter()
            .map(|(&option, &score)| (option, score))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let threshold = self.policy.recommendation_threshold;
        let (verdict, summary) = match ranked.as_slice() {
            [(leader, score), ..] if *score > threshold => (
                Verdict::Recommended { option: *leader },
                format!(
                    "{} leads with {score:.1} of 100 points, above the {threshold:.0} threshold",
                    leader.label()
                ),
            ),
            [(leader, score), (runner_up, _), ..] => (
                Verdict::Hybrid,
                format!(
                    "No option exceeds {threshold:.0} points ({} has {score:.1}); consider combining {} and {}",
                    leader.label(),
                    leader.label(),
                    runner_up.label()
                ),
            ),
            _ => (Verdict::Hybrid, "No option to compare".to_string()),
        };

        Assessment {
            per_option_score,
            per_option_cost,
            verdict,
            rationale: self.rationale,
            summary,
        }
    }
}

// ---------------------------------------------------------------------------
// Family office comparator

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FamilyOfficeOption {
    PrivateBanking,
    MultiFamilyOffice,
    SingleFamilyOffice,
}

impl AdvisoryOption for FamilyOfficeOption {
    const ALL: &'static [Self] = &[
        Self::PrivateBanking,
        Self::MultiFamilyOffice,
        Self::SingleFamilyOffice,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::PrivateBanking => "Private banking",
            Self::MultiFamilyOffice => "Multi family office",
            Self::SingleFamilyOffice => "Single family office",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FamilyOfficeNeeds {
    pub governance: bool,
    pub succession_planning: bool,
    pub alternative_investments: bool,
    pub consolidated_reporting: bool,
    pub dedicated_team: bool,
    pub simple_needs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FamilyOfficeProfile {
    pub assets: f64,
    pub needs: FamilyOfficeNeeds,
}

const PRIVATE_BANKING_FEE_PERCENT: f64 = 1.0;
const MFO_FEE_PERCENT: f64 = 0.6;
const MFO_MINIMUM_FEE: f64 = 75_000.0;
const SFO_FIXED_COST: f64 = 1_200_000.0;
const SFO_VARIABLE_PERCENT: f64 = 0.1;

const FO_SMALL_WEALTH: f64 = 10_000_000.0;
const FO_MID_WEALTH: f64 = 30_000_000.0;
const FO_LARGE_WEALTH: f64 = 150_000_000.0;

pub fn family_office_costs(assets: f64) -> BTreeMap<FamilyOfficeOption, f64> {
    let assets = assets.max(0.0);
    BTreeMap::from([
        (
            FamilyOfficeOption::PrivateBanking,
            percent_of(assets, PRIVATE_BANKING_FEE_PERCENT),
        ),
        (
            FamilyOfficeOption::MultiFamilyOffice,
            percent_of(assets, MFO_FEE_PERCENT).max(MFO_MINIMUM_FEE),
        ),
        (
            FamilyOfficeOption::SingleFamilyOffice,
            SFO_FIXED_COST + percent_of(assets, SFO_VARIABLE_PERCENT),
        ),
    ])
}

fn family_office_affinities(
    needs: &FamilyOfficeNeeds,
) -> Vec<(FamilyOfficeOption, f64, &'static str)> {
    use FamilyOfficeOption::{MultiFamilyOffice, PrivateBanking, SingleFamilyOffice};

    let table: [(bool, &'static str, &[(FamilyOfficeOption, f64)]); 6] = [
        (
            needs.governance,
            "governance",
            &[(SingleFamilyOffice, 15.0), (MultiFamilyOffice, 10.0)],
        ),
        (
            needs.succession_planning,
            "succession planning",
            &[(MultiFamilyOffice, 10.0), (SingleFamilyOffice, 10.0)],
        ),
        (
            needs.alternative_investments,
            "alternative investments",
            &[(MultiFamilyOffice, 10.0), (SingleFamilyOffice, 15.0)],
        ),
        (
            needs.consolidated_reporting,
            "consolidated reporting",
            &[(MultiFamilyOffice, 15.0), (SingleFamilyOffice, 5.0)],
        ),
        (
            needs.dedicated_team,
            "dedicated team",
            &[(SingleFamilyOffice, 20.0)],
        ),
        (needs.simple_needs, "simple needs", &[(PrivateBanking, 25.0)]),
    ];

    table
        .iter()
        .filter(|(active, _, _)| *active)
        .flat_map(|(_, need, weights)| {
            weights
                .iter()
                .map(move |&(option, points)| (option, points, *need))
        })
        .collect()
}

pub fn assess_family_office(
    profile: &FamilyOfficeProfile,
    policy: ScoringPolicy,
) -> Assessment<FamilyOfficeOption> {
    let costs = family_office_costs(profile.assets);
    let mut card = Scorecard::new(policy);

    for (option, points, need) in family_office_affinities(&profile.needs) {
        card.add(option, points, format!("need: {need}"));
    }
    card.apply_cost_ratio(&costs);

    let assets = profile.assets;
    if assets < FO_SMALL_WEALTH {
        card.add(
            FamilyOfficeOption::PrivateBanking,
            20.0,
            "wealth tier: under 10M".to_string(),
        );
    } else if assets >= FO_LARGE_WEALTH {
        card.add(
            FamilyOfficeOption::SingleFamilyOffice,
            20.0,
            "wealth tier: 150M and above".to_string(),
        );
    } else if assets >= FO_MID_WEALTH {
        card.add(
            FamilyOfficeOption::MultiFamilyOffice,
            10.0,
            "wealth tier: 30M to 150M".to_string(),
        );
    }

    card.finish(costs)
}

// ---------------------------------------------------------------------------
// Trust vs donation comparator

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferOption {
    Trust,
    Donation,
}

impl AdvisoryOption for TransferOption {
    const ALL: &'static [Self] = &[Self::Trust, Self::Donation];

    fn label(self) -> &'static str {
        match self {
            Self::Trust => "Trust",
            Self::Donation => "Donation",
        }
    }
}

/// Relationship between donor and beneficiary, which drives gift tax.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Kinship {
    #[default]
    SpouseOrLineal,
    Sibling,
    OtherRelative,
    Unrelated,
}

impl Kinship {
    /// `(rate percent, franchigia per beneficiary)` under the Italian gift tax.
    pub fn gift_tax_terms(self) -> (f64, f64) {
        match self {
            Self::SpouseOrLineal => (4.0, 1_000_000.0),
            Self::Sibling => (6.0, 100_000.0),
            Self::OtherRelative => (6.0, 0.0),
            Self::Unrelated => (8.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransferNeeds {
    pub asset_protection: bool,
    pub retain_control: bool,
    pub vulnerable_beneficiaries: bool,
    pub business_continuity: bool,
    pub immediate_transfer: bool,
    pub simplicity: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferProfile {
    pub assets: f64,
    pub real_estate_value: f64,
    pub beneficiaries: u32,
    pub kinship: Kinship,
    pub horizon_years: u32,
    pub needs: TransferNeeds,
}

const TRUST_SETUP_COST: f64 = 8_000.0;
const TRUST_ANNUAL_PERCENT: f64 = 0.3;
const TRUST_ANNUAL_MINIMUM: f64 = 5_000.0;
const DONATION_NOTARY_COST: f64 = 2_500.0;
/// Mortgage (2%) plus cadastral (1%) tax on donated real estate.
const DONATION_PROPERTY_TRANSFER_PERCENT: f64 = 3.0;

const TRANSFER_LARGE_WEALTH: f64 = 30_000_000.0;
const TRANSFER_SMALL_WEALTH: f64 = 1_000_000.0;

pub fn gift_tax(assets: f64, beneficiaries: u32, kinship: Kinship) -> f64 {
    let beneficiaries = beneficiaries.max(1) as f64;
    let (rate, franchigia) = kinship.gift_tax_terms();
    let share = assets.max(0.0) / beneficiaries;
    percent_of((share - franchigia).max(0.0), rate) * beneficiaries
}

pub fn transfer_costs(profile: &TransferProfile) -> BTreeMap<TransferOption, f64> {
    let assets = profile.assets.max(0.0);
    let trust_yearly = percent_of(assets, TRUST_ANNUAL_PERCENT).max(TRUST_ANNUAL_MINIMUM);
    let trust = TRUST_SETUP_COST + trust_yearly * profile.horizon_years as f64;

    let real_estate = profile.real_estate_value.clamp(0.0, assets);
    let donation = DONATION_NOTARY_COST
        + gift_tax(assets, profile.beneficiaries, profile.kinship)
        + percent_of(real_estate, DONATION_PROPERTY_TRANSFER_PERCENT);

    BTreeMap::from([
        (TransferOption::Trust, trust),
        (TransferOption::Donation, donation),
    ])
}

fn transfer_affinities(needs: &TransferNeeds) -> Vec<(TransferOption, f64, &'static str)> {
    use TransferOption::{Donation, Trust};

    [
        (needs.asset_protection, Trust, 20.0, "asset protection"),
        (needs.retain_control, Trust, 15.0, "retain control"),
        (needs.vulnerable_beneficiaries, Trust, 15.0, "vulnerable beneficiaries"),
        (needs.business_continuity, Trust, 10.0, "business continuity"),
        (needs.immediate_transfer, Donation, 20.0, "immediate transfer"),
        (needs.simplicity, Donation, 20.0, "simplicity"),
    ]
    .into_iter()
    .filter(|(active, ..)| *active)
    .map(|(_, option, points, need)| (option, points, need))
    .collect()
}

pub fn assess_transfer(
    profile: &TransferProfile,
    policy: ScoringPolicy,
) -> Assessment<TransferOption> {
    let costs = transfer_costs(profile);
    let mut card = Scorecard::new(policy);

    for (option, points, need) in transfer_affinities(&profile.needs) {
        card.add(option, points, format!("need: {need}"));
    }
    card.apply_cost_ratio(&costs);

    if profile.assets > TRANSFER_LARGE_WEALTH {
        card.add(
            TransferOption::Trust,
            15.0,
            "wealth tier: above 30M".to_string(),
        );
    } else if profile.assets < TRANSFER_SMALL_WEALTH {
        card.add(
            TransferOption::Donation,
            15.0,
            "wealth tier: under 1M".to_string(),
        );
    }

    card.finish(costs)
}
