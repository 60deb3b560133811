use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JurisdictionTier {
    Eu,
    NonEu,
    Blacklisted,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FinancialInstrument {
    CurrentAccount,
    SavingsDeposit,
    Stock,
    Etf,
    Bond,
    Fund,
    Crypto,
    Other,
}

impl FinancialInstrument {
    /// Accounts pay the fixed yearly stamp duty instead of the proportional rate.
    pub fn is_account(self) -> bool {
        matches!(self, Self::CurrentAccount | Self::SavingsDeposit)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKind {
    Residential,
    Commercial,
    Land,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InstrumentCategory {
    Financial(FinancialInstrument),
    RealEstate(PropertyKind),
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "rateType", rename_all = "camelCase")]
pub enum Rate {
    Fixed { annual_amount: f64 },
    Percentage { percent: f64 },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxableAsset {
    pub identifier: String,
    pub category: FinancialInstrument,
    pub jurisdiction: String,
    pub jurisdiction_tier: JurisdictionTier,
    pub value_at_period_start: f64,
    pub value_at_period_end: f64,
    pub days_held: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealEstateAsset {
    pub identifier: String,
    pub category: PropertyKind,
    pub jurisdiction: String,
    pub jurisdiction_tier: JurisdictionTier,
    pub cadastral_or_purchase_value: f64,
    pub days_held: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetClass {
    Financial,
    RealEstate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTaxLine {
    pub identifier: String,
    pub jurisdiction: String,
    pub class: AssetClass,
    pub rate: Rate,
    pub pro_rata_value: f64,
    pub tax: f64,
    /// Set when the real-estate franchigia zeroed the computed amount.
    pub exempt: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTaxReport {
    pub total_financial_tax: f64,
    pub total_real_estate_tax: f64,
    pub combined_tax: f64,
    pub total_financial_value: f64,
    pub total_real_estate_value: f64,
    pub aggregated_declared_value: f64,
    pub per_asset_breakdown: Vec<AssetTaxLine>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub identifier: String,
    pub purchase_price: f64,
    pub current_price: f64,
    pub quantity: f64,
}

impl Position {
    pub fn unrealized_pnl(&self) -> f64 {
        (self.current_price - self.purchase_price) * self.quantity
    }

    pub fn current_value(&self) -> f64 {
        self.current_price * self.quantity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarriedLoss {
    pub origin_year: i32,
    pub amount: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LossStatus {
    Available,
    /// Last year the loss may be compensated.
    Expiring,
    Expired,
    /// Origin year after the evaluation year; never compensable.
    Future,
}

impl LossStatus {
    pub fn is_usable(self) -> bool {
        matches!(self, Self::Available | Self::Expiring)
    }
}

#[derive(Debug, Clone)]
pub struct HarvestInputs {
    pub current_year: i32,
    pub realized_gains: f64,
    pub carried_losses: Vec<CarriedLoss>,
    pub positions: Vec<Position>,
    /// Percent, e.g. 26 for the Italian substitute tax on capital gains.
    pub capital_gains_rate: f64,
    /// Percent of position value charged per trade.
    pub transaction_cost_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LossLedgerEntry {
    pub origin_year: i32,
    pub amount: f64,
    pub status: LossStatus,
    pub used: f64,
    pub remaining: f64,
    pub wasted: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestCandidate {
    pub identifier: String,
    pub unrealized_loss: f64,
    pub current_value: f64,
    pub tax_benefit: f64,
    pub transaction_cost: f64,
    pub net_benefit: f64,
    pub recommended: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestReport {
    pub current_year: i32,
    pub realized_gains: f64,
    pub usable_carried_losses: f64,
    pub unrealized_losses: f64,
    pub unrealized_gains: f64,
    pub taxable_without_harvesting: f64,
    pub taxable_with_harvesting: f64,
    pub tax_without_harvesting: f64,
    pub tax_with_harvesting: f64,
    pub savings: f64,
    pub maximum_theoretical_savings: f64,
    pub expiring_loss_amount: f64,
    pub wasted_loss_amount: f64,
    pub expired_loss_amount: f64,
    pub ledger: Vec<LossLedgerEntry>,
    pub ranked_candidates: Vec<HarvestCandidate>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSlice {
    pub category: String,
    pub percent: f64,
}

#[derive(Debug, Clone)]
pub struct RebalanceInputs {
    pub total_value: f64,
    pub current: Vec<AllocationSlice>,
    pub target: Vec<AllocationSlice>,
    /// Percent of traded value.
    pub commission_rate: f64,
    /// Percentage points of absolute drift tolerated before flagging.
    pub drift_threshold: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDelta {
    pub category: String,
    pub current_percent: f64,
    pub target_percent: f64,
    pub current_value: f64,
    pub target_value: f64,
    pub delta: f64,
    pub drift: f64,
    pub relative_drift: f64,
    pub action: TradeAction,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalancePlan {
    pub total_value: f64,
    pub per_category_delta: Vec<CategoryDelta>,
    pub total_turnover: f64,
    pub commission_cost: f64,
    pub max_drift: f64,
    pub drift_threshold: f64,
    pub is_out_of_balance: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "allocation", rename_all = "camelCase")]
pub enum NotComputableReason {
    CurrentAllocation { sum: f64 },
    TargetAllocation { sum: f64 },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RebalanceOutcome {
    Computed(RebalancePlan),
    NotComputable { reason: NotComputableReason },
}

impl RebalanceOutcome {
    pub fn plan(&self) -> Option<&RebalancePlan> {
        match self {
            Self::Computed(plan) => Some(plan),
            Self::NotComputable { .. } => None,
        }
    }
}
