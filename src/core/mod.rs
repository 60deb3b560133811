pub mod advisory;
mod asset_tax;
mod harvest;
pub mod rates;
mod rebalance;
mod types;

pub use advisory::{
    AdvisoryOption, Assessment, FamilyOfficeNeeds, FamilyOfficeOption, FamilyOfficeProfile,
    Kinship, ScoreAdjustment, ScoringPolicy, TransferNeeds, TransferOption, TransferProfile,
    Verdict, assess_family_office, assess_transfer,
};
pub use asset_tax::compute_asset_tax;
pub use harvest::{build_loss_ledger, classify_loss, compute_harvest, rank_candidates};
pub use rates::TaxRateTable;
pub use rebalance::{DEFAULT_DRIFT_THRESHOLD, allocation_sum, compute_rebalance};
pub use types::{
    AllocationSlice, AssetClass, AssetTaxLine, AssetTaxReport, CarriedLoss, CategoryDelta,
    FinancialInstrument, HarvestCandidate, HarvestInputs, HarvestReport, InstrumentCategory,
    JurisdictionTier, LossLedgerEntry, LossStatus, NotComputableReason, Position, PropertyKind,
    Rate, RealEstateAsset, RebalanceInputs, RebalanceOutcome, RebalancePlan, TaxableAsset,
    TradeAction,
};
