use super::types::{InstrumentCategory, JurisdictionTier, Rate};

pub const DAYS_IN_TAX_YEAR: f64 = 365.0;

/// Yearly stamp duty on current accounts and savings deposits held abroad.
pub const IVAFE_ACCOUNT_FIXED_CHARGE: f64 = 34.20;
pub const IVAFE_PERCENT: f64 = 0.2;
pub const IVIE_STANDARD_PERCENT: f64 = 0.76;
pub const IVIE_BLACKLISTED_PERCENT: f64 = 1.06;
/// IVIE amounts at or below this are not due at all.
pub const IVIE_FRANCHIGIA: f64 = 200.0;
pub const CAPITAL_GAINS_PERCENT: f64 = 26.0;

/// Italian policy constants for foreign-held assets and capital gains.
///
/// `Default` reproduces current law. Callers may build a modified table for
/// what-if comparisons; every calculator receives it explicitly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxRateTable {
    pub account_fixed_charge: f64,
    pub financial_percent: f64,
    pub real_estate_percent: f64,
    pub real_estate_blacklisted_percent: f64,
    pub real_estate_franchigia: f64,
    pub capital_gains_percent: f64,
}

impl Default for TaxRateTable {
    fn default() -> Self {
        Self {
            account_fixed_charge: IVAFE_ACCOUNT_FIXED_CHARGE,
            financial_percent: IVAFE_PERCENT,
            real_estate_percent: IVIE_STANDARD_PERCENT,
            real_estate_blacklisted_percent: IVIE_BLACKLISTED_PERCENT,
            real_estate_franchigia: IVIE_FRANCHIGIA,
            capital_gains_percent: CAPITAL_GAINS_PERCENT,
        }
    }
}

impl TaxRateTable {
    pub fn rate_for(&self, category: InstrumentCategory, tier: JurisdictionTier) -> Rate {
        match category {
            InstrumentCategory::Financial(instrument) if instrument.is_account() => Rate::Fixed {
                annual_amount: self.account_fixed_charge,
            },
            InstrumentCategory::Financial(_) => Rate::Percentage {
                percent: self.financial_percent,
            },
            InstrumentCategory::RealEstate(_) => match tier {
                JurisdictionTier::Blacklisted => Rate::Percentage {
                    percent: self.real_estate_blacklisted_percent,
                },
                JurisdictionTier::Eu | JurisdictionTier::NonEu => Rate::Percentage {
                    percent: self.real_estate_percent,
                },
            },
        }
    }

    /// Hard cliff: anything at or below the franchigia is waived entirely.
    pub fn apply_franchigia(&self, computed_tax: f64) -> f64 {
        if computed_tax <= self.real_estate_franchigia {
            0.0
        } else {
            computed_tax
        }
    }
}

/// Fraction of the tax year an asset was held; days beyond a year are capped.
pub fn day_fraction(days_held: u32) -> f64 {
    (days_held as f64).min(DAYS_IN_TAX_YEAR) / DAYS_IN_TAX_YEAR
}

pub fn percent_of(amount: f64, percent: f64) -> f64 {
    amount * percent / 100.0
}
