use axum::{
    Router,
    extract::{Json, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    AllocationSlice, AssetTaxReport, Assessment, CarriedLoss, DEFAULT_DRIFT_THRESHOLD,
    FamilyOfficeNeeds, FamilyOfficeOption, FamilyOfficeProfile, HarvestInputs, HarvestReport,
    Kinship, Position, RealEstateAsset, RebalanceInputs, RebalanceOutcome, ScoringPolicy,
    TaxRateTable, TaxableAsset, TransferNeeds, TransferOption, TransferProfile,
    assess_family_office, assess_transfer, compute_asset_tax, compute_harvest, compute_rebalance,
};
use crate::error::{self, AppError};

const DEFAULT_TRANSACTION_COST_RATE: f64 = 0.1;
const DEFAULT_COMMISSION_RATE: f64 = 0.19;
const DEFAULT_TRANSFER_HORIZON_YEARS: u32 = 10;
const MAX_DAYS_HELD: u32 = 365;

/// The calculators exposed over HTTP and on the command line.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Calculator {
    AssetTax,
    LossHarvest,
    Rebalance,
    FamilyOffice,
    TrustVsDonation,
}

impl Calculator {
    pub fn name(self) -> &'static str {
        match self {
            Calculator::AssetTax => "asset-tax",
            Calculator::LossHarvest => "loss-harvest",
            Calculator::Rebalance => "rebalance",
            Calculator::FamilyOffice => "family-office",
            Calculator::TrustVsDonation => "trust-vs-donation",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AssetTaxPayload {
    financial_assets: Vec<TaxableAsset>,
    real_estate_assets: Vec<RealEstateAsset>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct HarvestPayload {
    current_year: Option<i32>,
    realized_gains: Option<f64>,
    carried_losses: Vec<CarriedLoss>,
    positions: Vec<Position>,
    capital_gains_rate: Option<f64>,
    transaction_cost_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RebalancePayload {
    total_value: Option<f64>,
    current: Vec<AllocationSlice>,
    target: Vec<AllocationSlice>,
    commission_rate: Option<f64>,
    drift_threshold: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FamilyOfficePayload {
    assets: Option<f64>,
    needs: FamilyOfficeNeeds,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TransferPayload {
    assets: Option<f64>,
    real_estate_value: Option<f64>,
    beneficiaries: Option<u32>,
    kinship: Option<Kinship>,
    horizon_years: Option<u32>,
    needs: TransferNeeds,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

fn require_amount(name: &str, value: f64) -> Result<f64, String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{name} must be a finite amount >= 0"));
    }
    Ok(value)
}

fn require_percent(name: &str, value: f64) -> Result<f64, String> {
    if !(0.0..=100.0).contains(&value) {
        return Err(format!("{name} must be between 0 and 100"));
    }
    Ok(value)
}

fn build_asset_tax_inputs(
    payload: AssetTaxPayload,
) -> Result<(Vec<TaxableAsset>, Vec<RealEstateAsset>), String> {
    for asset in &payload.financial_assets {
        if asset.days_held > MAX_DAYS_HELD {
            return Err(format!(
                "daysHeld for '{}' must be between 0 and 365",
                asset.identifier
            ));
        }
        require_amount("valueAtPeriodStart", asset.value_at_period_start)?;
        require_amount("valueAtPeriodEnd", asset.value_at_period_end)?;
    }
    for asset in &payload.real_estate_assets {
        if asset.days_held > MAX_DAYS_HELD {
            return Err(format!(
                "daysHeld for '{}' must be between 0 and 365",
                asset.identifier
            ));
        }
        require_amount("cadastralOrPurchaseValue", asset.cadastral_or_purchase_value)?;
    }
    Ok((payload.financial_assets, payload.real_estate_assets))
}

fn build_harvest_inputs(payload: HarvestPayload, table: &TaxRateTable) -> Result<HarvestInputs, String> {
    let Some(current_year) = payload.current_year else {
        return Err("currentYear is required".to_string());
    };
    let realized_gains = require_amount("realizedGains", payload.realized_gains.unwrap_or(0.0))?;
    for loss in &payload.carried_losses {
        require_amount("carriedLosses[].amount", loss.amount)?;
    }
    for position in &payload.positions {
        require_amount("positions[].purchasePrice", position.purchase_price)?;
        require_amount("positions[].currentPrice", position.current_price)?;
        require_amount("positions[].quantity", position.quantity)?;
    }
    let capital_gains_rate = require_percent(
        "capitalGainsRate",
        payload
            .capital_gains_rate
            .unwrap_or(table.capital_gains_percent),
    )?;
    let transaction_cost_rate = require_percent(
        "transactionCostRate",
        payload
            .transaction_cost_rate
            .unwrap_or(DEFAULT_TRANSACTION_COST_RATE),
    )?;

    Ok(HarvestInputs {
        current_year,
        realized_gains,
        carried_losses: payload.carried_losses,
        positions: payload.positions,
        capital_gains_rate,
        transaction_cost_rate,
    })
}

fn build_rebalance_inputs(payload: RebalancePayload) -> Result<RebalanceInputs, String> {
    let Some(total_value) = payload.total_value else {
        return Err("totalValue is required".to_string());
    };
    let total_value = require_amount("totalValue", total_value)?;
    if payload.current.is_empty() || payload.target.is_empty() {
        return Err("current and target allocations must not be empty".to_string());
    }
    for slice in payload.current.iter().chain(&payload.target) {
        require_percent(&format!("percent for '{}'", slice.category), slice.percent)?;
    }
    let commission_rate = require_percent(
        "commissionRate",
        payload.commission_rate.unwrap_or(DEFAULT_COMMISSION_RATE),
    )?;
    let drift_threshold = require_percent(
        "driftThreshold",
        payload.drift_threshold.unwrap_or(DEFAULT_DRIFT_THRESHOLD),
    )?;

    Ok(RebalanceInputs {
        total_value,
        current: payload.current,
        target: payload.target,
        commission_rate,
        drift_threshold,
    })
}

fn build_family_office_profile(payload: FamilyOfficePayload) -> Result<FamilyOfficeProfile, String> {
    let Some(assets) = payload.assets else {
        return Err("assets is required".to_string());
    };
    Ok(FamilyOfficeProfile {
        assets: require_amount("assets", assets)?,
        needs: payload.needs,
    })
}

fn build_transfer_profile(payload: TransferPayload) -> Result<TransferProfile, String> {
    let Some(assets) = payload.assets else {
        return Err("assets is required".to_string());
    };
    let assets = require_amount("assets", assets)?;
    let real_estate_value =
        require_amount("realEstateValue", payload.real_estate_value.unwrap_or(0.0))?;
    if real_estate_value > assets {
        return Err("realEstateValue cannot exceed assets".to_string());
    }
    let beneficiaries = payload.beneficiaries.unwrap_or(1);
    if beneficiaries == 0 {
        return Err("beneficiaries must be > 0".to_string());
    }

    Ok(TransferProfile {
        assets,
        real_estate_value,
        beneficiaries,
        kinship: payload.kinship.unwrap_or_default(),
        horizon_years: payload
            .horizon_years
            .unwrap_or(DEFAULT_TRANSFER_HORIZON_YEARS),
        needs: payload.needs,
    })
}

fn run_asset_tax(payload: AssetTaxPayload) -> Result<AssetTaxReport, String> {
    let (financial, real_estate) = build_asset_tax_inputs(payload)?;
    Ok(compute_asset_tax(
        &TaxRateTable::default(),
        &financial,
        &real_estate,
    ))
}

fn run_loss_harvest(payload: HarvestPayload) -> Result<HarvestReport, String> {
    let inputs = build_harvest_inputs(payload, &TaxRateTable::default())?;
    Ok(compute_harvest(&inputs))
}

fn run_rebalance(payload: RebalancePayload) -> Result<RebalanceOutcome, String> {
    let inputs = build_rebalance_inputs(payload)?;
    Ok(compute_rebalance(&inputs))
}

fn run_family_office(payload: FamilyOfficePayload) -> Result<Assessment<FamilyOfficeOption>, String> {
    let profile = build_family_office_profile(payload)?;
    Ok(assess_family_office(&profile, ScoringPolicy::family_office()))
}

fn run_trust_vs_donation(payload: TransferPayload) -> Result<Assessment<TransferOption>, String> {
    let profile = build_transfer_profile(payload)?;
    Ok(assess_transfer(&profile, ScoringPolicy::transfer()))
}

/// Runs one calculator over a JSON payload, as the HTTP routes do, and returns
/// the result as JSON.
pub fn evaluate_json(calculator: Calculator, body: &str) -> error::Result<serde_json::Value> {
    let value = match calculator {
        Calculator::AssetTax => serde_json::to_value(
            run_asset_tax(serde_json::from_str(body)?).map_err(AppError::InvalidInput)?,
        )?,
        Calculator::LossHarvest => serde_json::to_value(
            run_loss_harvest(serde_json::from_str(body)?).map_err(AppError::InvalidInput)?,
        )?,
        Calculator::Rebalance => serde_json::to_value(
            run_rebalance(serde_json::from_str(body)?).map_err(AppError::InvalidInput)?,
        )?,
        Calculator::FamilyOffice => serde_json::to_value(
            run_family_office(serde_json::from_str(body)?).map_err(AppError::InvalidInput)?,
        )?,
        Calculator::TrustVsDonation => serde_json::to_value(
            run_trust_vs_donation(serde_json::from_str(body)?).map_err(AppError::InvalidInput)?,
        )?,
    };
    Ok(value)
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/asset-tax", post(asset_tax_handler))
        .route("/api/loss-harvest", post(loss_harvest_handler))
        .route("/api/rebalance", post(rebalance_handler))
        .route("/api/family-office", post(family_office_handler))
        .route("/api/trust-vs-donation", post(trust_vs_donation_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "patrimonio HTTP API listening");
    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn asset_tax_handler(payload: Result<Json<AssetTaxPayload>, JsonRejection>) -> Response {
    respond(Calculator::AssetTax, payload_body(payload).and_then(run_asset_tax))
}

async fn loss_harvest_handler(payload: Result<Json<HarvestPayload>, JsonRejection>) -> Response {
    respond(Calculator::LossHarvest, payload_body(payload).and_then(run_loss_harvest))
}

async fn rebalance_handler(payload: Result<Json<RebalancePayload>, JsonRejection>) -> Response {
    respond(Calculator::Rebalance, payload_body(payload).and_then(run_rebalance))
}

async fn family_office_handler(payload: Result<Json<FamilyOfficePayload>, JsonRejection>) -> Response {
    respond(Calculator::FamilyOffice, payload_body(payload).and_then(run_family_office))
}

async fn trust_vs_donation_handler(payload: Result<Json<TransferPayload>, JsonRejection>) -> Response {
    respond(Calculator::TrustVsDonation, payload_body(payload).and_then(run_trust_vs_donation))
}

fn payload_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, String> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| rejection.body_text())
}

fn respond<T: Serialize>(calculator: Calculator, result: Result<T, String>) -> Response {
    match result {
        Ok(body) => {
            tracing::debug!(calculator = calculator.name(), "calculation served");
            json_response(StatusCode::OK, body)
        }
        Err(msg) => {
            tracing::warn!(calculator = calculator.name(), error = %msg, "rejected payload");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
