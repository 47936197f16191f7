//! Small calculators used by the lessons: the Fisher equation, the
//! ROE = ROA × leverage decomposition, and a sequential securitization waterfall.
//!
//! Rates are decimals (`0.05` is 5%).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum CalcError {
    #[error("{field} must be finite")]
    NotFinite { field: &'static str },

    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be between 0 and 1, got {value}")]
    RateOutOfRange { field: &'static str, value: f64 },

    #[error("inflation of {0} makes the price level collapse")]
    DegenerateInflation(f64),
}

fn finite(field: &'static str, value: f64) -> Result<f64, CalcError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::NotFinite { field })
    }
}

fn positive(field: &'static str, value: f64) -> Result<f64, CalcError> {
    if finite(field, value)? > 0.0 {
        Ok(value)
    } else {
        Err(CalcError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, CalcError> {
    if finite(field, value)? >= 0.0 {
        Ok(value)
    } else {
        Err(CalcError::Negative { field, value })
    }
}

fn unit_rate(field: &'static str, value: f64) -> Result<f64, CalcError> {
    if (0.0..=1.0).contains(&finite(field, value)?) {
        Ok(value)
    } else {
        Err(CalcError::RateOutOfRange { field, value })
    }
}

//
// ─── FISHER EQUATION ───────────────────────────────────────────────────────────
//

/// Real rate from the exact Fisher relation `(1 + i) = (1 + r)(1 + π)`.
///
/// # Errors
///
/// Returns `CalcError` for non-finite inputs or inflation at or below -100%.
pub fn real_rate(nominal: f64, inflation: f64) -> Result<f64, CalcError> {
    let nominal = finite("nominal rate", nominal)?;
    let inflation = finite("inflation", inflation)?;
    if inflation <= -1.0 {
        return Err(CalcError::DegenerateInflation(inflation));
    }
    Ok((1.0 + nominal) / (1.0 + inflation) - 1.0)
}

/// Textbook approximation `r ≈ i - π`.
#[must_use]
pub fn real_rate_approx(nominal: f64, inflation: f64) -> f64 {
    nominal - inflation
}

/// Nominal rate implied by a real rate and expected inflation.
///
/// # Errors
///
/// Returns `CalcError::NotFinite` for non-finite inputs.
pub fn nominal_rate(real: f64, inflation: f64) -> Result<f64, CalcError> {
    let real = finite("real rate", real)?;
    let inflation = finite("inflation", inflation)?;
    Ok((1.0 + real) * (1.0 + inflation) - 1.0)
}

//
// ─── ROE DECOMPOSITION ─────────────────────────────────────────────────────────
//

/// Bank profitability split into return on assets and the equity multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoeBreakdown {
    pub roa: f64,
    pub leverage: f64,
    pub roe: f64,
}

impl RoeBreakdown {
    /// # Errors
    ///
    /// Returns `CalcError` if assets or equity are not positive, or any input is not finite.
    pub fn from_balance_sheet(
        net_income: f64,
        total_assets: f64,
        equity: f64,
    ) -> Result<Self, CalcError> {
        let net_income = finite("net income", net_income)?;
        let total_assets = positive("total assets", total_assets)?;
        let equity = positive("equity", equity)?;

        let roa = net_income / total_assets;
        let leverage = total_assets / equity;
        Ok(Self {
            roa,
            leverage,
            roe: roa * leverage,
        })
    }

    /// Equity capital ratio, the inverse of leverage.
    #[must_use]
    pub fn capital_ratio(&self) -> f64 {
        1.0 / self.leverage
    }
}

//
// ─── SECURITIZATION WATERFALL ──────────────────────────────────────────────────
//

/// A tranche claim on the collateral pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Tranche {
    pub name: String,
    pub principal: f64,
}

impl Tranche {
    #[must_use]
    pub fn new(name: impl Into<String>, principal: f64) -> Self {
        Self {
            name: name.into(),
            principal,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranchePayout {
    pub name: String,
    pub principal: f64,
    pub paid: f64,
    pub loss: f64,
}

impl TranchePayout {
    /// Share of principal repaid, 0-1.
    #[must_use]
    pub fn recovery(&self) -> f64 {
        if self.principal == 0.0 {
            1.0
        } else {
            self.paid / self.principal
        }
    }
}

/// Cash a pool returns when `default_rate` of it defaults and `recovery_rate` of
/// defaulted principal is recovered.
///
/// # Errors
///
/// Returns `CalcError` for a negative pool or rates outside 0-1.
pub fn pool_collections(
    pool_principal: f64,
    default_rate: f64,
    recovery_rate: f64,
) -> Result<f64, CalcError> {
    let pool = non_negative("pool principal", pool_principal)?;
    let default_rate = unit_rate("default rate", default_rate)?;
    let recovery_rate = unit_rate("recovery rate", recovery_rate)?;
    Ok(pool * (1.0 - default_rate * (1.0 - recovery_rate)))
}

/// Distribute `collections` to tranches ordered senior first.
///
/// Each tranche is paid in full before the next sees any cash, so losses land on
/// the most junior tranches first. Cash beyond total principal is not distributed.
///
/// # Errors
///
/// Returns `CalcError` for negative collections or tranche principal.
pub fn run_waterfall(
    tranches: &[Tranche],
    collections: f64,
) -> Result<Vec<TranchePayout>, CalcError> {
    let mut remaining = non_negative("collections", collections)?;
    let mut payouts = Vec::with_capacity(tranches.len());

    for tranche in tranches {
        let principal = non_negative("tranche principal", tranche.principal)?;
        let paid = principal.min(remaining);
        remaining -= paid;
        payouts.push(TranchePayout {
            name: tranche.name.clone(),
            principal,
            paid,
            loss: principal - paid,
        });
    }

    Ok(payouts)
}
