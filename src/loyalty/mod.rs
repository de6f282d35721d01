// Loyalty Engine
//
// Calculates the points a completed order earns and the membership tier a
// customer holds. Tier is always derived from the point ledger, never stored,
// so it cannot drift out of sync with the points that define it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::config::LoyaltyConfig;
use crate::store::{MemoryStore, StoreError};

/// Days per month used for account tenure, matching the product's fixed
/// 30-day month convention.
const TENURE_DAYS_PER_MONTH: i64 = 30;

/// Error types for loyalty operations
#[derive(Debug, Error)]
pub enum LoyaltyError {
    #[error("Loyalty account not found for customer {0}")]
    AccountNotFound(i32),

    #[error("Loyalty account already exists for customer {0}")]
    AccountExists(i32),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
}

impl IntoResponse for LoyaltyError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            LoyaltyError::AccountNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Loyalty account not found for customer {}", id),
            ),
            LoyaltyError::AccountExists(id) => (
                StatusCode::CONFLICT,
                format!("Loyalty account already exists for customer {}", id),
            ),
            LoyaltyError::CalculationError(msg) => {
                tracing::error!("Loyalty calculation error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            LoyaltyError::StoreError(e) => {
                tracing::error!("Loyalty store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Membership tier, determined solely by accumulated points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A customer's loyalty account
///
/// `points` is an append-only ledger quantity: the engine only ever increases
/// it. Redemption is an explicit external operation, not modeled here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyAccount {
    pub customer_id: i32,
    pub points: u64,
    pub created_at: DateTime<Utc>,
}

/// Summary of an account for display, with the tier derived on read
#[derive(Debug, Clone, Serialize)]
pub struct LoyaltySummary {
    pub customer_id: i32,
    pub points: u64,
    pub tier: Tier,
    /// Points still needed to reach the next tier; None at Platinum
    pub points_to_next_tier: Option<u64>,
}

/// Pure loyalty arithmetic over a configured rule table
#[derive(Debug, Clone)]
pub struct LoyaltyCalculator {
    config: LoyaltyConfig,
}

impl LoyaltyCalculator {
    pub fn new(config: LoyaltyConfig) -> Self {
        Self { config }
    }

    /// Tier for a given point balance (inclusive lower bounds)
    pub fn tier_of(&self, points: u64) -> Tier {
        if points >= self.config.platinum_threshold {
            Tier::Platinum
        } else if points >= self.config.gold_threshold {
            Tier::Gold
        } else if points >= self.config.silver_threshold {
            Tier::Silver
        } else {
            Tier::Bronze
        }
    }

    /// Points remaining until the next tier, if any
    pub fn points_to_next_tier(&self, points: u64) -> Option<u64> {
        match self.tier_of(points) {
            Tier::Bronze => Some(self.config.silver_threshold - points),
            Tier::Silver => Some(self.config.gold_threshold - points),
            Tier::Gold => Some(self.config.platinum_threshold - points),
            Tier::Platinum => None,
        }
    }

    /// Points a completed order earns for the given account
    ///
    /// `points = floor((base + size_bonus) * tier_multiplier * (1 + tenure))`
    /// where base is `floor(order_total)`, size bonus is the single highest
    /// qualifying band, the tier multiplier reflects the account's tier
    /// *before* this order is credited, and tenure is based on account age in
    /// whole 30-day months. Pure calculation: the caller credits the ledger.
    pub fn points_earned(
        &self,
        order_total: Decimal,
        account: &LoyaltyAccount,
        now: DateTime<Utc>,
    ) -> Result<u64, LoyaltyError> {
        let base_points = if order_total > Decimal::ZERO {
            order_total.floor().to_u64().ok_or_else(|| {
                LoyaltyError::CalculationError(format!(
                    "Order total {} is not representable as points",
                    order_total
                ))
            })?
        } else {
            0
        };

        let size_bonus = self.size_bonus(order_total);
        let multiplier = self.tier_multiplier(self.tier_of(account.points));
        let tenure_bonus = self.tenure_bonus(account, now);

        let raw = Decimal::from(base_points + size_bonus)
            * multiplier
            * (Decimal::ONE + tenure_bonus);

        raw.floor().to_u64().ok_or_else(|| {
            LoyaltyError::CalculationError(format!("Points value {} overflowed", raw))
        })
    }

    /// Point multiplier for a tier
    pub fn tier_multiplier(&self, tier: Tier) -> Decimal {
        match tier {
            Tier::Bronze => self.config.bronze_multiplier,
            Tier::Silver => self.config.silver_multiplier,
            Tier::Gold => self.config.gold_multiplier,
            Tier::Platinum => self.config.platinum_multiplier,
        }
    }

    // Highest band whose minimum the total reaches; bands do not stack.
    fn size_bonus(&self, order_total: Decimal) -> u64 {
        self.config
            .size_bonus_bands
            .iter()
            .filter(|(minimum, _)| order_total >= *minimum)
            .map(|(_, bonus)| *bonus)
            .max()
            .unwrap_or(0)
    }

    // Highest breakpoint the account's age in whole 30-day months reaches.
    fn tenure_bonus(&self, account: &LoyaltyAccount, now: DateTime<Utc>) -> Decimal {
        let age_days = (now - account.created_at).num_days().max(0);
        let age_months = (age_days / TENURE_DAYS_PER_MONTH) as u32;

        self.config
            .tenure_bonus_breakpoints
            .iter()
            .filter(|(minimum_months, _)| age_months >= *minimum_months)
            .map(|(_, bonus)| *bonus)
            .max()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Loyalty account storage over the record store
///
/// All point mutations go through compare-and-swap so concurrent credits to
/// the same customer serialize instead of losing updates.
#[derive(Clone)]
pub struct LoyaltyRepository {
    accounts: Arc<MemoryStore<i32, LoyaltyAccount>>,
    welcome_bonus: u64,
}

impl LoyaltyRepository {
    pub fn new(accounts: Arc<MemoryStore<i32, LoyaltyAccount>>, welcome_bonus: u64) -> Self {
        Self {
            accounts,
            welcome_bonus,
        }
    }

    /// Create an account, granting the welcome bonus exactly once
    pub async fn create_account(&self, customer_id: i32) -> Result<LoyaltyAccount, LoyaltyError> {
        if self.accounts.contains(&customer_id) {
            return Err(LoyaltyError::AccountExists(customer_id));
        }

        let account = LoyaltyAccount {
            customer_id,
            points: self.welcome_bonus,
            created_at: Utc::now(),
        };
        let stored = self.accounts.put(customer_id, account);
        tracing::info!(
            "Created loyalty account for customer {} with {} welcome points",
            customer_id,
            self.welcome_bonus
        );
        Ok(stored.record)
    }

    /// Fetch an account
    pub async fn find_by_customer(&self, customer_id: i32) -> Result<LoyaltyAccount, LoyaltyError> {
        self.accounts
            .get(&customer_id)
            .map(|versioned| versioned.record)
            .ok_or(LoyaltyError::AccountNotFound(customer_id))
    }

    /// Add earned points to the ledger
    ///
    /// Points only ever increase here; redemption is external to the engine.
    pub async fn credit_points(
        &self,
        customer_id: i32,
        points: u64,
    ) -> Result<LoyaltyAccount, LoyaltyError> {
        loop {
            let versioned = self
                .accounts
                .get(&customer_id)
                .ok_or(LoyaltyError::AccountNotFound(customer_id))?;

            let mut account = versioned.record.clone();
            account.points += points;

            match self
                .accounts
                .compare_and_swap(&customer_id, versioned.version, account)
            {
                Ok(stored) => return Ok(stored.record),
                Err(StoreError::VersionConflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}
