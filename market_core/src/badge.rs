//! Wallet engagement tiers derived from balances and LP positions.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const NO_WALLET_MESSAGE: &str = "Connect wallet to see badge / ranking status";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BadgeTier {
    Learner,
    DiamondHands,
    WealthBuilder,
}

impl BadgeTier {
    pub fn display_name(self) -> &'static str {
        match self {
            BadgeTier::Learner => "Learner",
            BadgeTier::DiamondHands => "Diamond Hands",
            BadgeTier::WealthBuilder => "Wealth Builder",
        }
    }
}

impl fmt::Display for BadgeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Values the classifier reads, already converted to whole units / USD
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BadgeInputs {
    pub algo_balance: f64,
    pub token_usd_value: f64,
    pub lp_position_usd_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BadgeThresholds {
    pub lp_position_usd: f64,
    pub algo_balance: f64,
    pub token_usd: f64,
}

impl Default for BadgeThresholds {
    fn default() -> Self {
        Self {
            lp_position_usd: 200.0,
            algo_balance: 100.0,
            token_usd: 100.0,
        }
    }
}

/// The LP check wins over the balance checks; the balance checks are OR-ed
pub fn classify_badge(inputs: &BadgeInputs, thresholds: &BadgeThresholds) -> BadgeTier {
    if inputs.lp_position_usd_value >= thresholds.lp_position_usd {
        BadgeTier::WealthBuilder
    } else if inputs.algo_balance >= thresholds.algo_balance
        || inputs.token_usd_value >= thresholds.token_usd
    {
        BadgeTier::DiamondHands
    } else {
        BadgeTier::Learner
    }
}

/// What a badge view shows for a wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BadgeStatus {
    NoWallet,
    Classified(BadgeTier),
    /// Inputs could not be fetched; no tier is assumed
    Unavailable(String),
}

impl BadgeStatus {
    pub fn tier(&self) -> Option<BadgeTier> {
        match self {
            BadgeStatus::Classified(tier) => Some(*tier),
            _ => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            BadgeStatus::NoWallet => NO_WALLET_MESSAGE.to_string(),
            BadgeStatus::Classified(tier) => tier.display_name().to_string(),
            BadgeStatus::Unavailable(reason) => format!("Badge unavailable: {}", reason),
        }
    }
}
