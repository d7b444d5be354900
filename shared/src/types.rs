//! Common types used across the launchpad.

use parity_scale_codec::{Decode, Encode};
use scale_info::TypeInfo;

use crate::ContractError;

/// Sequential identifier of a launch in the registry.
pub type Id = u64;

/// Amount type for native and token values (supports up to 10^38).
pub type Amount = u128;

/// Block timestamp in milliseconds.
pub type Timestamp = u64;

/// Basis points (1/100th of a percent, so 10000 = 100%).
pub type BasisPoints = u16;

/// Maximum basis points (100%).
pub const MAX_BASIS_POINTS: BasisPoints = 10_000;

/// Commission taken from a successful raise, in basis points of the amount
/// each share is computed on.
#[derive(Debug, Clone, Copy, Encode, Decode, TypeInfo, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct FeeConfig {
    /// Platform share of the whole raise.
    pub platform_bps: BasisPoints,
    /// Lister share of the whole raise (only when a lister was set).
    pub lister_bps: BasisPoints,
    /// Referral share of each referred contribution.
    pub contributor_bps: BasisPoints,
}

impl FeeConfig {
    pub const fn new(
        platform_bps: BasisPoints,
        lister_bps: BasisPoints,
        contributor_bps: BasisPoints,
    ) -> Self {
        Self {
            platform_bps,
            lister_bps,
            contributor_bps,
        }
    }

    /// The shares together may never exceed the raise.
    pub fn validate(&self) -> Result<(), ContractError> {
        let total = self.platform_bps as u32 + self.lister_bps as u32 + self.contributor_bps as u32;
        if total > MAX_BASIS_POINTS as u32 {
            return Err(ContractError::InvalidTerms);
        }
        Ok(())
    }
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self::new(200, 100, 50)
    }
}

/// Which asset a payout is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum Asset {
    /// Native VARA value.
    Native,
    /// The launch's sold token.
    Token,
}
