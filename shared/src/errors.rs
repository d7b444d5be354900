//! Error type returned by every launchpad operation.

use parity_scale_codec::{Decode, Encode};
use scale_info::TypeInfo;

/// Errors that can occur in the Registry, a Launch, or settlement.
#[derive(Debug, Clone, Copy, Encode, Decode, TypeInfo, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum ContractError {
    /// Caller already paid the spam filter fee.
    AlreadyPaid,
    /// Caller has not paid the spam filter fee.
    NotEligible,
    /// Launch terms failed validation.
    InvalidTerms,
    /// Launch is not accepting contributions.
    NotOpen,
    /// Contribution would push the raise past the hard cap.
    HardCapExceeded,
    /// Launch has not reached its end yet.
    NotYetEnded,
    /// Launch was already settled.
    AlreadySettled,
    /// Outbound transfer was rejected.
    TransferFailed,
    /// Launch id is unknown.
    NotFound,
    /// Caller is not allowed to perform this action.
    Unauthorized,
    /// Platform is paused.
    Paused,
    /// Zero amount not allowed.
    ZeroAmount,
    /// Contribution is worth less than one token unit.
    ContributionTooSmall,
    /// Attached value differs from the declared amount.
    ValueMismatch,
    /// Launch no longer accepts token deposits.
    ChargingClosed,
    /// A spam fee payment by this caller is awaiting confirmation.
    PaymentInProgress,
    /// No outstanding balance for the caller.
    NothingToClaim,
    /// Arithmetic overflow.
    Overflow,
    /// Ledger balance too low for the requested pull.
    InsufficientBalance,
    /// Ledger allowance too low for the requested pull.
    InsufficientAllowance,
}
