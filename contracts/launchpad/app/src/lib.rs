//! Token Launchpad - Application Logic.
//!
//! A permissionless crowdsale platform:
//! - Registry gated by a one-time spam filter fee per creator
//! - Launch state machine (Created → Charging → Open → Ended → Settled)
//! - Settlement that records every payout before sending anything
//! - Pull-based claims for payouts a recipient refused
//! - Comprehensive events for indexers

#![no_std]

extern crate alloc;

pub mod fee_splitter;
pub mod launch;
pub mod payouts;
pub mod registry;
pub mod vft_client;

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use parity_scale_codec::{Decode, Encode};
use scale_info::TypeInfo;
use sails_rs::prelude::*;
use launchpad_shared::{Amount, Asset, ContractError, FeeConfig, Id, Timestamp};

pub use launch::{
    Contribution, DistributionReport, LaunchState, LaunchTerms, LaunchView, Outcome, Payout,
    PayoutKind, RefundReport, TokenInfo,
};
pub use payouts::Outstanding;
pub use registry::RegistryEntry;
pub use vft_client::LedgerRequest;

use payouts::PendingPayouts;
use registry::Registry;
use vft_client::VftClient;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Platform-wide settings fixed at deployment.
#[derive(Debug, Clone, Copy, Encode, Decode, TypeInfo, PartialEq, Eq, Default)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct PlatformConfig {
    /// Receives spam fees and the platform commission.
    pub treasury: ActorId,
    /// Ledger the spam filter fee is paid in.
    pub fee_ledger: ActorId,
    /// One-time fee per creator, in `fee_ledger` units.
    pub spam_fee: Amount,
    pub fees: FeeConfig,
}

// =============================================================================
// STORAGE
// =============================================================================

/// Storage for the Launchpad program.
#[derive(Default)]
pub struct LaunchpadStorage {
    owner: ActorId,
    config: PlatformConfig,
    registry: Registry,
    /// Outstanding settlement payouts per launch.
    payouts: BTreeMap<Id, PendingPayouts>,
    paused: bool,
}

static mut STORAGE: Option<LaunchpadStorage> = None;

#[allow(static_mut_refs)]
fn storage_mut() -> &'static mut LaunchpadStorage {
    unsafe { STORAGE.get_or_insert_with(LaunchpadStorage::default) }
}

fn storage() -> &'static LaunchpadStorage {
    storage_mut()
}

fn init_storage(owner: ActorId, config: PlatformConfig) {
    if let Err(err) = config.fees.validate() {
        panic!("Invalid fee configuration: {err:?}");
    }
    let s = storage_mut();
    s.owner = owner;
    s.config = config;
}

fn ensure_not_paused(s: &LaunchpadStorage) -> Result<(), ContractError> {
    if s.paused {
        return Err(ContractError::Paused);
    }
    Ok(())
}

// =============================================================================
// HELPERS
// =============================================================================

/// Transfer native tokens to recipient.
fn transfer_native(to: ActorId, amount: Amount) -> Result<(), ContractError> {
    if amount == 0 {
        return Ok(());
    }
    gstd::msg::send_bytes(to, [], amount).map_err(|_| ContractError::TransferFailed)?;
    Ok(())
}

/// Deliver one payout in its asset.
async fn send_payout(
    ledger: ActorId,
    recipient: ActorId,
    asset: Asset,
    amount: Amount,
) -> Result<(), ContractError> {
    match asset {
        Asset::Native => transfer_native(recipient, amount),
        Asset::Token => VftClient::new(ledger).transfer(recipient, amount).await,
    }
}

/// Put an amount that could not be delivered back into the arena.
fn restore_payout(launch_id: Id, recipient: ActorId, asset: Asset, amount: Amount) {
    let pending = storage_mut().payouts.entry(launch_id).or_default();
    if let Err(err) = pending.credit(recipient, asset, amount) {
        gstd::debug!("launch {launch_id}: cannot restore payout to {recipient:?}: {err:?}");
    }
}

fn now() -> Timestamp {
    gstd::exec::block_timestamp()
}

// =============================================================================
// EVENTS
// =============================================================================

/// Events emitted by the Launchpad program.
#[derive(Debug, Clone, Encode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum LaunchpadEvent {
    /// Creator paid the spam filter fee.
    SpamFeePaid {
        creator: ActorId,
        amount: Amount,
    },
    /// New launch created.
    LaunchCreated {
        launch_id: Id,
        creator: ActorId,
        token_ledger: ActorId,
        total_supply: Amount,
        soft_cap: Amount,
        hard_cap: Amount,
        end_time: Timestamp,
    },
    /// Sold tokens deposited into custody.
    TokensCharged {
        launch_id: Id,
        depositor: ActorId,
        amount: Amount,
        charged_amount: Amount,
    },
    /// Launch fully charged and accepting contributions.
    LaunchOpened {
        launch_id: Id,
    },
    /// Contribution accepted.
    Invested {
        launch_id: Id,
        sequence_number: u64,
        investor: ActorId,
        contributor_referral: Option<ActorId>,
        amount: Amount,
        tokens: Amount,
    },
    /// Launch stopped accepting contributions.
    LaunchEnded {
        launch_id: Id,
        raised_amount: Amount,
    },
    /// Soft cap met; distribution recorded.
    LaunchDistributed {
        launch_id: Id,
        report: DistributionReport,
    },
    /// Soft cap missed; refunds recorded.
    LaunchRefunded {
        launch_id: Id,
        report: RefundReport,
    },
    /// Settlement payout delivered.
    PayoutSent {
        launch_id: Id,
        recipient: ActorId,
        asset: Asset,
        amount: Amount,
    },
    /// Settlement payout rejected; left claimable.
    PayoutFailed {
        launch_id: Id,
        recipient: ActorId,
        asset: Asset,
        amount: Amount,
    },
    /// Outstanding balance pulled by its owner.
    PayoutClaimed {
        launch_id: Id,
        recipient: ActorId,
        native: Amount,
        tokens: Amount,
    },
    /// Platform paused.
    Paused,
    /// Platform resumed.
    Resumed,
}

// Implement SailsEvent trait for event emission
impl sails_rs::SailsEvent for LaunchpadEvent {
    fn encoded_event_name(&self) -> &'static [u8] {
        match self {
            LaunchpadEvent::SpamFeePaid { .. } => b"SpamFeePaid",
            LaunchpadEvent::LaunchCreated { .. } => b"LaunchCreated",
            LaunchpadEvent::TokensCharged { .. } => b"TokensCharged",
            LaunchpadEvent::LaunchOpened { .. } => b"LaunchOpened",
            LaunchpadEvent::Invested { .. } => b"Invested",
            LaunchpadEvent::LaunchEnded { .. } => b"LaunchEnded",
            LaunchpadEvent::LaunchDistributed { .. } => b"LaunchDistributed",
            LaunchpadEvent::LaunchRefunded { .. } => b"LaunchRefunded",
            LaunchpadEvent::PayoutSent { .. } => b"PayoutSent",
            LaunchpadEvent::PayoutFailed { .. } => b"PayoutFailed",
            LaunchpadEvent::PayoutClaimed { .. } => b"PayoutClaimed",
            LaunchpadEvent::Paused => b"Paused",
            LaunchpadEvent::Resumed => b"Resumed",
        }
    }
}

// =============================================================================
// SERVICE IMPLEMENTATION
// =============================================================================

/// Launchpad Service implementation.
pub struct LaunchpadService(());

impl LaunchpadService {
    pub fn new() -> Self {
        Self(())
    }
}

/// Deliver every planned payout still in the arena, in plan order, and return
/// the events describing each attempt. A refused transfer stays claimable and
/// never stops the sweep.
async fn sweep(launch_id: Id, ledger: ActorId, payouts: &[Payout]) -> Vec<LaunchpadEvent> {
    let mut events = Vec::new();

    for payout in payouts {
        let amount = match storage_mut().payouts.get_mut(&launch_id) {
            Some(pending) => pending.take(payout.recipient, payout.asset),
            None => 0,
        };
        if amount == 0 {
            continue;
        }

        match send_payout(ledger, payout.recipient, payout.asset, amount).await {
            Ok(()) => events.push(LaunchpadEvent::PayoutSent {
                launch_id,
                recipient: payout.recipient,
                asset: payout.asset,
                amount,
            }),
            Err(err) => {
                gstd::debug!(
                    "launch {launch_id}: {:?} payout of {amount} to {:?} failed: {err:?}",
                    payout.kind,
                    payout.recipient
                );
                restore_payout(launch_id, payout.recipient, payout.asset, amount);
                events.push(LaunchpadEvent::PayoutFailed {
                    launch_id,
                    recipient: payout.recipient,
                    asset: payout.asset,
                    amount,
                });
            }
        }
    }

    events
}

#[sails_rs::service(events = LaunchpadEvent)]
impl LaunchpadService {
    // -------------------------------------------------------------------------
    // ADMIN FUNCTIONS
    // -------------------------------------------------------------------------

    /// Pause the platform (owner only). Settlement and claims stay available.
    #[export(unwrap_result)]
    pub fn pause(&mut self) -> Result<(), ContractError> {
        let caller = gstd::msg::source();
        let s = storage_mut();

        if caller != s.owner {
            return Err(ContractError::Unauthorized);
        }

        s.paused = true;
        self.emit_event(LaunchpadEvent::Paused);
        Ok(())
    }

    /// Resume the platform (owner only).
    #[export(unwrap_result)]
    pub fn resume(&mut self) -> Result<(), ContractError> {
        let caller = gstd::msg::source();
        let s = storage_mut();

        if caller != s.owner {
            return Err(ContractError::Unauthorized);
        }

        s.paused = false;
        self.emit_event(LaunchpadEvent::Resumed);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // REGISTRY
    // -------------------------------------------------------------------------

    /// Pay the one-time spam filter fee from the caller's fee-ledger balance
    /// into the treasury.
    ///
    /// Errors are returned in the reply rather than aborting the message, so
    /// the in-flight mark is released even when the ledger refuses.
    #[export]
    pub async fn pay_spam_filter_fee(&mut self) -> Result<Amount, ContractError> {
        let caller = gstd::msg::source();

        let (fee_ledger, treasury, fee) = {
            let s = storage_mut();
            ensure_not_paused(s)?;
            s.registry.begin_fee_payment(caller)?;
            (s.config.fee_ledger, s.config.treasury, s.config.spam_fee)
        };

        if fee > 0 {
            if let Err(err) = VftClient::new(fee_ledger).pull(caller, treasury, fee).await {
                storage_mut().registry.abort_fee_payment(&caller);
                return Err(err);
            }
        }

        storage_mut().registry.confirm_fee_payment(caller, fee, now());

        self.emit_event(LaunchpadEvent::SpamFeePaid {
            creator: caller,
            amount: fee,
        });

        Ok(fee)
    }

    /// Create a new launch owned by the caller.
    #[export(unwrap_result)]
    pub fn launch_new(&mut self, terms: LaunchTerms) -> Result<Id, ContractError> {
        let s = storage_mut();
        ensure_not_paused(s)?;

        let creator = gstd::msg::source();
        let event = LaunchpadEvent::LaunchCreated {
            launch_id: s.registry.launch_count(),
            creator,
            token_ledger: terms.token_ledger,
            total_supply: terms.total_supply,
            soft_cap: terms.soft_cap,
            hard_cap: terms.hard_cap,
            end_time: terms.end_time,
        };

        let launch_id = s.registry.launch_new(creator, terms, now())?;

        self.emit_event(event);

        Ok(launch_id)
    }

    // -------------------------------------------------------------------------
    // CHARGING & CONTRIBUTIONS
    // -------------------------------------------------------------------------

    /// Deposit `amount` of the sold token into the launch's custody.
    ///
    /// The deposit is booked only after the ledger confirms it. Returns the
    /// launch's charged amount.
    #[export]
    pub async fn deposit_charge(&mut self, launch_id: Id, amount: Amount) -> Result<Amount, ContractError> {
        let depositor = gstd::msg::source();

        if amount == 0 {
            return Err(ContractError::ZeroAmount);
        }

        let ledger = {
            let s = storage();
            ensure_not_paused(s)?;
            let launch = s.registry.launch(launch_id)?;
            launch.ensure_chargeable(now())?;
            launch.terms().token_ledger
        };

        let custody = gstd::exec::program_id();
        VftClient::new(ledger).pull(depositor, custody, amount).await?;

        let now = now();
        let s = storage_mut();
        let launch = s.registry.launch_mut(launch_id)?;
        let was_open = launch.state_at(now) == LaunchState::Open;

        let state = match launch.record_charge(amount, now) {
            Ok(state) => state,
            Err(err) => {
                // Settled while the ledger was answering: the tokens belong to
                // the depositor again.
                s.payouts
                    .entry(launch_id)
                    .or_default()
                    .credit(depositor, Asset::Token, amount)?;
                return Err(err);
            }
        };
        let charged_amount = launch.charged_amount();

        self.emit_event(LaunchpadEvent::TokensCharged {
            launch_id,
            depositor,
            amount,
            charged_amount,
        });

        if state == LaunchState::Open && !was_open {
            self.emit_event(LaunchpadEvent::LaunchOpened { launch_id });
        }

        Ok(charged_amount)
    }

    /// Invest the attached value into a launch, optionally crediting a
    /// contributor referral. Tokens are delivered at settlement.
    #[export(unwrap_result)]
    pub fn invest(
        &mut self,
        launch_id: Id,
        amount: Amount,
        contributor: Option<ActorId>,
    ) -> Result<Contribution, ContractError> {
        let s = storage_mut();
        ensure_not_paused(s)?;

        let investor = gstd::msg::source();
        if gstd::msg::value() != amount {
            return Err(ContractError::ValueMismatch);
        }

        let now = now();
        let launch = s.registry.launch_mut(launch_id)?;
        let contribution = launch.invest(investor, amount, contributor, now)?;
        let ended = launch.state_at(now) == LaunchState::Ended;
        let raised_amount = launch.raised_amount();

        self.emit_event(LaunchpadEvent::Invested {
            launch_id,
            sequence_number: contribution.sequence_number,
            investor,
            contributor_referral: contribution.contributor_referral,
            amount,
            tokens: contribution.token_amount_credited,
        });

        if ended {
            self.emit_event(LaunchpadEvent::LaunchEnded {
                launch_id,
                raised_amount,
            });
        }

        Ok(contribution)
    }

    // -------------------------------------------------------------------------
    // SETTLEMENT
    // -------------------------------------------------------------------------

    /// Settle an ended launch (anyone can call).
    ///
    /// All payouts are recorded and the launch is marked settled before the
    /// first transfer goes out.
    #[export]
    pub async fn finish(&mut self, launch_id: Id) -> Result<Outcome, ContractError> {
        let now = now();

        let (plan, ledger, report_event, ended_event) = {
            let s = storage_mut();
            let treasury = s.config.treasury;
            let fees = s.config.fees;
            let min_native = gstd::exec::env_vars().existential_deposit;
            let launch = s.registry.launch_mut(launch_id)?;

            // Work on a copy so a failure leaves the launch untouched.
            let mut settled = launch.clone();
            let (previous, _) = settled.refresh(now);
            let plan = settled.settle(&fees, treasury, min_native, now)?;

            let mut pending = s.payouts.get(&launch_id).cloned().unwrap_or_default();
            for payout in &plan.payouts {
                pending.credit(payout.recipient, payout.asset, payout.amount)?;
            }

            let report_event = match plan.outcome {
                Outcome::Distributed => settled.distribution().map(|report| {
                    LaunchpadEvent::LaunchDistributed { launch_id, report }
                }),
                Outcome::Refunded => settled
                    .refund()
                    .map(|report| LaunchpadEvent::LaunchRefunded { launch_id, report }),
            };
            let ended_event = (previous != LaunchState::Ended).then(|| LaunchpadEvent::LaunchEnded {
                launch_id,
                raised_amount: settled.raised_amount(),
            });
            let ledger = settled.terms().token_ledger;

            *launch = settled;
            s.payouts.insert(launch_id, pending);

            (plan, ledger, report_event, ended_event)
        };

        if let Some(event) = ended_event {
            self.emit_event(event);
        }
        if let Some(event) = report_event {
            self.emit_event(event);
        }

        for event in sweep(launch_id, ledger, &plan.payouts).await {
            self.emit_event(event);
        }

        Ok(plan.outcome)
    }

    /// Pull whatever settlement still owes the caller for a launch.
    #[export]
    pub async fn claim(&mut self, launch_id: Id) -> Result<Outstanding, ContractError> {
        let caller = gstd::msg::source();

        let (ledger, owed) = {
            let s = storage_mut();
            let ledger = s.registry.launch(launch_id)?.terms().token_ledger;
            let owed = s
                .payouts
                .get_mut(&launch_id)
                .map(|pending| pending.take_all(caller))
                .unwrap_or_default();
            (ledger, owed)
        };

        if owed.is_empty() {
            return Err(ContractError::NothingToClaim);
        }

        let mut paid = Outstanding::default();

        if owed.native > 0 {
            match transfer_native(caller, owed.native) {
                Ok(()) => paid.native = owed.native,
                Err(_) => restore_payout(launch_id, caller, Asset::Native, owed.native),
            }
        }

        if owed.tokens > 0 {
            match VftClient::new(ledger).transfer(caller, owed.tokens).await {
                Ok(()) => paid.tokens = owed.tokens,
                Err(_) => restore_payout(launch_id, caller, Asset::Token, owed.tokens),
            }
        }

        if paid.is_empty() {
            return Err(ContractError::TransferFailed);
        }

        self.emit_event(LaunchpadEvent::PayoutClaimed {
            launch_id,
            recipient: caller,
            native: paid.native,
            tokens: paid.tokens,
        });

        Ok(paid)
    }

    // -------------------------------------------------------------------------
    // QUERIES
    // -------------------------------------------------------------------------

    /// All launch ids in creation order.
    #[export]
    pub fn list_launches(&self) -> Vec<Id> {
        storage().registry.list_launches()
    }

    #[export]
    pub fn get_launch(&self, launch_id: Id) -> Option<LaunchView> {
        storage()
            .registry
            .launch(launch_id)
            .ok()
            .map(|l| l.view(now()))
    }

    /// Get all launches by creator.
    #[export]
    pub fn get_creator_launches(&self, creator: ActorId) -> Vec<Id> {
        storage()
            .registry
            .launches()
            .filter(|l| l.creator() == creator)
            .map(|l| l.id())
            .collect()
    }

    #[export]
    pub fn get_state(&self, launch_id: Id) -> Option<LaunchState> {
        storage()
            .registry
            .launch(launch_id)
            .ok()
            .map(|l| l.state_at(now()))
    }

    /// The append-only contribution log.
    #[export]
    pub fn get_history(&self, launch_id: Id) -> Vec<Contribution> {
        storage()
            .registry
            .launch(launch_id)
            .map(|l| l.history().to_vec())
            .unwrap_or_default()
    }

    /// Native amount raised so far.
    #[export]
    pub fn total_cap(&self, launch_id: Id) -> Amount {
        storage()
            .registry
            .launch(launch_id)
            .map(|l| l.raised_amount())
            .unwrap_or(0)
    }

    #[export]
    pub fn token_info(&self, launch_id: Id) -> Option<TokenInfo> {
        storage().registry.launch(launch_id).ok().map(|l| l.token_info())
    }

    #[export]
    pub fn softcap(&self, launch_id: Id) -> Amount {
        storage()
            .registry
            .launch(launch_id)
            .map(|l| l.terms().soft_cap)
            .unwrap_or(0)
    }

    #[export]
    pub fn hardcap(&self, launch_id: Id) -> Amount {
        storage()
            .registry
            .launch(launch_id)
            .map(|l| l.terms().hard_cap)
            .unwrap_or(0)
    }

    #[export]
    pub fn creator(&self, launch_id: Id) -> Option<ActorId> {
        storage().registry.launch(launch_id).ok().map(|l| l.creator())
    }

    #[export]
    pub fn tokens_fully_charged(&self, launch_id: Id) -> bool {
        storage()
            .registry
            .launch(launch_id)
            .map(|l| l.tokens_fully_charged())
            .unwrap_or(false)
    }

    #[export]
    pub fn distribution(&self, launch_id: Id) -> Option<DistributionReport> {
        storage().registry.launch(launch_id).ok().and_then(|l| l.distribution())
    }

    #[export]
    pub fn refund(&self, launch_id: Id) -> Option<RefundReport> {
        storage().registry.launch(launch_id).ok().and_then(|l| l.refund())
    }

    /// What settlement still owes `account` for a launch.
    #[export]
    pub fn outstanding(&self, launch_id: Id, account: ActorId) -> Outstanding {
        storage()
            .payouts
            .get(&launch_id)
            .map(|pending| pending.outstanding(account))
            .unwrap_or_default()
    }

    #[export]
    pub fn registry_entry(&self, account: ActorId) -> Option<RegistryEntry> {
        storage().registry.entry(&account).cloned()
    }

    #[export]
    pub fn spam_fee_paid(&self, account: ActorId) -> bool {
        storage().registry.is_paid(&account)
    }

    #[export]
    pub fn config(&self) -> PlatformConfig {
        storage().config
    }

    /// Get platform owner.
    #[export]
    pub fn owner(&self) -> ActorId {
        storage().owner
    }

    #[export]
    pub fn is_paused(&self) -> bool {
        storage().paused
    }
}

// =============================================================================
// PROGRAM ENTRY POINT
// =============================================================================

/// Launchpad Program entry point.
#[derive(Default)]
pub struct LaunchpadProgram(());

#[sails_rs::program]
impl LaunchpadProgram {
    /// Initialize with the default commission split.
    pub fn new(treasury: ActorId, fee_ledger: ActorId, spam_fee: Amount) -> Self {
        Self::new_with_fees(treasury, fee_ledger, spam_fee, FeeConfig::default())
    }

    /// Initialize with a custom commission split.
    pub fn new_with_fees(
        treasury: ActorId,
        fee_ledger: ActorId,
        spam_fee: Amount,
        fees: FeeConfig,
    ) -> Self {
        let owner = gstd::msg::source();
        init_storage(
            owner,
            PlatformConfig {
                treasury,
                fee_ledger,
                spam_fee,
                fees,
            },
        );
        Self(())
    }

    /// Get the launchpad service.
    pub fn launchpad(&self) -> LaunchpadService {
        LaunchpadService::new()
    }
}
