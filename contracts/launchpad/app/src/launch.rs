//! One funding round: terms, contribution log, and the state machine that
//! settles it.
//!
//! Everything here is pure bookkeeping. The caller supplies the current block
//! timestamp and performs the transfers that [`Launch::settle`] plans.

use alloc::string::String;
use alloc::vec::Vec;
use parity_scale_codec::{Decode, Encode};
use scale_info::TypeInfo;
use sails_rs::prelude::*;
use launchpad_shared::{Amount, Asset, ContractError, FeeConfig, Id, Timestamp};

use crate::fee_splitter;

// =============================================================================
// STATE MACHINE
// =============================================================================

/// Final outcome of a settled launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum Outcome {
    /// Soft cap reached: tokens to investors, funds to the recipient.
    Distributed,
    /// Soft cap missed: value back to investors, tokens back to the creator.
    Refunded,
}

/// Launch status.
///
/// State transitions:
/// - Created → Charging (first deposit of the sold token)
/// - Charging → Open (charged amount covers the total supply)
/// - Open → Ended (end time reached or hard cap filled)
/// - Ended → Settled (via finish, exactly once)
///
/// Created and Charging also end at the end time, so uncharged launches can
/// still be settled and release their partial deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, TypeInfo, Default)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum LaunchState {
    #[default]
    Created,
    Charging,
    Open,
    Ended,
    Settled(Outcome),
}

// =============================================================================
// DATA STRUCTURES
// =============================================================================

/// Terms fixed by the creator at launch time.
#[derive(Debug, Clone, Encode, Decode, TypeInfo, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct LaunchTerms {
    pub project_uri: String,
    /// Minimum raise for success, in native units.
    pub soft_cap: Amount,
    /// Maximum raise accepted, in native units.
    pub hard_cap: Amount,
    /// Block timestamp (ms) at which contributions stop.
    pub end_time: Timestamp,
    pub token_symbol: String,
    pub token_name: String,
    /// Native units per smallest token unit.
    pub unit_price: Amount,
    pub token_decimals: u8,
    /// Smallest token units that must be charged before opening.
    pub total_supply: Amount,
    /// Ledger program of the sold token.
    pub token_ledger: ActorId,
    /// Receives the raise net of commission.
    pub funds_recipient: ActorId,
    /// Referring lister entitled to a commission share.
    pub lister: Option<ActorId>,
}

impl LaunchTerms {
    pub fn validate(&self, now: Timestamp) -> Result<(), ContractError> {
        if self.hard_cap == 0 || self.soft_cap > self.hard_cap {
            return Err(ContractError::InvalidTerms);
        }
        if self.end_time <= now {
            return Err(ContractError::InvalidTerms);
        }
        if self.total_supply == 0 || self.unit_price == 0 {
            return Err(ContractError::InvalidTerms);
        }
        if self.token_symbol.is_empty() || self.token_name.is_empty() {
            return Err(ContractError::InvalidTerms);
        }
        // A full raise must be coverable by the supply on sale.
        if self.hard_cap / self.unit_price > self.total_supply {
            return Err(ContractError::InvalidTerms);
        }
        Ok(())
    }

    /// Token units bought for `native_amount`; the remainder stays in the raise.
    pub fn tokens_for(&self, native_amount: Amount) -> Amount {
        native_amount.checked_div(self.unit_price).unwrap_or(0)
    }
}

/// One accepted investment. Never modified once appended.
#[derive(Debug, Clone, Encode, Decode, TypeInfo, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct Contribution {
    pub sequence_number: u64,
    pub investor: ActorId,
    pub contributor_referral: Option<ActorId>,
    pub native_amount_paid: Amount,
    pub token_amount_credited: Amount,
    pub timestamp: Timestamp,
}

/// Token metadata as advertised by the launch.
#[derive(Debug, Clone, Encode, Decode, TypeInfo, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct TokenInfo {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub total_supply: Amount,
    pub unit_price: Amount,
    pub ledger: ActorId,
}

/// Totals of a Distributed settlement.
#[derive(Debug, Clone, Encode, Decode, TypeInfo, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct DistributionReport {
    pub tokens_distributed: Amount,
    pub token_surplus: Amount,
    pub funds_to_recipient: Amount,
    pub platform_fee: Amount,
    pub lister_fee: Amount,
    pub contributor_fees: Amount,
    pub settled_at: Timestamp,
}

/// Totals of a Refunded settlement.
#[derive(Debug, Clone, Encode, Decode, TypeInfo, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct RefundReport {
    pub native_refunded: Amount,
    pub tokens_returned: Amount,
    pub contributions: u32,
    pub settled_at: Timestamp,
}

#[derive(Debug, Clone, Encode, Decode, TypeInfo, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum SettlementReport {
    Distributed(DistributionReport),
    Refunded(RefundReport),
}

/// Why a payout is owed; carried into events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum PayoutKind {
    InvestorTokens,
    CreatorSurplus,
    CreatorFunds,
    PlatformFee,
    ListerFee,
    ReferralFee,
    Refund,
    ChargeReturn,
}

/// One transfer owed by a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct Payout {
    pub recipient: ActorId,
    pub asset: Asset,
    pub amount: Amount,
    pub kind: PayoutKind,
}

/// Ordered transfers produced by [`Launch::settle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementPlan {
    pub outcome: Outcome,
    pub payouts: Vec<Payout>,
}

/// Read-only snapshot of a launch.
#[derive(Debug, Clone, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct LaunchView {
    pub id: Id,
    pub creator: ActorId,
    pub terms: LaunchTerms,
    pub state: LaunchState,
    pub charged_amount: Amount,
    pub raised_amount: Amount,
    pub contributions: u32,
    pub settled: bool,
    pub created_at: Timestamp,
}

/// A single funding round.
#[derive(Debug, Clone)]
pub struct Launch {
    id: Id,
    terms: LaunchTerms,
    creator: ActorId,
    state: LaunchState,
    charged_amount: Amount,
    raised_amount: Amount,
    contributions: Vec<Contribution>,
    settled: bool,
    created_at: Timestamp,
    report: Option<SettlementReport>,
}

impl Launch {
    pub fn new(id: Id, creator: ActorId, terms: LaunchTerms, now: Timestamp) -> Self {
        Self {
            id,
            terms,
            creator,
            state: LaunchState::Created,
            charged_amount: 0,
            raised_amount: 0,
            contributions: Vec::new(),
            settled: false,
            created_at: now,
            report: None,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn terms(&self) -> &LaunchTerms {
        &self.terms
    }

    pub fn creator(&self) -> ActorId {
        self.creator
    }

    pub fn charged_amount(&self) -> Amount {
        self.charged_amount
    }

    /// Native value raised so far.
    pub fn raised_amount(&self) -> Amount {
        self.raised_amount
    }

    pub fn history(&self) -> &[Contribution] {
        &self.contributions
    }

    pub fn tokens_fully_charged(&self) -> bool {
        self.charged_amount >= self.terms.total_supply
    }

    pub fn token_info(&self) -> TokenInfo {
        TokenInfo {
            symbol: self.terms.token_symbol.clone(),
            name: self.terms.token_name.clone(),
            decimals: self.terms.token_decimals,
            total_supply: self.terms.total_supply,
            unit_price: self.terms.unit_price,
            ledger: self.terms.token_ledger,
        }
    }

    pub fn distribution(&self) -> Option<DistributionReport> {
        match &self.report {
            Some(SettlementReport::Distributed(report)) => Some(report.clone()),
            _ => None,
        }
    }

    pub fn refund(&self) -> Option<RefundReport> {
        match &self.report {
            Some(SettlementReport::Refunded(report)) => Some(report.clone()),
            _ => None,
        }
    }

    pub fn view(&self, now: Timestamp) -> LaunchView {
        LaunchView {
            id: self.id,
            creator: self.creator,
            terms: self.terms.clone(),
            state: self.state_at(now),
            charged_amount: self.charged_amount,
            raised_amount: self.raised_amount,
            contributions: self.contributions.len() as u32,
            settled: self.settled,
            created_at: self.created_at,
        }
    }

    /// State as of `now`, without recording it.
    pub fn state_at(&self, now: Timestamp) -> LaunchState {
        if let LaunchState::Settled(outcome) = self.state {
            return LaunchState::Settled(outcome);
        }
        if now >= self.terms.end_time || (self.is_open_phase() && self.raised_amount >= self.terms.hard_cap) {
            return LaunchState::Ended;
        }
        if self.tokens_fully_charged() {
            LaunchState::Open
        } else if self.charged_amount > 0 {
            LaunchState::Charging
        } else {
            LaunchState::Created
        }
    }

    /// Record the state as of `now`; returns it together with the previous one.
    pub fn refresh(&mut self, now: Timestamp) -> (LaunchState, LaunchState) {
        let previous = self.state;
        self.state = self.state_at(now);
        (previous, self.state)
    }

    fn is_open_phase(&self) -> bool {
        self.tokens_fully_charged()
    }

    /// Deposits are accepted only before the launch opens.
    pub fn ensure_chargeable(&self, now: Timestamp) -> Result<(), ContractError> {
        if self.settled {
            return Err(ContractError::AlreadySettled);
        }
        match self.state_at(now) {
            LaunchState::Created | LaunchState::Charging => Ok(()),
            _ => Err(ContractError::ChargingClosed),
        }
    }

    /// Book tokens already confirmed by the ledger as held for this launch.
    pub fn record_charge(&mut self, amount: Amount, now: Timestamp) -> Result<LaunchState, ContractError> {
        if self.settled {
            return Err(ContractError::AlreadySettled);
        }
        self.charged_amount = self
            .charged_amount
            .checked_add(amount)
            .ok_or(ContractError::Overflow)?;
        let (_, state) = self.refresh(now);
        Ok(state)
    }

    /// Append a contribution. The whole amount is accepted or nothing is.
    pub fn invest(
        &mut self,
        investor: ActorId,
        native_amount: Amount,
        contributor_referral: Option<ActorId>,
        now: Timestamp,
    ) -> Result<Contribution, ContractError> {
        if self.settled {
            return Err(ContractError::AlreadySettled);
        }
        if native_amount == 0 {
            return Err(ContractError::ZeroAmount);
        }

        match self.state_at(now) {
            LaunchState::Open => {}
            // Ended by a filled cap rather than by time.
            LaunchState::Ended if now < self.terms.end_time && self.is_open_phase() => {}
            _ => return Err(ContractError::NotOpen),
        }

        let raised = self
            .raised_amount
            .checked_add(native_amount)
            .ok_or(ContractError::HardCapExceeded)?;
        if raised > self.terms.hard_cap {
            return Err(ContractError::HardCapExceeded);
        }

        let tokens = self.terms.tokens_for(native_amount);
        if tokens == 0 {
            return Err(ContractError::ContributionTooSmall);
        }

        let contribution = Contribution {
            sequence_number: self.contributions.len() as u64,
            investor,
            contributor_referral,
            native_amount_paid: native_amount,
            token_amount_credited: tokens,
            timestamp: now,
        };

        self.raised_amount = raised;
        self.contributions.push(contribution.clone());
        self.refresh(now);

        Ok(contribution)
    }

    /// Close the launch and plan every transfer it owes.
    ///
    /// Marks the launch settled before returning, so the plan is produced at
    /// most once. Native commission shares below `min_native` stay with the
    /// funds recipient.
    pub fn settle(
        &mut self,
        fees: &FeeConfig,
        treasury: ActorId,
        min_native: Amount,
        now: Timestamp,
    ) -> Result<SettlementPlan, ContractError> {
        if self.settled {
            return Err(ContractError::AlreadySettled);
        }
        if self.state_at(now) != LaunchState::Ended {
            return Err(ContractError::NotYetEnded);
        }

        let (outcome, payouts, report) = if self.raised_amount >= self.terms.soft_cap {
            self.plan_distribution(fees, treasury, min_native, now)?
        } else {
            self.plan_refund(now)
        };

        self.settled = true;
        self.state = LaunchState::Settled(outcome);
        self.report = Some(report);

        Ok(SettlementPlan { outcome, payouts })
    }

    fn plan_distribution(
        &self,
        fees: &FeeConfig,
        treasury: ActorId,
        min_native: Amount,
        now: Timestamp,
    ) -> Result<(Outcome, Vec<Payout>, SettlementReport), ContractError> {
        let mut payouts = Vec::with_capacity(self.contributions.len() + 5);
        let mut tokens_distributed: Amount = 0;

        for c in &self.contributions {
            tokens_distributed = tokens_distributed
                .checked_add(c.token_amount_credited)
                .ok_or(ContractError::Overflow)?;
            payouts.push(Payout {
                recipient: c.investor,
                asset: Asset::Token,
                amount: c.token_amount_credited,
                kind: PayoutKind::InvestorTokens,
            });
        }

        let token_surplus = self
            .charged_amount
            .checked_sub(tokens_distributed)
            .ok_or(ContractError::Overflow)?;

        let split = fee_splitter::split(
            fees,
            self.raised_amount,
            self.terms.lister,
            &self.contributions,
            min_native,
        )?;

        payouts.push(Payout {
            recipient: self.terms.funds_recipient,
            asset: Asset::Native,
            amount: split.creator,
            kind: PayoutKind::CreatorFunds,
        });
        payouts.push(Payout {
            recipient: treasury,
            asset: Asset::Native,
            amount: split.platform,
            kind: PayoutKind::PlatformFee,
        });
        if let Some((lister, amount)) = split.lister {
            payouts.push(Payout {
                recipient: lister,
                asset: Asset::Native,
                amount,
                kind: PayoutKind::ListerFee,
            });
        }
        for share in &split.referrals {
            payouts.push(Payout {
                recipient: share.referrer,
                asset: Asset::Native,
                amount: share.amount,
                kind: PayoutKind::ReferralFee,
            });
        }
        payouts.push(Payout {
            recipient: self.creator,
            asset: Asset::Token,
            amount: token_surplus,
            kind: PayoutKind::CreatorSurplus,
        });
        payouts.retain(|p| p.amount > 0);

        let report = DistributionReport {
            tokens_distributed,
            token_surplus,
            funds_to_recipient: split.creator,
            platform_fee: split.platform,
            lister_fee: split.lister_amount(),
            contributor_fees: split.referral_total(),
            settled_at: now,
        };

        Ok((Outcome::Distributed, payouts, SettlementReport::Distributed(report)))
    }

    fn plan_refund(&self, now: Timestamp) -> (Outcome, Vec<Payout>, SettlementReport) {
        let mut payouts: Vec<Payout> = self
            .contributions
            .iter()
            .map(|c| Payout {
                recipient: c.investor,
                asset: Asset::Native,
                amount: c.native_amount_paid,
                kind: PayoutKind::Refund,
            })
            .collect();
        payouts.push(Payout {
            recipient: self.creator,
            asset: Asset::Token,
            amount: self.charged_amount,
            kind: PayoutKind::ChargeReturn,
        });
        payouts.retain(|p| p.amount > 0);

        let report = RefundReport {
            native_refunded: self.raised_amount,
            tokens_returned: self.charged_amount,
            contributions: self.contributions.len() as u32,
            settled_at: now,
        };

        (Outcome::Refunded, payouts, SettlementReport::Refunded(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATOR: u64 = 1;
    const RECIPIENT: u64 = 2;
    const LISTER: u64 = 3;
    const TREASURY: u64 = 4;
    const INVESTOR1: u64 = 10;
    const INVESTOR2: u64 = 11;
    const REFERRER: u64 = 20;

    const ONE: Amount = 1_000_000_000_000;
    const END: Timestamp = 1_000_000;

    fn terms() -> LaunchTerms {
        LaunchTerms {
            project_uri: "ipfs://project".into(),
            soft_cap: ONE / 2,
            hard_cap: ONE,
            end_time: END,
            token_symbol: "DEW".into(),
            token_name: "Dreams Evolving Widely".into(),
            unit_price: 1_000,
            token_decimals: 18,
            total_supply: 2_000_000_000,
            token_ledger: ActorId::from(100),
            funds_recipient: ActorId::from(RECIPIENT),
            lister: None,
        }
    }

    fn open_launch(terms: LaunchTerms) -> Launch {
        let supply = terms.total_supply;
        let mut launch = Launch::new(0, ActorId::from(CREATOR), terms, 0);
        launch.record_charge(supply, 1).unwrap();
        launch
    }

    fn fees() -> FeeConfig {
        FeeConfig::new(200, 100, 50)
    }

    fn tokens_of(plan: &SettlementPlan, who: u64) -> Amount {
        plan.payouts
            .iter()
            .filter(|p| p.recipient == ActorId::from(who) && p.asset == Asset::Token)
            .map(|p| p.amount)
            .sum()
    }

    fn native_of(plan: &SettlementPlan, who: u64) -> Amount {
        plan.payouts
            .iter()
            .filter(|p| p.recipient == ActorId::from(who) && p.asset == Asset::Native)
            .map(|p| p.amount)
            .sum()
    }

    #[test]
    fn terms_validation() {
        assert_eq!(terms().validate(0), Ok(()));

        let mut t = terms();
        t.soft_cap = t.hard_cap + 1;
        assert_eq!(t.validate(0), Err(ContractError::InvalidTerms));

        assert_eq!(terms().validate(END), Err(ContractError::InvalidTerms));

        let mut t = terms();
        t.total_supply = 0;
        assert_eq!(t.validate(0), Err(ContractError::InvalidTerms));

        let mut t = terms();
        t.unit_price = 0;
        assert_eq!(t.validate(0), Err(ContractError::InvalidTerms));

        let mut t = terms();
        t.total_supply = t.hard_cap / t.unit_price - 1;
        assert_eq!(t.validate(0), Err(ContractError::InvalidTerms));
    }

    #[test]
    fn charging_opens_the_launch() {
        let mut launch = Launch::new(0, ActorId::from(CREATOR), terms(), 0);
        assert_eq!(launch.state_at(0), LaunchState::Created);
        assert_eq!(
            launch.invest(ActorId::from(INVESTOR1), ONE / 10, None, 1),
            Err(ContractError::NotOpen)
        );

        assert_eq!(launch.record_charge(1_000, 1), Ok(LaunchState::Charging));
        assert!(!launch.tokens_fully_charged());
        assert_eq!(launch.ensure_chargeable(1), Ok(()));

        assert_eq!(launch.record_charge(2_000_000_000 - 1_000, 2), Ok(LaunchState::Open));
        assert!(launch.tokens_fully_charged());
        assert_eq!(launch.ensure_chargeable(2), Err(ContractError::ChargingClosed));
    }

    #[test]
    fn raised_never_exceeds_hard_cap() {
        let mut launch = open_launch(terms());

        launch.invest(ActorId::from(INVESTOR1), ONE / 2, None, 10).unwrap();
        assert_eq!(
            launch.invest(ActorId::from(INVESTOR2), ONE / 2 + 1, None, 11),
            Err(ContractError::HardCapExceeded)
        );
        assert_eq!(launch.raised_amount(), ONE / 2);
        assert_eq!(launch.history().len(), 1);
    }

    #[test]
    fn exact_fill_ends_and_rejects_more() {
        let mut launch = open_launch(terms());

        launch.invest(ActorId::from(INVESTOR1), ONE * 3 / 10, None, 10).unwrap();
        launch.invest(ActorId::from(INVESTOR2), ONE * 7 / 10, None, 11).unwrap();
        assert_eq!(launch.raised_amount(), ONE);
        assert_eq!(launch.state_at(12), LaunchState::Ended);

        assert_eq!(
            launch.invest(ActorId::from(INVESTOR1), 1_000, None, 12),
            Err(ContractError::HardCapExceeded)
        );
    }

    #[test]
    fn contribution_at_end_time_is_rejected() {
        let mut launch = open_launch(terms());
        assert_eq!(
            launch.invest(ActorId::from(INVESTOR1), ONE / 10, None, END),
            Err(ContractError::NotOpen)
        );
        assert_eq!(
            launch.invest(ActorId::from(INVESTOR1), ONE / 10, None, END + 1),
            Err(ContractError::NotOpen)
        );
        assert!(launch.invest(ActorId::from(INVESTOR1), ONE / 10, None, END - 1).is_ok());
    }

    #[test]
    fn sequence_numbers_follow_insertion() {
        let mut launch = open_launch(terms());
        for i in 0..4u64 {
            let c = launch
                .invest(ActorId::from(INVESTOR1 + i), 1_000_000, None, 5)
                .unwrap();
            assert_eq!(c.sequence_number, i);
        }
        let seqs: Vec<u64> = launch.history().iter().map(|c| c.sequence_number).collect();
        assert_eq!(seqs, alloc::vec![0, 1, 2, 3]);
    }

    #[test]
    fn tiny_and_zero_contributions_are_rejected() {
        let mut launch = open_launch(terms());
        assert_eq!(
            launch.invest(ActorId::from(INVESTOR1), 0, None, 5),
            Err(ContractError::ZeroAmount)
        );
        assert_eq!(
            launch.invest(ActorId::from(INVESTOR1), 999, None, 5),
            Err(ContractError::ContributionTooSmall)
        );
    }

    #[test]
    fn finish_before_end_fails() {
        let mut launch = open_launch(terms());
        launch.invest(ActorId::from(INVESTOR1), ONE / 10, None, 5).unwrap();
        assert_eq!(
            launch.settle(&fees(), ActorId::from(TREASURY), 0, END - 1),
            Err(ContractError::NotYetEnded)
        );
        assert!(!launch.view(END - 1).settled);
    }

    #[test]
    fn successful_raise_distributes() {
        let mut launch = open_launch(terms());
        let paid = ONE * 6 / 10 + 777;
        launch.invest(ActorId::from(INVESTOR1), paid, None, 5).unwrap();

        let plan = launch.settle(&fees(), ActorId::from(TREASURY), 0, END).unwrap();

        assert_eq!(plan.outcome, Outcome::Distributed);
        assert_eq!(launch.state_at(END), LaunchState::Settled(Outcome::Distributed));
        assert_eq!(tokens_of(&plan, INVESTOR1), paid / 1_000);

        let report = launch.distribution().unwrap();
        assert!(launch.refund().is_none());
        assert_eq!(report.tokens_distributed + report.token_surplus, launch.charged_amount());
        assert_eq!(tokens_of(&plan, CREATOR), report.token_surplus);
        assert_eq!(report.platform_fee, fee_splitter::bps_share(paid, 200));
        assert_eq!(report.lister_fee, 0);
        assert_eq!(report.funds_to_recipient + report.platform_fee, paid);
        assert_eq!(native_of(&plan, RECIPIENT), report.funds_to_recipient);
        assert_eq!(native_of(&plan, TREASURY), report.platform_fee);
    }

    #[test]
    fn commission_reaches_lister_and_referrers() {
        let mut t = terms();
        t.lister = Some(ActorId::from(LISTER));
        let mut launch = open_launch(t);
        launch
            .invest(ActorId::from(INVESTOR1), ONE / 2, Some(ActorId::from(REFERRER)), 5)
            .unwrap();
        launch.invest(ActorId::from(INVESTOR2), ONE / 4, None, 6).unwrap();

        let plan = launch.settle(&fees(), ActorId::from(TREASURY), 0, END).unwrap();
        let report = launch.distribution().unwrap();

        let raised = ONE * 3 / 4;
        assert_eq!(native_of(&plan, LISTER), fee_splitter::bps_share(raised, 100));
        assert_eq!(native_of(&plan, REFERRER), fee_splitter::bps_share(ONE / 2, 50));
        let native_total: Amount = plan
            .payouts
            .iter()
            .filter(|p| p.asset == Asset::Native)
            .map(|p| p.amount)
            .sum();
        assert_eq!(native_total, raised);
        assert_eq!(
            report.funds_to_recipient + report.platform_fee + report.lister_fee + report.contributor_fees,
            raised
        );
    }

    #[test]
    fn missed_soft_cap_refunds() {
        let mut launch = open_launch(terms());
        launch.invest(ActorId::from(INVESTOR1), ONE * 3 / 10, None, 5).unwrap();

        let plan = launch.settle(&fees(), ActorId::from(TREASURY), 0, END + 5).unwrap();

        assert_eq!(plan.outcome, Outcome::Refunded);
        assert_eq!(native_of(&plan, INVESTOR1), ONE * 3 / 10);
        assert_eq!(tokens_of(&plan, CREATOR), 2_000_000_000);
        assert_eq!(tokens_of(&plan, INVESTOR1), 0);
        assert_eq!(native_of(&plan, TREASURY), 0);

        let report = launch.refund().unwrap();
        assert_eq!(report.native_refunded, ONE * 3 / 10);
        assert_eq!(report.tokens_returned, 2_000_000_000);
        assert_eq!(report.contributions, 1);
        assert!(launch.distribution().is_none());
    }

    #[test]
    fn settle_happens_once() {
        let mut launch = open_launch(terms());
        launch.invest(ActorId::from(INVESTOR1), ONE * 6 / 10, None, 5).unwrap();
        launch.settle(&fees(), ActorId::from(TREASURY), 0, END).unwrap();

        let history = launch.history().to_vec();
        assert_eq!(
            launch.settle(&fees(), ActorId::from(TREASURY), 0, END + 1),
            Err(ContractError::AlreadySettled)
        );
        assert_eq!(
            launch.invest(ActorId::from(INVESTOR2), ONE / 10, None, END + 1),
            Err(ContractError::AlreadySettled)
        );
        assert_eq!(launch.record_charge(5, END + 1), Err(ContractError::AlreadySettled));
        assert_eq!(launch.history(), history.as_slice());
    }

    #[test]
    fn uncharged_launch_ends_and_returns_partial_charge() {
        let mut launch = Launch::new(0, ActorId::from(CREATOR), terms(), 0);
        launch.record_charge(500, 1).unwrap();
        assert_eq!(launch.state_at(END), LaunchState::Ended);
        assert_eq!(launch.ensure_chargeable(END), Err(ContractError::ChargingClosed));

        let plan = launch.settle(&fees(), ActorId::from(TREASURY), 0, END).unwrap();
        assert_eq!(plan.outcome, Outcome::Refunded);
        assert_eq!(
            plan.payouts,
            alloc::vec![Payout {
                recipient: ActorId::from(CREATOR),
                asset: Asset::Token,
                amount: 500,
                kind: PayoutKind::ChargeReturn,
            }]
        );
    }

    #[test]
    fn zero_soft_cap_without_contributions_distributes() {
        let mut t = terms();
        t.soft_cap = 0;
        let supply = t.total_supply;
        let mut launch = open_launch(t);

        let plan = launch.settle(&fees(), ActorId::from(TREASURY), 0, END).unwrap();

        assert_eq!(plan.outcome, Outcome::Distributed);
        assert!(launch.refund().is_none());
        let report = launch.distribution().unwrap();
        assert_eq!(report.tokens_distributed, 0);
        assert_eq!(report.token_surplus, supply);
        assert_eq!(tokens_of(&plan, CREATOR), supply);
        assert_eq!(native_of(&plan, RECIPIENT), 0);
    }

    #[test]
    fn unsendable_commission_stays_with_recipient() {
        let mut t = terms();
        t.lister = Some(ActorId::from(LISTER));
        let mut launch = open_launch(t);
        launch
            .invest(ActorId::from(INVESTOR1), ONE * 6 / 10, Some(ActorId::from(REFERRER)), 5)
            .unwrap();

        // Platform 2% clears the minimum; lister 1% and referral 0.5% do not.
        let min_native = ONE / 100;
        let plan = launch
            .settle(&fees(), ActorId::from(TREASURY), min_native, END)
            .unwrap();
        let report = launch.distribution().unwrap();

        let raised = ONE * 6 / 10;
        let platform = fee_splitter::bps_share(raised, 200);
        assert_eq!(native_of(&plan, TREASURY), platform);
        assert_eq!(native_of(&plan, LISTER), 0);
        assert_eq!(native_of(&plan, REFERRER), 0);
        assert_eq!(native_of(&plan, RECIPIENT), raised - platform);
        assert_eq!(report.lister_fee, 0);
        assert_eq!(report.contributor_fees, 0);
        assert!(plan
            .payouts
            .iter()
            .all(|p| p.asset == Asset::Token || p.amount >= min_native));
    }
}
