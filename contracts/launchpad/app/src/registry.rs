//! Spam-fee gate and launch directory.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use parity_scale_codec::{Decode, Encode};
use scale_info::TypeInfo;
use sails_rs::prelude::*;
use launchpad_shared::{Amount, ContractError, Id, Timestamp};

use crate::launch::{Launch, LaunchTerms};

/// Permanent record of a creator's spam fee payment.
#[derive(Debug, Clone, Encode, Decode, TypeInfo, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct RegistryEntry {
    pub creator: ActorId,
    pub spam_fee_paid: bool,
    pub fee_paid_amount: Amount,
    pub paid_at: Timestamp,
}

/// Owns every launch; ids are indices into `launches`.
#[derive(Debug, Default)]
pub struct Registry {
    entries: BTreeMap<ActorId, RegistryEntry>,
    payments_in_flight: BTreeSet<ActorId>,
    launches: Vec<Launch>,
}

impl Registry {
    pub fn is_paid(&self, creator: &ActorId) -> bool {
        self.entries
            .get(creator)
            .map(|e| e.spam_fee_paid)
            .unwrap_or(false)
    }

    pub fn entry(&self, creator: &ActorId) -> Option<&RegistryEntry> {
        self.entries.get(creator)
    }

    /// Reserve the fee payment for `caller` until the ledger answers.
    pub fn begin_fee_payment(&mut self, caller: ActorId) -> Result<(), ContractError> {
        if self.is_paid(&caller) {
            return Err(ContractError::AlreadyPaid);
        }
        if !self.payments_in_flight.insert(caller) {
            return Err(ContractError::PaymentInProgress);
        }
        Ok(())
    }

    /// The ledger confirmed the pull.
    pub fn confirm_fee_payment(&mut self, caller: ActorId, amount: Amount, now: Timestamp) {
        self.payments_in_flight.remove(&caller);
        self.entries.insert(
            caller,
            RegistryEntry {
                creator: caller,
                spam_fee_paid: true,
                fee_paid_amount: amount,
                paid_at: now,
            },
        );
    }

    /// The ledger rejected the pull; nothing was debited.
    pub fn abort_fee_payment(&mut self, caller: &ActorId) {
        self.payments_in_flight.remove(caller);
    }

    pub fn launch_new(
        &mut self,
        caller: ActorId,
        terms: LaunchTerms,
        now: Timestamp,
    ) -> Result<Id, ContractError> {
        if !self.is_paid(&caller) {
            return Err(ContractError::NotEligible);
        }
        terms.validate(now)?;

        let id = self.launches.len() as Id;
        self.launches.push(Launch::new(id, caller, terms, now));
        Ok(id)
    }

    /// Ids in creation order.
    pub fn list_launches(&self) -> Vec<Id> {
        (0..self.launches.len() as Id).collect()
    }

    pub fn launch_count(&self) -> u64 {
        self.launches.len() as u64
    }

    pub fn launch(&self, id: Id) -> Result<&Launch, ContractError> {
        self.launches.get(id as usize).ok_or(ContractError::NotFound)
    }

    pub fn launch_mut(&mut self, id: Id) -> Result<&mut Launch, ContractError> {
        self.launches.get_mut(id as usize).ok_or(ContractError::NotFound)
    }

    pub fn launches(&self) -> impl Iterator<Item = &Launch> {
        self.launches.iter()
    }
}
