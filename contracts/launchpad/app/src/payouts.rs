//! Outstanding settlement balances of one launch.
//!
//! Balances are credited before any transfer is attempted and taken out right
//! before sending. A failed send puts the amount back, where the recipient can
//! later pull it with a claim.

use alloc::collections::BTreeMap;
use parity_scale_codec::{Decode, Encode};
use scale_info::TypeInfo;
use sails_rs::prelude::*;
use launchpad_shared::{Amount, Asset, ContractError};

/// What is still owed to one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct Outstanding {
    pub native: Amount,
    pub tokens: Amount,
}

impl Outstanding {
    pub fn is_empty(&self) -> bool {
        self.native == 0 && self.tokens == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct PendingPayouts {
    native: BTreeMap<ActorId, Amount>,
    tokens: BTreeMap<ActorId, Amount>,
}

impl PendingPayouts {
    fn book_mut(&mut self, asset: Asset) -> &mut BTreeMap<ActorId, Amount> {
        match asset {
            Asset::Native => &mut self.native,
            Asset::Token => &mut self.tokens,
        }
    }

    pub fn credit(&mut self, recipient: ActorId, asset: Asset, amount: Amount) -> Result<(), ContractError> {
        if amount == 0 {
            return Ok(());
        }
        let balance = self.book_mut(asset).entry(recipient).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(ContractError::Overflow)?;
        Ok(())
    }

    /// Remove and return the whole balance of `recipient` in `asset`.
    pub fn take(&mut self, recipient: ActorId, asset: Asset) -> Amount {
        self.book_mut(asset).remove(&recipient).unwrap_or(0)
    }

    /// Remove everything owed to `recipient`.
    pub fn take_all(&mut self, recipient: ActorId) -> Outstanding {
        Outstanding {
            native: self.take(recipient, Asset::Native),
            tokens: self.take(recipient, Asset::Token),
        }
    }

    pub fn outstanding(&self, recipient: ActorId) -> Outstanding {
        Outstanding {
            native: self.native.get(&recipient).copied().unwrap_or(0),
            tokens: self.tokens.get(&recipient).copied().unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.native.is_empty() && self.tokens.is_empty()
    }
}
