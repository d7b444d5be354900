//! Client for the external token ledger (a VFT program).
//!
//! Requests are SCALE-encoded [`LedgerRequest`] messages answered by a reply.
//! Transfer-style requests reply with a `bool`.

use parity_scale_codec::{Decode, Encode};
use scale_info::TypeInfo;
use sails_rs::prelude::*;
use launchpad_shared::{Amount, ContractError};

/// Messages understood by a token ledger.
#[derive(Debug, Clone, Encode, Decode, TypeInfo, PartialEq, Eq)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub enum LedgerRequest {
    Transfer { to: ActorId, value: Amount },
    TransferFrom { from: ActorId, to: ActorId, value: Amount },
    Approve { spender: ActorId, value: Amount },
    BalanceOf { account: ActorId },
    Allowance { owner: ActorId, spender: ActorId },
}

/// Async gateway to one ledger program.
#[derive(Debug, Clone, Copy)]
pub struct VftClient {
    ledger: ActorId,
}

impl VftClient {
    pub fn new(ledger: ActorId) -> Self {
        Self { ledger }
    }

    async fn request(&self, request: LedgerRequest) -> Result<Vec<u8>, ContractError> {
        let payload = request.encode();

        gstd::msg::send_bytes_for_reply(self.ledger, payload, 0, 0)
            .map_err(|_| ContractError::TransferFailed)?
            .await
            .map_err(|_| ContractError::TransferFailed)
    }

    async fn execute(&self, request: LedgerRequest) -> Result<(), ContractError> {
        let reply = self.request(request).await?;
        match bool::decode(&mut reply.as_slice()) {
            Ok(true) => Ok(()),
            _ => Err(ContractError::TransferFailed),
        }
    }

    async fn query(&self, request: LedgerRequest) -> Result<Amount, ContractError> {
        let reply = self.request(request).await?;
        Amount::decode(&mut reply.as_slice()).map_err(|_| ContractError::TransferFailed)
    }

    /// Move tokens held by this program to `to`.
    pub async fn transfer(&self, to: ActorId, value: Amount) -> Result<(), ContractError> {
        self.execute(LedgerRequest::Transfer { to, value }).await
    }

    /// Pull tokens from `from` (requires approval).
    pub async fn transfer_from(
        &self,
        from: ActorId,
        to: ActorId,
        value: Amount,
    ) -> Result<(), ContractError> {
        self.execute(LedgerRequest::TransferFrom { from, to, value }).await
    }

    pub async fn allowance(&self, owner: ActorId, spender: ActorId) -> Result<Amount, ContractError> {
        self.query(LedgerRequest::Allowance { owner, spender }).await
    }

    /// Pull `value` from `from` into `to`, telling a missing allowance apart
    /// from a missing balance when the ledger refuses.
    pub async fn pull(&self, from: ActorId, to: ActorId, value: Amount) -> Result<(), ContractError> {
        if self.transfer_from(from, to, value).await.is_ok() {
            return Ok(());
        }
        let spender = gstd::exec::program_id();
        match self.allowance(from, spender).await {
            Ok(allowance) if allowance < value => Err(ContractError::InsufficientAllowance),
            _ => Err(ContractError::InsufficientBalance),
        }
    }
}
