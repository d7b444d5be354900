//! Token ledger fixture for gtest.
//!
//! Answers the launchpad's ledger requests with real `source()` semantics and
//! adds a few controls for tests: minting and marking accounts that refuse
//! incoming transfers. Refused or uncovered transfers panic, which reaches the
//! caller as an error reply.

#![no_std]

extern crate alloc;

use gstd::ActorId;
use parity_scale_codec::{Decode, Encode};

/// The first five variants mirror the launchpad's ledger protocol.
#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub enum Request {
    Transfer { to: ActorId, value: u128 },
    TransferFrom { from: ActorId, to: ActorId, value: u128 },
    Approve { spender: ActorId, value: u128 },
    BalanceOf { account: ActorId },
    Allowance { owner: ActorId, spender: ActorId },
    Mint { to: ActorId, value: u128 },
    SetRejecting { account: ActorId, rejecting: bool },
}

#[cfg(target_arch = "wasm32")]
mod program {
    use super::Request;
    use alloc::collections::{BTreeMap, BTreeSet};
    use gstd::{msg, ActorId};

    #[derive(Default)]
    struct Ledger {
        balances: BTreeMap<ActorId, u128>,
        allowances: BTreeMap<(ActorId, ActorId), u128>,
        rejecting: BTreeSet<ActorId>,
    }

    impl Ledger {
        fn balance(&self, account: &ActorId) -> u128 {
            self.balances.get(account).copied().unwrap_or(0)
        }

        fn move_tokens(&mut self, from: ActorId, to: ActorId, value: u128) {
            if self.rejecting.contains(&to) {
                panic!("recipient refuses transfers");
            }
            let from_balance = self.balance(&from);
            if from_balance < value {
                panic!("insufficient balance");
            }
            self.balances.insert(from, from_balance - value);
            *self.balances.entry(to).or_insert(0) += value;
        }
    }

    static mut LEDGER: Option<Ledger> = None;

    #[allow(static_mut_refs)]
    fn ledger() -> &'static mut Ledger {
        unsafe { LEDGER.get_or_insert_with(Ledger::default) }
    }

    #[no_mangle]
    extern "C" fn init() {}

    #[no_mangle]
    extern "C" fn handle() {
        let request: Request = msg::load().expect("unknown request");
        let source = msg::source();
        let ledger = ledger();

        match request {
            Request::Transfer { to, value } => {
                ledger.move_tokens(source, to, value);
                msg::reply(true, 0).expect("reply failed");
            }
            Request::TransferFrom { from, to, value } => {
                let allowance = ledger.allowances.get(&(from, source)).copied().unwrap_or(0);
                if allowance < value {
                    panic!("insufficient allowance");
                }
                ledger.move_tokens(from, to, value);
                ledger.allowances.insert((from, source), allowance - value);
                msg::reply(true, 0).expect("reply failed");
            }
            Request::Approve { spender, value } => {
                ledger.allowances.insert((source, spender), value);
                msg::reply(true, 0).expect("reply failed");
            }
            Request::BalanceOf { account } => {
                msg::reply(ledger.balance(&account), 0).expect("reply failed");
            }
            Request::Allowance { owner, spender } => {
                let allowance = ledger.allowances.get(&(owner, spender)).copied().unwrap_or(0);
                msg::reply(allowance, 0).expect("reply failed");
            }
            Request::Mint { to, value } => {
                *ledger.balances.entry(to).or_insert(0) += value;
                msg::reply(true, 0).expect("reply failed");
            }
            Request::SetRejecting { account, rejecting } => {
                if rejecting {
                    ledger.rejecting.insert(account);
                } else {
                    ledger.rejecting.remove(&account);
                }
                msg::reply(true, 0).expect("reply failed");
            }
        }
    }
}

#[cfg(feature = "wasm-binary")]
#[cfg(not(target_arch = "wasm32"))]
pub use code::WASM_BINARY_OPT as WASM_BINARY;

#[cfg(feature = "wasm-binary")]
#[cfg(not(target_arch = "wasm32"))]
mod code {
    include!(concat!(env!("OUT_DIR"), "/wasm_binary.rs"));
}
