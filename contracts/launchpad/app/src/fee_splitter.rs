//! Commission split of a successful raise.
//!
//! Shares are floored in basis points; whatever the flooring leaves behind is
//! part of the creator's payout, so the allocation always sums to the raise.
//! A share below the smallest value the chain lets a message carry is folded
//! into the creator's payout as well.

use alloc::vec::Vec;
use parity_scale_codec::{Decode, Encode};
use scale_info::TypeInfo;
use sails_rs::prelude::*;
use launchpad_shared::{Amount, BasisPoints, ContractError, FeeConfig, MAX_BASIS_POINTS};

use crate::launch::Contribution;

/// Referral commission owed for one contribution.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, TypeInfo)]
#[codec(crate = sails_rs::scale_codec)]
#[scale_info(crate = sails_rs::scale_info)]
pub struct ReferralShare {
    pub sequence_number: u64,
    pub referrer: ActorId,
    pub amount: Amount,
}

/// Deterministic allocation of a raise.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeeSplit {
    pub platform: Amount,
    pub lister: Option<(ActorId, Amount)>,
    pub referrals: Vec<ReferralShare>,
    pub creator: Amount,
}

impl FeeSplit {
    pub fn lister_amount(&self) -> Amount {
        self.lister.map(|(_, amount)| amount).unwrap_or(0)
    }

    pub fn referral_total(&self) -> Amount {
        self.referrals.iter().map(|r| r.amount).sum()
    }
}

/// `amount * bps / 10_000`, floored, without overflowing for any `amount`.
pub fn bps_share(amount: Amount, bps: BasisPoints) -> Amount {
    let scale = MAX_BASIS_POINTS as Amount;
    let bps = bps as Amount;
    (amount / scale) * bps + (amount % scale) * bps / scale
}

/// Zero when `share` is too small to be sent on its own.
fn sendable(share: Amount, min_native: Amount) -> Amount {
    if share < min_native {
        0
    } else {
        share
    }
}

/// Split `raised` between the platform, the optional lister, each referred
/// contribution's referrer, and the creator. Shares below `min_native` go to
/// the creator.
pub fn split(
    config: &FeeConfig,
    raised: Amount,
    lister: Option<ActorId>,
    contributions: &[Contribution],
    min_native: Amount,
) -> Result<FeeSplit, ContractError> {
    config.validate()?;

    let platform = sendable(bps_share(raised, config.platform_bps), min_native);
    let lister = lister.map(|who| {
        (who, sendable(bps_share(raised, config.lister_bps), min_native))
    });

    let referrals: Vec<ReferralShare> = contributions
        .iter()
        .filter_map(|c| {
            c.contributor_referral.map(|referrer| ReferralShare {
                sequence_number: c.sequence_number,
                referrer,
                amount: sendable(
                    bps_share(c.native_amount_paid, config.contributor_bps),
                    min_native,
                ),
            })
        })
        .filter(|share| share.amount > 0)
        .collect();

    let mut split = FeeSplit {
        platform,
        lister,
        referrals,
        creator: 0,
    };

    split.creator = raised
        .checked_sub(split.platform)
        .and_then(|rest| rest.checked_sub(split.lister_amount()))
        .and_then(|rest| rest.checked_sub(split.referral_total()))
        .ok_or(ContractError::Overflow)?;

    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn contribution(seq: u64, paid: Amount, referral: Option<u64>) -> Contribution {
        Contribution {
            sequence_number: seq,
            investor: ActorId::from(10 + seq),
            contributor_referral: referral.map(ActorId::from),
            native_amount_paid: paid,
            token_amount_credited: paid,
            timestamp: 0,
        }
    }

    #[test]
    fn share_is_floored() {
        assert_eq!(bps_share(10_000, 200), 200);
        assert_eq!(bps_share(99, 200), 1);
        assert_eq!(bps_share(49, 200), 0);
        assert_eq!(bps_share(u128::MAX, MAX_BASIS_POINTS), u128::MAX);
    }

    #[test]
    fn split_without_lister_or_referrals() {
        let config = FeeConfig::new(200, 100, 50);
        let contributions = vec![contribution(0, 1_000, None)];

        let split = split(&config, 1_000, None, &contributions, 0).unwrap();

        assert_eq!(split.platform, 20);
        assert_eq!(split.lister, None);
        assert!(split.referrals.is_empty());
        assert_eq!(split.creator, 980);
    }

    #[test]
    fn split_with_lister_and_referrals_loses_nothing() {
        let config = FeeConfig::new(250, 125, 75);
        let lister = ActorId::from(7);
        let contributions = vec![
            contribution(0, 333_333, Some(50)),
            contribution(1, 111, None),
            contribution(2, 666_667, Some(51)),
        ];
        let raised = 1_000_111;

        let split = split(&config, raised, Some(lister), &contributions, 0).unwrap();

        assert_eq!(split.platform, 25_002);
        assert_eq!(split.lister, Some((lister, 12_501)));
        assert_eq!(split.referrals.len(), 2);
        assert_eq!(split.referrals[0].referrer, ActorId::from(50));
        assert_eq!(split.referrals[0].amount, 2_499);
        assert_eq!(split.referrals[1].sequence_number, 2);
        assert_eq!(split.referrals[1].amount, 5_000);
        assert_eq!(
            split.platform + split.lister_amount() + split.referral_total() + split.creator,
            raised
        );
    }

    #[test]
    fn dust_referrals_are_dropped() {
        let config = FeeConfig::new(0, 0, 50);
        let contributions = vec![contribution(0, 100, Some(50))];

        let split = split(&config, 100, None, &contributions, 0).unwrap();

        assert!(split.referrals.is_empty());
        assert_eq!(split.creator, 100);
    }

    #[test]
    fn unsendable_shares_go_to_the_creator() {
        let config = FeeConfig::new(200, 100, 50);
        let lister = ActorId::from(7);
        let contributions = vec![
            contribution(0, 10_000, Some(50)),
            contribution(1, 90_000, Some(51)),
        ];
        let raised = 100_000;

        // Platform 2_000 and lister 1_000 clear the minimum; referrals 50 and
        // 450 do not.
        let split = split(&config, raised, Some(lister), &contributions, 500).unwrap();

        assert_eq!(split.platform, 2_000);
        assert_eq!(split.lister, Some((lister, 1_000)));
        assert!(split.referrals.is_empty());
        assert_eq!(split.creator, 97_000);

        // A higher minimum leaves everything with the creator.
        let split = super::split(&config, raised, Some(lister), &contributions, 5_000).unwrap();
        assert_eq!(split.platform, 0);
        assert_eq!(split.lister_amount(), 0);
        assert_eq!(split.creator, raised);
    }

    #[test]
    fn oversized_config_is_rejected() {
        let config = FeeConfig::new(9_000, 900, 101);
        assert_eq!(
            split(&config, 1_000, None, &[], 0),
            Err(ContractError::InvalidTerms)
        );
    }
}
