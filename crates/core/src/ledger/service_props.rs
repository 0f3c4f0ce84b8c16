//! Property tests for the posting service.

use coopledger_shared::types::{AccountId, BranchId, MemberProfileId, OrganizationId, UserId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::balance::RunningBalance;
use super::service::PostingService;
use super::types::{AccountInfo, AccountKind, GeneralLedgerType, PostingInput};

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|n| Decimal::new(n, 2))
}

fn posting_strategy() -> impl Strategy<Value = (Decimal, Decimal)> {
    prop_oneof![
        amount_strategy().prop_map(|d| (d, Decimal::ZERO)),
        amount_strategy().prop_map(|c| (Decimal::ZERO, c)),
    ]
}

fn replay(
    account: &AccountInfo,
    scope_input: &PostingInput,
    postings: &[(Decimal, Decimal)],
) -> Option<RunningBalance> {
    let mut last: Option<RunningBalance> = None;
    for (debit, credit) in postings {
        let mut input = scope_input.clone();
        input.debit = *debit;
        input.credit = *credit;
        let prepared = PostingService::prepare(&input, account, last.as_ref()).ok()?;
        last = Some(prepared.running);
    }
    last
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For any posting sequence to one scope, the final balance is the signed
    /// sum from zero, whatever is posted to other scopes in between.
    #[test]
    fn prop_scope_balance_is_cumulative_signed_sum(
        mine in prop::collection::vec(posting_strategy(), 1..30),
        theirs in prop::collection::vec(posting_strategy(), 0..30),
    ) {
        let account = AccountInfo {
            id: AccountId::new(),
            general_ledger_type: Some(GeneralLedgerType::Liabilities),
            kind: AccountKind::Deposit,
            is_deleted: false,
        };
        let org = OrganizationId::new();
        let branch = BranchId::new();
        let base = PostingInput::new(org, branch, account.id, Decimal::ZERO, Decimal::ZERO, UserId::new());
        let me = base.clone().for_member(MemberProfileId::new());
        let them = base.for_member(MemberProfileId::new());

        // Interleave: their postings live in a separate chain and never touch mine.
        let _ = replay(&account, &them, &theirs);
        let final_balance = replay(&account, &me, &mine).map(|r| r.current_balance);

        let expected: Decimal = mine.iter().map(|(d, c)| c - d).sum();
        prop_assert_eq!(final_balance, Some(expected));
    }

    /// Scope resolution only depends on the account kind and member presence.
    #[test]
    fn prop_member_scope_iff_trackable(
        trackable in any::<bool>(),
        with_member in any::<bool>(),
    ) {
        let kind = if trackable { AccountKind::Deposit } else { AccountKind::Other };
        let account = AccountInfo {
            id: AccountId::new(),
            general_ledger_type: Some(GeneralLedgerType::Assets),
            kind,
            is_deleted: false,
        };
        let mut input = PostingInput::new(
            OrganizationId::new(), BranchId::new(), account.id,
            Decimal::ONE, Decimal::ZERO, UserId::new(),
        );
        if with_member {
            input = input.for_member(MemberProfileId::new());
        }
        let prepared = PostingService::prepare(&input, &account, None).unwrap();
        prop_assert_eq!(prepared.updates_member_summary, trackable && with_member);
    }
}
