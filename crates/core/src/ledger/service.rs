//! Posting service for single ledger entries.
//!
//! Contains the pure part of a posting: input validation, scope resolution,
//! sign rule and running balance. The db layer supplies the account and the
//! locked prior balance, then persists what this returns.

use rust_decimal::Decimal;

use super::balance::{NormalBalance, RunningBalance};
use super::error::LedgerError;
use super::types::{AccountInfo, MONEY_SCALE, PostingInput, PostingScope};

/// A validated posting, ready to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreparedPosting {
    /// Scope the balance is tracked under.
    pub scope: PostingScope,
    /// Signed effect on the balance.
    pub balance_change: Decimal,
    /// Resulting running balance.
    pub running: RunningBalance,
    /// Whether the member summary has to follow this posting.
    pub updates_member_summary: bool,
}

/// Posting service for entry validation and balance resolution.
pub struct PostingService;

impl PostingService {
    /// Validates amounts and resolves the scope of a posting.
    ///
    /// Zero on both sides is legal and still produces an audit row.
    pub fn resolve_scope(
        input: &PostingInput,
        account: &AccountInfo,
    ) -> Result<PostingScope, LedgerError> {
        Self::validate_amounts(input.debit, input.credit)?;
        if account.is_deleted {
            return Err(LedgerError::AccountDeleted(account.id));
        }
        if account.id != input.account_id {
            return Err(LedgerError::InvalidState(format!(
                "posting for account {} resolved against account {}",
                input.account_id, account.id
            )));
        }

        Ok(PostingScope::resolve(
            input.organization_id,
            input.branch_id,
            input.account_id,
            account.kind,
            input.member_profile_id,
        ))
    }

    /// Computes the entry's running balance from the locked prior entry.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if amounts are negative or the account is unclassified.
    pub fn prepare(
        input: &PostingInput,
        account: &AccountInfo,
        previous: Option<&RunningBalance>,
    ) -> Result<PreparedPosting, LedgerError> {
        let scope = Self::resolve_scope(input, account)?;
        let rule = NormalBalance::for_account(account.id, account.general_ledger_type)?;
        let balance_change = rule.calculate_balance_change(input.debit, input.credit);

        Ok(PreparedPosting {
            scope,
            balance_change,
            running: RunningBalance::after(previous, balance_change),
            updates_member_summary: scope.is_member_scope(),
        })
    }

    /// Rejects negative amounts and amounts finer than [`MONEY_SCALE`].
    ///
    /// Trailing zeros do not count, so `1.50000` passes.
    pub fn validate_amounts(debit: Decimal, credit: Decimal) -> Result<(), LedgerError> {
        if debit < Decimal::ZERO {
            return Err(LedgerError::NegativeDebit(debit));
        }
        if credit < Decimal::ZERO {
            return Err(LedgerError::NegativeCredit(credit));
        }
        for amount in [debit, credit] {
            if amount.normalize().scale() > MONEY_SCALE {
                return Err(LedgerError::ExcessScale {
                    amount,
                    max: MONEY_SCALE,
                });
            }
        }
        Ok(())
    }
}
