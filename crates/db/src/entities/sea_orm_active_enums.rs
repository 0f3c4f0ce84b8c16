//! `SeaORM` active enums mirroring the PostgreSQL enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "general_ledger_type")]
pub enum GeneralLedgerType {
    #[sea_orm(string_value = "assets")]
    Assets,
    #[sea_orm(string_value = "liabilities")]
    Liabilities,
    #[sea_orm(string_value = "equity")]
    Equity,
    #[sea_orm(string_value = "revenue")]
    Revenue,
    #[sea_orm(string_value = "expenses")]
    Expenses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_kind")]
pub enum AccountKind {
    #[sea_orm(string_value = "deposit")]
    Deposit,
    #[sea_orm(string_value = "loan")]
    Loan,
    #[sea_orm(string_value = "ar_ledger")]
    ArLedger,
    #[sea_orm(string_value = "ar_aging")]
    ArAging,
    #[sea_orm(string_value = "fines")]
    Fines,
    #[sea_orm(string_value = "interest")]
    Interest,
    #[sea_orm(string_value = "svf_ledger")]
    SvfLedger,
    #[sea_orm(string_value = "write_off")]
    WriteOff,
    #[sea_orm(string_value = "ap_ledger")]
    ApLedger,
    #[sea_orm(string_value = "time_deposit")]
    TimeDeposit,
    #[sea_orm(string_value = "other")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_source")]
pub enum EntrySource {
    #[sea_orm(string_value = "withdraw")]
    Withdraw,
    #[sea_orm(string_value = "deposit")]
    Deposit,
    #[sea_orm(string_value = "journal")]
    Journal,
    #[sea_orm(string_value = "payment")]
    Payment,
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
    #[sea_orm(string_value = "journal_voucher")]
    JournalVoucher,
    #[sea_orm(string_value = "check_voucher")]
    CheckVoucher,
    #[sea_orm(string_value = "loan")]
    Loan,
    #[sea_orm(string_value = "savings_interest")]
    SavingsInterest,
    #[sea_orm(string_value = "mutual_contribution")]
    MutualContribution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "snapshot_change_type")]
pub enum SnapshotChangeType {
    #[sea_orm(string_value = "created")]
    Created,
    #[sea_orm(string_value = "updated")]
    Updated,
    #[sea_orm(string_value = "deleted")]
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "savings_computation_type")]
pub enum SavingsComputationType {
    #[sea_orm(string_value = "daily_lowest_balance")]
    DailyLowestBalance,
    #[sea_orm(string_value = "average_daily_balance")]
    AverageDailyBalance,
    #[sea_orm(string_value = "monthly_end_lowest_balance")]
    MonthlyEndLowestBalance,
    #[sea_orm(string_value = "adb_end_balance")]
    AdbEndBalance,
    #[sea_orm(string_value = "monthly_lowest_balance_average")]
    MonthlyLowestBalanceAverage,
    #[sea_orm(string_value = "monthly_end_balance_average")]
    MonthlyEndBalanceAverage,
    #[sea_orm(string_value = "monthly_end_balance_total")]
    MonthlyEndBalanceTotal,
}
