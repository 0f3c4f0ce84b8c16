//! `SeaORM` Entity for accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{AccountKind, GeneralLedgerType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub general_ledger_type: Option<GeneralLedgerType>,
    pub kind: AccountKind,
    pub currency_code: String,
    pub member_type_id: Option<Uuid>,
    pub loan_account_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub min_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub max_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 6)))")]
    pub interest_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub minimum_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub below_minimum_charge: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 6)))")]
    pub interest_standard: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 6)))")]
    pub interest_secured: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 6)))")]
    pub fines_amortization: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 6)))")]
    pub fines_maturity: Decimal,
    pub grace_period_amortization: i32,
    pub grace_period_maturity: i32,
    pub cut_off_days: i32,
    pub cut_off_months: i32,
    pub is_internal: bool,
    pub cash_on_hand: bool,
    pub paid_up_share_capital: bool,
    pub is_taxable: bool,
    pub created_at: DateTimeWithTimeZone,
    pub created_by: Uuid,
    pub updated_at: DateTimeWithTimeZone,
    pub updated_by: Uuid,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::branches::Entity",
        from = "Column::BranchId",
        to = "super::branches::Column::Id"
    )]
    Branches,
    #[sea_orm(has_many = "super::account_snapshots::Entity")]
    AccountSnapshots,
    #[sea_orm(has_many = "super::general_ledger_entries::Entity")]
    GeneralLedgerEntries,
}

impl Related<super::branches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Branches.def()
    }
}

impl Related<super::account_snapshots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountSnapshots.def()
    }
}

impl Related<super::general_ledger_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GeneralLedgerEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
