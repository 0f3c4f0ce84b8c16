//! `SeaORM` Entity for account_snapshots table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{AccountKind, GeneralLedgerType, SnapshotChangeType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "account_snapshots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub change_type: SnapshotChangeType,
    #[sea_orm(column_type = "Text", nullable)]
    pub change_reason: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub changed_fields: Json,
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
    pub valid_from: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
    pub created_by: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
