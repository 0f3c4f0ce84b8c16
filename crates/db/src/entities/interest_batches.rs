//! `SeaORM` Entity for interest_batches table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::SavingsComputationType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "interest_batches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub document_no: String,
    pub last_computation_date: Date,
    pub new_computation_date: Date,
    pub account_id: Option<Uuid>,
    pub member_type_id: Option<Uuid>,
    pub computation_type: SavingsComputationType,
    pub include_closed_accounts: bool,
    #[sea_orm(column_type = "Decimal(Some((15, 6)))")]
    pub interest_tax_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_interest: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_tax: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub created_by: Uuid,
    pub posted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::interest_batch_entries::Entity")]
    InterestBatchEntries,
}

impl Related<super::interest_batch_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InterestBatchEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
