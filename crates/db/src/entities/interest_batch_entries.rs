//! `SeaORM` Entity for interest_batch_entries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "interest_batch_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub interest_batch_id: Uuid,
    pub account_id: Uuid,
    pub member_profile_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub beginning_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub ending_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub average_daily_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub lowest_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub highest_balance: Decimal,
    pub day_count: i32,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub interest_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub interest_tax: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub balance_after_interest: Decimal,
    pub computed: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::interest_batches::Entity",
        from = "Column::InterestBatchId",
        to = "super::interest_batches::Column::Id"
    )]
    InterestBatches,
}

impl Related<super::interest_batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InterestBatches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
