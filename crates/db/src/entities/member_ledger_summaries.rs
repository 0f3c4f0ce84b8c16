//! `SeaORM` Entity for member_ledger_summaries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "member_ledger_summaries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub member_profile_id: Uuid,
    pub account_id: Uuid,
    pub count: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub interest: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub fines: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub due: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub carried_forward_due: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub stored_value_facility: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub principal_due: Decimal,
    pub last_pay: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub updated_by: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::member_profiles::Entity",
        from = "Column::MemberProfileId",
        to = "super::member_profiles::Column::Id"
    )]
    MemberProfiles,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
}

impl Related<super::member_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MemberProfiles.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
