//! `SeaORM` Entity for bank_accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "bank_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub agency: String,
    pub account_number: String,
    pub agreement_number: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payment_batches::Entity")]
    PaymentBatches,
}

impl Related<super::payment_batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentBatches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
