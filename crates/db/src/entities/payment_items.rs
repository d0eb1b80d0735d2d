//! `SeaORM` Entity for payment_items table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub batch_id: Uuid,
    pub entry_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub beneficiary_name: String,
    pub pix_key_type: String,
    pub pix_key: String,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub amount: Decimal,
    pub estado_pagamento: String,
    pub bank_reference: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payment_batches::Entity",
        from = "Column::BatchId",
        to = "super::payment_batches::Column::Id"
    )]
    PaymentBatches,
    #[sea_orm(
        belongs_to = "super::payroll_entries::Entity",
        from = "Column::EntryId",
        to = "super::payroll_entries::Column::Id"
    )]
    PayrollEntries,
}

impl Related<super::payment_batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentBatches.def()
    }
}

impl Related<super::payroll_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayrollEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
