//! `SeaORM` Entity for payrolls table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payrolls")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub year: i32,
    pub month: i32,
    pub quinzena: i32,
    pub description: Option<String>,
    pub status: String,
    pub entry_count: i32,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub total_gross: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub total_advances: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub total_net: Decimal,
    pub created_by: Uuid,
    pub finalized_at: Option<DateTimeWithTimeZone>,
    pub finalized_by: Option<Uuid>,
    pub released_at: Option<DateTimeWithTimeZone>,
    pub closed_at: Option<DateTimeWithTimeZone>,
    pub cancelled_at: Option<DateTimeWithTimeZone>,
    pub cancelled_by: Option<Uuid>,
    pub cancel_reason: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payroll_entries::Entity")]
    PayrollEntries,
    #[sea_orm(has_many = "super::payment_batches::Entity")]
    PaymentBatches,
}

impl Related<super::payroll_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayrollEntries.def()
    }
}

impl Related<super::payment_batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentBatches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
