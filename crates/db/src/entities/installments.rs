//! `SeaORM` Entity for installments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "installments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub advance_id: Uuid,
    pub number: i32,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub amount: Decimal,
    pub entry_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::advances::Entity",
        from = "Column::AdvanceId",
        to = "super::advances::Column::Id"
    )]
    Advances,
    #[sea_orm(
        belongs_to = "super::payroll_entries::Entity",
        from = "Column::EntryId",
        to = "super::payroll_entries::Column::Id"
    )]
    PayrollEntries,
}

impl Related<super::advances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Advances.def()
    }
}

impl Related<super::payroll_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayrollEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
