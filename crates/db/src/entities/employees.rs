//! `SeaORM` Entity for employees table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub cpf: Option<String>,
    pub contract_type: String,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub base_salary: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub daily_rate: Decimal,
    pub pix_key_type: Option<String>,
    pub pix_key: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payroll_entries::Entity")]
    PayrollEntries,
    #[sea_orm(has_many = "super::advances::Entity")]
    Advances,
}

impl Related<super::payroll_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayrollEntries.def()
    }
}

impl Related<super::advances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Advances.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
