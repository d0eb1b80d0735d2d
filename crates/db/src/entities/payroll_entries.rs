//! `SeaORM` Entity for payroll_entries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payroll_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub payroll_id: Uuid,
    pub employee_id: Uuid,
    pub contract_type: String,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub base_salary: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub daily_rate: Decimal,
    pub days_worked: i32,
    pub absences: i32,
    #[sea_orm(column_type = "Decimal(Some((8, 2)))")]
    pub overtime_hours: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub overtime_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub cost_allowance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub extras: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub loose_advance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub advance_deduction: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub gross_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub net_amount: Decimal,
    pub payment_status: String,
    pub payment_method: String,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payrolls::Entity",
        from = "Column::PayrollId",
        to = "super::payrolls::Column::Id"
    )]
    Payrolls,
    #[sea_orm(
        belongs_to = "super::employees::Entity",
        from = "Column::EmployeeId",
        to = "super::employees::Column::Id"
    )]
    Employees,
    #[sea_orm(has_many = "super::installments::Entity")]
    Installments,
}

impl Related<super::payrolls::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payrolls.def()
    }
}

impl Related<super::employees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employees.def()
    }
}

impl Related<super::installments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Installments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
