//! Initial database migration.
//!
//! Creates the employee, payroll, advance and PIX batch tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: PEOPLE
        // ============================================================
        db.execute_unprepared(EMPLOYEES_SQL).await?;

        // ============================================================
        // PART 2: PAYROLL
        // ============================================================
        db.execute_unprepared(PAYROLLS_SQL).await?;
        db.execute_unprepared(PAYROLL_ENTRIES_SQL).await?;

        // ============================================================
        // PART 3: ADVANCES
        // ============================================================
        db.execute_unprepared(ADVANCES_SQL).await?;
        db.execute_unprepared(INSTALLMENTS_SQL).await?;

        // ============================================================
        // PART 4: PIX BATCHES
        // ============================================================
        db.execute_unprepared(BANK_ACCOUNTS_SQL).await?;
        db.execute_unprepared(PAYMENT_BATCHES_SQL).await?;
        db.execute_unprepared(PAYMENT_ITEMS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const EMPLOYEES_SQL: &str = r"
CREATE TABLE employees (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    cpf VARCHAR(11),
    contract_type VARCHAR(20) NOT NULL DEFAULT 'MENSALISTA'
        CHECK (contract_type IN ('MENSALISTA', 'DIARISTA')),
    base_salary NUMERIC(14, 2) NOT NULL DEFAULT 0 CHECK (base_salary >= 0),
    daily_rate NUMERIC(14, 2) NOT NULL DEFAULT 0 CHECK (daily_rate >= 0),
    pix_key_type VARCHAR(20),
    pix_key VARCHAR(77),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_pix_key_pair CHECK ((pix_key_type IS NULL) = (pix_key IS NULL))
);

CREATE UNIQUE INDEX idx_employees_cpf ON employees(cpf) WHERE cpf IS NOT NULL;
CREATE INDEX idx_employees_active ON employees(name) WHERE is_active = true;
";

const PAYROLLS_SQL: &str = r"
CREATE TABLE payrolls (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    year INTEGER NOT NULL CHECK (year BETWEEN 2000 AND 2100),
    month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
    quinzena INTEGER NOT NULL CHECK (quinzena IN (1, 2)),
    description TEXT,
    status VARCHAR(30) NOT NULL DEFAULT 'RASCUNHO'
        CHECK (status IN (
            'RASCUNHO', 'PENDENTE_LIBERACAO', 'EM_PROCESSAMENTO', 'FECHADA', 'CANCELADA'
        )),
    entry_count INTEGER NOT NULL DEFAULT 0,
    total_gross NUMERIC(14, 2) NOT NULL DEFAULT 0,
    total_advances NUMERIC(14, 2) NOT NULL DEFAULT 0,
    total_net NUMERIC(14, 2) NOT NULL DEFAULT 0,
    created_by UUID NOT NULL,
    finalized_at TIMESTAMPTZ,
    finalized_by UUID,
    released_at TIMESTAMPTZ,
    closed_at TIMESTAMPTZ,
    cancelled_at TIMESTAMPTZ,
    cancelled_by UUID,
    cancel_reason TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- One live payroll per period; cancelled ones do not count
CREATE UNIQUE INDEX idx_payrolls_period ON payrolls(year, month, quinzena)
    WHERE status <> 'CANCELADA';
";

const PAYROLL_ENTRIES_SQL: &str = r"
CREATE TABLE payroll_entries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    payroll_id UUID NOT NULL REFERENCES payrolls(id) ON DELETE CASCADE,
    employee_id UUID NOT NULL REFERENCES employees(id),
    contract_type VARCHAR(20) NOT NULL
        CHECK (contract_type IN ('MENSALISTA', 'DIARISTA')),
    base_salary NUMERIC(14, 2) NOT NULL DEFAULT 0 CHECK (base_salary >= 0),
    daily_rate NUMERIC(14, 2) NOT NULL DEFAULT 0 CHECK (daily_rate >= 0),
    days_worked INTEGER NOT NULL DEFAULT 0 CHECK (days_worked >= 0),
    absences INTEGER NOT NULL DEFAULT 0 CHECK (absences >= 0),
    overtime_hours NUMERIC(8, 2) NOT NULL DEFAULT 0 CHECK (overtime_hours >= 0),
    overtime_rate NUMERIC(14, 2) NOT NULL DEFAULT 0 CHECK (overtime_rate >= 0),
    cost_allowance NUMERIC(14, 2) NOT NULL DEFAULT 0 CHECK (cost_allowance >= 0),
    extras NUMERIC(14, 2) NOT NULL DEFAULT 0 CHECK (extras >= 0),
    loose_advance NUMERIC(14, 2) NOT NULL DEFAULT 0 CHECK (loose_advance >= 0),
    advance_deduction NUMERIC(14, 2) NOT NULL DEFAULT 0 CHECK (advance_deduction >= 0),
    gross_amount NUMERIC(14, 2) NOT NULL DEFAULT 0 CHECK (gross_amount >= 0),
    net_amount NUMERIC(14, 2) NOT NULL DEFAULT 0 CHECK (net_amount >= 0),
    payment_status VARCHAR(20) NOT NULL DEFAULT 'PENDENTE'
        CHECK (payment_status IN ('PENDENTE', 'PROCESSANDO', 'PAGO', 'FALHOU', 'CANCELADO')),
    payment_method VARCHAR(20) NOT NULL DEFAULT 'PIX'
        CHECK (payment_method IN ('PIX', 'DINHEIRO', 'TRANSFERENCIA')),
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_payroll_entries_employee UNIQUE (payroll_id, employee_id),
    CONSTRAINT chk_net_not_above_gross CHECK (net_amount <= gross_amount)
);

CREATE INDEX idx_payroll_entries_payroll ON payroll_entries(payroll_id);
CREATE INDEX idx_payroll_entries_employee ON payroll_entries(employee_id);
";

const ADVANCES_SQL: &str = r"
CREATE TABLE advances (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    employee_id UUID NOT NULL REFERENCES employees(id),
    total_amount NUMERIC(14, 2) NOT NULL CHECK (total_amount > 0),
    granted_on DATE NOT NULL,
    description TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_advances_employee ON advances(employee_id);
";

const INSTALLMENTS_SQL: &str = r"
CREATE TABLE installments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    advance_id UUID NOT NULL REFERENCES advances(id) ON DELETE CASCADE,
    number INTEGER NOT NULL CHECK (number > 0),
    amount NUMERIC(14, 2) NOT NULL CHECK (amount >= 0),
    entry_id UUID REFERENCES payroll_entries(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_installments_number UNIQUE (advance_id, number)
);

CREATE INDEX idx_installments_entry ON installments(entry_id) WHERE entry_id IS NOT NULL;
";

const BANK_ACCOUNTS_SQL: &str = r"
CREATE TABLE bank_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(100) NOT NULL,
    agency VARCHAR(10) NOT NULL,
    account_number VARCHAR(20) NOT NULL,
    agreement_number VARCHAR(20) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_bank_accounts_number UNIQUE (agency, account_number)
);
";

const PAYMENT_BATCHES_SQL: &str = r"
CREATE TABLE payment_batches (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    payroll_id UUID REFERENCES payrolls(id),
    bank_account_id UUID NOT NULL REFERENCES bank_accounts(id),
    requisicao BIGINT NOT NULL,
    estado_requisicao VARCHAR(30) NOT NULL,
    description TEXT,
    item_count INTEGER NOT NULL DEFAULT 0,
    total_amount NUMERIC(14, 2) NOT NULL DEFAULT 0,
    validated_amount NUMERIC(14, 2) NOT NULL DEFAULT 0,
    released_at TIMESTAMPTZ,
    cancelled_at TIMESTAMPTZ,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_payment_batches_requisicao UNIQUE (bank_account_id, requisicao)
);

CREATE INDEX idx_payment_batches_payroll ON payment_batches(payroll_id);
";

const PAYMENT_ITEMS_SQL: &str = r"
CREATE TABLE payment_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    batch_id UUID NOT NULL REFERENCES payment_batches(id) ON DELETE CASCADE,
    entry_id UUID REFERENCES payroll_entries(id) ON DELETE SET NULL,
    employee_id UUID REFERENCES employees(id),
    beneficiary_name VARCHAR(255) NOT NULL,
    pix_key_type VARCHAR(20) NOT NULL,
    pix_key VARCHAR(77) NOT NULL,
    amount NUMERIC(14, 2) NOT NULL CHECK (amount > 0),
    estado_pagamento VARCHAR(30) NOT NULL,
    bank_reference VARCHAR(100),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_payment_items_batch ON payment_items(batch_id);
CREATE INDEX idx_payment_items_entry ON payment_items(entry_id);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS payment_items CASCADE;
DROP TABLE IF EXISTS payment_batches CASCADE;
DROP TABLE IF EXISTS bank_accounts CASCADE;
DROP TABLE IF EXISTS installments CASCADE;
DROP TABLE IF EXISTS advances CASCADE;
DROP TABLE IF EXISTS payroll_entries CASCADE;
DROP TABLE IF EXISTS payrolls CASCADE;
DROP TABLE IF EXISTS employees CASCADE;
";
