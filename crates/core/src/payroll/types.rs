//! Payroll domain types.
//!
//! Status and contract values travel as the upper-case Portuguese codes used by
//! the payroll screens (`RASCUNHO`, `MENSALISTA`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;

/// How an employee is paid.
///
/// Anything that is not explicitly `DIARISTA` is paid as a monthly employee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractType {
    /// Monthly salary; each biweekly payroll pays half of it.
    #[default]
    Mensalista,
    /// Paid per day worked.
    Diarista,
}

impl ContractType {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mensalista => "MENSALISTA",
            Self::Diarista => "DIARISTA",
        }
    }

    /// Parses a contract type, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "MENSALISTA" => Some(Self::Mensalista),
            "DIARISTA" => Some(Self::Diarista),
            _ => None,
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payroll (folha) lifecycle status.
///
/// Valid transitions:
/// - Rascunho → PendenteLiberacao (finalize)
/// - PendenteLiberacao → Rascunho (reopen)
/// - PendenteLiberacao → EmProcessamento (batch released to the bank)
/// - EmProcessamento → Fechada (every payment settled)
/// - Rascunho | PendenteLiberacao → Cancelada (cancel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayrollStatus {
    /// Being assembled; entries can be changed.
    Rascunho,
    /// Finalized, waiting for payment release.
    PendenteLiberacao,
    /// Payments released and being processed by the bank.
    EmProcessamento,
    /// Every payment settled.
    Fechada,
    /// Cancelled (absorbing).
    Cancelada,
}

impl PayrollStatus {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rascunho => "RASCUNHO",
            Self::PendenteLiberacao => "PENDENTE_LIBERACAO",
            Self::EmProcessamento => "EM_PROCESSAMENTO",
            Self::Fechada => "FECHADA",
            Self::Cancelada => "CANCELADA",
        }
    }

    /// Parses a status, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "RASCUNHO" => Some(Self::Rascunho),
            "PENDENTE_LIBERACAO" => Some(Self::PendenteLiberacao),
            "EM_PROCESSAMENTO" => Some(Self::EmProcessamento),
            "FECHADA" => Some(Self::Fechada),
            "CANCELADA" => Some(Self::Cancelada),
            _ => None,
        }
    }

    /// Returns true if entries of a payroll in this status can be changed.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Rascunho)
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Fechada | Self::Cancelada)
    }
}

impl fmt::Display for PayrollStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status of a single entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Not paid yet.
    Pendente,
    /// Sent to the bank, waiting for settlement.
    Processando,
    /// Paid.
    Pago,
    /// The bank rejected or returned the payment.
    Falhou,
    /// Payroll cancelled before payment.
    Cancelado,
}

impl PaymentStatus {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pendente => "PENDENTE",
            Self::Processando => "PROCESSANDO",
            Self::Pago => "PAGO",
            Self::Falhou => "FALHOU",
            Self::Cancelado => "CANCELADO",
        }
    }

    /// Parses a payment status, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PENDENTE" => Some(Self::Pendente),
            "PROCESSANDO" => Some(Self::Processando),
            "PAGO" => Some(Self::Pago),
            "FALHOU" => Some(Self::Falhou),
            "CANCELADO" => Some(Self::Cancelado),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an entry is paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// PIX transfer through a payment batch.
    Pix,
    /// Cash.
    Dinheiro,
    /// Bank transfer handled outside the batch flow.
    Transferencia,
}

impl PaymentMethod {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pix => "PIX",
            Self::Dinheiro => "DINHEIRO",
            Self::Transferencia => "TRANSFERENCIA",
        }
    }

    /// Parses a payment method, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PIX" => Some(Self::Pix),
            "DINHEIRO" => Some(Self::Dinheiro),
            "TRANSFERENCIA" => Some(Self::Transferencia),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
