//! Banco do Brasil state codes for PIX batches and items.
//!
//! Batch state (`estadoRequisicao`) arrives as a number from 1 to 10; item
//! state (`estadoPagamentoIndividual`) arrives as text. Both are mapped to a
//! display (label, color, severity), the actions the UI may offer and how far
//! the payment has settled.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::error::PaymentError;

/// State code reported by the bank: numeric for batches, text for items.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum BankStatusCode {
    /// `estadoRequisicao` value.
    Numeric(u8),
    /// Upper-cased text state (`PAGO`, `REJEITADO`, ...).
    Text(String),
}

impl BankStatusCode {
    /// Parses a stored or received code. Digits become [`Self::Numeric`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        trimmed.parse::<u8>().map_or_else(
            |_| Self::Text(trimmed.to_uppercase()),
            Self::Numeric,
        )
    }

    /// Storage form.
    #[must_use]
    pub fn as_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BankStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u8> for BankStatusCode {
    fn from(value: u8) -> Self {
        Self::Numeric(value)
    }
}

impl<'de> Deserialize<'de> for BankStatusCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => u8::try_from(n)
                .map_or_else(|_| Self::Text(n.to_string()), Self::Numeric),
            Raw::Text(s) => Self::parse(&s),
        })
    }
}

/// Visual weight of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Neutral or in progress.
    Info,
    /// Settled successfully.
    Success,
    /// Needs attention.
    Warning,
    /// Failed.
    Error,
}

/// How far a payment has settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Settlement {
    /// Not terminal yet.
    Pending,
    /// Money left the account.
    Paid,
    /// Terminal without payment.
    Failed,
}

impl Settlement {
    /// True for paid or failed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Everything the UI needs to render a bank state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDisplay {
    /// The code being described.
    pub code: BankStatusCode,
    /// Human label.
    pub label: String,
    /// Tag color.
    pub color: &'static str,
    /// Severity.
    pub severity: Severity,
    /// Whether the batch may be released for payment.
    pub can_release: bool,
    /// Whether the batch or item may be cancelled.
    pub can_cancel: bool,
    /// Settlement classification.
    pub outcome: Settlement,
}

struct Row {
    label: &'static str,
    color: &'static str,
    severity: Severity,
    can_release: bool,
    can_cancel: bool,
    outcome: Settlement,
}

const fn row(
    label: &'static str,
    color: &'static str,
    severity: Severity,
    can_release: bool,
    can_cancel: bool,
    outcome: Settlement,
) -> Row {
    Row {
        label,
        color,
        severity,
        can_release,
        can_cancel,
        outcome,
    }
}

/// Highest numeric batch state.
pub const MAX_BATCH_STATE: u8 = 10;

/// Text states, in display order.
pub const ITEM_STATES: [&str; 13] = [
    "CONSISTENTE",
    "AGENDADO",
    "PENDENTE",
    "EM PROCESSAMENTO",
    "PAGO",
    "DEBITADO",
    "PROCESSADO",
    "INCONSISTENTE",
    "REJEITADO",
    "CANCELADO",
    "BLOQUEADO",
    "DEVOLVIDO",
    "VENCIDO",
];

fn numeric_row(code: u8) -> Option<Row> {
    use Settlement::{Failed, Paid, Pending};
    use Severity::{Error, Info, Success, Warning};

    let row = match code {
        1 => row("Consistente - aguardando liberação", "blue", Info, true, true, Pending),
        2 => row("Parcialmente inconsistente", "orange", Warning, false, true, Pending),
        3 => row("Totalmente inconsistente", "red", Error, false, true, Failed),
        4 => row("Pendente de autorização", "gold", Warning, true, true, Pending),
        5 => row("Em processamento pelo banco", "processing", Info, false, false, Pending),
        6 => row("Processado", "green", Success, false, false, Paid),
        7 => row("Rejeitado", "red", Error, false, false, Failed),
        8 => row("Em preparação - não liberado", "cyan", Info, false, true, Pending),
        9 => row("Liberado via API", "geekblue", Info, false, false, Pending),
        10 => row("Em preparação - liberado", "purple", Info, false, false, Pending),
        _ => return None,
    };
    Some(row)
}

fn text_row(code: &str) -> Option<Row> {
    use Settlement::{Failed, Paid, Pending};
    use Severity::{Error, Info, Success, Warning};

    let row = match code {
        "PAGO" => row("Pago", "green", Success, false, false, Paid),
        "DEBITADO" => row("Debitado", "green", Success, false, false, Paid),
        "PROCESSADO" => row("Processado", "green", Success, false, false, Paid),
        "REJEITADO" => row("Rejeitado", "red", Error, false, false, Failed),
        "CANCELADO" => row("Cancelado", "red", Error, false, false, Failed),
        "BLOQUEADO" => row("Bloqueado", "red", Error, false, false, Failed),
        "DEVOLVIDO" => row("Devolvido", "red", Error, false, false, Failed),
        "VENCIDO" => row("Vencido", "red", Error, false, false, Failed),
        "INCONSISTENTE" => row("Inconsistente", "red", Error, false, false, Failed),
        "AGENDADO" => row("Agendado", "blue", Info, false, true, Pending),
        "PENDENTE" => row("Pendente", "gold", Warning, false, true, Pending),
        "CONSISTENTE" => row("Consistente", "cyan", Info, false, true, Pending),
        "EM PROCESSAMENTO" => row("Em processamento", "processing", Info, false, false, Pending),
        _ => return None,
    };
    Some(row)
}

fn display(code: &BankStatusCode, row: Option<Row>) -> StatusDisplay {
    match row {
        Some(row) => StatusDisplay {
            code: code.clone(),
            label: row.label.to_string(),
            color: row.color,
            severity: row.severity,
            can_release: row.can_release,
            can_cancel: row.can_cancel,
            outcome: row.outcome,
        },
        None => StatusDisplay {
            code: code.clone(),
            label: format!("Estado {code}"),
            color: "default",
            severity: Severity::Info,
            can_release: false,
            can_cancel: false,
            outcome: Settlement::Pending,
        },
    }
}

/// Describes a batch state (`estadoRequisicao`).
///
/// Only states 1 and 4 allow release. Text codes are read with the item
/// table and never allow release.
#[must_use]
pub fn describe_batch_status(code: &BankStatusCode) -> StatusDisplay {
    let row = match code {
        BankStatusCode::Numeric(n) => numeric_row(*n),
        BankStatusCode::Text(s) => text_row(s).map(|row| Row {
            can_release: false,
            ..row
        }),
    };
    display(code, row)
}

/// Describes an item state (`estadoPagamentoIndividual`).
#[must_use]
pub fn describe_item_status(code: &BankStatusCode) -> StatusDisplay {
    let row = match code {
        BankStatusCode::Text(s) => text_row(s),
        BankStatusCode::Numeric(_) => None,
    };
    display(code, row)
}

/// Fails unless the batch may be released.
pub fn ensure_release_allowed(code: &BankStatusCode) -> Result<(), PaymentError> {
    if describe_batch_status(code).can_release {
        Ok(())
    } else {
        Err(PaymentError::ReleaseNotAllowed(code.clone()))
    }
}

/// Fails unless the batch may be cancelled.
pub fn ensure_cancel_allowed(code: &BankStatusCode) -> Result<(), PaymentError> {
    if describe_batch_status(code).can_cancel {
        Ok(())
    } else {
        Err(PaymentError::CancelNotAllowed(code.clone()))
    }
}

/// Settlement of a batch from the states of its items.
///
/// `Paid` when every item is paid, `Failed` when every item is terminal and
/// at least one failed, `Pending` otherwise (including an empty batch).
#[must_use]
pub fn batch_settlement<'a, I>(item_codes: I) -> Settlement
where
    I: IntoIterator<Item = &'a BankStatusCode>,
{
    let mut any_item = false;
    let mut any_failed = false;
    for code in item_codes {
        any_item = true;
        match describe_item_status(code).outcome {
            Settlement::Pending => return Settlement::Pending,
            Settlement::Failed => any_failed = true,
            Settlement::Paid => {}
        }
    }
    match (any_item, any_failed) {
        (false, _) => Settlement::Pending,
        (true, true) => Settlement::Failed,
        (true, false) => Settlement::Paid,
    }
}

/// Amounts of a batch derived from its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Number of transfers.
    pub item_count: u32,
    /// Sum of every transfer sent.
    pub total_amount: Decimal,
    /// Sum of transfers the bank did not reject.
    pub validated_amount: Decimal,
    /// Settlement of the whole batch.
    pub settlement: Settlement,
}

/// Sums a batch from `(amount, item state)` pairs.
#[must_use]
pub fn summarize_items(items: &[(Decimal, BankStatusCode)]) -> BatchSummary {
    let mut summary = BatchSummary {
        item_count: 0,
        total_amount: Decimal::ZERO,
        validated_amount: Decimal::ZERO,
        settlement: batch_settlement(items.iter().map(|(_, code)| code)),
    };
    for (amount, code) in items {
        summary.item_count += 1;
        summary.total_amount += *amount;
        if describe_item_status(code).outcome != Settlement::Failed {
            summary.validated_amount += *amount;
        }
    }
    summary
}

/// Every known state, for the status legend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTable {
    /// Batch states 1 to 10.
    pub batch_states: Vec<StatusDisplay>,
    /// Item text states.
    pub item_states: Vec<StatusDisplay>,
}

/// Builds the full status legend.
#[must_use]
pub fn status_table() -> StatusTable {
    StatusTable {
        batch_states: (1..=MAX_BATCH_STATE)
            .map(|n| describe_batch_status(&BankStatusCode::Numeric(n)))
            .collect(),
        item_states: ITEM_STATES
            .iter()
            .map(|s| describe_item_status(&BankStatusCode::Text((*s).to_string())))
            .collect(),
    }
}
