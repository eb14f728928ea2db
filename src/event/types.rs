//! Core financial event types.
//!
//! A `FinancialEvent` is a read-oriented projection over the three underlying
//! obligation kinds (receivables, payables, compensations), unified under a
//! single status state machine.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ============================================================================
// Obligation Kind
// ============================================================================

/// Kind of the underlying obligation an event projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationKind {
    /// An expected incoming payment tied to a due date.
    Receivable,
    /// An expected outgoing payment tied to a due date.
    Payable,
    /// An offsetting entry, neither pure revenue nor pure expense.
    Compensation,
}

impl ObligationKind {
    /// Whether money flows out when this obligation settles.
    pub fn is_outgoing(&self) -> bool {
        matches!(self, ObligationKind::Payable)
    }

    /// Stable name used in cache keys and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObligationKind::Receivable => "receivable",
            ObligationKind::Payable => "payable",
            ObligationKind::Compensation => "compensation",
        }
    }
}

impl fmt::Display for ObligationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Event Status
// ============================================================================

/// Lifecycle status of a financial event.
///
/// One state machine for all obligation kinds; the kind-specific vocabulary
/// of the source records lives only in the label mapping below.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Not yet settled, due date not necessarily passed.
    #[default]
    Pending,
    /// Money moved; `actual_date` records when.
    Settled,
    /// Past due and not settled. Derived on read, may be stale in between.
    Overdue,
    /// Terminal: no further transition is valid.
    Cancelled,
    /// Matched against actual bank activity.
    Reconciled,
}

impl EventStatus {
    /// Whether this status represents settled money (`Settled` or
    /// `Reconciled`). These are the states that require an `actual_date`.
    pub fn is_settled_state(&self) -> bool {
        matches!(self, EventStatus::Settled | EventStatus::Reconciled)
    }

    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Cancelled)
    }

    /// Stable name used in cache keys and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Settled => "settled",
            EventStatus::Overdue => "overdue",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Reconciled => "reconciled",
        }
    }

    /// The label the source records use for this status, per obligation kind.
    ///
    /// Receivables and payables use different vocabulary for the same
    /// semantic states (`Previsto`/`Recebido` vs `Pendente`/`Pago`).
    pub fn source_label(&self, kind: ObligationKind) -> &'static str {
        match (self, kind) {
            (EventStatus::Pending, ObligationKind::Receivable) => "Previsto",
            (EventStatus::Pending, _) => "Pendente",
            (EventStatus::Settled, ObligationKind::Receivable) => "Recebido",
            (EventStatus::Settled, _) => "Pago",
            (EventStatus::Overdue, _) => "Atrasado",
            (EventStatus::Cancelled, _) => "Cancelado",
            (EventStatus::Reconciled, _) => "Conciliado",
        }
    }

    /// Parse a source record label back into a status.
    pub fn from_source_label(label: &str) -> Option<EventStatus> {
        match label {
            "Previsto" | "Pendente" => Some(EventStatus::Pending),
            "Recebido" | "Pago" => Some(EventStatus::Settled),
            "Atrasado" => Some(EventStatus::Overdue),
            "Cancelado" => Some(EventStatus::Cancelled),
            "Conciliado" => Some(EventStatus::Reconciled),
            _ => None,
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Financial Event
// ============================================================================

/// A dated financial obligation projected for calendar and dashboard views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialEvent {
    /// Opaque identifier, unique within `(kind, id)`.
    pub id: String,
    /// Underlying obligation kind.
    pub kind: ObligationKind,
    /// Owning business unit; partition key for all queries.
    pub unit_id: String,
    /// Associated bank account, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Counterparty (customer or supplier), if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_id: Option<String>,
    /// Obligation amount. Always positive; sign is implied by `kind`.
    pub amount: Decimal,
    /// Date the obligation is due or expected.
    pub expected_date: NaiveDate,
    /// Date the obligation was actually settled. Present iff the status is
    /// a settled state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_date: Option<NaiveDate>,
    /// Lifecycle status.
    pub status: EventStatus,
    /// Descriptive category, non-authoritative.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Free-form notes, non-authoritative.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,
    /// Derived: past due and not in a settled/cancelled state. Stamped by
    /// the store on every read.
    #[serde(default)]
    pub is_overdue: bool,
    /// Derived: signed days until the due date; negative means overdue.
    /// Stamped by the store on every read.
    #[serde(default)]
    pub days_until_due: i64,
}

impl FinancialEvent {
    /// Create a new pending event with a generated id.
    pub fn new(
        kind: ObligationKind,
        unit_id: impl Into<String>,
        amount: Decimal,
        expected_date: NaiveDate,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            unit_id: unit_id.into(),
            account_id: None,
            party_id: None,
            amount,
            expected_date,
            actual_date: None,
            status: EventStatus::Pending,
            category: None,
            observations: None,
            is_overdue: false,
            days_until_due: 0,
        }
    }

    /// Create an event with a specific id.
    pub fn with_id(
        id: impl Into<String>,
        kind: ObligationKind,
        unit_id: impl Into<String>,
        amount: Decimal,
        expected_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            ..Self::new(kind, unit_id, amount, expected_date)
        }
    }

    /// Set the associated bank account.
    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Set the counterparty.
    pub fn with_party(mut self, party_id: impl Into<String>) -> Self {
        self.party_id = Some(party_id.into());
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the observations.
    pub fn with_observations(mut self, observations: impl Into<String>) -> Self {
        self.observations = Some(observations.into());
        self
    }

    /// Set the status without touching the settlement date. The caller is
    /// responsible for the settled-iff-dated invariant; `validate` checks it.
    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    /// Mark the event settled on the given date.
    pub fn settled_on(mut self, date: NaiveDate) -> Self {
        self.status = EventStatus::Settled;
        self.actual_date = Some(date);
        self
    }

    /// The calendar date this event belongs to: the settlement date when
    /// money has moved, the due date otherwise.
    pub fn calendar_date(&self) -> NaiveDate {
        self.actual_date.unwrap_or(self.expected_date)
    }

    /// Amount signed by flow direction: negative for payables.
    pub fn signed_amount(&self) -> Decimal {
        if self.kind.is_outgoing() {
            -self.amount
        } else {
            self.amount
        }
    }

    /// Whether the event is overdue as of `today`.
    pub fn is_overdue_at(&self, today: NaiveDate) -> bool {
        self.expected_date < today && !self.status.is_settled_state() && !self.status.is_terminal()
    }

    /// Signed days from `today` until the due date; negative means overdue.
    pub fn days_until_due_at(&self, today: NaiveDate) -> i64 {
        self.expected_date.signed_duration_since(today).num_days()
    }

    /// Stamp the derived read-only fields as of `today`.
    pub fn enrich(&mut self, today: NaiveDate) {
        self.is_overdue = self.is_overdue_at(today);
        self.days_until_due = self.days_until_due_at(today);
    }

    /// Check the event's own invariants: positive amount, and a settlement
    /// date present exactly when the status is a settled state.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.amount <= Decimal::ZERO {
            return Err(ValidationError::InvalidAmount(self.amount));
        }
        match (self.status.is_settled_state(), self.actual_date) {
            (true, None) => Err(ValidationError::MissingSettlementDate(self.id.clone())),
            (false, Some(date)) => Err(ValidationError::UnexpectedSettlementDate(date)),
            _ => Ok(()),
        }
    }
}
