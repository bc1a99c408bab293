//! Pure payment-flow state machine.
//!
//! [`PaymentFlow`] owns the state of one checkout screen: the amount, the
//! current session, the payment link and the status. It performs no I/O and
//! holds no timers; every input is a method call that returns what happened,
//! so the controller (or a test) decides when inputs arrive.
//!
//! Each nonzero amount change opens a new [`SessionId`]. Order results and
//! fallback timers carry the session they were started for and are ignored
//! once a newer session exists.

use onramp_sdk::objects::{
    BuyerProfile, PurchaseEstimate, PurchaseIntent, REFERENCE_ETH_USD_RATE, RelayResponse,
    SurfaceEvent, SurfaceMessage, estimate_purchase,
};
use rust_decimal::Decimal;
use serde::Serialize;

use super::status::PaymentStatus;

/// Query parameter appended to the payment link before display.
pub const FORCE_FEATURE_PARAM: &str = "forceFeature=true";

pub const ORDER_FAILED_MESSAGE: &str = "Failed to create payment order. Please try again.";
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load payment page.";
pub const COMMIT_FAILED_MESSAGE: &str = "Payment failed. Please try again.";
pub const POLLING_FAILED_MESSAGE: &str = "Payment processing failed.";

/// Identifies one order-creation attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionId(u64);

impl SessionId {
    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// User-facing notification raised by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowAlert {
    PaymentInitiated,
    PaymentCancelled,
    PaymentCompleted,
    PaymentFailed(String),
}

impl FlowAlert {
    pub fn title(&self) -> &'static str {
        match self {
            Self::PaymentInitiated => "Payment initiated",
            Self::PaymentCancelled => "Payment cancelled",
            Self::PaymentCompleted => "Purchase complete",
            Self::PaymentFailed(_) => "Payment failed",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::PaymentInitiated => "Your payment is being processed.",
            Self::PaymentCancelled => "You cancelled the payment. You can try again at any time.",
            Self::PaymentCompleted => "Your ETH is on its way to your wallet.",
            Self::PaymentFailed(message) => message,
        }
    }
}

/// Result of an amount change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountChange {
    /// A new session started; an order should be created once the amount
    /// has settled.
    Started(SessionId),
    /// The amount is zero; the flow is back to idle.
    Reset,
    /// Same nonzero amount as before.
    Unchanged,
}

/// Why an input was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The input belongs to a session that has been superseded.
    StaleSession,
    /// The message was not a valid payment page message.
    Malformed,
    /// The event name is not one the flow knows.
    UnknownEvent(String),
}

/// Result of feeding an input to the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// State was updated. `from` and `to` may be equal (e.g. a cancel while
    /// ready).
    Applied {
        from: PaymentStatus,
        to: PaymentStatus,
        alert: Option<FlowAlert>,
    },
    /// The input was valid but changes nothing.
    Unchanged,
    /// The input was dropped.
    Ignored(IgnoreReason),
}

impl Transition {
    pub fn alert(&self) -> Option<&FlowAlert> {
        match self {
            Self::Applied { alert, .. } => alert.as_ref(),
            _ => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Observable state of the flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlowSnapshot {
    pub status: PaymentStatus,
    pub session: SessionId,
    pub amount: Decimal,
    pub payment_link: Option<String>,
    /// Link the embedded view should load.
    pub display_url: Option<String>,
    pub error_message: Option<String>,
    pub estimate: Option<PurchaseEstimate>,
}

/// The payment flow of one checkout screen.
#[derive(Debug, Clone)]
pub struct PaymentFlow {
    profile: BuyerProfile,
    eth_usd_rate: Decimal,
    status: PaymentStatus,
    session: SessionId,
    amount: Decimal,
    payment_link: Option<String>,
    error_message: Option<String>,
}

impl Default for PaymentFlow {
    fn default() -> Self {
        Self::new(BuyerProfile::sandbox(), REFERENCE_ETH_USD_RATE)
    }
}

impl PaymentFlow {
    pub fn new(profile: BuyerProfile, eth_usd_rate: Decimal) -> Self {
        Self {
            profile,
            eth_usd_rate,
            status: PaymentStatus::Idle,
            session: SessionId::default(),
            amount: Decimal::ZERO,
            payment_link: None,
            error_message: None,
        }
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn payment_link(&self) -> Option<&str> {
        self.payment_link.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_current(&self, session: SessionId) -> bool {
        self.session == session
    }

    /// The payment link with the force-feature parameter appended.
    ///
    /// The parameter is appended with `&` unconditionally; the hosted page
    /// always issues links that already carry a query string.
    pub fn display_url(&self) -> Option<String> {
        self.payment_link
            .as_ref()
            .map(|link| format!("{link}&{FORCE_FEATURE_PARAM}"))
    }

    pub fn estimate(&self) -> Option<PurchaseEstimate> {
        estimate_purchase(self.amount, self.eth_usd_rate)
    }

    /// The order to create for the current amount, if any.
    pub fn intent(&self) -> Option<PurchaseIntent> {
        (self.amount > Decimal::ZERO).then(|| PurchaseIntent::for_amount(self.amount, &self.profile))
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            status: self.status,
            session: self.session,
            amount: self.amount,
            payment_link: self.payment_link.clone(),
            display_url: self.display_url(),
            error_message: self.error_message.clone(),
            estimate: self.estimate(),
        }
    }

    /// Set the fiat amount.
    ///
    /// Zero (and anything non-positive) resets the flow to idle. A new
    /// nonzero amount clears any previous link or error and moves to
    /// `creating-order` under a fresh session.
    pub fn set_amount(&mut self, amount: Decimal) -> AmountChange {
        if amount <= Decimal::ZERO {
            // Bump the session so in-flight results of the old amount are dropped.
            self.session = self.session.next();
            self.amount = Decimal::ZERO;
            self.status = PaymentStatus::Idle;
            self.payment_link = None;
            self.error_message = None;
            return AmountChange::Reset;
        }

        if amount == self.amount && self.status != PaymentStatus::Idle {
            return AmountChange::Unchanged;
        }

        self.session = self.session.next();
        self.amount = amount;
        self.status = PaymentStatus::CreatingOrder;
        self.payment_link = None;
        self.error_message = None;
        AmountChange::Started(self.session)
    }

    /// The relay answered for `session`.
    pub fn order_created(&mut self, session: SessionId, response: &RelayResponse) -> Transition {
        if !self.is_current(session) {
            return Transition::Ignored(IgnoreReason::StaleSession);
        }
        match response.payment_link_url() {
            Some(url) => {
                self.payment_link = Some(url.to_string());
                self.move_to(PaymentStatus::LoadingPayment, None)
            }
            None => self.fail(ORDER_FAILED_MESSAGE.to_string(), None),
        }
    }

    /// The relay call for `session` failed.
    pub fn order_failed(&mut self, session: SessionId) -> Transition {
        if !self.is_current(session) {
            return Transition::Ignored(IgnoreReason::StaleSession);
        }
        self.fail(ORDER_FAILED_MESSAGE.to_string(), None)
    }

    /// The page did not report a load outcome in time for `session`.
    pub fn fallback_elapsed(&mut self, session: SessionId) -> Transition {
        if !self.is_current(session) {
            return Transition::Ignored(IgnoreReason::StaleSession);
        }
        if self.status != PaymentStatus::LoadingPayment {
            return Transition::Unchanged;
        }
        self.move_to(PaymentStatus::Ready, None)
    }

    /// Handle a raw message posted by the embedded payment page.
    pub fn handle_message(&mut self, raw: &str) -> Transition {
        match SurfaceMessage::parse(raw) {
            Ok(message) => self.apply_message(&message),
            Err(_) => Transition::Ignored(IgnoreReason::Malformed),
        }
    }

    pub fn apply_message(&mut self, message: &SurfaceMessage) -> Transition {
        let error_text = message
            .data
            .as_ref()
            .and_then(|d| d.error_text())
            .map(str::to_string);
        self.apply_event(&message.event(), error_text)
    }

    /// Apply a payment page event. Events are accepted from any status.
    pub fn apply_event(&mut self, event: &SurfaceEvent, error_text: Option<String>) -> Transition {
        match event {
            SurfaceEvent::LoadPending => Transition::Unchanged,
            SurfaceEvent::LoadSuccess => self.move_to(PaymentStatus::Ready, None),
            SurfaceEvent::LoadError => {
                self.fail(error_text.unwrap_or_else(|| LOAD_FAILED_MESSAGE.to_string()), None)
            }
            SurfaceEvent::CommitSuccess => {
                self.move_to(PaymentStatus::Processing, Some(FlowAlert::PaymentInitiated))
            }
            SurfaceEvent::CommitError => {
                let message = error_text.unwrap_or_else(|| COMMIT_FAILED_MESSAGE.to_string());
                self.fail(message.clone(), Some(FlowAlert::PaymentFailed(message)))
            }
            SurfaceEvent::Cancel => {
                self.move_to(PaymentStatus::Ready, Some(FlowAlert::PaymentCancelled))
            }
            SurfaceEvent::PollingStart => self.move_to(PaymentStatus::Processing, None),
            SurfaceEvent::PollingSuccess => {
                if self.status == PaymentStatus::Success {
                    return Transition::Unchanged;
                }
                self.move_to(PaymentStatus::Success, Some(FlowAlert::PaymentCompleted))
            }
            SurfaceEvent::PollingError => {
                let message = error_text.unwrap_or_else(|| POLLING_FAILED_MESSAGE.to_string());
                self.fail(message.clone(), Some(FlowAlert::PaymentFailed(message)))
            }
            SurfaceEvent::Unknown(name) => Transition::Ignored(IgnoreReason::UnknownEvent(name.clone())),
        }
    }

    fn move_to(&mut self, to: PaymentStatus, alert: Option<FlowAlert>) -> Transition {
        let from = self.status;
        self.status = to;
        self.error_message = None;
        Transition::Applied { from, to, alert }
    }

    fn fail(&mut self, message: String, alert: Option<FlowAlert>) -> Transition {
        let from = self.status;
        self.status = PaymentStatus::Error;
        self.error_message = Some(message);
        Transition::Applied {
            from,
            to: PaymentStatus::Error,
            alert,
        }
    }
}
