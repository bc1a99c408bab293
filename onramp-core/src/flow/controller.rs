//! PaymentFlowController.
//!
//! The PaymentFlowController is responsible for:
//! - Receiving amount changes and payment page messages from
//!   [`PaymentFlowHandle`]s
//! - Debouncing amount changes before creating an order
//! - Creating orders through an [`OrderGateway`] and feeding the result back
//!   into the [`PaymentFlow`]
//! - Moving a page that never reports its load outcome to `ready` after a
//!   fallback window
//! - Publishing every state change as a [`FlowSnapshot`] and raising
//!   [`FlowAlert`]s
//!
//! All state lives in one task. Timers and order calls run as separate
//! tasks that report back over an internal channel tagged with the session
//! they were started for, so results of superseded sessions are dropped.

use super::channels::{
    FlowAlertReceiver, FlowAlertSender, FlowCommandReceiver, FlowCommandSender,
    FlowSnapshotReceiver, FlowSnapshotSender, flow_alert_channel, flow_command_channel,
    flow_snapshot_channel,
};
use super::gateway::{GatewayError, OrderGateway};
use super::machine::{
    AmountChange, FlowAlert, FlowSnapshot, IgnoreReason, PaymentFlow, SessionId, Transition,
};
use super::status::PaymentStatus;
use onramp_sdk::objects::{
    BuyerProfile, REFERENCE_ETH_USD_RATE, RelayResponse, parse_fiat_amount,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Quiet period after the last amount change before an order is created.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

/// How long the payment page may stay in `loading-payment` without
/// reporting before it is assumed ready.
pub const DEFAULT_FALLBACK_READY: Duration = Duration::from_secs(5);

/// Configuration for the PaymentFlowController.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub debounce: Duration,
    pub fallback_ready: Duration,
    /// Buyer details sent with every order.
    pub profile: BuyerProfile,
    /// USD per ETH used for the on-screen estimate.
    pub eth_usd_rate: Decimal,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            fallback_ready: DEFAULT_FALLBACK_READY,
            profile: BuyerProfile::sandbox(),
            eth_usd_rate: REFERENCE_ETH_USD_RATE,
        }
    }
}

/// Input accepted by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowCommand {
    SetAmount(Decimal),
    /// Raw message posted by the embedded payment page.
    SurfaceMessage(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("payment flow controller has stopped")]
    Closed,
}

/// Work finished by a timer or an order call.
enum Completion {
    DebounceElapsed(SessionId),
    OrderSettled {
        session: SessionId,
        result: Result<RelayResponse, GatewayError>,
    },
    FallbackElapsed(SessionId),
}

/// Cheap, cloneable handle to a running controller.
#[derive(Debug, Clone)]
pub struct PaymentFlowHandle {
    commands: FlowCommandSender,
    snapshots: FlowSnapshotReceiver,
}

impl PaymentFlowHandle {
    pub async fn set_amount(&self, amount: Decimal) -> Result<(), FlowError> {
        self.send(FlowCommand::SetAmount(amount)).await
    }

    /// Set the amount from the text of the amount field. Empty or invalid
    /// text reads as zero.
    pub async fn set_amount_text(&self, text: &str) -> Result<(), FlowError> {
        self.set_amount(parse_fiat_amount(text)).await
    }

    /// Deliver a message posted by the embedded payment page.
    pub async fn deliver_message(&self, raw: impl Into<String>) -> Result<(), FlowError> {
        self.send(FlowCommand::SurfaceMessage(raw.into())).await
    }

    /// The most recently published state.
    pub fn snapshot(&self) -> FlowSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that is notified on every state change.
    pub fn subscribe(&self) -> FlowSnapshotReceiver {
        self.snapshots.clone()
    }

    async fn send(&self, command: FlowCommand) -> Result<(), FlowError> {
        self.commands.send(command).await.map_err(|_| FlowError::Closed)
    }
}

/// Drives a [`PaymentFlow`] from user input, page messages and timers.
///
/// Create it with [`new()`](PaymentFlowController::new), spawn
/// [`run()`](PaymentFlowController::run), and talk to it through the
/// returned [`PaymentFlowHandle`].
pub struct PaymentFlowController {
    flow: PaymentFlow,
    config: FlowConfig,
    gateway: Arc<dyn OrderGateway>,
    command_rx: FlowCommandReceiver,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    snapshot_tx: FlowSnapshotSender,
    alert_tx: FlowAlertSender,
    debounce_task: Option<JoinHandle<()>>,
    fallback_task: Option<JoinHandle<()>>,
}

impl PaymentFlowController {
    /// Create a new PaymentFlowController.
    ///
    /// # Arguments
    ///
    /// * `gateway` - Creates orders for settled amounts
    /// * `config` - Timing, buyer profile and estimate rate
    ///
    /// # Returns
    ///
    /// The controller, a handle to drive it, and the receiver for alerts.
    pub fn new(
        gateway: Arc<dyn OrderGateway>,
        config: FlowConfig,
    ) -> (Self, PaymentFlowHandle, FlowAlertReceiver) {
        let flow = PaymentFlow::new(config.profile.clone(), config.eth_usd_rate);
        let (command_tx, command_rx) = flow_command_channel();
        let (alert_tx, alert_rx) = flow_alert_channel();
        let (snapshot_tx, snapshot_rx) = flow_snapshot_channel(flow.snapshot());
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let controller = Self {
            flow,
            config,
            gateway,
            command_rx,
            completion_tx,
            completion_rx,
            snapshot_tx,
            alert_tx,
            debounce_task: None,
            fallback_task: None,
        };
        let handle = PaymentFlowHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        };
        (controller, handle, alert_rx)
    }

    /// Run until shutdown is signaled or every handle is dropped.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("PaymentFlowController started");

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("PaymentFlowController received shutdown signal");
                        break;
                    }
                }

                Some(completion) = self.completion_rx.recv() => {
                    self.on_completion(completion);
                }

                command = self.command_rx.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => {
                        info!("All payment flow handles dropped");
                        break;
                    }
                },
            }
        }

        self.cancel_debounce();
        self.cancel_fallback();
        info!("PaymentFlowController shutdown complete");
    }

    fn on_command(&mut self, command: FlowCommand) {
        match command {
            FlowCommand::SetAmount(amount) => match self.flow.set_amount(amount) {
                AmountChange::Started(session) => {
                    debug!(%session, %amount, "Amount changed, waiting for input to settle");
                    self.cancel_fallback();
                    self.schedule_debounce(session);
                }
                AmountChange::Reset => {
                    debug!("Amount cleared, flow reset");
                    self.cancel_debounce();
                    self.cancel_fallback();
                }
                AmountChange::Unchanged => {}
            },
            FlowCommand::SurfaceMessage(raw) => {
                let transition = self.flow.handle_message(&raw);
                self.on_transition("payment page", transition);
            }
        }
        self.publish();
    }

    fn on_completion(&mut self, completion: Completion) {
        match completion {
            Completion::DebounceElapsed(session) => {
                self.debounce_task = None;
                self.start_order(session);
            }
            Completion::OrderSettled { session, result } => {
                let transition = match result {
                    Ok(response) => self.flow.order_created(session, &response),
                    Err(e) => {
                        warn!(%session, error = %e, "Failed to create payment order");
                        self.flow.order_failed(session)
                    }
                };
                if matches!(
                    transition,
                    Transition::Applied {
                        to: PaymentStatus::LoadingPayment,
                        ..
                    }
                ) {
                    self.schedule_fallback(session);
                }
                self.on_transition("order", transition);
            }
            Completion::FallbackElapsed(session) => {
                self.fallback_task = None;
                let transition = self.flow.fallback_elapsed(session);
                self.on_transition("fallback", transition);
            }
        }
        self.publish();
    }

    fn on_transition(&mut self, source: &'static str, transition: Transition) {
        match transition {
            Transition::Applied { from, to, alert } => {
                info!(source, %from, %to, "Payment status changed");
                if to != PaymentStatus::LoadingPayment {
                    self.cancel_fallback();
                }
                if let Some(alert) = alert {
                    self.raise(alert);
                }
            }
            Transition::Unchanged => {}
            Transition::Ignored(IgnoreReason::StaleSession) => {
                debug!(source, "Dropped result of a superseded session");
            }
            Transition::Ignored(IgnoreReason::Malformed) => {
                warn!(source, "Ignoring malformed payment page message");
            }
            Transition::Ignored(IgnoreReason::UnknownEvent(name)) => {
                debug!(source, event = %name, "Ignoring unknown payment page event");
            }
        }
    }

    fn start_order(&self, session: SessionId) {
        if !self.flow.is_current(session) {
            return;
        }
        let Some(intent) = self.flow.intent() else {
            return;
        };
        info!(%session, amount = %intent.payment_amount, "Creating payment order");

        // Not tracked: a superseded call is left to finish and its result dropped.
        let gateway = Arc::clone(&self.gateway);
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = gateway.create_order(intent).await;
            let _ = completion_tx.send(Completion::OrderSettled { session, result });
        });
    }

    fn schedule_debounce(&mut self, session: SessionId) {
        self.cancel_debounce();
        self.debounce_task = Some(self.spawn_timer(
            self.config.debounce,
            Completion::DebounceElapsed(session),
        ));
    }

    fn schedule_fallback(&mut self, session: SessionId) {
        self.cancel_fallback();
        self.fallback_task = Some(self.spawn_timer(
            self.config.fallback_ready,
            Completion::FallbackElapsed(session),
        ));
    }

    fn spawn_timer(&self, delay: Duration, completion: Completion) -> JoinHandle<()> {
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = completion_tx.send(completion);
        })
    }

    fn cancel_debounce(&mut self) {
        if let Some(task) = self.debounce_task.take() {
            task.abort();
        }
    }

    fn cancel_fallback(&mut self) {
        if let Some(task) = self.fallback_task.take() {
            task.abort();
        }
    }

    fn raise(&self, alert: FlowAlert) {
        match self.alert_tx.try_send(alert) {
            Ok(()) => {}
            Err(TrySendError::Full(alert)) => {
                warn!(title = alert.title(), "Alert channel full, dropping alert");
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }

    fn publish(&self) {
        let next = self.flow.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}
