//! Channel factories for the payment flow controller.

use super::controller::FlowCommand;
use super::machine::{FlowAlert, FlowSnapshot};
use tokio::sync::{mpsc, watch};

/// Default buffer size for flow channels.
///
/// User input arrives at typing speed, so this only has to absorb bursts.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for commands to the controller.
pub type FlowCommandSender = mpsc::Sender<FlowCommand>;
/// Receiver handle for commands to the controller.
pub type FlowCommandReceiver = mpsc::Receiver<FlowCommand>;

/// Sender handle for user-facing alerts.
pub type FlowAlertSender = mpsc::Sender<FlowAlert>;
/// Receiver handle for user-facing alerts.
pub type FlowAlertReceiver = mpsc::Receiver<FlowAlert>;

/// Sender handle for state snapshots.
pub type FlowSnapshotSender = watch::Sender<FlowSnapshot>;
/// Receiver handle for state snapshots.
pub type FlowSnapshotReceiver = watch::Receiver<FlowSnapshot>;

/// Create a new command channel.
///
/// Every [`PaymentFlowHandle`](super::PaymentFlowHandle) holds a clone of
/// the sender; the controller stops once all of them are dropped.
pub fn flow_command_channel() -> (FlowCommandSender, FlowCommandReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create a new alert channel.
pub fn flow_alert_channel() -> (FlowAlertSender, FlowAlertReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create a new snapshot channel seeded with `initial`.
pub fn flow_snapshot_channel(initial: FlowSnapshot) -> (FlowSnapshotSender, FlowSnapshotReceiver) {
    watch::channel(initial)
}
