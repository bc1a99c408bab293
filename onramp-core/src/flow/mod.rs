//! Mobile payment flow.
//!
//! [`PaymentFlow`] is the pure state machine; [`PaymentFlowController`]
//! drives it with debounce and fallback timers and creates orders through
//! an [`OrderGateway`].

pub mod channels;
pub mod controller;
pub mod gateway;
pub mod machine;
pub mod status;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, FlowAlertReceiver, FlowAlertSender, FlowCommandReceiver,
    FlowCommandSender, FlowSnapshotReceiver, FlowSnapshotSender, flow_alert_channel,
    flow_command_channel, flow_snapshot_channel,
};
pub use controller::{
    DEFAULT_DEBOUNCE, DEFAULT_FALLBACK_READY, FlowCommand, FlowConfig, FlowError,
    PaymentFlowController, PaymentFlowHandle,
};
pub use gateway::{GatewayError, OrderGateway};
pub use machine::{
    AmountChange, FORCE_FEATURE_PARAM, FlowAlert, FlowSnapshot, IgnoreReason, PaymentFlow,
    SessionId, Transition,
};
pub use status::PaymentStatus;
