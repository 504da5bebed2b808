//! Human approval adapters

mod channel;

pub use channel::ChannelHumanApproval;
