//! Outbound messages to the display device.

mod error;
mod messages;
/// MQTT transport for status, image-ready and inbound control messages
pub mod mqtt;

pub use error::PublishError;
pub use messages::{ImageReadyMessage, StatusMessage, image_base_url};
pub use mqtt::{
    CommandWorker, Inbound, InboundRouter, MqttConnection, MqttPublisher, MqttSettings, connect,
};
