/// Errors raised while publishing to the broker.
#[derive(thiserror::Error, Debug)]
pub enum PublishError {
    /// The client rejected the request
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// No broker session is currently established
    #[error("not connected to MQTT broker")]
    NotConnected,

    /// Payload could not be encoded
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}
