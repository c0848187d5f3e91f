/// One frame of the public SSE mirror.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerEvent {
    /// SSE `event:` field; `None` falls back to the default `message` type.
    pub event: Option<String>,
    /// Serialised JSON payload.
    pub data: String,
}

impl ServerEvent {
    /// Build an event from an already serialised data field.
    pub fn new(event: impl Into<String>, data: String) -> Self {
        Self {
            event: Some(event.into()),
            data,
        }
    }

    /// Plain-text notice for projector screens, outside the game protocol.
    pub fn info(message: &str) -> Self {
        Self::new("info", message.to_string())
    }
}
