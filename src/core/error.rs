//! Error types for the handler layer

pub type Result<T> = std::result::Result<T, HandlerError>;

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// IO error from a writer handler
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A wrapped handler's handle call failed
    #[error("delivery failed in {handler}: {message}")]
    Delivery { handler: String, message: String },

    /// A wrapped handler panicked while handling a record
    #[error("{handler} panicked while handling a record: {message}")]
    Panicked { handler: String, message: String },

    /// Invalid construction arguments, surfaced at construction time
    #[error("invalid configuration for {component}: {message}")]
    InvalidConfig { component: String, message: String },

    /// Handler was already closed
    #[error("handler already closed")]
    Closed,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl HandlerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        HandlerError::InvalidConfig {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a delivery failure error
    pub fn delivery(handler: impl Into<String>, message: impl Into<String>) -> Self {
        HandlerError::Delivery {
            handler: handler.into(),
            message: message.into(),
        }
    }

    /// Create a panic-capture error
    pub fn panicked(handler: impl Into<String>, message: impl Into<String>) -> Self {
        HandlerError::Panicked {
            handler: handler.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        HandlerError::Other(msg.into())
    }
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
