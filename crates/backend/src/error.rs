/// Failure talking to the remote data service.
///
/// `Status` covers every non-success HTTP response; `Transport` is anything
/// that kept the request from completing at all.
#[derive(Debug)]
pub enum ServiceError {
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    Status(u16),
    Decode(String),
}

impl ServiceError {
    pub fn transport(message: impl Into<String>) -> Self {
        ServiceError::Transport {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ServiceError::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Transport { message, .. } => write!(f, "{message}"),
            ServiceError::Status(code) => write!(f, "HTTP {code}"),
            ServiceError::Decode(msg) => write!(f, "invalid response body: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Transport {
                source: Some(e), ..
            } => Some(e.as_ref() as _),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ServiceError;
    use std::error::Error as _;

    #[test]
    fn status_displays_code() {
        assert_eq!(ServiceError::Status(503).to_string(), "HTTP 503");
    }

    #[test]
    fn transport_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = ServiceError::with_source("request failed", io);
        assert_eq!(err.to_string(), "request failed");
        assert!(err.source().is_some());
        assert!(ServiceError::transport("x").source().is_none());
    }
}
