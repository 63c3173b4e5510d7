use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialises structured logging.
/// Emits JSON lines to stdout; the level is controlled by `RUST_LOG`
/// (default `info`). `log` records from middleware are bridged in as well.
pub fn init_telemetry() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(formatting_layer)
        .init();
}

/// Correlates every log line emitted while serving one operation
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub operation: &'static str,
}

impl RequestContext {
    pub fn new(operation: &'static str) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            operation,
        }
    }

    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "request",
            request_id = %self.request_id,
            operation = self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_context_ids_are_unique() {
        let first = RequestContext::new("user_login");
        let second = RequestContext::new("user_login");

        assert_eq!(first.operation, "user_login");
        assert_ne!(first.request_id, second.request_id);
    }
}
