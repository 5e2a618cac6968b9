use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use slog::{o, Drain, Logger};
use slog_async::Async;
use slog_term::{FullFormat, TermDecorator};
use std::sync::Arc;
use std::time::Instant;

/// Configuration for setting up the logger
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub async_buffer_size: usize,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            async_buffer_size: 1024,
            use_color: true,
        }
    }
}

/// Sets up a logger with configurable options
pub fn setup_logger(config: LoggerConfig) -> Logger {
    let decorator = {
        let builder = TermDecorator::new();
        let builder = if config.use_color {
            builder.force_color()
        } else {
            builder
        };
        builder.build()
    };

    let drain = FullFormat::new(decorator).build().fuse();

    let drain = Async::new(drain)
        .chan_size(config.async_buffer_size)
        .build()
        .fuse();

    Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
}

/// Logger that drops every record; used by tests and when the access log is disabled.
pub fn discard_logger() -> Logger {
    Logger::root(slog::Discard, o!())
}

/// Child logger tagged with the component emitting audit records.
pub fn component_logger(root: &Logger, component: &'static str) -> Logger {
    root.new(o!("component" => component))
}

/// State struct for logging middleware
#[derive(Clone)]
pub struct LoggingState {
    logger: Logger,
}

impl LoggingState {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger: component_logger(&logger, "access"),
        }
    }
}

/// Access log middleware
pub async fn logging_middleware(
    State(state): State<Arc<LoggingState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;
    let status = response.status().as_u16();
    let duration_ms = start_time.elapsed().as_millis() as u64;
    let request_id = crate::tracing::current_request_id()
        .map(|rid| rid.0)
        .unwrap_or_default();

    slog::info!(
        &state.logger,
        "HTTP request handled";
        "method" => method,
        "path" => path,
        "status" => status,
        "duration_ms" => duration_ms,
        "request_id" => request_id,
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Drain collecting the `status` key of every record.
    struct CaptureDrain(Arc<Mutex<Vec<String>>>);

    impl Drain for CaptureDrain {
        type Ok = ();
        type Err = slog::Never;

        fn log(
            &self,
            record: &slog::Record<'_>,
            values: &slog::OwnedKVList,
        ) -> Result<Self::Ok, Self::Err> {
            struct Collect(Vec<String>);
            impl slog::Serializer for Collect {
                fn emit_arguments(
                    &mut self,
                    key: slog::Key,
                    val: &std::fmt::Arguments<'_>,
                ) -> slog::Result {
                    self.0.push(format!("{}={}", key, val));
                    Ok(())
                }
            }
            let mut collect = Collect(Vec::new());
            let _ = slog::KV::serialize(&record.kv(), record, &mut collect);
            let _ = slog::KV::serialize(values, record, &mut collect);
            self.0
                .lock()
                .unwrap()
                .push(collect.0.join(" "));
            Ok(())
        }
    }

    #[tokio::test]
    async fn access_log_records_status_and_path() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let logger = Logger::root(CaptureDrain(lines.clone()), o!());
        let state = Arc::new(LoggingState::new(logger));

        let app = Router::new()
            .route("/health", get(|| async { "OK" }))
            .layer(axum::middleware::from_fn_with_state(
                state,
                logging_middleware,
            ));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"OK");

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("status=200"));
        assert!(lines[0].contains("path=/health"));
        assert!(lines[0].contains("component=access"));
    }
}
