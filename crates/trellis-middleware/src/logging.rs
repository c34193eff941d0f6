//! Access log middleware
//!
//! [`RequestLogger`] brackets the rest of the chain: one event when the
//! request enters, one when the innermost layer has unwound.

use async_trait::async_trait;
use http::{HeaderMap, Method, StatusCode, Uri};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{warn, Level};
use trellis_core::{Context, Middleware, Next, Result};

const REDACTED: &str = "[REDACTED]";

/// Emit an event at a level chosen at runtime
macro_rules! emit {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            Level::TRACE => tracing::trace!($($arg)+),
            Level::DEBUG => tracing::debug!($($arg)+),
            Level::INFO => tracing::info!($($arg)+),
            Level::WARN => tracing::warn!($($arg)+),
            _ => tracing::error!($($arg)+),
        }
    };
}

/// Settings for [`RequestLogger`]
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level of the entry and completion events
    pub log_level: Level,
    /// Attach request headers to the entry event
    pub log_headers: bool,
    /// Header names whose values never reach the log, compared case-insensitively
    pub sensitive_headers: Vec<String>,
    /// Emit the completion event for successful requests
    pub log_response: bool,
    /// Successful requests at or above this latency are reported as warnings
    pub slow_threshold: Option<Duration>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let sensitive_headers = ["authorization", "cookie", "set-cookie", "x-api-key"]
            .into_iter()
            .map(String::from)
            .collect();

        Self {
            log_level: Level::INFO,
            log_headers: false,
            sensitive_headers,
            log_response: true,
            slow_threshold: None,
        }
    }
}

impl LoggingConfig {
    fn is_sensitive(&self, name: &str) -> bool {
        self.sensitive_headers
            .iter()
            .any(|sensitive| sensitive.eq_ignore_ascii_case(name))
    }

    /// `name: value` pairs with sensitive values masked
    fn describe_headers(&self, headers: &HeaderMap) -> Vec<String> {
        headers
            .iter()
            .map(|(name, value)| {
                let shown = if self.is_sensitive(name.as_str()) {
                    REDACTED
                } else {
                    value.to_str().unwrap_or("<binary>")
                };
                format!("{name}: {shown}")
            })
            .collect()
    }
}

/// Request fields captured before the chain runs
struct Entry {
    request_id: String,
    method: Method,
    uri: Uri,
    started: Instant,
}

impl Entry {
    fn capture(ctx: &Context) -> Self {
        Self {
            request_id: ctx.request_id.clone(),
            method: ctx.method.clone(),
            uri: ctx.uri.clone(),
            started: Instant::now(),
        }
    }
}

/// Logs every request that passes through it
///
/// The completion event carries the matched route pattern, final status
/// and latency. Failures are always logged at `WARN` with the error, and
/// the error itself is returned untouched.
#[derive(Clone, Default)]
pub struct RequestLogger {
    config: LoggingConfig,
}

impl RequestLogger {
    /// Logger with [`LoggingConfig::default`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logger with explicit settings
    pub fn with_config(config: LoggingConfig) -> Self {
        Self { config }
    }

    fn log_entry(&self, entry: &Entry, ctx: &Context) {
        let level = self.config.log_level;
        if self.config.log_headers {
            let headers = self.config.describe_headers(&ctx.headers);
            emit!(
                level,
                request_id = %entry.request_id,
                method = %entry.method,
                uri = %entry.uri,
                headers = ?headers,
                "Incoming request"
            );
        } else {
            emit!(
                level,
                request_id = %entry.request_id,
                method = %entry.method,
                uri = %entry.uri,
                "Incoming request"
            );
        }
    }

    fn log_outcome(&self, entry: &Entry, ctx: &Context, result: &Result<()>) {
        let elapsed = entry.started.elapsed();
        let route = ctx.route.as_ref().map_or("-", |r| r.pattern.as_str());

        let error = match result {
            Ok(()) => None,
            Err(e) => Some(e),
        };

        if let Some(e) = error {
            warn!(
                request_id = %entry.request_id,
                method = %entry.method,
                uri = %entry.uri,
                route,
                status = e.to_status_code().as_u16(),
                error = %e,
                duration_ms = elapsed.as_millis(),
                "Request failed"
            );
            return;
        }

        let status = final_status(ctx).as_u16();
        if self.over_threshold(elapsed) {
            warn!(
                request_id = %entry.request_id,
                method = %entry.method,
                uri = %entry.uri,
                route,
                status,
                duration_ms = elapsed.as_millis(),
                "Slow request"
            );
        } else if self.config.log_response {
            emit!(
                self.config.log_level,
                request_id = %entry.request_id,
                method = %entry.method,
                uri = %entry.uri,
                route,
                status,
                duration_ms = elapsed.as_millis(),
                "Request completed"
            );
        }
    }

    fn over_threshold(&self, elapsed: Duration) -> bool {
        matches!(self.config.slow_threshold, Some(limit) if elapsed >= limit)
    }
}

impl fmt::Debug for RequestLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestLogger")
            .field("level", &self.config.log_level)
            .field("headers", &self.config.log_headers)
            .field("slow_threshold", &self.config.slow_threshold)
            .finish_non_exhaustive()
    }
}

/// Status the responder will use if nothing downstream changes it
fn final_status(ctx: &Context) -> StatusCode {
    match ctx.status() {
        Some(status) => status,
        None if ctx.has_body() => StatusCode::OK,
        None => StatusCode::NOT_FOUND,
    }
}

#[async_trait]
impl Middleware for RequestLogger {
    async fn call(&self, ctx: &mut Context, next: Next) -> Result<()> {
        let entry = Entry::capture(ctx);
        self.log_entry(&entry, ctx);

        let result = next.run(ctx).await;
        self.log_outcome(&entry, ctx, &result);
        result
    }

    fn name(&self) -> &str {
        "logger"
    }
}
