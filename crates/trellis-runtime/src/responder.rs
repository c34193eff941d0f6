//! Response writing and error reporting

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use http::{header, HeaderValue, Response, StatusCode};
use std::fmt;
use trellis_core::{Body, Context, Error, HttpBody, ResponseBuilder, Result};

/// Turns the final Context into a response once the chain completes
#[async_trait]
pub trait Responder: Send + Sync + fmt::Debug {
    /// Build the response from the Context's status, headers and body
    async fn respond(&self, ctx: &mut Context) -> Result<Response<HttpBody>>;
}

/// Result of reporting an error
#[derive(Debug)]
pub enum ErrorOutcome {
    /// Send this response
    Respond(Response<HttpBody>),
    /// Nothing can be written; headers were sent or the peer is gone
    AlreadyReported,
}

/// Turns a dispatch error into a response
pub trait ErrorHandler: Send + Sync + fmt::Debug {
    /// Decide what to write for `error`
    fn handle_error(&self, ctx: &Context, error: &Error) -> ErrorOutcome;
}

/// Writes text, binary, JSON and streamed bodies.
///
/// Without a body the Context's status is used, defaulting to 404. With a
/// body the status defaults to 200.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResponder;

#[async_trait]
impl Responder for DefaultResponder {
    async fn respond(&self, ctx: &mut Context) -> Result<Response<HttpBody>> {
        // Encode first: a failing stream must leave the Context's headers
        // in place for the error response.
        let payload = match ctx.response.body.take() {
            None => None,
            Some(body) => {
                let content_type = HeaderValue::from_static(body.content_type());
                let bytes = match body {
                    Body::Text(text) => Bytes::from(text),
                    Body::Binary(bytes) => bytes,
                    Body::Json(value) => Bytes::from(serde_json::to_vec(&value)?),
                    Body::Stream(stream) => {
                        let chunks: Vec<Bytes> = stream.try_collect().await?;
                        Bytes::from(chunks.concat())
                    }
                };
                Some((bytes, content_type))
            }
        };

        let status = ctx.status().unwrap_or(if payload.is_some() {
            StatusCode::OK
        } else {
            StatusCode::NOT_FOUND
        });
        let builder =
            ResponseBuilder::new(status).headers(std::mem::take(&mut ctx.response.headers));
        let response = match payload {
            None => builder.empty(),
            Some((bytes, content_type)) => builder.bytes(bytes, Some(content_type)),
        };

        ctx.response.headers_sent = true;
        Ok(response)
    }
}

/// Answers errors with `text/plain` and an explicit content length.
///
/// Exposed errors send their message, everything else the canonical status
/// text. Headers already set on the Context are kept, apart from the
/// content type.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextErrorResponder;

impl ErrorHandler for TextErrorResponder {
    fn handle_error(&self, ctx: &Context, error: &Error) -> ErrorOutcome {
        if ctx.response.headers_sent || !ctx.response.writable {
            tracing::debug!(
                request_id = %ctx.request_id,
                error = %error,
                "Response already started, not reporting error"
            );
            return ErrorOutcome::AlreadyReported;
        }

        let status = error.to_status_code();
        if status.is_server_error() {
            tracing::error!(
                request_id = %ctx.request_id,
                status = status.as_u16(),
                error = %error,
                "Request failed"
            );
        } else {
            tracing::debug!(
                request_id = %ctx.request_id,
                status = status.as_u16(),
                error = %error,
                "Request rejected"
            );
        }

        let mut headers = ctx.response.headers.clone();
        headers.remove(header::CONTENT_TYPE);

        ErrorOutcome::Respond(
            ResponseBuilder::new(status)
                .headers(headers)
                .text(error.public_message()),
        )
    }
}
