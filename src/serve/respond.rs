//! File response building
//!
//! Turns a finished upload session plus an optional `Range` header into a
//! streaming HTTP response: 200 for whole files, 206 for satisfiable windows
//! on media files, 416 otherwise.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tokio_util::io::ReaderStream;

use super::range::{self, RangePlan};
use crate::error::{AppError, Result};
use crate::upload::UploadSession;

/// Build the streaming response for a finished, unexpired session.
pub async fn file_response(
    session: &UploadSession,
    range_header: Option<&str>,
) -> Result<Response> {
    let mime = mime_guess::from_path(&session.file_name).first_or_octet_stream();
    let ranged = range::media_supports_ranges(&session.file_name);

    // Range handling is reserved for audio/video; any Range header on other
    // types is ignored and the file is served whole.
    let plan = if ranged {
        range::resolve(range_header, session.size_bytes)
    } else {
        RangePlan::Full
    };

    let file = tokio::fs::File::open(&session.storage_path)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound(session.id.clone()),
            _ => AppError::Io(e),
        })?;

    let filename = session.file_name.replace('"', "");

    let builder = |status: StatusCode| {
        Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, mime.essence_str())
            .header(
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", filename),
            )
    };

    let response = match plan {
        RangePlan::Full => {
            let mut builder = builder(StatusCode::OK)
                .header(header::CONTENT_LENGTH, session.size_bytes);
            if ranged {
                builder = builder.header(header::ACCEPT_RANGES, "bytes");
            }
            builder.body(Body::from_stream(ReaderStream::new(file)))
        }
        RangePlan::Partial { start, end } => {
            let mut file = file;
            file.seek(SeekFrom::Start(start)).await?;
            let len = end - start + 1;

            tracing::debug!(
                session_id = %session.id,
                start = start,
                end = end,
                "Serving byte range"
            );

            builder(StatusCode::PARTIAL_CONTENT)
                .header(header::ACCEPT_RANGES, "bytes")
                .header(header::CONTENT_LENGTH, len)
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", start, end, session.size_bytes),
                )
                .body(Body::from_stream(ReaderStream::new(file.take(len))))
        }
        RangePlan::Unsatisfiable => {
            return Err(AppError::RangeNotSatisfiable {
                size: session.size_bytes,
            });
        }
    };

    response.map_err(|e| AppError::Internal(e.to_string()))
}

// ============================================================================
// Tests
// ============================================================================
