//! `POST /convert`: batch image-to-WebP conversion.
//!
//! The handler collects the multipart form, picks the response shape, then
//! hands the batch to the bounded mapper. Streaming shapes (archive and
//! multipart) build their body over a `tokio::io::duplex` pipe: a spawned
//! task drains conversion results into the writer while the response streams
//! the read half. When the client disconnects, the body is dropped, the pipe
//! write fails, and the draining task bails out.

use axum::body::Body;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use bytes::BytesMut;
use futures::StreamExt;
use tokio_util::io::ReaderStream;

use crate::config::LimitsConfig;
use crate::conversion::{
    codec, mapper, ConversionOptions, ConversionResult, InputItem, RawOptions, ResponseMode,
};
use crate::error::{Error, LimitKind};
use crate::naming;
use crate::server::error::AppError;
use crate::server::AppContext;
use crate::streaming::{
    archive_filename, multipart_content_type, random_boundary, ArchiveStream, MultipartStream,
};

/// Buffer between the writer task and the response body. Big enough to keep
/// the encoder from stalling on small entries, small enough to cap per-request
/// memory.
const PIPE_BUFFER: usize = 64 * 1024;

pub async fn convert(
    State(ctx): State<AppContext>,
    Query(raw): Query<RawOptions>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let items = collect_uploads(multipart, &ctx.config.limits).await?;
    if items.is_empty() {
        return Err(Error::Validation("no files uploaded".into()).into());
    }

    // Mode selection happens before any codec work so an unknown hint costs
    // nothing but the upload parse.
    let mode = ResponseMode::select(raw.output.as_deref(), items.len())?;
    let options = ConversionOptions::resolve(&raw, &ctx.config.conversion);
    let limit = ctx.config.conversion.concurrency.max(1);

    tracing::debug!(
        items = items.len(),
        ?mode,
        quality = options.quality,
        effort = options.effort,
        "Starting conversion batch"
    );

    match mode {
        ResponseMode::Single => single_response(ctx, items, options, limit).await,
        ResponseMode::Archive => archive_response(ctx, items, options, limit),
        ResponseMode::Multipart => multipart_response(ctx, items, options, limit),
    }
}

/// Read every part of the upload form into memory, enforcing limits as the
/// bytes arrive. The first violation aborts the whole request.
async fn collect_uploads(
    mut multipart: Multipart,
    limits: &LimitsConfig,
) -> Result<Vec<InputItem>, Error> {
    let mut items = Vec::new();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("images") {
            return Err(Error::Validation(format!(
                "unexpected form field '{}'",
                field.name().unwrap_or("<unnamed>")
            )));
        }

        if items.len() >= limits.max_files {
            return Err(Error::UploadLimit(LimitKind::TooManyFiles));
        }

        let original_name = field.file_name().unwrap_or("image").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        if !mime_type.starts_with("image/") {
            return Err(Error::UploadLimit(LimitKind::NotAnImage));
        }

        // Stream the field in chunks so an oversized file is rejected as soon
        // as it crosses the limit, not after it has fully uploaded.
        let mut buf = BytesMut::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| Error::Validation(format!("failed to read upload: {e}")))?
        {
            if buf.len() + chunk.len() > limits.max_file_size_bytes {
                return Err(Error::UploadLimit(LimitKind::FileTooLarge));
            }
            buf.extend_from_slice(&chunk);
        }

        items.push(InputItem {
            original_name,
            bytes: buf.freeze(),
            mime_type,
        });
    }

    Ok(items)
}

/// Convert one item. Infallible: every failure mode folds into
/// [`ConversionResult::Failure`] so siblings in the batch are unaffected.
async fn convert_item(ctx: &AppContext, options: ConversionOptions, item: InputItem) -> ConversionResult {
    let failure = |message: String| ConversionResult::Failure {
        output_name: naming::error_marker_name(&item.original_name),
        message,
    };

    // Global gate: bounds codec CPU across all in-flight requests, not just
    // this one.
    let permit = match ctx.encode_permits.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return failure("conversion pool is shut down".into()),
    };

    let raw = item.bytes.clone();
    let joined = tokio::task::spawn_blocking(move || {
        let result = codec::encode(&raw, &options);
        drop(permit);
        result
    })
    .await;

    match joined {
        Ok(Ok(encoded)) => ConversionResult::Success {
            output_name: naming::output_name(&item.original_name),
            encoded: encoded.into(),
        },
        Ok(Err(e)) => {
            tracing::debug!(item = %item.original_name, error = %e, "Conversion failed");
            failure(e.to_string())
        }
        // spawn_blocking only fails if the codec panicked.
        Err(join_err) => {
            tracing::error!(item = %item.original_name, error = %join_err, "Conversion task panicked");
            failure(format!("conversion task failed: {join_err}"))
        }
    }
}

/// Single mode: the one result becomes the whole response body. A failure
/// here has no archive entry to hide in, so it surfaces as a 422.
async fn single_response(
    ctx: AppContext,
    items: Vec<InputItem>,
    options: ConversionOptions,
    limit: usize,
) -> Result<Response, AppError> {
    let worker_ctx = ctx.clone();
    let mut results = mapper::map_bounded(items, limit, move |_, item| {
        let ctx = worker_ctx.clone();
        async move { convert_item(&ctx, options, item).await }
    })
    .await;

    match results.pop() {
        Some(ConversionResult::Success {
            output_name,
            encoded,
        }) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "image/webp")
            .header(
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{output_name}\""),
            )
            .header(header::CACHE_CONTROL, "no-store")
            .body(Body::from(encoded))
            .map_err(|e| Error::Internal(format!("failed to build response: {e}")).into()),
        Some(ConversionResult::Failure { message, .. }) => Err(Error::Encode(message).into()),
        None => Err(Error::Internal("empty batch reached the single path".into()).into()),
    }
}

/// Archive mode: entries stream out in completion order.
fn archive_response(
    ctx: AppContext,
    items: Vec<InputItem>,
    options: ConversionOptions,
    limit: usize,
) -> Result<Response, AppError> {
    let (sink, source) = tokio::io::duplex(PIPE_BUFFER);

    tokio::spawn(async move {
        let worker_ctx = ctx.clone();
        let mut results = mapper::completion_order(items, limit, move |_, item| {
            let ctx = worker_ctx.clone();
            async move { convert_item(&ctx, options, item).await }
        });

        let mut archive = ArchiveStream::new(sink);
        while let Some((_, result)) = results.next().await {
            if let Err(e) = archive.append(&result).await {
                tracing::warn!("{e}; abandoning archive response");
                return;
            }
        }
        if let Err(e) = archive.finalize().await {
            tracing::warn!("{e}");
        }
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", archive_filename()),
        )
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from_stream(ReaderStream::new(source)))
        .map_err(|e| Error::Internal(format!("failed to build response: {e}")).into())
}

/// Multipart mode: parts stream out in input order.
fn multipart_response(
    ctx: AppContext,
    items: Vec<InputItem>,
    options: ConversionOptions,
    limit: usize,
) -> Result<Response, AppError> {
    let boundary = random_boundary();
    let content_type = multipart_content_type(&boundary);
    let (sink, source) = tokio::io::duplex(PIPE_BUFFER);

    tokio::spawn(async move {
        let worker_ctx = ctx.clone();
        let mut results = mapper::input_order(items, limit, move |_, item| {
            let ctx = worker_ctx.clone();
            async move { convert_item(&ctx, options, item).await }
        });

        let mut stream = MultipartStream::new(sink, boundary);
        while let Some((_, result)) = results.next().await {
            if let Err(e) = stream.write_part(&result).await {
                tracing::warn!("{e}; abandoning multipart response");
                return;
            }
        }
        if let Err(e) = stream.finalize().await {
            tracing::warn!("{e}");
        }
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from_stream(ReaderStream::new(source)))
        .map_err(|e| Error::Internal(format!("failed to build response: {e}")).into())
}
