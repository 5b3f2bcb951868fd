use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri, header},
    response::IntoResponse,
};
use std::sync::Arc;

use crate::api::{api_error::ApiError, state::ApiServerState};
use crate::handler::HandlerError;

// The decoded review fills the empty fields, see `crate::handler`.
#[tracing::instrument(
    name = "review",
    fields(
        host=crate::config::HOSTNAME.as_str(),
        path=uri.path(),
        request_uid=tracing::field::Empty,
        name=tracing::field::Empty,
        namespace=tracing::field::Empty,
        operation=tracing::field::Empty,
        kind=tracing::field::Empty,
        allowed=tracing::field::Empty,
        response_code=tracing::field::Empty,
        response_message=tracing::field::Empty,
    ),
    skip_all)]
/// Run the review pipeline registered for the request path.
pub(crate) async fn review_handler(
    State(state): State<Arc<ApiServerState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    let payload = state.handler.handle(uri.path(), content_type, &body)?;

    Ok((
        [(header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
        payload,
    ))
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

pub(crate) async fn not_found_handler(uri: Uri) -> ApiError {
    ApiError::from(HandlerError::UnknownPath(uri.path().to_owned()))
}
