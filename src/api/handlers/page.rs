//! Root page and fallback handlers.

use axum::extract::State;
use axum::http::Uri;
use axum::response::Html;

use crate::app_state::AppState;
use crate::error::RelayError;

/// `GET /` — Serves the root HTML document.
///
/// # Errors
///
/// Returns [`RelayError::PageNotFound`] if the page file does not exist and
/// [`RelayError::Io`] if it cannot be read.
pub async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, RelayError> {
    let path = state.config.index_path();
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Ok(Html(page)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(RelayError::PageNotFound(path.display().to_string()))
        }
        Err(e) => Err(RelayError::Io(e)),
    }
}

/// Fallback for paths no route matches.
pub async fn not_found_handler(uri: Uri) -> RelayError {
    RelayError::RouteNotFound(uri.path().to_string())
}
