//! The dashboard page, embedded in the binary.

use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../../assets/index.html");

/// `GET /` — static dashboard page; it fetches `/api/dashboard` client-side.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
