//! HTTP router: the dashboard page at `/` and the JSON API under `/api/`.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

// 55 MB: covers a batch of scanned PDFs or a full database file, plus
// multipart overhead.
const BODY_LIMIT_BYTES: usize = 55 * 1024 * 1024;

pub fn api_router(ctx: ApiContext) -> Router {
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/dashboard", get(endpoints::dashboard::summary))
        .route("/patients", get(endpoints::patients::list))
        .route("/mine", post(endpoints::mine::upload))
        .route("/export.csv", get(endpoints::export::download))
        .route("/database", post(endpoints::database::replace))
        .with_state(ctx);

    Router::new()
        .route("/", get(endpoints::page::index))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::db;

    const BOUNDARY: &str = "test-boundary-7f2a";

    fn test_ctx() -> (ApiContext, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = ApiContext::new(tmp.path().join("patients.db"));
        (ctx, tmp)
    }

    /// Context with an already-migrated database on disk.
    fn test_ctx_with_db() -> (ApiContext, tempfile::TempDir) {
        let (ctx, tmp) = test_ctx();
        ctx.open_or_create().unwrap();
        (ctx, tmp)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn multipart_request(uri: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn response_json(response: axum::http::Response<Body>) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn index_serves_html() {
        let (ctx, _tmp) = test_ctx();
        let response = api_router(ctx).oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let page = String::from_utf8(body.to_vec()).unwrap();
        assert!(page.contains("<!DOCTYPE html>"));
        assert!(page.contains("/api/dashboard"));
    }

    #[tokio::test]
    async fn health_reports_missing_database() {
        let (ctx, _tmp) = test_ctx();
        let response = api_router(ctx)
            .oneshot(get_request("/api/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["database_ready"], false);
        assert!(!json["version"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dashboard_503_before_any_database() {
        let (ctx, _tmp) = test_ctx();
        let response = api_router(ctx)
            .oneshot(get_request("/api/dashboard"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "DB_UNAVAILABLE");
    }

    #[tokio::test]
    async fn dashboard_empty_database_shape() {
        let (ctx, _tmp) = test_ctx_with_db();
        let response = api_router(ctx)
            .oneshot(get_request("/api/dashboard"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["summary"]["total_patients"], 0);
        assert!(json["by_urgency"].is_array());
        assert!(json["by_convenio"].is_array());
        assert!(json["urgency_by_convenio"].is_array());
    }

    #[tokio::test]
    async fn patients_listing_respects_only_eligible() {
        let (ctx, _tmp) = test_ctx_with_db();
        {
            let conn = ctx.open_or_create().unwrap();
            conn.execute(
                "INSERT INTO patients (same_id, malignancy_score, is_eligible)
                 VALUES ('S-1', 5, 1), ('S-2', 0, 0)",
                [],
            )
            .unwrap();
        }

        let app = api_router(ctx);
        let response = app
            .oneshot(get_request("/api/patients?only_eligible=true"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["total"], 1);
        assert_eq!(json["patients"][0]["same_id"], "S-1");
    }

    #[tokio::test]
    async fn mine_without_file_field_is_rejected() {
        let (ctx, _tmp) = test_ctx();
        let body = format!("--{BOUNDARY}--\r\n");
        let req = Request::builder()
            .method("POST")
            .uri("/api/mine")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = api_router(ctx).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn mine_single_pdf_creates_row() {
        let (ctx, _tmp) = test_ctx();
        let pdf = crate::pipeline::extraction::test_fixtures::make_test_pdf(
            "SAME: 90001, PACIENTE: ANA COSTA, carcinoma com metastase",
        );
        let req = multipart_request("/api/mine", "laudo.pdf", &pdf);

        let response = api_router(ctx.clone()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["processed"], 1);
        assert_eq!(json["failed"], 0);
        assert_eq!(json["results"][0]["same_id"], "90001");
        assert_eq!(json["results"][0]["eligible"], true);

        let conn = ctx.open_existing().unwrap();
        assert_eq!(db::repository::count_patients(&conn).unwrap(), 1);
    }

    #[tokio::test]
    async fn mine_bad_pdf_reported_without_aborting() {
        let (ctx, _tmp) = test_ctx();
        let req = multipart_request("/api/mine", "quebrado.pdf", b"not a pdf at all");

        let response = api_router(ctx).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["processed"], 0);
        assert_eq!(json["failed"], 1);
        assert_eq!(json["errors"][0]["file"], "quebrado.pdf");
    }

    #[tokio::test]
    async fn export_returns_csv_attachment() {
        let (ctx, _tmp) = test_ctx_with_db();
        let response = api_router(ctx)
            .oneshot(get_request("/api/export.csv"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/csv"));
        assert!(response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("pacientes_oncologia.csv"));
    }

    #[tokio::test]
    async fn database_replace_with_valid_file() {
        let (ctx, _tmp) = test_ctx();

        // Build a donor database in another directory
        let donor_dir = tempfile::tempdir().unwrap();
        let donor_path = donor_dir.path().join("donor.db");
        {
            let conn = db::open_database(&donor_path).unwrap();
            conn.execute(
                "INSERT INTO patients (same_id, is_eligible) VALUES ('D-1', 1)",
                [],
            )
            .unwrap();
        }
        let donor_bytes = std::fs::read(&donor_path).unwrap();

        let req = multipart_request("/api/database", "donor.db", &donor_bytes);
        let response = api_router(ctx.clone()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["status"], "replaced");
        assert_eq!(json["patients"], 1);

        // The replaced database serves reads
        let response = api_router(ctx)
            .oneshot(get_request("/api/patients"))
            .await
            .unwrap();
        let json = response_json(response).await;
        assert_eq!(json["patients"][0]["same_id"], "D-1");
    }

    #[tokio::test]
    async fn database_replace_rejects_garbage_and_keeps_old_db() {
        let (ctx, _tmp) = test_ctx_with_db();
        {
            let conn = ctx.open_or_create().unwrap();
            conn.execute("INSERT INTO patients (same_id) VALUES ('KEEP-1')", [])
                .unwrap();
        }

        let req = multipart_request("/api/database", "evil.db", b"this is not sqlite");
        let response = api_router(ctx.clone()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Old database untouched
        let conn = ctx.open_existing().unwrap();
        assert_eq!(db::repository::count_patients(&conn).unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (ctx, _tmp) = test_ctx();
        let response = api_router(ctx)
            .oneshot(get_request("/api/nope"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
