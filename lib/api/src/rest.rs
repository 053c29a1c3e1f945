use crate::service::{Recommendation, RecommendationService};
use actix_cors::Cors;
use actix_web::error::InternalError;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use mangarec_core::{Error, ItemId, NotFoundReason};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

#[derive(Deserialize)]
struct RecommendationRequest {
    title: String,
    top_n: Option<usize>,
}

#[derive(Serialize)]
struct RecommendationResponse {
    title: String,
    matched_id: ItemId,
    recommendations: Vec<Recommendation>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: String,
    items: usize,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(service: Arc<RecommendationService>, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(service.clone()))
                .configure(routes)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Register the endpoints on an app. Expects `web::Data<Arc<RecommendationService>>`.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let body = serde_json::json!({ "detail": err.to_string() });
        InternalError::from_response(err, HttpResponse::UnprocessableEntity().json(body)).into()
    }))
    .route("/recommendations/", web::post().to(recommend))
    .route("/recommendations", web::post().to(recommend))
    .route("/admin/reload", web::post().to(reload))
    .route("/health", web::get().to(health));
}

fn reason_code(reason: &NotFoundReason) -> &'static str {
    match reason {
        NotFoundReason::NoCloseMatch { .. } => "no_close_match",
        NotFoundReason::MissingSimilarity { .. } => "missing_similarity",
    }
}

fn error_response(err: &Error) -> HttpResponse {
    match err {
        Error::NotFound(reason) => HttpResponse::NotFound().json(serde_json::json!({
            "detail": reason.to_string(),
            "reason": reason_code(reason),
        })),
        Error::InvalidInput(msg) => HttpResponse::UnprocessableEntity().json(serde_json::json!({
            "detail": msg,
        })),
        Error::UpstreamUnavailable(msg) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "detail": msg,
        })),
        other => HttpResponse::InternalServerError().json(serde_json::json!({
            "detail": other.to_string(),
        })),
    }
}

async fn recommend(
    service: web::Data<Arc<RecommendationService>>,
    req: web::Json<RecommendationRequest>,
) -> ActixResult<HttpResponse> {
    let req = req.into_inner();
    match service.recommend(&req.title, req.top_n) {
        Ok(recs) => Ok(HttpResponse::Ok().json(RecommendationResponse {
            title: recs.query,
            matched_id: recs.matched.id,
            recommendations: recs.items,
        })),
        Err(e) => {
            if !e.is_not_found() && !matches!(e, Error::InvalidInput(_)) {
                error!("recommendation failed: {}", e);
            }
            Ok(error_response(&e))
        }
    }
}

async fn reload(service: web::Data<Arc<RecommendationService>>) -> ActixResult<HttpResponse> {
    let svc = service.get_ref().clone();
    match web::block(move || svc.reload()).await? {
        Ok(catalog) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "status": "reloaded",
            "version": catalog.version(),
            "items": catalog.len(),
        }))),
        Err(e) => {
            warn!("reload refused, keeping current catalog: {}", e);
            Ok(HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unchanged",
                "detail": e.to_string(),
            })))
        }
    }
}

async fn health(service: web::Data<Arc<RecommendationService>>) -> ActixResult<HttpResponse> {
    let catalog = service.catalog();
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        version: catalog.version().to_string(),
        items: catalog.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceConfig;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use mangarec_core::{MetadataRow, MetadataTable};
    use mangarec_similarity::SimilarityMatrix;
    use serde_json::{json, Value};

    fn service() -> Arc<RecommendationService> {
        let sim = SimilarityMatrix::from_rows(
            vec![1, 2, 3],
            &[vec![0.0, 0.8, 0.6], vec![0.8, 0.0, 0.7], vec![0.6, 0.7, 0.0]],
        )
        .unwrap();
        let rows = [(1, "Naruto"), (2, "Bleach"), (3, "One Piece")]
            .iter()
            .map(|(id, title)| MetadataRow {
                id: *id,
                title: title.to_string(),
                description: String::new(),
                tags: vec!["Action".to_string()],
            })
            .collect::<Vec<_>>();
        Arc::new(
            RecommendationService::from_parts(sim, MetadataTable::from(rows), ServiceConfig::default())
                .unwrap(),
        )
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(service()))
                    .configure(routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_recommendations_ok() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/recommendations/")
            .set_json(json!({ "title": "naruto", "top_n": 2 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["title"], "naruto");
        assert_eq!(body["matched_id"], 1);
        let recs = body["recommendations"].as_array().unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0]["id"], 2);
        assert_eq!(recs[0]["similarity"], 0.8);
        assert_eq!(recs[1]["id"], 3);
    }

    #[actix_web::test]
    async fn test_not_found_has_reason() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/recommendations/")
            .set_json(json!({ "title": "Nonexistent Manga XXXXXX" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["reason"], "no_close_match");
    }

    #[actix_web::test]
    async fn test_zero_top_n_is_unprocessable() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/recommendations/")
            .set_json(json!({ "title": "Naruto", "top_n": 0 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn test_malformed_body_is_unprocessable() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/recommendations/")
            .set_json(json!({ "top_n": 3 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn test_health_reports_items() {
        let app = app!();
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["items"], 3);
    }

    #[actix_web::test]
    async fn test_reload_without_store_is_unavailable() {
        let app = app!();
        let req = test::TestRequest::post().uri("/admin/reload").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
