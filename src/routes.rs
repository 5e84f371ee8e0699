use crate::assistant::{self, RecipeAssistant};
use crate::dataset::Dataset;
use crate::filter::filter;
use crate::gemini::GenerativeBackend;
use crate::render::render;
use crate::utils::request_id;
use actix_web::{error, web, HttpRequest, HttpResponse, Responder};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

pub const APP_TITLE: &str = "HungerHub";
pub const VIEWS: [&str; 2] = ["Home", "Hunger Assistant"];

/// Dataset handed to the Home endpoints. A failed load is kept so every
/// Home request can report it while the assistant keeps serving.
pub enum HomeData {
    Ready(Arc<Dataset>),
    Unavailable(String),
}

#[derive(Debug, Deserialize)]
struct LocalityQuery {
    city: String,
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    city: String,
    locality: String,
    #[serde(default)]
    cuisines: BTreeSet<String>,
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    query: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_format: Option<serde_json::Value>,
}

pub fn configure<B: GenerativeBackend + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/health", web::get().to(health_check))
        .route("/home/cities", web::get().to(cities))
        .service(
            web::resource("/home/localities")
                .app_data(web::QueryConfig::default().error_handler(locality_query_error))
                .route(web::get().to(localities)),
        )
        .route("/home/cuisines", web::get().to(cuisines))
        .route("/home/search", web::post().to(search))
        .route("/assistant", web::get().to(assistant_page))
        .route("/assistant/ask", web::post().to(ask::<B>));
}

async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "message": "Server is running"
    }))
}

async fn index() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "title": APP_TITLE,
        "views": VIEWS,
    }))
}

fn dataset_or_error(home: &HomeData) -> Result<&Dataset, HttpResponse> {
    match home {
        HomeData::Ready(dataset) => Ok(dataset.as_ref()),
        HomeData::Unavailable(reason) => Err(HttpResponse::ServiceUnavailable().json(ErrorResponse {
            error: format!("Restaurant data could not be loaded: {}", reason),
            expected_format: None,
        })),
    }
}

async fn cities(home: web::Data<HomeData>) -> HttpResponse {
    match dataset_or_error(&home) {
        Ok(dataset) => HttpResponse::Ok().json(dataset.cities()),
        Err(response) => response,
    }
}

async fn localities(query: web::Query<LocalityQuery>, home: web::Data<HomeData>) -> HttpResponse {
    match dataset_or_error(&home) {
        Ok(dataset) => HttpResponse::Ok().json(dataset.localities(&query.city)),
        Err(response) => response,
    }
}

fn locality_query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let error_msg = format!("Invalid query string: {}", err);
    error!("{}", error_msg);
    let response = HttpResponse::BadRequest().json(ErrorResponse {
        error: error_msg,
        expected_format: Some(serde_json::json!({
            "city": "Bangalore"
        })),
    });
    error::InternalError::from_response(err, response).into()
}

async fn cuisines(home: web::Data<HomeData>) -> HttpResponse {
    match dataset_or_error(&home) {
        Ok(dataset) => HttpResponse::Ok().json(dataset.cuisines()),
        Err(response) => response,
    }
}

async fn search(body: web::Bytes, home: web::Data<HomeData>) -> HttpResponse {
    let request_id = request_id();
    info!("Request {}: Restaurant search received", request_id);

    let dataset = match dataset_or_error(&home) {
        Ok(dataset) => dataset,
        Err(response) => {
            error!("Request {}: Dataset unavailable", request_id);
            return response;
        }
    };

    let req = match serde_json::from_slice::<SearchRequest>(&body) {
        Ok(req) => req,
        Err(e) => {
            let error_msg = format!("Invalid request format: {}", e);
            error!("Request {}: {}", request_id, error_msg);
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: error_msg,
                expected_format: Some(serde_json::json!({
                    "city": "Bangalore",
                    "locality": "Indiranagar",
                    "cuisines": ["Chinese"]
                })),
            });
        }
    };
    debug!("Request {}: Parsed request body: {:?}", request_id, req);

    let rows = filter(dataset, &req.city, &req.locality, &req.cuisines);
    info!("Request {}: {} restaurants matched", request_id, rows.len());
    HttpResponse::Ok().json(render(&rows, &req.city, &req.locality))
}

async fn assistant_page() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "title": assistant::TITLE,
        "intro": assistant::INTRO,
    }))
}

async fn ask<B: GenerativeBackend + 'static>(
    body: web::Bytes,
    assistant: web::Data<RecipeAssistant<B>>,
) -> HttpResponse {
    let request_id = request_id();
    info!("Request {}: Assistant query received", request_id);

    let req = match serde_json::from_slice::<AskRequest>(&body) {
        Ok(req) => req,
        Err(e) => {
            let error_msg = format!("Invalid request format: {}", e);
            error!("Request {}: {}", request_id, error_msg);
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: error_msg,
                expected_format: Some(serde_json::json!({
                    "query": "How to make pasta"
                })),
            });
        }
    };
    debug!("Request {}: Query: {}", request_id, req.query);

    let result = assistant.answer(&req.query).await;
    HttpResponse::Ok().json(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::tests::FakeBackend;
    use crate::assistant::REFUSAL_MESSAGE;
    use crate::dataset::tests::sample_dataset;
    use crate::render::NO_RESULTS_NOTICE;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    fn ready() -> web::Data<HomeData> {
        web::Data::new(HomeData::Ready(Arc::new(sample_dataset())))
    }

    fn assistant_replying(text: &str) -> web::Data<RecipeAssistant<FakeBackend>> {
        web::Data::new(RecipeAssistant::new(FakeBackend::replying(text)))
    }

    #[actix_web::test]
    async fn index_lists_both_views() {
        let app = test::init_service(
            App::new()
                .app_data(ready())
                .app_data(assistant_replying("unused"))
                .configure(configure::<FakeBackend>),
        )
        .await;

        let body: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(body["title"], "HungerHub");
        assert_eq!(body["views"], json!(["Home", "Hunger Assistant"]));
    }

    #[actix_web::test]
    async fn option_endpoints_come_from_the_dataset() {
        let app = test::init_service(
            App::new()
                .app_data(ready())
                .app_data(assistant_replying("unused"))
                .configure(configure::<FakeBackend>),
        )
        .await;

        let cities: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/home/cities").to_request()).await;
        assert_eq!(cities, json!(["Bangalore", "Delhi"]));

        let localities: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/home/localities?city=Bangalore").to_request(),
        )
        .await;
        assert_eq!(localities, json!(["Indiranagar", "Koramangala"]));

        let cuisines: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/home/cuisines").to_request()).await;
        assert_eq!(cuisines, json!(["Chinese", "Mughlai", "North Indian", "South Indian", "Thai"]));
    }

    #[actix_web::test]
    async fn localities_without_city_is_a_json_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(ready())
                .app_data(assistant_replying("unused"))
                .configure(configure::<FakeBackend>),
        )
        .await;

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/home/localities").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid query string"));
        assert_eq!(body["expected_format"]["city"], "Bangalore");
    }

    #[actix_web::test]
    async fn search_renders_sorted_results() {
        let app = test::init_service(
            App::new()
                .app_data(ready())
                .app_data(assistant_replying("unused"))
                .configure(configure::<FakeBackend>),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/home/search")
            .set_json(json!({"city": "Bangalore", "locality": "Indiranagar", "cuisines": ["Chin"]}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["kind"], "results");
        let names: Vec<&str> = body["list"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["DRAGON BOWL", "SPICE ROUTE", "WOK THIS WAY"]);
        assert_eq!(body["map"]["markers"].as_array().unwrap().len(), 3);
        assert_eq!(body["map"]["center"], json!([12.98, 77.65]));
    }

    #[actix_web::test]
    async fn search_without_matches_has_no_map() {
        let app = test::init_service(
            App::new()
                .app_data(ready())
                .app_data(assistant_replying("unused"))
                .configure(configure::<FakeBackend>),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/home/search")
            .set_json(json!({"city": "Delhi", "locality": "Indiranagar"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["kind"], "no_results");
        assert_eq!(body["notice"], NO_RESULTS_NOTICE);
        assert!(body.get("map").is_none());
    }

    #[actix_web::test]
    async fn malformed_search_body_is_a_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(ready())
                .app_data(assistant_replying("unused"))
                .configure(configure::<FakeBackend>),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/home/search")
            .set_payload("{\"city\": 3}")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request format"));
        assert_eq!(body["expected_format"]["locality"], "Indiranagar");
    }

    #[actix_web::test]
    async fn unavailable_dataset_blocks_home_but_not_assistant() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(HomeData::Unavailable("file not found".to_string())))
                .app_data(assistant_replying("Simmer gently."))
                .configure(configure::<FakeBackend>),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/home/cities").to_request()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("file not found"));

        let req = test::TestRequest::post()
            .uri("/assistant/ask")
            .set_json(json!({"query": "recipe for soup"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"], "answered");
        assert_eq!(body["message"], "🍴 **Chef Mate says:** Simmer gently.");
    }

    #[actix_web::test]
    async fn ask_refuses_off_topic_queries() {
        let app = test::init_service(
            App::new()
                .app_data(ready())
                .app_data(assistant_replying("unused"))
                .configure(configure::<FakeBackend>),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/assistant/ask")
            .set_json(json!({"query": "Tell me a joke"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"], "refused");
        assert_eq!(body["message"], REFUSAL_MESSAGE);
    }

    #[actix_web::test]
    async fn assistant_page_has_title_and_intro() {
        let app = test::init_service(
            App::new()
                .app_data(ready())
                .app_data(assistant_replying("unused"))
                .configure(configure::<FakeBackend>),
        )
        .await;

        let body: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/assistant").to_request()).await;
        assert_eq!(body["title"], assistant::TITLE);
        assert_eq!(body["intro"], assistant::INTRO);
    }
}
