use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    routing::{get, patch},
};
use axum_extra::extract::WithRejection;
use serde_json::Value;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info};

use crate::{
    AppState,
    entities::movie,
    error::{AppError, AppResult},
    models::MoviePage,
    pagination::{ListQuery, paginate},
    preconditions,
    validation::{self, Payload},
};

type JsonBody = WithRejection<Json<Value>, AppError>;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/movies", get(list_movies).post(create_movie))
        .route("/movies/{id}", patch(update_movie).delete(delete_movie))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(body), _): JsonBody,
) -> AppResult<(StatusCode, Json<movie::Model>)> {
    preconditions::name_is_free(&state.store, &body).await?;

    let payload = into_payload(body)?;
    // Ahead of the key-set check, which would otherwise report `id` as an
    // unsolicited key and hide this message. Both are 400.
    if payload.contains_key("id") {
        return Err(AppError::validation("You can't choose an ID."));
    }
    let payload = validation::validate_for_create(payload)?;

    let movie = state.store.insert(&payload).await?;
    info!(id = movie.id, name = ?movie.name, "movie created");
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> AppResult<Json<MoviePage>> {
    // Listing never fails on its parameters; anything unreadable means defaults.
    let query = ListQuery::from_pairs(query.map(|Query(pairs)| pairs).unwrap_or_default());
    let total = state.store.count().await?;
    let window = paginate(&query, total, &state.config.public_base_url);
    debug!(page = window.page, per_page = window.per_page, total, "listing movies");
    let data = state.store.page(&window).await?;

    Ok(Json(MoviePage {
        prev_page: window.prev_page,
        next_page: window.next_page,
        count: data.len(),
        data,
    }))
}

pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    WithRejection(Json(body), _): JsonBody,
) -> AppResult<Json<movie::Model>> {
    let current = preconditions::movie_exists(&state.store, &id).await?;
    preconditions::name_is_free(&state.store, &body).await?;

    let payload = into_payload(body)?;
    // Same ordering as create.
    if payload.contains_key("id") {
        return Err(AppError::validation("ID can't be changed"));
    }
    let payload = validation::validate_for_update(payload)?;
    if payload.is_empty() {
        return Ok(Json(current));
    }

    let movie = state
        .store
        .update(current.id, &payload)
        .await?
        .ok_or_else(|| AppError::movie_not_found(current.id))?;
    info!(id = movie.id, fields = payload.len(), "movie updated");
    Ok(Json(movie))
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let movie = preconditions::movie_exists(&state.store, &id).await?;

    if state.store.delete(movie.id).await? == 0 {
        return Err(AppError::movie_not_found(movie.id));
    }
    info!(id = movie.id, "movie deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn into_payload(body: Value) -> AppResult<Payload> {
    match body {
        Value::Object(payload) => Ok(payload),
        _ => Err(AppError::validation("Request body must be a JSON object")),
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, header::CONTENT_TYPE},
    };
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::{config::Config, store::MovieStore};

    async fn app() -> Router {
        let db = crate::db::connect_and_migrate("sqlite::memory:").await.unwrap();
        let config = Config {
            addr: ([127, 0, 0, 1], 0).into(),
            database_url: "sqlite::memory:".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
        };
        router(Arc::new(AppState { config: Arc::new(config), store: MovieStore::new(db) }))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(body) => builder.header(CONTENT_TYPE, "application/json").body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }

    async fn create(app: &Router, name: &str, duration: f64, price: f64) -> Value {
        let (status, body) = send(
            app,
            Method::POST,
            "/movies",
            Some(json!({ "name": name, "duration": duration, "price": price })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    #[tokio::test]
    async fn create_returns_the_inserted_row() {
        let app = app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/movies",
            Some(json!({ "name": "Alien", "description": "In space", "duration": 117, "price": 9.5 })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], 1);
        assert_eq!(body["name"], "Alien");
        assert_eq!(body["description"], "In space");
        assert_eq!(body["duration"], 117.0);
        assert_eq!(body["price"], 9.5);
    }

    #[tokio::test]
    async fn duplicate_name_conflicts_without_insert() {
        let app = app().await;
        create(&app, "Heat", 170.0, 5.0).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/movies",
            Some(json!({ "name": "Heat", "duration": 1, "price": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Movie with name Heat already exists.");

        let (_, page) = send(&app, Method::GET, "/movies", None).await;
        assert_eq!(page["count"], 1);
    }

    #[tokio::test]
    async fn create_rejects_bad_payloads() {
        let app = app().await;

        let (status, body) =
            send(&app, Method::POST, "/movies", Some(json!({ "name": "A", "price": 1 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], r#"Required keys are "name,duration,price". You sent "name,price""#);

        let (status, body) = send(
            &app,
            Method::POST,
            "/movies",
            Some(json!({ "id": 9, "name": "A", "duration": 1, "price": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "You can't choose an ID.");

        let (status, body) = send(&app, Method::POST, "/movies", Some(json!(["A"]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Request body must be a JSON object");

        let req = Request::builder()
            .method(Method::POST)
            .uri("/movies")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let (_, page) = send(&app, Method::GET, "/movies", None).await;
        assert_eq!(page["count"], 0);
    }

    #[tokio::test]
    async fn list_paginates_with_links() {
        let app = app().await;
        for i in 1..=12 {
            create(&app, &format!("movie {i}"), 90.0, i as f64).await;
        }

        let (status, page) = send(&app, Method::GET, "/movies", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["count"], 5);
        assert_eq!(page["prevPage"], Value::Null);
        assert_eq!(page["nextPage"], "http://localhost:3000/movies?page=2&perPage=5");

        let (_, page) = send(&app, Method::GET, "/movies?page=2", None).await;
        assert_eq!(page["count"], 5);
        assert_eq!(page["data"][0]["name"], "movie 6");
        assert_eq!(page["prevPage"], "http://localhost:3000/movies?page=1&perPage=5");
        assert_eq!(page["nextPage"], "http://localhost:3000/movies?page=3&perPage=5");

        let (_, page) = send(&app, Method::GET, "/movies?page=3", None).await;
        assert_eq!(page["count"], 2);
        assert_eq!(page["nextPage"], Value::Null);

        let (_, page) = send(&app, Method::GET, "/movies?perPage=100", None).await;
        assert_eq!(page["count"], 5);

        let (_, page) = send(&app, Method::GET, "/movies?sort=price&order=DESC", None).await;
        assert_eq!(page["data"][0]["name"], "movie 12");

        let (_, page) = send(&app, Method::GET, "/movies?sort=name&order=DESC", None).await;
        assert_eq!(page["data"][0]["name"], "movie 1");

        let (status, page) = send(&app, Method::GET, "/movies?page=2&page=1&perPage=abc", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["data"][0]["name"], "movie 6");
        assert_eq!(page["nextPage"], "http://localhost:3000/movies?page=3&perPage=5");
    }

    #[tokio::test]
    async fn update_checks_existence_before_validation() {
        let app = app().await;
        let (status, body) =
            send(&app, Method::PATCH, "/movies/99", Some(json!({ "bogus": true }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Movie with ID 99 not found.");

        let (status, _) = send(&app, Method::PATCH, "/movies/abc", Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_changes_only_supplied_fields() {
        let app = app().await;
        let created = create(&app, "Ran", 162.0, 7.0).await;
        let uri = format!("/movies/{}", created["id"]);

        let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({ "price": 0 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["price"], 0.0);
        assert_eq!(body["duration"], 162.0);
        assert_eq!(body["name"], "Ran");

        let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({ "description": "Lear" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["description"], "Lear");

        let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["description"], "Lear");
    }

    #[tokio::test]
    async fn update_rejects_conflicts_and_bad_payloads() {
        let app = app().await;
        create(&app, "Heat", 170.0, 5.0).await;
        let created = create(&app, "Ran", 162.0, 7.0).await;
        let uri = format!("/movies/{}", created["id"]);

        let (status, _) = send(&app, Method::PATCH, &uri, Some(json!({ "name": "Heat" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({ "name": "Ran" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Movie with name Ran already exists.");

        let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({ "id": 5 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "ID can't be changed");

        let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({ "price": "cheap" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], r#"Type of "price" must be number"#);
    }

    #[tokio::test]
    async fn update_with_mistyped_falsy_values_leaves_row_intact() {
        let app = app().await;
        let created = create(&app, "Ran", 162.0, 7.0).await;
        let uri = format!("/movies/{}", created["id"]);

        let (status, body) =
            send(&app, Method::PATCH, &uri, Some(json!({ "duration": "", "price": false }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], r#"Type of "duration" must be number"#);

        let (_, page) = send(&app, Method::GET, "/movies", None).await;
        assert_eq!(page["data"][0]["duration"], 162.0);
        assert_eq!(page["data"][0]["price"], 7.0);
    }

    #[tokio::test]
    async fn delete_removes_then_404s() {
        let app = app().await;
        let created = create(&app, "Alien", 117.0, 9.0).await;
        let uri = format!("/movies/{}", created["id"]);

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], format!("Movie with ID {} not found.", created["id"]));
    }
}
