use axum::{
    extract::Path,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use http::Request;
use openapi_guard::{
    parse_openapi_spec, BodyError, OpenApiConfig, OpenApiError, OpenApiTestClient, ResponseError,
};
use serde_json::json;

const SPEC: &str = r##"
openapi: 3.0.3
info:
  title: Pets
  version: "1.0"
paths:
  /pets/{id}:
    get:
      parameters:
        - name: id
          in: path
          required: true
          schema:
            type: integer
      responses:
        "200":
          description: a pet
          headers:
            X-Rate-Limit:
              required: true
              schema:
                type: integer
            X-Mode:
              schema:
                type: string
                enum: [fast, slow]
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/Pet"
        "4XX":
          description: client error
        "500":
          description: server error
  /pages/home:
    get:
      responses:
        "200":
          description: landing page
          content:
            text/html:
              schema:
                type: string
components:
  schemas:
    Pet:
      type: object
      required: [id, name]
      properties:
        id:
          type: integer
        name:
          type: string
"##;

async fn pet(Path(id): Path<u32>) -> Response {
    let pet = Json(json!({"id": id, "name": "Rex"}));
    match id {
        1 => ([("x-rate-limit", "10")], pet).into_response(),
        2 => pet.into_response(),
        3 => ([("x-rate-limit", "10")], Json(json!({"id": "three"}))).into_response(),
        4 => ([("x-rate-limit", "10"), ("x-mode", "medium")], pet).into_response(),
        5 => StatusCode::NOT_FOUND.into_response(),
        6 => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

fn client() -> OpenApiTestClient {
    let router = Router::new()
        .route("/pets/{id}", get(pet))
        .route("/pages/home", get(|| async { Html("<h1>Welcome</h1>") }));
    let config = OpenApiConfig::new(parse_openapi_spec(SPEC).unwrap());
    OpenApiTestClient::new(router, &config).unwrap()
}

fn get_request(uri: &str) -> Request<Bytes> {
    Request::get(uri).body(Bytes::new()).unwrap()
}

#[tokio::test]
async fn documented_response_is_returned() {
    let response = client().fetch(get_request("/pets/1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body, json!({"id": 1, "name": "Rex"}));
}

#[tokio::test]
async fn missing_required_header_is_reported() {
    let error = client().fetch(get_request("/pets/2")).await.unwrap_err();
    assert!(matches!(
        error,
        OpenApiError::Response(ResponseError::MissingHeader(ref name)) if name == "x-rate-limit"
    ));
}

#[tokio::test]
async fn body_schema_violation_is_reported() {
    let error = client().fetch(get_request("/pets/3")).await.unwrap_err();
    assert!(matches!(
        error,
        OpenApiError::Response(ResponseError::Body(BodyError::Schema(_)))
    ));
}

#[tokio::test]
async fn header_outside_enum_is_reported() {
    let error = client().fetch(get_request("/pets/4")).await.unwrap_err();
    match error {
        OpenApiError::Response(ResponseError::InvalidHeader { name, violations }) => {
            assert_eq!(name, "x-mode");
            assert!(!violations.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn status_range_matches_client_errors() {
    let response = client().fetch(get_request("/pets/5")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn undeclared_status_is_reported() {
    let error = client().fetch(get_request("/pets/9")).await.unwrap_err();
    assert!(matches!(error, OpenApiError::Response(ResponseError::NotFound(503))));
}

#[tokio::test]
async fn checked_fetch_fails_on_documented_error_status() {
    let client = client();
    let error = client.fetch_checked(get_request("/pets/5")).await.unwrap_err();
    assert!(matches!(error, OpenApiError::HttpStatus(404)));

    let error = client.fetch_checked(get_request("/pets/6")).await.unwrap_err();
    assert!(matches!(error, OpenApiError::HttpStatus(500)));

    let response = client.fetch_checked(get_request("/pets/1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn checked_fetch_validates_before_checking_status() {
    let error = client().fetch_checked(get_request("/pets/9")).await.unwrap_err();
    assert!(matches!(error, OpenApiError::Response(ResponseError::NotFound(503))));
}

#[tokio::test]
async fn checked_fetch_of_absolute_url_still_checks_status() {
    let error = client()
        .fetch_checked(get_request("http://pets.example/pets/9"))
        .await
        .unwrap_err();
    assert!(matches!(error, OpenApiError::HttpStatus(503)));
}

#[tokio::test]
async fn html_body_is_validated_as_text() {
    let response = client().fetch(get_request("/pages/home")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_ref(), b"<h1>Welcome</h1>");
}

#[tokio::test]
async fn undocumented_route_is_reported() {
    let error = client().fetch(get_request("/owners")).await.unwrap_err();
    assert!(matches!(error, OpenApiError::PathNotFound { .. }));
}

#[tokio::test]
async fn absolute_urls_skip_validation() {
    let response = client()
        .fetch(get_request("http://pets.example/pets/9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
