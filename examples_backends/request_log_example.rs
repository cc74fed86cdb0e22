use std::convert::Infallible;

use cloudlog::{
    init, AuthUser, MiddlewareConfig, RecordParams, RequestBody, RequestLogLayer, RouteRule,
};
use http::{Request, Response, StatusCode};
use serde_json::json;
use tower::{service_fn, Layer, ServiceExt};

async fn handler(request: Request<String>) -> Result<Response<String>, Infallible> {
    let status = if request.uri().path() == "/login" {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::OK
    };
    let body = "done".to_string();
    let mut response = Response::builder()
        .status(status)
        .header("content-length", body.len().to_string())
        .body(body)
        .unwrap_or_default();
    response.extensions_mut().insert(AuthUser("user-1".into()));
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init::use_cloud(None);

    let config = MiddlewareConfig::default()
        .disallow("creditCard")
        .record_params(RecordParams::Routes(vec![RouteRule::new("/login").method("POST")]));
    let layer = RequestLogLayer::new(config);

    let mut login = Request::builder()
        .method("POST")
        .uri("/login?next=%2Fhome")
        .header("user-agent", "demo/1.0")
        .body(String::new())?;
    login
        .extensions_mut()
        .insert(RequestBody(json!({"user": "joe", "password": "hunter2", "creditCard": "4111"})));
    layer.layer(service_fn(handler)).oneshot(login).await?;

    let probe = Request::builder()
        .uri("/healthz")
        .header("user-agent", "kube-probe/1.26")
        .body(String::new())?;
    // Health checks produce no record.
    layer.layer(service_fn(handler)).oneshot(probe).await?;

    Ok(())
}
