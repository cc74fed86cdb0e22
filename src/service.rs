use crate::middleware::{AuthUser, MiddlewareConfig, RequestBody, RequestInfo, RequestLogger, ResponseInfo};
use http::{HeaderMap, Request, Response};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Layer that logs one record per request once the inner service's
/// response is ready.
///
/// ```rust,ignore
/// let service = tower::ServiceBuilder::new()
///     .layer(RequestLogLayer::new(MiddlewareConfig::default()))
///     .service(app);
/// ```
#[derive(Debug, Clone)]
pub struct RequestLogLayer {
    logger: RequestLogger,
}

impl RequestLogLayer {
    pub fn new(config: MiddlewareConfig) -> Self {
        Self {
            logger: RequestLogger::new(config),
        }
    }

    pub fn from_logger(logger: RequestLogger) -> Self {
        Self { logger }
    }
}

impl<S> Layer<S> for RequestLogLayer {
    type Service = RequestLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogService {
            inner,
            logger: self.logger.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestLogService<S> {
    inner: S,
    logger: RequestLogger,
}

impl<S, B, R> Service<Request<B>> for RequestLogService<S>
where
    S: Service<Request<B>, Response = Response<R>>,
    S::Future: Send + 'static,
    S::Error: 'static,
    R: 'static,
{
    type Response = Response<R>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<R>, S::Error>> + Send + 'static>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        let pending = self.logger.start(request_info(&request));
        let response = self.inner.call(request);

        Box::pin(async move {
            // An inner error ends the request without a record.
            let response = response.await?;
            if let Some(pending) = pending {
                pending.finish(response_info(&response));
            }
            Ok(response)
        })
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn request_info<B>(request: &Request<B>) -> RequestInfo {
    let headers = request.headers();
    let uri = request.uri();
    let extensions = request.extensions();

    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let protocol = header(headers, "x-forwarded-proto")
        .or_else(|| uri.scheme_str().map(str::to_string))
        .unwrap_or_else(|| "http".to_string());

    RequestInfo {
        method: request.method().as_str().to_string(),
        path,
        url: Some(uri.to_string()),
        request_length: header(headers, "content-length"),
        referer: header(headers, "referer"),
        remote_ip: header(headers, "x-forwarded-for"),
        server_ip: extensions.get::<SocketAddr>().map(|addr| addr.ip().to_string()),
        protocol: Some(protocol),
        user_agent: header(headers, "user-agent"),
        user_id: extensions.get::<AuthUser>().map(|user| user.0.clone()),
        body: extensions.get::<RequestBody>().map(|body| body.0.clone()),
    }
}

fn response_info<R>(response: &Response<R>) -> ResponseInfo {
    let extensions = response.extensions();
    ResponseInfo {
        status: response.status().as_u16(),
        response_length: header(response.headers(), "content-length"),
        user_id: extensions.get::<AuthUser>().map(|user| user.0.clone()),
        body: extensions.get::<RequestBody>().map(|body| body.0.clone()),
    }
}
