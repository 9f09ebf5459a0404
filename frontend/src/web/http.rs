//! 浏览器 HTTP 传输层
//!
//! 基于 `gloo-net` 的 fetch 封装，实现共享核心的 `HttpClient`。
//! 这里只负责收发字节，鉴权、缓存与错误映射都在 `ApiClient` 中。

use gloo_net::http::{Request, RequestBuilder};
use linkgate_shared::ApiError;
use linkgate_shared::error::ApiResult;
use linkgate_shared::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};

#[derive(Clone, Copy, Default)]
pub struct FetchClient;

impl FetchClient {
    fn builder(req: &HttpRequest) -> RequestBuilder {
        let mut builder = match req.method {
            HttpMethod::Get => Request::get(&req.url),
            HttpMethod::Post => Request::post(&req.url),
            HttpMethod::Put => Request::put(&req.url),
            HttpMethod::Delete => Request::delete(&req.url),
        };
        for (key, value) in &req.headers {
            builder = builder.header(key, value);
        }
        builder
    }
}

#[async_trait::async_trait(?Send)]
impl HttpClient for FetchClient {
    async fn send(&self, req: HttpRequest) -> ApiResult<HttpResponse> {
        let builder = Self::builder(&req);
        let request = match req.body {
            Some(body) => builder.body(body),
            None => builder.build(),
        }
        .map_err(|e| ApiError::network(format!("Failed to build request: {}", e)))?;

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::network(format!("Network error: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::network(format!("Failed to read response: {}", e)))?;

        Ok(HttpResponse { status, body })
    }
}
