//! Ordered request/response/error transforms.
//!
//! Each interceptor takes its input by value and returns the replacement; the
//! lists are folded in registration order.

use std::sync::Arc;

use crate::envelope::ResponseEnvelope;
use crate::errors::AppError;
use crate::request::RequestDescriptor;

pub type RequestInterceptor = Arc<dyn Fn(RequestDescriptor) -> RequestDescriptor + Send + Sync>;
pub type ResponseInterceptor = Arc<dyn Fn(ResponseEnvelope) -> ResponseEnvelope + Send + Sync>;
pub type ErrorInterceptor = Arc<dyn Fn(AppError) -> AppError + Send + Sync>;

#[derive(Clone, Default)]
pub struct Interceptors {
    request: Vec<RequestInterceptor>,
    response: Vec<ResponseInterceptor>,
    error: Vec<ErrorInterceptor>,
}

impl Interceptors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_request<F>(mut self, f: F) -> Self
    where
        F: Fn(RequestDescriptor) -> RequestDescriptor + Send + Sync + 'static,
    {
        self.request.push(Arc::new(f));
        self
    }

    pub fn on_response<F>(mut self, f: F) -> Self
    where
        F: Fn(ResponseEnvelope) -> ResponseEnvelope + Send + Sync + 'static,
    {
        self.response.push(Arc::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(AppError) -> AppError + Send + Sync + 'static,
    {
        self.error.push(Arc::new(f));
        self
    }

    pub fn apply_request(&self, descriptor: RequestDescriptor) -> RequestDescriptor {
        self.request.iter().fold(descriptor, |acc, f| f(acc))
    }

    pub fn apply_response(&self, envelope: ResponseEnvelope) -> ResponseEnvelope {
        self.response.iter().fold(envelope, |acc, f| f(acc))
    }

    pub fn apply_error(&self, error: AppError) -> AppError {
        self.error.iter().fold(error, |acc, f| f(acc))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::Method;

    use super::*;
    use crate::errors::ErrorKind;
    use crate::request::{RequestBody, RequestOptions};

    #[test]
    fn request_interceptors_run_in_order() {
        let interceptors = Interceptors::new()
            .on_request(|mut d| {
                d.headers.push(("X-Step".into(), "one".into()));
                d
            })
            .on_request(|mut d| {
                let seen = d.headers.len().to_string();
                d.headers.push(("X-Seen".into(), seen));
                d
            });
        let original = RequestDescriptor::new(
            Method::GET,
            "/quizzes/",
            RequestBody::Empty,
            RequestOptions::default(),
            Duration::from_secs(1),
        );
        let out = interceptors.apply_request(original.clone());
        assert_eq!(
            out.headers,
            vec![
                ("X-Step".to_string(), "one".to_string()),
                ("X-Seen".to_string(), "1".to_string())
            ]
        );
        assert!(original.headers.is_empty());
    }

    #[test]
    fn error_interceptors_fold() {
        let interceptors = Interceptors::new()
            .on_error(|mut e| {
                e.user_message = format!("[{}] {}", e.kind, e.user_message);
                e
            })
            .on_error(|mut e| {
                e.user_message.push('!');
                e
            });
        let out = interceptors.apply_error(AppError::new(ErrorKind::NotFound, "gone"));
        assert_eq!(out.user_message, "[not_found] gone!");
    }
}
