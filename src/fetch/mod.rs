mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Url};

/// Builds a request with no body.
pub fn empty_request(method: Method, url: &Url) -> Request {
    Request::new(method, url.clone())
}

/// Builds a request carrying `body` as `application/json`.
pub fn json_request(method: Method, url: &Url, body: &serde_json::Value) -> Request {
    let mut req = Request::new(method, url.clone());
    req.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    *req.body_mut() = Some(body.to_string().into());
    req
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_request_sets_body_and_content_type() {
        let url: Url = "http://localhost/login".parse().unwrap();
        let req = json_request(Method::POST, &url, &json!({ "username": "u" }));

        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.url().path(), "/login");
        assert_eq!(req.headers()[CONTENT_TYPE], "application/json");
        let body = req.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, br#"{"username":"u"}"#);
    }

    #[test]
    fn test_empty_request_has_no_body() {
        let url: Url = "http://localhost/sites".parse().unwrap();
        let req = empty_request(Method::GET, &url);
        assert!(req.body().is_none());
    }
}
