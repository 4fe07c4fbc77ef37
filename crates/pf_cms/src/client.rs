use std::time::Duration;

use crate::config::CmsConfig;
use crate::error::{CmsError, Result};
use crate::types::{BlogPost, PostList};

pub const ENDPOINT: &str = "blogs";
pub const DEFAULT_LIMIT: u32 = 100;
const API_KEY_HEADER: &str = "X-MICROCMS-API-KEY";

/// Minimal GET abstraction so the client can run against a fake in tests.
pub trait HttpTransport {
    /// Returns the status code and raw body. Transport-level failures are
    /// errors; HTTP error statuses are not.
    fn get(&self, url: &str, query: &[(String, String)], api_key: &str) -> Result<(u16, String)>;
}

pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str, query: &[(String, String)], api_key: &str) -> Result<(u16, String)> {
        let response = self
            .client
            .get(url)
            .query(query)
            .header(API_KEY_HEADER, api_key)
            .send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok((status, body))
    }
}

/// Query options understood by the list and detail endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub orders: Option<String>,
    pub q: Option<String>,
    pub fields: Option<String>,
    pub filters: Option<String>,
}

impl ListQuery {
    fn pairs(&self, default_limit: Option<u32>) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Some(limit) = self.limit.or(default_limit) {
            out.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            out.push(("offset".to_string(), offset.to_string()));
        }
        let text = [
            ("orders", &self.orders),
            ("q", &self.q),
            ("fields", &self.fields),
            ("filters", &self.filters),
        ];
        for (name, value) in text {
            if let Some(value) = value {
                out.push((name.to_string(), value.clone()));
            }
        }
        out
    }
}

pub struct CmsClient<T: HttpTransport = ReqwestTransport> {
    config: CmsConfig,
    transport: T,
}

impl CmsClient<ReqwestTransport> {
    pub fn new(config: CmsConfig) -> Result<Self> {
        Ok(Self::with_transport(config, ReqwestTransport::new()?))
    }
}

impl<T: HttpTransport> CmsClient<T> {
    pub fn with_transport(config: CmsConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &CmsConfig {
        &self.config
    }

    /// List posts. Without an explicit limit, up to 100 are returned.
    pub fn list_posts(&self, query: &ListQuery) -> Result<PostList> {
        let url = format!("{}/{ENDPOINT}", self.config.base_url);
        self.fetch(&url, &query.pairs(Some(DEFAULT_LIMIT)))
            .inspect_err(|e| log::error!("Failed to fetch blog posts: {e}"))
    }

    pub fn get_post(&self, id: &str, query: &ListQuery) -> Result<BlogPost> {
        let id = id.trim();
        if id.is_empty() || id.contains('/') {
            return Err(CmsError::InvalidArgument(format!("Invalid post id '{id}'")));
        }
        let url = format!("{}/{ENDPOINT}/{id}", self.config.base_url);
        self.fetch(&url, &query.pairs(None))
            .inspect_err(|e| log::error!("Failed to fetch blog post {id}: {e}"))
    }

    fn fetch<R: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<R> {
        log::debug!("GET {url} {query:?}");
        let (status, body) = self.transport.get(url, query, &self.config.api_key)?;
        if !(200..300).contains(&status) {
            return Err(CmsError::Status {
                status,
                url: url.to_string(),
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FakeTransport {
        status: u16,
        body: String,
        calls: RefCell<Vec<(String, Vec<(String, String)>, String)>>,
    }

    impl FakeTransport {
        fn new(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.to_string(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl HttpTransport for FakeTransport {
        fn get(
            &self,
            url: &str,
            query: &[(String, String)],
            api_key: &str,
        ) -> Result<(u16, String)> {
            self.calls
                .borrow_mut()
                .push((url.to_string(), query.to_vec(), api_key.to_string()));
            Ok((self.status, self.body.clone()))
        }
    }

    const POST: &str = r#"{"id":"p1","createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-01T00:00:00Z","title":"One","content":"x"}"#;

    fn client(status: u16, body: &str) -> CmsClient<FakeTransport> {
        CmsClient::with_transport(
            CmsConfig::new("demo", "secret"),
            FakeTransport::new(status, body),
        )
    }

    #[test]
    fn list_defaults_to_limit_100() {
        let body = format!(r#"{{"contents":[{POST}],"totalCount":1,"offset":0,"limit":100}}"#);
        let c = client(200, &body);
        let list = c.list_posts(&ListQuery::default()).expect("list");
        assert_eq!(list.contents.len(), 1);
        assert_eq!(list.contents[0].id, "p1");

        let calls = c.transport.calls.borrow();
        let (url, query, key) = &calls[0];
        assert_eq!(url, "https://demo.microcms.io/api/v1/blogs");
        assert_eq!(query, &vec![("limit".to_string(), "100".to_string())]);
        assert_eq!(key, "secret");
    }

    #[test]
    fn explicit_query_overrides_limit() {
        let body = r#"{"contents":[],"totalCount":0,"offset":20,"limit":5}"#;
        let c = client(200, body);
        let query = ListQuery {
            limit: Some(5),
            offset: Some(20),
            orders: Some("-publishedAt".to_string()),
            ..Default::default()
        };
        c.list_posts(&query).expect("list");
        let calls = c.transport.calls.borrow();
        let names: Vec<&str> = calls[0].1.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["limit", "offset", "orders"]);
        assert_eq!(calls[0].1[0].1, "5");
    }

    #[test]
    fn get_post_hits_detail_url() {
        let c = client(200, POST);
        let post = c.get_post("p1", &ListQuery::default()).expect("post");
        assert_eq!(post.title, "One");
        let calls = c.transport.calls.borrow();
        assert_eq!(calls[0].0, "https://demo.microcms.io/api/v1/blogs/p1");
        assert!(calls[0].1.is_empty(), "detail requests carry no default limit");
    }

    #[test]
    fn error_statuses_map_to_user_messages() {
        for (code, msg) in [
            (401, crate::error::MSG_UNAUTHORIZED),
            (403, crate::error::MSG_FORBIDDEN),
            (404, crate::error::MSG_NOT_FOUND),
        ] {
            let err = client(code, "{}")
                .list_posts(&ListQuery::default())
                .expect_err("error status");
            assert_eq!(err.status(), Some(code));
            assert_eq!(err.user_message(), msg);
        }
    }

    #[test]
    fn bad_id_is_rejected_without_a_request() {
        let c = client(200, POST);
        assert!(matches!(
            c.get_post(" ", &ListQuery::default()),
            Err(CmsError::InvalidArgument(_))
        ));
        assert!(c.get_post("a/b", &ListQuery::default()).is_err());
        assert!(c.transport.calls.borrow().is_empty());
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let err = client(200, "not json")
            .list_posts(&ListQuery::default())
            .expect_err("decode");
        assert!(matches!(err, CmsError::Decode(_)));
    }
}
