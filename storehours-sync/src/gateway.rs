//! Authenticated JSON calls and `Link`-header pagination on top of a
//! [`Transport`].

use serde_json::Value;

use crate::error::SyncError;
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

/// Shared request plumbing for the Origin and ITSM clients.
///
/// Every request carries the same auth headers, including requests that
/// follow a `rel="next"` link.
pub struct HttpGateway<'a> {
    transport: &'a dyn Transport,
    headers: Vec<(String, String)>,
}

/// Records accumulated by [`HttpGateway::fetch_all`].
#[derive(Debug)]
pub struct Paged {
    /// Every record from every page that was read, in server order.
    pub records: Vec<Value>,
    pub pages: usize,
    /// The error that stopped traversal early, if any.
    pub halted: Option<SyncError>,
}

impl Paged {
    pub fn is_complete(&self) -> bool {
        self.halted.is_none()
    }

    /// Strict view: any interruption is an error.
    pub fn into_result(self) -> Result<Vec<Value>, SyncError> {
        match self.halted {
            Some(err) => Err(err),
            None => Ok(self.records),
        }
    }
}

impl<'a> HttpGateway<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self {
            transport,
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    fn request(&self, method: Method, url: &str) -> HttpRequest {
        HttpRequest::new(method, url).headers(&self.headers)
    }

    /// Send and require a 2xx status.
    pub fn send(&self, request: HttpRequest) -> Result<HttpResponse, SyncError> {
        let response = self.transport.send(&request)?;
        if !response.is_success() {
            return Err(status_err(&request, &response));
        }
        Ok(response)
    }

    /// `GET url?query` and parse the body as JSON.
    pub fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, SyncError> {
        let response = self.send(self.request(Method::Get, url).query(query))?;
        parse_json(url, &response.body)
    }

    /// `POST url` with a JSON body. Returns the status alongside the parsed body
    /// so callers can distinguish 200 from other 2xx answers.
    pub fn post_json(&self, url: &str, body: Value) -> Result<(u16, Value), SyncError> {
        let response = self.send(self.request(Method::Post, url).json(body))?;
        let parsed = if response.body.trim().is_empty() {
            Value::Null
        } else {
            parse_json(url, &response.body)?
        };
        Ok((response.status, parsed))
    }

    /// `PATCH url` with a JSON body; only 200 and 201 count as success.
    pub fn patch_json(&self, url: &str, body: Value) -> Result<Value, SyncError> {
        let request = self.request(Method::Patch, url).json(body);
        let response = self.transport.send(&request)?;
        if !matches!(response.status, 200 | 201) {
            return Err(status_err(&request, &response));
        }
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        parse_json(url, &response.body)
    }

    /// Follow `rel="next"` links from `url` until a page has none.
    ///
    /// Query parameters are sent with the first request only; next links
    /// already carry them. Each page must be a JSON array. A failing page stops
    /// traversal and is reported in [`Paged::halted`] alongside the records
    /// gathered so far.
    pub fn fetch_all(&self, url: &str, query: &[(String, String)]) -> Paged {
        let mut paged = Paged {
            records: Vec::new(),
            pages: 0,
            halted: None,
        };
        let mut next = Some(url.to_string());
        let mut first = true;

        while let Some(page_url) = next.take() {
            let mut request = self.request(Method::Get, &page_url);
            if first {
                request = request.query(query);
                first = false;
            }

            let page = self
                .send(request)
                .and_then(|response| read_page(&page_url, response));
            match page {
                Ok((records, link)) => {
                    paged.pages += 1;
                    tracing::debug!("page {} of {url}: {} records", paged.pages, records.len());
                    paged.records.extend(records);
                    next = link.and_then(|l| next_link(&l)).map(|l| resolve(&page_url, &l));
                }
                Err(err) => {
                    paged.halted = Some(err);
                }
            }
        }

        paged
    }
}

fn read_page(url: &str, response: HttpResponse) -> Result<(Vec<Value>, Option<String>), SyncError> {
    match parse_json(url, &response.body)? {
        Value::Array(records) => Ok((records, response.link)),
        other => Err(SyncError::Shape {
            url: url.to_string(),
            message: format!("expected a JSON array page, got {}", kind(&other)),
        }),
    }
}

fn parse_json(url: &str, body: &str) -> Result<Value, SyncError> {
    serde_json::from_str(body).map_err(|source| SyncError::Json {
        url: url.to_string(),
        source,
    })
}

fn status_err(request: &HttpRequest, response: &HttpResponse) -> SyncError {
    SyncError::Status {
        method: request.method.as_str(),
        url: request.url.clone(),
        status: response.status,
        body: response.body.trim().to_string(),
    }
}

pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Extract the `rel="next"` target from an RFC 8288 `Link` header value.
///
/// ```
/// use storehours_sync::gateway::next_link;
///
/// let header = r#"<https://api.4me.com/v1/organizations?page=2>; rel="next", <https://api.4me.com/v1/organizations?page=9>; rel="last""#;
/// assert_eq!(
///     next_link(header).as_deref(),
///     Some("https://api.4me.com/v1/organizations?page=2")
/// );
/// ```
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let target = target.strip_prefix('<')?.strip_suffix('>')?;
        let is_next = parts.any(|param| {
            let Some((name, value)) = param.split_once('=') else {
                return false;
            };
            name.trim().eq_ignore_ascii_case("rel")
                && value
                    .trim()
                    .trim_matches('"')
                    .split_whitespace()
                    .any(|rel| rel.eq_ignore_ascii_case("next"))
        });
        is_next.then(|| target.to_string())
    })
}

/// Resolve a root-relative link against the scheme and host of `base`.
fn resolve(base: &str, link: &str) -> String {
    if !link.starts_with('/') {
        return link.to_string();
    }
    let Some(scheme_end) = base.find("://") else {
        return link.to_string();
    };
    let host_start = scheme_end + 3;
    let host_end = base[host_start..]
        .find('/')
        .map_or(base.len(), |i| host_start + i);
    format!("{}{link}", &base[..host_end])
}
