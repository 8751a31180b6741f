//! HTTP/1.1 request parsing using the [`httparse`] crate.

use bytes::Bytes;
use thiserror::Error;

use super::{Headers, Method};

/// Errors that can occur while parsing an HTTP/1.1 request head.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request is incomplete, more data needed")]
    Incomplete,

    #[error("HTTP parse error: {0}")]
    Parse(#[from] httparse::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid Content-Length header: {value:?}")]
    InvalidContentLength { value: String },

    #[error("unsupported Transfer-Encoding: {value:?}")]
    UnsupportedTransferEncoding { value: String },

    #[error("request exceeds maximum allowed size of {max_bytes} bytes")]
    TooLarge { max_bytes: usize },
}

/// A parsed HTTP/1.1 request.
///
/// [`Request::parse`] reads the request head only; the server attaches the
/// body with [`Request::set_body`] once `Content-Length` bytes have arrived.
///
/// # Examples
///
/// ```
/// use coinproxy::http::Request;
///
/// let raw = b"POST /top-coins?x=1 HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\n\r\n";
/// let (request, offset) = Request::parse(raw).unwrap();
///
/// assert_eq!(request.method().as_str(), "POST");
/// assert_eq!(request.path(), "/top-coins");
/// assert_eq!(request.content_length().unwrap(), 0);
/// assert_eq!(offset, raw.len());
/// ```
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    /// HTTP minor version: 0 for HTTP/1.0, 1 for HTTP/1.1.
    version: u8,
    headers: Headers,
    body: Bytes,
}

impl Request {
    const MAX_HEADERS: usize = 64;

    /// Parses a request head from a byte slice.
    ///
    /// Returns the `Request` (with an empty body) and the byte offset at which
    /// the body begins in `buf`.
    ///
    /// # Errors
    ///
    /// - [`RequestError::Incomplete`] if the head has not fully arrived.
    /// - [`RequestError::Parse`] if the data is malformed.
    /// - [`RequestError::MissingField`] if method, path, or version is absent.
    pub fn parse(buf: &[u8]) -> Result<(Self, usize), RequestError> {
        let mut headers = [httparse::EMPTY_HEADER; Self::MAX_HEADERS];
        let mut raw_req = httparse::Request::new(&mut headers);

        let body_offset = match raw_req.parse(buf)? {
            httparse::Status::Complete(offset) => offset,
            httparse::Status::Partial => return Err(RequestError::Incomplete),
        };

        let method: Method = match raw_req
            .method
            .ok_or(RequestError::MissingField { field: "method" })?
            .parse()
        {
            Ok(method) => method,
            Err(never) => match never {},
        };

        let raw_path = raw_req
            .path
            .ok_or(RequestError::MissingField { field: "path" })?;
        // Query strings carry nothing for these endpoints.
        let path = raw_path
            .split_once('?')
            .map_or(raw_path, |(path, _)| path)
            .to_owned();

        let version = raw_req
            .version
            .ok_or(RequestError::MissingField { field: "version" })?;

        let mut header_map = Headers::with_capacity(raw_req.headers.len());
        for header in raw_req.headers.iter() {
            if let Ok(value) = std::str::from_utf8(header.value) {
                header_map.insert(header.name, value);
            }
        }

        Ok((
            Self {
                method,
                path,
                version,
                headers: header_map,
                body: Bytes::new(),
            },
            body_offset,
        ))
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path (without the query string).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the request body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Attaches the request body.
    pub fn set_body(&mut self, body: Bytes) {
        self.body = body;
    }

    /// Returns `true` if the connection should be kept alive after this request.
    ///
    /// HTTP/1.1 defaults to keep-alive. HTTP/1.0 defaults to close unless
    /// `Connection: keep-alive` is explicitly set.
    pub fn is_keep_alive(&self) -> bool {
        match self.headers.get("connection") {
            Some(conn) => conn.eq_ignore_ascii_case("keep-alive"),
            None => self.version == 1,
        }
    }

    /// Returns the declared body length, `0` when no `Content-Length` is sent.
    ///
    /// # Errors
    ///
    /// [`RequestError::InvalidContentLength`] for a non-numeric value and
    /// [`RequestError::UnsupportedTransferEncoding`] when the body is framed
    /// with `Transfer-Encoding`, which this server does not decode.
    pub fn content_length(&self) -> Result<usize, RequestError> {
        if let Some(te) = self.headers.get("transfer-encoding") {
            return Err(RequestError::UnsupportedTransferEncoding {
                value: te.to_owned(),
            });
        }
        match self.headers.get("content-length") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| RequestError::InvalidContentLength {
                    value: raw.to_owned(),
                }),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_post() {
        let raw = b"POST /get-balances HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let (req, offset) = Request::parse(raw).unwrap();
        assert_eq!(req.method(), &Method::Post);
        assert_eq!(req.path(), "/get-balances");
        assert_eq!(req.headers().get("host"), Some("localhost"));
        assert!(req.body().is_empty());
        assert_eq!(offset, raw.len());
    }

    #[test]
    fn query_string_is_dropped_from_path() {
        let raw = b"POST /top-coins?cachebust=1 HTTP/1.1\r\nHost: x\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.path(), "/top-coins");
    }

    #[test]
    fn incomplete_request() {
        let raw = b"POST / HTTP/1.1\r\nHost:";
        assert!(matches!(Request::parse(raw), Err(RequestError::Incomplete)));
    }

    #[test]
    fn keep_alive_defaults() {
        let (req, _) = Request::parse(b"GET / HTTP/1.1\r\nHost: a\r\n\r\n").unwrap();
        assert!(req.is_keep_alive());

        let (req, _) = Request::parse(b"GET / HTTP/1.0\r\nHost: a\r\n\r\n").unwrap();
        assert!(!req.is_keep_alive());

        let (req, _) =
            Request::parse(b"GET / HTTP/1.1\r\nHost: a\r\nConnection: close\r\n\r\n").unwrap();
        assert!(!req.is_keep_alive());
    }

    #[test]
    fn content_length_and_body_offset() {
        let raw = b"POST / HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello";
        let (req, body_offset) = Request::parse(raw).unwrap();
        assert_eq!(req.content_length().unwrap(), 5);
        assert_eq!(&raw[body_offset..], b"hello");
    }

    #[test]
    fn bad_content_length_is_rejected() {
        let raw = b"POST / HTTP/1.1\r\nContent-Length: lots\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert!(matches!(
            req.content_length(),
            Err(RequestError::InvalidContentLength { .. })
        ));
    }

    #[test]
    fn chunked_body_is_rejected() {
        let raw = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert!(matches!(
            req.content_length(),
            Err(RequestError::UnsupportedTransferEncoding { .. })
        ));
    }
}
