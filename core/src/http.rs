//! HTTP verbs and plain-data request/response types.
//!
//! # Design
//! `HttpClient` splits every call into a pure `build_request` step, a blocking
//! round-trip, and a pure `parse_response` step. The two data types below are
//! the values exchanged across that split, so URL joining and error
//! classification can be tested without a network.

use std::fmt;
use std::str::FromStr;

/// One of the four verbs the adapter wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Get, Method::Post, Method::Put, Method::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Whether the payload travels as a JSON body rather than a query string.
    pub fn sends_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a verb name does not match any [`Method`]. Carries the
/// rejected name, upper-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            _ => Err(UnknownMethod(upper)),
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_verbs_case_insensitively() {
        assert_eq!("get".parse::<Method>(), Ok(Method::Get));
        assert_eq!(" Delete ".parse::<Method>(), Ok(Method::Delete));
        for method in Method::ALL {
            assert_eq!(method.as_str().parse::<Method>(), Ok(method));
        }
    }

    #[test]
    fn unknown_verb_keeps_its_name() {
        let err = "patch".parse::<Method>().unwrap_err();
        assert_eq!(err, UnknownMethod("PATCH".to_string()));
    }

    #[test]
    fn only_post_and_put_send_bodies() {
        assert!(!Method::Get.sends_body());
        assert!(Method::Post.sends_body());
        assert!(Method::Put.sends_body());
        assert!(!Method::Delete.sends_body());
    }
}
