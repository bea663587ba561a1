//! Endpoint descriptors
//!
//! One side of a copy, parsed from a single command-line token.

use crate::fs::AdaptorKind;
use serde::Serialize;
use std::fmt;

/// Token that selects standard input (as source) or standard output (as target)
pub const STREAM_MARKER: &str = "-";

/// Source or target of a copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointSpec {
    /// Adaptor serving this endpoint
    pub adaptor: AdaptorKind,
    /// Location, `None` means the adaptor default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Path text, kept verbatim
    pub path: String,
    /// Endpoint is a standard stream
    pub stream: bool,
}

impl EndpointSpec {
    /// Parse a `[adaptor:][location:]path` token, or `-`.
    ///
    /// A token without an adaptor prefix inherits `adaptor` and `location`
    /// from the command line. With a prefix, the rest of the token is split
    /// at its last `:` into location and path; a prefix naming the command's
    /// own adaptor without a location still inherits `location`.
    pub fn parse(token: &str, adaptor: AdaptorKind, location: Option<&str>) -> Self {
        if token == STREAM_MARKER {
            return Self {
                adaptor,
                location: location.map(str::to_string),
                path: STREAM_MARKER.to_string(),
                stream: true,
            };
        }

        let prefixed = token
            .split_once(':')
            .and_then(|(head, rest)| AdaptorKind::from_name(head).map(|kind| (kind, rest)));

        let (adaptor, location, path) = match prefixed {
            Some((kind, rest)) => match rest.rsplit_once(':') {
                Some((loc, path)) => {
                    let loc = (!loc.is_empty()).then(|| loc.to_string());
                    (kind, loc, path.to_string())
                }
                None if kind == adaptor => (kind, location.map(str::to_string), rest.to_string()),
                None => (kind, None, rest.to_string()),
            },
            None => (adaptor, location.map(str::to_string), token.to_string()),
        };

        Self {
            adaptor,
            location,
            stream: path == STREAM_MARKER,
            path,
        }
    }

    /// Location for messages: the location, or the adaptor name when absent
    pub fn location_label(&self) -> &str {
        self.location.as_deref().unwrap_or(self.adaptor.name())
    }
}

impl fmt::Display for EndpointSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stream {
            return f.write_str(STREAM_MARKER);
        }
        match &self.location {
            Some(location) => write!(f, "{}:{}:{}", self.adaptor, location, self.path),
            None => write!(f, "{}:{}", self.adaptor, self.path),
        }
    }
}
