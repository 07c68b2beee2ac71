// Copyright 2023 Palantir Technologies, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Error types.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use std::error;
use std::fmt;

/// The error type returned by `upstream_runtime` operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The configuration for a named client was invalid.
    ///
    /// Raised during bootstrap and aborts container construction.
    #[error("invalid configuration for client `{name}`: {reason}")]
    Config {
        /// The logical name of the offending client.
        name: String,
        /// A description of the problem.
        reason: String,
    },

    /// No client is registered under the requested name.
    #[error("no client registered with name `{0}`")]
    NotFound(String),

    /// A typed-client description, or an invocation of one, was invalid.
    #[error("invalid typed-client description: {0}")]
    InvalidDescription(String),

    /// An error surfaced by the underlying transport, propagated unchanged.
    #[error("transport error")]
    Transport(#[source] Box<dyn error::Error + Sync + Send>),

    /// The upstream service responded with a non-2xx status.
    #[error(transparent)]
    UpstreamHttp(#[from] RemoteError),

    /// A request or response body could not be encoded or decoded.
    #[error("codec error")]
    Codec(#[source] Box<dyn error::Error + Sync + Send>),
}

impl Error {
    pub(crate) fn config<T>(name: &str, reason: T) -> Error
    where
        T: Into<String>,
    {
        Error::Config {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn transport<E>(e: E) -> Error
    where
        E: Into<Box<dyn error::Error + Sync + Send>>,
    {
        Error::Transport(e.into())
    }

    pub(crate) fn codec<E>(e: E) -> Error
    where
        E: Into<Box<dyn error::Error + Sync + Send>>,
    {
        Error::Codec(e.into())
    }
}

/// An error response received from an upstream service.
///
/// The response's status, headers, and a bounded prefix of its body are preserved so callers can report or recover
/// from the failure without the container having interpreted anything beyond the status class.
#[derive(Debug)]
pub struct RemoteError {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = if self.status.is_client_error() {
            "client error"
        } else if self.status.is_server_error() {
            "server error"
        } else {
            "error"
        };

        write!(
            fmt,
            "upstream {} {} {}",
            class,
            self.status.as_u16(),
            self.status.canonical_reason().unwrap_or("Unknown"),
        )
    }
}

impl error::Error for RemoteError {}

impl RemoteError {
    /// Returns the status code of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the canonical status text of the response, if known.
    pub fn status_text(&self) -> Option<&'static str> {
        self.status.canonical_reason()
    }

    /// Returns the headers of the response.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a prefix of the response body, capped at 10 KiB.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns `true` if the response status was in the 4xx range.
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// Returns `true` if the response status was in the 5xx range.
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }
}
