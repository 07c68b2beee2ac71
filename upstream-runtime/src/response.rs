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
use crate::errors::Error;
use crate::raw::DefaultRawBody;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use http_body::Body;
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use std::error;

/// An asynchronous HTTP response.
pub struct Response<B = DefaultRawBody> {
    status: StatusCode,
    headers: HeaderMap,
    body: B,
}

impl<B> Response<B> {
    pub(crate) fn new(response: http::Response<B>) -> Response<B> {
        let (parts, body) = response.into_parts();

        Response {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Returns the response's status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the response's headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Consumes the response, returning its body.
    pub fn into_body(self) -> B {
        self.body
    }
}

impl<B> Response<B>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn error::Error + Sync + Send>>,
{
    /// Consumes the response, collecting its body into memory.
    pub async fn bytes(self) -> Result<Bytes, Error> {
        self.body
            .collect()
            .await
            .map(|body| body.to_bytes())
            .map_err(Error::transport)
    }

    /// Consumes the response, collecting its body into a UTF-8 string.
    pub async fn text(self) -> Result<String, Error> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes.into()).map_err(Error::codec)
    }

    /// Consumes the response, deserializing its body as JSON.
    pub async fn json<T>(self) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(Error::codec)
    }
}
