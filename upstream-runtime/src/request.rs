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
use crate::raw::{DefaultRawClient, RawBody, Service};
use crate::{Client, Response, APPLICATION_JSON};
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use http::Method;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error;
use url::form_urlencoded;

/// A builder for an asynchronous HTTP request.
pub struct RequestBuilder<'a, T = DefaultRawClient> {
    pub(crate) client: &'a Client<T>,
    pub(crate) request: Request<'a>,
}

impl<'a, T> RequestBuilder<'a, T> {
    pub(crate) fn new(client: &'a Client<T>, method: Method, pattern: &'a str) -> RequestBuilder<'a, T> {
        RequestBuilder {
            client,
            request: Request::new(method, pattern),
        }
    }

    /// Returns a mutable reference to the headers of this request.
    ///
    /// The client's default headers apply only to names not set here, and the `Authorization` header set by the
    /// client's authentication scheme (if any) replaces one set here.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.request.headers
    }

    /// Appends a header to this request.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> RequestBuilder<'a, T> {
        self.request.headers.append(name, value);
        self
    }

    /// Sets the `Authorization` request header to a bearer token.
    ///
    /// This is a simple convenience wrapper; it is overridden by the client's configured authentication scheme, if
    /// any.
    ///
    /// # Panics
    ///
    /// Panics if the token is not a valid header value.
    pub fn bearer_token(mut self, token: &str) -> RequestBuilder<'a, T> {
        let value = format!("Bearer {token}");
        let mut value =
            HeaderValue::try_from(value).expect("token is not a valid header value");
        value.set_sensitive(true);
        self.request.headers.insert(AUTHORIZATION, value);
        self
    }

    /// Adds a parameter.
    ///
    /// Parameters which match names in the path pattern will be treated as
    /// path parameters, and other parameters will be treated as query
    /// parameters. Only one instance of path parameters may be provided, but
    /// multiple instances of query parameters may be provided.
    #[allow(clippy::needless_pass_by_value)] // we intentionally take T by value here
    pub fn param<V>(mut self, name: &str, value: V) -> RequestBuilder<'a, T>
    where
        V: ToString,
    {
        self.request.param(name, value);
        self
    }

    /// Overrides the client's default API version for this request.
    ///
    /// Has no effect on clients without API versioning configured.
    pub fn api_version(mut self, version: &str) -> RequestBuilder<'a, T> {
        self.request.api_version = Some(version.to_string());
        self
    }

    /// Sets the request body.
    pub fn body<B>(mut self, content_type: HeaderValue, body: B) -> RequestBuilder<'a, T>
    where
        B: Into<Bytes>,
    {
        self.request.body = Some((content_type, body.into()));
        self
    }

    /// Serializes a value as the JSON request body, setting the `Content-Type` to `application/json`.
    pub fn json<U>(self, value: &U) -> Result<RequestBuilder<'a, T>, Error>
    where
        U: Serialize,
    {
        let body = serde_json::to_vec(value).map_err(Error::codec)?;
        Ok(self.body(APPLICATION_JSON.clone(), body))
    }
}

impl<'a, T, B> RequestBuilder<'a, T>
where
    T: Service<http::Request<RawBody>, Response = http::Response<B>> + 'static + Sync + Send,
    T::Error: Into<Box<dyn error::Error + Sync + Send>>,
    B: http_body::Body<Data = Bytes> + 'static + Send,
    B::Error: Into<Box<dyn error::Error + Sync + Send>>,
{
    /// Makes the request.
    pub async fn send(self) -> Result<Response<B>, Error> {
        self.client.send(self.request).await
    }
}

pub(crate) struct Request<'a> {
    pub(crate) method: Method,
    pub(crate) pattern: &'a str,
    pub(crate) params: BTreeMap<String, Vec<String>>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<(HeaderValue, Bytes)>,
    pub(crate) api_version: Option<String>,
}

impl<'a> Request<'a> {
    pub(crate) fn new(method: Method, pattern: &'a str) -> Request<'a> {
        Request {
            method,
            pattern,
            params: BTreeMap::new(),
            headers: HeaderMap::new(),
            body: None,
            api_version: None,
        }
    }

    #[allow(clippy::needless_pass_by_value)] // we intentionally take T by value here
    pub(crate) fn param<V>(&mut self, name: &str, value: V)
    where
        V: ToString,
    {
        self.params
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
    }

    /// Resolves the pattern and parameters into an origin-form URI.
    ///
    /// Parameters matching a `{name}` segment of the pattern fill that segment; the rest become query parameters,
    /// ordered by name.
    pub(crate) fn build_uri(&self) -> String {
        let mut params = self.params.clone();

        assert!(
            self.pattern.starts_with('/'),
            "pattern must start with `/`"
        );
        let mut uri = String::new();
        // make sure to skip the leading `/` to avoid an empty path segment
        for segment in self.pattern[1..].split('/') {
            match parse_param(segment) {
                Some(name) => match params.remove(name) {
                    Some(ref values) if values.len() != 1 => {
                        panic!("path segment parameter {} had multiple values", name);
                    }
                    Some(value) => {
                        uri.push('/');
                        uri.extend(form_urlencoded::byte_serialize(value[0].as_bytes()));
                    }
                    None => panic!("path segment parameter {} had no values", name),
                },
                None => {
                    uri.push('/');
                    uri.push_str(segment);
                }
            }
        }

        let mut query = form_urlencoded::Serializer::new(String::new());
        let mut has_query = false;
        for (name, values) in &params {
            for value in values {
                query.append_pair(name, value);
                has_query = true;
            }
        }
        if has_query {
            uri.push('?');
            uri.push_str(&query.finish());
        }

        uri
    }
}

fn parse_param(segment: &str) -> Option<&str> {
    if segment.starts_with('{') && segment.ends_with('}') {
        Some(&segment[1..segment.len() - 1])
    } else {
        None
    }
}
