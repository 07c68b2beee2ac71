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
use crate::builder;
use crate::errors::Error;
use crate::raw::{BuildRawClient, DefaultRawClient, RawBody, Service};
use crate::request::{Request, RequestBuilder};
use crate::response::Response;
use crate::service::api_version::{ApiVersionLayer, ApiVersionOverride};
use crate::service::auth::AuthLayer;
use crate::service::base_uri::BaseUriLayer;
use crate::service::default_headers::DefaultHeadersLayer;
use crate::service::http_error::HttpErrorLayer;
use crate::service::map_error::MapErrorLayer;
use crate::service::{Identity, Layer, ServiceBuilder, Stack};
use crate::Builder;
use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST};
use http::Method;
use std::error;
use std::sync::Arc;

macro_rules! layers {
    () => { Identity };
    ($layer:ty, $($rem:tt)*) => { Stack<$layer, layers!($($rem)*)> };
}

// Per-request middleware executes top to bottom: default headers are applied before the api version is inserted,
// which happens before authentication, so interceptor-added values win on collision.
type BaseLayer = layers!(
    HttpErrorLayer,
    BaseUriLayer,
    DefaultHeadersLayer,
    ApiVersionLayer,
    AuthLayer,
    MapErrorLayer,
);

type BaseService<T> = <BaseLayer as Layer<T>>::Service;

pub(crate) struct ClientState<T> {
    service: BaseService<T>,
}

impl<T> ClientState<T> {
    pub(crate) fn new<U>(builder: &Builder<builder::Complete<U>>) -> Result<ClientState<T>, Error>
    where
        U: BuildRawClient<RawClient = T>,
    {
        let client = builder.get_raw_client_builder().build_raw_client(builder)?;

        let service = ServiceBuilder::new()
            .layer(HttpErrorLayer::new(builder))
            .layer(BaseUriLayer::new(builder))
            .layer(DefaultHeadersLayer::new(builder))
            .layer(ApiVersionLayer::new(builder)?)
            .layer(AuthLayer::new(builder)?)
            .layer(MapErrorLayer)
            .service(client);

        Ok(ClientState { service })
    }
}

/// An asynchronous HTTP client bound to one named upstream service.
///
/// Clients are constructed by a [`Builder`], commonly one prepared by a container, and are cheap to clone and safe
/// for concurrent use.
pub struct Client<T = DefaultRawClient> {
    name: Arc<str>,
    state: Arc<ClientState<T>>,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Client {
            name: self.name.clone(),
            state: self.state.clone(),
        }
    }
}

impl Client {
    /// Creates a new `Builder` for clients.
    #[inline]
    pub fn builder() -> Builder<builder::NameStage> {
        Builder::new()
    }
}

impl<T> Client<T> {
    pub(crate) fn new(name: &str, state: ClientState<T>) -> Client<T> {
        Client {
            name: name.into(),
            state: Arc::new(state),
        }
    }

    /// Returns the logical name of the upstream service this client talks to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a new request builder.
    ///
    /// The `pattern` argument is the request path, which may contain `{name}` placeholders filled by
    /// [`RequestBuilder::param`].
    pub fn request<'a>(&'a self, method: Method, pattern: &'a str) -> RequestBuilder<'a, T> {
        RequestBuilder::new(self, method, pattern)
    }

    /// Returns a new builder for a `GET` request.
    pub fn get<'a>(&'a self, pattern: &'a str) -> RequestBuilder<'a, T> {
        self.request(Method::GET, pattern)
    }

    /// Returns a new builder for a `POST` request.
    pub fn post<'a>(&'a self, pattern: &'a str) -> RequestBuilder<'a, T> {
        self.request(Method::POST, pattern)
    }

    /// Returns a new builder for a `PUT` request.
    pub fn put<'a>(&'a self, pattern: &'a str) -> RequestBuilder<'a, T> {
        self.request(Method::PUT, pattern)
    }

    /// Returns a new builder for a `DELETE` request.
    pub fn delete<'a>(&'a self, pattern: &'a str) -> RequestBuilder<'a, T> {
        self.request(Method::DELETE, pattern)
    }

    /// Returns a new builder for a `PATCH` request.
    pub fn patch<'a>(&'a self, pattern: &'a str) -> RequestBuilder<'a, T> {
        self.request(Method::PATCH, pattern)
    }

    /// Returns a new builder for a `HEAD` request.
    pub fn head<'a>(&'a self, pattern: &'a str) -> RequestBuilder<'a, T> {
        self.request(Method::HEAD, pattern)
    }
}

impl<T, B> Client<T>
where
    T: Service<http::Request<RawBody>, Response = http::Response<B>> + 'static + Sync + Send,
    T::Error: Into<Box<dyn error::Error + Sync + Send>>,
    B: http_body::Body<Data = Bytes> + 'static + Send,
    B::Error: Into<Box<dyn error::Error + Sync + Send>>,
{
    pub(crate) async fn send(&self, request: Request<'_>) -> Result<Response<B>, Error> {
        let uri = request.build_uri();

        let mut headers = request.headers;
        headers.remove(HOST);
        headers.remove(CONTENT_LENGTH);

        let body = match &request.body {
            Some((content_type, bytes)) => {
                headers.insert(CONTENT_TYPE, content_type.clone());
                RawBody::new(bytes.clone())
            }
            None => RawBody::new(Bytes::new()),
        };

        let mut req = http::Request::new(body);
        *req.method_mut() = request.method;
        *req.uri_mut() = uri.parse().unwrap();
        *req.headers_mut() = headers;
        if let Some(version) = request.api_version {
            req.extensions_mut().insert(ApiVersionOverride(version));
        }

        let response = self.state.service.call(req).await?;

        Ok(Response::new(response))
    }
}
