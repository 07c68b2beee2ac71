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
//! The client builder.
use crate::auth::{AuthorizedClientManager, ResolvePrincipal};
use crate::client::ClientState;
use crate::config::{ApiVersionConfig, ClientConfig};
use crate::errors::Error;
use crate::raw::{BuildRawClient, DefaultRawClientBuilder};
use crate::Client;
use http::header::{HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A builder to construct [`Client`]s.
///
/// Builders handed out by a container are fully configured from that client's settings; customizations made to one
/// builder are invisible to the container's prebuilt client and to every other builder.
pub struct Builder<T = Complete>(T);

/// The name builder stage.
pub struct NameStage(());

/// The complete builder stage.
pub struct Complete<T = DefaultRawClientBuilder> {
    name: String,
    base_url: Option<Url>,
    default_headers: Vec<(HeaderName, HeaderValue)>,
    connect_timeout: Duration,
    read_timeout: Duration,
    api_version: Option<ApiVersionConfig>,
    auth: AuthScheme,
    upstream_errors: UpstreamErrors,
    authorized_client_manager: Option<Arc<dyn AuthorizedClientManager>>,
    principal_resolver: Option<Arc<dyn ResolvePrincipal>>,
    raw_client_builder: T,
}

impl<T> Clone for Complete<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Complete {
            name: self.name.clone(),
            base_url: self.base_url.clone(),
            default_headers: self.default_headers.clone(),
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
            api_version: self.api_version.clone(),
            auth: self.auth.clone(),
            upstream_errors: self.upstream_errors,
            authorized_client_manager: self.authorized_client_manager.clone(),
            principal_resolver: self.principal_resolver.clone(),
            raw_client_builder: self.raw_client_builder.clone(),
        }
    }
}

impl<T> Clone for Builder<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Builder(self.0.clone())
    }
}

impl Default for Builder<NameStage> {
    #[inline]
    fn default() -> Self {
        Builder::new()
    }
}

impl Builder<NameStage> {
    /// Creates a new builder with default settings.
    #[inline]
    pub fn new() -> Self {
        Builder(NameStage(()))
    }

    /// Sets the logical name of the upstream service this client will communicate with.
    ///
    /// This is used in logging and error reporting to allow differentiation between different clients, and doubles as
    /// the default OAuth2 registration id.
    #[inline]
    pub fn name(self, name: &str) -> Builder {
        Builder(Complete {
            name: name.to_string(),
            base_url: None,
            default_headers: vec![],
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(5 * 60),
            api_version: None,
            auth: AuthScheme::None,
            upstream_errors: UpstreamErrors::RaiseOnStatus,
            authorized_client_manager: None,
            principal_resolver: None,
            raw_client_builder: DefaultRawClientBuilder,
        })
    }
}

#[cfg(test)]
impl Builder {
    pub(crate) fn for_test() -> Self {
        Builder::new().name("test")
    }
}

impl<T> Builder<Complete<T>> {
    /// Applies transport settings from a `ClientConfig` to the builder.
    ///
    /// Header names and values in the configuration are validated here; an invalid entry produces a fatal
    /// [`Error::Config`] naming this client.
    pub fn from_config(mut self, config: &ClientConfig) -> Result<Self, Error> {
        if let Some(base_url) = config.base_url() {
            self = self.base_url(base_url.clone());
        }

        for (name, values) in config.default_header() {
            let header = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                Error::config(
                    &self.0.name,
                    format!("invalid default header name `{name}`"),
                )
            })?;

            for value in values {
                let value = HeaderValue::from_str(value).map_err(|_| {
                    Error::config(
                        &self.0.name,
                        format!("invalid value for default header `{name}`"),
                    )
                })?;
                self = self.default_header(header.clone(), value);
            }
        }

        if let Some(connect_timeout) = config.connect_timeout() {
            self = self.connect_timeout(connect_timeout);
        }

        if let Some(read_timeout) = config.read_timeout() {
            self = self.read_timeout(read_timeout);
        }

        if let Some(apiversion) = config.apiversion() {
            self = self.api_version(apiversion.clone());
        }

        Ok(self)
    }

    /// Returns the builder's configured client name.
    #[inline]
    pub fn get_name(&self) -> &str {
        &self.0.name
    }

    /// Sets the base URL relative request paths resolve against.
    ///
    /// Defaults to unset, in which case requests must use absolute URLs.
    #[inline]
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.0.base_url = Some(base_url);
        self
    }

    /// Returns the builder's configured base URL.
    #[inline]
    pub fn get_base_url(&self) -> Option<&Url> {
        self.0.base_url.as_ref()
    }

    /// Appends a default header applied to every request that does not already carry that header name.
    ///
    /// A name may be appended multiple times; all of its values are applied in order.
    #[inline]
    pub fn default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.0.default_headers.push((name, value));
        self
    }

    /// Returns the builder's configured default headers.
    #[inline]
    pub fn get_default_headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.0.default_headers
    }

    /// Sets the connect timeout.
    ///
    /// A zero timeout is passed through to the transport, which treats it as an immediately-expiring deadline.
    ///
    /// Defaults to 10 seconds.
    #[inline]
    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.0.connect_timeout = connect_timeout;
        self
    }

    /// Returns the builder's configured connect timeout.
    #[inline]
    pub fn get_connect_timeout(&self) -> Duration {
        self.0.connect_timeout
    }

    /// Sets the read timeout.
    ///
    /// This timeout applies to socket-level read attempts.
    ///
    /// Defaults to 5 minutes.
    #[inline]
    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.0.read_timeout = read_timeout;
        self
    }

    /// Returns the builder's configured read timeout.
    #[inline]
    pub fn get_read_timeout(&self) -> Duration {
        self.0.read_timeout
    }

    /// Sets the API version configuration.
    ///
    /// The default version is recorded on the client so requests carry it without specifying one per call; individual
    /// requests may override it via [`RequestBuilder::api_version`](crate::RequestBuilder::api_version).
    #[inline]
    pub fn api_version(mut self, api_version: ApiVersionConfig) -> Self {
        self.0.api_version = Some(api_version);
        self
    }

    /// Returns the builder's configured API version.
    #[inline]
    pub fn get_api_version(&self) -> Option<&ApiVersionConfig> {
        self.0.api_version.as_ref()
    }

    /// Sets the authentication scheme.
    ///
    /// Defaults to `AuthScheme::None`.
    #[inline]
    pub fn auth(mut self, auth: AuthScheme) -> Self {
        self.0.auth = auth;
        self
    }

    /// Returns the builder's configured authentication scheme.
    #[inline]
    pub fn get_auth(&self) -> &AuthScheme {
        &self.0.auth
    }

    /// Sets basic-auth credentials.
    ///
    /// The `Authorization` header value is computed once when the client is built; there is no per-request callout.
    #[inline]
    pub fn basic_auth(self, username: &str, password: &str) -> Self {
        self.auth(AuthScheme::Basic {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Sets a static bearer token.
    #[inline]
    pub fn bearer_auth(self, token: &str) -> Self {
        self.auth(AuthScheme::Bearer {
            token: token.to_string(),
        })
    }

    /// Sets OAuth2 authentication against the given registration id.
    ///
    /// Building a client with this scheme requires an authorized-client manager.
    #[inline]
    pub fn oauth2(self, registration_id: &str) -> Self {
        self.auth(AuthScheme::OAuth2 {
            registration_id: registration_id.to_string(),
        })
    }

    /// Sets the client's behavior in response to a non-2xx response from the upstream service.
    ///
    /// Defaults to `UpstreamErrors::RaiseOnStatus`.
    #[inline]
    pub fn upstream_errors(mut self, upstream_errors: UpstreamErrors) -> Self {
        self.0.upstream_errors = upstream_errors;
        self
    }

    /// Returns the builder's configured upstream error behavior.
    #[inline]
    pub fn get_upstream_errors(&self) -> UpstreamErrors {
        self.0.upstream_errors
    }

    /// Sets the authorized-client manager used by OAuth2 authentication.
    ///
    /// Required when the authentication scheme is `AuthScheme::OAuth2`; unused otherwise.
    #[inline]
    pub fn authorized_client_manager(mut self, manager: Arc<dyn AuthorizedClientManager>) -> Self {
        self.0.authorized_client_manager = Some(manager);
        self
    }

    /// Returns the builder's configured authorized-client manager.
    #[inline]
    pub fn get_authorized_client_manager(&self) -> Option<&Arc<dyn AuthorizedClientManager>> {
        self.0.authorized_client_manager.as_ref()
    }

    /// Sets the resolver of request-scoped principals for OAuth2 authorization.
    ///
    /// Defaults to no resolver, in which case an anonymous principal is synthesized per request.
    #[inline]
    pub fn principal_resolver(mut self, resolver: Arc<dyn ResolvePrincipal>) -> Self {
        self.0.principal_resolver = Some(resolver);
        self
    }

    /// Returns the builder's configured principal resolver.
    #[inline]
    pub fn get_principal_resolver(&self) -> Option<&Arc<dyn ResolvePrincipal>> {
        self.0.principal_resolver.as_ref()
    }

    /// Sets the raw client builder.
    ///
    /// Defaults to `DefaultRawClientBuilder`.
    #[inline]
    pub fn raw_client_builder<U>(self, raw_client_builder: U) -> Builder<Complete<U>> {
        Builder(Complete {
            name: self.0.name,
            base_url: self.0.base_url,
            default_headers: self.0.default_headers,
            connect_timeout: self.0.connect_timeout,
            read_timeout: self.0.read_timeout,
            api_version: self.0.api_version,
            auth: self.0.auth,
            upstream_errors: self.0.upstream_errors,
            authorized_client_manager: self.0.authorized_client_manager,
            principal_resolver: self.0.principal_resolver,
            raw_client_builder,
        })
    }

    /// Returns the builder's configured raw client builder.
    #[inline]
    pub fn get_raw_client_builder(&self) -> &T {
        &self.0.raw_client_builder
    }
}

impl<T> Builder<Complete<T>>
where
    T: BuildRawClient,
{
    /// Creates a new `Client`.
    pub fn build(&self) -> Result<Client<T::RawClient>, Error> {
        let state = ClientState::new(self)?;
        Ok(Client::new(self.get_name(), state))
    }
}

/// The authentication scheme applied to a client's outgoing requests.
#[derive(Clone)]
#[non_exhaustive]
pub enum AuthScheme {
    /// No `Authorization` header is added by the client.
    None,

    /// A static `Authorization: Basic` header computed from the credentials when the client is built.
    Basic {
        /// The username.
        username: String,
        /// The password.
        password: String,
    },

    /// A static `Authorization: Bearer` header.
    Bearer {
        /// The token.
        token: String,
    },

    /// A bearer token fetched from the authorized-client manager on every request.
    ///
    /// The manager owns acquisition and refresh; the client never caches tokens.
    OAuth2 {
        /// The registration id identifying the OAuth2 client configuration known to the manager.
        registration_id: String,
    },
}

/// Specifies the behavior of the client in response to a non-2xx response from the upstream service.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum UpstreamErrors {
    /// Non-2xx responses are converted into [`Error::UpstreamHttp`] errors preserving the response's status, status
    /// text, and headers.
    ///
    /// This is the default behavior.
    RaiseOnStatus,

    /// Non-2xx responses are returned to the caller unchanged.
    ///
    /// This is designed for use when the caller wants to interpret error responses itself.
    PropagateToCaller,
}
