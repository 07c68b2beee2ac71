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
use crate::auth::{AuthorizedClientManager, Principal, ResolvePrincipal};
use crate::builder::AuthScheme;
use crate::errors::Error;
use crate::raw::Service;
use crate::service::Layer;
use crate::{builder, Builder};
use base64::prelude::*;
use http::header::{HeaderValue, AUTHORIZATION};
use http::Request;
use std::sync::Arc;
use witchcraft_log::info;

/// A layer which sets the `Authorization` header on outgoing requests.
///
/// Basic and bearer schemes are materialized into a single header value when the layer is constructed; OAuth2 asks
/// the authorized-client manager for a current token on every request. In all cases a value set by this layer replaces
/// any `Authorization` header already on the request.
pub struct AuthLayer {
    action: AuthAction,
}

enum AuthAction {
    None,
    Static(HeaderValue),
    OAuth2 {
        manager: Arc<dyn AuthorizedClientManager>,
        registration_id: String,
        principal_resolver: Option<Arc<dyn ResolvePrincipal>>,
    },
}

impl AuthLayer {
    pub fn new<T>(builder: &Builder<builder::Complete<T>>) -> Result<AuthLayer, Error> {
        let action = match builder.get_auth() {
            AuthScheme::None => AuthAction::None,
            AuthScheme::Basic { username, password } => {
                let credentials = BASE64_STANDARD.encode(format!("{username}:{password}"));
                AuthAction::Static(static_value(builder, format!("Basic {credentials}"))?)
            }
            AuthScheme::Bearer { token } => {
                AuthAction::Static(static_value(builder, format!("Bearer {token}"))?)
            }
            AuthScheme::OAuth2 { registration_id } => {
                let manager = builder
                    .get_authorized_client_manager()
                    .cloned()
                    .ok_or_else(|| {
                        Error::config(
                            builder.get_name(),
                            "an authorized-client manager is required for oauth2 authentication",
                        )
                    })?;

                AuthAction::OAuth2 {
                    manager,
                    registration_id: registration_id.clone(),
                    principal_resolver: builder.get_principal_resolver().cloned(),
                }
            }
        };

        Ok(AuthLayer { action })
    }
}

fn static_value<T>(
    builder: &Builder<builder::Complete<T>>,
    value: String,
) -> Result<HeaderValue, Error> {
    let mut value = HeaderValue::from_str(&value).map_err(|_| {
        Error::config(
            builder.get_name(),
            "credentials are not a valid header value",
        )
    })?;
    value.set_sensitive(true);
    Ok(value)
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(self, inner: S) -> Self::Service {
        AuthService {
            inner,
            action: self.action,
        }
    }
}

pub struct AuthService<S> {
    inner: S,
    action: AuthAction,
}

impl<S, B> Service<Request<B>> for AuthService<S>
where
    S: Service<Request<B>, Error = Error> + Sync + Send,
    B: Send,
{
    type Response = S::Response;
    type Error = Error;

    async fn call(&self, mut req: Request<B>) -> Result<Self::Response, Self::Error> {
        match &self.action {
            AuthAction::None => {}
            AuthAction::Static(value) => {
                req.headers_mut().insert(AUTHORIZATION, value.clone());
            }
            AuthAction::OAuth2 {
                manager,
                registration_id,
                principal_resolver,
            } => {
                let principal = principal_resolver
                    .as_ref()
                    .and_then(|resolver| resolver.resolve())
                    .unwrap_or_else(Principal::anonymous);

                let token = manager
                    .access_token(registration_id, &principal)
                    .await
                    .map_err(Error::Transport)?;

                match token {
                    Some(token) => {
                        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                            .map_err(Error::transport)?;
                        value.set_sensitive(true);
                        req.headers_mut().insert(AUTHORIZATION, value);
                    }
                    None => {
                        info!(
                            "no access token available; request proceeds unauthenticated",
                            safe: { registration_id: registration_id }
                        );
                    }
                }
            }
        }

        self.inner.call(req).await
    }
}
