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
use crate::auth::{AuthorizedClientManager, ResolvePrincipal};
use crate::builder::{Builder, Complete};
use crate::config::{AuthenticationConfig, ContainerConfig};
use crate::container::Container;
use crate::errors::Error;
use crate::raw::{BuildRawClient, DefaultRawClientBuilder};
use crate::Client;
use std::sync::Arc;
use witchcraft_log::debug;

/// A factory which assembles a [`Container`] from a [`ContainerConfig`] and a set of shared collaborators.
///
/// Bootstrap walks the union of the names in the configuration's two roots, assembles one builder per name, and
/// registers both the builder (cloned on every [`Container::builder`] call) and a prebuilt client. Assembly is
/// deterministic given identical configuration, and any invalid entry fails the whole bootstrap with an
/// [`Error::Config`] naming the offending client.
pub struct ContainerFactory<T = DefaultRawClientBuilder> {
    config: ContainerConfig,
    authorized_client_manager: Option<Arc<dyn AuthorizedClientManager>>,
    principal_resolver: Option<Arc<dyn ResolvePrincipal>>,
    raw_client_builder: T,
}

impl ContainerFactory {
    /// Creates a new factory for the given configuration.
    pub fn new(config: ContainerConfig) -> ContainerFactory {
        ContainerFactory {
            config,
            authorized_client_manager: None,
            principal_resolver: None,
            raw_client_builder: DefaultRawClientBuilder,
        }
    }
}

impl<T> ContainerFactory<T> {
    /// Sets the authorized-client manager shared by OAuth2-authenticated clients.
    ///
    /// Required if any client configures `oauth2` authentication.
    pub fn authorized_client_manager(
        &mut self,
        manager: Arc<dyn AuthorizedClientManager>,
    ) -> &mut Self {
        self.authorized_client_manager = Some(manager);
        self
    }

    /// Returns the configured authorized-client manager.
    pub fn get_authorized_client_manager(&self) -> Option<&Arc<dyn AuthorizedClientManager>> {
        self.authorized_client_manager.as_ref()
    }

    /// Sets the resolver of request-scoped principals shared by OAuth2-authenticated clients.
    pub fn principal_resolver(&mut self, resolver: Arc<dyn ResolvePrincipal>) -> &mut Self {
        self.principal_resolver = Some(resolver);
        self
    }

    /// Returns the configured principal resolver.
    pub fn get_principal_resolver(&self) -> Option<&Arc<dyn ResolvePrincipal>> {
        self.principal_resolver.as_ref()
    }

    /// Sets the raw client builder shared by all clients.
    ///
    /// Defaults to `DefaultRawClientBuilder`.
    pub fn raw_client_builder<U>(self, raw_client_builder: U) -> ContainerFactory<U> {
        ContainerFactory {
            config: self.config,
            authorized_client_manager: self.authorized_client_manager,
            principal_resolver: self.principal_resolver,
            raw_client_builder,
        }
    }

    /// Returns the configured raw client builder.
    pub fn get_raw_client_builder(&self) -> &T {
        &self.raw_client_builder
    }
}

impl<T> ContainerFactory<T>
where
    T: BuildRawClient + Clone,
{
    /// Assembles the container.
    pub fn bootstrap(&self) -> Result<Container<T>, Error> {
        let mut container = Container::new();

        for name in self.config.names() {
            let builder = self.configure_builder(name)?;
            let client = builder.build()?;
            debug!("registered upstream client", safe: { client: name });
            container.register(name, client, builder);
        }

        Ok(container)
    }

    /// Assembles the builder for a single named client.
    fn configure_builder(&self, name: &str) -> Result<Builder<Complete<T>>, Error> {
        if name.is_empty() {
            return Err(Error::config(name, "client names must be non-empty"));
        }

        let mut builder = Client::builder()
            .name(name)
            .raw_client_builder(self.raw_client_builder.clone());

        if let Some(manager) = &self.authorized_client_manager {
            builder = builder.authorized_client_manager(manager.clone());
        }

        if let Some(resolver) = &self.principal_resolver {
            builder = builder.principal_resolver(resolver.clone());
        }

        // base URL, default headers, api version, and timeouts, in that order
        if let Some(client_props) = self.config.client(name) {
            builder = builder.from_config(client_props)?;
        }

        // authentication last, so its header wins over any configured default
        if let Some(auth) = self.config.client_auth(name) {
            builder = match auth {
                AuthenticationConfig::None => builder,
                AuthenticationConfig::Basic(basic) => {
                    builder.basic_auth(basic.username(), basic.password())
                }
                AuthenticationConfig::Bearer(bearer) => builder.bearer_auth(bearer.token()),
                AuthenticationConfig::OAuth2(oauth2) => {
                    if self.authorized_client_manager.is_none() {
                        return Err(Error::config(
                            name,
                            "an authorized-client manager is required for oauth2 authentication",
                        ));
                    }

                    let registration_id = oauth2.registration_id().unwrap_or(name);
                    builder.oauth2(registration_id)
                }
            };
        }

        Ok(builder)
    }
}
