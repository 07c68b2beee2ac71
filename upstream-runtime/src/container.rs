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
use crate::builder::{Builder, Complete};
use crate::errors::Error;
use crate::raw::{BuildRawClient, DefaultRawClientBuilder};
use crate::typed::{ClientDescription, TypedClient};
use crate::Client;
use std::collections::{BTreeSet, HashMap};

/// A name-indexed registry of prebuilt clients and client builders.
///
/// Containers are populated once by [`ContainerFactory::bootstrap`](crate::ContainerFactory::bootstrap) and are
/// immutable afterwards; lookups are cheap and safe for concurrent use.
pub struct Container<T = DefaultRawClientBuilder>
where
    T: BuildRawClient,
{
    clients: HashMap<String, Client<T::RawClient>>,
    builders: HashMap<String, Builder<Complete<T>>>,
}

impl<T> Container<T>
where
    T: BuildRawClient,
{
    pub(crate) fn new() -> Container<T> {
        Container {
            clients: HashMap::new(),
            builders: HashMap::new(),
        }
    }

    pub(crate) fn register(
        &mut self,
        name: &str,
        client: Client<T::RawClient>,
        builder: Builder<Complete<T>>,
    ) {
        self.clients.insert(name.to_string(), client);
        self.builders.insert(name.to_string(), builder);
    }

    /// Returns the prebuilt client registered under the given name.
    pub fn get(&self, name: &str) -> Result<&Client<T::RawClient>, Error> {
        self.clients
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Returns `true` if a client is registered under the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.clients.contains_key(name)
    }

    /// Returns a snapshot of the registered client names.
    pub fn names(&self) -> BTreeSet<String> {
        self.clients.keys().cloned().collect()
    }

    /// Returns a typed wrapper which translates calls described by `description` into requests against the named
    /// client.
    pub fn typed(
        &self,
        name: &str,
        description: &ClientDescription,
    ) -> Result<TypedClient<T::RawClient>, Error> {
        let client = self.get(name)?.clone();
        TypedClient::new(client, description)
    }
}

impl<T> Container<T>
where
    T: BuildRawClient + Clone,
{
    /// Returns a fresh builder preconfigured with the named client's baseline configuration.
    ///
    /// Every call yields an independent builder; customizations made to it are invisible to the prebuilt client and
    /// to builders returned by other calls.
    pub fn builder(&self, name: &str) -> Result<Builder<Complete<T>>, Error> {
        self.builders
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }
}
