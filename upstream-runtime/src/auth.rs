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
//! OAuth2 collaborator traits.
//!
//! Token acquisition and refresh are outside the container's responsibility. Clients configured for OAuth2
//! authentication are instead handed an [`AuthorizedClientManager`], which is asked for a current access token on
//! every outgoing request. The container never caches tokens itself.

use async_trait::async_trait;
use std::error;

/// An external collaborator that yields current OAuth2 access tokens.
///
/// The registration id identifies one OAuth2 client configuration known to the manager; the principal is the identity
/// on whose behalf the request is authorized. The manager's future is awaited without a deadline of its own (the
/// client's read timeout only bounds transport I/O), so implementations are expected to bound their own acquisition
/// time.
#[async_trait]
pub trait AuthorizedClientManager: Sync + Send {
    /// Returns a current access token for the registration, or `None` if the registration cannot be authorized.
    ///
    /// A `None` return causes the request to proceed without an `Authorization` header; an error fails the request.
    async fn access_token(
        &self,
        registration_id: &str,
        principal: &Principal,
    ) -> Result<Option<String>, Box<dyn error::Error + Sync + Send>>;
}

/// The identity on whose behalf a request is authorized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal {
    name: String,
    anonymous: bool,
}

impl Principal {
    /// Creates a principal for an authenticated identity.
    pub fn new(name: &str) -> Principal {
        Principal {
            name: name.to_string(),
            anonymous: false,
        }
    }

    /// Creates the anonymous principal used when no request-scoped identity is available.
    ///
    /// Client-credentials flows authorize against this principal.
    pub fn anonymous() -> Principal {
        Principal {
            name: "anonymous".to_string(),
            anonymous: true,
        }
    }

    /// Returns the principal's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if this is the synthesized anonymous principal.
    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }
}

/// A source of request-scoped principals for OAuth2 authorization.
///
/// When no resolver is configured, or the resolver yields `None`, an anonymous principal is synthesized so
/// client-credentials flows still succeed.
pub trait ResolvePrincipal: Sync + Send {
    /// Returns the current principal, if one is available.
    fn resolve(&self) -> Option<Principal>;
}

impl<F> ResolvePrincipal for F
where
    F: Fn() -> Option<Principal> + Sync + Send,
{
    fn resolve(&self) -> Option<Principal> {
        self()
    }
}
