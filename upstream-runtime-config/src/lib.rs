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
//! Deserializable configuration types for `upstream_runtime` containers.
#![warn(missing_docs, clippy::all)]
// reserve the right to add non-eq config in the future
#![allow(clippy::derive_partial_eq_without_eq)]

use serde::de::{Deserializer, Error as _, Unexpected};
use serde::Deserialize;
use staged_builder::staged_builder;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use url::Url;

#[cfg(test)]
mod test;

/// Configuration for a collection of named upstream clients.
///
/// This type can be constructed programmatically via the `ContainerConfigBuilder` API or deserialized from e.g. a
/// configuration file. It has two roots keyed by the same logical client names: `clients` holds transport settings and
/// `auth` holds authentication settings. Either root (or any individual entry) may be absent.
///
/// # Examples
///
/// ```yaml
/// clients:
///   jph:
///     base-url: https://jsonplaceholder.typicode.com
///     read-timeout: 10s
///   gh:
///     base-url: https://api.github.com
///     default-header:
///       X-GitHub-Api-Version: ["2022-11-28"]
///     apiversion:
///       default-version: "2022-11-28"
///       insert:
///         header: X-GitHub-Api-Version
/// auth:
///   jph:
///     authentication:
///       type: bearer
///       bearer:
///         token: my-token
///   gh:
///     authentication:
///       type: oauth2
///       oauth2:
///         registration-id: github
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
#[staged_builder]
#[builder(update)]
pub struct ContainerConfig {
    #[builder(map(key(type = String, into), value(type = ClientConfig)))]
    clients: HashMap<String, ClientConfig>,
    #[builder(map(key(type = String, into), value(type = ClientAuthConfig)))]
    auth: HashMap<String, ClientAuthConfig>,
}

impl ContainerConfig {
    /// Returns the transport configuration map, keyed by logical client name.
    pub fn clients(&self) -> &HashMap<String, ClientConfig> {
        &self.clients
    }

    /// Returns the authentication configuration map, keyed by logical client name.
    pub fn auth(&self) -> &HashMap<String, ClientAuthConfig> {
        &self.auth
    }

    /// Returns the transport configuration for the specified client.
    pub fn client(&self, name: &str) -> Option<&ClientConfig> {
        self.clients.get(name)
    }

    /// Returns the authentication scheme configured for the specified client, if any.
    pub fn client_auth(&self, name: &str) -> Option<&AuthenticationConfig> {
        self.auth.get(name).and_then(|a| a.authentication())
    }

    /// Returns the union of the client names present in the two roots.
    pub fn names(&self) -> BTreeSet<&str> {
        self.clients
            .keys()
            .chain(self.auth.keys())
            .map(|s| &**s)
            .collect()
    }
}

/// The transport configuration for an individual client.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
#[staged_builder]
#[builder(update)]
pub struct ClientConfig {
    #[builder(default, into)]
    base_url: Option<Url>,
    #[builder(map(key(type = String, into), value(type = Vec<String>)))]
    default_header: HashMap<String, Vec<String>>,
    #[builder(default, into)]
    #[serde(deserialize_with = "de_opt_duration")]
    connect_timeout: Option<Duration>,
    #[builder(default, into)]
    #[serde(deserialize_with = "de_opt_duration")]
    read_timeout: Option<Duration>,
    #[builder(default, into)]
    apiversion: Option<ApiVersionConfig>,
}

impl ClientConfig {
    /// Returns the base URL relative request paths resolve against.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Returns the default headers applied to every request.
    ///
    /// Each name maps to an ordered sequence of values, all of which are applied.
    pub fn default_header(&self) -> &HashMap<String, Vec<String>> {
        &self.default_header
    }

    /// Returns the connection timeout.
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    /// Returns the read timeout.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    /// Returns the API version configuration.
    pub fn apiversion(&self) -> Option<&ApiVersionConfig> {
        self.apiversion.as_ref()
    }
}

/// API versioning configuration for a client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[staged_builder]
pub struct ApiVersionConfig {
    #[builder(into)]
    default_version: String,
    insert: VersionInsert,
}

impl ApiVersionConfig {
    /// The version applied to requests that don't specify one of their own.
    pub fn default_version(&self) -> &str {
        &self.default_version
    }

    /// The strategy used to place the version into outgoing requests.
    pub fn insert(&self) -> &VersionInsert {
        &self.insert
    }
}

/// The location an API version is inserted into outgoing requests.
///
/// Exactly one variant may be configured per client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionInsert {
    /// Send the version in the named request header.
    Header(String),
    /// Append the version to the request URL query under the given parameter name.
    QueryParameter(String),
    /// Insert the version as a path segment.
    ///
    /// The integer is the position the version segment occupies in the final request path, counting from 1. A value of
    /// 0 is treated as 1, and values past the end of the path append the version as the last segment.
    PathSegment(u32),
    /// Append the version as a parameter of the `Accept` and `Content-Type` media types.
    MediaTypeParameter(String),
}

impl<'de> Deserialize<'de> for VersionInsert {
    fn deserialize<D>(deserializer: D) -> Result<VersionInsert, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize, Default)]
        #[serde(rename_all = "kebab-case", default)]
        struct Raw {
            header: Option<String>,
            query_parameter: Option<String>,
            path_segment: Option<u32>,
            media_type_parameter: Option<String>,
        }

        let raw = Raw::deserialize(deserializer)?;

        let mut inserts = vec![];
        if let Some(name) = raw.header {
            inserts.push(VersionInsert::Header(name));
        }
        if let Some(name) = raw.query_parameter {
            inserts.push(VersionInsert::QueryParameter(name));
        }
        if let Some(index) = raw.path_segment {
            inserts.push(VersionInsert::PathSegment(index));
        }
        if let Some(name) = raw.media_type_parameter {
            inserts.push(VersionInsert::MediaTypeParameter(name));
        }

        match inserts.len() {
            1 => Ok(inserts.pop().unwrap()),
            0 => Err(D::Error::custom(
                "one of header, query-parameter, path-segment, and media-type-parameter must be set",
            )),
            _ => Err(D::Error::custom(
                "only one of header, query-parameter, path-segment, and media-type-parameter may be set",
            )),
        }
    }
}

/// The authentication configuration for an individual client.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
#[staged_builder]
#[builder(update)]
pub struct ClientAuthConfig {
    #[builder(default, into)]
    authentication: Option<AuthenticationConfig>,
}

impl ClientAuthConfig {
    /// Returns the authentication scheme, if one is configured.
    pub fn authentication(&self) -> Option<&AuthenticationConfig> {
        self.authentication.as_ref()
    }
}

/// The authentication scheme used when talking to an upstream service.
///
/// Deserialization validates the configuration eagerly: a scheme with missing required fields (e.g. `bearer` without a
/// token) or an unrecognized `type` is rejected with a descriptive error rather than silently disabling
/// authentication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuthenticationConfig {
    /// No `Authorization` header is added by the container.
    None,
    /// A static `Authorization: Basic` header.
    Basic(BasicAuthConfig),
    /// A static `Authorization: Bearer` header.
    Bearer(BearerAuthConfig),
    /// A bearer token fetched from an authorized-client manager on every request.
    OAuth2(OAuth2AuthConfig),
}

impl<'de> Deserialize<'de> for AuthenticationConfig {
    fn deserialize<D>(deserializer: D) -> Result<AuthenticationConfig, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize, Default)]
        #[serde(rename_all = "kebab-case", default)]
        struct Raw {
            r#type: Option<String>,
            basic: Option<RawBasic>,
            bearer: Option<RawBearer>,
            oauth2: Option<RawOAuth2>,
        }

        #[derive(Deserialize, Default)]
        #[serde(rename_all = "kebab-case", default)]
        struct RawBasic {
            username: Option<String>,
            password: Option<String>,
        }

        #[derive(Deserialize, Default)]
        #[serde(rename_all = "kebab-case", default)]
        struct RawBearer {
            token: Option<String>,
        }

        #[derive(Deserialize, Default)]
        #[serde(rename_all = "kebab-case", default)]
        struct RawOAuth2 {
            registration_id: Option<String>,
        }

        let raw = Raw::deserialize(deserializer)?;

        match raw.r#type.as_deref() {
            None | Some("none") => Ok(AuthenticationConfig::None),
            Some("basic") => {
                let basic = raw.basic.unwrap_or_default();
                let username = basic
                    .username
                    .ok_or_else(|| D::Error::custom("basic authentication requires a username"))?;
                let password = basic
                    .password
                    .ok_or_else(|| D::Error::custom("basic authentication requires a password"))?;
                Ok(AuthenticationConfig::Basic(BasicAuthConfig {
                    username,
                    password,
                }))
            }
            Some("bearer") => {
                let token = raw
                    .bearer
                    .and_then(|b| b.token)
                    .ok_or_else(|| D::Error::custom("bearer authentication requires a token"))?;
                Ok(AuthenticationConfig::Bearer(BearerAuthConfig { token }))
            }
            Some("oauth2") => {
                let registration_id = raw.oauth2.and_then(|o| o.registration_id);
                Ok(AuthenticationConfig::OAuth2(OAuth2AuthConfig {
                    registration_id,
                }))
            }
            Some(other) => Err(D::Error::invalid_value(
                Unexpected::Str(other),
                &"one of none, basic, bearer, and oauth2",
            )),
        }
    }
}

/// Credentials for a static `Authorization: Basic` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[staged_builder]
pub struct BasicAuthConfig {
    #[builder(into)]
    username: String,
    #[builder(into)]
    password: String,
}

impl BasicAuthConfig {
    /// Returns the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password.
    pub fn password(&self) -> &str {
        &self.password
    }
}

/// The token for a static `Authorization: Bearer` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[staged_builder]
pub struct BearerAuthConfig {
    #[builder(into)]
    token: String,
}

impl BearerAuthConfig {
    /// Returns the token.
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Settings for OAuth2 authentication through an authorized-client manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[staged_builder]
#[builder(update)]
pub struct OAuth2AuthConfig {
    #[builder(default, into)]
    registration_id: Option<String>,
}

impl OAuth2AuthConfig {
    /// Returns the registration id identifying the OAuth2 client configuration known to the manager.
    ///
    /// Defaults to the client's own name when unset.
    pub fn registration_id(&self) -> Option<&str> {
        self.registration_id.as_deref()
    }
}

fn de_opt_duration<'de, D>(d: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    humantime_serde::Serde::deserialize(d).map(humantime_serde::Serde::into_inner)
}
