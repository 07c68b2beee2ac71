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
//! A container of named HTTP clients.
//!
//! `upstream_runtime` turns one declarative configuration into a registry of fully-configured, ready-to-use HTTP
//! clients, each bound to a distinct upstream service and looked up by name. Per-client behavior (base URL, default
//! headers, timeouts, API version insertion, and authentication) is composed once at bootstrap; application code
//! just resolves clients and issues requests.
//!
//! # Configuration
//!
//! The [`ContainerConfig`](config::ContainerConfig) has two roots keyed by the same logical client names: transport
//! settings under `clients` and authentication under `auth`. It is typically deserialized from a configuration file:
//!
//! ```yaml
//! clients:
//!   jph:
//!     base-url: https://jsonplaceholder.typicode.com
//!     read-timeout: 10s
//!   gh:
//!     base-url: https://api.github.com
//!     apiversion:
//!       default-version: "2022-11-28"
//!       insert:
//!         header: X-GitHub-Api-Version
//! auth:
//!   jph:
//!     authentication:
//!       type: bearer
//!       bearer:
//!         token: my-token
//!   gh:
//!     authentication:
//!       type: oauth2
//!       oauth2:
//!         registration-id: github
//! ```
//!
//! # Usage
//!
//! Bootstrap a container once at startup and resolve clients by name:
//!
//! ```no_run
//! use upstream_runtime::config::ContainerConfig;
//! use upstream_runtime::ContainerFactory;
//!
//! # async fn example() -> Result<(), upstream_runtime::Error> {
//! let config = "..."; // e.g. read from a file
//! let config = serde_yaml::from_str::<ContainerConfig>(config).unwrap();
//!
//! let container = ContainerFactory::new(config).bootstrap()?;
//!
//! let response = container
//!     .get("jph")?
//!     .get("/posts/{postId}")
//!     .param("postId", 1)
//!     .send()
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Clients configured for OAuth2 need an authorized-client manager, supplied to the factory before bootstrap:
//!
//! ```no_run
//! # use upstream_runtime::config::ContainerConfig;
//! # use upstream_runtime::{AuthorizedClientManager, ContainerFactory};
//! # use std::sync::Arc;
//! # fn example(config: ContainerConfig, manager: Arc<dyn AuthorizedClientManager>) -> Result<(), upstream_runtime::Error> {
//! let mut factory = ContainerFactory::new(config);
//! factory.authorized_client_manager(manager);
//! let container = factory.bootstrap()?;
//! # Ok(()) }
//! ```
//!
//! Where a caller needs to diverge from a client's baseline configuration, the container hands out fresh builders
//! instead of mutable clients:
//!
//! ```no_run
//! # use http::header::{HeaderName, HeaderValue};
//! # fn example(container: upstream_runtime::Container) -> Result<(), upstream_runtime::Error> {
//! let client = container
//!     .builder("jph")?
//!     .default_header(
//!         HeaderName::from_static("x-flavor"),
//!         HeaderValue::from_static("vanilla"),
//!     )
//!     .build()?;
//! # Ok(()) }
//! ```
//!
//! # Behavior
//!
//! Per-request middleware executes in a fixed order: default headers are applied first, then the API version is
//! inserted, then authentication, so a header added by the authentication scheme wins over a configured default.
//! Non-2xx responses are surfaced as [`Error::UpstreamHttp`] with the response's status, status text, and headers
//! intact; clients built with
//! [`UpstreamErrors::PropagateToCaller`](Builder::upstream_errors) receive the raw response instead. Transport errors
//! propagate unchanged, and the container itself never retries.
#![warn(missing_docs, clippy::all)]

pub use crate::auth::*;
pub use crate::bootstrap::*;
pub use crate::builder::*;
pub use crate::client::*;
pub use crate::container::*;
pub use crate::errors::Error;
pub use crate::request::*;
pub use crate::response::*;
pub use crate::typed::*;
use http::header::HeaderValue;
use once_cell::sync::Lazy;

mod auth;
mod bootstrap;
mod builder;
mod client;
mod container;
pub mod errors;
pub mod raw;
mod request;
mod response;
mod service;
mod typed;

/// Client configuration.
///
/// This is just a reexport of the `upstream_runtime_config` crate for convenience.
pub mod config {
    #[doc(inline)]
    pub use upstream_runtime_config::*;
}

static APPLICATION_JSON: Lazy<HeaderValue> =
    Lazy::new(|| HeaderValue::from_static("application/json"));
