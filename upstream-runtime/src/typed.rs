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
//! Declarative typed-client proxies.
//!
//! A [`ClientDescription`] is a plain-data description of an upstream API: a list of endpoints, each with a method, a
//! path template, the query parameters it accepts, and whether it takes a JSON body. Handing one to
//! [`Container::typed`](crate::Container::typed) produces a [`TypedClient`] that dispatches invocations of those
//! endpoints as requests against the named client: a declarative, inspectable stand-in for code-generated service
//! interfaces.
use crate::errors::Error;
use crate::raw::DefaultRawClient;
use crate::request::RequestBuilder;
use crate::Client;
use http::Method;
use std::collections::{HashMap, HashSet};

/// A description of the endpoints exposed by an upstream API.
#[derive(Debug, Clone)]
pub struct ClientDescription {
    endpoints: Vec<EndpointDescription>,
}

impl ClientDescription {
    /// Creates a description from a list of endpoints.
    pub fn new(endpoints: Vec<EndpointDescription>) -> ClientDescription {
        ClientDescription { endpoints }
    }

    /// Returns the description's endpoints.
    pub fn endpoints(&self) -> &[EndpointDescription] {
        &self.endpoints
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.endpoints.is_empty() {
            return Err(Error::InvalidDescription(
                "at least one endpoint must be declared".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for endpoint in &self.endpoints {
            if endpoint.name.is_empty() {
                return Err(Error::InvalidDescription(
                    "endpoint names must be non-empty".to_string(),
                ));
            }

            if !names.insert(&endpoint.name) {
                return Err(Error::InvalidDescription(format!(
                    "duplicate endpoint `{}`",
                    endpoint.name,
                )));
            }

            let placeholders = endpoint.validate_path()?;

            let mut query_params = HashSet::new();
            for param in &endpoint.query_params {
                if param.is_empty() {
                    return Err(Error::InvalidDescription(format!(
                        "endpoint `{}` declares an empty query parameter name",
                        endpoint.name,
                    )));
                }

                if placeholders.contains(param.as_str()) || !query_params.insert(param.as_str()) {
                    return Err(Error::InvalidDescription(format!(
                        "endpoint `{}` declares parameter `{}` more than once",
                        endpoint.name, param,
                    )));
                }
            }
        }

        Ok(())
    }
}

/// A single endpoint of a [`ClientDescription`].
#[derive(Debug, Clone)]
pub struct EndpointDescription {
    name: String,
    method: Method,
    path: String,
    query_params: Vec<String>,
    has_body: bool,
}

impl EndpointDescription {
    /// Creates an endpoint description.
    ///
    /// The path is a template starting with `/` whose `{name}` segments are filled from invocation arguments.
    pub fn new(name: &str, method: Method, path: &str) -> EndpointDescription {
        EndpointDescription {
            name: name.to_string(),
            method,
            path: path.to_string(),
            query_params: vec![],
            has_body: false,
        }
    }

    /// Declares a query parameter accepted by the endpoint.
    pub fn query_param(mut self, name: &str) -> EndpointDescription {
        self.query_params.push(name.to_string());
        self
    }

    /// Declares that the endpoint accepts a JSON request body.
    pub fn with_body(mut self) -> EndpointDescription {
        self.has_body = true;
        self
    }

    /// Returns the endpoint's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the endpoint's HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the endpoint's path template.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the names of the query parameters the endpoint accepts.
    pub fn query_params(&self) -> &[String] {
        &self.query_params
    }

    /// Returns `true` if the endpoint accepts a JSON request body.
    pub fn has_body(&self) -> bool {
        self.has_body
    }

    fn validate_path(&self) -> Result<HashSet<&str>, Error> {
        if !self.path.starts_with('/') {
            return Err(Error::InvalidDescription(format!(
                "endpoint `{}` has a path not starting with `/`",
                self.name,
            )));
        }

        let mut placeholders = HashSet::new();
        for segment in self.path[1..].split('/') {
            if !segment.contains(['{', '}']) {
                continue;
            }

            let inner = segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .filter(|s| !s.is_empty() && !s.contains(['{', '}']));
            let inner = match inner {
                Some(inner) => inner,
                None => {
                    return Err(Error::InvalidDescription(format!(
                        "endpoint `{}` has a malformed path segment `{}`",
                        self.name, segment,
                    )));
                }
            };

            if !placeholders.insert(inner) {
                return Err(Error::InvalidDescription(format!(
                    "endpoint `{}` declares path parameter `{}` more than once",
                    self.name, inner,
                )));
            }
        }

        Ok(placeholders)
    }
}

/// The arguments of one typed-client invocation.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    path: HashMap<String, String>,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl Arguments {
    /// Creates an empty argument set.
    pub fn new() -> Arguments {
        Arguments::default()
    }

    /// Binds a path placeholder to a value.
    #[allow(clippy::needless_pass_by_value)] // we intentionally take T by value here
    pub fn path<T>(mut self, name: &str, value: T) -> Arguments
    where
        T: ToString,
    {
        self.path.insert(name.to_string(), value.to_string());
        self
    }

    /// Adds a query parameter value.
    ///
    /// A parameter may be added multiple times.
    #[allow(clippy::needless_pass_by_value)] // we intentionally take T by value here
    pub fn query<T>(mut self, name: &str, value: T) -> Arguments
    where
        T: ToString,
    {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Sets the JSON request body.
    pub fn body(mut self, body: serde_json::Value) -> Arguments {
        self.body = Some(body);
        self
    }
}

/// A typed wrapper dispatching described endpoints against a named client.
pub struct TypedClient<T = DefaultRawClient> {
    client: Client<T>,
    endpoints: HashMap<String, EndpointDescription>,
}

impl<T> TypedClient<T> {
    pub(crate) fn new(
        client: Client<T>,
        description: &ClientDescription,
    ) -> Result<TypedClient<T>, Error> {
        description.validate()?;

        let endpoints = description
            .endpoints
            .iter()
            .map(|e| (e.name.clone(), e.clone()))
            .collect();

        Ok(TypedClient { client, endpoints })
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &Client<T> {
        &self.client
    }

    /// Resolves an invocation of the named endpoint into a request builder.
    ///
    /// Arguments are checked against the endpoint's description: every path placeholder must be bound, query
    /// parameters must be declared, and a body is only accepted where the description declares one. The response type
    /// is chosen by the caller when reading the response.
    pub fn request(&self, endpoint: &str, args: Arguments) -> Result<RequestBuilder<'_, T>, Error> {
        let endpoint = self.endpoints.get(endpoint).ok_or_else(|| {
            Error::InvalidDescription(format!("unknown endpoint `{endpoint}`"))
        })?;

        let placeholders = endpoint
            .validate_path()
            .expect("description was validated on construction");

        for placeholder in &placeholders {
            if !args.path.contains_key(*placeholder) {
                return Err(Error::InvalidDescription(format!(
                    "endpoint `{}` is missing path parameter `{}`",
                    endpoint.name, placeholder,
                )));
            }
        }

        for name in args.path.keys() {
            if !placeholders.contains(name.as_str()) {
                return Err(Error::InvalidDescription(format!(
                    "endpoint `{}` has no path parameter `{}`",
                    endpoint.name, name,
                )));
            }
        }

        for (name, _) in &args.query {
            if !endpoint.query_params.contains(name) {
                return Err(Error::InvalidDescription(format!(
                    "endpoint `{}` does not accept query parameter `{}`",
                    endpoint.name, name,
                )));
            }
        }

        if args.body.is_some() && !endpoint.has_body {
            return Err(Error::InvalidDescription(format!(
                "endpoint `{}` does not accept a request body",
                endpoint.name,
            )));
        }

        let mut builder = self.client.request(endpoint.method.clone(), &endpoint.path);
        for (name, value) in &args.path {
            builder = builder.param(name, value);
        }
        for (name, value) in &args.query {
            builder = builder.param(name, value);
        }
        if let Some(body) = &args.body {
            builder = builder.json(body)?;
        }

        Ok(builder)
    }
}
