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
use crate::raw::Service;
use crate::service::Layer;
use crate::{builder, Builder};
use http::header::{HeaderName, HeaderValue, ACCEPT};
use http::Request;
use once_cell::sync::Lazy;
use std::collections::HashSet;

static DEFAULT_ACCEPT: Lazy<HeaderValue> = Lazy::new(|| HeaderValue::from_static("*/*"));

/// A layer which applies the client's default headers to outgoing requests.
///
/// Values are appended in configuration order, preserving multi-valued semantics. A header name already present on
/// the request is left alone so per-request values win over defaults. If no `Accept` header is present after defaults
/// are applied, `Accept: */*` is added.
pub struct DefaultHeadersLayer {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl DefaultHeadersLayer {
    pub fn new<T>(builder: &Builder<builder::Complete<T>>) -> DefaultHeadersLayer {
        DefaultHeadersLayer {
            headers: builder.get_default_headers().to_vec(),
        }
    }
}

impl<S> Layer<S> for DefaultHeadersLayer {
    type Service = DefaultHeadersService<S>;

    fn layer(self, inner: S) -> Self::Service {
        DefaultHeadersService {
            inner,
            headers: self.headers,
        }
    }
}

pub struct DefaultHeadersService<S> {
    inner: S,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl<S, B> Service<Request<B>> for DefaultHeadersService<S>
where
    S: Service<Request<B>> + Sync + Send,
    B: Send,
{
    type Response = S::Response;
    type Error = S::Error;

    async fn call(&self, mut req: Request<B>) -> Result<Self::Response, Self::Error> {
        let preset = req.headers().keys().cloned().collect::<HashSet<_>>();

        for (name, value) in &self.headers {
            if preset.contains(name) {
                continue;
            }

            req.headers_mut().append(name.clone(), value.clone());
        }

        if !req.headers().contains_key(ACCEPT) {
            req.headers_mut().insert(ACCEPT, DEFAULT_ACCEPT.clone());
        }

        self.inner.call(req).await
    }
}
