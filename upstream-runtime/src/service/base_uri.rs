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
use http::{Request, Uri};
use url::{Position, Url};

/// A layer which resolves origin-form request URIs against the client's base URL.
///
/// The base URL's path is treated as a prefix: a base of `https://host/api` and a request path of `/r` produce
/// `https://host/api/r`. Requests whose URI is already absolute pass through untouched.
pub struct BaseUriLayer {
    base_url: Option<Url>,
}

impl BaseUriLayer {
    pub fn new<T>(builder: &Builder<builder::Complete<T>>) -> BaseUriLayer {
        BaseUriLayer {
            base_url: builder.get_base_url().cloned(),
        }
    }
}

impl<S> Layer<S> for BaseUriLayer {
    type Service = BaseUriService<S>;

    fn layer(self, inner: S) -> Self::Service {
        BaseUriService {
            inner,
            base_url: self.base_url,
        }
    }
}

pub struct BaseUriService<S> {
    inner: S,
    base_url: Option<Url>,
}

impl<S, B> Service<Request<B>> for BaseUriService<S>
where
    S: Service<Request<B>> + Sync + Send,
    B: Send,
{
    type Response = S::Response;
    type Error = S::Error;

    async fn call(&self, mut req: Request<B>) -> Result<Self::Response, Self::Error> {
        if req.uri().scheme().is_none() {
            let base = self
                .base_url
                .as_ref()
                .expect("client has no base URL configured, so request paths must be absolute");
            *req.uri_mut() = resolve(base, req.uri());
        }

        self.inner.call(req).await
    }
}

fn resolve(base: &Url, uri: &Uri) -> Uri {
    let mut resolved = base[..Position::BeforePath].to_string();
    resolved.push_str(base.path().trim_end_matches('/'));
    resolved.push_str(uri.path());
    if let Some(query) = uri.query() {
        resolved.push('?');
        resolved.push_str(query);
    }

    resolved.parse().expect("URI resolved against a valid base")
}
