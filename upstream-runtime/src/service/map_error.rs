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
use crate::errors::Error;
use crate::raw::Service;
use crate::service::Layer;
use std::error;

/// A layer which converts errors surfaced by the raw client into [`Error::Transport`], propagated unchanged.
pub struct MapErrorLayer;

impl<S> Layer<S> for MapErrorLayer {
    type Service = MapErrorService<S>;

    fn layer(self, inner: S) -> Self::Service {
        MapErrorService { inner }
    }
}

pub struct MapErrorService<S> {
    inner: S,
}

impl<S, R> Service<R> for MapErrorService<S>
where
    S: Service<R> + Sync + Send,
    S::Error: Into<Box<dyn error::Error + Sync + Send>>,
    R: Send,
{
    type Response = S::Response;
    type Error = Error;

    async fn call(&self, req: R) -> Result<Self::Response, Self::Error> {
        self.inner.call(req).await.map_err(Error::transport)
    }
}
