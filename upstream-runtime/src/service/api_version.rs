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
use crate::config::VersionInsert;
use crate::errors::Error;
use crate::raw::Service;
use crate::service::Layer;
use crate::{builder, Builder};
use http::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use http::{Request, Uri};
use url::form_urlencoded;

/// A per-request override of the client's default API version, carried in request extensions.
#[derive(Debug, Clone)]
pub(crate) struct ApiVersionOverride(pub(crate) String);

/// A layer which places the client's API version into one fixed location of every outgoing request.
///
/// The version applied is the per-request override when one is present, and the configured default version otherwise.
/// Runs after base-URL resolution so the path-segment strategy operates on the final request path.
pub struct ApiVersionLayer {
    config: Option<VersionConfig>,
}

struct VersionConfig {
    default_version: String,
    inserter: Inserter,
}

enum Inserter {
    Header(HeaderName),
    QueryParameter(String),
    PathSegment(u32),
    MediaTypeParameter(String),
}

impl ApiVersionLayer {
    pub fn new<T>(builder: &Builder<builder::Complete<T>>) -> Result<ApiVersionLayer, Error> {
        let config = match builder.get_api_version() {
            Some(config) => config,
            None => return Ok(ApiVersionLayer { config: None }),
        };

        let inserter = match config.insert() {
            VersionInsert::Header(name) => {
                let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                    Error::config(
                        builder.get_name(),
                        format!("invalid api version header name `{name}`"),
                    )
                })?;
                Inserter::Header(name)
            }
            VersionInsert::QueryParameter(name) => Inserter::QueryParameter(name.clone()),
            VersionInsert::PathSegment(index) => Inserter::PathSegment(*index),
            VersionInsert::MediaTypeParameter(name) => Inserter::MediaTypeParameter(name.clone()),
        };

        Ok(ApiVersionLayer {
            config: Some(VersionConfig {
                default_version: config.default_version().to_string(),
                inserter,
            }),
        })
    }
}

impl<S> Layer<S> for ApiVersionLayer {
    type Service = ApiVersionService<S>;

    fn layer(self, inner: S) -> Self::Service {
        ApiVersionService {
            inner,
            config: self.config,
        }
    }
}

pub struct ApiVersionService<S> {
    inner: S,
    config: Option<VersionConfig>,
}

impl<S, B> Service<Request<B>> for ApiVersionService<S>
where
    S: Service<Request<B>> + Sync + Send,
    B: Send,
{
    type Response = S::Response;
    type Error = S::Error;

    async fn call(&self, mut req: Request<B>) -> Result<Self::Response, Self::Error> {
        let config = match &self.config {
            Some(config) => config,
            None => return self.inner.call(req).await,
        };

        let version = match req.extensions().get::<ApiVersionOverride>() {
            Some(version) => version.0.clone(),
            None => config.default_version.clone(),
        };

        match &config.inserter {
            Inserter::Header(name) => {
                if !req.headers().contains_key(name) {
                    req.headers_mut().insert(name.clone(), header_value(&version));
                }
            }
            Inserter::QueryParameter(name) => {
                *req.uri_mut() = append_query_param(req.uri(), name, &version);
            }
            Inserter::PathSegment(index) => {
                *req.uri_mut() = insert_path_segment(req.uri(), *index, &version);
            }
            Inserter::MediaTypeParameter(name) => {
                append_media_type_param(req.headers_mut(), ACCEPT, name, &version, true);
                append_media_type_param(req.headers_mut(), CONTENT_TYPE, name, &version, false);
            }
        }

        self.inner.call(req).await
    }
}

fn header_value(version: &str) -> HeaderValue {
    HeaderValue::from_str(version).expect("api version is not a valid header value")
}

fn append_query_param(uri: &Uri, name: &str, version: &str) -> Uri {
    let pair = form_urlencoded::Serializer::new(String::new())
        .append_pair(name, version)
        .finish();

    let mut path_and_query = uri.path().to_string();
    match uri.query() {
        Some(query) => {
            path_and_query.push('?');
            path_and_query.push_str(query);
            path_and_query.push('&');
        }
        None => path_and_query.push('?'),
    }
    path_and_query.push_str(&pair);

    rebuild(uri, path_and_query)
}

fn insert_path_segment(uri: &Uri, index: u32, version: &str) -> Uri {
    let encoded = form_urlencoded::byte_serialize(version.as_bytes()).collect::<String>();

    let path = uri.path();
    let mut segments = match path.strip_prefix('/') {
        Some("") => vec![],
        Some(path) => path.split('/').collect::<Vec<_>>(),
        None => vec![],
    };

    // the index names the segment position the version occupies in the final path, counting from 1; 0 clamps to the
    // front and positions past the end append
    let at = (index.saturating_sub(1) as usize).min(segments.len());
    segments.insert(at, encoded.as_str());

    let mut path_and_query = String::new();
    for segment in &segments {
        path_and_query.push('/');
        path_and_query.push_str(segment);
    }
    if let Some(query) = uri.query() {
        path_and_query.push('?');
        path_and_query.push_str(query);
    }

    rebuild(uri, path_and_query)
}

fn rebuild(uri: &Uri, path_and_query: String) -> Uri {
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(
        path_and_query
            .parse()
            .expect("api version is not valid in a URI"),
    );
    Uri::from_parts(parts).expect("URI rebuilt from valid parts")
}

fn append_media_type_param(
    headers: &mut HeaderMap,
    header: HeaderName,
    name: &str,
    version: &str,
    insert_if_absent: bool,
) {
    let values = headers.get_all(&header).iter().cloned().collect::<Vec<_>>();

    if values.is_empty() {
        if insert_if_absent {
            let value = HeaderValue::from_str(&format!("*/*;{name}={version}"))
                .expect("api version is not a valid header value");
            headers.insert(header, value);
        }
        return;
    }

    let values = values
        .iter()
        .map(|value| match value.to_str() {
            Ok(media_type) => HeaderValue::from_str(&format!("{media_type};{name}={version}"))
                .expect("api version is not a valid header value"),
            Err(_) => value.clone(),
        })
        .collect::<Vec<_>>();

    headers.remove(&header);
    for value in values {
        headers.append(header.clone(), value);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::ApiVersionConfig;
    use crate::service;

    async fn apply(insert: VersionInsert, request: Request<()>) -> Request<()> {
        let builder = Builder::for_test().api_version(
            ApiVersionConfig::builder()
                .default_version("2")
                .insert(insert)
                .build(),
        );

        let service = ApiVersionLayer::new(&builder)
            .unwrap()
            .layer(service::service_fn(|req: Request<()>| async move {
                Ok::<_, ()>(req)
            }));
        service.call(request).await.unwrap()
    }

    fn request(uri: &str) -> Request<()> {
        Request::builder().uri(uri).body(()).unwrap()
    }

    #[tokio::test]
    async fn header_insert() {
        let out = apply(
            VersionInsert::Header("X-API-Version".to_string()),
            request("https://x.test/r"),
        )
        .await;
        assert_eq!(out.headers().get("X-API-Version").unwrap(), "2");
    }

    #[tokio::test]
    async fn header_insert_does_not_overwrite() {
        let mut req = request("https://x.test/r");
        req.headers_mut()
            .insert("X-API-Version", HeaderValue::from_static("9"));

        let out = apply(VersionInsert::Header("X-API-Version".to_string()), req).await;
        assert_eq!(out.headers().get("X-API-Version").unwrap(), "9");
    }

    #[tokio::test]
    async fn query_param_insert() {
        let out = apply(
            VersionInsert::QueryParameter("version".to_string()),
            request("https://x.test/r"),
        )
        .await;
        assert_eq!(out.uri(), "https://x.test/r?version=2");
    }

    #[tokio::test]
    async fn query_param_appends_to_existing_query() {
        let out = apply(
            VersionInsert::QueryParameter("version".to_string()),
            request("https://x.test/r?limit=1"),
        )
        .await;
        assert_eq!(out.uri(), "https://x.test/r?limit=1&version=2");
    }

    #[tokio::test]
    async fn path_segment_leading() {
        for index in [0, 1] {
            let out = apply(
                VersionInsert::PathSegment(index),
                request("https://x.test/r"),
            )
            .await;
            assert_eq!(out.uri(), "https://x.test/2/r");
        }
    }

    #[tokio::test]
    async fn path_segment_interior() {
        let out = apply(
            VersionInsert::PathSegment(2),
            request("https://x.test/api/users?limit=1"),
        )
        .await;
        assert_eq!(out.uri(), "https://x.test/api/2/users?limit=1");
    }

    #[tokio::test]
    async fn path_segment_past_the_end_appends() {
        let out = apply(VersionInsert::PathSegment(9), request("https://x.test/r")).await;
        assert_eq!(out.uri(), "https://x.test/r/2");
    }

    #[tokio::test]
    async fn media_type_param_added_to_missing_accept() {
        let out = apply(
            VersionInsert::MediaTypeParameter("v".to_string()),
            request("https://x.test/r"),
        )
        .await;
        assert_eq!(out.headers().get(ACCEPT).unwrap(), "*/*;v=2");
    }

    #[tokio::test]
    async fn media_type_param_appended_to_media_types() {
        let mut req = request("https://x.test/r");
        req.headers_mut()
            .insert(ACCEPT, HeaderValue::from_static("application/json"));
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let out = apply(VersionInsert::MediaTypeParameter("v".to_string()), req).await;
        assert_eq!(out.headers().get(ACCEPT).unwrap(), "application/json;v=2");
        assert_eq!(
            out.headers().get(CONTENT_TYPE).unwrap(),
            "application/json;v=2",
        );
    }

    #[tokio::test]
    async fn override_replaces_the_default() {
        let mut req = request("https://x.test/r");
        req.extensions_mut()
            .insert(ApiVersionOverride("3".to_string()));

        let out = apply(VersionInsert::QueryParameter("version".to_string()), req).await;
        assert_eq!(out.uri(), "https://x.test/r?version=3");
    }
}
