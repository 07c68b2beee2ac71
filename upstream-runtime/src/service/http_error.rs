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
use crate::builder::UpstreamErrors;
use crate::errors::{Error, RemoteError};
use crate::raw::Service;
use crate::service::Layer;
use crate::{builder, Builder};
use bytes::Bytes;
use http::{Request, Response};
use http_body::Body;
use http_body_util::{BodyExt, Limited};
use std::error;
use witchcraft_log::info;

// matches the capture bound documented on RemoteError::body
const MAX_CAPTURED_BODY: usize = 10 * 1024;

/// A layer which maps non-2xx HTTP responses into [`Error::UpstreamHttp`] errors.
///
/// The error preserves the response's status, headers, and a bounded prefix of its body. If the client is configured
/// with `UpstreamErrors::PropagateToCaller`, responses are returned unchanged regardless of status.
pub struct HttpErrorLayer {
    behavior: UpstreamErrors,
}

impl HttpErrorLayer {
    pub fn new<T>(builder: &Builder<builder::Complete<T>>) -> HttpErrorLayer {
        HttpErrorLayer {
            behavior: builder.get_upstream_errors(),
        }
    }
}

impl<S> Layer<S> for HttpErrorLayer {
    type Service = HttpErrorService<S>;

    fn layer(self, inner: S) -> Self::Service {
        HttpErrorService {
            inner,
            behavior: self.behavior,
        }
    }
}

pub struct HttpErrorService<S> {
    inner: S,
    behavior: UpstreamErrors,
}

impl<S, B1, B2> Service<Request<B1>> for HttpErrorService<S>
where
    S: Service<Request<B1>, Response = Response<B2>, Error = Error> + Sync + Send,
    B1: Sync + Send,
    B2: Body + Send,
    B2::Data: Send,
    B2::Error: Into<Box<dyn error::Error + Sync + Send>>,
{
    type Response = Response<B2>;
    type Error = Error;

    async fn call(&self, req: Request<B1>) -> Result<Self::Response, Self::Error> {
        let method = req.method().clone();
        let uri = req.uri().clone();

        let response = self.inner.call(req).await?;

        if response.status().is_success() || self.behavior == UpstreamErrors::PropagateToCaller {
            return Ok(response);
        }

        let (parts, body) = response.into_parts();

        let body = match Limited::new(body, MAX_CAPTURED_BODY).collect().await {
            Ok(body) => body.to_bytes(),
            Err(_) => {
                info!("error reading upstream error response body");
                Bytes::new()
            }
        };

        info!(
            "upstream service returned an error response",
            safe: {
                method: method.as_str(),
                url: uri.to_string(),
                status: parts.status.as_u16()
            }
        );

        Err(Error::UpstreamHttp(RemoteError {
            status: parts.status,
            headers: parts.headers,
            body,
        }))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::service;
    use http::StatusCode;
    use http_body_util::Full;

    fn layer(behavior: UpstreamErrors) -> HttpErrorLayer {
        HttpErrorLayer {
            behavior,
        }
    }

    #[tokio::test]
    async fn success_is_ok() {
        let service =
            layer(UpstreamErrors::RaiseOnStatus).layer(service::service_fn(|_| async move {
                Ok::<_, Error>(
                    Response::builder()
                        .status(StatusCode::OK)
                        .body(Full::new(Bytes::new()))
                        .unwrap(),
                )
            }));

        let out = service.call(Request::new(())).await.unwrap();
        assert_eq!(out.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn client_errors_are_raised_with_context() {
        let service =
            layer(UpstreamErrors::RaiseOnStatus).layer(service::service_fn(|_| async move {
                Ok::<_, Error>(
                    Response::builder()
                        .status(StatusCode::NOT_FOUND)
                        .header("X-Request-Id", "abc")
                        .body(Full::new(Bytes::from_static(b"missing")))
                        .unwrap(),
                )
            }));

        let err = service.call(Request::new(())).await.err().unwrap();
        let remote = match err {
            Error::UpstreamHttp(remote) => remote,
            _ => panic!("expected an upstream error"),
        };
        assert_eq!(remote.status(), StatusCode::NOT_FOUND);
        assert!(remote.is_client_error());
        assert!(!remote.is_server_error());
        assert_eq!(remote.headers().get("X-Request-Id").unwrap(), "abc");
        assert_eq!(remote.body(), b"missing");
    }

    #[tokio::test]
    async fn propagate_to_caller_returns_the_response() {
        let service =
            layer(UpstreamErrors::PropagateToCaller).layer(service::service_fn(|_| async move {
                Ok::<_, Error>(
                    Response::builder()
                        .status(StatusCode::SERVICE_UNAVAILABLE)
                        .body(Full::new(Bytes::new()))
                        .unwrap(),
                )
            }));

        let out = service.call(Request::new(())).await.unwrap();
        assert_eq!(out.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
