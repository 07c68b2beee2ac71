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
use super::*;

#[test]
fn empty() {
    let config = "{}";
    let config = serde_json::from_str::<ContainerConfig>(config).unwrap();
    let expected = ContainerConfig::default();
    assert_eq!(config, expected);
    assert!(config.names().is_empty());
}

#[test]
fn minimal() {
    let config = r#"
        {
            "clients": {
                "jph": {
                    "base-url": "https://jsonplaceholder.typicode.com"
                }
            }
        }
    "#;
    let config = serde_json::from_str::<ContainerConfig>(config).unwrap();
    let expected = ClientConfig::builder()
        .base_url(Some(
            "https://jsonplaceholder.typicode.com".parse().unwrap(),
        ))
        .build();
    assert_eq!(config.client("jph"), Some(&expected));
    assert_eq!(config.client_auth("jph"), None);
}

#[test]
fn full_transport_entry() {
    let config = r#"
        {
            "clients": {
                "gh": {
                    "base-url": "https://api.github.com",
                    "default-header": {
                        "Accept": ["application/vnd.github+json"],
                        "X-Trace": ["a", "b"]
                    },
                    "connect-timeout": "11 seconds",
                    "read-timeout": "3 minutes",
                    "apiversion": {
                        "default-version": "2022-11-28",
                        "insert": {
                            "header": "X-GitHub-Api-Version"
                        }
                    }
                }
            }
        }
    "#;
    let config = serde_json::from_str::<ContainerConfig>(config).unwrap();
    let expected = ClientConfig::builder()
        .base_url(Some("https://api.github.com".parse().unwrap()))
        .default_header(HashMap::from([
            (
                "Accept".to_string(),
                vec!["application/vnd.github+json".to_string()],
            ),
            ("X-Trace".to_string(), vec!["a".to_string(), "b".to_string()]),
        ]))
        .connect_timeout(Some(Duration::from_secs(11)))
        .read_timeout(Some(Duration::from_secs(3 * 60)))
        .apiversion(Some(
            ApiVersionConfig::builder()
                .default_version("2022-11-28")
                .insert(VersionInsert::Header("X-GitHub-Api-Version".to_string()))
                .build(),
        ))
        .build();
    assert_eq!(config.client("gh"), Some(&expected));
}

#[test]
fn names_are_the_union_of_the_roots() {
    let config = r#"
        {
            "clients": {
                "a": {},
                "b": {}
            },
            "auth": {
                "b": {},
                "c": {}
            }
        }
    "#;
    let config = serde_json::from_str::<ContainerConfig>(config).unwrap();
    assert_eq!(
        config.names().into_iter().collect::<Vec<_>>(),
        vec!["a", "b", "c"],
    );
}

#[test]
fn version_insert_variants() {
    for (json, expected) in [
        (
            r#"{"header": "X-API-Version"}"#,
            VersionInsert::Header("X-API-Version".to_string()),
        ),
        (
            r#"{"query-parameter": "version"}"#,
            VersionInsert::QueryParameter("version".to_string()),
        ),
        (r#"{"path-segment": 1}"#, VersionInsert::PathSegment(1)),
        (
            r#"{"media-type-parameter": "v"}"#,
            VersionInsert::MediaTypeParameter("v".to_string()),
        ),
    ] {
        assert_eq!(
            serde_json::from_str::<VersionInsert>(json).unwrap(),
            expected,
        );
    }
}

#[test]
fn version_insert_requires_exactly_one_variant() {
    let err = serde_json::from_str::<VersionInsert>("{}").unwrap_err();
    assert!(err.to_string().contains("must be set"));

    let err = serde_json::from_str::<VersionInsert>(
        r#"{"header": "X-API-Version", "query-parameter": "version"}"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("only one"));
}

#[test]
fn basic_authentication() {
    let config = r#"
        {
            "authentication": {
                "type": "basic",
                "basic": {
                    "username": "admin",
                    "password": "palantir"
                }
            }
        }
    "#;
    let config = serde_json::from_str::<ClientAuthConfig>(config).unwrap();
    let expected = AuthenticationConfig::Basic(
        BasicAuthConfig::builder()
            .username("admin")
            .password("palantir")
            .build(),
    );
    assert_eq!(config.authentication(), Some(&expected));
}

#[test]
fn bearer_authentication() {
    let config = r#"
        {
            "authentication": {
                "type": "bearer",
                "bearer": {
                    "token": "ABC"
                }
            }
        }
    "#;
    let config = serde_json::from_str::<ClientAuthConfig>(config).unwrap();
    let expected =
        AuthenticationConfig::Bearer(BearerAuthConfig::builder().token("ABC").build());
    assert_eq!(config.authentication(), Some(&expected));
}

#[test]
fn oauth2_authentication_with_default_registration_id() {
    let config = r#"
        {
            "authentication": {
                "type": "oauth2"
            }
        }
    "#;
    let config = serde_json::from_str::<ClientAuthConfig>(config).unwrap();
    let expected = AuthenticationConfig::OAuth2(OAuth2AuthConfig::default());
    assert_eq!(config.authentication(), Some(&expected));
}

#[test]
fn oauth2_authentication_with_registration_id() {
    let config = r#"
        {
            "authentication": {
                "type": "oauth2",
                "oauth2": {
                    "registration-id": "github"
                }
            }
        }
    "#;
    let config = serde_json::from_str::<ClientAuthConfig>(config).unwrap();
    let expected = AuthenticationConfig::OAuth2(
        OAuth2AuthConfig::builder()
            .registration_id(Some("github".to_string()))
            .build(),
    );
    assert_eq!(config.authentication(), Some(&expected));
}

#[test]
fn absent_or_none_type_means_no_authentication() {
    let config = serde_json::from_str::<ClientAuthConfig>(r#"{"authentication": {}}"#).unwrap();
    assert_eq!(config.authentication(), Some(&AuthenticationConfig::None));

    let config =
        serde_json::from_str::<ClientAuthConfig>(r#"{"authentication": {"type": "none"}}"#)
            .unwrap();
    assert_eq!(config.authentication(), Some(&AuthenticationConfig::None));
}

#[test]
fn bearer_without_token_is_rejected() {
    let err = serde_json::from_str::<ClientAuthConfig>(
        r#"{"authentication": {"type": "bearer"}}"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("requires a token"));
}

#[test]
fn basic_without_password_is_rejected() {
    let err = serde_json::from_str::<ClientAuthConfig>(
        r#"{"authentication": {"type": "basic", "basic": {"username": "admin"}}}"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("requires a password"));
}

#[test]
fn unknown_authentication_type_is_rejected() {
    let err = serde_json::from_str::<ClientAuthConfig>(
        r#"{"authentication": {"type": "digest"}}"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("digest"));
}
