use std::env;

use anyhow::{Result, bail};

const LOCAL_ENDPOINT: &str = "http://localhost:4566";

/// Deployment target selected on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Environment {
    Local,
    Prod,
}

#[derive(Clone, Debug)]
pub struct AwsCredentials {
    pub access_key: String,
    pub secret_key: String,
}

/// Run configuration sourced from the environment at startup; read-only for
/// the lifetime of the run.
#[derive(Clone, Debug)]
pub struct Settings {
    pub environment: Environment,
    pub queue_url: String,
    pub message_body: String,
    pub endpoint_url: Option<String>,
    pub credentials: Option<AwsCredentials>,
}

impl Settings {
    pub fn from_env(environment: Environment) -> Result<Self> {
        Self::from_lookup(environment, |key| env::var(key).ok())
    }

    fn from_lookup(
        environment: Environment,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let Some(queue_url) = lookup("QUEUE_URL") else {
            bail!("QUEUE_URL is not set");
        };
        let Some(message_body) = lookup("UID") else {
            bail!("UID is not set");
        };
        let (endpoint_url, credentials) = match environment {
            Environment::Local => {
                let endpoint = lookup("SQS_ENDPOINT").unwrap_or_else(|| LOCAL_ENDPOINT.to_string());
                (Some(endpoint), None)
            }
            Environment::Prod => {
                let Some(access_key) = lookup("AWS_ACCESS_KEY") else {
                    bail!("AWS_ACCESS_KEY is required in prod");
                };
                let Some(secret_key) = lookup("AWS_SECRET_KEY") else {
                    bail!("AWS_SECRET_KEY is required in prod");
                };
                (
                    None,
                    Some(AwsCredentials {
                        access_key,
                        secret_key,
                    }),
                )
            }
        };
        Ok(Self {
            environment,
            queue_url,
            message_body,
            endpoint_url,
            credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn local_defaults_endpoint_and_skips_credentials() {
        let settings = Settings::from_lookup(
            Environment::Local,
            vars(&[("QUEUE_URL", "http://q"), ("UID", "body")]),
        )
        .expect("settings");
        assert_eq!(settings.endpoint_url.as_deref(), Some(LOCAL_ENDPOINT));
        assert!(settings.credentials.is_none());
    }

    #[test]
    fn local_endpoint_can_be_overridden() {
        let settings = Settings::from_lookup(
            Environment::Local,
            vars(&[
                ("QUEUE_URL", "http://q"),
                ("UID", "body"),
                ("SQS_ENDPOINT", "http://elsewhere:4566"),
            ]),
        )
        .expect("settings");
        assert_eq!(settings.endpoint_url.as_deref(), Some("http://elsewhere:4566"));
    }

    #[test]
    fn prod_requires_credentials() {
        let err = Settings::from_lookup(
            Environment::Prod,
            vars(&[("QUEUE_URL", "http://q"), ("UID", "body")]),
        )
        .expect_err("missing credentials");
        assert!(err.to_string().contains("AWS_ACCESS_KEY"));
    }

    #[test]
    fn prod_reads_credentials_from_env() {
        let settings = Settings::from_lookup(
            Environment::Prod,
            vars(&[
                ("QUEUE_URL", "http://q"),
                ("UID", "body"),
                ("AWS_ACCESS_KEY", "AKIA"),
                ("AWS_SECRET_KEY", "secret"),
            ]),
        )
        .expect("settings");
        let credentials = settings.credentials.expect("credentials");
        assert_eq!(credentials.access_key, "AKIA");
        assert_eq!(credentials.secret_key, "secret");
        assert!(settings.endpoint_url.is_none());
    }

    #[test]
    fn queue_url_is_required() {
        let err = Settings::from_lookup(Environment::Local, vars(&[("UID", "body")]))
            .expect_err("missing queue url");
        assert!(err.to_string().contains("QUEUE_URL"));
    }
}
