use crate::clist::model::{ClistContestList, UpstreamContest};
use async_trait::async_trait;
use reqwest::{
    header::{AUTHORIZATION, USER_AGENT},
    Client, Url,
};
use std::time::Duration;
use thiserror::Error;

type Result<T> = std::result::Result<T, ClistError>;

pub const DEFAULT_CLIST_URL: &str = "https://clist.by/api/v2/contest/";
const UPCOMING_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum ClistError {
    #[error("failed to request to clist")]
    RequestError(#[from] reqwest::Error),
    #[error("failed to deserialize JSON data")]
    DeserializeError(#[from] serde_json::Error),
    #[error("invalid clist url given")]
    InvalidUrlError(#[from] url::ParseError),
    #[error("clist responded with status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

/// Anything able to list upcoming contests.
#[async_trait]
pub trait ContestSource {
    async fn upcoming(&self) -> Result<Vec<UpstreamContest>>;
}

/// clist.by API key pair, sent as `Authorization: ApiKey <user>:<key>`.
#[derive(Clone)]
pub struct Credentials {
    user: String,
    key: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            key: key.into(),
        }
    }

    fn header_value(&self) -> String {
        format!("ApiKey {}:{}", self.user, self.key)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("key", &"***")
            .finish()
    }
}

pub struct ClistClient {
    url: Url,
    credentials: Credentials,
    client: Client,
}

impl ClistClient {
    pub fn new(url: &str, credentials: Credentials) -> Result<Self> {
        let url = Url::parse(url)?;
        let client = Client::builder()
            .gzip(true)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(ClistClient {
            url,
            credentials,
            client,
        })
    }
}

#[async_trait]
impl ContestSource for ClistClient {
    async fn upcoming(&self) -> Result<Vec<UpstreamContest>> {
        let res = self
            .client
            .get(self.url.clone())
            .query(&[
                ("upcoming", "true"),
                ("format", "json"),
                ("limit", UPCOMING_LIMIT.to_string().as_ref()),
            ])
            .header(AUTHORIZATION, self.credentials.header_value())
            .header(USER_AGENT, "contest-tracker")
            .send()
            .await?;

        let status = res.status();
        let body = res.bytes().await?;
        if !status.is_success() {
            return Err(ClistError::UnexpectedStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let list: ClistContestList = serde_json::from_slice(&body)?;
        tracing::debug!("{} upcoming contests retrieved from clist.", list.objects.len());

        Ok(list.objects)
    }
}
