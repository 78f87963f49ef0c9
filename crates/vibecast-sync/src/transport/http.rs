use reqwest::header::ACCEPT;
use url::Url;

use vibecast_core::prelude::*;

use super::{EventStream, SyncTransport};
use crate::protocol::{decode_event_stream, RemoteCommand};

const EVENTS_PATH: &str = "/api/events";
const COMMAND_PATH: &str = "/api/command";

/// HTTP transport: `GET /api/events` (server-sent events) and
/// `POST /api/command` (JSON body)
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    events_url: Url,
    command_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| Error::config(format!("invalid server url '{}': {}", base_url, e)))?;
        let join = |path: &str| {
            base.join(path)
                .map_err(|e| Error::config(format!("invalid server url '{}': {}", base_url, e)))
        };
        Ok(Self {
            client: reqwest::Client::new(),
            events_url: join(EVENTS_PATH)?,
            command_url: join(COMMAND_PATH)?,
            base_url: base,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn events_url(&self) -> &Url {
        &self.events_url
    }

    pub fn command_url(&self) -> &Url {
        &self.command_url
    }
}

impl SyncTransport for HttpTransport {
    async fn open_events(&self) -> Result<EventStream> {
        let response = self
            .client
            .get(self.events_url.clone())
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| Error::transport(format!("GET {} failed: {}", self.events_url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::transport(format!(
                "GET {} returned {}",
                self.events_url, status
            )));
        }

        debug!("Sync: event stream open at {}", self.events_url);
        Ok(Box::pin(decode_event_stream(response.bytes_stream())))
    }

    async fn post_command(&self, command: &RemoteCommand) -> Result<()> {
        let response = self
            .client
            .post(self.command_url.clone())
            .json(command)
            .send()
            .await
            .map_err(|e| {
                Error::transport(format!("POST {} '{}' failed: {}", self.command_url, command.command, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::CommandRejected {
                command: command.command.clone(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
