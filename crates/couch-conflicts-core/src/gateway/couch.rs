use std::time::{Duration, Instant};

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::SET_COOKIE;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, error, info, trace};

use super::{ConflictPage, Credentials, Gateway, GatewayError, PageCursor, RawConflictRow};
use crate::config::AppConfig;

const AUTH_COOKIE_NAME: &str = "AuthSession";

/// [`Gateway`] over the CouchDB HTTP API, authenticated with a cookie session.
///
/// The client keeps its own cookie store, so the `AuthSession` cookie the
/// server refreshes on later responses replaces the one from login.
///
/// Pages through the conflicts view with `startkey`/`startkey_docid`,
/// requesting one extra row per page; that row becomes the next cursor.
pub struct CouchGateway {
    client: Client,
    base_url: Url,
    database: String,
    credentials: Credentials,
    design_document: String,
    view_name: String,
    page_size: usize,
    session_open: bool,
}

impl CouchGateway {
    pub fn new(
        config: &AppConfig,
        credentials: Credentials,
        database: &str,
    ) -> Result<Self, GatewayError> {
        let base = match &config.server_url {
            Some(url) => url.clone(),
            None => format!("https://{}.cloudant.com", credentials.account),
        };
        let base_url = Url::parse(&base)
            .map_err(|err| GatewayError::Protocol(format!("invalid server URL {}: {}", base, err)))?;

        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|err| GatewayError::Transport {
                url: base.clone(),
                reason: err.to_string(),
            })?;

        Ok(Self {
            client,
            base_url,
            database: database.to_string(),
            credentials,
            design_document: config.design_document.clone(),
            view_name: config.view_name.clone(),
            page_size: config.page_size,
            session_open: false,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                GatewayError::Protocol(format!("server URL cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn view_url(&self) -> Result<Url, GatewayError> {
        self.url(&[
            self.database.as_str(),
            "_design",
            self.design_document.as_str(),
            "_view",
            self.view_name.as_str(),
        ])
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, GatewayError> {
        if !self.session_open {
            return Err(GatewayError::SessionClosed(self.database.clone()));
        }
        Ok(request)
    }

    fn get_json(&self, url: Url) -> Result<Value, GatewayError> {
        let request = self.authorized(self.client.get(url.clone()))?;
        let response = send(request, &url)?;
        response
            .json::<Value>()
            .map_err(|err| GatewayError::Protocol(format!("{}: {}", url, err)))
    }

    fn try_delete_revision(&self, document_id: &str, revision_id: &str) -> Result<(), GatewayError> {
        let mut url = self.url(&[self.database.as_str(), document_id])?;
        url.query_pairs_mut().append_pair("rev", revision_id);
        let request = self.authorized(self.client.delete(url.clone()))?;
        let response = send(request, &url)?;
        trace!("Delete response: {:?}", response);
        Ok(())
    }
}

impl Gateway for CouchGateway {
    fn open_session(&mut self) -> Result<(), GatewayError> {
        info!(
            "Establishing a connection with the Cloudant account: {}...",
            self.credentials.account
        );
        let url = self.url(&["_session"])?;
        let request = self.client.post(url.clone()).form(&[
            ("name", self.credentials.api_key.as_str()),
            ("password", self.credentials.password.as_str()),
        ]);
        let response = send(request, &url)?;

        let has_session_cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(|value| value.starts_with(AUTH_COOKIE_NAME));
        if !has_session_cookie {
            return Err(GatewayError::Protocol(format!(
                "{} did not return a session cookie",
                url
            )));
        }
        self.session_open = true;

        info!(
            "Successfully established a connection with the Cloudant account: {}.",
            self.credentials.account
        );
        Ok(())
    }

    fn close_session(&mut self) -> Result<(), GatewayError> {
        if !self.session_open {
            return Ok(());
        }
        self.session_open = false;
        let url = self.url(&["_session"])?;
        send(self.client.delete(url.clone()), &url)?;
        info!(
            "Closed connection with the Cloudant account: {}.",
            self.credentials.account
        );
        Ok(())
    }

    fn document_count(&mut self) -> Result<u64, GatewayError> {
        info!("Retrieving database document count: {}...", self.database);
        let info = self.get_json(self.url(&[self.database.as_str()])?)?;
        let count = info
            .get("doc_count")
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                GatewayError::Protocol(format!(
                    "database info for {} is missing doc_count",
                    self.database
                ))
            })?;
        info!(
            "Successfully retrieved document count from database: {} ({}).",
            self.database, count
        );
        Ok(count)
    }

    fn verify_conflicts_view(&mut self) -> Result<(), GatewayError> {
        info!("Retrieving design document: {}...", self.design_document);
        let ddoc = self.get_json(self.url(&[
            self.database.as_str(),
            "_design",
            self.design_document.as_str(),
        ])?)?;
        trace!("Design document: {}", ddoc);

        if ddoc
            .get("views")
            .and_then(|views| views.get(&self.view_name))
            .is_none()
        {
            return Err(GatewayError::Protocol(format!(
                "design document _design/{} does not define view {}",
                self.design_document, self.view_name
            )));
        }
        info!("Successfully retrieved design document: {}.", self.design_document);
        Ok(())
    }

    fn fetch_conflict_page(&mut self, cursor: &PageCursor) -> Result<ConflictPage, GatewayError> {
        let resume = match cursor {
            PageCursor::End => return Ok(ConflictPage::terminal()),
            PageCursor::Start => None,
            PageCursor::Resume { key, document_id } => Some((key, document_id)),
        };

        let mut url = self.view_url()?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &(self.page_size + 1).to_string());
            if let Some((key, document_id)) = resume {
                query.append_pair("startkey", &key.to_string());
                query.append_pair("startkey_docid", document_id);
            }
        }

        let start = Instant::now();
        let body = self.get_json(url)?;
        let page = parse_view_page(&body, resume.is_some(), self.page_size)?;
        debug!(
            "Retrieved conflicts page: {} rows ({} ms).",
            page.rows.len(),
            start.elapsed().as_millis()
        );
        Ok(page)
    }

    fn delete_revision(&mut self, document_id: &str, revision_id: &str) -> bool {
        info!(
            "Deleting document: {}. Revision: {}...",
            document_id, revision_id
        );
        let start = Instant::now();
        match self.try_delete_revision(document_id, revision_id) {
            Ok(()) => {
                info!(
                    "Successfully deleted document: {}. Revision: {} ({} ms).",
                    document_id,
                    revision_id,
                    start.elapsed().as_millis()
                );
                true
            }
            Err(err) => {
                error!(
                    "Failed to delete document: {}. Revision: {}. {}",
                    document_id, revision_id, err
                );
                false
            }
        }
    }
}

fn send(request: RequestBuilder, url: &Url) -> Result<Response, GatewayError> {
    let response = request.send().map_err(|err| GatewayError::Transport {
        url: url.to_string(),
        reason: err.to_string(),
    })?;
    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response)
}

/// Interpret a view response requested with `limit = page_size + 1`.
///
/// An empty `rows` array ends pagination on the first request. After a
/// resume it is a protocol error, because the resume row itself must come back.
pub fn parse_view_page(
    body: &Value,
    resumed: bool,
    page_size: usize,
) -> Result<ConflictPage, GatewayError> {
    let rows = body
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| GatewayError::Protocol("view response is missing rows".to_string()))?;

    if rows.is_empty() {
        if resumed {
            return Err(GatewayError::Protocol(
                "view returned no rows for a continuation cursor".to_string(),
            ));
        }
        return Ok(ConflictPage::terminal());
    }

    let mut rows: Vec<RawConflictRow> = rows.iter().cloned().map(RawConflictRow).collect();
    if rows.len() <= page_size {
        return Ok(ConflictPage {
            rows,
            next_cursor: PageCursor::End,
        });
    }

    let continuation = rows.split_off(page_size);
    let bookmark = continuation[0].as_value();
    let document_id = bookmark
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            GatewayError::Protocol("continuation row is missing a document id".to_string())
        })?;
    let key = bookmark.get("key").cloned().unwrap_or(Value::Null);

    Ok(ConflictPage {
        rows,
        next_cursor: PageCursor::Resume {
            key,
            document_id: document_id.to_string(),
        },
    })
}
