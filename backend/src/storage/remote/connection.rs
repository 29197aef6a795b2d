use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, ETAG};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::school_key;
use crate::storage::traits::Connection;

pub const STUDENTS_NODE: &str = "students";
pub const PAYMENTS_NODE: &str = "payments";
pub const NOTIFICATIONS_NODE: &str = "notifications";

/// Request header asking the database to report the node's ETag
pub const ETAG_REQUEST_HEADER: &str = "X-Firebase-ETag";

/// Connection to a realtime-database JSON tree laid out as
/// `schools/{school_key}/{students|payments|notifications}`
#[derive(Clone)]
pub struct RemoteTreeConnection {
    client: reqwest::Client,
    base_url: Arc<String>,
    auth_token: Option<Arc<String>>,
}

impl RemoteTreeConnection {
    pub fn new(base_url: &str, auth_token: Option<String>) -> StorageResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| StorageError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: Arc::new(base_url.trim_end_matches('/').to_string()),
            auth_token: auth_token.filter(|t| !t.is_empty()).map(Arc::new),
        })
    }

    /// REST URL of one school node
    pub fn node_url(&self, school: &str, node: &str) -> String {
        format!("{}/schools/{}/{}.json", self.base_url, school_key(school), node)
    }

    pub(crate) fn request(&self, method: Method, school: &str, node: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.node_url(school, node));
        match &self.auth_token {
            Some(token) => builder.query(&[("auth", token.as_str())]),
            None => builder,
        }
    }

    /// Turn a non-success status into a storage error
    pub(crate) fn check_status(response: Response, school: &str, node: &str) -> StorageResult<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(StorageError::Unavailable(format!(
                "remote tree returned {} for {}/{}",
                status,
                school_key(school),
                node
            )))
        }
    }

    pub(crate) fn etag(headers: &HeaderMap) -> Option<String> {
        headers
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    /// Current ETag of a node without decoding its body
    pub(crate) async fn fetch_etag(&self, school: &str, node: &str) -> StorageResult<String> {
        let response = self
            .request(Method::GET, school, node)
            .header(ETAG_REQUEST_HEADER, "true")
            .send()
            .await?;
        let response = Self::check_status(response, school, node)?;
        Self::etag(response.headers())
            .ok_or_else(|| StorageError::malformed("remote response", "missing ETag header"))
    }

    pub(crate) fn is_precondition_failed(status: StatusCode) -> bool {
        status == StatusCode::PRECONDITION_FAILED
    }
}

/// Decode a node into records ordered by key.
///
/// `null` is an empty node. An object is keyed either by student id or by
/// server-generated push ids, both of which sort chronologically. Arrays
/// appear when a legacy client wrote sequential integer keys.
pub fn decode_node<T: DeserializeOwned>(
    node: Value,
    text_fields: &[&str],
    key_field: Option<&str>,
) -> StorageResult<Vec<T>> {
    let entries: Vec<(String, Value)> = match node {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            entries
        }
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, item)| !item.is_null())
            .map(|(index, item)| (index.to_string(), item))
            .collect(),
        other => {
            return Err(StorageError::malformed(
                "remote node",
                format!("expected an object, found {}", other),
            ))
        }
    };

    entries
        .into_iter()
        .map(|(key, value)| {
            let record = normalize_record(value, text_fields, key_field.map(|field| (field, key.as_str())))?;
            serde_json::from_value(record).map_err(|e| StorageError::malformed("remote record", e))
        })
        .collect()
}

/// Make a stored record decodable: text fields written as numbers become
/// strings, nulls are dropped so defaults apply, and a record missing its
/// key field inherits it from the node key. A numeric `timestamp` is a
/// server-assigned epoch in milliseconds.
pub fn normalize_record(
    value: Value,
    text_fields: &[&str],
    key_field: Option<(&str, &str)>,
) -> StorageResult<Value> {
    let map = match value {
        Value::Object(map) => map,
        other => {
            return Err(StorageError::malformed(
                "remote record",
                format!("expected an object, found {}", other),
            ))
        }
    };

    let mut normalized = Map::with_capacity(map.len());
    for (field, value) in map {
        match value {
            Value::Null => {}
            Value::Number(n) if field == "timestamp" => {
                let stamp = n
                    .as_i64()
                    .and_then(DateTime::<Utc>::from_timestamp_millis)
                    .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
                    .unwrap_or_else(|| n.to_string());
                normalized.insert(field, Value::String(stamp));
            }
            Value::Number(n) if text_fields.contains(&field.as_str()) => {
                normalized.insert(field, Value::String(n.to_string()));
            }
            Value::Bool(b) if text_fields.contains(&field.as_str()) => {
                normalized.insert(field, Value::String(b.to_string()));
            }
            other => {
                normalized.insert(field, other);
            }
        }
    }

    if let Some((field, key)) = key_field {
        let missing = normalized
            .get(field)
            .and_then(Value::as_str)
            .map_or(true, str::is_empty);
        if missing {
            debug!("Record under {} has no {}, using the node key", key, field);
            normalized.insert(field.to_string(), Value::String(key.to_string()));
        }
    }

    Ok(Value::Object(normalized))
}

impl Connection for RemoteTreeConnection {
    type StudentRepository = super::repositories::RemoteStudentRepository;
    type PaymentRepository = super::repositories::RemotePaymentRepository;
    type NotificationRepository = super::repositories::RemoteNotificationRepository;

    fn create_student_repository(&self) -> Self::StudentRepository {
        super::repositories::RemoteStudentRepository::new(self.clone())
    }

    fn create_payment_repository(&self) -> Self::PaymentRepository {
        super::repositories::RemotePaymentRepository::new(self.clone())
    }

    fn create_notification_repository(&self) -> Self::NotificationRepository {
        super::repositories::RemoteNotificationRepository::new(self.clone())
    }
}
