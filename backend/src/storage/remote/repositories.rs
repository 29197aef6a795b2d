use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use super::connection::{
    decode_node, normalize_record, RemoteTreeConnection, ETAG_REQUEST_HEADER, NOTIFICATIONS_NODE, PAYMENTS_NODE,
    STUDENTS_NODE,
};
use crate::domain::models::{Notification, Payment, Roster, RosterVersion};
use crate::storage::append_timestamp;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::traits::{NotificationStorage, PaymentStorage, StudentStorage};

const STUDENT_TEXT_FIELDS: &[&str] = &[
    "student_id",
    "name",
    "school_name",
    "school",
    "parent_name",
    "parent",
    "parent_contact",
];
const PAYMENT_TEXT_FIELDS: &[&str] = &["student_id", "name", "timestamp"];
const NOTIFICATION_TEXT_FIELDS: &[&str] = &["message", "timestamp"];

/// Placeholder the database replaces with its own clock on write
fn server_timestamp() -> Value {
    json!({ ".sv": "timestamp" })
}

/// Request body for a log entry whose timestamp the server assigns
fn stamped_body<T: Serialize>(record: &T) -> StorageResult<Value> {
    let mut body = serde_json::to_value(record).map_err(|e| StorageError::malformed("log record", e))?;
    match &mut body {
        Value::Object(map) => {
            map.insert("timestamp".to_string(), server_timestamp());
            Ok(body)
        }
        other => Err(StorageError::malformed(
            "log record",
            format!("expected an object, found {}", other),
        )),
    }
}

#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

/// Append one record under a server-generated key and return it as stored.
///
/// The push key and the timestamp both come from the server clock, so log
/// order and timestamp order agree across every client.
async fn post_record<T>(
    connection: &RemoteTreeConnection,
    school: &str,
    node: &str,
    record: &T,
    text_fields: &[&str],
) -> StorageResult<T>
where
    T: Serialize + DeserializeOwned + Sync,
{
    let body = stamped_body(record)?;
    let response = connection.request(Method::POST, school, node).json(&body).send().await?;
    let response = RemoteTreeConnection::check_status(response, school, node)?;

    // The entry is written from here on; a failed read-back must not fail the append
    match read_back(connection, school, node, response, text_fields).await {
        Ok(stored) => Ok(stored),
        Err(e) => {
            warn!("Appended to {} for {} but could not read it back: {}", node, school, e);
            let mut fallback = body;
            if let Value::Object(map) = &mut fallback {
                map.insert("timestamp".to_string(), Value::String(append_timestamp()));
            }
            serde_json::from_value(fallback).map_err(|e| StorageError::malformed("log record", e))
        }
    }
}

async fn read_back<T: DeserializeOwned>(
    connection: &RemoteTreeConnection,
    school: &str,
    node: &str,
    response: reqwest::Response,
    text_fields: &[&str],
) -> StorageResult<T> {
    let pushed: PushResponse = response.json().await?;
    let child = format!("{}/{}", node, pushed.name);
    let stored = get_node(connection, school, &child).await?;
    let record = normalize_record(stored, text_fields, None)?;
    serde_json::from_value(record).map_err(|e| StorageError::malformed("remote record", e))
}

async fn get_node(connection: &RemoteTreeConnection, school: &str, node: &str) -> StorageResult<Value> {
    let response = connection.request(Method::GET, school, node).send().await?;
    let response = RemoteTreeConnection::check_status(response, school, node)?;
    Ok(response.json::<Value>().await?)
}

/// Roster stored as a map of student id to record
#[derive(Clone)]
pub struct RemoteStudentRepository {
    connection: RemoteTreeConnection,
}

impl RemoteStudentRepository {
    pub fn new(connection: RemoteTreeConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl StudentStorage for RemoteStudentRepository {
    async fn load_students(&self, school: &str) -> StorageResult<Roster> {
        let response = self
            .connection
            .request(Method::GET, school, STUDENTS_NODE)
            .header(ETAG_REQUEST_HEADER, "true")
            .send()
            .await?;
        let response = RemoteTreeConnection::check_status(response, school, STUDENTS_NODE)?;

        let version = RemoteTreeConnection::etag(response.headers())
            .ok_or_else(|| StorageError::malformed("remote response", "missing ETag header"))?;
        let node = response.json::<Value>().await?;
        let students = decode_node(node, STUDENT_TEXT_FIELDS, Some("student_id"))?;

        Ok(Roster {
            school: school.to_string(),
            students,
            version: RosterVersion::new(version),
        })
    }

    async fn save_students(&self, roster: &Roster) -> StorageResult<RosterVersion> {
        let school = roster.school.as_str();

        let mut body = Map::with_capacity(roster.students.len());
        for student in &roster.students {
            let record = serde_json::to_value(student).map_err(|e| StorageError::malformed("student record", e))?;
            body.insert(student.student_id.clone(), record);
        }

        let response = self
            .connection
            .request(Method::PUT, school, STUDENTS_NODE)
            .header(ETAG_REQUEST_HEADER, "true")
            .header(reqwest::header::IF_MATCH, roster.version.as_str())
            .json(&Value::Object(body))
            .send()
            .await?;

        if RemoteTreeConnection::is_precondition_failed(response.status()) {
            let actual = RemoteTreeConnection::etag(response.headers()).unwrap_or_default();
            warn!("Rejected stale roster save for {}", school);
            return Err(StorageError::Conflict {
                school: school.to_string(),
                expected: roster.version.to_string(),
                actual,
            });
        }
        let response = RemoteTreeConnection::check_status(response, school, STUDENTS_NODE)?;

        let new_version = match RemoteTreeConnection::etag(response.headers()) {
            Some(etag) => etag,
            None => self.connection.fetch_etag(school, STUDENTS_NODE).await?,
        };

        info!("Saved roster for {} with {} students", school, roster.students.len());
        Ok(RosterVersion::new(new_version))
    }
}

#[derive(Clone)]
pub struct RemotePaymentRepository {
    connection: RemoteTreeConnection,
}

impl RemotePaymentRepository {
    pub fn new(connection: RemoteTreeConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl PaymentStorage for RemotePaymentRepository {
    async fn append_payment(&self, school: &str, payment: Payment) -> StorageResult<Payment> {
        let stored = post_record(&self.connection, school, PAYMENTS_NODE, &payment, PAYMENT_TEXT_FIELDS).await?;
        info!(
            "Recorded payment of {} for {} at {}",
            stored.amount_paid, stored.student_id, school
        );
        Ok(stored)
    }

    async fn load_payments(&self, school: &str) -> StorageResult<Vec<Payment>> {
        let node = get_node(&self.connection, school, PAYMENTS_NODE).await?;
        decode_node(node, PAYMENT_TEXT_FIELDS, None)
    }
}

#[derive(Clone)]
pub struct RemoteNotificationRepository {
    connection: RemoteTreeConnection,
}

impl RemoteNotificationRepository {
    pub fn new(connection: RemoteTreeConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl NotificationStorage for RemoteNotificationRepository {
    async fn append_notification(&self, school: &str, notification: Notification) -> StorageResult<Notification> {
        let stored = post_record(
            &self.connection,
            school,
            NOTIFICATIONS_NODE,
            &notification,
            NOTIFICATION_TEXT_FIELDS,
        )
        .await?;
        info!("Posted notification to {}", school);
        Ok(stored)
    }

    async fn load_notifications(&self, school: &str) -> StorageResult<Vec<Notification>> {
        let node = get_node(&self.connection, school, NOTIFICATIONS_NODE).await?;
        decode_node(node, NOTIFICATION_TEXT_FIELDS, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entries_ask_the_server_for_their_timestamp() {
        let payment = Payment {
            student_id: "S0001".to_string(),
            name: "Omkar".to_string(),
            amount_paid: 200,
            timestamp: "2025-06-01T08:00:00Z".to_string(),
        };
        let body = stamped_body(&payment).unwrap();
        assert_eq!(
            body,
            json!({"student_id": "S0001", "name": "Omkar", "amount_paid": 200, "timestamp": {".sv": "timestamp"}})
        );
    }

    #[test]
    fn test_legacy_payment_without_id_keeps_empty_id() {
        let node = json!({
            "-Na01": {"name": "Omkar", "amount_paid": 500, "timestamp": "2025-01-05 10:00:00"},
            "-Na02": {"student_id": "S0001", "name": "Omkar", "amount_paid": "250.0", "timestamp": "2025-06-01T08:00:00Z"}
        });
        let payments: Vec<Payment> = decode_node(node, PAYMENT_TEXT_FIELDS, None).unwrap();
        assert_eq!(payments[0].student_id, "");
        assert_eq!(payments[0].amount_paid, 500);
        assert_eq!(payments[1].student_id, "S0001");
        assert_eq!(payments[1].amount_paid, 250);
    }

    #[test]
    fn test_numeric_student_name_is_text() {
        let node = json!({"S0001": {"name": 42, "fee": 100, "parent_name": "P", "parent_contact": "1"}});
        let students: Vec<crate::domain::models::Student> =
            decode_node(node, STUDENT_TEXT_FIELDS, Some("student_id")).unwrap();
        assert_eq!(students[0].name, "42");
        assert_eq!(students[0].student_id, "S0001");
    }
}
