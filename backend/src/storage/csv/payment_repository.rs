use async_trait::async_trait;
use tracing::info;

use super::connection::{CsvConnection, PAYMENTS_FILE};
use crate::domain::models::{Payment, PAYMENT_COLUMNS};
use crate::storage::append_timestamp;
use crate::storage::error::StorageResult;
use crate::storage::traits::PaymentStorage;

/// CSV-based payment log repository
#[derive(Clone)]
pub struct PaymentRepository {
    connection: CsvConnection,
}

impl PaymentRepository {
    /// Create a new CSV payment repository
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl PaymentStorage for PaymentRepository {
    async fn append_payment(&self, school: &str, mut payment: Payment) -> StorageResult<Payment> {
        {
            let _guard = self.connection.lock();
            self.connection.ensure_school_directory(school)?;
            let path = self.connection.get_school_file_path(school, PAYMENTS_FILE);
            // Name-keyed logs gain an empty student_id column before the first keyed row
            self.connection.migrate_columns::<Payment>(&path, &PAYMENT_COLUMNS)?;
            payment.timestamp = append_timestamp();
            CsvConnection::append_row(&path, &PAYMENT_COLUMNS, &payment)?;
        }

        info!(
            "Recorded payment of {} for {} ({}) at {}",
            payment.amount_paid, payment.student_id, payment.name, school
        );

        let action_description = format!("Recorded payment of {} for {}", payment.amount_paid, payment.student_id);
        self.connection.after_write(school, PAYMENTS_FILE, &action_description).await;
        Ok(payment)
    }

    async fn load_payments(&self, school: &str) -> StorageResult<Vec<Payment>> {
        let path = self.connection.get_school_file_path(school, PAYMENTS_FILE);
        let _guard = self.connection.lock();
        self.connection.read_table(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::TestEnvironment;
    use chrono::DateTime;
    use std::fs;

    fn payment(student_id: &str, amount_paid: u64) -> Payment {
        Payment {
            student_id: student_id.to_string(),
            name: "Omkar".to_string(),
            amount_paid,
            timestamp: String::new(),
        }
    }

    #[tokio::test]
    async fn test_append_and_load_in_order() {
        let env = TestEnvironment::new().unwrap();
        let repo = PaymentRepository::new(env.connection.clone());

        assert!(repo.load_payments("School A").await.unwrap().is_empty());

        let first = repo.append_payment("School A", payment("S0001", 200)).await.unwrap();
        let second = repo.append_payment("School A", payment("S0001", 300)).await.unwrap();
        assert!(DateTime::parse_from_rfc3339(&first.timestamp).is_ok());

        let payments = repo.load_payments("School A").await.unwrap();
        assert_eq!(payments, vec![first, second]);

        // Logs of other schools are independent
        assert!(repo.load_payments("School B").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_legacy_log_keyed_by_name() {
        let env = TestEnvironment::new().unwrap();
        let repo = PaymentRepository::new(env.connection.clone());
        env.connection.ensure_school_directory("School A").unwrap();
        let path = env.connection.get_school_file_path("School A", PAYMENTS_FILE);
        fs::write(&path, "name,amount_paid,timestamp\nOmkar,500,2025-01-05 10:00:00\n").unwrap();

        let appended = repo.append_payment("School A", payment("S0001", 100)).await.unwrap();

        let payments = repo.load_payments("School A").await.unwrap();
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].student_id, "");
        assert_eq!(payments[0].name, "Omkar");
        assert_eq!(payments[0].amount_paid, 500);
        assert_eq!(payments[0].timestamp, "2025-01-05 10:00:00");
        assert_eq!(payments[1], appended);

        let header = fs::read_to_string(&path).unwrap().lines().next().map(str::to_string);
        assert_eq!(header.as_deref(), Some("student_id,name,amount_paid,timestamp"));
    }
}
