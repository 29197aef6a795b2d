use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::commands::ledger::{RecordPaymentCommand, RecordPaymentResult};
use crate::domain::error::{TrackerError, TrackerResult};
use crate::domain::models::{Payment, Student};
use crate::domain::roster_service::modify_roster;
use crate::domain::school_directory::SchoolDirectory;
use crate::storage::{Connection, PaymentStorage};

/// Applies fee payments to rosters and keeps the payment log
#[derive(Clone)]
pub struct LedgerService<C: Connection> {
    student_repository: C::StudentRepository,
    payment_repository: C::PaymentRepository,
    schools: SchoolDirectory,
}

impl<C: Connection> LedgerService<C> {
    pub fn new(connection: Arc<C>, schools: SchoolDirectory) -> Self {
        Self {
            student_repository: connection.create_student_repository(),
            payment_repository: connection.create_payment_repository(),
            schools,
        }
    }

    /// Deduct a payment from the student's balance and log it.
    ///
    /// The balance never drops below zero; any overpayment is absorbed. The
    /// log entry is only written once the roster save has succeeded, and if
    /// it cannot be written the deduction is given back before failing.
    pub async fn record_payment(&self, command: RecordPaymentCommand) -> TrackerResult<RecordPaymentResult> {
        let school = self.schools.resolve(&command.school)?.to_string();
        if command.amount < 0 {
            return Err(TrackerError::validation("Payment amount cannot be negative"));
        }
        let amount = command.amount as u64;
        let student_id = command.student_id.trim();

        let (student, overpaid) = modify_roster(&self.student_repository, &school, |roster| {
            let student = roster
                .find_mut(student_id)
                .ok_or_else(|| TrackerError::StudentNotFound {
                    school: school.clone(),
                    student_id: student_id.to_string(),
                })?;
            let overpaid = student.apply_payment(amount);
            Ok((student.clone(), overpaid))
        })
        .await?;

        let draft = Payment {
            student_id: student.student_id.clone(),
            name: student.name.clone(),
            amount_paid: amount,
            timestamp: String::new(),
        };
        let payment = match self.payment_repository.append_payment(&school, draft).await {
            Ok(payment) => payment,
            Err(e) => {
                self.restore_balance(&school, &student.student_id, amount - overpaid).await;
                return Err(e.into());
            }
        };

        info!(
            "Recorded payment of {} for {} at {}, remaining {}",
            amount, student.student_id, school, student.remaining_fee
        );

        Ok(RecordPaymentResult {
            student,
            payment,
            overpaid,
        })
    }

    /// Add back a deduction whose log entry was never written
    async fn restore_balance(&self, school: &str, student_id: &str, deducted: u64) {
        if deducted == 0 {
            return;
        }

        let restored = modify_roster(&self.student_repository, school, |roster| {
            if let Some(student) = roster.find_mut(student_id) {
                student.remaining_fee = student.remaining_fee.saturating_add(deducted);
            }
            Ok(())
        })
        .await;

        match restored {
            Ok(()) => warn!(
                "Payment log append failed at {}; restored {} to the balance of {}",
                school, deducted, student_id
            ),
            Err(e) => error!(
                "Balance of {} at {} is short by {} with no payment logged: {}",
                student_id, school, deducted, e
            ),
        }
    }

    /// The school's payment log in append order, limited to the last `limit` entries
    pub async fn payment_history(&self, school: &str, limit: Option<usize>) -> TrackerResult<Vec<Payment>> {
        let school = self.schools.resolve(school)?;
        let payments = self.payment_repository.load_payments(school).await?;
        Ok(tail(payments, limit))
    }

    /// Most recent payments made for any of `students`, newest first
    pub async fn recent_payments_for(
        &self,
        school: &str,
        students: &[Student],
        count: usize,
    ) -> TrackerResult<Vec<Payment>> {
        let school = self.schools.resolve(school)?;
        let payments = self.payment_repository.load_payments(school).await?;
        Ok(payments
            .into_iter()
            .rev()
            .filter(|p| students.iter().any(|s| p.belongs_to(s)))
            .take(count)
            .collect())
    }
}

/// Keep the last `limit` items of an append-ordered log
pub(crate) fn tail<T>(mut items: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        if items.len() > limit {
            items.drain(..items.len() - limit);
        }
    }
    items
}
