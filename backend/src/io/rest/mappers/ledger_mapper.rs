use crate::domain::commands::ledger::{RecordPaymentCommand, RecordPaymentResult};
use crate::domain::models::Payment as DomainPayment;
use crate::io::rest::mappers::StudentMapper;
use shared::{Payment as SharedPayment, PaymentListResponse, RecordPaymentRequest, RecordPaymentResponse};

pub struct LedgerMapper;

impl LedgerMapper {
    pub fn to_dto(domain: DomainPayment) -> SharedPayment {
        SharedPayment {
            student_id: domain.student_id,
            name: domain.name,
            amount_paid: domain.amount_paid,
            timestamp: domain.timestamp,
        }
    }

    pub fn to_dtos(payments: Vec<DomainPayment>) -> Vec<SharedPayment> {
        payments.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_command(school: String, request: RecordPaymentRequest) -> RecordPaymentCommand {
        RecordPaymentCommand {
            school,
            student_id: request.student_id,
            amount: request.amount,
        }
    }

    pub fn to_record_response(result: RecordPaymentResult) -> RecordPaymentResponse {
        let formatted_amount = format_amount(result.payment.amount_paid);
        let mut success_message = format!(
            "Recorded {} for {}, remaining {}",
            formatted_amount,
            result.student.name,
            format_amount(result.student.remaining_fee)
        );
        if result.overpaid > 0 {
            success_message.push_str(&format!(" ({} over the balance)", format_amount(result.overpaid)));
        }

        RecordPaymentResponse {
            student: StudentMapper::to_dto(result.student),
            payment: Self::to_dto(result.payment),
            success_message,
            formatted_amount,
        }
    }

    pub fn to_list_response(school: String, payments: Vec<DomainPayment>) -> PaymentListResponse {
        PaymentListResponse {
            school,
            payments: Self::to_dtos(payments),
        }
    }
}

/// Rupee amount with thousands separators, e.g. "₹12,500"
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("₹{}", grouped)
}
