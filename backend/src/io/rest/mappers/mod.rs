//! Conversions between domain models and the `shared` DTOs.
pub mod ledger_mapper;
pub mod notification_mapper;
pub mod session_mapper;
pub mod student_mapper;

pub use ledger_mapper::LedgerMapper;
pub use notification_mapper::NotificationMapper;
pub use session_mapper::SessionMapper;
pub use student_mapper::StudentMapper;
