use crate::domain::commands::students::AddStudentCommand;
use crate::domain::models::{Roster, Student as DomainStudent};
use shared::{CreateStudentRequest, RosterResponse, Student as SharedStudent, StudentResponse};

/// Mapper to convert between shared Student DTOs and domain Student models.
pub struct StudentMapper;

impl StudentMapper {
    pub fn to_dto(domain: DomainStudent) -> SharedStudent {
        SharedStudent {
            student_id: domain.student_id,
            name: domain.name,
            school_name: domain.school_name,
            fee: domain.fee,
            remaining_fee: domain.remaining_fee,
            parent_name: domain.parent_name,
            parent_contact: domain.parent_contact,
        }
    }

    pub fn to_dtos(students: Vec<DomainStudent>) -> Vec<SharedStudent> {
        students.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_add_command(school: String, request: CreateStudentRequest) -> AddStudentCommand {
        AddStudentCommand {
            school,
            name: request.name,
            fee: request.fee,
            remaining_fee: request.remaining_fee,
            parent_name: request.parent_name,
            parent_contact: request.parent_contact,
        }
    }

    pub fn to_roster_response(roster: Roster) -> RosterResponse {
        RosterResponse {
            school: roster.school,
            version: roster.version.to_string(),
            students: Self::to_dtos(roster.students),
        }
    }

    pub fn to_student_response(student: DomainStudent) -> StudentResponse {
        let success_message = format!("Added {} as {}", student.name, student.student_id);
        StudentResponse {
            student: Self::to_dto(student),
            success_message,
        }
    }
}
