//! Data Transfer Objects for the HTTP API.
//!
//! Request bodies deserialize into payload structs whose fields are all optional, so that a missing
//! field can be reported next to every other problem with the request instead of failing the whole
//! body. `validate*` turns a payload into the storage-level types.

use serde::{Deserialize, Serialize};

use crate::error::{FieldErrors, RecordsError, RecordsResult};
use crate::manager::StudentFilter;
use crate::models::{AttendanceChanges, DEFAULT_COURSE, MarksChanges, NewMarks, NewStudent, StudentChanges};

pub use crate::report::StudentReport;

pub const ROLL_NO_MAX_LEN: usize = 20;
pub const NAME_MAX_LEN: usize = 100;
pub const COURSE_MAX_LEN: usize = 50;
pub const SUBJECT_MAX_LEN: usize = 100;

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";

/// Trims a text field and checks it against the column's limits.
fn text_field(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max_len: usize,
    required: bool,
) -> Option<String> {
    let Some(value) = value else {
        if required {
            errors.add(field, REQUIRED);
        }
        return None;
    };

    let value = value.trim();
    if value.is_empty() {
        errors.add(field, BLANK);
        None
    } else if value.chars().count() > max_len {
        errors.add(
            field,
            format!("Ensure this field has no more than {max_len} characters."),
        );
        None
    } else {
        Some(value.to_string())
    }
}

fn required_field<T>(errors: &mut FieldErrors, field: &str, value: Option<T>, required: bool) -> Option<T> {
    if value.is_none() && required {
        errors.add(field, REQUIRED);
    }
    value
}

/// Reports a field that passed validation but is still missing; only reachable through a bug.
fn missing(field: &str) -> RecordsError {
    RecordsError::Validation(FieldErrors::single(field, REQUIRED))
}

// =============================================================================
// Students
// =============================================================================

/// Request body for creating or updating a student.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentPayload {
    pub roll_no: Option<String>,
    pub name: Option<String>,
    pub course: Option<String>,
    pub semester: Option<i32>,
}

/// A validated student ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentFields {
    pub roll_no: String,
    pub name: String,
    pub course: String,
    pub semester: i32,
}

impl StudentFields {
    pub fn as_new(&self) -> NewStudent<'_> {
        NewStudent {
            roll_no: &self.roll_no,
            name: &self.name,
            course: &self.course,
            semester: self.semester,
        }
    }
}

impl StudentPayload {
    /// Validates an update. A full update (`partial == false`) needs every required field; `course`
    /// may be left out and then keeps its stored value.
    pub fn validate(self, partial: bool) -> RecordsResult<StudentChanges> {
        let mut errors = FieldErrors::new();

        let roll_no = text_field(&mut errors, "roll_no", self.roll_no, ROLL_NO_MAX_LEN, !partial);
        let name = text_field(&mut errors, "name", self.name, NAME_MAX_LEN, !partial);
        let course = text_field(&mut errors, "course", self.course, COURSE_MAX_LEN, false);
        let semester = required_field(&mut errors, "semester", self.semester, !partial);

        errors.into_result()?;

        Ok(StudentChanges {
            roll_no,
            name,
            course,
            semester,
        })
    }

    /// Validates a new student, filling in the default course.
    pub fn validate_new(self) -> RecordsResult<StudentFields> {
        let changes = self.validate(false)?;

        Ok(StudentFields {
            roll_no: changes.roll_no.ok_or_else(|| missing("roll_no"))?,
            name: changes.name.ok_or_else(|| missing("name"))?,
            course: changes.course.unwrap_or_else(|| DEFAULT_COURSE.to_string()),
            semester: changes.semester.ok_or_else(|| missing("semester"))?,
        })
    }
}

/// Query string for `GET /students/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentListQuery {
    pub semester: Option<String>,
    pub course: Option<String>,
    pub search: Option<String>,
}

impl StudentListQuery {
    /// Empty parameters are ignored. A `semester` that is not a whole number is rejected.
    pub fn into_filter(self) -> RecordsResult<StudentFilter> {
        let semester = self
            .semester
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim().parse::<i32>().map_err(|_| {
                    RecordsError::Validation(FieldErrors::single("semester", "Enter a whole number."))
                })
            })
            .transpose()?;

        Ok(StudentFilter {
            semester,
            course: self.course.filter(|c| !c.is_empty()),
            search: self.search.filter(|s| !s.trim().is_empty()),
        })
    }
}

// =============================================================================
// Attendance & Marks
// =============================================================================

/// Query string for the attendance and marks lists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordListQuery {
    pub student: Option<String>,
}

impl RecordListQuery {
    pub fn student_id(self) -> RecordsResult<Option<i32>> {
        self.student
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim().parse::<i32>().map_err(|_| {
                    RecordsError::Validation(FieldErrors::single("student", "Enter a whole number."))
                })
            })
            .transpose()
    }
}

/// Request body for attendance. Any `date` sent is ignored: it is set when the row is created.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendancePayload {
    pub student: Option<i32>,
    pub is_present: Option<bool>,
}

impl AttendancePayload {
    pub fn validate(self, partial: bool) -> RecordsResult<AttendanceChanges> {
        let mut errors = FieldErrors::new();
        let student_id = required_field(&mut errors, "student", self.student, !partial);
        errors.into_result()?;

        Ok(AttendanceChanges {
            student_id,
            is_present: self.is_present,
        })
    }

    /// Validates a new row, returning the student and presence (absent unless given).
    pub fn validate_new(self) -> RecordsResult<(i32, bool)> {
        let changes = self.validate(false)?;
        let student_id = changes.student_id.ok_or_else(|| missing("student"))?;

        Ok((student_id, changes.is_present.unwrap_or(false)))
    }
}

/// Request body for marks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarksPayload {
    pub student: Option<i32>,
    pub subject: Option<String>,
    pub score: Option<f64>,
}

/// A validated marks row ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct MarksFields {
    pub student_id: i32,
    pub subject: String,
    pub score: f64,
}

impl MarksFields {
    pub fn as_new(&self) -> NewMarks<'_> {
        NewMarks {
            student_id: self.student_id,
            subject: &self.subject,
            score: self.score,
        }
    }
}

impl MarksPayload {
    pub fn validate(self, partial: bool) -> RecordsResult<MarksChanges> {
        let mut errors = FieldErrors::new();

        let student_id = required_field(&mut errors, "student", self.student, !partial);
        let subject = text_field(&mut errors, "subject", self.subject, SUBJECT_MAX_LEN, !partial);
        let score = required_field(&mut errors, "score", self.score, !partial);

        if score.is_some_and(|s| !s.is_finite()) {
            errors.add("score", "A valid number is required.");
        }

        errors.into_result()?;

        Ok(MarksChanges {
            student_id,
            subject,
            score,
        })
    }

    pub fn validate_new(self) -> RecordsResult<MarksFields> {
        let changes = self.validate(false)?;

        Ok(MarksFields {
            student_id: changes.student_id.ok_or_else(|| missing("student"))?,
            subject: changes.subject.ok_or_else(|| missing("subject"))?,
            score: changes.score.ok_or_else(|| missing("score"))?,
        })
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Response for sample-data generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSampleResponse {
    pub message: String,
    /// Number of students actually created
    pub created: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}
