use crate::schema::{attendance, marks, students};
use chrono::NaiveDate;
use diesel::prelude::*;
use serde::Serialize;
use tabled::Tabled;

/// The course a student is placed in when none is given.
pub const DEFAULT_COURSE: &str = "B.Tech";

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize, Tabled)]
#[diesel(table_name = students)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Student {
    pub id: i32,
    pub roll_no: String,
    pub name: String,
    pub course: String,
    pub semester: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = students)]
pub struct NewStudent<'a> {
    pub roll_no: &'a str,
    pub name: &'a str,
    pub course: &'a str,
    pub semester: i32,
}

/// A set of column updates for a student. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, AsChangeset)]
#[diesel(table_name = students)]
pub struct StudentChanges {
    pub roll_no: Option<String>,
    pub name: Option<String>,
    pub course: Option<String>,
    pub semester: Option<i32>,
}

impl StudentChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// One day of attendance for a student.
#[derive(
    Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations, Serialize, Tabled,
)]
#[diesel(belongs_to(Student))]
#[diesel(table_name = attendance)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Attendance {
    pub id: i32,
    #[serde(rename = "student")]
    #[tabled(rename = "student")]
    pub student_id: i32,
    pub date: NaiveDate,
    pub is_present: bool,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = attendance)]
pub struct NewAttendance {
    pub student_id: i32,
    pub date: NaiveDate,
    pub is_present: bool,
}

/// Updatable attendance columns. The date is fixed at creation and never changes.
#[derive(Debug, Clone, Default, PartialEq, AsChangeset)]
#[diesel(table_name = attendance)]
pub struct AttendanceChanges {
    pub student_id: Option<i32>,
    pub is_present: Option<bool>,
}

impl AttendanceChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A single score for a student in a subject.
#[derive(
    Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations, Serialize, Tabled,
)]
#[diesel(belongs_to(Student))]
#[diesel(table_name = marks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Marks {
    pub id: i32,
    #[serde(rename = "student")]
    #[tabled(rename = "student")]
    pub student_id: i32,
    pub subject: String,
    pub score: f64,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = marks)]
pub struct NewMarks<'a> {
    pub student_id: i32,
    pub subject: &'a str,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, AsChangeset)]
#[diesel(table_name = marks)]
pub struct MarksChanges {
    pub student_id: Option<i32>,
    pub subject: Option<String>,
    pub score: Option<f64>,
}

impl MarksChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
