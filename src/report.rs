//! Fields derived from a student's stored attendance and marks.
//!
//! Everything here is a pure function of the rows passed in. Nothing is persisted or cached, so a
//! [`StudentReport`] always reflects the rows as they were when it was built.

use crate::models::{Attendance, Marks, Student};
use serde::{Serialize, Serializer};
use std::fmt;
use tabled::Tabled;

/// Attendance below this percentage is flagged as a shortage.
pub const ATTENDANCE_THRESHOLD: f64 = 75.0;

/// Average marks at or above this are "Average" rather than "Needs Improvement".
pub const AVERAGE_MARKS_THRESHOLD: f64 = 50.0;

/// Average marks at or above this are "Good".
pub const GOOD_MARKS_THRESHOLD: f64 = 75.0;

/// Rounds to two decimal places, ties to even.
///
/// Float formatting works on the exact binary value, so `49.995` (stored just below the tie)
/// becomes `49.99` rather than being pushed over by `* 100.0`.
pub fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Percentage of attendance rows marked present, or `0` when there are none.
pub fn attendance_percentage(records: &[Attendance]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }

    let present = records.iter().filter(|record| record.is_present).count();

    round2(present as f64 / records.len() as f64 * 100.0)
}

/// Mean score over all marks rows, or `0` when there are none.
pub fn average_marks(marks: &[Marks]) -> f64 {
    if marks.is_empty() {
        return 0.0;
    }

    let total: f64 = marks.iter().map(|m| m.score).sum();

    round2(total / marks.len() as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceWarning {
    Shortage,
    Good,
}

impl AttendanceWarning {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage < ATTENDANCE_THRESHOLD {
            Self::Shortage
        } else {
            Self::Good
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shortage => "⚠ Attendance Shortage (< 75%)",
            Self::Good => "Good Attendance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceRemark {
    NeedsImprovement,
    Average,
    Good,
}

impl PerformanceRemark {
    pub fn from_average(average: f64) -> Self {
        if average >= GOOD_MARKS_THRESHOLD {
            Self::Good
        } else if average >= AVERAGE_MARKS_THRESHOLD {
            Self::Average
        } else {
            Self::NeedsImprovement
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NeedsImprovement => "Needs Improvement",
            Self::Average => "Average",
            Self::Good => "Good",
        }
    }
}

macro_rules! impl_label {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    )*};
}

impl_label!(AttendanceWarning, PerformanceRemark);

/// The read model returned for a student: its raw fields plus everything derived from its rows.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct StudentReport {
    pub id: i32,
    pub roll_no: String,
    pub name: String,
    pub course: String,
    pub semester: i32,
    pub attendance_percentage: f64,
    pub average_marks: f64,
    pub performance_remark: PerformanceRemark,
    pub attendance_warning: AttendanceWarning,
}

impl StudentReport {
    pub fn new(student: Student, attendance: &[Attendance], marks: &[Marks]) -> Self {
        let attendance_percentage = attendance_percentage(attendance);
        let average_marks = average_marks(marks);

        Self {
            id: student.id,
            roll_no: student.roll_no,
            name: student.name,
            course: student.course,
            semester: student.semester,
            attendance_percentage,
            average_marks,
            performance_remark: PerformanceRemark::from_average(average_marks),
            attendance_warning: AttendanceWarning::from_percentage(attendance_percentage),
        }
    }
}
