#![allow(dead_code)]

use student_records::RecordsManager;
use student_records::models::{NewStudent, Student};
use tempfile::TempDir;

/// A manager over a fresh SQLite file that is removed when dropped.
pub struct TestDb {
    pub manager: RecordsManager,
    _dir: TempDir,
}

pub fn test_db() -> TestDb {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("records.sqlite3");
    let manager = RecordsManager::connect(path.to_str().expect("utf-8 temp path"), 4)
        .expect("open test database");

    TestDb { manager, _dir: dir }
}

pub fn add_student(
    manager: &RecordsManager,
    roll_no: &str,
    name: &str,
    course: &str,
    semester: i32,
) -> Student {
    manager
        .create_student(&NewStudent {
            roll_no,
            name,
            course,
            semester,
        })
        .expect("create student")
}
