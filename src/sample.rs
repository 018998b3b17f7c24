//! Randomized demo data.
//!
//! [`generate_sample_data`] makes a fixed number of attempts at creating a student. An attempt whose
//! random roll number is already taken is skipped and not retried, so a run can create fewer
//! students than it attempts, or none at all on a crowded roster.

use crate::error::RecordsResult;
use crate::manager::{RecordsManager, today};
use crate::models::{DEFAULT_COURSE, NewAttendance, NewMarks, NewStudent, Student};
use chrono::Days;
use rand::Rng;
use std::ops::RangeInclusive;
use tracing::{info, warn};

pub const FIRST_NAMES: [&str; 10] = [
    "Rahul", "Priya", "Amit", "Sneha", "Karan", "Anjali", "Rohan", "Meera", "Vikram", "Neha",
];

pub const LAST_NAMES: [&str; 10] = [
    "Shah", "Patel", "Sharma", "Verma", "Singh", "Gupta", "Kumar", "Joshi", "Mehta", "Reddy",
];

pub const SEMESTERS: RangeInclusive<i32> = 1..=8;

pub const COURSES: [&str; 6] = ["B.Tech", "BCA", "MCA", "M.Tech", "B.Sc", "M.Sc"];

pub const SUBJECTS: [&str; 5] = ["Maths", "Physics", "Chemistry", "Computer Science", "English"];

pub const ROLL_NUMBERS: RangeInclusive<u32> = 1000..=9999;

pub const SCORES: RangeInclusive<u32> = 30..=95;

/// Number of students attempted per run.
pub const SAMPLE_ATTEMPTS: usize = 5;

/// Days of attendance generated per student, ending today.
pub const ATTENDANCE_DAYS: u64 = 5;

/// Two present draws for every absent one.
const PRESENCE: [bool; 3] = [true, true, false];

fn pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

/// A randomly drawn student that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleStudent {
    pub roll_no: String,
    pub name: String,
    pub semester: i32,
    pub course: &'static str,
}

impl SampleStudent {
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let roll_no = rng.gen_range(ROLL_NUMBERS).to_string();
        let name = format!("{} {}", pick(rng, &FIRST_NAMES), pick(rng, &LAST_NAMES));
        let semester = rng.gen_range(SEMESTERS);
        let course = *pick(rng, &COURSES);

        Self {
            roll_no,
            name,
            semester,
            course,
        }
    }

    pub fn as_new(&self) -> NewStudent<'_> {
        NewStudent {
            roll_no: &self.roll_no,
            name: &self.name,
            course: self.course,
            semester: self.semester,
        }
    }
}

/// Creates up to [`SAMPLE_ATTEMPTS`] random students, each with [`ATTENDANCE_DAYS`] days of
/// attendance and one score per subject in [`SUBJECTS`].
///
/// Returns the number of students created. The rows of a student are written one statement group
/// at a time, not in a single transaction.
pub fn generate_sample_data<R: Rng + ?Sized>(
    manager: &RecordsManager,
    rng: &mut R,
) -> RecordsResult<usize> {
    let today = today();
    let mut created = 0;

    for _ in 0..SAMPLE_ATTEMPTS {
        let candidate = SampleStudent::draw(rng);

        if manager.roll_no_exists(&candidate.roll_no)? {
            warn!(roll_no = %candidate.roll_no, "sample roll number already taken, skipping");
            continue;
        }

        let student = manager.create_student(&candidate.as_new())?;

        let attendance: Vec<NewAttendance> = (0..ATTENDANCE_DAYS)
            .map(|offset| NewAttendance {
                student_id: student.id,
                date: today - Days::new(offset),
                is_present: *pick(rng, &PRESENCE),
            })
            .collect();
        manager.insert_attendance(&attendance)?;

        let marks: Vec<NewMarks> = SUBJECTS
            .iter()
            .map(|&subject| NewMarks {
                student_id: student.id,
                subject,
                score: f64::from(rng.gen_range(SCORES)),
            })
            .collect();
        manager.insert_marks(&marks)?;

        created += 1;
    }

    info!(created, attempted = SAMPLE_ATTEMPTS, "generated sample students");
    Ok(created)
}

/// One entry of the fixed demo roster.
struct DemoStudent {
    roll_no: &'static str,
    name: &'static str,
    course: &'static str,
    semester: i32,
}

const DEMO_ROSTER: [DemoStudent; 4] = [
    DemoStudent {
        roll_no: "1001",
        name: "Aarav Patel",
        course: DEFAULT_COURSE,
        semester: 3,
    },
    DemoStudent {
        roll_no: "1002",
        name: "Ishita Sharma",
        course: "BCA",
        semester: 1,
    },
    DemoStudent {
        roll_no: "1003",
        name: "Rohan Gupta",
        course: DEFAULT_COURSE,
        semester: 5,
    },
    DemoStudent {
        roll_no: "1004",
        name: "Sneha Singh",
        course: "MCA",
        semester: 2,
    },
];

const DEMO_SUBJECTS: [(&str, RangeInclusive<u32>); 2] =
    [("Mathematics", 70..=95), ("Computer Science", 75..=98)];

/// Deletes every student (and, with them, all attendance and marks) and stores the fixed demo
/// roster: each student present for the last [`ATTENDANCE_DAYS`] days with a score in each of
/// two subjects.
///
/// Returns the students created.
pub fn reset_demo_roster<R: Rng + ?Sized>(
    manager: &RecordsManager,
    rng: &mut R,
) -> RecordsResult<Vec<Student>> {
    let removed = manager.delete_roster()?;
    info!(removed = removed.len(), "cleared roster");

    let today = today();
    let mut created = Vec::with_capacity(DEMO_ROSTER.len());

    for demo in &DEMO_ROSTER {
        let student = manager.create_student(&NewStudent {
            roll_no: demo.roll_no,
            name: demo.name,
            course: demo.course,
            semester: demo.semester,
        })?;

        let attendance: Vec<NewAttendance> = (0..ATTENDANCE_DAYS)
            .map(|offset| NewAttendance {
                student_id: student.id,
                date: today - Days::new(offset),
                is_present: true,
            })
            .collect();
        manager.insert_attendance(&attendance)?;

        let marks: Vec<NewMarks> = DEMO_SUBJECTS
            .iter()
            .map(|(subject, scores)| NewMarks {
                student_id: student.id,
                subject: *subject,
                score: f64::from(rng.gen_range(scores.clone())),
            })
            .collect();
        manager.insert_marks(&marks)?;

        created.push(student);
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_draw_uses_fixed_vocabularies() {
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..50 {
            let sample = SampleStudent::draw(&mut rng);
            let roll_no: u32 = sample.roll_no.parse().unwrap();
            let (first, last) = sample.name.split_once(' ').unwrap();

            assert!(ROLL_NUMBERS.contains(&roll_no));
            assert_eq!(sample.roll_no.len(), 4);
            assert!(FIRST_NAMES.contains(&first));
            assert!(LAST_NAMES.contains(&last));
            assert!(SEMESTERS.contains(&sample.semester));
            assert!(COURSES.contains(&sample.course));
        }
    }

    #[test]
    fn test_generated_students_get_attendance_and_marks() {
        let manager = RecordsManager::in_memory().unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let created = generate_sample_data(&manager, &mut rng).unwrap();

        assert!((1..=SAMPLE_ATTEMPTS).contains(&created));
        assert_eq!(manager.num_students().unwrap(), created);

        for student in manager.get_roster().unwrap() {
            let (_, attendance, marks) = manager.get_student_records(student.id).unwrap();

            assert_eq!(attendance.len(), ATTENDANCE_DAYS as usize);
            assert_eq!(attendance.iter().map(|a| a.date).max(), Some(today()));

            let subjects: Vec<&str> = marks.iter().map(|m| m.subject.as_str()).collect();
            assert_eq!(subjects, SUBJECTS);
            assert!(marks.iter().all(|m| (30.0..=95.0).contains(&m.score)));
        }
    }

    #[test]
    fn test_colliding_roll_numbers_are_skipped() {
        let manager = RecordsManager::in_memory().unwrap();

        let roll_numbers: Vec<String> = ROLL_NUMBERS.map(|n| n.to_string()).collect();
        let roster: Vec<NewStudent> = roll_numbers
            .iter()
            .map(|roll_no| NewStudent {
                roll_no,
                name: "Taken",
                course: DEFAULT_COURSE,
                semester: 1,
            })
            .collect();
        manager.insert_students(&roster).unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let created = generate_sample_data(&manager, &mut rng).unwrap();

        assert_eq!(created, 0);
        assert_eq!(manager.num_students().unwrap(), roll_numbers.len());
        assert!(manager.list_attendance(None).unwrap().is_empty());
        assert!(manager.list_marks(None).unwrap().is_empty());
    }

    #[test]
    fn test_reset_demo_roster_replaces_everything() {
        let manager = RecordsManager::in_memory().unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        generate_sample_data(&manager, &mut rng).unwrap();
        let created = reset_demo_roster(&manager, &mut rng).unwrap();

        let roll_numbers: Vec<&str> = created.iter().map(|s| s.roll_no.as_str()).collect();
        assert_eq!(roll_numbers, ["1001", "1002", "1003", "1004"]);
        assert_eq!(manager.num_students().unwrap(), 4);

        for student in created {
            let report = manager.get_student_report(student.id).unwrap();
            assert_eq!(report.attendance_percentage, 100.0);
            assert_eq!(report.performance_remark.as_str(), "Good");
        }
    }
}
