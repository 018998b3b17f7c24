use crate::error::{FieldErrors, RecordsError, RecordsResult};
use crate::models::{
    Attendance, AttendanceChanges, Marks, MarksChanges, NewAttendance, NewMarks, NewStudent,
    Student, StudentChanges,
};
use crate::report::StudentReport;
use crate::schema::{attendance, marks, students};
use crate::settings::DatabaseSettings;
use chrono::{Local, NaiveDate};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// The largest number of rows sent in a single `INSERT` statement.
const INSERT_CHUNK: usize = 500;

type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;
type SqlitePooledConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Filters for listing students. Every field that is set must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentFilter {
    pub semester: Option<i32>,
    /// Exact course name.
    pub course: Option<String>,
    /// Whitespace or comma separated terms. Each term must appear, ignoring ASCII case, in either
    /// the name or the roll number.
    pub search: Option<String>,
}

/// Per-connection SQLite settings. Foreign keys are off by default in SQLite.
#[derive(Debug)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// The manager for recording, modifying, and retrieving students, attendance, and marks.
///
/// Cloning is cheap: clones share the same connection pool.
#[derive(Clone)]
pub struct RecordsManager {
    pool: SqlitePool,
}

impl RecordsManager {
    /// Opens (creating if needed) the SQLite database at `database_url` and brings its schema up to
    /// date.
    pub fn connect(database_url: &str, pool_size: u32) -> RecordsResult<Self> {
        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .connection_customizer(Box::new(ConnectionOptions))
            .build(ConnectionManager::<SqliteConnection>::new(database_url))?;

        Self::with_pool(pool)
    }

    pub fn from_settings(settings: &DatabaseSettings) -> RecordsResult<Self> {
        Self::connect(&settings.url, settings.pool_size)
    }

    /// A private in-memory database. Backed by a single connection, since every SQLite
    /// connection to `:memory:` sees its own database.
    pub fn in_memory() -> RecordsResult<Self> {
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connection_customizer(Box::new(ConnectionOptions))
            .build(ConnectionManager::<SqliteConnection>::new(":memory:"))?;

        Self::with_pool(pool)
    }

    fn with_pool(pool: SqlitePool) -> RecordsResult<Self> {
        let mut pooled = pool.get()?;
        let conn: &mut SqliteConnection = &mut pooled;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| RecordsError::Migration(e.to_string()))?;
        debug!(count = applied.len(), "applied pending migrations");

        Ok(Self { pool })
    }

    pub(crate) fn conn(&self) -> RecordsResult<SqlitePooledConnection> {
        Ok(self.pool.get()?)
    }

    /// Checks that a connection can be acquired and that the schema answers queries.
    pub fn health_check(&self) -> RecordsResult<()> {
        students::table
            .count()
            .get_result::<i64>(&mut self.conn()?)?;
        Ok(())
    }

    // ---------------------------------------------------------------------------------------------
    // Students
    // ---------------------------------------------------------------------------------------------

    /// Returns the total number of students on the roster.
    pub fn num_students(&self) -> RecordsResult<usize> {
        students::table
            .count()
            .get_result(&mut self.conn()?)
            .map(|count: i64| count as usize)
            .map_err(Into::into)
    }

    /// Retrieves all students on the roster.
    pub fn get_roster(&self) -> RecordsResult<Vec<Student>> {
        self.list_students(&StudentFilter::default())
    }

    /// Retrieves the students matching `filter`, ordered by id.
    pub fn list_students(&self, filter: &StudentFilter) -> RecordsResult<Vec<Student>> {
        load_students(&mut *self.conn()?, filter)
    }

    /// Retrieves the students matching `filter` together with their derived fields.
    pub fn list_student_reports(&self, filter: &StudentFilter) -> RecordsResult<Vec<StudentReport>> {
        let mut conn = self.conn()?;
        let roster = load_students(&mut conn, filter)?;

        let attendance = Attendance::belonging_to(&roster)
            .select(Attendance::as_select())
            .load(&mut conn)?
            .grouped_by(&roster);
        let marks = Marks::belonging_to(&roster)
            .select(Marks::as_select())
            .load(&mut conn)?
            .grouped_by(&roster);

        Ok(roster
            .into_iter()
            .zip(attendance)
            .zip(marks)
            .map(|((student, attendance), marks)| StudentReport::new(student, &attendance, &marks))
            .collect())
    }

    /// Retrieves a specific student based on their ID.
    pub fn get_student(&self, student_id: i32) -> RecordsResult<Student> {
        find_student(&mut *self.conn()?, student_id)
    }

    /// Retrieves a student along with every attendance and marks row they own.
    pub fn get_student_records(
        &self,
        student_id: i32,
    ) -> RecordsResult<(Student, Vec<Attendance>, Vec<Marks>)> {
        let mut conn = self.conn()?;
        let student = find_student(&mut conn, student_id)?;

        let attendance = Attendance::belonging_to(&student)
            .select(Attendance::as_select())
            .order(attendance::id.asc())
            .load(&mut conn)?;
        let marks = Marks::belonging_to(&student)
            .select(Marks::as_select())
            .order(marks::id.asc())
            .load(&mut conn)?;

        Ok((student, attendance, marks))
    }

    /// Retrieves a student with their derived fields.
    pub fn get_student_report(&self, student_id: i32) -> RecordsResult<StudentReport> {
        let (student, attendance, marks) = self.get_student_records(student_id)?;
        Ok(StudentReport::new(student, &attendance, &marks))
    }

    /// Whether any student already holds `roll_no`.
    pub fn roll_no_exists(&self, roll_no: &str) -> RecordsResult<bool> {
        roll_no_taken(&mut *self.conn()?, roll_no)
    }

    /// Adds a student. Fails with a validation error if the roll number is already taken.
    pub fn create_student(&self, new_student: &NewStudent<'_>) -> RecordsResult<Student> {
        let mut conn = self.conn()?;

        let student = conn.transaction::<_, RecordsError, _>(|conn| {
            if roll_no_taken(conn, new_student.roll_no)? {
                return Err(duplicate_roll_no());
            }

            diesel::insert_into(students::table)
                .values(new_student)
                .returning(Student::as_returning())
                .get_result(conn)
                .map_err(write_error)
        })?;

        info!(id = student.id, roll_no = %student.roll_no, "created student");
        Ok(student)
    }

    /// Inserts students into the database within a single transaction.
    ///
    /// Returns the number of students inserted.
    pub fn insert_students(&self, new_students: &[NewStudent<'_>]) -> RecordsResult<usize> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RecordsError, _>(|conn| {
            let mut inserted = 0;
            for chunk in new_students.chunks(INSERT_CHUNK) {
                inserted += diesel::insert_into(students::table)
                    .values(chunk)
                    .execute(conn)
                    .map_err(write_error)?;
            }
            Ok(inserted)
        })
    }

    /// Applies `changes` to a student and returns the updated row.
    pub fn update_student(
        &self,
        student_id: i32,
        changes: &StudentChanges,
    ) -> RecordsResult<Student> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RecordsError, _>(|conn| {
            let existing = find_student(conn, student_id)?;

            if let Some(roll_no) = &changes.roll_no {
                if roll_no != &existing.roll_no && roll_no_taken(conn, roll_no)? {
                    return Err(duplicate_roll_no());
                }
            }

            if changes.is_empty() {
                return Ok(existing);
            }

            diesel::update(students::table.find(student_id))
                .set(changes)
                .returning(Student::as_returning())
                .get_result(conn)
                .map_err(write_error)
        })
    }

    /// Removes and returns a student given their ID, along with all of their attendance and marks.
    ///
    /// The dependent rows and the student are removed in one transaction.
    pub fn delete_student(&self, student_id: i32) -> RecordsResult<Student> {
        let mut conn = self.conn()?;

        let (student, attendance_removed, marks_removed) =
            conn.transaction::<_, RecordsError, _>(|conn| {
                let attendance_removed =
                    diesel::delete(attendance::table.filter(attendance::student_id.eq(student_id)))
                        .execute(conn)?;
                let marks_removed =
                    diesel::delete(marks::table.filter(marks::student_id.eq(student_id)))
                        .execute(conn)?;

                let student = diesel::delete(students::table.find(student_id))
                    .returning(Student::as_returning())
                    .get_result(conn)
                    .optional()?
                    .ok_or(RecordsError::not_found("student", student_id))?;

                Ok((student, attendance_removed, marks_removed))
            })?;

        info!(
            id = student.id,
            roll_no = %student.roll_no,
            attendance_removed,
            marks_removed,
            "deleted student"
        );
        Ok(student)
    }

    /// Removes and returns all students from the roster, along with every attendance and marks row.
    pub fn delete_roster(&self) -> RecordsResult<Vec<Student>> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RecordsError, _>(|conn| {
            diesel::delete(attendance::table).execute(conn)?;
            diesel::delete(marks::table).execute(conn)?;

            diesel::delete(students::table)
                .returning(Student::as_returning())
                .get_results(conn)
                .map_err(Into::into)
        })
    }

    // ---------------------------------------------------------------------------------------------
    // Attendance
    // ---------------------------------------------------------------------------------------------

    /// Retrieves attendance rows, optionally only those of one student.
    pub fn list_attendance(&self, student_id: Option<i32>) -> RecordsResult<Vec<Attendance>> {
        let mut query = attendance::table
            .select(Attendance::as_select())
            .order(attendance::id.asc())
            .into_boxed();

        if let Some(student_id) = student_id {
            query = query.filter(attendance::student_id.eq(student_id));
        }

        Ok(query.load(&mut self.conn()?)?)
    }

    pub fn get_attendance(&self, attendance_id: i32) -> RecordsResult<Attendance> {
        attendance::table
            .find(attendance_id)
            .select(Attendance::as_select())
            .first(&mut self.conn()?)
            .optional()?
            .ok_or(RecordsError::not_found("attendance", attendance_id))
    }

    /// Records a day of attendance for a student, dated today.
    pub fn create_attendance(&self, student_id: i32, is_present: bool) -> RecordsResult<Attendance> {
        let record = NewAttendance {
            student_id,
            date: today(),
            is_present,
        };

        let mut conn = self.conn()?;
        let created = conn.transaction::<_, RecordsError, _>(|conn| {
            ensure_student(conn, student_id)?;

            diesel::insert_into(attendance::table)
                .values(&record)
                .returning(Attendance::as_returning())
                .get_result(conn)
                .map_err(write_error)
        })?;

        debug!(id = created.id, student = student_id, is_present, "recorded attendance");
        Ok(created)
    }

    /// Inserts attendance rows with explicit dates. Returns the number of rows inserted.
    pub fn insert_attendance(&self, records: &[NewAttendance]) -> RecordsResult<usize> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RecordsError, _>(|conn| {
            let mut inserted = 0;
            for chunk in records.chunks(INSERT_CHUNK) {
                inserted += diesel::insert_into(attendance::table)
                    .values(chunk)
                    .execute(conn)
                    .map_err(write_error)?;
            }
            Ok(inserted)
        })
    }

    pub fn update_attendance(
        &self,
        attendance_id: i32,
        changes: &AttendanceChanges,
    ) -> RecordsResult<Attendance> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RecordsError, _>(|conn| {
            let existing = attendance::table
                .find(attendance_id)
                .select(Attendance::as_select())
                .first(conn)
                .optional()?
                .ok_or(RecordsError::not_found("attendance", attendance_id))?;

            if let Some(student_id) = changes.student_id {
                ensure_student(conn, student_id)?;
            }

            if changes.is_empty() {
                return Ok(existing);
            }

            diesel::update(attendance::table.find(attendance_id))
                .set(changes)
                .returning(Attendance::as_returning())
                .get_result(conn)
                .map_err(write_error)
        })
    }

    pub fn delete_attendance(&self, attendance_id: i32) -> RecordsResult<Attendance> {
        diesel::delete(attendance::table.find(attendance_id))
            .returning(Attendance::as_returning())
            .get_result(&mut self.conn()?)
            .optional()?
            .ok_or(RecordsError::not_found("attendance", attendance_id))
    }

    // ---------------------------------------------------------------------------------------------
    // Marks
    // ---------------------------------------------------------------------------------------------

    /// Retrieves marks rows, optionally only those of one student.
    pub fn list_marks(&self, student_id: Option<i32>) -> RecordsResult<Vec<Marks>> {
        let mut query = marks::table
            .select(Marks::as_select())
            .order(marks::id.asc())
            .into_boxed();

        if let Some(student_id) = student_id {
            query = query.filter(marks::student_id.eq(student_id));
        }

        Ok(query.load(&mut self.conn()?)?)
    }

    pub fn get_marks(&self, marks_id: i32) -> RecordsResult<Marks> {
        marks::table
            .find(marks_id)
            .select(Marks::as_select())
            .first(&mut self.conn()?)
            .optional()?
            .ok_or(RecordsError::not_found("marks", marks_id))
    }

    /// Records a score. Scores are stored as given; there is no valid range.
    pub fn create_marks(&self, new_marks: &NewMarks<'_>) -> RecordsResult<Marks> {
        let mut conn = self.conn()?;

        let created = conn.transaction::<_, RecordsError, _>(|conn| {
            ensure_student(conn, new_marks.student_id)?;

            diesel::insert_into(marks::table)
                .values(new_marks)
                .returning(Marks::as_returning())
                .get_result(conn)
                .map_err(write_error)
        })?;

        debug!(id = created.id, student = created.student_id, subject = %created.subject, "recorded marks");
        Ok(created)
    }

    /// Inserts marks rows. Returns the number of rows inserted.
    pub fn insert_marks(&self, records: &[NewMarks<'_>]) -> RecordsResult<usize> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RecordsError, _>(|conn| {
            let mut inserted = 0;
            for chunk in records.chunks(INSERT_CHUNK) {
                inserted += diesel::insert_into(marks::table)
                    .values(chunk)
                    .execute(conn)
                    .map_err(write_error)?;
            }
            Ok(inserted)
        })
    }

    pub fn update_marks(&self, marks_id: i32, changes: &MarksChanges) -> RecordsResult<Marks> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RecordsError, _>(|conn| {
            let existing = marks::table
                .find(marks_id)
                .select(Marks::as_select())
                .first(conn)
                .optional()?
                .ok_or(RecordsError::not_found("marks", marks_id))?;

            if let Some(student_id) = changes.student_id {
                ensure_student(conn, student_id)?;
            }

            if changes.is_empty() {
                return Ok(existing);
            }

            diesel::update(marks::table.find(marks_id))
                .set(changes)
                .returning(Marks::as_returning())
                .get_result(conn)
                .map_err(write_error)
        })
    }

    pub fn delete_marks(&self, marks_id: i32) -> RecordsResult<Marks> {
        diesel::delete(marks::table.find(marks_id))
            .returning(Marks::as_returning())
            .get_result(&mut self.conn()?)
            .optional()?
            .ok_or(RecordsError::not_found("marks", marks_id))
    }
}

/// The current local calendar date, used to stamp new attendance rows.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn load_students(conn: &mut SqliteConnection, filter: &StudentFilter) -> RecordsResult<Vec<Student>> {
    let mut query = students::table
        .select(Student::as_select())
        .order(students::id.asc())
        .into_boxed();

    if let Some(semester) = filter.semester {
        query = query.filter(students::semester.eq(semester));
    }

    if let Some(course) = &filter.course {
        query = query.filter(students::course.eq(course.clone()));
    }

    for term in search_terms(filter.search.as_deref().unwrap_or_default()) {
        let pattern = format!("%{}%", escape_like(term));
        query = query.filter(
            students::name
                .like(pattern.clone())
                .escape('\\')
                .or(students::roll_no.like(pattern).escape('\\')),
        );
    }

    Ok(query.load(conn)?)
}

fn find_student(conn: &mut SqliteConnection, student_id: i32) -> RecordsResult<Student> {
    students::table
        .find(student_id)
        .select(Student::as_select())
        .first(conn)
        .optional()?
        .ok_or(RecordsError::not_found("student", student_id))
}

fn roll_no_taken(conn: &mut SqliteConnection, roll_no: &str) -> RecordsResult<bool> {
    Ok(diesel::select(diesel::dsl::exists(
        students::table.filter(students::roll_no.eq(roll_no)),
    ))
    .get_result(conn)?)
}

/// Rejects a reference to a student that does not exist.
fn ensure_student(conn: &mut SqliteConnection, student_id: i32) -> RecordsResult<()> {
    let found = diesel::select(diesel::dsl::exists(students::table.find(student_id)))
        .get_result::<bool>(conn)?;

    if found {
        Ok(())
    } else {
        Err(unknown_student(student_id))
    }
}

/// Splits a search string into its terms.
fn search_terms(search: &str) -> impl Iterator<Item = &str> {
    search
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|term| !term.is_empty())
}

/// Escapes the `LIKE` wildcards in `term` so it only matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn duplicate_roll_no() -> RecordsError {
    RecordsError::Validation(FieldErrors::single(
        "roll_no",
        "student with this roll no already exists.",
    ))
}

fn unknown_student(student_id: i32) -> RecordsError {
    RecordsError::Validation(FieldErrors::single(
        "student",
        format!("Invalid pk \"{student_id}\" - object does not exist."),
    ))
}

/// Converts constraint violations that slipped past the pre-checks into validation errors.
fn write_error(err: DieselError) -> RecordsError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => duplicate_roll_no(),
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            RecordsError::Validation(FieldErrors::single(
                "student",
                "Referenced student does not exist.",
            ))
        }
        other => other.into(),
    }
}
