use crate::error::RecordsResult;
use crate::manager::{RecordsManager, StudentFilter};
use crate::report::StudentReport;
use anyhow::Result;
use std::path::Path;
use tabled::{Table, Tabled, settings::Style};

/// Pretty prints the report of every student matching `filter`.
pub fn show_report(manager: &RecordsManager, filter: &StudentFilter, verbose: bool) -> RecordsResult<()> {
    let reports = manager.list_student_reports(filter)?;
    let count = reports.len();

    let mut table = if verbose {
        Table::new(reports)
    } else {
        #[derive(Tabled)]
        struct SimpleReport {
            id: i32,
            roll_no: String,
            name: String,
            #[tabled(rename = "attendance %")]
            attendance_percentage: f64,
            #[tabled(rename = "average")]
            average_marks: f64,
            #[tabled(rename = "remark")]
            performance_remark: String,
        }

        let simplified: Vec<SimpleReport> = reports
            .into_iter()
            .map(|report| SimpleReport {
                id: report.id,
                roll_no: report.roll_no,
                name: report.name,
                attendance_percentage: report.attendance_percentage,
                average_marks: report.average_marks,
                performance_remark: report.performance_remark.to_string(),
            })
            .collect();

        Table::new(simplified)
    };

    table.with(Style::modern());
    println!("Students ({count}):\n{table}");

    Ok(())
}

/// Prints all info about a student, including their derived fields and every attendance and marks
/// row.
pub fn show_student_info(manager: &RecordsManager, student_id: i32) -> RecordsResult<()> {
    let (student, attendance, marks) = match manager.get_student_records(student_id) {
        Ok(records) => records,
        Err(e) if e.is_not_found() => {
            eprintln!("Student with ID '{student_id}' not found.");
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let report = StudentReport::new(student, &attendance, &marks);
    let mut summary = Table::new([&report]);
    summary.with(Style::modern());
    println!("Student:\n{summary}");

    let mut attendance_table = Table::new(attendance);
    attendance_table.with(Style::modern());
    println!("Attendance:\n{attendance_table}");

    let mut marks_table = Table::new(marks);
    marks_table.with(Style::modern());
    println!("Marks:\n{marks_table}");

    Ok(())
}

/// Writes the report of every student matching `filter` to a CSV file at `path`.
///
/// Returns the number of students written.
pub fn export_report(manager: &RecordsManager, filter: &StudentFilter, path: &Path) -> Result<usize> {
    let reports = manager.list_student_reports(filter)?;

    let mut writer = csv::Writer::from_path(path)?;
    for report in &reports {
        writer.serialize(report)?;
    }
    writer.flush()?;

    Ok(reports.len())
}
