//! Resets the database to the demo roster.
//!
//! Every student is deleted (taking their attendance and marks with them) and four fixed demo
//! students are inserted, each present for the last five days and scored in two subjects.

use anyhow::Result;
use student_records::sample;

pub fn main() -> Result<()> {
    let manager = student_records::create_default_manager()?;

    println!("Deleting existing data...");
    let students = sample::reset_demo_roster(&manager, &mut rand::thread_rng())?;

    for student in &students {
        println!("Created {} ({})", student.name, student.roll_no);
    }
    println!("Done! Added {} demo students.", students.len());

    Ok(())
}
