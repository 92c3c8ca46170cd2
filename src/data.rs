use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use serde_json::Map;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::Result;
use crate::model::Student;

/// One roster row. Header names follow the JSON field names; the backend's
/// snake_case column names are accepted too.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentRow {
    #[serde(default)]
    id: String,
    #[serde(default, alias = "student_id")]
    student_id: String,
    #[serde(default)]
    name: String,
    #[serde(default, rename = "class", alias = "class_name")]
    class_name: String,
    gpa: f64,
    #[serde(alias = "attendance_rate")]
    attendance_rate: f64,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Student {
            id: row.id,
            student_id: row.student_id,
            name: row.name,
            class_name: row.class_name,
            gpa: row.gpa,
            attendance_rate: row.attendance_rate,
            extra: Map::new(),
        }
    }
}

pub fn load_students<P: AsRef<Path>>(path: P) -> Result<Vec<Student>> {
    let file = File::open(path.as_ref())?;
    parse_students(file)
}

pub fn parse_students<R: Read>(reader: R) -> Result<Vec<Student>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut students = Vec::new();

    for result in rdr.deserialize::<StudentRow>() {
        let student: Student = result?.into();
        student.validate()?;
        students.push(student);
    }

    Ok(students)
}
