use serde::{Serialize, Serializer};

/// Upper bound on per-student subject slots in the wide results schema.
pub const MAX_SUBJECTS: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectResult {
    Pass,
    Fail,
    Other(String),
}

impl SubjectResult {
    pub fn from_code(code: &str) -> Self {
        match code {
            "P" => SubjectResult::Pass,
            "F" => SubjectResult::Fail,
            other => SubjectResult::Other(other.to_string()),
        }
    }

    pub fn as_code(&self) -> &str {
        match self {
            SubjectResult::Pass => "P",
            SubjectResult::Fail => "F",
            SubjectResult::Other(code) => code.as_str(),
        }
    }
}

impl Serialize for SubjectResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_code())
    }
}

/// One positional subject slot. Every field is independently optional:
/// a slot may carry a mark without a result or a result without a mark.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSlot {
    pub subject_name: Option<String>,
    pub subject_code: Option<String>,
    pub internal_marks: Option<f64>,
    pub external_marks: Option<f64>,
    pub total_marks: Option<f64>,
    pub result: Option<SubjectResult>,
}

impl SubjectSlot {
    pub fn is_empty(&self) -> bool {
        self.subject_name.is_none()
            && self.subject_code.is_none()
            && self.internal_marks.is_none()
            && self.external_marks.is_none()
            && self.total_marks.is_none()
            && self.result.is_none()
    }
}

/// One flattened result-sheet row. `subjects` holds slot 1 of the wide
/// schema at index 0, capped at MAX_SUBJECTS; trailing empty slots are
/// trimmed on load.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub name: String,
    pub seat_number: String,
    pub department: Option<String>,
    pub year: Option<String>,
    pub semester: Option<String>,
    pub total_marks: Option<f64>,
    pub external_marks: Option<f64>,
    pub internal_marks: Option<f64>,
    pub subjects: Vec<SubjectSlot>,
}

impl StudentRecord {
    pub fn slot(&self, index: usize) -> Option<&SubjectSlot> {
        self.subjects.get(index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCount {
    pub department: String,
    pub total_students: u64,
}
