//! Examiner model.

use serde::{Deserialize, Serialize};

use super::ExaminerId;

/// An examiner whose evaluation work is paid for.
///
/// Examiners are owned by the surrounding application; the engine only
/// reads them to label calculations and group reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Examiner {
    /// Unique identifier for the examiner.
    pub id: ExaminerId,
    /// Display name.
    pub name: String,
    /// External examiner code issued by the examination board.
    pub examiner_code: String,
    /// Department the examiner belongs to, if assigned.
    #[serde(default)]
    pub department: Option<String>,
}

impl Examiner {
    /// Returns the department name, or `None` when absent or blank.
    pub fn department_name(&self) -> Option<&str> {
        self.department
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn examiner(department: Option<&str>) -> Examiner {
        Examiner {
            id: ExaminerId::new(),
            name: "R. Iyer".to_string(),
            examiner_code: "EX-204".to_string(),
            department: department.map(str::to_string),
        }
    }

    #[test]
    fn test_department_name_trims() {
        assert_eq!(
            examiner(Some(" Physics ")).department_name(),
            Some("Physics")
        );
    }

    #[test]
    fn test_blank_department_is_none() {
        assert_eq!(examiner(Some("   ")).department_name(), None);
        assert_eq!(examiner(None).department_name(), None);
    }

    #[test]
    fn test_deserialize_without_department() {
        let json = format!(
            r#"{{"id": "{}", "name": "A", "examiner_code": "EX-1"}}"#,
            ExaminerId::new()
        );
        let examiner: Examiner = serde_json::from_str(&json).unwrap();
        assert!(examiner.department.is_none());
    }
}
