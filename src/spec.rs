//! Normalized test specification data model.
//!
//! A [`Spec`] is built once by the scraper, optionally persisted through the
//! store, and later restored unmodified for execution. Nothing mutates it
//! after construction; the harness only reads it and keeps its own transient
//! map of actual outputs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named text payload bundled with a spec, written to disk verbatim.
///
/// Content is the raw inner markup of the source block on the result page;
/// it is meant to be written back out as source text, never parsed further.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxFile {
    pub filename: String,
    pub content: String,
}

/// One (id, argument vector, expected stdout) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: u32,
    pub args: Vec<String>,
    /// Always ends with exactly one trailing newline.
    pub expected_stdout: String,
}

/// The normalized set of test cases and auxiliary files for one exercise.
///
/// Test ids and filenames are unique within a spec; `tests` and `files`
/// keep the discovery order of the source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spec {
    /// Stable identifier, carried by the record's filename rather than the
    /// payload itself.
    #[serde(skip)]
    pub name: String,
    pub files: Vec<AuxFile>,
    pub tests: Vec<TestCase>,
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Spec {}\n\tTests:", self.name)?;
        for test in &self.tests {
            write!(f, "\n\t\tTest {} [ {} ]", test.id, test.args.join(" "))?;
        }
        write!(f, "\n\tFiles:")?;
        for file in &self.files {
            write!(f, "\n\t\tFile {}", file.filename)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Spec {
        Spec {
            name: "DN02".to_string(),
            files: vec![AuxFile {
                filename: "Helper.java".to_string(),
                content: "class Helper {}".to_string(),
            }],
            tests: vec![TestCase {
                id: 1,
                args: vec!["5".to_string()],
                expected_stdout: "25\n".to_string(),
            }],
        }
    }

    #[test]
    fn payload_uses_record_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        let test = &json["tests"][0];
        assert_eq!(test["expectedStdout"], "25\n");
        assert_eq!(test["id"], 1);
        assert_eq!(json["files"][0]["filename"], "Helper.java");
    }

    #[test]
    fn name_stays_out_of_the_payload() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("name").is_none());
    }

    #[test]
    fn display_lists_tests_and_files() {
        let rendered = sample().to_string();
        assert!(rendered.contains("Test 1 [ 5 ]"));
        assert!(rendered.contains("File Helper.java"));
    }
}
