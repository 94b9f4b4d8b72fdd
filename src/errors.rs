//! Unified error taxonomy for the whole pipeline.
//!
//! Every failure kind maps to exactly one variant with a stable diagnostic
//! code. All of them are unrecoverable where they are raised: they propagate
//! with `?` to the CLI entry point, which renders the report and exits
//! non-zero. A mismatched test is never an error, only a `FAIL` verdict.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum KavaError {
    /// The result page does not have the layout the scraper anchors on.
    #[error("unexpected document layout: {reason}")]
    #[diagnostic(
        code(kava::scrape::layout),
        help("the grading service may have changed its result page format")
    )]
    MalformedDocument { reason: String },

    #[error("no stored spec named '{name}' under {}", .dir.display())]
    #[diagnostic(code(kava::store::not_found), help("run `kava dump {name}` first"))]
    SpecNotFound { name: String, dir: PathBuf },

    #[error("stored spec '{name}' is corrupt")]
    #[diagnostic(code(kava::store::corrupt), help("re-dump the spec to refresh the record"))]
    CorruptSpec {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not encode the spec record for '{name}'")]
    #[diagnostic(code(kava::store::encode))]
    EncodeSpec {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("compilation failed: {reason}")]
    #[diagnostic(code(kava::program::compile))]
    Compile { reason: String },

    #[error("could not launch the program under test")]
    #[diagnostic(code(kava::program::launch), help("is a Java runtime on PATH?"))]
    Launch {
        #[source]
        source: io::Error,
    },

    #[error("'{item}' is not a test number or a test range")]
    #[diagnostic(
        code(kava::select::invalid),
        help("selectors look like `3`, `1-5`, or `1,4-6`")
    )]
    InvalidSelector { item: String },

    #[error("remote request failed")]
    #[diagnostic(code(kava::remote::http))]
    Remote(#[from] reqwest::Error),

    #[error("listing page is missing its {what} element")]
    #[diagnostic(code(kava::remote::document))]
    MissingElement { what: String },

    #[error("spec '{name}' does not exist on the remote server")]
    #[diagnostic(code(kava::remote::unknown), help("`kava list` shows the available specs"))]
    UnknownSpec { name: String },

    #[error("source file not found: {}", .path.display())]
    #[diagnostic(code(kava::cli::missing_file))]
    SourceMissing { path: PathBuf },

    #[error("expected a .java source file, got {}", .path.display())]
    #[diagnostic(code(kava::cli::extension))]
    WrongExtension { path: PathBuf },

    #[error("i/o failure at {}", .path.display())]
    #[diagnostic(code(kava::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl KavaError {
    /// Attaches the offending path to a filesystem error.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
