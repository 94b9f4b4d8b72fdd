//! Grading-service client.
//!
//! An explicit client value bound to one base URL at construction; nothing
//! here is global. The service exposes a listing page with a directory
//! select and a submission endpoint that compiles and tests an uploaded
//! source file, answering with the HTML result page the scraper consumes.

use once_cell::sync::Lazy;
use reqwest::blocking::{multipart, Client};
use scraper::{Html, Selector};

use crate::errors::KavaError;

pub const DEFAULT_BASE_URL: &str = "http://lambda.fri.uni-lj.si";

const LISTING_PATH: &str = "/cgi-bin/index.pl";
const SUBMIT_PATH: &str = "/cgi-bin/modules/testJavaDN.pl";

// The select's placeholder entry and scratch path never denote specs.
const LISTING_PLACEHOLDER: &str = "Izberi nalogo...";
const SCRATCH_PATH: &str = "/tmp";

static DIR_OPTIONS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("select#dir > option").expect("static selector"));

/// A selectable spec identity on the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSpec {
    pub name: String,
    pub path: String,
}

/// Client bound to one grading-service base URL.
pub struct RemoteClient {
    base_url: String,
    http: Client,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Lists the specs currently selectable on the service.
    pub fn list_specs(&self) -> Result<Vec<RemoteSpec>, KavaError> {
        let page = self.http.get(self.url(LISTING_PATH)).send()?.text()?;
        parse_spec_listing(&page)
    }

    /// Submits `source` for the exercise at remote directory `dir`,
    /// returning the raw HTML result page.
    pub fn submit(&self, dir: &str, source: &str) -> Result<String, KavaError> {
        let javafile = multipart::Part::bytes(source.as_bytes().to_vec())
            .file_name(format!("{dir}.java"))
            .mime_str("text/x-java")?;
        let form = multipart::Form::new()
            .text("dir", dir.to_string())
            .part("javafile", javafile);

        let response = self.http.post(self.url(SUBMIT_PATH)).multipart(form).send()?;
        Ok(response.text()?)
    }

    /// Resolves `name` through the listing and submits either the given
    /// source or a generated placeholder program.
    pub fn test_by_name(&self, name: &str, source: Option<&str>) -> Result<String, KavaError> {
        let dir = self.spec_dir(name)?;
        match source {
            Some(code) => self.submit(&dir, code),
            None => self.submit(&dir, &placeholder_source(name)),
        }
    }

    fn spec_dir(&self, name: &str) -> Result<String, KavaError> {
        self.list_specs()?
            .into_iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.path)
            .ok_or_else(|| KavaError::UnknownSpec {
                name: name.to_string(),
            })
    }
}

impl Default for RemoteClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Extracts `{name, path}` pairs from the listing page's directory select.
fn parse_spec_listing(page: &str) -> Result<Vec<RemoteSpec>, KavaError> {
    let document = Html::parse_document(page);
    let mut options = document.select(&DIR_OPTIONS).peekable();
    if options.peek().is_none() {
        return Err(KavaError::MissingElement {
            what: "select#dir".to_string(),
        });
    }

    Ok(options
        .map(|option| RemoteSpec {
            name: option.text().collect::<String>(),
            path: option
                .value()
                .attr("value")
                .unwrap_or_default()
                .to_string(),
        })
        .filter(|spec| spec.name != LISTING_PLACEHOLDER && spec.path != SCRATCH_PATH)
        .collect())
}

/// The service insists on a compilable submission even when only the result
/// page is wanted, so `dump` sends this stub.
fn placeholder_source(main_class: &str) -> String {
    format!(
        "public class {main_class} {{\n    public static void main(String[] args) {{\n        System.out.println(\"kava dumping {main_class}\");\n    }}\n}}\n"
    )
}
