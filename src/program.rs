//! Compilation and execution of the program under test.
//!
//! Programs run with the compilation output directory as their working
//! directory, stdout piped, stderr and exit status dropped: only the
//! captured text is graded.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::errors::KavaError;

const COMPILER: &str = "javac";
const RUNTIME: &str = "java";
const ARTIFACT_EXT: &str = "class";
pub const SOURCE_EXT: &str = "java";

const WATCHDOG_POLL: Duration = Duration::from_millis(50);

/// Anything the harness can run once per test case.
///
/// Implementations must be callable from several threads at once; the
/// harness fans out one task per test.
pub trait CompiledProgram: Sync {
    /// Runs the program with `args`, returning captured stdout once the
    /// process exits. A non-zero exit is not a failure of this call. With a
    /// timeout set, the process is killed at the deadline and whatever
    /// output it produced is returned.
    fn run(&self, args: &[String], timeout: Option<Duration>) -> Result<String, KavaError>;
}

/// Handle to a compiled Java program: its class directory and main class.
#[derive(Debug, Clone)]
pub struct JavaProgram {
    dir: PathBuf,
    class_name: String,
}

/// Compiles `source` into `out_dir` and returns a handle to the result.
///
/// Fails with [`KavaError::Compile`] when the compiler exits non-zero or
/// the expected class file is not found afterward.
pub fn compile(source: &Path, out_dir: &Path) -> Result<JavaProgram, KavaError> {
    let status = Command::new(COMPILER)
        .arg("-d")
        .arg(out_dir)
        .arg(source)
        .current_dir(out_dir)
        .status()
        .map_err(|e| KavaError::Compile {
            reason: format!("could not start {COMPILER}: {e}"),
        })?;
    if !status.success() {
        return Err(KavaError::Compile {
            reason: format!("{COMPILER} exited with {status}"),
        });
    }

    let class_name = source
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| KavaError::Compile {
            reason: format!("source path {} has no usable file name", source.display()),
        })?;

    let artifact = out_dir.join(format!("{class_name}.{ARTIFACT_EXT}"));
    if !artifact.exists() {
        return Err(KavaError::Compile {
            reason: format!("expected artifact {} not found", artifact.display()),
        });
    }

    Ok(JavaProgram {
        dir: out_dir.to_path_buf(),
        class_name,
    })
}

impl JavaProgram {
    fn spawn(&self, args: &[String]) -> Result<Child, KavaError> {
        Command::new(RUNTIME)
            .arg(&self.class_name)
            .args(args)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| KavaError::Launch { source })
    }
}

impl CompiledProgram for JavaProgram {
    fn run(&self, args: &[String], timeout: Option<Duration>) -> Result<String, KavaError> {
        let mut child = self.spawn(args)?;
        let stdout = child.stdout.take();

        let child = Arc::new(Mutex::new(child));
        let finished = Arc::new(AtomicBool::new(false));
        if let Some(limit) = timeout {
            let child = Arc::clone(&child);
            let finished = Arc::clone(&finished);
            thread::spawn(move || watchdog(child, finished, limit));
        }

        let mut raw = Vec::new();
        if let Some(mut stdout) = stdout {
            stdout
                .read_to_end(&mut raw)
                .map_err(|source| KavaError::Launch { source })?;
        }
        finished.store(true, Ordering::Release);
        child
            .lock()
            .wait()
            .map_err(|source| KavaError::Launch { source })?;

        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}

/// Kills the child once `limit` elapses, unless the run finished first.
fn watchdog(child: Arc<Mutex<Child>>, finished: Arc<AtomicBool>, limit: Duration) {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if finished.load(Ordering::Acquire) {
            return;
        }
        thread::sleep(WATCHDOG_POLL);
    }
    if !finished.load(Ordering::Acquire) {
        let _ = child.lock().kill();
    }
}
