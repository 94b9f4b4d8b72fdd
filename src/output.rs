//! Colored terminal rendering of verdicts and diffs.

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::harness::{DiffKind, DiffLine, Verdict};

pub fn stdout() -> StandardStream {
    StandardStream::stdout(ColorChoice::Auto)
}

/// Prints one verdict line, plus the diff when the test failed and diffs
/// are wanted.
pub fn print_verdict(stdout: &mut StandardStream, verdict: &Verdict, show_diff: bool) {
    print!("Test {:>3}: ", verdict.id);
    let color = if verdict.passed {
        Color::Green
    } else {
        Color::Red
    };
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
    println!("{}", if verdict.passed { "PASS" } else { "FAIL" });
    let _ = stdout.reset();

    if !verdict.passed && show_diff {
        print_diff(stdout, &verdict.diff);
    }
}

fn print_diff(stdout: &mut StandardStream, lines: &[DiffLine]) {
    for line in lines {
        match line.kind {
            DiffKind::Inserted => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
                println!("+ {}", line.text);
            }
            DiffKind::Deleted => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
                println!("- {}", line.text);
            }
            DiffKind::Unchanged => {
                let _ = stdout.reset();
                println!("  {}", line.text);
            }
        }
    }
    let _ = stdout.reset();
}
