use std::fs;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn output(f: impl FnOnce(&mut Vec<u8>) -> anyhow::Result<()>) -> (anyhow::Result<()>, String) {
    let mut buf = Vec::new();
    let result = f(&mut buf);
    (result, String::from_utf8(buf).expect("utf-8 output"))
}

#[test]
fn check_lists_directives_with_their_owner() {
    let reports = mastro_cli::check_markup(&fs::read_to_string(fixture("counter.html")).unwrap());
    let summary: Vec<(Option<&str>, &str, &str)> = reports
        .iter()
        .map(|r| (r.owner.as_deref(), r.element.as_str(), r.directive.as_str()))
        .collect();
    assert_eq!(
        summary,
        [
            (Some("my-counter"), "slot", "count"),
            (Some("my-counter"), "p", "class.hidden = greater3"),
            (Some("my-counter"), "p", "style.display = hideGreater3"),
            (Some("my-counter"), "button", "dec"),
            (Some("my-counter"), "button", "inc"),
            (Some("my-counter"), "x-badge", "props.count = count"),
            (Some("x-badge"), "b", "count"),
        ]
    );
    assert!(reports.iter().all(|r| r.is_valid()));
    assert_eq!(reports[1].outcome.as_deref(), Ok("class.hidden = greater3 [Class]"));
}

#[test]
fn check_counts_invalid_directives() {
    let counter = fixture("counter.html");
    let broken = fixture("broken.html");
    let files: Vec<&Path> = vec![counter.as_path(), broken.as_path()];
    let mut out = Vec::new();
    let invalid = mastro_cli::check_cmd(&files, &mut out).expect("files are readable");
    let out = String::from_utf8(out).unwrap();

    // `= oops`, `class = flag` (no subtarget) and `save(`.
    assert_eq!(invalid, 3);
    assert!(out.contains("counter.html: 7 directive(s)"), "{out}");
    assert!(out.contains("<x-form> input[data-bind] value = name [Property]"), "{out}");
    assert!(out.contains("<x-form> button[data-args] 2 argument(s)"), "{out}");
}

#[test]
fn check_reports_missing_files() {
    let missing = fixture("missing.html");
    let err = mastro_cli::check_cmd(&[missing.as_path()], &mut Vec::new()).unwrap_err();
    assert!(err.to_string().contains("failed to read"));
}

#[test]
fn parse_prints_descriptors() {
    let (result, out) = output(|buf| mastro_cli::parse_cmd("style.display = value; fn('str', 7)", false, buf));
    result.unwrap();
    assert!(out.contains("style.display = value [Nested]"), "{out}");
    assert!(out.contains("  subtarget: display"), "{out}");
    assert!(out.contains("innerHTML = fn('str', 7) [InnerHtml]"), "{out}");

    let (result, out) = output(|buf| mastro_cli::parse_cmd("ok; (bad", false, buf));
    assert!(result.is_err());
    assert!(out.contains("error:"), "{out}");
}

#[test]
fn parse_event_directives() {
    let (result, out) = output(|buf| mastro_cli::parse_cmd("app#go('home', 2)", true, buf));
    result.unwrap();
    assert!(out.contains("method: go"), "{out}");
    assert!(out.contains(r#"Str("home")"#), "{out}");
}

#[test]
fn render_buffered_and_streamed_agree() {
    let input = fixture("counter.html");
    let (result, buffered) = output(|buf| mastro_cli::render_cmd(&input, Some("Counter"), false, buf));
    result.unwrap();
    let (result, streamed) = output(|buf| mastro_cli::render_cmd(&input, Some("Counter"), true, buf));
    result.unwrap();

    assert_eq!(buffered, streamed);
    assert!(buffered.starts_with("<!DOCTYPE html>\n<html lang=\"en\">"));
    assert!(buffered.contains("<title>Counter</title>"));
    assert!(buffered.contains(r#"<slot data-bind="count">0</slot>"#));
}

#[test]
fn render_defaults_the_title_to_the_file_name() {
    let (result, out) = output(|buf| mastro_cli::render_cmd(&fixture("counter.html"), None, false, buf));
    result.unwrap();
    assert!(out.contains("<title>counter</title>"));
}
