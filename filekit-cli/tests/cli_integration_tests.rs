//! Integration tests for the filekit CLI
//!
//! Runs the compiled binary against files in a temporary directory.

use anyhow::Result;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pretty_assertions::assert_eq;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::{tempdir, TempDir};

/// Test helper to get the CLI binary path
fn get_cli_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_filekit-cli"))
}

fn setup_temp_dir() -> TempDir {
    tempdir().expect("Failed to create temp directory")
}

fn run_cli_command(args: &[&str]) -> Result<Output> {
    let output = Command::new(get_cli_path()).args(args).output()?;
    Ok(output)
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

/// Writes a PDF whose pages show `Page 1` .. `Page <pages>`.
fn write_numbered_pdf(path: &Path, pages: usize) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for n in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("Page {n}"))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn page_labels(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            let content = doc.get_page_content(*id).unwrap();
            let text = String::from_utf8_lossy(&content);
            let start = text.find("(Page ").unwrap() + 1;
            let end = start + text[start..].find(')').unwrap();
            text[start..end].to_string()
        })
        .collect()
}

fn rotations(bytes: &[u8]) -> Vec<i64> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            doc.get_dictionary(*id)
                .unwrap()
                .get(b"Rotate")
                .and_then(|r| r.as_i64())
                .unwrap_or(0)
        })
        .collect()
}

#[test]
fn test_cli_help() {
    let output = run_cli_command(&["--help"]).unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["split", "rotate", "organize", "merge", "watermark", "convert", "format"] {
        assert!(stdout.contains(command), "help should list {command}");
    }
}

#[test]
fn test_cli_split_single_range() {
    let temp_dir = setup_temp_dir();
    let input = temp_dir.path().join("report.pdf");
    let output_path = temp_dir.path().join("page2.pdf");
    write_numbered_pdf(&input, 5);

    let output = run_cli_command(&[
        "split",
        path_str(&input),
        "-r",
        "2",
        "-o",
        path_str(&output_path),
    ])
    .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(page_labels(&fs::read(&output_path).unwrap()), ["Page 2"]);
}

#[test]
fn test_cli_split_multiple_ranges_to_zip() {
    let temp_dir = setup_temp_dir();
    let input = temp_dir.path().join("report.pdf");
    let output_path = temp_dir.path().join("parts.zip");
    write_numbered_pdf(&input, 5);

    let output = run_cli_command(&[
        "split",
        path_str(&input),
        "--ranges",
        "1-2, 4-5",
        "-o",
        path_str(&output_path),
    ])
    .unwrap();
    assert!(output.status.success());

    let archive = zip::ZipArchive::new(Cursor::new(fs::read(&output_path).unwrap())).unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    assert_eq!(archive.len(), 2);
    assert!(names.contains(&"report_range1.pdf"));
    assert!(names.contains(&"report_range2.pdf"));
}

#[test]
fn test_cli_split_invalid_ranges() {
    let temp_dir = setup_temp_dir();
    let input = temp_dir.path().join("report.pdf");
    write_numbered_pdf(&input, 3);

    let output = run_cli_command(&[
        "split",
        path_str(&input),
        "-r",
        "40-50",
        "-o",
        path_str(&temp_dir.path().join("out.pdf")),
    ])
    .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid page ranges"), "stderr: {stderr}");
}

#[test]
fn test_cli_merge_command() {
    let temp_dir = setup_temp_dir();
    let first = temp_dir.path().join("a.pdf");
    let second = temp_dir.path().join("b.pdf");
    let output_path = temp_dir.path().join("merged.pdf");
    write_numbered_pdf(&first, 2);
    write_numbered_pdf(&second, 1);

    let output = run_cli_command(&[
        "merge",
        path_str(&first),
        path_str(&second),
        "-o",
        path_str(&output_path),
    ])
    .unwrap();

    assert!(output.status.success());
    assert_eq!(
        page_labels(&fs::read(&output_path).unwrap()),
        ["Page 1", "Page 2", "Page 1"]
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("Merged 2 files"));
}

#[test]
fn test_cli_merge_requires_two_files() {
    let temp_dir = setup_temp_dir();
    let first = temp_dir.path().join("a.pdf");
    write_numbered_pdf(&first, 1);

    let output = run_cli_command(&[
        "merge",
        path_str(&first),
        "-o",
        path_str(&temp_dir.path().join("merged.pdf")),
    ])
    .unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_cli_rotate_command() {
    let temp_dir = setup_temp_dir();
    let input = temp_dir.path().join("scan.pdf");
    let output_path = temp_dir.path().join("rotated.pdf");
    write_numbered_pdf(&input, 3);

    let output = run_cli_command(&[
        "rotate",
        path_str(&input),
        "-o",
        path_str(&output_path),
        "-p",
        "1=90",
        "--page",
        "3=-90",
    ])
    .unwrap();

    assert!(output.status.success());
    assert_eq!(rotations(&fs::read(&output_path).unwrap()), [90, 0, 270]);
}

#[test]
fn test_cli_rotate_rejects_odd_angles() {
    let temp_dir = setup_temp_dir();
    let input = temp_dir.path().join("scan.pdf");
    write_numbered_pdf(&input, 1);

    let output = run_cli_command(&[
        "rotate",
        path_str(&input),
        "-o",
        path_str(&temp_dir.path().join("rotated.pdf")),
        "-p",
        "1=45",
    ])
    .unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_cli_organize_command() {
    let temp_dir = setup_temp_dir();
    let input = temp_dir.path().join("deck.pdf");
    let output_path = temp_dir.path().join("organized.pdf");
    write_numbered_pdf(&input, 3);

    let output = run_cli_command(&[
        "organize",
        path_str(&input),
        "-o",
        path_str(&output_path),
        "--order",
        "3,1:180,3",
    ])
    .unwrap();

    assert!(output.status.success());
    let bytes = fs::read(&output_path).unwrap();
    assert_eq!(page_labels(&bytes), ["Page 3", "Page 1", "Page 3"]);
    assert_eq!(rotations(&bytes), [0, 180, 0]);
}

#[test]
fn test_cli_watermark_command() {
    let temp_dir = setup_temp_dir();
    let input = temp_dir.path().join("memo.pdf");
    let output_path = temp_dir.path().join("stamped.pdf");
    write_numbered_pdf(&input, 2);

    let output = run_cli_command(&[
        "watermark",
        path_str(&input),
        "-o",
        path_str(&output_path),
        "-t",
        "DRAFT",
        "--position",
        "top-left",
    ])
    .unwrap();
    assert!(output.status.success());

    let doc = Document::load(&output_path).unwrap();
    for id in doc.get_pages().values() {
        let content = doc.get_page_content(*id).unwrap();
        assert!(String::from_utf8_lossy(&content).contains("(DRAFT)"));
    }
}

#[test]
fn test_cli_watermark_rejects_unknown_position() {
    let temp_dir = setup_temp_dir();
    let input = temp_dir.path().join("memo.pdf");
    write_numbered_pdf(&input, 1);

    let output = run_cli_command(&[
        "watermark",
        path_str(&input),
        "-o",
        path_str(&temp_dir.path().join("stamped.pdf")),
        "-t",
        "DRAFT",
        "--position",
        "upside-down",
    ])
    .unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_cli_format_file() {
    let temp_dir = setup_temp_dir();
    let input = temp_dir.path().join("data.json");
    fs::write(&input, r#"{"name":"filekit","tags":["pdf","media"]}"#).unwrap();

    let output = run_cli_command(&["format", "-l", "json", path_str(&input)]).unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "{\n  \"name\": \"filekit\",\n  \"tags\": [\n    \"pdf\",\n    \"media\"\n  ]\n}\n"
    );
}

#[test]
fn test_cli_format_rejects_unknown_language() {
    let temp_dir = setup_temp_dir();
    let input = temp_dir.path().join("data.yaml");
    fs::write(&input, "a: 1").unwrap();

    let output = run_cli_command(&["format", "-l", "yaml", path_str(&input)]).unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_cli_word_to_pdf_requires_docx() {
    let temp_dir = setup_temp_dir();
    let input = temp_dir.path().join("notes.txt");
    fs::write(&input, "hello").unwrap();

    let output = run_cli_command(&[
        "word-to-pdf",
        path_str(&input),
        "-o",
        path_str(&temp_dir.path().join("notes.pdf")),
    ])
    .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("only .docx files are supported"));
}

#[test]
fn test_cli_convert_without_tool_fails() {
    let temp_dir = setup_temp_dir();
    let input = temp_dir.path().join("clip.mov");
    fs::write(&input, b"fake").unwrap();

    let output = run_cli_command(&[
        "--ffmpeg",
        path_str(&temp_dir.path().join("missing-tool")),
        "convert",
        path_str(&input),
        "-f",
        "mp4",
    ])
    .unwrap();

    assert!(!output.status.success());
    assert!(!temp_dir.path().join("clip.mp4").exists());
}

#[test]
fn test_cli_nonexistent_input() {
    let temp_dir = setup_temp_dir();
    let output = run_cli_command(&[
        "split",
        path_str(&temp_dir.path().join("nope.pdf")),
        "-r",
        "1",
        "-o",
        path_str(&temp_dir.path().join("out.pdf")),
    ])
    .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nope.pdf"));
}

#[cfg(unix)]
#[test]
fn test_cli_chop_lists_segments() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = setup_temp_dir();
    let tool = temp_dir.path().join("fake-ffmpeg");
    fs::write(
        &tool,
        "#!/bin/sh\nfor last; do :; done\nprintf x > \"$(printf \"$last\" 0)\"\nprintf x > \"$(printf \"$last\" 1)\"\n",
    )
    .unwrap();
    fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

    let input = temp_dir.path().join("talk.mp3");
    fs::write(&input, b"fake").unwrap();
    let out_dir = temp_dir.path().join("segments");
    fs::create_dir(&out_dir).unwrap();

    let output = run_cli_command(&[
        "--ffmpeg",
        path_str(&tool),
        "chop",
        path_str(&input),
        "-m",
        "5",
        "-d",
        path_str(&out_dir),
    ])
    .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 2);
    assert_eq!(fs::read_dir(&out_dir).unwrap().count(), 2);
}
