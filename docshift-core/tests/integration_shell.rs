//! Integration tests running real converter chains through the shell.
//!
//! The converters are plain `cp`/`cat` commands so the tests only need a
//! POSIX shell, but every layer is real: token substitution, per-step
//! working directories, result moving and export copying.

#![cfg(unix)]

use docshift_core::testing::{RecordingLoader, ScriptedUi, StaticDocument};
use docshift_core::{
    ConversionContext, ConvertError, Converters, Exporter, Formats, Importer, Loader,
};
use docshift_exec::ShellRunner;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;

/// text -> markdown -> html, html -> text, markdown -> broken
fn create_registry() -> (Formats, Converters) {
    let mut formats = Formats::new();
    formats.add_full("text", "txt", "Plain text", "T");
    formats.add_full("markdown", "md", "Markdown", "M");
    formats.add_full("html", "html", "HTML", "H");
    formats.add_full("broken", "bad", "Broken", "");

    let mut converters = Converters::new();
    for (from, to, command) in [
        ("text", "markdown", "cp $$i $$o"),
        ("markdown", "html", "cat $$i > $$o"),
        ("html", "text", "cp $$i $$o"),
        ("markdown", "broken", "exit 3"),
    ] {
        converters.add(&mut formats, from, to, command, "").unwrap();
    }
    converters.build_graph(&formats).unwrap();
    (formats, converters)
}

#[tokio::test]
async fn test_two_step_chain_through_shell() {
    let (formats, converters) = create_registry();
    let runner = ShellRunner::new();
    let dir = tempdir().unwrap();
    let source = dir.path().join("notes.txt");
    fs::write(&source, "hello world\n").unwrap();

    let ctx = ConversionContext::new(&runner, dir.path());
    let conversion = converters
        .convert(
            &formats,
            &ctx,
            &source,
            &dir.path().join("notes"),
            "text",
            "html",
        )
        .await
        .unwrap();

    let html = dir.path().join("notes.html");
    assert_eq!(conversion.steps, 2);
    assert_eq!(conversion.result_file, Some(html.clone()));
    assert_eq!(fs::read_to_string(&html).unwrap(), "hello world\n");
    assert!(dir.path().join("notes.md").exists());
}

#[tokio::test]
async fn test_shell_failure_reports_exit_code() {
    let (formats, converters) = create_registry();
    let runner = ShellRunner::new();
    let dir = tempdir().unwrap();
    let source = dir.path().join("notes.txt");
    fs::write(&source, "hello").unwrap();

    let ctx = ConversionContext::new(&runner, dir.path());
    let result = converters
        .convert(
            &formats,
            &ctx,
            &source,
            &dir.path().join("notes"),
            "text",
            "broken",
        )
        .await;

    match result {
        Err(ConvertError::ConverterFailed {
            from,
            to,
            exit_code,
            ..
        }) => {
            assert_eq!((from.as_str(), to.as_str()), ("markdown", "broken"));
            assert_eq!(exit_code, Some(3));
        }
        other => panic!("expected ConverterFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_paths_with_spaces_are_quoted() {
    let (formats, converters) = create_registry();
    let runner = ShellRunner::new();
    let dir = tempdir().unwrap();
    let work = dir.path().join("my notes");
    fs::create_dir(&work).unwrap();
    let source = work.join("draft one.txt");
    fs::write(&source, "spaced").unwrap();

    let ctx = ConversionContext::new(&runner, &work);
    converters
        .convert(
            &formats,
            &ctx,
            &source,
            &work.join("draft one"),
            "text",
            "markdown",
        )
        .await
        .unwrap();

    assert_eq!(
        fs::read_to_string(work.join("draft one.md")).unwrap(),
        "spaced"
    );
}

#[tokio::test]
async fn test_export_and_reimport() {
    let (formats, converters) = create_registry();
    let runner = ShellRunner::new();
    let doc_dir = tempdir().unwrap();
    let temp_dir = tempdir().unwrap();
    let document = StaticDocument::new(
        doc_dir.path().join("report.txt"),
        temp_dir.path(),
        "text",
    )
    .with_content("# Report\n");
    let ui = ScriptedUi::new(vec![]);

    let exported = Exporter::new(&formats, &converters, &runner)
        .export(&document, &ui, "html", false)
        .await
        .unwrap();

    let html = doc_dir.path().join("report.html");
    assert_eq!(exported.backend, "text");
    assert_eq!(exported.result_file, Some(html.clone()));
    assert_eq!(fs::read_to_string(&html).unwrap(), "# Report\n");

    let loader = RecordingLoader::new();
    let imported = Importer::new(&formats, &converters, &runner)
        .import(&loader, &html, "html")
        .await
        .unwrap();

    let text = doc_dir.path().join("report.txt");
    assert_eq!(imported.loader, Loader::Text);
    assert_eq!(imported.loaded_file, text.clone());
    assert_eq!(loader.texts(), vec![(text, false)]);
}

#[tokio::test]
async fn test_relative_input_paths() {
    let (formats, converters) = create_registry();
    let runner = ShellRunner::new();
    let cwd = std::env::current_dir().unwrap();
    let dir = tempfile::Builder::new()
        .prefix("relative-")
        .tempdir_in(&cwd)
        .unwrap();
    let relative = dir.path().strip_prefix(&cwd).unwrap().to_path_buf();
    fs::write(dir.path().join("a.txt"), "relative\n").unwrap();

    let ctx = ConversionContext::new(&runner, &relative);
    let conversion = converters
        .convert(
            &formats,
            &ctx,
            &relative.join("a.txt"),
            &relative.join("a"),
            "text",
            "markdown",
        )
        .await
        .unwrap();

    let markdown = dir.path().join("a.md");
    assert_eq!(conversion.result_file, Some(markdown.clone()));
    assert_eq!(fs::read_to_string(&markdown).unwrap(), "relative\n");

    fs::write(dir.path().join("b.html"), "page\n").unwrap();
    let loader = RecordingLoader::new();
    let imported = Importer::new(&formats, &converters, &runner)
        .import(&loader, &relative.join("b.html"), "html")
        .await
        .unwrap();

    let text = dir.path().join("b.txt");
    assert_eq!(imported.loaded_file, text.clone());
    assert_eq!(fs::read_to_string(&text).unwrap(), "page\n");
}
