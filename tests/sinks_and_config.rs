mod common;

use std::fs;

use assert_matches::assert_matches;
use common::*;
use tablegen::prelude::*;

#[test]
fn test_directory_sink_writes_then_skips() {
    let out = tempfile::tempdir().unwrap();
    let compiler = compiler(LanguageProfile::csharp(), 2);
    let report = compiler.compile_batch(&sample_batch());

    let mut sink = DirectorySink::new(out.path().join("code"), ".generated.cs");
    assert_eq!(report.deliver(&mut sink).unwrap(), 4);
    assert!(sink.statuses().iter().all(|(_, s)| *s == WriteStatus::Written));

    let written = fs::read_to_string(out.path().join("code/DESampleComplex.generated.cs")).unwrap();
    assert_eq!(normalize(&written), golden("DESampleComplex"));

    let mut again = DirectorySink::new(out.path().join("code"), ".generated.cs");
    report.deliver(&mut again).unwrap();
    assert!(again.statuses().iter().all(|(_, s)| *s == WriteStatus::Skipped));
}

#[test]
fn test_directory_sink_rewrites_changed_unit() {
    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("DEContentsOpenTime.cs");
    fs::write(&path, "stale").unwrap();

    let report = compiler(LanguageProfile::csharp(), 1).compile_batch(&sample_batch());
    let mut sink = DirectorySink::new(out.path(), ".cs");
    report.deliver(&mut sink).unwrap();

    let status = sink
        .statuses()
        .iter()
        .find(|(name, _)| name == "DEContentsOpenTime")
        .map(|(_, status)| *status);
    assert_eq!(status, Some(WriteStatus::Written));
    assert_eq!(
        normalize(&fs::read_to_string(&path).unwrap()),
        golden("DEContentsOpenTime")
    );
}

#[test]
fn test_sink_failure_is_reported() {
    let out = tempfile::tempdir().unwrap();
    let blocker = out.path().join("blocked");
    fs::write(&blocker, "not a directory").unwrap();

    let report = compiler(LanguageProfile::csharp(), 1).compile_batch(&sample_batch());
    let mut sink = DirectorySink::new(blocker.join("code"), ".cs");
    assert_matches!(
        report.deliver(&mut sink),
        Err(TableGenError::SinkWrite { name, .. }) if name == "DEDayOfWeek"
    );
}

#[test]
fn test_profile_loaded_from_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("csharp-tabs.toml");
    let mut profile = LanguageProfile::csharp();
    profile.name = "csharp-tabs".to_string();
    profile.render.indent = "\t".to_string();
    profile.render.line_ending = "\n".to_string();
    fs::write(&path, toml::to_string(&profile).unwrap()).unwrap();

    let loaded = LanguageProfile::load(&path).unwrap();
    assert_eq!(loaded, profile);

    let sink = compile_all(&compiler(loaded, 1), &sample_batch());
    let text = sink.get("DEContentsOpenTime").unwrap();
    assert!(text.contains("\n\tpublic string startTime;\n"));
}

#[test]
fn test_invalid_profile_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    let mut profile = LanguageProfile::rust();
    profile.types.array_of_primitive = Some("Vec<T>".to_string());
    fs::write(&path, toml::to_string(&profile).unwrap()).unwrap();

    assert_matches!(
        LanguageProfile::load(&path),
        Err(TableGenError::Config(ConfigError::MissingPlaceholder { entry, .. }))
            if entry == "types.array-of-primitive"
    );

    fs::write(&path, "name = \"half\"\n").unwrap();
    assert_matches!(
        LanguageProfile::load(&path),
        Err(TableGenError::Config(ConfigError::Parse { .. }))
    );
}

#[test]
fn test_project_config_drives_a_full_run() {
    let dir = tempfile::tempdir().unwrap();
    let project_path = dir.path().join("tablegen.toml");
    fs::write(
        &project_path,
        format!(
            "schema_dir = {:?}\ncode_dir = \"generated\"\nlanguage = \"rust\"\nfile_suffix = \".rs\"\n",
            schema_dir().display().to_string()
        ),
    )
    .unwrap();

    let project = ProjectConfig::load(&project_path).unwrap();
    let compiler = Compiler::new(CompilerConfig::default(), project.language_profile().unwrap()).unwrap();
    let report = compiler.compile_batch(&SchemaBatch::load_dir(project.schema_dir()).unwrap());
    assert!(report.is_success());

    let mut sink = DirectorySink::new(project.code_dir(), project.file_suffix.as_str());
    report.deliver(&mut sink).unwrap();
    let text = fs::read_to_string(dir.path().join("generated/DEContentsOpenTime.rs")).unwrap();
    assert!(text.contains("pub day_of_week: DEDayOfWeek,"));
}

#[test]
fn test_missing_schema_dir_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    assert_matches!(
        SchemaBatch::load_dir(dir.path().join("nope")),
        Err(TableGenError::SourceRead { .. })
    );
}
