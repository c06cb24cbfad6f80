use samplepack::combine::BatchCombiner;
use samplepack::config::EngineConfig;
use samplepack::error::CombineError;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::tempdir;
use zip::write::FileOptions;

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) -> Result<(), Box<dyn std::error::Error>> {
    let mut zip = zip::ZipWriter::new(fs::File::create(path)?);
    for (name, data) in entries {
        zip.start_file(*name, FileOptions::default())?;
        zip.write_all(data)?;
    }
    zip.finish()?;
    Ok(())
}

fn config_in(dir: &Path) -> EngineConfig {
    EngineConfig { temp_root: dir.join("scratch"), output_dir: dir.join("out"), ..EngineConfig::default() }
}

#[tokio::test]
async fn test_combine_nests_each_archive_under_its_name() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let drums = dir.path().join("drums.zip");
    let keys = dir.path().join("keys.zip");
    write_zip(&drums, &[("kick.wav", b"kick"), ("fills/fill.wav", b"fill")])?;
    write_zip(&keys, &[("pad.wav", b"pad")])?;

    let config = config_in(dir.path());
    let output = BatchCombiner::new(&config).combine(&[drums, keys]).await?;

    assert!(output.starts_with(&config.output_dir));
    let name = output.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("combined-pack-") && name.ends_with(".zip"), "{name}");

    let mut archive = zip::ZipArchive::new(fs::File::open(&output)?)?;
    let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(names, ["drums/", "drums/fills/", "drums/fills/fill.wav", "drums/kick.wav", "keys/", "keys/pad.wav"]);

    let mut pad = String::new();
    archive.by_name("keys/pad.wav")?.read_to_string(&mut pad)?;
    assert_eq!(pad, "pad");

    let leftovers = fs::read_dir(&config.temp_root)?.count();
    assert_eq!(leftovers, 0, "scratch directory should be removed");
    Ok(())
}

#[tokio::test]
async fn test_bad_archive_aborts_the_batch() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let good = dir.path().join("good.zip");
    write_zip(&good, &[("a.wav", b"a")])?;
    let bad = dir.path().join("bad.zip");
    fs::write(&bad, b"not a zip")?;

    let config = config_in(dir.path());
    let err = BatchCombiner::new(&config).combine(&[good, bad.clone()]).await.unwrap_err();
    match err {
        CombineError::Extract { archive, .. } => assert_eq!(archive, bad),
        other => panic!("unexpected error: {other}"),
    }

    assert!(!config.output_dir.exists() || fs::read_dir(&config.output_dir)?.next().is_none());
    assert_eq!(fs::read_dir(&config.temp_root)?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_combine_rejects_empty_input() {
    let dir = tempdir().unwrap();
    let result = BatchCombiner::new(&config_in(dir.path())).combine(&[]).await;
    assert!(matches!(result, Err(CombineError::NoInputs)));
}
