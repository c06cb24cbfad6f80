use samplepack::catalog::{self, EntryOrigin};
use samplepack::pack::{ItemSource, PackSession};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;
use zip::write::FileOptions;

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) -> Result<(), Box<dyn std::error::Error>> {
    let mut zip = zip::ZipWriter::new(fs::File::create(path)?);
    for (name, data) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, FileOptions::default())?;
        } else {
            zip.start_file(*name, FileOptions::default())?;
            zip.write_all(data)?;
        }
    }
    zip.finish()?;
    Ok(())
}

#[tokio::test]
async fn test_archive_directories_are_synthesized_once() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let kit = dir.path().join("kit.zip");
    write_zip(&kit, &[("kicks/kick1.wav", b"k1"), ("kicks/sub/kick2.wav", b"k2"), ("notes.txt", b"n")])?;

    let listing = catalog::list_archive(&kit).await;
    assert!(listing.warning.is_none());

    let dirs: Vec<_> = listing.directories().map(|e| e.path.as_str()).collect();
    assert_eq!(dirs, ["kicks/", "kicks/sub/"]);
    let audio: Vec<_> = listing.audio_files().map(|e| (e.name.as_str(), e.size)).collect();
    assert_eq!(audio, [("kick1.wav", Some(2)), ("kick2.wav", Some(2))]);
    assert_eq!(listing.entries.len(), 4);
    assert!(listing
        .entries
        .iter()
        .all(|e| e.origin == EntryOrigin::Archive { archive_path: kit.clone() }));
    Ok(())
}

#[tokio::test]
async fn test_directory_listing_classifies_children() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::create_dir(dir.path().join("loops"))?;
    fs::write(dir.path().join("Snare.WAV"), b"12345")?;
    fs::write(dir.path().join("readme.md"), b"#")?;

    let listing = catalog::list_directory(dir.path()).await;
    assert!(listing.warning.is_none());
    assert_eq!(listing.entries.len(), 3);

    let snare = listing.entries.iter().find(|e| e.name == "Snare.WAV").expect("snare listed");
    assert!(snare.is_audio);
    assert_eq!(snare.size, Some(5));
    let readme = listing.entries.iter().find(|e| e.name == "readme.md").expect("readme listed");
    assert!(!readme.is_audio);
    assert_eq!(readme.size, None);
    let loops = listing.entries.iter().find(|e| e.name == "loops").expect("loops listed");
    assert!(loops.is_directory);
    Ok(())
}

#[tokio::test]
async fn test_unreadable_sources_yield_warnings() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let missing = catalog::list_directory(&dir.path().join("nope")).await;
    assert!(missing.entries.is_empty());
    assert!(missing.warning.is_some());

    let bogus = dir.path().join("bogus.zip");
    fs::write(&bogus, b"this is not a zip file")?;
    let listing = catalog::list_archive(&bogus).await;
    assert!(listing.entries.is_empty());
    assert!(listing.warning.as_deref().is_some_and(|w| w.contains("bogus.zip")));
    Ok(())
}

#[tokio::test]
async fn test_dropping_catalog_entries_into_session() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let kit = dir.path().join("kit.zip");
    write_zip(&kit, &[("hats/", b""), ("hats/open.wav", b"oh")])?;
    let listing = catalog::list_archive(&kit).await;

    let mut session = PackSession::new();
    session.create_folder(Some("hats".to_string()).into())?;
    for entry in &listing.entries {
        session.drop_entry(entry)?;
    }

    let hats = session.pack().items(Some("hats")).expect("hats folder");
    assert_eq!(hats.len(), 1);
    assert_eq!(
        hats[0].source(),
        &ItemSource::Archive { archive: kit.clone(), entry: "hats/open.wav".into() }
    );
    Ok(())
}
