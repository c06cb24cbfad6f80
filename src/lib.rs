//! # Samplepack Core Library
//!
//! This crate provides the engine behind the `samplepack` tool: users browse audio
//! samples on disk or inside ZIP archives, assemble a *virtual* pack of references
//! organized into folders, and materialize it as a ZIP archive.
//!
//! The `samplepack` binary is a thin driver over this API; a UI shell can use the same
//! types directly.
//!
//! ## Key Modules
//!
//! - [`catalog`]: Lists directories and archives as browsable, audio-classified entries.
//! - [`pack`]: The virtual pack model, its session state and the JSON manifest.
//! - [`resolve`]: Reads the bytes behind an item reference for preview or export.
//! - [`materialize`]: Stages a pack on disk and writes it out as a ZIP archive.
//! - [`combine`]: Merges several pack archives into one.
//! - [`archive`]: ZIP reading and writing on top of the `zip` crate.
//!
//! ## Examples
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use samplepack::pack::{ItemSource, Pack, PackItem};
//!
//! let mut pack = Pack::new("Drums");
//! pack.create_folder(None, "kicks")?;
//! let source = ItemSource::Disk { path: "/samples/kick.wav".into() };
//! pack.add_item(Some("kicks"), PackItem::new("kick.wav", source, 0))?;
//!
//! let outcome = samplepack::materialize::materialize(&pack, "Drums.zip".as_ref()).await?;
//! if let Some(report) = outcome.report() {
//!     println!("{}", report.summary());
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod catalog;
pub mod cli;
pub mod cli_runner;
pub mod combine;
pub mod config;
pub mod error;
pub mod materialize;
pub mod pack;
pub mod progress;
pub mod resolve;

// Async filesystem helpers
pub mod fsx;

pub use config::EngineConfig;
pub use error::{ArchiveError, CombineError, ConfigError, MaterializeError, PackError, SourceUnavailable};
pub use materialize::{ExportOutcome, ExportReport, Materializer};
pub use pack::{Pack, PackItem, PackSession};
