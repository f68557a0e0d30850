//! Export pipeline: writes container entries to a directory tree.
//!
//! Each selected catalog entry is one item. Items are processed by a bounded
//! worker set of `max_in_flight` rayon threads, or by a plain loop when the
//! bound is one. A failing item is reported through
//! [`ExportProgress::on_error`] and never stops the rest of the run.
//!
//! Entries that are containers themselves are exported recursively into a
//! directory named after the entry, inside the worker handling the item.
//!
//! Catalog paths may repeat. Only the first selected entry of a path is
//! written; every later one is reported as an `Ambiguous` failure, so no
//! two workers ever target the same file.

pub mod dest;
pub mod filters;

use std::collections::HashMap;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::Archive;
use crate::ArchiveError;
use crate::ExportConfig;
use crate::ExportProgress;
use crate::ExportReport;
use crate::FileOption;
use crate::Result;
use crate::catalog::CatalogEntry;
use crate::factory::Materialized;
use crate::multi::MultiArchive;
use crate::report::ExportFailure;

pub use dest::DestRoot;

/// Name of the manifest written in `Marker` mode.
pub const MARKER_FILE: &str = "containers.marker";

/// Exports an archive below `dest`, opening it first if needed.
///
/// # Errors
///
/// Only errors that prevent the run as a whole: an invalid configuration, a
/// container that fails to open, or a destination that cannot be created.
/// Per-entry failures are collected in the report.
///
/// # Examples
///
/// ```
/// use gamepak_core::ArchiveBuilder;
/// use gamepak_core::ArchiveContext;
/// use gamepak_core::ExportConfig;
/// use gamepak_core::NoopProgress;
/// use gamepak_core::export::export_archive;
/// use gamepak_core::test_utils::create_test_tar;
/// use std::sync::Arc;
///
/// let tar = create_test_tar(vec![("maps/e1m1.bsp", b"BSP29")]);
/// let archive = ArchiveBuilder::new(Arc::new(ArchiveContext::default()))
///     .bytes("pak0.tar", tar)
///     .build()
///     .unwrap();
/// let out = tempfile::tempdir().unwrap();
/// let report =
///     export_archive(&archive, out.path(), &ExportConfig::default(), &NoopProgress).unwrap();
/// assert_eq!(report.files_written, 1);
/// assert!(out.path().join("maps/e1m1.bsp").is_file());
/// ```
pub fn export_archive(
    archive: &Arc<Archive>,
    dest: &Path,
    config: &ExportConfig,
    progress: &dyn ExportProgress,
) -> Result<ExportReport> {
    config.validate()?;
    archive.open()?;
    let start = Instant::now();
    let exporter = Exporter::new(DestRoot::create(dest)?, config, progress)?;

    exporter.export_items(archive, "", true)?;
    exporter.finish(start, archive.name())
}

/// Exports every member of a Multi container below `dest/<member name>`.
///
/// A member that fails to open is reported as a failure at index `usize::MAX`
/// and the remaining members are still exported.
///
/// # Errors
///
/// An invalid configuration or an unusable destination.
pub fn export_multi(
    multi: &MultiArchive,
    dest: &Path,
    config: &ExportConfig,
    progress: &dyn ExportProgress,
) -> Result<ExportReport> {
    config.validate()?;
    let start = Instant::now();
    let exporter = Exporter::new(DestRoot::create(dest)?, config, progress)?;

    for member in multi.members() {
        exporter.report.lock().containers.push(member.name().to_string());
        let result = member
            .open()
            .and_then(|()| exporter.export_items(member, member.name(), true));
        if let Err(e) = result {
            exporter.fail(usize::MAX, member.name().to_string(), &e);
        }
    }
    exporter.finish(start, multi.name())
}

struct Exporter<'a> {
    root: DestRoot,
    config: &'a ExportConfig,
    progress: &'a dyn ExportProgress,
    workers: Option<rayon::ThreadPool>,
    report: Mutex<ExportReport>,
}

impl<'a> Exporter<'a> {
    fn new(
        root: DestRoot,
        config: &'a ExportConfig,
        progress: &'a dyn ExportProgress,
    ) -> Result<Self> {
        let workers = if config.max_in_flight > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.max_in_flight)
                .thread_name(|i| format!("gamepak-export-{i}"))
                .build()
                .map_err(|e| ArchiveError::Config(format!("cannot start export workers: {e}")))?;
            Some(pool)
        } else {
            None
        };
        Ok(Self {
            root,
            config,
            progress,
            workers,
            report: Mutex::new(ExportReport::new()),
        })
    }

    /// Exports the catalog of `archive` below `prefix`. Only the top level
    /// honours `start_index` and the include patterns.
    fn export_items(&self, archive: &Arc<Archive>, prefix: &str, top_level: bool) -> Result<()> {
        let entries = archive.entries()?;
        let total = entries.len();
        let selected: Vec<(usize, Arc<CatalogEntry>)> = entries
            .into_iter()
            .enumerate()
            .skip(if top_level { self.config.start_index } else { 0 })
            .filter(|(_, entry)| !top_level || self.config.includes(entry.path()))
            .collect();
        let items = claim_destinations(selected);

        tracing::debug!(
            archive = archive.name(),
            prefix,
            items = items.len(),
            total,
            "exporting catalog"
        );

        let run = |item: &Item| self.export_item(archive, prefix, total, item);
        match &self.workers {
            Some(pool) if top_level => pool.install(|| items.par_iter().for_each(run)),
            _ => items.iter().for_each(run),
        }
        Ok(())
    }

    fn export_item(&self, archive: &Arc<Archive>, prefix: &str, total: usize, item: &Item) {
        let index = item.index;
        let relative = join_relative(prefix, item.entry.path());
        if index % self.config.progress_interval == 0 || index + 1 == total {
            self.progress.on_item(index, total, &relative);
        }
        if let Some(count) = item.shadowed {
            let error = ArchiveError::Ambiguous {
                path: relative.clone(),
                count,
            };
            self.fail(index, relative, &error);
            return;
        }
        if let Err(e) = self.export_entry(archive, &relative, &item.entry) {
            self.fail(index, relative, &e);
        }
    }

    fn export_entry(
        &self,
        archive: &Arc<Archive>,
        relative: &str,
        entry: &CatalogEntry,
    ) -> Result<()> {
        if let Some(child) = archive.nested(entry)? {
            {
                let mut report = self.report.lock();
                report.nested_visited += 1;
                report.containers.push(relative.to_string());
            }
            return self.export_items(&child, relative, false);
        }

        let option = self.config.option;
        if option.contains(FileOption::RAW) && entry.parts().len() > 1 {
            for index in 0..entry.parts().len() {
                let bytes = archive.entry_part(entry, index)?;
                self.write_file(&format!("{relative}.part{index}"), &bytes)?;
            }
            return Ok(());
        }

        if option.wants_object() || option.contains(FileOption::UNKNOWN_FILE_MODEL) {
            return match archive.entry_object(entry, option)? {
                Materialized::Bytes(bytes) => self.write_file(relative, &bytes),
                Materialized::Object(object) => {
                    if !option.contains(FileOption::BINARY_OBJECT)
                        && let Some(stream) = object.as_stream()
                    {
                        self.write_with(relative, |out| stream.write_to(out))
                    } else if let Some(binary) = object.as_binary() {
                        self.write_file(relative, &binary.to_bytes()?)
                    } else {
                        Err(ArchiveError::DriverContractViolation {
                            reason: format!(
                                "{} object for {relative} can neither stream nor yield bytes",
                                object.kind()
                            ),
                        })
                    }
                }
            };
        }

        let bytes = archive.entry_data(entry, option)?;
        self.write_file(relative, &bytes)
    }

    fn write_file(&self, relative: &str, bytes: &[u8]) -> Result<()> {
        self.write_with(relative, |out| {
            out.write_all(bytes)?;
            Ok(bytes.len() as u64)
        })
    }

    fn write_with<F>(&self, relative: &str, write: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Write) -> Result<u64>,
    {
        let target = self.root.join_entry(relative)?;
        let created = self.root.ensure_parent(&target)?;

        let mut options = OpenOptions::new();
        options.write(true);
        if self.config.overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let mut out = BufWriter::new(options.open(&target)?);
        let finished = write(&mut out).and_then(|n| out.flush().map(|()| n).map_err(Into::into));
        let written = match finished {
            Ok(written) => written,
            Err(e) => {
                drop(out);
                if let Err(remove) = std::fs::remove_file(&target) {
                    tracing::debug!(file = %target.display(), error = %remove, "partial file kept");
                }
                return Err(e);
            }
        };

        let mut report = self.report.lock();
        report.directories_created += created;
        report.files_written += 1;
        report.bytes_written += written;
        Ok(())
    }

    fn fail(&self, index: usize, path: String, error: &ArchiveError) {
        tracing::warn!(index, path = %path, error = %error, "entry export failed");
        let failure = ExportFailure {
            index,
            path,
            message: error.to_string(),
        };
        self.progress.on_error(&failure);
        self.report.lock().failures.push(failure);
    }

    fn finish(self, start: Instant, name: &str) -> Result<ExportReport> {
        let mut report = self.report.into_inner();
        if self.config.option.contains(FileOption::MARKER) {
            let mut manifest = report.containers.join("\n");
            manifest.push('\n');
            let target = self.root.join_entry(MARKER_FILE)?;
            std::fs::write(&target, manifest.as_bytes())?;
        }
        report.failures.sort_by_key(|failure| failure.index);
        report.duration = start.elapsed();

        tracing::info!(
            container = name,
            files = report.files_written,
            bytes = report.bytes_written,
            nested = report.nested_visited,
            failures = report.failures.len(),
            elapsed_ms = report.duration.as_millis(),
            "export finished"
        );
        self.progress.on_complete(&report);
        Ok(report)
    }
}

/// One selected catalog entry.
struct Item {
    index: usize,
    entry: Arc<CatalogEntry>,
    /// Entry count of the path when an earlier entry already claimed it.
    shadowed: Option<usize>,
}

/// Lets the first entry of each path claim its destination.
fn claim_destinations(selected: Vec<(usize, Arc<CatalogEntry>)>) -> Vec<Item> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for (_, entry) in &selected {
        *counts.entry(entry.path().to_string()).or_default() += 1;
    }
    let mut claimed = HashSet::new();
    selected
        .into_iter()
        .map(|(index, entry)| {
            let count = counts.get(entry.path()).copied().unwrap_or(1);
            let shadowed = (!claimed.insert(entry.path().to_string())).then_some(count);
            Item {
                index,
                entry,
                shadowed,
            }
        })
        .collect()
}

fn join_relative(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        path.to_string()
    } else {
        format!("{prefix}/{path}")
    }
}

impl Archive {
    /// Exports this container below `dest`.
    ///
    /// # Errors
    ///
    /// As for [`export_archive`].
    pub fn export(
        self: &Arc<Self>,
        dest: &Path,
        config: &ExportConfig,
        progress: &dyn ExportProgress,
    ) -> Result<ExportReport> {
        export_archive(self, dest, config, progress)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ArchiveBuilder;
    use crate::ArchiveContext;
    use crate::NoopProgress;
    use crate::catalog::Location;
    use crate::driver::DataContext;
    use crate::driver::FormatDriver;
    use crate::driver::ReadContext;
    use crate::factory::ArchiveObject;
    use crate::factory::ObjectFactory;
    use crate::factory::StreamObject;
    use crate::pool::ReadSeek;
    use crate::registry::ANY_ENGINE;
    use crate::test_utils::create_test_tar;
    use crate::test_utils::nested_tar_fixture;
    use tempfile::TempDir;

    fn tar_archive(name: &str, bytes: Vec<u8>) -> Arc<Archive> {
        ArchiveBuilder::new(Arc::new(ArchiveContext::default()))
            .bytes(name, bytes)
            .build()
            .unwrap()
    }

    #[test]
    fn test_export_round_trip() {
        let archive = tar_archive(
            "pak0.tar",
            create_test_tar(vec![("maps/e1m1.bsp", b"BSP29"), ("readme.txt", b"hello")]),
        );
        let temp = TempDir::new().unwrap();
        let report = archive.export(temp.path(), &ExportConfig::default(), &NoopProgress).unwrap();

        assert_eq!(report.files_written, 2);
        assert_eq!(report.directories_created, 1);
        assert_eq!(report.bytes_written, 10);
        let written = std::fs::read(temp.path().join("maps/e1m1.bsp")).unwrap();
        assert_eq!(written, archive.get_data("maps/e1m1.bsp", FileOption::DEFAULT).unwrap());
    }

    #[test]
    fn test_nested_export_and_marker() {
        let archive = tar_archive("outer.tar", nested_tar_fixture());
        let temp = TempDir::new().unwrap();
        let config = ExportConfig::default().with_option(FileOption::MARKER);
        let report = archive.export(temp.path(), &config, &NoopProgress).unwrap();

        assert_eq!(report.nested_visited, 1);
        assert_eq!(report.files_written, 3);
        assert_eq!(
            std::fs::read(temp.path().join("sub.tar/inner/file.txt")).unwrap(),
            b"nested payload"
        );
        let marker = std::fs::read_to_string(temp.path().join(MARKER_FILE)).unwrap();
        assert_eq!(marker, "sub.tar\n");
    }

    #[test]
    fn test_start_index_and_include() {
        let archive = tar_archive(
            "pak0.tar",
            create_test_tar(vec![("a.txt", b"a"), ("b.bsp", b"b"), ("c.bsp", b"c")]),
        );
        let temp = TempDir::new().unwrap();
        let config = ExportConfig::default()
            .with_start_index(1)
            .with_include(vec!["*.bsp".into()]);
        let report = archive.export(temp.path(), &config, &NoopProgress).unwrap();
        assert_eq!(report.files_written, 2);
        assert!(!temp.path().join("a.txt").exists());
    }

    #[test]
    fn test_no_overwrite_is_per_item_failure() {
        let archive = tar_archive("pak0.tar", create_test_tar(vec![("a.txt", b"new")]));
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.txt"), b"old").unwrap();
        let config = ExportConfig::default().with_overwrite(false);
        let report = archive.export(temp.path(), &config, &NoopProgress).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 0);
        assert_eq!(std::fs::read(temp.path().join("a.txt")).unwrap(), b"old");
    }

    #[test]
    fn test_duplicate_paths_keep_first_and_report_rest() {
        let archive = tar_archive(
            "dup.tar",
            create_test_tar(vec![
                ("a.txt", &b"hello"[..]),
                ("a.txt", &b"123456789"[..]),
                ("b.txt", &b"b"[..]),
            ]),
        );
        for jobs in [1, 3] {
            let temp = TempDir::new().unwrap();
            let config = ExportConfig::default().with_max_in_flight(jobs);
            let report = archive.export(temp.path(), &config, &NoopProgress).unwrap();

            assert_eq!(report.files_written, 2);
            assert_eq!(report.failures.len(), 1);
            assert_eq!(report.failures[0].index, 1);
            assert_eq!(report.failures[0].path, "a.txt");
            assert!(report.failures[0].message.contains('2'), "{:?}", report.failures);
            assert_eq!(std::fs::read(temp.path().join("a.txt")).unwrap(), b"hello");
        }
    }

    #[test]
    fn test_claim_destinations_follows_selection() {
        let entries: Vec<(usize, Arc<CatalogEntry>)> = ["x", "y", "x", "x"]
            .iter()
            .enumerate()
            .map(|(i, path)| (i, Arc::new(CatalogEntry::new(path))))
            .collect();
        let shadowed: Vec<Option<usize>> =
            claim_destinations(entries.clone()).iter().map(|item| item.shadowed).collect();
        assert_eq!(shadowed, vec![None, None, Some(3), Some(3)]);

        // A skipped first occurrence hands the path to the next selected one.
        let tail: Vec<Option<usize>> = claim_destinations(entries[2..].to_vec())
            .iter()
            .map(|item| item.shadowed)
            .collect();
        assert_eq!(tail, vec![None, Some(2)]);
    }

    #[derive(Debug)]
    struct HalfWritten;

    impl StreamObject for HalfWritten {
        fn write_to(&self, out: &mut dyn Write) -> Result<u64> {
            out.write_all(b"partial")?;
            Err(ArchiveError::Corrupt("encoder gave up".into()))
        }
    }

    impl ArchiveObject for HalfWritten {
        fn kind(&self) -> &str {
            "half"
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn into_any(self: Box<Self>) -> Box<dyn std::any::Any + Send> {
            self
        }

        fn as_stream(&self) -> Option<&dyn StreamObject> {
            Some(self)
        }
    }

    struct HalfWrittenFactory;

    impl ObjectFactory for HalfWrittenFactory {
        fn name(&self) -> &str {
            "half"
        }

        fn create(
            &self,
            _ctx: &DataContext<'_>,
            _entry: &CatalogEntry,
            _bytes: Vec<u8>,
        ) -> Result<Box<dyn ArchiveObject>> {
            Ok(Box::new(HalfWritten))
        }
    }

    #[test]
    fn test_failed_stream_leaves_no_file() {
        let mut context = ArchiveContext::default();
        context.register_factory(ANY_ENGINE, "mdl", Arc::new(HalfWrittenFactory));
        let archive = ArchiveBuilder::new(Arc::new(context))
            .bytes(
                "pak0.tar",
                create_test_tar(vec![("progs/player.mdl", &b"IDPO"[..]), ("ok.txt", &b"ok"[..])]),
            )
            .build()
            .unwrap();
        let temp = TempDir::new().unwrap();

        let config = ExportConfig::default().with_option(FileOption::OBJECT);
        let report = archive.export(temp.path(), &config, &NoopProgress).unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, "progs/player.mdl");
        assert!(!temp.path().join("progs/player.mdl").exists());
        assert_eq!(std::fs::read(temp.path().join("ok.txt")).unwrap(), b"ok");
    }

    #[derive(Debug)]
    struct SplitDriver;

    impl FormatDriver for SplitDriver {
        fn name(&self) -> &str {
            "split"
        }

        fn read(&self, ctx: &mut ReadContext<'_>, _reader: &mut dyn ReadSeek) -> Result<()> {
            let parts = vec![Location::stored(0, 2), Location::stored(2, 3)];
            ctx.push(
                CatalogEntry::new("sound/loop.wav")
                    .with_location(Location::stored(0, 5))
                    .with_parts(parts),
            );
            Ok(())
        }

        fn read_data(
            &self,
            _ctx: &DataContext<'_>,
            reader: &mut dyn ReadSeek,
            entry: &CatalogEntry,
        ) -> Result<Vec<u8>> {
            crate::driver::read_range(reader, entry.location().offset, entry.size())
        }
    }

    #[test]
    fn test_raw_parts_are_siblings() {
        let archive = ArchiveBuilder::new(Arc::new(ArchiveContext::default()))
            .bytes("split.bin", b"abcde".to_vec())
            .driver(Arc::new(SplitDriver))
            .build()
            .unwrap();
        let temp = TempDir::new().unwrap();

        let config = ExportConfig::default().with_option(FileOption::RAW);
        archive.export(temp.path(), &config, &NoopProgress).unwrap();
        assert_eq!(std::fs::read(temp.path().join("sound/loop.wav.part0")).unwrap(), b"ab");
        assert_eq!(std::fs::read(temp.path().join("sound/loop.wav.part1")).unwrap(), b"cde");

        let joined = TempDir::new().unwrap();
        archive.export(joined.path(), &ExportConfig::default(), &NoopProgress).unwrap();
        assert_eq!(std::fs::read(joined.path().join("sound/loop.wav")).unwrap(), b"abcde");
    }

    #[test]
    fn test_unknown_model_export() {
        let archive = tar_archive("pak0.tar", create_test_tar(vec![("x.bin", b"\x00\x01")]));
        let temp = TempDir::new().unwrap();
        let config = ExportConfig::default().with_option(FileOption::UNKNOWN_FILE_MODEL);
        archive.export(temp.path(), &config, &NoopProgress).unwrap();
        assert_eq!(std::fs::read(temp.path().join("x.bin")).unwrap(), b"\x00\x01");
    }
}
