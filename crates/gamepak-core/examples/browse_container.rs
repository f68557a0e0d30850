//! Example: Browsing and exporting a container with gamepak-core
//!
//! Run with: `cargo run --example browse_container`

use gamepak_core::ArchiveContext;
use gamepak_core::ExportConfig;
use gamepak_core::FileOption;
use gamepak_core::NoopProgress;
use gamepak_core::test_utils::nested_tar_fixture;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let work = std::env::temp_dir().join("gamepak-example");
    std::fs::create_dir_all(&work)?;
    let pak = work.join("pak0.tar");
    std::fs::write(&pak, nested_tar_fixture())?;

    // Example 1: Open a plain path with the built-in `file` scheme
    println!("Example 1: Catalog");
    let context = Arc::new(ArchiveContext::default());
    let container = context.open(&pak.display().to_string())?;
    for archive in container.archives() {
        for entry in archive.entries()? {
            println!("  {:>8}  {}", entry.size(), entry.path());
        }
    }

    // Example 2: Read across a nested container boundary
    println!("\nExample 2: Nested lookup");
    let data = container.get_data("sub.tar:inner/file.txt", FileOption::DEFAULT)?;
    println!("  sub.tar:inner/file.txt = {}", String::from_utf8_lossy(&data));
    let missing = container.find_data("sub.tar:inner/absent.txt", FileOption::DEFAULT)?;
    println!("  absent entry found: {}", missing.is_some());

    // Example 3: Export with two workers
    println!("\nExample 3: Export");
    let config = ExportConfig::new()
        .with_option(FileOption::MARKER)
        .with_max_in_flight(2);
    let report = container.export(&work.join("out"), &config, &NoopProgress)?;
    println!(
        "  {} files, {} bytes, {} nested containers",
        report.files_written, report.bytes_written, report.nested_visited
    );

    std::fs::remove_dir_all(&work)?;
    Ok(())
}
