use anyhow::Context;
use clap::{Parser, Subcommand};
use fat32fmt_core::{
    ChannelSink, ClusterSize, FilesystemFormatter, FormatOptions, LogFacadeSink, LogLine, LogSink,
    MemorySink, RawDevice, SimulationReport,
};
use fat32fmt_formatters::{inspect_volume, Fat32Formatter, Fat32VolumeInfo};
use log::Level;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "fat32fmt")]
#[command(about = "Format a block device or disk image as FAT32", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Format a device or image file as FAT32
    Format {
        /// Device or image path (e.g. /dev/sdb1)
        device: PathBuf,
        /// Bytes per cluster: auto, 512, 1K, 2K, 4K, 8K, 16K or 32K
        #[arg(short, long)]
        cluster_size: Option<ClusterSize>,
        /// Volume label (up to 11 characters)
        #[arg(short, long)]
        label: Option<String>,
        /// Volume serial number in hex (e.g. CAFE-BABE)
        #[arg(long, value_parser = parse_volume_id)]
        volume_id: Option<u32>,
        /// Read every written structure back after formatting
        #[arg(long)]
        verify: bool,
        /// Show the planned layout and exit without writing
        #[arg(long)]
        dry_run: bool,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
        /// JSON file with format options; flags override its values
        #[arg(long)]
        options: Option<PathBuf>,
    },
    /// Show the FAT32 structures found on a device
    Inspect {
        /// Device or image path
        device: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_volume_id(s: &str) -> Result<u32, String> {
    let digits: String = s
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X")
        .chars()
        .filter(|c| *c != '-')
        .collect();
    u32::from_str_radix(&digits, 16).map_err(|e| format!("invalid volume id '{}': {}", s, e))
}

fn load_options(path: Option<&Path>) -> anyhow::Result<FormatOptions> {
    let Some(path) = path else {
        return Ok(FormatOptions::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read options file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid options file {}", path.display()))
}

fn print_report(device: &Path, report: &SimulationReport) {
    println!("Target device: {}", device.display());
    println!(
        "  Size: {:.2} GB ({} sectors)",
        report.total_sectors as f64 * 512.0 / 1_073_741_824.0,
        report.total_sectors
    );
    println!(
        "  Cluster size: {} bytes ({} sectors)",
        report.sectors_per_cluster as u32 * 512,
        report.sectors_per_cluster
    );
    println!("  FAT size: {} sectors x 2", report.fat_size_sectors);
    println!("  Clusters: {}", report.cluster_count);
    println!("  Usable space: {:.2} GB", report.space_after_format as f64 / 1_073_741_824.0);
    println!("  Label: {}", report.options.label.as_deref().unwrap_or("NO NAME"));
    println!("\nPlanned writes:");
    for write in &report.writes {
        println!("  {:>14}  {:>4} bytes  {}", write.offset, write.length, write.step);
    }
    if !report.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
    }
}

fn print_volume(device: &Path, info: &Fat32VolumeInfo) {
    let boot = &info.boot;
    println!("Device: {}", device.display());
    println!("  Filesystem: {}", boot.fs_type);
    println!("  OEM name: {}", boot.oem_name);
    println!("  Label: {}", boot.label.as_deref().unwrap_or("(none)"));
    println!("  Volume ID: {:04X}-{:04X}", boot.volume_id >> 16, boot.volume_id & 0xFFFF);
    println!("  Total sectors: {}", boot.total_sectors);
    println!("  Cluster size: {} bytes", boot.cluster_size());
    println!("  Reserved sectors: {}", boot.reserved_sectors);
    println!("  FATs: {} x {} sectors", boot.num_fats, boot.sectors_per_fat);
    println!("  Root cluster: {}", boot.root_cluster);
    match info.fs_info.free_clusters {
        Some(free) => println!("  Free clusters: {}", free),
        None => println!("  Free clusters: unknown (computed on first mount)"),
    }
    let backup = if info.backup_boot_matches { "matches" } else { "DIFFERS" };
    println!("  Backup boot sector: {}", backup);
    let media = if info.media_entry_matches { "ok" } else { "MISMATCH" };
    println!("  FAT media entry: {}", media);
}

fn render(line: &LogLine) {
    match line.level {
        Level::Error | Level::Warn => eprintln!("WARNING: {}", line.message),
        Level::Info => println!("  {}", line.message),
        Level::Debug | Level::Trace => log::debug!("{}", line.message),
    }
}

fn confirm(device: &Path) -> anyhow::Result<bool> {
    println!("\nWARNING: This will ERASE ALL DATA on {}!", device.display());
    print!("Type 'yes' to continue: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim() == "yes")
}

#[allow(clippy::too_many_arguments)]
async fn run_format(
    path: PathBuf,
    cluster_size: Option<ClusterSize>,
    label: Option<String>,
    volume_id: Option<u32>,
    verify: bool,
    dry_run: bool,
    yes: bool,
    options_file: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut options = load_options(options_file.as_deref())?;
    if let Some(cluster_size) = cluster_size {
        options.cluster_size = cluster_size;
    }
    if label.is_some() {
        options.label = label;
    }
    if volume_id.is_some() {
        options.volume_id = volume_id;
    }
    options.verify_after_format |= verify;

    let formatter = Fat32Formatter;

    if dry_run {
        let mut device = RawDevice::open_read(&path)?;
        let report = formatter.dry_run(&mut device, &options, &LogFacadeSink)?;
        print_report(&path, &report);
        return Ok(());
    }

    let mut device = RawDevice::open(&path)?;

    // Simulation first, so the user sees what will be written
    let quiet = MemorySink::new();
    let report = formatter.dry_run(&mut device, &options, &quiet)?;
    print_report(&path, &report);

    if !yes && !confirm(&path)? {
        println!("Format cancelled.");
        return Ok(());
    }

    println!("\nFormatting {} as FAT32...", path.display());

    // Formatting runs on a blocking worker; this task only renders
    let (sink, mut rx) = ChannelSink::new();
    let renderer = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            render(&line);
        }
    });

    let worker = tokio::task::spawn_blocking(move || {
        let sink: &dyn LogSink = &sink;
        formatter.format(&mut device, &options, sink)
    });

    let result = worker.await.context("Format worker panicked")?;
    renderer.await.context("Log renderer panicked")?;

    result.with_context(|| format!("Format of {} failed", path.display()))?;
    println!("Format completed successfully!");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Format {
            device,
            cluster_size,
            label,
            volume_id,
            verify,
            dry_run,
            yes,
            options,
        } => {
            run_format(
                device,
                cluster_size,
                label,
                volume_id,
                verify,
                dry_run,
                yes,
                options,
            )
            .await?;
        }
        Commands::Inspect { device, json } => {
            let mut handle = RawDevice::open_read(&device)?;
            let info = inspect_volume(&mut handle)
                .with_context(|| format!("Failed to inspect {}", device.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                print_volume(&device, &info);
            }
        }
    }

    Ok(())
}
