//! `syaz0`: compress or decompress Yaz0 files.
//!
//! ```bash
//! syaz0 model.sbfres              # writes model.sbfres.yaz0
//! syaz0 -a 0x2000 model.sbfres    # same, with an alignment hint in the header
//! syaz0 model.sbfres.yaz0         # writes model.sbfres (or model.sbfres.decomp)
//! syaz0 -i model.sbfres.yaz0      # prints the header
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use syaz0::CompressionSettings;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn parse_u32(s: &str) -> Result<u32, std::num::ParseIntError> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

#[derive(Parser)]
#[command(name = "syaz0")]
#[command(about = "Compress or decompress Yaz0 data", long_about = None)]
struct Cli {
    /// Decompress (implied for files ending in .yaz0)
    #[arg(short, long)]
    decompress: bool,

    /// Write output to stdout
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Compression level
    #[arg(short, long, default_value_t = 9, value_parser = clap::value_parser!(u32).range(6..=9))]
    level: u32,

    /// Data alignment hint (for compression)
    #[arg(short, long, default_value = "0", value_parser = parse_u32)]
    alignment: u32,

    /// Print the header of a compressed file and exit
    #[arg(short, long)]
    info: bool,

    /// Log what is going on to stderr
    #[arg(short, long)]
    verbose: bool,

    file: PathBuf,
}

fn output_path(cli: &Cli, decompressing: bool) -> PathBuf {
    if !decompressing {
        let mut name = cli.file.clone().into_os_string();
        name.push(".yaz0");
        return name.into();
    }

    let name = cli.file.to_string_lossy().replace(".yaz0", "");
    let mut path = PathBuf::from(name);
    if path.exists() {
        let mut name = path.into_os_string();
        name.push(".decomp");
        path = name.into();
    }
    path
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set up logging")?;

    let data = fs::read(&cli.file).with_context(|| format!("Failed to read {}", cli.file.display()))?;

    if cli.info {
        let header = match syaz0::parse_header(&data) {
            Some(header) => header,
            None => bail!("{} is not Yaz0 compressed", cli.file.display()),
        };
        println!("uncompressed size: {}", header.uncompressed_size);
        println!("data alignment:    {:#x}", header.data_alignment);
        return Ok(());
    }

    let decompressing = cli.decompress || cli.file.to_string_lossy().ends_with(".yaz0");
    let result = if decompressing {
        syaz0::decompress(&data).with_context(|| format!("Failed to decompress {}", cli.file.display()))?
    } else {
        CompressionSettings::default()
            .data_alignment(cli.alignment)
            .level(cli.level)
            .compress(&data)
    };

    if cli.stdout {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(&result)?;
        handle.flush()?;
    } else {
        let path = output_path(&cli, decompressing);
        fs::write(&path, &result).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(input = data.len(), output = result.len(), path = %path.display(), "done");
    }

    Ok(())
}
