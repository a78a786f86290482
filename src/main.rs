use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{ArgGroup, Parser};

use huffpack::{pack, unpack, Result};

#[derive(Parser, Debug)]
#[command(about = "Compress or decompress a file with byte-oriented Huffman coding")]
#[command(group(ArgGroup::new("mode").required(true).args(["compress", "decompress"])))]
struct Args {
    /// Compress the input file
    #[arg(long)]
    compress: bool,
    /// Decompress the input file
    #[arg(long)]
    decompress: bool,
    /// Input filename
    #[arg(long)]
    input: PathBuf,
    /// Output filename
    #[arg(long)]
    output: PathBuf,
}

fn compress_file(input: &Path, output: &Path) -> Result<()> {
    let data = fs::read(input)?;
    let basename = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let container = pack(&data, &basename)?;
    fs::write(output, &container)?;

    println!(
        "compressed {} bytes into {} bytes ({})",
        data.len(),
        container.len(),
        output.display()
    );

    Ok(())
}

fn decompress_file(input: &Path, output: &Path) -> Result<()> {
    let container = fs::read(input)?;
    let unpacked = unpack(&container)?;

    fs::write(output, &unpacked.data)?;

    println!(
        "decompressed {} bytes into {} bytes ({})",
        container.len(),
        unpacked.data.len(),
        output.display()
    );

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let started = Instant::now();
    let res = if args.compress {
        compress_file(&args.input, &args.output)
    } else {
        decompress_file(&args.input, &args.output)
    };

    match res {
        Ok(()) => {
            println!("done in {:?}", started.elapsed());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {e}", if args.compress { "compression failed" } else { "decompression failed" });
            ExitCode::FAILURE
        }
    }
}
