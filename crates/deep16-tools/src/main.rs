use anyhow::Result;
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use deep16::decoder::Decoder;
use deep16::disasm::fmt_decoded;
use deep16::isa::deep16::Deep16Codec;

use deep16_tools::{load_raw_bin, Image};

#[derive(Parser, Debug)]
#[command(author, version, about = "Deep16 disassembler CLI", long_about = None)]
struct Cli {
    /// Load address for the image, in words
    #[arg(long, default_value = "0")]
    base: String,
    /// Skip N words at start of file before loading
    #[arg(long, default_value_t = 0usize)]
    skip: usize,
    /// Input image path (raw little-endian 16-bit words)
    #[arg(value_name = "BINFILE")]
    input: String,
    /// Limit words loaded (default: to EOF after --skip)
    #[arg(long)]
    len: Option<usize>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show where the image is loaded
    Info,
    /// Disassemble the word range [start, end)
    Range {
        /// Start address (hex or dec)
        start: String,
        /// End address (hex or dec, exclusive)
        end: String,
        /// Show the raw instruction word
        #[arg(long)]
        show_words: bool,
        /// Write output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<String>,
    },
}

fn parse_addr(s: &str) -> Result<u32> {
    let s = s.trim();
    let v = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)?
    } else {
        s.parse::<u32>()?
    };
    anyhow::ensure!(v <= 0x1_0000, "address {v:#x} is outside the 64K word space");
    Ok(v)
}

fn render_range(img: &Image, start: u32, end: u32, show_words: bool) -> String {
    let codec = Deep16Codec::new();
    let mut buf = String::new();
    for pc in start..end {
        let Some(word) = img.read_word(pc as u16) else {
            let _ = writeln!(buf, "{pc:#06x}: <unmapped>");
            continue;
        };
        let text = fmt_decoded(&codec.decode(word));
        if show_words {
            let _ = writeln!(buf, "{pc:#06x}: {word:04x}  {text}");
        } else {
            let _ = writeln!(buf, "{pc:#06x}: {text}");
        }
    }
    buf
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let base = parse_addr(&cli.base)?;
    anyhow::ensure!(base < 0x1_0000, "--base must be below 0x10000");
    let img = load_raw_bin(Path::new(&cli.input), base as u16, cli.skip, cli.len)?;
    tracing::debug!(base = img.base, words = img.words.len(), "image loaded");

    match cli.cmd {
        Command::Info => {
            println!("{:<8} {:<8} {:<8}", "start", "end", "words");
            println!("{:#06x}   {:#06x}   {}", img.base, img.end(), img.words.len());
        }
        Command::Range {
            start,
            end,
            show_words,
            out,
        } => {
            let start = parse_addr(&start)?;
            let end = parse_addr(&end)?;
            anyhow::ensure!(end >= start, "end must be >= start");
            let buf = render_range(&img, start, end, show_words);
            if let Some(path) = out {
                std::fs::write(path, buf)?;
            } else {
                print!("{buf}");
            }
        }
    }

    Ok(())
}
