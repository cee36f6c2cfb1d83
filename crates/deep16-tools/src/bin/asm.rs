use anyhow::{bail, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use deep16::{assemble, AssemblyResult};
use deep16_tools::save_raw_bin;

#[derive(Parser, Debug)]
#[command(author, version, about = "Deep16 two-pass assembler")]
struct Opts {
    /// Input assembly file (one instruction, label or directive per line)
    #[arg(short, long)]
    input: PathBuf,
    /// Output image (raw little-endian words)
    #[arg(short, long)]
    output: PathBuf,
    /// First address written to the image
    #[arg(long, default_value_t = 0u16)]
    start: u16,
    /// Print a listing (address, words, source) to stdout
    #[arg(long)]
    listing: bool,
    /// Write the full result (symbols, errors, listing) as JSON
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,
}

/// Words from `start` up to the highest address any line wrote.
fn image_words(res: &AssemblyResult, start: u16) -> &[u16] {
    let end = res
        .memory_changes()
        .iter()
        .map(|c| c.address as usize + 1)
        .max()
        .unwrap_or(0);
    let start = start as usize;
    if end <= start {
        &[]
    } else {
        &res.memory[start..end]
    }
}

fn render_listing(res: &AssemblyResult) -> String {
    let mut out = String::new();
    for e in &res.listing {
        let addr = e
            .address
            .map(|a| format!("{a:04x}"))
            .unwrap_or_else(|| "    ".into());
        let words: Vec<String> = e.words.iter().map(|w| format!("{w:04x}")).collect();
        out.push_str(&format!(
            "{:>4}  {addr}  {:<15} {}\n",
            e.line,
            words.join(" "),
            e.source
        ));
        if let Some(err) = &e.error {
            out.push_str(&format!("      ^ {err}\n"));
        }
    }
    out
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();
    let text = fs::read_to_string(&opts.input)?;
    let res = assemble(&text);

    if opts.listing {
        print!("{}", render_listing(&res));
    }
    if let Some(path) = &opts.json {
        fs::write(path, serde_json::to_string_pretty(&res)?)?;
    }
    if !res.success {
        for msg in res.error_messages() {
            eprintln!("{}: {msg}", opts.input.display());
        }
        bail!("{} error(s); no image written", res.errors.len());
    }

    let words = image_words(&res, opts.start);
    save_raw_bin(&opts.output, words)?;
    tracing::info!(
        words = words.len(),
        symbols = res.symbols.len(),
        "wrote {}",
        opts.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_spans_written_words_only() {
        let res = assemble(".org 2\nNOP\n.word 7\n");
        assert_eq!(image_words(&res, 0), &[0, 0, 0xFFF0, 7]);
        assert_eq!(image_words(&res, 3), &[7]);
        assert!(image_words(&assemble("; empty\n"), 0).is_empty());
    }

    #[test]
    fn listing_marks_errors() {
        let res = assemble("start:\n  FROB\n");
        let text = render_listing(&res);
        assert!(text.contains("0000"));
        assert!(text.contains("^ Unknown instruction: FROB"));
    }
}
