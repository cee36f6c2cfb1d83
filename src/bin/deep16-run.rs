use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use deep16::{assemble, disassemble, Bus, Cpu, CpuConfig, Reg, RunOutcome, Simulator};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run a Deep16 program (assembly source or raw little-endian word image)"
)]
struct Opts {
    /// Start address (defaults to 0).
    #[arg(short, long, value_parser = parse_u16)]
    entry: Option<u16>,
    #[arg(long, default_value_t = 1_000_000)]
    max_steps: u64,
    /// Dump memory after the run, as START:LEN (hex allowed).
    #[arg(long, value_name = "START:LEN")]
    dump: Option<String>,
    /// CPU configuration as JSON (e.g. `{"sp_reset":32767,"swi_vector":32}`).
    #[arg(long, value_name = "FILE")]
    config: Option<String>,
    /// Print the final state as JSON.
    #[arg(long)]
    json: bool,
    #[arg(value_name = "FILE")]
    input: String,
}

#[derive(Serialize)]
struct Report<'a> {
    outcome: RunOutcome,
    cpu: &'a Cpu,
    dump: Option<Vec<u16>>,
}

fn parse_u16(s: &str) -> Result<u16, String> {
    let t = s.trim();
    let v = match t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => t.parse::<u16>(),
    };
    v.map_err(|e| format!("{s}: {e}"))
}

fn parse_dump(s: &str) -> Result<(u16, usize)> {
    let (start, len) = s
        .split_once(':')
        .with_context(|| format!("dump range `{s}` is not START:LEN"))?;
    let start = parse_u16(start).map_err(anyhow::Error::msg)?;
    let len = parse_u16(len).map_err(anyhow::Error::msg)? as usize;
    Ok((start, len))
}

fn load(sim: &mut Simulator, path: &str) -> Result<()> {
    let is_source = path.ends_with(".s") || path.ends_with(".asm");
    if is_source {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
        let res = assemble(&text);
        if !res.success {
            for msg in res.error_messages() {
                eprintln!("{path}: {msg}");
            }
            bail!("{} assembly error(s)", res.errors.len());
        }
        sim.load_changes(&res.memory_changes());
    } else {
        let bytes = std::fs::read(path).with_context(|| format!("reading {path}"))?;
        let words: Vec<u16> = bytes
            .chunks(2)
            .map(|c| u16::from_le_bytes([c[0], *c.get(1).unwrap_or(&0)]))
            .collect();
        sim.load_image(&words);
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();
    let cfg = match &opts.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str::<CpuConfig>(&text).context("parsing CPU config")?
        }
        None => CpuConfig::default(),
    };
    let dump = opts.dump.as_deref().map(parse_dump).transpose()?;

    let mut sim = Simulator::new(cfg);
    load(&mut sim, &opts.input)?;
    sim.cpu.set_pc(opts.entry.unwrap_or(0));

    let outcome = sim.run(opts.max_steps);

    if opts.json {
        let report = Report {
            outcome,
            cpu: &sim.cpu,
            dump: dump.map(|(start, len)| sim.mem.slice(start, len).to_vec()),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let pc = sim.cpu.pc();
    if outcome.halted {
        println!("halted after {} steps at {pc:#06x}", outcome.steps);
    } else {
        println!("stopped after {} steps at {pc:#06x} (step limit)", outcome.steps);
    }
    for (i, chunk) in sim.cpu.regs.chunks(4).enumerate() {
        let line: Vec<String> = chunk
            .iter()
            .enumerate()
            .map(|(j, v)| format!("{:>3}={v:04x}", Reg::new((i * 4 + j) as u8).map_or("?", Reg::name)))
            .collect();
        println!("{}", line.join("  "));
    }
    println!("PSW={:04x} {:?}", sim.cpu.psw.bits(), sim.cpu.psw);
    println!("next: {}", disassemble(sim.mem.read(pc)));
    if let Some((start, len)) = dump {
        for (i, w) in sim.mem.slice(start, len).iter().enumerate() {
            println!("{:04x}: {w:04x}", start as usize + i);
        }
    }
    Ok(())
}
