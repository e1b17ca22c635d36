//! MIPS-I educational simulator CLI.
//!
//! This binary provides the command-line surface of the simulator. It performs:
//! 1. **Program loading:** ELF images by default, assembly source with `--asm`,
//!    plus raw word files via `--load-range`.
//! 2. **Machine configuration:** core selection, delay slot, hazard unit,
//!    cache geometry/policies, and memory timing from flags or a JSON file.
//! 3. **Run and report:** execute to completion, honour trap expectations,
//!    and emit the requested dumps and traces.
//!
//! Exit code 0 on success; 1 on argument, assembly, or expectation failure.

use std::io::Write as _;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mipsim_core::asm::FileProvider;
use mipsim_core::common::{Address, TrapKind};
use mipsim_core::config::{CacheConfig, HazardUnit, MachineConfig};
use mipsim_core::core::events::{EventKind, MachineEvent, RegKind};
use mipsim_core::sim::loader;
use mipsim_core::sim::machine::{Machine, RunStatus};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "mipsim",
    author,
    version,
    about = "Educational MIPS-I system simulator",
    long_about = "Simulate a MIPS-I-like machine: single-cycle or five-stage pipelined core,\n\
                  optional split L1 caches, memory-mapped peripherals, and an integrated assembler.\n\n\
                  Examples:\n  mipsim program.elf --dump-registers\n  mipsim boot.S --asm --pipelined --d-cache lru,4,2,2,wb"
)]
struct Cli {
    /// Input file: ELF image, or assembly source with --asm.
    file: Option<String>,

    /// Treat the input file as assembly source.
    #[arg(long)]
    asm: bool,

    /// Use the five-stage pipelined core.
    #[arg(long)]
    pipelined: bool,

    /// Disable the branch delay slot.
    #[arg(long)]
    no_delay_slot: bool,

    /// Hazard handling: none, stall, or forward (default).
    #[arg(long, value_parser = parse_hazard)]
    hazard_unit: Option<HazardUnit>,

    /// Enable OS-call emulation (print/read via the serial port).
    #[arg(long)]
    osemu: bool,

    /// Read the machine configuration from a JSON file (flags override it).
    #[arg(long)]
    config: Option<String>,

    /// Trace instruction fetch.
    #[arg(long)]
    trace_fetch: bool,
    /// Trace instruction decode.
    #[arg(long)]
    trace_decode: bool,
    /// Trace execute results.
    #[arg(long)]
    trace_execute: bool,
    /// Trace data memory accesses.
    #[arg(long)]
    trace_memory: bool,
    /// Trace register writeback.
    #[arg(long)]
    trace_writeback: bool,
    /// Print every PC change.
    #[arg(long)]
    trace_pc: bool,
    /// Print changes of one general-purpose register.
    #[arg(long, value_name = "REG")]
    trace_gp: Option<usize>,
    /// Print HI changes.
    #[arg(long)]
    trace_hi: bool,
    /// Print LO changes.
    #[arg(long)]
    trace_lo: bool,

    /// Print the register file after the run.
    #[arg(long)]
    dump_registers: bool,
    /// Print cache statistics after the run.
    #[arg(long)]
    dump_cache_stats: bool,
    /// Print the cycle count after the run.
    #[arg(long)]
    dump_cycles: bool,

    /// Dump memory after the run: START,LENGTH,FNAME (length in words).
    #[arg(long, value_name = "START,LENGTH,FNAME")]
    dump_range: Option<String>,

    /// Load words before the run: START,FNAME.
    #[arg(long, value_name = "START,FNAME")]
    load_range: Option<String>,

    /// Expect the program to trap; exit 0 iff it did.
    #[arg(long)]
    expect_fail: bool,

    /// Expected trap kinds as letters from {I,A,O,J}; implies --expect-fail.
    #[arg(long, value_name = "TRAP")]
    fail_match: Option<String>,

    /// Data cache: POLICY,SETS,WORDS,ASSOC[,WRITE].
    #[arg(long, value_name = "SPEC")]
    d_cache: Option<String>,
    /// Instruction cache: POLICY,SETS,WORDS,ASSOC[,WRITE].
    #[arg(long, value_name = "SPEC")]
    i_cache: Option<String>,

    /// Memory read latency in cycles.
    #[arg(long, value_name = "N")]
    read_time: Option<u32>,
    /// Memory write latency in cycles.
    #[arg(long, value_name = "N")]
    write_time: Option<u32>,
    /// Burst word latency in cycles.
    #[arg(long, value_name = "N")]
    burst_time: Option<u32>,

    /// Cycle budget; the run fails if it is exhausted.
    #[arg(long, value_name = "N")]
    max_cycles: Option<u64>,
}

/// Parses the hazard-unit flag.
fn parse_hazard(text: &str) -> Result<HazardUnit, String> {
    match text {
        "none" => Ok(HazardUnit::None),
        "stall" => Ok(HazardUnit::Stall),
        "forward" | "stall_forward" => Ok(HazardUnit::Forward),
        other => Err(format!("unknown hazard unit '{other}'")),
    }
}

/// Parses an integer accepting the standard prefixes.
fn parse_int(text: &str) -> Result<u32, String> {
    let t = text.trim();
    let parsed = if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        t.parse()
    };
    parsed.map_err(|_| format!("bad integer '{text}'"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(message) => {
            eprintln!("mipsim: {message}");
            ExitCode::FAILURE
        }
    }
}

/// Builds the configuration, loads the program, runs, and reports.
fn run(cli: Cli) -> Result<ExitCode, String> {
    install_tracing(&cli);

    let mut config = match &cli.config {
        Some(path) => {
            let text =
                std::fs::read_to_string(path).map_err(|e| format!("cannot read '{path}': {e}"))?;
            serde_json::from_str::<MachineConfig>(&text)
                .map_err(|e| format!("bad config '{path}': {e}"))?
        }
        None => MachineConfig::default(),
    };

    config.pipelined |= cli.pipelined;
    if cli.no_delay_slot {
        config.delay_slot = false;
    }
    if let Some(hazard) = cli.hazard_unit {
        config.hazard_unit = hazard;
    }
    config.osemu_enable |= cli.osemu;
    if let Some(spec) = &cli.d_cache {
        config.d_cache = CacheConfig::parse_cli(spec)?;
    }
    if let Some(spec) = &cli.i_cache {
        config.i_cache = CacheConfig::parse_cli(spec)?;
    }
    if let Some(n) = cli.read_time {
        config.mem_read_time = n;
    }
    if let Some(n) = cli.write_time {
        config.mem_write_time = n;
    }
    if let Some(n) = cli.burst_time {
        config.mem_burst_time = n;
    }

    let mut machine = Machine::new(config);
    install_observers(&mut machine, &cli);

    let Some(file) = &cli.file else {
        return Err("no input file (see --help)".to_string());
    };

    if cli.asm {
        let source =
            std::fs::read_to_string(file).map_err(|e| format!("cannot read '{file}': {e}"))?;
        let base = std::path::Path::new(file)
            .parent()
            .map_or_else(|| ".".into(), std::path::Path::to_path_buf);
        let provider = FileProvider::new(base);
        let result = machine.assemble_source(&source, file, &provider);
        if !result.ok {
            for diagnostic in &result.diagnostics {
                eprintln!("{diagnostic}");
            }
            return Ok(ExitCode::FAILURE);
        }
    } else {
        let _ = machine
            .load_elf_file(file)
            .map_err(|e| format!("load failed: {e}"))?;
    }

    if let Some(spec) = &cli.load_range {
        let (start, fname) = spec
            .split_once(',')
            .ok_or_else(|| format!("--load-range '{spec}' must be START,FNAME"))?;
        let start = parse_int(start)?;
        let text = std::fs::read_to_string(fname.trim())
            .map_err(|e| format!("cannot read '{fname}': {e}"))?;
        let words = loader::parse_load_file(&text).map_err(|e| e.to_string())?;
        machine
            .load_words(Address::new(start), &words)
            .map_err(|e| e.to_string())?;
    }

    let status = machine.run(cli.max_cycles);
    machine.cache_flush();

    let exit = report(&mut machine, &cli, &status)?;
    Ok(exit)
}

/// Maps trace flags to a `tracing` filter and installs the subscriber.
fn install_tracing(cli: &Cli) {
    let mut targets = Vec::new();
    if cli.trace_fetch {
        targets.push("mipsim::fetch=trace");
    }
    if cli.trace_decode {
        targets.push("mipsim::decode=trace");
    }
    if cli.trace_execute {
        targets.push("mipsim::execute=trace");
    }
    if cli.trace_memory {
        targets.push("mipsim::memory=trace");
    }
    if cli.trace_writeback {
        targets.push("mipsim::writeback=trace");
    }

    let filter = if targets.is_empty() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    } else {
        EnvFilter::new(targets.join(","))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Subscribes the register-trace and serial-output observers.
fn install_observers(machine: &mut Machine, cli: &Cli) {
    machine.observe(EventKind::Serial, |event| {
        if let MachineEvent::SerialOutput { byte } = event {
            let mut out = std::io::stdout();
            let _ = out.write_all(&[*byte]);
            let _ = out.flush();
        }
    });

    let trace_pc = cli.trace_pc;
    let trace_gp = cli.trace_gp;
    let trace_hi = cli.trace_hi;
    let trace_lo = cli.trace_lo;
    if trace_pc || trace_gp.is_some() || trace_hi || trace_lo {
        machine.observe(EventKind::Register, move |event| {
            let MachineEvent::RegisterChange {
                kind, index, new, ..
            } = event
            else {
                return;
            };
            match kind {
                RegKind::Pc if trace_pc => eprintln!("PC: {new:#010x}"),
                RegKind::Gp if trace_gp == Some(*index) => {
                    eprintln!("GP{index}: {new:#010x}");
                }
                RegKind::Hi if trace_hi => eprintln!("HI: {new:#010x}"),
                RegKind::Lo if trace_lo => eprintln!("LO: {new:#010x}"),
                _ => {}
            }
        });
    }
}

/// Emits the requested dumps and resolves the exit code.
fn report(machine: &mut Machine, cli: &Cli, status: &RunStatus) -> Result<ExitCode, String> {
    if cli.dump_registers {
        let regs = machine.regs();
        for i in 0..32 {
            println!("R{i:<2} {:#010x}", regs.read_gp(i));
        }
        println!("PC  {:#010x}", regs.read_pc().val());
        println!("HI  {:#010x}", regs.read_hi());
        println!("LO  {:#010x}", regs.read_lo());
    }
    if cli.dump_cache_stats {
        machine.stats().print(machine.config().mem_read_time);
    }
    if cli.dump_cycles {
        println!("cycles {}", machine.stats().cycles);
    }
    if let Some(spec) = &cli.dump_range {
        let fields: Vec<&str> = spec.split(',').collect();
        if fields.len() != 3 {
            return Err(format!("--dump-range '{spec}' must be START,LENGTH,FNAME"));
        }
        let start = parse_int(fields[0])?;
        let length = parse_int(fields[1])?;
        let words = machine
            .dump_words(Address::new(start), length)
            .map_err(|e| e.to_string())?;
        std::fs::write(fields[2].trim(), loader::format_dump(&words))
            .map_err(|e| format!("cannot write '{}': {e}", fields[2]))?;
    }

    let expecting_fail = cli.expect_fail || cli.fail_match.is_some();
    let trap_kind = machine.trap().map(|info| info.trap.kind());

    let ok = match (expecting_fail, trap_kind) {
        (false, None) => !matches!(status, RunStatus::BudgetExhausted),
        (false, Some(_)) => {
            if let Some(info) = machine.trap() {
                eprintln!("trap: {} at {}", info.trap, info.pc);
            }
            false
        }
        (true, None) => {
            eprintln!("expected a trap, but the program completed");
            false
        }
        (true, Some(kind)) => match &cli.fail_match {
            None => true,
            Some(letters) => kind_matches(kind, letters),
        },
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Returns whether the trap kind's letter appears in the expectation set.
fn kind_matches(kind: TrapKind, letters: &str) -> bool {
    kind.letter()
        .is_some_and(|letter| letters.to_ascii_uppercase().contains(letter))
}
