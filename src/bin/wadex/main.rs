use anyhow::{Context, Result, bail};
use clap::Parser;
use env_logger::Env;
use patharg::InputArg;
use std::io::Read;
use std::process::exit;
use wadex::{Config, Imports, Value};

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// The module to run. If not provided or is '-', read from
    /// standard input.
    #[arg(default_value_t)]
    pub input: InputArg,

    /// Call this exported function after instantiating the module.
    #[arg(long, value_name = "NAME")]
    pub invoke: Option<String>,

    /// i32 arguments passed to the invoked function.
    #[arg(allow_negative_numbers = true)]
    pub args: Vec<i32>,

    /// Check that re-encoding the decoded module reproduces the input
    /// byte for byte.
    #[arg(long, default_value_t = false)]
    pub roundtrip: bool,

    /// Enable verbose output, including a debug representation of
    /// the decoded module and engine logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    #[arg(long, default_value_t = Config::default().max_call_depth)]
    pub max_call_depth: usize,

    /// Limit the number of executed instructions.
    #[arg(long)]
    pub fuel: Option<u64>,

    /// Take missing arguments off the operand stack instead of
    /// failing.
    #[arg(long, default_value_t = false)]
    pub backfill_args: bool,
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    if let Err(err) = run(&cli) {
        abort(&cli, err);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut bytes = Vec::new();
    cli.input
        .open()
        .and_then(|mut r| r.read_to_end(&mut bytes))
        .with_context(|| format!("failed to read {}", cli.input))?;

    let module = wadex::load(&bytes).context("failed to decode module")?;
    if cli.verbose {
        println!("{module:#?}");
    }

    if cli.roundtrip {
        let encoded = module.to_bytes().context("failed to encode module")?;
        if encoded != bytes {
            let at = encoded
                .iter()
                .zip(&bytes)
                .position(|(a, b)| a != b)
                .unwrap_or(encoded.len().min(bytes.len()));
            bail!(
                "re-encoded module differs from input at byte {at} ({} bytes in, {} bytes out)",
                bytes.len(),
                encoded.len()
            );
        }
        println!("roundtrip ok: {} bytes", bytes.len());
    }

    if let Some(name) = &cli.invoke {
        let config = Config::default()
            .max_call_depth(cli.max_call_depth)
            .fuel(cli.fuel)
            .backfill_args(cli.backfill_args);
        let mut instance = module
            .instantiate_with(&Imports::new(), config)
            .context("failed to instantiate module")?;

        let args: Vec<Value> = cli.args.iter().copied().map(Value::from).collect();
        let results = instance
            .call(name, &args)
            .with_context(|| format!("call to {name:?} failed"))?;
        let results: Vec<String> = results.iter().map(ToString::to_string).collect();
        println!("{}", results.join(" "));
    }

    Ok(())
}

fn abort(cli: &Cli, err: anyhow::Error) -> ! {
    eprintln!("ERROR: {err}");

    let sources: Vec<_> = err.chain().skip(1).collect();
    if !sources.is_empty() {
        eprintln!("\nCaused by:");
        for (i, cause) in sources.iter().enumerate() {
            eprintln!("    {i}: {cause}");
        }
    }

    if cli.verbose {
        eprintln!("\nDEBUG OUTPUT:\n{err:#?}");
    }

    exit(1)
}
