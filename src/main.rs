use clap::Parser;
use std::io::Write;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Args, Commands, CompileArgs, SheetsArgs, TemplateArgs};
use taskbank_lib::excel::{self, Source};
use taskbank_lib::{compiler, config, AssemblyPolicy, CompileError, CompileOptions, CompilerConfig};

fn main() {
    let exit = match real_main() {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

fn real_main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cfg = config::load(args.config.as_deref())?;
    init_tracing(&cfg, &args)?;

    match args.command {
        Commands::Compile(a) => run_compile(a, &cfg),
        Commands::Sheets(a) => run_sheets(a),
        Commands::Template(a) => run_template(a, &cfg),
    }
}

fn exit_code_for_error(e: &anyhow::Error) -> i32 {
    // 0: success
    // 1: config / usage / uncategorized
    // 2: malformed input
    // 3: no records found
    // 4: assembly error
    // 5: io error
    match e.downcast_ref::<CompileError>() {
        Some(CompileError::MalformedInput(_)) => 2,
        Some(CompileError::NoRecordsFound(_)) => 3,
        Some(CompileError::Assembly { .. }) => 4,
        Some(CompileError::Io(_)) => 5,
        None => 1,
    }
}

fn init_tracing(cfg: &CompilerConfig, args: &Args) -> anyhow::Result<()> {
    let level = if args.quiet {
        "warn"
    } else if args.verbose {
        "debug"
    } else {
        cfg.logging.level.as_str()
    };

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(level)?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

fn run_compile(args: CompileArgs, cfg: &CompilerConfig) -> anyhow::Result<()> {
    let dialect = args.dialect();
    let options = CompileOptions {
        sheet: args.sheet.clone(),
        policy: if args.best_effort {
            AssemblyPolicy::BestEffort
        } else {
            AssemblyPolicy::FailFast
        },
    };

    let source = Source::Path(args.input.clone());
    let compilation = compiler::compile(&source, dialect, &options, cfg)?;
    let report = &compilation.report;

    for issue in &report.skipped {
        tracing::warn!("skipped {}", issue);
    }

    match &args.output {
        Some(path) => {
            compiler::write_tasks_to_path(&compilation.tasks, path)?;
            tracing::info!(
                output = %path.display(),
                checksum = %report.source_checksum,
                "wrote {} tasks",
                report.tasks
            );
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            compiler::write_tasks(&compilation.tasks, &mut handle)?;
            writeln!(handle).map_err(CompileError::Io)?;
        }
    }

    Ok(())
}

fn run_sheets(args: SheetsArgs) -> anyhow::Result<()> {
    let sheets = excel::get_sheets(&Source::Path(args.input))?;
    for sheet in sheets {
        println!(
            "{}\t{}\t{} rows x {} cols",
            sheet.index, sheet.name, sheet.row_count, sheet.col_count
        );
    }
    Ok(())
}

fn run_template(args: TemplateArgs, cfg: &CompilerConfig) -> anyhow::Result<()> {
    let dialect = args.dialect.into();
    let checksum = compiler::write_template(dialect, &args.output, cfg)?;
    tracing::info!(
        output = %args.output.display(),
        dialect = %dialect,
        checksum = %checksum,
        "wrote template"
    );
    Ok(())
}
