use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use tablegen::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "tablegen")]
#[command(about = "Compile table schemas into typed source code.", long_about = None)]
#[command(version)]
struct Cli {
    /// Project file
    #[arg(default_value = "tablegen.toml")]
    config: PathBuf,

    /// Override the project's language (built-in name or profile path)
    #[arg(long)]
    language: Option<String>,

    /// Worker threads; defaults to the available parallelism
    #[arg(long, short = 'j')]
    jobs: Option<usize>,

    /// Compile and report without writing any files
    #[arg(long)]
    check: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> TableGenResult<bool> {
    let mut project = ProjectConfig::load(&cli.config)?;
    if let Some(language) = &cli.language {
        project.language = language.clone();
    }

    let profile = project.language_profile()?;
    let config = match cli.jobs {
        Some(jobs) => CompilerConfig::builder().workers(jobs.max(1)).build(),
        None => CompilerConfig::default(),
    };
    let compiler = Compiler::new(config, profile)?;

    let batch = SchemaBatch::load_dir(project.schema_dir())?;
    let report = compiler.compile_batch(&batch);

    for (name, outcome) in report.outcomes() {
        match outcome {
            SchemaOutcome::Emitted(unit) => {
                println!("ok       {name} ({} declarations)", unit.declarations().len())
            }
            SchemaOutcome::Failed(err) if err.path.is_empty() => println!("FAILED   {err}"),
            SchemaOutcome::Failed(err) => println!("FAILED   {err} (at {})", err.path),
            SchemaOutcome::Cancelled => println!("skipped  {name}"),
        }
    }

    if !cli.check {
        let mut sink = DirectorySink::new(project.code_dir(), project.file_suffix.as_str());
        report.deliver(&mut sink)?;
        for (name, status) in sink.statuses() {
            if *status == WriteStatus::Written {
                println!("wrote    {}", sink.path_for(name).display());
            }
        }
    }

    println!("{}", report.summary());
    Ok(report.is_success())
}
