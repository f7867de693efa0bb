mod cli;
mod data_model;
mod database;
mod design;
mod engine;
mod error;
mod export;
mod inference;
mod job;
mod logging;
mod module;
mod output;
mod privacy;
mod reference;
mod table;
mod types;

use clap::Parser;
use cli::{Cli, Commands};
use data_model::ResultsDataModel;
use database::{SqlExecutor, SqlFileWriter, SqliteExecutor};
use engine::CsvEngine;
use job::JobContext;
use logging::{init_logging, LogConfig};
use types::{ModuleInfo, Result};

fn main() {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_verbosity(cli.verbose, cli.log_format));

    if let Err(e) = run(cli.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Execute {
            job,
            engine_output,
            report,
        } => {
            let job = JobContext::load(&job)?;
            let data_model = ResultsDataModel::load_embedded()?;
            let mut engine = CsvEngine::new(&engine_output, data_model.clone());

            let execution_report = module::execute(&job, &mut engine, &data_model)?;

            if let Some(report_path) = report {
                output::write_json_file(&execution_report, &report_path)?;
                tracing::info!("Report written to: {}", report_path.display());
            } else {
                output::write_json_stdout(&execution_report)?;
            }
        }
        Commands::CreateSchema { job, sql_out } => {
            let job = JobContext::load(&job)?;
            job.validate_for_schema_creation()?;
            let data_model = ResultsDataModel::load_embedded()?;

            let mut executor: Box<dyn SqlExecutor> = match sql_out {
                Some(path) => Box::new(SqlFileWriter::new(&path)),
                None => Box::new(SqliteExecutor::connect(job.results_connection()?)?),
            };

            module::create_data_model_schema(&job, &data_model, executor.as_mut())?;
        }
        Commands::Info => {
            output::write_json_stdout(&ModuleInfo::current())?;
        }
    }

    Ok(())
}
