use clap::{Parser, Subcommand};
use preproc_engine::exceptions::PreprocResult;
use preproc_engine::preprocess::{apply_preprocessing, apply_preprocessing_with_rules};
use preproc_engine::registry::{rules_for_id, Dataset};
use preproc_engine::rules::RuleSet;
use preproc_engine::settings::Settings;
use preproc_engine::source::load_dataset;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "preproc", about = "Rule-driven preprocessing of tabular datasets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preprocess a dataset and print the transformation log
    Run {
        /// Dataset identifier (titanic, lego, house)
        dataset: String,

        /// Column to predict
        #[arg(short, long)]
        target: String,

        /// Directory holding <dataset>.csv or <dataset>.parquet
        #[arg(long, env = "PREPROC_DATA_DIR")]
        data_dir: Option<PathBuf>,

        /// JSON rule set used instead of the registered rules
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Number of rows of the result to print
        #[arg(long, default_value_t = 10)]
        preview: usize,
    },
    /// Print the registered rules of a dataset as JSON
    Rules {
        /// Dataset identifier (titanic, lego, house)
        dataset: String,
    },
}

#[tokio::main]
async fn main() -> PreprocResult<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            dataset,
            target,
            data_dir,
            rules,
            preview,
        } => {
            let mut settings = Settings::from_env()?;
            if let Some(dir) = data_dir {
                settings.data_dir = dir;
            }
            let ctx = settings.session_context();
            let raw = load_dataset(&ctx, &settings.data_dir, &dataset).await?;
            let output = match rules {
                Some(path) => {
                    let rules = RuleSet::from_json(&fs::read_to_string(path)?)?.into_rules();
                    let dataset: Dataset = dataset.parse()?;
                    apply_preprocessing_with_rules(dataset, raw, &rules, &target).await?
                }
                None => apply_preprocessing(&dataset, raw, &target).await?,
            };
            for line in &output.log {
                println!("- {}", line);
            }
            println!();
            println!("problem: {}", output.problem);
            output.table.limit(0, Some(preview))?.show().await?;
        }
        Commands::Rules { dataset } => {
            println!("{}", RuleSet::new(rules_for_id(&dataset)?).to_json()?);
        }
    }
    Ok(())
}
