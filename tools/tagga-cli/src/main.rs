//! Tagga command-line front end
//!
//! Every subcommand that changes a project saves it back to the file it was
//! read from.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tagga_core::{Command, DocumentView, Outcome, Project, Session, TaggaConfig, TrainingExample};
use tagga_trainer::{CrfModel, Trainer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// CLI arguments
#[derive(Parser)]
#[command(name = "tagga")]
#[command(about = "Annotate named entities and train recognizers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory for new project files
    #[arg(long, env = "TAGGA_HOME", global = true)]
    home: Option<PathBuf>,

    /// Record field holding the document text on import
    #[arg(long, env = "TAGGA_TEXT_FIELD", global = true)]
    text_field: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a JSON array of records as a new project
    Import {
        input: PathBuf,
        /// Where to save the project [default: <home>/tagga_project-<timestamp>.tagga]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the documents of a project
    List { project: PathBuf },
    /// Autotag a document and print it as JSON
    Show { project: PathBuf, index: usize },
    /// Add or remove annotations
    Tag {
        #[command(subcommand)]
        action: TagAction,
    },
    /// Inspect or edit the project vocabulary
    Vocab {
        #[command(subcommand)]
        action: VocabAction,
    },
    /// Apply the vocabulary to one or every document
    Autotag {
        project: PathBuf,
        #[arg(short, long)]
        index: Option<usize>,
    },
    /// Write the project annotations as a JSONL training set
    Export { project: PathBuf, output: PathBuf },
    /// Convert a Dataturks NDJSON export into a JSONL training set
    Convert { input: PathBuf, output: PathBuf },
    /// Train a model on a JSONL training set
    Train {
        data: PathBuf,
        /// Directory the model is written to
        #[arg(short, long)]
        model_dir: PathBuf,
        /// Continue training an existing model
        #[arg(long)]
        base: Option<PathBuf>,
        #[arg(long, default_value_t = 5)]
        iterations: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Score a model on a JSONL training set
    Evaluate {
        data: PathBuf,
        #[arg(short, long)]
        model_dir: PathBuf,
    },
    /// Print the entities a model finds in a text
    Predict {
        text: String,
        #[arg(short, long)]
        model_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum TagAction {
    Add(TagArgs),
    Remove(TagArgs),
}

#[derive(clap::Args)]
struct TagArgs {
    project: PathBuf,
    index: usize,
    start: usize,
    end: usize,
    /// Entity label [default: the project's default label]
    #[arg(short, long, env = "TAGGA_LABEL")]
    label: Option<String>,
}

#[derive(Subcommand)]
enum VocabAction {
    List {
        project: PathBuf,
    },
    Learn {
        project: PathBuf,
        text: String,
        #[arg(short, long, env = "TAGGA_LABEL")]
        label: Option<String>,
    },
    Forget {
        project: PathBuf,
        text: String,
        #[arg(short, long, env = "TAGGA_LABEL")]
        label: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = build_config(cli.home, cli.text_field);

    match cli.command {
        Commands::Import { input, output } => {
            let (documents, path) = match output {
                Some(output) => {
                    let project = Project::import_json(&input, config)?;
                    (project.len(), project.save(Some(&output))?)
                }
                None => match Session::new(config).dispatch(Command::ImportJson(input))? {
                    Outcome::Imported { documents, path } => (documents, path),
                    other => bail!("Unexpected outcome of import: {other:?}"),
                },
            };
            println!("Imported {documents} documents into {}", path.display());
        }
        Commands::List { project } => {
            let session = open(&project)?;
            for (index, entry) in session.document_list().iter().enumerate() {
                println!("{index:>4}  {entry}");
            }
        }
        Commands::Show { project, index } => {
            let mut session = open(&project)?;
            let view = select(&mut session, index)?;
            if view.autotagged > 0 {
                session.dispatch(Command::SaveProject)?;
            }
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Commands::Tag { action } => {
            let (args, add) = match action {
                TagAction::Add(args) => (args, true),
                TagAction::Remove(args) => (args, false),
            };
            let mut session = open(&args.project)?;
            select(&mut session, args.index)?;
            let command = if add {
                Command::TagAdd {
                    start: args.start,
                    end: args.end,
                    label: args.label,
                }
            } else {
                Command::TagRemove {
                    start: args.start,
                    end: args.end,
                    label: args.label,
                }
            };
            match session.dispatch(command)? {
                Outcome::Tagged(a) => println!("Tagged {a}"),
                Outcome::Untagged(a) => println!("Untagged {a}"),
                other => bail!("Unexpected outcome of tagging: {other:?}"),
            }
            session.dispatch(Command::SaveProject)?;
        }
        Commands::Vocab { action } => vocab(action)?,
        Commands::Autotag { project, index } => {
            let mut loaded = Project::load(&project)?;
            let added = match index {
                Some(index) => loaded.autotag(index)?,
                None => loaded.autotag_all()?,
            };
            loaded.save(Some(&project))?;
            println!("Added {added} annotations");
        }
        Commands::Export { project, output } => {
            let project = Project::load(&project)?;
            let examples = project.training_examples();
            tagga_trainer::save_examples(&output, &examples)?;
            println!("Wrote {} examples to {}", examples.len(), output.display());
        }
        Commands::Convert { input, output } => {
            let mut examples = tagga_trainer::try_convert(&input)
                .with_context(|| format!("Failed to convert {}", input.display()))?;
            let labels = tagga_trainer::normalize_labels(&mut examples);
            tagga_trainer::save_examples(&output, &examples)?;
            println!(
                "Wrote {} examples with labels {:?} to {}",
                examples.len(),
                labels,
                output.display()
            );
        }
        Commands::Train {
            data,
            model_dir,
            base,
            iterations,
            seed,
        } => {
            let mut examples = tagga_trainer::load_examples(&data)
                .with_context(|| format!("Failed to read {}", data.display()))?;
            let labels = labels_of(&examples);
            let mut trainer = Trainer::<CrfModel>::new(base.as_deref(), &labels)?;
            if let Some(seed) = seed {
                trainer = trainer.with_seed(seed);
            }
            let losses = trainer.train(&mut examples, iterations)?;
            trainer.persist(&model_dir)?;
            if let Some(loss) = losses.last() {
                println!("Final loss: {loss:.1}");
            }
        }
        Commands::Evaluate { data, model_dir } => {
            let examples = tagga_trainer::load_examples(&data)
                .with_context(|| format!("Failed to read {}", data.display()))?;
            let trainer = Trainer::<CrfModel>::new(Some(&model_dir), &[] as &[&str])?;
            let scorable = scorable(examples);
            println!("Score: {:.3}", trainer.evaluate(&scorable)?);
        }
        Commands::Predict { text, model_dir } => {
            let trainer = Trainer::<CrfModel>::new(Some(&model_dir), &[] as &[&str])?;
            println!("{}", serde_json::to_string_pretty(&trainer.predict(&text))?);
        }
    }

    Ok(())
}

fn vocab(action: VocabAction) -> Result<()> {
    match action {
        VocabAction::List { project } => {
            let project = Project::load(&project)?;
            for entry in project.vocabulary().iter() {
                println!("{}\t{}", entry.label, entry.text);
            }
        }
        VocabAction::Learn {
            project: path,
            text,
            label,
        } => {
            let mut project = Project::load(&path)?;
            let label = label.unwrap_or_else(|| project.config().default_label.clone());
            if project.vocabulary_mut().learn(&text, &label) {
                project.save(Some(&path))?;
                println!("Learned {text:?} as {label}");
            } else {
                println!("Nothing to learn");
            }
        }
        VocabAction::Forget {
            project: path,
            text,
            label,
        } => {
            let mut project = Project::load(&path)?;
            let label = label.unwrap_or_else(|| project.config().default_label.clone());
            project.vocabulary_mut().forget(&text, &label)?;
            project.save(Some(&path))?;
            println!("Forgot {text:?} as {label}");
        }
    }
    Ok(())
}

fn build_config(home: Option<PathBuf>, text_field: Option<String>) -> TaggaConfig {
    let mut config = TaggaConfig::new();
    if let Some(home) = home {
        config = config.with_home(home);
    }
    if let Some(field) = text_field {
        config = config.with_text_field(field);
    }
    config
}

fn open(path: &Path) -> Result<Session> {
    let mut session = Session::default();
    session
        .dispatch(Command::LoadProject(path.to_path_buf()))
        .with_context(|| format!("Failed to open project {}", path.display()))?;
    Ok(session)
}

fn select(session: &mut Session, index: usize) -> Result<DocumentView> {
    match session.dispatch(Command::SelectDocument(index))? {
        Outcome::View(view) => Ok(view),
        other => bail!("Unexpected outcome of selection: {other:?}"),
    }
}

fn labels_of(examples: &[TrainingExample]) -> Vec<String> {
    let mut labels: Vec<String> = examples
        .iter()
        .flat_map(|e| e.entities.iter().map(|s| s.label.clone()))
        .collect();
    labels.sort();
    labels.dedup();
    labels
}

/// Examples with at least one gold entity.
fn scorable(examples: Vec<TrainingExample>) -> Vec<TrainingExample> {
    let total = examples.len();
    let kept: Vec<_> = examples
        .into_iter()
        .filter(|e| !e.entities.is_empty())
        .collect();
    if kept.len() < total {
        warn!("Skipping {} examples without entities", total - kept.len());
    }
    info!("Evaluating on {} examples", kept.len());
    kept
}
