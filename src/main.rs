use clap::{Parser, Subcommand};
use skiplogic_rs::survey::builder::SurveyBuilder;
use skiplogic_rs::survey::engine::SurveyEngine;
use skiplogic_rs::survey::error::SurveyError;
use skiplogic_rs::survey::loader::SurveyDefinition;
use skiplogic_rs::survey::model::{Question, QuestionType, Survey, UserId};
use skiplogic_rs::survey::store::{MemoryStore, SurveyStore};

use std::io;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that a survey definition builds and passes the publish rules
    Validate {
        /// Path to the survey definition file
        #[arg(short, long)]
        file: String,
    },
    /// Run a survey interactively in the terminal
    Run {
        /// Path to the survey definition file
        #[arg(short, long)]
        file: String,
    },
    /// Print the JSON Schema for survey definition files
    Schema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Validate { file } => validate(&file).await,
        Commands::Run { file } => run(&file).await,
        Commands::Schema => {
            let schema = schemars::schema_for!(SurveyDefinition);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}

async fn validate(file: &str) -> anyhow::Result<()> {
    let store: Arc<dyn SurveyStore> = Arc::new(MemoryStore::new());
    let builder = SurveyBuilder::new(store.clone());
    let engine = SurveyEngine::new(store);

    match build_and_publish(&builder, &engine, file).await {
        Ok(survey) => {
            println!("ok: '{}' builds and passes the publish checks", survey.title);
            Ok(())
        }
        Err(err) => {
            eprintln!("{}: {}", err.kind(), err);
            std::process::exit(1);
        }
    }
}

async fn run(file: &str) -> anyhow::Result<()> {
    let store: Arc<dyn SurveyStore> = Arc::new(MemoryStore::new());
    let builder = SurveyBuilder::new(store.clone());
    let engine = SurveyEngine::new(store.clone());

    let survey = build_and_publish(&builder, &engine, file).await?;
    let user = UserId(1);

    println!("=== {} ===", survey.title);
    println!("(answer each question; 'back' revisits, an empty line skips)");

    let mut current = engine.first_question(survey.id).await?;
    loop {
        show_question(&store, &current).await?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();

        if input == "back" {
            match engine.previous_question(user, survey.id, current.id).await {
                Ok(previous) => {
                    if let Some(answer) = &previous.answer {
                        println!("(current answer: {})", answer);
                    }
                    current = previous.question;
                }
                Err(err) => println!("{}", err),
            }
            continue;
        }

        let value = if input.is_empty() { None } else { Some(input) };
        match engine.submit_answer(user, survey.id, current.id, value).await {
            Ok(outcome) => {
                if outcome.finished {
                    println!("Survey complete, thank you!");
                    break;
                }
                if let Some(next) = outcome.next_question {
                    if let Some(prefill) = &outcome.prefill {
                        println!("(current answer: {})", prefill);
                    }
                    current = next;
                }
            }
            Err(err) => println!("{}", err),
        }
    }
    Ok(())
}

async fn build_and_publish(
    builder: &SurveyBuilder,
    engine: &SurveyEngine,
    file: &str,
) -> Result<Survey, SurveyError> {
    let id = builder.build_from_file(file).await?;
    engine.publish(id).await
}

async fn show_question(
    store: &Arc<dyn SurveyStore>,
    question: &Question,
) -> Result<(), SurveyError> {
    println!();
    println!("{}", question.title);
    if question.question_type == QuestionType::Option {
        for option in store.options_of(question.id).await? {
            println!("  [{}] {}", option.id, option.title);
        }
        println!("(pick an option by its number)");
    }
    Ok(())
}
