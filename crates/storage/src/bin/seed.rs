use std::fmt;

use quiz_core::model::{AnswerId, AnswerOption, Question, QuestionId, SpecialtyId};
use serde::Deserialize;
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    bank_path: String,
    specialty: SpecialtyId,
    start_id: u64,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingBank,
    InvalidSpecialty { raw: String },
    InvalidStartId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingBank => write!(f, "--bank <questions.json> is required"),
            ArgsError::InvalidSpecialty { raw } => write!(f, "invalid --specialty value: {raw}"),
            ArgsError::InvalidStartId { raw } => write!(f, "invalid --start-id value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut bank_path = std::env::var("QUIZ_BANK").ok();
        let mut specialty = std::env::var("QUIZ_SPECIALTY")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map_or_else(|| SpecialtyId::new(1), SpecialtyId::new);
        let mut start_id = 1_u64;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--bank" => {
                    bank_path = Some(require_value(&mut args, "--bank")?);
                }
                "--specialty" => {
                    let raw = require_value(&mut args, "--specialty")?;
                    let value = raw
                        .parse::<u64>()
                        .map_err(|_| ArgsError::InvalidSpecialty { raw: raw.clone() })?;
                    specialty = SpecialtyId::new(value);
                }
                "--start-id" => {
                    let raw = require_value(&mut args, "--start-id")?;
                    start_id = raw
                        .parse::<u64>()
                        .map_err(|_| ArgsError::InvalidStartId { raw: raw.clone() })?;
                }
                other => return Err(ArgsError::UnknownArg(other.to_string())),
            }
        }

        let bank_path = bank_path.ok_or(ArgsError::MissingBank)?;
        Ok(Self {
            db_url,
            bank_path,
            specialty,
            start_id,
        })
    }
}

/// One entry of the JSON question bank.
#[derive(Debug, Deserialize)]
struct QuestionSeed {
    question: String,
    options: Vec<OptionSeed>,
}

#[derive(Debug, Deserialize)]
struct OptionSeed {
    text: String,
    #[serde(default)]
    correct: bool,
}

impl QuestionSeed {
    /// A well-formed entry has a non-blank question, at least two options,
    /// and exactly one marked correct.
    fn problem(&self) -> Option<&'static str> {
        if self.question.trim().is_empty() {
            return Some("blank question text");
        }
        if self.options.len() < 2 {
            return Some("fewer than two options");
        }
        match self.options.iter().filter(|o| o.correct).count() {
            0 => Some("no option marked correct"),
            1 => None,
            _ => Some("more than one option marked correct"),
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse()?;

    let raw = std::fs::read_to_string(&args.bank_path)?;
    let bank: Vec<QuestionSeed> = serde_json::from_str(&raw)?;

    let storage = Storage::sqlite(&args.db_url).await?;

    let mut next_question_id = args.start_id;
    let mut next_answer_id = args.start_id;
    let mut inserted = 0_u32;
    let mut skipped = 0_u32;

    for seed in &bank {
        if let Some(problem) = seed.problem() {
            eprintln!("skipping question ({problem}): {:?}", seed.question);
            skipped += 1;
            continue;
        }

        let question = Question::new(
            QuestionId::new(next_question_id),
            args.specialty,
            seed.question.clone(),
        )?;
        storage.questions.upsert_question(&question).await?;

        for option in &seed.options {
            let answer = AnswerOption::new(
                AnswerId::new(next_answer_id),
                question.id(),
                option.text.clone(),
                option.correct,
            )?;
            storage.answers.upsert_answer(&answer).await?;
            next_answer_id += 1;
        }

        next_question_id += 1;
        inserted += 1;
    }

    println!(
        "Seeded {inserted} questions for specialty {} into {} ({skipped} skipped)",
        args.specialty.value(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
