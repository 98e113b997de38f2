//! Multi-client load harness.
//!
//! Spawns N simulated clients, each running one weighted-random scenario
//! against the server, then prints per-scenario success rates. For the
//! `Invalid*` scenarios, success means the server handled the bad call
//! correctly.

use crate::config::StressArgs;
use anyhow::{bail, Result};
use log::{error, info};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use topicnotes_core::now_timestamp;
use topicnotes_rpc::{CallError, Reply, RpcClient};

const WIKI_TOPICS: [&str; 5] = [
    "Python",
    "XML-RPC",
    "Distributed Systems",
    "Web Services",
    "Multithreading",
];
const NONSENSE_TOPICS: [&str; 3] = [
    "xyznonexistentwikipageasdfjkl",
    "thispageisnotawikipediapage123456789",
    "completelyrandomimaginarysubject98765",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    AddNote,
    GetNote,
    GetWikipedia,
    GetTitles,
    InvalidMethod,
    InvalidParameters,
}

impl Kind {
    const ALL: [Kind; 6] = [
        Kind::AddNote,
        Kind::GetNote,
        Kind::GetWikipedia,
        Kind::GetTitles,
        Kind::InvalidMethod,
        Kind::InvalidParameters,
    ];
    const WEIGHTS: [u32; 6] = [2, 2, 1, 1, 1, 3];

    fn label(self) -> &'static str {
        match self {
            Self::AddNote => "TestAddNote",
            Self::GetNote => "TestGetNote",
            Self::GetWikipedia => "TestGetWikipedia",
            Self::GetTitles => "TestGetTitles",
            Self::InvalidMethod => "TestInvalidMethod",
            Self::InvalidParameters => "TestInvalidParameters",
        }
    }

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|kind| *kind == self)
            .unwrap_or_default()
    }
}

/// One fully-drawn client action; all randomness is resolved up front.
#[derive(Debug, Clone)]
enum Scenario {
    AddNote { topic: String, note: String, text: String },
    GetNote { topic: String },
    GetWikipedia { topic: &'static str },
    GetTitles,
    InvalidMethod,
    NonexistentWiki { topic: &'static str },
    NonexistentTopic { topic: String },
    EmptyTopic,
    MissingParams,
    WrongTypes,
    AllEmpty,
}

impl Scenario {
    fn draw(kind: Kind, rng: &mut impl Rng) -> Self {
        match kind {
            Kind::AddNote => Self::AddNote {
                topic: format!("Topic-{}", rng.gen_range(1..=10)),
                note: format!("Note-{}", rng.gen_range(1..=100)),
                text: format!("Text-{}", rng.gen_range(1..=100)),
            },
            Kind::GetNote => Self::GetNote {
                topic: format!("Topic-{}", rng.gen_range(1..=10)),
            },
            Kind::GetWikipedia => Self::GetWikipedia {
                topic: WIKI_TOPICS.choose(rng).copied().unwrap_or("Python"),
            },
            Kind::GetTitles => Self::GetTitles,
            Kind::InvalidMethod => Self::InvalidMethod,
            Kind::InvalidParameters => match rng.gen_range(0..6) {
                0 => Self::NonexistentWiki {
                    topic: NONSENSE_TOPICS.choose(rng).copied().unwrap_or("zzzz"),
                },
                1 => Self::NonexistentTopic {
                    topic: format!("NonexistentTopic-{}", rng.gen_range(1000..=9999)),
                },
                2 => Self::EmptyTopic,
                3 => Self::MissingParams,
                4 => Self::WrongTypes,
                _ => Self::AllEmpty,
            },
        }
    }

    /// Executes the scenario; `Err` carries the failure detail.
    async fn execute(self, client: &RpcClient) -> Result<(), String> {
        match self {
            Self::AddNote { topic, note, text } => {
                let message = client
                    .save_note(&topic, &note, &text, &now_timestamp())
                    .await
                    .map_err(|err| err.to_string())?;
                expect(!message.contains("Error"), message)
            }
            Self::GetNote { topic } => match client.get_notes(&topic).await {
                Ok(Reply::Message(message)) if message.contains("Error") => Err(message),
                Ok(_) => Ok(()),
                Err(err) => Err(err.to_string()),
            },
            Self::GetWikipedia { topic } => {
                let message = client
                    .get_wikipedia(topic)
                    .await
                    .map_err(|err| err.to_string())?;
                expect(
                    !message.contains("No Wikipedia information found")
                        && !message.starts_with("Error"),
                    message,
                )
            }
            Self::GetTitles => match client.get_topics().await {
                Ok(Reply::Items(_)) => Ok(()),
                Ok(Reply::Message(message)) => Err(message),
                Err(err) => Err(err.to_string()),
            },
            Self::InvalidMethod => expect_fault(client.call("nonExistentMethod", vec![]).await),
            Self::NonexistentWiki { topic } => {
                let message = client
                    .get_wikipedia(topic)
                    .await
                    .map_err(|err| err.to_string())?;
                expect(message.contains("No Wikipedia information found"), message)
            }
            Self::NonexistentTopic { topic } => {
                expect_message(client.get_notes(&topic).await, "No notes found")
            }
            Self::EmptyTopic => expect_message(client.get_notes("").await, "cannot be empty"),
            Self::MissingParams => {
                expect_fault(client.call("saveNote", vec![json!("TestTopic")]).await)
            }
            Self::WrongTypes => {
                let value = client
                    .call("getnotes", vec![json!(123)])
                    .await
                    .map_err(|err| err.to_string())?;
                expect(
                    value == Value::String("Topic should be a string".to_string()),
                    value.to_string(),
                )
            }
            Self::AllEmpty => {
                let message = client
                    .save_note("", "", "", "")
                    .await
                    .map_err(|err| err.to_string())?;
                expect(message.contains("cannot be empty"), message)
            }
        }
    }
}

fn expect(ok: bool, detail: impl Into<String>) -> Result<(), String> {
    if ok {
        Ok(())
    } else {
        Err(detail.into())
    }
}

fn expect_fault(result: Result<Value, CallError>) -> Result<(), String> {
    match result {
        Err(CallError::Fault(_)) => Ok(()),
        Err(err) => Err(err.to_string()),
        Ok(value) => Err(format!("call unexpectedly succeeded: {value}")),
    }
}

fn expect_message<T: std::fmt::Debug>(
    result: Result<Reply<T>, CallError>,
    needle: &str,
) -> Result<(), String> {
    match result {
        Ok(Reply::Message(message)) => expect(message.contains(needle), message),
        Ok(other) => Err(format!("expected `{needle}`, got {other:?}")),
        Err(err) => Err(err.to_string()),
    }
}

#[derive(Default)]
struct Tally {
    success: AtomicUsize,
    failure: AtomicUsize,
}

pub async fn run(args: &StressArgs) -> Result<()> {
    if args.clients == 0 {
        bail!("Usage: topicnotes stress <number_of_clients>");
    }
    println!("Starting test with {} clients", args.clients);

    let probe = RpcClient::with_policy(&args.client.server, args.client.retry_policy())?;
    if let Err(err) = probe.get_topics().await {
        bail!(
            "Cannot connect to server at {}. Please ensure the server is running. Error: {err}",
            args.client.server
        );
    }
    println!("Server connection successful. Starting tests...");

    let tallies: Arc<[Tally; 6]> = Arc::new(Default::default());
    let started_at = Instant::now();
    let mut handles = Vec::with_capacity(args.clients);

    for index in 0..args.clients {
        // ThreadRng is !Send; draw everything before the next await.
        let (kind, scenario, pause) = {
            let mut rng = rand::thread_rng();
            let picker = WeightedIndex::new(Kind::WEIGHTS)?;
            let kind = Kind::ALL[picker.sample(&mut rng)];
            let scenario = Scenario::draw(kind, &mut rng);
            let pause = Duration::from_millis(rng.gen_range(100..=300));
            (kind, scenario, pause)
        };

        let client = RpcClient::with_policy(&args.client.server, args.client.retry_policy())?;
        let tallies = Arc::clone(&tallies);
        let name = format!("Client-{}-{}", index + 1, kind.label());
        handles.push(tokio::spawn(async move {
            let tally = &tallies[kind.index()];
            match scenario.execute(&client).await {
                Ok(()) => {
                    tally.success.fetch_add(1, Ordering::Relaxed);
                    info!("{name} - Success");
                }
                Err(detail) => {
                    tally.failure.fetch_add(1, Ordering::Relaxed);
                    error!("{name} - FAILURE: {detail}");
                }
            }
        }));

        tokio::time::sleep(pause).await;
    }

    for handle in handles {
        handle.await?;
    }

    println!("\n--- Test Summary ---");
    println!(
        "Test completed in {:.2} seconds",
        started_at.elapsed().as_secs_f64()
    );
    println!("Total clients: {}", args.clients);
    for kind in Kind::ALL {
        let tally = &tallies[kind.index()];
        let success = tally.success.load(Ordering::Relaxed);
        let failure = tally.failure.load(Ordering::Relaxed);
        if let Some(line) = summary_line(kind, success, failure) {
            println!("{line}");
        }
    }

    Ok(())
}

fn summary_line(kind: Kind, success: usize, failure: usize) -> Option<String> {
    let total = success + failure;
    if total == 0 {
        return None;
    }
    let rate = success as f64 / total as f64 * 100.0;
    Some(match kind {
        Kind::InvalidMethod | Kind::InvalidParameters => format!(
            "{}: {success} properly handled errors, {failure} unexpected successes ({rate:.1}% proper error handling)",
            kind.label()
        ),
        _ => format!(
            "{}: {success} successful, {failure} failed ({rate:.1}% success rate)",
            kind.label()
        ),
    })
}
