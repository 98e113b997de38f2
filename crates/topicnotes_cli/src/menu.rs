//! Interactive menu client.

use crate::config::ClientArgs;
use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use topicnotes_core::now_timestamp;
use topicnotes_rpc::{Reply, RpcClient};

type Input = Lines<BufReader<Stdin>>;

pub async fn run(args: &ClientArgs) -> Result<()> {
    let client = RpcClient::with_policy(&args.server, args.retry_policy())?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        println!("Menu:");
        println!("1. Add a note");
        println!("2. Get notes by topic");
        println!("3. Get Wikipedia information to a topic");
        println!("0. Exit");
        let Some(choice) = prompt(&mut input, "Enter choice: ").await? else {
            return Ok(());
        };
        println!();

        match choice.trim() {
            "0" => return Ok(()),
            action @ ("1" | "2" | "3") => {
                // Topics are shown first; an unreachable server skips the action.
                if !display_topics(&client).await {
                    continue;
                }
                match action {
                    "1" => add_note(&client, &mut input).await?,
                    "2" => get_notes(&client, &mut input).await?,
                    _ => wikipedia(&client, &mut input).await?,
                }
            }
            _ => println!("Invalid choice \n"),
        }
    }
}

/// Prints the topic list; `false` when the server cannot be reached.
async fn display_topics(client: &RpcClient) -> bool {
    match client.get_topics().await {
        Ok(Reply::Items(topics)) if topics.is_empty() => println!("No topics found"),
        Ok(Reply::Items(topics)) => {
            println!("Your topics: \n");
            for topic in topics {
                println!("{topic}");
            }
        }
        Ok(Reply::Message(message)) => println!("{message}"),
        Err(err) => {
            println!("Error getting topics: {err}");
            return false;
        }
    }
    println!();
    true
}

async fn add_note(client: &RpcClient, input: &mut Input) -> Result<()> {
    let Some(topic) = prompt_non_empty(input, "topic").await? else {
        return Ok(());
    };
    let Some(note) = prompt_non_empty(input, "note").await? else {
        return Ok(());
    };
    let Some(text) = prompt_non_empty(input, "text").await? else {
        return Ok(());
    };

    match client
        .save_note(&topic, &note, &text, &now_timestamp())
        .await
    {
        Ok(message) => println!("{message}"),
        Err(err) => println!("Error saving note: {err}"),
    }
    println!();
    Ok(())
}

async fn get_notes(client: &RpcClient, input: &mut Input) -> Result<()> {
    let Some(topic) = prompt(input, "Enter topic or press enter to exit: ").await? else {
        return Ok(());
    };
    println!();
    if topic.is_empty() {
        return Ok(());
    }

    match client.get_notes(&topic).await {
        Ok(Reply::Items(notes)) => {
            for (name, text, date) in notes {
                println!("Name: {name} \nText: {text} \nDate:{date} \n");
            }
        }
        Ok(Reply::Message(message)) => println!("{message}"),
        Err(err) => println!("Error getting notes: {err}"),
    }
    Ok(())
}

async fn wikipedia(client: &RpcClient, input: &mut Input) -> Result<()> {
    let Some(topic) = prompt(
        input,
        "Enter topic to search on Wikipedia or press enter to exit: ",
    )
    .await?
    else {
        return Ok(());
    };
    println!();
    if topic.is_empty() {
        return Ok(());
    }

    match client.get_wikipedia(&topic).await {
        Ok(message) => println!("{message}"),
        Err(err) => println!("Error getting Wikipedia information: {err}"),
    }
    println!();
    Ok(())
}

/// Re-asks until a non-blank value is entered; `None` on end of input.
async fn prompt_non_empty(input: &mut Input, label: &str) -> Result<Option<String>> {
    loop {
        let Some(value) = prompt(input, &format!("Enter {label}: ")).await? else {
            return Ok(None);
        };
        println!();
        if !value.trim().is_empty() {
            return Ok(Some(value));
        }
        println!("{}{} cannot be empty", label[..1].to_uppercase(), &label[1..]);
    }
}

async fn prompt(input: &mut Input, message: &str) -> Result<Option<String>> {
    print!("{message}");
    std::io::stdout().flush()?;
    Ok(input.next_line().await?)
}
