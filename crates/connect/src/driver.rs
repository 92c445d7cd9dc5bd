// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-oriented operator console over a [`Hub`].

use reqwest::Url;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::api::types::Credentials;
use crate::error::{Failure, GENERIC_MESSAGE};
use crate::hub::Hub;
use crate::provider::ProviderKind;
use crate::redirect::Location;
use crate::render::render;

pub const HELP: &str = "\
commands:
  status                          show the hub
  login <email> <password>        sign in
  connect <provider>              start linking a provider account
  manage <provider>               view connected resources
  back <provider>                 return to the provider overview
  resync <provider>               re-discover resources
  toggle <provider> <account-id>  select or deselect a resource
  save <provider>                 persist the selection
  disconnect <provider>           revoke the connection
  help                            show this text
  quit                            exit
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Login { email: String, password: String },
    Connect(ProviderKind),
    Manage(ProviderKind),
    Back(ProviderKind),
    Resync(ProviderKind),
    Toggle { provider: ProviderKind, account_id: String },
    Save(ProviderKind),
    Disconnect(ProviderKind),
    Help,
    Quit,
}

fn provider_arg(arg: Option<&str>) -> Result<ProviderKind, String> {
    let raw = arg.ok_or_else(|| "missing provider".to_owned())?;
    ProviderKind::from_discriminator(raw).ok_or_else(|| format!("unknown provider: {raw}"))
}

/// Parse one console line. Blank lines are not commands.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("empty command".to_owned());
    };
    let command = match verb.to_lowercase().as_str() {
        "status" | "show" => Command::Status,
        "login" => {
            let (Some(email), Some(password)) = (words.next(), words.next()) else {
                return Err("usage: login <email> <password>".to_owned());
            };
            Command::Login { email: email.to_owned(), password: password.to_owned() }
        }
        "connect" | "reconnect" => Command::Connect(provider_arg(words.next())?),
        "manage" => Command::Manage(provider_arg(words.next())?),
        "back" => Command::Back(provider_arg(words.next())?),
        "resync" | "sync" => Command::Resync(provider_arg(words.next())?),
        "toggle" => {
            let provider = provider_arg(words.next())?;
            let account_id =
                words.next().ok_or_else(|| "usage: toggle <provider> <account-id>".to_owned())?;
            Command::Toggle { provider, account_id: account_id.to_owned() }
        }
        "save" => Command::Save(provider_arg(words.next())?),
        "disconnect" => Command::Disconnect(provider_arg(words.next())?),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command: {other}")),
    };
    if words.next().is_some() {
        return Err(format!("too many arguments for {verb}"));
    }
    Ok(command)
}

/// Why the console stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Quit,
    /// The page navigated to a provider. The load is over.
    Navigated(Url),
    Interrupted,
    EndOfInput,
}

/// Result of one command.
enum Step {
    Continue(String),
    Stop(Outcome, String),
}

fn report(result: Result<(), Failure>, ok: &str) -> String {
    match result {
        Ok(()) if ok.is_empty() => String::new(),
        Ok(()) => format!("{ok}\n"),
        Err(e) => format!("failed: {}\n", e.user_message(GENERIC_MESSAGE)),
    }
}

async fn execute<L: Location>(hub: &mut Hub<L>, command: Command) -> Step {
    match command {
        Command::Status => Step::Continue(render(hub)),
        Command::Help => Step::Continue(HELP.to_owned()),
        Command::Quit => Step::Stop(Outcome::Quit, String::new()),
        Command::Login { email, password } => {
            let result = hub.login(&Credentials::new(email, password)).await;
            Step::Continue(format!("{}{}", report(result, "signed in"), render(hub)))
        }
        Command::Connect(kind) => match hub.connect(kind).await {
            Ok(url) => {
                let text = format!("open this address to continue:\n{url}\n");
                Step::Stop(Outcome::Navigated(url), text)
            }
            Err(e) => Step::Continue(format!("{}{}", report(Err(e), ""), render(hub))),
        },
        Command::Manage(kind) => {
            let result = hub.manage(kind).await;
            Step::Continue(format!("{}{}", report(result, ""), render(hub)))
        }
        Command::Back(kind) => {
            let result = hub.back(kind);
            Step::Continue(format!("{}{}", report(result, ""), render(hub)))
        }
        Command::Resync(kind) => {
            let result = hub.resync(kind).await;
            Step::Continue(format!("{}{}", report(result, "resynced"), render(hub)))
        }
        Command::Toggle { provider, account_id } => match hub.toggle(provider, &account_id) {
            Ok(true) => Step::Continue(format!("selected {account_id}\n")),
            Ok(false) => Step::Continue(format!("not selected: {account_id}\n")),
            Err(e) => Step::Continue(report(Err(e), "")),
        },
        Command::Save(kind) => {
            let result = hub.save(kind).await;
            let text = match result {
                Ok(()) => "selection saved\n".to_owned(),
                Err(e) => {
                    format!("save failed, selection kept: {}\n", e.user_message(GENERIC_MESSAGE))
                }
            };
            Step::Continue(text)
        }
        Command::Disconnect(kind) => {
            let result = hub.disconnect(kind).await;
            Step::Continue(format!("{}{}", report(result, "disconnected"), render(hub)))
        }
    }
}

/// Serve console commands until quit, navigation, interrupt or end of input.
pub async fn serve<L, R, W>(
    hub: &mut Hub<L>,
    input: R,
    output: &mut W,
    shutdown: CancellationToken,
) -> anyhow::Result<Outcome>
where
    L: Location,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(render(hub).as_bytes()).await?;
    output.flush().await?;

    let mut lines = input.lines();
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => return Ok(Outcome::Interrupted),
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            return Ok(Outcome::EndOfInput);
        };
        if line.trim().is_empty() {
            continue;
        }

        let step = match parse_command(&line) {
            Ok(command) => {
                let verb = line.split_whitespace().next().unwrap_or_default();
                tracing::debug!(verb, "console command");
                execute(hub, command).await
            }
            Err(e) => Step::Continue(format!("{e} (try `help`)\n")),
        };
        match step {
            Step::Continue(text) => {
                output.write_all(text.as_bytes()).await?;
                output.flush().await?;
            }
            Step::Stop(outcome, text) => {
                output.write_all(text.as_bytes()).await?;
                output.flush().await?;
                return Ok(outcome);
            }
        }
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
