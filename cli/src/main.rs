mod config;
mod logging;

use std::cell::RefCell;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;
use question_input_protocol::ConversationId;
use question_input_protocol::SubmissionPayload;
use question_input_tui::QuestionInputProps;

use crate::config::ConfigStore;
use crate::config::QuestionInputConfig;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Compose questions with image attachments and print each submission as a JSON line"
)]
struct Cli {
    /// Conversation identifier forwarded verbatim with every submission.
    #[arg(long, env = "QUESTION_INPUT_CONVERSATION_ID")]
    conversation_id: Option<String>,

    /// Hint shown in the empty question field. Overrides `placeholder` from config.
    #[arg(long)]
    placeholder: Option<String>,

    /// Start with sending disabled.
    #[arg(long)]
    disabled: bool,

    /// Keep the question and attachments after each send. Overrides `clear_on_send` from config.
    #[arg(long)]
    no_clear_on_send: bool,

    /// Image files to attach before the first keystroke.
    #[arg(long = "attach", value_name = "PATH", num_args = 1..)]
    attach: Vec<PathBuf>,

    /// Append each submission to this file as a JSON line.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Read settings from this file instead of `~/.question-input/config.toml`.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let store = match &cli.config {
        Some(path) => ConfigStore::new(path.clone()),
        None => ConfigStore::new_default()?,
    };
    let loaded = store
        .load()
        .with_context(|| format!("load config from {}", store.path().display()))?;

    let _log_guard = logging::init(
        &config::home_dir()?.join("log"),
        &loaded.config.log_filter,
    )?;
    if let Some(warning) = &loaded.warning {
        tracing::warn!("{warning}");
    }

    let props = resolve_props(&cli, &loaded.config);
    tracing::info!(
        "starting question input (clear_on_send={}, disabled={}, {} preloaded file(s))",
        props.clear_on_send,
        props.disabled,
        cli.attach.len()
    );

    let sink = Rc::new(RefCell::new(SubmissionSink::open(cli.output.as_deref())?));
    let handler = {
        let sink = Rc::clone(&sink);
        move |payload: SubmissionPayload| sink.borrow_mut().record(payload)
    };

    let result =
        question_input_tui::run_question_input(props, Box::new(handler), cli.attach.clone())
            .await;

    // Submissions made before a failure are still reported.
    let sink = sink.take();
    write_jsonl(&mut std::io::stdout().lock(), &sink.payloads).context("write submissions")?;
    if let Some(err) = sink.write_error {
        return Err(err);
    }

    let exit_info = result?;
    tracing::info!("exit: {:?}", exit_info.exit_reason);
    Ok(())
}

/// Collects submissions for stdout and appends each one to `--output` as soon as it is sent.
#[derive(Default)]
struct SubmissionSink {
    output: Option<(PathBuf, File)>,
    payloads: Vec<SubmissionPayload>,
    write_error: Option<anyhow::Error>,
}

impl SubmissionSink {
    fn open(output: Option<&Path>) -> anyhow::Result<Self> {
        let output = match output {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("open {}", path.display()))?;
                Some((path.to_path_buf(), file))
            }
            None => None,
        };
        Ok(Self {
            output,
            ..Self::default()
        })
    }

    fn record(&mut self, payload: SubmissionPayload) {
        if let Some((path, file)) = &mut self.output
            && let Err(err) = write_jsonl(file, std::slice::from_ref(&payload))
        {
            tracing::error!("failed to append submission to {}: {err:#}", path.display());
            if self.write_error.is_none() {
                self.write_error =
                    Some(err.context(format!("write submissions to {}", path.display())));
            }
        }
        self.payloads.push(payload);
    }
}

/// Merge config with flags; flags win.
fn resolve_props(cli: &Cli, config: &QuestionInputConfig) -> QuestionInputProps {
    QuestionInputProps {
        disabled: cli.disabled,
        placeholder: Some(
            cli.placeholder
                .clone()
                .unwrap_or_else(|| config.placeholder.clone()),
        ),
        clear_on_send: config.clear_on_send && !cli.no_clear_on_send,
        conversation_id: cli.conversation_id.clone().map(ConversationId::from),
    }
}

fn write_jsonl(writer: &mut impl Write, payloads: &[SubmissionPayload]) -> anyhow::Result<()> {
    for payload in payloads {
        serde_json::to_writer(&mut *writer, payload)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
