//! Purpose: `mpvbind` CLI entry point and the `play` demo command.
//! Role: Binary crate root; parses args, drives one session, streams events.
//! Invariants: Event lines go to stdout; diagnostics and errors to stderr.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::ffi::OsString;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;

use clap::{error::ErrorKind as ClapErrorKind, Args, Parser, Subcommand, ValueHint};
use serde::Serialize;
use serde_json::{json, Map, Value};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing_subscriber::EnvFilter;

use mpvbind::api::{
    to_exit_code, CommandExt, EndFileReason, Error, ErrorCode, ErrorKind, Event, EventHandler,
    EventPayload, LogLevel, MpvSession, NodeValue, SessionOptions,
};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint(clap_error_hint(&err)));
            }
        },
    };

    match cli.command {
        Command::Play(args) => run_play(args),
    }
}

fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let replacement = arg.to_str().and_then(|value| match value {
                "---help" => Some("--help"),
                "---version" => Some("--version"),
                _ => None,
            });
            replacement.map(OsString::from).unwrap_or_else(|| arg)
        })
        .collect()
}

#[derive(Parser)]
#[command(
    name = "mpvbind",
    version,
    about = "Play media through a dynamically loaded libmpv",
    after_help = r#"EXAMPLES
  $ mpvbind play clip.mkv
  $ mpvbind play clip.mkv --observe time-pos --observe pause
  $ mpvbind play clip.mkv --library /opt/mpv/libmpv.so.2 --opt hwdec=auto
  $ mpvbind play clip.mkv --log-level info --json"#,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Load a file and stream engine events until it ends",
        long_about = r#"Load a file and stream engine events until it ends.

Creates one engine session, observes the requested properties, and prints
every event the engine delivers. The session quits cleanly when the file
finishes or on Ctrl-C."#
    )]
    Play(PlayArgs),
}

#[derive(Args)]
struct PlayArgs {
    #[arg(help = "Media file or URL to play", value_hint = ValueHint::AnyPath)]
    file: String,
    #[arg(
        long,
        help = "Path to the engine library (default: the platform library name)",
        value_hint = ValueHint::FilePath
    )]
    library: Option<PathBuf>,
    #[arg(
        long = "opt",
        value_name = "KEY=VALUE",
        help = "Engine option applied before initialize (repeatable)"
    )]
    opts: Vec<String>,
    #[arg(
        long = "observe",
        value_name = "PROPERTY",
        help = "Property to observe for changes (repeatable)"
    )]
    observe: Vec<String>,
    #[arg(
        long,
        value_name = "LEVEL",
        help = "Request engine log messages: no|fatal|error|warn|info|v|debug|trace"
    )]
    log_level: Option<String>,
    #[arg(long, help = "Emit events as JSON lines on stdout")]
    json: bool,
}

enum PlayEnd {
    Finished,
    Interrupted,
    Shutdown,
}

fn run_play(args: PlayArgs) -> Result<RunOutcome, Error> {
    init_tracing();

    let log_level = args
        .log_level
        .as_deref()
        .map(LogLevel::from_str)
        .transpose()?;
    let options = SessionOptions {
        library: args.library,
        options: parse_engine_options(&args.opts)?,
        log_level,
    };
    let session = MpvSession::create(&options)?;

    for name in &args.observe {
        session.observe_property(name, None, None)?;
    }

    let (done_tx, done_rx) = mpsc::channel();
    session.start_events(Arc::new(PlaySink {
        json: args.json,
        done: done_tx.clone(),
    }))?;
    watch_interrupts(done_tx)?;
    session.play(&args.file)?;

    match done_rx.recv().unwrap_or(PlayEnd::Shutdown) {
        PlayEnd::Interrupted => {
            if io::stderr().is_terminal() {
                eprintln!("Interrupted, shutting down.");
            }
        }
        PlayEnd::Finished | PlayEnd::Shutdown => {}
    }
    session.quit()?;
    Ok(RunOutcome::ok())
}

/// Prints every event and reports terminal ones back to the main thread.
struct PlaySink {
    json: bool,
    done: mpsc::Sender<PlayEnd>,
}

impl EventHandler for PlaySink {
    fn on_event(&self, event: &Event) {
        if self.json {
            let line = serde_json::to_string(&event_json(event)).unwrap_or_default();
            println!("{line}");
        } else {
            println!("{}", event_line(event));
        }
    }

    fn on_end_file(&self, _reason: EndFileReason, _error: Option<ErrorCode>) {
        let _ = self.done.send(PlayEnd::Finished);
    }

    fn on_shutdown(&self) {
        let _ = self.done.send(PlayEnd::Shutdown);
    }
}

fn watch_interrupts(done: mpsc::Sender<PlayEnd>) -> Result<(), Error> {
    let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("could not install signal handlers")
            .with_source(err)
    })?;
    std::thread::Builder::new()
        .name("mpv-signals".to_string())
        .spawn(move || {
            for _signal in signals.forever() {
                if done.send(PlayEnd::Interrupted).is_err() {
                    break;
                }
            }
        })
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("could not spawn the signal watcher")
                .with_source(err)
        })?;
    Ok(())
}

fn parse_engine_options(raw: &[String]) -> Result<Vec<(String, NodeValue)>, Error> {
    raw.iter()
        .map(|entry| {
            let split = entry.split_once('=');
            match split {
                Some((key, value)) if !key.is_empty() => {
                    Ok((key.to_string(), NodeValue::from(value)))
                }
                _ => Err(Error::new(ErrorKind::Usage)
                    .with_message(format!("invalid option `{entry}`"))
                    .with_hint("Options take the form `--opt name=value`, like `--opt hwdec=auto`.")),
            }
        })
        .collect()
}

fn event_json(event: &Event) -> Value {
    let mut fields = Map::new();
    fields.insert("event".to_string(), json!(event.kind.name()));
    if let Some(code) = event.error {
        fields.insert("error".to_string(), json!(code.as_raw()));
    }
    if event.reply_key != 0 {
        fields.insert("key".to_string(), json!(event.reply_key));
    }
    match &event.payload {
        Some(EventPayload::PropertyChange { name, value }) => {
            fields.insert("name".to_string(), json!(name));
            fields.insert("value".to_string(), value.to_json());
        }
        Some(EventPayload::LogMessage {
            prefix,
            level,
            text,
        }) => {
            fields.insert("prefix".to_string(), json!(prefix));
            fields.insert("level".to_string(), json!(level));
            fields.insert("text".to_string(), json!(text.trim_end()));
        }
        Some(EventPayload::EndFile { reason, error }) => {
            fields.insert("reason".to_string(), json!(reason.as_str()));
            if let Some(code) = error {
                fields.insert("file_error".to_string(), json!(code.as_raw()));
            }
        }
        Some(EventPayload::ClientMessage(args)) => {
            fields.insert("args".to_string(), json!(args));
        }
        None => {}
    }
    Value::Object(fields)
}

fn event_line(event: &Event) -> String {
    match &event.payload {
        Some(EventPayload::PropertyChange { name, value }) => {
            format!("{} {name} = {}", event.kind.name(), value.to_json())
        }
        Some(EventPayload::LogMessage {
            prefix,
            level,
            text,
        }) => format!("log [{prefix}] {level}: {}", text.trim_end()),
        Some(EventPayload::EndFile { reason, .. }) => {
            format!("{} ({})", event.kind.name(), reason.as_str())
        }
        Some(EventPayload::ClientMessage(args)) => {
            format!("{} {}", event.kind.name(), args.join(" "))
        }
        None => event.kind.name().to_string(),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let json = serde_json::to_string(&error_record(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

/// Machine-readable error envelope for non-interactive stderr.
#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    args: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    causes: Vec<String>,
}

fn error_record(err: &Error) -> ErrorEnvelope {
    ErrorEnvelope {
        error: ErrorBody {
            kind: format!("{:?}", err.kind()),
            message: error_message(err),
            hint: err.hint().map(str::to_string),
            function: err.function().map(str::to_string),
            code: err.code().map(|code| code.as_raw()),
            args: err.args().to_vec(),
            causes: error_causes(err),
        },
    }
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::LibraryNotLoaded => "library not loaded".to_string(),
        ErrorKind::VersionMismatch => "client api version mismatch".to_string(),
        ErrorKind::Native => "native call failed".to_string(),
        ErrorKind::AccessDenied => "access denied".to_string(),
        ErrorKind::UnknownProperty => "unknown property".to_string(),
        ErrorKind::UnsupportedValue => "unsupported value".to_string(),
        ErrorKind::EventLoop => "event loop anomaly".to_string(),
        ErrorKind::Uninitialized => "session is shut down".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
        ErrorKind::Internal => "internal error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_text(err: &Error) -> String {
    let mut lines = Vec::new();
    lines.push(format!("error: {}", error_message(err)));

    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(function) = err.function() {
        lines.push(format!("function: {function}"));
    }
    if let Some(code) = err.code() {
        lines.push(format!("code: {}", code.as_raw()));
    }
    if !err.args().is_empty() {
        lines.push(format!("args: {}", err.args().join(" ")));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!("caused by: {cause}"));
    }

    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);

    let Some(usage) = usage else {
        return "Try `mpvbind --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "mpvbind") else {
        return "Try `mpvbind --help`.".to_string();
    };

    let mut parts = Vec::new();
    for token in tokens.iter().skip(pos + 1) {
        if token.starts_with('-') || token.starts_with('<') || token.starts_with('[') {
            break;
        }
        parts.push(*token);
    }

    if parts.is_empty() {
        return "Try `mpvbind --help`.".to_string();
    }

    format!("Try `mpvbind {} --help`.", parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::{
        clap_error_summary, error_record, error_text, event_json, event_line, normalize_args,
        parse_engine_options, Cli,
    };
    use clap::Parser;
    use mpvbind::api::{
        ErrorCode, ErrorKind, Event, EventKind, EventPayload, NodeValue,
    };
    use std::ffi::OsString;

    #[test]
    fn play_arguments_parse() {
        let cli = Cli::try_parse_from([
            "mpvbind",
            "play",
            "clip.mkv",
            "--opt",
            "hwdec=auto",
            "--observe",
            "time-pos",
            "--observe",
            "pause",
            "--log-level",
            "info",
            "--json",
        ])
        .expect("parse");
        let super::Command::Play(args) = cli.command;
        assert_eq!(args.file, "clip.mkv");
        assert_eq!(args.opts, vec!["hwdec=auto".to_string()]);
        assert_eq!(
            args.observe,
            vec!["time-pos".to_string(), "pause".to_string()]
        );
        assert_eq!(args.log_level.as_deref(), Some("info"));
        assert!(args.json);
    }

    #[test]
    fn triple_dash_help_is_normalized() {
        let normalized = normalize_args([OsString::from("mpvbind"), OsString::from("---help")]);
        assert_eq!(normalized[1], OsString::from("--help"));
    }

    #[test]
    fn engine_options_split_on_the_first_equals() {
        let parsed =
            parse_engine_options(&["hwdec=auto".to_string(), "ytdl-raw-options=format=best".to_string()])
                .expect("parse");
        assert_eq!(
            parsed,
            vec![
                ("hwdec".to_string(), NodeValue::from("auto")),
                ("ytdl-raw-options".to_string(), NodeValue::from("format=best")),
            ]
        );
    }

    #[test]
    fn bad_engine_options_fail_usage() {
        let err = parse_engine_options(&["hwdec".to_string()])
            .err()
            .expect("usage error");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err.hint().is_some());
    }

    #[test]
    fn property_change_event_json_shape() {
        let event = Event {
            kind: EventKind::PropertyChange,
            error: None,
            reply_key: 11,
            payload: Some(EventPayload::PropertyChange {
                name: "pause".to_string(),
                value: NodeValue::Flag(false),
            }),
        };
        let value = event_json(&event);
        assert_eq!(value["event"], "property-change");
        assert_eq!(value["key"], 11);
        assert_eq!(value["name"], "pause");
        assert_eq!(value["value"], false);
    }

    #[test]
    fn log_event_lines_trim_trailing_newlines() {
        let event = Event {
            kind: EventKind::LogMessage,
            error: None,
            reply_key: 0,
            payload: Some(EventPayload::LogMessage {
                prefix: "cplayer".to_string(),
                level: "info".to_string(),
                text: "Playing: clip.mkv\n".to_string(),
            }),
        };
        assert_eq!(event_line(&event), "log [cplayer] info: Playing: clip.mkv");
    }

    #[test]
    fn error_records_nest_under_the_error_key() {
        let err = mpvbind::api::Error::new(ErrorKind::Native)
            .with_message("native call failed")
            .with_function("mpv_command")
            .with_code(ErrorCode::Command)
            .with_args(vec!["loadfile".to_string(), "missing.mp4".to_string()]);
        let value = serde_json::to_value(error_record(&err)).expect("encode");
        assert_eq!(value["error"]["kind"], "Native");
        assert_eq!(value["error"]["function"], "mpv_command");
        assert_eq!(value["error"]["code"], -12);
        assert_eq!(value["error"]["args"][1], "missing.mp4");
        assert!(value["error"].get("hint").is_none());
    }

    #[test]
    fn error_text_labels_hint_and_cause() {
        let err = mpvbind::api::Error::new(ErrorKind::LibraryNotLoaded)
            .with_message("could not load `libmpv.so.1`")
            .with_hint("Install libmpv or pass an explicit library path.");
        let text = error_text(&err);
        assert!(text.starts_with("error: could not load"));
        assert!(text.contains("hint: Install libmpv"));
    }

    #[test]
    fn clap_errors_summarize_to_one_line() {
        let err = Cli::try_parse_from(["mpvbind", "playy"]).err().expect("clap error");
        let summary = clap_error_summary(&err);
        assert!(!summary.is_empty());
        assert!(!summary.contains('\n'));
    }
}
