use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use tempfile::{tempdir, NamedTempFile};

/// Config plus a syntactically valid credentials file; no network is touched
/// because every scenario below stops before the storage session is opened.
fn create_config(dir: &std::path::Path) -> NamedTempFile {
    let credentials = dir.join("credentials.json");
    write(
        &credentials,
        r#"{"type":"authorized_user","client_id":"id","client_secret":"secret","refresh_token":"rt"}"#,
    )
    .expect("Writing credentials failed");

    let config = NamedTempFile::new().expect("Creating temp config file failed");
    write(
        config.path(),
        format!(
            "storage:\n  bucket: translations-test\n  credentials: {}\n",
            credentials.display()
        ),
    )
    .expect("Writing temp config failed");
    config
}

fn command() -> Command {
    let mut cmd = Command::cargo_bin("locale-bucket").expect("Binary exists");
    cmd.env_remove("LOCALE_BUCKET_BUCKET")
        .env_remove("LOCALE_BUCKET_CREDENTIALS");
    cmd
}

#[test]
fn publish_aborts_on_empty_prompt_input() {
    let dir = tempdir().unwrap();
    let config = create_config(dir.path());

    command()
        .arg("publish")
        .arg("--config")
        .arg(config.path())
        .write_stdin("\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Path to the translations spreadsheet"))
        .stderr(predicate::str::contains("No spreadsheet path given"));
}

#[test]
fn publish_reports_missing_spreadsheet() {
    let dir = tempdir().unwrap();
    let config = create_config(dir.path());

    command()
        .arg("publish")
        .arg("--config")
        .arg(config.path())
        .arg("--file")
        .arg(dir.path().join("missing.xlsx"))
        .arg("--work-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn publish_requires_config_flag() {
    command()
        .arg("publish")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--config"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        use std::fmt::Write as FmtWrite;
        let mut msg = String::new();
        let _ = write!(&mut msg, "{:?}", event);
        self.events.lock().unwrap().push(msg);
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use locale_bucket::cli::{run, Cli, Commands};

    // A missing config file makes the run fail right after start-up.
    let cli = Cli {
        command: Commands::Publish {
            config: std::path::PathBuf::from("dummy.yaml"),
            file: None,
            work_dir: None,
        },
    };

    let result = run(cli).await;
    assert!(result.is_err());

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
