use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::{contains, is_empty};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

const SECOND_CANNED: &str = "Hi, I'm a useful assistant. How can I help you today?";

fn chatloop_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("chatloop"));
    cmd.current_dir(std::env::temp_dir())
        .env_remove("CHATLOOP_PROVIDER")
        .env_remove("CHATLOOP_CONFIG")
        .env_remove("OPENAI_API_KEY")
        .env_remove("OPENROUTER_API_KEY")
        .env_remove("OLLAMA_HOST")
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", unique_temp_path("xdg"));
    cmd
}

fn unique_temp_path(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("chatloop-test-{label}-{nanos}"))
}

fn write_config(label: &str, contents: &str) -> PathBuf {
    let path = unique_temp_path(label);
    fs::write(&path, contents).expect("config should be writable");
    path
}

#[test]
fn fake_provider_answers_in_canned_order() {
    chatloop_cmd()
        .args(["--provider", "fake"])
        .write_stdin("what is rust?\nsomething else entirely\nexit\n")
        .assert()
        .success()
        .stdout(format!("You: Hello\nYou: {SECOND_CANNED}\nYou: "));
}

#[test]
fn provider_flag_is_case_insensitive() {
    chatloop_cmd()
        .args(["--provider", "FaKe"])
        .write_stdin("hi\nexit\n")
        .assert()
        .success()
        .stdout("You: Hello\nYou: ");
}

#[test]
fn exit_on_first_turn_prints_only_the_prompt() {
    chatloop_cmd()
        .args(["--provider", "fake"])
        .write_stdin("exit\n")
        .assert()
        .success()
        .stdout("You: ");
}

#[test]
fn closed_stdin_ends_the_session_normally() {
    chatloop_cmd()
        .args(["--provider", "fake"])
        .write_stdin("hello")
        .assert()
        .success()
        .stdout("You: Hello\nYou: ");
}

#[test]
fn unknown_provider_is_fatal() {
    chatloop_cmd()
        .args(["--provider", "unknown"])
        .write_stdin("hello\n")
        .assert()
        .failure()
        .stdout(is_empty())
        .stderr(contains("Provider 'unknown' not found."));
}

#[test]
fn missing_gateway_key_fails_on_first_turn_not_at_startup() {
    chatloop_cmd()
        .write_stdin("hello\n")
        .assert()
        .failure()
        .stdout("You: ")
        .stderr(contains("OPENROUTER_API_KEY is not set"));
}

#[test]
fn missing_key_is_irrelevant_when_exiting_immediately() {
    chatloop_cmd()
        .args(["--provider", "openai"])
        .write_stdin("exit\n")
        .assert()
        .success()
        .stdout("You: ");
}

#[test]
fn provider_env_selects_fake() {
    chatloop_cmd()
        .env("CHATLOOP_PROVIDER", "fake")
        .write_stdin("hey\nexit\n")
        .assert()
        .success()
        .stdout("You: Hello\nYou: ");
}

#[test]
fn invalid_provider_env_returns_error() {
    chatloop_cmd()
        .env("CHATLOOP_PROVIDER", "bad")
        .write_stdin("exit\n")
        .assert()
        .failure()
        .stderr(contains(
            "Invalid provider 'bad' in CHATLOOP_PROVIDER. Supported values: openai, openrouter, ollama, fake.",
        ));
}

#[test]
fn config_file_sets_provider_and_canned_responses() {
    let config_path = write_config(
        "responses",
        "provider = \"fake\"\n\n[providers.fake]\nresponses = [\"uno\", \"due\"]\non_exhausted = \"repeat-last\"\n",
    );

    chatloop_cmd()
        .env("CHATLOOP_CONFIG", &config_path)
        .write_stdin("a\nb\nc\nexit\n")
        .assert()
        .success()
        .stdout("You: uno\nYou: due\nYou: due\nYou: ");
}

#[test]
fn provider_env_overrides_config_provider() {
    let config_path = write_config("env-over-file", "provider = \"openrouter\"\n");

    chatloop_cmd()
        .env("CHATLOOP_CONFIG", &config_path)
        .env("CHATLOOP_PROVIDER", "fake")
        .write_stdin("a\nexit\n")
        .assert()
        .success()
        .stdout("You: Hello\nYou: ");
}

#[test]
fn flag_overrides_config_provider() {
    let config_path = write_config("override", "provider = \"openrouter\"\n");

    chatloop_cmd()
        .env("CHATLOOP_CONFIG", &config_path)
        .args(["--provider", "fake"])
        .write_stdin("a\nexit\n")
        .assert()
        .success()
        .stdout("You: Hello\nYou: ");
}

#[test]
fn default_policy_cycles_canned_responses() {
    chatloop_cmd()
        .args(["--provider", "fake"])
        .write_stdin("1\n2\n3\nexit\n")
        .assert()
        .success()
        .stdout(format!("You: Hello\nYou: {SECOND_CANNED}\nYou: Hello\nYou: "));
}

#[test]
fn fail_policy_stops_the_session() {
    let config_path = write_config(
        "fail",
        "[providers.fake]\nresponses = [\"only\"]\non_exhausted = \"fail\"\n",
    );

    chatloop_cmd()
        .env("CHATLOOP_CONFIG", &config_path)
        .args(["--provider", "fake"])
        .write_stdin("a\nb\nexit\n")
        .assert()
        .failure()
        .stdout("You: only\nYou: ")
        .stderr(contains("fake provider exhausted its 1 canned responses"));
}

#[test]
fn explicit_missing_config_is_an_error() {
    let missing = unique_temp_path("missing");

    chatloop_cmd()
        .env("CHATLOOP_CONFIG", &missing)
        .args(["--provider", "fake"])
        .write_stdin("exit\n")
        .assert()
        .failure()
        .stderr(contains("Failed to read config file"));
}

#[test]
fn malformed_config_is_reported() {
    let config_path = write_config("malformed", "provider = \n");

    chatloop_cmd()
        .env("CHATLOOP_CONFIG", &config_path)
        .args(["config", "check"])
        .assert()
        .failure()
        .stderr(contains("Failed to parse config file"));
}

#[test]
fn config_check_reports_valid_file() {
    let config_path = write_config(
        "check",
        "provider = \"ollama\"\ntimeout = 30\n\n[persona]\nname = \"Ada\"\n",
    );

    chatloop_cmd()
        .env("CHATLOOP_CONFIG", &config_path)
        .args(["config", "check"])
        .assert()
        .success()
        .stdout(contains("config OK:"));
}

#[test]
fn config_path_reports_missing_default_file() {
    chatloop_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(contains("chatloop").and(contains("(not found)")));
}

#[test]
fn verbose_logs_go_to_stderr_only() {
    chatloop_cmd()
        .args(["--provider", "fake", "--verbose"])
        .write_stdin("hi\nexit\n")
        .assert()
        .success()
        .stdout("You: Hello\nYou: ")
        .stderr(contains("provider selected"));
}

#[test]
fn quiet_suppresses_verbose_logs_on_stderr() {
    chatloop_cmd()
        .args(["--provider", "fake", "--verbose", "--quiet"])
        .write_stdin("hi\nexit\n")
        .assert()
        .success()
        .stderr(is_empty());
}

#[test]
fn quiet_keeps_fatal_errors_visible() {
    chatloop_cmd()
        .args(["--quiet", "--provider", "nope"])
        .write_stdin("exit\n")
        .assert()
        .failure()
        .stderr(contains("Provider 'nope' not found."));
}

#[test]
fn version_prints_build_metadata() {
    chatloop_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains("commit:").and(contains("built:")));
}

#[test]
fn help_mentions_completion_command() {
    chatloop_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("completion").and(contains("Generate shell completion script")));
}

#[test]
fn completion_bash_outputs_script() {
    chatloop_cmd()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(contains("_chatloop").and(contains("complete")));
}

#[test]
fn completion_fish_outputs_script() {
    chatloop_cmd()
        .args(["completion", "fish"])
        .assert()
        .success()
        .stdout(contains("complete -c chatloop"));
}
