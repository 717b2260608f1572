use std::env;
use std::sync::{Mutex, OnceLock};

use estately_cli::commands::{doctor, migrate, seed};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("ESTATELY_DATABASE_URL", "sqlite::memory:?cache=shared")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn seed_loads_the_deterministic_listing_fixtures() {
    with_env(&[("ESTATELY_DATABASE_URL", "sqlite::memory:?cache=shared")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected successful seed run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");
        assert_eq!(
            payload["message"],
            "loaded 14 deterministic property listings"
        );
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    with_env(&[("ESTATELY_DATABASE_URL", "sqlite::memory:?cache=shared")], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");

        assert_eq!(parse_payload(&first.output)["message"], parse_payload(&second.output)["message"]);
    });
}

#[test]
fn doctor_passes_with_local_stores_and_credentials() {
    with_env(
        &[
            ("ESTATELY_DATABASE_URL", "sqlite::memory:?cache=shared"),
            ("ESTATELY_REDIS_ENABLED", "false"),
            ("ESTATELY_LLM_API_KEY", "hf-test"),
        ],
        || {
            let result = doctor::run(true);
            assert_eq!(result.exit_code, 0, "expected all doctor checks to pass");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["overall_status"], "pass");

            let checks = payload["checks"].as_array().expect("checks array");
            let session = checks
                .iter()
                .find(|check| check["name"] == "session_backend")
                .expect("session backend check");
            assert_eq!(session["status"], "pass");
            let web_search = checks
                .iter()
                .find(|check| check["name"] == "web_search_credentials")
                .expect("web search check");
            assert_eq!(web_search["status"], "skipped");
        },
    );
}

#[test]
fn doctor_fails_without_llm_credentials() {
    with_env(
        &[
            ("ESTATELY_DATABASE_URL", "sqlite::memory:?cache=shared"),
            ("ESTATELY_REDIS_ENABLED", "false"),
        ],
        || {
            let result = doctor::run(true);
            assert_eq!(result.exit_code, 6, "expected doctor failure code");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["overall_status"], "fail");

            let checks = payload["checks"].as_array().expect("checks array");
            let llm = checks
                .iter()
                .find(|check| check["name"] == "llm_credentials")
                .expect("llm credentials check");
            assert_eq!(llm["status"], "fail");
        },
    );
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "ESTATELY_DATABASE_URL",
        "ESTATELY_DATABASE_MAX_CONNECTIONS",
        "ESTATELY_DATABASE_TIMEOUT_SECS",
        "ESTATELY_REDIS_URL",
        "ESTATELY_REDIS_ENABLED",
        "ESTATELY_LLM_API_KEY",
        "ESTATELY_LLM_BASE_URL",
        "ESTATELY_LLM_MODEL",
        "ESTATELY_LLM_MAX_TOKENS",
        "ESTATELY_LLM_TEMPERATURE",
        "ESTATELY_LLM_TIMEOUT_SECS",
        "ESTATELY_WEB_SEARCH_API_KEY",
        "ESTATELY_WEB_SEARCH_BASE_URL",
        "ESTATELY_WEB_SEARCH_MAX_RESULTS",
        "ESTATELY_WEB_SEARCH_TIMEOUT_SECS",
        "ESTATELY_SERVER_BIND_ADDRESS",
        "ESTATELY_SERVER_PORT",
        "ESTATELY_SERVER_SESSION_CAPACITY",
        "ESTATELY_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "ESTATELY_LOGGING_LEVEL",
        "ESTATELY_LOGGING_FORMAT",
        "ESTATELY_LOG_LEVEL",
        "ESTATELY_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
