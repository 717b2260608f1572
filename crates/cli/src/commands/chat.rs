use std::io::{self, BufRead, Write};
use std::sync::Arc;

use estately_agents::llm::HttpCompletionClient;
use estately_agents::research::TavilySearcher;
use estately_agents::{
    default_registry, Chatbot, Classifier, CompletionClient, Dispatcher, WebSearcher,
    TURN_FAILURE_REPLY,
};
use estately_core::config::{AppConfig, LoadOptions};
use estately_db::repositories::{
    PreferenceRepository, PropertyRepository, SqlPreferenceRepository, SqlPropertyRepository,
};
use estately_db::{connect_with_settings, migrations, DbPool};
use estately_memory::{connect_session_store, Memory};

use crate::commands::CommandResult;

pub fn run(user: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let (chatbot, pool) = match runtime.block_on(build_session(&config, user)) {
        Ok(session) => session,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("chat", error_class, message, exit_code);
        }
    };

    println!(
        "Estately assistant ready (user `{user}`, session backend `{}`).",
        chatbot.memory().session_backend()
    );
    println!("Type a question, or `history`, `prefs`, `clear`, `quit`.");

    let stdin = io::stdin();
    let mut turns = 0usize;
    loop {
        print!("you> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        match parse_repl_line(&line) {
            ReplCommand::Quit => break,
            ReplCommand::Empty => continue,
            ReplCommand::History => {
                let recent = runtime.block_on(chatbot.memory().recent_turns(None));
                if recent.is_empty() {
                    println!("(no turns yet)");
                }
                for turn in recent {
                    println!("[{}] {}", turn.role.as_str(), turn.content);
                }
            }
            ReplCommand::Prefs => match runtime.block_on(chatbot.memory().preferences()) {
                Ok(preferences) if preferences.is_empty() => println!("(no saved preferences)"),
                Ok(preferences) => {
                    for (key, value) in preferences {
                        println!("{key} = {value}");
                    }
                }
                Err(error) => println!("could not read preferences: {error}"),
            },
            ReplCommand::Clear => match runtime.block_on(chatbot.memory().clear_session()) {
                Ok(dropped) => println!("session cache cleared ({dropped} keys)"),
                Err(error) => println!("could not clear session cache: {error}"),
            },
            ReplCommand::Message(text) => {
                turns += 1;
                match runtime.block_on(chatbot.handle_turn(text)) {
                    Ok(response) => println!("{response}"),
                    Err(_) => println!("{TURN_FAILURE_REPLY}"),
                }
            }
        }
    }

    runtime.block_on(pool.close());
    CommandResult::success("chat", format!("chat session for `{user}` ended after {turns} turns"))
}

async fn build_session(
    config: &AppConfig,
    user: &str,
) -> Result<(Chatbot, DbPool), (&'static str, String, u8)> {
    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5u8))?;

    let sessions = connect_session_store(&config.redis).await;
    let completions: Arc<dyn CompletionClient> = Arc::new(
        HttpCompletionClient::new(&config.llm)
            .map_err(|error| ("llm_credentials", error.to_string(), 7u8))?,
    );
    let searcher: Arc<dyn WebSearcher> = Arc::new(
        TavilySearcher::new(&config.web_search)
            .map_err(|error| ("web_search_setup", error.to_string(), 7u8))?,
    );
    let properties: Arc<dyn PropertyRepository> =
        Arc::new(SqlPropertyRepository::new(pool.clone()));
    let preferences: Arc<dyn PreferenceRepository> =
        Arc::new(SqlPreferenceRepository::new(pool.clone()));

    let registry = default_registry(properties, completions.clone(), searcher, &config.llm)
        .map_err(|error| ("report_template", error.to_string(), 7u8))?;

    let chatbot = Chatbot::new(
        Arc::new(Classifier::new(completions, &config.llm)),
        Arc::new(Dispatcher::new(registry)),
        Memory::new(user, sessions, preferences),
    );
    Ok((chatbot, pool))
}

#[derive(Debug, PartialEq, Eq)]
enum ReplCommand<'a> {
    Quit,
    History,
    Prefs,
    Clear,
    Empty,
    Message(&'a str),
}

fn parse_repl_line(line: &str) -> ReplCommand<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ReplCommand::Empty;
    }
    if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
        return ReplCommand::Quit;
    }
    if trimmed.eq_ignore_ascii_case("history") {
        return ReplCommand::History;
    }
    if trimmed.eq_ignore_ascii_case("prefs") {
        return ReplCommand::Prefs;
    }
    if trimmed.eq_ignore_ascii_case("clear") {
        return ReplCommand::Clear;
    }
    ReplCommand::Message(trimmed)
}
