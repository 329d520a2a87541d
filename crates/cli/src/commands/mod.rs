pub mod analyze;
pub mod catalog;
pub mod classify;
pub mod compatibility;
pub mod config;
pub mod migrate;
pub mod rank;
pub mod rule;
pub mod seed;

use std::future::Future;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use fengshui_core::config::{AppConfig, LoadOptions};
use fengshui_core::engine::{EngineSettings, FengShuiEngine};
use fengshui_core::errors::{EngineError, StoreError};
use fengshui_core::reference::ReferenceData;
use fengshui_core::validation::ValidationErrors;
use fengshui_db::{connect_with_settings, migrations, SqlCatalogRepository, SqlRuleRepository};

pub type SqlEngine = FengShuiEngine<SqlRuleRepository, SqlCatalogRepository>;

/// `(error_class, message, exit_code)`
pub type CommandError = (&'static str, String, u8);

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    data: Option<Value>,
}

impl CommandResult {
    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: impl Serialize,
    ) -> Self {
        let data = match serde_json::to_value(data) {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(error) => {
                return Self::failure(command, "serialization", error.to_string(), 1);
            }
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    fn from_error(command: &str, (error_class, message, exit_code): CommandError) -> Self {
        Self::failure(command, error_class, message, exit_code)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\",\"data\":null}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub fn engine_error(error: EngineError) -> CommandError {
    let exit_code = match &error {
        EngineError::Validation(_) | EngineError::Store(StoreError::Invalid(_)) => 8,
        EngineError::NotFound { .. } => 9,
        EngineError::DuplicateRule(_) => 10,
        EngineError::DataIntegrity(_) => 11,
        EngineError::Store(_) => 12,
    };
    (error.class(), error.to_string(), exit_code)
}

pub fn validation_error(errors: ValidationErrors) -> CommandError {
    engine_error(EngineError::Validation(errors))
}

pub fn input_error(message: impl Into<String>) -> CommandError {
    ("input", message.into(), 7)
}

pub fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(command, "config_validation", format!("configuration issue: {error}"), 2)
    })
}

pub fn build_runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

/// Load config, connect, migrate, build the engine and hand it to `action`.
/// The pool is closed once `action` finishes.
pub fn run_with_engine<T, F, Fut>(command: &str, action: F) -> CommandResult
where
    T: Serialize,
    F: FnOnce(SqlEngine) -> Fut,
    Fut: Future<Output = Result<(String, T), CommandError>>,
{
    let config = match load_config(command) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime(command) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let reference = ReferenceData::load(config.engine.reference_data_path.as_deref())
            .map_err(|error| ("reference_data", error.to_string(), 6u8))?;

        let engine = FengShuiEngine::new(
            SqlRuleRepository::new(pool.clone()),
            SqlCatalogRepository::new(pool.clone()),
            reference,
            EngineSettings::from(&config.engine),
        );

        let outcome = action(engine).await;
        pool.close().await;
        outcome
    });

    match result {
        Ok((message, data)) => {
            info!(event_name = "cli.command.completed", command, "command completed");
            CommandResult::success_with_data(command, message, data)
        }
        Err(error) => {
            warn!(
                event_name = "cli.command.failed",
                command,
                error_class = error.0,
                exit_code = error.2,
                "command failed"
            );
            CommandResult::from_error(command, error)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::{engine_error, CommandResult};
    use fengshui_core::domain::element::Element;
    use fengshui_core::errors::{EngineError, StoreError};
    use fengshui_core::validation::{FieldViolation, ValidationErrors};

    #[test]
    fn success_payload_carries_data() {
        let result = CommandResult::success_with_data("classify", "ok", vec![1, 2]);
        let payload: Value = serde_json::from_str(&result.output).expect("json");

        assert_eq!(result.exit_code, 0);
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"], serde_json::json!([1, 2]));
        assert!(payload["error_class"].is_null());
    }

    #[test]
    fn engine_errors_map_to_distinct_classes_and_codes() {
        let (class, message, code) = engine_error(EngineError::DuplicateRule(Element::Wood));
        assert_eq!(class, "duplicate_rule");
        assert!(message.contains("Wood"));
        assert_eq!(code, 10);

        let (class, _, code) = engine_error(EngineError::DataIntegrity("gap".to_string()));
        assert_eq!(class, "data_integrity");
        assert_eq!(code, 11);

        let rejected = ValidationErrors::single(FieldViolation::new("price", "must be > 0"));
        let (class, _, code) = engine_error(EngineError::Store(StoreError::Invalid(rejected)));
        assert_eq!(class, "validation");
        assert_eq!(code, 8);
    }
}
