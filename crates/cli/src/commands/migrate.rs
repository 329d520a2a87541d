use serde::Serialize;

use crate::commands::{build_runtime, load_config, CommandResult};
use fengshui_db::{connect_with_settings, migrations};

#[derive(Debug, Serialize)]
struct MigrationSummary {
    version: i64,
    description: String,
}

pub fn run() -> CommandResult {
    let config = match load_config("migrate") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("migrate") {
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
        let applied = migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        pool.close().await;
        Ok::<Vec<i64>, (&'static str, String, u8)>(applied)
    });

    match result {
        Ok(versions) => {
            let applied = summarize(&versions);
            CommandResult::success_with_data("migrate", migrate_message(applied.len()), applied)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}

fn summarize(versions: &[i64]) -> Vec<MigrationSummary> {
    migrations::MIGRATOR
        .iter()
        .filter(|migration| {
            migration.migration_type.is_up_migration() && versions.contains(&migration.version)
        })
        .map(|migration| MigrationSummary {
            version: migration.version,
            description: migration.description.to_string(),
        })
        .collect()
}

fn migrate_message(applied: usize) -> String {
    match applied {
        0 => "schema already up to date".to_string(),
        1 => "applied 1 pending migration".to_string(),
        count => format!("applied {count} pending migrations"),
    }
}

#[cfg(test)]
mod tests {
    use super::{migrate_message, summarize};

    #[test]
    fn summary_lists_only_requested_versions() {
        let summary = summarize(&[2]);

        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].version, 2);
        assert!(summarize(&[]).is_empty());
    }

    #[test]
    fn message_distinguishes_noop_runs() {
        assert_eq!(migrate_message(0), "schema already up to date");
        assert_eq!(migrate_message(2), "applied 2 pending migrations");
    }
}
