use serde::Serialize;

use crate::commands::{engine_error, run_with_engine, CommandError, CommandResult};
use fengshui_core::engine::SeedOutcome;
use fengshui_db::fixtures::{load_demo_catalog, ImportReport};

#[derive(Debug, Serialize)]
struct SeedOutput {
    rules: SeedOutcome,
    catalog: Option<ImportReport>,
}

pub fn run(demo_catalog: bool) -> CommandResult {
    run_with_engine("seed", |engine| async move {
        let rules = engine.seed_default_rules().await.map_err(engine_error)?;

        let catalog = if demo_catalog {
            let report = load_demo_catalog(engine.catalog())
                .await
                .map_err(|error| ("catalog_import", error.to_string(), 13u8))?;
            Some(report)
        } else {
            None
        };

        Ok::<_, CommandError>((seed_message(&rules, catalog.as_ref()), SeedOutput { rules, catalog }))
    })
}

fn seed_message(rules: &SeedOutcome, catalog: Option<&ImportReport>) -> String {
    let mut message = if rules.skipped {
        "rule store already populated; default rules left untouched".to_string()
    } else {
        format!("seeded {} default element rules", rules.count)
    };
    if let Some(report) = catalog {
        message.push_str(&format!("; imported {} demo catalog items", report.imported));
    }
    message
}
