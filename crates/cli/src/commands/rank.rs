use crate::commands::{
    engine_error, run_with_engine, validation_error, CommandError, CommandResult,
};
use fengshui_core::domain::element::BirthYear;
use fengshui_core::engine::RankFilters;

#[derive(Debug, Clone, Default)]
pub struct RankArgs {
    pub year: i32,
    pub category: Option<String>,
    pub limit: Option<usize>,
    pub plain_beneficial: bool,
}

impl RankArgs {
    fn filters(&self) -> RankFilters {
        RankFilters {
            category: self.category.clone().filter(|category| !category.trim().is_empty()),
            limit: self.limit,
            prioritize_beneficial: Some(!self.plain_beneficial),
        }
    }
}

pub fn run(args: RankArgs) -> CommandResult {
    let birth_year = match BirthYear::new(args.year) {
        Ok(birth_year) => birth_year,
        Err(errors) => {
            let (class, message, code) = validation_error(errors);
            return CommandResult::failure("rank", class, message, code);
        }
    };
    let filters = args.filters();

    run_with_engine("rank", move |engine| async move {
        let ranked = engine.rank(birth_year, filters).await.map_err(engine_error)?;
        let message =
            format!("{} items ranked for the {} element", ranked.items.len(), ranked.element);
        Ok::<_, CommandError>((message, ranked))
    })
}
