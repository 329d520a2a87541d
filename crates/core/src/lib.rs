pub mod analysis;
pub mod classifier;
pub mod compatibility;
pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod ranking;
pub mod reference;
pub mod store;
pub mod validation;

pub use analysis::{AnalysisRequest, AnalysisResult, FocusArea, Gender, RuleResolution};
pub use classifier::{classify, classify_birth_year};
pub use compatibility::{CompatibilityResult, RelationKind};
pub use domain::element::{BirthYear, Element};
pub use domain::item::{CandidateQuery, Item, ItemId};
pub use domain::rule::{ElementProfile, RuleDraft, RuleId, RuleLifecycle, RulePatch, RuleRecord};
pub use engine::{EngineSettings, FengShuiEngine, RankFilters, RankedResult, SeedOutcome};
pub use errors::{EngineError, StoreError};
pub use ranking::{RankedItem, ScoreBreakdown};
pub use reference::{ReferenceData, ReferenceDataError};
pub use store::{CatalogStore, RecordScope, RuleStore};
pub use validation::{FieldViolation, ValidationErrors};
