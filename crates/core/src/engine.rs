//! The engine service: classification, analysis, rule administration,
//! compatibility and ranking over the two store ports.

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::analysis::{build_analysis, AnalysisRequest, AnalysisResult, RuleResolution};
use crate::classifier::classify_birth_year;
use crate::compatibility::{relation_from, CompatibilityResult};
use crate::config::EngineConfig;
use crate::domain::element::{BirthYear, Element};
use crate::domain::item::CandidateQuery;
use crate::domain::rule::{RuleDraft, RuleLifecycle, RulePatch, RuleRecord};
use crate::errors::{EngineError, StoreError};
use crate::ranking::{rank_items, RankedItem, RankingContext};
use crate::reference::ReferenceData;
use crate::store::{CatalogStore, RecordScope, RuleStore};
use crate::validation::{validate_rule_draft, FieldViolation, ValidationErrors};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineSettings {
    pub default_rank_limit: usize,
    pub max_rank_limit: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { default_rank_limit: 20, max_rank_limit: 50 }
    }
}

impl From<&EngineConfig> for EngineSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            default_rank_limit: config.default_rank_limit,
            max_rank_limit: config.max_rank_limit,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RankFilters {
    pub category: Option<String>,
    pub limit: Option<usize>,
    /// `None` means prioritized.
    pub prioritize_beneficial: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    pub element: Element,
    pub compatible_colors: Vec<String>,
    pub beneficial_colors: Vec<String>,
    pub avoid_colors: Vec<String>,
    pub items: Vec<RankedItem>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SeedOutcome {
    pub count: usize,
    pub skipped: bool,
}

pub struct FengShuiEngine<R, C> {
    rules: R,
    catalog: C,
    reference: ReferenceData,
    settings: EngineSettings,
    element_locks: [Mutex<()>; 5],
}

impl<R, C> FengShuiEngine<R, C>
where
    R: RuleStore,
    C: CatalogStore,
{
    pub fn new(rules: R, catalog: C, reference: ReferenceData, settings: EngineSettings) -> Self {
        Self {
            rules,
            catalog,
            reference,
            settings,
            element_locks: std::array::from_fn(|_| Mutex::new(())),
        }
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    pub fn classify(&self, birth_year: BirthYear) -> Element {
        classify_birth_year(birth_year)
    }

    /// Resolve by the birth-year table first, then by formula. Whichever
    /// path succeeds decides the element; the two are never reconciled.
    pub async fn analyze(
        &self,
        birth_year: BirthYear,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, EngineError> {
        let (rule, resolution) =
            match self.rules.find_active_by_birth_year(birth_year.value()).await? {
                Some(rule) => (rule, RuleResolution::BirthYearTable),
                None => {
                    let element = self.classify(birth_year);
                    info!(
                        event_name = "engine.analyze.fallback",
                        birth_year = birth_year.value(),
                        element = %element,
                        "birth year not listed in any rule, using classifier"
                    );
                    (self.get_rule(element).await?, RuleResolution::Formula)
                }
            };

        Ok(build_analysis(&rule, birth_year, resolution, request))
    }

    pub async fn get_rule(&self, element: Element) -> Result<RuleRecord, EngineError> {
        self.rules
            .find_active_by_element(element)
            .await?
            .ok_or_else(|| EngineError::rule_not_found(element))
    }

    pub async fn get_rule_by_birth_year(&self, birth_year: i32) -> Result<RuleRecord, EngineError> {
        let birth_year = BirthYear::new(birth_year)?;
        self.rules.find_active_by_birth_year(birth_year.value()).await?.ok_or_else(|| {
            EngineError::NotFound { entity: "rule", key: format!("birth year {birth_year}") }
        })
    }

    pub async fn list_rules(&self) -> Result<Vec<RuleRecord>, EngineError> {
        let mut rules = self.rules.list(RecordScope::ActiveOnly).await?;
        rules.sort_by(|left, right| left.element.as_str().cmp(right.element.as_str()));
        Ok(rules)
    }

    pub async fn create_rule(&self, draft: RuleDraft) -> Result<RuleRecord, EngineError> {
        validate_rule_draft(&draft)?;

        let element = draft.element;
        let _guard = self.lock_element(element).await;

        if self.rules.find_active_by_element(element).await?.is_some() {
            return Err(EngineError::DuplicateRule(element));
        }

        let record = RuleRecord::from_draft(draft, Utc::now());
        self.rules.insert(record.clone()).await.map_err(|error| match error {
            StoreError::UniqueViolation(_) => EngineError::DuplicateRule(element),
            other => EngineError::Store(other),
        })?;

        info!(
            event_name = "engine.rule.created",
            element = %element,
            rule_id = %record.id.0,
            "rule created"
        );
        Ok(record)
    }

    pub async fn update_rule(
        &self,
        element: Element,
        patch: RulePatch,
    ) -> Result<RuleRecord, EngineError> {
        if patch.is_empty() {
            return Err(ValidationErrors::single(FieldViolation::new(
                "patch",
                "at least one field must be provided",
            ))
            .into());
        }

        let _guard = self.lock_element(element).await;
        let mut record = self.get_rule(element).await?;

        patch.apply_to(&mut record.profile);
        validate_rule_draft(&record.draft())?;
        record.updated_at = Utc::now();

        if !self.rules.replace_active(record.clone()).await? {
            return Err(EngineError::rule_not_found(element));
        }

        info!(
            event_name = "engine.rule.updated",
            element = %element,
            rule_id = %record.id.0,
            "rule updated"
        );
        Ok(record)
    }

    pub async fn delete_rule(&self, element: Element) -> Result<RuleRecord, EngineError> {
        let _guard = self.lock_element(element).await;
        let mut record = self.get_rule(element).await?;

        let now = Utc::now();
        record.lifecycle = RuleLifecycle::Deleted { deleted_at: now };
        record.updated_at = now;

        if !self.rules.replace_active(record.clone()).await? {
            return Err(EngineError::rule_not_found(element));
        }

        info!(
            event_name = "engine.rule.deleted",
            element = %element,
            rule_id = %record.id.0,
            "rule soft-deleted"
        );
        Ok(record)
    }

    /// Directional: read from `first`'s rule only. `second` needs no rule.
    pub async fn compatibility(
        &self,
        first: Element,
        second: Element,
    ) -> Result<CompatibilityResult, EngineError> {
        let rule = self.get_rule(first).await?;
        Ok(relation_from(&rule, second))
    }

    pub async fn compatibility_matrix(&self) -> Result<Vec<CompatibilityResult>, EngineError> {
        let rules = self.list_rules().await?;
        Ok(rules
            .iter()
            .flat_map(|rule| Element::ALL.into_iter().map(move |other| relation_from(rule, other)))
            .collect())
    }

    pub async fn rank(
        &self,
        birth_year: BirthYear,
        filters: RankFilters,
    ) -> Result<RankedResult, EngineError> {
        let limit = self.resolve_limit(filters.limit)?;
        let element = self.classify(birth_year);

        let rule = match self.get_rule(element).await {
            Ok(rule) => rule,
            Err(EngineError::NotFound { .. }) => {
                return Err(EngineError::DataIntegrity(format!(
                    "birth year {birth_year} classifies as {element}, which has no active rule"
                )))
            }
            Err(other) => return Err(other),
        };

        let query = CandidateQuery { category: filters.category };
        let candidates = self.catalog.rank_candidates(&query).await?;
        let candidate_count = candidates.len();

        let palette = &rule.profile.colors;
        let context = RankingContext {
            element,
            palette,
            prioritize_beneficial: filters.prioritize_beneficial.unwrap_or(true),
        };
        let items = rank_items(candidates, &context, limit);

        info!(
            event_name = "engine.rank.completed",
            birth_year = birth_year.value(),
            element = %element,
            candidates = candidate_count,
            returned = items.len(),
            "ranking completed"
        );

        Ok(RankedResult {
            element,
            compatible_colors: palette.compatible.clone(),
            beneficial_colors: palette.beneficial.clone(),
            avoid_colors: palette.avoid.clone(),
            items,
        })
    }

    /// Insert the reference records unless any record, deleted or not, exists.
    pub async fn seed_default_rules(&self) -> Result<SeedOutcome, EngineError> {
        let existing = self.rules.count_all().await?;
        if existing > 0 {
            info!(
                event_name = "engine.seed.skipped",
                existing_records = existing,
                "rule store already populated"
            );
            return Ok(SeedOutcome { count: 0, skipped: true });
        }

        let mut count = 0;
        for draft in self.reference.drafts() {
            match self.create_rule(draft.clone()).await {
                Ok(_) => count += 1,
                Err(EngineError::DuplicateRule(element)) => {
                    warn!(
                        event_name = "engine.seed.conflict",
                        element = %element,
                        "rule appeared concurrently during seeding"
                    );
                }
                Err(other) => return Err(other),
            }
        }

        info!(event_name = "engine.seed.completed", count, "default rules seeded");
        Ok(SeedOutcome { count, skipped: false })
    }

    fn resolve_limit(&self, requested: Option<usize>) -> Result<usize, EngineError> {
        let limit = requested.unwrap_or(self.settings.default_rank_limit);
        if limit == 0 || limit > self.settings.max_rank_limit {
            return Err(ValidationErrors::single(FieldViolation::new(
                "limit",
                format!("limit must be within 1..={}", self.settings.max_rank_limit),
            ))
            .into());
        }
        Ok(limit)
    }

    async fn lock_element(&self, element: Element) -> tokio::sync::MutexGuard<'_, ()> {
        debug!(element = %element, "acquiring element lock");
        self.element_locks[element.index()].lock().await
    }
}
