//! Batch orchestration.
//!
//! A batch runs in three phases:
//!
//! 1. build the model and resolve names for every schema, in parallel;
//! 2. check generated names for uniqueness across the whole batch, sequentially;
//! 3. emit every schema that survived, in parallel.
//!
//! A schema that fails in any phase is recorded in the [`BatchReport`] and the
//! rest of the batch carries on. Results are written into per-index slots, so
//! the report is in batch order no matter how work was scheduled.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::{debug, info, trace, warn};

use crate::config::CompilerConfig;
use crate::emit::{Emitter, GeneratedUnit};
use crate::error::{CompileError, ConfigError, ErrorKind, SchemaError, TableGenResult};
use crate::language::LanguageProfile;
use crate::naming::{NameScope, ResolvedNames, resolve_names};
use crate::schema::{
    EnumSchema, TableSchema, TypeRegistry, build_enum, build_shared_struct, build_table,
    shared_struct_cycles,
};
use crate::sink::UnitSink;
use crate::source::{EnumSource, SchemaSource, TableSource, load_schema_dir};

/// Batch-level cancellation flag. Clones share the flag.
///
/// Workers check it before taking a new schema; schemas already in flight
/// always finish. A token belongs to one batch run: once cancelled it stays
/// cancelled, so start each batch with a fresh one.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
enum BatchEntry {
    Enum(EnumSource),
    Struct(TableSource),
    Table(TableSource),
}

impl BatchEntry {
    fn name(&self) -> &str {
        match self {
            BatchEntry::Enum(source) => &source.name,
            BatchEntry::Struct(source) | BatchEntry::Table(source) => &source.name,
        }
    }
}

/// An ordered list of schemas to compile together.
///
/// Each added source contributes its enums, then its shared structs, then its
/// tables.
#[derive(Debug, Clone, Default)]
pub struct SchemaBatch {
    entries: Vec<BatchEntry>,
}

impl SchemaBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sources(sources: impl IntoIterator<Item = SchemaSource>) -> Self {
        let mut batch = Self::new();
        for source in sources {
            batch.push_source(source);
        }
        batch
    }

    /// Load every `*.toml` source in `dir`, in file name order.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> TableGenResult<Self> {
        let sources = load_schema_dir(dir)?;
        Ok(Self::from_sources(sources.into_iter().map(|(_, source)| source)))
    }

    pub fn push_source(&mut self, source: SchemaSource) {
        self.entries
            .extend(source.enums.into_iter().map(BatchEntry::Enum));
        self.entries
            .extend(source.structs.into_iter().map(BatchEntry::Struct));
        self.entries
            .extend(source.tables.into_iter().map(BatchEntry::Table));
    }

    pub fn push_table(&mut self, table: TableSource) {
        self.entries.push(BatchEntry::Table(table));
    }

    pub fn push_struct(&mut self, shared: TableSource) {
        self.entries.push(BatchEntry::Struct(shared));
    }

    pub fn push_enum(&mut self, source: EnumSource) {
        self.entries.push(BatchEntry::Enum(source));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Schema identifiers in batch order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(BatchEntry::name).collect()
    }

    fn shared_structs(&self) -> impl Iterator<Item = &TableSource> {
        self.entries.iter().filter_map(|entry| match entry {
            BatchEntry::Struct(source) => Some(source),
            _ => None,
        })
    }

    fn registry(&self) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        for entry in &self.entries {
            match entry {
                BatchEntry::Enum(source) => registry.add_enum(&source.name),
                BatchEntry::Struct(source) => registry.add_struct(&source.name),
                BatchEntry::Table(_) => {}
            }
        }
        registry
    }
}

/// What happened to one schema of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOutcome {
    Emitted(GeneratedUnit),
    Failed(CompileError),
    /// Not emitted before the batch was cancelled
    Cancelled,
}

/// Per-schema results of a batch, in batch order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    outcomes: Vec<(String, SchemaOutcome)>,
}

impl BatchReport {
    pub fn outcomes(&self) -> &[(String, SchemaOutcome)] {
        &self.outcomes
    }

    pub fn outcome(&self, name: &str) -> Option<&SchemaOutcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| outcome)
    }

    /// Emitted units in batch order.
    pub fn units(&self) -> impl Iterator<Item = &GeneratedUnit> {
        self.outcomes.iter().filter_map(|(_, outcome)| match outcome {
            SchemaOutcome::Emitted(unit) => Some(unit),
            _ => None,
        })
    }

    pub fn errors(&self) -> impl Iterator<Item = &CompileError> {
        self.outcomes.iter().filter_map(|(_, outcome)| match outcome {
            SchemaOutcome::Failed(err) => Some(err),
            _ => None,
        })
    }

    pub fn succeeded(&self) -> usize {
        self.units().count()
    }

    pub fn failed(&self) -> usize {
        self.errors().count()
    }

    pub fn cancelled(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, SchemaOutcome::Cancelled))
            .count()
    }

    /// True when every schema was emitted.
    pub fn is_success(&self) -> bool {
        self.succeeded() == self.outcomes.len()
    }

    /// "N succeeded, M failed", plus the cancelled count when non-zero.
    pub fn summary(&self) -> String {
        let mut summary = format!("{} succeeded, {} failed", self.succeeded(), self.failed());
        let cancelled = self.cancelled();
        if cancelled > 0 {
            summary.push_str(&format!(", {cancelled} cancelled"));
        }
        summary
    }

    /// Hand every emitted unit to `sink`, in batch order. Returns the number
    /// of units delivered.
    pub fn deliver(&self, sink: &mut dyn UnitSink) -> TableGenResult<usize> {
        let mut delivered = 0;
        for unit in self.units() {
            sink.accept(unit)?;
            delivered += 1;
        }
        Ok(delivered)
    }
}

/// A schema after phase one.
#[derive(Debug)]
enum Resolved {
    Table {
        schema: TableSchema,
        names: ResolvedNames,
    },
    Enum(EnumSchema),
}

impl Resolved {
    fn claims(&self) -> Vec<(&str, &str)> {
        match self {
            Resolved::Table { schema, names } => names.claims(schema),
            Resolved::Enum(schema) => vec![(schema.name(), schema.name())],
        }
    }
}

/// Compiles schema batches with one language profile.
#[derive(Debug)]
pub struct Compiler {
    config: CompilerConfig,
    profile: LanguageProfile,
}

/// Points in a batch run at which a schema has finished a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Resolved,
    Emitted,
}

impl Compiler {
    /// Validate the profile and build a compiler. An invalid profile is fatal
    /// for every batch, so it is rejected here.
    pub fn new(config: CompilerConfig, profile: LanguageProfile) -> Result<Self, ConfigError> {
        profile.validate()?;
        Ok(Self { config, profile })
    }

    pub fn profile(&self) -> &LanguageProfile {
        &self.profile
    }

    /// Compile a single table outside of any batch.
    pub fn compile_table(&self, source: &TableSource) -> Result<GeneratedUnit, CompileError> {
        let schema = build_table(source, &TypeRegistry::new())
            .map_err(|e| CompileError::new(&source.name, e.into()))?;
        let names =
            resolve_names(&schema).map_err(|e| CompileError::new(&source.name, e.into()))?;
        Emitter::new(&self.profile).emit_table(&schema, &names)
    }

    /// Run the full pipeline over `batch`.
    pub fn compile_batch(&self, batch: &SchemaBatch) -> BatchReport {
        self.compile_batch_with(batch, &CancellationToken::new())
    }

    /// Run the full pipeline over `batch`, stopping early once `cancel` is
    /// cancelled. Schemas not yet emitted by then are reported as cancelled.
    pub fn compile_batch_with(
        &self,
        batch: &SchemaBatch,
        cancel: &CancellationToken,
    ) -> BatchReport {
        self.run_batch(batch, cancel, &|_, _| {})
    }

    fn run_batch(
        &self,
        batch: &SchemaBatch,
        cancel: &CancellationToken,
        on_stage: &(dyn Fn(Stage, usize) + Sync),
    ) -> BatchReport {
        let started = Instant::now();
        let registry = batch.registry();
        let total = batch.len();

        let cycles = shared_struct_cycles(batch.shared_structs(), &registry);
        if !cycles.is_empty() {
            debug!("Found {} shared structs on reference cycles", cycles.len());
        }

        debug!("Resolving {total} schemas with {} workers", self.config.workers);
        let phase = Instant::now();
        let indexed: Vec<(usize, &BatchEntry)> = batch.entries.iter().enumerate().collect();
        let resolved = run_parallel(self.config.workers, &indexed, cancel, |(idx, entry)| {
            let result = resolve_entry(entry, &registry, &cycles);
            on_stage(Stage::Resolved, *idx);
            result
        });
        debug!("Resolved {total} schemas in {:?}", phase.elapsed());

        let phase = Instant::now();
        let collisions = check_batch_names(batch, &resolved);
        debug!(
            "Checked batch-wide names in {:?}: {} collisions",
            phase.elapsed(),
            collisions.len()
        );

        let mut pending = Vec::new();
        let mut outcomes: Vec<Option<SchemaOutcome>> = Vec::with_capacity(total);
        for (idx, slot) in resolved.iter().enumerate() {
            let outcome = match slot {
                None => Some(SchemaOutcome::Cancelled),
                Some(Err(err)) => Some(SchemaOutcome::Failed(err.clone())),
                Some(Ok(_)) if collisions.contains_key(&idx) => {
                    collisions.get(&idx).cloned().map(SchemaOutcome::Failed)
                }
                Some(Ok(resolved)) => {
                    pending.push((idx, resolved));
                    None
                }
            };
            outcomes.push(outcome);
        }

        let phase = Instant::now();
        let emitter = Emitter::new(&self.profile);
        let emitted = run_parallel(self.config.workers, &pending, cancel, |(idx, resolved)| {
            trace!("Emitting {}", batch.entries[*idx].name());
            let result = match resolved {
                Resolved::Table { schema, names } => emitter.emit_table(schema, names),
                Resolved::Enum(schema) => Ok(emitter.emit_enum(schema)),
            };
            on_stage(Stage::Emitted, *idx);
            result
        });
        debug!("Emitted {} schemas in {:?}", pending.len(), phase.elapsed());

        for ((idx, _), result) in pending.iter().zip(emitted) {
            outcomes[*idx] = Some(match result {
                None => SchemaOutcome::Cancelled,
                Some(Ok(unit)) => SchemaOutcome::Emitted(unit),
                Some(Err(err)) => SchemaOutcome::Failed(err),
            });
        }

        let outcomes: Vec<(String, SchemaOutcome)> = batch
            .entries
            .iter()
            .zip(outcomes)
            .map(|(entry, outcome)| {
                let outcome = outcome.unwrap_or(SchemaOutcome::Cancelled);
                if let SchemaOutcome::Failed(err) = &outcome {
                    warn!("Failed to compile {}: {err}", entry.name());
                }
                (entry.name().to_string(), outcome)
            })
            .collect();

        let report = BatchReport { outcomes };
        info!(
            "Compiled batch of {total} schemas in {:?}: {}",
            started.elapsed(),
            report.summary()
        );
        report
    }
}

fn resolve_entry(
    entry: &BatchEntry,
    registry: &TypeRegistry,
    cycles: &BTreeMap<String, SchemaError>,
) -> Result<Resolved, CompileError> {
    let name = entry.name();
    trace!("Building {name}");

    let schema = match entry {
        BatchEntry::Enum(source) => {
            let schema = build_enum(source).map_err(|e| CompileError::new(name, e.into()))?;
            return Ok(Resolved::Enum(schema));
        }
        BatchEntry::Struct(source) => match cycles.get(name) {
            Some(err) => Err(err.clone()),
            None => build_shared_struct(source, registry),
        },
        BatchEntry::Table(source) => build_table(source, registry),
    }
    .map_err(|e| CompileError::new(name, e.into()))?;

    trace!("Resolving names for {name}");
    let names = resolve_names(&schema).map_err(|e| CompileError::new(name, e.into()))?;
    Ok(Resolved::Table { schema, names })
}

/// Claim every generated name in batch order. When two schemas claim the same
/// name, both fail with a collision naming both paths.
fn check_batch_names(
    batch: &SchemaBatch,
    resolved: &[Option<Result<Resolved, CompileError>>],
) -> BTreeMap<usize, CompileError> {
    let mut scope = NameScope::new();
    let mut failures = BTreeMap::new();

    for (idx, slot) in resolved.iter().enumerate() {
        let Some(Ok(resolved)) = slot else {
            continue;
        };
        for (name, path) in resolved.claims() {
            if let Err((owner, collision)) = scope.claim(idx, name, path) {
                failures.entry(owner).or_insert_with(|| {
                    CompileError::at(
                        batch.entries[owner].name(),
                        collision.first.clone(),
                        ErrorKind::Collision(collision.clone()),
                    )
                });
                failures
                    .entry(idx)
                    .or_insert_with(|| CompileError::new(batch.entries[idx].name(), collision.into()));
                break;
            }
        }
    }

    failures
}

/// Run `job` over `items` on up to `workers` scoped threads. Slot `i` holds the
/// result for `items[i]`, or `None` if the item was never started because the
/// batch was cancelled.
fn run_parallel<T, R, F>(
    workers: usize,
    items: &[T],
    cancel: &CancellationToken,
    job: F,
) -> Vec<Option<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    if workers <= 1 || items.len() <= 1 {
        return items
            .iter()
            .map(|item| (!cancel.is_cancelled()).then(|| job(item)))
            .collect();
    }

    let next = AtomicUsize::new(0);
    let slots: Vec<Mutex<Option<R>>> = items.iter().map(|_| Mutex::new(None)).collect();

    std::thread::scope(|scope| {
        for _ in 0..workers.min(items.len()) {
            scope.spawn(|| {
                loop {
                    if cancel.is_cancelled() {
                        return;
                    }
                    let idx = next.fetch_add(1, Ordering::Relaxed);
                    if idx >= items.len() {
                        return;
                    }
                    let result = job(&items[idx]);
                    if let Ok(mut slot) = slots[idx].lock() {
                        *slot = Some(result);
                    }
                }
            });
        }
    });

    slots
        .into_iter()
        .map(|slot| slot.into_inner().unwrap_or_else(|e| e.into_inner()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MalformedReason, SchemaError};
    use crate::sink::MemorySink;
    use crate::source::FieldSource;
    use assert_matches::assert_matches;

    fn table(name: &str, ty: &str) -> TableSource {
        TableSource::new(name, vec![FieldSource::scalar("id", ty)])
    }

    fn compiler(workers: usize) -> Compiler {
        let config = CompilerConfig::builder().workers(workers).build();
        Compiler::new(config, LanguageProfile::csharp()).unwrap()
    }

    #[test]
    fn test_partial_failure_keeps_going() {
        let mut batch = SchemaBatch::new();
        batch.push_table(table("DEItem", "int"));
        batch.push_table(table("DEBroken", "[[int"));
        batch.push_table(table("DEQuest", "string"));

        for workers in [1, 4] {
            let report = compiler(workers).compile_batch(&batch);
            assert_eq!(report.succeeded(), 2);
            assert_eq!(report.failed(), 1);
            assert_eq!(report.summary(), "2 succeeded, 1 failed");
            assert_matches!(
                report.outcome("DEBroken"),
                Some(SchemaOutcome::Failed(CompileError {
                    kind: ErrorKind::Schema(SchemaError::Malformed {
                        reason: MalformedReason::NestedArray,
                        ..
                    }),
                    ..
                }))
            );
            let names: Vec<&str> = report.outcomes().iter().map(|(n, _)| n.as_str()).collect();
            assert_eq!(names, vec!["DEItem", "DEBroken", "DEQuest"]);
        }
    }

    #[test]
    fn test_cross_schema_collision_fails_both() {
        let mut batch = SchemaBatch::new();
        batch.push_table(TableSource::new(
            "DEShop",
            vec![FieldSource::inline("item", false, vec![FieldSource::scalar("id", "int")])],
        ));
        batch.push_table(table("DEShop_Item", "int"));
        batch.push_table(table("DEOther", "int"));

        let report = compiler(2).compile_batch(&batch);
        assert_eq!(report.summary(), "1 succeeded, 2 failed");

        let errors: Vec<&CompileError> = report.errors().collect();
        assert_eq!(errors[0].schema, "DEShop");
        assert_eq!(errors[0].path, "DEShop.item");
        assert_eq!(errors[1].schema, "DEShop_Item");
        assert_eq!(errors[1].path, "DEShop_Item");
        for err in errors {
            assert_matches!(&err.kind, ErrorKind::Collision(c) if c.name == "DEShop_Item");
        }
    }

    #[test]
    fn test_registry_resolves_enums_and_shared_structs() {
        let source: SchemaSource = toml::from_str(
            r#"
            [[enums]]
            name = "DEGrade"
            members = [{ name = "Common" }, { name = "Rare" }]

            [[structs]]
            name = "DEPrice"
            fields = [{ name = "amount", type = "int" }]

            [[tables]]
            name = "DEItem"
            fields = [
                { name = "grade", type = "DEGrade" },
                { name = "prices", type = "[DEPrice" },
            ]
            "#,
        )
        .unwrap();
        let batch = SchemaBatch::from_sources([source]);
        assert_eq!(batch.names(), vec!["DEGrade", "DEPrice", "DEItem"]);

        let report = compiler(1).compile_batch(&batch);
        assert!(report.is_success(), "{}", report.summary());

        let mut sink = MemorySink::new();
        assert_eq!(report.deliver(&mut sink).unwrap(), 3);
        let item = sink.get("DEItem").unwrap();
        assert!(item.contains("public DEGrade grade;"));
        assert!(item.contains("public List<DEPrice> prices;"));
        assert!(sink.get("DEPrice").unwrap().contains("public struct DEPrice"));
    }

    #[test]
    fn test_cancelled_before_start() {
        let mut batch = SchemaBatch::new();
        batch.push_table(table("DEItem", "int"));
        batch.push_table(table("DEQuest", "int"));

        let compiler = compiler(2);
        let token = CancellationToken::new();
        token.cancel();
        let report = compiler.compile_batch_with(&batch, &token);

        assert_eq!(report.cancelled(), 2);
        assert_eq!(report.summary(), "0 succeeded, 0 failed, 2 cancelled");
        assert!(!report.is_success());

        // The next batch on the same compiler starts from a fresh token.
        let report = compiler.compile_batch(&batch);
        assert_eq!(report.summary(), "2 succeeded, 0 failed");
    }

    fn three_tables() -> SchemaBatch {
        let mut batch = SchemaBatch::new();
        batch.push_table(TableSource::new(
            "DEItem",
            vec![
                FieldSource::scalar("id", "int"),
                FieldSource::inline("cost", false, vec![FieldSource::scalar("gold", "int")]),
            ],
        ));
        batch.push_table(table("DEQuest", "string"));
        batch.push_table(table("DEShop", "int"));
        batch
    }

    #[test]
    fn test_cancel_after_first_schema_resolves() {
        let batch = three_tables();
        let token = CancellationToken::new();
        let report = compiler(1).run_batch(&batch, &token, &|stage: Stage, idx: usize| {
            if stage == Stage::Resolved && idx == 0 {
                token.cancel();
            }
        });

        // Resolved but never emitted, so nothing partial is reported.
        assert_eq!(report.outcome("DEItem"), Some(&SchemaOutcome::Cancelled));
        assert_eq!(report.outcome("DEQuest"), Some(&SchemaOutcome::Cancelled));
        assert_eq!(report.outcome("DEShop"), Some(&SchemaOutcome::Cancelled));
        assert_eq!(report.summary(), "0 succeeded, 0 failed, 3 cancelled");
        assert_eq!(report.units().count(), 0);
    }

    #[test]
    fn test_cancel_after_first_schema_emits() {
        let batch = three_tables();
        let full = compiler(1).compile_batch(&batch);

        let token = CancellationToken::new();
        let report = compiler(1).run_batch(&batch, &token, &|stage: Stage, idx: usize| {
            if stage == Stage::Emitted && idx == 0 {
                token.cancel();
            }
        });

        assert_eq!(report.summary(), "1 succeeded, 0 failed, 2 cancelled");
        assert_eq!(report.outcome("DEItem"), full.outcome("DEItem"));
        assert_matches!(report.outcome("DEItem"), Some(SchemaOutcome::Emitted(unit))
            if unit.declaration_names() == vec!["DEItem_Cost", "DEItem"]);
        assert_eq!(report.outcome("DEQuest"), Some(&SchemaOutcome::Cancelled));
        assert_eq!(report.outcome("DEShop"), Some(&SchemaOutcome::Cancelled));
    }

    #[test]
    fn test_run_parallel_stops_taking_work_once_cancelled() {
        let items: Vec<usize> = (0..5).collect();
        let token = CancellationToken::new();
        let results = run_parallel(1, &items, &token, |i| {
            if *i == 1 {
                token.cancel();
            }
            *i
        });
        assert_eq!(results, vec![Some(0), Some(1), None, None, None]);
    }

    #[test]
    fn test_invalid_profile_is_rejected() {
        let mut profile = LanguageProfile::csharp();
        profile.render.member = "public {type};".to_string();
        assert_matches!(
            Compiler::new(CompilerConfig::default(), profile),
            Err(ConfigError::MissingPlaceholder { .. })
        );
    }

    #[test]
    fn test_run_parallel_preserves_order() {
        let items: Vec<usize> = (0..64).collect();
        let results = run_parallel(8, &items, &CancellationToken::new(), |i| i * 2);
        let results: Vec<usize> = results.into_iter().flatten().collect();
        assert_eq!(results, (0..64).map(|i| i * 2).collect::<Vec<_>>());
    }
}
