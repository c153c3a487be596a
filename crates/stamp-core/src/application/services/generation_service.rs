//! Generation Service - main application orchestrator.
//!
//! Drives every target file of every sub-project through the pipeline:
//!
//! 1. Name gate and structural checks for every sub-project, then path
//!    ownership among the sub-projects that passed (before any file is touched)
//! 2. Read the file, or render its template when it does not exist yet
//! 3. Scan marker regions
//! 4. Synthesize content for each recognised region
//! 5. Merge and, if anything changed, commit through the `Filesystem` port
//!
//! Sub-projects and their files run on a rayon pool. Per-file failures are
//! folded into the report; they never stop sibling files.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::{
    application::{ApplicationError, ports::Filesystem},
    domain::{
        FileDocument, FileOutcome, FileReport, GenerationReport, IssueKind,
        MarkerSyntax, NameValidator, ReportBuilder, ReportIssue, SubProject, SubProjectState,
        SubProjectSummary, TargetFile,
    },
    error::StampResult,
};

/// Knobs for one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Worker threads. `0` is treated as `1`.
    pub concurrency: usize,
    /// Run the whole pipeline but never write.
    pub dry_run: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            concurrency: std::thread::available_parallelism().map_or(1, |n| n.get()),
            dry_run: false,
        }
    }
}

/// Main generation service.
pub struct GenerationService {
    filesystem: Box<dyn Filesystem>,
    syntax: MarkerSyntax,
    options: GenerationOptions,
}

impl GenerationService {
    /// Create a service with default marker syntax and options.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use stamp_core::application::GenerationService;
    ///
    /// let service = GenerationService::new(Box::new(filesystem))
    ///     .with_options(GenerationOptions { concurrency: 4, dry_run: true });
    /// let report = service.generate(&sub_projects)?;
    /// ```
    pub fn new(filesystem: Box<dyn Filesystem>) -> Self {
        Self {
            filesystem,
            syntax: MarkerSyntax::default(),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_syntax(mut self, syntax: MarkerSyntax) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn syntax(&self) -> &MarkerSyntax {
        &self.syntax
    }

    pub fn options(&self) -> GenerationOptions {
        self.options
    }

    /// Regenerate every sub-project and report what happened.
    ///
    /// Only failing to start the worker pool is an `Err`; everything else
    /// ends up in the report.
    #[instrument(
        skip_all,
        fields(
            sub_projects = sub_projects.len(),
            dry_run = self.options.dry_run,
            jobs = self.options.concurrency
        )
    )]
    pub fn generate(&self, sub_projects: &[SubProject]) -> StampResult<GenerationReport> {
        let mut builder = ReportBuilder::new(self.options.dry_run);
        info!(run_id = %builder.run_id(), "Starting generation run");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.concurrency.max(1))
            .thread_name(|i| format!("stamp-worker-{i}"))
            .build()
            .map_err(|e| ApplicationError::ThreadPool {
                reason: e.to_string(),
            })?;

        let summaries: Vec<SubProjectSummary> = pool.install(|| {
            let rejected: Vec<Option<ReportIssue>> = sub_projects
                .par_iter()
                .map(|sp| self.admit(sp).err())
                .collect();
            let conflicts = path_conflicts(sub_projects, &rejected);

            sub_projects
                .par_iter()
                .zip(rejected)
                .enumerate()
                .map(|(index, (sp, rejected))| {
                    match rejected.or_else(|| conflicts.get(&index).cloned()) {
                        Some(issue) => {
                            debug!(sub_project = %sp.name, state = %SubProjectState::Aborted);
                            SubProjectSummary::aborted(&sp.name, &sp.root, issue)
                        }
                        None => self.generate_sub_project(sp),
                    }
                })
                .collect()
        });

        for summary in summaries {
            builder.push(summary);
        }
        let report = builder.build();

        info!(
            created = report.created().len(),
            updated = report.updated().len(),
            unchanged = report.unchanged().len(),
            failures = report.failures().count(),
            warnings = report.warnings().count(),
            "Generation run finished"
        );
        Ok(report)
    }

    /// Name gate, then structural checks. Rendered units must not carry a
    /// delimiter token of the active syntax.
    #[instrument(skip_all, fields(sub_project = %sub_project.name))]
    fn admit(&self, sub_project: &SubProject) -> Result<(), ReportIssue> {
        debug!(state = %SubProjectState::Validating);

        NameValidator::validate_sub_project(sub_project).map_err(|err| {
            warn!(error = %err, "Name gate rejected sub-project");
            ReportIssue::new(&sub_project.root, IssueKind::InvalidName, err.to_string())
        })?;

        sub_project
            .validate()
            .and_then(|()| {
                sub_project
                    .registry
                    .check_tokens(&self.syntax, &sub_project.name)
            })
            .map_err(|err| {
                warn!(error = %err, "Sub-project is malformed");
                ReportIssue::new(
                    &sub_project.root,
                    IssueKind::InvalidSubProject,
                    err.to_string(),
                )
            })
    }

    #[instrument(skip_all, fields(sub_project = %sub_project.name))]
    fn generate_sub_project(&self, sub_project: &SubProject) -> SubProjectSummary {
        debug!(state = %SubProjectState::Generating, files = sub_project.files.len());
        let (files, scanned): (Vec<FileReport>, Vec<Option<HashSet<String>>>) = sub_project
            .files
            .par_iter()
            .map(|file| self.process_file(sub_project, file))
            .unzip();

        debug!(state = %SubProjectState::Completed);
        let mut summary = SubProjectSummary::completed(&sub_project.name, &sub_project.root, files);
        summary.issues = unplaced_anywhere(sub_project, &scanned);
        summary
    }

    #[instrument(skip_all, fields(path = %file.path))]
    /// Run one file through the pipeline. Also returns the region ids the
    /// file has, or `None` when it could not be scanned.
    fn process_file(
        &self,
        sub_project: &SubProject,
        file: &TargetFile,
    ) -> (FileReport, Option<HashSet<String>>) {
        let path = sub_project.resolve(&file.path);

        let existing = match self.filesystem.read_to_string(&path) {
            Ok(existing) => existing,
            Err(err) => {
                warn!(error = %err, "Read failed");
                let report = FileReport::failed(
                    &path,
                    ReportIssue::new(&path, IssueKind::WriteFailure, format!("read: {err}")),
                );
                return (report, None);
            }
        };
        let creating = existing.is_none();
        let text = existing.unwrap_or_else(|| sub_project.render_template(file));

        let mut doc = FileDocument::new(&path, text);
        debug!(state = ?doc.state(), creating);

        if let Err(err) = doc.scan(&self.syntax) {
            warn!(error = %err, "Marker structure error");
            let report = FileReport::failed(
                &path,
                ReportIssue::new(&path, IssueKind::from_domain(&err), err.to_string()),
            );
            return (report, None);
        }
        debug!(state = ?doc.state(), regions = doc.regions().len());
        let regions: HashSet<String> = doc.region_ids().into_iter().map(str::to_owned).collect();

        let issues = unplaced_warnings(sub_project, file, &doc, &path);
        let content = synthesize(sub_project, file.path.as_path(), &doc);

        let changed = doc.merge(&content);
        debug!(state = ?doc.state(), changed, rewritten = ?doc.rewritten());

        let outcome = match (creating, changed) {
            (true, _) => FileOutcome::Created,
            (false, true) => FileOutcome::Updated,
            (false, false) => FileOutcome::Unchanged,
        };

        if outcome == FileOutcome::Unchanged {
            doc.mark_unchanged();
        } else if self.options.dry_run {
            info!(outcome = ?outcome, "Would write (dry run)");
        } else if let Err(err) = self.filesystem.write_atomic(&path, doc.text()) {
            warn!(error = %err, "Write failed, original left in place");
            doc.mark_failed();
            let mut report = FileReport::failed(
                &path,
                ReportIssue::new(&path, IssueKind::WriteFailure, err.to_string()),
            );
            report.issues.extend(issues);
            return (report, Some(regions));
        } else {
            doc.mark_written();
            info!(outcome = ?outcome, "Wrote file");
        }

        let report = FileReport {
            path,
            outcome,
            state: doc.state(),
            rewritten_regions: doc.rewritten().to_vec(),
            issues,
        };
        (report, Some(regions))
    }
}

/// Content for every region of `doc` the registry recognises.
fn synthesize(
    sub_project: &SubProject,
    file: &Path,
    doc: &FileDocument,
) -> BTreeMap<String, String> {
    doc.regions()
        .iter()
        .filter_map(|region| {
            sub_project
                .registry
                .synthesize(&region.id, file, &sub_project.name)
                .map(|content| (region.id.clone(), content))
        })
        .collect()
}

/// File-scoped units whose file lacks their region.
fn unplaced_warnings(
    sub_project: &SubProject,
    file: &TargetFile,
    doc: &FileDocument,
    path: &Path,
) -> Vec<ReportIssue> {
    let present = doc.region_ids();
    sub_project
        .registry
        .unplaced_units(file.path.as_path(), &present)
        .into_iter()
        .filter(|unit| unit.file.is_some())
        .map(|unit| {
            warn!(region = %unit.region, unit = %unit.name, "Unit targets a missing region");
            ReportIssue::new(
                path,
                IssueKind::UnknownRegionWarning,
                format!(
                    "{} unit '{}' targets region '{}', which the file does not have",
                    unit.kind, unit.name, unit.region
                ),
            )
        })
        .collect()
}

/// Unscoped units whose region no file of the sub-project has. Nothing is
/// reported while a file's regions are unknown.
fn unplaced_anywhere(
    sub_project: &SubProject,
    scanned: &[Option<HashSet<String>>],
) -> Vec<ReportIssue> {
    let Some(present) = scanned
        .iter()
        .try_fold(HashSet::new(), |mut present, regions| {
            present.extend(regions.as_ref()?.iter().map(String::as_str));
            Some(present)
        })
    else {
        return Vec::new();
    };

    sub_project
        .registry
        .units()
        .iter()
        .filter(|unit| unit.file.is_none() && !present.contains(unit.region.as_str()))
        .map(|unit| {
            warn!(region = %unit.region, unit = %unit.name, "No file has the unit's region");
            ReportIssue::new(
                &sub_project.root,
                IssueKind::UnknownRegionWarning,
                format!(
                    "{} unit '{}' targets region '{}', which no file of '{}' has",
                    unit.kind, unit.name, unit.region, sub_project.name
                ),
            )
        })
        .collect()
}

/// Sub-projects that would write a path an earlier sub-project already owns.
///
/// Files run in parallel with no shared state, so two owners of one path
/// cannot both be honoured. The later one is rejected before it starts.
/// Sub-projects already `rejected` own nothing.
fn path_conflicts(
    sub_projects: &[SubProject],
    rejected: &[Option<ReportIssue>],
) -> HashMap<usize, ReportIssue> {
    let mut owners: HashMap<PathBuf, &str> = HashMap::new();
    let mut conflicts = HashMap::new();

    for (index, sp) in sub_projects.iter().enumerate() {
        if rejected.get(index).is_some_and(Option::is_some) {
            continue;
        }
        let paths: Vec<PathBuf> = sp
            .files
            .iter()
            .map(|f| normalise(&sp.resolve(&f.path)))
            .collect();
        let clash = paths
            .iter()
            .find_map(|p| owners.get(p).map(|owner| (p.clone(), *owner)));

        match clash {
            Some((path, owner)) => {
                let detail = format!(
                    "'{}' is also generated by sub-project '{owner}'",
                    path.display()
                );
                warn!(sub_project = %sp.name, "{detail}");
                conflicts.insert(
                    index,
                    ReportIssue::new(&sp.root, IssueKind::InvalidSubProject, detail),
                );
            }
            None => {
                for path in paths {
                    owners.insert(path, &sp.name);
                }
            }
        }
    }

    conflicts
}

/// Drop `.` components so `./apps/x` and `apps/x` compare equal.
fn normalise(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FileState, GenerationUnit, RelativePath, UnitRegistry};
    use crate::error::StampError;
    use std::sync::{Arc, Mutex};

    /// Minimal in-memory port for unit tests. The adapters crate has the
    /// full-featured one.
    #[derive(Default, Clone)]
    struct MapFs {
        files: Arc<Mutex<HashMap<PathBuf, String>>>,
        writes: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl Filesystem for MapFs {
        fn read_to_string(&self, path: &Path) -> StampResult<Option<String>> {
            Ok(self.files.lock().unwrap().get(path).cloned())
        }

        fn write_atomic(&self, path: &Path, content: &str) -> StampResult<()> {
            if path.ends_with("readonly.js") {
                return Err(StampError::from(ApplicationError::WriteFailure {
                    path: path.to_path_buf(),
                    reason: "permission denied".into(),
                }));
            }
            self.writes.lock().unwrap().push(path.to_path_buf());
            self.files
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), content.to_string());
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            self.files.lock().unwrap().contains_key(path)
        }
    }

    const APP: &str = "// GENERATOR:START\n// GENERATOR:ID:imports\n// GENERATOR:END\n";

    fn remote(name: &str) -> SubProject {
        SubProject::new(name, name)
            .with_file(TargetFile::new(RelativePath::new("src/App.jsx"), APP))
            .with_registry(UnitRegistry::new().with_unit(GenerationUnit::import("imports", "Cart")))
    }

    fn service(fs: &MapFs) -> GenerationService {
        GenerationService::new(Box::new(fs.clone())).with_options(GenerationOptions {
            concurrency: 2,
            dry_run: false,
        })
    }

    #[test]
    fn creates_then_reports_unchanged() {
        let fs = MapFs::default();
        let svc = service(&fs);

        let first = svc.generate(&[remote("checkout")]).unwrap();
        assert_eq!(first.created(), [PathBuf::from("checkout/src/App.jsx")]);
        assert!(first.is_success());

        let second = svc.generate(&[remote("checkout")]).unwrap();
        assert!(second.created().is_empty());
        assert!(second.updated().is_empty());
        assert_eq!(second.unchanged().len(), 1);
        assert_eq!(fs.writes.lock().unwrap().len(), 1);
    }

    #[test]
    fn dry_run_never_writes() {
        let fs = MapFs::default();
        let svc = GenerationService::new(Box::new(fs.clone())).with_options(GenerationOptions {
            concurrency: 1,
            dry_run: true,
        });

        let report = svc.generate(&[remote("checkout")]).unwrap();
        assert!(report.has_changes());
        assert!(fs.writes.lock().unwrap().is_empty());
        assert_eq!(report.sub_projects()[0].files[0].state, FileState::Merged);
    }

    #[test]
    fn gate_rejects_before_any_file() {
        let fs = MapFs::default();
        let report = service(&fs).generate(&[remote("Bad Name")]).unwrap();

        assert_eq!(report.errors().len(), 1);
        assert_eq!(report.errors()[0].kind, IssueKind::InvalidName);
        assert_eq!(report.sub_projects()[0].state, SubProjectState::Aborted);
        assert!(fs.writes.lock().unwrap().is_empty());
    }

    #[test]
    fn write_failure_does_not_stop_siblings() {
        let fs = MapFs::default();
        let sp = remote("checkout").with_file(TargetFile::new(RelativePath::new("readonly.js"), APP));

        let report = service(&fs).generate(&[sp]).unwrap();
        assert_eq!(report.created().len(), 1);
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.failures().next().unwrap().kind, IssueKind::WriteFailure);
        assert!(!fs.exists(Path::new("checkout/readonly.js")));
    }

    #[test]
    fn overlapping_paths_reject_the_later_sub_project() {
        let fs = MapFs::default();
        let a = remote("checkout");
        let b = SubProject::new("cart", "checkout")
            .with_file(TargetFile::new(RelativePath::new("src/App.jsx"), APP));

        let report = service(&fs).generate(&[a, b]).unwrap();
        assert_eq!(report.sub_projects()[0].state, SubProjectState::Completed);
        assert_eq!(report.sub_projects()[1].state, SubProjectState::Aborted);
        assert_eq!(report.errors()[0].kind, IssueKind::InvalidSubProject);
    }

    #[test]
    fn rejected_sub_project_owns_no_paths() {
        let fs = MapFs::default();
        let file = || TargetFile::new(RelativePath::new("a.js"), APP);
        let bad = SubProject::new("Bad Name", "shared").with_file(file());
        let good = SubProject::new("good", "shared").with_file(file());

        let report = service(&fs).generate(&[bad, good]).unwrap();

        assert_eq!(report.sub_projects()[0].state, SubProjectState::Aborted);
        assert_eq!(report.sub_projects()[0].issues[0].kind, IssueKind::InvalidName);
        assert_eq!(report.sub_projects()[1].state, SubProjectState::Completed);
        assert_eq!(report.errors().len(), 1);
        assert!(fs.exists(Path::new("shared/a.js")));
    }

    #[test]
    fn invalid_name_wins_over_path_conflict() {
        let fs = MapFs::default();
        let bad = SubProject::new("Cart", "checkout")
            .with_file(TargetFile::new(RelativePath::new("src/App.jsx"), APP));

        let report = service(&fs).generate(&[remote("checkout"), bad]).unwrap();
        assert_eq!(report.sub_projects()[1].issues[0].kind, IssueKind::InvalidName);
    }

    #[test]
    fn dot_prefixed_root_still_conflicts() {
        let fs = MapFs::default();
        let a = SubProject::new("x", "apps/x")
            .with_file(TargetFile::new(RelativePath::new("a.js"), APP));
        let b = SubProject::new("y", "./apps/x")
            .with_file(TargetFile::new(RelativePath::new("a.js"), APP));

        let report = service(&fs).generate(&[a, b]).unwrap();
        assert_eq!(report.sub_projects()[0].state, SubProjectState::Completed);
        assert_eq!(report.sub_projects()[1].state, SubProjectState::Aborted);
        assert_eq!(report.errors()[0].kind, IssueKind::InvalidSubProject);
        assert_eq!(fs.writes.lock().unwrap().len(), 1);
    }

    #[test]
    fn unit_text_with_marker_token_aborts_before_writing() {
        const ROUTES: &str = "// GENERATOR:START\n// GENERATOR:ID:routes\n// GENERATOR:END\n";
        let fs = MapFs::default();
        let sp = SubProject::new("api", "api")
            .with_file(TargetFile::new(RelativePath::new("r.js"), ROUTES))
            .with_registry(
                UnitRegistry::new().with_unit(GenerationUnit::raw("routes", "// see GENERATOR:END docs")),
            );

        let report = service(&fs).generate(&[sp]).unwrap();

        assert_eq!(report.sub_projects()[0].state, SubProjectState::Aborted);
        assert_eq!(report.errors()[0].kind, IssueKind::InvalidSubProject);
        assert!(report.errors()[0].detail.contains("GENERATOR:END"));
        assert!(fs.writes.lock().unwrap().is_empty());
        assert!(!fs.exists(Path::new("api/r.js")));
    }

    #[test]
    fn token_check_follows_the_active_syntax() {
        let fs = MapFs::default();
        let sp = SubProject::new("api", "api")
            .with_file(TargetFile::new(RelativePath::new("r.js"), "/*START*//*ID:routes*//*END*/"))
            .with_registry(
                UnitRegistry::new().with_unit(GenerationUnit::raw("routes", "// see GENERATOR:END docs")),
            );

        let report = service(&fs)
            .with_syntax(MarkerSyntax::new("START", "ID:", "END").unwrap())
            .generate(&[sp])
            .unwrap();
        assert_eq!(report.sub_projects()[0].state, SubProjectState::Aborted);
        assert!(report.errors()[0].detail.contains("'END'"));
    }

    fn remote_set(units: UnitRegistry) -> SubProject {
        const EXPORTS: &str = "// GENERATOR:START\n// GENERATOR:ID:exports\n// GENERATOR:END\n";
        SubProject::new("cart", "cart")
            .with_file(TargetFile::new(RelativePath::new("package.json"), "{}\n"))
            .with_file(TargetFile::new(RelativePath::new("webpack.config.js"), APP))
            .with_file(TargetFile::new(RelativePath::new("src/App.jsx"), APP))
            .with_file(TargetFile::new(RelativePath::new("src/index.js"), EXPORTS))
            .with_registry(units)
    }

    #[test]
    fn unscoped_unit_warns_only_when_no_file_has_its_region() {
        let fs = MapFs::default();
        let placed = remote_set(UnitRegistry::new().with_unit(GenerationUnit::export("exports", "Cart")));
        let report = service(&fs).generate(&[placed]).unwrap();
        assert_eq!(report.warnings().count(), 0);
        assert_eq!(report.created().len(), 4);

        let fs = MapFs::default();
        let lost = remote_set(UnitRegistry::new().with_unit(GenerationUnit::export("routes", "Cart")));
        let report = service(&fs).generate(&[lost]).unwrap();
        let warnings: Vec<_> = report.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].path, PathBuf::from("cart"));
        assert!(warnings[0].detail.contains("'routes'"));
    }

    #[test]
    fn scoped_unit_warns_on_its_own_file() {
        let fs = MapFs::default();
        let sp = remote_set(UnitRegistry::new().with_unit(
            GenerationUnit::export("exports", "Cart").in_file(RelativePath::new("src/App.jsx")),
        ));

        let report = service(&fs).generate(&[sp]).unwrap();
        let warnings: Vec<_> = report.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].path, PathBuf::from("cart/src/App.jsx"));
    }
}
