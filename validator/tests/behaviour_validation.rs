//! BDD tests for catalog validation.

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use registry_validator::artefact::digest::Sha256Digest;
use registry_validator::catalog::CatalogEntry;
use registry_validator::config::ValidationConfig;
use registry_validator::exemptions::ExemptionList;
use registry_validator::manifest::PublisherPolicy;
use registry_validator::pipeline::{EntryOutcome, EntryReport};
use registry_validator::test_utils::{
    StubFetcher, catalog_entry, extension_archive, package_json, sha256_hex,
};
use registry_validator::validation::{RunReport, validate_catalog};

#[derive(Default)]
struct CatalogWorld {
    published: Vec<(CatalogEntry, Vec<u8>)>,
    exempt: Vec<Sha256Digest>,
    config: ValidationConfig,
    report: Option<RunReport>,
    requests: Vec<String>,
}

impl CatalogWorld {
    fn publish(&mut self, id: &str, archive: Vec<u8>) {
        let entry = catalog_entry(id, &sha256_hex(&archive));
        self.published.push((entry, archive));
    }

    fn entry_mut(&mut self, id: &str) -> &mut CatalogEntry {
        self.published
            .iter_mut()
            .map(|(entry, _)| entry)
            .find(|entry| entry.id == id)
            .expect("extension published")
    }

    fn report(&self) -> &RunReport {
        self.report.as_ref().expect("catalog validated")
    }

    fn entry_report(&self, id: &str) -> &EntryReport {
        self.report()
            .entries
            .iter()
            .find(|entry| entry.id == id)
            .expect("entry validated")
    }
}

#[fixture]
fn world() -> CatalogWorld {
    CatalogWorld::default()
}

#[given("a published extension \"{id}\" built with create-foxglove-extension \"{range}\"")]
fn given_published_extension(world: &mut CatalogWorld, id: String, range: String) {
    let (publisher, name) = id.split_once('.').expect("qualified identifier");
    let archive = extension_archive(&package_json(name, Some(publisher), Some(&range)));
    world.publish(&id, archive);
}

#[given("a published extension \"{id}\" whose package \"{name}\" has no publisher")]
fn given_extension_without_publisher(world: &mut CatalogWorld, id: String, name: String) {
    let archive = extension_archive(&package_json(&name, None, Some("^1.0.0")));
    world.publish(&id, archive);
}

#[given("a published extension \"{id}\" whose archive is not a zip file")]
fn given_corrupted_extension(world: &mut CatalogWorld, id: String) {
    world.publish(&id, b"PK\x03\x04 truncated upload".to_vec());
}

#[given("the catalog records digest \"{digest}\" for \"{id}\"")]
fn given_recorded_digest(world: &mut CatalogWorld, digest: String, id: String) {
    world.entry_mut(&id).expected_digest = digest;
}

#[given("the readme of \"{id}\" is linked at \"{url}\"")]
fn given_readme_url(world: &mut CatalogWorld, id: String, url: String) {
    world.entry_mut(&id).readme_url = url;
}

#[given("the exemption list contains the digest of \"{id}\"")]
fn given_exempt_extension(world: &mut CatalogWorld, id: String) {
    let digest = world.entry_mut(&id).expected_digest.clone();
    world
        .exempt
        .push(Sha256Digest::try_from(digest).expect("valid digest"));
}

#[given("the exemption list contains a digest no extension publishes")]
fn given_orphaned_exemption(world: &mut CatalogWorld) {
    world
        .exempt
        .push(Sha256Digest::compute(b"an extension withdrawn from the registry"));
}

#[given("scoped package names supply the publisher")]
fn given_scope_fallback(world: &mut CatalogWorld) {
    world.config.publisher_policy = PublisherPolicy::ScopeFallback;
}

#[when("the catalog is validated")]
fn when_catalog_validated(world: &mut CatalogWorld) {
    let fetcher = world
        .published
        .iter()
        .fold(StubFetcher::new(), |fetcher, (entry, archive)| {
            fetcher.serve_entry(entry, archive.clone())
        });
    let entries: Vec<_> = world
        .published
        .iter()
        .map(|(entry, _)| entry.clone())
        .collect();
    if !world.exempt.is_empty() {
        world.config.exemptions = ExemptionList::new(world.exempt.clone());
    }
    world.report = Some(validate_catalog(&entries, &fetcher, &world.config));
    world.requests = fetcher.requests();
}

#[then("the run passes")]
fn then_run_passes(world: &mut CatalogWorld) {
    let report = world.report();
    let rendered: Vec<_> = report.diagnostics().map(ToString::to_string).collect();
    assert!(report.passed(), "unexpected errors: {rendered:?}");
}

#[then("the run fails")]
fn then_run_fails(world: &mut CatalogWorld) {
    assert!(!world.report().passed(), "expected at least one error");
}

#[then("\"{id}\" reports the error \"{message}\"")]
fn then_entry_reports_error(world: &mut CatalogWorld, id: String, message: String) {
    let entry = world.entry_report(&id);
    assert!(
        entry
            .diagnostics
            .iter()
            .any(|diagnostic| diagnostic.is_error() && diagnostic.message.contains(&message)),
        "no error containing '{message}' in {:?}",
        entry.diagnostics
    );
}

#[then("\"{id}\" reports a warning")]
fn then_entry_reports_warning(world: &mut CatalogWorld, id: String) {
    let entry = world.entry_report(&id);
    assert!(
        entry.diagnostics.iter().any(|diagnostic| !diagnostic.is_error()),
        "no warning in {:?}",
        entry.diagnostics
    );
}

#[then("\"{id}\" has no diagnostics")]
fn then_entry_is_clean(world: &mut CatalogWorld, id: String) {
    let entry = world.entry_report(&id);
    assert!(entry.diagnostics.is_empty(), "{:?}", entry.diagnostics);
    assert!(entry.outcome.is_passed());
}

#[then("\"{id}\" has exactly one diagnostic")]
fn then_entry_has_one_diagnostic(world: &mut CatalogWorld, id: String) {
    assert_eq!(world.entry_report(&id).diagnostics.len(), 1);
}

#[then("validation of \"{id}\" stopped at the \"{step}\" step")]
fn then_entry_stopped_at(world: &mut CatalogWorld, id: String, step: String) {
    match &world.entry_report(&id).outcome {
        EntryOutcome::FailedAt { step: failed, .. } => assert_eq!(failed.to_string(), step),
        EntryOutcome::Passed => panic!("expected {id} to fail at {step}"),
    }
}

#[then("the catalog reports the error \"{message}\"")]
fn then_catalog_reports_error(world: &mut CatalogWorld, message: String) {
    let report = world.report();
    assert!(
        report
            .catalog_diagnostics
            .iter()
            .any(|diagnostic| diagnostic.is_error() && diagnostic.message.contains(&message)),
        "no catalog error containing '{message}' in {:?}",
        report.catalog_diagnostics
    );
}

#[then("no request was made to \"{url}\"")]
fn then_no_request(world: &mut CatalogWorld, url: String) {
    assert!(
        !world.requests.contains(&url),
        "unexpected request to {url}"
    );
}

#[scenario(
    path = "tests/features/catalog_validation.feature",
    name = "A well-formed extension passes without findings"
)]
fn scenario_well_formed(world: CatalogWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/catalog_validation.feature",
    name = "A digest mismatch stops the entry"
)]
fn scenario_digest_mismatch(world: CatalogWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/catalog_validation.feature",
    name = "The package scope supplies a missing publisher"
)]
fn scenario_scope_publisher(world: CatalogWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/catalog_validation.feature",
    name = "A missing publisher is rejected by default"
)]
fn scenario_missing_publisher(world: CatalogWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/catalog_validation.feature",
    name = "An exempt extension below the floor only warns"
)]
fn scenario_grandfathered(world: CatalogWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/catalog_validation.feature",
    name = "An extension below the floor without exemption fails"
)]
fn scenario_below_floor(world: CatalogWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/catalog_validation.feature",
    name = "A readme on the web UI host is rejected without a request"
)]
fn scenario_web_ui_readme(world: CatalogWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/catalog_validation.feature",
    name = "An exempt digest without a catalog entry fails the run"
)]
fn scenario_stale_exemption(world: CatalogWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/catalog_validation.feature",
    name = "A corrupted archive halts only its own entry"
)]
fn scenario_corrupted_archive(world: CatalogWorld) {
    let _ = world;
}
