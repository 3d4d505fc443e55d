use std::fs;
use std::path::PathBuf;

use cps_analyst::analysis::Analyst;
use cps_analyst::fixture::{FixtureRecord, MatchBundle};
use cps_analyst::match_cache::MatchStore;
use cps_analyst::scout::Scout;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn seeded_store() -> (tempfile::TempDir, MatchStore) {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw");
    fs::create_dir_all(&raw).unwrap();
    fs::write(
        raw.join("match_full_971362.json"),
        read_fixture("match_full_971362.json"),
    )
    .unwrap();
    let store = MatchStore::new(dir.path());
    (dir, store)
}

#[test]
fn cache_only_pipeline_writes_analysis_and_report() {
    let (dir, store) = seeded_store();
    let scout = Scout::with_parts(store, None, 128, 2023);

    let id = scout.store().first_cached_fixture().unwrap();
    assert_eq!(id, 971362);
    let bundle = scout.match_bundle(id, true).unwrap();
    let analysis = Analyst::default().analyze(&bundle);

    let path = scout.store().save_analysis(&analysis).unwrap();
    assert_eq!(path, dir.path().join("processed").join("analysis_971362.json"));
    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["comparison"]["better_team"], "Boca Juniors");

    let report = scout.store().save_report(id, "# report\n").unwrap();
    assert_eq!(fs::read_to_string(report).unwrap(), "# report\n");
    assert!(!dir.path().join("reports").join("report_971362.tmp").exists());
}

#[test]
fn refetch_without_key_fails_even_when_cached() {
    let (_dir, store) = seeded_store();
    let scout = Scout::with_parts(store, None, 128, 2023);
    assert!(scout.match_bundle(971362, true).is_ok());
    assert!(scout.match_bundle(971362, false).is_err());
}

#[test]
fn saved_bundle_is_read_back_unchanged() {
    let (_dir, store) = seeded_store();
    let original = store.load_bundle(971362).unwrap();
    let mut copy = original.clone();
    copy.fixture_id = 5;
    store.save_bundle(&copy).unwrap();

    let reloaded: MatchBundle = store.load_bundle(5).unwrap();
    assert_eq!(reloaded.statistics, original.statistics);
    assert_eq!(reloaded.fetched_at, "2023-08-21T10:15:00Z");
    assert_eq!(store.cached_fixtures(), vec![5, 971362]);
}

#[test]
fn cached_listings_honor_limit() {
    let (_dir, store) = seeded_store();
    let bundle = store.load_bundle(971362).unwrap();
    let record = bundle.fixture_record();
    store
        .save_json("matches_team_451_s2023", &vec![record.clone(), record.clone(), record])
        .unwrap();

    let scout = Scout::with_parts(store, None, 128, 2023);
    let matches: Vec<FixtureRecord> = scout.last_matches(451, 2, true).unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(
        matches[0].summary_line(),
        "2023-08-20: Boca Juniors 0-1 River Plate"
    );
    assert!(scout.head_to_head(451, 435, true).is_err());
}
