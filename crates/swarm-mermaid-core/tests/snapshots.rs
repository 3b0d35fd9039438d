use swarm_mermaid_core::{Snapshot, StaticCluster, TopologyGrapher};
use std::path::{Path, PathBuf};

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

fn fixtures_root() -> PathBuf {
    workspace_root().join("fixtures").join("topology")
}

fn list_fixture_snapshots(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let Ok(entries) = std::fs::read_dir(root) else {
        return out;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|e| e == "json") {
            out.push(path);
        }
    }
    out.sort();
    out
}

#[test]
fn fixtures_match_golden_graphs() {
    let fixtures = list_fixture_snapshots(&fixtures_root());
    assert!(
        !fixtures.is_empty(),
        "no fixtures found under {}",
        fixtures_root().display()
    );

    let grapher = TopologyGrapher::new();
    for json_path in fixtures {
        let snapshot = Snapshot::from_path(&json_path)
            .unwrap_or_else(|e| panic!("failed to load fixture {}: {e}", json_path.display()));
        let text = futures::executor::block_on(grapher.generate(&StaticCluster::new(snapshot)))
            .unwrap_or_else(|e| panic!("graph failed for {}: {e}", json_path.display()));

        let golden_path = json_path.with_extension("golden.mmd");
        let golden = std::fs::read_to_string(&golden_path).unwrap_or_else(|_| {
            panic!("missing golden graph {}", golden_path.display())
        });

        assert_eq!(
            text,
            golden,
            "graph mismatch for {}",
            json_path.display()
        );
    }
}

#[test]
fn snapshot_json_survives_a_save_and_load() {
    let path = fixtures_root().join("shop_stack.json");
    let snapshot = Snapshot::from_path(&path).expect("load fixture");
    let saved = snapshot.to_json_pretty().expect("serialize snapshot");
    assert_eq!(Snapshot::from_json(&saved).expect("reload snapshot"), snapshot);
}
