//! Golden tests for the variant graph kernel.
//!
//! These tests pin ranks, tables and error behavior on small hand-built
//! traditions, and verify determinism and transactional rollback.

use std::sync::Arc;

use variant_graph_kernel::{
    CollationError, GraphStore, GraphTransaction, InMemoryGraphStore, KernelConfig, NewReading,
    ReadingId, RelationScope, SectionId, SectionRange, TraditionGraph, TraditionId,
    VariantGraphKernel, WitnessLayers,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn make_kernel(graph: TraditionGraph) -> (VariantGraphKernel<InMemoryGraphStore>, TraditionId) {
    init_tracing();
    let store = Arc::new(InMemoryGraphStore::new());
    let tid = store.add_tradition(graph);
    let kernel = VariantGraphKernel::new(store);
    kernel.rank_tradition(&tid).unwrap();
    (kernel, tid)
}

struct CatGraph {
    section: SectionId,
    the: ReadingId,
    cat: ReadingId,
    sat: ReadingId,
    sit: ReadingId,
}

/// A: "the cat sat", B: "the cat sit", sat~sit related as spelling.
fn build_cat_graph() -> (TraditionGraph, CatGraph) {
    let mut graph = TraditionGraph::named("cats");
    let section = graph.add_section("s1");
    let the = graph.add_reading(section, NewReading::text("the")).unwrap();
    let cat = graph.add_reading(section, NewReading::text("cat")).unwrap();
    let sat = graph.add_reading(section, NewReading::text("sat")).unwrap();
    let sit = graph.add_reading(section, NewReading::text("sit")).unwrap();
    graph.add_witness_path(section, "A", &[the, cat, sat]).unwrap();
    graph.add_witness_path(section, "B", &[the, cat, sit]).unwrap();
    graph.add_relation(sat, sit, "spelling", RelationScope::Local).unwrap();
    (graph, CatGraph { section, the, cat, sat, sit })
}

/// Three sections: "the cat" / "the dog", then "sat down" / "sat", then "." for both.
fn build_three_sections() -> (TraditionGraph, [SectionId; 3]) {
    let mut graph = TraditionGraph::named("chain");
    let s1 = graph.add_section("one");
    let s2 = graph.add_section("two");
    let s3 = graph.add_section("three");

    let the = graph.add_reading(s1, NewReading::text("the")).unwrap();
    let cat = graph.add_reading(s1, NewReading::text("cat")).unwrap();
    let dog = graph.add_reading(s1, NewReading::text("dog")).unwrap();
    graph.add_witness_path(s1, "A", &[the, cat]).unwrap();
    graph.add_witness_path(s1, "B", &[the, dog]).unwrap();

    let sat = graph.add_reading(s2, NewReading::text("sat")).unwrap();
    let down = graph.add_reading(s2, NewReading::text("down")).unwrap();
    graph.add_witness_path(s2, "A", &[sat, down]).unwrap();
    graph.add_witness_path(s2, "B", &[sat]).unwrap();

    let stop = graph.add_reading(s3, NewReading::text(".")).unwrap();
    graph.add_witness_path(s3, "A", &[stop]).unwrap();
    graph.add_witness_path(s3, "B", &[stop]).unwrap();

    (graph, [s1, s2, s3])
}

// ─────────────────────────────────────────────────────────────────────────────
// RANK TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_cat_sat_ranks() {
    let (graph, ids) = build_cat_graph();
    let (kernel, tid) = make_kernel(graph);

    let snapshot = kernel.store().snapshot(&tid).unwrap();
    let section = snapshot.section(ids.section).unwrap();
    assert_eq!(snapshot.rank(section.start), Some(0));
    assert_eq!(snapshot.rank(ids.the), Some(1));
    assert_eq!(snapshot.rank(ids.cat), Some(2));
    assert_eq!(snapshot.rank(ids.sat), Some(3));
    assert_eq!(snapshot.rank(ids.sit), Some(3));
    assert_eq!(snapshot.rank(section.end), Some(4));
}

#[test]
fn test_new_relation_raises_ranks_downstream() {
    let mut graph = TraditionGraph::named("relink");
    let section = graph.add_section("s1");
    let a = graph.add_reading(section, NewReading::text("a")).unwrap();
    let b = graph.add_reading(section, NewReading::text("b")).unwrap();
    let c = graph.add_reading(section, NewReading::text("c")).unwrap();
    let x = graph.add_reading(section, NewReading::text("x")).unwrap();
    let y = graph.add_reading(section, NewReading::text("y")).unwrap();
    graph.add_witness_path(section, "A", &[a, b, c]).unwrap();
    graph.add_witness_path(section, "B", &[x, y]).unwrap();
    let (kernel, tid) = make_kernel(graph);

    let before = kernel.store().snapshot(&tid).unwrap();
    assert_eq!(before.rank(x), Some(1));
    assert_eq!(before.rank(y), Some(2));

    // Relate x to b after ingestion, then recalculate from x.
    let mut edited = before.clone();
    edited.add_relation(x, b, "lexical", RelationScope::Local).unwrap();
    kernel.store().add_tradition(edited);
    let report = kernel.assign_ranks(&tid, x).unwrap();

    let after = kernel.store().snapshot(&tid).unwrap();
    assert_eq!(after.rank(x), Some(2));
    assert_eq!(after.rank(y), Some(3));
    assert_eq!(after.rank(c), Some(3));
    assert!(report.changes.contains_key(&x));
    assert!(report.changes.contains_key(&y));
}

#[test]
fn test_relation_lifts_cluster_to_partner_rank_exactly() {
    let mut graph = TraditionGraph::named("lift");
    let section = graph.add_section("s1");
    let a = graph.add_reading(section, NewReading::text("a")).unwrap();
    let b = graph.add_reading(section, NewReading::text("b")).unwrap();
    let c = graph.add_reading(section, NewReading::text("c")).unwrap();
    let d = graph.add_reading(section, NewReading::text("d")).unwrap();
    let x = graph.add_reading(section, NewReading::text("x")).unwrap();
    let y = graph.add_reading(section, NewReading::text("y")).unwrap();
    let z = graph.add_reading(section, NewReading::text("z")).unwrap();
    graph.add_witness_path(section, "A", &[a, b, c, d]).unwrap();
    graph.add_witness_path(section, "B", &[x, y]).unwrap();
    graph.add_witness_path(section, "C", &[z]).unwrap();
    graph.add_relation(y, c, "lexical", RelationScope::Local).unwrap();
    graph.add_relation(z, y, "spelling", RelationScope::Local).unwrap();
    let (kernel, tid) = make_kernel(graph);

    let snapshot = kernel.store().snapshot(&tid).unwrap();
    // c is forced to 3 by a, b; y and z join it there and no higher.
    assert_eq!(snapshot.rank(c), Some(3));
    assert_eq!(snapshot.rank(y), Some(3));
    assert_eq!(snapshot.rank(z), Some(3));
    assert_eq!(snapshot.rank(x), Some(1));
    assert_eq!(snapshot.rank(d), Some(4));
    assert_eq!(snapshot.rank(snapshot.section(section).unwrap().end), Some(5));
}

#[test]
fn test_rank_tradition_with_empty_section() {
    let mut graph = TraditionGraph::named("sparse");
    let s1 = graph.add_section("one");
    let s2 = graph.add_section("two");
    let a = graph.add_reading(s1, NewReading::text("a")).unwrap();
    graph.add_witness_path(s1, "A", &[a]).unwrap();
    let (kernel, tid) = make_kernel(graph);

    let reports = kernel.rank_tradition(&tid).unwrap();
    assert_eq!(reports.len(), 2);
    let snapshot = kernel.store().snapshot(&tid).unwrap();
    assert_eq!(snapshot.rank(a), Some(1));
    assert_eq!(snapshot.rank(snapshot.section(s2).unwrap().end), Some(0));

    let table = kernel.build_alignment(&tid, &SectionRange::all(), None).unwrap();
    assert_eq!(table.length, 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// ALIGNMENT TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_cat_sat_alignment() {
    let (graph, ids) = build_cat_graph();
    let (kernel, tid) = make_kernel(graph);

    let table = kernel
        .build_alignment(&tid, &SectionRange::single(ids.section), None)
        .unwrap();
    assert_eq!(table.length, 3);
    assert_eq!(table.num_rows(), 2);
    let a = table.row("A").unwrap();
    let b = table.row("B").unwrap();
    assert_eq!(a.tokens.len(), 3);
    assert_eq!(a.tokens[..2], b.tokens[..2]);
    assert_eq!(a.tokens[2].text(), Some("sat"));
    assert_eq!(b.tokens[2].text(), Some("sit"));

    let conflated = kernel
        .build_alignment(&tid, &SectionRange::single(ids.section), Some("spelling"))
        .unwrap();
    assert_eq!(conflated.row("A").unwrap().tokens, conflated.row("B").unwrap().tokens);
}

#[test]
fn test_range_order_error() {
    let (graph, [s1, _, s3]) = build_three_sections();
    let (kernel, tid) = make_kernel(graph);

    let err = kernel
        .build_alignment(&tid, &SectionRange::between(s3, s1), None)
        .unwrap_err();
    assert_eq!(err, CollationError::RangeOrder { start: s3, end: s1 });
    assert!(err
        .to_string()
        .starts_with("End section found before start section reached"));
}

#[test]
fn test_missing_range_boundary() {
    let (graph, [s1, _, _]) = build_three_sections();
    let (kernel, tid) = make_kernel(graph);

    let err = kernel
        .build_alignment(&tid, &SectionRange::between(s1, SectionId(4242)), None)
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Specified end section not found: 4242");
}

#[test]
fn test_multi_section_offsets() {
    let (graph, [s1, s2, s3]) = build_three_sections();
    let (kernel, tid) = make_kernel(graph);

    let table = kernel.build_alignment(&tid, &SectionRange::all(), None).unwrap();
    assert_eq!(table.length, 5);
    assert_eq!(
        table.row("A").unwrap().texts(),
        vec![Some("the"), Some("cat"), Some("sat"), Some("down"), Some(".")]
    );
    assert_eq!(
        table.row("B").unwrap().texts(),
        vec![Some("the"), Some("dog"), Some("sat"), None, Some(".")]
    );

    let middle = kernel
        .build_alignment(&tid, &SectionRange::between(s2, s3), None)
        .unwrap();
    assert_eq!(middle.length, 3);
    assert_eq!(middle.row("B").unwrap().texts(), vec![Some("sat"), None, Some(".")]);

    let first = kernel.build_alignment(&tid, &SectionRange::single(s1), None).unwrap();
    assert_eq!(first.length, 2);
}

#[test]
fn test_layer_rows_sorted_and_based() {
    let mut graph = TraditionGraph::named("corrections");
    let section = graph.add_section("s1");
    let the = graph.add_reading(section, NewReading::text("the")).unwrap();
    let cat = graph.add_reading(section, NewReading::text("cat")).unwrap();
    let sat = graph.add_reading(section, NewReading::text("sat")).unwrap();
    let sit = graph.add_reading(section, NewReading::text("sit")).unwrap();
    let end = graph.section(section).unwrap().end;
    graph.add_witness_path(section, "B", &[the, cat, sat]).unwrap();
    graph.add_witness_path(section, "A", &[the, cat, sit]).unwrap();
    graph.add_layer_path("B", "a.c.", &[cat, sit, end]).unwrap();
    graph.add_relation(sat, sit, "spelling", RelationScope::Local).unwrap();
    let (kernel, tid) = make_kernel(graph);

    let table = kernel.build_alignment(&tid, &SectionRange::all(), None).unwrap();
    assert_eq!(table.labels(), vec!["A", "B", "B (a.c.)"]);
    let corrected = table.row("B (a.c.)").unwrap();
    assert!(corrected.is_layer());
    assert_eq!(corrected.base.as_deref(), Some("B"));
    assert_eq!(corrected.texts(), vec![Some("the"), Some("cat"), Some("sit")]);

    let json = serde_json::to_value(&table).unwrap();
    assert_eq!(json["length"], 3);
    assert_eq!(json["alignment"][2]["base"], "B");
    assert!(json["alignment"][0].get("base").is_none());
}

#[test]
fn test_lacuna_gap_fill() {
    let mut graph = TraditionGraph::named("lacunose");
    let section = graph.add_section("s1");
    let words: Vec<ReadingId> = ["in", "the", "beginning", "was"]
        .iter()
        .map(|w| graph.add_reading(section, NewReading::text(*w)).unwrap())
        .collect();
    let gap = graph.add_reading(section, NewReading::lacuna()).unwrap();
    graph.add_witness_path(section, "A", &words).unwrap();
    graph.add_witness_path(section, "B", &[words[0], gap, words[3]]).unwrap();
    let (kernel, tid) = make_kernel(graph);

    let table = kernel.build_alignment(&tid, &SectionRange::all(), None).unwrap();
    let b = &table.row("B").unwrap().tokens;
    assert_eq!(b[0].text(), Some("in"));
    assert!(b[1].is_lacuna());
    assert!(b[2].is_lacuna());
    assert_eq!(b[3].text(), Some("was"));

    let json = serde_json::to_value(&table).unwrap();
    assert_eq!(json["alignment"][1]["tokens"][2]["is_lacuna"], true);
}

#[test]
fn test_lacuna_fill_disabled_by_config() {
    let mut graph = TraditionGraph::named("lacunose");
    let section = graph.add_section("s1");
    let a = graph.add_reading(section, NewReading::text("a")).unwrap();
    let b = graph.add_reading(section, NewReading::text("b")).unwrap();
    let c = graph.add_reading(section, NewReading::text("c")).unwrap();
    let gap = graph.add_reading(section, NewReading::lacuna()).unwrap();
    graph.add_witness_path(section, "A", &[a, b, c]).unwrap();
    graph.add_witness_path(section, "B", &[gap, c]).unwrap();

    let store = Arc::new(InMemoryGraphStore::new());
    let tid = store.add_tradition(graph);
    let config = KernelConfig {
        fill_lacuna_gaps: false,
        ..KernelConfig::default()
    };
    let kernel = VariantGraphKernel::with_config(store, config);
    kernel.rank_tradition(&tid).unwrap();

    let table = kernel.build_alignment(&tid, &SectionRange::all(), None).unwrap();
    let row = &table.row("B").unwrap().tokens;
    assert!(row[0].is_lacuna());
    assert!(row[1].is_absent());
}

// ─────────────────────────────────────────────────────────────────────────────
// NORMALIZATION TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_normalization_round_trip_leaves_base_graph() {
    let (graph, ids) = build_cat_graph();
    let (kernel, tid) = make_kernel(graph);
    let before = kernel.store().snapshot(&tid).unwrap().base_fingerprint();

    let map = kernel.build_normalization(&tid, ids.section, "spelling").unwrap();
    assert_eq!(map.get(ids.sat), map.get(ids.sit));

    let during = kernel.store().snapshot(&tid).unwrap();
    assert_eq!(during.base_fingerprint(), before);
    assert_eq!(during.num_shadow_edges(), 4);

    let removed = kernel.teardown_normalization(&tid, ids.section).unwrap();
    assert_eq!(removed, 4);
    let after = kernel.store().snapshot(&tid).unwrap();
    assert_eq!(after.num_shadow_edges(), 0);
    assert_eq!(after.base_fingerprint(), before);
}

#[test]
fn test_shadow_witnesses_are_union() {
    let (graph, ids) = build_cat_graph();
    let (kernel, tid) = make_kernel(graph);
    kernel.build_normalization(&tid, ids.section, "spelling").unwrap();

    let tx = kernel.store().begin(&tid).unwrap().unwrap();
    let rep = tx.outgoing_shadows(ids.section, ids.cat).unwrap();
    assert_eq!(rep.len(), 1);
    let into_end = tx.outgoing_shadows(ids.section, rep[0].target).unwrap();
    assert_eq!(into_end.len(), 1);
    assert_eq!(into_end[0].layers, WitnessLayers::single("witnesses", ["A", "B"]));
}

#[test]
fn test_leaked_shadow_edge_is_fatal_and_rolled_back() {
    let (graph, ids) = build_cat_graph();
    let (kernel, tid) = make_kernel(graph);
    kernel.build_normalization(&tid, ids.section, "spelling").unwrap();

    // Plant a shadow edge that is not reachable from the section start.
    let mut tx = kernel.store().begin(&tid).unwrap().unwrap();
    tx.merge_shadow_edge(ids.section, ids.sit, ids.sat, &WitnessLayers::single("witnesses", ["B"]))
        .unwrap();
    tx.commit().unwrap();

    let err = kernel.teardown_normalization(&tid, ids.section).unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("normalisation of section"));

    // The partial deletion was rolled back.
    let snapshot = kernel.store().snapshot(&tid).unwrap();
    assert_eq!(snapshot.num_shadow_edges(), 5);
}

#[test]
fn test_one_episode_per_section() {
    let (graph, ids) = build_cat_graph();
    let (kernel, tid) = make_kernel(graph);
    kernel.build_normalization(&tid, ids.section, "spelling").unwrap();

    let err = kernel.build_normalization(&tid, ids.section, "orthographic").unwrap_err();
    assert!(matches!(err, CollationError::NormalizationActive { .. }));

    kernel.teardown_normalization(&tid, ids.section).unwrap();
    kernel.build_normalization(&tid, ids.section, "orthographic").unwrap();
}

// ─────────────────────────────────────────────────────────────────────────────
// DETERMINISM AND CONCURRENCY TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_alignment_fingerprint_stable_100_runs() {
    let (graph, _) = build_three_sections();
    let (kernel, tid) = make_kernel(graph);

    let first = kernel.build_alignment(&tid, &SectionRange::all(), None).unwrap().fingerprint();
    for i in 1..100 {
        let table = kernel.build_alignment(&tid, &SectionRange::all(), None).unwrap();
        assert_eq!(table.fingerprint(), first, "Table fingerprint differs on run {}", i);
    }
}

#[test]
fn test_parallel_traditions() {
    init_tracing();
    let store = Arc::new(InMemoryGraphStore::new());
    let kernel = VariantGraphKernel::new(Arc::clone(&store));
    let traditions: Vec<(TraditionId, SectionId)> = (0..8)
        .map(|_| {
            let (graph, ids) = build_cat_graph();
            (store.add_tradition(graph), ids.section)
        })
        .collect();

    let tables: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = traditions
            .iter()
            .map(|(tid, section)| {
                let kernel = &kernel;
                scope.spawn(move || {
                    kernel.rank_section(tid, *section).unwrap();
                    kernel.build_normalization(tid, *section, "spelling").unwrap();
                    kernel.teardown_normalization(tid, *section).unwrap();
                    let table = kernel
                        .build_alignment(tid, &SectionRange::single(*section), Some("spelling"))
                        .unwrap();
                    table.row("A").unwrap().texts().iter().map(|t| t.unwrap_or("")).collect::<Vec<_>>().join(" ")
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(tables.len(), 8);
    assert!(tables.iter().all(|t| t == "the cat sat"));
}
