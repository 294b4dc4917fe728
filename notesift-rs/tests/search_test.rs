//! Library-level search tests against an on-disk vault.

use notesift::search::{
    CancelToken, Facet, GlobalQueryTargets, LineRef, SearchMode, SearchOptions, SortOrder,
    evaluate, evaluate_with_cancel, parse_query,
};
use notesift::{QueryBuilder, Vault, VaultError};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn setup_vault(files: &[(&str, &str)]) -> (TempDir, Vault) {
    let dir = TempDir::new().unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }
    let vault = Vault::new(dir.path()).unwrap();
    (dir, vault)
}

fn by_path() -> SearchOptions {
    SearchOptions {
        sort: SortOrder::PathAsc,
        ..Default::default()
    }
}

fn paths(outcome: &notesift::SearchOutcome) -> Vec<String> {
    outcome
        .results
        .iter()
        .map(|r| r.document.path_str())
        .collect()
}

#[test]
fn test_four_note_vault() {
    let (_dir, vault) = setup_vault(&[
        ("A bob.md", "hello bob"),
        ("B.md", "Mary says good"),
        ("C.md", "alpha #project"),
        ("D.md", "---\nstatus: done\n---\n"),
    ]);

    let query = parse_query("tag:project alpha").unwrap().build().unwrap();
    let outcome = evaluate(&vault, &query, &by_path()).unwrap();
    assert_eq!(paths(&outcome), vec!["C.md"]);

    let query = parse_query("prop:status=done").unwrap().build().unwrap();
    let outcome = evaluate(&vault, &query, &by_path()).unwrap();
    assert_eq!(paths(&outcome), vec!["D.md"]);

    let query = parse_query("bob").unwrap().build().unwrap();
    let outcome = evaluate(&vault, &query, &by_path()).unwrap();
    assert_eq!(paths(&outcome), vec!["A bob.md"]);
    let global = outcome.results[0].global.as_ref().unwrap();
    assert!(global.facets.contains(&Facet::Name));
    assert!(global.facets.contains(&Facet::Body));
}

#[test]
fn test_line_filter_reports_lines() {
    let (_dir, vault) = setup_vault(&[(
        "tasks.md",
        "- urgent call\n- todo later\n- TODO urgent fix\n",
    )]);

    let query = QueryBuilder::new()
        .with_line_term("todo")
        .with_line_term("urgent")
        .build()
        .unwrap();
    let outcome = evaluate(&vault, &query, &by_path()).unwrap();

    let result = &outcome.results[0];
    assert_eq!(result.line_hits, vec![2]);
    assert_eq!(result.stats.line, Some(1));
    assert_eq!(result.excerpts[0].line, LineRef::Real(2));
    assert_eq!(result.excerpts[0].text, "- TODO urgent fix");
}

#[test]
fn test_case_sensitive_filters() {
    let (_dir, vault) = setup_vault(&[("a.md", "Alpha"), ("b.md", "alpha")]);

    let query = parse_query("content:Alpha")
        .unwrap()
        .case_sensitive(true)
        .build()
        .unwrap();
    let options = SearchOptions {
        case_sensitive: true,
        ..by_path()
    };
    assert_eq!(paths(&evaluate(&vault, &query, &options).unwrap()), vec!["a.md"]);

    let query = parse_query("content:Alpha").unwrap().build().unwrap();
    assert_eq!(
        paths(&evaluate(&vault, &query, &by_path()).unwrap()),
        vec!["a.md", "b.md"]
    );
}

#[test]
fn test_heading_filter_and_fuzzy_mode() {
    let (_dir, vault) = setup_vault(&[
        ("notes/meeting.md", "# Weekly Sync\nagenda"),
        ("notes/other.md", "# Retro\nnothing"),
    ]);

    let query = parse_query("heading:sync").unwrap().build().unwrap();
    let outcome = evaluate(&vault, &query, &by_path()).unwrap();
    assert_eq!(paths(&outcome), vec!["notes/meeting.md"]);
    assert_eq!(outcome.results[0].excerpts[0].line, LineRef::Real(0));

    let fuzzy = SearchOptions {
        mode: SearchMode::Fuzzy,
        targets: GlobalQueryTargets::only(Facet::Headings),
        ..by_path()
    };
    let query = parse_query("wkly").unwrap().build().unwrap();
    let outcome = evaluate(&vault, &query, &fuzzy).unwrap();
    assert_eq!(paths(&outcome), vec!["notes/meeting.md"]);
    assert!(outcome.results[0].global.as_ref().unwrap().fuzzy_score.is_some());
}

#[test]
fn test_parallel_vault_search() {
    let files: Vec<(String, String)> = (0..150)
        .map(|i| {
            let body = if i % 5 == 0 { "needle here" } else { "hay" };
            (format!("n{:03}.md", i), body.to_string())
        })
        .collect();
    let refs: Vec<(&str, &str)> = files.iter().map(|(p, b)| (p.as_str(), b.as_str())).collect();
    let (_dir, vault) = setup_vault(&refs);

    let query = parse_query("content:needle").unwrap().build().unwrap();
    let sequential = evaluate(&vault, &query, &by_path()).unwrap();
    let parallel = evaluate(
        &vault,
        &query,
        &SearchOptions {
            parallel: true,
            ..by_path()
        },
    )
    .unwrap();

    assert_eq!(sequential.summary.accepted_count, 30);
    assert_eq!(paths(&sequential), paths(&parallel));
}

#[test]
fn test_cancelled_search() {
    let (_dir, vault) = setup_vault(&[("a.md", "x")]);
    let query = parse_query("x").unwrap().build().unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();

    let outcome = evaluate_with_cancel(&vault, &query, &by_path(), &cancel).unwrap();
    assert!(outcome.summary.cancelled);
    assert_eq!(outcome.summary.scanned, 0);
}

#[test]
fn test_empty_query() {
    let (_dir, vault) = setup_vault(&[("a.md", "x")]);
    let result = parse_query("").unwrap().build();
    assert!(matches!(result, Err(VaultError::EmptyQuery)));

    let unbuilt = parse_query("").unwrap().finish();
    assert!(matches!(
        evaluate(&vault, &unbuilt, &by_path()),
        Err(VaultError::EmptyQuery)
    ));
}
