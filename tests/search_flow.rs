mod common;

use common::{shakespeare_scenario, Fixture, Seed};
use gutensearch::{
    CancelToken, OrderField, OutputSchema, SearchError, SearchMode, SearchSpec, SortDirection,
};
use std::collections::HashSet;

#[test]
fn exact_search_pages_add_up() -> anyhow::Result<()> {
    let fixture = shakespeare_scenario();
    let service = fixture.service();

    let page1 = SearchSpec::new()
        .search("Shakespeare", SearchMode::Exact)?
        .page(1, 28)?;
    let result1 = service.fetch(&page1)?;
    assert_eq!(result1.total, 30);
    assert_eq!(result1.total_pages, 2);
    assert_eq!(result1.items.len(), 28);

    let result2 = service.fetch(&page1.clone().page(2, 28)?)?;
    assert_eq!(result2.items.len(), 2);

    let mut seen: HashSet<i64> = HashSet::new();
    for row in result1.items.iter().chain(result2.items.iter()) {
        assert!(seen.insert(row.book_id), "duplicate id {}", row.book_id);
    }
    assert_eq!(seen.len(), 30);
    Ok(())
}

#[test]
fn reexecuting_a_spec_is_deterministic() -> anyhow::Result<()> {
    let fixture = shakespeare_scenario();
    let service = fixture.service();
    let spec = SearchSpec::new()
        .search("Shakespeare", SearchMode::Exact)?
        .page(1, 28)?;
    let ids = |spec: &SearchSpec| -> anyhow::Result<Vec<i64>> {
        Ok(service.fetch(spec)?.items.iter().map(|r| r.book_id).collect())
    };
    assert_eq!(ids(&spec)?, ids(&spec)?);
    Ok(())
}

#[test]
fn fuzzy_search_tolerates_typos() -> anyhow::Result<()> {
    let fixture = shakespeare_scenario();
    let service = fixture.service();
    let spec = SearchSpec::new().search("Shakspeare", SearchMode::Fuzzy)?;
    let result = service.fetch(&spec)?;
    assert_eq!(result.total, 30);
    // Similarity ties broken by popularity, so the most downloaded comes first.
    assert_eq!(result.items[0].book_id, 1);
    Ok(())
}

#[test]
fn exact_search_misses_typos_that_fuzzy_catches() -> anyhow::Result<()> {
    let fixture = shakespeare_scenario();
    let service = fixture.service();
    let spec = SearchSpec::new().search("Shakspeare", SearchMode::Exact)?;
    assert_eq!(service.count(&spec)?, 0);
    Ok(())
}

#[test]
fn boolean_operators_run_end_to_end() -> anyhow::Result<()> {
    let fixture = shakespeare_scenario();
    let service = fixture.service();

    let or_spec = SearchSpec::new().search("shakespeare or botany", SearchMode::Exact)?;
    assert_eq!(service.count(&or_spec)?, 50);

    let not_spec = SearchSpec::new().search("treatise -botany", SearchMode::Exact)?;
    assert_eq!(service.count(&not_spec)?, 0);

    let phrase_spec = SearchSpec::new().search("\"plays of shakespeare\"", SearchMode::Exact)?;
    assert_eq!(service.count(&phrase_spec)?, 30);
    Ok(())
}

#[test]
fn stemming_matches_inflected_forms() -> anyhow::Result<()> {
    let fixture = shakespeare_scenario();
    let service = fixture.service();
    // "play" stems to the same token as "plays" in the titles.
    let spec = SearchSpec::new().search("play", SearchMode::Exact)?;
    assert_eq!(service.count(&spec)?, 30);
    Ok(())
}

#[test]
fn filters_compose_with_and_semantics() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    let mut english = Seed::new(1, "Faust", "Goethe, Johann Wolfgang von");
    english.langs = vec!["en"];
    english.downloads = 700;
    fixture.add(&english);
    let mut german = Seed::new(2, "Faust: Der Tragödie erster Teil", "Goethe, Johann Wolfgang von");
    german.langs = vec!["de"];
    german.downloads = 300;
    german.copyrighted = true;
    fixture.add(&german);
    let service = fixture.service();

    let spec = SearchSpec::new().lang("de")?;
    assert_eq!(service.count(&spec)?, 1);

    let spec = SearchSpec::new().lang("de")?.public_domain();
    assert_eq!(service.count(&spec)?, 0);

    let spec = SearchSpec::new().downloads_gte(500)?;
    let result = service.fetch(&spec)?;
    assert_eq!(result.total, 1);
    assert_eq!(result.items[0].book_id, 1);
    Ok(())
}

#[test]
fn release_date_and_author_year_ranges() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    let mut old = Seed::new(1, "Iliad", "Homer");
    old.release_date = "1998-03-01".to_string();
    old.author_birthyear = Some(-800);
    fixture.add(&old);
    let mut recent = Seed::new(2, "Ulysses", "Joyce, James");
    recent.release_date = "2003-07-01".to_string();
    recent.author_birthyear = Some(1882);
    recent.author_deathyear = Some(1941);
    fixture.add(&recent);
    let service = fixture.service();

    assert_eq!(service.count(&SearchSpec::new().released_after("2000-01-01")?)?, 1);
    assert_eq!(service.count(&SearchSpec::new().released_before("2000-01-01")?)?, 1);
    assert_eq!(service.count(&SearchSpec::new().author_born_after(1800)?)?, 1);
    assert_eq!(service.count(&SearchSpec::new().author_died_before(1950)?)?, 1);
    assert_eq!(service.count(&SearchSpec::new().author_born_before(0)?)?, 1);
    assert_eq!(service.count(&SearchSpec::new().author_died_after(1900)?)?, 1);
    assert_eq!(service.count(&SearchSpec::new().downloads_lte(0)?)?, 2);
    Ok(())
}

#[test]
fn identity_role_and_media_type_filters() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    let mut edited = Seed::new(1, "Grimm's Fairy Tales", "Grimm, Jacob");
    edited.creators.push((55, "Taylor, Edgar".to_string(), "Editor".to_string()));
    edited.formats = vec![(
        "/ebooks/1.epub3.images".to_string(),
        "epub3.images".to_string(),
        "EPUB3".to_string(),
        "application/epub+zip".to_string(),
        1024,
    )];
    fixture.add(&edited);
    let mut plain = Seed::new(2, "Anderson's Fairy Tales", "Andersen, H. C.");
    plain.formats = vec![(
        "/files/2/2.txt".to_string(),
        "txt".to_string(),
        "Plain Text".to_string(),
        "text/plain".to_string(),
        512,
    )];
    fixture.add(&plain);
    let service = fixture.service();

    let result = service.fetch(&SearchSpec::new().book_id(2)?)?;
    assert_eq!(result.total, 1);
    assert_eq!(result.items[0].book_id, 2);

    assert_eq!(service.count(&SearchSpec::new().contributor_role("Editor")?)?, 1);
    assert_eq!(service.count(&SearchSpec::new().media_type("application/epub+zip")?)?, 1);
    assert_eq!(service.count(&SearchSpec::new().media_type("text/plain")?)?, 1);
    assert_eq!(service.count(&SearchSpec::new().media_type("audio/mpeg")?)?, 0);
    Ok(())
}

#[test]
fn title_order_and_direction() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    fixture.add(&Seed::new(1, "Zuleika Dobson", "Beerbohm, Max"));
    fixture.add(&Seed::new(2, "Aesop's Fables", "Aesop"));
    fixture.add(&Seed::new(3, "Middlemarch", "Eliot, George"));
    let service = fixture.service();

    let asc = service.fetch(&SearchSpec::new().order_by(OrderField::Title, None))?;
    let titles: Vec<_> = asc.items.iter().filter_map(|r| r.title.clone()).collect();
    assert_eq!(titles, vec!["Aesop's Fables", "Middlemarch", "Zuleika Dobson"]);

    let desc = service.fetch(
        &SearchSpec::new().order_by(OrderField::Title, Some(SortDirection::Desc)),
    )?;
    assert_eq!(desc.items[0].title.as_deref(), Some("Zuleika Dobson"));
    Ok(())
}

#[test]
fn random_order_covers_every_row_without_duplicates() -> anyhow::Result<()> {
    let fixture = shakespeare_scenario();
    let service = fixture.service();
    let spec = SearchSpec::new().order_by(OrderField::Random, None);

    let first = service.fetch(&spec.clone().page(1, 28)?)?;
    assert_eq!(first.total, 50);
    assert_eq!(first.total_pages, 2);

    let mut seen: HashSet<i64> = HashSet::new();
    for page in 1..=first.total_pages {
        let result = service.fetch(&spec.clone().page(page, 28)?)?;
        for row in &result.items {
            assert!(seen.insert(row.book_id), "duplicate id {}", row.book_id);
        }
    }
    assert_eq!(seen.len(), 50);

    // Same pivot, same shuffle.
    let again = service.fetch(&spec.clone().page(1, 28)?)?;
    let first_ids: Vec<i64> = first.items.iter().map(|r| r.book_id).collect();
    let again_ids: Vec<i64> = again.items.iter().map(|r| r.book_id).collect();
    assert_eq!(first_ids, again_ids);
    Ok(())
}

#[test]
fn empty_result_is_success_not_error() -> anyhow::Result<()> {
    let fixture = shakespeare_scenario();
    let service = fixture.service();
    let spec = SearchSpec::new().search("xylophone", SearchMode::Exact)?;
    let result = service.fetch(&spec)?;
    assert_eq!(result.total, 0);
    assert_eq!(result.total_pages, 0);
    assert!(result.items.is_empty());
    Ok(())
}

#[test]
fn past_the_end_page_is_empty_with_correct_totals() -> anyhow::Result<()> {
    let fixture = shakespeare_scenario();
    let service = fixture.service();
    let spec = SearchSpec::new()
        .search("Shakespeare", SearchMode::Exact)?
        .page(5, 28)?;
    let result = service.fetch(&spec)?;
    assert_eq!(result.total, 30);
    assert!(result.items.is_empty());
    Ok(())
}

#[test]
fn cancelled_token_interrupts_execution() -> anyhow::Result<()> {
    let fixture = shakespeare_scenario();
    let service = fixture.service();
    // A recursive-CTE predicate keeps the statement busy long enough for
    // the watchdog to land its interrupt.
    let spec = SearchSpec::new().raw(
        "(SELECT count(*) FROM (WITH RECURSIVE c(x) AS (VALUES(1) \
          UNION ALL SELECT x+1 FROM c WHERE x < 50000000) SELECT x FROM c)) >= 0",
        vec![],
    )?;
    let token = CancelToken::new();
    token.cancel();
    let err = service.fetch_with(&spec, Some(token)).unwrap_err();
    assert!(matches!(err, SearchError::Interrupted { .. }), "got {err:?}");
    Ok(())
}

#[test]
fn schema_execution_shapes_rows() -> anyhow::Result<()> {
    let fixture = shakespeare_scenario();
    let service = fixture.service();
    let spec = SearchSpec::new()
        .search("Shakespeare", SearchMode::Exact)?
        .page(1, 3)?;

    let minis = service.execute(&spec, &OutputSchema::Mini)?;
    let fulls = service.execute(&spec, &OutputSchema::Full)?;
    assert_eq!(minis.items.len(), 3);
    for (mini, full) in minis.items.iter().zip(fulls.items.iter()) {
        assert_eq!(mini["id"], full["book_id"]);
        assert_eq!(mini["title"], full["title"]);
        assert_eq!(mini["author"], full["author"]);
        assert_eq!(mini["downloads"], full["downloads"]);
    }
    Ok(())
}

#[test]
fn misaligned_row_surfaces_a_format_error() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    fixture.add(&Seed::new(7, "Broken Row", "Nobody"));
    fixture
        .conn()
        .execute("UPDATE books SET creator_names = '[\"Nobody\", \"Extra\"]' WHERE book_id = 7", [])?;
    let service = fixture.service();
    let err = service.fetch(&SearchSpec::new()).unwrap_err();
    match err {
        SearchError::Format { book_id, family, .. } => {
            assert_eq!(book_id, 7);
            assert_eq!(family, "creator");
        }
        other => panic!("expected Format error, got {other:?}"),
    }
    Ok(())
}
