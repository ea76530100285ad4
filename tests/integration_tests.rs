use financial_variance_analytics::*;
use std::collections::HashSet;

fn demo_store() -> anyhow::Result<RecordStore> {
    let mut store = RecordStore::new();
    load_demo_data(&mut store, 42)?;
    Ok(store)
}

fn fact(month: &str, market: &str, ledger: &str, actual: f64, plan: f64, forecast: f64) -> EnrichedFact {
    EnrichedFact::from(Fact::new(month, market, ledger, actual, plan, forecast))
}

#[test]
fn test_demo_scorecard_covers_every_market() -> anyhow::Result<()> {
    let store = demo_store()?;
    let facts = store.all_facts();

    let rows = scorecard(&facts, "2024-12")?;
    assert_eq!(rows.len(), 5);
    for pair in rows.windows(2) {
        assert!(pair[0].actual <= pair[1].actual);
    }

    let json = serde_json::to_value(&rows[0])?;
    let columns: HashSet<&str> = json
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(
        columns,
        HashSet::from(["market", "actual", "plan", "forecast", "vs_plan", "vs_forecast"])
    );
    Ok(())
}

#[test]
fn test_scorecard_totals_match_raw_facts() -> anyhow::Result<()> {
    let store = demo_store()?;
    let facts = store.facts_for_month("2024-09");

    let rows = scorecard(&store.all_facts(), "2024-09")?;
    for row in &rows {
        let expected: f64 = facts
            .iter()
            .filter(|f| f.market == row.market)
            .map(|f| f.actual)
            .sum();
        assert!((row.actual - expected).abs() < 1e-6);
    }
    Ok(())
}

#[test]
fn test_demo_mom_and_top_movers() -> anyhow::Result<()> {
    let store = demo_store()?;
    let facts = store.all_facts();

    let mom = month_over_month_delta(&facts, "2024-12", "2024-11", None)?;
    assert_eq!(mom.len(), 14);
    for pair in mom.windows(2) {
        assert!(pair[0].change <= pair[1].change);
    }
    for row in &mom {
        let expected = variance(row.actual_current, row.actual_previous);
        assert_eq!(row.change, expected.delta);
        assert_eq!(row.pct_change, expected.percent);
    }

    let europe = month_over_month_delta(&facts, "2024-12", "2024-11", Some("Europe"))?;
    assert_eq!(europe.len(), 14);

    let movers = top_movers(&facts, "2024-12", "2024-11", 5)?;
    assert_eq!(movers.gainers.len(), 5);
    assert_eq!(movers.decliners.len(), 5);
    assert!(movers.gainers[0].change >= movers.gainers[4].change);
    assert!(movers.decliners[0].change <= movers.decliners[4].change);
    assert!(movers.gainers[0].key.contains(" | "));
    Ok(())
}

#[test]
fn test_mom_delta_revenue_example() -> anyhow::Result<()> {
    let facts = vec![
        fact("2024-08", "Europe", "Revenue", 1100.0, 0.0, 0.0),
        fact("2024-07", "Europe", "Revenue", 1000.0, 0.0, 0.0),
    ];

    let rows = month_over_month_delta(&facts, "2024-08", "2024-07", None)?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].change, 100.0);
    assert!((rows[0].pct_change - 10.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_demo_pareto_series() -> anyhow::Result<()> {
    let store = demo_store()?;
    let facts = store.all_facts();

    let analysis = pareto(&facts, "2024-10", Baseline::Plan)?;
    assert_eq!(analysis.contributor_count, 70);
    assert_eq!(analysis.rows.len(), 20);

    for pair in analysis.rows.windows(2) {
        assert!(pair[0].abs_variance >= pair[1].abs_variance);
        assert!(pair[0].cumulative_pct <= pair[1].cumulative_pct);
    }
    assert!(analysis.rows.last().unwrap().cumulative_pct < 100.0);

    let full = pareto_with_limit(&facts, "2024-10", Baseline::Plan, usize::MAX)?;
    assert_eq!(full.rows.len(), 70);
    assert!((full.rows.last().unwrap().cumulative_pct - 100.0).abs() < 1e-9);
    assert_eq!(&full.rows[..20], &analysis.rows[..]);
    Ok(())
}

#[test]
fn test_demo_variance_by_bucket_and_trends() -> anyhow::Result<()> {
    let store = demo_store()?;
    let facts = store.all_facts();

    let groups = variance_by_group(&facts, "2024-07", None)?;
    assert_eq!(groups.group_by, GroupColumn::Bucket);
    let names: HashSet<&str> = groups.rows.iter().map(|r| r.group.as_str()).collect();
    assert_eq!(names.len(), 8);
    assert!(names.contains("Revenue"));
    assert!(!names.contains(UNMAPPED_LABEL));

    let trend = trend_series(&facts, Some("Asia Pacific"), Measure::Forecast);
    assert_eq!(trend.series_by, Dimension::Bucket);
    assert_eq!(trend.points.len(), 6 * 8);

    let totals = totals_trend(&facts);
    let months: Vec<&str> = totals.iter().map(|r| r.month_tag.as_str()).collect();
    assert_eq!(months, demo::DEMO_MONTHS.to_vec());
    Ok(())
}

#[test]
fn test_unmapped_ledger_still_surfaces() -> anyhow::Result<()> {
    let mut store = demo_store()?;
    let mut rows = store.facts_for_month("2024-12");
    let mut facts: Vec<Fact> = rows
        .drain(..)
        .map(|f| Fact::new(f.month_tag, f.market, f.ledger, f.actual, f.plan, f.forecast))
        .collect();
    facts.push(Fact::new("2024-12", "Europe", "Suspense Account", 500.0, 0.0, 0.0));
    store.replace_month("2024-12", facts)?;

    let all = store.all_facts();
    let groups = variance_by_group(&all, "2024-12", Some(GroupColumn::Bucket))?;
    let unmapped = groups
        .rows
        .iter()
        .find(|r| r.group == UNMAPPED_LABEL)
        .expect("unmapped group present");
    assert_eq!(unmapped.actual, 500.0);

    let trend = trend_series(&all, Some("Europe"), Measure::Actual);
    assert!(trend.points.iter().any(|p| p.series == UNMAPPED_LABEL));
    Ok(())
}

#[test]
fn test_action_plan_threshold_examples() -> anyhow::Result<()> {
    let facts = vec![
        fact("2024-07", "Europe", "Four Percent", 104.0, 100.0, 0.0),
        fact("2024-07", "Europe", "Six Percent", 106.0, 100.0, 0.0),
    ];

    let plan = action_plan(&facts, "2024-07", 5.0)?;
    assert_eq!(plan.items.len(), 1);
    assert_eq!(plan.items[0].ledger, "Six Percent");
    assert_eq!(plan.items[0].priority, Priority::Low);

    let json = serde_json::to_value(&plan.items[0])?;
    assert_eq!(json["variance_pct"], 6.0);
    assert_eq!(json["status"], "Favorable");
    Ok(())
}

#[test]
fn test_demo_action_plan_via_analyzer() -> anyhow::Result<()> {
    let store = demo_store()?;
    let config = AnalyticsConfig::default();
    let analyzer = VarianceAnalyzer::new(&store, &config);

    let plan = analyzer.action_plan("2024-12", None)?;
    assert!(plan.items.len() <= 20);
    for item in &plan.items {
        assert!(item.variance_pct.abs() > 5.0);
        let (status, priority) = classify(item.variance, item.variance_pct);
        assert_eq!(item.status, status);
        assert_eq!(item.priority, priority);
    }
    for pair in plan.items.windows(2) {
        assert!(pair[0].variance <= pair[1].variance);
    }

    let counts = plan.priority_counts();
    assert_eq!(counts.high + counts.medium + counts.low, plan.items.len());

    let csv = plan.to_csv()?;
    assert_eq!(csv.lines().count(), plan.items.len() + 1);

    let strict = analyzer.action_plan("2024-12", Some(1000.0))?;
    assert!(strict.is_empty());
    Ok(())
}

#[test]
fn test_invalid_parameters_are_rejected() -> anyhow::Result<()> {
    let store = demo_store()?;
    let facts = store.all_facts();

    assert!(matches!(
        scorecard(&facts, "2023-01"),
        Err(VarianceAnalyticsError::UnknownMonth(_))
    ));
    assert!(matches!(
        top_movers(&facts, "2024-12", "2024-11", 0),
        Err(VarianceAnalyticsError::InvalidTopN(0))
    ));
    assert!(matches!(
        action_plan(&facts, "2024-12", -1.0),
        Err(VarianceAnalyticsError::InvalidThreshold(_))
    ));
    assert!(matches!(
        month_over_month_delta(&facts, "2024-12", "1999-12", None),
        Err(VarianceAnalyticsError::UnknownMonth(_))
    ));
    Ok(())
}

#[test]
fn test_empty_store_yields_empty_views() -> anyhow::Result<()> {
    let store = RecordStore::new();
    let facts = store.all_facts();

    assert!(scorecard(&facts, "2024-01")?.is_empty());
    assert!(month_over_month_delta(&facts, "2024-02", "2024-01", None)?.is_empty());
    assert!(top_movers(&facts, "2024-02", "2024-01", 3)?.gainers.is_empty());
    assert!(pareto(&facts, "2024-01", Baseline::Forecast)?.rows.is_empty());
    assert!(variance_by_group(&facts, "2024-01", None)?.rows.is_empty());
    assert!(trend_series(&facts, None, Measure::Actual).points.is_empty());
    assert!(totals_trend(&facts).is_empty());
    assert!(action_plan(&facts, "2024-01", 5.0)?.is_empty());
    assert!(latest_summary(&facts)?.is_none());
    Ok(())
}

#[test]
fn test_views_do_not_depend_on_row_order() -> anyhow::Result<()> {
    let store = demo_store()?;
    let facts = store.all_facts();
    let mut reversed = facts.clone();
    reversed.reverse();

    let forward = totals_trend(&facts);
    let backward = totals_trend(&reversed);
    for (a, b) in forward.iter().zip(backward.iter()) {
        assert_eq!(a.month_tag, b.month_tag);
        assert!((a.actual - b.actual).abs() < 1e-6);
        assert!((a.plan - b.plan).abs() < 1e-6);
    }

    assert_eq!(
        action_plan(&facts, "2024-08", 5.0)?,
        action_plan(&facts, "2024-08", 5.0)?
    );
    Ok(())
}

#[test]
fn test_csv_upload_round_trip_through_store() -> anyhow::Result<()> {
    let mut store = RecordStore::new();
    store.save_column_mapping(ColumnMapping::new("Region", "Account", "Act", "Bud", "Fcst"));

    let upload = "Region,Account,Act,Bud,Fcst\n\
                  Europe,Revenue,1100,1000,1050\n\
                  Europe,Rent,-90,-100,-95\n";
    let rows = read_csv_rows(upload.as_bytes())?;
    assert_eq!(store.ingest_month("2024-08", &rows)?, 2);

    let mapping_upload = "ledger,bucket,driver,controllable\nRevenue,Revenue,Volume,true\n";
    let mappings = ledger_mappings_from_rows(&read_csv_rows(mapping_upload.as_bytes())?)?;
    store.replace_ledger_mappings(mappings)?;

    let facts = store.all_facts();
    let rent = facts.iter().find(|f| f.ledger == "Rent").unwrap();
    assert_eq!(rent.bucket, None);

    let v = variance(rent.actual, rent.plan);
    assert_eq!(v.delta, 10.0);
    assert!((v.percent - 10.0).abs() < 1e-9);

    let summary = latest_summary(&facts)?.unwrap();
    assert_eq!(summary.market_count, 1);
    assert!((summary.variance - 110.0).abs() < 1e-9);
    Ok(())
}
