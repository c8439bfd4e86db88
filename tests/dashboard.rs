use std::path::Path;

use chrono::NaiveDate;

use portfolio_panel::data::filter::{self, ColumnFilter};
use portfolio_panel::data::model::{CellValue, ColumnKind};
use portfolio_panel::format::{format_currency, format_signed_percent};
use portfolio_panel::{DashboardConfig, Pipeline};

const POSITIONS: &str = "\
Carteira,Status,Posição,Valor aportado,Rentabilidade,Cliente,Entrada
Dividendos,Ativa,1000,900,11.11,1,05/01/2024
Dividendos,Pausada,2000,2100,-4.76,2,20/01/2024
Small Caps,Ativa,1500000,1000000,50,1,10/02/2024
Small Caps,Ativa,500,1000,-50,3,15/03/2024
";

fn pipeline_over(dir: &Path) -> Pipeline {
    std::fs::write(dir.join("carteiras.csv"), POSITIONS).unwrap();
    Pipeline::new(DashboardConfig {
        data_dir: dir.to_path_buf(),
        rescan_secs: 0,
        ..DashboardConfig::default()
    })
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_default_selection_shows_the_whole_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = pipeline_over(dir.path());

    let (_, dataset) = pipeline.dataset().unwrap();
    assert_eq!(dataset.kind("Entrada"), Some(ColumnKind::Temporal));
    assert_eq!(dataset.kind("Carteira"), Some(ColumnKind::Categorical));
    assert_eq!(dataset.kind("Posição"), Some(ColumnKind::Numeric));

    let selection = pipeline.default_selection(&dataset);
    assert!(matches!(selection.get("Carteira"), Some(ColumnFilter::Values(v)) if v.len() == 2));
    assert_eq!(
        selection.get("Entrada"),
        Some(&ColumnFilter::DateRange {
            start: date(2024, 1, 5),
            end: date(2024, 3, 15),
            include_missing: true,
        })
    );

    let snapshot = pipeline.run(&selection).unwrap();
    assert_eq!(snapshot.indices.len(), 4);

    let kpis = &snapshot.kpis;
    assert_eq!(kpis.total_position, 1_503_500.0);
    assert_eq!(kpis.total_contributed, 1_004_000.0);
    assert!((kpis.mean_return - 1.5875).abs() < 1e-9);
    assert_eq!(format_currency(kpis.total_position), "R$ 1,50 M");
    assert_eq!(format_currency(kpis.result), "R$ 499,5 K");

    let breakdown = snapshot.breakdown.as_ref().unwrap();
    let names: Vec<String> = breakdown.iter().map(|b| b.category.to_string()).collect();
    assert_eq!(names, ["Dividendos", "Small Caps"]);
    let summed: f64 = breakdown.iter().map(|b| b.position).sum();
    assert_eq!(summed, kpis.total_position);

    let monthly = snapshot.monthly.as_ref().unwrap();
    let months: Vec<NaiveDate> = monthly.iter().map(|m| m.month).collect();
    assert_eq!(months, [date(2024, 1, 1), date(2024, 2, 1), date(2024, 3, 1)]);
    assert_eq!(monthly[0].contributed, 3_000.0);
    assert_eq!(monthly[0].count, 2);

    let ranking = snapshot.ranking.as_ref().unwrap();
    assert_eq!(ranking[0].category, CellValue::String("Dividendos".into()));
    assert!((ranking[0].mean_return - 3.175).abs() < 1e-9);
    assert_eq!(format_signed_percent(ranking[1].mean_return, 1), "+0,0%");
    assert_eq!(ranking[0].clients, 2);

    assert_eq!(snapshot.clients, Some(3));
}

#[test]
fn test_category_and_date_filters_intersect() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = pipeline_over(dir.path());
    let (_, dataset) = pipeline.dataset().unwrap();

    let mut selection = pipeline.default_selection(&dataset);
    filter::toggle_value(
        &mut selection,
        "Carteira",
        &CellValue::String("Small Caps".into()),
    );
    let dividends_only = pipeline.run(&selection).unwrap();
    assert_eq!(dividends_only.indices, [0, 1]);

    filter::set_date_range(&mut selection, "Entrada", date(2024, 1, 31), date(2024, 1, 10));
    let snapshot = pipeline.run(&selection).unwrap();
    assert_eq!(snapshot.indices, [1]);
    assert_eq!(snapshot.kpis.rows, 1);
    assert_eq!(snapshot.kpis.total_position, 2_000.0);

    filter::select_none(&mut selection, "Status");
    let empty = pipeline.run(&selection).unwrap();
    assert!(empty.indices.is_empty());
    assert_eq!(empty.kpis.total_position, 0.0);
    assert_eq!(empty.kpis.mean_return, 0.0);
    assert!(empty.breakdown.as_ref().unwrap().is_empty());
    assert_eq!(pipeline.cache().loads(), 1);
}

#[test]
fn test_blank_dates_survive_the_default_selection() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("carteiras.csv"),
        "Carteira,Posição,Próximo execução\n\
         Dividendos,100,05/06/2024 09:00\n\
         Small Caps,200,\n\
         Dividendos,300,\n",
    )
    .unwrap();
    let mut pipeline = Pipeline::new(DashboardConfig {
        data_dir: dir.path().to_path_buf(),
        rescan_secs: 0,
        ..DashboardConfig::default()
    });
    let (_, dataset) = pipeline.dataset().unwrap();
    assert_eq!(dataset.kind("Próximo execução"), Some(ColumnKind::Temporal));

    let mut selection = pipeline.default_selection(&dataset);
    let everything = pipeline.run(&selection).unwrap();
    assert_eq!(everything.indices, [0, 1, 2]);
    assert_eq!(everything.kpis.total_position, 600.0);

    filter::set_date_range(&mut selection, "Próximo execução", date(2024, 6, 1), date(2024, 6, 30));
    let dated = pipeline.run(&selection).unwrap();
    assert_eq!(dated.indices, [0]);
}
