mod common;

use click_dashboard::{
    FilterSelection,
    data::Cell,
    export::to_csv_bytes,
    filter::RankRange,
    normalize,
};
use csv::ReaderBuilder;

use common::{Row, contestant_csv, example_csv};

#[test]
fn export_reproduces_every_column_with_rank_last() {
    let table = normalize(example_csv().as_bytes()).expect("normalize");
    let filtered = FilterSelection::default().apply(&table).expect("rows");
    let bytes = to_csv_bytes(&filtered).expect("export");

    let mut reader = ReaderBuilder::new().from_reader(bytes.as_slice());
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(headers.len(), table.headers().len());
    assert_eq!(headers.get(headers.len() - 1), Some("rank"));

    let rows = reader
        .records()
        .map(|r| r.expect("record"))
        .map(|r| (r[0].to_string(), r[r.len() - 1].to_string()))
        .collect::<Vec<_>>();
    assert_eq!(
        rows,
        vec![
            ("A".to_string(), "1".to_string()),
            ("B".to_string(), "1".to_string()),
            ("C".to_string(), "3".to_string()),
        ]
    );
}

#[test]
fn full_export_round_trips_rows_and_ranks() {
    let table = normalize(example_csv().as_bytes()).expect("normalize");
    let filtered = FilterSelection::default().apply(&table).expect("rows");
    let exported = to_csv_bytes(&filtered).expect("export");
    let reparsed = normalize(&exported).expect("re-ingest export");

    assert_eq!(reparsed.len(), table.len());
    for (original, again) in table.records().iter().zip(reparsed.records()) {
        assert_eq!(original.user_id, again.user_id);
        assert_eq!(original.num_clicks, again.num_clicks);
        assert_eq!(original.date_participated, again.date_participated);
        assert_eq!(original.rank, again.rank);
    }
}

#[test]
fn filtered_export_keeps_original_ranks() {
    let csv = contestant_csv(&[
        Row::new("A", "90", "2024-01-01", "F", "NY"),
        Row::new("B", "70", "2024-01-02", "M", "LA"),
        Row::new("C", "70", "2024-01-03", "F", "NY"),
        Row::new("D", "10", "2024-01-04", "M", "SF"),
    ]);
    let table = normalize(csv.as_bytes()).expect("normalize");
    let filtered = FilterSelection::default()
        .with_rank_range(RankRange::between(2, 4))
        .apply(&table)
        .expect("rows");
    let reparsed = normalize(&to_csv_bytes(&filtered).expect("export")).expect("re-ingest");

    // Re-read, the supplied rank keeps its name and the exported rank is
    // renamed beside it.
    let extra_names = reparsed.extra_names();
    assert_eq!(
        extra_names
            .iter()
            .filter(|n| n.starts_with("provided_rank"))
            .collect::<Vec<_>>(),
        vec!["provided_rank", "provided_rank_2"]
    );
    let exported_ranks = reparsed
        .records()
        .iter()
        .map(|r| (r.user_id.clone().unwrap(), reparsed.extra(r, "provided_rank_2")))
        .collect::<Vec<_>>();
    let rank = |value: &str| Cell::Text(value.into());
    assert_eq!(
        exported_ranks,
        vec![
            ("B".to_string(), Some(&rank("2"))),
            ("C".to_string(), Some(&rank("2"))),
            ("D".to_string(), Some(&rank("4"))),
        ]
    );
}

#[test]
fn export_is_utf8() {
    let csv = contestant_csv(&[Row {
        name: "Zoë Ångström",
        ..Row::new("A", "5", "2024-01-01", "F", "Malmö")
    }]);
    let table = normalize(csv.as_bytes()).expect("normalize");
    let filtered = FilterSelection::default().apply(&table).expect("rows");
    let text = String::from_utf8(to_csv_bytes(&filtered).expect("export")).expect("utf-8");
    assert!(text.contains("\"Zoë Ångström\""));
    assert!(text.contains("\"Malmö\""));
}
