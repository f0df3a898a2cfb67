use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parquet::data_type::{ByteArray, ByteArrayType, DoubleType, Int64Type};
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::parser::parse_message_type;
use rusqlite::Connection;

use vaep_scout::parquet_import::{import_actions, read_actions};
use vaep_scout::warehouse;

enum Values {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<&'static str>>),
}

struct Column {
    name: &'static str,
    values: Values,
}

fn int(name: &'static str, values: &[Option<i64>]) -> Column {
    Column {
        name,
        values: Values::Int(values.to_vec()),
    }
}

fn float(name: &'static str, values: &[Option<f64>]) -> Column {
    Column {
        name,
        values: Values::Float(values.to_vec()),
    }
}

fn text(name: &'static str, values: &[Option<&'static str>]) -> Column {
    Column {
        name,
        values: Values::Text(values.to_vec()),
    }
}

fn def_levels<T>(values: &[Option<T>]) -> Vec<i16> {
    values.iter().map(|v| i16::from(v.is_some())).collect()
}

/// Write one row group with every column OPTIONAL.
fn write_parquet(path: &Path, columns: &[Column]) {
    let fields: Vec<String> = columns
        .iter()
        .map(|c| match c.values {
            Values::Int(_) => format!("OPTIONAL INT64 {};", c.name),
            Values::Float(_) => format!("OPTIONAL DOUBLE {};", c.name),
            Values::Text(_) => format!("OPTIONAL BYTE_ARRAY {} (UTF8);", c.name),
        })
        .collect();
    let message = format!("message actions {{ {} }}", fields.join(" "));
    let schema = Arc::new(parse_message_type(&message).expect("schema parses"));
    let props = Arc::new(WriterProperties::builder().build());
    let file = File::create(path).expect("create parquet file");
    let mut writer = SerializedFileWriter::new(file, schema, props).expect("parquet writer");

    let mut row_group = writer.next_row_group().expect("row group");
    let mut idx = 0;
    while let Some(mut col) = row_group.next_column().expect("next column") {
        match &columns[idx].values {
            Values::Int(values) => {
                let present: Vec<i64> = values.iter().flatten().copied().collect();
                col.typed::<Int64Type>()
                    .write_batch(&present, Some(def_levels(values).as_slice()), None)
                    .expect("write int column");
            }
            Values::Float(values) => {
                let present: Vec<f64> = values.iter().flatten().copied().collect();
                col.typed::<DoubleType>()
                    .write_batch(&present, Some(def_levels(values).as_slice()), None)
                    .expect("write double column");
            }
            Values::Text(values) => {
                let present: Vec<ByteArray> =
                    values.iter().flatten().map(|s| ByteArray::from(*s)).collect();
                col.typed::<ByteArrayType>()
                    .write_batch(&present, Some(def_levels(values).as_slice()), None)
                    .expect("write text column");
            }
        }
        col.close().expect("close column");
        idx += 1;
    }
    row_group.close().expect("close row group");
    writer.close().expect("close parquet file");
}

fn temp_parquet(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("vaep_scout_{name}_{}.parquet", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

/// Two actions of one game: Ann passes, Ben shoots.
fn two_actions() -> Vec<Column> {
    vec![
        int("game_id", &[Some(1001), Some(1001)]),
        text("original_event_id", &[Some("e1"), Some("e2")]),
        int("period_id", &[Some(1), Some(2)]),
        float("time_seconds", &[Some(120.0), Some(61.5)]),
        float("start_x", &[Some(50.0), Some(95.0)]),
        float("end_x", &[Some(60.0), Some(105.0)]),
        float("start_y", &[Some(34.0), Some(30.0)]),
        float("end_y", &[Some(30.0), Some(34.0)]),
        int("type_id", &[Some(0), Some(11)]),
        int("bodypart_id", &[Some(0), Some(1)]),
        int("result_id", &[Some(1), Some(1)]),
        int("player_id", &[Some(7), Some(9)]),
        int("team_id", &[Some(3), Some(3)]),
        text("player_name", &[Some("Ann Ebert"), Some("Ben Falk")]),
        text("team_name", &[Some("FC Lindenau"), Some("FC Lindenau")]),
        float("vaep_value", &[Some(0.5), Some(0.25)]),
        float("offensive_value", &[Some(0.45), Some(0.25)]),
        float("defensive_value", &[Some(0.05), Some(0.0)]),
    ]
}

#[test]
fn imported_actions_load_with_names() {
    let path = temp_parquet("import");
    write_parquet(&path, &two_actions());
    let mut conn = Connection::open_in_memory().expect("in-memory sqlite");

    let report = import_actions(&mut conn, &path, "bundesliga", "2023_2024").expect("import");
    assert_eq!(report.rows_read, 2);
    assert_eq!(report.inserted, 2);
    assert_eq!(report.replaced, 0);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.players, 2);
    assert_eq!(report.teams, 1);

    let actions = warehouse::load_actions(&conn, "bundesliga", "2023_2024").expect("load");
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0].player_name, "Ann Ebert");
    assert_eq!(actions[0].team_name, "FC Lindenau");
    assert_eq!(actions[0].original_event_id.as_deref(), Some("e1"));
    assert_eq!(actions[1].type_id, 11);
    assert_eq!(actions[1].period_id, 2);
    assert_eq!(actions[1].vaep_value, 0.25);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn importing_the_same_file_twice_replaces_its_games() {
    let path = temp_parquet("reimport");
    write_parquet(&path, &two_actions());
    let mut conn = Connection::open_in_memory().expect("in-memory sqlite");

    import_actions(&mut conn, &path, "bundesliga", "2023_2024").expect("first import");
    let again = import_actions(&mut conn, &path, "bundesliga", "2023_2024").expect("re-import");
    assert_eq!(again.inserted, 2);
    assert_eq!(again.replaced, 2);

    let actions = warehouse::load_actions(&conn, "bundesliga", "2023_2024").expect("load");
    assert_eq!(actions.len(), 2);
    let ann: f64 = actions
        .iter()
        .filter(|a| a.player_name == "Ann Ebert")
        .map(|a| a.vaep_value)
        .sum();
    assert_eq!(ann, 0.5);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn float_typed_ids_are_accepted() {
    let path = temp_parquet("float_ids");
    let mut columns = two_actions();
    for col in columns.iter_mut() {
        if matches!(col.name, "game_id" | "player_id" | "team_id" | "type_id") {
            if let Values::Int(values) = &col.values {
                let floats = values.iter().map(|v| v.map(|v| v as f64)).collect();
                col.values = Values::Float(floats);
            }
        }
    }
    write_parquet(&path, &columns);

    let parsed = read_actions(&path).expect("read");
    assert_eq!(parsed.skipped, 0);
    assert_eq!(parsed.rows.len(), 2);
    assert_eq!(parsed.rows[0].action.game_id, 1001);
    assert_eq!(parsed.rows[0].player_id, 7);
    assert_eq!(parsed.rows[1].action.type_id, 11);
    assert_eq!(parsed.players.get(&9).map(String::as_str), Some("Ben Falk"));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn rows_with_null_required_values_are_skipped() {
    let path = temp_parquet("nulls");
    let mut columns = two_actions();
    for col in columns.iter_mut() {
        if col.name == "vaep_value" {
            col.values = Values::Float(vec![Some(0.5), None]);
        }
    }
    write_parquet(&path, &columns);
    let mut conn = Connection::open_in_memory().expect("in-memory sqlite");

    let report = import_actions(&mut conn, &path, "bundesliga", "2023_2024").expect("import");
    assert_eq!(report.rows_read, 2);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped, 1);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn missing_required_columns_are_an_error() {
    let path = temp_parquet("missing");
    let columns: Vec<Column> = two_actions()
        .into_iter()
        .filter(|c| c.name != "vaep_value" && c.name != "team_id")
        .collect();
    write_parquet(&path, &columns);

    let err = read_actions(&path).expect_err("columns missing");
    let msg = format!("{err:#}");
    assert!(msg.contains("missing columns"), "{msg}");
    assert!(msg.contains("team_id"), "{msg}");
    assert!(msg.contains("vaep_value"), "{msg}");

    let _ = std::fs::remove_file(&path);
}
