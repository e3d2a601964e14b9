mod common;

use tallyrs::{na, val, Error, Field, FieldType, Record, Schema, Table};

#[test]
fn test_schema_rejects_duplicate_fields() {
    let result = Schema::new(vec![
        Field::new("sex", FieldType::Text),
        Field::new("sex", FieldType::Int),
    ]);
    assert!(matches!(result, Err(Error::DuplicateField(name)) if name == "sex"));
}

#[test]
fn test_schema_lookup() {
    let schema = Schema::from_pairs(&[("sex", FieldType::Text), ("weight", FieldType::Int)]).unwrap();
    assert_eq!(schema.index_of("weight").unwrap(), 1);
    assert_eq!(schema.dtype_of("sex").unwrap(), FieldType::Text);
    assert!(matches!(schema.index_of("hindfoot"), Err(Error::MissingField(_))));
    assert_eq!(schema.names(), vec!["sex", "weight"]);
}

#[test]
fn test_table_checks_arity() {
    let schema = Schema::from_pairs(&[("sex", FieldType::Text), ("weight", FieldType::Int)]).unwrap();
    let result = Table::from_rows(schema, vec![vec![val("M"), val(1)], vec![val("F")]]);
    assert!(matches!(
        result,
        Err(Error::RecordArity {
            row: 1,
            expected: 2,
            found: 1
        })
    ));
}

#[test]
fn test_table_checks_types() {
    let schema = Schema::from_pairs(&[("weight", FieldType::Int)]).unwrap();
    let result = Table::from_rows(schema, vec![vec![val("heavy")]]);
    assert!(matches!(result, Err(Error::TypeMismatch { field, .. }) if field == "weight"));
}

#[test]
fn test_table_widens_ints_and_drops_nan() {
    let schema = Schema::from_pairs(&[("weight", FieldType::Float)]).unwrap();
    let table = Table::from_rows(schema, vec![vec![val(3)], vec![val(f64::NAN)], vec![na()]]).unwrap();
    assert_eq!(table.value(0, "weight").unwrap(), &val(3.0));
    assert!(table.value(1, "weight").unwrap().is_na());
    assert!(table.value(2, "weight").unwrap().is_na());
}

#[test]
fn test_table_accessors() {
    let table = common::sex_weight_table();
    assert_eq!(table.row_count(), 3);
    assert!(!table.is_empty());
    assert_eq!(table.column_names(), vec!["sex", "weight"]);
    assert_eq!(table.column("weight").unwrap(), vec![&val(10), &val(20), &val(30)]);
    assert_eq!(table.record(2), Some(&Record::new(vec![na(), val(30)])));
    assert!(matches!(table.value(0, "hindfoot"), Err(Error::MissingField(_))));
    assert!(matches!(table.value(9, "sex"), Err(Error::InvalidArgument(_))));
}

#[test]
fn test_select_reorders_fields() {
    let table = common::surveys_table();
    let selected = table.select(&["weight", "species_id"]).unwrap();
    assert_eq!(selected.column_names(), vec!["weight", "species_id"]);
    assert_eq!(selected.row_count(), table.row_count());
    assert_eq!(selected.value(0, "species_id").unwrap(), &val("DM"));
    assert!(matches!(table.select(&["nope"]), Err(Error::MissingField(_))));
    // the source is untouched
    assert_eq!(table.column_names().len(), 4);
}

#[test]
fn test_display_prints_na() {
    let rendered = common::sex_weight_table().to_string();
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines[0], "sex  weight");
    assert_eq!(lines[3], "NA   30");
    assert_eq!(lines[4], "# 3 rows x 2 fields");
}
