mod common;

use common::{create_test_csv, TempTestFile};
use tallyrs::{val, Config, CsvOptions, Error, FieldType, Stage};

const SURVEY_CONFIG: &str = r#"
[csv]
null_values = ["", "NA", "-"]

[[schema]]
name = "species_id"
type = "text"

[[schema]]
name = "weight"
type = "float"

[[pipeline.stages]]
stage = "filter"
predicate = { not_null = { field = "weight" } }

[[pipeline.stages]]
stage = "aggregate"
by = ["species_id"]
aggregations = [
    { name = "mean_weight", reducer = "mean", field = "weight" },
    { name = "n", reducer = "tally" },
]

[[pipeline.stages]]
stage = "sort"
keys = [{ field = "mean_weight", order = "descending" }]
"#;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.csv, CsvOptions::default());
    assert_eq!(config.csv.delimiter, ',');
    assert!(config.csv.is_null("NA"));
    assert!(config.csv.is_null(""));
    assert!(!config.csv.is_null("na"));
    assert!(config.schema.is_none());
    assert!(config.pipeline.is_empty());
}

#[test]
fn test_toml_config() {
    let config = Config::from_toml_str(SURVEY_CONFIG).unwrap();
    assert!(config.csv.is_null("-"));
    assert!(config.csv.has_header);

    let schema = config.declared_schema().unwrap().unwrap();
    assert_eq!(schema.names(), vec!["species_id", "weight"]);
    assert_eq!(schema.dtype_of("weight").unwrap(), FieldType::Float);

    let kinds: Vec<&str> = config.pipeline.stages().iter().map(Stage::kind).collect();
    assert_eq!(kinds, vec!["filter", "aggregate", "sort"]);
}

#[test]
fn test_run_config_over_csv() {
    let config = Config::from_toml_str(SURVEY_CONFIG).unwrap();
    let data = create_test_csv(
        "config_run",
        &[
            "species_id,weight,plot_id",
            "DM,40,2",
            "DM,-,3",
            "PE,20,2",
            "DM,44,2",
            "PE,24,3",
        ],
    );

    let table = config.load_table(data.path()).unwrap();
    assert_eq!(table.column_names(), vec!["species_id", "weight"]);
    assert_eq!(table.row_count(), 5);

    let result = config.run(data.path()).unwrap();
    assert_eq!(result.column_names(), vec!["species_id", "mean_weight", "n"]);
    assert_eq!(result.record(0).unwrap().values(), &[val("DM"), val(42.0), val(2)]);
    assert_eq!(result.record(1).unwrap().values(), &[val("PE"), val(22.0), val(2)]);
}

#[test]
fn test_yaml_config_loaded_by_extension() {
    let file = TempTestFile::new("config_yaml", "yaml");
    file.write(
        "csv:\n  delimiter: \";\"\npipeline:\n  stages:\n    - stage: tally\n      by: [sex]\n    - stage: sort\n      keys:\n        - field: n\n          order: descending\n",
    );
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.csv.delimiter, ';');
    assert!(config.schema.is_none());

    let data = create_test_csv("config_yaml_data", &["sex;weight", "M;1", "F;2", "F;3"]);
    let result = config.run(data.path()).unwrap();
    assert_eq!(result.column("sex").unwrap(), vec![&val("F"), &val("M")]);
    assert_eq!(result.column("n").unwrap(), vec![&val(2), &val(1)]);
}

#[test]
fn test_json_config_loaded_by_extension() {
    let file = TempTestFile::new("config_json", "json");
    file.write(r#"{"pipeline": {"stages": [{"stage": "limit", "n": 1}]}}"#);
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.pipeline.stages(), &[Stage::Limit { n: 1 }]);
    assert_eq!(config.csv, CsvOptions::default());
}

#[test]
fn test_config_errors() {
    assert!(matches!(Config::from_toml_str("csv = 3"), Err(Error::Config(_))));
    assert!(matches!(Config::from_json_str("{"), Err(Error::Config(_))));
    assert!(matches!(
        Config::from_yaml_str("pipeline:\n  stages:\n    - stage: explode\n"),
        Err(Error::Config(_))
    ));

    let file = TempTestFile::new("config_ini", "ini");
    file.write("[csv]\n");
    assert!(matches!(Config::load(file.path()), Err(Error::Config(_))));

    let duplicated = Config::from_toml_str(
        "[[schema]]\nname = \"a\"\ntype = \"int\"\n[[schema]]\nname = \"a\"\ntype = \"text\"\n",
    )
    .unwrap();
    assert!(matches!(duplicated.declared_schema(), Err(Error::DuplicateField(_))));
}
