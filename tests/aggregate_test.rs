mod common;

use tallyrs::{
    na, val, Error, FieldType, NamedAgg, NullPolicy, Predicate, Reducer, Schema, Table,
};

fn by_species(aggs: &[NamedAgg]) -> Table {
    common::surveys_table()
        .group_by(["species_id"])
        .unwrap()
        .aggregate(aggs)
        .unwrap()
}

#[test]
fn test_null_policy_table() {
    assert_eq!(Reducer::Tally.null_policy(), NullPolicy::CountRows);
    assert_eq!(Reducer::Count.null_policy(), NullPolicy::SkipNulls);
    assert_eq!(Reducer::CountDistinct.null_policy(), NullPolicy::SkipNulls);
    for reducer in [
        Reducer::Sum,
        Reducer::Mean,
        Reducer::Median,
        Reducer::Std,
        Reducer::Min,
        Reducer::Max,
    ] {
        assert_eq!(reducer.null_policy(), NullPolicy::Propagate, "{}", reducer);
    }
}

#[test]
fn test_reducer_names() {
    for reducer in Reducer::ALL {
        assert_eq!(reducer.name().parse::<Reducer>().unwrap(), reducer);
    }
    assert_eq!("n".parse::<Reducer>().unwrap(), Reducer::Tally);
    assert_eq!("AVG".parse::<Reducer>().unwrap(), Reducer::Mean);
    assert_eq!("sd".parse::<Reducer>().unwrap(), Reducer::Std);
    assert!(matches!("mode".parse::<Reducer>(), Err(Error::InvalidArgument(_))));
}

#[test]
fn test_multi_statistic_aggregation() {
    let result = by_species(&[
        NamedAgg::tally("n"),
        NamedAgg::mean("mean_weight", "weight"),
        NamedAgg::min("min_weight", "weight"),
        NamedAgg::max("max_weight", "weight"),
        NamedAgg::sum("plot_sum", "plot_id"),
    ]);
    assert_eq!(
        result.column_names(),
        vec!["species_id", "n", "mean_weight", "min_weight", "max_weight", "plot_sum"]
    );
    assert_eq!(result.schema().dtype_of("n").unwrap(), FieldType::Int);
    assert_eq!(result.schema().dtype_of("plot_sum").unwrap(), FieldType::Int);
    assert_eq!(result.schema().dtype_of("min_weight").unwrap(), FieldType::Float);

    // DM: 40, 48, 44 on plots 2, 3, 2
    let dm = result.record(0).unwrap().values();
    assert_eq!(dm, &[val("DM"), val(3), val(44.0), val(40.0), val(48.0), val(7)]);
}

#[test]
fn test_propagating_reducers_return_na_on_any_null() {
    // DO has weights NA and 52
    let result = by_species(&[
        NamedAgg::tally("n"),
        NamedAgg::count("weighed", "weight"),
        NamedAgg::mean("mean_weight", "weight"),
        NamedAgg::sum("total", "weight"),
        NamedAgg::max("max_weight", "weight"),
    ]);
    let do_row = result.record(2).unwrap().values();
    assert_eq!(do_row, &[val("DO"), val(2), val(1), na(), na(), na()]);
}

#[test]
fn test_excluding_nulls_first() {
    let table = common::surveys_table()
        .filter(&Predicate::not_null("weight"))
        .unwrap();
    let result = table
        .group_by(["species_id"])
        .unwrap()
        .aggregate(&[NamedAgg::mean("mean_weight", "weight")])
        .unwrap();
    let do_row = result.record(2).unwrap().values();
    assert_eq!(do_row, &[val("DO"), val(52.0)]);
}

#[test]
fn test_all_null_group_yields_null() {
    let schema = Schema::from_pairs(&[("g", FieldType::Text), ("x", FieldType::Float)]).unwrap();
    let table = Table::from_rows(
        schema,
        vec![vec![val("a"), na()], vec![val("a"), na()], vec![val("b"), val(1.0)]],
    )
    .unwrap();
    let result = table
        .group_by(["g"])
        .unwrap()
        .aggregate(&[
            NamedAgg::mean("mean", "x"),
            NamedAgg::min("min", "x"),
            NamedAgg::max("max", "x"),
            NamedAgg::count("count", "x"),
        ])
        .unwrap();
    assert_eq!(result.record(0).unwrap().values(), &[val("a"), na(), na(), na(), val(0)]);
    assert_eq!(
        result.record(1).unwrap().values(),
        &[val("b"), val(1.0), val(1.0), val(1.0), val(1)]
    );
}

#[test]
fn test_median_std_and_distinct() {
    let schema = Schema::from_pairs(&[("g", FieldType::Text), ("x", FieldType::Int)]).unwrap();
    let table = Table::from_rows(
        schema,
        vec![
            vec![val("a"), val(2)],
            vec![val("a"), val(4)],
            vec![val("a"), val(4)],
            vec![val("a"), val(6)],
            vec![val("b"), val(5)],
        ],
    )
    .unwrap();
    let result = table
        .group_by(["g"])
        .unwrap()
        .aggregate(&[
            NamedAgg::median("median", "x"),
            NamedAgg::std("sd", "x"),
            NamedAgg::count_distinct("distinct", "x"),
        ])
        .unwrap();
    let a = result.record(0).unwrap().values();
    assert_eq!(a[1], val(4.0));
    match a[2].value() {
        Some(tallyrs::Scalar::Float(sd)) => assert!((sd - (8.0f64 / 3.0).sqrt()).abs() < 1e-12),
        other => panic!("unexpected sd {:?}", other),
    }
    assert_eq!(a[3], val(3));
    // a single value has no sample deviation
    let b = result.record(1).unwrap().values();
    assert_eq!(b, &[val("b"), val(5.0), na(), val(1)]);
}

#[test]
fn test_min_max_on_text() {
    let result = common::surveys_table()
        .filter(&Predicate::not_null("species_id"))
        .unwrap()
        .group_by(["sex"])
        .unwrap()
        .aggregate(&[
            NamedAgg::min("first", "species_id"),
            NamedAgg::max("last", "species_id"),
        ])
        .unwrap();
    // males: DM, PE, DM
    assert_eq!(result.record(0).unwrap().values(), &[val("M"), val("DM"), val("PE")]);
    assert_eq!(result.schema().dtype_of("first").unwrap(), FieldType::Text);
}

#[test]
fn test_summarize_whole_table() {
    let result = common::sex_weight_table()
        .summarize(&[NamedAgg::tally("n"), NamedAgg::sum("total", "weight")])
        .unwrap();
    assert_eq!(result.row_count(), 1);
    assert_eq!(result.record(0).unwrap().values(), &[val(3), val(60)]);

    let empty = common::sex_weight_table()
        .filter(&Predicate::eq("sex", "X"))
        .unwrap()
        .summarize(&[
            NamedAgg::tally("n"),
            NamedAgg::sum("total", "weight"),
            NamedAgg::mean("mean", "weight"),
        ])
        .unwrap();
    assert_eq!(empty.record(0).unwrap().values(), &[val(0), val(0), na()]);
}

#[test]
fn test_sum_overflow() {
    let schema = Schema::from_pairs(&[("x", FieldType::Int)]).unwrap();
    let table = Table::from_rows(schema, vec![vec![val(i64::MAX)], vec![val(1i64)]]).unwrap();
    assert!(matches!(
        table.summarize(&[NamedAgg::sum("total", "x")]),
        Err(Error::Overflow(_))
    ));
}

#[test]
fn test_aggregate_errors() {
    let table = common::surveys_table();
    let grouped = table.group_by(["species_id"]).unwrap();

    assert!(matches!(
        grouped.aggregate(&[NamedAgg::mean("m", "hindfoot")]),
        Err(Error::MissingField(_))
    ));
    assert!(matches!(
        grouped.aggregate(&[NamedAgg::mean("m", "sex")]),
        Err(Error::TypeMismatch { .. })
    ));
    assert!(matches!(
        grouped.aggregate(&[NamedAgg::tally("n"), NamedAgg::count("n", "weight")]),
        Err(Error::DuplicateField(name)) if name == "n"
    ));
    assert!(matches!(
        grouped.aggregate(&[NamedAgg::tally("species_id")]),
        Err(Error::DuplicateField(_))
    ));
    let missing_field = NamedAgg {
        name: "m".to_string(),
        reducer: Reducer::Mean,
        field: None,
    };
    assert!(matches!(
        grouped.aggregate(&[missing_field]),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_tally_checks_named_field() {
    let table = common::surveys_table();
    let typo = NamedAgg {
        name: "n".to_string(),
        reducer: Reducer::Tally,
        field: Some("nope".to_string()),
    };
    assert!(matches!(
        table.summarize(&[typo]),
        Err(Error::MissingField(ref f)) if f == "nope"
    ));

    // an existing field is accepted and still counts rows, nulls included
    let named = NamedAgg {
        name: "n".to_string(),
        reducer: Reducer::Tally,
        field: Some("weight".to_string()),
    };
    let result = table.summarize(&[named]).unwrap();
    assert_eq!(result.value(0, "n").unwrap(), &tallyrs::val(8));
}
