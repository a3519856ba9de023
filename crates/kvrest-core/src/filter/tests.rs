use crate::{
    filter::{
        ByteComparator, ColumnRange, CompareOp, Filter, FilterParseError, FilterSource,
        MAX_FILTER_DEPTH, SingleColumnValue, parse_filter,
    },
    store::Cell,
};

fn parse(text: &str) -> Result<Filter, FilterParseError> {
    parse_filter(text.as_bytes())
}

fn row_cells() -> Vec<Cell> {
    vec![
        Cell::new("cf:a", 20, "apple"),
        Cell::new("cf:a", 10, "apricot"),
        Cell::new("cf:b", 20, "banana"),
        Cell::new("meta:owner", 5, "Carol"),
    ]
}

fn kept_columns(filter: &Filter, row: &[u8]) -> Vec<(String, u64)> {
    filter
        .apply(row, row_cells())
        .into_iter()
        .map(|cell| (String::from_utf8_lossy(&cell.column).into_owned(), cell.timestamp))
        .collect()
}

//
// Parsing
//

#[test]
fn parses_simple_calls() {
    assert_eq!(parse("KeyOnlyFilter()"), Ok(Filter::KeyOnly));
    assert_eq!(
        parse("PrefixFilter('row-')"),
        Ok(Filter::Prefix(b"row-".to_vec()))
    );
    assert_eq!(
        parse("ColumnPaginationFilter(2, 1)"),
        Ok(Filter::ColumnPagination {
            limit: 2,
            offset: 1
        })
    );
    assert_eq!(
        parse("TimestampsFilter(30, 10, 30)"),
        Ok(Filter::Timestamps(vec![10, 30]))
    );
}

#[test]
fn and_binds_tighter_than_or() {
    let parsed = parse("PrefixFilter('a') OR PrefixFilter('b') AND KeyOnlyFilter()")
        .expect("filter should parse");

    assert_eq!(
        parsed,
        Filter::Or(vec![
            Filter::Prefix(b"a".to_vec()),
            Filter::And(vec![Filter::Prefix(b"b".to_vec()), Filter::KeyOnly]),
        ])
    );
}

#[test]
fn parentheses_and_unary_operators_nest() {
    let parsed = parse("SKIP (ValueFilter(!=, 'binary:x') OR WHILE FirstKeyOnlyFilter())")
        .expect("filter should parse");

    assert_eq!(
        parsed,
        Filter::Skip(Box::new(Filter::Or(vec![
            Filter::Value(CompareOp::Ne, ByteComparator::Binary(b"x".to_vec())),
            Filter::While(Box::new(Filter::FirstKeyOnly)),
        ])))
    );
}

#[test]
fn single_column_value_filter_defaults_and_flags() {
    let parsed = parse("SingleColumnValueFilter('cf', 'a', =, 'binaryprefix:ap')")
        .expect("filter should parse");
    assert_eq!(
        parsed,
        Filter::SingleColumnValue(SingleColumnValue {
            family: b"cf".to_vec(),
            qualifier: b"a".to_vec(),
            op: CompareOp::Eq,
            comparator: ByteComparator::BinaryPrefix(b"ap".to_vec()),
            filter_if_missing: false,
            latest_version_only: true,
        })
    );

    let parsed = parse("SingleColumnValueFilter('cf', 'a', =, 'binary:x', true, false)")
        .expect("filter should parse");
    let Filter::SingleColumnValue(test) = parsed else {
        panic!("expected single column value filter");
    };
    assert!(test.filter_if_missing);
    assert!(!test.latest_version_only);
}

#[test]
fn column_range_treats_empty_bounds_as_open() {
    let parsed = parse("ColumnRangeFilter('', true, 'm', false)").expect("filter should parse");
    assert_eq!(
        parsed,
        Filter::ColumnRange(ColumnRange {
            min: None,
            min_inclusive: true,
            max: Some(b"m".to_vec()),
            max_inclusive: false,
        })
    );
}

#[test]
fn unbalanced_parentheses_are_syntax_errors() {
    assert_eq!(
        parse("(PrefixFilter('a')"),
        Err(FilterParseError::UnbalancedParens { offset: 0 })
    );
    assert_eq!(
        parse("PrefixFilter('a'))"),
        Err(FilterParseError::UnbalancedParens { offset: 17 })
    );
    assert_eq!(
        parse("KeyOnlyFilter("),
        Err(FilterParseError::UnbalancedParens { offset: 13 })
    );
}

#[test]
fn nesting_is_bounded_by_depth() {
    let nested = |depth: usize| {
        format!(
            "{}KeyOnlyFilter(){}",
            "(".repeat(depth),
            ")".repeat(depth)
        )
    };

    assert_eq!(parse(&nested(MAX_FILTER_DEPTH)), Ok(Filter::KeyOnly));
    assert_eq!(
        parse(&nested(MAX_FILTER_DEPTH + 1)),
        Err(FilterParseError::TooDeep {
            offset: MAX_FILTER_DEPTH,
            max: MAX_FILTER_DEPTH
        })
    );
    assert!(matches!(
        parse(&nested(2000)),
        Err(FilterParseError::TooDeep { .. })
    ));
}

#[test]
fn unary_prefix_chains_are_bounded_by_depth() {
    let chain = |depth: usize| format!("{}KeyOnlyFilter()", "SKIP ".repeat(depth));

    assert!(parse(&chain(MAX_FILTER_DEPTH)).is_ok());
    assert_eq!(
        parse(&chain(MAX_FILTER_DEPTH + 1)),
        Err(FilterParseError::TooDeep {
            offset: MAX_FILTER_DEPTH * 5,
            max: MAX_FILTER_DEPTH
        })
    );
    assert!(matches!(
        parse(&"WHILE ".repeat(3000)),
        Err(FilterParseError::TooDeep { .. })
    ));
}

#[test]
fn unknown_operator_is_reported_by_name() {
    let err = parse("PrefixFilter('a') XOR PrefixFilter('b')").expect_err("XOR must fail");
    assert_eq!(
        err,
        FilterParseError::UnknownOperator {
            name: "XOR".to_string(),
            offset: 18
        }
    );

    let err = parse("(PrefixFilter('a') NAND KeyOnlyFilter())").expect_err("NAND must fail");
    assert!(matches!(err, FilterParseError::UnknownOperator { ref name, .. } if name == "NAND"));
}

#[test]
fn unknown_comparator_is_reported_by_kind() {
    let err = parse("ValueFilter(=, 'fuzzy:abc')").expect_err("unknown comparator must fail");
    assert_eq!(
        err,
        FilterParseError::UnknownComparator {
            name: "fuzzy".to_string()
        }
    );

    let err = parse("ValueFilter(=, 'abc')").expect_err("comparator without kind must fail");
    assert!(matches!(err, FilterParseError::UnknownComparator { .. }));
}

#[test]
fn unknown_filters_and_bad_arguments_are_rejected() {
    let err = parse("BloomFilter()").expect_err("unknown filter must fail");
    assert_eq!(
        err,
        FilterParseError::UnknownFilter {
            name: "BloomFilter".to_string(),
            offset: 0
        }
    );

    for text in [
        "PrefixFilter()",
        "PrefixFilter(1)",
        "KeyOnlyFilter('x')",
        "ColumnCountGetFilter(-1)",
        "ValueFilter('binary:x', =)",
        "ValueFilter(<, 'substring:x')",
        "MultipleColumnPrefixFilter()",
    ] {
        let err = parse(text).expect_err("bad arguments must fail");
        assert!(
            matches!(err, FilterParseError::InvalidArguments { .. }),
            "{text}: unexpected {err:?}"
        );
    }
}

#[test]
fn dangling_operators_and_empty_input_are_rejected() {
    assert_eq!(
        parse("PrefixFilter('a') AND"),
        Err(FilterParseError::UnexpectedEnd)
    );
    assert_eq!(parse("   "), Err(FilterParseError::Empty));
    assert!(matches!(
        parse("ValueFilter(=, 'regexstring:(')"),
        Err(FilterParseError::InvalidRegex { .. })
    ));
}

#[test]
fn base64_source_decodes_before_parsing_and_is_size_bounded() {
    // "PrefixFilter('r')" in base64 without padding.
    let source = FilterSource::Base64("UHJlZml4RmlsdGVyKCdyJyk".to_string());
    assert_eq!(source.parse(1024), Ok(Filter::Prefix(b"r".to_vec())));

    let err = FilterSource::Base64("not base64!".to_string())
        .parse(1024)
        .expect_err("malformed base64 must fail");
    assert!(matches!(err, FilterParseError::Base64(_)));

    let err = FilterSource::Text("KeyOnlyFilter()".to_string())
        .parse(4)
        .expect_err("oversized filter must fail");
    assert_eq!(err, FilterParseError::TooLong { len: 15, max: 4 });
}

//
// Evaluation
//

#[test]
fn row_level_filters_keep_all_or_nothing() {
    let filter = Filter::Prefix(b"user-".to_vec());
    assert_eq!(kept_columns(&filter, b"user-1").len(), 4);
    assert!(kept_columns(&filter, b"order-1").is_empty());

    let filter = parse("RowFilter(>=, 'binary:m')").expect("filter should parse");
    assert_eq!(kept_columns(&filter, b"zeta").len(), 4);
    assert!(kept_columns(&filter, b"alpha").is_empty());
}

#[test]
fn cell_level_filters_prune_individual_cells() {
    let filter = parse("QualifierFilter(=, 'binary:a')").expect("filter should parse");
    assert_eq!(
        kept_columns(&filter, b"r"),
        vec![("cf:a".to_string(), 20), ("cf:a".to_string(), 10)]
    );

    let filter = parse("FamilyFilter(=, 'binary:meta')").expect("filter should parse");
    assert_eq!(kept_columns(&filter, b"r"), vec![("meta:owner".to_string(), 5)]);

    let filter = parse("ValueFilter(=, 'substring:AN')").expect("filter should parse");
    assert_eq!(kept_columns(&filter, b"r"), vec![("cf:b".to_string(), 20)]);

    let filter = parse("TimestampsFilter(10, 5)").expect("filter should parse");
    assert_eq!(
        kept_columns(&filter, b"r"),
        vec![("cf:a".to_string(), 10), ("meta:owner".to_string(), 5)]
    );
}

#[test]
fn column_counting_filters_work_on_distinct_columns() {
    let filter = Filter::ColumnCountGet(2);
    assert_eq!(
        kept_columns(&filter, b"r"),
        vec![
            ("cf:a".to_string(), 20),
            ("cf:a".to_string(), 10),
            ("cf:b".to_string(), 20)
        ]
    );

    let filter = Filter::ColumnPagination {
        limit: 1,
        offset: 1,
    };
    assert_eq!(kept_columns(&filter, b"r"), vec![("cf:b".to_string(), 20)]);

    assert_eq!(
        kept_columns(&Filter::FirstKeyOnly, b"r"),
        vec![("cf:a".to_string(), 20)]
    );
}

#[test]
fn key_only_strips_values_but_keeps_cells() {
    let filter = parse("KeyOnlyFilter() AND ColumnPrefixFilter('b')").expect("filter should parse");
    let cells = filter.apply(b"r", row_cells());

    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].column, b"cf:b".to_vec());
    assert!(cells[0].value.is_empty());
}

#[test]
fn single_column_value_filter_checks_latest_or_any_version() {
    let latest = parse("SingleColumnValueFilter('cf', 'a', =, 'binary:apricot')")
        .expect("filter should parse");
    assert!(kept_columns(&latest, b"r").is_empty());

    let any = parse("SingleColumnValueFilter('cf', 'a', =, 'binary:apricot', false, false)")
        .expect("filter should parse");
    assert_eq!(kept_columns(&any, b"r").len(), 4);

    let missing_kept = parse("SingleColumnValueFilter('cf', 'zz', =, 'binary:x')")
        .expect("filter should parse");
    assert_eq!(kept_columns(&missing_kept, b"r").len(), 4);

    let missing_dropped = parse("SingleColumnValueFilter('cf', 'zz', =, 'binary:x', true, true)")
        .expect("filter should parse");
    assert!(kept_columns(&missing_dropped, b"r").is_empty());
}

#[test]
fn skip_drops_rows_with_any_failing_cell() {
    let filter = parse("SKIP ValueFilter(!=, 'binary:banana')").expect("filter should parse");
    assert!(kept_columns(&filter, b"r").is_empty());

    let filter = parse("SKIP ValueFilter(!=, 'binary:zzz')").expect("filter should parse");
    assert_eq!(kept_columns(&filter, b"r").len(), 4);
}

#[test]
fn or_keeps_cells_passing_either_side() {
    let filter = parse("QualifierFilter(=, 'binary:b') OR FamilyFilter(=, 'binary:meta')")
        .expect("filter should parse");
    assert_eq!(
        kept_columns(&filter, b"r"),
        vec![("cf:b".to_string(), 20), ("meta:owner".to_string(), 5)]
    );
}

#[test]
fn regex_comparator_matches_raw_bytes() {
    let filter = parse("ValueFilter(=, 'regexstring:^ap')").expect("filter should parse");
    assert_eq!(
        kept_columns(&filter, b"r"),
        vec![("cf:a".to_string(), 20), ("cf:a".to_string(), 10)]
    );
}
