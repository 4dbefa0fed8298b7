// Copyright (c) tabpipe.dev 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::collections::HashMap;
use std::sync::Arc;

use tabpipe_core::{Row, SortDirection};
use tabpipe_engine::aggregate::{Aggregate, AggregateKind};
use tabpipe_engine::condition::{CompareOp, Condition, NumberCondition, TextCondition, TextOp};
use tabpipe_engine::transform::{
	ConditionalAction, ConditionalSet, Filter, GroupBy, Join, JoinKind, Merge, MergeMode, Sort, Take, Transform,
};
use tabpipe_engine::{ComputePool, Pipeline, TabulatedFile};

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).try_init();
}

fn file(name: &str, headers: &[&str], records: &[&[&str]]) -> Arc<TabulatedFile> {
	let file = TabulatedFile::open(name, headers.iter().map(|h| h.to_string()).collect()).unwrap();
	file.supply(records.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect()).unwrap();
	file
}

fn people() -> Arc<TabulatedFile> {
	file(
		"people.csv",
		&["id", "name", "cc"],
		&[
			&["1", "a", "de"],
			&["2", "b", "fr"],
			&["3", "c", "xx"],
			&["4", "d", "de"],
		],
	)
}

fn countries() -> Arc<TabulatedFile> {
	file("countries.csv", &["code", "country"], &[&["de", "Germany"], &["fr", "France"]])
}

#[test]
fn empty_pipeline_returns_base_rows_in_order() {
	init_tracing();
	let pipeline = Pipeline::new(people());
	let out = pipeline.run(&ComputePool::with_threads(4)).unwrap();
	let ids: Vec<_> = out.iter().map(|r| r.get("id").unwrap()).collect();
	assert_eq!(ids, vec!["1", "2", "3", "4"]);
}

#[test]
fn filter_on_id_keeps_the_matching_row() {
	let base = file("two.csv", &["id", "name"], &[&["1", "a"], &["2", "b"]]);
	let mut pipeline = Pipeline::new(base);
	pipeline.push(Transform::Filter(Filter {
		conditions: vec![Condition::Text(TextCondition {
			column: "id".to_string(),
			op: TextOp::Equals,
			value: "1".to_string(),
		})],
	}));
	let out = pipeline.run(&ComputePool::with_threads(2)).unwrap();
	assert_eq!(out, vec![Row::from_pairs([("id", "1"), ("name", "a")])]);
}

#[test]
fn take_one_returns_the_first_row_with_all_columns() {
	let base = file("three.csv", &["id", "name"], &[&["1", "a"], &["2", "b"], &["3", "c"]]);
	let mut pipeline = Pipeline::new(base);
	pipeline.push(Transform::Take(Take {
		count: 1,
	}));
	let out = pipeline.run(&ComputePool::with_threads(2)).unwrap();
	assert_eq!(out, vec![Row::from_pairs([("id", "1"), ("name", "a")])]);
}

#[test]
fn chunked_execution_matches_sequential_execution() {
	let records: Vec<Vec<String>> = (0..97).map(|i| vec![i.to_string(), (i % 7).to_string()]).collect();
	let base = TabulatedFile::open("big.csv", vec!["i".to_string(), "m".to_string()]).unwrap();
	base.supply(records).unwrap();

	let mut pipeline = Pipeline::new(base);
	pipeline.push(Transform::Filter(Filter {
		conditions: vec![Condition::Number(NumberCondition {
			column: "m".to_string(),
			op: CompareOp::Lt,
			value: "4".to_string(),
		})],
	}));
	pipeline.push(Transform::ConditionalSet(ConditionalSet {
		conditions: vec![Condition::Number(NumberCondition {
			column: "m".to_string(),
			op: CompareOp::Eq,
			value: "0".to_string(),
		})],
		actions: vec![ConditionalAction::SetColumn {
			column: "m".to_string(),
			value: "zero".to_string(),
		}],
	}));

	let sequential = pipeline.run(&ComputePool::with_threads(1)).unwrap();
	let parallel = pipeline.run(&ComputePool::with_threads(8)).unwrap();
	assert_eq!(sequential, parallel);
}

#[test]
fn inner_join_never_grows_and_left_join_never_shrinks() {
	let countries = countries();
	for (kind, expected) in [(JoinKind::Inner, 3), (JoinKind::Left, 4)] {
		let mut pipeline = Pipeline::new(people());
		pipeline.add_file(countries.clone());
		pipeline.push(Transform::Join(Join {
			column: "cc".to_string(),
			kind,
			file: countries.clone(),
			file_column: "code".to_string(),
			case_insensitive: false,
		}));
		let out = pipeline.run(&ComputePool::with_threads(3)).unwrap();
		assert_eq!(out.len(), expected);
		if kind == JoinKind::Inner {
			// every joined column carries real data
			assert!(out.iter().all(|row| !row.get("country").unwrap().is_empty()));
		}
	}
}

#[test]
fn merge_sequential_pairs_by_modulo_and_random_keeps_the_multiset() {
	let colors = file("colors.csv", &["color"], &[&["red"], &["green"], &["blue"]]);

	let mut pipeline = Pipeline::new(people());
	pipeline.add_file(colors.clone());
	pipeline.push(Transform::Merge(Merge {
		file: colors.clone(),
		columns: vec!["color".to_string()],
		mode: MergeMode::Sequential,
	}));
	let out = pipeline.run(&ComputePool::with_threads(3)).unwrap();
	let paired: Vec<_> = out.iter().map(|r| r.get("color").unwrap()).collect();
	assert_eq!(paired, vec!["red", "green", "blue", "red"]);

	let mut shuffled = Pipeline::new(people());
	shuffled.add_file(colors.clone());
	shuffled.push(Transform::Merge(Merge {
		file: colors,
		columns: vec!["color".to_string()],
		mode: MergeMode::Random,
	}));
	let out = shuffled.run(&ComputePool::with_threads(3)).unwrap();
	let mut histogram: HashMap<&str, usize> = HashMap::new();
	for row in &out {
		*histogram.entry(row.get("color").unwrap()).or_default() += 1;
	}
	// same multiset as sequential mode: 3 distinct colors over 4 rows
	assert_eq!(histogram.values().sum::<usize>(), 4);
	assert_eq!(histogram.len(), 3);
}

#[test]
fn group_by_count_keeps_first_occurrence_order() {
	let base = file("ab.csv", &["a", "b"], &[&["x", "1"], &["x", "2"], &["y", "3"]]);
	let mut pipeline = Pipeline::new(base);
	pipeline.push(Transform::GroupBy(GroupBy {
		columns: vec!["a".to_string()],
		aggregates: vec![Aggregate {
			kind: AggregateKind::Count {
				distinct: false,
				case_insensitive: false,
			},
			column: String::new(),
			alias: "Count".to_string(),
		}],
	}));
	let out = pipeline.run(&ComputePool::with_threads(2)).unwrap();
	assert_eq!(out, vec![
		Row::from_pairs([("a", "x"), ("Count", "2")]),
		Row::from_pairs([("a", "y"), ("Count", "1")]),
	]);
}

#[test]
fn sort_then_take_returns_the_extremes() {
	let mut pipeline = Pipeline::new(people());
	pipeline.push(Transform::Sort(Sort {
		column: "name".to_string(),
		direction: SortDirection::Desc,
	}));
	pipeline.push(Transform::Take(Take {
		count: 1,
	}));
	let out = pipeline.run(&ComputePool::with_threads(2)).unwrap();
	assert_eq!(out[0].get("name"), Some("d"));
}

#[test]
fn in_flight_runs_use_the_snapshot_not_the_live_configuration() {
	let mut pipeline = Pipeline::new(people());
	pipeline.push(Transform::Take(Take {
		count: 2,
	}));
	let snapshot = pipeline.snapshot();

	// concurrent edit after the snapshot was taken
	pipeline.remove(0);
	pipeline.push(Transform::Take(Take {
		count: 1,
	}));

	let out = snapshot.execute(&ComputePool::with_threads(2)).unwrap();
	assert_eq!(out.len(), 2);
}

#[test]
fn header_fold_tracks_join_and_group_by() {
	let countries = countries();
	let mut pipeline = Pipeline::new(people());
	pipeline.add_file(countries.clone());
	pipeline.push(Transform::Join(Join {
		column: "cc".to_string(),
		kind: JoinKind::Left,
		file: countries,
		file_column: "code".to_string(),
		case_insensitive: false,
	}));
	pipeline.push(Transform::GroupBy(GroupBy {
		columns: vec!["country".to_string()],
		aggregates: vec![Aggregate {
			kind: AggregateKind::Count {
				distinct: false,
				case_insensitive: false,
			},
			column: String::new(),
			alias: String::new(),
		}],
	}));

	assert_eq!(pipeline.headers_up_to(0, true).names(), &["id", "name", "cc", "country"]);
	assert_eq!(pipeline.headers_up_to(1, true).names(), &["country", "COUNT()"]);
	// pure and deterministic
	assert_eq!(pipeline.headers_up_to(1, true), pipeline.headers_up_to(1, true));
}
