//! velojoin topology validator
//!
//! Loads a YAML topology file, runs every build-time check and prints the
//! resulting co-partition groups. Exits with status 1 on any error.

use std::process;

use clap::{Arg, ArgAction, Command};
use serde_json::json;
use velojoin::{JoinResult, JoinTopology, load_topology_file};

fn main() {
    let matches = Command::new("velojoin-validate")
        .version(clap::crate_version!())
        .about("Validate a velojoin topology file")
        .long_about(
            "Loads a YAML topology, checks every join configuration and verifies that \
             all co-partitioned sources agree on partition count and partitioner.",
        )
        .arg(
            Arg::new("topology")
                .help("Topology file to validate")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the result as JSON")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    let as_json = matches.get_flag("json");

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(if verbose {
        "debug"
    } else {
        "warn"
    }))
    .init();

    let path = matches
        .get_one::<String>("topology")
        .expect("topology is a required argument");

    match validate(path) {
        Ok(topology) => {
            if as_json {
                print_json(&topology);
            } else {
                print_text(&topology, verbose);
            }
        }
        Err(error) => {
            if as_json {
                println!(
                    "{}",
                    json!({ "valid": false, "error": error.to_string() })
                );
            } else {
                eprintln!("Topology validation failed!");
                eprintln!("{}", error);
            }
            process::exit(1);
        }
    }
}

fn validate(path: &str) -> JoinResult<JoinTopology> {
    load_topology_file(path)?.build()
}

fn print_text(topology: &JoinTopology, verbose: bool) {
    println!("Topology validation passed!");
    for (index, group) in topology.groups().iter().enumerate() {
        let topics: Vec<&str> = group.topics.iter().map(String::as_str).collect();
        println!(
            "  group {}: [{}] ({} partitions)",
            index,
            topics.join(", "),
            group.partitions
        );
    }
    if verbose {
        for join in topology.joins() {
            let window = &join.config.window;
            println!(
                "  join {}: {} window '{}' before={}ms after={}ms on {} partitions",
                join.name,
                join.config.join_type,
                window.name,
                window.before_ms,
                window.after_ms,
                join.partitions
            );
        }
    }
}

fn print_json(topology: &JoinTopology) {
    let groups: Vec<_> = topology
        .groups()
        .iter()
        .map(|group| {
            json!({
                "sources": group.sources,
                "topics": group.topics,
                "partitions": group.partitions,
                "partitioner": group.partitioner,
            })
        })
        .collect();
    let joins: Vec<_> = topology
        .joins()
        .iter()
        .map(|join| {
            json!({
                "name": join.name,
                "join_type": join.config.join_type,
                "window": join.config.window,
                "partitions": join.partitions,
            })
        })
        .collect();
    println!(
        "{}",
        json!({ "valid": true, "groups": groups, "joins": joins })
    );
}
