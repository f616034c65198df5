// SPDX-License-Identifier: Apache-2.0

//! Reports the classes of syntactically equal blocks found in a Yul source
//! file.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use yul_blockclass::block_class_finder::{find_block_classes, BlockClassFinderOptions};
use yul_blockclass::equivalence_index::{BlockClass, BlockClassMember};
use yul_blockclass::parser::parse_path_to_block;
use yul_blockclass::syntactic_equality::SyntacticEquality;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input file holding a single top-level block
    input: PathBuf,

    /// Only report classes with more than one member
    #[arg(long, default_value_t = false)]
    only_duplicates: bool,

    /// Re-check every class against the equality oracle after the analysis
    #[arg(long, default_value_t = false)]
    verify: bool,

    /// Emit a JSON report instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Serialize, Debug)]
struct MemberReport {
    block: String,
    free: Vec<String>,
    written: Vec<String>,
    read: Vec<String>,
}

#[derive(Serialize, Debug)]
struct ClassReport {
    id: usize,
    members: Vec<MemberReport>,
}

#[derive(Serialize, Debug)]
struct Report {
    input: String,
    total_classes: usize,
    classes: Vec<ClassReport>,
}

fn member_report(member: &BlockClassMember<'_>) -> MemberReport {
    MemberReport {
        block: member.block.to_string(),
        free: member.free.names.clone(),
        written: member.free.written.iter().cloned().collect(),
        read: member.free.read.iter().cloned().collect(),
    }
}

fn class_report(class: &BlockClass<'_>) -> ClassReport {
    ClassReport {
        id: class.id().index(),
        members: class.members().iter().map(member_report).collect(),
    }
}

fn print_text(report: &Report) {
    println!(
        "{}: {} class(es), {} reported",
        report.input,
        report.total_classes,
        report.classes.len()
    );
    for class in report.classes.iter() {
        println!("class {}: {} member(s)", class.id, class.members.len());
        for member in class.members.iter() {
            println!("  {}", member.block);
            println!("    free: [{}]", member.free.join(", "));
        }
    }
}

fn main() -> anyhow::Result<()> {
    let _ = env_logger::builder().try_init();
    let args = Args::parse();

    let root = parse_path_to_block(&args.input)
        .with_context(|| format!("failed to parse {}", args.input.display()))?;
    let options = BlockClassFinderOptions {
        verify_classes: args.verify,
    };
    let classes = find_block_classes(&root, &SyntacticEquality, &options)
        .with_context(|| format!("failed to classify blocks of {}", args.input.display()))?;
    log::info!(
        "{}: {} classes; {} with duplicates",
        args.input.display(),
        classes.len(),
        classes.duplicate_classes().count()
    );

    let reported: Vec<ClassReport> = if args.only_duplicates {
        classes.duplicate_classes().map(class_report).collect()
    } else {
        classes.classes().iter().map(class_report).collect()
    };
    let report = Report {
        input: args.input.display().to_string(),
        total_classes: classes.len(),
        classes: reported,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&report);
    }
    Ok(())
}
