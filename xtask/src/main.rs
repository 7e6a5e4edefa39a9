use std::env;
use std::error::Error;
use std::fs;
use std::path::Path;

use jsonschema::JSONSchema;
use outbreak_schema::{dataset_schema, DatasetDocument};

const DEFAULT_DATASET_GLOB: &str = "outbreak_core/src/data/*dataset*.json";

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("dataset-schema") => dataset_schema_cmd(args.next()),
        Some("validate-datasets") => validate_datasets(args.next()),
        Some("help") | None => {
            print_usage();
            Ok(())
        }
        Some(cmd) => {
            eprintln!("Unknown xtask '{cmd}'.");
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("Usage: cargo xtask dataset-schema [OUT_FILE]");
    eprintln!("       cargo xtask validate-datasets [GLOB]");
    eprintln!("       cargo xtask help");
}

fn dataset_schema_cmd(out: Option<String>) -> Result<(), Box<dyn Error>> {
    let rendered = serde_json::to_string_pretty(&dataset_schema())?;
    match out {
        Some(path) => {
            let path = Path::new(&path);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, rendered + "\n")?;
            println!("Wrote dataset schema to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn validate_datasets(pattern: Option<String>) -> Result<(), Box<dyn Error>> {
    let pattern = pattern.unwrap_or_else(|| DEFAULT_DATASET_GLOB.to_string());
    let schema = serde_json::to_value(dataset_schema())?;
    let compiled =
        JSONSchema::compile(&schema).map_err(|err| format!("dataset schema is invalid: {err}"))?;

    let mut checked = 0usize;
    let mut failed = 0usize;
    for entry in glob::glob(&pattern)? {
        let path = entry?;
        checked += 1;
        let problems = check_dataset(&compiled, &path)?;
        if problems.is_empty() {
            println!("ok      {}", path.display());
        } else {
            failed += 1;
            println!("invalid {}", path.display());
            for problem in problems {
                println!("  - {problem}");
            }
        }
    }

    if checked == 0 {
        return Err(format!("no dataset files matched '{pattern}'").into());
    }
    if failed > 0 {
        return Err(format!("{failed} of {checked} dataset files failed validation").into());
    }
    println!("Validated {checked} dataset file(s)");
    Ok(())
}

/// Schema violations first; the semantic checks only run on schema-valid files.
fn check_dataset(schema: &JSONSchema, path: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    let contents = fs::read_to_string(path)?;
    let instance: serde_json::Value = match serde_json::from_str(&contents) {
        Ok(value) => value,
        Err(err) => return Ok(vec![format!("not valid JSON: {err}")]),
    };

    if let Err(errors) = schema.validate(&instance) {
        return Ok(errors
            .map(|err| format!("{}: {err}", err.instance_path))
            .collect());
    }

    match DatasetDocument::parse_str(&contents) {
        Ok(_) => Ok(Vec::new()),
        Err(err) => Ok(err.errors().to_vec()),
    }
}
