use std::path::Path;

use anyhow::{anyhow, Context};
use colored::Colorize;
use ecr_core::{Ec, Fetched, Repository};
use ecr_types::RecordId;
use serde_json::{json, Value as Json};

use crate::cli::*;
use crate::config::AppConfig;
use crate::tutorial;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let format = cli.format;
    match cli.command {
        Command::Tutorial => cmd_tutorial(&config, &format),
        Command::List(args) => cmd_list(&config, &format, args),
        Command::Get(args) => cmd_get(&config, &format, args),
        Command::Keys(args) => cmd_keys(&config, &format, args),
        Command::Resolve(args) => cmd_resolve(&config, args),
        Command::Snapshot(args) => cmd_snapshot(&config, args),
        Command::Declaration(args) => cmd_declaration(&config, &format, args),
        Command::Transfer(args) => cmd_transfer(&config, args),
    }
}

/// Build an in-memory repository from a JSON record file.
fn open(config: &AppConfig, file: &Path) -> anyhow::Result<Repository> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let json: Json =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", file.display()))?;
    let repo = Repository::with_builtin_views(config.store.clone(), config.ec.clone());
    repo.import_json(&json)
        .with_context(|| format!("importing {}", file.display()))?;
    Ok(repo)
}

fn load(repo: &Repository, id: &str) -> anyhow::Result<Ec> {
    let id = RecordId::new(id)?;
    repo.load(&id)?
        .ok_or_else(|| anyhow!("no record with id {id}"))
}

fn fetched_json(fetched: &Fetched) -> Json {
    match fetched {
        Fetched::Literal(scalar) => scalar.to_json(),
        Fetched::View(ec) => Json::String(ec.id().to_string()),
        Fetched::Views(ecs) => ecs.iter().map(|ec| Json::String(ec.id().to_string())).collect(),
    }
}

fn print_json(json: &Json) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(json)?);
    Ok(())
}

fn cmd_tutorial(config: &AppConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let walkthrough = tutorial::run(config)?;
    if matches!(format, OutputFormat::Json) {
        return print_json(&walkthrough.snapshot.to_json());
    }
    for (n, step) in walkthrough.steps.iter().enumerate() {
        println!("{} {}. {}", "✓".green().bold(), n + 1, step.title.bold());
        println!("  {}", step.detail);
    }
    println!("\nSnapshot:\n{}", serde_json::to_string_pretty(&walkthrough.snapshot.to_json())?);
    Ok(())
}

fn cmd_list(config: &AppConfig, format: &OutputFormat, args: FileArgs) -> anyhow::Result<()> {
    let repo = open(config, &args.file)?;
    let mut views = Vec::new();
    for id in repo.ids()? {
        views.extend(repo.load(&id)?);
    }
    if matches!(format, OutputFormat::Json) {
        let rows: Vec<Json> = views
            .iter()
            .map(|ec| json!({ "id": ec.id().as_str(), "kind": ec.kind() }))
            .collect();
        return print_json(&Json::Array(rows));
    }
    for ec in &views {
        let parent = match ec.record().parent() {
            Some(parent) => format!(" ← {}", parent.as_str().yellow()),
            None => String::new(),
        };
        println!("{}  {}{}", ec.id().as_str().bold(), ec.kind().cyan(), parent);
    }
    println!("{} records", views.len());
    Ok(())
}

fn cmd_get(config: &AppConfig, format: &OutputFormat, args: KeyArgs) -> anyhow::Result<()> {
    let repo = open(config, &args.file)?;
    let fetched = load(&repo, &args.id)?.get(&args.key)?;
    if matches!(format, OutputFormat::Json) {
        return print_json(&fetched_json(&fetched));
    }
    match &fetched {
        Fetched::Literal(scalar) => println!("{scalar}"),
        Fetched::View(ec) => println!("→ {} ({})", ec.id().as_str().yellow(), ec.kind().cyan()),
        Fetched::Views(ecs) => {
            for ec in ecs {
                println!("→ {} ({})", ec.id().as_str().yellow(), ec.kind().cyan());
            }
        }
    }
    Ok(())
}

fn cmd_keys(config: &AppConfig, format: &OutputFormat, args: KeysArgs) -> anyhow::Result<()> {
    let repo = open(config, &args.file)?;
    let keys = load(&repo, &args.id)?.keys(args.recursive)?;
    if matches!(format, OutputFormat::Json) {
        return print_json(&keys.iter().map(|k| Json::String(k.clone())).collect());
    }
    for key in &keys {
        println!("{key}");
    }
    Ok(())
}

fn cmd_resolve(config: &AppConfig, args: ResolveArgs) -> anyhow::Result<()> {
    let repo = open(config, &args.file)?;
    let excludes: Vec<&str> = args.exclude.iter().map(String::as_str).collect();
    let resolved = load(&repo, &args.id)?.resolve_excluding(&args.key, &excludes)?;
    print_json(&resolved.to_json())
}

fn cmd_snapshot(config: &AppConfig, args: RecordArgs) -> anyhow::Result<()> {
    let repo = open(config, &args.file)?;
    let snapshot = load(&repo, &args.id)?.snapshot()?;
    print_json(&snapshot.to_json())
}

fn cmd_declaration(config: &AppConfig, format: &OutputFormat, args: KeyArgs) -> anyhow::Result<()> {
    let repo = open(config, &args.file)?;
    let declaration = load(&repo, &args.id)?.declaration_of(&args.key)?;
    if matches!(format, OutputFormat::Json) {
        let json = match &declaration {
            Some(d) => json!({ "id": d.id.as_str(), "@id": d.uri, "@type": d.value_type }),
            None => Json::Null,
        };
        return print_json(&json);
    }
    match declaration {
        Some(d) => println!("{}: {} ({})", args.key.bold(), d.uri.blue(), d.value_type.cyan()),
        None => println!("{} {} is not declared", "!".yellow().bold(), args.key.bold()),
    }
    Ok(())
}

fn cmd_transfer(config: &AppConfig, args: TransferArgs) -> anyhow::Result<()> {
    let repo = open(config, &args.file)?;
    let source = load(&repo, &args.id)?;
    let target = Repository::with_builtin_views(config.store.clone(), config.ec.clone());
    let id = source.transfer(&target)?;
    let exported = target.export_json()?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, serde_json::to_string_pretty(&exported)?)
                .with_context(|| format!("writing {}", path.display()))?;
            let count = exported.as_array().map_or(0, Vec::len);
            println!(
                "{} Transferred {} ({} records) to {}",
                "✓".green().bold(),
                id.as_str().yellow(),
                count,
                path.display()
            );
            Ok(())
        }
        None => print_json(&exported),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const RECORDS: &str = r#"[
        { "id": "Entity" },
        { "id": "e1", "*": "Entity", "color": "red" },
        { "id": "e2", "*": "e1", "owner": "e1", "tags": ["e1", "Entity"] }
    ]"#;

    fn write_records(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("records.json");
        std::fs::write(&path, RECORDS).unwrap();
        path
    }

    #[test]
    fn open_imports_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open(&AppConfig::default(), &write_records(&dir)).unwrap();
        assert_eq!(repo.ids().unwrap().len(), 3);
        let e2 = load(&repo, "e2").unwrap();
        assert_eq!(e2.get("color").unwrap().as_str(), Some("red"));
    }

    #[test]
    fn open_reports_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = open(&AppConfig::default(), &path).unwrap_err();
        assert!(err.to_string().contains("parsing"));
    }

    #[test]
    fn load_reports_missing_ids() {
        let repo = Repository::in_memory();
        let err = load(&repo, "ghost").unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn fetched_values_render_as_ids() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open(&AppConfig::default(), &write_records(&dir)).unwrap();
        let e2 = load(&repo, "e2").unwrap();
        assert_eq!(fetched_json(&e2.get("owner").unwrap()), json!("e1"));
        assert_eq!(fetched_json(&e2.get("tags").unwrap()), json!(["e1", "Entity"]));
        assert_eq!(fetched_json(&e2.get("color").unwrap()), json!("red"));
    }

    #[test]
    fn transfer_writes_the_reachable_records() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("copy.json");
        cmd_transfer(
            &AppConfig::default(),
            TransferArgs {
                file: write_records(&dir),
                id: "e1".into(),
                output: Some(output.clone()),
            },
        )
        .unwrap();

        let copy: Json = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        let ids: Vec<&str> = copy
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["Entity", "e1"]);
    }
}
