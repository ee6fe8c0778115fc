use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use tether_mapper::{BlankNodePolicy, CommitSummary, MapperConfig, ObjectMapper};
use tether_object::{
    ContainerBinding, ElementType, Handle, ObjectGraph, PropertyDescriptor, ScalarType,
    TypeDescriptor, TypeRegistry, Variant,
};
use tether_store::{ntriples, InMemoryTripleStore, TripleStore};
use tether_txn::TransactionManager;
use tracing::info;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Demo(args) => cmd_demo(load_config(cli.config.as_deref())?, args),
        Command::Config(args) => {
            let config = if args.defaults {
                MapperConfig::default()
            } else {
                load_config(cli.config.as_deref())?
            };
            cmd_config(&config)
        }
    }
}

/// The configuration in `path`, or the defaults without one.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<MapperConfig> {
    let Some(path) = path else {
        return Ok(MapperConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn cmd_config(config: &MapperConfig) -> anyhow::Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn cmd_demo(mut config: MapperConfig, args: DemoArgs) -> anyhow::Result<()> {
    if args.no_blank_nodes {
        config.store.blank_nodes = BlankNodePolicy::NoBlankNodes;
    }
    let report = run_demo(config, args.people)?;
    for (i, summary) in report.commits.iter().enumerate() {
        println!(
            "{} Commit {}: {} objects stored, {} triples removed (+{} / -{})",
            "✓".green().bold(),
            i + 1,
            summary.stored.to_string().bold(),
            summary.removed,
            summary.additions.to_string().green(),
            summary.removals.to_string().red(),
        );
    }
    println!("  Reloaded: {} objects", report.reloaded.to_string().cyan());
    println!("  Store: {} triples", report.triples.to_string().bold());

    match &args.output {
        Some(path) => {
            std::fs::write(path, &report.dump)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("  Dump: {}", path.display().to_string().yellow());
        }
        None => print!("\n{}", report.dump),
    }
    Ok(())
}

pub struct DemoReport {
    pub commits: Vec<CommitSummary>,
    pub reloaded: usize,
    pub triples: usize,
    pub dump: String,
}

pub fn demo_registry() -> TypeRegistry {
    let mut reg = TypeRegistry::new();
    reg.register_container(
        "Colours",
        ContainerBinding::sequence(ElementType::Scalar(ScalarType::String)),
    );
    reg.register_container(
        "Friends",
        ContainerBinding::set(ElementType::Object("Person".into())),
    );
    reg.register(
        TypeDescriptor::new("Person")
            .property(PropertyDescriptor::identity("uri"))
            .property(PropertyDescriptor::scalar("name", ScalarType::String))
            .property(PropertyDescriptor::scalar("age", ScalarType::Int).with_default(0))
            .property(PropertyDescriptor::container("colours", "Colours"))
            .property(PropertyDescriptor::container("friends", "Friends")),
    );
    reg.register(
        TypeDescriptor::new("Folder")
            .property(PropertyDescriptor::scalar("title", ScalarType::String)),
    );
    reg.register(
        TypeDescriptor::new("Note")
            .with_parent()
            .property(PropertyDescriptor::scalar("text", ScalarType::String)),
    );
    reg
}

const NAMES: [&str; 5] = ["Ada", "Brook", "Cyd", "Dara", "Eli"];
const COLOURS: [&str; 4] = ["turquoise", "red", "black", "amber"];

/// Build a sample graph, commit it, edit and commit again, then load the
/// result into a second session.
pub fn run_demo(config: MapperConfig, people: usize) -> anyhow::Result<DemoReport> {
    let registry = Arc::new(demo_registry());
    let store = Arc::new(InMemoryTripleStore::new());
    let manager = Arc::new(TransactionManager::new(store.clone()));
    let mut mapper = ObjectMapper::new(manager.clone(), registry.clone(), config.clone());

    let mut graph = ObjectGraph::new();
    let mut persons: Vec<Handle> = Vec::with_capacity(people);
    for i in 0..people {
        let p = registry.build("Person", &mut graph, None)?;
        let name = NAMES[i % NAMES.len()];
        if i == 0 {
            registry.set_property(&mut graph, p, "uri", Variant::Uri(format!("urn:demo:{name}")))?;
        }
        registry.set_property(&mut graph, p, "name", Variant::from(name))?;
        registry.set_property(&mut graph, p, "age", Variant::Int(20 + i as i64))?;
        let colours = COLOURS.iter().cycle().skip(i).take(3).map(|c| Variant::from(*c));
        registry.set_property(&mut graph, p, "colours", Variant::List(colours.collect()))?;
        persons.push(p);
    }
    for (i, &p) in persons.iter().enumerate() {
        if let Some(&next) = persons.get(i + 1) {
            registry.set_property(&mut graph, p, "friends", Variant::List(vec![Variant::Object(next)]))?;
        }
    }
    let folder = registry.build("Folder", &mut graph, None)?;
    registry.set_property(&mut graph, folder, "title", Variant::from("notes"))?;
    let mut notes = Vec::new();
    for text in ["first", "second", "third"] {
        let note = registry.build("Note", &mut graph, Some(folder))?;
        registry.set_property(&mut graph, note, "text", Variant::from(text))?;
        notes.push(note);
    }

    mapper.add_all(&mut graph, &persons)?;
    mapper.add(&mut graph, folder)?;
    let mut commits = vec![mapper.commit(&mut graph)?];

    if let Some(&first) = persons.first() {
        registry.set_property(&mut graph, first, "age", Variant::Int(99))?;
    }
    if let Some(&last) = notes.last() {
        graph.destroy(last)?;
    }
    commits.push(mapper.commit(&mut graph)?);

    let mut reader = ObjectMapper::new(manager, registry, config);
    let mut view = ObjectGraph::new();
    reader.load_all(&mut view)?;
    info!(objects = view.len(), "reloaded demo graph");

    Ok(DemoReport {
        commits,
        reloaded: view.len(),
        triples: store.len()?,
        dump: ntriples::to_ntriples_string(store.as_ref())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_mapper::FollowPolicy;

    #[test]
    fn demo_round_trips_every_object() {
        let report = run_demo(MapperConfig::default(), 3).unwrap();
        assert_eq!(report.commits.len(), 2);
        assert_eq!(report.commits[0].stored, 7);
        assert!(report.commits[1].removed > 0);
        // three people, the folder and its two remaining notes
        assert_eq!(report.reloaded, 6);
        assert_eq!(report.dump.lines().count(), report.triples);
        assert!(report.dump.contains("<urn:demo:Ada>"));
        assert!(report.dump.contains("\"99\"^^<http://www.w3.org/2001/XMLSchema#integer>"));
    }

    #[test]
    fn demo_without_blank_nodes_synthesizes_uris() {
        let mut config = MapperConfig::default();
        config.store.blank_nodes = BlankNodePolicy::NoBlankNodes;
        let report = run_demo(config, 2).unwrap();
        assert!(report.dump.contains("<urn:tether:instance:Person/"));
        assert!(report.dump.contains("<urn:tether:instance:Folder/"));
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tether.toml");
        std::fs::write(
            &path,
            "[vocabulary]\nclass_prefix = \"http://example.org/class/\"\n\n[load]\nfollow = [\"parent\"]\n",
        )
        .unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.vocabulary.class_prefix, "http://example.org/class/");
        assert_eq!(config.load.follow, FollowPolicy::PARENT);
        assert_eq!(config.store, MapperConfig::default().store);

        assert_eq!(load_config(None).unwrap(), MapperConfig::default());
        assert!(load_config(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn effective_config_prints_as_toml() {
        let text = toml::to_string_pretty(&MapperConfig::default()).unwrap();
        let back: MapperConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, MapperConfig::default());
    }

    #[test]
    fn demo_dump_goes_to_the_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.nt");
        cmd_demo(
            MapperConfig::default(),
            DemoArgs {
                people: 1,
                output: Some(path.clone()),
                no_blank_nodes: false,
            },
        )
        .unwrap();
        let dump = std::fs::read_to_string(&path).unwrap();
        assert!(dump.lines().all(|l| l.ends_with(" .")));
        assert!(dump.contains("<urn:demo:Ada>"));
    }
}
