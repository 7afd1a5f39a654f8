//! The guided walkthrough run by `ecr tutorial`.
//!
//! Each step builds on the previous ones in a single in-memory repository
//! and checks its own claims, so a failing step stops the walkthrough with
//! an error naming what did not hold.

use anyhow::{ensure, Context};
use ecr_core::{Component, Ec, Repository, Resolved};
use ecr_types::{Record, RecordId, Scalar};

use crate::config::AppConfig;

pub struct Step {
    pub title: &'static str,
    pub detail: String,
}

pub struct Walkthrough {
    pub steps: Vec<Step>,
    /// Complete state of the record that overrides an inherited value.
    pub snapshot: Resolved,
}

fn named(id: &str) -> anyhow::Result<Record> {
    Ok(Record::with_id(RecordId::new(id)?))
}

pub fn run(config: &AppConfig) -> anyhow::Result<Walkthrough> {
    let repo = Repository::with_builtin_views(config.store.clone(), config.ec.clone());
    let mut steps = Vec::new();

    let mut ec1 = Ec::empty(&repo)?;
    ec1.declare_with("color", Some("https://schema.org/color"), Some("xsd:string"))?
        .let_("color", "red")?;
    let mut ec2 = ec1.fork()?;
    ec2.declare("size")?.let_("size", "large")?;
    let mut ec3 = ec1.fork()?;
    ec3.let_("color", "green")?;
    ensure!(ec2.get("color")?.as_str() == Some("red"), "fork did not inherit color");
    ensure!(ec3.get("color")?.as_str() == Some("green"), "fork did not override color");
    ensure!(ec1.get("color")?.as_str() == Some("red"), "override leaked into the parent");
    steps.push(Step {
        title: "Inheritance",
        detail: format!(
            "{} has color=red; fork {} inherits it, fork {} overrides it with green",
            ec1.id().short_id(),
            ec2.id().short_id(),
            ec3.id().short_id()
        ),
    });

    let declaration = ec3
        .declaration_of("color")?
        .context("color declaration is inherited")?;
    ensure!(declaration.uri == "https://schema.org/color", "wrong color uri");
    steps.push(Step {
        title: "Declarations",
        detail: format!(
            "color means {} of type {}, found through the parent's context",
            declaration.uri, declaration.value_type
        ),
    });

    let entity = Ec::new(&repo, named("Entity")?)?;
    let mut component = entity.fork_with(named("Component")?)?;
    component.declare("describes")?;
    let mut location = component.fork()?;
    location.declare("lat")?.declare("lon")?;
    let lat = Scalar::float(-10.4).context("latitude is finite")?;
    location.let_("lat", lat)?.let_("lon", -64)?;
    let e1 = entity.fork_with(named("e1")?)?;
    location.let_("describes", &e1)?;
    let location = repo
        .load(location.id())?
        .context("location component was stored")?;
    let location = Component::try_from(location)?;
    ensure!(
        location.describes()?.ids() == vec![e1.id()],
        "location does not describe e1"
    );
    steps.push(Step {
        title: "Components",
        detail: format!(
            "{} is a {} describing {}",
            location.as_ec().id().short_id(),
            location.as_ec().kind(),
            e1.id()
        ),
    });

    let mut decomposes = component.fork()?;
    decomposes
        .declare_with("isdecomposedby", Some("ifc5:isdecomposedby"), None)?
        .declare_with("decomposes", Some("ifc5:decomposes"), None)?;
    let a_building = entity.fork_with(named("a_building")?)?;
    let a_wall = entity.fork_with(named("a_wall")?)?;
    let a_door = entity.fork_with(named("a_door")?)?;
    let mut relation = decomposes.fork()?;
    relation
        .let_("describes", &a_wall)?
        .let_("decomposes", &a_building)?;
    ensure!(
        relation.get("decomposes")?.ids() == vec![a_building.id()],
        "relation does not decompose a_building"
    );
    relation.let_("describes", &a_door)?;
    ensure!(
        relation.get("describes")?.ids() == vec![a_door.id(), a_wall.id()],
        "relinking did not accumulate newest first"
    );
    steps.push(Step {
        title: "Relations",
        detail: format!(
            "{} decomposes {} and describes {}, {}",
            relation.id().short_id(),
            a_building.id(),
            a_door.id(),
            a_wall.id()
        ),
    });

    let snapshot = ec3.snapshot()?;
    let inherited = snapshot.get("*").and_then(|parent| parent.get("color"));
    ensure!(
        inherited == Some(&Resolved::Literal("red".into())),
        "snapshot lost the inherited color"
    );
    steps.push(Step {
        title: "Snapshots",
        detail: format!(
            "{} expands to {} top-level keys",
            ec3.id().short_id(),
            snapshot.as_map().map_or(0, |m| m.len())
        ),
    });

    let target = Repository::with_builtin_views(config.store.clone(), config.ec.clone());
    ensure!(!target.has_id(a_building.id())?, "target repository is not empty");
    let copied = a_building.transfer(&target)?;
    let copy = target
        .load(&copied)?
        .context("transferred record is loadable")?;
    ensure!(copy.id() == a_building.id(), "transfer changed the id");
    ensure!(
        copy.snapshot()? == a_building.snapshot()?,
        "transferred copy differs from the source"
    );
    steps.push(Step {
        title: "Transfer",
        detail: format!(
            "{} copied with {} records into a fresh repository",
            copied,
            target.ids()?.len()
        ),
    });

    Ok(Walkthrough { steps, snapshot })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecr_core::EcConfig;
    use ecr_store::{IdStrategy, StoreConfig};

    #[test]
    fn walkthrough_runs_with_defaults() {
        let walkthrough = run(&AppConfig::default()).unwrap();
        let titles: Vec<_> = walkthrough.steps.iter().map(|s| s.title).collect();
        assert_eq!(
            titles,
            ["Inheritance", "Declarations", "Components", "Relations", "Snapshots", "Transfer"]
        );
        assert_eq!(
            walkthrough.snapshot.get("color"),
            Some(&Resolved::Literal("green".into()))
        );
    }

    #[test]
    fn walkthrough_runs_with_time_ordered_ids() {
        let config = AppConfig {
            store: StoreConfig { id_strategy: IdStrategy::UuidV7 },
            ec: EcConfig { warn_undeclared: false, ..EcConfig::default() },
        };
        assert_eq!(run(&config).unwrap().steps.len(), 6);
    }

    #[test]
    fn walkthrough_fails_under_a_tiny_depth_limit() {
        let config = AppConfig {
            ec: EcConfig { max_depth: 1, ..EcConfig::default() },
            ..AppConfig::default()
        };
        assert!(run(&config).is_err());
    }
}
