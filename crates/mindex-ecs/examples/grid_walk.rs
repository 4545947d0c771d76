//! Walkers on a small grid, with a location index answering "who is here?".
//!
//! Run with: `RUST_LOG=mindex=debug cargo run -p mindex-ecs --example grid_walk`

use anyhow::Context;
use mindex_ecs::prelude::*;

const WIDTH: i32 = 4;
const STEPS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Location {
    x: i32,
    y: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Name(String);

/// Direction a walker moves each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Heading {
    dx: i32,
    dy: i32,
}

impl Relation<EntityId> for Location {
    type RelatedPrimary = Location;
    type RelatedValue = EntityId;

    fn relate(&self, entity: &EntityId) -> (Location, EntityId) {
        (*self, *entity)
    }
}

fn wrap(v: i32) -> i32 {
    v.rem_euclid(WIDTH)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let config = StoreConfig::from_json(r#"{ "name": "grid", "max_relation_depth": 2 }"#)
        .context("loading store config")?;
    let mut world = World::with_config(config)?;
    world.register_index::<Location>()?;

    let walkers = [
        ("ada", Location { x: 0, y: 0 }, Heading { dx: 1, dy: 0 }),
        ("bo", Location { x: 3, y: 0 }, Heading { dx: -1, dy: 0 }),
        ("cy", Location { x: 1, y: 3 }, Heading { dx: 0, dy: 1 }),
    ];
    for (name, at, heading) in walkers {
        let e = world.spawn();
        world.insert(e, Name(name.to_owned()))?;
        world.insert(e, heading)?;
        world.replace(e, at)?;
    }

    for step in 0..STEPS {
        let movers: Vec<EntityId> = world.entities().collect();
        for e in movers {
            let (Some(at), Some(heading)) =
                (world.component::<Location>(e), world.component::<Heading>(e))
            else {
                continue;
            };
            let next = Location {
                x: wrap(at.x + heading.dx),
                y: wrap(at.y + heading.dy),
            };
            world.replace(e, next)?;
        }

        for y in 0..WIDTH {
            for x in 0..WIDTH {
                let here = world.entities_with(&Location { x, y });
                if here.len() > 1 {
                    let names: Vec<String> = here
                        .iter()
                        .filter_map(|&e| world.component::<Name>(e))
                        .map(|n| n.0)
                        .collect();
                    println!("step {step}: {} meet at ({x}, {y})", names.join(" and "));
                }
            }
        }
    }

    println!("{}", world.store().stats().to_json());
    Ok(())
}
