//! Keep a pool of entities on the main thread and query snapshots of it on
//! a worker.
//!
//! Run with `cargo run -p stash --example query_snapshot`.

use stash::prelude::*;

#[derive(Clone, Debug)]
struct Entity {
    name: String,
    hp: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut pool = InstancePool::with_config(PoolConfig::new(16))?;
    let mut handles = Vec::new();
    for (i, name) in ["ash", "birch", "cedar", "elm", "fir"].iter().enumerate() {
        handles.push(pool.insert(Entity {
            name: name.to_string(),
            hp: 10 * (i as u32 + 1),
        }));
    }

    let mut engine = QueryEngine::new(QueryConfig::worker())?;
    let alive = engine.subscribe(|p: &InstancePool<Entity>| p.len());

    for round in 0..3 {
        // Damage everyone; remove the fallen.
        for &h in &handles {
            if let Some(e) = pool.get_mut(h) {
                e.hp = e.hp.saturating_sub(15);
            }
        }
        let fallen: Vec<Handle> = pool
            .handles()
            .filter(|&h| pool[h].hp == 0)
            .collect();
        for h in fallen {
            let e = pool.remove(h)?;
            println!("round {round}: {} fell", e.name);
        }

        engine.set_data(pool.clone());
        let strongest = engine.register(|p: &InstancePool<Entity>| {
            p.iter().max_by_key(|e| e.hp).map(|e| e.name.clone())
        });
        engine.update()?;
        println!("round {round}: strongest = {:?}", strongest.wait()?);
    }

    engine.sync()?;
    println!("alive per round: {:?}", alive.drain());

    // Handles to removed entities stay dead even after slots are reused.
    let stale = handles[0];
    pool.insert(Entity {
        name: "oak".into(),
        hp: 99,
    });
    match pool.check(stale) {
        Ok(()) => println!("{stale} still valid"),
        Err(e) => println!("{stale}: {e}"),
    }
    Ok(())
}
