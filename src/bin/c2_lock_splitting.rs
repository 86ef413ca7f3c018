use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use lock_discipline::{init_tracing, AttributeStore, CoarseAttributeStore, ServerStatus};

const NUM_THREADS: usize = 4;

fn sorted(set: HashSet<String>) -> Vec<String> {
    let mut v: Vec<_> = set.into_iter().collect();
    v.sort();
    v
}

fn main() -> Result<()> {
    init_tracing();

    println!("===== reduced lock scope =====");
    let store = AttributeStore::new();
    store.set_user_location("zhangsan", "Beijing");

    println!(
        "zhangsan matches 'Beijing'? {}",
        store.user_location_matches("zhangsan", "Beijing")?
    );
    println!(
        "zhangsan matches 'Shanghai'? {}",
        store.user_location_matches("zhangsan", "Shanghai")?
    );
    println!(
        "lisi matches 'Beijing'? {}",
        store.user_location_matches("lisi", "Beijing")?
    );

    let coarse = CoarseAttributeStore::new();
    coarse.set_user_location("zhangsan", "Beijing");
    println!(
        "coarse store, zhangsan matches 'Beijing'? {}",
        coarse.user_location_matches("zhangsan", "Beijing")?
    );

    println!("\n===== lock splitting =====");
    let status = Arc::new(ServerStatus::new());

    status.add_user("userA");
    status.add_user("userB");
    status.add_query("select * from t1");
    status.add_query("update t2 set name='abc'");

    let v: Vec<_> = (0..NUM_THREADS)
        .map(|i| {
            let status0 = status.clone();
            std::thread::spawn(move || {
                if i & 1 == 0 {
                    status0.add_user(format!("user{}", i));
                } else {
                    status0.add_query(format!("select * from t{}", i + 10));
                }
            })
        })
        .collect();

    for t in v {
        t.join().map_err(|_| anyhow!("registry thread panicked"))?;
    }

    println!("users: {:?}", sorted(status.users_snapshot()));
    println!("queries: {:?}", sorted(status.queries_snapshot()));
    Ok(())
}
