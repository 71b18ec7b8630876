use mediator_core::{
    EntityRepository, InMemoryRepository, MediatorConfig, MediatorRegistry, MirrorCache, Record,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

const THREADS: i64 = 8;
const PER_THREAD: i64 = 50;

#[test]
fn shared_repository_pairs_every_operation_with_one_publish() {
    let registry = MediatorRegistry::new();
    let mediator = registry
        .register_repository_mediator::<Record>(MediatorConfig::default())
        .unwrap();
    let added = Arc::new(AtomicUsize::new(0));
    let deleted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&added);
    mediator.on_added(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let counter = Arc::clone(&deleted);
    mediator.on_deleted(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let cache = MirrorCache::new();
    cache.attach(&mediator);

    let repo = Arc::new(InMemoryRepository::new(Arc::clone(&mediator)));
    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                for offset in 0..PER_THREAD {
                    let record = Record::new(worker * PER_THREAD + offset);
                    repo.add(record.clone()).unwrap();
                    if offset % 2 == 0 {
                        repo.delete(&record).unwrap();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let total = (THREADS * PER_THREAD) as usize;
    assert_eq!(added.load(Ordering::SeqCst), total);
    assert_eq!(deleted.load(Ordering::SeqCst), total / 2);
    assert_eq!(repo.len(), total / 2);
    assert_eq!(cache.len(), repo.len());
}
