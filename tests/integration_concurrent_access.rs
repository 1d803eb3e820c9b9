/// Concurrent access integration tests
///
/// The injector never spawns work itself, but it is shared across threads and
/// tasks; these tests check that the cache keeps one instance per token.
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use tokenized_di::{Annotations, Args, BoxError, Injector, Provider, Token};

#[derive(Debug)]
struct Shared {
    id: u32,
}

#[test]
fn test_threads_observe_one_cached_instance() {
    let created = Arc::new(AtomicU32::new(0));
    let counter = created.clone();
    let injector = Injector::new(vec![Provider::class(&Annotations::new(), move |_| {
        thread::sleep(Duration::from_millis(5));
        Ok(Shared { id: counter.fetch_add(1, Ordering::SeqCst) })
    })]);

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let injector = injector.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                injector.get::<Shared>(&Token::of::<Shared>()).unwrap()
            })
        })
        .collect();

    let results: Vec<Arc<Shared>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // The factory may race, but only one instance ever wins the cache
    let cached = injector.get::<Shared>(&Token::of::<Shared>()).unwrap();
    for result in &results {
        assert!(Arc::ptr_eq(result, &cached), "thread saw id {}", result.id);
    }
}

#[test]
fn test_children_on_many_threads() {
    let injector = Injector::new(vec![Provider::class(&Annotations::new(), |_| Ok(Shared { id: 0 }))]);
    let token = Token::symbol("request");

    let handles: Vec<_> = (0..4u32)
        .map(|i| {
            let injector = injector.clone();
            let token = token.clone();
            thread::spawn(move || {
                let child = injector.create_child(vec![Provider::value(token.clone(), i)]);
                (*child.get::<u32>(&token).unwrap(), child.get::<Shared>(&Token::of::<Shared>()).unwrap())
            })
        })
        .collect();

    let root_shared = injector.get::<Shared>(&Token::of::<Shared>()).unwrap();
    let mut seen: Vec<u32> = Vec::new();
    for handle in handles {
        let (value, shared) = handle.join().unwrap();
        assert!(Arc::ptr_eq(&shared, &root_shared));
        seen.push(value);
    }
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 3]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tasks_share_one_async_instantiation() {
    let created = Arc::new(AtomicU32::new(0));
    let counter = created.clone();
    let injector = Injector::new(vec![Provider::factory_async::<Shared, _>(
        &Annotations::new(),
        move |_args: Args| {
            let counter = counter.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok::<_, BoxError>(Shared { id: counter.fetch_add(1, Ordering::SeqCst) })
            }
        },
    )]);

    // Start every request before any of them can finish
    let pending: Vec<_> = (0..16)
        .map(|_| injector.get_promise::<Shared>(&Token::of::<Shared>()))
        .collect();
    let tasks: Vec<_> = pending.into_iter().map(tokio::spawn).collect();

    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.unwrap().unwrap());
    }

    assert_eq!(created.load(Ordering::SeqCst), 1);
    for result in &results[1..] {
        assert!(Arc::ptr_eq(&results[0], result));
    }
}
