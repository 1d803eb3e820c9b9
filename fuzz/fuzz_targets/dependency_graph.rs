#![no_main]

use libfuzzer_sys::fuzz_target;
use std::collections::HashSet;
use tokenized_di::{Annotations, DiError, Injector, Provider, Token};

const NODES: usize = 6;

/// True when following `edges` from `start` can reach a node twice.
fn has_cycle(edges: &[Vec<usize>], start: usize, path: &mut Vec<usize>, done: &mut HashSet<usize>) -> bool {
    if path.contains(&start) {
        return true;
    }
    if done.contains(&start) {
        return false;
    }
    path.push(start);
    let cyclic = edges[start].iter().any(|next| has_cycle(edges, *next, path, done));
    path.pop();
    done.insert(start);
    cyclic
}

fuzz_target!(|data: &[u8]| {
    if data.len() < NODES {
        return;
    }

    let tokens: Vec<Token> = (0..NODES).map(|i| Token::symbol(format!("node{i}"))).collect();

    // Each byte is an adjacency mask for one node
    let edges: Vec<Vec<usize>> = data[..NODES]
        .iter()
        .map(|mask| (0..NODES).filter(|bit| mask & (1 << bit) != 0).collect())
        .collect();

    let providers = edges.iter().enumerate().map(|(node, deps)| {
        let annotations = Annotations::new()
            .provide(tokens[node].clone())
            .inject(deps.iter().map(|d| tokens[*d].clone()));
        Provider::factory(&annotations, move |args| Ok(node + args.len()))
    });
    let injector = Injector::new(providers.collect::<Vec<_>>());

    for start in 0..NODES {
        let cyclic = has_cycle(&edges, start, &mut Vec::new(), &mut HashSet::new());
        match injector.get_any(&tokens[start]) {
            Ok(_) => assert!(!cyclic, "cycle from node{start} went undetected"),
            Err(DiError::CyclicDependency { chain }) => {
                assert!(cyclic);
                let last = chain.last().unwrap();
                assert!(chain[..chain.len() - 1].contains(last));
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
});
