#![no_main]

use libfuzzer_sys::fuzz_target;
use tokenized_di::{Injector, Provider, Token};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let tokens: Vec<Token> = (0..8).map(|i| Token::symbol(format!("t{i}"))).collect();
    let depth = (data[0] % 6) as usize + 1;

    // Build a chain of injectors, each byte deciding which tokens a level binds
    let mut levels = vec![Injector::new(Vec::new())];
    for level in 1..depth {
        let mask = data.get(level).copied().unwrap_or(0);
        let providers = (0..8)
            .filter(|bit| mask & (1 << bit) != 0)
            .map(|bit| Provider::value(tokens[bit].clone(), level * 8 + bit));
        let child = levels[level - 1].create_child(providers);
        levels.push(child);
    }

    let leaf = &levels[depth - 1];
    for (bit, token) in tokens.iter().enumerate() {
        // Nearest binding wins
        let expected = (1..depth)
            .rev()
            .find(|level| data.get(*level).copied().unwrap_or(0) & (1 << bit) != 0)
            .map(|level| level * 8 + bit);
        match expected {
            Some(v) => assert_eq!(*leaf.get::<usize>(token).unwrap(), v),
            None => assert!(leaf.get_any(token).is_err()),
        }
    }

    for &selector in data.iter().skip(depth) {
        let token = &tokens[(selector % 8) as usize];
        let sync = leaf.get_any(token).ok();
        let promised = futures::executor::block_on(leaf.get_promise_any(token).value()).ok();
        assert_eq!(sync.is_some(), promised.is_some());
    }
});
