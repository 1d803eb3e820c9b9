#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::Arc;
use tokenized_di::{Annotations, Injector, Provider, Token, TransientScope};

#[derive(Debug, PartialEq)]
struct TestService {
    value: i32,
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 8 {
        return;
    }

    // First 4 bytes pick the registration pattern, next 4 the service value
    let pattern = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let value = i32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    let token = Token::of::<TestService>();

    match pattern % 6 {
        0 => {
            let injector = Injector::new(vec![Provider::value(token.clone(), TestService { value })]);
            let service = injector.get::<TestService>(&token).unwrap();
            assert_eq!(service.value, value);
        }
        1 => {
            let injector = Injector::new(vec![Provider::factory(&Annotations::new(), move |_| {
                Ok(TestService { value })
            })]);
            let a = injector.get::<TestService>(&token).unwrap();
            let b = injector.get::<TestService>(&token).unwrap();
            assert!(Arc::ptr_eq(&a, &b));
        }
        2 => {
            let injector = Injector::new(vec![Provider::class(
                &Annotations::new().scope(TransientScope::token()),
                move |_| Ok(TestService { value }),
            )]);
            let a = injector.get::<TestService>(&token).unwrap();
            let b = injector.get::<TestService>(&token).unwrap();
            assert!(!Arc::ptr_eq(&a, &b));
            assert_eq!(a, b);
        }
        3 => {
            // Later registrations replace earlier ones
            let injector = Injector::new(Vec::new());
            for (i, chunk) in data[8..].chunks(4).enumerate() {
                let v = chunk.iter().fold(value, |acc, b| acc.wrapping_add(*b as i32));
                injector.register(Provider::value(token.clone(), TestService { value: v }));
                let got = injector.get::<TestService>(&token).unwrap();
                assert_eq!(got.value, v, "registration {i} not visible");
            }
        }
        4 => {
            // Symbols with equal names are still distinct tokens
            let name = String::from_utf8_lossy(&data[8..]).into_owned();
            let first = Token::symbol(name.as_str());
            let second = Token::symbol(name.as_str());
            assert_ne!(first, second);
            let injector = Injector::new(vec![Provider::value(first.clone(), TestService { value })]);
            assert!(injector.get_any(&first).is_ok());
            assert!(injector.get_any(&second).is_err());
        }
        _ => {
            let injector = Injector::new(vec![Provider::factory(&Annotations::new(), move |_| {
                if value < 0 {
                    Err("negative".into())
                } else {
                    Ok(TestService { value })
                }
            })]);
            let result = injector.get::<TestService>(&token);
            assert_eq!(result.is_ok(), value >= 0);
            assert_eq!(injector.is_cached(&token), value >= 0);
        }
    }
});
