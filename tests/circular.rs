use std::sync::Arc;

use tokenized_di::{Annotations, Args, BoxError, DiError, Injector, InjectorConfig, Provider, Token};

struct X;
struct Y;
struct Z;

fn needs(dep: Token) -> Annotations {
    Annotations::new().inject([dep])
}

/// Helper: assert that `result` is a cycle whose chain is exactly `expected`.
fn assert_cycle<T: std::fmt::Debug>(result: Result<T, DiError>, expected: &[&str]) {
    match result {
        Err(DiError::CyclicDependency { chain }) => {
            let names: Vec<&str> = chain
                .iter()
                .map(|t| t.display_name().rsplit("::").next().unwrap_or_default())
                .collect();
            assert_eq!(names, expected, "wrong cycle chain");
        }
        other => panic!("Expected CyclicDependency error, got {:?}", other),
    }
}

#[test]
fn test_self_circular_dependency() {
    let injector = Injector::new(vec![Provider::class(&needs(Token::of::<X>()), |_| Ok(X))]);
    assert_cycle(injector.get_any(&Token::of::<X>()).map(|_| ()), &["X", "X"]);
}

#[test]
fn test_two_level_circular() {
    let injector = Injector::new(vec![
        Provider::class(&needs(Token::of::<Y>()), |_| Ok(X)),
        Provider::class(&needs(Token::of::<X>()), |_| Ok(Y)),
    ]);

    assert_cycle(injector.get_any(&Token::of::<X>()).map(|_| ()), &["X", "Y", "X"]);
    assert_cycle(injector.get_any(&Token::of::<Y>()).map(|_| ()), &["Y", "X", "Y"]);
}

#[test]
fn test_three_level_circular() {
    let injector = Injector::new(vec![
        Provider::class(&needs(Token::of::<Y>()), |_| Ok(X)),
        Provider::class(&needs(Token::of::<Z>()), |_| Ok(Y)),
        Provider::class(&needs(Token::of::<X>()), |_| Ok(Z)),
    ]);

    let err = injector.get_any(&Token::of::<X>()).err().unwrap();
    let message = err.to_string();
    assert!(message.starts_with("Cyclic dependency:"), "got: {message}");
    assert_cycle(Err::<(), _>(err), &["X", "Y", "Z", "X"]);
}

#[test]
fn test_cycle_through_promise_param() {
    let injector = Injector::new(vec![
        Provider::class(&Annotations::new().inject_promise([Token::of::<Y>()]), |_| Ok(X)),
        Provider::class(&needs(Token::of::<X>()), |_| Ok(Y)),
    ]);

    assert_cycle(injector.get_any(&Token::of::<X>()).map(|_| ()), &["X", "Y", "X"]);
}

#[tokio::test]
async fn test_cycle_in_promise_mode() {
    let injector = Injector::new(vec![
        Provider::factory_async::<X, _>(&needs(Token::of::<Y>()), |_args: Args| async {
            Ok::<_, BoxError>(X)
        }),
        Provider::class(&needs(Token::of::<X>()), |_| Ok(Y)),
    ]);

    assert_cycle(injector.get_promise::<X>(&Token::of::<X>()).await.map(|_| ()), &["X", "Y", "X"]);
}

#[test]
fn test_detection_does_not_leak_between_calls() {
    let injector = Injector::new(vec![Provider::class(&needs(Token::of::<X>()), |_| Ok(X))]);
    for _ in 0..3 {
        assert!(matches!(
            injector.get_any(&Token::of::<X>()),
            Err(DiError::CyclicDependency { .. })
        ));
    }
    assert!(!injector.is_cached(&Token::of::<X>()));
}

#[test]
fn test_diamond_is_not_a_cycle() {
    struct Top;
    struct Left;
    struct Right;
    struct Bottom;

    let injector = Injector::new(vec![
        Provider::class(
            &Annotations::new().inject([Token::of::<Left>(), Token::of::<Right>()]),
            |_| Ok(Top),
        ),
        Provider::class(&needs(Token::of::<Bottom>()), |_| Ok(Left)),
        Provider::class(&needs(Token::of::<Bottom>()), |_| Ok(Right)),
        Provider::class(&Annotations::new(), |_| Ok(Bottom)),
    ]);

    assert!(injector.get_any(&Token::of::<Top>()).is_ok());
}

#[test]
fn test_lazy_breaks_the_cycle() {
    struct Parent {
        child: tokenized_di::Lazy,
    }
    struct Child {
        parent: Arc<Parent>,
    }

    let injector = Injector::new(vec![
        Provider::class(&Annotations::new().inject_lazy([Token::of::<Child>()]), |args| {
            Ok(Parent { child: args.lazy(0)? })
        }),
        Provider::class(&needs(Token::of::<Parent>()), |args| {
            Ok(Child { parent: args.get::<Parent>(0)? })
        }),
    ]);

    let parent = injector.get::<Parent>(&Token::of::<Parent>()).unwrap();
    let child = parent.child.get::<Child>().unwrap();
    assert!(Arc::ptr_eq(&child.parent, &parent));
}

#[test]
fn test_max_depth() {
    let tokens: Vec<Token> = (0..6).map(|i| Token::symbol(format!("level{i}"))).collect();
    let mut providers = Vec::new();
    for pair in tokens.windows(2) {
        providers.push(Provider::from_descriptor(
            tokenized_di::Descriptor {
                provide: tokenized_di::ProvideSpec {
                    token: Some(pair[0].clone()),
                    is_promise: false,
                },
                params: vec![tokenized_di::ParamSpec::direct(pair[1].clone())],
                ..Default::default()
            },
            tokenized_di::ProviderKind::Factory,
            |_| Ok(()),
        ));
    }
    providers.push(Provider::value(tokens[5].clone(), ()));

    let shallow = Injector::builder()
        .providers(providers)
        .config(InjectorConfig::default().with_max_depth(3))
        .build();
    assert!(matches!(
        shallow.get_any(&tokens[0]),
        Err(DiError::DepthExceeded(3))
    ));

    let deep = shallow.create_child(Vec::new());
    assert_eq!(deep.config().max_depth, 3);
}

/// `len` symbol tokens, each factory injecting the next one.
fn chain_of(len: usize) -> (Vec<Token>, Vec<Provider>) {
    let tokens: Vec<Token> = (0..len).map(|i| Token::symbol(format!("link{i}"))).collect();
    let mut providers: Vec<Provider> = tokens
        .windows(2)
        .map(|pair| {
            Provider::factory(
                &Annotations::new().provide(pair[0].clone()).inject([pair[1].clone()]),
                |_| Ok(()),
            )
        })
        .collect();
    providers.push(Provider::value(tokens[len - 1].clone(), ()));
    (tokens, providers)
}

#[test]
fn test_default_depth_chain_resolves() {
    use tokenized_di::config::DEFAULT_MAX_DEPTH;

    let (tokens, providers) = chain_of(DEFAULT_MAX_DEPTH);
    let injector = Injector::new(providers);
    assert!(injector.get_any(&tokens[0]).is_ok());
    assert!(injector.is_cached(&tokens[DEFAULT_MAX_DEPTH - 1]));

    let (tokens, providers) = chain_of(DEFAULT_MAX_DEPTH + 1);
    let injector = Injector::new(providers);
    assert!(matches!(
        injector.get_any(&tokens[0]),
        Err(DiError::DepthExceeded(depth)) if depth == DEFAULT_MAX_DEPTH
    ));
}

#[tokio::test]
async fn test_default_depth_chain_resolves_as_promise() {
    use tokenized_di::config::DEFAULT_MAX_DEPTH;

    let (tokens, providers) = chain_of(DEFAULT_MAX_DEPTH);
    let injector = Injector::new(providers);
    assert!(injector.get_promise_any(&tokens[0]).await.is_ok());
}

#[test]
fn test_lazy_to_self_inside_constructor_is_a_cycle() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Eager;

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let injector = Injector::new(vec![Provider::class(
        &Annotations::new().inject_lazy([Token::of::<Eager>()]),
        move |args| {
            counter.fetch_add(1, Ordering::SeqCst);
            args.lazy(0)?.get::<Eager>()?;
            Ok(Eager)
        },
    )]);

    assert_cycle(injector.get_any(&Token::of::<Eager>()).map(|_| ()), &["Eager", "Eager"]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!injector.is_cached(&Token::of::<Eager>()));
}

#[test]
fn test_lazy_back_to_owner_inside_constructor_is_a_cycle() {
    struct Owner;
    struct Dependent;

    let injector = Injector::new(vec![
        Provider::class(&Annotations::new().inject_lazy([Token::of::<Dependent>()]), |args| {
            args.lazy(0)?.get::<Dependent>()?;
            Ok(Owner)
        }),
        Provider::class(&needs(Token::of::<Owner>()), |_| Ok(Dependent)),
    ]);

    assert_cycle(
        injector.get_any(&Token::of::<Owner>()).map(|_| ()),
        &["Owner", "Dependent", "Owner"],
    );
}

#[test]
fn test_lazy_kept_past_constructor_resolves_normally() {
    struct Holder {
        me: tokenized_di::Lazy,
    }

    let injector = Injector::new(vec![Provider::class(
        &Annotations::new().inject_lazy([Token::of::<Holder>()]),
        |args| Ok(Holder { me: args.lazy(0)? }),
    )]);

    let holder = injector.get::<Holder>(&Token::of::<Holder>()).unwrap();
    let again = holder.me.get::<Holder>().unwrap();
    assert!(Arc::ptr_eq(&holder, &again));
}

#[tokio::test]
async fn test_async_lazy_to_self_inside_constructor_is_a_cycle() {
    struct Pending;

    let injector = Injector::new(vec![Provider::factory_async::<Pending, _>(
        &Annotations::new().inject_lazy([Token::of::<Pending>()]),
        |args: Args| async move {
            args.lazy(0)?.get_async::<Pending>().await?;
            Ok::<_, BoxError>(Pending)
        },
    )]);

    let result = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        injector.get_promise::<Pending>(&Token::of::<Pending>()),
    )
    .await
    .expect("resolution must not hang");
    assert_cycle(result.map(|_| ()), &["Pending", "Pending"]);
    assert!(!injector.is_cached(&Token::of::<Pending>()));
}
