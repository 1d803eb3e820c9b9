/// Unit tests for DiError and DiResult types
use std::error::Error;
use std::sync::Arc;

use tokenized_di::{DiError, DiResult, Token};

struct ServiceA;
struct ServiceB;

#[test]
fn test_error_display_no_provider() {
    let token = Token::symbol("Database");
    let error = DiError::NoProvider {
        token: token.clone(),
        chain: vec![token],
    };
    assert_eq!(error.to_string(), "No provider for Database!");
}

#[test]
fn test_error_display_no_provider_with_chain() {
    let error = DiError::NoProvider {
        token: Token::symbol("Database"),
        chain: vec![Token::symbol("UserService"), Token::symbol("Database")],
    };
    assert_eq!(
        error.to_string(),
        "No provider for Database! (UserService -> Database)"
    );
}

#[test]
fn test_error_display_cyclic() {
    let error = DiError::CyclicDependency {
        chain: vec![Token::of::<ServiceA>(), Token::of::<ServiceB>(), Token::of::<ServiceA>()],
    };
    let display_str = error.to_string();
    assert!(display_str.starts_with("Cyclic dependency: "));
    assert!(display_str.contains("ServiceA -> "));
    assert!(display_str.contains("ServiceB -> "));
    assert_eq!(error.chain().map(|c| c.len()), Some(3));
}

#[test]
fn test_error_display_async_in_sync() {
    let error = DiError::AsyncDependencyInSyncContext {
        token: Token::symbol("pool"),
    };
    assert_eq!(
        error.to_string(),
        "Cannot instantiate pool synchronously, it is provided as a promise"
    );
    assert!(error.chain().is_none());
}

#[test]
fn test_instantiation_preserves_source() {
    let cause: Arc<dyn Error + Send + Sync> = Arc::new(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "refused",
    ));
    let error = DiError::Instantiation {
        token: Token::symbol("socket"),
        cause,
    };

    assert_eq!(error.to_string(), "Error during instantiation of socket: refused");
    assert_eq!(error.source().map(|s| s.to_string()).as_deref(), Some("refused"));

    let DiError::Instantiation { cause, .. } = &error else {
        unreachable!()
    };
    let io = cause.downcast_ref::<std::io::Error>().expect("original type survives");
    assert_eq!(io.kind(), std::io::ErrorKind::ConnectionRefused);
}

#[test]
fn test_error_display_misc() {
    assert_eq!(
        DiError::TypeMismatch("u32").to_string(),
        "Type mismatch for: u32"
    );
    assert_eq!(DiError::DepthExceeded(8).to_string(), "Max depth 8 exceeded");
    assert_eq!(
        DiError::ArgumentOutOfRange { index: 3, len: 2 }.to_string(),
        "Argument 3 out of range, factory received 2"
    );
    assert_eq!(
        DiError::ArgumentKind { index: 0, expected: "a promise" }.to_string(),
        "Argument 0 is not a promise"
    );
    assert_eq!(
        DiError::UnannotatedParameter { token: Token::symbol("gauge"), index: 0 }.to_string(),
        "Parameter 0 of gauge has no injection token"
    );
}

#[test]
fn test_error_is_clone_and_shares_cause() {
    let error = DiError::Instantiation {
        token: Token::symbol("x"),
        cause: Arc::new(std::fmt::Error),
    };
    let copy = error.clone();
    match (&error, &copy) {
        (DiError::Instantiation { cause: a, .. }, DiError::Instantiation { cause: b, .. }) => {
            assert!(Arc::ptr_eq(a, b));
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_di_result_alias() {
    fn fails() -> DiResult<u8> {
        Err(DiError::DepthExceeded(1))
    }
    fn succeeds() -> DiResult<u8> {
        Ok(1)
    }
    assert!(fails().is_err());
    assert_eq!(succeeds().unwrap(), 1);
}
