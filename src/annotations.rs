//! Explicit annotations and the reader that turns them into a [`Descriptor`].
//!
//! Annotations are plain data attached to a provider when it is built. Nothing
//! is discovered at runtime: the caller lists what a factory injects and what it
//! provides, and [`read_annotations`] normalizes that into the descriptor the
//! injector consumes.

use crate::descriptors::{Descriptor, InjectionMode, ParamSpec, ProviderKind};
use crate::token::Token;

/// A single provider-level annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// Inject these tokens, in order, with the given mode
    Inject { tokens: Vec<Token>, mode: InjectionMode },
    /// Bind the provider to `token`
    Provide { token: Token, is_promise: bool },
    /// Attach a scope marker such as [`TransientScope`](crate::TransientScope)
    Scope(Token),
    /// Treat the provider as a class
    ClassProvider,
    /// Treat the provider as a plain factory function
    FactoryProvider,
}

/// Annotation attached to one constructor parameter position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamAnnotation {
    /// The parameter's declared type; used only if nothing else claims the slot
    Type(Token),
    /// Explicit injection; the first token wins the slot
    Inject { tokens: Vec<Token>, mode: InjectionMode },
}

/// Annotation families, used by [`has_annotation`].
///
/// The promise and lazy flavours are members of the `Inject` family and
/// `ProvidePromise` is a member of the `Provide` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Inject,
    InjectPromise,
    InjectLazy,
    Provide,
    ProvidePromise,
    Scope,
    ClassProvider,
    FactoryProvider,
}

impl Annotation {
    /// Whether this annotation belongs to `kind`.
    pub fn is(&self, kind: AnnotationKind) -> bool {
        match (self, kind) {
            (Annotation::Inject { .. }, AnnotationKind::Inject) => true,
            (Annotation::Inject { mode, .. }, AnnotationKind::InjectPromise) => *mode == InjectionMode::Promise,
            (Annotation::Inject { mode, .. }, AnnotationKind::InjectLazy) => *mode == InjectionMode::Lazy,
            (Annotation::Provide { .. }, AnnotationKind::Provide) => true,
            (Annotation::Provide { is_promise, .. }, AnnotationKind::ProvidePromise) => *is_promise,
            (Annotation::Scope(_), AnnotationKind::Scope) => true,
            (Annotation::ClassProvider, AnnotationKind::ClassProvider) => true,
            (Annotation::FactoryProvider, AnnotationKind::FactoryProvider) => true,
            _ => false,
        }
    }
}

/// Ordered set of annotations describing one provider.
///
/// # Examples
///
/// ```rust
/// use tokenized_di::{Annotations, AnnotationKind, TransientScope, Token, has_annotation};
///
/// struct Engine;
/// struct Car;
///
/// let annotations = Annotations::new()
///     .inject([Token::of::<Engine>()])
///     .provide(Token::of::<Car>())
///     .scope(Token::of::<TransientScope>());
///
/// assert!(has_annotation(&annotations, AnnotationKind::Inject));
/// assert!(!has_annotation(&annotations, AnnotationKind::ProvidePromise));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    pub(crate) annotations: Vec<Annotation>,
    pub(crate) parameters: Vec<Vec<ParamAnnotation>>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, annotation: Annotation) -> Self {
        annotate(&mut self, annotation);
        self
    }

    pub fn inject(self, tokens: impl IntoIterator<Item = Token>) -> Self {
        self.inject_with(tokens, InjectionMode::Direct)
    }

    pub fn inject_promise(self, tokens: impl IntoIterator<Item = Token>) -> Self {
        self.inject_with(tokens, InjectionMode::Promise)
    }

    pub fn inject_lazy(self, tokens: impl IntoIterator<Item = Token>) -> Self {
        self.inject_with(tokens, InjectionMode::Lazy)
    }

    fn inject_with(self, tokens: impl IntoIterator<Item = Token>, mode: InjectionMode) -> Self {
        self.with(Annotation::Inject {
            tokens: tokens.into_iter().collect(),
            mode,
        })
    }

    pub fn provide(self, token: Token) -> Self {
        self.with(Annotation::Provide { token, is_promise: false })
    }

    pub fn provide_promise(self, token: Token) -> Self {
        self.with(Annotation::Provide { token, is_promise: true })
    }

    pub fn scope(self, scope: Token) -> Self {
        self.with(Annotation::Scope(scope))
    }

    pub fn class_provider(self) -> Self {
        self.with(Annotation::ClassProvider)
    }

    pub fn factory_provider(self) -> Self {
        self.with(Annotation::FactoryProvider)
    }

    /// Annotates parameter `index`, growing the parameter list as needed.
    pub fn parameter(mut self, index: usize, annotation: ParamAnnotation) -> Self {
        if self.parameters.len() <= index {
            self.parameters.resize_with(index + 1, Vec::new);
        }
        self.parameters[index].push(annotation);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }
}

/// Append an annotation.
pub fn annotate(target: &mut Annotations, annotation: Annotation) {
    target.annotations.push(annotation);
}

/// Whether any provider-level annotation belongs to `kind`.
pub fn has_annotation(target: &Annotations, kind: AnnotationKind) -> bool {
    target.annotations.iter().any(|a| a.is(kind))
}

/// Collect the interesting metadata from a set of annotations.
///
/// Provider-level `Inject` annotations contribute one parameter per token, in
/// order. The last `Provide` wins. Parameter annotations are applied after: a
/// `Type` annotation fills its slot only if nothing claimed it yet, an `Inject`
/// annotation always takes the slot with its first token. Positions that end
/// up with no token are recorded in [`Descriptor::unannotated`]; the injector
/// refuses such a provider rather than renumbering its arguments.
pub fn read_annotations(target: &Annotations) -> Descriptor {
    let mut descriptor = Descriptor::default();
    let mut slots: Vec<Option<ParamSpec>> = Vec::new();

    for annotation in &target.annotations {
        match annotation {
            Annotation::Inject { tokens, mode } => {
                slots.extend(tokens.iter().map(|token| {
                    Some(ParamSpec {
                        token: token.clone(),
                        mode: *mode,
                    })
                }));
            }
            Annotation::Provide { token, is_promise } => {
                descriptor.provide.token = Some(token.clone());
                descriptor.provide.is_promise = *is_promise;
            }
            Annotation::Scope(scope) => descriptor.scopes.push(scope.clone()),
            Annotation::ClassProvider => descriptor.kind = Some(ProviderKind::Class),
            Annotation::FactoryProvider => descriptor.kind = Some(ProviderKind::Factory),
        }
    }

    for (idx, param) in target.parameters.iter().enumerate() {
        if slots.len() <= idx {
            slots.resize(idx + 1, None);
        }
        for annotation in param {
            match annotation {
                ParamAnnotation::Type(token) if slots[idx].is_none() => {
                    slots[idx] = Some(ParamSpec::direct(token.clone()));
                }
                ParamAnnotation::Type(_) => {}
                ParamAnnotation::Inject { tokens, mode } => {
                    if let Some(token) = tokens.first() {
                        slots[idx] = Some(ParamSpec {
                            token: token.clone(),
                            mode: *mode,
                        });
                    }
                }
            }
        }
    }

    descriptor.unannotated = slots
        .iter()
        .enumerate()
        .filter_map(|(idx, slot)| slot.is_none().then_some(idx))
        .collect();
    descriptor.params = slots.into_iter().flatten().collect();
    descriptor
}
