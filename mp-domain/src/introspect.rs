//! Method tables for actors synthesized from ordinary impl blocks
//!
//! The [`introspect!`](crate::introspect!) macro wraps an `impl` block,
//! re-emits it untouched and implements [`Introspect`] for the type. The
//! generated table lists every method of the block with a descriptor of its
//! signature and, when the signature is exactly the handler contract, a
//! typed invoker:
//!
//! ```
//! use mp_domain::{introspect, ActorError, Context, Introspect};
//! use mp_meta::Meta;
//!
//! struct Items;
//!
//! introspect! {
//!     impl Items {
//!         pub fn mpi_list(&self, _ctx: &Context, m: Meta, _opts: &[Meta]) -> Result<Meta, ActorError> {
//!             Ok(m.with_attr("count", "0"))
//!         }
//!
//!         pub fn helper(&self, n: u32) -> u32 {
//!             n + 1
//!         }
//!     }
//! }
//!
//! let methods = Items::methods();
//! assert_eq!(methods.len(), 2);
//! assert!(methods[0].is_handler());
//! assert!(!methods[1].is_handler());
//! ```
//!
//! Signature descriptors and invokers are resolved at compile time through
//! method-resolution probes, so a non-conforming method is still listed and
//! can be reported as a [`ContractViolation`].

use crate::context::Context;
use crate::error::{ActorError, ContractViolation};
use mp_meta::Meta;
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed invoker of a handler method
pub type Handler<T> =
    Arc<dyn Fn(&T, &Context, Meta, &[Meta]) -> Result<Meta, ActorError> + Send + Sync>;

/// Descriptor of one parameter or return type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// `&Context`
    Context,
    /// `Meta`
    Meta,
    /// `&[Meta]`
    Options,
    /// `Result<Meta, ActorError>`
    Output,
    Other(&'static str),
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Context => f.write_str("&Context"),
            ParamKind::Meta => f.write_str("Meta"),
            ParamKind::Options => f.write_str("&[Meta]"),
            ParamKind::Output => f.write_str("Result<Meta, ActorError>"),
            ParamKind::Other(name) => f.write_str(name),
        }
    }
}

const HANDLER_PARAMS: [ParamKind; 3] = [ParamKind::Context, ParamKind::Meta, ParamKind::Options];

/// Parameters (besides `&self`) and return type of a method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<ParamKind>,
    pub output: ParamKind,
}

impl Signature {
    pub fn new(params: Vec<ParamKind>, output: ParamKind) -> Self {
        Self { params, output }
    }

    /// Checks the handler contract, naming the first mismatch
    pub fn check(&self, type_name: &str, method: &str) -> Result<(), ContractViolation> {
        if self.params.len() != HANDLER_PARAMS.len() {
            return Err(ContractViolation::Arity {
                type_name: type_name.to_string(),
                method: method.to_string(),
                found: self.params.len(),
            });
        }
        for (position, (found, expected)) in self.params.iter().zip(HANDLER_PARAMS).enumerate() {
            if *found != expected {
                return Err(ContractViolation::Param {
                    type_name: type_name.to_string(),
                    method: method.to_string(),
                    position: position + 1,
                    expected,
                    found: *found,
                });
            }
        }
        if self.output != ParamKind::Output {
            return Err(ContractViolation::Return {
                type_name: type_name.to_string(),
                method: method.to_string(),
                expected: ParamKind::Output,
                found: self.output,
            });
        }
        Ok(())
    }
}

/// One entry of a method table
pub struct MethodInfo<T> {
    pub name: &'static str,
    pub signature: Signature,
    handler: Option<Handler<T>>,
}

impl<T> MethodInfo<T> {
    pub fn new(name: &'static str, signature: Signature, handler: Option<Handler<T>>) -> Self {
        Self {
            name,
            signature,
            handler,
        }
    }

    /// True when the method satisfies the handler contract
    pub fn is_handler(&self) -> bool {
        self.handler.is_some() && self.signature.check("", self.name).is_ok()
    }

    /// The invoker, or the reason the method cannot serve as a handler
    pub fn handler(&self) -> Result<Handler<T>, ContractViolation> {
        let type_name = short_type_name::<T>();
        self.signature.check(type_name, self.name)?;
        self.handler
            .clone()
            .ok_or_else(|| ContractViolation::Unbound {
                type_name: type_name.to_string(),
                method: self.name.to_string(),
            })
    }
}

impl<T> Clone for MethodInfo<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            signature: self.signature.clone(),
            handler: self.handler.clone(),
        }
    }
}

impl<T> fmt::Debug for MethodInfo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("bound", &self.handler.is_some())
            .finish()
    }
}

/// Types exposing a method table, usually implemented by
/// [`introspect!`](crate::introspect!)
pub trait Introspect: Send + Sync + Sized + 'static {
    /// Methods in declaration order
    fn methods() -> Vec<MethodInfo<Self>>;

    fn method(name: &str) -> Option<MethodInfo<Self>> {
        Self::methods().into_iter().find(|m| m.name == name)
    }
}

pub(crate) fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

// Probes. `(&&Probe::<T>::new()).param_kind()` resolves to `KnownParam`
// for the handler types and falls back to `AnyParam` for everything else.

#[doc(hidden)]
pub struct Probe<T>(PhantomData<T>);

impl<T> Probe<T> {
    pub fn new() -> Self {
        Probe(PhantomData)
    }
}

impl<T> Default for Probe<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[doc(hidden)]
pub trait KnownParam {
    fn param_kind(&self) -> ParamKind;
}

impl<'a> KnownParam for &Probe<&'a Context> {
    fn param_kind(&self) -> ParamKind {
        ParamKind::Context
    }
}

impl KnownParam for &Probe<Meta> {
    fn param_kind(&self) -> ParamKind {
        ParamKind::Meta
    }
}

impl<'a> KnownParam for &Probe<&'a [Meta]> {
    fn param_kind(&self) -> ParamKind {
        ParamKind::Options
    }
}

impl KnownParam for &Probe<Result<Meta, ActorError>> {
    fn param_kind(&self) -> ParamKind {
        ParamKind::Output
    }
}

#[doc(hidden)]
pub trait AnyParam {
    fn param_kind(&self) -> ParamKind;
}

impl<T> AnyParam for Probe<T> {
    fn param_kind(&self) -> ParamKind {
        ParamKind::Other(type_name::<T>())
    }
}

#[doc(hidden)]
pub struct Bind<T, F>(F, PhantomData<fn(&T)>);

impl<T, F> Bind<T, F> {
    pub fn new(f: F) -> Self {
        Bind(f, PhantomData)
    }
}

#[doc(hidden)]
pub trait BindHandler {
    type Target;

    fn bind(&self) -> Option<Handler<Self::Target>>;
}

impl<T, F> BindHandler for &Bind<T, F>
where
    T: 'static,
    F: Fn(&T, &Context, Meta, &[Meta]) -> Result<Meta, ActorError> + Copy + Send + Sync + 'static,
{
    type Target = T;

    fn bind(&self) -> Option<Handler<T>> {
        Some(Arc::new(self.0))
    }
}

#[doc(hidden)]
pub trait BindFallback {
    type Target;

    fn bind(&self) -> Option<Handler<Self::Target>>;
}

impl<T, F> BindFallback for Bind<T, F> {
    type Target = T;

    fn bind(&self) -> Option<Handler<T>> {
        None
    }
}

/// Wraps an `impl` block and implements [`Introspect`] for its type.
///
/// Every method of the block must take `&self`. Methods are listed in
/// declaration order whether or not they satisfy the handler contract.
#[macro_export]
macro_rules! introspect {
    (
        impl $ty:ty {
            $(
                $(#[$attr:meta])*
                $vis:vis fn $name:ident (&$this:ident $(, $arg:ident : $arg_ty:ty)*) $(-> $ret:ty)? $body:block
            )*
        }
    ) => {
        impl $ty {
            $(
                $(#[$attr])*
                $vis fn $name(&$this $(, $arg: $arg_ty)*) $(-> $ret)? $body
            )*
        }

        impl $crate::Introspect for $ty {
            fn methods() -> ::std::vec::Vec<$crate::MethodInfo<Self>> {
                #[allow(unused_imports)]
                use $crate::introspect::{AnyParam as _, BindFallback as _, BindHandler as _, KnownParam as _};
                ::std::vec![
                    $(
                        $crate::MethodInfo::new(
                            ::std::stringify!($name),
                            $crate::Signature::new(
                                ::std::vec![
                                    $((&&$crate::introspect::Probe::<$arg_ty>::new()).param_kind()),*
                                ],
                                (&&$crate::introspect::Probe::<$crate::__introspect_ret!($($ret)?)>::new())
                                    .param_kind(),
                            ),
                            (&&$crate::introspect::Bind::<Self, _>::new(Self::$name)).bind(),
                        )
                    ),*
                ]
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __introspect_ret {
    () => { () };
    ($ret:ty) => { $ret };
}
