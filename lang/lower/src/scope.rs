//! The scope model: closures, the builders that accumulate them, and the
//! local contexts that read captured values back after lifting.

use derive_more::{Deref, From};
use hoist_syntax::*;
use hoist_utils::{arena::ArenaAssoc, context::Context};

/* --------------------------------- Closure -------------------------------- */

/// The values a local declaration reads but does not own, in first-read order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deref, From)]
pub struct Closure(pub Context<ValueId>);

/* ------------------------------ ClosureBuilder ----------------------------- */

/// The scope a builder accumulates captures for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Owner {
    Function {
        decl: DeclId,
        dispatch: Option<ValueId>,
        extension: Option<ValueId>,
        /// the enclosing instance, for constructors of inner classes
        outer_this: Option<ValueId>,
    },
    Class {
        decl: DeclId,
    },
}

impl Owner {
    /// The builder owner for a function or constructor.
    pub fn function(program: &Program, decl: DeclId) -> Self {
        let (dispatch, extension) = match &program.decls[&decl] {
            | Declaration::Function(f) => (f.dispatch_receiver, f.extension_receiver),
            | Declaration::Constructor(c) => (c.dispatch_receiver, None),
            | _ => (None, None),
        };
        let outer_this = match &program.decls[&decl] {
            | Declaration::Constructor(Constructor { parent: Some(class), .. }) => {
                match &program.decls[class] {
                    | Declaration::Class(Class { is_inner: true, parent: Some(outer), .. }) => {
                        program.decls[outer].as_class().map(|outer| outer.this)
                    }
                    | _ => None,
                }
            }
            | _ => None,
        };
        Owner::Function { decl, dispatch, extension, outer_this }
    }

    pub fn class(decl: DeclId) -> Self {
        Owner::Class { decl }
    }

    pub fn decl(&self) -> DeclId {
        match self {
            | Owner::Function { decl, .. } | Owner::Class { decl } => *decl,
        }
    }

    /// Whether a read of `value` inside this scope has to be captured.
    pub fn is_external(&self, program: &Program, value: ValueId) -> bool {
        match self {
            | Owner::Function { decl, dispatch, extension, outer_this } => {
                let bound = [*dispatch, *extension, *outer_this];
                program.owner(value) != *decl && !bound.contains(&Some(value))
            }
            | Owner::Class { decl } => {
                // owned somewhere inside the class along the declaration chain
                !program.parents_with_self(program.owner(value)).any(|d| d == *decl)
            }
        }
    }
}

/// Accumulates the captures of one open scope.
#[derive(Clone, Debug)]
pub struct ClosureBuilder {
    pub owner: Owner,
    pub captured: Context<ValueId>,
}

impl ClosureBuilder {
    pub fn new(owner: Owner) -> Self {
        Self { owner, captured: Context::new() }
    }

    /// Capture `value` if it is external to the owner; returns whether it was newly captured.
    pub fn read(&mut self, program: &Program, value: ValueId) -> bool {
        self.owner.is_external(program, value) && self.captured.insert(value)
    }

    /// Merge the closure of a nested scope, dropping what this owner binds itself.
    pub fn add_nested(&mut self, program: &Program, nested: &Closure) {
        let owner = self.owner.decl();
        self.captured.extend(nested.iter().copied().filter(|value| program.owner(*value) != owner));
    }

    pub fn build(self) -> Closure {
        Closure(self.captured)
    }
}

/* ------------------------------ LocalContext ------------------------------ */

/// How a lifted declaration reads the values it captured.
#[derive(Clone, Debug)]
pub enum LocalContext {
    /// lifted functions and constructors take captures as leading parameters
    Params { captured: ArenaAssoc<ValueId, ValueId> },
    /// lifted classes keep captures in fields of their new receiver
    Fields { this: ValueId, captured: ArenaAssoc<ValueId, DeclId> },
}

/// A strategy to read a captured value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Param(ValueId),
    Field { field: DeclId, this: ValueId },
}

impl LocalContext {
    pub fn access(&self, value: ValueId) -> Option<Access> {
        match self {
            | LocalContext::Params { captured } => captured.get(&value).copied().map(Access::Param),
            | LocalContext::Fields { this, captured } => {
                captured.get(&value).map(|field| Access::Field { field: *field, this: *this })
            }
        }
    }

    /// The read expression for `value`, if it was captured.
    pub fn read(&self, program: &mut Program, value: ValueId) -> Option<Expr> {
        Some(match self.access(value)? {
            | Access::Param(param) => Expr::Get(param),
            | Access::Field { field, this } => {
                let receiver = Some(program.get(this));
                Expr::GetField(GetField { field, receiver })
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn function_does_not_capture_what_it_binds() {
        let mut p = Program::new();
        let outer = p.function(None, Name::ident("outer"), Type::Unit);
        let n = p.param(outer, Name::ident("n"), Type::Int);
        let inner = p.function(Some(outer), Name::ident("inner"), Type::Unit);
        let x = p.param(inner, Name::ident("x"), Type::Int);
        let ext = p.extension_receiver(inner, Type::Str);
        let owner = Owner::function(&p, inner);
        assert!(owner.is_external(&p, n));
        assert!(!owner.is_external(&p, x));
        assert!(!owner.is_external(&p, ext));
    }

    #[test]
    fn inner_constructor_binds_the_outer_receiver() {
        let mut p = Program::new();
        let f = p.function(None, Name::ident("f"), Type::Unit);
        let local = p.class(Some(f), Name::ident("L"), ClassKind::Class);
        let inner = p.inner_class(local, Name::ident("I"));
        let ctor = p.constructor(inner, true);
        let outer_this = p.decls[&local].as_class().unwrap().this;
        let owner = Owner::function(&p, ctor);
        let Owner::Function { outer_this: bound, .. } = &owner else { panic!() };
        assert_eq!(*bound, Some(outer_this));
        assert!(!owner.is_external(&p, outer_this));
    }

    #[test]
    fn class_binds_everything_below_it() {
        let mut p = Program::new();
        let f = p.function(None, Name::ident("f"), Type::Unit);
        let v = p.variable(f, Name::ident("v"), Type::Int, false);
        let local = p.class(Some(f), Name::ident("L"), ClassKind::Class);
        let ctor = p.constructor(local, true);
        let a = p.param(ctor, Name::ident("a"), Type::Int);
        let m = p.function(Some(local), Name::ident("m"), Type::Unit);
        let b = p.param(m, Name::ident("b"), Type::Int);
        let owner = Owner::class(local);
        assert!(owner.is_external(&p, v));
        assert!(!owner.is_external(&p, a));
        assert!(!owner.is_external(&p, b));
        assert!(!owner.is_external(&p, p.decls[&local].as_class().unwrap().this));
    }

    #[test]
    fn nested_closures_are_filtered_by_owner() {
        let mut p = Program::new();
        let outer = p.function(None, Name::ident("outer"), Type::Unit);
        let n = p.param(outer, Name::ident("n"), Type::Int);
        let a = p.function(Some(outer), Name::ident("a"), Type::Unit);
        let y = p.param(a, Name::ident("y"), Type::Int);
        let mut builder = ClosureBuilder::new(Owner::function(&p, a));
        builder.add_nested(&p, &Closure(Context::from_iter([y, n])));
        assert_eq!(builder.build(), Closure(Context::singleton(n)));
    }
}
