use crate::syntax::*;
use hoist_utils::arena::*;

/// All arenas of a module.
#[derive(Debug, Clone, Default)]
pub struct Program {
    /// declaration arena
    pub decls: ArenaDense<DeclId, Declaration>,
    /// value arena; parameters, receivers and variables
    pub values: ArenaDense<ValueId, ValueDef>,
    /// expression arena
    pub exprs: ArenaDense<ExprId, Expr>,
    /// module-level declarations, in order
    pub top: Vec<DeclId>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AsRef<Program> for Program {
    fn as_ref(&self) -> &Program {
        self
    }
}
impl AsMut<Program> for Program {
    fn as_mut(&mut self) -> &mut Program {
        self
    }
}

pub trait ProgramLike {
    /// Allocate a declaration.
    fn decl(&mut self, decl: impl Into<Declaration>) -> DeclId;
    /// Allocate a value.
    fn value(&mut self, value: ValueDef) -> ValueId;
    /// Allocate an expression.
    fn expr(&mut self, expr: impl Into<Expr>) -> ExprId;
}

impl<T> ProgramLike for T
where
    T: AsMut<Program>,
{
    fn decl(&mut self, decl: impl Into<Declaration>) -> DeclId {
        self.as_mut().decls.alloc(decl.into())
    }
    fn value(&mut self, value: ValueDef) -> ValueId {
        self.as_mut().values.alloc(value)
    }
    fn expr(&mut self, expr: impl Into<Expr>) -> ExprId {
        self.as_mut().exprs.alloc(expr.into())
    }
}

/* ---------------------------- Declaration Chain --------------------------- */

impl Program {
    pub fn parent(&self, decl: DeclId) -> Option<DeclId> {
        self.decls[&decl].parent()
    }

    /// `decl` and all its ancestors, innermost first.
    pub fn parents_with_self(&self, decl: DeclId) -> impl Iterator<Item = DeclId> + '_ {
        std::iter::successors(Some(decl), move |d| self.parent(*d))
    }

    /// The ancestors of `decl`, innermost first.
    pub fn parents(&self, decl: DeclId) -> impl Iterator<Item = DeclId> + '_ {
        self.parents_with_self(decl).skip(1)
    }

    /// Local declarations live somewhere below a function or constructor.
    pub fn is_local(&self, decl: DeclId) -> bool {
        self.parents(decl).any(|d| self.decls[&d].is_callable())
    }

    pub fn is_class(&self, decl: DeclId) -> bool {
        self.decls[&decl].is_class()
    }

    /// The declarations a container lists; `None` is the module.
    pub fn children(&self, container: Option<DeclId>) -> &[DeclId] {
        match container {
            | None => &self.top,
            | Some(decl) => match &self.decls[&decl] {
                | Declaration::Class(class) => &class.members,
                | _ => &[],
            },
        }
    }

    pub fn children_mut(&mut self, container: Option<DeclId>) -> Option<&mut Vec<DeclId>> {
        match container {
            | None => Some(&mut self.top),
            | Some(decl) => self.decls[&decl].as_class_mut().map(|class| &mut class.members),
        }
    }

    /// The primary constructor among a class's members.
    pub fn primary_constructor(&self, class: DeclId) -> Option<DeclId> {
        self.children(Some(class)).iter().copied().find(|member| {
            matches!(&self.decls[member], Declaration::Constructor(Constructor { is_primary: true, .. }))
        })
    }

    /// The declaration owning a value.
    pub fn owner(&self, value: ValueId) -> DeclId {
        self.values[&value].owner
    }
}
