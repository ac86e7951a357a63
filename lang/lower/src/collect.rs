use crate::err::*;
use hoist_syntax::*;
use hoist_utils::{arena::ArenaAssoc, context::Context};

/// A function declared directly in a function body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocalFunction {
    /// the lambda index, for anonymous functions
    pub index: Option<usize>,
}

/// A class declared in a function body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocalClass {
    /// the object index, for anonymous classes
    pub index: Option<usize>,
}

/// Everything declared below one root, in post-order.
#[derive(Clone, Debug, Default)]
pub struct LocalDeclarations {
    pub functions: ArenaAssoc<DeclId, LocalFunction>,
    pub classes: ArenaAssoc<DeclId, LocalClass>,
    /// constructors of local classes
    pub constructors: Context<DeclId>,
    /// members of local classes other than constructors; accessors included
    pub members: Context<DeclId>,
    lambdas: usize,
    objects: usize,
}

impl LocalDeclarations {
    /// Classify the declarations below `root`. Counters start over for every root.
    pub fn collect(program: &Program, root: DeclId) -> Result<Self> {
        let mut locals = LocalDeclarations::default();
        Collector { program, locals: &mut locals }.visit_children(root)?;
        Ok(locals)
    }

    /// No local function and no local class: nothing to lift.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.classes.is_empty()
    }

    pub fn is_local(&self, decl: &DeclId) -> bool {
        self.functions.contains_key(decl) || self.classes.contains_key(decl)
    }

    /// The generated index of an anonymous local function or class.
    pub fn lambda_index(&self, decl: &DeclId) -> Option<usize> {
        self.functions.get(decl).and_then(|f| f.index)
    }
    pub fn object_index(&self, decl: &DeclId) -> Option<usize> {
        self.classes.get(decl).and_then(|c| c.index)
    }
}

struct Collector<'a> {
    program: &'a Program,
    locals: &'a mut LocalDeclarations,
}

impl Collector<'_> {
    fn is_class_member(&self, decl: DeclId) -> bool {
        self.program.parent(decl).is_some_and(|parent| self.program.is_class(parent))
    }

    fn visit_decl(&mut self, decl: DeclId) -> Result<()> {
        self.visit_children(decl)?;
        let program = self.program;
        let is_member = self.is_class_member(decl);
        let locals = &mut *self.locals;
        match &program.decls[&decl] {
            | Declaration::Function(func) => {
                if is_member {
                    locals.members.insert(decl);
                } else {
                    let index = func.name.is_special().then(|| {
                        locals.lambdas += 1;
                        locals.lambdas - 1
                    });
                    locals.functions.insert(decl, LocalFunction { index });
                }
            }
            | Declaration::Constructor(_) => {
                if !is_member {
                    return Err(LowerError::invariant("constructor outside of a class", decl));
                }
                locals.constructors.insert(decl);
            }
            | Declaration::Class(class) => {
                if is_member {
                    if !class.is_inner {
                        return Err(LowerError::invariant("nested class in a local class must be inner", decl));
                    }
                    locals.members.insert(decl);
                } else {
                    let index = class.name.is_special().then(|| {
                        locals.objects += 1;
                        locals.objects - 1
                    });
                    locals.classes.insert(decl, LocalClass { index });
                }
            }
            | Declaration::Property(_) | Declaration::Field(_) => {
                if !is_member {
                    return Err(LowerError::invariant("property or field outside of a class", decl));
                }
                locals.members.insert(decl);
            }
        }
        Ok(())
    }

    fn visit_children(&mut self, decl: DeclId) -> Result<()> {
        let program = self.program;
        match &program.decls[&decl] {
            | Declaration::Function(Function { body, .. })
            | Declaration::Constructor(Constructor { body, .. }) => {
                if let Some(body) = body {
                    self.visit_expr(*body)?;
                }
            }
            | Declaration::Class(Class { members, .. }) => {
                for member in members {
                    self.visit_decl(*member)?;
                }
            }
            | Declaration::Property(Property { getter, setter, backing_field, .. }) => {
                for accessor in getter.iter().chain(setter) {
                    self.visit_decl(*accessor)?;
                }
                // the backing field moves with its property
                if let Some(Field { init: Some(init), .. }) =
                    backing_field.and_then(|field| program.decls[&field].as_field())
                {
                    self.visit_expr(*init)?;
                }
            }
            | Declaration::Field(Field { init, .. }) => {
                if let Some(init) = init {
                    self.visit_expr(*init)?;
                }
            }
        }
        Ok(())
    }

    fn visit_expr(&mut self, expr: ExprId) -> Result<()> {
        let program = self.program;
        match &program.exprs[&expr] {
            | Expr::Lit(_) | Expr::Get(_) | Expr::ClassRef(_) => {}
            | Expr::Set(_, to) => self.visit_expr(*to)?,
            | Expr::Var(VarDecl { value: _, init }) => {
                if let Some(init) = init {
                    self.visit_expr(*init)?;
                }
            }
            | Expr::Decl(decl) => self.visit_decl(*decl)?,
            | Expr::Call(Call(access)) | Expr::New(New(access)) | Expr::Ref(CallableRef(access)) => {
                let MemberAccess { dispatch, extension, args, .. } = access;
                for expr in dispatch.iter().chain(extension).chain(args.iter().flatten()) {
                    self.visit_expr(*expr)?;
                }
            }
            | Expr::GetField(GetField { field: _, receiver }) => {
                if let Some(receiver) = receiver {
                    self.visit_expr(*receiver)?;
                }
            }
            | Expr::SetField(SetField { field: _, receiver, value }) => {
                if let Some(receiver) = receiver {
                    self.visit_expr(*receiver)?;
                }
                self.visit_expr(*value)?;
            }
            | Expr::Return(Return { target: _, value }) => self.visit_expr(*value)?,
            | Expr::Block(Block(stmts)) => {
                for stmt in stmts {
                    self.visit_expr(*stmt)?;
                }
            }
            | Expr::If(If { cond, then, els }) => {
                self.visit_expr(*cond)?;
                self.visit_expr(*then)?;
                if let Some(els) = els {
                    self.visit_expr(*els)?;
                }
            }
            | Expr::While(While { cond, body }) => {
                self.visit_expr(*cond)?;
                self.visit_expr(*body)?;
            }
            | Expr::Binary(Binary { op: _, lhs, rhs }) => {
                self.visit_expr(*lhs)?;
                self.visit_expr(*rhs)?;
            }
            // accessors of local delegated properties stay where they are
            | Expr::Delegated(Delegated { value: _, delegate, accessors: _ }) => self.visit_expr(*delegate)?,
        }
        Ok(())
    }
}
