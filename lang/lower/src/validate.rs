//! Checks a lowered [`Program`] for the shape later passes rely on:
//!
//! + every declaration reachable from the module is reached exactly once;
//! + every referenced declaration is reachable;
//! + every value is read where it is visible;
//! + no function body declares anything.

use crate::err::*;
use hoist_syntax::*;
use hoist_utils::context::Context;

pub struct IrValidator<'a> {
    program: &'a Program,
    declared: Context<DeclId>,
    errors: Vec<ValidationError>,
}

impl<'a> IrValidator<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self { program, declared: Context::new(), errors: Vec::new() }
    }

    pub fn check(mut self) -> Result<()> {
        let program = self.program;
        for decl in &program.top {
            self.declare(*decl);
        }
        for decl in self.declared.clone().iter() {
            self.check_decl(*decl);
        }
        if self.errors.is_empty() { Ok(()) } else { Err(LowerError::Validation(self.errors)) }
    }

    /* ------------------------------ Declarations ------------------------------ */

    fn declare(&mut self, decl: DeclId) {
        if !self.declared.insert(decl) {
            self.errors.push(ValidationError::Redeclaration { decl });
            return;
        }
        let program = self.program;
        match &program.decls[&decl] {
            | Declaration::Class(Class { members, .. }) => {
                for member in members {
                    self.declare(*member);
                }
            }
            | Declaration::Property(Property { backing_field, getter, setter, .. }) => {
                for member in backing_field.iter().chain(getter).chain(setter) {
                    self.declare(*member);
                }
            }
            | Declaration::Function(_) | Declaration::Constructor(_) | Declaration::Field(_) => {}
        }
    }

    /// The receivers of every class on the declaration chain.
    fn enclosing_receivers(&self, decl: DeclId) -> impl Iterator<Item = ValueId> + '_ {
        (self.program.parents_with_self(decl))
            .filter_map(|scope| self.program.decls[&scope].as_class())
            .map(|class| class.this)
    }

    fn check_decl(&mut self, decl: DeclId) {
        let program = self.program;
        let mut scope: Vec<ValueId> = self.enclosing_receivers(decl).collect();
        let body = match &program.decls[&decl] {
            | Declaration::Function(func) => {
                scope.extend(func.dispatch_receiver.iter().chain(&func.extension_receiver));
                scope.extend(&func.params);
                func.body
            }
            | Declaration::Constructor(ctor) => {
                scope.extend(&ctor.dispatch_receiver);
                scope.extend(&ctor.params);
                ctor.body
            }
            | Declaration::Field(field) => {
                // field initializers run as part of the primary constructor
                let primary = field.parent.and_then(|class| program.primary_constructor(class));
                if let Some(primary) = primary {
                    scope.extend(program.decls[&primary].params());
                }
                field.init
            }
            | Declaration::Class(_) | Declaration::Property(_) => None,
        };
        if let Some(body) = body {
            BodyValidator { validator: self, from: decl, scope }.visit_expr(body);
        }
    }

    fn reference(&mut self, target: DeclId, from: DeclId) {
        if !self.declared.contains(&target) {
            self.errors.push(ValidationError::MissingDeclaration { target, from });
        }
    }
}

/* ---------------------------------- Bodies --------------------------------- */

struct BodyValidator<'v, 'a> {
    validator: &'v mut IrValidator<'a>,
    from: DeclId,
    scope: Vec<ValueId>,
}

impl BodyValidator<'_, '_> {
    fn read(&mut self, value: ValueId) {
        if !self.scope.contains(&value) {
            let from = self.from;
            self.validator.errors.push(ValidationError::OutOfScope { value, from });
        }
    }

    fn reference(&mut self, target: DeclId) {
        self.validator.reference(target, self.from)
    }

    fn visit_access(&mut self, access: &MemberAccess) {
        let MemberAccess { callee, type_args: _, dispatch, extension, args } = access;
        self.reference(*callee);
        for expr in dispatch.iter().chain(extension).chain(args.iter().flatten()) {
            self.visit_expr(*expr);
        }
    }

    fn visit_expr(&mut self, expr: ExprId) {
        let program = self.validator.program;
        match &program.exprs[&expr] {
            | Expr::Lit(_) => {}
            | Expr::Get(value) => self.read(*value),
            | Expr::Set(value, to) => {
                self.read(*value);
                self.visit_expr(*to);
            }
            | Expr::Var(VarDecl { value, init }) => {
                if let Some(init) = init {
                    self.visit_expr(*init);
                }
                self.scope.push(*value);
            }
            | Expr::Decl(decl) => {
                let (decl, from) = (*decl, self.from);
                self.validator.errors.push(ValidationError::ResidualLocal { decl, from });
            }
            | Expr::Call(Call(access)) | Expr::New(New(access)) | Expr::Ref(CallableRef(access)) => {
                self.visit_access(access)
            }
            | Expr::GetField(GetField { field, receiver }) => {
                self.reference(*field);
                if let Some(receiver) = receiver {
                    self.visit_expr(*receiver);
                }
            }
            | Expr::SetField(SetField { field, receiver, value }) => {
                self.reference(*field);
                if let Some(receiver) = receiver {
                    self.visit_expr(*receiver);
                }
                self.visit_expr(*value);
            }
            | Expr::Return(Return { target, value }) => {
                self.reference(*target);
                self.visit_expr(*value);
            }
            | Expr::Block(Block(stmts)) => {
                let depth = self.scope.len();
                for stmt in stmts {
                    self.visit_expr(*stmt);
                }
                self.scope.truncate(depth);
            }
            | Expr::If(If { cond, then, els }) => {
                self.visit_expr(*cond);
                self.visit_expr(*then);
                if let Some(els) = els {
                    self.visit_expr(*els);
                }
            }
            | Expr::While(While { cond, body }) => {
                self.visit_expr(*cond);
                self.visit_expr(*body);
            }
            | Expr::Binary(Binary { op: _, lhs, rhs }) => {
                self.visit_expr(*lhs);
                self.visit_expr(*rhs);
            }
            // the accessors are private to the delegate and never declared
            | Expr::Delegated(Delegated { value, delegate, accessors: _ }) => {
                self.visit_expr(*delegate);
                self.scope.push(*value);
            }
            | Expr::ClassRef(ClassRef(class)) => self.reference(*class),
        }
    }
}
