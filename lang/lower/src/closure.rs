use crate::scope::*;
use hoist_syntax::*;
use hoist_utils::arena::ArenaAssoc;

/// A call, constructor call or callable reference to a declaration that takes captures,
/// with the scopes open around it, innermost last.
struct Reference {
    scopes: Vec<Owner>,
    callee: DeclId,
}

/// Computes the closure of every local function and class below a root.
pub struct ClosureAnalyzer<'a> {
    program: &'a Program,
    stack: Vec<ClosureBuilder>,
    closures: ArenaAssoc<DeclId, Closure>,
    references: Vec<Reference>,
}

impl<'a> ClosureAnalyzer<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self { program, stack: Vec::new(), closures: ArenaAssoc::new(), references: Vec::new() }
    }

    /// The root itself opens no scope; reads of its own values are never captured.
    pub fn analyze(mut self, root: DeclId) -> ArenaAssoc<DeclId, Closure> {
        self.visit_children(root);
        self.close_over_references();
        self.closures
    }

    /// The declaration whose closure a use of `callee` has to pass along: a local function
    /// itself, or the local class of a constructor.
    fn capturing(&self, callee: DeclId) -> Option<DeclId> {
        let program = self.program;
        match &program.decls[&callee] {
            | Declaration::Function(Function { parent: Some(parent), .. }) => {
                (!program.is_class(*parent) && program.is_local(callee)).then_some(callee)
            }
            | Declaration::Constructor(Constructor { parent: Some(class), .. }) => {
                let lifted = program.is_local(*class)
                    && program.parent(*class).is_some_and(|parent| !program.is_class(parent));
                lifted.then_some(*class)
            }
            | _ => None,
        }
    }

    /// Pass the closures of referenced callees on to the scopes around each reference,
    /// as if each captured value were read there, until nothing changes. A callee may be
    /// declared after its caller.
    fn close_over_references(&mut self) {
        let program = self.program;
        let mut changed = true;
        while changed {
            changed = false;
            for Reference { scopes, callee } in &self.references {
                let Some(captured) = self.closures.get(callee).cloned() else { continue };
                for value in captured.iter() {
                    for (depth, owner) in scopes.iter().rev().enumerate() {
                        let bound = if depth == 0 {
                            !owner.is_external(program, *value)
                        } else {
                            program.owner(*value) == owner.decl()
                        };
                        if bound {
                            break;
                        }
                        let Some(Closure(closure)) = self.closures.get_mut(&owner.decl()) else { continue };
                        if closure.insert(*value) {
                            log::trace!(
                                "[closure] {} <- {} (through {})",
                                program.decls[&owner.decl()].name(),
                                program.values[value].name,
                                program.decls[callee].name(),
                            );
                            changed = true;
                        }
                    }
                }
            }
        }
    }

    fn visit_decl(&mut self, decl: DeclId) {
        let program = self.program;
        let owner = match &program.decls[&decl] {
            | Declaration::Function(_) | Declaration::Constructor(_) => Owner::function(program, decl),
            | Declaration::Class(_) => Owner::class(decl),
            | Declaration::Property(_) | Declaration::Field(_) => {
                return self.visit_children(decl);
            }
        };
        self.stack.push(ClosureBuilder::new(owner));
        self.visit_children(decl);
        let Some(builder) = self.stack.pop() else { return };
        let closure = builder.build();
        if program.is_local(decl) {
            let captured: Vec<_> = closure.iter().map(|value| program.values[value].name.to_string()).collect();
            log::trace!("[closure] {} <- [{}]", program.decls[&decl].name(), captured.join(", "));
            self.closures.insert(decl, closure.clone());
        }
        if let Some(top) = self.stack.last_mut() {
            top.add_nested(program, &closure);
        }
    }

    fn visit_children(&mut self, decl: DeclId) {
        let program = self.program;
        match &program.decls[&decl] {
            | Declaration::Function(Function { body, .. })
            | Declaration::Constructor(Constructor { body, .. }) => {
                if let Some(body) = body {
                    self.visit_expr(*body);
                }
            }
            | Declaration::Class(Class { members, .. }) => {
                for member in members {
                    self.visit_decl(*member);
                }
            }
            | Declaration::Property(Property { getter, setter, backing_field, .. }) => {
                for accessor in getter.iter().chain(setter) {
                    self.visit_decl(*accessor);
                }
                if let Some(field) = backing_field {
                    self.visit_decl(*field);
                }
            }
            | Declaration::Field(Field { init, .. }) => {
                if let Some(init) = init {
                    self.visit_expr(*init);
                }
            }
        }
    }

    fn read(&mut self, value: ValueId) {
        let program = self.program;
        if let Some(top) = self.stack.last_mut() {
            top.read(program, value);
        }
    }

    fn visit_access(&mut self, access: &MemberAccess) {
        let MemberAccess { callee, type_args: _, dispatch, extension, args } = access;
        if let Some(callee) = self.capturing(*callee).filter(|_| !self.stack.is_empty()) {
            let scopes = self.stack.iter().map(|builder| builder.owner.clone()).collect();
            self.references.push(Reference { scopes, callee });
        }
        for expr in dispatch.iter().chain(extension).chain(args.iter().flatten()) {
            self.visit_expr(*expr);
        }
    }

    fn visit_expr(&mut self, expr: ExprId) {
        let program = self.program;
        match &program.exprs[&expr] {
            | Expr::Lit(_) | Expr::ClassRef(_) => {}
            | Expr::Get(value) => self.read(*value),
            | Expr::Set(value, to) => {
                self.read(*value);
                self.visit_expr(*to);
            }
            | Expr::Var(VarDecl { value: _, init }) => {
                if let Some(init) = init {
                    self.visit_expr(*init);
                }
            }
            | Expr::Decl(decl) => self.visit_decl(*decl),
            | Expr::Call(Call(access)) | Expr::New(New(access)) | Expr::Ref(CallableRef(access)) => {
                self.visit_access(access)
            }
            | Expr::GetField(GetField { field: _, receiver }) => {
                if let Some(receiver) = receiver {
                    self.visit_expr(*receiver);
                }
            }
            | Expr::SetField(SetField { field: _, receiver, value }) => {
                if let Some(receiver) = receiver {
                    self.visit_expr(*receiver);
                }
                self.visit_expr(*value);
            }
            | Expr::Return(Return { target: _, value }) => self.visit_expr(*value),
            | Expr::Block(Block(stmts)) => {
                for stmt in stmts {
                    self.visit_expr(*stmt);
                }
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
            // the synthesized accessors have no closure of their own
            | Expr::Delegated(Delegated { value: _, delegate, accessors: _ }) => self.visit_expr(*delegate),
        }
    }
}
