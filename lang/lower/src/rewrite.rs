use crate::{collect::LocalDeclarations, err::*, scope::*, transform::Transformed};
use hoist_syntax::*;

/// Rewrite every body touched by one root: lifted functions and constructors
/// in their own contexts, lifted classes in the context of their fields, and
/// finally the root itself, which reads everything directly.
pub fn rewrite_declarations(
    program: &mut Program, root: DeclId, locals: &LocalDeclarations, transformed: &Transformed,
) -> Result<()> {
    for function in locals.functions.keys() {
        let context = transformed.context(*function)?;
        let new = transformed.lifted(*function)?;
        BodyRewriter::new(program, locals, transformed, Some(context)).rewrite_body(new)?;
    }
    for constructor in locals.constructors.iter() {
        let context = transformed.context(*constructor)?;
        let new = transformed.lifted(*constructor)?;
        BodyRewriter::new(program, locals, transformed, Some(context)).rewrite_body(new)?;
    }
    for class in locals.classes.keys() {
        let context = transformed.context(*class)?;
        BodyRewriter::new(program, locals, transformed, Some(context)).rewrite_class(*class)?;
    }
    BodyRewriter::new(program, locals, transformed, None).rewrite_body(root)
}

/// Rewrites bodies in place.
pub struct BodyRewriter<'a> {
    program: &'a mut Program,
    locals: &'a LocalDeclarations,
    transformed: &'a Transformed,
    context: Option<&'a LocalContext>,
}

impl<'a> BodyRewriter<'a> {
    pub fn new(
        program: &'a mut Program, locals: &'a LocalDeclarations, transformed: &'a Transformed,
        context: Option<&'a LocalContext>,
    ) -> Self {
        Self { program, locals, transformed, context }
    }

    pub fn rewrite_body(&mut self, decl: DeclId) -> Result<()> {
        match self.program.decls[&decl].body() {
            | Some(body) => self.rewrite_expr(body),
            | None => Ok(()),
        }
    }

    fn rewrite_field(&mut self, field: DeclId) -> Result<()> {
        match self.program.decls[&field].as_field().and_then(|field| field.init) {
            | Some(init) => self.rewrite_expr(init),
            | None => Ok(()),
        }
    }

    /// Fill the lifted class with its rewritten members and the fields for its captures.
    pub fn rewrite_class(&mut self, old: DeclId) -> Result<()> {
        let new = self.transformed.lifted(old)?;
        let Some(members) = self.program.decls[&old].as_class().map(|class| class.members.clone()) else {
            return Err(LowerError::invariant("local class expected", old));
        };
        let mut new_members = Vec::with_capacity(members.len());
        for member in members {
            let new_member = self.transformed.lifted(member)?;
            match &self.program.decls[&new_member] {
                // rewritten in its own context
                | Declaration::Constructor(_) => {}
                | Declaration::Function(_) => self.rewrite_body(new_member)?,
                | Declaration::Property(prop) => {
                    let Property { getter, setter, backing_field, .. } = prop.clone();
                    for accessor in getter.into_iter().chain(setter) {
                        self.rewrite_body(accessor)?;
                    }
                    if let Some(field) = backing_field {
                        self.rewrite_field(field)?;
                    }
                }
                | Declaration::Field(_) => self.rewrite_field(new_member)?,
                | Declaration::Class(_) => {
                    return Err(LowerError::unimplemented("inner class of a local class", member));
                }
            }
            new_members.push(new_member);
        }

        let Some(LocalContext::Fields { captured, .. }) = self.context else {
            return Err(LowerError::invariant("local class without a field context", old));
        };
        let Some(primary) = self.program.primary_constructor(old) else {
            return Err(LowerError::invariant("local classes must have a primary constructor", old));
        };
        let primary_context = self.transformed.context(primary)?;
        for (value, field) in captured {
            let Some(Access::Param(param)) = primary_context.access(*value) else {
                return Err(LowerError::invariant("captured value is not passed to the primary constructor", primary));
            };
            let init = self.program.get(param);
            if let Some(field) = self.program.decls[field].as_field_mut() {
                field.init = Some(init);
            }
            new_members.push(*field);
        }

        if let Some(class) = self.program.decls[&new].as_class_mut() {
            class.members = new_members;
        }
        Ok(())
    }

    /* ------------------------------- Expressions ------------------------------ */

    /// A read of `value`: through the local context, then through the remap, or as is.
    fn read(&mut self, value: ValueId) -> Expr {
        if let Some(expr) = self.context.and_then(|context| context.read(self.program, value)) {
            return expr;
        }
        match self.transformed.remap.forth(&value) {
            | Some(new) => Expr::Get(*new),
            | None => Expr::Get(value),
        }
    }

    fn retarget(&self, decl: DeclId) -> DeclId {
        self.transformed.get(&decl).unwrap_or(decl)
    }

    /// Variables follow the declaration that owns them.
    fn reown(&mut self, value: ValueId) {
        let owner = self.program.owner(value);
        if let Some(new) = self.transformed.get(&owner) {
            self.program.values[&value].owner = new;
        }
    }

    fn rewrite_access(&mut self, access: MemberAccess) -> Result<MemberAccess> {
        let MemberAccess { callee, type_args, dispatch, extension, args } = access;
        for expr in dispatch.iter().chain(&extension).chain(args.iter().flatten()) {
            self.rewrite_expr(*expr)?;
        }
        let Some(new_callee) = self.transformed.get(&callee) else {
            return Ok(MemberAccess { callee, type_args, dispatch, extension, args });
        };
        let old_params = self.program.decls[&callee].params().to_vec();
        let new_params = self.program.decls[&new_callee].params().to_vec();
        let mut new_args = Vec::with_capacity(new_params.len());
        for param in new_params {
            if let Some(old) = self.transformed.remap.back(&param) {
                let Some(position) = old_params.iter().position(|p| p == old) else {
                    return Err(LowerError::invariant("parameter remapped from another callee", callee));
                };
                new_args.push(args.get(position).copied().flatten());
            } else if let Some(captured) = self.transformed.new_to_captured.get(&param) {
                // the caller either captured the value too, or sees it directly
                let read = self.read(*captured);
                new_args.push(Some(self.program.expr(read)));
            } else {
                let name = &self.program.values[&param].name;
                return Err(LowerError::invariant(format!("non-mapped parameter {}", name), new_callee));
            }
        }
        // type parameters are copied as is, so type arguments line up
        Ok(MemberAccess { callee: new_callee, type_args, dispatch, extension, args: new_args })
    }

    pub fn rewrite_expr(&mut self, expr: ExprId) -> Result<()> {
        let new = match self.program.exprs[&expr].clone() {
            | Expr::Lit(lit) => Expr::Lit(lit),
            | Expr::Get(value) => self.read(value),
            | Expr::Set(value, to) => {
                self.rewrite_expr(to)?;
                if self.context.is_some_and(|context| context.access(value).is_some()) {
                    let owner = self.program.owner(value);
                    return Err(LowerError::invariant("captured values cannot be written", owner));
                }
                let value = self.transformed.remap.forth(&value).copied().unwrap_or(value);
                Expr::Set(value, to)
            }
            | Expr::Var(VarDecl { value, init }) => {
                if let Some(init) = init {
                    self.rewrite_expr(init)?;
                }
                self.reown(value);
                Expr::Var(VarDecl { value, init })
            }
            | Expr::Decl(decl) => {
                if !self.locals.is_local(&decl) {
                    return Err(LowerError::invariant(
                        "declaration is neither local itself nor a member of a local class",
                        decl,
                    ));
                }
                // hoisted to a sibling of the root
                Expr::Block(Block::default())
            }
            | Expr::Call(Call(access)) => Call(self.rewrite_access(access)?).into(),
            | Expr::New(New(access)) => New(self.rewrite_access(access)?).into(),
            | Expr::Ref(CallableRef(access)) => CallableRef(self.rewrite_access(access)?).into(),
            | Expr::GetField(GetField { field, receiver }) => {
                if let Some(receiver) = receiver {
                    self.rewrite_expr(receiver)?;
                }
                GetField { field: self.retarget(field), receiver }.into()
            }
            | Expr::SetField(SetField { field, receiver, value }) => {
                if let Some(receiver) = receiver {
                    self.rewrite_expr(receiver)?;
                }
                self.rewrite_expr(value)?;
                SetField { field: self.retarget(field), receiver, value }.into()
            }
            | Expr::Return(Return { target, value }) => {
                self.rewrite_expr(value)?;
                Return { target: self.retarget(target), value }.into()
            }
            | Expr::Block(Block(stmts)) => {
                for stmt in &stmts {
                    self.rewrite_expr(*stmt)?;
                }
                Block(stmts).into()
            }
            | Expr::If(If { cond, then, els }) => {
                self.rewrite_expr(cond)?;
                self.rewrite_expr(then)?;
                if let Some(els) = els {
                    self.rewrite_expr(els)?;
                }
                If { cond, then, els }.into()
            }
            | Expr::While(While { cond, body }) => {
                self.rewrite_expr(cond)?;
                self.rewrite_expr(body)?;
                While { cond, body }.into()
            }
            | Expr::Binary(Binary { op, lhs, rhs }) => {
                self.rewrite_expr(lhs)?;
                self.rewrite_expr(rhs)?;
                Binary { op, lhs, rhs }.into()
            }
            | Expr::Delegated(Delegated { value, delegate, accessors }) => {
                self.rewrite_expr(delegate)?;
                self.reown(value);
                Delegated { value, delegate, accessors }.into()
            }
            | Expr::ClassRef(ClassRef(class)) => {
                if self.transformed.get(&class).is_some() {
                    return Err(LowerError::unimplemented("class literal of a lifted class", class));
                }
                ClassRef(class).into()
            }
        };
        self.program.exprs[&expr] = new;
        Ok(())
    }
}
