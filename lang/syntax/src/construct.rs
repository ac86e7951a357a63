//! Constructors for declarations, values and expressions in a [`Program`].
//!
//! The upstream stages hand us a resolved, type-checked tree; these helpers build
//! such trees by hand, mostly for tests. They keep the bookkeeping consistent:
//!
//! + module-level declarations and class members are attached to their container,
//!   while declarations inside a function body are left detached and should be
//!   placed with a [`Expr::Decl`] statement;
//! + every member of a class reads the class's `<this>` as its dispatch receiver;
//! + constructors of inner classes take the outer `<this>` as theirs.

use crate::{arena::*, syntax::*};

impl Program {
    fn attach(&mut self, parent: Option<DeclId>, decl: DeclId, in_scope: bool) {
        match parent {
            | None => self.top.push(decl),
            | Some(parent) => {
                if let Some(class) = self.decls[&parent].as_class_mut() {
                    class.members.push(decl);
                    if in_scope {
                        class.scope.declared.push(decl);
                    }
                }
            }
        }
    }

    fn visibility_under(&self, parent: Option<DeclId>) -> Visibility {
        match parent {
            | Some(parent) if self.decls[&parent].is_callable() => Visibility::Local,
            | _ => Visibility::Public,
        }
    }

    fn this_of(&self, class: Option<DeclId>) -> Option<ValueId> {
        class.and_then(|class| self.decls[&class].as_class()).map(|class| class.this)
    }

    /* ------------------------------ Declarations ------------------------------ */

    pub fn function(&mut self, parent: Option<DeclId>, name: Name, ret: Type) -> DeclId {
        let function = Function {
            name,
            parent,
            origin: Origin::Source,
            visibility: self.visibility_under(parent),
            modality: Modality::Final,
            type_params: Vec::new(),
            dispatch_receiver: self.this_of(parent),
            extension_receiver: None,
            params: Vec::new(),
            ret,
            body: None,
            accessor_of: None,
            overrides: Vec::new(),
        };
        let id = self.decl(function);
        self.attach(parent, id, true);
        id
    }

    /// A lambda: an anonymous local function.
    pub fn lambda(&mut self, parent: DeclId, ret: Type) -> DeclId {
        self.function(Some(parent), Name::anonymous(), ret)
    }

    pub fn class(&mut self, parent: Option<DeclId>, name: Name, kind: ClassKind) -> DeclId {
        let id = self.decls.next_id();
        let this = self.value(ValueDef {
            name: Name::this(),
            ty: Type::Class(id),
            owner: id,
            kind: ValueKind::DispatchReceiver,
        });
        let class = Class {
            name,
            parent,
            origin: Origin::Source,
            kind,
            visibility: self.visibility_under(parent),
            modality: Modality::Final,
            is_inner: false,
            supertypes: Vec::new(),
            this,
            members: Vec::new(),
            scope: MemberScope::default(),
        };
        let allocated = self.decl(class);
        debug_assert_eq!(id, allocated);
        self.attach(parent, id, false);
        id
    }

    /// An anonymous object declared in a function body.
    pub fn object(&mut self, parent: DeclId) -> DeclId {
        self.class(Some(parent), Name::no_name(), ClassKind::Object)
    }

    pub fn inner_class(&mut self, outer: DeclId, name: Name) -> DeclId {
        let id = self.class(Some(outer), name, ClassKind::Class);
        if let Some(class) = self.decls[&id].as_class_mut() {
            class.is_inner = true;
        }
        id
    }

    pub fn constructor(&mut self, class: DeclId, is_primary: bool) -> DeclId {
        let outer = match &self.decls[&class] {
            | Declaration::Class(Class { is_inner: true, parent, .. }) => self.this_of(*parent),
            | _ => None,
        };
        let id = self.decl(Constructor {
            parent: Some(class),
            is_primary,
            visibility: Visibility::Public,
            dispatch_receiver: outer,
            params: Vec::new(),
            body: None,
        });
        self.attach(Some(class), id, false);
        id
    }

    /// A class property with a backing field and default accessors.
    pub fn property(&mut self, class: DeclId, name: Name, ty: Type, is_var: bool) -> DeclId {
        let this = self.this_of(Some(class));
        let backing_field = self.decl(Field {
            name: name.clone(),
            parent: Some(class),
            origin: Origin::Source,
            visibility: Visibility::Private,
            is_final: !is_var,
            ty: ty.clone(),
            init: None,
        });
        let property = self.decl(Property {
            name: name.clone(),
            parent: Some(class),
            visibility: Visibility::Public,
            modality: Modality::Final,
            is_var,
            ty: ty.clone(),
            backing_field: Some(backing_field),
            getter: None,
            setter: None,
            overrides: Vec::new(),
        });
        let accessor = |name: String, ret: Type| Function {
            name: Name::special(name),
            parent: Some(class),
            origin: Origin::Source,
            visibility: Visibility::Public,
            modality: Modality::Final,
            type_params: Vec::new(),
            dispatch_receiver: this,
            extension_receiver: None,
            params: Vec::new(),
            ret,
            body: None,
            accessor_of: Some(property),
            overrides: Vec::new(),
        };

        let getter = self.decl(accessor(format!("get-{}", name.plain()), ty.clone()));
        let receiver = this.map(|this| self.get(this));
        let read = self.expr(GetField { field: backing_field, receiver });
        let ret = self.ret(getter, read);
        let body = self.block([ret]);
        self.set_body(getter, body);

        let setter = if is_var {
            let setter = self.decl(accessor(format!("set-{}", name.plain()), Type::Unit));
            let param = self.param(setter, Name::special("set-?"), ty);
            let receiver = this.map(|this| self.get(this));
            let value = self.get(param);
            let write = self.expr(SetField { field: backing_field, receiver, value });
            let body = self.block([write]);
            self.set_body(setter, body);
            Some(setter)
        } else {
            None
        };

        if let Declaration::Property(prop) = &mut self.decls[&property] {
            prop.getter = Some(getter);
            prop.setter = setter;
        }
        self.attach(Some(class), property, true);
        property
    }

    pub fn field(&mut self, class: DeclId, name: Name, ty: Type, init: Option<ExprId>) -> DeclId {
        let id = self.decl(Field {
            name,
            parent: Some(class),
            origin: Origin::Source,
            visibility: Visibility::Private,
            is_final: true,
            ty,
            init,
        });
        self.attach(Some(class), id, false);
        id
    }

    pub fn supertype(&mut self, class: DeclId, ty: Type) {
        if let Some(class) = self.decls[&class].as_class_mut() {
            class.supertypes.push(ty);
        }
    }

    pub fn set_body(&mut self, callable: DeclId, body: ExprId) {
        match &mut self.decls[&callable] {
            | Declaration::Function(Function { body: slot, .. })
            | Declaration::Constructor(Constructor { body: slot, .. }) => *slot = Some(body),
            | _ => {}
        }
    }

    /* --------------------------------- Values --------------------------------- */

    pub fn param(&mut self, callable: DeclId, name: Name, ty: Type) -> ValueId {
        let index = self.decls[&callable].params().len();
        let param = self.value(ValueDef { name, ty, owner: callable, kind: ValueKind::Param(index) });
        match &mut self.decls[&callable] {
            | Declaration::Function(Function { params, .. })
            | Declaration::Constructor(Constructor { params, .. }) => params.push(param),
            | _ => {}
        }
        param
    }

    pub fn extension_receiver(&mut self, function: DeclId, ty: Type) -> ValueId {
        let receiver = self.value(ValueDef {
            name: Name::this(),
            ty,
            owner: function,
            kind: ValueKind::ExtensionReceiver,
        });
        if let Some(function) = self.decls[&function].as_function_mut() {
            function.extension_receiver = Some(receiver);
        }
        receiver
    }

    pub fn variable(&mut self, owner: DeclId, name: Name, ty: Type, mutable: bool) -> ValueId {
        self.value(ValueDef { name, ty, owner, kind: ValueKind::Variable { mutable } })
    }

    /* ------------------------------- Expressions ------------------------------ */

    pub fn int(&mut self, i: i64) -> ExprId {
        self.expr(Literal::Int(i))
    }
    pub fn unit(&mut self) -> ExprId {
        self.expr(Literal::Unit)
    }
    pub fn get(&mut self, value: ValueId) -> ExprId {
        self.expr(Expr::Get(value))
    }
    pub fn set(&mut self, value: ValueId, to: ExprId) -> ExprId {
        self.expr(Expr::Set(value, to))
    }
    pub fn var(&mut self, value: ValueId, init: Option<ExprId>) -> ExprId {
        self.expr(VarDecl { value, init })
    }
    /// Place a local declaration in statement position.
    pub fn local(&mut self, decl: DeclId) -> ExprId {
        self.expr(Expr::Decl(decl))
    }
    pub fn call(&mut self, callee: DeclId, args: impl IntoIterator<Item = ExprId>) -> ExprId {
        let access = Self::access(callee, None, args.into_iter().map(Some).collect());
        self.expr(Call(access))
    }
    pub fn call_on(
        &mut self, dispatch: ExprId, callee: DeclId, args: impl IntoIterator<Item = ExprId>,
    ) -> ExprId {
        let access = Self::access(callee, Some(dispatch), args.into_iter().map(Some).collect());
        self.expr(Call(access))
    }
    pub fn instantiate(&mut self, constructor: DeclId, args: impl IntoIterator<Item = ExprId>) -> ExprId {
        let access = Self::access(constructor, None, args.into_iter().map(Some).collect());
        self.expr(New(access))
    }
    pub fn callable_ref(&mut self, callee: DeclId, bound: Vec<Option<ExprId>>) -> ExprId {
        self.expr(CallableRef(Self::access(callee, None, bound)))
    }
    pub fn get_field(&mut self, field: DeclId, receiver: Option<ExprId>) -> ExprId {
        self.expr(GetField { field, receiver })
    }
    pub fn ret(&mut self, target: DeclId, value: ExprId) -> ExprId {
        self.expr(Return { target, value })
    }
    pub fn block(&mut self, stmts: impl IntoIterator<Item = ExprId>) -> ExprId {
        self.expr(Block(stmts.into_iter().collect()))
    }
    pub fn binary(&mut self, op: BinOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.expr(Binary { op, lhs, rhs })
    }
    pub fn if_(&mut self, cond: ExprId, then: ExprId, els: Option<ExprId>) -> ExprId {
        self.expr(If { cond, then, els })
    }
    pub fn delegated(&mut self, value: ValueId, delegate: ExprId, accessors: Vec<DeclId>) -> ExprId {
        self.expr(Delegated { value, delegate, accessors })
    }
    pub fn class_ref(&mut self, class: DeclId) -> ExprId {
        self.expr(ClassRef(class))
    }

    fn access(callee: DeclId, dispatch: Option<ExprId>, args: Vec<Option<ExprId>>) -> MemberAccess {
        MemberAccess { callee, type_args: Vec::new(), dispatch, extension: None, args }
    }
}
