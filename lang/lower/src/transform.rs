//! Freestanding signatures for everything lifted out of one root.
//!
//! All descriptors are built before any body is touched, so a body may call a
//! lifted declaration that comes later in the collection order. The order is:
//!
//! 1. local functions, whose captures become leading parameters;
//! 2. local classes, whose captures become private fields;
//! 3. constructors of local classes, taking the class's captures as leading parameters;
//! 4. the remaining members of local classes, copied onto the lifted class;
//! 5. member scopes of the lifted classes, with overrides resolved again.

use crate::{collect::*, conf::LowerConf, err::*, scope::*};
use hoist_syntax::*;
use hoist_utils::{arena::*, context::Context};

/// The descriptors built for one root.
#[derive(Clone, Debug, Default)]
pub struct Transformed {
    /// every lifted or retargeted declaration, old to new
    pub decls: ArenaAssoc<DeclId, DeclId>,
    /// parameters and receivers that were only renumbered, old to new
    pub remap: ArenaBijective<ValueId, ValueId>,
    /// synthesized parameters, and the captured value each of them carries
    pub new_to_captured: ArenaAssoc<ValueId, ValueId>,
    /// contexts of lifted functions, constructors and classes, by their old id
    pub contexts: ArenaAssoc<DeclId, LocalContext>,
}

impl Transformed {
    pub fn get(&self, decl: &DeclId) -> Option<DeclId> {
        self.decls.get(decl).copied()
    }
    /// The replacement of `decl`, which must have one.
    #[track_caller]
    pub fn lifted(&self, decl: DeclId) -> Result<DeclId> {
        self.get(&decl).ok_or_else(|| LowerError::invariant("declaration was not transformed", decl))
    }
    #[track_caller]
    pub fn context(&self, decl: DeclId) -> Result<&LocalContext> {
        self.contexts.get(&decl).ok_or_else(|| LowerError::invariant("no local context", decl))
    }
}

pub struct DescriptorTransformer<'a> {
    program: &'a mut Program,
    conf: &'a LowerConf,
    root: DeclId,
    locals: &'a LocalDeclarations,
    closures: &'a ArenaAssoc<DeclId, Closure>,
    out: Transformed,
}

impl<'a> DescriptorTransformer<'a> {
    pub fn new(
        program: &'a mut Program, conf: &'a LowerConf, root: DeclId, locals: &'a LocalDeclarations,
        closures: &'a ArenaAssoc<DeclId, Closure>,
    ) -> Self {
        Self { program, conf, root, locals, closures, out: Transformed::default() }
    }

    pub fn run(mut self) -> Result<Transformed> {
        let locals = self.locals;
        for function in locals.functions.keys() {
            self.lift_function(*function)?;
        }
        for class in locals.classes.keys() {
            self.lift_class(*class)?;
        }
        for constructor in locals.constructors.iter() {
            self.transform_constructor(*constructor)?;
        }
        for member in locals.members.iter() {
            self.transform_member(*member)?;
        }
        for class in locals.classes.keys() {
            self.initialize_class(*class)?;
        }
        Ok(self.out)
    }

    /* --------------------------------- Naming --------------------------------- */

    /// Lifted declarations land next to the root.
    fn new_owner(&self) -> Option<DeclId> {
        self.program.parent(self.root)
    }

    fn suggest_name(&self, decl: DeclId) -> String {
        if let Some(index) = self.locals.lambda_index(&decl) {
            return self.conf.lambda_name(index);
        }
        if let Some(index) = self.locals.object_index(&decl) {
            return self.conf.object_name(index);
        }
        self.program.decls[&decl].name().to_string()
    }

    /// The suggested names from the new owner down to `decl`, joined.
    pub(crate) fn lifted_name(&self, decl: DeclId) -> Name {
        let new_owner = self.new_owner();
        let mut scopes: Vec<_> = (self.program.parents_with_self(decl))
            .take_while(|scope| Some(*scope) != new_owner)
            .map(|scope| self.suggest_name(scope))
            .collect();
        scopes.reverse();
        Name::ident(scopes.join(&self.conf.separator))
    }

    fn captured_name(&self, value: ValueId) -> Name {
        match &self.program.values[&value].name {
            | Name::Special(name) => Name::ident(format!("{}{}", self.conf.captured_marker, name)),
            | name => name.clone(),
        }
    }

    /* ------------------------------- Recording ------------------------------- */

    fn closure(&self, decl: DeclId) -> Result<Closure> {
        (self.closures.get(&decl).cloned())
            .ok_or_else(|| LowerError::invariant("no closure was computed", decl))
    }

    fn record_transformed(&mut self, old: DeclId, new: DeclId) -> Result<()> {
        self.out.decls.insert_absent_or_same(old, new).map_err(|(current, proposed)| {
            let message = format!("transformed twice, to {:?} and to {:?}", current, proposed);
            LowerError::invariant(message, old)
        })
    }

    fn record_remapped(&mut self, old: ValueId, new: ValueId) -> Result<()> {
        let owner = self.program.owner(old);
        (self.out.remap.insert(old, new))
            .map_err(|conflict| LowerError::invariant(format!("conflicting remap: {:?}", conflict), owner))
    }

    fn copy_value(&mut self, value: ValueId, owner: DeclId, kind: ValueKind) -> ValueId {
        let ValueDef { name, ty, .. } = self.program.values[&value].clone();
        self.program.value(ValueDef { name, ty, owner, kind })
    }

    /// Captures first, then the old parameters renumbered after them.
    fn transform_params(
        &mut self, new: DeclId, closure: &Closure, old_params: &[ValueId],
    ) -> Result<(Vec<ValueId>, ArenaAssoc<ValueId, ValueId>)> {
        let mut params = Vec::with_capacity(closure.len() + old_params.len());
        let mut captured = ArenaAssoc::new();
        for value in closure.iter() {
            let name = self.captured_name(*value);
            let ty = self.program.values[value].ty.clone();
            let kind = ValueKind::Param(params.len());
            let param = self.program.value(ValueDef { name, ty, owner: new, kind });
            captured.insert(*value, param);
            self.out.new_to_captured.insert(param, *value);
            params.push(param);
        }
        for old in old_params {
            let param = self.copy_value(*old, new, ValueKind::Param(params.len()));
            self.record_remapped(*old, param)?;
            params.push(param);
        }
        Ok((params, captured))
    }

    /* -------------------------------- Lifting -------------------------------- */

    fn lift_function(&mut self, old: DeclId) -> Result<()> {
        let Some(func) = self.program.decls[&old].as_function().cloned() else {
            return Err(LowerError::invariant("local function expected", old));
        };
        if func.dispatch_receiver.is_some() {
            return Err(LowerError::invariant("local functions must not have a dispatch receiver", old));
        }
        let closure = self.closure(old)?;
        let name = self.lifted_name(old);
        log::trace!("[lift] {} -> {}", func.name, name);

        let parent = self.new_owner();
        let new = self.program.decls.next_id();
        let (params, captured) = self.transform_params(new, &closure, &func.params)?;
        let extension = (func.extension_receiver)
            .map(|receiver| self.copy_value(receiver, new, ValueKind::ExtensionReceiver));
        let allocated = self.program.decl(Function {
            name,
            parent,
            origin: Origin::Lifted,
            visibility: Visibility::Private,
            modality: Modality::Final,
            // type parameters are not substituted
            type_params: func.type_params,
            dispatch_receiver: None,
            extension_receiver: extension,
            params,
            ret: func.ret,
            body: func.body,
            accessor_of: None,
            overrides: Vec::new(),
        });
        debug_assert_eq!(new, allocated);

        self.record_transformed(old, new)?;
        if let (Some(old), Some(new)) = (func.extension_receiver, extension) {
            self.record_remapped(old, new)?;
        }
        self.out.contexts.insert(old, LocalContext::Params { captured });
        Ok(())
    }

    fn lift_class(&mut self, old: DeclId) -> Result<()> {
        let Some(class) = self.program.decls[&old].as_class().cloned() else {
            return Err(LowerError::invariant("local class expected", old));
        };
        let closure = self.closure(old)?;
        let name = self.lifted_name(old);
        log::trace!("[lift] {} -> {}", class.name, name);

        let parent = self.new_owner();
        let new = self.program.decls.next_id();
        let this = self.program.value(ValueDef {
            name: Name::this(),
            ty: Type::Class(new),
            owner: new,
            kind: ValueKind::DispatchReceiver,
        });
        let allocated = self.program.decl(Class {
            name,
            parent,
            origin: Origin::Lifted,
            kind: class.kind,
            visibility: Visibility::Private,
            modality: class.modality,
            is_inner: false,
            supertypes: class.supertypes,
            this,
            members: Vec::new(),
            scope: MemberScope::default(),
        });
        debug_assert_eq!(new, allocated);

        self.record_transformed(old, new)?;
        self.record_remapped(class.this, this)?;

        let mut captured = ArenaAssoc::new();
        for value in closure.iter() {
            let name = self.captured_name(*value);
            let ty = self.program.values[value].ty.clone();
            let field = self.program.decl(Field {
                name,
                parent: Some(new),
                origin: Origin::CapturedValue,
                visibility: Visibility::Private,
                is_final: true,
                ty,
                init: None,
            });
            captured.insert(*value, field);
        }
        self.out.contexts.insert(old, LocalContext::Fields { this, captured });
        Ok(())
    }

    fn transform_constructor(&mut self, old: DeclId) -> Result<()> {
        let Some(ctor) = self.program.decls[&old].as_constructor().cloned() else {
            return Err(LowerError::invariant("constructor expected", old));
        };
        let Some(class) = ctor.parent.filter(|class| self.locals.classes.contains_key(class)) else {
            return Err(LowerError::unimplemented("constructor of a class that is not lifted", old));
        };
        let new_class = self.out.lifted(class)?;
        let closure = self.closure(class)?;

        let new = self.program.decls.next_id();
        let (params, captured) = self.transform_params(new, &closure, &ctor.params)?;
        let dispatch = (ctor.dispatch_receiver)
            .map(|receiver| self.copy_value(receiver, new, ValueKind::DispatchReceiver));
        let allocated = self.program.decl(Constructor {
            parent: Some(new_class),
            is_primary: ctor.is_primary,
            visibility: Visibility::Private,
            dispatch_receiver: dispatch,
            params,
            body: ctor.body,
        });
        debug_assert_eq!(new, allocated);

        self.record_transformed(old, new)?;
        if let (Some(old), Some(new)) = (ctor.dispatch_receiver, dispatch) {
            self.record_remapped(old, new)?;
        }
        self.out.contexts.insert(old, LocalContext::Params { captured });
        Ok(())
    }

    /* -------------------------------- Members -------------------------------- */

    /// The lifted class and its receiver, for a member of a local class.
    fn member_owner(&self, member: DeclId) -> Result<(DeclId, ValueId)> {
        let Some(class) = (self.program.parent(member)).filter(|class| self.locals.classes.contains_key(class))
        else {
            return Err(LowerError::unimplemented("member of a class that is not lifted", member));
        };
        let new_class = self.out.lifted(class)?;
        let Some(class) = self.program.decls[&new_class].as_class() else {
            return Err(LowerError::invariant("lifted class expected", new_class));
        };
        Ok((new_class, class.this))
    }

    fn transform_member(&mut self, old: DeclId) -> Result<()> {
        match self.program.decls[&old].clone() {
            | Declaration::Function(func) => {
                // accessors go with their property
                if func.accessor_of.is_some() {
                    return Ok(());
                }
                let (class, this) = self.member_owner(old)?;
                self.transform_member_function(old, func, class, this, None)?;
            }
            | Declaration::Property(prop) => self.transform_property(old, prop)?,
            | Declaration::Field(field) => {
                let (class, _) = self.member_owner(old)?;
                let new = self.program.decl(Field { parent: Some(class), ..field });
                self.record_transformed(old, new)?;
            }
            | Declaration::Class(_) => Err(LowerError::unimplemented("inner class of a local class", old))?,
            | Declaration::Constructor(_) => {
                return Err(LowerError::invariant("constructors are not plain members", old));
            }
        }
        Ok(())
    }

    fn transform_member_function(
        &mut self, old: DeclId, func: Function, class: DeclId, this: ValueId, accessor_of: Option<DeclId>,
    ) -> Result<DeclId> {
        let new = self.program.decls.next_id();
        let params = (func.params.iter().enumerate())
            .map(|(index, param)| self.copy_value(*param, new, ValueKind::Param(index)))
            .collect();
        let extension_receiver = (func.extension_receiver)
            .map(|receiver| self.copy_value(receiver, new, ValueKind::ExtensionReceiver));
        let allocated = self.program.decl(Function {
            parent: Some(class),
            dispatch_receiver: Some(this),
            extension_receiver,
            params,
            accessor_of,
            overrides: Vec::new(),
            ..func
        });
        debug_assert_eq!(new, allocated);
        self.record_member(old, new)?;
        Ok(new)
    }

    fn transform_property(&mut self, old: DeclId, prop: Property) -> Result<()> {
        let (class, this) = self.member_owner(old)?;
        let backing_field = match prop.backing_field {
            | Some(field) => {
                let Some(def) = self.program.decls[&field].as_field().cloned() else {
                    return Err(LowerError::invariant("backing field expected", field));
                };
                let new = self.program.decl(Field { parent: Some(class), ..def });
                self.record_transformed(field, new)?;
                Some(new)
            }
            | None => None,
        };
        let new = self.program.decl(Property {
            parent: Some(class),
            backing_field,
            getter: None,
            setter: None,
            overrides: Vec::new(),
            ..prop.clone()
        });
        self.record_transformed(old, new)?;

        let mut accessors = [None, None];
        for (slot, accessor) in accessors.iter_mut().zip([prop.getter, prop.setter]) {
            let Some(accessor) = accessor else { continue };
            let Some(func) = self.program.decls[&accessor].as_function().cloned() else {
                return Err(LowerError::invariant("accessor expected", accessor));
            };
            *slot = Some(self.transform_member_function(accessor, func, class, this, Some(new))?);
        }
        if let Declaration::Property(prop) = &mut self.program.decls[&new] {
            [prop.getter, prop.setter] = accessors;
        }
        Ok(())
    }

    /// Parameters correspond one to one; receivers move to the lifted class.
    fn record_member(&mut self, old: DeclId, new: DeclId) -> Result<()> {
        self.record_transformed(old, new)?;
        let (old_params, new_params) =
            (self.program.decls[&old].params().to_vec(), self.program.decls[&new].params().to_vec());
        if old_params.len() != new_params.len() {
            return Err(LowerError::invariant("member changed its arity", old));
        }
        for (old, new) in old_params.into_iter().zip(new_params) {
            self.record_remapped(old, new)?;
        }
        let receivers = |decl: DeclId| match &self.program.decls[&decl] {
            | Declaration::Function(f) => (f.dispatch_receiver, f.extension_receiver),
            | _ => (None, None),
        };
        let ((old_dispatch, old_extension), (new_dispatch, new_extension)) = (receivers(old), receivers(new));
        let (Some(old_dispatch), Some(new_dispatch)) = (old_dispatch, new_dispatch) else {
            return Err(LowerError::invariant("members of local classes must have a dispatch receiver", old));
        };
        self.record_remapped(old_dispatch, new_dispatch)?;
        match (old_extension, new_extension) {
            | (Some(old_extension), Some(new_extension)) => self.record_remapped(old_extension, new_extension)?,
            | (None, None) => {}
            | _ => Err(LowerError::invariant("extension receiver lost in transformation", old))?,
        }
        Ok(())
    }

    /* ------------------------------- Member Scope ----------------------------- */

    /// Members visible through the supertypes that resolve to classes of this program.
    fn inherited(&self, supertypes: &[Type]) -> Context<DeclId> {
        let mut inherited = Context::new();
        for ty in supertypes {
            let Type::Class(sup) = ty else { continue };
            let Some(sup) = self.program.decls[sup].as_class() else { continue };
            for member in sup.scope.declared.iter().chain(&sup.scope.fake_overrides) {
                // a supertype lifted in this round lists its old members
                let member = self.out.get(member).unwrap_or(*member);
                let visibility = match &self.program.decls[&member] {
                    | Declaration::Function(f) => f.visibility,
                    | Declaration::Property(p) => p.visibility,
                    | _ => continue,
                };
                if visibility != Visibility::Private {
                    inherited.insert(member);
                }
            }
        }
        inherited
    }

    fn overrides(&self, member: DeclId, inherited: DeclId) -> bool {
        let (member, inherited) = (&self.program.decls[&member], &self.program.decls[&inherited]);
        match (member, inherited) {
            | (Declaration::Function(_), Declaration::Function(_))
            | (Declaration::Property(_), Declaration::Property(_)) => {
                member.name() == inherited.name() && member.params().len() == inherited.params().len()
            }
            | _ => false,
        }
    }

    fn initialize_class(&mut self, old: DeclId) -> Result<()> {
        let Some(class) = self.program.decls[&old].as_class().cloned() else {
            return Err(LowerError::invariant("local class expected", old));
        };
        let new = self.out.lifted(old)?;
        let mut declared = Vec::with_capacity(class.scope.declared.len());
        for member in &class.scope.declared {
            let Some(new_member) = self.out.get(member) else {
                return Err(LowerError::unimplemented("member scope entry that was not transformed", *member));
            };
            declared.push(new_member);
        }

        let inherited = self.inherited(&class.supertypes);
        let mut overridden = Context::new();
        for member in &declared {
            let overrides: Vec<_> =
                inherited.iter().copied().filter(|sup| self.overrides(*member, *sup)).collect();
            overridden.extend(overrides.iter().copied());
            match &mut self.program.decls[member] {
                | Declaration::Function(f) => f.overrides = overrides,
                | Declaration::Property(p) => p.overrides = overrides,
                | _ => {}
            }
        }
        let fake_overrides = inherited.into_iter().filter(|sup| !overridden.contains(sup)).collect();

        if let LocalContext::Fields { captured, .. } = self.out.context(old)? {
            declared.extend(captured.values().copied());
        }
        if let Some(class) = self.program.decls[&new].as_class_mut() {
            class.scope = MemberScope { declared, fake_overrides };
        }
        Ok(())
    }
}
