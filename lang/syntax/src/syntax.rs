use derive_more::From;
use hoist_utils::new_key_type;

/* ------------------------------- Identifier ------------------------------- */

new_key_type! {
    pub struct DeclId;
    pub struct ValueId;
    pub struct ExprId;
}

/// Declared names; special names are compiler-provided and render as `<name>`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Name {
    Ident(String),
    Special(String),
}

impl Name {
    pub fn ident(s: impl Into<String>) -> Self {
        Name::Ident(s.into())
    }
    pub fn special(s: impl Into<String>) -> Self {
        Name::Special(s.into())
    }
    /// `<this>`, the name of every class receiver.
    pub fn this() -> Self {
        Name::special("this")
    }
    /// `<anonymous>`, the name of lambdas.
    pub fn anonymous() -> Self {
        Name::special("anonymous")
    }
    /// `<no name provided>`, the name of anonymous objects.
    pub fn no_name() -> Self {
        Name::special("no name provided")
    }
    /// `<init>`, the name of constructors.
    pub fn init() -> Self {
        Name::special("init")
    }
    pub fn is_special(&self) -> bool {
        matches!(self, Name::Special(_))
    }
    /// The name without the angle brackets of special names.
    pub fn plain(&self) -> &str {
        match self {
            | Name::Ident(s) | Name::Special(s) => s,
        }
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            | Name::Ident(s) => write!(f, "{}", s),
            | Name::Special(s) => write!(f, "<{}>", s),
        }
    }
}

/* ---------------------------------- Types --------------------------------- */

/// Types are copied around, never substituted.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Type {
    Unit,
    Int,
    Bool,
    Str,
    /// a type parameter in scope
    Param(String),
    Class(DeclId),
    Function(Vec<Type>, Box<Type>),
}

/* -------------------------------- Modifiers ------------------------------- */

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Internal,
    Private,
    /// declared inside a function body
    Local,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Modality {
    Final,
    Open,
    Abstract,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Object,
    Interface,
}

/// Where a declaration came from.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Origin {
    Source,
    /// hoisted out of a function body
    Lifted,
    /// a field holding a value captured by a lifted class
    CapturedValue,
}

/* ------------------------------ Declarations ------------------------------ */

/// Every declaration knows its parent on the declaration chain;
/// `None` stands for the module.
#[derive(Clone, Debug, From)]
pub enum Declaration {
    Function(Function),
    Constructor(Constructor),
    Class(Class),
    Property(Property),
    Field(Field),
}

#[derive(Clone, Debug)]
pub struct Function {
    pub name: Name,
    pub parent: Option<DeclId>,
    pub origin: Origin,
    pub visibility: Visibility,
    pub modality: Modality,
    pub type_params: Vec<String>,
    pub dispatch_receiver: Option<ValueId>,
    pub extension_receiver: Option<ValueId>,
    pub params: Vec<ValueId>,
    pub ret: Type,
    pub body: Option<ExprId>,
    /// the property this function is a getter or setter of
    pub accessor_of: Option<DeclId>,
    pub overrides: Vec<DeclId>,
}

#[derive(Clone, Debug)]
pub struct Constructor {
    pub parent: Option<DeclId>,
    pub is_primary: bool,
    pub visibility: Visibility,
    /// the outer instance, for constructors of inner classes
    pub dispatch_receiver: Option<ValueId>,
    pub params: Vec<ValueId>,
    pub body: Option<ExprId>,
}

#[derive(Clone, Debug)]
pub struct Class {
    pub name: Name,
    pub parent: Option<DeclId>,
    pub origin: Origin,
    pub kind: ClassKind,
    pub visibility: Visibility,
    pub modality: Modality,
    pub is_inner: bool,
    pub supertypes: Vec<Type>,
    /// the receiver every member reads as `<this>`
    pub this: ValueId,
    pub members: Vec<DeclId>,
    pub scope: MemberScope,
}

/// Callable members visible on a class.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemberScope {
    pub declared: Vec<DeclId>,
    /// inherited members nothing declared here overrides
    pub fake_overrides: Vec<DeclId>,
}

#[derive(Clone, Debug)]
pub struct Property {
    pub name: Name,
    pub parent: Option<DeclId>,
    pub visibility: Visibility,
    pub modality: Modality,
    pub is_var: bool,
    pub ty: Type,
    pub backing_field: Option<DeclId>,
    pub getter: Option<DeclId>,
    pub setter: Option<DeclId>,
    pub overrides: Vec<DeclId>,
}

#[derive(Clone, Debug)]
pub struct Field {
    pub name: Name,
    pub parent: Option<DeclId>,
    pub origin: Origin,
    pub visibility: Visibility,
    pub is_final: bool,
    pub ty: Type,
    pub init: Option<ExprId>,
}

/* --------------------------------- Values --------------------------------- */

/// Anything a read-expression can target.
#[derive(Clone, Debug)]
pub struct ValueDef {
    pub name: Name,
    pub ty: Type,
    pub owner: DeclId,
    pub kind: ValueKind,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ValueKind {
    Variable { mutable: bool },
    Param(usize),
    DispatchReceiver,
    ExtensionReceiver,
}

/* ------------------------------- Expressions ------------------------------ */

#[derive(Clone, Debug, From)]
pub enum Expr {
    Lit(Literal),
    /// read a value
    Get(ValueId),
    /// write a value
    Set(ValueId, ExprId),
    Var(VarDecl),
    /// a declaration in statement position
    Decl(DeclId),
    Call(Call),
    New(New),
    Ref(CallableRef),
    GetField(GetField),
    SetField(SetField),
    Return(Return),
    Block(Block),
    If(If),
    While(While),
    Binary(Binary),
    Delegated(Delegated),
    ClassRef(ClassRef),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Literal {
    Unit,
    Int(i64),
    Bool(bool),
    Str(String),
}

#[derive(Clone, Debug)]
pub struct VarDecl {
    pub value: ValueId,
    pub init: Option<ExprId>,
}

/// The shared shape of calls, constructor calls and callable references.
/// An absent argument is `None`: defaulted, or left unbound by a reference.
#[derive(Clone, Debug)]
pub struct MemberAccess {
    pub callee: DeclId,
    pub type_args: Vec<Type>,
    pub dispatch: Option<ExprId>,
    pub extension: Option<ExprId>,
    pub args: Vec<Option<ExprId>>,
}

#[derive(Clone, Debug)]
pub struct Call(pub MemberAccess);
/// `callee` is a constructor.
#[derive(Clone, Debug)]
pub struct New(pub MemberAccess);
#[derive(Clone, Debug)]
pub struct CallableRef(pub MemberAccess);

#[derive(Clone, Debug)]
pub struct GetField {
    pub field: DeclId,
    pub receiver: Option<ExprId>,
}

#[derive(Clone, Debug)]
pub struct SetField {
    pub field: DeclId,
    pub receiver: Option<ExprId>,
    pub value: ExprId,
}

/// A return to `target`, which may be an enclosing function.
#[derive(Clone, Debug)]
pub struct Return {
    pub target: DeclId,
    pub value: ExprId,
}

/// The empty block is the no-op.
#[derive(Clone, Debug, Default)]
pub struct Block(pub Vec<ExprId>);

#[derive(Clone, Debug)]
pub struct If {
    pub cond: ExprId,
    pub then: ExprId,
    pub els: Option<ExprId>,
}

#[derive(Clone, Debug)]
pub struct While {
    pub cond: ExprId,
    pub body: ExprId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Lt,
    Eq,
}

#[derive(Clone, Debug)]
pub struct Binary {
    pub op: BinOp,
    pub lhs: ExprId,
    pub rhs: ExprId,
}

/// `val value by delegate`; the accessors are synthesized and carry no captures.
#[derive(Clone, Debug)]
pub struct Delegated {
    pub value: ValueId,
    pub delegate: ExprId,
    pub accessors: Vec<DeclId>,
}

/// `C::class`
#[derive(Clone, Debug)]
pub struct ClassRef(pub DeclId);

/* --------------------------------- Access --------------------------------- */

impl Declaration {
    pub fn parent(&self) -> Option<DeclId> {
        match self {
            | Declaration::Function(Function { parent, .. })
            | Declaration::Constructor(Constructor { parent, .. })
            | Declaration::Class(Class { parent, .. })
            | Declaration::Property(Property { parent, .. })
            | Declaration::Field(Field { parent, .. }) => *parent,
        }
    }
    pub fn name(&self) -> Name {
        match self {
            | Declaration::Function(Function { name, .. })
            | Declaration::Class(Class { name, .. })
            | Declaration::Property(Property { name, .. })
            | Declaration::Field(Field { name, .. }) => name.clone(),
            | Declaration::Constructor(_) => Name::init(),
        }
    }
    pub fn is_callable(&self) -> bool {
        matches!(self, Declaration::Function(_) | Declaration::Constructor(_))
    }
    pub fn is_class(&self) -> bool {
        matches!(self, Declaration::Class(_))
    }
    /// Value parameters, for callables.
    pub fn params(&self) -> &[ValueId] {
        match self {
            | Declaration::Function(Function { params, .. })
            | Declaration::Constructor(Constructor { params, .. }) => params,
            | _ => &[],
        }
    }
    pub fn body(&self) -> Option<ExprId> {
        match self {
            | Declaration::Function(Function { body, .. })
            | Declaration::Constructor(Constructor { body, .. }) => *body,
            | _ => None,
        }
    }
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            | Declaration::Function(f) => Some(f),
            | _ => None,
        }
    }
    pub fn as_function_mut(&mut self) -> Option<&mut Function> {
        match self {
            | Declaration::Function(f) => Some(f),
            | _ => None,
        }
    }
    pub fn as_constructor(&self) -> Option<&Constructor> {
        match self {
            | Declaration::Constructor(c) => Some(c),
            | _ => None,
        }
    }
    pub fn as_constructor_mut(&mut self) -> Option<&mut Constructor> {
        match self {
            | Declaration::Constructor(c) => Some(c),
            | _ => None,
        }
    }
    pub fn as_class(&self) -> Option<&Class> {
        match self {
            | Declaration::Class(c) => Some(c),
            | _ => None,
        }
    }
    pub fn as_class_mut(&mut self) -> Option<&mut Class> {
        match self {
            | Declaration::Class(c) => Some(c),
            | _ => None,
        }
    }
    pub fn as_property(&self) -> Option<&Property> {
        match self {
            | Declaration::Property(p) => Some(p),
            | _ => None,
        }
    }
    pub fn as_field(&self) -> Option<&Field> {
        match self {
            | Declaration::Field(f) => Some(f),
            | _ => None,
        }
    }
    pub fn as_field_mut(&mut self) -> Option<&mut Field> {
        match self {
            | Declaration::Field(f) => Some(f),
            | _ => None,
        }
    }
}

impl Expr {
    /// The call-shaped view of calls, constructor calls and references.
    pub fn member_access(&self) -> Option<&MemberAccess> {
        match self {
            | Expr::Call(Call(access)) | Expr::New(New(access)) | Expr::Ref(CallableRef(access)) => {
                Some(access)
            }
            | _ => None,
        }
    }
    pub fn is_noop(&self) -> bool {
        matches!(self, Expr::Block(Block(stmts)) if stmts.is_empty())
    }
}
