//! The formatter traits, and the formatter of the IR.

#[impl_tools::autoimpl(for<T: trait + ?Sized> &T, &mut T, Box<T>, std::rc::Rc<T>, std::sync::Arc<T>)]
pub trait Ugly<'a, Fmter> {
    fn ugly(&self, f: &'a Fmter) -> String;
}

use pretty::RcDoc;

#[impl_tools::autoimpl(for<T: trait + ?Sized> &T, &mut T, Box<T>, std::rc::Rc<T>, std::sync::Arc<T>)]
pub trait Pretty<'a, Fmter> {
    fn pretty(&self, f: &'a Fmter) -> RcDoc<'a>;
}

use crate::{arena::*, syntax::*};

/* -------------------------------- Formatter ------------------------------- */

pub struct Formatter<'arena> {
    program: &'arena Program,
}
impl<'arena> Formatter<'arena> {
    pub fn new(program: &'arena Program) -> Self {
        Formatter { program }
    }

    /// Lay out a document at the default width.
    pub fn render(doc: RcDoc<'_>) -> String {
        format!("{}", doc.pretty(100))
    }

    fn header(&self, decl: &DeclId) -> String {
        let f = self;
        let mut s = String::new();
        match &f.program.decls[decl] {
            | Declaration::Function(func) => {
                s += visibility(func.visibility);
                s += modality(func.modality);
                s += "fun ";
                if !func.type_params.is_empty() {
                    s += &format!("<{}> ", func.type_params.join(", "));
                }
                if let Some(ext) = func.extension_receiver {
                    s += &format!("{}.", f.program.values[&ext].ty.ugly(f));
                }
                s += &func.name.to_string();
                s += &format!("({}): {}", params(f, &func.params), func.ret.ugly(f));
            }
            | Declaration::Constructor(ctor) => {
                s += visibility(ctor.visibility);
                if ctor.is_primary {
                    s += "primary ";
                }
                s += &format!("constructor({})", params(f, &ctor.params));
            }
            | Declaration::Class(class) => {
                s += visibility(class.visibility);
                s += modality(class.modality);
                if class.is_inner {
                    s += "inner ";
                }
                s += match class.kind {
                    | ClassKind::Class => "class ",
                    | ClassKind::Object => "object ",
                    | ClassKind::Interface => "interface ",
                };
                s += &class.name.to_string();
                if !class.supertypes.is_empty() {
                    let supers: Vec<_> = class.supertypes.iter().map(|ty| ty.ugly(f)).collect();
                    s += &format!(" : {}", supers.join(", "));
                }
            }
            | Declaration::Property(prop) => {
                s += visibility(prop.visibility);
                s += if prop.is_var { "var " } else { "val " };
                s += &format!("{}: {}", prop.name, prop.ty.ugly(f));
            }
            | Declaration::Field(field) => {
                s += visibility(field.visibility);
                s += &format!("field {}: {}", field.name, field.ty.ugly(f));
                if let Some(init) = field.init {
                    s += &format!(" = {}", init.ugly(f));
                }
            }
        }
        s
    }
}

fn visibility(vis: Visibility) -> &'static str {
    match vis {
        | Visibility::Public | Visibility::Local => "",
        | Visibility::Internal => "internal ",
        | Visibility::Private => "private ",
    }
}

fn modality(modality: Modality) -> &'static str {
    match modality {
        | Modality::Final => "",
        | Modality::Open => "open ",
        | Modality::Abstract => "abstract ",
    }
}

fn params(f: &Formatter, params: &[ValueId]) -> String {
    let params: Vec<_> = params
        .iter()
        .map(|param| {
            let def = &f.program.values[param];
            format!("{}: {}", def.name, def.ty.ugly(f))
        })
        .collect();
    params.join(", ")
}

/* ---------------------------------- Ugly ---------------------------------- */

impl<'a> Ugly<'a, Formatter<'a>> for Name {
    fn ugly(&self, _f: &'a Formatter<'a>) -> String {
        self.to_string()
    }
}

impl<'a> Ugly<'a, Formatter<'a>> for Type {
    fn ugly(&self, f: &'a Formatter<'a>) -> String {
        match self {
            | Type::Unit => "Unit".to_string(),
            | Type::Int => "Int".to_string(),
            | Type::Bool => "Bool".to_string(),
            | Type::Str => "String".to_string(),
            | Type::Param(name) => name.clone(),
            | Type::Class(class) => f.program.decls[class].name().to_string(),
            | Type::Function(params, ret) => {
                let params: Vec<_> = params.iter().map(|ty| ty.ugly(f)).collect();
                format!("({}) -> {}", params.join(", "), ret.ugly(f))
            }
        }
    }
}

impl<'a> Ugly<'a, Formatter<'a>> for ValueId {
    fn ugly(&self, f: &'a Formatter<'a>) -> String {
        f.program.values[self].name.to_string()
    }
}

impl<'a> Ugly<'a, Formatter<'a>> for DeclId {
    fn ugly(&self, f: &'a Formatter<'a>) -> String {
        f.header(self)
    }
}

impl<'a> Ugly<'a, Formatter<'a>> for ExprId {
    fn ugly(&self, f: &'a Formatter<'a>) -> String {
        f.program.exprs[self].ugly(f)
    }
}

impl<'a> Ugly<'a, Formatter<'a>> for MemberAccess {
    fn ugly(&self, f: &'a Formatter<'a>) -> String {
        let MemberAccess { callee, type_args, dispatch, extension, args: _ } = self;
        let mut s = String::new();
        if let Some(dispatch) = dispatch {
            s += &format!("{}.", dispatch.ugly(f));
        }
        if let Some(extension) = extension {
            s += &format!("{}.", extension.ugly(f));
        }
        s += &f.program.decls[callee].name().to_string();
        if !type_args.is_empty() {
            let type_args: Vec<_> = type_args.iter().map(|ty| ty.ugly(f)).collect();
            s += &format!("<{}>", type_args.join(", "));
        }
        s
    }
}

fn args(f: &Formatter<'_>, args: &[Option<ExprId>]) -> String {
    let args: Vec<_> = args
        .iter()
        .map(|arg| match arg {
            | Some(arg) => f.program.exprs[arg].ugly(f),
            | None => "_".to_string(),
        })
        .collect();
    format!("({})", args.join(", "))
}

impl<'a> Ugly<'a, Formatter<'a>> for Expr {
    fn ugly(&self, f: &'a Formatter<'a>) -> String {
        match self {
            | Expr::Lit(lit) => match lit {
                | Literal::Unit => "()".to_string(),
                | Literal::Int(i) => i.to_string(),
                | Literal::Bool(b) => b.to_string(),
                | Literal::Str(s) => format!("{:?}", s),
            },
            | Expr::Get(value) => value.ugly(f),
            | Expr::Set(value, to) => format!("{} = {}", value.ugly(f), to.ugly(f)),
            | Expr::Var(VarDecl { value, init }) => {
                let def = &f.program.values[value];
                let binder = match def.kind {
                    | ValueKind::Variable { mutable: true } => "var",
                    | _ => "val",
                };
                let mut s = format!("{} {}: {}", binder, def.name, def.ty.ugly(f));
                if let Some(init) = init {
                    s += &format!(" = {}", init.ugly(f));
                }
                s
            }
            | Expr::Decl(decl) => decl.ugly(f),
            | Expr::Call(Call(access)) => format!("{}{}", access.ugly(f), args(f, &access.args)),
            | Expr::New(New(access)) => {
                let class = f.program.parent(access.callee).map(|class| f.program.decls[&class].name());
                let class = class.map(|name| name.to_string()).unwrap_or_default();
                format!("new {}{}", class, args(f, &access.args))
            }
            | Expr::Ref(CallableRef(access)) => {
                let mut s = format!("::{}", access.ugly(f));
                if !access.args.is_empty() {
                    s += &args(f, &access.args);
                }
                s
            }
            | Expr::GetField(GetField { field, receiver }) => {
                let name = f.program.decls[field].name();
                match receiver {
                    | Some(receiver) => format!("{}.{}", receiver.ugly(f), name),
                    | None => name.to_string(),
                }
            }
            | Expr::SetField(SetField { field, receiver, value }) => {
                let name = f.program.decls[field].name();
                match receiver {
                    | Some(receiver) => format!("{}.{} = {}", receiver.ugly(f), name, value.ugly(f)),
                    | None => format!("{} = {}", name, value.ugly(f)),
                }
            }
            | Expr::Return(Return { target, value }) => {
                format!("return@{} {}", f.program.decls[target].name(), value.ugly(f))
            }
            | Expr::Block(Block(stmts)) => {
                if stmts.is_empty() {
                    "{}".to_string()
                } else {
                    let stmts: Vec<_> = stmts.iter().map(|stmt| stmt.ugly(f)).collect();
                    format!("{{ {} }}", stmts.join("; "))
                }
            }
            | Expr::If(If { cond, then, els }) => {
                let mut s = format!("if ({}) {}", cond.ugly(f), then.ugly(f));
                if let Some(els) = els {
                    s += &format!(" else {}", els.ugly(f));
                }
                s
            }
            | Expr::While(While { cond, body }) => {
                format!("while ({}) {}", cond.ugly(f), body.ugly(f))
            }
            | Expr::Binary(Binary { op, lhs, rhs }) => {
                let op = match op {
                    | BinOp::Add => "+",
                    | BinOp::Sub => "-",
                    | BinOp::Mul => "*",
                    | BinOp::Lt => "<",
                    | BinOp::Eq => "==",
                };
                format!("{} {} {}", lhs.ugly(f), op, rhs.ugly(f))
            }
            | Expr::Delegated(Delegated { value, delegate, accessors: _ }) => {
                format!("val {} by {}", value.ugly(f), delegate.ugly(f))
            }
            | Expr::ClassRef(ClassRef(class)) => {
                format!("{}::class", f.program.decls[class].name())
            }
        }
    }
}

/* --------------------------------- Pretty --------------------------------- */

impl<'a> Pretty<'a, Formatter<'a>> for ExprId {
    fn pretty(&self, f: &'a Formatter<'a>) -> RcDoc<'a> {
        match &f.program.exprs[self] {
            | Expr::Block(Block(stmts)) if !stmts.is_empty() => {
                let stmts = RcDoc::intersperse(stmts.iter().map(|stmt| stmt.pretty(f)), RcDoc::hardline());
                RcDoc::text("{")
                    .append(RcDoc::hardline().append(stmts).nest(2))
                    .append(RcDoc::hardline())
                    .append(RcDoc::text("}"))
            }
            | Expr::Decl(decl) => decl.pretty(f),
            | expr => RcDoc::text(expr.ugly(f)),
        }
    }
}

impl<'a> Pretty<'a, Formatter<'a>> for DeclId {
    fn pretty(&self, f: &'a Formatter<'a>) -> RcDoc<'a> {
        let header = RcDoc::text(f.header(self));
        match &f.program.decls[self] {
            | Declaration::Function(Function { body, .. })
            | Declaration::Constructor(Constructor { body, .. }) => match body {
                | Some(body) => header.append(RcDoc::text(" ")).append(body.pretty(f)),
                | None => header,
            },
            | Declaration::Class(Class { members, .. }) => {
                if members.is_empty() {
                    header.append(RcDoc::text(" {}"))
                } else {
                    let members = RcDoc::intersperse(
                        members.iter().map(|member| member.pretty(f)),
                        RcDoc::hardline(),
                    );
                    header
                        .append(RcDoc::text(" {"))
                        .append(RcDoc::hardline().append(members).nest(2))
                        .append(RcDoc::hardline())
                        .append(RcDoc::text("}"))
                }
            }
            | Declaration::Property(_) | Declaration::Field(_) => header,
        }
    }
}

impl<'a> Pretty<'a, Formatter<'a>> for Program {
    fn pretty(&self, f: &'a Formatter<'a>) -> RcDoc<'a> {
        RcDoc::intersperse(self.top.iter().map(|decl| decl.pretty(f)), RcDoc::hardline())
    }
}
