use crate::*;
use pretty_assertions::assert_eq;
use unindent::unindent;

fn outer_with_inner() -> (Program, DeclId, DeclId) {
    let mut p = Program::new();
    let outer = p.function(None, Name::ident("outer"), Type::Int);
    let n = p.param(outer, Name::ident("n"), Type::Int);
    let inner = p.function(Some(outer), Name::ident("inner"), Type::Int);
    let get_n = p.get(n);
    let one = p.int(1);
    let sum = p.binary(BinOp::Add, get_n, one);
    let ret_inner = p.ret(inner, sum);
    let inner_body = p.block([ret_inner]);
    p.set_body(inner, inner_body);
    let decl = p.local(inner);
    let call = p.call(inner, []);
    let ret = p.ret(outer, call);
    let body = p.block([decl, ret]);
    p.set_body(outer, body);
    (p, outer, inner)
}

#[test]
fn declaration_chain() {
    let (p, outer, inner) = outer_with_inner();
    assert_eq!(p.top, vec![outer]);
    assert_eq!(p.parents_with_self(inner).collect::<Vec<_>>(), vec![inner, outer]);
    assert!(p.is_local(inner));
    assert!(!p.is_local(outer));
    let Declaration::Function(f) = &p.decls[&inner] else { panic!() };
    assert_eq!(f.visibility, Visibility::Local);
    assert_eq!(f.dispatch_receiver, None);
}

#[test]
fn pretty_nested_function() {
    let (p, _, _) = outer_with_inner();
    let fmt = Formatter::new(&p);
    let expected = unindent(
        "
        fun outer(n: Int): Int {
          fun inner(): Int {
            return@inner n + 1
          }
          return@outer inner()
        }",
    );
    assert_eq!(Formatter::render(p.pretty(&fmt)), expected);
}

#[test]
fn class_members_share_the_receiver() {
    let mut p = Program::new();
    let c = p.class(None, Name::ident("C"), ClassKind::Class);
    let ctor = p.constructor(c, true);
    let x = p.property(c, Name::ident("x"), Type::Int, true);
    let m = p.function(Some(c), Name::ident("m"), Type::Unit);
    let Declaration::Class(class) = &p.decls[&c] else { panic!() };
    assert_eq!(class.members, vec![ctor, x, m]);
    assert_eq!(class.scope.declared, vec![x, m]);
    assert_eq!(p.primary_constructor(c), Some(ctor));
    let this = class.this;
    assert_eq!(p.owner(this), c);
    let Declaration::Property(prop) = &p.decls[&x] else { panic!() };
    let getter = prop.getter.unwrap();
    let setter = prop.setter.unwrap();
    assert_eq!(p.decls[&getter].as_function().unwrap().dispatch_receiver, Some(this));
    assert_eq!(p.decls[&setter].params().len(), 1);
    assert_eq!(p.decls[&m].as_function().unwrap().dispatch_receiver, Some(this));
    let fmt = Formatter::new(&p);
    assert_eq!(getter.ugly(&fmt), "fun <get-x>(): Int");
    assert_eq!(p.decls[&getter].body().unwrap().ugly(&fmt), "{ return@<get-x> <this>.x }");
}

#[test]
fn inner_constructor_takes_outer_receiver() {
    let mut p = Program::new();
    let f = p.function(None, Name::ident("f"), Type::Unit);
    let local = p.class(Some(f), Name::ident("L"), ClassKind::Class);
    let inner = p.inner_class(local, Name::ident("I"));
    let ctor = p.constructor(inner, true);
    let outer_this = p.decls[&local].as_class().unwrap().this;
    assert_eq!(p.decls[&ctor].as_constructor().unwrap().dispatch_receiver, Some(outer_this));
    assert!(p.is_local(local));
    assert!(p.is_local(ctor));
    assert_eq!(p.top, vec![f]);
}
