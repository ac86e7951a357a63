use hoist_lower::{LowerConf, LowerError};
use hoist_syntax::*;
use hoist_tests::{fixtures::*, utils::*};
use pretty_assertions::assert_eq;

#[test]
fn local_function_with_dispatch_receiver_is_rejected() {
    let Fixture { mut program, root, locals } = captured_call();
    let stray = program.variable(root, Name::this(), Type::Unit, false);
    if let Some(func) = program.decls[&locals[0]].as_function_mut() {
        func.dispatch_receiver = Some(stray);
    }
    let err = lower(&mut program).unwrap_err();
    assert!(err.is_invariant(), "{}", err);
}

#[test]
fn local_class_without_primary_constructor_is_rejected() {
    let mut p = Program::new();
    let outer = p.function(None, Name::ident("outer"), Type::Unit);
    let n = p.param(outer, Name::ident("n"), Type::Int);
    let local = p.class(Some(outer), Name::ident("L"), ClassKind::Class);
    p.constructor(local, false);
    let m = p.function(Some(local), Name::ident("m"), Type::Int);
    let read = p.get(n);
    let ret = p.ret(m, read);
    let m_body = p.block([ret]);
    p.set_body(m, m_body);
    let decl = p.local(local);
    let body = p.block([decl]);
    p.set_body(outer, body);

    let err = lower(&mut p).unwrap_err();
    assert!(err.is_invariant(), "{}", err);
}

#[test]
fn inner_classes_of_local_classes_are_not_supported() {
    let Fixture { mut program, .. } = inner_class_in_local_class();
    let err = lower(&mut program).unwrap_err();
    assert!(err.is_unimplemented(), "{}", err);
}

#[test]
fn validation_catches_a_dangling_call() {
    let Fixture { mut program, root, .. } = plain();
    let ghost = program.function(Some(root), Name::ident("ghost"), Type::Int);
    let call = program.call(ghost, []);
    let ret = program.ret(root, call);
    let body = program.block([ret]);
    program.set_body(root, body);
    let err = lower_with(&mut program, &LowerConf::default()).unwrap_err();
    let LowerError::Validation(errors) = err else { panic!("validation error expected, got {}", err) };
    assert_eq!(errors.len(), 1);

    let conf: LowerConf = "validate = false".parse().unwrap();
    assert!(lower_with(&mut program, &conf).unwrap().is_empty());
}

#[test]
fn names_follow_the_configuration() {
    let conf: LowerConf = r#"
        separator = "_"
        lambda_prefix = "fn"
    "#
    .parse()
    .unwrap();
    let Fixture { mut program, root, .. } = lambda_reading_one_of_two();
    let lifted = lower_with(&mut program, &conf).unwrap();
    let new = lifted[&root][0];
    assert_eq!(program.decls[&new].name(), Name::ident("outer_fn-0"));
}

#[test]
fn unknown_configuration_keys_are_rejected() {
    assert!("separatr = \"_\"".parse::<LowerConf>().is_err());
}
