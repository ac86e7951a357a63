use hoist_lower::{
    LowerConf, closure::ClosureAnalyzer, collect::LocalDeclarations, scope::Closure,
    transform::DescriptorTransformer,
};
use hoist_syntax::*;
use hoist_tests::{fixtures::*, utils::*};
use hoist_utils::context::Context;
use pretty_assertions::assert_eq;

fn closure(values: impl IntoIterator<Item = ValueId>) -> Closure {
    Closure(Context::from_iter(values))
}

#[test]
fn closures_hold_only_what_is_read() {
    let Fixture { program, root, locals } = lambda_reading_one_of_two();
    let closures = ClosureAnalyzer::new(&program).analyze(root);
    let n = program.decls[&root].params()[0];
    // read twice, captured once
    assert_eq!(closures[&locals[0]], closure([n]));
}

#[test]
fn nested_captures_reach_the_enclosing_function() {
    let Fixture { program, root, locals } = transitive();
    let closures = ClosureAnalyzer::new(&program).analyze(root);
    let n = program.decls[&root].params()[0];
    let &[a, b] = &locals[..] else { panic!("two locals expected") };
    assert_eq!(closures[&b], closure([n]));
    assert_eq!(closures[&a], closure([n]));
}

#[test]
fn inner_constructors_do_not_capture_the_outer_receiver() {
    let Fixture { program, root, locals } = inner_class_in_local_class();
    let closures = ClosureAnalyzer::new(&program).analyze(root);
    let &[local, inner, ctor] = &locals[..] else { panic!("three locals expected") };
    assert_eq!(closures[&ctor], closure([]));
    assert_eq!(closures[&inner], closure([]));
    assert_eq!(closures[&local], closure([]));
}

#[test]
fn lifted_arity_is_closure_plus_original() {
    let fixtures = [captured_call(), transitive(), lambda_reading_one_of_two(), sibling_call()];
    for Fixture { mut program, root, .. } in fixtures {
        let closures = ClosureAnalyzer::new(&program).analyze(root);
        let collected = LocalDeclarations::collect(&program, root).unwrap();
        let arities: Vec<_> = (collected.functions.keys())
            .map(|local| closures[local].len() + program.decls[local].params().len())
            .collect();
        let lifted = lower(&mut program).unwrap();
        // siblings come in collection order
        let lowered: Vec<_> = lifted[&root].iter().map(|new| program.decls[new].params().len()).collect();
        assert_eq!(lowered, arities);
        // the root is left with nothing to lift
        assert!(LocalDeclarations::collect(&program, root).unwrap().is_empty());
    }
}

#[test]
fn lowering_is_deterministic() {
    for fixture in [captured_call, transitive, sibling_call, anonymous_object, extension_in_member] {
        let (mut first, mut second) = (fixture().program, fixture().program);
        lower(&mut first).unwrap();
        lower(&mut second).unwrap();
        assert_eq!(render(&first), render(&second));
    }
}

#[test]
fn remap_tables_are_inverse_and_skip_captures() {
    let Fixture { mut program, root, .. } = transitive();
    let locals = LocalDeclarations::collect(&program, root).unwrap();
    let closures = ClosureAnalyzer::new(&program).analyze(root);
    let conf = LowerConf::default();
    let transformed = DescriptorTransformer::new(&mut program, &conf, root, &locals, &closures).run().unwrap();
    for (old, new) in transformed.remap.iter() {
        assert_eq!(transformed.remap.back(new), Some(old));
        assert!(!transformed.new_to_captured.contains_key(new));
    }
    for (synthesized, _) in transformed.new_to_captured.iter() {
        assert_eq!(transformed.remap.back(synthesized), None);
    }
}
