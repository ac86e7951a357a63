use hoist_syntax::*;
use hoist_tests::{fixtures::*, utils::*};
use pretty_assertions::assert_eq;
use unindent::unindent;

#[test]
fn captured_parameter_becomes_leading_argument() {
    let Fixture { mut program, root, locals } = captured_call();
    let lifted = lower(&mut program).unwrap();
    let expected = unindent(
        "
        fun outer(n: Int): Int {
          {}
          return@outer outer$inner(n, 2)
        }
        private fun outer$inner(n: Int, k: Int): Int {
          return@outer$inner n + k
        }",
    );
    assert_eq!(render(&program), expected);
    let siblings = &lifted[&root];
    assert_eq!(siblings.len(), locals.len());
    assert_eq!(program.top, vec![root, siblings[0]]);
}

#[test]
fn captures_propagate_through_intermediate_functions() {
    let Fixture { mut program, .. } = transitive();
    lower(&mut program).unwrap();
    let expected = unindent(
        "
        fun outer(n: Int): Int {
          {}
          return@outer outer$a(n)
        }
        private fun outer$a$b(n: Int): Int {
          return@outer$a$b n
        }
        private fun outer$a(n: Int): Int {
          {}
          return@outer$a outer$a$b(n)
        }",
    );
    assert_eq!(render(&program), expected);
}

#[test]
fn calling_a_capturing_sibling_passes_its_captures_on() {
    let Fixture { mut program, .. } = sibling_call();
    lower(&mut program).unwrap();
    let expected = unindent(
        "
        fun outer(n: Int): Int {
          {}
          {}
          return@outer outer$h(n)
        }
        private fun outer$g(n: Int): Int {
          return@outer$g n
        }
        private fun outer$h(n: Int): Int {
          return@outer$h outer$g(n)
        }",
    );
    assert_eq!(render(&program), expected);
}

#[test]
fn nonlocal_return_follows_the_lifted_target() {
    let Fixture { mut program, .. } = nonlocal_return_in_lambda();
    lower(&mut program).unwrap();
    let expected = unindent(
        "
        fun outer(n: Int): Unit {
          {}
          outer$a(n)
        }
        private fun outer$a$lambda-0(n: Int): Int {
          return@outer$a n
        }
        private fun outer$a(n: Int): Unit {
          {}
          ::outer$a$lambda-0(n)
        }",
    );
    assert_eq!(render(&program), expected);
}

#[test]
fn anonymous_object_keeps_captures_in_fields() {
    let Fixture { mut program, .. } = anonymous_object();
    lower(&mut program).unwrap();
    let expected = unindent(
        "
        fun make(n: Int): Int {
          {}
          return@make new make$object-0(n).get()
        }
        private object make$object-0 {
          private primary constructor(n: Int)
          fun get(): Int {
            return@get <this>.n
          }
          private field n: Int = n
        }",
    );
    assert_eq!(render(&program), expected);
}

#[test]
fn receivers_are_captured_under_a_marked_name() {
    let Fixture { mut program, .. } = extension_in_member();
    lower(&mut program).unwrap();
    let expected = unindent(
        r#"
        class Box {
          primary constructor()
          private field v: Int
          fun shifted(d: Int): Int {
            {}
            return@shifted "".shifted$plus(d, <this>)
          }
          private fun String.shifted$plus(d: Int, $this: Box): Int {
            return@shifted$plus d + $this.v
          }
        }"#,
    );
    assert_eq!(render(&program), expected);
}

#[test]
fn nothing_local_leaves_the_program_alone() {
    let Fixture { mut program, .. } = plain();
    let before = render(&program);
    let lifted = lower(&mut program).unwrap();
    assert!(lifted.is_empty());
    assert_eq!(render(&program), before);
}

#[test]
fn lifted_declarations_are_private_and_marked() {
    let Fixture { mut program, root, .. } = anonymous_object();
    let lifted = lower(&mut program).unwrap();
    let class = lifted[&root][0];
    let Declaration::Class(class) = &program.decls[&class] else { panic!("class expected") };
    assert_eq!(class.visibility, Visibility::Private);
    assert_eq!(class.origin, Origin::Lifted);
    assert!(!class.is_inner);
    let captured: Vec<_> = (class.members.iter())
        .filter_map(|member| program.decls[member].as_field())
        .filter(|field| field.origin == Origin::CapturedValue)
        .collect();
    assert_eq!(captured.len(), 1);
    assert!(captured[0].is_final);
    // captured fields are visible in the member scope
    assert_eq!(class.scope.declared.len(), 2);
}
